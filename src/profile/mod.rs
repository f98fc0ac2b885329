//! Profile
//!
//! Public profile loading and the owner's settings editor.

mod editor;
mod fetcher;
mod types;

pub use editor::{PendingPhoto, ProfileUpdate, SettingsDraft, SettingsEditor};
pub use fetcher::ProfileFetcher;
pub use types::{Platform, Profile, SocialLink};
