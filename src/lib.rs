//! # Streamer Hub
//!
//! Client for a streamer's public profile site and admin dashboard: profile,
//! polls and stream schedule served by a REST API, plus owner-only poll,
//! schedule and profile management.
//!
//! ## Modules
//!
//! - [`session`]: bearer-token gateway with 401 teardown
//! - [`store`]: persisted token and vote guard
//! - [`polls`]: poll state machine, tallies, voting and management
//! - [`schedule`]: stream schedule CRUD
//! - [`profile`]: profile loading and the settings editor
//! - [`auth`]: login, session restore, logout
//! - [`overview`]: dashboard summary
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use streamer_hub::config::Config;
//! use streamer_hub::polls::{PollEngine, VoteGuard};
//! use streamer_hub::session::{HttpTransport, Session, SessionGateway};
//! use streamer_hub::store::LocalStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let store = LocalStore::open(&config.storage.state_file)?;
//!     let transport = Arc::new(HttpTransport::new(&config.api)?);
//!     let gateway = SessionGateway::new(transport, Session::new(store.clone()));
//!
//!     let engine = PollEngine::new(gateway, VoteGuard::new(store), config.polls);
//!     let mut cards = engine.load_cards().await?;
//!
//!     if let Some(card) = cards.first_mut() {
//!         let first = card.tally().first().map(|row| row.key.clone());
//!         if let Some(key) = first {
//!             card.select(&key, chrono::Utc::now())?;
//!             engine.cast(card).await?;
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod id;
pub mod logging;
pub mod overview;
pub mod polls;
pub mod profile;
pub mod schedule;
pub mod session;
pub mod store;

// Re-export top-level types for convenience
pub use auth::{Auth, SessionStatus};

pub use config::{ApiConfig, Config, ConfigError, LoggingConfig, PollConfig, PollScope, StorageConfig};

pub use error::{ClientError, ClientResult};

pub use id::RecordId;

pub use polls::{
    EndReason, Poll, PollCard, PollDraft, PollEngine, PollError, PollManager, PollOption,
    PollPhase, VoteGuard,
};

pub use profile::{Profile, ProfileFetcher, SettingsDraft, SettingsEditor, SocialLink};

pub use schedule::{ScheduleAccessor, ScheduleDraft, ScheduleEntry};

pub use session::{HttpTransport, Session, SessionGateway, Transport, TransportError};

pub use store::{LocalStore, StoreError};
