//! Polls
//!
//! - **Types**: wire shapes of polls and votes
//! - **Tally**: per-option counts and rounded percentages
//! - **Guard**: client-local record of polls already voted on
//! - **Engine**: per-poll display state machine and vote casting
//! - **Manager**: owner-side create/edit/archive

mod engine;
mod guard;
mod manager;
mod tally;
mod types;

pub use engine::{CastResolution, PollCard, PollEngine, PollError, PollPhase, Toast};
pub use guard::VoteGuard;
pub use manager::{
    CreatePollPayload, EditedElement, NewElement, OptionDraft, PollDraft, PollManager,
    UpdatePollPayload,
};
pub use tally::{percentage, tally, TallyRow};
pub use types::{EndReason, Poll, PollOption, VoteRequest};
