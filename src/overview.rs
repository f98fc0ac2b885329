//! Dashboard overview
//!
//! Active polls with their tallies and the next few schedule entries. The
//! two sections load independently; one failing leaves the other filled.

use crate::error::ClientError;
use crate::polls::{tally, Poll, PollManager, TallyRow};
use crate::schedule::{ScheduleAccessor, ScheduleEntry};
use crate::session::SessionGateway;

/// Number of schedule entries shown on the overview
pub const SCHEDULE_PREVIEW_LEN: usize = 3;

#[derive(Debug, Clone)]
pub struct PollSummary {
    pub poll: Poll,
    pub total_votes: u64,
    pub rows: Vec<TallyRow>,
}

#[derive(Debug, Default)]
pub struct Overview {
    pub active_polls: Vec<PollSummary>,
    pub upcoming: Vec<ScheduleEntry>,
    /// Per-section failures, in load order
    pub errors: Vec<ClientError>,
}

pub async fn load(gateway: &SessionGateway) -> Overview {
    let polls = PollManager::new(gateway.clone());
    let schedule = ScheduleAccessor::new(gateway.clone());

    let (polls, entries) = tokio::join!(polls.list(), schedule.list());
    let mut overview = Overview::default();

    match polls {
        Ok(polls) => {
            overview.active_polls = polls
                .into_iter()
                .filter(|p| p.is_active)
                .map(|poll| PollSummary {
                    total_votes: poll.total_votes(),
                    rows: tally(&poll),
                    poll,
                })
                .collect();
        }
        Err(e) => {
            tracing::warn!("Overview polls failed: {}", e);
            overview.errors.push(e);
        }
    }

    match entries {
        Ok(entries) => {
            overview.upcoming = entries.into_iter().take(SCHEDULE_PREVIEW_LEN).collect();
        }
        Err(e) => {
            tracing::warn!("Overview schedule failed: {}", e);
            overview.errors.push(e);
        }
    }

    overview
}
