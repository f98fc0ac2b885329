//! Poll data types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::RecordId;

/// A poll as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Owner-controlled flag, flipped by archive/unarchive
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub elements: Vec<PollOption>,
}

fn default_active() -> bool {
    true
}

/// One answer of a poll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollOption {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub label: String,
    #[serde(default)]
    pub count: u64,
}

impl PollOption {
    /// The value sent as `elementId`: the option id, or its label when the
    /// server did not assign one
    pub fn key(&self) -> &str {
        self.id.as_ref().map(RecordId::as_str).unwrap_or(self.label.as_str())
    }
}

/// Why a poll no longer accepts votes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// `endDate` is in the past
    Expired,
    /// The owner archived it (`isActive == false`)
    Archived,
}

impl Poll {
    /// Sum of all option counts
    pub fn total_votes(&self) -> u64 {
        self.elements.iter().map(|o| o.count).sum()
    }

    /// Either ending signal ends the poll. Expiry is reported first when both
    /// apply.
    pub fn end_reason(&self, now: DateTime<Utc>) -> Option<EndReason> {
        if self.end_date < now {
            Some(EndReason::Expired)
        } else if !self.is_active {
            Some(EndReason::Archived)
        } else {
            None
        }
    }

    pub fn is_ended(&self, now: DateTime<Utc>) -> bool {
        self.end_reason(now).is_some()
    }

    pub fn option(&self, key: &str) -> Option<&PollOption> {
        self.elements.iter().find(|o| o.key() == key)
    }

    pub(crate) fn option_mut(&mut self, key: &str) -> Option<&mut PollOption> {
        self.elements.iter_mut().find(|o| o.key() == key)
    }
}

/// Body of `POST /votes`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub vote_id: String,
    pub element_id: String,
}

#[cfg(test)]
pub(crate) fn sample_poll(counts: &[(&str, u64)]) -> Poll {
    use chrono::Duration;

    Poll {
        id: RecordId::new("poll-1"),
        title: "Next game?".to_string(),
        start_date: Utc::now() - Duration::hours(1),
        end_date: Utc::now() + Duration::hours(23),
        is_active: true,
        elements: counts
            .iter()
            .map(|(label, count)| PollOption {
                id: None,
                label: label.to_string(),
                count: *count,
            })
            .collect(),
    }
}
