//! Poll Engine
//!
//! Each displayed poll is a [`PollCard`] driven through an explicit state
//! machine:
//!
//! ```text
//! Loading ──► Open ──select──► Open(selected) ──cast──► Submitting ──ok──► Voted
//!    │                                                      │
//!    ├──► Voted  (vote guard already holds the poll)        └─fail─► Open(selected)
//!    └──► Ended  (endDate passed or isActive == false)
//! ```
//!
//! A successful cast bumps the chosen option by one locally (optimistic),
//! raises a toast and records the poll in the [`VoteGuard`]. Two clients
//! voting at once each apply their own increment; the real count settles on
//! the next fetch.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use super::guard::VoteGuard;
use super::tally::{tally, TallyRow};
use super::types::{EndReason, Poll, VoteRequest};
use crate::config::{PollConfig, PollScope};
use crate::error::{ClientError, ClientResult};
use crate::id::RecordId;
use crate::session::{ApiRequest, SessionGateway};

/// Rejected poll transitions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PollError {
    #[error("Poll is still loading")]
    NotLoaded,

    #[error("Poll already loaded")]
    AlreadyLoaded,

    #[error("Poll has ended")]
    Ended(EndReason),

    #[error("You already voted in this poll")]
    AlreadyVoted,

    #[error("Select an option first")]
    NothingSelected,

    #[error("A vote is already being submitted")]
    CastInFlight,

    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("Loaded poll {got} does not match card {expected}")]
    WrongPoll { expected: RecordId, got: RecordId },
}

/// Display state of one poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollPhase {
    Loading,
    Open { selected: Option<String> },
    Submitting { selected: String },
    Voted,
    Ended(EndReason),
}

/// Transient confirmation shown after a successful cast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

impl Toast {
    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Result of resolving an in-flight cast
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CastResolution {
    Accepted,
    Failed,
    /// The card was no longer submitting, e.g. it was reloaded meanwhile
    Ignored,
}

/// One poll plus its display state
#[derive(Debug, Clone)]
pub struct PollCard {
    id: RecordId,
    poll: Option<Poll>,
    phase: PollPhase,
    toast: Option<Toast>,
    error: Option<String>,
}

impl PollCard {
    pub fn loading(id: RecordId) -> Self {
        Self {
            id,
            poll: None,
            phase: PollPhase::Loading,
            toast: None,
            error: None,
        }
    }

    /// Card for an already-fetched poll
    pub fn from_poll(poll: Poll, voted: bool, now: DateTime<Utc>) -> Self {
        let mut card = Self::loading(poll.id.clone());
        card.place(poll, voted, now);
        card
    }

    /// `Loading → {Open, Voted, Ended}`. Ended takes precedence over Voted.
    pub fn finish_loading(
        &mut self,
        poll: Poll,
        voted: bool,
        now: DateTime<Utc>,
    ) -> Result<&PollPhase, PollError> {
        if self.phase != PollPhase::Loading {
            return Err(PollError::AlreadyLoaded);
        }
        if poll.id != self.id {
            return Err(PollError::WrongPoll {
                expected: self.id.clone(),
                got: poll.id,
            });
        }
        self.place(poll, voted, now);
        Ok(&self.phase)
    }

    fn place(&mut self, poll: Poll, voted: bool, now: DateTime<Utc>) {
        self.phase = match poll.end_reason(now) {
            Some(reason) => PollPhase::Ended(reason),
            None if voted => PollPhase::Voted,
            None => PollPhase::Open { selected: None },
        };
        self.poll = Some(poll);
    }

    /// Replace counts with a fresh server copy.
    ///
    /// `voted` is the vote guard's answer for this poll. A card that is
    /// already Voted stays Voted, an in-flight cast stays in flight, and the
    /// ended check is re-run.
    pub fn refresh(
        &mut self,
        poll: Poll,
        voted: bool,
        now: DateTime<Utc>,
    ) -> Result<(), PollError> {
        if poll.id != self.id {
            return Err(PollError::WrongPoll {
                expected: self.id.clone(),
                got: poll.id,
            });
        }

        let voted = voted || self.phase == PollPhase::Voted;
        match &self.phase {
            PollPhase::Submitting { .. } => self.poll = Some(poll),
            PollPhase::Open { selected } if !voted => {
                let keep = selected.clone().filter(|k| poll.option(k).is_some());
                self.place(poll, voted, now);
                if let PollPhase::Open { selected } = &mut self.phase {
                    *selected = keep;
                }
            }
            _ => self.place(poll, voted, now),
        }
        Ok(())
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn poll(&self) -> Option<&Poll> {
        self.poll.as_ref()
    }

    pub fn phase(&self) -> &PollPhase {
        &self.phase
    }

    pub fn selected(&self) -> Option<&str> {
        match &self.phase {
            PollPhase::Open { selected } => selected.as_deref(),
            PollPhase::Submitting { selected } => Some(selected),
            _ => None,
        }
    }

    /// Whether the cast action is enabled right now
    pub fn can_cast(&self) -> bool {
        matches!(&self.phase, PollPhase::Open { selected: Some(_) })
    }

    /// Last cast failure, cleared on the next selection or cast
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn toast(&self, now: DateTime<Utc>) -> Option<&Toast> {
        self.toast.as_ref().filter(|t| t.is_visible(now))
    }

    pub fn tally(&self) -> Vec<TallyRow> {
        self.poll.as_ref().map(tally).unwrap_or_default()
    }

    /// Time-driven transition: an open poll whose end date passed becomes
    /// Ended
    pub fn expire(&mut self, now: DateTime<Utc>) -> bool {
        if !matches!(self.phase, PollPhase::Open { .. }) {
            return false;
        }
        match self.poll.as_ref().and_then(|p| p.end_reason(now)) {
            Some(reason) => {
                self.phase = PollPhase::Ended(reason);
                true
            }
            None => false,
        }
    }

    fn check_open(&mut self, now: DateTime<Utc>) -> Result<(), PollError> {
        self.expire(now);
        match &self.phase {
            PollPhase::Loading => Err(PollError::NotLoaded),
            PollPhase::Ended(reason) => Err(PollError::Ended(*reason)),
            PollPhase::Voted => Err(PollError::AlreadyVoted),
            PollPhase::Submitting { .. } => Err(PollError::CastInFlight),
            PollPhase::Open { .. } => Ok(()),
        }
    }

    /// Choose an option. Only valid while Open.
    pub fn select(&mut self, key: &str, now: DateTime<Utc>) -> Result<(), PollError> {
        self.check_open(now)?;

        let exists = self
            .poll
            .as_ref()
            .map(|p| p.option(key).is_some())
            .unwrap_or(false);
        if !exists {
            return Err(PollError::UnknownOption(key.to_string()));
        }

        self.error = None;
        self.phase = PollPhase::Open {
            selected: Some(key.to_string()),
        };
        Ok(())
    }

    /// `Open(selected) → Submitting`, yielding the request body to send
    pub fn begin_cast(&mut self, now: DateTime<Utc>) -> Result<VoteRequest, PollError> {
        self.check_open(now)?;

        let selected = match &self.phase {
            PollPhase::Open {
                selected: Some(key),
            } => key.clone(),
            _ => return Err(PollError::NothingSelected),
        };

        self.error = None;
        self.phase = PollPhase::Submitting {
            selected: selected.clone(),
        };

        Ok(VoteRequest {
            vote_id: self.id.to_string(),
            element_id: selected,
        })
    }

    /// Resolve the in-flight cast.
    ///
    /// On success the selected option gains exactly one vote and the card
    /// locks as Voted. On failure the card reopens with the same selection
    /// and an error message; nothing was incremented so nothing rolls back.
    pub fn complete_cast(
        &mut self,
        outcome: Result<(), String>,
        now: DateTime<Utc>,
        toast_duration: Duration,
    ) -> CastResolution {
        let selected = match &self.phase {
            PollPhase::Submitting { selected } => selected.clone(),
            other => {
                tracing::debug!(poll = %self.id, phase = ?other, "Ignoring stale cast result");
                return CastResolution::Ignored;
            }
        };

        match outcome {
            Ok(()) => {
                match self.poll.as_mut().and_then(|p| p.option_mut(&selected)) {
                    Some(option) => option.count += 1,
                    None => tracing::warn!(
                        poll = %self.id,
                        option = %selected,
                        "Voted option missing from current poll copy, count not bumped"
                    ),
                }
                self.phase = PollPhase::Voted;
                self.toast = match now.checked_add_signed(toast_duration) {
                    Some(expires_at) => Some(Toast {
                        message: "Vote Submitted! Thanks for participating!".to_string(),
                        expires_at,
                    }),
                    None => {
                        tracing::warn!(poll = %self.id, "Toast duration out of range, skipping toast");
                        None
                    }
                };
                CastResolution::Accepted
            }
            Err(message) => {
                self.phase = PollPhase::Open {
                    selected: Some(selected),
                };
                self.error = Some(message);
                CastResolution::Failed
            }
        }
    }
}

/// Longest toast honoured; larger configured values are clamped
const MAX_TOAST_MS: u64 = 24 * 60 * 60 * 1000;

fn toast_duration(ms: u64) -> Duration {
    Duration::milliseconds(ms.min(MAX_TOAST_MS) as i64)
}

/// Fetches polls and casts votes
#[derive(Clone)]
pub struct PollEngine {
    gateway: SessionGateway,
    guard: VoteGuard,
    config: PollConfig,
}

impl PollEngine {
    pub fn new(gateway: SessionGateway, guard: VoteGuard, config: PollConfig) -> Self {
        Self {
            gateway,
            guard,
            config,
        }
    }

    pub fn guard(&self) -> &VoteGuard {
        &self.guard
    }

    /// Fetch polls from the configured public scope
    pub async fn fetch_polls(&self) -> ClientResult<Vec<Poll>> {
        self.fetch_scope(self.config.scope).await
    }

    /// Fetch polls from an explicit scope.
    ///
    /// A body that is not a JSON array yields no polls rather than an error.
    pub async fn fetch_scope(&self, scope: PollScope) -> ClientResult<Vec<Poll>> {
        let response = self.gateway.send(ApiRequest::get(scope.path())).await?;
        let response = crate::error::expect_success(response)?;

        let value: serde_json::Value = response.json()?;
        if !value.is_array() {
            tracing::warn!(path = scope.path(), "Poll listing was not an array, ignoring");
            return Ok(Vec::new());
        }

        let polls: Vec<Poll> = serde_json::from_value(value)?;
        tracing::debug!(count = polls.len(), "Fetched polls");
        Ok(polls)
    }

    fn guard_says_voted(&self, id: &RecordId) -> bool {
        self.guard.has_voted(id).unwrap_or_else(|e| {
            tracing::warn!(poll = %id, "Vote guard unreadable: {}", e);
            false
        })
    }

    /// Build a card per poll, consulting the vote guard
    pub fn cards(&self, polls: Vec<Poll>, now: DateTime<Utc>) -> Vec<PollCard> {
        polls
            .into_iter()
            .map(|poll| {
                let voted = self.guard_says_voted(&poll.id);
                PollCard::from_poll(poll, voted, now)
            })
            .collect()
    }

    /// Refresh a card with a fresh server copy, consulting the vote guard
    pub fn refresh_card(
        &self,
        card: &mut PollCard,
        poll: Poll,
        now: DateTime<Utc>,
    ) -> Result<(), PollError> {
        let voted = self.guard_says_voted(&poll.id);
        card.refresh(poll, voted, now)
    }

    pub async fn load_cards(&self) -> ClientResult<Vec<PollCard>> {
        let polls = self.fetch_polls().await?;
        Ok(self.cards(polls, Utc::now()))
    }

    /// Cast the card's selected option.
    ///
    /// Invalid transitions, and polls the vote guard already holds, are
    /// rejected before any request is made.
    pub async fn cast(&self, card: &mut PollCard) -> ClientResult<()> {
        if self.guard_says_voted(card.id()) {
            return Err(PollError::AlreadyVoted.into());
        }
        let body = card.begin_cast(Utc::now())?;
        let toast = toast_duration(self.config.toast_duration_ms);

        tracing::info!(poll = %body.vote_id, option = %body.element_id, "Casting vote");

        let request = match ApiRequest::post("/votes").json(&body) {
            Ok(request) => request,
            Err(e) => {
                card.complete_cast(Err("Failed to cast vote".to_string()), Utc::now(), toast);
                return Err(e.into());
            }
        };

        match self.gateway.send(request).await {
            Ok(response) if response.is_success() => {
                card.complete_cast(Ok(()), Utc::now(), toast);
                if let Err(e) = self.guard.record(card.id()) {
                    tracing::error!(poll = %card.id(), "Failed to record vote locally: {}", e);
                }
                Ok(())
            }
            Ok(response) => {
                let err = ClientError::from_response(&response);
                let message = match err.server_message() {
                    Some(m) => format!("Failed to cast vote: {}", m),
                    None => "Failed to cast vote".to_string(),
                };
                tracing::warn!(poll = %card.id(), status = response.status, "Vote rejected");
                card.complete_cast(Err(message), Utc::now(), toast);
                Err(err)
            }
            Err(e) => {
                card.complete_cast(Err("Failed to cast vote".to_string()), Utc::now(), toast);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polls::types::sample_poll;
    use crate::session::test_support::gateway;
    use crate::session::{RequestBody, TransportError};
    use crate::store::LocalStore;

    fn toast() -> Duration {
        Duration::milliseconds(3000)
    }

    fn engine() -> (PollEngine, std::sync::Arc<crate::session::test_support::FakeTransport>) {
        let (gateway, transport) = gateway();
        let guard = VoteGuard::new(gateway.session().store().clone());
        (PollEngine::new(gateway, guard, PollConfig::default()), transport)
    }

    #[test]
    fn test_load_transitions() {
        let now = Utc::now();

        let card = PollCard::from_poll(sample_poll(&[("A", 0)]), false, now);
        assert_eq!(card.phase(), &PollPhase::Open { selected: None });

        let card = PollCard::from_poll(sample_poll(&[("A", 0)]), true, now);
        assert_eq!(card.phase(), &PollPhase::Voted);

        let mut poll = sample_poll(&[("A", 0)]);
        poll.is_active = false;
        let card = PollCard::from_poll(poll, true, now);
        assert_eq!(card.phase(), &PollPhase::Ended(EndReason::Archived));
    }

    #[test]
    fn test_finish_loading_guards() {
        let now = Utc::now();
        let mut card = PollCard::loading(RecordId::new("other"));
        assert_eq!(card.begin_cast(now), Err(PollError::NotLoaded));

        let err = card
            .finish_loading(sample_poll(&[("A", 0)]), false, now)
            .unwrap_err();
        assert!(matches!(err, PollError::WrongPoll { .. }));

        let mut card = PollCard::loading(RecordId::new("poll-1"));
        card.finish_loading(sample_poll(&[("A", 0)]), false, now).unwrap();
        assert_eq!(
            card.finish_loading(sample_poll(&[("A", 0)]), false, now),
            Err(PollError::AlreadyLoaded)
        );
    }

    #[test]
    fn test_successful_cast_increments_by_one() {
        let now = Utc::now();
        let mut card = PollCard::from_poll(sample_poll(&[("A", 3), ("B", 1)]), false, now);

        card.select("B", now).unwrap();
        assert!(card.can_cast());

        let body = card.begin_cast(now).unwrap();
        assert_eq!(body.vote_id, "poll-1");
        assert_eq!(body.element_id, "B");
        assert!(!card.can_cast());

        assert_eq!(card.complete_cast(Ok(()), now, toast()), CastResolution::Accepted);
        assert_eq!(card.phase(), &PollPhase::Voted);
        let counts: Vec<u64> = card.tally().iter().map(|r| r.count).collect();
        assert_eq!(counts, vec![3, 2]);
        assert!(card.toast(now).is_some());
        assert!(card.toast(now + Duration::seconds(4)).is_none());
        assert_eq!(card.selected(), None);
    }

    #[test]
    fn test_failed_cast_reopens_with_selection() {
        let now = Utc::now();
        let mut card = PollCard::from_poll(sample_poll(&[("A", 3)]), false, now);
        card.select("A", now).unwrap();
        card.begin_cast(now).unwrap();

        let resolution = card.complete_cast(Err("Failed to cast vote".into()), now, toast());
        assert_eq!(resolution, CastResolution::Failed);
        assert_eq!(
            card.phase(),
            &PollPhase::Open {
                selected: Some("A".to_string())
            }
        );
        assert_eq!(card.error(), Some("Failed to cast vote"));
        assert_eq!(card.poll().unwrap().total_votes(), 3);
        assert!(card.toast(now).is_none());
    }

    #[test]
    fn test_invalid_transitions_rejected() {
        let now = Utc::now();
        let mut card = PollCard::from_poll(sample_poll(&[("A", 0)]), false, now);
        assert_eq!(card.begin_cast(now), Err(PollError::NothingSelected));
        assert_eq!(
            card.select("Z", now),
            Err(PollError::UnknownOption("Z".to_string()))
        );

        card.select("A", now).unwrap();
        card.begin_cast(now).unwrap();
        assert_eq!(card.begin_cast(now), Err(PollError::CastInFlight));
        assert_eq!(card.select("A", now), Err(PollError::CastInFlight));

        card.complete_cast(Ok(()), now, toast());
        assert_eq!(card.select("A", now), Err(PollError::AlreadyVoted));
        assert_eq!(card.begin_cast(now), Err(PollError::AlreadyVoted));

        let mut poll = sample_poll(&[("A", 0)]);
        poll.end_date = now - Duration::seconds(1);
        let mut ended = PollCard::from_poll(poll, false, now);
        assert_eq!(
            ended.select("A", now),
            Err(PollError::Ended(EndReason::Expired))
        );
    }

    #[test]
    fn test_expires_while_open() {
        let now = Utc::now();
        let poll = sample_poll(&[("A", 0)]);
        let end = poll.end_date;
        let mut card = PollCard::from_poll(poll, false, now);
        card.select("A", now).unwrap();

        let later = end + Duration::seconds(1);
        assert_eq!(
            card.begin_cast(later),
            Err(PollError::Ended(EndReason::Expired))
        );
        assert_eq!(card.phase(), &PollPhase::Ended(EndReason::Expired));
    }

    #[test]
    fn test_stale_completion_ignored() {
        let now = Utc::now();
        let mut card = PollCard::from_poll(sample_poll(&[("A", 0)]), false, now);
        assert_eq!(card.complete_cast(Ok(()), now, toast()), CastResolution::Ignored);
        assert_eq!(card.poll().unwrap().total_votes(), 0);
    }

    #[test]
    fn test_refresh_settles_counts_and_keeps_vote() {
        let now = Utc::now();
        let mut card = PollCard::from_poll(sample_poll(&[("A", 1)]), false, now);
        card.select("A", now).unwrap();
        card.begin_cast(now).unwrap();
        card.complete_cast(Ok(()), now, toast());

        card.refresh(sample_poll(&[("A", 7)]), false, now).unwrap();
        assert_eq!(card.phase(), &PollPhase::Voted);
        assert_eq!(card.poll().unwrap().total_votes(), 7);
    }

    #[test]
    fn test_refresh_keeps_valid_selection() {
        let now = Utc::now();
        let mut card = PollCard::from_poll(sample_poll(&[("A", 1), ("B", 0)]), false, now);
        card.select("B", now).unwrap();

        card.refresh(sample_poll(&[("A", 2), ("B", 1)]), false, now).unwrap();
        assert_eq!(card.selected(), Some("B"));

        card.refresh(sample_poll(&[("A", 2)]), false, now).unwrap();
        assert_eq!(card.selected(), None);
    }

    #[test]
    fn test_refresh_mid_cast_without_option_still_locks() {
        let now = Utc::now();
        let mut card = PollCard::from_poll(sample_poll(&[("A", 1), ("B", 0)]), false, now);
        card.select("B", now).unwrap();
        card.begin_cast(now).unwrap();

        card.refresh(sample_poll(&[("A", 5)]), false, now).unwrap();
        assert_eq!(card.complete_cast(Ok(()), now, toast()), CastResolution::Accepted);
        assert_eq!(card.phase(), &PollPhase::Voted);
        assert_eq!(card.poll().unwrap().total_votes(), 5);
    }

    #[test]
    fn test_unrepresentable_toast_expiry_skips_toast() {
        let now = Utc::now();
        let mut card = PollCard::from_poll(sample_poll(&[("A", 0)]), false, now);
        card.select("A", now).unwrap();
        card.begin_cast(now).unwrap();

        let resolution = card.complete_cast(Ok(()), now, Duration::max_value());
        assert_eq!(resolution, CastResolution::Accepted);
        assert_eq!(card.phase(), &PollPhase::Voted);
        assert!(card.toast(now).is_none());
    }

    #[test]
    fn test_toast_duration_clamped() {
        assert_eq!(toast_duration(3000), Duration::milliseconds(3000));
        assert_eq!(toast_duration(u64::MAX), Duration::days(1));
    }

    #[tokio::test]
    async fn test_huge_toast_config_does_not_panic() {
        let (gateway, transport) = gateway();
        let guard = VoteGuard::new(gateway.session().store().clone());
        let config = PollConfig {
            toast_duration_ms: u64::MAX,
            ..PollConfig::default()
        };
        let engine = PollEngine::new(gateway, guard, config);
        transport.respond(200, "{}");

        let mut card = PollCard::from_poll(sample_poll(&[("A", 0)]), false, Utc::now());
        card.select("A", Utc::now()).unwrap();
        engine.cast(&mut card).await.unwrap();
        assert!(card.toast(Utc::now()).is_some());
    }

    #[tokio::test]
    async fn test_guarded_poll_stays_locked_after_unarchive() {
        let (engine, transport) = engine();
        engine.guard().record(&RecordId::new("poll-1")).unwrap();

        let mut archived = sample_poll(&[("A", 2)]);
        archived.is_active = false;
        let mut card = engine.cards(vec![archived], Utc::now()).remove(0);
        assert_eq!(card.phase(), &PollPhase::Ended(EndReason::Archived));

        engine
            .refresh_card(&mut card, sample_poll(&[("A", 2)]), Utc::now())
            .unwrap();
        assert_eq!(card.phase(), &PollPhase::Voted);
        assert_eq!(card.select("A", Utc::now()), Err(PollError::AlreadyVoted));

        // A card built without the guard's answer still cannot re-vote
        let mut reopened = PollCard::from_poll(sample_poll(&[("A", 2)]), false, Utc::now());
        reopened.select("A", Utc::now()).unwrap();
        let err = engine.cast(&mut reopened).await.unwrap_err();
        assert!(matches!(err, ClientError::Poll(PollError::AlreadyVoted)));
        assert!(transport.requests().is_empty());
        assert!(reopened.can_cast());
    }

    #[tokio::test]
    async fn test_engine_cast_records_guard() {
        let (engine, transport) = engine();
        transport.respond(201, r#"{"message":"Vote recorded"}"#);

        let mut card = PollCard::from_poll(sample_poll(&[("A", 3), ("B", 1)]), false, Utc::now());
        card.select("A", Utc::now()).unwrap();
        engine.cast(&mut card).await.unwrap();

        let req = transport.last_request();
        assert_eq!(req.path, "/votes");
        assert_eq!(
            req.body,
            RequestBody::Json(serde_json::json!({"voteId": "poll-1", "elementId": "A"}))
        );
        assert_eq!(card.phase(), &PollPhase::Voted);
        assert_eq!(card.tally()[0].count, 4);
        assert!(engine.guard().has_voted(card.id()).unwrap());

        // A second attempt from the same guard state never reaches the API
        let err = engine.cast(&mut card).await.unwrap_err();
        assert!(matches!(err, ClientError::Poll(PollError::AlreadyVoted)));
        assert_eq!(transport.requests().len(), 1);

        let reloaded = engine.cards(vec![sample_poll(&[("A", 4), ("B", 1)])], Utc::now());
        assert_eq!(reloaded[0].phase(), &PollPhase::Voted);
    }

    #[tokio::test]
    async fn test_engine_cast_rejected() {
        let (engine, transport) = engine();
        transport.respond(400, r#"{"message":"Poll is closed"}"#);

        let mut card = PollCard::from_poll(sample_poll(&[("A", 0)]), false, Utc::now());
        card.select("A", Utc::now()).unwrap();
        let err = engine.cast(&mut card).await.unwrap_err();

        assert_eq!(err.server_message(), Some("Poll is closed"));
        assert_eq!(card.error(), Some("Failed to cast vote: Poll is closed"));
        assert!(card.can_cast());
        assert!(!engine.guard().has_voted(card.id()).unwrap());
    }

    #[tokio::test]
    async fn test_engine_cast_network_failure() {
        let (engine, transport) = engine();
        transport.fail(TransportError::Unavailable("connection refused".into()));

        let mut card = PollCard::from_poll(sample_poll(&[("A", 0)]), false, Utc::now());
        card.select("A", Utc::now()).unwrap();
        let err = engine.cast(&mut card).await.unwrap_err();

        assert!(matches!(err, ClientError::Transport(_)));
        assert_eq!(card.poll().unwrap().total_votes(), 0);
        assert!(card.can_cast());
    }

    #[tokio::test]
    async fn test_fetch_non_array_is_empty() {
        let (engine, transport) = engine();
        transport.respond(200, r#"{"message":"no polls"}"#);
        assert!(engine.fetch_polls().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_scope_paths() {
        let (engine, transport) = engine();
        transport.respond(200, "[]");
        transport.respond(200, "[]");

        engine.fetch_scope(PollScope::Active).await.unwrap();
        engine.fetch_polls().await.unwrap();

        let paths: Vec<_> = transport.requests().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec!["/votes/active", "/votes"]);
    }

    #[test]
    fn test_guard_shared_with_session_store() {
        let store = LocalStore::in_memory();
        let guard = VoteGuard::new(store.clone());
        guard.record(&RecordId::new("poll-1")).unwrap();
        assert!(store.has_voted("poll-1").unwrap());
    }
}
