//! Poll management (owner only)
//!
//! Create, edit, archive and unarchive. Drafts are validated locally before
//! anything is sent; the server still has the final say.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::types::Poll;
use crate::error::{expect_success, ClientError, ClientResult};
use crate::id::RecordId;
use crate::session::{ApiRequest, SessionGateway};

/// One option line of a poll form
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OptionDraft {
    /// Present when editing an existing option
    pub id: Option<RecordId>,
    pub label: String,
}

impl OptionDraft {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: None,
            label: label.into(),
        }
    }
}

/// Poll form state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollDraft {
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub options: Vec<OptionDraft>,
}

impl PollDraft {
    /// Blank form: starts now, ends in 24 hours, two empty options
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            title: String::new(),
            start_date: now,
            end_date: now + Duration::hours(24),
            options: vec![OptionDraft::default(), OptionDraft::default()],
        }
    }

    /// Edit form prefilled from an existing poll
    pub fn from_poll(poll: &Poll) -> Self {
        Self {
            title: poll.title.clone(),
            start_date: poll.start_date,
            end_date: poll.end_date,
            options: poll
                .elements
                .iter()
                .map(|e| OptionDraft {
                    id: e.id.clone(),
                    label: e.label.clone(),
                })
                .collect(),
        }
    }

    pub fn add_option(&mut self) {
        self.options.push(OptionDraft::default());
    }

    /// Options with a non-blank label, in form order
    fn filled_options(&self) -> impl Iterator<Item = &OptionDraft> {
        self.options.iter().filter(|o| !o.label.trim().is_empty())
    }

    pub fn validate(&self) -> ClientResult<()> {
        if self.title.trim().is_empty() {
            return Err(ClientError::Validation("Poll title is required".into()));
        }
        if self.filled_options().next().is_none() {
            return Err(ClientError::Validation(
                "At least one option needs a label".into(),
            ));
        }
        if self.end_date <= self.start_date {
            return Err(ClientError::Validation(
                "End date must be after start date".into(),
            ));
        }
        Ok(())
    }

    /// Body of `POST /votes/create`
    pub fn create_payload(&self) -> CreatePollPayload {
        CreatePollPayload {
            title: self.title.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            elements: self
                .filled_options()
                .map(|o| NewElement {
                    label: o.label.clone(),
                    count: 0,
                })
                .collect(),
        }
    }

    /// Body of `PUT /votes/:id`
    pub fn update_payload(&self) -> UpdatePollPayload {
        UpdatePollPayload {
            title: self.title.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            elements: self
                .filled_options()
                .map(|o| EditedElement {
                    id: o.id.clone(),
                    label: o.label.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollPayload {
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub elements: Vec<NewElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewElement {
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePollPayload {
    pub title: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub elements: Vec<EditedElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditedElement {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub label: String,
}

/// Owner-side poll operations
#[derive(Clone)]
pub struct PollManager {
    gateway: SessionGateway,
}

impl PollManager {
    pub fn new(gateway: SessionGateway) -> Self {
        Self { gateway }
    }

    fn require_login(&self) -> ClientResult<()> {
        if self.gateway.session().is_logged_in() {
            Ok(())
        } else {
            Err(ClientError::NotLoggedIn)
        }
    }

    /// Every poll, archived ones included
    pub async fn list(&self) -> ClientResult<Vec<Poll>> {
        let response = expect_success(self.gateway.send(ApiRequest::get("/votes")).await?)?;
        let value: serde_json::Value = response.json()?;
        if !value.is_array() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_value(value)?)
    }

    pub async fn create(&self, draft: &PollDraft) -> ClientResult<()> {
        draft.validate()?;
        self.require_login()?;

        let request = ApiRequest::post("/votes/create").json(&draft.create_payload())?;
        expect_success(self.gateway.send(request).await?)?;

        tracing::info!(title = %draft.title, "Poll created");
        Ok(())
    }

    pub async fn update(&self, id: &RecordId, draft: &PollDraft) -> ClientResult<()> {
        draft.validate()?;
        self.require_login()?;

        let request = ApiRequest::put(format!("/votes/{}", id.path_segment()))
            .json(&draft.update_payload())?;
        expect_success(self.gateway.send(request).await?)?;

        tracing::info!(poll = %id, "Poll updated");
        Ok(())
    }

    /// Sets `isActive = false`, which ends the poll
    pub async fn archive(&self, id: &RecordId) -> ClientResult<()> {
        self.set_archived(id, true).await
    }

    pub async fn unarchive(&self, id: &RecordId) -> ClientResult<()> {
        self.set_archived(id, false).await
    }

    async fn set_archived(&self, id: &RecordId, archived: bool) -> ClientResult<()> {
        self.require_login()?;

        let action = if archived { "archive" } else { "unarchive" };
        let request = ApiRequest::put(format!("/votes/{}/{}", id.path_segment(), action));
        expect_success(self.gateway.send(request).await?)?;

        tracing::info!(poll = %id, action, "Poll state changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polls::types::sample_poll;
    use crate::session::test_support::{gateway, logged_in_gateway};
    use crate::session::{Method, RequestBody};

    fn filled_draft() -> PollDraft {
        let mut draft = PollDraft::new(Utc::now());
        draft.title = "What game next?".into();
        draft.options[0].label = "Hades".into();
        draft.options[1].label = "   ".into();
        draft.add_option();
        draft.options[2].label = "Celeste".into();
        draft
    }

    #[test]
    fn test_new_draft_defaults() {
        let now = Utc::now();
        let draft = PollDraft::new(now);
        assert_eq!(draft.end_date - draft.start_date, Duration::hours(24));
        assert_eq!(draft.options.len(), 2);
        assert!(draft.validate().is_err());
    }

    #[test]
    fn test_create_payload_filters_blank_options() {
        let payload = serde_json::to_value(filled_draft().create_payload()).unwrap();
        assert_eq!(
            payload["elements"],
            serde_json::json!([{"label": "Hades", "count": 0}, {"label": "Celeste", "count": 0}])
        );
        assert!(payload.get("startDate").is_some());
        assert!(payload.get("endDate").is_some());
    }

    #[test]
    fn test_update_payload_keeps_ids() {
        let mut poll = sample_poll(&[("A", 4), ("B", 2)]);
        poll.elements[0].id = Some(RecordId::new("e1"));

        let draft = PollDraft::from_poll(&poll);
        let payload = serde_json::to_value(draft.update_payload()).unwrap();
        assert_eq!(
            payload["elements"],
            serde_json::json!([{"_id": "e1", "label": "A"}, {"label": "B"}])
        );
        assert_eq!(payload["title"], "Next game?");
    }

    #[test]
    fn test_validation() {
        let mut draft = filled_draft();
        assert!(draft.validate().is_ok());

        draft.end_date = draft.start_date;
        assert!(matches!(draft.validate(), Err(ClientError::Validation(_))));

        let mut draft = filled_draft();
        draft.title = "  ".into();
        assert!(matches!(draft.validate(), Err(ClientError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_requires_login() {
        let (gateway, transport) = gateway();
        let manager = PollManager::new(gateway);

        let err = manager.create(&filled_draft()).await.unwrap_err();
        assert!(matches!(err, ClientError::NotLoggedIn));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_create_sends_authenticated() {
        let (gateway, transport) = logged_in_gateway();
        transport.respond(201, "{}");
        let manager = PollManager::new(gateway);

        manager.create(&filled_draft()).await.unwrap();
        let req = transport.last_request();
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.path, "/votes/create");
        assert_eq!(req.bearer_token.as_deref(), Some("test-token"));
        assert!(matches!(req.body, RequestBody::Json(_)));
    }

    #[tokio::test]
    async fn test_archive_and_unarchive_paths() {
        let (gateway, transport) = logged_in_gateway();
        transport.respond(200, "{}");
        transport.respond(200, "{}");
        let manager = PollManager::new(gateway);
        let id = RecordId::new("p9");

        manager.archive(&id).await.unwrap();
        manager.unarchive(&id).await.unwrap();

        let reqs = transport.requests();
        assert_eq!(reqs[0].path, "/votes/p9/archive");
        assert_eq!(reqs[1].path, "/votes/p9/unarchive");
        assert!(reqs.iter().all(|r| r.method == Method::Put));
    }

    #[tokio::test]
    async fn test_update_rejection_surfaces_message() {
        let (gateway, transport) = logged_in_gateway();
        transport.respond(400, r#"{"message":"Cannot edit an ended poll"}"#);
        let manager = PollManager::new(gateway);

        let err = manager
            .update(&RecordId::new("p1"), &filled_draft())
            .await
            .unwrap_err();
        assert_eq!(err.server_message(), Some("Cannot edit an ended poll"));
        assert_eq!(transport.last_request().path, "/votes/p1");
    }

    #[tokio::test]
    async fn test_expired_session_during_archive() {
        let (gateway, transport) = logged_in_gateway();
        transport.respond(401, "");
        let manager = PollManager::new(gateway.clone());

        let err = manager.archive(&RecordId::new("p1")).await.unwrap_err();
        assert!(matches!(err, ClientError::Unauthorized));
        assert!(!gateway.session().is_logged_in());
    }
}
