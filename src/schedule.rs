//! Stream schedule
//!
//! Plain CRUD over `/calendar`. Every call is one round trip and nothing is
//! cached. Weekday labels are computed from the entry's calendar date at
//! render time.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{expect_success, ClientError, ClientResult};
use crate::id::RecordId;
use crate::session::{ApiRequest, SessionGateway};

/// One scheduled stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    #[serde(rename = "_id")]
    pub id: RecordId,
    /// ISO date, possibly with a time part (`2026-03-14T00:00:00.000Z`)
    pub day: String,
    /// Free text such as "8:00 PM EST"
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub stream_title: String,
}

impl ScheduleEntry {
    /// Calendar date part of `day`
    pub fn date(&self) -> Option<NaiveDate> {
        parse_day(&self.day)
    }

    /// "Monday", "Tuesday", ...
    pub fn weekday_label(&self) -> Option<&'static str> {
        self.date().map(|d| weekday_name(d.weekday()))
    }
}

fn parse_day(day: &str) -> Option<NaiveDate> {
    let date_part = day.split('T').next().unwrap_or(day).trim();
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Create/edit form for a schedule entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDraft {
    pub day: String,
    pub stream_title: String,
    pub start_time: String,
}

impl ScheduleDraft {
    pub fn new(
        day: impl Into<String>,
        stream_title: impl Into<String>,
        start_time: impl Into<String>,
    ) -> Self {
        Self {
            day: day.into(),
            stream_title: stream_title.into(),
            start_time: start_time.into(),
        }
    }

    /// Edit form for an existing entry; keeps only the date part of `day`
    pub fn from_entry(entry: &ScheduleEntry) -> Self {
        Self {
            day: entry.day.split('T').next().unwrap_or_default().to_string(),
            stream_title: entry.stream_title.clone(),
            start_time: entry.start_time.clone(),
        }
    }

    pub fn validate(&self) -> ClientResult<()> {
        if parse_day(&self.day).is_none() {
            return Err(ClientError::Validation(format!(
                "Day must be a date (YYYY-MM-DD), got {:?}",
                self.day
            )));
        }
        if self.stream_title.trim().is_empty() {
            return Err(ClientError::Validation("Stream title is required".into()));
        }
        if self.start_time.trim().is_empty() {
            return Err(ClientError::Validation("Start time is required".into()));
        }
        Ok(())
    }
}

/// CRUD against the calendar endpoints
#[derive(Clone)]
pub struct ScheduleAccessor {
    gateway: SessionGateway,
}

impl ScheduleAccessor {
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

    pub async fn list(&self) -> ClientResult<Vec<ScheduleEntry>> {
        let response = expect_success(self.gateway.send(ApiRequest::get("/calendar")).await?)?;
        let entries: Vec<ScheduleEntry> = response.json()?;
        tracing::debug!(count = entries.len(), "Fetched schedule");
        Ok(entries)
    }

    pub async fn create(&self, draft: &ScheduleDraft) -> ClientResult<()> {
        draft.validate()?;
        self.require_login()?;
        let request = ApiRequest::post("/calendar").json(draft)?;
        expect_success(self.gateway.send(request).await?)?;
        tracing::info!(title = %draft.stream_title, day = %draft.day, "Schedule entry added");
        Ok(())
    }

    pub async fn update(&self, id: &RecordId, draft: &ScheduleDraft) -> ClientResult<()> {
        draft.validate()?;
        self.require_login()?;
        let request = ApiRequest::put(format!("/calendar/{}", id.path_segment())).json(draft)?;
        expect_success(self.gateway.send(request).await?)?;
        tracing::info!(entry = %id, "Schedule entry updated");
        Ok(())
    }

    pub async fn delete(&self, id: &RecordId) -> ClientResult<()> {
        self.require_login()?;
        let request = ApiRequest::delete(format!("/calendar/{}", id.path_segment()));
        expect_success(self.gateway.send(request).await?)?;
        tracing::info!(entry = %id, "Schedule entry deleted");
        Ok(())
    }
}
