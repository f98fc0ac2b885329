//! Profile loading
//!
//! `GET /users` answers with either the profile object or an array of
//! profiles. The first element wins when it is an array.

use super::types::Profile;
use crate::error::{expect_success, ClientError, ClientResult};
use crate::session::{ApiRequest, SessionGateway};

#[derive(Clone)]
pub struct ProfileFetcher {
    gateway: SessionGateway,
}

impl ProfileFetcher {
    pub fn new(gateway: SessionGateway) -> Self {
        Self { gateway }
    }

    pub async fn fetch(&self) -> ClientResult<Profile> {
        let response = expect_success(self.gateway.send(ApiRequest::get("/users")).await?)?;
        let value: serde_json::Value = response.json()?;
        decode_profile(value)
    }
}

pub(crate) fn decode_profile(value: serde_json::Value) -> ClientResult<Profile> {
    let value = match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::NotFound("profile".to_string()))?,
        other => other,
    };
    Ok(serde_json::from_value(value)?)
}
