//! Settings editor
//!
//! Holds a local draft of the profile and turns it into a `PUT /users`
//! payload. Two rules shape the payload:
//!
//! - an empty password is omitted entirely, never sent blank
//! - social links missing a platform or URL are dropped
//!
//! A photo can be set as a URL directly, or by selecting a file and
//! uploading it. The upload has to finish and fill in `photoUrl` before the
//! profile is saved, so [`SettingsEditor::save`] uploads any pending file
//! first and aborts if that fails.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::fetcher::decode_profile;
use super::types::{Profile, SocialLink};
use crate::error::{expect_success, ClientError, ClientResult};
use crate::session::{ApiRequest, FilePart, SessionGateway};

/// Multipart field name expected by `POST /users/upload-photo`
const PHOTO_FIELD: &str = "photo";

/// A selected image that has not been uploaded yet
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPhoto {
    pub source: PathBuf,
    pub file_name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl PendingPhoto {
    pub fn from_path(path: &Path) -> ClientResult<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "photo".to_string());

        Ok(Self {
            source: path.to_path_buf(),
            mime_type: guess_image_mime(path).map(str::to_string),
            file_name,
            bytes,
        })
    }

    /// Local preview reference, never a hosted URL
    pub fn preview(&self) -> String {
        format!("file://{}", self.source.display())
    }

    fn into_part(self) -> FilePart {
        FilePart {
            field: PHOTO_FIELD.to_string(),
            file_name: self.file_name,
            mime_type: self.mime_type,
            bytes: self.bytes,
        }
    }
}

fn guess_image_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Editable copy of the profile
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsDraft {
    pub name: String,
    pub info: String,
    /// Blank means "leave unchanged"
    pub password: String,
    pub photo_url: String,
    pub social_links: Vec<SocialLink>,
    pending_photo: Option<PendingPhoto>,
}

impl SettingsDraft {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            info: profile.info.clone(),
            password: String::new(),
            photo_url: profile.photo_url.clone(),
            social_links: profile.social_links.clone(),
            pending_photo: None,
        }
    }

    pub fn add_social_link(&mut self) {
        self.social_links.push(SocialLink::default());
    }

    pub fn set_social_link(&mut self, index: usize, link: SocialLink) -> ClientResult<()> {
        let slot = self.social_links.get_mut(index).ok_or_else(|| {
            ClientError::Validation(format!("No social link at position {}", index))
        })?;
        *slot = link;
        Ok(())
    }

    pub fn remove_social_link(&mut self, index: usize) -> Option<SocialLink> {
        (index < self.social_links.len()).then(|| self.social_links.remove(index))
    }

    /// Direct URL mode. Discards any selected file.
    pub fn set_photo_url(&mut self, url: impl Into<String>) {
        self.photo_url = url.into();
        self.pending_photo = None;
    }

    /// File mode. `photo_url` keeps its old value until the upload lands.
    pub fn select_photo(&mut self, photo: PendingPhoto) {
        self.pending_photo = Some(photo);
    }

    pub fn pending_photo(&self) -> Option<&PendingPhoto> {
        self.pending_photo.as_ref()
    }

    /// What the avatar should show right now
    pub fn photo_preview(&self) -> String {
        match &self.pending_photo {
            Some(p) => p.preview(),
            None => self.photo_url.clone(),
        }
    }

    /// Body of `PUT /users`
    pub fn payload(&self) -> ProfileUpdate {
        ProfileUpdate {
            name: self.name.clone(),
            info: self.info.clone(),
            password: Some(self.password.clone()).filter(|p| !p.is_empty()),
            photo_url: self.photo_url.clone(),
            social_links: self
                .social_links
                .iter()
                .filter(|l| l.is_complete())
                .cloned()
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: String,
    pub info: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub photo_url: String,
    pub social_links: Vec<SocialLink>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    photo_url: String,
}

/// Loads and saves the owner's profile
#[derive(Clone)]
pub struct SettingsEditor {
    gateway: SessionGateway,
}

impl SettingsEditor {
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

    /// Fetch the current profile into a fresh draft
    pub async fn load(&self) -> ClientResult<SettingsDraft> {
        let response = expect_success(self.gateway.send(ApiRequest::get("/users")).await?)?;
        let profile = decode_profile(response.json()?)?;
        Ok(SettingsDraft::from_profile(&profile))
    }

    /// Upload the selected file and point `photo_url` at the hosted copy.
    ///
    /// On failure the file stays selected and `photo_url` is untouched.
    pub async fn upload_photo(&self, draft: &mut SettingsDraft) -> ClientResult<String> {
        self.require_login()?;

        let photo = draft
            .pending_photo
            .clone()
            .ok_or_else(|| ClientError::Validation("No photo selected".into()))?;

        let request = ApiRequest::post("/users/upload-photo").multipart(photo.into_part());
        let response = expect_success(self.gateway.send(request).await?)?;
        let uploaded: UploadResponse = response.json()?;

        tracing::info!(url = %uploaded.photo_url, "Photo uploaded");
        draft.photo_url = uploaded.photo_url.clone();
        draft.pending_photo = None;
        Ok(uploaded.photo_url)
    }

    /// Save the draft, uploading a pending photo first.
    ///
    /// Returns the updated profile when the server echoes one back.
    pub async fn save(&self, draft: &mut SettingsDraft) -> ClientResult<Option<Profile>> {
        self.require_login()?;

        if draft.pending_photo.is_some() {
            self.upload_photo(draft).await?;
        }

        let payload = draft.payload();
        let request = ApiRequest::put("/users").json(&payload)?;
        let response = expect_success(self.gateway.send(request).await?)?;

        tracing::info!(
            password_changed = payload.password.is_some(),
            links = payload.social_links.len(),
            "Profile updated"
        );

        draft.password.clear();
        Ok(response
            .json::<serde_json::Value>()
            .ok()
            .and_then(|v| decode_profile(v).ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::test_support::{gateway, logged_in_gateway};
    use crate::session::{Method, RequestBody};
    use tempfile::tempdir;

    fn draft() -> SettingsDraft {
        SettingsDraft::from_profile(&Profile {
            id: None,
            name: "Mochi".into(),
            info: "cozy".into(),
            photo_url: "https://cdn.example.com/old.png".into(),
            social_links: vec![
                SocialLink::new("twitch", "https://twitch.tv/mochi"),
                SocialLink::new("", "https://orphan.example.com"),
                SocialLink::new("youtube", ""),
            ],
        })
    }

    fn pending(dir: &Path) -> PendingPhoto {
        let path = dir.join("avatar.png");
        std::fs::write(&path, b"\x89PNG fake").unwrap();
        PendingPhoto::from_path(&path).unwrap()
    }

    #[test]
    fn test_empty_password_key_absent() {
        let payload = serde_json::to_value(draft().payload()).unwrap();
        assert!(payload.get("password").is_none());

        let mut d = draft();
        d.password = "hunter2".into();
        let payload = serde_json::to_value(d.payload()).unwrap();
        assert_eq!(payload["password"], "hunter2");
    }

    #[test]
    fn test_incomplete_links_dropped() {
        let payload = serde_json::to_value(draft().payload()).unwrap();
        assert_eq!(
            payload["socialLinks"],
            serde_json::json!([{"platform": "twitch", "url": "https://twitch.tv/mochi"}])
        );
        assert_eq!(payload["photoUrl"], "https://cdn.example.com/old.png");
    }

    #[test]
    fn test_social_link_editing() {
        let mut d = draft();
        d.add_social_link();
        assert_eq!(d.social_links.len(), 4);

        d.set_social_link(3, SocialLink::new("discord", "https://discord.gg/x"))
            .unwrap();
        assert!(d.set_social_link(10, SocialLink::default()).is_err());

        assert!(d.remove_social_link(1).is_some());
        assert!(d.remove_social_link(10).is_none());
        assert_eq!(d.payload().social_links.len(), 2);
    }

    #[test]
    fn test_photo_modes_exclusive() {
        let dir = tempdir().unwrap();
        let mut d = draft();

        d.select_photo(pending(dir.path()));
        assert!(d.photo_preview().starts_with("file://"));
        assert_eq!(d.photo_url, "https://cdn.example.com/old.png");

        d.set_photo_url("https://cdn.example.com/new.png");
        assert!(d.pending_photo().is_none());
        assert_eq!(d.photo_preview(), "https://cdn.example.com/new.png");
    }

    #[test]
    fn test_pending_photo_mime() {
        let dir = tempdir().unwrap();
        let photo = pending(dir.path());
        assert_eq!(photo.file_name, "avatar.png");
        assert_eq!(photo.mime_type.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn test_save_uploads_first() {
        let dir = tempdir().unwrap();
        let (gateway, transport) = logged_in_gateway();
        transport.respond(200, r#"{"photoUrl":"https://cdn.example.com/hosted.png"}"#);
        transport.respond(200, r#"{"name":"Mochi"}"#);

        let editor = SettingsEditor::new(gateway);
        let mut d = draft();
        d.select_photo(pending(dir.path()));

        let saved = editor.save(&mut d).await.unwrap();
        assert_eq!(saved.map(|p| p.name).as_deref(), Some("Mochi"));

        let reqs = transport.requests();
        assert_eq!(reqs[0].path, "/users/upload-photo");
        assert!(matches!(&reqs[0].body, RequestBody::Multipart(p) if p.field == "photo"));
        assert_eq!((reqs[1].method, reqs[1].path.as_str()), (Method::Put, "/users"));
        match &reqs[1].body {
            RequestBody::Json(body) => {
                assert_eq!(body["photoUrl"], "https://cdn.example.com/hosted.png")
            }
            other => panic!("unexpected body {:?}", other),
        }
        assert!(d.pending_photo().is_none());
    }

    #[tokio::test]
    async fn test_failed_upload_aborts_save() {
        let dir = tempdir().unwrap();
        let (gateway, transport) = logged_in_gateway();
        transport.respond(413, r#"{"message":"File too large"}"#);

        let editor = SettingsEditor::new(gateway);
        let mut d = draft();
        d.select_photo(pending(dir.path()));

        let err = editor.save(&mut d).await.unwrap_err();
        assert_eq!(err.server_message(), Some("File too large"));
        assert_eq!(transport.requests().len(), 1);
        assert!(d.pending_photo().is_some());
        assert_eq!(d.photo_url, "https://cdn.example.com/old.png");
    }

    #[tokio::test]
    async fn test_save_requires_login() {
        let (gateway, transport) = gateway();
        let err = SettingsEditor::new(gateway)
            .save(&mut draft())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotLoggedIn));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_load_blanks_password() {
        let (gateway, transport) = logged_in_gateway();
        transport.respond(200, r#"{"name":"Mochi","password":"$argon2$hash"}"#);

        let d = SettingsEditor::new(gateway).load().await.unwrap();
        assert_eq!(d.name, "Mochi");
        assert_eq!(d.password, "");
    }
}
