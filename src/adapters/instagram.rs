//! Instagram Graph API client.
//!
//! Provides the authenticated session, the profile's media feed, media
//! downloads and resumable reel uploads. One logged-in client implements all
//! three collaborator traits.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::{
    ApiFailure, AuthError, ContentFeed, FeedError, FeedPage, FetchError, MediaFetcher,
    MediaPublisher, PublishError, PublishReceipt,
};
use crate::domain::{ContentItem, MediaKind};

/// Fields requested for each media node of the feed
const MEDIA_FIELDS: &str = "id,media_type,media_url,permalink,timestamp,like_count";

/// Connection settings for the Graph API
#[derive(Debug, Clone)]
pub struct InstagramConfig {
    /// Graph API host
    pub api_base: String,

    /// Host accepting resumable video uploads
    pub upload_base: String,

    /// Graph API version segment, e.g. `v21.0`
    pub api_version: String,

    /// Media nodes requested per feed page
    pub page_size: u32,

    /// Wait between upload container status checks
    pub status_poll_interval: Duration,

    /// Status checks before giving up on a container
    pub max_status_polls: u32,

    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for InstagramConfig {
    fn default() -> Self {
        Self {
            api_base: "https://graph.instagram.com".to_string(),
            upload_base: "https://rupload.facebook.com".to_string(),
            api_version: "v21.0".to_string(),
            page_size: 50,
            status_poll_interval: Duration::from_secs(5),
            max_status_polls: 60,
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// Logged-in Graph API client
pub struct InstagramClient {
    config: InstagramConfig,
    access_token: String,
    /// Professional account id the token belongs to
    user_id: String,
    username: String,
    client: reqwest::Client,
}

/// Failure of a single API call, before it is mapped to a stage error
#[derive(Debug)]
enum CallError {
    Transport(String),
    Api(ApiFailure),
    Malformed(String),
}

impl From<reqwest::Error> for CallError {
    fn from(e: reqwest::Error) -> Self {
        CallError::Transport(e.to_string())
    }
}

impl From<CallError> for AuthError {
    fn from(e: CallError) -> Self {
        match e {
            CallError::Transport(msg) | CallError::Malformed(msg) => AuthError::Transport(msg),
            CallError::Api(failure) => AuthError::Rejected(failure),
        }
    }
}

impl From<CallError> for FeedError {
    fn from(e: CallError) -> Self {
        match e {
            CallError::Transport(msg) => FeedError::Transport(msg),
            CallError::Api(failure) => FeedError::Api(failure),
            CallError::Malformed(msg) => FeedError::Malformed(msg),
        }
    }
}

impl From<CallError> for PublishError {
    fn from(e: CallError) -> Self {
        match e {
            CallError::Transport(msg) | CallError::Malformed(msg) => PublishError::Transport(msg),
            CallError::Api(failure) => PublishError::Api(failure),
        }
    }
}

/// `{"error": {...}}` envelope returned on failed calls
#[derive(Debug, Deserialize)]
struct GraphErrorEnvelope {
    error: GraphError,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    message: String,
    #[serde(default)]
    code: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    username: String,
}

#[derive(Debug, Deserialize)]
struct MediaPage {
    #[serde(default)]
    data: Vec<MediaNode>,
    #[serde(default)]
    paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
struct Paging {
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MediaNode {
    id: String,
    media_type: String,
    #[serde(default)]
    media_url: Option<String>,
    #[serde(default)]
    permalink: Option<String>,
    timestamp: String,
    #[serde(default)]
    like_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ContainerResponse {
    id: String,
    #[serde(default)]
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    status_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: String,
}

impl InstagramClient {
    /// Log in with an access token and confirm it belongs to `username`
    pub async fn login(
        username: &str,
        access_token: &str,
        config: InstagramConfig,
    ) -> Result<Self, AuthError> {
        let mut client = Self::unverified(config, access_token)
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let url = client.api_url("me");
        let request = client.client.get(&url).query(&[
            ("fields", "user_id,username"),
            ("access_token", client.access_token.as_str()),
        ]);
        let me: MeResponse = send(request).await?;

        if !me.username.eq_ignore_ascii_case(username) {
            return Err(AuthError::AccountMismatch {
                expected: username.to_string(),
                actual: me.username,
            });
        }

        client.user_id = me
            .user_id
            .or(me.id)
            .ok_or_else(|| AuthError::Transport("Login response carried no account id".into()))?;
        client.username = me.username;

        info!(username = %client.username, user_id = %client.user_id, "Logged in");
        Ok(client)
    }

    /// Client with a token but no verified account yet
    fn unverified(config: InstagramConfig, access_token: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            config,
            access_token: access_token.to_string(),
            user_id: String::new(),
            username: String::new(),
            client,
        })
    }

    /// Account the session is bound to
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Build Graph API URL
    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.api_version,
            path
        )
    }

    /// Upload endpoint for a container, when the API did not hand one out
    fn upload_url(&self, container_id: &str) -> String {
        format!(
            "{}/ig-api-upload/{}/{}",
            self.config.upload_base.trim_end_matches('/'),
            self.config.api_version,
            container_id
        )
    }

    async fn create_container(&self, caption: &str) -> Result<ContainerResponse, PublishError> {
        let url = self.api_url(&format!("{}/media", self.user_id));
        let request = self.client.post(&url).form(&[
            ("media_type", "REELS"),
            ("upload_type", "resumable"),
            ("caption", caption),
            ("access_token", self.access_token.as_str()),
        ]);
        Ok(send(request).await?)
    }

    async fn upload(&self, upload_url: &str, path: &Path) -> Result<(), PublishError> {
        let (file, size) = open_for_upload(path).await?;

        let request = self
            .client
            .post(upload_url)
            .header("Authorization", format!("OAuth {}", self.access_token))
            .header("offset", "0")
            .header("file_size", size.to_string())
            .body(file);
        let response: UploadResponse = send(request).await?;

        if !response.success {
            return Err(PublishError::Api(ApiFailure {
                code: None,
                message: response
                    .message
                    .unwrap_or_else(|| "upload not acknowledged".to_string()),
            }));
        }

        debug!(bytes = size, "Uploaded video");
        Ok(())
    }

    async fn wait_until_ready(&self, container_id: &str) -> Result<(), PublishError> {
        let url = self.api_url(container_id);

        for poll in 1..=self.config.max_status_polls {
            let request = self.client.get(&url).query(&[
                ("fields", "status_code"),
                ("access_token", self.access_token.as_str()),
            ]);
            let status: StatusResponse = send(request).await?;
            let code = status.status_code.unwrap_or_default();
            debug!(container_id, poll, status = %code, "Container status");

            match code.as_str() {
                "FINISHED" | "PUBLISHED" => return Ok(()),
                "ERROR" | "EXPIRED" => {
                    return Err(PublishError::Rejected {
                        container_id: container_id.to_string(),
                        status: code,
                    })
                }
                _ => {
                    if let Some(wait) = self.status_wait_after(poll) {
                        tokio::time::sleep(wait).await;
                    }
                }
            }
        }

        Err(PublishError::ProcessingTimeout {
            container_id: container_id.to_string(),
            polls: self.config.max_status_polls,
        })
    }

    /// Delay before the next status check; none after the last one
    fn status_wait_after(&self, poll: u32) -> Option<Duration> {
        (poll < self.config.max_status_polls).then_some(self.config.status_poll_interval)
    }

    async fn publish_container(&self, container_id: &str) -> Result<String, PublishError> {
        let url = self.api_url(&format!("{}/media_publish", self.user_id));
        let request = self.client.post(&url).form(&[
            ("creation_id", container_id),
            ("access_token", self.access_token.as_str()),
        ]);
        let published: IdResponse = send(request).await?;
        Ok(published.id)
    }
}

#[async_trait]
impl ContentFeed for InstagramClient {
    fn name(&self) -> &str {
        "instagram"
    }

    async fn next_page(&self, cursor: Option<&str>) -> Result<FeedPage, FeedError> {
        let request = match cursor {
            // `paging.next` is a complete URL, token included
            Some(next) => self.client.get(next),
            None => {
                let url = self.api_url(&format!("{}/media", self.user_id));
                self.client.get(&url).query(&[
                    ("fields", MEDIA_FIELDS.to_string()),
                    ("limit", self.config.page_size.to_string()),
                    ("access_token", self.access_token.clone()),
                ])
            }
        };

        let page: MediaPage = send(request).await?;
        let items = page
            .data
            .into_iter()
            .map(MediaNode::into_item)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FeedPage {
            items,
            next_cursor: page.paging.and_then(|p| p.next),
        })
    }
}

#[async_trait]
impl MediaFetcher for InstagramClient {
    fn name(&self) -> &str {
        "instagram"
    }

    async fn fetch(
        &self,
        item: &ContentItem,
        dest_dir: &Path,
    ) -> Result<Vec<PathBuf>, FetchError> {
        let external = |reason: String| FetchError::External {
            item_id: item.id.clone(),
            reason,
        };

        if item.media_url.is_empty() {
            return Err(external("item has no media URL".to_string()));
        }

        let mut response = self
            .client
            .get(&item.media_url)
            .send()
            .await
            .map_err(|e| external(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(external(format!("media URL returned {}", status)));
        }

        let path = dest_dir.join(format!("{}.mp4", file_safe(&item.id)));
        let mut file = File::create(&path)
            .await
            .map_err(|e| external(format!("cannot create {}: {}", path.display(), e)))?;

        let written = async {
            let mut total = 0usize;
            while let Some(chunk) = response.chunk().await.map_err(|e| e.to_string())? {
                file.write_all(&chunk).await.map_err(|e| e.to_string())?;
                total += chunk.len();
            }
            file.flush().await.map_err(|e| e.to_string())?;
            Ok::<usize, String>(total)
        }
        .await;

        match written {
            Ok(bytes) => {
                debug!(item_id = %item.id, bytes, "Media stream written");
                Ok(vec![path])
            }
            Err(reason) => {
                let _ = fs::remove_file(&path).await;
                Err(external(reason))
            }
        }
    }
}

#[async_trait]
impl MediaPublisher for InstagramClient {
    fn name(&self) -> &str {
        "instagram"
    }

    async fn publish(&self, path: &Path, caption: &str) -> Result<PublishReceipt, PublishError> {
        let container = self.create_container(caption).await?;
        debug!(container_id = %container.id, "Created upload container");

        let upload_url = container
            .uri
            .clone()
            .unwrap_or_else(|| self.upload_url(&container.id));
        self.upload(&upload_url, path).await?;

        self.wait_until_ready(&container.id).await?;
        let media_id = self.publish_container(&container.id).await?;

        Ok(PublishReceipt { media_id })
    }
}

impl MediaNode {
    fn into_item(self) -> Result<ContentItem, FeedError> {
        let created_at = parse_graph_timestamp(&self.timestamp).map_err(|e| {
            FeedError::Malformed(format!(
                "media {} has unreadable timestamp '{}': {}",
                self.id, self.timestamp, e
            ))
        })?;

        let kind = if self.media_type.eq_ignore_ascii_case("VIDEO") {
            MediaKind::Video
        } else {
            MediaKind::Other
        };

        let mut item = ContentItem::new(
            self.id,
            created_at,
            self.like_count.unwrap_or(0),
            kind,
            self.media_url.unwrap_or_default(),
        );
        item.permalink = self.permalink;
        Ok(item)
    }
}

/// Parse Graph API timestamps (`2024-05-01T12:30:00+0000`), falling back to RFC 3339
fn parse_graph_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|dt| dt.with_timezone(&Utc))
}

/// Send a request and decode a JSON body, surfacing Graph API error envelopes
/// Open a staged video for a streamed upload and report its size
async fn open_for_upload(path: &Path) -> Result<(File, u64), PublishError> {
    let read_error = |source: std::io::Error| match source.kind() {
        std::io::ErrorKind::NotFound => PublishError::MissingFile(path.to_path_buf()),
        _ => PublishError::Read {
            path: path.to_path_buf(),
            source,
        },
    };

    let file = File::open(path).await.map_err(read_error)?;
    let size = file.metadata().await.map_err(read_error)?.len();
    Ok((file, size))
}

async fn send<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T, CallError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(CallError::Api(api_failure(status.as_u16(), &body)));
    }

    serde_json::from_str(&body).map_err(|e| CallError::Malformed(e.to_string()))
}

/// Extract the API error from a failed response body
fn api_failure(status: u16, body: &str) -> ApiFailure {
    match serde_json::from_str::<GraphErrorEnvelope>(body) {
        Ok(envelope) => ApiFailure {
            code: envelope.error.code,
            message: envelope.error.message,
        },
        Err(_) => ApiFailure {
            code: Some(i64::from(status)),
            message: body.chars().take(200).collect(),
        },
    }
}

/// Keep ids usable as file names
fn file_safe(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}
