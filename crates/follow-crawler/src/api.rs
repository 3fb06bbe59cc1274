//! The remote API seam: account identifiers, page and profile records, and the
//! [`SocialApi`] trait with its HTTP implementation.

use crate::config::CrawlerConfig;
use crate::error::{ApiFailure, CrawlError, FailureKind};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cursor value requesting the first page of a listing.
pub const START_CURSOR: i64 = -1;
/// Cursor value signalling that no further pages exist.
pub const END_CURSOR: i64 = 0;

/// Stable numeric identity of one account. Used as graph node identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for AccountId {
    fn from(id: u64) -> Self {
        AccountId(id)
    }
}

/// Addresses an account either by numeric id or by handle, never both.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountRef {
    Id(AccountId),
    Handle(String),
}

impl AccountRef {
    pub fn kind(&self) -> IdKind {
        match self {
            AccountRef::Id(_) => IdKind::NumericId,
            AccountRef::Handle(_) => IdKind::Handle,
        }
    }

    /// Query parameter pair addressing this account.
    pub fn query_pair(&self) -> (&'static str, String) {
        match self {
            AccountRef::Id(id) => ("user_id", id.to_string()),
            AccountRef::Handle(handle) => ("screen_name", handle.clone()),
        }
    }
}

impl fmt::Display for AccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountRef::Id(id) => write!(f, "{}", id),
            AccountRef::Handle(handle) => write!(f, "@{}", handle),
        }
    }
}

impl From<AccountId> for AccountRef {
    fn from(id: AccountId) -> Self {
        AccountRef::Id(id)
    }
}

/// Addressing mode of an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    Handle,
    NumericId,
}

/// Which side of the follow relation a listing enumerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListRole {
    /// Accounts the target follows
    Friends,
    /// Accounts following the target
    Followers,
}

impl ListRole {
    pub fn endpoint(self) -> &'static str {
        match self {
            ListRole::Friends => "friends/ids",
            ListRole::Followers => "followers/ids",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ListRole::Friends => "friends",
            ListRole::Followers => "followers",
        }
    }
}

/// One page of an id listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdPage {
    pub ids: Vec<AccountId>,
    pub next_cursor: i64,
}

impl IdPage {
    pub fn is_last(&self) -> bool {
        self.next_cursor == END_CURSOR
    }
}

/// Profile attributes for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: AccountId,
    #[serde(rename = "screen_name", alias = "handle")]
    pub handle: String,
    #[serde(default)]
    pub followers_count: u64,
}

/// A single `users/lookup` request: one addressing mode, at most one batch of identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserBatch {
    Ids(Vec<AccountId>),
    Handles(Vec<String>),
}

impl UserBatch {
    pub fn len(&self) -> usize {
        match self {
            UserBatch::Ids(ids) => ids.len(),
            UserBatch::Handles(handles) => handles.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn query_pair(&self) -> (&'static str, String) {
        match self {
            UserBatch::Ids(ids) => (
                "user_id",
                ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(","),
            ),
            UserBatch::Handles(handles) => ("screen_name", handles.join(",")),
        }
    }
}

/// The four remote call shapes the crawler depends on.
///
/// Implementations perform exactly one attempt per call and report failures as
/// tagged [`ApiFailure`] values; retrying is the executor's job.
#[async_trait]
pub trait SocialApi: Send + Sync {
    /// `friends/ids` or `followers/ids`, one page starting at `cursor`.
    async fn list_ids(
        &self,
        role: ListRole,
        account: &AccountRef,
        cursor: i64,
        count: usize,
    ) -> Result<IdPage, ApiFailure>;

    /// `users/lookup` for one batch.
    async fn lookup_users(&self, batch: &UserBatch) -> Result<Vec<ProfileRecord>, ApiFailure>;

    /// `users/show` by handle.
    async fn show_user(&self, handle: &str) -> Result<ProfileRecord, ApiFailure>;
}

/// [`SocialApi`] over HTTPS with bearer-token authentication.
pub struct HttpSocialApi {
    client: Client,
    api_base: String,
    bearer_token: String,
}

impl HttpSocialApi {
    pub fn new(config: &CrawlerConfig) -> crate::error::Result<Self> {
        if config.bearer_token.is_empty() {
            return Err(CrawlError::Config(
                "API bearer token is required. Set SOCIAL_API_BEARER_TOKEN environment variable."
                    .to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!("follow-crawler/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CrawlError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            bearer_token: config.bearer_token.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiFailure> {
        let response = self
            .client
            .get(format!("{}/{}.json", self.api_base, endpoint))
            .bearer_auth(&self.bearer_token)
            .query(query)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(200).collect();
            return Err(ApiFailure::from_status(
                status.as_u16(),
                format!("HTTP {}: {}", status, excerpt),
            ));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiFailure::transport(format!("malformed response: {}", e)))
    }
}

fn classify_transport_error(e: reqwest::Error) -> ApiFailure {
    if let Some(status) = e.status() {
        return ApiFailure::from_status(status.as_u16(), e.to_string());
    }
    if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() || e.is_decode() {
        ApiFailure::transport(e.to_string())
    } else {
        ApiFailure::new(FailureKind::Fatal, e.to_string())
    }
}

#[async_trait]
impl SocialApi for HttpSocialApi {
    async fn list_ids(
        &self,
        role: ListRole,
        account: &AccountRef,
        cursor: i64,
        count: usize,
    ) -> Result<IdPage, ApiFailure> {
        let query = [
            account.query_pair(),
            ("cursor", cursor.to_string()),
            ("count", count.to_string()),
        ];
        self.get_json(role.endpoint(), &query).await
    }

    async fn lookup_users(&self, batch: &UserBatch) -> Result<Vec<ProfileRecord>, ApiFailure> {
        self.get_json("users/lookup", &[batch.query_pair()]).await
    }

    async fn show_user(&self, handle: &str) -> Result<ProfileRecord, ApiFailure> {
        self.get_json("users/show", &[("screen_name", handle.to_string())])
            .await
    }
}
