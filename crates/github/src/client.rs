//! GitHub repository source.
//!
//! Uses the REST API for repository metadata and tree listings, and the
//! raw content host for file bodies.
//!
//! Features:
//! - Optional `Bearer` token authentication (private repos, higher limits)
//! - `X-GitHub-Api-Version` pinned
//! - Primary and secondary rate limits mapped to `RateLimited` with a
//!   retry-after hint
//! - Configurable base URLs (GitHub Enterprise, tests)

use async_trait::async_trait;
use ghdocs_config::GitHubConfig;
use ghdocs_core::error::{Error, SourceError};
use ghdocs_core::source::{EntryKind, RepositorySource, TreeEntry, TreeListing};
use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

const API_VERSION: &str = "2022-11-28";
const ACCEPT_JSON: &str = "application/vnd.github+json";
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// A [`RepositorySource`] backed by GitHub.
pub struct GitHubClient {
    api_url: Url,
    raw_url: Url,
    token: Option<String>,
    client: reqwest::Client,
}

impl GitHubClient {
    /// Create a client for public github.com with default settings.
    pub fn new() -> Result<Self, Error> {
        Self::from_config(&GitHubConfig::default())
    }

    /// Create a client from the `[github]` config section.
    pub fn from_config(config: &GitHubConfig) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            api_url: parse_base(&config.api_url)?,
            raw_url: parse_base(&config.raw_url)?,
            token: config.token.clone(),
            client,
        })
    }

    /// Use a token for authentication.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Build `base/seg1/seg2/...`, percent-encoding each segment.
    fn endpoint<'a>(
        base: &Url,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<Url, SourceError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| SourceError::Network(format!("Invalid base URL: {base}")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, url: Url, accept: &str) -> Result<reqwest::Response, SourceError> {
        debug!(url = %url, "GitHub request");

        let mut request = self
            .client
            .get(url)
            .header("Accept", accept)
            .header("X-GitHub-Api-Version", API_VERSION);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        request.send().await.map_err(map_transport_error)
    }
}

fn parse_base(raw: &str) -> Result<Url, Error> {
    Url::parse(raw.trim_end_matches('/')).map_err(|e| Error::Config {
        message: format!("Invalid base URL '{raw}': {e}"),
    })
}

fn map_transport_error(e: reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout(e.to_string())
    } else {
        SourceError::Network(e.to_string())
    }
}

/// Map a non-success status to a `SourceError`. `subject` names what was
/// requested, for the error message.
async fn status_error(response: reqwest::Response, subject: &str) -> SourceError {
    let status = response.status();
    let headers = response.headers().clone();

    if status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN && rate_limit_exhausted(&headers))
    {
        return SourceError::RateLimited {
            retry_after_secs: retry_after(&headers),
        };
    }

    let body = response.text().await.unwrap_or_default();
    match status {
        StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => {
            SourceError::NotFound(subject.to_string())
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            SourceError::Forbidden(format!("{subject}: {}", status.as_u16()))
        }
        s if s.is_server_error() => SourceError::Server {
            status_code: s.as_u16(),
            message: body,
        },
        s => {
            warn!(status = s.as_u16(), body = %body, "Unexpected GitHub response");
            SourceError::Network(format!("{subject}: unexpected status {}", s.as_u16()))
        }
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

fn rate_limit_exhausted(headers: &HeaderMap) -> bool {
    header_u64(headers, "x-ratelimit-remaining") == Some(0) || headers.contains_key("retry-after")
}

/// Seconds to wait, from `retry-after` or the `x-ratelimit-reset` epoch.
fn retry_after(headers: &HeaderMap) -> u64 {
    if let Some(secs) = header_u64(headers, "retry-after") {
        return secs;
    }
    if let Some(reset) = header_u64(headers, "x-ratelimit-reset") {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        return reset.saturating_sub(now).max(1);
    }
    DEFAULT_RETRY_AFTER_SECS
}

// --- GitHub API response types ---

#[derive(Debug, Deserialize)]
struct RepoResponse {
    default_branch: String,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeItem>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeItem {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

impl TreeItem {
    fn into_entry(self) -> Option<TreeEntry> {
        let kind = match self.kind.as_str() {
            "blob" => EntryKind::Blob,
            "tree" => EntryKind::Tree,
            "commit" => EntryKind::Commit,
            _ => return None,
        };
        Some(TreeEntry {
            path: self.path,
            kind,
        })
    }
}

#[async_trait]
impl RepositorySource for GitHubClient {
    fn name(&self) -> &str {
        "github"
    }

    async fn default_branch(&self, owner: &str, name: &str) -> Result<String, SourceError> {
        let url = Self::endpoint(&self.api_url, ["repos", owner, name])?;
        let response = self.get(url, ACCEPT_JSON).await?;
        if !response.status().is_success() {
            return Err(status_error(response, &format!("repository {owner}/{name}")).await);
        }

        let repo: RepoResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(format!("Failed to parse repository metadata: {e}")))?;
        Ok(repo.default_branch)
    }

    async fn list_tree(
        &self,
        owner: &str,
        name: &str,
        branch: &str,
    ) -> Result<TreeListing, SourceError> {
        let mut url = Self::endpoint(&self.api_url, ["repos", owner, name, "git", "trees", branch])?;
        url.query_pairs_mut().append_pair("recursive", "1");

        let response = self.get(url, ACCEPT_JSON).await?;
        let status = response.status();

        // An empty repository has no tree at all.
        if status == StatusCode::CONFLICT {
            debug!(repository = %format!("{owner}/{name}"), "Repository is empty");
            return Ok(TreeListing::default());
        }
        if !status.is_success() {
            return Err(status_error(response, &format!("branch {branch}")).await);
        }

        let tree: TreeResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Decode(format!("Failed to parse tree listing: {e}")))?;

        Ok(TreeListing {
            entries: tree
                .tree
                .into_iter()
                .filter_map(TreeItem::into_entry)
                .collect(),
            truncated: tree.truncated,
        })
    }

    async fn fetch_raw(
        &self,
        owner: &str,
        name: &str,
        branch: &str,
        path: &str,
    ) -> Result<String, SourceError> {
        let segments = [owner, name]
            .into_iter()
            .chain(branch.split('/'))
            .chain(path.split('/'));
        let url = Self::endpoint(&self.raw_url, segments)?;

        let response = self.get(url, "text/plain").await?;
        if !response.status().is_success() {
            return Err(status_error(response, path).await);
        }

        let bytes = response.bytes().await.map_err(map_transport_error)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| SourceError::Decode(format!("{path} is not valid UTF-8: {e}")))
    }

    async fn health_check(&self) -> Result<bool, SourceError> {
        let url = Self::endpoint(&self.api_url, ["rate_limit"])?;
        let response = self.get(url, ACCEPT_JSON).await?;
        Ok(response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client_for(server: &mockito::ServerGuard) -> GitHubClient {
        let config = GitHubConfig {
            api_url: server.url(),
            raw_url: format!("{}/raw", server.url()),
            request_timeout_secs: 5,
            ..GitHubConfig::default()
        };
        GitHubClient::from_config(&config).unwrap()
    }

    #[tokio::test]
    async fn default_branch_is_read_from_metadata() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/acme/app")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"full_name":"acme/app","default_branch":"trunk"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        assert_eq!(client.default_branch("acme", "app").await.unwrap(), "trunk");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_repository_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/acme/ghost")
            .with_status(404)
            .with_body(r#"{"message":"Not Found"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.default_branch("acme", "ghost").await.unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
    }

    #[tokio::test]
    async fn tree_listing_keeps_order_and_kinds() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/acme/app/git/trees/main")
            .match_query(Matcher::UrlEncoded("recursive".into(), "1".into()))
            .with_status(200)
            .with_body(
                r#"{
                    "sha": "abc",
                    "tree": [
                        {"path": "README.md", "type": "blob", "mode": "100644"},
                        {"path": "docs", "type": "tree", "mode": "040000"},
                        {"path": "docs/guide.md", "type": "blob", "mode": "100644"},
                        {"path": "vendor/lib", "type": "commit", "mode": "160000"}
                    ],
                    "truncated": false
                }"#,
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let listing = client.list_tree("acme", "app", "main").await.unwrap();
        let paths: Vec<_> = listing.entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["README.md", "docs", "docs/guide.md", "vendor/lib"]);
        assert_eq!(listing.entries[1].kind, EntryKind::Tree);
        assert_eq!(listing.entries[3].kind, EntryKind::Commit);
        assert!(!listing.truncated);
    }

    #[tokio::test]
    async fn empty_repository_lists_nothing() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/repos/acme/empty/git/trees/main")
            .match_query(Matcher::Any)
            .with_status(409)
            .with_body(r#"{"message":"Git Repository is empty."}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let listing = client.list_tree("acme", "empty", "main").await.unwrap();
        assert!(listing.entries.is_empty());
    }

    #[tokio::test]
    async fn raw_fetch_returns_content() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/raw/acme/app/main/docs/guide.md")
            .with_status(200)
            .with_body("# Guide\n")
            .create_async()
            .await;

        let client = client_for(&server);
        let body = client
            .fetch_raw("acme", "app", "main", "docs/guide.md")
            .await
            .unwrap();
        assert_eq!(body, "# Guide\n");
    }

    #[tokio::test]
    async fn raw_fetch_rejects_invalid_utf8() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/raw/acme/app/main/bad.txt")
            .with_status(200)
            .with_body(vec![0xff, 0xfe, 0x00, 0x41])
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .fetch_raw("acme", "app", "main", "bad.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));
    }

    #[tokio::test]
    async fn status_codes_map_to_source_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/raw/acme/app/main/limited.md")
            .with_status(429)
            .with_header("retry-after", "7")
            .create_async()
            .await;
        server
            .mock("GET", "/raw/acme/app/main/exhausted.md")
            .with_status(403)
            .with_header("x-ratelimit-remaining", "0")
            .with_header("retry-after", "11")
            .create_async()
            .await;
        server
            .mock("GET", "/raw/acme/app/main/private.md")
            .with_status(403)
            .create_async()
            .await;
        server
            .mock("GET", "/raw/acme/app/main/flaky.md")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let client = client_for(&server);
        let fetch = |path: &'static str| {
            let client = &client;
            async move { client.fetch_raw("acme", "app", "main", path).await.unwrap_err() }
        };

        assert_eq!(
            fetch("limited.md").await,
            SourceError::RateLimited { retry_after_secs: 7 }
        );
        assert_eq!(
            fetch("exhausted.md").await,
            SourceError::RateLimited {
                retry_after_secs: 11
            }
        );
        assert!(matches!(fetch("private.md").await, SourceError::Forbidden(_)));
        assert!(matches!(
            fetch("flaky.md").await,
            SourceError::Server {
                status_code: 502,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn token_is_sent_as_bearer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/acme/private")
            .match_header("authorization", "Bearer ghp_test")
            .with_status(200)
            .with_body(r#"{"default_branch":"main"}"#)
            .create_async()
            .await;

        let client = client_for(&server).with_token("ghp_test");
        assert_eq!(client.default_branch("acme", "private").await.unwrap(), "main");
        mock.assert_async().await;
    }

    #[test]
    fn endpoint_percent_encodes_segments() {
        let base = Url::parse("https://raw.example.com").unwrap();
        let url = GitHubClient::endpoint(&base, ["o", "n", "main", "docs", "a b.md"]).unwrap();
        assert_eq!(url.as_str(), "https://raw.example.com/o/n/main/docs/a%20b.md");
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let config = GitHubConfig {
            api_url: "not a url".into(),
            ..GitHubConfig::default()
        };
        assert!(matches!(
            GitHubClient::from_config(&config),
            Err(Error::Config { .. })
        ));
    }
}
