//! Per-file fetch outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a single file could not be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    NotFound,
    Forbidden,
    RateLimited,
    NetworkTimeout,
    Network,
    Server,
    DecodeError,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FetchErrorKind::NotFound => "not found",
            FetchErrorKind::Forbidden => "forbidden",
            FetchErrorKind::RateLimited => "rate limited",
            FetchErrorKind::NetworkTimeout => "network timeout",
            FetchErrorKind::Network => "network error",
            FetchErrorKind::Server => "server error",
            FetchErrorKind::DecodeError => "decode error",
        };
        f.write_str(s)
    }
}

/// The outcome of fetching one path. Exactly one of content or error is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FetchResultRepr")]
pub struct FetchResult {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<FetchErrorKind>,
    /// Human-readable detail for the error, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    /// How many calls were made, including retries.
    attempts: u32,
}

/// Wire form of [`FetchResult`], checked before it becomes one.
#[derive(Deserialize)]
struct FetchResultRepr {
    path: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    error: Option<FetchErrorKind>,
    #[serde(default)]
    detail: Option<String>,
    attempts: u32,
}

impl TryFrom<FetchResultRepr> for FetchResult {
    type Error = String;

    fn try_from(repr: FetchResultRepr) -> Result<Self, Self::Error> {
        match (&repr.content, &repr.error) {
            (Some(_), Some(_)) => Err(format!(
                "fetch result for {} has both content and an error",
                repr.path
            )),
            (None, None) => Err(format!(
                "fetch result for {} has neither content nor an error",
                repr.path
            )),
            _ => Ok(Self {
                path: repr.path,
                content: repr.content,
                error: repr.error,
                detail: repr.detail,
                attempts: repr.attempts,
            }),
        }
    }
}

impl FetchResult {
    pub fn success(path: impl Into<String>, content: impl Into<String>, attempts: u32) -> Self {
        Self {
            path: path.into(),
            content: Some(content.into()),
            error: None,
            detail: None,
            attempts,
        }
    }

    pub fn failure(
        path: impl Into<String>,
        error: FetchErrorKind,
        detail: impl Into<String>,
        attempts: u32,
    ) -> Self {
        Self {
            path: path.into(),
            content: None,
            error: Some(error),
            detail: Some(detail.into()),
            attempts,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn error(&self) -> Option<FetchErrorKind> {
        self.error
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_success(&self) -> bool {
        self.content.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_has_content_only() {
        let r = FetchResult::success("README.md", "# Hello", 1);
        assert!(r.is_success());
        assert_eq!(r.content(), Some("# Hello"));
        assert_eq!(r.error(), None);
        assert_eq!(r.detail(), None);
    }

    #[test]
    fn failure_has_error_only() {
        let r = FetchResult::failure("gone.md", FetchErrorKind::NotFound, "404", 1);
        assert!(!r.is_success());
        assert_eq!(r.content(), None);
        assert_eq!(r.error(), Some(FetchErrorKind::NotFound));
    }

    #[test]
    fn serialized_result_omits_absent_side() {
        let r = FetchResult::failure("x.md", FetchErrorKind::RateLimited, "429", 3);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["error"], "rate_limited");
        assert!(json.get("content").is_none());
        assert_eq!(json["attempts"], 3);
    }

    #[test]
    fn deserialize_keeps_one_outcome() {
        let r = FetchResult::success("README.md", "# Hello", 2);
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(serde_json::from_str::<FetchResult>(&json).unwrap(), r);

        let both = r#"{"path":"a.md","content":"x","error":"not_found","attempts":1}"#;
        let err = serde_json::from_str::<FetchResult>(both).unwrap_err();
        assert!(err.to_string().contains("both content and an error"));

        let neither = r#"{"path":"a.md","attempts":1}"#;
        let err = serde_json::from_str::<FetchResult>(neither).unwrap_err();
        assert!(err.to_string().contains("neither content nor an error"));
    }
}
