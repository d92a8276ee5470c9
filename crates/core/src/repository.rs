//! Repository references.
//!
//! A `RepositoryRef` names a repository and the branch to read. The branch
//! may be empty until the default branch has been resolved.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// An immutable reference to `owner/name` at a branch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryRef {
    owner: String,
    name: String,
    #[serde(default)]
    branch: String,
}

impl RepositoryRef {
    /// Create a reference. Pass an empty `branch` to use the default branch.
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            branch: branch.into(),
        }
    }

    /// A reference that still needs its default branch resolved.
    pub fn unresolved(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(owner, name, "")
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// `owner/name`, without the branch.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Whether a concrete branch is known.
    pub fn is_resolved(&self) -> bool {
        !self.branch.is_empty()
    }

    /// A copy of this reference pinned to `branch`.
    pub fn with_branch(&self, branch: impl Into<String>) -> Self {
        Self {
            owner: self.owner.clone(),
            name: self.name.clone(),
            branch: branch.into(),
        }
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.branch.is_empty() {
            write!(f, "{}/{}", self.owner, self.name)
        } else {
            write!(f, "{}/{}@{}", self.owner, self.name, self.branch)
        }
    }
}

/// Accepts `owner/name`, `owner/name@branch`, and GitHub URLs of the form
/// `https://github.com/owner/name[.git][/tree/branch]`.
impl FromStr for RepositoryRef {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let invalid = || Error::InvalidReference(input.to_string());

        let without_scheme = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
            .unwrap_or(trimmed);

        if let Some(rest) = without_scheme
            .strip_prefix("github.com/")
            .or_else(|| without_scheme.strip_prefix("www.github.com/"))
        {
            let mut parts = rest.trim_end_matches('/').split('/');
            let owner = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
            let name = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
            let name = name.trim_end_matches(".git");
            let branch = match (parts.next(), parts.next()) {
                (Some("tree"), Some(branch)) if !branch.is_empty() => {
                    // Branch names may contain slashes.
                    let tail: Vec<&str> = parts.collect();
                    if tail.is_empty() {
                        branch.to_string()
                    } else {
                        format!("{branch}/{}", tail.join("/"))
                    }
                }
                (None, _) => String::new(),
                _ => return Err(invalid()),
            };
            return Ok(Self::new(owner, name, branch));
        }

        let (repo, branch) = match trimmed.split_once('@') {
            Some((repo, branch)) if !branch.is_empty() => (repo, branch),
            Some(_) => return Err(invalid()),
            None => (trimmed, ""),
        };

        match repo.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self::new(owner, name, branch))
            }
            _ => Err(invalid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_owner_name() {
        let r: RepositoryRef = "tokio-rs/axum".parse().unwrap();
        assert_eq!(r.owner(), "tokio-rs");
        assert_eq!(r.name(), "axum");
        assert!(!r.is_resolved());
    }

    #[test]
    fn parse_owner_name_branch() {
        let r: RepositoryRef = "tokio-rs/axum@v0.8".parse().unwrap();
        assert_eq!(r.branch(), "v0.8");
        assert_eq!(r.to_string(), "tokio-rs/axum@v0.8");
    }

    #[test]
    fn parse_github_url() {
        let r: RepositoryRef = "https://github.com/serde-rs/serde".parse().unwrap();
        assert_eq!(r.full_name(), "serde-rs/serde");
        assert_eq!(r.branch(), "");

        let r: RepositoryRef = "https://github.com/serde-rs/serde.git/".parse().unwrap();
        assert_eq!(r.name(), "serde");
    }

    #[test]
    fn parse_github_tree_url_with_slashed_branch() {
        let r: RepositoryRef = "https://github.com/acme/app/tree/release/1.x"
            .parse()
            .unwrap();
        assert_eq!(r.full_name(), "acme/app");
        assert_eq!(r.branch(), "release/1.x");
    }

    #[test]
    fn reject_malformed_references() {
        for bad in ["", "justname", "/name", "owner/", "a/b/c", "a/b@", "https://github.com/only"] {
            assert!(bad.parse::<RepositoryRef>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn with_branch_keeps_original() {
        let r = RepositoryRef::unresolved("o", "n");
        let pinned = r.with_branch("main");
        assert_eq!(r.branch(), "");
        assert_eq!(pinned.branch(), "main");
        assert!(pinned.is_resolved());
    }
}
