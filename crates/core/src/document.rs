//! Documentation candidates and their relevance tiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// File extensions recognised as documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocExtension {
    Md,
    Mdx,
    Txt,
    Rst,
    Rdoc,
}

impl DocExtension {
    pub const ALL: [DocExtension; 5] = [
        DocExtension::Md,
        DocExtension::Mdx,
        DocExtension::Txt,
        DocExtension::Rst,
        DocExtension::Rdoc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocExtension::Md => "md",
            DocExtension::Mdx => "mdx",
            DocExtension::Txt => "txt",
            DocExtension::Rst => "rst",
            DocExtension::Rdoc => "rdoc",
        }
    }

    /// Match the extension of `path`, case-insensitively.
    pub fn from_path(path: &str) -> Option<Self> {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        let (_, ext) = file_name.rsplit_once('.')?;
        let ext = ext.to_ascii_lowercase();
        Self::ALL.into_iter().find(|e| e.as_str() == ext)
    }
}

impl fmt::Display for DocExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A repository-relative path to a documentation file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidatePath {
    pub path: String,
    pub extension: DocExtension,
}

impl CandidatePath {
    /// Build a candidate if `path` carries a documentation extension.
    pub fn from_path(path: impl Into<String>) -> Option<Self> {
        let path = path.into();
        let extension = DocExtension::from_path(&path)?;
        Some(Self { path, extension })
    }

    /// The file name, without directories.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Lowercased file name with the documentation extension stripped.
    pub fn file_stem(&self) -> String {
        let name = self.file_name();
        let stem = name
            .len()
            .checked_sub(self.extension.as_str().len() + 1)
            .map(|end| &name[..end])
            .unwrap_or(name);
        stem.to_lowercase()
    }
}

impl fmt::Display for CandidatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Priority bucket for a documentation file. Declaration order is fetch
/// priority: `Essential` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelevanceTier {
    Essential,
    Guide,
    Reference,
    Additional,
    Excluded,
}

impl RelevanceTier {
    pub const ALL: [RelevanceTier; 5] = [
        RelevanceTier::Essential,
        RelevanceTier::Guide,
        RelevanceTier::Reference,
        RelevanceTier::Additional,
        RelevanceTier::Excluded,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RelevanceTier::Essential => "Essential",
            RelevanceTier::Guide => "Guides",
            RelevanceTier::Reference => "Reference",
            RelevanceTier::Additional => "Additional",
            RelevanceTier::Excluded => "Excluded",
        }
    }
}

impl fmt::Display for RelevanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A candidate with the tier the classifier assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedPath {
    #[serde(flatten)]
    pub candidate: CandidatePath,
    pub tier: RelevanceTier,
}

impl ClassifiedPath {
    pub fn new(candidate: CandidatePath, tier: RelevanceTier) -> Self {
        Self { candidate, tier }
    }

    pub fn path(&self) -> &str {
        &self.candidate.path
    }
}
