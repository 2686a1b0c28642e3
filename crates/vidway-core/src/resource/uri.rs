//! Resource URI scheme.
//!
//! Resources are addressed as `vidway://{kind}/{id}`. This three-part form
//! is persisted and externally visible; lookups parse exactly this shape and
//! reject anything else.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// The URI scheme under which resources are addressed.
pub const URI_SCHEME: &str = "vidway";

/// The kind segment of a resource URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// A saved set of search results.
    Search,
    /// A detail fetch (video metadata, channel info, comments).
    Detail,
    /// A generated artifact (rendered file, exported data).
    Artifact,
    /// A session overview record.
    Session,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Search => "search",
            ResourceKind::Detail => "detail",
            ResourceKind::Artifact => "artifact",
            ResourceKind::Session => "session",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "search" => Ok(ResourceKind::Search),
            "detail" => Ok(ResourceKind::Detail),
            "artifact" => Ok(ResourceKind::Artifact),
            "session" => Ok(ResourceKind::Session),
            other => Err(GatewayError::InvalidUri(format!(
                "unknown resource kind '{other}'"
            ))),
        }
    }
}

/// A parsed `vidway://{kind}/{id}` reference.
///
/// URIs are globally unique and immutable once assigned. They round-trip
/// through their string form exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceUri {
    kind: ResourceKind,
    id: String,
}

impl ResourceUri {
    pub fn new(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Parses a URI string, rejecting anything that is not exactly
    /// `vidway://{kind}/{id}`.
    pub fn parse(input: &str) -> Result<Self, GatewayError> {
        let rest = input
            .strip_prefix(URI_SCHEME)
            .and_then(|r| r.strip_prefix("://"))
            .ok_or_else(|| {
                GatewayError::InvalidUri(format!("expected scheme '{URI_SCHEME}://': '{input}'"))
            })?;

        let (kind, id) = rest.split_once('/').ok_or_else(|| {
            GatewayError::InvalidUri(format!("expected '{URI_SCHEME}://kind/id': '{input}'"))
        })?;

        if id.is_empty() || id.contains('/') {
            return Err(GatewayError::InvalidUri(format!(
                "malformed resource id in '{input}'"
            )));
        }

        Ok(Self {
            kind: kind.parse()?,
            id: id.to_string(),
        })
    }
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{URI_SCHEME}://{}/{}", self.kind, self.id)
    }
}

impl FromStr for ResourceUri {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ResourceUri {
    type Error = GatewayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ResourceUri> for String {
    fn from(uri: ResourceUri) -> Self {
        uri.to_string()
    }
}
