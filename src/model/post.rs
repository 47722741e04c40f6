//! Remote listing types
//!
//! The listing is an XML document whose root carries `count` and `offset`
//! attributes and contains one `<post .../>` element per result. Every post
//! field is an attribute, so the deserialize names carry quick-xml's `@`
//! prefix while the JSON payload written to the database uses the bare name.
//!
//! Boards send numeric attributes as empty strings when they have no value
//! (`parent_id=""` on almost every post), so numeric fields go through
//! `empty_as_default` / `empty_as_none` instead of the plain integer parser.
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// One page of the remote listing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename = "posts")]
pub struct ListingPage {
    /// Total number of matches. Only trusted on the first page of a run.
    /// Required, so that a non-listing document fails to decode.
    #[serde(rename = "@count")]
    pub count: u64,

    /// Offset of the first post on this page
    #[serde(rename = "@offset", default)]
    pub offset: u64,

    #[serde(rename = "post", default)]
    pub posts: Vec<RemotePost>,
}

impl ListingPage {
    /// Number of pages a run will request for this result set, page 0 included.
    ///
    /// This is `count / page_size` with integer division, so a trailing
    /// partial page is never requested. Page 0 is always fetched, hence the
    /// lower bound of one.
    pub fn page_count(&self, page_size: u64) -> u64 {
        (self.count / page_size.max(1)).max(1)
    }
}

/// Immutable snapshot of one remote post
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RemotePost {
    #[serde(
        rename(serialize = "height", deserialize = "@height"),
        deserialize_with = "empty_as_default"
    )]
    pub height: u32,

    #[serde(
        rename(serialize = "score", deserialize = "@score"),
        deserialize_with = "empty_as_default"
    )]
    pub score: i64,

    #[serde(rename(serialize = "file_url", deserialize = "@file_url"))]
    pub file_url: String,

    #[serde(
        rename(serialize = "parent_id", deserialize = "@parent_id"),
        deserialize_with = "empty_as_none"
    )]
    pub parent_id: Option<u64>,

    #[serde(rename(serialize = "sample_url", deserialize = "@sample_url"))]
    pub sample_url: String,

    #[serde(
        rename(serialize = "sample_width", deserialize = "@sample_width"),
        deserialize_with = "empty_as_default"
    )]
    pub sample_width: u32,

    #[serde(
        rename(serialize = "sample_height", deserialize = "@sample_height"),
        deserialize_with = "empty_as_default"
    )]
    pub sample_height: u32,

    #[serde(rename(serialize = "preview_url", deserialize = "@preview_url"))]
    pub preview_url: String,

    #[serde(rename(serialize = "rating", deserialize = "@rating"))]
    pub rating: String,

    /// Space separated tag names
    #[serde(rename(serialize = "tags", deserialize = "@tags"))]
    pub tags: String,

    #[serde(
        rename(serialize = "id", deserialize = "@id"),
        deserialize_with = "empty_as_default"
    )]
    pub id: u64,

    #[serde(
        rename(serialize = "width", deserialize = "@width"),
        deserialize_with = "empty_as_default"
    )]
    pub width: u32,

    #[serde(rename(serialize = "change", deserialize = "@change"))]
    pub change: String,

    #[serde(rename(serialize = "md5", deserialize = "@md5"))]
    pub md5: String,

    #[serde(
        rename(serialize = "creator_id", deserialize = "@creator_id"),
        deserialize_with = "empty_as_none"
    )]
    pub creator_id: Option<u64>,

    #[serde(rename(serialize = "has_children", deserialize = "@has_children"))]
    pub has_children: bool,

    #[serde(rename(serialize = "created_at", deserialize = "@created_at"))]
    pub created_at: String,

    #[serde(rename(serialize = "status", deserialize = "@status"))]
    pub status: String,

    #[serde(rename(serialize = "source", deserialize = "@source"))]
    pub source: Option<String>,

    #[serde(rename(serialize = "has_notes", deserialize = "@has_notes"))]
    pub has_notes: bool,

    #[serde(rename(serialize = "has_comments", deserialize = "@has_comments"))]
    pub has_comments: bool,

    #[serde(
        rename(serialize = "preview_width", deserialize = "@preview_width"),
        deserialize_with = "empty_as_default"
    )]
    pub preview_width: u32,

    #[serde(
        rename(serialize = "preview_height", deserialize = "@preview_height"),
        deserialize_with = "empty_as_default"
    )]
    pub preview_height: u32,
}

impl RemotePost {
    /// Iterates the non-empty tag names of this post
    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.split_whitespace()
    }

    /// Source URL with the empty string treated as absent
    pub fn normalized_source(&self) -> Option<&str> {
        self.source.as_deref().filter(|s| !s.is_empty())
    }
}

/// Parses a numeric attribute, treating an empty value as `T::default()`
fn empty_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default,
    T::Err: Display,
{
    Ok(empty_as_none(deserializer)?.unwrap_or_default())
}

/// Parses an optional numeric attribute, treating an empty value as `None`
fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse().map(Some).map_err(de::Error::custom)
}
