use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ProfilerError;

static CATALOG_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9A-Za-z]+$").expect("catalog id pattern is valid")
});

fn parse_catalog_id(value: &str) -> Result<String, ProfilerError> {
    let trimmed = value.trim();
    if !CATALOG_ID_RE.is_match(trimmed) {
        return Err(ProfilerError::InvalidId(value.to_string()));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackId(String);

impl TrackId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TrackId {
    type Err = ProfilerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_catalog_id(value).map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtistId(String);

impl ArtistId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ArtistId {
    type Err = ProfilerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_catalog_id(value).map(Self)
    }
}

/// Which listening-history collection an analysis reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    TopTracks,
    SavedTracks,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::TopTracks => write!(f, "top tracks"),
            SourceKind::SavedTracks => write!(f, "saved tracks"),
        }
    }
}

impl FromStr for SourceKind {
    type Err = ProfilerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().replace('-', "_").as_str() {
            "top" | "top_tracks" => Ok(SourceKind::TopTracks),
            "saved" | "saved_tracks" => Ok(SourceKind::SavedTracks),
            _ => Err(ProfilerError::InvalidSourceKind(value.to_string())),
        }
    }
}

/// An artist credited on a history item. Local or unavailable artists may
/// come back without an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistRef {
    pub id: Option<ArtistId>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryItem {
    pub id: TrackId,
    pub artists: Vec<ArtistRef>,
}

impl HistoryItem {
    /// First-listed artist, if the item credits any.
    pub fn primary_artist(&self) -> Option<&ArtistRef> {
        self.artists.first()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistRecord {
    pub id: ArtistId,
    pub name: String,
    pub genres: Vec<String>,
}

/// Opaque continuation token handed back by the catalog service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor(String);

impl Cursor {
    /// Returns `None` for an empty token, which marks the end of a collection.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<Cursor>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next: Option<Cursor>) -> Self {
        Self { items, next }
    }

    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }
}

/// Labels ordered by descending occurrence count. Never longer than
/// [`MAX_RANKED`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RankedList(Vec<String>);

pub const MAX_RANKED: usize = 5;

impl RankedList {
    pub(crate) fn from_ranked(mut labels: Vec<String>) -> Self {
        labels.truncate(MAX_RANKED);
        Self(labels)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub top_genres: RankedList,
    pub top_artists: RankedList,
    pub archetype: String,
}
