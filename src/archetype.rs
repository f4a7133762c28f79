use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::ProfilerError;

pub const FALLBACK_ARCHETYPE: &str = "OUTLIER";

const BUILTIN: &[(&str, &[&str])] = &[
    ("RISKLORD", &["metal", "hardcore", "punk", "drum and bass"]),
    ("STRATEGIST", &["techno", "classical", "ambient", "progressive"]),
    ("OPTIMIST", &["funk", "disco", "pop", "groove"]),
    ("HUSTLER", &["rap", "trap", "drill", "afrobeat"]),
    ("ZEN_INVESTOR", &["jazz", "lo-fi", "indie folk", "instrumental"]),
    (
        "CHAOS_SELECTOR",
        &["hyperpop", "experimental", "electronic", "indie alt"],
    ),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Archetype {
    pub name: String,
    pub genres: BTreeSet<String>,
}

/// Serialized form of an archetype table, as found in config files.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArchetypeTableConfig {
    #[serde(default)]
    pub fallback: Option<String>,
    pub entries: Vec<Archetype>,
}

/// Named genre sets plus one fallback name that can never be matched, only
/// chosen when no single archetype wins outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchetypeTable {
    entries: Vec<Archetype>,
    fallback: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchetypeScore {
    pub name: String,
    pub score: usize,
}

impl ArchetypeTable {
    pub fn builtin() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|(name, genres)| Archetype {
                name: name.to_string(),
                genres: genres.iter().map(|g| g.to_string()).collect(),
            })
            .collect();
        Self {
            entries,
            fallback: FALLBACK_ARCHETYPE.to_string(),
        }
    }

    pub fn new(entries: Vec<Archetype>, fallback: impl Into<String>) -> Result<Self, ProfilerError> {
        let fallback = fallback.into();
        if fallback.trim().is_empty() {
            return Err(ProfilerError::InvalidArchetypeTable(
                "fallback name is empty".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for entry in &entries {
            if entry.name.trim().is_empty() {
                return Err(ProfilerError::InvalidArchetypeTable(
                    "archetype name is empty".to_string(),
                ));
            }
            if entry.name == fallback {
                return Err(ProfilerError::InvalidArchetypeTable(format!(
                    "{} is the fallback and cannot define genres",
                    entry.name
                )));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(ProfilerError::InvalidArchetypeTable(format!(
                    "duplicate archetype {}",
                    entry.name
                )));
            }
        }
        Ok(Self { entries, fallback })
    }

    pub fn from_config(config: ArchetypeTableConfig) -> Result<Self, ProfilerError> {
        let fallback = config
            .fallback
            .unwrap_or_else(|| FALLBACK_ARCHETYPE.to_string());
        Self::new(config.entries, fallback)
    }

    pub fn entries(&self) -> &[Archetype] {
        &self.entries
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Number of each archetype's defining genres present in `genres`, in
    /// table order. Repeated input genres count once.
    pub fn scores<S: AsRef<str>>(&self, genres: &[S]) -> Vec<ArchetypeScore> {
        let listener: HashSet<&str> = genres.iter().map(|genre| genre.as_ref()).collect();
        self.entries
            .iter()
            .map(|entry| ArchetypeScore {
                name: entry.name.clone(),
                score: entry
                    .genres
                    .iter()
                    .filter(|genre| listener.contains(genre.as_str()))
                    .count(),
            })
            .collect()
    }

    /// Strict winner-take-all: the single archetype with the highest non-zero
    /// score, or the fallback on zero or a tie.
    pub fn classify<S: AsRef<str>>(&self, genres: &[S]) -> &str {
        let scores = self.scores(genres);
        let best = scores.iter().map(|s| s.score).max().unwrap_or(0);
        if best == 0 {
            return &self.fallback;
        }
        let mut winners = self.entries.iter().zip(&scores).filter(|(_, s)| s.score == best);
        match (winners.next(), winners.next()) {
            (Some((entry, _)), None) => &entry.name,
            _ => &self.fallback,
        }
    }

    /// Every name the classifier can return, fallback last.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .map(|entry| entry.name.as_str())
            .chain(std::iter::once(self.fallback.as_str()))
    }
}

impl Default for ArchetypeTable {
    fn default() -> Self {
        Self::builtin()
    }
}
