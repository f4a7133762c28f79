use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

use crate::domain::SourceKind;

#[derive(Debug, Error, Diagnostic)]
pub enum ProfilerError {
    #[error("invalid catalog id: {0}")]
    InvalidId(String),

    #[error("invalid source kind: {0}")]
    InvalidSourceKind(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(Utf8PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid archetype table: {0}")]
    InvalidArchetypeTable(String),

    #[error("missing access token (pass --token or set LISTENING_PROFILER_TOKEN)")]
    #[diagnostic(help("obtain a bearer token from the catalog service's auth flow first"))]
    MissingToken,

    #[error("catalog request failed: {0}")]
    CatalogHttp(String),

    #[error("catalog returned status {status}: {message}")]
    CatalogStatus { status: u16, message: String },

    #[error("could not decode catalog response: {0}")]
    CatalogDecode(String),

    #[error("could not fetch first page of {source_kind}")]
    InitialPage {
        source_kind: SourceKind,
        #[source]
        cause: Box<ProfilerError>,
    },

    #[error("could not fetch page {page} of {source_kind}")]
    PageAdvance {
        source_kind: SourceKind,
        page: usize,
        #[source]
        cause: Box<ProfilerError>,
    },

    #[error("artist chunk {chunk} ({start}..{end}) failed")]
    ArtistBatch {
        chunk: usize,
        start: usize,
        end: usize,
        #[source]
        cause: Box<ProfilerError>,
    },

    #[error("no {0} found")]
    NoData(SourceKind),

    #[error("no artists could be ranked from {0}")]
    NoArtists(SourceKind),

    #[error("could not analyze top tracks ({primary}) or saved tracks ({fallback})")]
    ExhaustedSources {
        primary: Box<ProfilerError>,
        #[source]
        fallback: Box<ProfilerError>,
    },

    #[error("analysis cancelled")]
    Cancelled,
}

/// Coarse classification of [`ProfilerError`] used for exit codes and
/// fallback decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Fetch,
    NoData,
    ExhaustedSources,
    Cancelled,
    Config,
}

impl ProfilerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProfilerError::CatalogHttp(_)
            | ProfilerError::CatalogStatus { .. }
            | ProfilerError::CatalogDecode(_)
            | ProfilerError::InitialPage { .. }
            | ProfilerError::PageAdvance { .. }
            | ProfilerError::ArtistBatch { .. } => ErrorKind::Fetch,
            ProfilerError::NoData(_) | ProfilerError::NoArtists(_) => ErrorKind::NoData,
            ProfilerError::ExhaustedSources { .. } => ErrorKind::ExhaustedSources,
            ProfilerError::Cancelled => ErrorKind::Cancelled,
            ProfilerError::InvalidId(_)
            | ProfilerError::InvalidSourceKind(_)
            | ProfilerError::ConfigRead(_)
            | ProfilerError::ConfigParse(_)
            | ProfilerError::InvalidConfig(_)
            | ProfilerError::InvalidArchetypeTable(_)
            | ProfilerError::MissingToken => ErrorKind::Config,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind() == ErrorKind::Cancelled
    }
}
