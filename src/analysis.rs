use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use crate::aggregate::{DEFAULT_TOP_N, top_artists, top_genres};
use crate::archetype::ArchetypeTable;
use crate::batch::{DEFAULT_MAX_BATCH_SIZE, fetch_in_batches};
use crate::cancel::Cancellation;
use crate::catalog::CatalogClient;
use crate::domain::{ArtistId, HistoryItem, MAX_RANKED, Profile, RankedList, SourceKind};
use crate::error::ProfilerError;
use crate::pager::walk_pages;

#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub max_batch_size: usize,
    pub top_n: usize,
    pub top_tracks_page_size: u32,
    pub saved_tracks_page_size: u32,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            top_n: DEFAULT_TOP_N,
            top_tracks_page_size: 20,
            saved_tracks_page_size: 5,
        }
    }
}

impl AnalysisOptions {
    pub fn validate(&self) -> Result<(), ProfilerError> {
        if self.max_batch_size == 0 {
            return Err(ProfilerError::InvalidConfig(
                "max_batch_size must be at least 1".to_string(),
            ));
        }
        if self.top_n == 0 || self.top_n > MAX_RANKED {
            return Err(ProfilerError::InvalidConfig(format!(
                "top_n must be between 1 and {MAX_RANKED}, got {}",
                self.top_n
            )));
        }
        if self.top_tracks_page_size == 0 || self.saved_tracks_page_size == 0 {
            return Err(ProfilerError::InvalidConfig(
                "page sizes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn page_size(&self, source: SourceKind) -> u32 {
        match source {
            SourceKind::TopTracks => self.top_tracks_page_size,
            SourceKind::SavedTracks => self.saved_tracks_page_size,
        }
    }
}

/// Ranked data gathered from one history source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSummary {
    pub source: SourceKind,
    pub top_genres: RankedList,
    pub top_artists: RankedList,
    pub items_walked: usize,
    pub artists_fetched: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub profile: Profile,
    pub source: SourceKind,
    pub items_walked: usize,
    pub artists_fetched: usize,
    pub primary_failure: Option<String>,
    pub analyzed_at: String,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn event(&self, _event: ProgressEvent) {}
}

pub struct Analyzer<C: CatalogClient> {
    catalog: C,
    table: ArchetypeTable,
    options: AnalysisOptions,
}

impl<C: CatalogClient> Analyzer<C> {
    pub fn new(
        catalog: C,
        table: ArchetypeTable,
        options: AnalysisOptions,
    ) -> Result<Self, ProfilerError> {
        options.validate()?;
        Ok(Self {
            catalog,
            table,
            options,
        })
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn analyze(&self, cancel: &Cancellation) -> Result<Profile, ProfilerError> {
        self.analyze_with_report(cancel, &NoopSink)
            .map(|report| report.profile)
    }

    /// Top tracks first; saved tracks only if that fails or ranks no artist.
    /// The two sources are never mixed, and cancellation is never retried
    /// against the fallback.
    pub fn analyze_with_report(
        &self,
        cancel: &Cancellation,
        sink: &dyn ProgressSink,
    ) -> Result<AnalysisReport, ProfilerError> {
        let (summary, primary_failure) = match self.analyze_source(SourceKind::TopTracks, cancel, sink)
        {
            Ok(summary) => (summary, None),
            Err(err) if err.is_cancelled() => return Err(err),
            Err(primary) => {
                warn!(error = %primary, "top tracks unusable, falling back to saved tracks");
                sink.event(ProgressEvent {
                    message: format!("phase=Fallback; {primary}"),
                    elapsed: None,
                });
                match self.analyze_source(SourceKind::SavedTracks, cancel, sink) {
                    Ok(summary) => (summary, Some(primary.to_string())),
                    Err(fallback) if fallback.is_cancelled() => return Err(fallback),
                    Err(fallback) => {
                        return Err(ProfilerError::ExhaustedSources {
                            primary: Box::new(primary),
                            fallback: Box::new(fallback),
                        });
                    }
                }
            }
        };

        let archetype = self.table.classify(summary.top_genres.as_slice()).to_string();
        info!(source = %summary.source, %archetype, "profile ready");
        sink.event(ProgressEvent {
            message: format!("phase=Classify; archetype={archetype}"),
            elapsed: None,
        });

        Ok(AnalysisReport {
            profile: Profile {
                top_genres: summary.top_genres,
                top_artists: summary.top_artists,
                archetype,
            },
            source: summary.source,
            items_walked: summary.items_walked,
            artists_fetched: summary.artists_fetched,
            primary_failure,
            analyzed_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Walks one source to completion and ranks it. Zero items is `NoData`;
    /// items that rank no artist are `NoArtists`.
    pub fn analyze_source(
        &self,
        source: SourceKind,
        cancel: &Cancellation,
        sink: &dyn ProgressSink,
    ) -> Result<SourceSummary, ProfilerError> {
        let start = Instant::now();
        sink.event(ProgressEvent {
            message: format!("phase=Walk; {source}"),
            elapsed: None,
        });

        cancel.check()?;
        let first = self
            .catalog
            .fetch_initial_page(source, self.options.page_size(source))
            .map_err(|cause| ProfilerError::InitialPage {
                source_kind: source,
                cause: Box::new(cause),
            })?;
        let items = walk_pages(first, cancel, |cursor, page| {
            self.catalog
                .advance_page(cursor)
                .map_err(|cause| ProfilerError::PageAdvance {
                    source_kind: source,
                    page,
                    cause: Box::new(cause),
                })
        })?;
        if items.is_empty() {
            return Err(ProfilerError::NoData(source));
        }

        let artist_ids = primary_artist_ids(&items);
        sink.event(ProgressEvent {
            message: format!(
                "phase=Artists; {} items, {} artist lookups",
                items.len(),
                artist_ids.len()
            ),
            elapsed: Some(start.elapsed()),
        });
        let artists = fetch_in_batches(&artist_ids, self.options.max_batch_size, cancel, |chunk| {
            self.catalog.fetch_artists(chunk)
        })?;

        let top_artists = top_artists(&items, self.options.top_n);
        if top_artists.is_empty() {
            return Err(ProfilerError::NoArtists(source));
        }
        let top_genres = top_genres(&artists, self.options.top_n);

        sink.event(ProgressEvent {
            message: format!("phase=Rank; {source}"),
            elapsed: Some(start.elapsed()),
        });
        Ok(SourceSummary {
            source,
            top_genres,
            top_artists,
            items_walked: items.len(),
            artists_fetched: artists.len(),
        })
    }
}

/// Primary-artist ids in item order, duplicates kept so repeat plays weigh
/// into genre counts.
pub fn primary_artist_ids(items: &[HistoryItem]) -> Vec<ArtistId> {
    items
        .iter()
        .filter_map(HistoryItem::primary_artist)
        .filter_map(|artist| artist.id.clone())
        .collect()
}
