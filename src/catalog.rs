use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::domain::{
    ArtistId, ArtistRecord, ArtistRef, Cursor, HistoryItem, Page, SourceKind, TrackId,
};
use crate::error::ProfilerError;

pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";

/// Read-only queries the analysis needs from the music catalog service.
pub trait CatalogClient: Send + Sync {
    fn fetch_initial_page(
        &self,
        source: SourceKind,
        page_size: u32,
    ) -> Result<Page<HistoryItem>, ProfilerError>;

    fn advance_page(&self, cursor: &Cursor) -> Result<Page<HistoryItem>, ProfilerError>;

    /// Callers keep `ids` within the service's per-request limit.
    fn fetch_artists(&self, ids: &[ArtistId]) -> Result<Vec<ArtistRecord>, ProfilerError>;
}

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: usize,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }
}

#[derive(Clone)]
pub struct CatalogHttpClient {
    client: Client,
    base_url: String,
    max_retries: usize,
}

impl CatalogHttpClient {
    pub fn new(token: &str, settings: HttpSettings) -> Result<Self, ProfilerError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ProfilerError::MissingToken);
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("listening-profiler/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| ProfilerError::CatalogHttp(err.to_string()))?,
        );
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ProfilerError::InvalidConfig("token is not a valid header".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()
            .map_err(|err| ProfilerError::CatalogHttp(err.to_string()))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            max_retries: settings.max_retries,
        })
    }

    fn initial_url(&self, source: SourceKind, page_size: u32) -> String {
        match source {
            SourceKind::TopTracks => format!("{}/me/top/tracks?limit={page_size}", self.base_url),
            SourceKind::SavedTracks => format!("{}/me/tracks?limit={page_size}", self.base_url),
        }
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ProfilerError> {
        let response = self.send_with_retries(|| self.client.get(url))?;
        let response = Self::handle_status(response)?;
        let body = response
            .text()
            .map_err(|err| ProfilerError::CatalogHttp(err.to_string()))?;
        serde_json::from_str(&body).map_err(|err| ProfilerError::CatalogDecode(err.to_string()))
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, ProfilerError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "catalog request failed".to_string());
        Err(ProfilerError::CatalogStatus { status, message })
    }

    fn send_with_retries<F>(
        &self,
        mut make_req: F,
    ) -> Result<reqwest::blocking::Response, ProfilerError>
    where
        F: FnMut() -> reqwest::blocking::RequestBuilder,
    {
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            let response = make_req().send();
            match response {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < self.max_retries && is_retryable_status(status) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        warn!(status, attempt, "retrying catalog request");
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < self.max_retries && is_retryable_error(&err) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        warn!(error = %err, attempt, "retrying catalog request");
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Err(ProfilerError::CatalogHttp(err.to_string()));
                }
            }
        }
    }
}

impl CatalogClient for CatalogHttpClient {
    fn fetch_initial_page(
        &self,
        source: SourceKind,
        page_size: u32,
    ) -> Result<Page<HistoryItem>, ProfilerError> {
        let url = self.initial_url(source, page_size);
        debug!(%source, %url, "fetching first page");
        let raw: RawPage = self.get_json(&url)?;
        Ok(raw.into_page())
    }

    fn advance_page(&self, cursor: &Cursor) -> Result<Page<HistoryItem>, ProfilerError> {
        let raw: RawPage = self.get_json(cursor.as_str())?;
        Ok(raw.into_page())
    }

    fn fetch_artists(&self, ids: &[ArtistId]) -> Result<Vec<ArtistRecord>, ProfilerError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let joined = ids
            .iter()
            .map(ArtistId::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/artists?ids={joined}", self.base_url);
        let raw: RawArtists = self.get_json(&url)?;
        Ok(raw.into_records())
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

#[derive(Debug, Deserialize)]
struct RawPage {
    #[serde(default)]
    items: Vec<RawEntry>,
    #[serde(default)]
    next: Option<String>,
}

/// Top-tracks pages list tracks directly; saved-tracks pages wrap each one
/// as `{ "added_at": ..., "track": {...} }`. A saved entry whose track is
/// null falls through to `Track` and is dropped for lacking an id.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Saved { track: RawTrack },
    Track(RawTrack),
}

#[derive(Debug, Deserialize)]
struct RawTrack {
    id: Option<String>,
    #[serde(default)]
    artists: Vec<RawArtistRef>,
}

#[derive(Debug, Deserialize)]
struct RawArtistRef {
    id: Option<String>,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawArtists {
    #[serde(default)]
    artists: Vec<Option<RawArtist>>,
}

#[derive(Debug, Deserialize)]
struct RawArtist {
    id: String,
    name: String,
    #[serde(default)]
    genres: Vec<String>,
}

impl RawPage {
    fn into_page(self) -> Page<HistoryItem> {
        let items = self
            .items
            .into_iter()
            .map(|entry| match entry {
                RawEntry::Saved { track } | RawEntry::Track(track) => track,
            })
            .filter_map(RawTrack::into_item)
            .collect();
        Page::new(items, self.next.and_then(Cursor::new))
    }
}

impl RawTrack {
    /// Local files carry no catalog id and are dropped.
    fn into_item(self) -> Option<HistoryItem> {
        let id: TrackId = self.id?.parse().ok()?;
        let artists = self
            .artists
            .into_iter()
            .map(|artist| ArtistRef {
                id: artist.id.and_then(|id| id.parse().ok()),
                name: artist.name,
            })
            .collect();
        Some(HistoryItem { id, artists })
    }
}

impl RawArtists {
    fn into_records(self) -> Vec<ArtistRecord> {
        self.artists
            .into_iter()
            .flatten()
            .filter_map(|artist| {
                Some(ArtistRecord {
                    id: artist.id.parse().ok()?,
                    name: artist.name,
                    genres: artist.genres,
                })
            })
            .collect()
    }
}

/// Parses a history page body, either a top-tracks page or a saved-tracks
/// page with `track` wrappers.
pub fn parse_history_page(body: &str) -> Result<Page<HistoryItem>, ProfilerError> {
    let raw: RawPage =
        serde_json::from_str(body).map_err(|err| ProfilerError::CatalogDecode(err.to_string()))?;
    Ok(raw.into_page())
}

pub fn parse_artists(body: &str) -> Result<Vec<ArtistRecord>, ProfilerError> {
    let raw: RawArtists =
        serde_json::from_str(body).map_err(|err| ProfilerError::CatalogDecode(err.to_string()))?;
    Ok(raw.into_records())
}
