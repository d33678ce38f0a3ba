/*!
 * Remote metadata lookup.
 *
 * Filing needs a few facts the filename does not carry: genre, country and
 * spoken language of a movie, the canonical name of a series. They come from
 * a movie database behind the [`MetadataFetcher`] trait:
 * - `omdb`: OMDb-compatible HTTP API client
 *
 * Lookups are best-effort; a failed lookup leaves the video as it was.
 */

use async_trait::async_trait;
use log::{debug, warn};
use std::fmt::Debug;

use crate::errors::MetadataError;
use crate::video::{Video, VideoKind};

pub mod omdb;

pub use omdb::OmdbClient;

/// What the database knows about a title
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataRecord {
    /// IMDb identifier of the record
    pub imdb_id: String,
    /// Movie or episode title
    pub title: Option<String>,
    /// Series name, for episodes
    pub series_title: Option<String>,
    /// IMDb identifier of the series, for episodes
    pub series_imdb_id: Option<String>,
    /// Comma separated genres
    pub genre: Option<String>,
    /// Comma separated countries
    pub country: Option<String>,
    /// Comma separated spoken languages
    pub language: Option<String>,
}

/// Search key for a video without an identifier
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataQuery {
    Movie {
        title: String,
        year: Option<u16>,
    },
    Episode {
        series: String,
        season: u32,
        episode: u32,
    },
}

impl MetadataQuery {
    /// Build the query for a video, `None` when there is nothing to search by
    pub fn for_video(video: &Video) -> Option<Self> {
        match &video.kind {
            VideoKind::Movie { year } => video.title.as_ref().map(|title| Self::Movie {
                title: title.clone(),
                year: *year,
            }),
            VideoKind::Episode { series, season, episode } => Some(Self::Episode {
                series: series.clone(),
                season: *season,
                episode: *episode,
            }),
            VideoKind::Other => None,
        }
    }
}

/// Common trait for metadata services
#[async_trait]
pub trait MetadataFetcher: Send + Sync + Debug {
    /// Find the identifier of a movie or episode
    async fn lookup_id(&self, query: &MetadataQuery) -> Result<String, MetadataError>;

    /// Fetch the record of an identifier
    ///
    /// For episodes the series name is resolved too.
    async fn fetch_metadata(&self, imdb_id: &str) -> Result<MetadataRecord, MetadataError>;
}

/// Check whether a lookup could still add something to the video
pub fn needs_enrichment(video: &Video) -> bool {
    if video.metadata.enriched {
        return false;
    }
    let meta = &video.metadata;
    match &video.kind {
        VideoKind::Movie { .. } => {
            meta.imdb_id.is_none()
                || meta.genre.is_none()
                || meta.country.is_none()
                || meta.language.is_none()
                || video.title.is_none()
        }
        VideoKind::Episode { .. } => meta.imdb_id.is_none() || video.title.is_none(),
        VideoKind::Other => false,
    }
}

/// Fill the missing metadata of a video from the service
///
/// A no-op once the video has been enriched or already carries everything.
/// Only absent fields are filled, except the series name of an episode,
/// which is replaced by the database's canonical spelling. Returns whether
/// the video changed.
pub async fn enrich_if_missing<F: MetadataFetcher + ?Sized>(video: &mut Video, fetcher: &F) -> bool {
    if !needs_enrichment(video) {
        return false;
    }
    video.metadata.enriched = true;

    let imdb_id = match &video.metadata.imdb_id {
        Some(id) => id.clone(),
        None => {
            let Some(query) = MetadataQuery::for_video(video) else {
                return false;
            };
            match fetcher.lookup_id(&query).await {
                Ok(id) => {
                    video.metadata.imdb_id = Some(id.clone());
                    id
                }
                Err(e) => {
                    debug!("No identifier found for {}: {}", video, e);
                    return false;
                }
            }
        }
    };

    let record = match fetcher.fetch_metadata(&imdb_id).await {
        Ok(record) => record,
        Err(e) => {
            warn!("Metadata lookup failed for {}: {}", imdb_id, e);
            return true;
        }
    };

    let meta = &mut video.metadata;
    fill(&mut video.title, record.title);
    fill(&mut meta.genre, record.genre);
    fill(&mut meta.country, record.country);
    fill(&mut meta.language, record.language);
    fill(&mut meta.series_imdb_id, record.series_imdb_id);

    if let (VideoKind::Episode { series, .. }, Some(canonical)) = (&mut video.kind, record.series_title) {
        *series = canonical;
    }

    debug!("Metadata of {} updated from {}", video, imdb_id);
    true
}

fn fill(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_none() {
        *slot = value;
    }
}
