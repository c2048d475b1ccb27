//! Track value object and resolved stream metadata

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque handle the transport uses to open a stream (typically a media URL)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamHandle(pub String);

impl std::fmt::Display for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the resolver learned about a query
#[derive(Debug, Clone)]
pub struct ResolvedStream {
    pub title: String,
    pub artist: Option<String>,
    /// Canonical page URL
    pub url: Option<String>,
    /// Duration in seconds
    pub duration: Option<u64>,
    pub stream: StreamHandle,
    pub thumbnail: Option<String>,
}

/// One playable request
///
/// Metadata may be known at enqueue time (e.g. from a playlist expansion) or
/// filled in lazily by [`Track::enrich`] once the track becomes current.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: Uuid,
    /// Search text or URL
    pub query: String,
    pub requested_by: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub url: Option<String>,
    /// Duration in seconds
    pub duration: Option<u64>,
    pub thumbnail: Option<String>,
}

impl Track {
    pub fn new(query: impl Into<String>, requested_by: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            query: query.into(),
            requested_by: requested_by.into(),
            title: None,
            artist: None,
            url: None,
            duration: None,
            thumbnail: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_duration(mut self, seconds: u64) -> Self {
        self.duration = Some(seconds);
        self
    }

    /// Label for listings: the title when known, else the raw query
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.query)
    }

    /// Fill still-unknown fields from resolver output
    ///
    /// First-resolved wins: fields that already hold a value are never
    /// overwritten. The canonical URL falls back to the query itself.
    pub fn enrich(&mut self, info: &ResolvedStream) {
        if self.title.is_none() {
            self.title = Some(info.title.clone());
        }
        if self.artist.is_none() {
            self.artist = info.artist.clone();
        }
        if self.url.is_none() {
            self.url = Some(info.url.clone().unwrap_or_else(|| self.query.clone()));
        }
        if self.duration.is_none() {
            self.duration = info.duration;
        }
        if self.thumbnail.is_none() {
            self.thumbnail = info.thumbnail.clone();
        }
    }
}
