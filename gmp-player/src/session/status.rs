//! Read-only status snapshots for UI surfaces and the console

use crate::collaborators::ConnectionInfo;
use gmp_common::events::PlaybackState;
use gmp_common::human_time::{fmt_time, progress_bar};
use gmp_common::TenantId;
use serde::Serialize;

const PROGRESS_WIDTH: usize = 16;

/// Everything a UI needs to draw one session
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub tenant: TenantId,
    pub state: PlaybackState,
    pub current: Option<CurrentTrackStatus>,
    pub queue_len: usize,
    /// Labels of the first few pending tracks
    pub queue_preview: Vec<String>,
    pub history_len: usize,
    pub volume: f32,
    pub voice: Option<VoiceStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrentTrackStatus {
    /// None while the track is still resolving
    pub title: Option<String>,
    pub query: String,
    pub artist: Option<String>,
    pub url: Option<String>,
    pub requested_by: String,
    /// Seconds
    pub duration: Option<u64>,
    pub elapsed: u64,
    pub remaining: Option<u64>,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceStatus {
    #[serde(flatten)]
    pub connection: ConnectionInfo,
    pub playing: bool,
    pub paused: bool,
}

impl SessionStatus {
    /// Single-line rendering, e.g. `[playing] Song - Artist 1:02 / 3:30 ▰▰▱▱ | queue 2 | vol 100%`
    pub fn summary_line(&self) -> String {
        let now = match &self.current {
            Some(current) => {
                let title = current.title.as_deref().unwrap_or(&current.query);
                let mut line = match &current.artist {
                    Some(artist) => format!("{} - {}", title, artist),
                    None => title.to_string(),
                };
                line.push_str(&format!(
                    " {} / {}",
                    fmt_time(Some(current.elapsed)),
                    fmt_time(current.duration)
                ));
                if let Some(total) = current.duration {
                    line.push(' ');
                    line.push_str(&progress_bar(current.elapsed, total, PROGRESS_WIDTH));
                }
                line
            }
            None => "nothing playing".to_string(),
        };

        format!(
            "[{}] {} | queue {} | vol {}%",
            self.state,
            now,
            self.queue_len,
            (self.volume * 100.0).round() as i64
        )
    }
}
