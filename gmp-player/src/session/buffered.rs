//! Buffered multi-track enqueue
//!
//! A playlist link can expand into hundreds of tracks. The first one is
//! queued before the caller gets an answer so playback starts right away;
//! the rest trickle in from a background task tracked by the session.

use super::PlaybackSession;
use crate::error::{Error, Result};
use crate::track::Track;
use futures::stream::{BoxStream, StreamExt};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Handle to an in-flight buffered enqueue
#[derive(Debug)]
pub struct BufferedEnqueue {
    pub first: Track,
    /// 1-based queue position of `first`
    pub position: usize,
    /// Total number of tracks queued, sent once the source is exhausted.
    /// Closed without a value if the session stopped first.
    pub done: oneshot::Receiver<usize>,
}

impl PlaybackSession {
    pub async fn enqueue_stream(
        self: &Arc<Self>,
        mut tracks: BoxStream<'static, Result<Track>>,
    ) -> Result<BufferedEnqueue> {
        let first = match tracks.next().await {
            Some(track) => track?,
            None => return Err(Error::Empty("queue from that source".to_string())),
        };
        let position = self.enqueue(first.clone())?;

        let (done_tx, done) = oneshot::channel();
        let session = Arc::clone(self);
        let tenant = self.tenant;

        self.spawn_background(async move {
            let mut queued = 1usize;
            loop {
                let next = tokio::select! {
                    _ = session.cancel.cancelled() => {
                        debug!(tenant, queued, "Buffered enqueue cancelled");
                        return;
                    }
                    next = tracks.next() => next,
                };

                match next {
                    Some(Ok(track)) => {
                        if session.enqueue(track).is_err() {
                            return;
                        }
                        queued += 1;
                    }
                    Some(Err(e)) => {
                        warn!(tenant, "Buffered enqueue stopped early: {}", e);
                        break;
                    }
                    None => break,
                }
            }

            debug!(tenant, queued, "Buffered enqueue finished");
            let _ = done_tx.send(queued);
        });

        Ok(BufferedEnqueue {
            first,
            position,
            done,
        })
    }
}
