//! Bounded response body reading.

use crate::fetch::FetchError;
use bytes::Bytes;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Outcome of a bounded read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedBody {
    /// Captured bytes, at most the cap.
    pub bytes: Vec<u8>,
    /// True when the stream held more than the cap.
    pub truncated: bool,
    /// True byte count: the larger of declared length and bytes
    /// actually observed. Never under-reported by truncation.
    pub size: u64,
}

impl BoundedBody {
    /// Decodes the captured bytes as text, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// An incrementally readable response body.
///
/// Implemented for [`reqwest::Response`]; test sources feed chunks
/// directly.
#[allow(async_fn_in_trait)]
pub trait ChunkSource {
    /// Next chunk of the body, `None` at end of stream.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, FetchError>;
}

impl ChunkSource for reqwest::Response {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, FetchError> {
        self.chunk().await.map_err(FetchError::Transport)
    }
}

/// Reads a body up to `cap` bytes.
///
/// Stops at end of stream or once exactly `cap` bytes are captured,
/// whichever comes first; a chunk crossing the cap is cut at the cap
/// boundary and the rest of the stream is abandoned (dropping the
/// source releases the connection). When the declared length already
/// exceeds the cap the read short-circuits into the truncation path as
/// soon as the cap is reached, without probing for further data.
///
/// The read honors the same deadline and cancellation token as the
/// dispatch that produced the stream: a cancelled fetch never leaves
/// the reader running.
pub async fn read_bounded<S: ChunkSource>(
    source: &mut S,
    declared_len: Option<u64>,
    cap: usize,
    deadline: Option<Instant>,
    cancel: &CancellationToken,
) -> Result<BoundedBody, FetchError> {
    let mut bytes: Vec<u8> = Vec::with_capacity(match declared_len {
        Some(len) => (len as usize).min(cap),
        None => 8 * 1024,
    });
    let mut observed: u64 = 0;
    let mut truncated = false;

    loop {
        if bytes.len() == cap {
            // At the cap. Truncated unless the stream genuinely ends
            // here; the declared length can tell us without another
            // read, otherwise probe for one more chunk.
            match declared_len {
                Some(len) => truncated = len > cap as u64,
                None => {
                    if let Some(probe) = next_racing(source, deadline, cancel).await? {
                        observed += probe.len() as u64;
                        truncated = !probe.is_empty();
                    }
                }
            }
            break;
        }

        match next_racing(source, deadline, cancel).await? {
            None => break,
            Some(chunk) => {
                observed += chunk.len() as u64;
                let room = cap - bytes.len();
                if chunk.len() > room {
                    bytes.extend_from_slice(&chunk[..room]);
                    truncated = true;
                    break;
                }
                bytes.extend_from_slice(&chunk);
            }
        }
    }

    let size = declared_len.unwrap_or(0).max(observed);
    if truncated {
        debug!(cap, size, "body truncated at capture cap");
    }

    Ok(BoundedBody {
        bytes,
        truncated,
        size,
    })
}

/// One chunk read, raced against the deadline and cancellation.
async fn next_racing<S: ChunkSource>(
    source: &mut S,
    deadline: Option<Instant>,
    cancel: &CancellationToken,
) -> Result<Option<Bytes>, FetchError> {
    let read = source.next_chunk();
    match deadline {
        Some(deadline) => tokio::select! {
            _ = cancel.cancelled() => Err(FetchError::TimedOut),
            result = tokio::time::timeout_at(deadline, read) => {
                result.map_err(|_| FetchError::TimedOut)?
            }
        },
        None => tokio::select! {
            _ = cancel.cancelled() => Err(FetchError::TimedOut),
            result = read => result,
        },
    }
}
