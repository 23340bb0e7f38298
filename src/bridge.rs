//! JSON-lines bridge between stdio and the sync engine.
//!
//! Each stdin line addresses one surface:
//!
//! ```text
//! {"surface":"side","kind":"sidebar","connect":true}
//! {"surface":"side","message":{"command":"surfaceReady"}}
//! {"surface":"side","disconnect":true}
//! ```
//!
//! Every outbound message is written as `{"surface":…,"message":…}`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use apinav_core::error::AppError;
use apinav_core::result::AppResult;
use apinav_core::types::id::SurfaceId;
use apinav_realtime::{OutboundMessage, SurfaceKind, SyncEngine};

/// One stdin line.
#[derive(Debug, Deserialize)]
struct InboundFrame {
    surface: SurfaceId,
    #[serde(default)]
    kind: Option<SurfaceKind>,
    #[serde(default)]
    connect: bool,
    #[serde(default)]
    disconnect: bool,
    #[serde(default)]
    message: Option<Value>,
}

/// One stdout line.
#[derive(Debug, Serialize)]
struct OutboundFrame<'a> {
    surface: &'a SurfaceId,
    message: &'a OutboundMessage,
}

/// Routes stdin frames into the engine and surface output to `out`.
#[derive(Debug, Clone)]
pub struct Bridge {
    engine: Arc<SyncEngine>,
    out: mpsc::Sender<String>,
}

impl Bridge {
    /// Create a bridge writing rendered lines to `out`.
    pub fn new(engine: Arc<SyncEngine>, out: mpsc::Sender<String>) -> Self {
        Self { engine, out }
    }

    /// Handle one stdin line.
    pub async fn handle_line(&self, line: &str) -> AppResult<()> {
        let frame: InboundFrame = serde_json::from_str(line)
            .map_err(|e| AppError::malformed_intent(format!("Invalid bridge frame: {e}")))?;

        if frame.connect {
            let kind = frame.kind.unwrap_or(SurfaceKind::Sidebar);
            self.connect(frame.surface.clone(), kind).await;
        }
        if let Some(message) = frame.message {
            self.engine
                .handle_inbound(&frame.surface, &message.to_string())
                .await?;
        }
        if frame.disconnect {
            self.engine.unregister(&frame.surface);
        }
        Ok(())
    }

    /// Unregister every surface so their forwarders finish.
    pub fn shutdown(&self) {
        for handle in self.engine.registry().all() {
            self.engine.unregister(&handle.id);
        }
    }

    async fn connect(&self, surface: SurfaceId, kind: SurfaceKind) {
        let (_, mut rx) = self.engine.register(surface.clone(), kind).await;
        let out = self.out.clone();
        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                let frame = OutboundFrame {
                    surface: &surface,
                    message: &message,
                };
                match serde_json::to_string(&frame) {
                    Ok(line) => {
                        if out.send(line).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(surface_id = %surface, error = %e, "Failed to encode outbound frame"),
                }
            }
            debug!(surface_id = %surface, "Surface forwarder finished");
        });
    }
}

/// Read frames until `reader` is exhausted.
///
/// A bad frame or a failed operation is logged and the loop continues.
pub async fn run<R>(bridge: &Bridge, reader: R) -> AppResult<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if let Err(e) = bridge.handle_line(&line).await {
            if e.kind.is_non_fatal() {
                warn!(error = %e, "Bridge frame skipped");
            } else {
                error!(error = %e, "Bridge frame failed");
            }
        }
    }
    Ok(())
}

/// Write rendered lines to `writer` until every sender is gone.
pub async fn write_lines<W>(mut rx: mpsc::Receiver<String>, mut writer: W) -> AppResult<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}
