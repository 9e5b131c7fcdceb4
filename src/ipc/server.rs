//! Async glue server
//!
//! Hosts a [`Responder`] on a framed byte stream:
//! - Request frames are processed strictly one at a time
//! - Signal pushes travel through a bounded channel and are interleaved
//!   with replies as they arrive
//! - End of input tears the responder down and flushes its final pushes

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::error::{GlueError, Result};
use crate::ipc::codec::{DEFAULT_MAX_FRAME_LENGTH, GlueFrameCodec};
use crate::protocol::{GlueService, NotificationSink, PARSE_ERROR_MARKER, Responder};

/// Configuration for the glue server
#[derive(Debug, Clone)]
pub struct GlueServerConfig {
    /// Largest accepted frame payload in bytes
    pub max_frame_length: usize,
    /// Pushes buffered before new ones are dropped
    pub event_channel_capacity: usize,
}

impl Default for GlueServerConfig {
    fn default() -> Self {
        Self {
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
            event_channel_capacity: 256,
        }
    }
}

impl GlueServerConfig {
    pub fn with_max_frame_length(mut self, max: usize) -> Self {
        self.max_frame_length = max;
        self
    }

    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity;
        self
    }
}

/// Notification sink feeding the server's push channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<String>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }
}

impl NotificationSink for ChannelSink {
    fn push(&self, event_text: &str) {
        match self.tx.try_send(event_text.to_string()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(event = event_text, "Push channel full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(event = event_text, "Push channel closed");
            }
        }
    }
}

/// Counters for one served session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServeStats {
    pub requests: u64,
    pub parse_errors: u64,
    pub events: u64,
}

pub struct GlueServer {
    config: GlueServerConfig,
}

impl GlueServer {
    pub fn new() -> Self {
        Self::with_config(GlueServerConfig::default())
    }

    pub fn with_config(config: GlueServerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GlueServerConfig {
        &self.config
    }

    /// Serve one peer until its input ends.
    pub async fn serve<S, R, W>(&self, service: S, reader: R, writer: W) -> Result<ServeStats>
    where
        S: GlueService,
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let (tx, mut rx) = mpsc::channel::<String>(self.config.event_channel_capacity);
        let sink: Arc<dyn NotificationSink> = Arc::new(ChannelSink::new(tx));
        let mut responder = Responder::new(service, sink);

        let codec = GlueFrameCodec::with_max_length(self.config.max_frame_length);
        let mut frames = FramedRead::new(reader, codec.clone());
        let mut out = FramedWrite::new(writer, codec);
        let mut stats = ServeStats::default();

        tracing::info!(max_frame_length = self.config.max_frame_length, "Glue server started");

        loop {
            tokio::select! {
                frame = frames.next() => {
                    match frame {
                        Some(Ok(request)) => {
                            let reply = responder.process(&request);
                            stats.requests += 1;
                            if reply == PARSE_ERROR_MARKER {
                                stats.parse_errors += 1;
                            }
                            out.send(reply).await?;
                        }
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "Dropping session on frame error");
                            return Err(GlueError::Frame(e.to_string()));
                        }
                        None => break,
                    }
                }
                Some(event) = rx.recv() => {
                    out.send(event).await?;
                    stats.events += 1;
                }
            }
        }

        // teardown pushes the final event of every live subscription
        drop(responder);
        while let Ok(event) = rx.try_recv() {
            out.send(event).await?;
            stats.events += 1;
        }

        tracing::info!(
            requests = stats.requests,
            parse_errors = stats.parse_errors,
            events = stats.events,
            "Glue session ended"
        );
        Ok(stats)
    }
}

impl Default for GlueServer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::SAMPLE;
    use crate::catalog::{Catalog, CatalogService};
    use crate::protocol::testing::RecordingService;
    use tokio::io::{DuplexStream, ReadHalf, WriteHalf};

    type ClientEnds = (
        FramedRead<ReadHalf<DuplexStream>, GlueFrameCodec>,
        FramedWrite<WriteHalf<DuplexStream>, GlueFrameCodec>,
    );

    fn pipe() -> (ClientEnds, ReadHalf<DuplexStream>, WriteHalf<DuplexStream>) {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let (cr, cw) = tokio::io::split(client);
        let (sr, sw) = tokio::io::split(server);
        (
            (
                FramedRead::new(cr, GlueFrameCodec::new()),
                FramedWrite::new(cw, GlueFrameCodec::new()),
            ),
            sr,
            sw,
        )
    }

    async fn exchange(ends: ClientEnds, requests: &[&str]) -> Vec<String> {
        let (mut reader, mut writer) = ends;
        for request in requests {
            writer.send(request.to_string()).await.unwrap();
        }
        writer.close().await.unwrap();
        let mut frames = Vec::new();
        while let Some(frame) = reader.next().await {
            frames.push(frame.unwrap());
        }
        frames
    }

    #[test]
    fn test_server_config_default() {
        let config = GlueServerConfig::default();
        assert_eq!(config.max_frame_length, 16 * 1024 * 1024);
        assert_eq!(config.event_channel_capacity, 256);
    }

    #[test]
    fn test_server_config_builder() {
        let config = GlueServerConfig::default()
            .with_max_frame_length(1024)
            .with_event_channel_capacity(8);
        let server = GlueServer::with_config(config);
        assert_eq!(server.config().max_frame_length, 1024);
        assert_eq!(server.config().event_channel_capacity, 8);
    }

    #[tokio::test]
    async fn test_channel_sink_drops_when_full() {
        let (tx, mut rx) = mpsc::channel(1);
        let sink = ChannelSink::new(tx);
        sink.push("a");
        sink.push("b");
        assert_eq!(rx.recv().await.as_deref(), Some("a"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_serve_replies_in_order() {
        let (ends, sr, sw) = pipe();
        let server = GlueServer::new();
        let requests = [
            "(9)",
            r#"(3 "Color")"#,
            r#"(13 4 1 "changed")"#,
            "(42)",
        ];
        let (stats, frames) = tokio::join!(
            server.serve(RecordingService::default(), sr, sw),
            exchange(ends, &requests)
        );
        let stats = stats.unwrap();

        assert_eq!(
            frames,
            vec![
                ";gsl-glue-return\n\"Item\"".to_string(),
                ";gsl-glue-return\n(\"Color\" (\"Red\" \"Green\") (\"r\" \"g\"))".to_string(),
                ";gsl-glue-return\n1".to_string(),
                ";gsl-glue-parse-error".to_string(),
                r#"(1 "changed" 4 (7 (6 4)) 0)"#.to_string(),
            ]
        );
        assert_eq!(
            stats,
            ServeStats {
                requests: 4,
                parse_errors: 1,
                events: 1
            }
        );
    }

    #[tokio::test]
    async fn test_serve_forwards_fired_signals() {
        let (ends, sr, sw) = pipe();
        let server = GlueServer::new();
        let service = CatalogService::new(Catalog::from_yaml(SAMPLE).unwrap());
        let requests = [
            r#"(13 1 1 "changed")"#,
            r#"(14 "emit" (8 "proxy" (6 1) "signal" (4 "changed") "args" (7 (2 5))))"#,
        ];
        let (stats, frames) = tokio::join!(
            server.serve(service, sr, sw),
            exchange(ends, &requests)
        );

        assert_eq!(stats.unwrap().events, 2);
        assert_eq!(
            frames,
            vec![
                ";gsl-glue-return\n1".to_string(),
                ";gsl-glue-return\n(1 1)".to_string(),
                r#"(1 "changed" 1 (7 (2 5)) 1)"#.to_string(),
                r#"(1 "changed" 1 (7 (6 1)) 0)"#.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_serve_rejects_oversize_frame() {
        let (ends, sr, sw) = pipe();
        let server = GlueServer::with_config(GlueServerConfig::default().with_max_frame_length(8));
        let (result, _frames) = tokio::join!(
            server.serve(RecordingService::default(), sr, sw),
            exchange(ends, &[r#"(3 "a rather long enum name")"#])
        );
        assert!(matches!(result, Err(GlueError::Frame(_))));
    }
}
