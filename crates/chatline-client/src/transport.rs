//! Transport for the client.
//!
//! A [`Connector`] opens a [`Link`]: a pair of channels carrying text frames.
//! An internal task owned by the connector does the socket I/O; protocol
//! logic stays in the Sans-IO manager.
//!
//! Link semantics:
//! - The inbound channel closing means the transport closed.
//! - Dropping the outbound sender asks the transport to close.

use std::{future::Future, time::Duration};

use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite};

/// Frames buffered per direction on a link.
pub const LINK_BUFFER: usize = 32;

/// How long to wait for the peer during the close handshake.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Transport errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Endpoint could not be parsed.
    #[error("invalid endpoint: {0}")]
    Endpoint(String),

    /// Connection could not be established.
    #[error("connection failed: {0}")]
    Connection(String),
}

/// Something that arrived on a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Text frame.
    Text(String),
    /// Transport error. The link normally closes right after.
    Error(String),
}

/// Client side of an open transport.
#[derive(Debug)]
pub struct Link {
    /// Text frames to write.
    pub outbound: mpsc::Sender<String>,
    /// Frames and errors read from the transport.
    pub inbound: mpsc::Receiver<Inbound>,
}

/// Transport side of a [`Link`], driven by the connector's I/O task (or by a
/// test standing in for the server).
#[derive(Debug)]
pub struct RemoteEnd {
    /// Frames written by the client.
    pub from_client: mpsc::Receiver<String>,
    /// Deliver frames and errors to the client. Dropping it closes the link.
    pub to_client: mpsc::Sender<Inbound>,
}

impl Link {
    /// Create a connected link and its remote end.
    pub fn pair(buffer: usize) -> (Link, RemoteEnd) {
        let (outbound, from_client) = mpsc::channel(buffer);
        let (to_client, inbound) = mpsc::channel(buffer);
        (Link { outbound, inbound }, RemoteEnd { from_client, to_client })
    }
}

/// Opens transports.
///
/// Implementations must be cheap to share: the runtime calls `open` from a
/// spawned task for every connection attempt.
pub trait Connector: Send + Sync + 'static {
    /// Open a transport to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport cannot be opened. The runtime treats
    /// this like a close of the attempted socket.
    fn open(&self, endpoint: &str) -> impl Future<Output = Result<Link, TransportError>> + Send;
}

/// WebSocket connector using tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl WsConnector {
    /// Create a WebSocket connector.
    pub fn new() -> Self {
        Self
    }
}

impl Connector for WsConnector {
    async fn open(&self, endpoint: &str) -> Result<Link, TransportError> {
        let (stream, _response) =
            tokio_tungstenite::connect_async(endpoint).await.map_err(|e| match e {
                tungstenite::Error::Url(e) => TransportError::Endpoint(e.to_string()),
                tungstenite::Error::HttpFormat(e) => TransportError::Endpoint(e.to_string()),
                e => TransportError::Connection(e.to_string()),
            })?;

        let (link, remote) = Link::pair(LINK_BUFFER);
        tokio::spawn(run_websocket(stream, remote));

        Ok(link)
    }
}

/// Bridge a WebSocket and a link until either side closes.
///
/// Reading never waits on writing: a peer that stops reading stalls only the
/// write half, and the link still closes when the client drops it.
async fn run_websocket(stream: WebSocketStream<MaybeTlsStream<TcpStream>>, remote: RemoteEnd) {
    let RemoteEnd { mut from_client, to_client } = remote;
    let (mut sink, mut source) = stream.split();

    {
        let write = async {
            while let Some(text) = from_client.recv().await {
                sink.send(tungstenite::Message::Text(text)).await?;
            }
            Ok::<_, tungstenite::Error>(())
        };

        let read = async {
            while let Some(message) = source.next().await {
                match message {
                    Ok(tungstenite::Message::Text(text)) => {
                        if to_client.send(Inbound::Text(text)).await.is_err() {
                            return;
                        }
                    },
                    Ok(tungstenite::Message::Close(frame)) => {
                        tracing::debug!(?frame, "peer closed websocket");
                        return;
                    },
                    Ok(tungstenite::Message::Binary(data)) => {
                        tracing::debug!(len = data.len(), "ignoring binary message");
                    },
                    // Ping/pong replies are queued by tungstenite itself.
                    Ok(_) => {},
                    Err(e) => {
                        let _ = to_client.send(Inbound::Error(e.to_string())).await;
                        return;
                    },
                }
            }
        };

        tokio::select! {
            written = write => {
                if let Err(e) = written {
                    let _ = to_client.try_send(Inbound::Error(e.to_string()));
                }
            },
            () = read => {},
            () = to_client.closed() => tracing::debug!("client dropped link"),
        }
    }

    match tokio::time::timeout(CLOSE_TIMEOUT, sink.close()).await {
        Ok(Ok(())) => {},
        Ok(Err(e)) => tracing::debug!("close handshake failed: {e}"),
        Err(_) => tracing::debug!("close handshake timed out"),
    }
}
