//! WebSocket transport to the assistant service.
//!
//! [`connect`] spawns one task that owns the socket. The session talks to it through
//! [`WsSink`] (fire-and-forget, never blocks) and receives [`TransportEvent`]s in order:
//! `Open`, then any number of `Message`/`Error`, then exactly one `Closed`.
//! No reconnection is attempted.

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connecting to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: tungstenite::Error,
    },

    #[error("connection closed")]
    Closed,
}

/// Notifications from the connection task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Open,
    /// One inbound frame as UTF-8 text.
    Message(String),
    Error(String),
    Closed,
}

/// Outbound half of a connection as seen by the session.
pub trait Outbound {
    /// Queue `text` for transmission. Errors only when the connection is gone.
    fn send(&self, text: &str) -> Result<(), TransportError>;
    /// Ask the connection to close.
    fn close(&self);
}

#[derive(Debug)]
enum Outgoing {
    Text(String),
    Close,
}

/// Handle for queueing frames to the connection task.
#[derive(Debug, Clone)]
pub struct WsSink {
    tx: mpsc::UnboundedSender<Outgoing>,
}

impl Outbound for WsSink {
    fn send(&self, text: &str) -> Result<(), TransportError> {
        self.tx
            .send(Outgoing::Text(text.to_string()))
            .map_err(|_| TransportError::Closed)
    }

    fn close(&self) {
        let _ = self.tx.send(Outgoing::Close);
    }
}

/// Start connecting to `url`. Must be called inside a tokio runtime.
pub fn connect(url: impl Into<String>) -> (WsSink, mpsc::UnboundedReceiver<TransportEvent>) {
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let (ev_tx, ev_rx) = mpsc::unbounded_channel();
    tokio::spawn(run_connection(url.into(), out_rx, ev_tx));
    (WsSink { tx: out_tx }, ev_rx)
}

async fn run_connection(
    url: String,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    let connected = tokio_tungstenite::connect_async(url.as_str()).await;
    let ws = match connected {
        Ok((ws, _)) => ws,
        Err(source) => {
            let err = TransportError::Connect { url, source };
            log::warn!("{}", err);
            let _ = events.send(TransportEvent::Error(err.to_string()));
            let _ = events.send(TransportEvent::Closed);
            return;
        }
    };
    log::info!("connected to {}", url);
    if events.send(TransportEvent::Open).is_err() {
        return;
    }

    let (mut write, mut read) = ws.split();
    loop {
        tokio::select! {
            out = outgoing.recv() => match out {
                Some(Outgoing::Text(text)) => {
                    if let Err(e) = write.send(Message::Text(text)).await {
                        log::warn!("send to {} failed: {}", url, e);
                        let _ = events.send(TransportEvent::Error(e.to_string()));
                        break;
                    }
                }
                Some(Outgoing::Close) | None => {
                    let _ = write.send(Message::Close(None)).await;
                    break;
                }
            },
            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send(TransportEvent::Message(text));
                }
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => {
                        let _ = events.send(TransportEvent::Message(text));
                    }
                    Err(_) => log::debug!("dropping non-UTF-8 binary frame from {}", url),
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    log::warn!("read from {} failed: {}", url, e);
                    let _ = events.send(TransportEvent::Error(e.to_string()));
                    break;
                }
            },
        }
    }
    log::debug!("connection to {} finished", url);
    let _ = events.send(TransportEvent::Closed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_reports_closed_once_the_task_is_gone() {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = WsSink { tx };
        assert!(sink.send("queued").is_ok());
        drop(rx);
        assert!(matches!(sink.send("lost"), Err(TransportError::Closed)));
        sink.close();
    }

    #[tokio::test]
    async fn refused_connection_reports_error_then_closed() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("addr").port()
        };
        let (_sink, mut events) = connect(format!("ws://127.0.0.1:{}/ws", port));
        assert!(matches!(events.recv().await, Some(TransportEvent::Error(_))));
        assert_eq!(events.recv().await, Some(TransportEvent::Closed));
        assert_eq!(events.recv().await, None);
    }
}
