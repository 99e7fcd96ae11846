//! WebSocket transport to the Deriv API.
//!
//! `WsTransport` splits the socket: a writer task drains outbound frames from
//! an mpsc queue, a reader task turns socket messages into `TransportEvent`s.
//! Sends are fire-and-forget from the caller's side.

use crate::errors::{AppError, Result};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use url::Url;

/// Lifecycle and data events delivered in the order the socket produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Open,
    Message(String),
    Error(String),
    Closed,
}

/// Outbound half of a connection.
pub trait Transport {
    fn send(&mut self, frame: String) -> Result<()>;
    fn close(&mut self);
}

/// Build `<endpoint>?app_id=<id>`.
pub fn endpoint_url(endpoint: &str, app_id: u32) -> Result<Url> {
    let mut url = Url::parse(endpoint)?;
    url.query_pairs_mut()
        .append_pair("app_id", &app_id.to_string());
    Ok(url)
}

enum Outbound {
    Frame(String),
    Close,
}

pub struct WsTransport {
    outbound: mpsc::UnboundedSender<Outbound>,
    closed: bool,
}

impl WsTransport {
    /// Connect and spawn the reader/writer tasks. `Open` is the first event
    /// on the returned receiver.
    pub async fn connect(
        url: Url,
    ) -> Result<(Self, mpsc::UnboundedReceiver<TransportEvent>)> {
        let (ws_stream, _resp) = connect_async(url.as_str()).await?;
        info!(%url, "[WS] connected");
        let (mut sink, mut stream) = ws_stream.split();

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Outbound>();
        let _ = event_tx.send(TransportEvent::Open);

        let writer_events = event_tx.clone();
        tokio::spawn(async move {
            while let Some(out) = out_rx.recv().await {
                let result = match out {
                    Outbound::Frame(text) => {
                        debug!(frame = %text, "[WS] send");
                        sink.send(Message::Text(text)).await
                    }
                    Outbound::Close => {
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                };
                if let Err(e) = result {
                    warn!(error = %e, "[WS] send failed");
                    let _ = writer_events.send(TransportEvent::Error(e.to_string()));
                    break;
                }
            }
        });

        tokio::spawn(async move {
            while let Some(msg_res) = stream.next().await {
                match msg_res {
                    Ok(msg) if msg.is_text() => match msg.into_text() {
                        Ok(txt) => {
                            let _ = event_tx.send(TransportEvent::Message(txt));
                        }
                        Err(e) => {
                            warn!(error = %e, "[WS] text extraction failed");
                        }
                    },
                    Ok(Message::Close(frame)) => {
                        debug!(?frame, "[WS] close frame received");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "[WS] websocket message error");
                        let _ = event_tx.send(TransportEvent::Error(e.to_string()));
                        break;
                    }
                }
            }
            let _ = event_tx.send(TransportEvent::Closed);
        });

        Ok((
            Self {
                outbound: out_tx,
                closed: false,
            },
            event_rx,
        ))
    }
}

impl Transport for WsTransport {
    fn send(&mut self, frame: String) -> Result<()> {
        if self.closed {
            return Err(AppError::TransportClosed);
        }
        self.outbound
            .send(Outbound::Frame(frame))
            .map_err(|_| AppError::TransportClosed)
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            let _ = self.outbound.send(Outbound::Close);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_carries_app_id() {
        let url = endpoint_url("wss://ws.derivws.com/websockets/v3", 1089).unwrap();
        assert_eq!(url.as_str(), "wss://ws.derivws.com/websockets/v3?app_id=1089");
    }

    #[test]
    fn bad_endpoint_is_rejected() {
        assert!(matches!(
            endpoint_url("not a url", 1),
            Err(AppError::UrlParse(_))
        ));
    }

    #[tokio::test]
    async fn send_after_close_fails() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut transport = WsTransport {
            outbound: tx,
            closed: false,
        };
        transport.send("{}".into()).unwrap();
        transport.close();
        transport.close();
        assert!(matches!(
            transport.send("{}".into()),
            Err(AppError::TransportClosed)
        ));
        assert!(matches!(rx.recv().await, Some(Outbound::Frame(f)) if f == "{}"));
        assert!(matches!(rx.recv().await, Some(Outbound::Close)));
        assert!(rx.try_recv().is_err());
    }
}
