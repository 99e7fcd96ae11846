//! Response routing.
//!
//! Every inbound frame is decoded into a [`TickMessage`] and handed to
//! whichever handler is waiting for that response class. Two handlers exist:
//!
//! * the history handler, one-shot: detached after the first history (or
//!   error) frame it sees;
//! * the live handler, attached on subscribe and detached on unsubscribe or
//!   on a server-reported error.
//!
//! A server error is terminal for the session: every attached handler is
//! detached and the caller is told to close the transport.

use crate::display::TickDisplay;
use crate::errors::{AppError, Result};
use crate::models::{DisplayRecord, ServerError, TickMessage};
use crate::status::StatusReporter;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct RawFrame {
    msg_type: Option<String>,
    error: Option<ServerError>,
    history: Option<HistoryPayload>,
    candles: Option<Vec<Value>>,
    tick: Option<Value>,
    ohlc: Option<Value>,
    subscription: Option<SubscriptionInfo>,
}

#[derive(Debug, Deserialize)]
struct HistoryPayload {
    prices: Vec<Value>,
    #[serde(default)]
    times: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionInfo {
    id: String,
}

/// Decode one text frame. The `error` field wins over `msg_type`.
pub fn decode_frame(text: &str) -> Result<TickMessage> {
    let raw: RawFrame = serde_json::from_str(text).map_err(|e| AppError::Decode(e.to_string()))?;
    if let Some(error) = raw.error {
        return Ok(TickMessage::Error(error));
    }
    let subscription_id = raw.subscription.map(|s| s.id);
    let msg_type = raw.msg_type.unwrap_or_else(|| "<none>".to_string());
    let message = match msg_type.as_str() {
        "history" => {
            let history = raw
                .history
                .ok_or_else(|| AppError::Decode("history frame without `history`".into()))?;
            TickMessage::History {
                prices: history.prices,
                times: history.times,
                subscription_id,
            }
        }
        "candles" => TickMessage::Candles {
            candles: raw
                .candles
                .ok_or_else(|| AppError::Decode("candles frame without `candles`".into()))?,
            subscription_id,
        },
        "tick" => TickMessage::Tick {
            tick: raw
                .tick
                .ok_or_else(|| AppError::Decode("tick frame without `tick`".into()))?,
            subscription_id,
        },
        "ohlc" => TickMessage::Ohlc {
            ohlc: raw
                .ohlc
                .ok_or_else(|| AppError::Decode("ohlc frame without `ohlc`".into()))?,
            subscription_id,
        },
        _ => TickMessage::Other(msg_type),
    };
    Ok(message)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HandlerState {
    #[default]
    Detached,
    Attached,
}

/// Attachment of one response handler to the transport.
#[derive(Debug, Default)]
pub struct Subscription {
    state: HandlerState,
    id: Option<String>,
}

impl Subscription {
    /// Returns `false` if the handler was already attached.
    pub fn attach(&mut self) -> bool {
        let changed = self.state == HandlerState::Detached;
        self.state = HandlerState::Attached;
        changed
    }

    /// Returns `false` if the handler was already detached; detaching twice is a no-op.
    pub fn detach(&mut self) -> bool {
        let changed = self.state == HandlerState::Attached;
        self.state = HandlerState::Detached;
        self.id = None;
        changed
    }

    pub fn state(&self) -> HandlerState {
        self.state
    }

    pub fn is_attached(&self) -> bool {
        self.state == HandlerState::Attached
    }

    /// Server-assigned id of the stream, once a frame has carried it.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn remember_id(&mut self, id: Option<String>) {
        if self.id.is_none() {
            self.id = id;
        }
    }
}

/// What the caller should do with the transport after a frame was routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Handled,
    Ignored,
    Teardown,
}

#[derive(Debug, Default)]
pub struct ResponseRouter {
    history: Subscription,
    live: Subscription,
}

impl ResponseRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &Subscription {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut Subscription {
        &mut self.history
    }

    pub fn live(&self) -> &Subscription {
        &self.live
    }

    pub fn live_mut(&mut self) -> &mut Subscription {
        &mut self.live
    }

    pub fn detach_all(&mut self) {
        self.history.detach();
        self.live.detach();
    }

    /// Decode and route a text frame. Decode failures only touch the status,
    /// and only while some handler is waiting for a response.
    pub fn dispatch(
        &mut self,
        text: &str,
        display: &mut TickDisplay,
        status: &mut StatusReporter,
    ) -> Dispatch {
        match decode_frame(text) {
            Ok(message) => self.route(message, display, status),
            Err(e) if self.history.is_attached() || self.live.is_attached() => {
                status.set_status(format!("Processing error: {e}"), true);
                Dispatch::Ignored
            }
            Err(e) => {
                debug!(error = %e, "[ROUTER] undecodable frame with no handler attached");
                Dispatch::Ignored
            }
        }
    }

    pub fn route(
        &mut self,
        message: TickMessage,
        display: &mut TickDisplay,
        status: &mut StatusReporter,
    ) -> Dispatch {
        match message {
            TickMessage::Error(error) => {
                if !self.history.is_attached() && !self.live.is_attached() {
                    debug!(?error, "[ROUTER] error frame with no handler attached");
                    return Dispatch::Ignored;
                }
                warn!(
                    code = error.code.as_deref().unwrap_or("-"),
                    "[ROUTER] server reported an error"
                );
                let err = AppError::from(error);
                status.set_status(format!("Error: {err}"), true);
                self.detach_all();
                Dispatch::Teardown
            }
            TickMessage::History {
                prices,
                subscription_id,
                ..
            } => self.route_history(prices, subscription_id, display, status),
            TickMessage::Candles {
                candles,
                subscription_id,
            } => self.route_history(candles, subscription_id, display, status),
            TickMessage::Tick {
                tick,
                subscription_id,
            } => self.route_live(tick, subscription_id, display, status),
            TickMessage::Ohlc {
                ohlc,
                subscription_id,
            } => self.route_live(ohlc, subscription_id, display, status),
            TickMessage::Other(msg_type) => {
                debug!(%msg_type, "[ROUTER] ignoring unrecognised message type");
                Dispatch::Ignored
            }
        }
    }

    fn route_history(
        &mut self,
        entries: Vec<Value>,
        subscription_id: Option<String>,
        display: &mut TickDisplay,
        status: &mut StatusReporter,
    ) -> Dispatch {
        // A subscribe request is answered with a history batch first; it carries the stream id.
        if self.live.is_attached() {
            self.live.remember_id(subscription_id);
        }
        if !self.history.is_attached() {
            return Dispatch::Ignored;
        }
        status.set_status("Ticks history retrieved successfully", false);
        for entry in entries {
            display.record_tick(DisplayRecord::history(entry));
        }
        self.history.detach();
        Dispatch::Handled
    }

    fn route_live(
        &mut self,
        payload: Value,
        subscription_id: Option<String>,
        display: &mut TickDisplay,
        status: &mut StatusReporter,
    ) -> Dispatch {
        if !self.live.is_attached() {
            return Dispatch::Ignored;
        }
        self.live.remember_id(subscription_id);
        status.set_status("Receiving live ticks", false);
        display.record_tick(DisplayRecord::live(payload));
        Dispatch::Handled
    }
}
