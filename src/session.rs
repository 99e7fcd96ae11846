//! Operator actions and transport event handling.
//!
//! `TickSession` ties the injected transport to the router, the tick list
//! and the status slot. It is driven from a single task, so no locking.

use crate::display::TickDisplay;
use crate::errors::{AppError, Result};
use crate::models::TickQuery;
use crate::request::{build_history_request, build_subscribe_request, build_unsubscribe_request};
use crate::router::{Dispatch, ResponseRouter};
use crate::status::StatusReporter;
use crate::transport::{Transport, TransportEvent};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

pub struct TickSession<T: Transport> {
    transport: T,
    query: TickQuery,
    history_timeout: Option<Duration>,
    history_deadline: Option<Instant>,
    router: ResponseRouter,
    display: TickDisplay,
    status: StatusReporter,
    closed: bool,
}

impl<T: Transport> TickSession<T> {
    pub fn new(transport: T, query: TickQuery, history_timeout: Option<Duration>) -> Self {
        Self {
            transport,
            query,
            history_timeout,
            history_deadline: None,
            router: ResponseRouter::new(),
            display: TickDisplay::new(),
            status: StatusReporter::new(),
            closed: false,
        }
    }

    /// Start the live feed. Subscribing twice is rejected.
    pub fn subscribe(&mut self) -> Result<()> {
        if self.router.live().is_attached() {
            return Err(self.report("Subscription error", AppError::AlreadySubscribed));
        }
        self.status.set_status("Subscribing to ticks...", false);
        self.router.live_mut().attach();
        let sent = build_subscribe_request(&self.query)
            .to_frame()
            .and_then(|frame| self.transport.send(frame));
        if let Err(e) = sent {
            self.router.live_mut().detach();
            return Err(self.report("Subscription error", e));
        }
        info!(symbol = %self.query.symbol, "[SESSION] subscribed");
        Ok(())
    }

    /// Stop the live feed. Only valid while subscribed.
    pub fn unsubscribe(&mut self) -> Result<()> {
        if !self.router.live().is_attached() {
            return Err(self.report("Unsubscription error", AppError::NotSubscribed));
        }
        self.status.set_status("Unsubscribing from ticks...", false);
        let forget = build_unsubscribe_request(self.router.live().id(), self.query.style);
        self.router.live_mut().detach();
        if let Err(e) = forget.to_frame().and_then(|frame| self.transport.send(frame)) {
            return Err(self.report("Unsubscription error", e));
        }
        self.status.set_status("Unsubscribed successfully", false);
        Ok(())
    }

    /// Request one batch of history ticks.
    pub fn fetch_history(&mut self) -> Result<()> {
        self.status.set_status("Fetching ticks history...", false);
        self.router.history_mut().attach();
        self.history_deadline = self.history_timeout.map(|t| Instant::now() + t);
        let sent = build_history_request(&self.query)
            .to_frame()
            .and_then(|frame| self.transport.send(frame));
        if let Err(e) = sent {
            self.router.history_mut().detach();
            self.history_deadline = None;
            return Err(self.report("History fetch error", e));
        }
        Ok(())
    }

    pub fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Open => {
                self.status.set_status("Connected to Deriv WebSocket", false);
            }
            TransportEvent::Message(text) => {
                let outcome = self
                    .router
                    .dispatch(&text, &mut self.display, &mut self.status);
                if !self.router.history().is_attached() {
                    self.history_deadline = None;
                }
                if outcome == Dispatch::Teardown {
                    info!("[SESSION] server error, closing connection");
                    self.transport.close();
                }
            }
            TransportEvent::Error(e) => {
                let err = AppError::Connection(e);
                self.status.set_status(format!("Connection error: {err}"), true);
            }
            TransportEvent::Closed => {
                self.status
                    .set_status("Disconnected from Deriv WebSocket", true);
                self.router.detach_all();
                self.history_deadline = None;
                self.closed = true;
            }
        }
    }

    /// Give up on a history request that outlived its deadline.
    pub fn expire_history(&mut self, now: Instant) -> bool {
        match self.history_deadline {
            Some(deadline) if now >= deadline && self.router.history().is_attached() => {
                self.router.history_mut().detach();
                self.history_deadline = None;
                self.status.set_status("History request timed out", true);
                true
            }
            _ => false,
        }
    }

    /// Operator-initiated shutdown; `Closed` arrives once the socket is gone.
    pub fn close(&mut self) {
        self.router.detach_all();
        self.history_deadline = None;
        self.transport.close();
    }

    pub fn history_deadline(&self) -> Option<Instant> {
        self.history_deadline
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn router(&self) -> &ResponseRouter {
        &self.router
    }

    pub fn display(&self) -> &TickDisplay {
        &self.display
    }

    pub fn status(&self) -> &StatusReporter {
        &self.status
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn report(&mut self, context: &str, err: AppError) -> AppError {
        debug!(error = %err, context, "[SESSION] action failed");
        self.status.set_status(format!("{context}: {err}"), true);
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TickStyle;
    use serde_json::{Value, json};

    #[derive(Default)]
    struct FakeTransport {
        sent: Vec<Value>,
        closed: bool,
        fail_sends: bool,
    }

    impl Transport for FakeTransport {
        fn send(&mut self, frame: String) -> Result<()> {
            if self.fail_sends {
                return Err(AppError::TransportClosed);
            }
            self.sent.push(serde_json::from_str(&frame)?);
            Ok(())
        }

        fn close(&mut self) {
            self.closed = true;
        }
    }

    fn session() -> TickSession<FakeTransport> {
        TickSession::new(
            FakeTransport::default(),
            TickQuery::latest("R_50", 10),
            Some(Duration::from_secs(30)),
        )
    }

    #[test]
    fn resubscribe_is_rejected_without_sending() {
        let mut s = session();
        s.subscribe().unwrap();
        assert!(matches!(s.subscribe(), Err(AppError::AlreadySubscribed)));
        assert_eq!(s.transport().sent.len(), 1);
        assert!(s.status().is_error());
        assert!(s.router().live().is_attached());
    }

    #[test]
    fn unsubscribe_without_subscription_is_rejected() {
        let mut s = session();
        assert!(matches!(s.unsubscribe(), Err(AppError::NotSubscribed)));
        assert!(s.transport().sent.is_empty());
        assert_eq!(s.status().message(), "Unsubscription error: not subscribed to ticks");
    }

    #[test]
    fn forget_uses_learned_subscription_id() {
        let mut s = session();
        s.subscribe().unwrap();
        s.handle_event(TransportEvent::Message(
            r#"{"msg_type":"tick","tick":{"quote":1},"subscription":{"id":"abc"}}"#.into(),
        ));
        s.unsubscribe().unwrap();
        assert_eq!(s.transport().sent.last(), Some(&json!({"forget": "abc"})));
    }

    #[test]
    fn candles_unsubscribe_before_first_frame_forgets_candles() {
        let mut query = TickQuery::latest("R_50", 10);
        query.style = TickStyle::Candles;
        let mut s = TickSession::new(FakeTransport::default(), query, None);
        s.subscribe().unwrap();
        s.unsubscribe().unwrap();

        assert_eq!(s.transport().sent[0]["style"], json!("candles"));
        assert_eq!(s.transport().sent.last(), Some(&json!({"forget_all": "candles"})));
        assert!(!s.router().live().is_attached());
    }

    #[test]
    fn failed_send_leaves_handler_detached() {
        let mut s = session();
        s.transport.fail_sends = true;
        assert!(s.subscribe().is_err());
        assert!(!s.router().live().is_attached());
        assert_eq!(s.status().message(), "Subscription error: transport is closed");

        assert!(s.fetch_history().is_err());
        assert!(!s.router().history().is_attached());
        assert!(s.history_deadline().is_none());
    }

    #[tokio::test]
    async fn history_times_out() {
        let mut s = session();
        s.fetch_history().unwrap();
        let deadline = s.history_deadline().unwrap();

        assert!(!s.expire_history(deadline - Duration::from_secs(1)));
        assert!(s.router().history().is_attached());

        assert!(s.expire_history(deadline));
        assert!(!s.router().history().is_attached());
        assert_eq!(s.status().message(), "History request timed out");
        assert!(!s.expire_history(deadline + Duration::from_secs(5)));
    }

    #[test]
    fn close_event_detaches_handlers() {
        let mut s = session();
        s.handle_event(TransportEvent::Open);
        assert_eq!(s.status().message(), "Connected to Deriv WebSocket");
        s.subscribe().unwrap();
        s.fetch_history().unwrap();

        s.handle_event(TransportEvent::Error("reset by peer".into()));
        assert_eq!(s.status().message(), "Connection error: reset by peer");
        assert!(s.status().is_error());

        s.handle_event(TransportEvent::Closed);
        assert!(s.is_closed());
        assert!(!s.router().live().is_attached());
        assert!(!s.router().history().is_attached());
        assert_eq!(s.status().message(), "Disconnected from Deriv WebSocket");
    }
}
