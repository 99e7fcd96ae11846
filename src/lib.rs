//! Core library for the deriv-ticks client.
//!
//! A single WebSocket connection to the Deriv API carries two request shapes:
//! a one-shot tick history fetch and a subscribe/unsubscribe live feed.
//! Responses are routed into a bounded, newest-first tick list.

pub mod config;
pub mod display;
pub mod errors;
pub mod models;
pub mod request;
pub mod router;
pub mod session;
pub mod status;
pub mod transport;
pub mod utils;
