//! Shared data structures used throughout the application.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Start of the requested time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeStart {
    /// Wire literal `1`; with `adjust_start_time` the server picks the
    /// earliest start that still yields `count` ticks.
    Earliest,
    Epoch(i64),
}

impl Serialize for RangeStart {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RangeStart::Earliest => serializer.serialize_i64(1),
            RangeStart::Epoch(epoch) => serializer.serialize_i64(*epoch),
        }
    }
}

/// End of the requested time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeEnd {
    Latest,
    Epoch(i64),
}

impl Serialize for RangeEnd {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RangeEnd::Latest => serializer.serialize_str("latest"),
            RangeEnd::Epoch(epoch) => serializer.serialize_i64(*epoch),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickStyle {
    Ticks,
    Candles,
}

impl TickStyle {
    /// Stream type name used by `style` and `forget_all`.
    pub fn as_str(self) -> &'static str {
        match self {
            TickStyle::Ticks => "ticks",
            TickStyle::Candles => "candles",
        }
    }
}

/// Parameters shared by the history and subscribe requests.
#[derive(Debug, Clone, PartialEq)]
pub struct TickQuery {
    pub symbol: String,
    pub count: u32,
    pub start: RangeStart,
    pub end: RangeEnd,
    pub style: TickStyle,
}

impl TickQuery {
    /// Last `count` ticks of `symbol` up to now.
    pub fn latest(symbol: impl Into<String>, count: u32) -> Self {
        Self {
            symbol: symbol.into(),
            count,
            start: RangeStart::Earliest,
            end: RangeEnd::Latest,
            style: TickStyle::Ticks,
        }
    }
}

/// `ticks_history` request frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickRequest {
    pub ticks_history: String,
    pub adjust_start_time: u8,
    pub count: u32,
    pub end: RangeEnd,
    pub start: RangeStart,
    pub style: TickStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscribe: Option<u8>,
}

impl TickRequest {
    pub fn to_frame(&self) -> crate::errors::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Cancels a live feed, either one subscription by id or every tick stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ForgetRequest {
    One { forget: String },
    All { forget_all: String },
}

impl ForgetRequest {
    pub fn to_frame(&self) -> crate::errors::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Error detail carried in the `error` field of a response frame.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerError {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum TickMessage {
    History {
        prices: Vec<Value>,
        times: Vec<Value>,
        subscription_id: Option<String>,
    },
    Candles {
        candles: Vec<Value>,
        subscription_id: Option<String>,
    },
    Tick {
        tick: Value,
        subscription_id: Option<String>,
    },
    Ohlc {
        ohlc: Value,
        subscription_id: Option<String>,
    },
    Error(ServerError),
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    History,
    Live,
}

/// One entry of the tick list.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRecord {
    pub kind: RecordKind,
    pub raw: Value,
}

impl DisplayRecord {
    pub fn history(raw: Value) -> Self {
        Self {
            kind: RecordKind::History,
            raw,
        }
    }

    pub fn live(raw: Value) -> Self {
        Self {
            kind: RecordKind::Live,
            raw,
        }
    }

    pub fn render(&self) -> String {
        match self.kind {
            RecordKind::History => format!("History Tick: {}", self.raw),
            RecordKind::Live => format!("Live Tick: {}", self.raw),
        }
    }
}
