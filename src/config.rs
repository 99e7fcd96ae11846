//! Configuration loader and application settings.

use crate::errors::{AppError, Result};
use crate::models::{RangeEnd, RangeStart, TickQuery, TickStyle};
use std::time::Duration;

pub const DEFAULT_APP_ID: u32 = 1089;
pub const DEFAULT_WS_ENDPOINT: &str = "wss://ws.derivws.com/websockets/v3";

/// Consolidated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Application id sent as the `app_id` query parameter.
    pub app_id: u32,
    /// WebSocket endpoint without query string.
    pub ws_endpoint: String,
    /// Market symbol (e.g., "R_50").
    pub symbol: String,
    /// Number of ticks requested per history fetch.
    pub count: u32,
    pub style: TickStyle,
    /// How long a history request may stay unanswered; `None` waits forever.
    pub history_timeout: Option<Duration>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let app_id = parse_or(&lookup, "DERIV_APP_ID", DEFAULT_APP_ID)?;
        let ws_endpoint =
            lookup("DERIV_WS_ENDPOINT").unwrap_or_else(|| DEFAULT_WS_ENDPOINT.into());
        let symbol = lookup("TICK_SYMBOL").unwrap_or_else(|| "R_50".into());
        if symbol.trim().is_empty() {
            return Err(AppError::Config("TICK_SYMBOL must not be empty".into()));
        }
        let count = parse_or(&lookup, "TICK_COUNT", 10u32)?;
        let style = match lookup("TICK_STYLE").as_deref() {
            None | Some("ticks") => TickStyle::Ticks,
            Some("candles") => TickStyle::Candles,
            Some(other) => {
                return Err(AppError::Config(format!(
                    "TICK_STYLE must be `ticks` or `candles`, got `{other}`"
                )));
            }
        };
        let timeout_secs = parse_or(&lookup, "HISTORY_TIMEOUT_SECS", 30u64)?;
        let history_timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

        Ok(Self {
            app_id,
            ws_endpoint,
            symbol,
            count,
            style,
            history_timeout,
        })
    }

    pub fn tick_query(&self) -> TickQuery {
        TickQuery {
            symbol: self.symbol.clone(),
            count: self.count,
            start: RangeStart::Earliest,
            end: RangeEnd::Latest,
            style: self.style,
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{key} has invalid value `{raw}`"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(cfg.app_id, 1089);
        assert_eq!(cfg.ws_endpoint, DEFAULT_WS_ENDPOINT);
        assert_eq!(cfg.symbol, "R_50");
        assert_eq!(cfg.count, 10);
        assert_eq!(cfg.style, TickStyle::Ticks);
        assert_eq!(cfg.history_timeout, Some(Duration::from_secs(30)));
        assert_eq!(cfg.tick_query(), TickQuery::latest("R_50", 10));
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DERIV_APP_ID", "4242"),
            ("TICK_SYMBOL", "R_100"),
            ("TICK_COUNT", "25"),
            ("TICK_STYLE", "candles"),
            ("HISTORY_TIMEOUT_SECS", "0"),
        ]))
        .unwrap();
        assert_eq!(cfg.app_id, 4242);
        assert_eq!(cfg.symbol, "R_100");
        assert_eq!(cfg.count, 25);
        assert_eq!(cfg.style, TickStyle::Candles);
        assert_eq!(cfg.history_timeout, None);
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let err = AppConfig::from_lookup(lookup_from(&[("TICK_COUNT", "many")])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        let err = AppConfig::from_lookup(lookup_from(&[("TICK_STYLE", "bars")])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
