//! Request builders for the `ticks_history` API call.
//!
//! Both builders are pure: they only shape a `TickQuery` into the frame the
//! server expects.

use crate::models::{ForgetRequest, TickQuery, TickRequest, TickStyle};

/// One-shot history query; `subscribe` is left out of the frame.
pub fn build_history_request(query: &TickQuery) -> TickRequest {
    TickRequest {
        ticks_history: query.symbol.clone(),
        adjust_start_time: 1,
        count: query.count,
        end: query.end,
        start: query.start,
        style: query.style,
        subscribe: None,
    }
}

/// History query that keeps streaming new ticks after the initial batch.
pub fn build_subscribe_request(query: &TickQuery) -> TickRequest {
    TickRequest {
        subscribe: Some(1),
        ..build_history_request(query)
    }
}

/// Cancel a live feed. Without a known subscription id every stream of
/// `style` is forgotten.
pub fn build_unsubscribe_request(subscription_id: Option<&str>, style: TickStyle) -> ForgetRequest {
    match subscription_id {
        Some(id) => ForgetRequest::One {
            forget: id.to_string(),
        },
        None => ForgetRequest::All {
            forget_all: style.as_str().to_string(),
        },
    }
}
