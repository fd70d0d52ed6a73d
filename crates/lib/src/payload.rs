//! Inbound wire payloads from the assistant service and their best-effort normalization.
//!
//! The service sends one JSON document per frame. Any recognized key may be missing
//! or carry an unexpected type; such fields normalize to `None` instead of failing.
//! Wire keys: `messeage` (sic), `similar_issues`, `articles`, `status`, `ticket_details`.

use serde_json::{Map, Value};

/// Exact `messeage` value that marks a completed result fetch.
pub const RESULTS_RETRIEVED: &str = "Results retrieved";

/// One inbound unit after normalization. Fields are independent; several may be set at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundPayload {
    pub result_notice: Option<String>,
    /// `Some(vec![])` is an explicit "no matches"; `None` means not applicable.
    pub similar_issues: Option<Vec<SimilarIssue>>,
    pub article: Option<Article>,
    pub status: Option<String>,
    /// Only used when `status` is present.
    pub ticket_details: Option<TicketDetails>,
    pub generic_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimilarIssue {
    /// `None` when the element had no usable key.
    pub key: Option<String>,
    pub summary: Option<String>,
    pub status: Option<String>,
    pub solution: Option<String>,
}

/// Knowledge-base article (wire key `articles`, a single object).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Article {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub view_link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketDetails {
    pub ticket_id: Option<String>,
    pub ticket_key: Option<String>,
}

impl InboundPayload {
    /// True when no field was recognized; such a payload classifies to nothing.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Parse raw frame text. Invalid JSON yields an empty payload.
pub fn normalize(raw: &str) -> InboundPayload {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => normalize_value(&value),
        Err(e) => {
            log::debug!("inbound frame is not JSON ({}); ignoring", e);
            InboundPayload::default()
        }
    }
}

/// Normalize an already-parsed document. Non-object documents yield an empty payload.
pub fn normalize_value(value: &Value) -> InboundPayload {
    let Some(obj) = value.as_object() else {
        log::debug!("inbound document is not an object; ignoring");
        return InboundPayload::default();
    };

    let (result_notice, generic_message) = match non_empty_str(obj.get("messeage")) {
        Some(m) if m == RESULTS_RETRIEVED => (Some(m), None),
        Some(m) => (None, Some(m)),
        None => (None, None),
    };

    InboundPayload {
        result_notice,
        similar_issues: obj
            .get("similar_issues")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(similar_issue).collect()),
        article: obj.get("articles").and_then(Value::as_object).map(article),
        status: non_empty_str(obj.get("status")),
        ticket_details: obj
            .get("ticket_details")
            .and_then(Value::as_object)
            .map(ticket_details),
        generic_message,
    }
}

/// Non-object elements still count as an issue, with every field absent.
fn similar_issue(item: &Value) -> SimilarIssue {
    let Some(obj) = item.as_object() else {
        return SimilarIssue::default();
    };
    SimilarIssue {
        key: scalar(obj.get("key")).filter(|s| !s.is_empty()),
        summary: non_empty_str(obj.get("summary")),
        status: non_empty_str(obj.get("status")),
        solution: non_empty_str(obj.get("solution")),
    }
}

fn article(obj: &Map<String, Value>) -> Article {
    Article {
        title: non_empty_str(obj.get("title")),
        excerpt: non_empty_str(obj.get("excerpt")),
        view_link: non_empty_str(obj.get("view_link")),
    }
}

fn ticket_details(obj: &Map<String, Value>) -> TicketDetails {
    TicketDetails {
        ticket_id: first_scalar(obj, &["ticket_id", "ticketId"]),
        ticket_key: first_scalar(obj, &["ticket_Key", "ticket_key", "ticketKey"]),
    }
}

/// First of `keys` holding a scalar value.
fn first_scalar(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| scalar(obj.get(*k)))
}

fn non_empty_str(v: Option<&Value>) -> Option<String> {
    v.and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// String or number rendered as text; other types are absent.
fn scalar(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
