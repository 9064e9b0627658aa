use crate::domain::model::{DeclaredCategory, ScanEvent};
use serde_json::{Map, Value};

const USER_ID_FIELD: &str = "userId";
const CATEGORY_FIELD: &str = "wasteCategories";
const ORDER_NUMBER_FIELD: &str = "orderNumber";

/// A decoded payload, classified by shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanPayload {
    /// A JSON object carrying some or all of the event fields.
    StructuredEvent(ScanEvent),
    /// A bare JSON string or integer: a user id with nothing else.
    BareIdentifier(String),
    Unparseable { raw: String, reason: PayloadError },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("not JSON: {0}")]
    NotJson(String),
    #[error("unsupported JSON shape: {0}")]
    UnsupportedShape(&'static str),
}

impl ScanPayload {
    /// Classifies a raw scanned string. Never fails.
    pub fn parse(raw: &str) -> Self {
        match decode(raw) {
            Ok(Value::Object(fields)) => ScanPayload::StructuredEvent(event_from_object(&fields)),
            Ok(value) => match scalar_identifier(&value) {
                Some(id) => ScanPayload::BareIdentifier(id),
                None => ScanPayload::Unparseable {
                    raw: raw.to_string(),
                    reason: PayloadError::UnsupportedShape(shape_name(&value)),
                },
            },
            Err(reason) => ScanPayload::Unparseable {
                raw: raw.to_string(),
                reason,
            },
        }
    }

    /// Flattens the payload into event fields.
    ///
    /// Text that is not JSON at all is taken whole as the user id; any other
    /// unsupported shape yields no fields.
    pub fn into_event(self) -> ScanEvent {
        match self {
            ScanPayload::StructuredEvent(event) => event,
            ScanPayload::BareIdentifier(id) => ScanEvent::identifier_only(id),
            ScanPayload::Unparseable {
                raw,
                reason: PayloadError::NotJson(_),
            } => ScanEvent::identifier_only(raw),
            ScanPayload::Unparseable {
                reason: PayloadError::UnsupportedShape(_),
                ..
            } => ScanEvent::empty(),
        }
    }
}

/// Shorthand for `ScanPayload::parse(raw).into_event()`.
pub fn parse_scan(raw: &str) -> ScanEvent {
    ScanPayload::parse(raw).into_event()
}

fn decode(raw: &str) -> Result<Value, PayloadError> {
    serde_json::from_str(raw).map_err(|e| PayloadError::NotJson(e.to_string()))
}

fn event_from_object(fields: &Map<String, Value>) -> ScanEvent {
    ScanEvent {
        user_id: fields.get(USER_ID_FIELD).and_then(scalar_identifier),
        declared_category: fields
            .get(CATEGORY_FIELD)
            .map(declared_category)
            .unwrap_or(DeclaredCategory::Absent),
        order_number: fields.get(ORDER_NUMBER_FIELD).and_then(scalar_identifier),
    }
}

/// Strings and integers identify things; empty strings identify nothing.
fn scalar_identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

fn declared_category(value: &Value) -> DeclaredCategory {
    match value {
        Value::String(s) => DeclaredCategory::Single(s.clone()),
        Value::Array(items) => DeclaredCategory::List(
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
        ),
        _ => DeclaredCategory::Absent,
    }
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "non-integer number",
        Value::String(_) => "empty string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
