use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A physical disposal unit. `capacity` is signed so that a misconfigured
/// backend row can be reported instead of silently rejected at decode time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receptacle {
    pub name: String,
    #[serde(rename = "amount")]
    pub fill_amount: u64,
    pub capacity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    #[serde(deserialize_with = "text_or_integer")]
    pub id: String,
    #[serde(default, deserialize_with = "points_or_zero")]
    pub points: u64,
}

/// Key columns may be `text` or an integer type in the backend; scanned
/// numeric identifiers are compared as decimal strings either way.
fn text_or_integer<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Key {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(match Key::deserialize(deserializer)? {
        Key::Text(text) => text,
        Key::Signed(n) => n.to_string(),
        Key::Unsigned(n) => n.to_string(),
    })
}

fn points_or_zero<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisposalOrder {
    #[serde(deserialize_with = "text_or_integer")]
    pub order_number: String,
    pub used: bool,
}

/// The waste category printed on a disposal code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredCategory {
    /// Matched by exact membership.
    List(Vec<String>),
    /// Matched after trimming both sides.
    Single(String),
    /// Missing, `null`, or a shape that can never match.
    Absent,
}

/// The fields extracted from one decoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEvent {
    pub user_id: Option<String>,
    pub declared_category: DeclaredCategory,
    pub order_number: Option<String>,
}

impl ScanEvent {
    pub fn identifier_only(user_id: String) -> Self {
        Self {
            user_id: Some(user_id),
            declared_category: DeclaredCategory::Absent,
            order_number: None,
        }
    }

    pub fn empty() -> Self {
        Self {
            user_id: None,
            declared_category: DeclaredCategory::Absent,
            order_number: None,
        }
    }
}

/// The receptacle this process is bound to, chosen once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveReceptacle {
    pub name: String,
    pub assigned_category: String,
}

impl ActiveReceptacle {
    pub fn new(name: impl Into<String>, assigned_category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            assigned_category: assigned_category.into(),
        }
    }
}

/// One raw capture from the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub bytes: Vec<u8>,
}

impl Frame {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

/// What a successful credit changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreditReceipt {
    pub user_id: String,
    pub order_number: String,
    pub receptacle: String,
    pub multiplier: u32,
    pub points_before: u64,
    pub points_after: u64,
    pub fill_before: u64,
    pub fill_after: u64,
    pub credited_at: DateTime<Utc>,
}
