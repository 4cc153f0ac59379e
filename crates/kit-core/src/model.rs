//! Rental request records as returned by the backend
//!
//! Records are owned by the backend. The client only holds a read-only copy
//! for the duration of one scan-and-match operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request type the backend assigns to component rentals
pub const BORROW_COMPONENT: &str = "BORROW_COMPONENT";

/// Request type the backend assigns to kit rentals
pub const BORROW_KIT: &str = "BORROW_KIT";

/// Status of a request that has been approved and may be returned
pub const STATUS_APPROVED: &str = "APPROVED";

/// Identifier that the backend may send either as a JSON number or a string
///
/// Identifiers are always compared through their string form, so `42` and
/// `"42"` refer to the same record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl RecordId {
    /// String form used for comparisons and route parameters
    pub fn as_string(&self) -> String {
        match self {
            RecordId::Number(n) => n.to_string(),
            RecordId::Text(s) => s.clone(),
        }
    }

    pub fn matches(&self, other: &str) -> bool {
        match self {
            RecordId::Number(n) => n.to_string() == other,
            RecordId::Text(s) => s == other,
        }
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Number(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Text(s.to_string())
    }
}

/// Account that submitted a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requester {
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Kit a request refers to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KitRef {
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Rental request as listed by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalRequestRecord {
    pub id: RecordId,
    /// A record without a requester never matches a scan
    #[serde(default)]
    pub requested_by: Option<Requester>,
    /// Absent on component rentals
    #[serde(default)]
    pub kit: Option<KitRef>,
    #[serde(default)]
    pub request_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl RentalRequestRecord {
    pub fn is_approved(&self) -> bool {
        self.status
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case(STATUS_APPROVED))
            .unwrap_or(false)
    }

    pub fn is_component_rental(&self) -> bool {
        self.request_type.as_deref() == Some(BORROW_COMPONENT)
    }

    pub fn requester_id(&self) -> Option<&RecordId> {
        self.requested_by.as_ref().map(|r| &r.id)
    }

    pub fn kit_id(&self) -> Option<&RecordId> {
        self.kit.as_ref().map(|k| &k.id)
    }
}
