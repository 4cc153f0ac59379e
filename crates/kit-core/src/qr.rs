//! QR payload text format
//!
//! Rental QR codes carry plain text: a header marker line identifying the
//! document type followed by `Label: value` lines. Anything without one of
//! the two markers is rejected.

use serde::{Deserialize, Serialize};

pub const BORROWING_REQUEST_MARKER: &str = "=== BORROWING REQUEST INFO ===";
pub const COMPONENT_RENTAL_MARKER: &str = "=== COMPONENT RENTAL REQUEST ===";

/// Maximum characters of offending text shown in a rejection alert
pub const PREVIEW_CHARS: usize = 100;

const BORROWER_ID: &str = "Borrower ID";
const KIT_ID: &str = "Kit ID";
const KIT_NAME: &str = "Kit Name";
const REQUEST_TYPE: &str = "Request Type";
const COMPONENT_ID: &str = "Component ID";
const COMPONENT_NAME: &str = "Component Name";
const STATUS: &str = "Status";

/// Document type announced by the header marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanKind {
    BorrowingRequest,
    ComponentRental,
}

impl ScanKind {
    pub fn marker(&self) -> &'static str {
        match self {
            ScanKind::BorrowingRequest => BORROWING_REQUEST_MARKER,
            ScanKind::ComponentRental => COMPONENT_RENTAL_MARKER,
        }
    }

    /// Labels recognized for this document type
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            ScanKind::BorrowingRequest => &[BORROWER_ID, KIT_ID, KIT_NAME, REQUEST_TYPE, STATUS],
            ScanKind::ComponentRental => &[BORROWER_ID, COMPONENT_ID, COMPONENT_NAME, STATUS],
        }
    }

    fn detect(text: &str) -> Option<Self> {
        if text.contains(BORROWING_REQUEST_MARKER) {
            Some(ScanKind::BorrowingRequest)
        } else if text.contains(COMPONENT_RENTAL_MARKER) {
            Some(ScanKind::ComponentRental)
        } else {
            None
        }
    }
}

impl std::fmt::Display for ScanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanKind::BorrowingRequest => write!(f, "BORROWING_REQUEST"),
            ScanKind::ComponentRental => write!(f, "COMPONENT_RENTAL"),
        }
    }
}

/// Structured content of a rental QR code
///
/// A payload only exists when the borrower and the kind-specific identifier
/// are both present and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedPayload {
    #[serde(rename = "type")]
    pub kind: ScanKind,
    pub borrower_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kit_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_name: Option<String>,
}

impl ScannedPayload {
    /// Kit rental payload with only the required fields
    pub fn kit(borrower_id: impl Into<String>, kit_id: impl Into<String>) -> Self {
        Self {
            kind: ScanKind::BorrowingRequest,
            borrower_id: borrower_id.into(),
            kit_id: Some(kit_id.into()),
            component_id: None,
            status: None,
            request_type: None,
            kit_name: None,
            component_name: None,
        }
    }

    /// Component rental payload with only the required fields
    pub fn component(borrower_id: impl Into<String>, component_id: impl Into<String>) -> Self {
        Self {
            kind: ScanKind::ComponentRental,
            borrower_id: borrower_id.into(),
            kit_id: None,
            component_id: Some(component_id.into()),
            status: None,
            request_type: None,
            kit_name: None,
            component_name: None,
        }
    }

    /// Identifier of the rented item, kit or component depending on the kind
    pub fn item_id(&self) -> Option<&str> {
        match self.kind {
            ScanKind::BorrowingRequest => self.kit_id.as_deref(),
            ScanKind::ComponentRental => self.component_id.as_deref(),
        }
    }

    /// Human readable item name, if the QR code carried one
    pub fn display_name(&self) -> Option<&str> {
        match self.kind {
            ScanKind::BorrowingRequest => self.kit_name.as_deref(),
            ScanKind::ComponentRental => self.component_name.as_deref(),
        }
    }

    /// Render the text a member's QR code carries for this payload
    pub fn to_qr_text(&self) -> String {
        let mut lines = vec![self.kind.marker().to_string()];
        lines.push(format!("{}: {}", BORROWER_ID, self.borrower_id));

        match self.kind {
            ScanKind::BorrowingRequest => {
                push_field(&mut lines, KIT_ID, &self.kit_id);
                push_field(&mut lines, KIT_NAME, &self.kit_name);
                push_field(&mut lines, REQUEST_TYPE, &self.request_type);
            }
            ScanKind::ComponentRental => {
                push_field(&mut lines, COMPONENT_ID, &self.component_id);
                push_field(&mut lines, COMPONENT_NAME, &self.component_name);
            }
        }
        push_field(&mut lines, STATUS, &self.status);

        lines.join("\n")
    }

    fn assign(&mut self, label: &str, value: String) {
        match label {
            BORROWER_ID => self.borrower_id = value,
            KIT_ID => self.kit_id = Some(value),
            KIT_NAME => self.kit_name = Some(value),
            REQUEST_TYPE => self.request_type = Some(value),
            COMPONENT_ID => self.component_id = Some(value),
            COMPONENT_NAME => self.component_name = Some(value),
            STATUS => self.status = Some(value),
            _ => {}
        }
    }

    fn blank(kind: ScanKind) -> Self {
        Self {
            kind,
            borrower_id: String::new(),
            kit_id: None,
            component_id: None,
            status: None,
            request_type: None,
            kit_name: None,
            component_name: None,
        }
    }

    fn has_required_fields(&self) -> bool {
        !self.borrower_id.is_empty() && self.item_id().map(|id| !id.is_empty()).unwrap_or(false)
    }

    fn drop_empty_optionals(mut self) -> Self {
        for field in [
            &mut self.status,
            &mut self.request_type,
            &mut self.kit_name,
            &mut self.component_name,
        ] {
            if field.as_deref().map(str::is_empty).unwrap_or(false) {
                *field = None;
            }
        }
        self
    }
}

fn push_field(lines: &mut Vec<String>, label: &str, value: &Option<String>) {
    if let Some(v) = value {
        lines.push(format!("{}: {}", label, v));
    }
}

/// Parse scanned QR text into a payload
///
/// Returns `None` when no header marker is present or when the borrower or
/// the kind-specific identifier is missing.
pub fn parse(raw: &str) -> Option<ScannedPayload> {
    let lines: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let kind = match ScanKind::detect(raw) {
        Some(kind) => kind,
        None => {
            tracing::debug!("QR text has no rental header marker ({} lines)", lines.len());
            return None;
        }
    };

    // Text ahead of the marker line is not part of the document
    let start = lines
        .iter()
        .position(|l| l.contains(kind.marker()))
        .unwrap_or(0);

    let mut payload = ScannedPayload::blank(kind);

    // Later lines overwrite earlier ones
    for line in &lines[start..] {
        for label in kind.labels() {
            if let Some(value) = label_value(line, label) {
                payload.assign(label, value.trim().to_string());
            }
        }
    }

    tracing::debug!(
        "Parsed {} payload: borrower={:?} item={:?}",
        kind,
        payload.borrower_id,
        payload.item_id()
    );

    if !payload.has_required_fields() {
        tracing::debug!("{} payload is missing a required field", kind);
        return None;
    }

    Some(payload.drop_empty_optionals())
}

/// Value following `label` at the start of `line`
///
/// `"Label: "` is tried before `"Label:"` so only the first separator is
/// consumed and colons inside the value survive.
fn label_value<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(label)?;
    rest.strip_prefix(": ").or_else(|| rest.strip_prefix(':'))
}

/// Truncated preview of rejected text for operator alerts
pub fn preview(raw: &str, max_chars: usize) -> String {
    let mut chars = raw.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_borrowing_request() {
        let text = "=== BORROWING REQUEST INFO ===\nBorrower ID: 42\nKit ID: 7\nStatus: PENDING";
        let payload = parse(text).unwrap();

        assert_eq!(payload.kind, ScanKind::BorrowingRequest);
        assert_eq!(payload.borrower_id, "42");
        assert_eq!(payload.kit_id.as_deref(), Some("7"));
        assert_eq!(payload.status.as_deref(), Some("PENDING"));
        assert!(payload.component_id.is_none());
        assert!(payload.kit_name.is_none());
    }

    #[test]
    fn test_parse_rejects_text_without_marker() {
        assert!(parse("random text").is_none());
        assert!(parse("").is_none());
        assert!(parse("https://example.com/kits/7").is_none());
        assert!(parse("Borrower ID: 42\nKit ID: 7").is_none());
    }

    #[test]
    fn test_parse_component_rental() {
        let text = "\n  === COMPONENT RENTAL REQUEST ===  \n\nBorrower ID: 9\nComponent ID: c-11\nComponent Name: Servo SG90\nStatus: APPROVED\n";
        let payload = parse(text).unwrap();

        assert_eq!(payload.kind, ScanKind::ComponentRental);
        assert_eq!(payload.borrower_id, "9");
        assert_eq!(payload.component_id.as_deref(), Some("c-11"));
        assert_eq!(payload.display_name(), Some("Servo SG90"));
        assert!(payload.kit_id.is_none());
    }

    #[test]
    fn test_component_rental_requires_component_id() {
        let text = "=== COMPONENT RENTAL REQUEST ===\nBorrower ID: 9\nComponent Name: Servo SG90";
        assert!(parse(text).is_none());
    }

    #[test]
    fn test_borrowing_request_requires_borrower_and_kit() {
        assert!(parse("=== BORROWING REQUEST INFO ===\nKit ID: 7").is_none());
        assert!(parse("=== BORROWING REQUEST INFO ===\nBorrower ID: 42").is_none());
        assert!(parse("=== BORROWING REQUEST INFO ===\nBorrower ID: 42\nKit ID:   ").is_none());
    }

    #[test]
    fn test_kit_labels_ignored_for_component_document() {
        let text = "=== COMPONENT RENTAL REQUEST ===\nBorrower ID: 9\nKit ID: 7";
        assert!(parse(text).is_none());
    }

    #[test]
    fn test_bare_separator_and_colons_in_value() {
        let text = "=== BORROWING REQUEST INFO ===\nBorrower ID:42\nKit ID: 7\nKit Name: Arduino: Starter Kit\nRequest Type:BORROW_KIT";
        let payload = parse(text).unwrap();

        assert_eq!(payload.borrower_id, "42");
        assert_eq!(payload.kit_name.as_deref(), Some("Arduino: Starter Kit"));
        assert_eq!(payload.request_type.as_deref(), Some("BORROW_KIT"));
    }

    #[test]
    fn test_last_occurrence_wins() {
        let text = "=== BORROWING REQUEST INFO ===\nBorrower ID: 1\nKit ID: 7\nBorrower ID: 2";
        assert_eq!(parse(text).unwrap().borrower_id, "2");
    }

    #[test]
    fn test_labels_must_start_the_line() {
        let text = "=== BORROWING REQUEST INFO ===\nnote Borrower ID: 5\nKit ID: 7";
        assert!(parse(text).is_none());
    }

    #[test]
    fn test_labels_before_marker_ignored() {
        assert!(parse("Kit ID: 5\n=== BORROWING REQUEST INFO ===\nBorrower ID: 42").is_none());

        let text = "Borrower ID: 1\nKit ID: 5\n=== BORROWING REQUEST INFO ===\nBorrower ID: 42\nKit ID: 7";
        let payload = parse(text).unwrap();
        assert_eq!(payload.borrower_id, "42");
        assert_eq!(payload.kit_id.as_deref(), Some("7"));
    }

    #[test]
    fn test_parse_is_idempotent() {
        let text = "=== BORROWING REQUEST INFO ===\nBorrower ID: 42\nKit ID: 7\nKit Name: ESP32 Kit";
        assert_eq!(parse(text), parse(text));
    }

    #[test]
    fn test_to_qr_text_is_accepted_by_parser() {
        let mut payload = ScannedPayload::kit("42", "7");
        payload.kit_name = Some("ESP32 Kit".to_string());
        payload.status = Some("APPROVED".to_string());

        let text = payload.to_qr_text();
        assert!(text.starts_with(BORROWING_REQUEST_MARKER));
        assert_eq!(parse(&text), Some(payload));
    }

    #[test]
    fn test_payload_json_shape() {
        let json = serde_json::to_value(ScannedPayload::kit("42", "7")).unwrap();
        assert_eq!(json["type"], "BORROWING_REQUEST");
        assert_eq!(json["borrowerId"], "42");
        assert_eq!(json["kitId"], "7");
        assert!(json.get("componentId").is_none());
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("short", 100), "short");
        assert_eq!(preview("abcdef", 3), "abc...");
        assert_eq!(preview("ăâđêôơư", 2), "ăâ...");
    }
}
