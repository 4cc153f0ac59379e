//! Kit Rental QR Workflow Core
//!
//! This crate turns the text of a scanned rental QR code into a navigation
//! decision: the text is parsed into a payload, matched against the rental
//! requests held by the backend, and routed to the approval or return screen.

pub mod matcher;
pub mod model;
pub mod qr;
pub mod routing;
pub mod session;
pub mod source;
pub mod workflow;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use matcher::{find_match, select_match};
pub use model::{KitRef, RecordId, RentalRequestRecord, Requester};
pub use qr::{parse, ScanKind, ScannedPayload};
pub use routing::{route, Navigator, Route};
pub use session::{ScanSession, ScanState};
pub use source::RequestDirectory;
pub use workflow::{Alert, AlertKind, ScanOutcome, ScanWorkflow};

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Request not found: {0}")]
    NotFound(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Navigation error: {0}")]
    Navigation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Operator-selected workflow context
///
/// The mode decides both which candidate pool is searched and where a
/// successful match is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    Approval,
    Return,
}

impl ScanMode {
    pub fn is_approval(&self) -> bool {
        matches!(self, ScanMode::Approval)
    }

    pub fn is_return(&self) -> bool {
        matches!(self, ScanMode::Return)
    }
}

impl std::fmt::Display for ScanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanMode::Approval => write!(f, "approval"),
            ScanMode::Return => write!(f, "return"),
        }
    }
}

impl std::str::FromStr for ScanMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "approval" | "approve" => Ok(ScanMode::Approval),
            "return" | "returns" => Ok(ScanMode::Return),
            other => Err(CoreError::Config(format!("unknown scan mode '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_mode_from_str() {
        assert_eq!("approval".parse::<ScanMode>().unwrap(), ScanMode::Approval);
        assert_eq!(" Return ".parse::<ScanMode>().unwrap(), ScanMode::Return);
        assert!("checkout".parse::<ScanMode>().is_err());
    }

    #[test]
    fn test_scan_mode_predicates() {
        assert!(ScanMode::Approval.is_approval());
        assert!(ScanMode::Return.is_return());
        assert_eq!(ScanMode::Return.to_string(), "return");
    }
}
