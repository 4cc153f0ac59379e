//! Scan workflow controller
//!
//! Drives one scan through parse, match and route. Every failure is scoped to
//! the current attempt: it produces an [`Alert`] and re-arms the scanner with
//! the mode the operator already picked.
//!
//! A scan is split into three steps so that the remote lookup does not hold
//! the session:
//!
//! 1. [`ScanWorkflow::on_scanned`] closes the latch and hands out a
//!    [`PendingScan`] ticket.
//! 2. [`PendingScan::resolve`] parses the text and queries the backend.
//! 3. [`ScanWorkflow::complete`] applies the result, unless the session was
//!    cancelled or reset in the meantime, in which case the result is dropped.

use crate::matcher::find_match;
use crate::model::RentalRequestRecord;
use crate::qr::{self, ScannedPayload, PREVIEW_CHARS};
use crate::routing::{route, Navigator, Route};
use crate::session::{ScanSession, ScanState};
use crate::source::RequestDirectory;
use crate::ScanMode;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertKind {
    InvalidQr,
    NotFound,
    Unexpected,
}

/// Operator-facing failure message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn invalid_qr(raw: &str) -> Self {
        Self {
            kind: AlertKind::InvalidQr,
            title: "Invalid QR Code".to_string(),
            message: format!(
                "This QR code is not a valid rental request.\n\nScanned: {}",
                qr::preview(raw, PREVIEW_CHARS)
            ),
        }
    }

    pub fn not_found(mode: ScanMode) -> Self {
        let message = match mode {
            ScanMode::Approval => "No matching request found for this QR code.",
            ScanMode::Return => "No matching request found or the request is not approved yet.",
        };
        Self {
            kind: AlertKind::NotFound,
            title: "Request Not Found".to_string(),
            message: message.to_string(),
        }
    }

    pub fn unexpected() -> Self {
        Self {
            kind: AlertKind::Unexpected,
            title: "Error".to_string(),
            message: "Failed to process QR code. Please try again.".to_string(),
        }
    }
}

impl std::fmt::Display for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// Result of handling one scanned frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ScanOutcome {
    /// Navigation happened and the session is idle again
    Routed(Route),
    /// The attempt failed; the scanner is open again in the same mode
    Failed(Alert),
    /// The latch was held or the scanner was not open
    Ignored,
    /// The session moved on before the lookup finished
    Discarded,
}

impl ScanOutcome {
    pub fn is_routed(&self) -> bool {
        matches!(self, ScanOutcome::Routed(_))
    }
}

/// Ticket for a latched frame
#[derive(Debug, Clone)]
pub struct PendingScan {
    raw: String,
    mode: ScanMode,
    epoch: u64,
}

impl PendingScan {
    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Parse the text and look the request up
    pub async fn resolve(self, directory: &dyn RequestDirectory) -> Resolution {
        let Some(payload) = qr::parse(&self.raw) else {
            tracing::info!("Rejected QR text: {:?}", qr::preview(&self.raw, PREVIEW_CHARS));
            return Resolution {
                mode: self.mode,
                epoch: self.epoch,
                result: LookupResult::InvalidQr(self.raw),
            };
        };

        let result = match find_match(directory, &payload, self.mode).await {
            Some(record) => LookupResult::Matched { payload, record },
            None => LookupResult::NotFound(payload),
        };

        Resolution {
            mode: self.mode,
            epoch: self.epoch,
            result,
        }
    }
}

/// Outcome of the lookup step, not yet applied to the session
#[derive(Debug, Clone)]
pub struct Resolution {
    mode: ScanMode,
    epoch: u64,
    result: LookupResult,
}

impl Resolution {
    pub fn result(&self) -> &LookupResult {
        &self.result
    }
}

#[derive(Debug, Clone)]
pub enum LookupResult {
    Matched {
        payload: ScannedPayload,
        record: RentalRequestRecord,
    },
    InvalidQr(String),
    NotFound(ScannedPayload),
}

/// Owner of the scan session
#[derive(Debug, Default)]
pub struct ScanWorkflow {
    session: ScanSession,
}

impl ScanWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    pub fn select_mode(&mut self, mode: ScanMode) -> bool {
        self.session.select_mode(mode)
    }

    pub fn open_scanner(&mut self) -> bool {
        self.session.open_scanner()
    }

    /// Pick a mode and open the scanner in one step
    pub fn start(&mut self, mode: ScanMode) -> bool {
        self.session.select_mode(mode) && self.session.open_scanner()
    }

    pub fn cancel(&mut self) {
        self.session.cancel();
    }

    /// Latch a captured frame
    ///
    /// Returns `None` for frames that arrive while another one is processed.
    pub fn on_scanned(&mut self, raw: &str) -> Option<PendingScan> {
        let mode = self.session.mode()?;
        if !self.session.try_latch() {
            tracing::debug!("Ignoring frame, scan latch held");
            return None;
        }

        Some(PendingScan {
            raw: raw.to_string(),
            mode,
            epoch: self.session.epoch(),
        })
    }

    /// Apply a finished lookup to the session
    pub fn complete(&mut self, resolution: Resolution, navigator: &mut dyn Navigator) -> ScanOutcome {
        if resolution.epoch != self.session.epoch() || self.session.state() != ScanState::Processing {
            tracing::debug!("Discarding stale scan result for session {}", self.session.id);
            return ScanOutcome::Discarded;
        }

        let mode = resolution.mode;
        match resolution.result {
            LookupResult::Matched { payload, record } => {
                tracing::debug!("Matched {} payload for borrower {}", payload.kind, payload.borrower_id);
                match route(mode, &record, navigator, &mut self.session) {
                    Ok(target) => ScanOutcome::Routed(target),
                    Err(e) => {
                        tracing::error!("Navigation failed: {}", e);
                        self.rearm(mode);
                        ScanOutcome::Failed(Alert::unexpected())
                    }
                }
            }
            LookupResult::InvalidQr(raw) => {
                self.session.retry();
                ScanOutcome::Failed(Alert::invalid_qr(&raw))
            }
            LookupResult::NotFound(payload) => {
                tracing::info!(
                    "No {} request for borrower {} item {:?}",
                    mode,
                    payload.borrower_id,
                    payload.item_id()
                );
                self.session.retry();
                ScanOutcome::Failed(Alert::not_found(mode))
            }
        }
    }

    /// Run a scanned frame through all three steps
    pub async fn handle_scan(
        &mut self,
        raw: &str,
        directory: &dyn RequestDirectory,
        navigator: &mut dyn Navigator,
    ) -> ScanOutcome {
        let Some(pending) = self.on_scanned(raw) else {
            return ScanOutcome::Ignored;
        };
        let resolution = pending.resolve(directory).await;
        self.complete(resolution, navigator)
    }

    fn rearm(&mut self, mode: ScanMode) {
        self.session.reset();
        self.session.select_mode(mode);
        self.session.open_scanner();
    }
}
