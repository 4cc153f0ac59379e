//! Scan session state machine
//!
//! A session lives from the moment the operator picks a mode until a scan is
//! routed or the scanner is closed. The `scanned` flag is the latch that keeps
//! repeated camera frames of the same code from being processed twice.

use crate::ScanMode;
use serde::Serialize;
use uuid::Uuid;

/// Observable state derived from the session fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScanState {
    Idle,
    ModeSelected,
    Scanning,
    Processing,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanSession {
    pub id: Uuid,
    mode: Option<ScanMode>,
    scanner_open: bool,
    scanned: bool,
    loading: bool,
    /// Bumped on every reset so results of an abandoned scan can be told apart
    epoch: u64,
}

impl ScanSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            mode: None,
            scanner_open: false,
            scanned: false,
            loading: false,
            epoch: 0,
        }
    }

    pub fn state(&self) -> ScanState {
        match (self.mode, self.scanner_open, self.scanned) {
            (None, _, _) => ScanState::Idle,
            (Some(_), false, _) => ScanState::ModeSelected,
            (Some(_), true, false) => ScanState::Scanning,
            (Some(_), true, true) => ScanState::Processing,
        }
    }

    pub fn mode(&self) -> Option<ScanMode> {
        self.mode
    }

    pub fn is_scanned(&self) -> bool {
        self.scanned
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Pick the workflow context; only valid while idle or before scanning
    pub fn select_mode(&mut self, mode: ScanMode) -> bool {
        match self.state() {
            ScanState::Idle | ScanState::ModeSelected => {
                self.mode = Some(mode);
                true
            }
            _ => false,
        }
    }

    /// Activate the camera for the selected mode
    pub fn open_scanner(&mut self) -> bool {
        if self.state() != ScanState::ModeSelected {
            return false;
        }
        self.scanner_open = true;
        self.scanned = false;
        true
    }

    /// Close the latch for one captured frame
    ///
    /// Returns `false` when a frame is already being processed or the scanner
    /// is not open; the caller must ignore the frame in that case.
    pub fn try_latch(&mut self) -> bool {
        if self.state() != ScanState::Scanning {
            return false;
        }
        self.scanned = true;
        self.loading = true;
        true
    }

    /// Re-arm the scanner after a failed attempt, keeping the mode
    pub fn retry(&mut self) {
        self.loading = false;
        if self.mode.is_some() {
            self.scanner_open = true;
            self.scanned = false;
        }
        self.epoch += 1;
    }

    /// Return to idle, clearing the mode
    pub fn reset(&mut self) {
        self.mode = None;
        self.scanner_open = false;
        self.scanned = false;
        self.loading = false;
        self.epoch += 1;
    }

    /// Operator closed the scanner; valid from any state
    pub fn cancel(&mut self) {
        tracing::debug!("Scan session {} cancelled in state {:?}", self.id, self.state());
        self.reset();
    }
}

impl Default for ScanSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let mut session = ScanSession::new();
        assert_eq!(session.state(), ScanState::Idle);

        assert!(session.select_mode(ScanMode::Approval));
        assert_eq!(session.state(), ScanState::ModeSelected);

        assert!(session.open_scanner());
        assert_eq!(session.state(), ScanState::Scanning);

        assert!(session.try_latch());
        assert_eq!(session.state(), ScanState::Processing);
        assert!(session.is_loading());

        session.reset();
        assert_eq!(session.state(), ScanState::Idle);
        assert_eq!(session.mode(), None);
    }

    #[test]
    fn test_latch_blocks_duplicate_frames() {
        let mut session = ScanSession::new();
        session.select_mode(ScanMode::Return);
        session.open_scanner();

        assert!(session.try_latch());
        assert!(!session.try_latch());
        assert!(!session.try_latch());
    }

    #[test]
    fn test_retry_keeps_mode() {
        let mut session = ScanSession::new();
        session.select_mode(ScanMode::Return);
        session.open_scanner();
        session.try_latch();

        session.retry();
        assert_eq!(session.state(), ScanState::Scanning);
        assert_eq!(session.mode(), Some(ScanMode::Return));
        assert!(!session.is_scanned());
        assert!(!session.is_loading());
        assert!(session.try_latch());
    }

    #[test]
    fn test_cancel_from_any_state() {
        let mut session = ScanSession::new();
        session.select_mode(ScanMode::Approval);
        session.cancel();
        assert_eq!(session.state(), ScanState::Idle);

        session.select_mode(ScanMode::Approval);
        session.open_scanner();
        session.try_latch();
        session.cancel();
        assert_eq!(session.state(), ScanState::Idle);
        assert!(!session.is_scanned());
    }

    #[test]
    fn test_latch_requires_open_scanner() {
        let mut session = ScanSession::new();
        assert!(!session.try_latch());
        assert!(!session.open_scanner());

        session.select_mode(ScanMode::Approval);
        assert!(!session.try_latch());
    }

    #[test]
    fn test_epoch_advances_on_reset_and_retry() {
        let mut session = ScanSession::new();
        let start = session.epoch();
        session.retry();
        session.reset();
        assert_eq!(session.epoch(), start + 2);
    }

    #[test]
    fn test_mode_cannot_change_mid_scan() {
        let mut session = ScanSession::new();
        session.select_mode(ScanMode::Approval);
        session.open_scanner();
        assert!(!session.select_mode(ScanMode::Return));
        assert_eq!(session.mode(), Some(ScanMode::Approval));
    }
}
