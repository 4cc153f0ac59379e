//! Matching a scanned payload against the backend's requests

use crate::model::RentalRequestRecord;
use crate::qr::{ScanKind, ScannedPayload};
use crate::source::RequestDirectory;
use crate::ScanMode;

/// Fetch the candidate pool for `mode` and return the matching request
///
/// A failed fetch is logged and reported as no match.
pub async fn find_match(
    directory: &dyn RequestDirectory,
    payload: &ScannedPayload,
    mode: ScanMode,
) -> Option<RentalRequestRecord> {
    let candidates = match directory.candidates(mode).await {
        Ok(candidates) => candidates,
        Err(e) => {
            tracing::warn!("Failed to fetch {} candidates: {}", mode, e);
            return None;
        }
    };

    tracing::debug!("Searching {} {} candidates", candidates.len(), mode);

    select_match(&candidates, payload, mode).cloned()
}

/// First candidate in list order that matches the payload
///
/// No further disambiguation happens when one borrower holds several
/// matching requests.
pub fn select_match<'a>(
    candidates: &'a [RentalRequestRecord],
    payload: &ScannedPayload,
    mode: ScanMode,
) -> Option<&'a RentalRequestRecord> {
    candidates
        .iter()
        .filter(|c| mode.is_approval() || c.is_approved())
        .find(|c| is_match(c, payload))
}

fn is_match(candidate: &RentalRequestRecord, payload: &ScannedPayload) -> bool {
    match candidate.requester_id() {
        Some(id) if id.matches(&payload.borrower_id) => {}
        _ => return false,
    }

    match payload.kind {
        // Component identity is not compared
        ScanKind::ComponentRental => candidate.is_component_rental(),
        ScanKind::BorrowingRequest => match (candidate.kit_id(), payload.kit_id.as_deref()) {
            (Some(kit), Some(wanted)) => kit.matches(wanted),
            _ => false,
        },
    }
}
