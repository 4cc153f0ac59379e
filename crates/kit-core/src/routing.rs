//! Routing a matched request to the screen that handles it

use crate::model::RentalRequestRecord;
use crate::session::ScanSession;
use crate::{CoreResult, ScanMode};
use serde::{Deserialize, Serialize};

/// Navigation target produced by a successful scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "screen", content = "params")]
pub enum Route {
    /// Approvals list with the request detail opened
    #[serde(rename_all = "camelCase")]
    Approvals { request_id: String },
    /// Return checking with the return dialog opened for the request
    #[serde(rename_all = "camelCase")]
    ReturnKits { request_id: String, auto_open: bool },
}

impl Route {
    pub fn for_mode(mode: ScanMode, record: &RentalRequestRecord) -> Self {
        let request_id = record.id.as_string();
        match mode {
            ScanMode::Approval => Route::Approvals { request_id },
            ScanMode::Return => Route::ReturnKits {
                request_id,
                auto_open: true,
            },
        }
    }

    /// Destination screen name
    pub fn name(&self) -> &'static str {
        match self {
            Route::Approvals { .. } => "Approvals",
            Route::ReturnKits { .. } => "ReturnKits",
        }
    }

    pub fn request_id(&self) -> &str {
        match self {
            Route::Approvals { request_id } | Route::ReturnKits { request_id, .. } => request_id,
        }
    }
}

/// Navigation collaborator
pub trait Navigator {
    fn navigate(&mut self, route: &Route) -> CoreResult<()>;
}

/// Navigate to the screen for `mode` and release the session
///
/// The session is reset whether or not navigation succeeds.
pub fn route(
    mode: ScanMode,
    record: &RentalRequestRecord,
    navigator: &mut dyn Navigator,
    session: &mut ScanSession,
) -> CoreResult<Route> {
    let target = Route::for_mode(mode, record);
    tracing::info!("Routing request {} to {}", target.request_id(), target.name());

    let result = navigator.navigate(&target);
    session.reset();
    result.map(|_| target)
}

/// Navigator that records every route it is given
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingNavigator {
    pub routes: Vec<Route>,
}

#[cfg(test)]
impl Navigator for RecordingNavigator {
    fn navigate(&mut self, route: &Route) -> CoreResult<()> {
        self.routes.push(route.clone());
        Ok(())
    }
}
