//! Navigation for a terminal front end

use kit_core::{CoreError, CoreResult, Navigator, Route};
use std::io::Write;

/// Writes every route as one JSON line
pub struct PrintNavigator<W: Write> {
    out: W,
}

impl PrintNavigator<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> PrintNavigator<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Navigator for PrintNavigator<W> {
    fn navigate(&mut self, route: &Route) -> CoreResult<()> {
        let json = serde_json::to_string(route).map_err(|e| CoreError::Navigation(e.to_string()))?;
        writeln!(self.out, "{}", json).map_err(|e| CoreError::Navigation(e.to_string()))
    }
}
