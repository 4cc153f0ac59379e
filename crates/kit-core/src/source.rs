//! Request-list collaborator

use crate::model::RentalRequestRecord;
use crate::{CoreResult, ScanMode};
use async_trait::async_trait;

/// Read access to the rental requests held by the backend
#[async_trait]
pub trait RequestDirectory: Send + Sync {
    /// Every request regardless of status
    async fn list_requests(&self) -> CoreResult<Vec<RentalRequestRecord>>;

    /// Requests that have been approved
    async fn list_approved_requests(&self) -> CoreResult<Vec<RentalRequestRecord>>;

    /// Candidate pool searched for the given mode
    async fn candidates(&self, mode: ScanMode) -> CoreResult<Vec<RentalRequestRecord>> {
        match mode {
            ScanMode::Approval => self.list_requests().await,
            ScanMode::Return => self.list_approved_requests().await,
        }
    }
}

/// Directory backed by a fixed list, for offline use and tests
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    records: Vec<RentalRequestRecord>,
}

impl StaticDirectory {
    pub fn new(records: Vec<RentalRequestRecord>) -> Self {
        Self { records }
    }

    pub fn from_json(json: &str) -> CoreResult<Self> {
        let records = serde_json::from_str(json)
            .map_err(|e| crate::CoreError::Parse(format!("invalid request list: {}", e)))?;
        Ok(Self::new(records))
    }
}

#[async_trait]
impl RequestDirectory for StaticDirectory {
    async fn list_requests(&self) -> CoreResult<Vec<RentalRequestRecord>> {
        Ok(self.records.clone())
    }

    async fn list_approved_requests(&self) -> CoreResult<Vec<RentalRequestRecord>> {
        Ok(self.records.iter().filter(|r| r.is_approved()).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_directory_pools() {
        let directory = StaticDirectory::from_json(
            r#"[
                {"id": 1, "requestedBy": {"id": 42}, "kit": {"id": 7}, "status": "PENDING"},
                {"id": 2, "requestedBy": {"id": 42}, "kit": {"id": 7}, "status": "APPROVED"}
            ]"#,
        )
        .unwrap();

        assert_eq!(directory.candidates(ScanMode::Approval).await.unwrap().len(), 2);

        let approved = directory.candidates(ScanMode::Return).await.unwrap();
        assert_eq!(approved.len(), 1);
        assert!(approved[0].id.matches("2"));
    }

    #[test]
    fn test_static_directory_rejects_bad_json() {
        assert!(StaticDirectory::from_json("{not json").is_err());
    }
}
