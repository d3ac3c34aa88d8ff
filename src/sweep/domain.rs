use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::core::library::LibraryResult;

pub mod service;

// SweepReport counts what one pass over lapsed ready holds did.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    pub scanned: usize,
    pub expired: usize,
    pub promoted: usize,
    // already handled by another run or a live request
    pub skipped: usize,
    pub errored: usize,
}

#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct OverdueReport {
    pub scanned: usize,
    pub flagged: usize,
    pub skipped: usize,
    pub errored: usize,
}

// SweepService reconciles circulation state on a schedule, without a request in flight.
#[async_trait]
pub trait SweepService: Sync + Send {
    async fn run(&self) -> LibraryResult<SweepReport>;
    async fn flag_overdue_loans(&self) -> LibraryResult<OverdueReport>;
}
