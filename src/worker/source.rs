//! Where a range worker gets its work
//!
//! The worker only ever talks to a `WorkSource`. In standalone mode that is
//! the in-process `Coordinator`; in worker mode it is the HTTP client in
//! `distributed::client`. These three calls are the only places a worker
//! suspends.

use crate::coordinator::Coordinator;
use crate::distributed::protocol::{RangeReport, SubmitAck, WorkAssignment, WorkerId};
use crate::error::SweepResult;
use crate::stats::GlobalStatus;
use async_trait::async_trait;

#[async_trait]
pub trait WorkSource: Send + Sync {
    /// Lease the next range to `worker_id`
    async fn request_work(&self, worker_id: &WorkerId) -> SweepResult<WorkAssignment>;

    /// Deliver the results of a completed range
    async fn submit_result(&self, report: &RangeReport) -> SweepResult<SubmitAck>;

    /// Fetch the merged global status
    async fn status(&self) -> SweepResult<GlobalStatus>;
}

#[async_trait]
impl WorkSource for Coordinator {
    async fn request_work(&self, worker_id: &WorkerId) -> SweepResult<WorkAssignment> {
        self.issue(worker_id)
    }

    async fn submit_result(&self, report: &RangeReport) -> SweepResult<SubmitAck> {
        self.submit(report.clone()).map(SubmitAck::from)
    }

    async fn status(&self) -> SweepResult<GlobalStatus> {
        Ok(Coordinator::status(self))
    }
}
