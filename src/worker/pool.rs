//! Worker pool
//!
//! Runs several range workers as tokio tasks in one process, all drawing from
//! the same work source. Only the first worker polls status so the sink sees
//! one status line per interval regardless of pool size.

use super::{RangeWorker, StopHandle, WorkSource, WorkerSettings};
use crate::distributed::protocol::WorkerId;
use crate::oracle::DivisibilityOracle;
use crate::output::StatusSink;
use crate::stats::{WorkerCounters, WorkerSummary};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Stops every worker of a pool without owning it
#[derive(Debug, Clone)]
pub struct PoolStopper {
    handles: Vec<StopHandle>,
}

impl PoolStopper {
    pub fn stop_all(&self) {
        for handle in &self.handles {
            handle.stop();
        }
    }
}

/// Totals of a finished pool
#[derive(Debug, Clone, Default)]
pub struct PoolReport {
    pub summary: WorkerSummary,

    /// Workers that ended on an error, with the error text
    pub failures: Vec<(WorkerId, String)>,
}

struct PoolMember {
    id: WorkerId,
    stop: StopHandle,
    counters: Arc<WorkerCounters>,
    task: JoinHandle<crate::error::SweepResult<WorkerSummary>>,
}

pub struct WorkerPool {
    members: Vec<PoolMember>,
}

impl WorkerPool {
    /// Spawn `count` workers on the current runtime
    ///
    /// Ids are `<prefix>-<n>` when a prefix is given, generated otherwise.
    /// `make_oracle` is called once per worker with its index.
    pub fn spawn<F>(
        count: usize,
        id_prefix: Option<&str>,
        source: Arc<dyn WorkSource>,
        sink: Arc<dyn StatusSink>,
        settings: &WorkerSettings,
        mut make_oracle: F,
    ) -> Self
    where
        F: FnMut(usize) -> Box<dyn DivisibilityOracle>,
    {
        let members = (0..count)
            .map(|index| {
                let id = match id_prefix {
                    Some(prefix) => WorkerId::new(format!("{}-{}", prefix, index)),
                    None => WorkerId::generate(),
                };

                let mut worker_settings = settings.clone();
                if index > 0 {
                    worker_settings.status_interval = None;
                }

                let mut worker = RangeWorker::new(
                    id.clone(),
                    source.clone(),
                    make_oracle(index),
                    sink.clone(),
                    worker_settings,
                );
                let stop = worker.stop_handle();
                let counters = worker.counters();
                let task = tokio::spawn(async move { worker.run().await });

                PoolMember { id, stop, counters, task }
            })
            .collect::<Vec<_>>();

        info!("Spawned {} range workers", members.len());
        Self { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[cfg(test)]
    fn worker_ids(&self) -> Vec<WorkerId> {
        self.members.iter().map(|m| m.id.clone()).collect()
    }

    pub fn stopper(&self) -> PoolStopper {
        PoolStopper {
            handles: self.members.iter().map(|m| m.stop.clone()).collect(),
        }
    }

    /// Combined live counters of every worker
    pub fn summary(&self) -> WorkerSummary {
        let mut total = WorkerSummary::default();
        for member in &self.members {
            total.merge(&member.counters.summary());
        }
        total
    }

    /// Wait for every worker to end on its own
    ///
    /// Workers end when stopped or when a request fails.
    pub async fn join(self) -> PoolReport {
        let mut report = PoolReport::default();

        for member in self.members {
            match member.task.await {
                Ok(Ok(summary)) => report.summary.merge(&summary),
                Ok(Err(e)) => {
                    report.summary.merge(&member.counters.summary());
                    report.failures.push((member.id, e.to_string()));
                }
                Err(e) => {
                    error!("Worker {} task failed: {}", member.id, e);
                    report.summary.merge(&member.counters.summary());
                    report.failures.push((member.id, e.to_string()));
                }
            }
        }

        report
    }

    /// Stop every worker and wait for them
    pub async fn shutdown(self) -> PoolReport {
        self.stopper().stop_all();
        self.join().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::{Coordinator, CoordinatorSettings};
    use crate::oracle::ModulusOracle;
    use crate::output::NullSink;
    use crate::target::TargetNumber;
    use std::time::Duration;

    fn fast_settings() -> WorkerSettings {
        WorkerSettings {
            batch_size: 25,
            work_interval: Duration::from_millis(1),
            status_interval: Some(Duration::from_millis(20)),
        }
    }

    #[tokio::test]
    async fn test_pool_workers_share_coordinator() {
        let settings = CoordinatorSettings {
            range_size: 200,
            ..Default::default()
        };
        let coord = Arc::new(Coordinator::new(TargetNumber::parse("589").unwrap(), settings));

        let pool = WorkerPool::spawn(
            4,
            Some("pool"),
            coord.clone(),
            Arc::new(NullSink),
            &fast_settings(),
            |_| Box::new(ModulusOracle),
        );
        assert_eq!(pool.len(), 4);
        assert_eq!(pool.worker_ids()[2], WorkerId::new("pool-2"));

        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        while coord.status().largest_prime_tested < 2001 {
            assert!(tokio::time::Instant::now() < deadline, "pool made no progress");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let report = pool.shutdown().await;
        assert!(report.failures.is_empty());
        assert!(report.summary.ranges_completed >= 1);
        assert_eq!(report.summary.submissions_lost, 0);
        assert_eq!(coord.divisors().len() as u64, coord.status().divisors_found);
    }

    #[tokio::test]
    async fn test_stopper_ends_join() {
        let coord = Arc::new(Coordinator::new(
            TargetNumber::parse("589").unwrap(),
            CoordinatorSettings::default(),
        ));
        let pool = WorkerPool::spawn(
            2,
            None,
            coord,
            Arc::new(NullSink),
            &fast_settings(),
            |_| Box::new(ModulusOracle),
        );
        let stopper = pool.stopper();

        let join = pool.join();
        tokio::pin!(join);
        tokio::time::sleep(Duration::from_millis(20)).await;
        stopper.stop_all();

        let report = tokio::time::timeout(Duration::from_secs(5), &mut join)
            .await
            .unwrap();
        assert!(report.failures.is_empty());
    }
}
