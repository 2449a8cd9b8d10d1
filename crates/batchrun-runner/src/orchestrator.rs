//! Bounded-parallel dispatch of work items.

use std::sync::Arc;

use batchrun_core::{TaskOutcome, WorkItem};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::executor::TaskRunner;

/// Runs every work item through a [`TaskRunner`], at most `concurrency` at a
/// time, and publishes one outcome per item.
pub struct Orchestrator<R> {
    runner: Arc<R>,
    concurrency: usize,
}

impl<R: TaskRunner> Orchestrator<R> {
    /// Create an orchestrator. A concurrency of 0 is treated as 1.
    pub fn new(runner: R, concurrency: usize) -> Self {
        Self {
            runner: Arc::new(runner),
            concurrency: concurrency.max(1),
        }
    }

    /// Concurrency limit in effect.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Dispatch all `items` and publish their outcomes on `outcome_tx`.
    ///
    /// Returns once every spawned task has finished; `outcome_tx` is dropped
    /// at that point, which closes the stream for the consumer. The return
    /// value is the number of outcomes published.
    pub async fn run(&self, items: Vec<WorkItem>, outcome_tx: mpsc::Sender<TaskOutcome>) -> usize {
        let total = items.len();
        let slots = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        info!(
            items = total,
            concurrency = self.concurrency,
            "Dispatching work items"
        );

        for item in items {
            let runner = Arc::clone(&self.runner);
            let slots = Arc::clone(&slots);
            let tx = outcome_tx.clone();

            tasks.spawn(async move {
                // `slots` never outlives this call and is never closed, so
                // acquiring only ever waits for a free slot.
                let _permit = slots.acquire_owned().await.ok();
                let outcome = run_isolated(runner, item).await;
                // The slot is held until the outcome is handed to the sink.
                tx.send(outcome).await.is_ok()
            });
        }
        drop(outcome_tx);

        let mut published = 0usize;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => published += 1,
                Ok(false) => warn!("Result sink closed; outcome dropped"),
                Err(e) => error!(error = %e, "Dispatch task failed"),
            }
        }

        if published != total {
            error!(
                published = published,
                expected = total,
                "Not every work item produced a recorded outcome"
            );
        } else {
            debug!(published = published, "All outcomes published");
        }
        published
    }
}

/// Run one task on its own tokio task so a panicking runner still yields a
/// Failure outcome for its item.
async fn run_isolated<R: TaskRunner>(runner: Arc<R>, item: WorkItem) -> TaskOutcome {
    let case = item.clone();
    let task_runner = Arc::clone(&runner);
    match tokio::spawn(async move { task_runner.run(item).await }).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(case = %case, error = %e, "Task runner panicked");
            TaskOutcome::failure(case, runner.params(), format!("task panicked: {e}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use batchrun_core::{RunParams, TaskResult, TaskStatus};

    /// Fake runner that tracks how many tasks are in flight.
    struct GaugeRunner {
        params: RunParams,
        in_flight: AtomicUsize,
        peak: Arc<AtomicUsize>,
        calls: Arc<AtomicUsize>,
    }

    impl GaugeRunner {
        fn new() -> (Self, Arc<AtomicUsize>, Arc<AtomicUsize>) {
            let peak = Arc::new(AtomicUsize::new(0));
            let calls = Arc::new(AtomicUsize::new(0));
            let runner = Self {
                params: RunParams::default(),
                in_flight: AtomicUsize::new(0),
                peak: Arc::clone(&peak),
                calls: Arc::clone(&calls),
            };
            (runner, peak, calls)
        }
    }

    #[async_trait]
    impl TaskRunner for GaugeRunner {
        fn params(&self) -> &RunParams {
            &self.params
        }

        async fn run(&self, item: WorkItem) -> TaskOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            tokio::time::sleep(Duration::from_millis(10)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            let case = item.case_name();
            match case.as_str() {
                c if c.ends_with("-timeout") => TaskOutcome::timeout(item, &self.params),
                c if c.ends_with("-fail") => TaskOutcome::failure(item, &self.params, "exit status: 1"),
                _ => TaskOutcome::success(
                    item,
                    &self.params,
                    TaskResult {
                        duration: 0.1,
                        solution: "L".to_string(),
                    },
                ),
            }
        }
    }

    /// Fake runner that panics for one specific case.
    struct PanickyRunner {
        params: RunParams,
    }

    #[async_trait]
    impl TaskRunner for PanickyRunner {
        fn params(&self) -> &RunParams {
            &self.params
        }

        async fn run(&self, item: WorkItem) -> TaskOutcome {
            if item.case_name() == "boom" {
                panic!("solver wrapper exploded");
            }
            TaskOutcome::timeout(item, &self.params)
        }
    }

    fn items(names: &[&str]) -> Vec<WorkItem> {
        names
            .iter()
            .map(|n| WorkItem::new(format!("/cases/{n}")))
            .collect()
    }

    async fn collect(mut rx: mpsc::Receiver<TaskOutcome>) -> Vec<TaskOutcome> {
        let mut out = Vec::new();
        while let Some(outcome) = rx.recv().await {
            out.push(outcome);
        }
        out
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_never_exceeds_limit() {
        for limit in [1usize, 2, 3, 8] {
            let (runner, peak, calls) = GaugeRunner::new();
            let orchestrator = Orchestrator::new(runner, limit);
            let names: Vec<String> = (0..20).map(|i| format!("case-{i}")).collect();
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();

            let (tx, rx) = mpsc::channel(4);
            let consumer = tokio::spawn(collect(rx));
            let published = orchestrator.run(items(&refs), tx).await;
            let outcomes = consumer.await.unwrap();

            assert_eq!(published, 20);
            assert_eq!(outcomes.len(), 20);
            assert_eq!(calls.load(Ordering::SeqCst), 20);
            assert!(peak.load(Ordering::SeqCst) <= limit, "limit {limit} exceeded");
            assert!(peak.load(Ordering::SeqCst) >= 1);
        }
    }

    #[tokio::test]
    async fn test_one_outcome_per_item_whatever_the_status() {
        let (runner, _peak, calls) = GaugeRunner::new();
        let orchestrator = Orchestrator::new(runner, 2);
        let input = items(&["a", "b-timeout", "c-fail", "d", "e-fail"]);

        let (tx, rx) = mpsc::channel(8);
        let consumer = tokio::spawn(collect(rx));
        orchestrator.run(input.clone(), tx).await;
        let outcomes = consumer.await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        let seen: HashSet<WorkItem> = outcomes.iter().map(|o| o.item.clone()).collect();
        let expected: HashSet<WorkItem> = input.into_iter().collect();
        assert_eq!(seen, expected);

        let timeouts = outcomes
            .iter()
            .filter(|o| o.status() == TaskStatus::Timeout)
            .count();
        let failures = outcomes
            .iter()
            .filter(|o| o.status() == TaskStatus::Failure)
            .count();
        assert_eq!(timeouts, 1);
        assert_eq!(failures, 2);
    }

    #[tokio::test]
    async fn test_empty_input_closes_stream() {
        let (runner, _peak, calls) = GaugeRunner::new();
        let orchestrator = Orchestrator::new(runner, 4);

        let (tx, rx) = mpsc::channel(1);
        let published = orchestrator.run(Vec::new(), tx).await;
        let outcomes = collect(rx).await;

        assert_eq!(published, 0);
        assert!(outcomes.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_panicking_runner_still_yields_failure() {
        let orchestrator = Orchestrator::new(
            PanickyRunner {
                params: RunParams::default(),
            },
            2,
        );

        let (tx, rx) = mpsc::channel(4);
        let consumer = tokio::spawn(collect(rx));
        let published = orchestrator.run(items(&["ok", "boom"]), tx).await;
        let outcomes = consumer.await.unwrap();

        assert_eq!(published, 2);
        let boom = outcomes
            .iter()
            .find(|o| o.item.case_name() == "boom")
            .unwrap();
        assert_eq!(boom.status(), TaskStatus::Failure);
        assert!(boom.error_detail().unwrap().starts_with("task panicked"));
    }

    #[test]
    fn test_zero_concurrency_is_clamped() {
        let (runner, _peak, _calls) = GaugeRunner::new();
        let orchestrator = Orchestrator::new(runner, 0);
        assert_eq!(orchestrator.concurrency(), 1);
    }
}
