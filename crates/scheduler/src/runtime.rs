use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};
use std::time::Duration;

use autofill_core_types::{AutofillError, AutomationRequest, ProgressSink, TaskId, TaskStatus};
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::channel::{ProgressChannel, ProgressReceiver};
use crate::error::SchedulerError;
use crate::executor::{RunContext, TaskRunner};
use crate::instance::TaskInstance;
use crate::model::{ManagerConfig, TaskRecord, TaskSnapshot};

pub const CANCELLED_MESSAGE: &str = "Task cancelled";

struct TaskEntry {
    record: Arc<Mutex<TaskRecord>>,
    instance: TaskInstance,
    progress: Arc<ProgressChannel>,
    receiver: ProgressReceiver,
    /// Fired when the execution wrapper has fully finished.
    done: CancellationToken,
}

/// Registry of tasks and owner of their lifecycle.
///
/// Each started task gets its own tokio task; there is no concurrency bound,
/// callers that accept untrusted traffic must rate-limit in front of this.
pub struct TaskManager {
    tasks: DashMap<TaskId, Arc<TaskEntry>>,
    runner: Arc<dyn TaskRunner>,
    config: ManagerConfig,
}

impl TaskManager {
    pub fn new(runner: Arc<dyn TaskRunner>, config: ManagerConfig) -> Self {
        Self {
            tasks: DashMap::new(),
            runner,
            config,
        }
    }

    /// Registers the task and launches it in the background.
    ///
    /// Must be called from within a tokio runtime.
    #[instrument(skip_all, fields(task_id = %id))]
    pub fn start_task(&self, id: TaskId, request: AutomationRequest) -> Result<(), AutofillError> {
        let entry = match self.tasks.entry(id.clone()) {
            Entry::Occupied(_) => {
                warn!("duplicate task id rejected");
                return Err(SchedulerError::DuplicateTask(id.to_string()).into());
            }
            Entry::Vacant(slot) => {
                let record = Arc::new(Mutex::new(TaskRecord::new(id.clone())));
                let (progress, receiver) = ProgressChannel::new(
                    id.clone(),
                    Arc::clone(&record),
                    self.config.progress_capacity,
                );
                let entry = Arc::new(TaskEntry {
                    record,
                    instance: TaskInstance::new(id.clone(), request),
                    progress: Arc::new(progress),
                    receiver,
                    done: CancellationToken::new(),
                });
                slot.insert(Arc::clone(&entry));
                entry
            }
        };

        info!("task registered");
        let runner = Arc::clone(&self.runner);
        let release_timeout = self.config.session_release_timeout();
        tokio::spawn(execute(entry, runner, release_timeout));
        Ok(())
    }

    pub fn progress_channel(&self, id: &TaskId) -> Option<ProgressReceiver> {
        self.tasks.get(id).map(|entry| entry.receiver.clone())
    }

    pub fn status(&self, id: &TaskId) -> Option<TaskSnapshot> {
        self.tasks.get(id).map(|entry| entry.record.lock().snapshot())
    }

    /// Cancels a running task. Anything not currently running is left alone.
    #[instrument(skip_all, fields(task_id = %id))]
    pub fn cancel_task(&self, id: &TaskId) -> bool {
        let Some(entry) = self.tasks.get(id).map(|entry| Arc::clone(entry.value())) else {
            return false;
        };
        {
            let mut record = entry.record.lock();
            if record.status() != TaskStatus::Running {
                debug!(status = %record.status(), "cancel ignored");
                return false;
            }
            record.finish(TaskStatus::Cancelled, None);
            record.force_progress(CANCELLED_MESSAGE);
            // The wrapper closes the channel once it sees the token or its own
            // end, so the final line goes in first, under the record lock.
            entry.progress.close_with(Some(CANCELLED_MESSAGE));
        }
        entry.instance.cancel.fire();
        info!("task cancelled");
        true
    }

    /// Drops every task that ended at least `max_age` ago. Returns how many.
    pub fn cleanup_completed_tasks(&self, max_age: Duration) -> usize {
        let now = Utc::now();
        let mut removed = 0;
        self.tasks.retain(|_, entry| {
            let expired = entry.record.lock().ended_at().is_some_and(|ended| {
                now.signed_duration_since(ended)
                    .to_std()
                    .is_ok_and(|age| age >= max_age)
            });
            if expired {
                removed += 1;
            }
            !expired
        });
        if removed > 0 {
            info!(removed, "completed tasks cleaned up");
        }
        removed
    }

    pub fn list_tasks(&self) -> Vec<TaskSnapshot> {
        let mut tasks: Vec<_> = self
            .tasks
            .iter()
            .map(|entry| entry.record.lock().snapshot())
            .collect();
        tasks.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Resolves once the task's session is released and its channel closed.
    pub async fn wait_for_completion(&self, id: &TaskId) -> Result<TaskSnapshot, SchedulerError> {
        let entry = self
            .tasks
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| SchedulerError::UnknownTask(id.to_string()))?;
        entry.done.cancelled().await;
        let snapshot = entry.record.lock().snapshot();
        Ok(snapshot)
    }

    /// Periodically sweeps ended tasks until the manager is dropped.
    pub fn spawn_janitor(self: &Arc<Self>, interval: Duration, max_age: Duration) -> JoinHandle<()> {
        let manager: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                manager.cleanup_completed_tasks(max_age);
            }
            debug!("task janitor stopped");
        })
    }
}

/// Execution wrapper: runs the task, converts panics into failures, then
/// releases the session, closes the channel and signals completion.
#[instrument(name = "autofill.task", skip_all, fields(task_id = %entry.instance.id))]
async fn execute(entry: Arc<TaskEntry>, runner: Arc<dyn TaskRunner>, release_timeout: Duration) {
    entry.record.lock().mark_running();
    let ctx = RunContext {
        task_id: entry.instance.id.clone(),
        request: Arc::clone(&entry.instance.request),
        progress: Arc::clone(&entry.progress) as Arc<dyn ProgressSink>,
        cancel: entry.instance.cancel.token(),
        session: entry.instance.session.clone(),
    };

    let result = match AssertUnwindSafe(runner.run(ctx)).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(panic = %message, "task panicked");
            Err(AutofillError::PanicRecovered(message))
        }
    };

    match result {
        Ok(()) => {
            if entry.record.lock().finish(TaskStatus::Completed, None) {
                info!("task completed");
            }
        }
        Err(err) if err.is_cancelled() => {
            // Only a cancel request fires the token, and it already set the status.
            entry.record.lock().finish(TaskStatus::Cancelled, None);
            info!("task stopped at cancellation checkpoint");
        }
        Err(err) => {
            let line = format!("Task failed: {err}");
            info!(task_id = %entry.instance.id, "{line}");
            entry.progress.send(&line);
            if entry
                .record
                .lock()
                .finish(TaskStatus::Failed, Some(err.to_string()))
            {
                warn!(error = %err, "task failed");
            }
        }
    }

    entry.instance.session.release(release_timeout).await;
    entry.progress.close();
    entry.done.cancel();
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use action_flow::fixture::simulated_portal;
    use action_flow::{PacingConfig, PortalLayout};
    use async_trait::async_trait;
    use autofill_core_types::{BasicInfo, CostItem, Credentials, PaymentInfo};
    use autofill_driver::scripted::{ScriptedDriver, ScriptedLauncher};

    use super::*;
    use crate::executor::FlowRunner;

    /// Emits a line, then waits for cancellation like a pipeline at a checkpoint.
    struct UntilCancelled;

    #[async_trait]
    impl TaskRunner for UntilCancelled {
        async fn run(&self, ctx: RunContext) -> Result<(), AutofillError> {
            ctx.progress.emit("working");
            ctx.cancel.cancelled().await;
            Err(AutofillError::Cancelled)
        }
    }

    struct Outcome(Result<(), AutofillError>);

    #[async_trait]
    impl TaskRunner for Outcome {
        async fn run(&self, ctx: RunContext) -> Result<(), AutofillError> {
            ctx.progress.emit("working");
            self.0.clone()
        }
    }

    struct Panics(Arc<ScriptedDriver>);

    #[async_trait]
    impl TaskRunner for Panics {
        async fn run(&self, ctx: RunContext) -> Result<(), AutofillError> {
            ctx.session.attach(self.0.clone()).await;
            panic!("driver exploded");
        }
    }

    fn manager(runner: impl TaskRunner + 'static) -> TaskManager {
        TaskManager::new(Arc::new(runner), ManagerConfig::default())
    }

    async fn drain(rx: &ProgressReceiver) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = rx.recv().await {
            lines.push(line);
        }
        lines
    }

    fn sample_request() -> AutomationRequest {
        AutomationRequest {
            credentials: Credentials {
                username: "clerk".into(),
                password: "pw".into(),
            },
            basic: BasicInfo {
                category: "日常费用报销".into(),
                urgency: "一般".into(),
                comment: "trip".into(),
            },
            payment: PaymentInfo {
                business_dept: "研发部".into(),
                budget_dept: "研发部".into(),
                project_type: "研发项目".into(),
                project: None,
                pay_company: "总公司".into(),
            },
            cost_items: vec![
                CostItem {
                    category: "交通费".into(),
                    name: "出租车".into(),
                    comment: "airport".into(),
                    amount: "80".into(),
                    bill_count: "1".into(),
                },
                CostItem {
                    category: "住宿费".into(),
                    name: "酒店".into(),
                    comment: "2 nights".into(),
                    amount: "600".into(),
                    bill_count: "2".into(),
                },
            ],
            files: vec![PathBuf::from("/tmp/invoice.pdf")],
        }
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected_without_disturbing_first() {
        let manager = manager(UntilCancelled);
        let id = TaskId::from("dup");
        manager.start_task(id.clone(), AutomationRequest::default()).unwrap();
        let rx = manager.progress_channel(&id).unwrap();
        assert_eq!(rx.recv().await.as_deref(), Some("working"));

        let err = manager
            .start_task(id.clone(), AutomationRequest::default())
            .unwrap_err();
        assert_eq!(err, AutofillError::DuplicateTask("dup".into()));
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.status(&id).unwrap().status, TaskStatus::Running);

        assert!(manager.cancel_task(&id));
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let manager = manager(Outcome(Ok(())));
        let id = TaskId::from("missing");
        assert!(manager.status(&id).is_none());
        assert!(manager.progress_channel(&id).is_none());
        assert!(!manager.cancel_task(&id));
        assert_eq!(
            manager.wait_for_completion(&id).await,
            Err(SchedulerError::UnknownTask("missing".into()))
        );
    }

    #[tokio::test]
    async fn completed_task_closes_channel_and_stamps_end() {
        let manager = manager(Outcome(Ok(())));
        let id = TaskId::from("ok");
        manager.start_task(id.clone(), AutomationRequest::default()).unwrap();
        let rx = manager.progress_channel(&id).unwrap();

        assert_eq!(drain(&rx).await, vec!["working".to_string()]);
        let snapshot = manager.wait_for_completion(&id).await.unwrap();
        assert_eq!(snapshot.status, TaskStatus::Completed);
        assert!(snapshot.ended_at.is_some());
        assert!(snapshot.error.is_none());

        assert!(!manager.cancel_task(&id));
        assert_eq!(manager.status(&id).unwrap().status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn failed_task_reports_error() {
        let manager = manager(Outcome(Err(AutofillError::step(
            "save",
            AutofillError::ElementNotFound("role=button".into()),
        ))));
        let id = TaskId::from("bad");
        manager.start_task(id.clone(), AutomationRequest::default()).unwrap();
        let rx = manager.progress_channel(&id).unwrap();

        let lines = drain(&rx).await;
        assert!(lines.last().unwrap().starts_with("Task failed: save failed"));
        let snapshot = manager.wait_for_completion(&id).await.unwrap();
        assert_eq!(snapshot.status, TaskStatus::Failed);
        assert_eq!(
            snapshot.error.as_deref(),
            Some("save failed: element not found: role=button")
        );
    }

    #[tokio::test]
    async fn cancel_running_task() {
        let manager = manager(UntilCancelled);
        let id = TaskId::from("c");
        manager.start_task(id.clone(), AutomationRequest::default()).unwrap();
        let rx = manager.progress_channel(&id).unwrap();
        assert_eq!(rx.recv().await.as_deref(), Some("working"));

        assert!(manager.cancel_task(&id));
        assert!(!manager.cancel_task(&id));

        assert_eq!(drain(&rx).await, vec![CANCELLED_MESSAGE.to_string()]);
        let snapshot = tokio::time::timeout(Duration::from_secs(5), manager.wait_for_completion(&id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.status, TaskStatus::Cancelled);
        assert_eq!(snapshot.progress, CANCELLED_MESSAGE);
        assert!(snapshot.ended_at.is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn cancel_line_survives_multi_threaded_wrapper() {
        let manager = manager(UntilCancelled);
        for round in 0..500 {
            let id = TaskId::from(format!("mt-{round}"));
            manager.start_task(id.clone(), AutomationRequest::default()).unwrap();
            let rx = manager.progress_channel(&id).unwrap();
            assert_eq!(rx.recv().await.as_deref(), Some("working"));

            assert!(manager.cancel_task(&id));
            assert_eq!(
                drain(&rx).await,
                vec![CANCELLED_MESSAGE.to_string()],
                "round {round}"
            );
            manager.wait_for_completion(&id).await.unwrap();
        }
    }

    #[tokio::test]
    async fn concurrent_cancels_fire_once() {
        let manager = Arc::new(manager(UntilCancelled));
        let id = TaskId::from("race");
        manager.start_task(id.clone(), AutomationRequest::default()).unwrap();
        let rx = manager.progress_channel(&id).unwrap();
        rx.recv().await;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = Arc::clone(&manager);
                let id = id.clone();
                tokio::spawn(async move { manager.cancel_task(&id) })
            })
            .collect();
        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(drain(&rx).await.len(), 1);
        manager.wait_for_completion(&id).await.unwrap();
    }

    #[tokio::test]
    async fn panic_becomes_failure_and_releases_session() {
        let driver = Arc::new(ScriptedDriver::lenient());
        let manager = manager(Panics(driver.clone()));
        let id = TaskId::from("p");
        manager.start_task(id.clone(), AutomationRequest::default()).unwrap();
        let rx = manager.progress_channel(&id).unwrap();

        let lines = drain(&rx).await;
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("driver exploded"));
        let snapshot = manager.wait_for_completion(&id).await.unwrap();
        assert_eq!(snapshot.status, TaskStatus::Failed);
        assert!(snapshot.error.unwrap().contains("panicked"));
        assert!(driver.is_closed());
    }

    #[tokio::test]
    async fn cleanup_only_removes_ended_tasks() {
        let manager = Arc::new(TaskManager::new(
            Arc::new(Outcome(Ok(()))),
            ManagerConfig::default(),
        ));
        let done = TaskId::from("done");
        manager.start_task(done.clone(), AutomationRequest::default()).unwrap();
        manager.wait_for_completion(&done).await.unwrap();

        let running = TaskManager::new(Arc::new(UntilCancelled), ManagerConfig::default());
        let live = TaskId::from("live");
        running.start_task(live.clone(), AutomationRequest::default()).unwrap();
        running.progress_channel(&live).unwrap().recv().await;

        assert_eq!(manager.cleanup_completed_tasks(Duration::from_secs(3600)), 0);
        assert_eq!(manager.cleanup_completed_tasks(Duration::ZERO), 1);
        assert!(manager.status(&done).is_none());
        assert_eq!(running.cleanup_completed_tasks(Duration::ZERO), 0);
        assert_eq!(running.list_tasks().len(), 1);
        running.cancel_task(&live);
    }

    #[tokio::test]
    async fn end_to_end_against_simulated_portal() {
        let request = sample_request();
        let driver = Arc::new(simulated_portal(&PortalLayout::default(), &request));
        let runner = FlowRunner::new(Arc::new(ScriptedLauncher::shared(driver.clone())))
            .with_pacing(PacingConfig::immediate());
        let manager = TaskManager::new(
            Arc::new(runner),
            ManagerConfig {
                progress_capacity: 512,
                ..ManagerConfig::default()
            },
        );
        let id = TaskId::from("e2e");
        manager.start_task(id.clone(), request).unwrap();
        let rx = manager.progress_channel(&id).unwrap();

        let lines = drain(&rx).await;
        let count = |needle: &str| lines.iter().filter(|l| l.contains(needle)).count();
        assert_eq!(count("Browser session started"), 1);
        assert_eq!(count("Logging in"), 1);
        assert_eq!(count("Adding detail row"), 2);
        assert_eq!(count("- Setting cost "), 10);
        assert_eq!(count("Uploading invoice.pdf"), 1);
        assert_eq!(count("## Saving"), 1);

        let snapshot = manager.wait_for_completion(&id).await.unwrap();
        assert_eq!(snapshot.status, TaskStatus::Completed, "{:?}", snapshot.error);
        assert!(driver.is_closed());
    }

    #[tokio::test]
    async fn launch_failure_is_hard() {
        let runner = FlowRunner::new(Arc::new(ScriptedLauncher::failing("no chromium")));
        let manager = TaskManager::new(Arc::new(runner), ManagerConfig::default());
        let id = TaskId::from("nolaunch");
        manager.start_task(id.clone(), AutomationRequest::default()).unwrap();
        let rx = manager.progress_channel(&id).unwrap();

        let lines = drain(&rx).await;
        assert_eq!(lines[0], "> Starting browser session");
        assert!(lines[1].starts_with("launch session failed: "));
        assert!(lines[2].starts_with("Task failed: "));
        assert_eq!(lines.len(), 3);

        let snapshot = manager.wait_for_completion(&id).await.unwrap();
        assert_eq!(snapshot.status, TaskStatus::Failed);
        assert!(snapshot.error.unwrap().starts_with("launch session failed"));
    }

    #[tokio::test(start_paused = true)]
    async fn janitor_sweeps_periodically() {
        let manager = Arc::new(manager(Outcome(Ok(()))));
        let id = TaskId::from("j");
        manager.start_task(id.clone(), AutomationRequest::default()).unwrap();
        manager.wait_for_completion(&id).await.unwrap();

        let janitor = manager.spawn_janitor(Duration::from_secs(60), Duration::ZERO);
        tokio::time::sleep(Duration::from_secs(61)).await;
        tokio::task::yield_now().await;
        assert!(manager.is_empty());
        janitor.abort();
    }
}
