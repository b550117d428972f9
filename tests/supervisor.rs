use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use autofill_cli::{supervise, LineSink, SinkClosed, SupervisorLimits, SupervisorOutcome};
use autofill_core_types::{AutofillError, AutomationRequest, TaskId, TaskStatus};
use autofill_scheduler::{ManagerConfig, RunContext, SchedulerError, TaskManager, TaskRunner};
use tokio_util::sync::CancellationToken;

/// Collected sink output, keepalives recorded as `None`.
#[derive(Default)]
struct Lines(Mutex<Vec<Option<String>>>);

impl Lines {
    fn push(&self, line: Option<String>) {
        self.0.lock().unwrap().push(line);
    }

    fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().iter().flatten().cloned().collect()
    }

    fn keepalives(&self) -> usize {
        self.0.lock().unwrap().iter().filter(|l| l.is_none()).count()
    }
}

#[derive(Default)]
struct CollectingSink {
    seen: Lines,
    fail_after: Option<usize>,
}

#[async_trait]
impl LineSink for CollectingSink {
    async fn send_line(&self, line: String) -> Result<(), SinkClosed> {
        if let Some(limit) = self.fail_after {
            if self.seen.lines().len() >= limit {
                return Err(SinkClosed);
            }
        }
        self.seen.push(Some(line));
        Ok(())
    }

    async fn keepalive(&self) -> Result<(), SinkClosed> {
        self.seen.push(None);
        Ok(())
    }
}

/// Emits `lines` with `gap` between them, then either finishes or waits for cancel.
struct Talker {
    lines: Vec<&'static str>,
    gap: Duration,
    hang: bool,
}

#[async_trait]
impl TaskRunner for Talker {
    async fn run(&self, ctx: RunContext) -> Result<(), AutofillError> {
        for line in &self.lines {
            ctx.progress.emit(line);
            tokio::time::sleep(self.gap).await;
        }
        if self.hang {
            ctx.cancel.cancelled().await;
            return Err(AutofillError::Cancelled);
        }
        Ok(())
    }
}

fn manager(runner: Talker) -> Arc<TaskManager> {
    Arc::new(TaskManager::new(Arc::new(runner), ManagerConfig::default()))
}

fn limits(deadline: u64, heartbeat: u64) -> SupervisorLimits {
    SupervisorLimits {
        deadline: Duration::from_secs(deadline),
        heartbeat: Duration::from_secs(heartbeat),
    }
}

#[tokio::test]
async fn relays_lines_until_completion() {
    let manager = manager(Talker {
        lines: vec!["one", "two", "three"],
        gap: Duration::from_millis(5),
        hang: false,
    });
    let id = TaskId::from("relay");
    manager
        .start_task(id.clone(), AutomationRequest::default())
        .unwrap();

    let sink = CollectingSink::default();
    let outcome = supervise(&manager, &id, &sink, CancellationToken::new(), limits(60, 30))
        .await
        .unwrap();

    assert_eq!(sink.seen.lines(), vec!["one", "two", "three"]);
    match outcome {
        SupervisorOutcome::Completed(snapshot) => {
            assert_eq!(snapshot.status, TaskStatus::Completed);
            assert!(snapshot.ended_at.is_some());
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn unknown_task_is_an_error() {
    let manager = manager(Talker {
        lines: vec![],
        gap: Duration::ZERO,
        hang: false,
    });
    let sink = CollectingSink::default();
    let err = supervise(
        &manager,
        &TaskId::from("nope"),
        &sink,
        CancellationToken::new(),
        limits(60, 30),
    )
    .await
    .unwrap_err();
    assert_eq!(err, SchedulerError::UnknownTask("nope".into()));
}

#[tokio::test]
async fn disconnect_cancels_the_task() {
    let manager = manager(Talker {
        lines: vec!["working"],
        gap: Duration::ZERO,
        hang: true,
    });
    let id = TaskId::from("gone");
    manager
        .start_task(id.clone(), AutomationRequest::default())
        .unwrap();

    let disconnect = CancellationToken::new();
    let trigger = disconnect.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let sink = CollectingSink::default();
    let outcome = supervise(&manager, &id, &sink, disconnect, limits(60, 30))
        .await
        .unwrap();
    assert_eq!(outcome, SupervisorOutcome::Disconnected);

    let snapshot = manager.wait_for_completion(&id).await.unwrap();
    assert_eq!(snapshot.status, TaskStatus::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn deadline_cancels_a_hanging_task() {
    let manager = manager(Talker {
        lines: vec!["working"],
        gap: Duration::ZERO,
        hang: true,
    });
    let id = TaskId::from("slow");
    manager
        .start_task(id.clone(), AutomationRequest::default())
        .unwrap();

    let sink = CollectingSink::default();
    let outcome = supervise(&manager, &id, &sink, CancellationToken::new(), limits(120, 30))
        .await
        .unwrap();
    assert_eq!(outcome, SupervisorOutcome::TimedOut);
    assert_eq!(sink.seen.lines(), vec!["working"]);
    assert!(sink.seen.keepalives() >= 3);

    let snapshot = manager.wait_for_completion(&id).await.unwrap();
    assert_eq!(snapshot.status, TaskStatus::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn heartbeat_only_fires_on_silence() {
    let manager = manager(Talker {
        lines: vec!["a", "b", "c", "d"],
        gap: Duration::from_secs(20),
        hang: false,
    });
    let id = TaskId::from("chatty");
    manager
        .start_task(id.clone(), AutomationRequest::default())
        .unwrap();

    let sink = CollectingSink::default();
    let outcome = supervise(&manager, &id, &sink, CancellationToken::new(), limits(600, 30))
        .await
        .unwrap();
    assert!(matches!(outcome, SupervisorOutcome::Completed(_)));
    assert_eq!(sink.seen.lines(), vec!["a", "b", "c", "d"]);
    assert_eq!(sink.seen.keepalives(), 0);
}

#[tokio::test]
async fn failing_sink_cancels_the_task() {
    let manager = manager(Talker {
        lines: vec!["one", "two", "three"],
        gap: Duration::from_millis(5),
        hang: true,
    });
    let id = TaskId::from("broken-pipe");
    manager
        .start_task(id.clone(), AutomationRequest::default())
        .unwrap();

    let sink = CollectingSink {
        fail_after: Some(1),
        ..CollectingSink::default()
    };
    let outcome = supervise(&manager, &id, &sink, CancellationToken::new(), limits(60, 30))
        .await
        .unwrap();
    assert_eq!(outcome, SupervisorOutcome::Disconnected);
    assert_eq!(sink.seen.lines(), vec!["one"]);

    let snapshot = manager.wait_for_completion(&id).await.unwrap();
    assert_eq!(snapshot.status, TaskStatus::Cancelled);
}
