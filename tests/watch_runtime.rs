// tests/watch_runtime.rs

mod common;
use crate::common::{FakeBackend, init_tracing, with_timeout};

use std::error::Error;
use std::time::Duration;

use tokio::sync::mpsc;

use assetdag::engine::{
    ActionOutcome, CoreRuntime, TriggerWhileRunningBehaviour, WatchEvent, WatchRuntime,
};

type TestResult = Result<(), Box<dyn Error>>;

fn trigger(binding: &str) -> WatchEvent {
    WatchEvent::Triggered {
        binding: binding.to_string(),
    }
}

fn finished(binding: &str) -> WatchEvent {
    WatchEvent::Finished {
        binding: binding.to_string(),
        outcome: ActionOutcome::Success,
    }
}

#[tokio::test]
async fn queue_mode_coalesces_a_burst_into_one_rerun() -> TestResult {
    init_tracing();
    let (tx, rx) = mpsc::channel(32);
    let backend = FakeBackend::new(tx.clone(), false);
    let log = backend.log();
    let core = CoreRuntime::new(TriggerWhileRunningBehaviour::Queue, 1);
    let handle = tokio::spawn(WatchRuntime::new(core, rx, backend).run());

    for _ in 0..5 {
        tx.send(trigger("styles")).await?;
    }
    tx.send(finished("styles")).await?;
    tx.send(finished("styles")).await?;
    tx.send(WatchEvent::ShutdownRequested).await?;

    with_timeout(handle).await??;
    assert_eq!(*log.lock().unwrap(), vec!["styles", "styles"]);
    Ok(())
}

#[tokio::test]
async fn overlap_mode_dispatches_every_trigger() -> TestResult {
    init_tracing();
    let (tx, rx) = mpsc::channel(32);
    let backend = FakeBackend::new(tx.clone(), false);
    let log = backend.log();
    let core = CoreRuntime::new(TriggerWhileRunningBehaviour::Overlap, 1);
    let handle = tokio::spawn(WatchRuntime::new(core, rx, backend).run());

    for _ in 0..3 {
        tx.send(trigger("images")).await?;
    }
    tx.send(WatchEvent::ShutdownRequested).await?;

    with_timeout(handle).await??;
    assert_eq!(log.lock().unwrap().len(), 3);
    Ok(())
}

#[tokio::test]
async fn failed_action_keeps_the_session_alive() -> TestResult {
    init_tracing();
    let (tx, rx) = mpsc::channel(32);
    let backend = FakeBackend::new(tx.clone(), false);
    let log = backend.log();
    let core = CoreRuntime::new(TriggerWhileRunningBehaviour::Queue, 1);
    let handle = tokio::spawn(WatchRuntime::new(core, rx, backend).run());

    tx.send(trigger("styles")).await?;
    tx.send(WatchEvent::Finished {
        binding: "styles".to_string(),
        outcome: ActionOutcome::Failed,
    })
    .await?;
    tx.send(trigger("styles")).await?;
    tx.send(WatchEvent::ShutdownRequested).await?;

    with_timeout(handle).await??;
    assert_eq!(log.lock().unwrap().len(), 2);
    Ok(())
}

#[tokio::test]
async fn bindings_run_independently_with_a_completing_backend() -> TestResult {
    init_tracing();
    let (tx, rx) = mpsc::channel(32);
    let backend = FakeBackend::new(tx.clone(), true);
    let log = backend.log();
    let core = CoreRuntime::new(TriggerWhileRunningBehaviour::Queue, 1);
    let handle = tokio::spawn(WatchRuntime::new(core, rx, backend).run());

    tx.send(trigger("styles")).await?;
    tx.send(trigger("markup")).await?;
    tx.send(trigger("images")).await?;

    with_timeout(async {
        while log.lock().unwrap().len() < 3 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    // Runs again, either at once or as the queued rerun.
    tx.send(trigger("styles")).await?;
    with_timeout(async {
        while log.lock().unwrap().len() < 4 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;

    tx.send(WatchEvent::ShutdownRequested).await?;
    with_timeout(handle).await??;

    let mut seen = log.lock().unwrap().clone();
    seen.sort();
    assert_eq!(seen, vec!["images", "markup", "styles", "styles"]);
    Ok(())
}
