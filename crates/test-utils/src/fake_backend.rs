use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use assetdag::engine::{ActionOutcome, BindingName, WatchEvent};
use assetdag::errors::Result;
use assetdag::exec::ActionBackend;

/// A fake backend that:
/// - records which bindings were dispatched, in order
/// - optionally reports `Finished(Success)` immediately for each dispatch.
///
/// With `auto_finish = false` the test decides when actions end by sending
/// `WatchEvent::Finished` itself.
pub struct FakeBackend {
    runtime_tx: mpsc::Sender<WatchEvent>,
    dispatched: Arc<Mutex<Vec<BindingName>>>,
    auto_finish: bool,
}

impl FakeBackend {
    pub fn new(runtime_tx: mpsc::Sender<WatchEvent>, auto_finish: bool) -> Self {
        Self {
            runtime_tx,
            dispatched: Arc::new(Mutex::new(Vec::new())),
            auto_finish,
        }
    }

    /// Shared handle to the dispatch log; stays valid after the backend
    /// moves into the runtime.
    pub fn log(&self) -> Arc<Mutex<Vec<BindingName>>> {
        Arc::clone(&self.dispatched)
    }
}

impl ActionBackend for FakeBackend {
    fn dispatch(
        &mut self,
        binding: BindingName,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let dispatched = Arc::clone(&self.dispatched);
        let auto_finish = self.auto_finish;

        Box::pin(async move {
            dispatched.lock().unwrap().push(binding.clone());

            if auto_finish {
                // The runtime is the receiver and is busy in this call, so
                // send from a separate task.
                tokio::spawn(async move {
                    let _ = tx
                        .send(WatchEvent::Finished {
                            binding,
                            outcome: ActionOutcome::Success,
                        })
                        .await;
                });
            }
            Ok(())
        })
    }
}
