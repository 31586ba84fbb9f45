use std::time::Duration;
use tokio::{sync::mpsc, task::JoinHandle};

const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// A cancellable 1 Hz repeating timer, armed after recoverable errors
/// (§4.2). Each tick sends a signal on an internal channel; the receiving
/// end is read by the loop scheduler to re-enter the restore path.
#[derive(Debug, Default)]
pub struct RetryTimer {
	handle: Option<JoinHandle<()>>,
}

impl RetryTimer {
	pub fn new() -> Self {
		Self { handle: None }
	}

	/// Starts the timer, returning the receiving end of its tick channel.
	/// Always cancels any previously running timer first (idempotent
	/// restart), matching `subscribe`'s own unconditional cancel-on-entry
	/// behaviour.
	pub fn start(&mut self) -> mpsc::Receiver<()> {
		self.stop();

		let (tx, rx) = mpsc::channel(1);
		self.handle = Some(tokio::spawn(async move {
			let mut interval = tokio::time::interval(TICK_INTERVAL);
			interval.tick().await; // discard the immediate first tick
			loop {
				interval.tick().await;
				if tx.send(()).await.is_err() {
					break;
				}
			}
		}));
		rx
	}

	/// Stops the timer. A no-op if it is not currently active.
	pub fn stop(&mut self) {
		if let Some(handle) = self.handle.take() {
			handle.abort();
		}
	}

	pub fn is_active(&self) -> bool {
		self.handle.as_ref().is_some_and(|h| !h.is_finished())
	}
}

impl Drop for RetryTimer {
	fn drop(&mut self) {
		self.stop();
	}
}
