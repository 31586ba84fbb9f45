//! An in-process fake transport and listener sink, used by this crate's own
//! tests and available to embedding applications under the `testing`
//! feature for their own integration tests.

use crate::{
	events::{ActionEvent, DecryptionErrorEvent, FileEvent, MessageEvent, ObjectEvent, PresenceEvent},
	listener::{ListenerSink, StatusNotification},
	transport::{Operation, Status, Transport},
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;

/// A [`Transport`] driven by a scripted queue of responses. Each call to
/// [`Transport::process`] pops the next queued [`Status`]; panics if the
/// queue is exhausted, since an exhausted queue means the test under-
/// specified the scenario.
#[derive(Default)]
pub struct FakeTransport {
	responses: Mutex<VecDeque<Status>>,
	requests: Mutex<Vec<(Operation, String, HashMap<String, String>)>>,
}

impl FakeTransport {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn push_response(&self, status: Status) {
		self.responses.lock().await.push_back(status);
	}

	pub async fn requests(&self) -> Vec<(Operation, String, HashMap<String, String>)> {
		self.requests.lock().await.clone()
	}
}

#[async_trait]
impl Transport for FakeTransport {
	async fn process(&self, operation: Operation, channels: String, params: HashMap<String, String>) -> Status {
		self.requests.lock().await.push((operation, channels, params));
		self.responses
			.lock()
			.await
			.pop_front()
			.expect("FakeTransport queue exhausted: test scenario under-scripted")
	}
}

/// A [`ListenerSink`] that records every dispatch for later assertions.
#[derive(Default)]
pub struct RecordingListener {
	pub statuses: Mutex<Vec<StatusNotification>>,
	pub messages: Mutex<Vec<MessageEvent>>,
	pub signals: Mutex<Vec<MessageEvent>>,
	pub actions: Mutex<Vec<ActionEvent>>,
	pub objects: Mutex<Vec<ObjectEvent>>,
	pub files: Mutex<Vec<FileEvent>>,
	pub presence: Mutex<Vec<PresenceEvent>>,
	pub decryption_errors: Mutex<Vec<DecryptionErrorEvent>>,
}

impl RecordingListener {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl ListenerSink for RecordingListener {
	async fn notify_status(&self, status: StatusNotification) {
		self.statuses.lock().await.push(status);
	}
	async fn notify_message(&self, event: MessageEvent) {
		self.messages.lock().await.push(event);
	}
	async fn notify_signal(&self, event: MessageEvent) {
		self.signals.lock().await.push(event);
	}
	async fn notify_message_action(&self, event: ActionEvent) {
		self.actions.lock().await.push(event);
	}
	async fn notify_object(&self, event: ObjectEvent) {
		self.objects.lock().await.push(event);
	}
	async fn notify_file(&self, event: FileEvent) {
		self.files.lock().await.push(event);
	}
	async fn notify_presence(&self, event: PresenceEvent) {
		self.presence.lock().await.push(event);
	}
	async fn notify_decryption_error(&self, event: DecryptionErrorEvent) {
		self.decryption_errors.lock().await.push(event);
	}
}
