use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The two operations the subscribe engine issues against the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
	Subscribe,
	Unsubscribe,
}

/// User-visible outcome categories (§6), delivered to listeners and used by
/// the state machine to choose the next transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
	Connected,
	Reconnected,
	Disconnected,
	UnexpectedDisconnect,
	AccessDenied,
	MalformedFilter,
	RequestTooLong,
	Cancelled,
	Timeout,
	MalformedResponse,
	TlsConnectionFailed,
	DecryptionError,
	RequestMessageCountExceeded,
	Acknowledgment,
}

impl Category {
	/// Transient categories are retried automatically on the 1 Hz retry
	/// timer (§7). `MalformedFilter` and `RequestTooLong` are policy errors:
	/// they are retryable in the sense that the gate can clear, but they do
	/// not arm the timer on their own — the caller must change
	/// configuration.
	pub fn is_transient(self) -> bool {
		matches!(
			self,
			Category::Timeout | Category::MalformedResponse | Category::TlsConnectionFailed
		)
	}

	pub fn is_policy_error(self) -> bool {
		matches!(self, Category::MalformedFilter | Category::RequestTooLong)
	}

	pub fn is_error(self) -> bool {
		!matches!(
			self,
			Category::Connected
				| Category::Reconnected
				| Category::Disconnected
				| Category::Acknowledgment
				| Category::RequestMessageCountExceeded
		)
	}
}

/// A single event within a subscribe response's `events` array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
	pub message_type: MessageType,
	pub presence_event: bool,
	pub channel: String,
	pub subscription: Option<String>,
	pub timetoken: u64,
	pub publisher: Option<String>,
	pub payload: String,
	pub decrypt_error: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
	Regular,
	Signal,
	MessageAction,
	Object,
	File,
}

/// Data carried by a subscribe response; absent on non-subscribe operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceData {
	pub timetoken: u64,
	pub region: i32,
	pub events: Vec<RawEvent>,
}

/// The outcome of a single transport call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
	pub operation: Operation,
	pub category: Category,
	pub is_initial: bool,
	pub client_request_url: Option<String>,
	pub service_data: Option<ServiceData>,
}

impl Status {
	pub fn is_error(&self) -> bool {
		self.category.is_error()
	}
}

/// Abstracts the HTTP long-poll transport (§6). Transport implementations
/// are responsible for issuing the request, applying timeouts, and
/// reporting the outcome as a [`Status`]; they are not responsible for
/// interpreting it.
#[async_trait]
pub trait Transport: Send + Sync {
	/// `channels` is the §4.7 path placeholder: the comma-joined data ∪
	/// presence channel names (or leave-set, for `Unsubscribe`), already
	/// including the `","` empty sentinel when there are none.
	async fn process(&self, operation: Operation, channels: String, params: HashMap<String, String>) -> Status;

	/// Aborts the currently in-flight request, if any. Implementations that
	/// cannot cancel in-flight I/O may make this a no-op; the engine's
	/// epoch counter (§5) guards against acting on a superseded completion
	/// either way.
	fn cancel(&self) {}
}
