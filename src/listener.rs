use crate::{
	events::{ActionEvent, DecryptionErrorEvent, FileEvent, MessageEvent, ObjectEvent, PresenceEvent},
	transport::Category,
};
use async_trait::async_trait;

/// Status delivered to [`ListenerSink::notify_status`].
#[derive(Debug, Clone)]
pub struct StatusNotification {
	pub category: Category,
}

/// The external collaborator that receives every event and status the
/// engine produces (§6). All dispatches for a single response happen inside
/// one "notify block" so the transport thread never interleaves two
/// responses' deliveries; the engine itself enforces this by awaiting each
/// `notify_*` call in order rather than spawning them concurrently.
#[async_trait]
pub trait ListenerSink: Send + Sync {
	async fn notify_status(&self, status: StatusNotification);
	async fn notify_message(&self, event: MessageEvent);
	async fn notify_signal(&self, event: MessageEvent);
	async fn notify_message_action(&self, event: ActionEvent);
	async fn notify_object(&self, event: ObjectEvent);
	async fn notify_file(&self, event: FileEvent);
	async fn notify_presence(&self, event: PresenceEvent);
	async fn notify_decryption_error(&self, event: DecryptionErrorEvent);
}
