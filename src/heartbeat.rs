use async_trait::async_trait;

/// The presence heartbeat/announcement scheduler (§6). The engine only
/// signals when it should start or stop; the actual heartbeat cadence and
/// wire format are this collaborator's responsibility and out of scope
/// here (§1).
#[async_trait]
pub trait HeartbeatManager: Send + Sync {
	/// Called after every successful subscribe reply, unless the presence
	/// list is manually managed.
	async fn start_if_required(&self);

	/// Called on a `Cancelled` outcome and on a generic disconnect.
	async fn stop_if_possible(&self);
}

/// A [`HeartbeatManager`] that does nothing; the default when an embedding
/// application has no presence heartbeat of its own.
#[derive(Debug, Default)]
pub struct NullHeartbeatManager;

#[async_trait]
impl HeartbeatManager for NullHeartbeatManager {
	async fn start_if_required(&self) {}
	async fn stop_if_possible(&self) {}
}
