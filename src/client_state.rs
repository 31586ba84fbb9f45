use async_trait::async_trait;
use std::collections::HashMap;

/// The per-object custom state store (§6). The engine merges state into
/// outgoing subscribe requests and clears it on unsubscribe; it never
/// interprets the state payload itself.
#[async_trait]
pub trait ClientStateStore: Send + Sync {
	/// Merges `state` into the stored state for each of `objects`, returning
	/// the store's view of the merge.
	async fn merge(&self, state: &str, objects: &[String]) -> String;

	/// Returns the currently stored state already merged for `objects`,
	/// serialized as JSON, ready for the Request Builder.
	async fn state_merged_with(&self, state: &str, objects: &[String]) -> String;

	/// Directly sets the state for `objects`, used when a self-targeted
	/// `state-change` presence event arrives (§4.6 step 7).
	async fn set(&self, state: &str, objects: &[String]);

	/// Drops stored state for `objects`, called on unsubscribe.
	async fn remove(&self, objects: &[String]);
}

/// An in-memory [`ClientStateStore`] good enough for embedding applications
/// that don't need persistence across restarts.
#[derive(Debug, Default)]
pub struct InMemoryClientStateStore {
	inner: tokio::sync::Mutex<HashMap<String, String>>,
}

#[async_trait]
impl ClientStateStore for InMemoryClientStateStore {
	async fn merge(&self, state: &str, objects: &[String]) -> String {
		let mut guard = self.inner.lock().await;
		for object in objects {
			guard.insert(object.clone(), state.to_owned());
		}
		state.to_owned()
	}

	async fn state_merged_with(&self, _state: &str, objects: &[String]) -> String {
		let guard = self.inner.lock().await;
		let merged: HashMap<&str, &str> = objects
			.iter()
			.filter_map(|object| guard.get(object).map(|v| (object.as_str(), v.as_str())))
			.collect();
		serde_json::to_string(&merged).unwrap_or_else(|err| {
			tracing::warn!(%err, "dropping unserializable merged state from request");
			String::new()
		})
	}

	async fn set(&self, state: &str, objects: &[String]) {
		let mut guard = self.inner.lock().await;
		for object in objects {
			guard.insert(object.clone(), state.to_owned());
		}
	}

	async fn remove(&self, objects: &[String]) {
		let mut guard = self.inner.lock().await;
		for object in objects {
			guard.remove(object);
		}
	}
}
