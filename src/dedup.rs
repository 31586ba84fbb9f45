use std::collections::{HashMap, VecDeque};

/// Bounded cache of recently-delivered regular messages, keyed by
/// `(timetoken, channel)` (§4.4, §9 Open Question: the wire identifier
/// `"<tt>_<channel>"` is reconstructed only for display, never used as the
/// map key, to avoid ambiguity with channel names containing underscores).
#[derive(Debug, Default)]
pub struct DedupCache {
	entries: HashMap<(u64, String), Vec<String>>,
	order: VecDeque<(u64, String)>,
}

impl DedupCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Attempts to insert `payload` under `(timetoken, channel)`. Returns
	/// `true` if the payload was novel (and thus inserted), `false` if it is
	/// a duplicate of something already cached under the same key.
	pub fn try_insert(&mut self, timetoken: u64, channel: &str, payload: &str) -> bool {
		let key = (timetoken, channel.to_owned());

		if let Some(existing) = self.entries.get(&key) {
			if existing.iter().any(|p| p == payload) {
				return false;
			}
		}

		let is_new_key = !self.entries.contains_key(&key);
		self.entries
			.entry(key.clone())
			.or_default()
			.push(payload.to_owned());

		if is_new_key {
			self.order.push_back(key);
		}

		true
	}

	/// Evicts the oldest identifiers until at most `capacity` remain.
	///
	/// `capacity == 0` disables the cache entirely, per §4.4.
	pub fn evict_to(&mut self, capacity: usize) {
		while self.order.len() > capacity {
			let Some(oldest) = self.order.pop_front() else {
				break;
			};
			if let Some(payloads) = self.entries.get_mut(&oldest) {
				if !payloads.is_empty() {
					payloads.remove(0);
				}
				if payloads.is_empty() {
					self.entries.remove(&oldest);
				}
			}
		}
	}

	/// Removes every identifier whose timetoken is `>= token`, used when an
	/// override time token supersedes previously-cached entries (§4.6 step
	/// 1).
	pub fn purge_newer_than(&mut self, token: u64) {
		self.order.retain(|(tt, channel)| {
			let keep = *tt < token;
			if !keep {
				self.entries.remove(&(*tt, channel.clone()));
			}
			keep
		});
	}

	pub fn len(&self) -> usize {
		self.order.len()
	}

	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn novel_insert_returns_true() {
		let mut cache = DedupCache::new();
		assert!(cache.try_insert(10, "a", "hello"));
	}

	#[test]
	fn duplicate_insert_returns_false() {
		let mut cache = DedupCache::new();
		assert!(cache.try_insert(10, "a", "hello"));
		assert!(!cache.try_insert(10, "a", "hello"));
	}

	#[test]
	fn different_channel_same_token_is_distinct() {
		let mut cache = DedupCache::new();
		assert!(cache.try_insert(10, "a", "hello"));
		assert!(cache.try_insert(10, "b", "hello"));
	}

	#[test]
	fn eviction_respects_capacity() {
		let mut cache = DedupCache::new();
		for tt in 0..5 {
			cache.try_insert(tt, "a", "m");
			cache.evict_to(3);
		}
		assert_eq!(cache.len(), 3);
	}

	#[test]
	fn capacity_zero_keeps_cache_empty() {
		let mut cache = DedupCache::new();
		cache.try_insert(1, "a", "m");
		cache.evict_to(0);
		assert!(cache.is_empty());
	}

	#[test]
	fn purge_newer_than_is_idempotent() {
		let mut cache = DedupCache::new();
		cache.try_insert(50, "a", "m1");
		cache.try_insert(80, "a", "m2");
		cache.purge_newer_than(60);
		assert_eq!(cache.len(), 1);
		cache.purge_newer_than(60);
		assert_eq!(cache.len(), 1);
	}
}
