use crate::{cursor::CursorSnapshot, subscription_set::SubscriptionSet};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::HashMap;

/// Escape set used for the `state` and `filter-expr` query values, matching
/// the ecosystem convention of reserving every byte outside `[A-Za-z0-9]`.
const COMPONENT: &AsciiSet = NON_ALPHANUMERIC;

/// Assembles the wire parameter bag for a subscribe request (§4.7).
#[derive(Debug, Default)]
pub struct RequestBuilder {
	pub heartbeat_seconds: u32,
	pub filter_expression: Option<String>,
	pub manage_presence_list_manually: bool,
}

impl RequestBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds the parameter bag. `state_json` is the pre-merged, serialized
	/// per-channel custom state (already the responsibility of the
	/// client-state store); `extra_query_params` is merged in last and may
	/// only add keys, never override the builder's own.
	pub fn build(
		&self,
		subscriptions: &SubscriptionSet,
		cursor: &CursorSnapshot,
		state_json: Option<&str>,
		extra_query_params: &HashMap<String, String>,
	) -> (String, HashMap<String, String>) {
		let channels: Vec<&str> = subscriptions
			.data()
			.chain(subscriptions.presence())
			.map(|c| c.as_str())
			.collect();

		let path = if channels.is_empty() {
			",".to_owned()
		} else {
			channels.join(",")
		};

		let mut params = HashMap::new();
		params.insert("tt".to_owned(), cursor.current.to_string());

		if cursor.current_region > -1 {
			params.insert("tr".to_owned(), cursor.current_region.to_string());
		}

		let groups: Vec<&str> = subscriptions.groups().map(|c| c.as_str()).collect();
		if !groups.is_empty() {
			params.insert("channel-group".to_owned(), groups.join(","));
		}

		if self.heartbeat_seconds > 0 {
			params.insert("heartbeat".to_owned(), self.heartbeat_seconds.to_string());
		}

		if let Some(state) = state_json.filter(|s| !s.is_empty() && *s != "{}") {
			let escaped = utf8_percent_encode(state, COMPONENT).to_string();
			params.insert("state".to_owned(), escaped);
		}

		if let Some(filter) = self.filter_expression.as_deref().filter(|f| !f.is_empty()) {
			let escaped = utf8_percent_encode(filter, COMPONENT).to_string();
			params.insert("filter-expr".to_owned(), escaped);
		}

		for (key, value) in extra_query_params {
			params.entry(key.clone()).or_insert_with(|| value.clone());
		}

		(path, params)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::channel::ChannelBuf;

	fn ch(s: &str) -> ChannelBuf {
		ChannelBuf::new(s).unwrap()
	}

	#[test]
	fn empty_set_uses_comma_sentinel_path() {
		let builder = RequestBuilder::new();
		let set = SubscriptionSet::new();
		let cursor = CursorSnapshot {
			current: 0,
			current_region: -1,
			last: 0,
			last_region: -1,
		};
		let (path, params) = builder.build(&set, &cursor, None, &HashMap::new());
		assert_eq!(path, ",");
		assert_eq!(params.get("tt").unwrap(), "0");
		assert!(!params.contains_key("tr"));
	}

	#[test]
	fn region_included_only_when_set() {
		let builder = RequestBuilder::new();
		let mut set = SubscriptionSet::new();
		set.add_channels([ch("a")]);
		let cursor = CursorSnapshot {
			current: 15,
			current_region: 2,
			last: 0,
			last_region: -1,
		};
		let (_, params) = builder.build(&set, &cursor, None, &HashMap::new());
		assert_eq!(params.get("tr").unwrap(), "2");
	}

	#[test]
	fn groups_are_comma_joined() {
		let builder = RequestBuilder::new();
		let mut set = SubscriptionSet::new();
		set.add_groups([ch("g1"), ch("g2")]);
		let cursor = CursorSnapshot {
			current: 0,
			current_region: -1,
			last: 0,
			last_region: -1,
		};
		let (_, params) = builder.build(&set, &cursor, None, &HashMap::new());
		let group_param = params.get("channel-group").unwrap();
		assert!(group_param.contains("g1") && group_param.contains("g2"));
	}

	#[test]
	fn extra_params_never_override_builder_keys() {
		let builder = RequestBuilder::new();
		let set = SubscriptionSet::new();
		let cursor = CursorSnapshot {
			current: 15,
			current_region: -1,
			last: 0,
			last_region: -1,
		};
		let mut extra = HashMap::new();
		extra.insert("tt".to_owned(), "999".to_owned());
		let (_, params) = builder.build(&set, &cursor, None, &extra);
		assert_eq!(params.get("tt").unwrap(), "15");
	}

	#[test]
	fn state_is_percent_escaped() {
		let builder = RequestBuilder::new();
		let mut set = SubscriptionSet::new();
		set.add_channels([ch("a")]);
		let cursor = CursorSnapshot {
			current: 0,
			current_region: -1,
			last: 0,
			last_region: -1,
		};
		let (_, params) = builder.build(&set, &cursor, Some(r#"{"a":1}"#), &HashMap::new());
		let state = params.get("state").unwrap();
		assert!(!state.contains('{'));
	}
}
