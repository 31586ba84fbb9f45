use crate::error::EngineError;

/// Configuration flags consumed by the engine (§6). Construct with
/// [`ConfigBuilder`]; `uuid` is the only field without a sensible default.
#[derive(Debug, Clone)]
pub struct Config {
	pub uuid: String,
	pub keep_time_token_on_list_change: bool,
	pub catch_up_on_subscription_restore: bool,
	pub suppress_leave_events: bool,
	pub manage_presence_list_manually: bool,
	pub maximum_messages_cache_size: usize,
	pub request_message_count_threshold: usize,
	pub presence_heartbeat_seconds: u32,
}

impl Config {
	pub fn builder(uuid: impl Into<String>) -> ConfigBuilder {
		ConfigBuilder::new(uuid)
	}
}

/// Builder for [`Config`], mirroring the `Options`/`From<(host, port)>`
/// construction idiom used elsewhere in this crate's ancestry.
#[derive(Debug)]
pub struct ConfigBuilder {
	uuid: Option<String>,
	keep_time_token_on_list_change: bool,
	catch_up_on_subscription_restore: bool,
	suppress_leave_events: bool,
	manage_presence_list_manually: bool,
	maximum_messages_cache_size: usize,
	request_message_count_threshold: usize,
	presence_heartbeat_seconds: u32,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self {
			uuid: None,
			keep_time_token_on_list_change: false,
			catch_up_on_subscription_restore: false,
			suppress_leave_events: false,
			manage_presence_list_manually: false,
			maximum_messages_cache_size: 100,
			request_message_count_threshold: 0,
			presence_heartbeat_seconds: 0,
		}
	}
}

impl ConfigBuilder {
	pub fn new(uuid: impl Into<String>) -> Self {
		Self {
			uuid: Some(uuid.into()),
			..Default::default()
		}
	}

	pub fn keep_time_token_on_list_change(mut self, value: bool) -> Self {
		self.keep_time_token_on_list_change = value;
		self
	}

	pub fn catch_up_on_subscription_restore(mut self, value: bool) -> Self {
		self.catch_up_on_subscription_restore = value;
		self
	}

	pub fn suppress_leave_events(mut self, value: bool) -> Self {
		self.suppress_leave_events = value;
		self
	}

	pub fn manage_presence_list_manually(mut self, value: bool) -> Self {
		self.manage_presence_list_manually = value;
		self
	}

	pub fn maximum_messages_cache_size(mut self, value: usize) -> Self {
		self.maximum_messages_cache_size = value;
		self
	}

	pub fn request_message_count_threshold(mut self, value: usize) -> Self {
		self.request_message_count_threshold = value;
		self
	}

	pub fn presence_heartbeat_seconds(mut self, value: u32) -> Self {
		self.presence_heartbeat_seconds = value;
		self
	}

	pub fn build(self) -> Result<Config, EngineError> {
		let uuid = self.uuid.ok_or(EngineError::IncompleteConfig("uuid"))?;

		Ok(Config {
			uuid,
			keep_time_token_on_list_change: self.keep_time_token_on_list_change,
			catch_up_on_subscription_restore: self.catch_up_on_subscription_restore,
			suppress_leave_events: self.suppress_leave_events,
			manage_presence_list_manually: self.manage_presence_list_manually,
			maximum_messages_cache_size: self.maximum_messages_cache_size,
			request_message_count_threshold: self.request_message_count_threshold,
			presence_heartbeat_seconds: self.presence_heartbeat_seconds,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn build_requires_uuid() {
		let err = ConfigBuilder::default().build().unwrap_err();
		assert!(matches!(err, EngineError::IncompleteConfig("uuid")));
	}

	#[test]
	fn defaults_match_specification() {
		let config = Config::builder("my-uuid").build().unwrap();
		assert_eq!(config.maximum_messages_cache_size, 100);
		assert_eq!(config.request_message_count_threshold, 0);
		assert!(!config.keep_time_token_on_list_change);
	}

	#[test]
	fn builder_setters_are_chainable() {
		let config = Config::builder("my-uuid")
			.keep_time_token_on_list_change(true)
			.maximum_messages_cache_size(5)
			.build()
			.unwrap();
		assert!(config.keep_time_token_on_list_change);
		assert_eq!(config.maximum_messages_cache_size, 5);
	}
}
