use crate::transport::{MessageType, RawEvent};
use serde::{Deserialize, Serialize};

/// A typed event handed to the listener sink (§3, §4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
	Message(MessageEvent),
	Signal(MessageEvent),
	MessageAction(ActionEvent),
	Object(ObjectEvent),
	File(FileEvent),
	Presence(PresenceEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEvent {
	pub channel: String,
	pub subscription: Option<String>,
	pub timetoken: u64,
	pub publisher: Option<String>,
	pub payload: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionEvent {
	pub channel: String,
	pub timetoken: u64,
	pub payload: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectEvent {
	pub channel: String,
	pub timetoken: u64,
	pub payload: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEvent {
	pub channel: String,
	pub timetoken: u64,
	pub publisher: Option<String>,
	pub payload: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceEvent {
	pub channel: String,
	pub timetoken: u64,
	pub payload: String,
	/// `true` when this is a `state-change` presence event; combined with a
	/// matching UUID this feeds the client-state-store self-update rule of
	/// §4.6 step 7.
	pub is_state_change: bool,
	pub uuid: Option<String>,
}

/// Raised in place of a `Message`/`File` event when decryption failed
/// (§4.6 step 6). Carries just enough to let the listener react; the
/// `decryptError` and `envelope` fields of the original event are stripped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptionErrorEvent {
	pub channel: String,
	pub timetoken: u64,
}

/// Either a fully classified event, or a decryption-error demotion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Dispatch {
	Event(Event),
	DecryptionError(DecryptionErrorEvent),
}

/// Classifies a de-duplicated [`RawEvent`] into its listener-facing shape
/// (§4.6 step 5-6). Presence events never carry a `decryptError` flag in
/// practice, but the check is applied uniformly to every variant that can
/// carry a payload, matching the specification's wording precisely.
pub fn classify(raw: RawEvent) -> Dispatch {
	if raw.presence_event {
		let is_state_change = raw.payload.contains("\"action\":\"state-change\"");
		return Dispatch::Event(Event::Presence(PresenceEvent {
			channel: raw.channel,
			timetoken: raw.timetoken,
			payload: raw.payload,
			is_state_change,
			uuid: raw.publisher,
		}));
	}

	if raw.decrypt_error && matches!(raw.message_type, MessageType::Regular | MessageType::File) {
		return Dispatch::DecryptionError(DecryptionErrorEvent {
			channel: raw.channel,
			timetoken: raw.timetoken,
		});
	}

	let event = match raw.message_type {
		MessageType::Regular => Event::Message(MessageEvent {
			channel: raw.channel,
			subscription: raw.subscription,
			timetoken: raw.timetoken,
			publisher: raw.publisher,
			payload: raw.payload,
		}),
		MessageType::Signal => Event::Signal(MessageEvent {
			channel: raw.channel,
			subscription: raw.subscription,
			timetoken: raw.timetoken,
			publisher: raw.publisher,
			payload: raw.payload,
		}),
		MessageType::MessageAction => Event::MessageAction(ActionEvent {
			channel: raw.channel,
			timetoken: raw.timetoken,
			payload: raw.payload,
		}),
		MessageType::Object => Event::Object(ObjectEvent {
			channel: raw.channel,
			timetoken: raw.timetoken,
			payload: raw.payload,
		}),
		MessageType::File => Event::File(FileEvent {
			channel: raw.channel,
			timetoken: raw.timetoken,
			publisher: raw.publisher,
			payload: raw.payload,
		}),
	};

	Dispatch::Event(event)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn raw(message_type: MessageType, decrypt_error: bool, presence: bool) -> RawEvent {
		RawEvent {
			message_type,
			presence_event: presence,
			channel: "a".into(),
			subscription: None,
			timetoken: 1,
			publisher: None,
			payload: "{}".into(),
			decrypt_error,
		}
	}

	#[test]
	fn regular_message_classifies_as_message() {
		match classify(raw(MessageType::Regular, false, false)) {
			Dispatch::Event(Event::Message(_)) => {}
			other => panic!("unexpected: {other:?}"),
		}
	}

	#[test]
	fn decrypt_error_demotes_message() {
		match classify(raw(MessageType::Regular, true, false)) {
			Dispatch::DecryptionError(_) => {}
			other => panic!("unexpected: {other:?}"),
		}
	}

	#[test]
	fn presence_event_never_demoted_by_decrypt_flag() {
		match classify(raw(MessageType::Regular, true, true)) {
			Dispatch::Event(Event::Presence(_)) => {}
			other => panic!("unexpected: {other:?}"),
		}
	}

	#[test]
	fn signal_classifies_as_signal() {
		match classify(raw(MessageType::Signal, false, false)) {
			Dispatch::Event(Event::Signal(_)) => {}
			other => panic!("unexpected: {other:?}"),
		}
	}
}
