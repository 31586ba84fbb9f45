#![allow(clippy::tabs_in_doc_comments)]
//! # submux
//!
//! A client-side long-poll subscribe engine: the state machine, loop
//! scheduler, de-dup cache, and retry timer that keep a pub/sub client
//! current with its subscribed channels, channel groups, and presence
//! channels.
//!
//! The transport, heartbeat scheduler, client-state store, and listener
//! sink are external collaborators the embedding application supplies
//! through the [`Transport`], [`HeartbeatManager`], [`ClientStateStore`],
//! and [`ListenerSink`] traits.

mod channel;
mod client_state;
mod config;
mod cursor;
mod dedup;
mod engine;
mod error;
mod events;
mod heartbeat;
mod listener;
mod request;
mod retry_timer;
mod state_machine;
mod subscription_set;
mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use self::{
	channel::{Channel, ChannelBuf, InvalidChannel},
	client_state::{ClientStateStore, InMemoryClientStateStore},
	config::{Config, ConfigBuilder},
	engine::{Engine, SubscribeOptions, UnsubscribeOptions},
	error::{EngineError, Result},
	events::{
		ActionEvent, DecryptionErrorEvent, Dispatch, Event, FileEvent, MessageEvent, ObjectEvent,
		PresenceEvent,
	},
	heartbeat::{HeartbeatManager, NullHeartbeatManager},
	listener::{ListenerSink, StatusNotification},
	state_machine::SubscriberState,
	transport::{Category, MessageType, Operation, RawEvent, ServiceData, Status, Transport},
};
