use crate::channel::InvalidChannel;
use thiserror::Error;

/// Errors returned by the synchronous, fallible parts of the public API.
///
/// The subscribe loop itself never returns a `Result` to its caller; it
/// communicates exclusively through [`crate::transport::Status`] categories
/// delivered to the listener sink.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("invalid channel name: {0}")]
	InvalidChannel(#[from] InvalidChannel),

	#[error("engine has been shut down")]
	EngineClosed,

	#[error("config is missing a required field: {0}")]
	IncompleteConfig(&'static str),
}

pub type Result<T> = std::result::Result<T, EngineError>;
