use core::{borrow, ops};

/// A channel, channel-group, or presence-channel name.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Channel(str);

/// An owned [`Channel`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelBuf(String);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvalidChannel {
	#[error("channel name is empty")]
	Empty,
	#[error("channel name contains a comma at byte {0}, which is the list separator")]
	ContainsComma(usize),
}

/// Suffix that routes a channel name into the presence set rather than the
/// data set (see [`crate::SubscriptionSet::add_channels`]).
pub const PRESENCE_SUFFIX: &str = "-pnpres";

impl Channel {
	#[inline]
	pub fn new<S: AsRef<str> + ?Sized>(name: &S) -> Result<&Channel, InvalidChannel> {
		let name = name.as_ref();

		if name.is_empty() {
			return Err(InvalidChannel::Empty);
		}

		if let Some(position) = name.find(',') {
			return Err(InvalidChannel::ContainsComma(position));
		}

		Ok(unsafe { &*(name as *const str as *const Channel) })
	}

	#[inline]
	pub fn as_str(&self) -> &str {
		let Self(inner) = self;
		inner
	}

	/// Returns `true` if this name carries the presence suffix.
	#[inline]
	pub fn is_presence(&self) -> bool {
		self.as_str().ends_with(PRESENCE_SUFFIX)
	}

	/// Strips the presence suffix, if present.
	#[inline]
	pub fn base_name(&self) -> &str {
		self.as_str()
			.strip_suffix(PRESENCE_SUFFIX)
			.unwrap_or(self.as_str())
	}

	fn from_str(s: &str) -> &Self {
		unsafe { &*(s as *const str as *const Channel) }
	}
}

impl ChannelBuf {
	pub fn new(name: impl Into<String>) -> Result<Self, InvalidChannel> {
		let name = name.into();
		Channel::new(&name)?;
		Ok(Self(name))
	}
}

impl AsRef<str> for Channel {
	#[inline]
	fn as_ref(&self) -> &str {
		self.as_str()
	}
}

impl ToOwned for Channel {
	type Owned = ChannelBuf;
	#[inline]
	fn to_owned(&self) -> Self::Owned {
		ChannelBuf(self.as_str().to_owned())
	}
}

impl ops::Deref for ChannelBuf {
	type Target = Channel;
	#[inline]
	fn deref(&self) -> &Self::Target {
		let Self(inner) = self;
		Channel::from_str(inner)
	}
}

impl borrow::Borrow<Channel> for ChannelBuf {
	#[inline]
	fn borrow(&self) -> &Channel {
		use ops::Deref;
		self.deref()
	}
}

impl From<&Channel> for ChannelBuf {
	#[inline]
	fn from(value: &Channel) -> Self {
		let Channel(inner) = value;
		Self(String::from(inner))
	}
}

impl TryFrom<&str> for ChannelBuf {
	type Error = InvalidChannel;
	#[inline]
	fn try_from(value: &str) -> Result<Self, Self::Error> {
		ChannelBuf::new(value)
	}
}

impl TryFrom<String> for ChannelBuf {
	type Error = InvalidChannel;
	#[inline]
	fn try_from(value: String) -> Result<Self, Self::Error> {
		ChannelBuf::new(value)
	}
}

impl core::fmt::Display for ChannelBuf {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.write_str(&self.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_empty() {
		assert_eq!(Channel::new("").unwrap_err(), InvalidChannel::Empty);
	}

	#[test]
	fn rejects_comma() {
		assert_eq!(
			Channel::new("a,b").unwrap_err(),
			InvalidChannel::ContainsComma(1)
		);
	}

	#[test]
	fn detects_presence_suffix() {
		let ch = ChannelBuf::new("room-1-pnpres").unwrap();
		assert!(ch.is_presence());
		assert_eq!(ch.base_name(), "room-1");
	}

	#[test]
	fn non_presence_roundtrips() {
		let ch = ChannelBuf::new("room-1").unwrap();
		assert!(!ch.is_presence());
		assert_eq!(ch.base_name(), "room-1");
	}
}
