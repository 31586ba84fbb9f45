use crate::channel::ChannelBuf;
use std::collections::HashSet;

/// The three disjoint-by-role containers of subscribed objects (§4.3).
///
/// §4.3 only requires "ordered-irrelevant unique-valued containers", so
/// these are plain hash sets rather than anything that needs `Ord`.
///
/// A channel name may legitimately appear in both `data` and `presence` at
/// once; that models a caller subscribed to both the channel's messages and
/// its presence feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionSet {
	data: HashSet<ChannelBuf>,
	presence: HashSet<ChannelBuf>,
	groups: HashSet<ChannelBuf>,
}

impl SubscriptionSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Presence-suffixed entries are routed to the presence set; everything
	/// else goes into the data set.
	pub fn add_channels(&mut self, channels: impl IntoIterator<Item = ChannelBuf>) {
		for channel in channels {
			if channel.is_presence() {
				self.presence.insert(channel);
			} else {
				self.data.insert(channel);
			}
		}
	}

	/// Removes from both the data and presence sets.
	pub fn remove_channels<'a>(&mut self, channels: impl IntoIterator<Item = &'a ChannelBuf>) {
		for channel in channels {
			self.data.remove(channel);
			self.presence.remove(channel);
		}
	}

	pub fn add_groups(&mut self, groups: impl IntoIterator<Item = ChannelBuf>) {
		self.groups.extend(groups);
	}

	pub fn remove_groups<'a>(&mut self, groups: impl IntoIterator<Item = &'a ChannelBuf>) {
		for group in groups {
			self.groups.remove(group);
		}
	}

	pub fn add_presence(&mut self, channels: impl IntoIterator<Item = ChannelBuf>) {
		self.presence.extend(channels);
	}

	pub fn remove_presence<'a>(&mut self, channels: impl IntoIterator<Item = &'a ChannelBuf>) {
		for channel in channels {
			self.presence.remove(channel);
		}
	}

	pub fn data(&self) -> impl Iterator<Item = &ChannelBuf> {
		self.data.iter()
	}

	pub fn presence(&self) -> impl Iterator<Item = &ChannelBuf> {
		self.presence.iter()
	}

	pub fn groups(&self) -> impl Iterator<Item = &ChannelBuf> {
		self.groups.iter()
	}

	/// Ordered-irrelevant concatenation of every tracked object, used for
	/// the empty check and for request building.
	pub fn all(&self) -> impl Iterator<Item = &ChannelBuf> {
		self.data.iter().chain(self.presence.iter()).chain(self.groups.iter())
	}

	pub fn is_empty(&self) -> bool {
		self.data.is_empty() && self.presence.is_empty() && self.groups.is_empty()
	}

	pub fn clear(&mut self) {
		self.data.clear();
		self.presence.clear();
		self.groups.clear();
	}
}
