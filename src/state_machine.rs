use crate::transport::Category;

/// The finite set of subscriber states (§3, §4.5).
///
/// `MalformedFilter` and `RequestTooLong` are not tracked as distinct
/// variants: per the specification's design notes, both are stored
/// internally as `UnexpectedlyDisconnected` and only differ in the
/// [`Category`] reported at the moment of transition. Since every row of
/// the transition table treats `MalformedFilter`/`RequestTooLong` exactly
/// like `UnexpectedlyDisconnected`, collapsing them loses no behaviour and
/// keeps the machine's own state space small.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubscriberState {
	#[default]
	Initialized,
	Connected,
	Disconnected,
	UnexpectedlyDisconnected,
	AccessDenied,
}

/// The state a transition is being requested towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
	Connected,
	Disconnected,
	UnexpectedlyDisconnected,
	AccessDenied,
	MalformedFilter,
	RequestTooLong,
}

/// The result of applying a [`Target`] to the current [`SubscriberState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
	pub next: SubscriberState,
	pub category: Category,
	/// Whether the listener sink should be notified of this transition.
	pub observable: bool,
	/// New value for the "a restore attempt may be needed" flag (§4.5).
	pub may_require_restore: bool,
}

/// Computes the table in §4.5.
///
/// Two cells are genuinely distinctive: `Disconnected -> Disconnected` is
/// suppressed (the specification marks it "ignore"), and any transition
/// into `Connected` from `UnexpectedlyDisconnected` is reported as
/// `Reconnected` rather than `Connected` (invariant I6). Every other cell
/// in the table reduces to "perform the transition and report its plain
/// category", which this function applies uniformly rather than as a
/// literal per-cell lookup.
pub fn transition(state: SubscriberState, target: Target) -> Transition {
	match target {
		Target::Connected => {
			let category = if state == SubscriberState::UnexpectedlyDisconnected {
				Category::Reconnected
			} else {
				Category::Connected
			};
			Transition {
				next: SubscriberState::Connected,
				category,
				observable: true,
				may_require_restore: true,
			}
		}
		Target::Disconnected => {
			if state == SubscriberState::Disconnected {
				Transition {
					next: SubscriberState::Disconnected,
					category: Category::Disconnected,
					observable: false,
					may_require_restore: false,
				}
			} else {
				Transition {
					next: SubscriberState::Disconnected,
					category: Category::Disconnected,
					observable: true,
					may_require_restore: true,
				}
			}
		}
		Target::UnexpectedlyDisconnected => Transition {
			next: SubscriberState::UnexpectedlyDisconnected,
			category: Category::UnexpectedDisconnect,
			observable: true,
			may_require_restore: true,
		},
		Target::AccessDenied => Transition {
			next: SubscriberState::AccessDenied,
			category: Category::AccessDenied,
			observable: true,
			may_require_restore: false,
		},
		Target::MalformedFilter => Transition {
			next: SubscriberState::UnexpectedlyDisconnected,
			category: Category::MalformedFilter,
			observable: true,
			may_require_restore: false,
		},
		Target::RequestTooLong => Transition {
			next: SubscriberState::UnexpectedlyDisconnected,
			category: Category::RequestTooLong,
			observable: true,
			may_require_restore: false,
		},
	}
}

/// §4.5 restore path: should a restore attempt (re-entering `subscribe`)
/// be made right now?
pub fn should_restore(state: SubscriberState, may_require_restore: bool) -> bool {
	match state {
		SubscriberState::AccessDenied => true,
		SubscriberState::UnexpectedlyDisconnected => may_require_restore,
		_ => false,
	}
}
