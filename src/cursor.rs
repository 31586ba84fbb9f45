/// Continuation cursor for the subscribe loop.
///
/// `current == 0` iff the next issued request is an initial registration
/// (wire parameter `tt=0`). `region == -1` means "unset".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
	current: u64,
	current_region: i32,
	last: u64,
	last_region: i32,
	r#override: Option<u64>,
}

/// A `(timetoken, region)` snapshot, as seen by the Request Builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorSnapshot {
	pub current: u64,
	pub current_region: i32,
	pub last: u64,
	pub last_region: i32,
}

impl Cursor {
	pub fn new() -> Self {
		Self {
			current: 0,
			current_region: -1,
			last: 0,
			last_region: -1,
			r#override: None,
		}
	}

	/// Is the next request an initial registration?
	#[inline]
	pub fn is_initial(&self) -> bool {
		self.current == 0
	}

	pub fn snapshot(&self) -> CursorSnapshot {
		CursorSnapshot {
			current: self.current,
			current_region: self.current_region,
			last: self.last,
			last_region: self.last_region,
		}
	}

	/// Records an override token to be used for the next initial
	/// registration, superseding whatever `begin_initial` would otherwise
	/// choose.
	pub fn set_override(&mut self, token: Option<u64>) {
		self.r#override = token.filter(|t| *t != 0);
	}

	pub fn pending_override(&self) -> Option<u64> {
		self.r#override
	}

	/// §4.1: begin an initial registration. If `current != 0` it is moved
	/// into `last` rather than discarded.
	pub fn begin_initial(&mut self) {
		if self.current != 0 {
			self.last = self.current;
			self.last_region = self.current_region;
		}
		self.current = 0;
		self.current_region = -1;
	}

	/// §4.2 cursor advancement on a successful response.
	///
	/// `keep_on_list_change_or_restore` folds together the two
	/// configuration-dependent conditions from the specification (the
	/// "keep time token on list change" flag, and "catch up on restore"
	/// while `restoring_after_network_issues` is set) since both resolve to
	/// the same rule: reuse `last` as `current` when available. The pending
	/// override, if any, is consumed here regardless of outcome — it is a
	/// one-shot signal for the next initial registration only — but it only
	/// supersedes the reuse-last/accept-T choice within that same
	/// conditional branch; a plain initial response with no active flag
	/// always adopts the response's own timetoken (S5).
	pub fn accept(
		&mut self,
		timetoken: u64,
		region: i32,
		is_initial: bool,
		keep_on_list_change_or_restore: bool,
	) {
		if !is_initial && self.current == 0 {
			// Stale reply after a reset; ignore for cursor purposes.
			return;
		}

		let override_token = self.r#override.take();

		if is_initial && keep_on_list_change_or_restore {
			if let Some(override_token) = override_token {
				self.last = self.current;
				self.last_region = self.current_region;
				self.current = override_token;
				self.current_region = region;
				return;
			}

			if self.last != 0 {
				self.current = self.last;
				self.current_region = self.last_region;
				self.last = 0;
				self.last_region = -1;
				return;
			}
		}

		self.last = self.current;
		self.last_region = self.current_region;
		self.current = timetoken;
		self.current_region = region;
	}

	/// Resets every field to its sentinel value and clears any pending
	/// override.
	pub fn reset(&mut self) {
		*self = Self::new();
	}
}
