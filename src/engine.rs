use crate::{
	channel::ChannelBuf,
	client_state::ClientStateStore,
	config::Config,
	cursor::Cursor,
	dedup::DedupCache,
	events::{classify, Dispatch, Event},
	heartbeat::HeartbeatManager,
	listener::{ListenerSink, StatusNotification},
	request::RequestBuilder,
	retry_timer::RetryTimer,
	state_machine::{self, SubscriberState, Target},
	subscription_set::SubscriptionSet,
	transport::{Category, MessageType, Operation, Status, Transport},
};
use std::{
	collections::HashMap,
	sync::{Arc, Weak},
};
use tokio::sync::{oneshot, RwLock};

/// Optional extras for [`Engine::subscribe_with`], beyond the `initial`/
/// `token` pair every call needs (§4.2 point 1).
#[derive(Default)]
pub struct SubscribeOptions {
	/// Caller-supplied state to merge into the client-state store before
	/// this request is built (§6 `ClientStateStore::merge`).
	pub state: Option<String>,
	/// Extra query parameters merged in last by the Request Builder; they
	/// may add keys but never override the builder's own (§4.7).
	pub query_params: HashMap<String, String>,
	/// §4.2 point 4: when this is a non-initial call, fires immediately
	/// with a synthetic `Connected` category as a "has begun" signal,
	/// before the long-poll is issued. The long-poll's actual outcome
	/// still flows to listeners through the state machine.
	pub on_started: Option<oneshot::Sender<Category>>,
}

/// Optional extras for [`Engine::unsubscribe_with`], beyond the channel/
/// group lists, `inform_listener`, and `subscribe_on_rest` every call needs.
#[derive(Default)]
pub struct UnsubscribeOptions {
	/// Extra query parameters merged into the leave request.
	pub query_params: HashMap<String, String>,
	/// Fires once with the outcome category: the leave response's category
	/// when a leave request was issued, or [`Category::Acknowledgment`]
	/// when there was nothing to leave.
	pub cb: Option<oneshot::Sender<Category>>,
}

/// All mutable state guarded by the engine's single reader-writer lock
/// (§5). Compound read-then-write sequences are expressed as a single
/// critical section over this struct rather than several independently
/// locked fields.
struct Inner {
	subscriptions: SubscriptionSet,
	cursor: Cursor,
	cache: DedupCache,
	state: SubscriberState,
	may_require_restore: bool,
	restoring_after_network_issues: bool,
	/// Monotonically increasing counter; a completion whose epoch no longer
	/// matches is treated as `Cancelled` even if the transport itself could
	/// not abort the in-flight I/O (§5).
	epoch: u64,
	retry_timer: RetryTimer,
	request_builder: RequestBuilder,
}

impl Inner {
	fn new(config: &Config) -> Self {
		Self {
			subscriptions: SubscriptionSet::new(),
			cursor: Cursor::new(),
			cache: DedupCache::new(),
			state: SubscriberState::Initialized,
			may_require_restore: false,
			restoring_after_network_issues: false,
			epoch: 0,
			retry_timer: RetryTimer::new(),
			request_builder: RequestBuilder {
				heartbeat_seconds: config.presence_heartbeat_seconds,
				filter_expression: None,
				manage_presence_list_manually: config.manage_presence_list_manually,
			},
		}
	}
}

/// The subscribe loop scheduler (§4.2). Owns the subscription set, cursor,
/// de-dup cache, state machine, and retry timer behind one `RwLock`, and
/// drives a never-ending sequence of long-poll requests against `T` while
/// the subscription set is non-empty.
pub struct Engine<T> {
	transport: T,
	/// §3 Lifecycle / §9 design notes: "observer, not owner" — the listener
	/// sink is the engine's stand-in for its owning client, held weakly so
	/// that the engine never keeps it (or, transitively, the embedding
	/// application) alive. Every dispatch upgrades and no-ops once the
	/// owner has torn down the sink.
	listener: Weak<dyn ListenerSink>,
	heartbeat: Arc<dyn HeartbeatManager>,
	client_state: Arc<dyn ClientStateStore>,
	config: Config,
	inner: RwLock<Inner>,
}

impl<T: Transport + Send + Sync + 'static> Engine<T> {
	pub fn new(
		transport: T,
		listener: Arc<dyn ListenerSink>,
		heartbeat: Arc<dyn HeartbeatManager>,
		client_state: Arc<dyn ClientStateStore>,
		config: Config,
	) -> Arc<Self> {
		let inner = Inner::new(&config);
		Arc::new(Self {
			transport,
			listener: Arc::downgrade(&listener),
			heartbeat,
			client_state,
			config,
			inner: RwLock::new(inner),
		})
	}

	/// Sets the filter expression used by the Request Builder (§4.7). Takes
	/// an already-validated, unescaped expression; percent-escaping happens
	/// at request-build time.
	pub async fn set_filter_expression(&self, expression: Option<String>) {
		let mut guard = self.inner.write().await;
		guard.request_builder.filter_expression = expression;
	}

	pub async fn add_channels(&self, channels: impl IntoIterator<Item = ChannelBuf>) {
		let mut guard = self.inner.write().await;
		guard.subscriptions.add_channels(channels);
	}

	pub async fn add_groups(&self, groups: impl IntoIterator<Item = ChannelBuf>) {
		let mut guard = self.inner.write().await;
		guard.subscriptions.add_groups(groups);
	}

	pub async fn add_presence(&self, channels: impl IntoIterator<Item = ChannelBuf>) {
		let mut guard = self.inner.write().await;
		guard.subscriptions.add_presence(channels);
	}

	pub async fn current_state(&self) -> SubscriberState {
		self.inner.read().await.state
	}

	/// Upgrades the weak listener handle, if the owning client has not torn
	/// it down yet.
	fn listener(&self) -> Option<Arc<dyn ListenerSink>> {
		self.listener.upgrade()
	}

	/// §4.2 entry point for both initial registration and continuation, with
	/// no state merge, no extra query parameters, and no "has begun" signal.
	/// See [`Self::subscribe_with`] for the full signature.
	#[tracing::instrument(skip(self))]
	pub async fn subscribe(self: &Arc<Self>, initial: bool, token: Option<u64>) {
		self.subscribe_with(initial, token, SubscribeOptions::default()).await
	}

	/// §4.2 entry point for both initial registration and continuation:
	/// `subscribe(initial, token?, state?, queryParams?)`. Before anything
	/// else it cancels the Retry Timer.
	#[tracing::instrument(skip(self, options))]
	pub async fn subscribe_with(self: &Arc<Self>, initial: bool, token: Option<u64>, options: SubscribeOptions) {
		{
			let mut guard = self.inner.write().await;
			guard.retry_timer.stop();
		}

		if self.inner.read().await.subscriptions.is_empty() {
			self.handle_empty_set().await;
			return;
		}

		// §4.2 point 4: the "has begun" signal precedes the long-poll itself.
		if !initial {
			if let Some(tx) = options.on_started {
				let _ = tx.send(Category::Connected);
			}
		}

		let object_names: Vec<String> = self
			.inner
			.read()
			.await
			.subscriptions
			.all()
			.map(|c| c.to_string())
			.collect();
		if let Some(state) = options.state.as_deref() {
			self.client_state.merge(state, &object_names).await;
		}
		let merged_state = self.client_state.state_merged_with("", &object_names).await;

		let (epoch, is_initial, path, params) = {
			let mut guard = self.inner.write().await;

			if initial {
				if !guard.restoring_after_network_issues {
					guard.cursor.set_override(token);
				}
				guard.cursor.begin_initial();
			}

			guard.epoch += 1;
			let epoch = guard.epoch;
			let is_initial = guard.cursor.is_initial();
			let snapshot = guard.cursor.snapshot();
			let (path, params) = guard.request_builder.build(
				&guard.subscriptions,
				&snapshot,
				Some(merged_state.as_str()),
				&options.query_params,
			);

			(epoch, is_initial, path, params)
		};

		tracing::debug!(epoch, is_initial, channels = %path, "issuing subscribe request");

		let status = self.transport.process(Operation::Subscribe, path, params).await;
		self.handle_outcome(status, epoch, is_initial).await;
	}

	/// §4.2 unsubscribe entry point, with no extra query parameters and no
	/// completion callback. See [`Self::unsubscribe_with`] for the full
	/// signature.
	#[tracing::instrument(skip(self))]
	pub async fn unsubscribe(
		self: &Arc<Self>,
		channels: Vec<ChannelBuf>,
		groups: Vec<ChannelBuf>,
		inform_listener: bool,
		subscribe_on_rest: bool,
	) {
		self.unsubscribe_with(channels, groups, inform_listener, subscribe_on_rest, UnsubscribeOptions::default())
			.await
	}

	/// §4.2 unsubscribe entry point:
	/// `unsubscribe(channels, groups, queryParams, informListener, subscribeOnRest, cb)`.
	#[tracing::instrument(skip(self, options))]
	pub async fn unsubscribe_with(
		self: &Arc<Self>,
		channels: Vec<ChannelBuf>,
		groups: Vec<ChannelBuf>,
		inform_listener: bool,
		subscribe_on_rest: bool,
		options: UnsubscribeOptions,
	) {
		let object_names: Vec<String> = channels.iter().map(|c| c.to_string()).collect();
		self.client_state.remove(&object_names).await;

		let leavable: Vec<ChannelBuf> = channels.iter().filter(|c| !c.is_presence()).cloned().collect();

		{
			let mut guard = self.inner.write().await;
			guard.subscriptions.remove_channels(channels.iter());
			guard.subscriptions.remove_groups(groups.iter());
			if guard.subscriptions.is_empty() {
				guard.cursor.reset();
			}
		}

		let should_leave = !leavable.is_empty() && !self.config.suppress_leave_events;

		if should_leave {
			let path = leavable.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(",");

			let mut params = options.query_params;
			if !groups.is_empty() {
				let joined = groups.iter().map(|g| g.as_str()).collect::<Vec<_>>().join(",");
				params.entry("channel-group".to_owned()).or_insert(joined);
			}

			let pre_leave_snapshot = self.inner.read().await.subscriptions.clone();

			let status = self.transport.process(Operation::Unsubscribe, path, params).await;
			let access_denied = matches!(status.category, Category::AccessDenied);
			let target = if access_denied {
				Target::AccessDenied
			} else {
				Target::Disconnected
			};

			let transition = {
				let mut guard = self.inner.write().await;
				let t = state_machine::transition(guard.state, target);
				guard.state = t.next;
				guard.may_require_restore = t.may_require_restore;
				t
			};

			if transition.observable && (access_denied || inform_listener) {
				self.notify_status(transition.category).await;
			}

			if let Some(cb) = options.cb {
				let _ = cb.send(status.category);
			}

			let post_leave_set = self.inner.read().await.subscriptions.clone();
			let set_unchanged_during_leave = post_leave_set == pre_leave_snapshot;
			if subscribe_on_rest && !post_leave_set.is_empty() && set_unchanged_during_leave {
				self.subscribe(false, None).await;
			}
		} else {
			if let Some(cb) = options.cb {
				let _ = cb.send(Category::Acknowledgment);
			}

			let still_non_empty = !self.inner.read().await.subscriptions.is_empty();
			if still_non_empty {
				self.subscribe(true, None).await;
			}
		}
	}

	/// §4.5 restore path, invoked by the retry timer or an external
	/// reachability signal.
	#[tracing::instrument(skip(self))]
	pub async fn restore(self: &Arc<Self>) {
		let (state, may_require_restore, is_empty) = {
			let guard = self.inner.read().await;
			(guard.state, guard.may_require_restore, guard.subscriptions.is_empty())
		};

		if state == SubscriberState::AccessDenied {
			self.inner.write().await.retry_timer.stop();
		}

		if !is_empty && state_machine::should_restore(state, may_require_restore) {
			self.subscribe(true, None).await;
		}
	}

	async fn handle_empty_set(self: &Arc<Self>) {
		{
			let mut guard = self.inner.write().await;
			guard.cursor.reset();
			guard.restoring_after_network_issues = false;
			guard.retry_timer.stop();
			guard.epoch += 1;
		}
		self.transport.cancel();

		let transition = {
			let mut guard = self.inner.write().await;
			let t = state_machine::transition(guard.state, Target::Disconnected);
			guard.state = t.next;
			guard.may_require_restore = t.may_require_restore;
			t
		};

		if transition.observable {
			self.notify_status(transition.category).await;
		}
	}

	async fn handle_outcome(self: &Arc<Self>, status: Status, epoch: u64, is_initial: bool) {
		let current_epoch = self.inner.read().await.epoch;
		if current_epoch != epoch {
			self.heartbeat.stop_if_possible().await;
			return;
		}

		match status.category {
			Category::Cancelled => {
				// I7: no cursor advance, no state change, no listener status.
				tracing::debug!("subscribe cancelled, superseded by a newer request");
				self.heartbeat.stop_if_possible().await;
			}
			Category::AccessDenied => {
				tracing::warn!("subscribe denied access; retry timer armed");
				self.apply_recoverable(Target::AccessDenied, true).await
			}
			Category::MalformedFilter => {
				tracing::error!("subscribe rejected: malformed filter expression");
				self.apply_recoverable(Target::MalformedFilter, false).await
			}
			Category::RequestTooLong => {
				tracing::error!("subscribe rejected: request URI too long");
				self.apply_recoverable(Target::RequestTooLong, false).await
			}
			cat if cat.is_transient() => {
				tracing::warn!(category = ?cat, "transient subscribe failure, retry timer armed");
				self.apply_recoverable(Target::UnexpectedlyDisconnected, true).await
			}
			cat if cat.is_error() => self.on_generic_disconnect().await,
			_ => self.on_success(status, is_initial).await,
		}
	}

	async fn apply_recoverable(self: &Arc<Self>, target: Target, should_retry: bool) {
		let transition = {
			let mut guard = self.inner.write().await;
			let t = state_machine::transition(guard.state, target);
			guard.state = t.next;
			guard.may_require_restore = t.may_require_restore;
			t
		};

		if transition.observable {
			self.notify_status(transition.category).await;
		}

		if should_retry {
			self.arm_retry_timer().await;
		}
	}

	async fn on_generic_disconnect(self: &Arc<Self>) {
		tracing::warn!("generic transport disconnect; retry timer armed");
		self.heartbeat.stop_if_possible().await;

		{
			let mut guard = self.inner.write().await;
			if !self.config.catch_up_on_subscription_restore {
				guard.cursor.reset();
			}
			guard.restoring_after_network_issues = true;
		}

		let transition = {
			let mut guard = self.inner.write().await;
			let t = state_machine::transition(guard.state, Target::UnexpectedlyDisconnected);
			guard.state = t.next;
			guard.may_require_restore = t.may_require_restore;
			t
		};

		if transition.observable {
			self.notify_status(transition.category).await;
		}

		self.arm_retry_timer().await;
	}

	async fn on_success(self: &Arc<Self>, status: Status, is_initial: bool) {
		let Some(data) = status.service_data else {
			return;
		};

		let keep_on_restore = {
			let guard = self.inner.read().await;
			self.config.keep_time_token_on_list_change
				|| (self.config.catch_up_on_subscription_restore && guard.restoring_after_network_issues)
		};

		let original_count = data.events.len();

		let kept_events = {
			let mut guard = self.inner.write().await;

			if is_initial {
				if let Some(override_token) = guard.cursor.pending_override() {
					guard.cache.purge_newer_than(override_token);
				}
			}

			guard
				.cursor
				.accept(data.timetoken, data.region, is_initial, keep_on_restore);
			guard.restoring_after_network_issues = false;

			let mut kept = Vec::with_capacity(data.events.len());
			for raw in data.events {
				if matches!(raw.message_type, MessageType::Regular) && !raw.presence_event {
					if !guard.cache.try_insert(raw.timetoken, &raw.channel, &raw.payload) {
						tracing::trace!(channel = %raw.channel, timetoken = raw.timetoken, "duplicate event suppressed");
						continue;
					}
					guard.cache.evict_to(self.config.maximum_messages_cache_size);
				}
				kept.push(raw);
			}
			kept
		};

		// Scheduled right after de-dup and before classification/dispatch
		// (§4.6 step 3), so listener latency never serializes against loop
		// cadence. Skipped once the listener sink is gone, so the loop
		// still winds down instead of spawning forever.
		if self.listener.upgrade().is_some() {
			let engine = Arc::clone(self);
			tokio::spawn(async move { engine.subscribe(false, None).await });
		}

		if !self.config.manage_presence_list_manually {
			self.heartbeat.start_if_required().await;
		}

		let threshold = self.config.request_message_count_threshold;
		if threshold > 0 && original_count >= threshold {
			self.notify_status(Category::RequestMessageCountExceeded).await;
		}

		let Some(listener) = self.listener() else {
			tracing::debug!("listener sink torn down, dropping this response's events");
			return;
		};

		for raw in kept_events {
			match classify(raw) {
				Dispatch::Event(Event::Message(m)) => listener.notify_message(m).await,
				Dispatch::Event(Event::Signal(s)) => listener.notify_signal(s).await,
				Dispatch::Event(Event::MessageAction(a)) => listener.notify_message_action(a).await,
				Dispatch::Event(Event::Object(o)) => listener.notify_object(o).await,
				Dispatch::Event(Event::File(f)) => listener.notify_file(f).await,
				Dispatch::Event(Event::Presence(p)) => {
					if p.is_state_change && p.uuid.as_deref() == Some(self.config.uuid.as_str()) {
						self.client_state.set(&p.payload, std::slice::from_ref(&p.channel)).await;
					}
					listener.notify_presence(p).await;
				}
				Dispatch::DecryptionError(e) => listener.notify_decryption_error(e).await,
			}
		}

		if is_initial {
			let transition = {
				let mut guard = self.inner.write().await;
				let t = state_machine::transition(guard.state, Target::Connected);
				guard.state = t.next;
				guard.may_require_restore = t.may_require_restore;
				t
			};
			if transition.observable {
				self.notify_status(transition.category).await;
			}
		}
	}

	async fn arm_retry_timer(self: &Arc<Self>) {
		let mut rx = {
			let mut guard = self.inner.write().await;
			guard.retry_timer.start()
		};

		let engine = Arc::clone(self);
		tokio::spawn(async move {
			while rx.recv().await.is_some() {
				engine.restore().await;
			}
		});
	}

	async fn notify_status(&self, category: Category) {
		tracing::info!(?category, "subscriber state transition");
		if let Some(listener) = self.listener() {
			listener.notify_status(StatusNotification { category }).await;
		}
	}
}
