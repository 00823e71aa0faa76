//! Single-slot, cancellation-safe hand-off for one partition's token.
//!
//! A [`TokenWaiterQueue`] holds either one ready token or a FIFO of parked waiters, never
//! both. [`TokenWaiterQueue::set_token`] delivers straight to the oldest waiter when one
//! exists and only stores the token otherwise; [`TokenWaiterQueue::take`] leases the
//! stored token or parks the caller until a token arrives or its [`CancelToken`] fires.
//!
//! Every handed-out token counts as *outstanding* until its [`TokenLease`] is dropped: a
//! spent token is settled (the holder's response may carry the successor) and an unspent
//! token is restored to the queue. When the last outstanding token settles while nothing is
//! stored, the remaining waiters are released with [`Error::PartitionTokenUnavailable`]
//! instead of waiting forever.

// std
use std::{future::Ready, mem};
// crates.io
use tokio::sync::oneshot;
// self
use crate::{
	_prelude::*,
	auth::{PartitionName, PartitionToken},
	cancel::CancelToken,
	obs,
};

type NoRefresh = fn() -> Ready<Result<()>>;

#[derive(Default)]
struct QueueState {
	token: Option<PartitionToken>,
	waiters: BTreeMap<u64, oneshot::Sender<PartitionToken>>,
	next_ticket: u64,
	outstanding: usize,
}
impl QueueState {
	fn hand_off(&mut self, mut token: PartitionToken) {
		while let Some((_, waiter)) = self.waiters.pop_first() {
			match waiter.send(token) {
				Ok(()) => {
					self.outstanding += 1;

					return;
				},
				Err(returned) => token = returned,
			}
		}

		self.token = Some(token);
	}

	fn register(&mut self) -> (u64, oneshot::Receiver<PartitionToken>) {
		let ticket = self.next_ticket;
		let (tx, rx) = oneshot::channel();

		self.next_ticket += 1;
		self.waiters.insert(ticket, tx);

		(ticket, rx)
	}
}

/// Asynchronous single-slot token hand-off for one partition.
pub struct TokenWaiterQueue {
	partition: PartitionName,
	state: Mutex<QueueState>,
}
impl TokenWaiterQueue {
	/// Creates an empty queue for `partition`.
	pub fn new(partition: PartitionName) -> Self {
		Self { partition, state: Default::default() }
	}

	/// Creates a queue that already holds `token`.
	pub fn with_token(partition: PartitionName, token: impl Into<PartitionToken>) -> Self {
		let queue = Self::new(partition);

		queue.set_token(token);

		queue
	}

	/// Partition served by this queue.
	pub fn partition(&self) -> &PartitionName {
		&self.partition
	}

	/// Delivers `token` to the oldest waiter, or stores it (replacing any unconsumed token)
	/// when nobody is waiting.
	pub fn set_token(&self, token: impl Into<PartitionToken>) {
		self.state.lock().hand_off(token.into());
	}

	/// Returns `true` when a token is ready for immediate consumption.
	pub fn has_token(&self) -> bool {
		self.state.lock().token.is_some()
	}

	/// Removes the stored token without handing it to anyone.
	pub(crate) fn clear(&self) -> Option<PartitionToken> {
		self.state.lock().token.take()
	}

	/// Copies the stored token for inspection; the slot keeps it.
	pub(crate) fn peek(&self) -> Option<PartitionToken> {
		self.state.lock().token.as_ref().map(|token| PartitionToken::new(token.expose()))
	}

	/// Number of parked waiters.
	pub fn waiting(&self) -> usize {
		self.state.lock().waiters.len()
	}

	/// Number of handed-out tokens whose holders have not reported back yet.
	pub fn outstanding(&self) -> usize {
		self.state.lock().outstanding
	}

	/// Leases the stored token or waits for one, without a refresh callback.
	pub async fn wait(self: &Arc<Self>, cancel: &CancelToken) -> Result<TokenLease> {
		self.take(cancel, None::<NoRefresh>).await
	}

	/// Leases the stored token, refreshing first when the slot is empty, or waits for one.
	///
	/// `refresh` runs only when no token is stored and is expected to call
	/// [`set_token`](Self::set_token) as a side effect; its error is returned unchanged. If it
	/// stores nothing and no handed-out token is outstanding, the call fails with
	/// [`Error::PartitionTokenUnavailable`] rather than parking a waiter nobody will serve.
	///
	/// A parked caller is withdrawn from the queue exactly once on every exit path,
	/// including cancellation and dropping the returned future.
	pub async fn take<F, Fut>(
		self: &Arc<Self>,
		cancel: &CancelToken,
		refresh: Option<F>,
	) -> Result<TokenLease>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<()>>,
	{
		let token = self.take_token(cancel, refresh).await?;

		Ok(TokenLease::new(self.clone(), token))
	}

	/// Returns an unspent token handed out earlier; it goes to the next waiter or is stored.
	pub(crate) fn restore(&self, token: PartitionToken) {
		let mut state = self.state.lock();

		state.outstanding = state.outstanding.saturating_sub(1);
		state.hand_off(token);
	}

	/// Reports that a handed-out token was spent.
	///
	/// If this was the last outstanding token and nothing is stored, parked waiters are
	/// released with [`Error::PartitionTokenUnavailable`].
	pub(crate) fn settle(&self) {
		let abandoned = {
			let mut state = self.state.lock();

			state.outstanding = state.outstanding.saturating_sub(1);

			if state.outstanding == 0 && state.token.is_none() {
				mem::take(&mut state.waiters)
			} else {
				BTreeMap::new()
			}
		};

		if !abandoned.is_empty() {
			obs::event!(
				warn,
				partition = %self.partition,
				waiters = abandoned.len(),
				"Releasing waiters; no partition token is stored or in flight."
			);
		}
	}

	async fn take_token<F, Fut>(
		&self,
		cancel: &CancelToken,
		refresh: Option<F>,
	) -> Result<PartitionToken>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<()>>,
	{
		cancel.check()?;

		let refreshed = match refresh {
			Some(refresh) if !self.has_token() => {
				refresh().await?;

				true
			},
			_ => false,
		};
		let mut waiter = {
			let mut state = self.state.lock();

			if let Some(token) = state.token.take() {
				state.outstanding += 1;

				return Ok(token);
			}
			if refreshed && state.outstanding == 0 {
				return Err(self.unavailable());
			}

			let (ticket, rx) = state.register();

			Waiter { queue: self, ticket, rx, settled: false }
		};

		waiter.wait(cancel).await
	}

	fn unavailable(&self) -> Error {
		Error::PartitionTokenUnavailable { partition: self.partition.clone() }
	}
}
impl Debug for TokenWaiterQueue {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.state.lock();

		f.debug_struct("TokenWaiterQueue")
			.field("partition", &self.partition)
			.field("has_token", &state.token.is_some())
			.field("waiting", &state.waiters.len())
			.field("outstanding", &state.outstanding)
			.finish()
	}
}

/// A parked registration; withdraws itself from the queue unless it was fulfilled.
struct Waiter<'a> {
	queue: &'a TokenWaiterQueue,
	ticket: u64,
	rx: oneshot::Receiver<PartitionToken>,
	settled: bool,
}
impl Waiter<'_> {
	async fn wait(&mut self, cancel: &CancelToken) -> Result<PartitionToken> {
		let queue = self.queue;
		let outcome = tokio::select! {
			biased;
			delivered = &mut self.rx => delivered.map_err(|_| queue.unavailable()),
			reason = cancel.cancelled() => return Err(Error::Cancelled { reason }),
		};

		self.settled = true;

		outcome
	}
}
impl Drop for Waiter<'_> {
	fn drop(&mut self) {
		if self.settled {
			return;
		}

		let mut state = self.queue.state.lock();

		if state.waiters.remove(&self.ticket).is_some() {
			return;
		}
		// A token reached this waiter after it stopped listening; pass it on.
		if let Ok(token) = self.rx.try_recv() {
			state.outstanding = state.outstanding.saturating_sub(1);
			state.hand_off(token);
		}
	}
}

/// A partition token held by one in-flight operation.
///
/// Call [`spend`](Self::spend) when the token is attached to a request. Dropping a spent
/// lease settles it; dropping an unspent lease restores the token to its queue. Leases only
/// come from [`TokenWaiterQueue::take`] and [`TokenWaiterQueue::wait`], so every handed-out
/// token is accounted for exactly once.
///
/// Settling the last outstanding token while nothing is stored releases every parked waiter
/// of the partition with [`Error::PartitionTokenUnavailable`]. A holder cancelled after its
/// request went out therefore fails the callers queued behind it too, even though they
/// were not cancelled themselves.
pub struct TokenLease {
	queue: Arc<TokenWaiterQueue>,
	token: Option<PartitionToken>,
	spent: bool,
}
impl TokenLease {
	fn new(queue: Arc<TokenWaiterQueue>, token: PartitionToken) -> Self {
		Self { queue, token: Some(token), spent: false }
	}

	/// Partition the token belongs to.
	pub fn partition(&self) -> &PartitionName {
		self.queue.partition()
	}

	/// Token held by the lease, until it is spent.
	pub fn token(&self) -> Option<&PartitionToken> {
		self.token.as_ref()
	}

	/// Takes the token for use in a request.
	pub fn spend(&mut self) -> Option<PartitionToken> {
		self.spent = true;

		self.token.take()
	}
}
impl Drop for TokenLease {
	fn drop(&mut self) {
		match self.token.take() {
			Some(token) => self.queue.restore(token),
			None => self.queue.settle(),
		}
	}
}
impl Debug for TokenLease {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenLease")
			.field("partition", self.partition())
			.field("spent", &self.spent)
			.finish()
	}
}
