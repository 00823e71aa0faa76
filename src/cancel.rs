//! Cooperative cancellation tokens carrying a caller-supplied reason.
//!
//! A [`CancelToken`] is cheap to clone; every clone observes the same state. Cancellation
//! never preempts work: the coordinator checks it before dispatching a request, races it
//! against outstanding transport calls, and uses it to withdraw parked waiters from a
//! [`TokenWaiterQueue`](crate::queue::TokenWaiterQueue). Timeouts are composed by the caller,
//! e.g. by spawning a timer that calls [`CancelToken::cancel`].

// crates.io
use tokio::sync::watch;
// self
use crate::_prelude::*;

/// Why an operation was abandoned.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CancelReason(Arc<str>);
impl CancelReason {
	/// Creates a reason from any string-like value.
	pub fn new(reason: impl AsRef<str>) -> Self {
		Self(Arc::from(reason.as_ref()))
	}

	/// Returns the reason text.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Display for CancelReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl From<&str> for CancelReason {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
impl From<String> for CancelReason {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

/// Shared cancellation flag; the first [`cancel`](Self::cancel) call wins.
#[derive(Clone)]
pub struct CancelToken(Arc<watch::Sender<Option<CancelReason>>>);
impl CancelToken {
	/// Creates a token that has not been cancelled.
	pub fn new() -> Self {
		Self(Arc::new(watch::Sender::new(None)))
	}

	/// Marks the token as cancelled. Later calls keep the first reason.
	///
	/// Returns `true` if this call performed the cancellation.
	pub fn cancel(&self, reason: impl Into<CancelReason>) -> bool {
		let reason = reason.into();

		self.0.send_if_modified(|slot| {
			if slot.is_some() {
				return false;
			}

			*slot = Some(reason);

			true
		})
	}

	/// Returns `true` once [`cancel`](Self::cancel) has been called.
	pub fn is_cancelled(&self) -> bool {
		self.0.borrow().is_some()
	}

	/// Returns the cancellation reason, if cancelled.
	pub fn reason(&self) -> Option<CancelReason> {
		self.0.borrow().clone()
	}

	/// Fails with [`Error::Cancelled`] if the token has been cancelled.
	pub fn check(&self) -> Result<()> {
		match self.reason() {
			Some(reason) => Err(Error::Cancelled { reason }),
			None => Ok(()),
		}
	}

	/// Resolves with the reason once the token is cancelled.
	pub async fn cancelled(&self) -> CancelReason {
		let mut rx = self.0.subscribe();

		loop {
			let current = rx.borrow_and_update().clone();

			if let Some(reason) = current {
				return reason;
			}
			// Unreachable while `self` holds the sender.
			if rx.changed().await.is_err() {
				std::future::pending::<()>().await;
			}
		}
	}
}
impl Default for CancelToken {
	fn default() -> Self {
		Self::new()
	}
}
impl Debug for CancelToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("CancelToken").field(&self.reason()).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn first_reason_wins() {
		let token = CancelToken::new();
		let clone = token.clone();

		assert!(!token.is_cancelled());
		assert!(token.check().is_ok());
		assert!(clone.cancel("navigated away"));
		assert!(!token.cancel("second"));
		assert_eq!(token.reason(), Some(CancelReason::new("navigated away")));
		assert!(matches!(
			token.check(),
			Err(Error::Cancelled { reason }) if reason.as_str() == "navigated away"
		));
	}

	#[tokio::test]
	async fn cancelled_resolves_for_pending_and_settled_tokens() {
		let token = CancelToken::new();
		let trigger = token.clone();
		let waiter = tokio::spawn(async move { token.cancelled().await });

		tokio::task::yield_now().await;
		trigger.cancel("stop");

		let reason = waiter.await.expect("Cancellation task should not panic.");

		assert_eq!(reason.as_str(), "stop");
		assert_eq!(trigger.cancelled().await.as_str(), "stop");
	}
}
