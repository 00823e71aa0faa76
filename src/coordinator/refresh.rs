//! Bearer credential and partition token refresh.
//!
//! Both refreshes are plain transport calls issued by the coordinator itself; the tokens
//! they return are harvested from the response body like any other. A `401` from the
//! credential refresh endpoint means the refresh credential is dead: it is dropped and the
//! [`SessionHook`](crate::coordinator::SessionHook) is told that a new login is required.

// self
use crate::{
	_prelude::*,
	auth::{Credential, PartitionName},
	cancel::CancelToken,
	coordinator::{Authorization, Coordinator, Target},
	http::ApiTransport,
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
};

impl<T> Coordinator<T>
where
	T: ?Sized + ApiTransport,
{
	/// Redeems the refresh credential for a new bearer credential.
	///
	/// A rejected refresh credential is not an error here: it is cleared and the session hook
	/// is notified. Fails with [`Error::MissingCredential`] when no refresh credential exists.
	pub async fn renew_access_credential(&self, cancel: &CancelToken) -> Result<()> {
		self.refresh_access(None, cancel).await
	}

	/// Requests fresh partition tokens with the bearer credential.
	///
	/// Without a usable bearer credential this succeeds only while a token of `partition` is
	/// in flight (its response may carry the successor); otherwise it fails with
	/// [`Error::MissingCredential`].
	pub async fn renew_partition_tokens(
		&self,
		partition: &PartitionName,
		cancel: &CancelToken,
	) -> Result<()> {
		self.refresh_partition(partition, cancel).await
	}

	/// `stale` is the bearer value the caller saw rejected, if any. With single-flight
	/// enabled, the refresh is skipped when another caller already replaced it.
	pub(super) async fn refresh_access(
		&self,
		stale: Option<&Credential>,
		cancel: &CancelToken,
	) -> Result<()> {
		const KIND: OperationKind = OperationKind::CredentialRefresh;

		let span = OperationSpan::new(KIND, "refresh_access");

		obs::record_operation_outcome(KIND, OperationOutcome::Attempt);

		let result = span
			.instrument(async move {
				let _singleflight =
					if self.single_flight { Some(self.refresh_guard.lock().await) } else { None };

				if self.single_flight && self.replaced_since(stale) {
					obs::event!(debug, "Bearer credential was replaced while waiting; skipping.");

					return Ok(());
				}

				let refresh = self.refresh_credential().ok_or(Error::MissingCredential)?;
				let target = Target::post(self.endpoints.refresh_credential.clone());
				let mut authorization = Authorization::Explicit(refresh.value.clone());

				self.metrics.record_credential_refresh();
				obs::event!(debug, "Refreshing the bearer credential.");

				let response = self.execute(&target, &mut authorization, cancel).await?;

				if response.is_unauthorized() {
					self.reject_refresh_credential(&refresh);
				} else if !response.is_success() {
					obs::event!(
						debug,
						status = response.status,
						"Bearer credential refresh returned a failure status."
					);
				}

				Ok(())
			})
			.await;

		obs::record_operation_outcome(KIND, OperationOutcome::of(&result));

		result
	}

	pub(super) async fn refresh_partition(
		&self,
		partition: &PartitionName,
		cancel: &CancelToken,
	) -> Result<()> {
		const KIND: OperationKind = OperationKind::PartitionRefresh;

		let span = OperationSpan::new(KIND, "refresh_partition");

		obs::record_operation_outcome(KIND, OperationOutcome::Attempt);

		let result = span
			.instrument(async move {
				let Some(access) = self.usable_access() else {
					if self.queue(partition).outstanding() > 0 {
						obs::event!(
							debug,
							partition = %partition,
							"No bearer credential; waiting for the in-flight token's successor."
						);

						return Ok(());
					}

					return Err(Error::MissingCredential);
				};
				let target = Target::get(self.endpoints.refresh_partition_tokens.clone())
					.in_partition(partition.clone());
				let mut authorization = Authorization::Bearer(access);

				self.metrics.record_partition_refresh();

				let response = self.execute(&target, &mut authorization, cancel).await?;

				if response.is_success() {
					Ok(())
				} else {
					Err(Error::HttpStatus { status: response.status })
				}
			})
			.await;

		obs::record_operation_outcome(KIND, OperationOutcome::of(&result));

		result
	}

	fn replaced_since(&self, stale: Option<&Credential>) -> bool {
		match (self.usable_access(), stale) {
			(Some(current), Some(stale)) => !current.same_value(stale),
			(Some(_), None) => true,
			(None, _) => false,
		}
	}

	fn reject_refresh_credential(&self, rejected: &Credential) {
		{
			let mut session = self.session.lock();

			if session.refresh.as_ref().is_some_and(|current| current.same_value(rejected)) {
				session.refresh = None;
			}
		}

		obs::event!(warn, "Refresh credential was rejected; a new login is required.");

		if let Some(hook) = &self.hook {
			hook.login_required();
		}
	}
}
