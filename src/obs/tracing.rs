// self
use crate::{_prelude::*, obs::OperationKind};

/// Future returned by [`OperationSpan::instrument`]: wrapped in the span with `tracing`, the
/// future itself without it.
#[cfg(feature = "tracing")]
pub type InstrumentedOperation<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`OperationSpan::instrument`]: wrapped in the span with `tracing`, the
/// future itself without it.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOperation<F> = F;

/// Debug-level span covering one request, credential refresh, or partition refresh.
///
/// Refreshes triggered by a request open their own span inside the request's span, so a
/// retried call shows up as one `resource` span with a `credential_refresh` child.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OperationSpan {
	/// Opens a `session_token_broker.operation` span; `stage` names the coordinator method.
	pub fn new(kind: OperationKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			Self {
				span: tracing::debug_span!(
					"session_token_broker.operation",
					kind = kind.as_str(),
					stage
				),
			}
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Runs `operation` inside the span. Waiting on a partition queue or the transport happens
	/// inside the instrumented future, so no guard is held while the operation is parked.
	pub fn instrument<Fut>(&self, operation: Fut) -> InstrumentedOperation<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			operation.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			operation
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn nested_refresh_spans_pass_results_through() {
		let request = OperationSpan::new(OperationKind::Resource, "perform");
		let refresh = OperationSpan::new(OperationKind::CredentialRefresh, "refresh_access");
		let refreshed = refresh.instrument(async { Err::<&str, _>(Error::RefreshFailed) });
		let outcome = request.instrument(async { refreshed.await }).await;

		assert!(matches!(outcome, Err(Error::RefreshFailed)));
	}
}
