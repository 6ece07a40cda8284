use std::borrow::Cow;
use std::future::Future;
use std::pin::Pin;

use tracing::Instrument;

use crate::traceable::{ErrorVisibility, Traceable, TraceableError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, derive_more::Display)]
pub enum SpanVisibility {
    #[display("internal")]
    Internal,
    #[display("user")]
    User,
}

/// Returns the process tracer.
pub fn global_tracer() -> Tracer {
    Tracer::new("graphql-tracing-util")
}

fn record_result<R>(visibility: SpanVisibility, result: &R)
where
    R: Traceable,
{
    if let Some(e) = result.get_error() {
        let is_private_error = matches!(e.visibility(), ErrorVisibility::Internal)
            && matches!(visibility, SpanVisibility::User);
        let description = if is_private_error {
            "Internal error".to_string()
        } else {
            e.description()
        };
        tracing::error!(
            error.visibility = %e.visibility(),
            error.description = %description,
            internal.error_details = %e.details(),
            "span failed"
        );
    }
}

/// Convenience wrapper for opening spans and recording the outcome of the
/// wrapped work on them.
#[derive(Clone, Debug)]
pub struct Tracer {
    component: &'static str,
}

impl Tracer {
    pub(crate) fn new(component: &'static str) -> Self {
        Self { component }
    }

    /// Runs `f` inside a new span named `name`, tags the span with its display
    /// name and `visibility`, and records the error of the result if any.
    pub fn in_span<R, F>(
        &self,
        name: &'static str,
        display_name: Cow<'static, str>,
        visibility: SpanVisibility,
        f: F,
    ) -> R
    where
        F: FnOnce() -> R,
        R: Traceable,
    {
        let span = tracing::info_span!(
            "span",
            otel.name = name,
            component = self.component,
            display.name = %display_name,
            internal.visibility = %visibility,
        );
        let _entered = span.enter();
        let result = f();
        record_result(visibility, &result);
        result
    }

    /// Asynchronous counterpart of [`Tracer::in_span`].
    pub async fn in_span_async<'a, R, F>(
        &'a self,
        name: &'static str,
        display_name: String,
        visibility: SpanVisibility,
        f: F,
    ) -> R
    where
        F: FnOnce() -> Pin<Box<dyn Future<Output = R> + 'a + Send>>,
        R: Traceable,
    {
        let span = tracing::info_span!(
            "span",
            otel.name = name,
            component = self.component,
            display.name = %display_name,
            internal.visibility = %visibility,
        );
        async move {
            let result = f().await;
            record_result(visibility, &result);
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Successful;

    #[derive(Debug, PartialEq)]
    struct Broken;

    impl std::fmt::Display for Broken {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "broken")
        }
    }

    impl TraceableError for Broken {
        fn visibility(&self) -> ErrorVisibility {
            ErrorVisibility::User
        }
    }

    #[test]
    fn in_span_returns_the_closure_result() {
        let _guard = tracing::subscriber::set_default(tracing_subscriber::fmt().finish());
        let tracer = global_tracer();

        let ok = tracer.in_span("ok", "Ok".into(), SpanVisibility::User, || {
            Successful::new(41 + 1)
        });
        assert_eq!(ok.into_inner(), 42);

        let failed: Result<(), Broken> =
            tracer.in_span("failed", "Failed".into(), SpanVisibility::Internal, || {
                Err(Broken)
            });
        assert_eq!(failed, Err(Broken));
    }

    #[test]
    fn result_error_forwards_visibility() {
        let result: Result<(), Broken> = Err(Broken);
        let error = result.get_error();
        assert!(matches!(
            error.map(|e| e.visibility()),
            Some(ErrorVisibility::User)
        ));
    }
}
