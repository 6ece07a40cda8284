mod traceable;
mod tracer;

pub use traceable::{ErrorVisibility, Successful, Traceable, TraceableError};
pub use tracer::{global_tracer, SpanVisibility, Tracer};
