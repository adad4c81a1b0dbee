//! Compilation pipeline: parse → lower → compact.

mod cast;
mod compact;
mod lower;

#[cfg(test)]
mod tests;

use crate::{
    criteria::Criteria,
    error::Error,
    parse,
    schema::Schema,
    trace::{TraceEvent, TraceSink},
};
use std::fmt;

// re-exports
pub use cast::ValidateError;
pub use compact::compact;

/// Compile one filter expression into a criteria tree.
///
/// Without a schema the compiler is permissive: fields pass through and
/// literals keep their lexical types. With a schema every field is resolved
/// and every literal validated and cast.
pub fn compile(input: &str, schema: Option<&Schema>) -> Result<Criteria, Error> {
    let expr = parse::parse(input)?;
    let criteria = lower::lower(&expr, schema)?;

    Ok(compact::compact(criteria))
}

///
/// Compiler
///
/// Reusable handle owning an optional schema and an optional trace sink.
/// `compile` takes `&self` and keeps all per-compile state on the call
/// stack, so one handle serves any number of concurrent compiles.
///

#[derive(Default)]
pub struct Compiler {
    schema: Option<Schema>,
    sink: Option<&'static dyn TraceSink>,
}

impl Compiler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_schema(schema: Schema) -> Self {
        Self {
            schema: Some(schema),
            sink: None,
        }
    }

    /// Attach a trace sink. Tracing never affects compilation semantics.
    #[must_use]
    pub fn with_trace(mut self, sink: &'static dyn TraceSink) -> Self {
        self.sink = Some(sink);
        self
    }

    #[must_use]
    pub const fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    pub fn compile(&self, input: &str) -> Result<Criteria, Error> {
        let result = self.run(input);
        if let Err(err) = &result {
            self.emit(TraceEvent::Failed { kind: err.kind() });
        }

        result
    }

    fn run(&self, input: &str) -> Result<Criteria, Error> {
        let expr = parse::parse(input)?;
        self.emit(TraceEvent::Parsed);

        let criteria = lower::lower(&expr, self.schema.as_ref())?;
        self.emit(TraceEvent::Lowered);

        let criteria = compact::compact(criteria);
        self.emit(TraceEvent::Compacted);

        Ok(criteria)
    }

    fn emit(&self, event: TraceEvent) {
        if let Some(sink) = self.sink {
            sink.on_event(event);
        }
    }
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("schema", &self.schema)
            .field("traced", &self.sink.is_some())
            .finish()
    }
}
