//! Compile tracing boundary.
//!
//! Tracing is optional, injected by the caller, and must not affect
//! compilation semantics.

use crate::error::ErrorKind;

///
/// TraceSink
///

pub trait TraceSink: Send + Sync {
    fn on_event(&self, event: TraceEvent);
}

///
/// TraceEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TraceEvent {
    /// Lexing and parsing finished; the surface tree exists.
    Parsed,
    /// Lowering finished; every literal is validated and cast.
    Lowered,
    /// Compaction finished; the criteria tree is final.
    Compacted,
    /// The compile failed with the given classification.
    Failed { kind: ErrorKind },
}
