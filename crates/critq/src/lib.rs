//! critq — filter-expression compilation for query engines.
//!
//! This is the public meta-crate. Downstream users depend on **critq** only;
//! the implementation lives in `critq-core`.

pub use critq_core as core;

pub use core::{Compiler, Criteria, Error, ErrorKind, compile};

//
// Prelude
//

pub mod prelude {
    pub use critq_core::prelude::*;
}
