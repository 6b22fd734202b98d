//! # sieve-core
//!
//! Building blocks shared by the sieve request pipeline:
//!
//! - [`exception`]: [`StructuredError`](exception::StructuredError), an error
//!   accumulator that records its reasons together with the call stack of the
//!   failure site, and the framework level [`Error`](exception::Error).
//! - [`negotiation`]: quality-value header parsing for content negotiation.
//! - [`utils`]: generic comparison helpers.

pub mod exception;
pub mod negotiation;
pub mod utils;

pub use exception::{Cause, Error, Reason, Result, StructuredError};
pub use negotiation::{HeaderValue, parse_header};
