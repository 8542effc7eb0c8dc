//! Diagnostics for the Brisk compiler.
//!
//! Structured [`Diagnostic`] values with stable [`ErrorCode`]s, and the
//! [`DiagnosticSink`] that compilation stages report into. Rendering is
//! left to the driver.

mod diagnostic;
mod error_code;
mod queue;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
pub use queue::{DiagnosticConfig, DiagnosticQueue, DiagnosticSink};
