//! Type-directed code generation for Brisk.
//!
//! Lowers a type-checked [`Program`] into a low-level [`ir::Module`]:
//! every value carries its static type, conversions follow fixed numeric
//! rules, functions are specialized per concrete signature and generated
//! once, and heap entities go through a small runtime object model.
//! Anything outside the compiled subset fails closed with a
//! [`CodegenError`].
//!
//! # Debug Environment Variables
//!
//! - `BRISK_DEBUG_IR`: Print the finished module to stderr. Any non-empty
//!   value enables this.
//!   Example: `BRISK_DEBUG_IR=1 cargo test`
//!
//! - `RUST_LOG=brisk_codegen=debug`: Specialization, cache, descriptor,
//!   and GC-flag events.
//!
//! - `RUST_LOG=brisk_codegen=trace`: Every dispatched node.
//!
//! - `BRISK_UNCHECKED_ACCESS=1`: Read by [`CodegenConfig::from_env`];
//!   selects inline array element access without bounds checks.
//!
//! # Architecture
//!
//! - **IR** (`ir`): module, builder, printer
//! - **Values** (`value`): typed operands, lvalues, conversions
//! - **Dispatch** (`dispatch`): one generator per syntax kind
//! - **Functions** (`function`): canonicalization, mangling, specialization
//! - **Objects** (`object`): classes, arrays, built-ins
//! - **Context** (`context`): unit state and per-function context

// Crate-level lint configuration for codegen-specific patterns
#![allow(
    // IR indices are u32, Rust collections use usize
    clippy::cast_possible_truncation,
    // Sizes and alignments are u64, constants are i64
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    // Literal values widen from i64 to f64
    clippy::cast_precision_loss,
    // Generators thread the context, node, and types through
    clippy::too_many_arguments,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
)]

pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod function;
pub mod ir;
pub mod layout;
mod module;
pub mod object;
pub mod runtime;
pub mod scope;
mod stack;
pub mod value;

use std::sync::Once;

use brisk_diagnostic::DiagnosticSink;
use brisk_ir::Program;
use tracing::warn;

pub use config::{AccessMode, CodegenConfig};
pub use context::CodegenStats;
pub use dispatch::{NodeGenerator, Registry};
pub use error::{CodegenError, CodegenResult};
pub use module::{CodegenOutput, ModuleCompiler};
pub use value::Value;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Enable with `RUST_LOG=brisk_codegen=debug`
/// or `RUST_LOG=brisk_codegen=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

/// Compile every exported entry point of `program`.
///
/// Generic entry points have no concrete instantiation and are skipped.
/// The first failure is reported to `sink` and returned; a failed unit
/// produces no module.
pub fn compile(
    program: &Program,
    config: &CodegenConfig,
    sink: &mut dyn DiagnosticSink,
) -> Result<CodegenOutput, CodegenError> {
    let mut compiler = ModuleCompiler::new(program, config.clone());
    for &entry in &program.entry_points {
        let decl = program.function(entry);
        if decl.is_generic() {
            warn!(entry = program.name(decl.name), "skipping generic entry point");
            continue;
        }
        if let Err(err) = compiler.compile_entry(entry) {
            sink.emit(err.to_diagnostic());
            return Err(err);
        }
    }
    Ok(compiler.finish())
}
