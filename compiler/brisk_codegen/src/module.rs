//! Module-level compilation.
//!
//! [`ModuleCompiler`] owns the per-unit state and specializes entry points
//! one at a time; everything they reach is generated on demand through the
//! specialization cache. [`compile`](crate::compile) drives it over a
//! program's exported entry points.

use brisk_ir::{FuncId, Program};
use tracing::debug;

use crate::config::CodegenConfig;
use crate::context::{CodegenStats, Env, UnitState};
use crate::dispatch::Registry;
use crate::error::{CodegenError, CodegenResult};
use crate::function::{canonicalize, specialize};
use crate::ir::{FunctionId, Module};

/// Result of compiling one unit.
#[derive(Debug)]
pub struct CodegenOutput {
    pub module: Module,
    /// The module allocates and must be linked with the collector.
    pub gc_required: bool,
    pub stats: CodegenStats,
}

/// Compiler for one program unit.
pub struct ModuleCompiler<'a> {
    program: &'a Program,
    config: CodegenConfig,
    registry: Registry,
    unit: UnitState,
}

impl<'a> ModuleCompiler<'a> {
    pub fn new(program: &'a Program, config: CodegenConfig) -> Self {
        Self::with_registry(program, config, Registry::standard())
    }

    /// Compiler using a custom generator table.
    pub fn with_registry(program: &'a Program, config: CodegenConfig, registry: Registry) -> Self {
        let unit = UnitState::new(&config.module_name);
        ModuleCompiler {
            program,
            config,
            registry,
            unit,
        }
    }

    /// Specialize `func` with every parameter supplied and export it under
    /// its source name.
    pub fn compile_entry(&mut self, func: FuncId) -> CodegenResult<FunctionId> {
        let decl = self.program.function(func);
        let name = self.program.name(decl.name);
        if decl.is_generic() {
            return Err(CodegenError::internal(
                format!("entry point `{name}` is generic"),
                decl.span,
            ));
        }
        if decl.body.is_none() {
            return Err(CodegenError::internal(
                format!("entry point `{name}` has no body"),
                decl.span,
            ));
        }

        let arg_count = decl.params.iter().filter(|p| !p.variadic).count();
        let resolved = canonicalize(self.program, func, &[], arg_count, decl.span)?;
        let env = Env {
            program: self.program,
            registry: &self.registry,
            config: &self.config,
        };
        let id = specialize(env, &mut self.unit, &resolved, decl.span)?;
        self.unit.module.export(name, id);
        debug!(entry = name, symbol = %self.unit.module.function(id).name, "entry point compiled");
        Ok(id)
    }

    pub fn module(&self) -> &Module {
        self.unit.module()
    }

    pub fn gc_required(&self) -> bool {
        self.unit.gc_required()
    }

    pub fn stats(&self) -> CodegenStats {
        self.unit.stats()
    }

    /// Finish the unit.
    ///
    /// Prints the module to stderr when `BRISK_DEBUG_IR` is non-empty.
    pub fn finish(self) -> CodegenOutput {
        let (module, gc_required, stats) = self.unit.into_parts();
        if std::env::var("BRISK_DEBUG_IR").is_ok_and(|v| !v.is_empty()) {
            eprintln!("{module}");
        }
        CodegenOutput {
            module,
            gc_required,
            stats,
        }
    }
}
