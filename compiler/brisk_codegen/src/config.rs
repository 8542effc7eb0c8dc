//! Code generation options.

use crate::ir::FnAttrs;

/// How array elements are read and written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum AccessMode {
    /// Through the runtime's bounds-checked entry points.
    #[default]
    Checked,
    /// Inline element addressing with no bounds check.
    Unchecked,
}

/// Options consumed by [`compile`](crate::compile).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodegenConfig {
    pub module_name: String,
    pub access: AccessMode,
    /// Attributes attached to calls of pure intrinsics.
    pub intrinsic_hints: FnAttrs,
    /// Constant array literals longer than this become global data.
    pub literal_buffer_threshold: usize,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        CodegenConfig {
            module_name: "main".to_owned(),
            access: AccessMode::Checked,
            intrinsic_hints: FnAttrs::NO_SIDE_EFFECTS | FnAttrs::NO_UNWIND,
            literal_buffer_threshold: 16,
        }
    }
}

impl CodegenConfig {
    /// Defaults, adjusted by environment variables.
    ///
    /// - `BRISK_UNCHECKED_ACCESS`: any non-empty value other than `0`
    ///   selects [`AccessMode::Unchecked`].
    pub fn from_env() -> Self {
        let unchecked = std::env::var("BRISK_UNCHECKED_ACCESS")
            .map(|v| !v.is_empty() && v != "0")
            .unwrap_or(false);
        let config = Self::default();
        if unchecked {
            config.with_access(AccessMode::Unchecked)
        } else {
            config
        }
    }

    #[must_use]
    pub fn with_module_name(mut self, name: impl Into<String>) -> Self {
        self.module_name = name.into();
        self
    }

    #[must_use]
    pub fn with_access(mut self, access: AccessMode) -> Self {
        self.access = access;
        self
    }

    #[must_use]
    pub fn with_intrinsic_hints(mut self, hints: FnAttrs) -> Self {
        self.intrinsic_hints = hints;
        self
    }

    #[must_use]
    pub fn with_literal_buffer_threshold(mut self, threshold: usize) -> Self {
        self.literal_buffer_threshold = threshold;
        self
    }
}
