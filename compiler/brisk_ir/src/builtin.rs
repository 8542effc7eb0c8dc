//! Well-known built-in singleton objects.

/// A runtime singleton the front end binds in the global scope.
///
/// Each object exposes a fixed, closed set of members; the code generator
/// owns that member table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum BuiltinObject {
    /// The numeric namespace object `Math`.
    Math,
}

impl BuiltinObject {
    /// Source-level name of the singleton.
    pub const fn name(self) -> &'static str {
        match self {
            BuiltinObject::Math => "Math",
        }
    }
}
