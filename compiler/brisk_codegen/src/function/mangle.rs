//! Symbol mangling for specializations.
//!
//! # Mangling Scheme
//!
//! ```text
//! _brisk_[<len><Owner>.]<len><name>{$<param>}[$$<targ>{$<targ>}]
//! ```
//!
//! - identifiers are length-prefixed, so `a.bc` and `ab.c` never collide
//! - one `$<param>` per supplied parameter, in order
//! - type arguments follow `$$` for generic declarations only
//!
//! Types encode as `int`, `number`, `boolean`, `void`, `A<elem>` (array),
//! `N<inner>` (nullable), `C<len><Name>` (class), `M<len><Name>` (built-in
//! object), `P<len><Name>` (type parameter).
//!
//! | Specialization | Mangled Name |
//! |----------------|--------------|
//! | `max3(int, int, int)` | `_brisk_4max3$int$int$int` |
//! | `Point.norm()` | `_brisk_5Point.4norm` |
//! | `identity<number>(number)` | `_brisk_8identity$number$$number` |
//! | `sum(...int[])` | `_brisk_3sum$Aint` |

use std::fmt::Write;

use brisk_ir::{Program, Ty, TypeId};

/// The prefix of every specialization symbol.
pub const MANGLE_PREFIX: &str = "_brisk_";

/// Separator before each parameter type.
const PARAM_SEP: char = '$';

/// Separator before the type-argument list.
const TYPE_ARGS_SEP: &str = "$$";

/// Symbol mangler for specializations of one program.
#[derive(Clone, Copy)]
pub struct Mangler<'p> {
    program: &'p Program,
}

impl<'p> Mangler<'p> {
    pub fn new(program: &'p Program) -> Self {
        Mangler { program }
    }

    /// Mangle one specialization.
    #[must_use]
    pub fn mangle_specialization(
        &self,
        owner: Option<&str>,
        name: &str,
        params: &[TypeId],
        type_args: &[TypeId],
    ) -> String {
        let mut result = String::with_capacity(64);
        result.push_str(MANGLE_PREFIX);

        if let Some(owner) = owner {
            encode_identifier(&mut result, owner);
            result.push('.');
        }
        encode_identifier(&mut result, name);

        for &param in params {
            result.push(PARAM_SEP);
            self.encode_type(&mut result, param);
        }

        if !type_args.is_empty() {
            result.push_str(TYPE_ARGS_SEP);
            for (i, &arg) in type_args.iter().enumerate() {
                if i > 0 {
                    result.push(PARAM_SEP);
                }
                self.encode_type(&mut result, arg);
            }
        }
        result
    }

    /// Append the encoding of `ty`.
    pub fn encode_type(&self, out: &mut String, ty: TypeId) {
        match self.program.types.get(ty) {
            Ty::Int => out.push_str("int"),
            Ty::Number => out.push_str("number"),
            Ty::Boolean => out.push_str("boolean"),
            Ty::Void => out.push_str("void"),
            Ty::Array(element) => {
                out.push('A');
                self.encode_type(out, element);
            }
            Ty::Nullable(inner) => {
                out.push('N');
                self.encode_type(out, inner);
            }
            Ty::Class { name, .. } => {
                out.push('C');
                encode_identifier(out, self.program.name(name));
            }
            Ty::BuiltIn(object) => {
                out.push('M');
                encode_identifier(out, object.name());
            }
            Ty::Param(name) => {
                out.push('P');
                encode_identifier(out, self.program.name(name));
            }
        }
    }
}

/// `<len><ident>`
fn encode_identifier(out: &mut String, ident: &str) {
    // Writing to a String cannot fail.
    let _ = write!(out, "{}{ident}", ident.len());
}

#[cfg(test)]
mod tests;
