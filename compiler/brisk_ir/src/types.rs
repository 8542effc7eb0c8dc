//! Static types as resolved by the front end.
//!
//! `TypeId` is the canonical handle. Types are hash-consed in a [`TypePool`],
//! so two structurally equal types always share one id and type equality is
//! an index comparison. Primitive types have fixed ids.
//!
//! The pool interns through `&self` (interior mutability) because the code
//! generator creates substituted types while it only holds a shared borrow
//! of the program.

use std::cell::RefCell;
use std::fmt;

use rustc_hash::FxHashMap;

use crate::{BuiltinObject, ClassId, Name, StringInterner};

/// A 32-bit index into the type pool.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    /// `int`: 32-bit signed integer.
    pub const INT: Self = Self(0);
    /// `number`: 64-bit IEEE float.
    pub const NUMBER: Self = Self(1);
    /// `boolean`.
    pub const BOOLEAN: Self = Self(2);
    /// `void`: no value.
    pub const VOID: Self = Self(3);

    /// Number of pre-interned primitive types.
    pub const PRIMITIVE_COUNT: u32 = 4;

    /// Get the raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Create from a raw u32 value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Check if this is one of the pre-interned primitives.
    #[inline]
    pub const fn is_primitive(self) -> bool {
        self.0 < Self::PRIMITIVE_COUNT
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::INT => write!(f, "TypeId(int)"),
            Self::NUMBER => write!(f, "TypeId(number)"),
            Self::BOOLEAN => write!(f, "TypeId(boolean)"),
            Self::VOID => write!(f, "TypeId(void)"),
            _ => write!(f, "TypeId({})", self.0),
        }
    }
}

/// Structure of a type.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Ty {
    Int,
    Number,
    Boolean,
    Void,
    /// `T[]`
    Array(TypeId),
    /// `T | undefined`
    Nullable(TypeId),
    /// Instance of a user-defined class.
    Class { id: ClassId, name: Name },
    /// The type of a built-in singleton such as `Math`.
    BuiltIn(BuiltinObject),
    /// An unsubstituted generic type parameter.
    Param(Name),
}

/// Binding of generic type parameters to concrete types.
pub type Substitution = FxHashMap<Name, TypeId>;

/// Hash-consing store for [`Ty`] values.
pub struct TypePool {
    types: RefCell<Vec<Ty>>,
    lookup: RefCell<FxHashMap<Ty, TypeId>>,
}

impl TypePool {
    /// Create a pool with the primitive types pre-interned.
    pub fn new() -> Self {
        let pool = Self {
            types: RefCell::new(Vec::with_capacity(64)),
            lookup: RefCell::new(FxHashMap::default()),
        };
        for ty in [Ty::Int, Ty::Number, Ty::Boolean, Ty::Void] {
            pool.intern(ty);
        }
        pool
    }

    /// Intern a type, returning the id shared by every equal type.
    pub fn intern(&self, ty: Ty) -> TypeId {
        let ty = match ty {
            // `(T | undefined) | undefined` is `T | undefined`.
            Ty::Nullable(inner) if matches!(self.get(inner), Ty::Nullable(_)) => {
                return inner;
            }
            other => other,
        };
        if let Some(&id) = self.lookup.borrow().get(&ty) {
            return id;
        }
        let mut types = self.types.borrow_mut();
        let id = TypeId(u32::try_from(types.len()).unwrap_or(u32::MAX));
        types.push(ty);
        self.lookup.borrow_mut().insert(ty, id);
        id
    }

    /// Structure of an interned type.
    pub fn get(&self, id: TypeId) -> Ty {
        self.types.borrow()[id.0 as usize]
    }

    pub fn array(&self, element: TypeId) -> TypeId {
        self.intern(Ty::Array(element))
    }

    pub fn nullable(&self, inner: TypeId) -> TypeId {
        self.intern(Ty::Nullable(inner))
    }

    pub fn class(&self, id: ClassId, name: Name) -> TypeId {
        self.intern(Ty::Class { id, name })
    }

    pub fn builtin(&self, object: BuiltinObject) -> TypeId {
        self.intern(Ty::BuiltIn(object))
    }

    pub fn param(&self, name: Name) -> TypeId {
        self.intern(Ty::Param(name))
    }

    /// Number of interned types.
    pub fn len(&self) -> usize {
        self.types.borrow().len()
    }

    /// Always false: primitives are pre-interned.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// True if the type mentions a generic type parameter anywhere.
    pub fn is_generic(&self, id: TypeId) -> bool {
        match self.get(id) {
            Ty::Param(_) => true,
            Ty::Array(inner) | Ty::Nullable(inner) => self.is_generic(inner),
            Ty::Int | Ty::Number | Ty::Boolean | Ty::Void | Ty::Class { .. } | Ty::BuiltIn(_) => {
                false
            }
        }
    }

    /// Replace every type parameter bound in `subst`.
    ///
    /// Parameters without a binding are left in place.
    pub fn substitute(&self, id: TypeId, subst: &Substitution) -> TypeId {
        if subst.is_empty() || id.is_primitive() {
            return id;
        }
        match self.get(id) {
            Ty::Param(name) => subst.get(&name).copied().unwrap_or(id),
            Ty::Array(inner) => {
                let inner = self.substitute(inner, subst);
                self.array(inner)
            }
            Ty::Nullable(inner) => {
                let inner = self.substitute(inner, subst);
                self.nullable(inner)
            }
            Ty::Int | Ty::Number | Ty::Boolean | Ty::Void | Ty::Class { .. } | Ty::BuiltIn(_) => {
                id
            }
        }
    }

    /// Print a type in source syntax, e.g. `int[]` or `number | undefined`.
    pub fn display(&self, id: TypeId, interner: &StringInterner) -> String {
        let mut out = String::new();
        self.write_type(&mut out, id, interner);
        out
    }

    fn write_type(&self, out: &mut String, id: TypeId, interner: &StringInterner) {
        match self.get(id) {
            Ty::Int => out.push_str("int"),
            Ty::Number => out.push_str("number"),
            Ty::Boolean => out.push_str("boolean"),
            Ty::Void => out.push_str("void"),
            Ty::Array(inner) => {
                let wrap = matches!(self.get(inner), Ty::Nullable(_));
                if wrap {
                    out.push('(');
                }
                self.write_type(out, inner, interner);
                if wrap {
                    out.push(')');
                }
                out.push_str("[]");
            }
            Ty::Nullable(inner) => {
                self.write_type(out, inner, interner);
                out.push_str(" | undefined");
            }
            Ty::Class { name, .. } | Ty::Param(name) => out.push_str(interner.lookup(name)),
            Ty::BuiltIn(object) => out.push_str(object.name()),
        }
    }
}

impl Default for TypePool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
