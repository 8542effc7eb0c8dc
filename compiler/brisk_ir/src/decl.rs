//! Declarations: functions, classes, and resolved call signatures.

use crate::{Name, NodeId, Span, TypeId};

macro_rules! index_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
        #[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

index_newtype!(
    /// Index of a [`FunctionDecl`] in the program.
    FuncId
);
index_newtype!(
    /// Index of a [`ClassDecl`] in the program.
    ClassId
);
index_newtype!(
    /// Index of a resolved call [`Signature`] in the program.
    SignatureId
);

/// A declared function parameter.
#[derive(Clone, Debug)]
pub struct Param {
    pub name: Name,
    /// Declared type; may mention the function's type parameters.
    pub ty: TypeId,
    pub optional: bool,
    /// Rest parameter (`...xs: T[]`); `ty` is the array type.
    pub variadic: bool,
    /// Default-value expression, evaluated when the argument is omitted.
    pub default: Option<NodeId>,
    pub span: Span,
}

impl Param {
    /// A required positional parameter.
    pub fn required(name: Name, ty: TypeId) -> Self {
        Param {
            name,
            ty,
            optional: false,
            variadic: false,
            default: None,
            span: Span::DUMMY,
        }
    }

    /// An optional parameter with an optional default expression.
    pub fn optional(name: Name, ty: TypeId, default: Option<NodeId>) -> Self {
        Param {
            optional: true,
            default,
            ..Self::required(name, ty)
        }
    }

    /// A rest parameter collecting trailing arguments into `array_ty`.
    pub fn variadic(name: Name, array_ty: TypeId) -> Self {
        Param {
            variadic: true,
            ..Self::required(name, array_ty)
        }
    }
}

/// A function, method, or constructor declaration.
#[derive(Clone, Debug)]
pub struct FunctionDecl {
    pub name: Name,
    pub type_params: Vec<Name>,
    pub params: Vec<Param>,
    pub ret: TypeId,
    /// Body block. `None` for ambient (`declare function`) declarations.
    pub body: Option<NodeId>,
    /// Owning class for methods and constructors.
    pub owner: Option<ClassId>,
    pub is_static: bool,
    pub is_async: bool,
    pub exported: bool,
    pub span: Span,
}

impl FunctionDecl {
    /// A free, non-generic function with no body yet.
    pub fn new(name: Name, params: Vec<Param>, ret: TypeId) -> Self {
        FunctionDecl {
            name,
            type_params: Vec::new(),
            params,
            ret,
            body: None,
            owner: None,
            is_static: false,
            is_async: false,
            exported: false,
            span: Span::DUMMY,
        }
    }

    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }

    /// Methods and constructors that receive `this`.
    pub fn is_instance(&self) -> bool {
        self.owner.is_some() && !self.is_static
    }
}

/// A class field.
#[derive(Clone, Debug)]
pub struct FieldDecl {
    pub name: Name,
    pub ty: TypeId,
    pub span: Span,
}

/// A class declaration.
#[derive(Clone, Debug)]
pub struct ClassDecl {
    pub name: Name,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<FuncId>,
    pub constructor: Option<FuncId>,
    pub span: Span,
}

/// The front end's resolution of one call or construct expression.
///
/// Overload and generic resolution are already done: `func` is the selected
/// declaration and `type_args` binds its type parameters positionally.
#[derive(Clone, Debug)]
pub struct Signature {
    pub func: FuncId,
    pub type_args: Vec<TypeId>,
}
