//! Static type to low-level type mapping.

use brisk_ir::{Span, Ty, TypeId, TypePool};

use crate::error::{CodegenError, CodegenResult};
use crate::ir::IrType;

/// Low-level representation of values of `ty`.
///
/// Every heap entity and every nullable value is a pointer.
pub fn ir_type(pool: &TypePool, ty: TypeId, span: Span) -> CodegenResult<IrType> {
    match pool.get(ty) {
        Ty::Int => Ok(IrType::I32),
        Ty::Number => Ok(IrType::F64),
        Ty::Boolean => Ok(IrType::I1),
        Ty::Void => Ok(IrType::Void),
        Ty::Array(_) | Ty::Nullable(_) | Ty::Class { .. } | Ty::BuiltIn(_) => Ok(IrType::Ptr),
        Ty::Param(_) => Err(CodegenError::internal(
            "unsubstituted type parameter reached code generation",
            span,
        )),
    }
}

#[cfg(test)]
mod tests {
    use brisk_ir::{BuiltinObject, Name};

    use super::*;

    #[test]
    fn primitives_map_to_scalars() {
        let pool = TypePool::new();
        assert_eq!(ir_type(&pool, TypeId::INT, Span::DUMMY), Ok(IrType::I32));
        assert_eq!(ir_type(&pool, TypeId::NUMBER, Span::DUMMY), Ok(IrType::F64));
        assert_eq!(ir_type(&pool, TypeId::BOOLEAN, Span::DUMMY), Ok(IrType::I1));
        assert_eq!(ir_type(&pool, TypeId::VOID, Span::DUMMY), Ok(IrType::Void));
    }

    #[test]
    fn references_and_nullables_are_pointers() {
        let pool = TypePool::new();
        let arr = pool.array(TypeId::INT);
        let opt = pool.nullable(TypeId::NUMBER);
        let math = pool.builtin(BuiltinObject::Math);
        for ty in [arr, opt, math] {
            assert_eq!(ir_type(&pool, ty, Span::DUMMY), Ok(IrType::Ptr));
        }
    }

    #[test]
    fn type_parameters_are_rejected() {
        let pool = TypePool::new();
        let t = pool.param(Name::from_raw(7));
        assert!(matches!(
            ir_type(&pool, t, Span::DUMMY),
            Err(CodegenError::Internal { .. })
        ));
    }
}
