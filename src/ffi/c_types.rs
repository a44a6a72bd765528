//! C type system and mapping from lowered Swift types
//!
//! Only the C-representable subset produced by the lowering engine is
//! mapped: primitives become fixed-width C types, `Int`/`UInt` become the
//! pointer-sized integers, raw pointers become `void*` (constness is not
//! tracked at the C level), and the empty tuple becomes `void`.

use crate::error::{LoweringError, LoweringResult};
use crate::types::SwiftType;
use std::fmt;

/// C type representation
#[derive(Debug, Clone, PartialEq)]
pub enum CType {
    Void,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    IntPtr,
    UIntPtr,
    Float,
    Double,
    Pointer(Box<CType>),
    // Never synthesized by the lowering engine; kept so parameter decay is
    // total over the type grammar.
    Array(Box<CType>, Option<usize>),
}

/// Map a lowered cdecl type to its C counterpart
pub fn swift_to_c_type(ty: &SwiftType) -> LoweringResult<CType> {
    match ty {
        SwiftType::Tuple(elements) if elements.is_empty() => Ok(CType::Void),

        SwiftType::Nominal(nominal) if nominal.decl.is_standard_library() => {
            let c_type = match nominal.decl.name.as_str() {
                "Bool" => CType::Bool,
                "Int8" => CType::Int8,
                "Int16" => CType::Int16,
                "Int32" => CType::Int32,
                "Int64" => CType::Int64,
                "UInt8" => CType::UInt8,
                "UInt16" => CType::UInt16,
                "UInt32" => CType::UInt32,
                "UInt64" => CType::UInt64,
                "Int" => CType::IntPtr,
                "UInt" => CType::UIntPtr,
                "Float" => CType::Float,
                "Double" => CType::Double,
                "UnsafeRawPointer" | "UnsafeMutableRawPointer" => {
                    CType::Pointer(Box::new(CType::Void))
                }
                _ => return Err(LoweringError::UnhandledType(ty.clone())),
            };
            Ok(c_type)
        }

        _ => Err(LoweringError::UnhandledType(ty.clone())),
    }
}

/// Apply C parameter decay
///
/// Arrays decay to pointers in parameter position. The lowering engine never
/// produces arrays; the rule is preserved for completeness.
pub fn parameter_decay(c_type: CType) -> CType {
    match c_type {
        CType::Array(element, _) => CType::Pointer(element),
        other => other,
    }
}

impl fmt::Display for CType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CType::Void => write!(f, "void"),
            CType::Bool => write!(f, "bool"),
            CType::Int8 => write!(f, "int8_t"),
            CType::Int16 => write!(f, "int16_t"),
            CType::Int32 => write!(f, "int32_t"),
            CType::Int64 => write!(f, "int64_t"),
            CType::UInt8 => write!(f, "uint8_t"),
            CType::UInt16 => write!(f, "uint16_t"),
            CType::UInt32 => write!(f, "uint32_t"),
            CType::UInt64 => write!(f, "uint64_t"),
            CType::IntPtr => write!(f, "intptr_t"),
            CType::UIntPtr => write!(f, "uintptr_t"),
            CType::Float => write!(f, "float"),
            CType::Double => write!(f, "double"),
            CType::Pointer(inner) => write!(f, "{}*", inner),
            CType::Array(element, Some(len)) => write!(f, "{}[{}]", element, len),
            CType::Array(element, None) => write!(f, "{}[]", element),
        }
    }
}
