//! Well-known standard library types
//!
//! Identifies the standard library nominals the lowering engine treats
//! specially: the primitive numerics, `Int`, and the raw/typed/buffer
//! pointer families.

use super::{NominalKind, NominalTypeDecl, SwiftType};
use std::collections::HashMap;
use std::sync::Arc;

/// Classification of a pointer-family nominal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerTraits {
    /// The nominal carries its element type as a generic argument
    pub requires_element_type: bool,
    /// Writes through the pointer are allowed
    pub mutable: bool,
    /// The nominal also carries an element count
    pub has_count: bool,
}

/// Classify a standard library pointer nominal by name
pub fn pointer_traits(name: &str) -> Option<PointerTraits> {
    let traits = match name {
        "UnsafeRawPointer" => PointerTraits {
            requires_element_type: false,
            mutable: false,
            has_count: false,
        },
        "UnsafeMutableRawPointer" => PointerTraits {
            requires_element_type: false,
            mutable: true,
            has_count: false,
        },
        "UnsafePointer" => PointerTraits {
            requires_element_type: true,
            mutable: false,
            has_count: false,
        },
        "UnsafeMutablePointer" => PointerTraits {
            requires_element_type: true,
            mutable: true,
            has_count: false,
        },
        "UnsafeBufferPointer" => PointerTraits {
            requires_element_type: true,
            mutable: false,
            has_count: true,
        },
        "UnsafeMutableBufferPointer" => PointerTraits {
            requires_element_type: true,
            mutable: true,
            has_count: true,
        },
        "UnsafeRawBufferPointer" => PointerTraits {
            requires_element_type: false,
            mutable: false,
            has_count: true,
        },
        "UnsafeMutableRawBufferPointer" => PointerTraits {
            requires_element_type: false,
            mutable: true,
            has_count: true,
        },
        _ => return None,
    };
    Some(traits)
}

/// Names of the primitive standard library types that survive lowering as-is
///
/// `Int` and `UInt` are pointer-sized on the host.
pub fn is_primitive(name: &str) -> bool {
    matches!(
        name,
        "Bool"
            | "Int"
            | "UInt"
            | "Int8"
            | "Int16"
            | "Int32"
            | "Int64"
            | "UInt8"
            | "UInt16"
            | "UInt32"
            | "UInt64"
            | "Float"
            | "Double"
    )
}

const KNOWN_TYPE_NAMES: &[&str] = &[
    "Bool",
    "Int",
    "UInt",
    "Int8",
    "Int16",
    "Int32",
    "Int64",
    "UInt8",
    "UInt16",
    "UInt32",
    "UInt64",
    "Float",
    "Double",
    "String",
    "UnsafeRawPointer",
    "UnsafeMutableRawPointer",
    "UnsafePointer",
    "UnsafeMutablePointer",
    "UnsafeBufferPointer",
    "UnsafeMutableBufferPointer",
    "UnsafeRawBufferPointer",
    "UnsafeMutableRawBufferPointer",
];

/// Registry of well-known standard library type declarations
///
/// Populated once at startup and read-only afterwards. Hands out shared
/// handles so every use of `Int` or `UnsafeRawPointer` refers to the same
/// declaration.
#[derive(Debug)]
pub struct KnownTypes {
    decls: HashMap<&'static str, Arc<NominalTypeDecl>>,
}

impl KnownTypes {
    pub fn new() -> Self {
        let mut decls = HashMap::new();
        for name in KNOWN_TYPE_NAMES {
            decls.insert(
                *name,
                Arc::new(NominalTypeDecl {
                    name: name.to_string(),
                    module_name: "Swift".to_string(),
                    parent: None,
                    kind: NominalKind::Struct,
                }),
            );
        }
        Self { decls }
    }

    /// Look up a well-known declaration by its standard library name
    pub fn get(&self, name: &str) -> Option<&Arc<NominalTypeDecl>> {
        self.decls.get(name)
    }

    /// The raw pointer type with the requested mutability
    pub fn raw_pointer(&self, mutable: bool) -> SwiftType {
        let name = if mutable {
            "UnsafeMutableRawPointer"
        } else {
            "UnsafeRawPointer"
        };
        SwiftType::nominal(&self.decls[name])
    }

    pub fn unsafe_raw_pointer(&self) -> SwiftType {
        self.raw_pointer(false)
    }

    /// The pointer-sized signed integer type
    pub fn int(&self) -> SwiftType {
        SwiftType::nominal(&self.decls["Int"])
    }
}

impl Default for KnownTypes {
    fn default() -> Self {
        Self::new()
    }
}
