//! Type model for imported Swift declarations
//!
//! Defines the canonical representation of Swift types used throughout the
//! bridge generator: references to nominal declarations, tuples, metatypes,
//! function types, and optionals.

use std::fmt;
use std::sync::Arc;

pub mod known;

pub use known::{KnownTypes, PointerTraits};

/// Kind of a nominal type declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NominalKind {
    Class,
    Actor,
    Struct,
    Enum,
    Protocol,
}

impl NominalKind {
    /// Whether instances are passed as a single reference-sized word
    pub fn is_reference(&self) -> bool {
        matches!(self, NominalKind::Class | NominalKind::Actor)
    }
}

/// A declared nominal type (class, actor, struct, enum, or protocol)
///
/// Declarations are owned by the symbol table; consumers share them by
/// handle. Nesting is expressed through the `parent` chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NominalTypeDecl {
    pub name: String,
    pub module_name: String,
    pub parent: Option<Arc<NominalTypeDecl>>,
    pub kind: NominalKind,
}

impl NominalTypeDecl {
    /// Dotted name of this declaration within its module, e.g. `Outer.Inner`
    pub fn qualified_name(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{}.{}", parent.qualified_name(), self.name),
            None => self.name.clone(),
        }
    }

    /// Whether this declaration is a top-level standard library type
    pub fn is_standard_library(&self) -> bool {
        self.module_name == "Swift" && self.parent.is_none()
    }
}

/// A use of a nominal type, with any generic arguments applied
#[derive(Debug, Clone, PartialEq)]
pub struct NominalType {
    pub decl: Arc<NominalTypeDecl>,
    pub generic_args: Vec<SwiftType>,
}

impl NominalType {
    pub fn new(decl: Arc<NominalTypeDecl>) -> Self {
        Self {
            decl,
            generic_args: Vec::new(),
        }
    }
}

/// A function type, e.g. `(Int32) -> Bool`
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionType {
    pub parameters: Vec<SwiftType>,
    pub result: Box<SwiftType>,
}

/// Swift type representation
///
/// The empty tuple is the canonical spelling of `Void`. Function and
/// optional types are representable but rejected by the lowering engine.
#[derive(Debug, Clone, PartialEq)]
pub enum SwiftType {
    Nominal(NominalType),
    Tuple(Vec<SwiftType>),
    Metatype(Box<SwiftType>),
    Function(FunctionType),
    Optional(Box<SwiftType>),
}

impl SwiftType {
    /// The void type, spelled as the empty tuple
    pub fn void() -> Self {
        SwiftType::Tuple(Vec::new())
    }

    pub fn is_void(&self) -> bool {
        matches!(self, SwiftType::Tuple(elements) if elements.is_empty())
    }

    /// A plain (non-generic) reference to a nominal declaration
    pub fn nominal(decl: &Arc<NominalTypeDecl>) -> Self {
        SwiftType::Nominal(NominalType::new(Arc::clone(decl)))
    }

    pub fn as_nominal(&self) -> Option<&NominalType> {
        match self {
            SwiftType::Nominal(nominal) => Some(nominal),
            _ => None,
        }
    }
}

impl fmt::Display for NominalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.decl.qualified_name())?;
        if !self.generic_args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.generic_args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

impl fmt::Display for SwiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwiftType::Nominal(nominal) => write!(f, "{}", nominal),
            SwiftType::Tuple(elements) => {
                write!(f, "(")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, ")")
            }
            SwiftType::Metatype(instance) => write!(f, "{}.Type", instance),
            SwiftType::Function(function) => {
                write!(f, "(")?;
                for (i, parameter) in function.parameters.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", parameter)?;
                }
                write!(f, ") -> {}", function.result)
            }
            SwiftType::Optional(inner) => match inner.as_ref() {
                SwiftType::Function(_) => write!(f, "({})?", inner),
                _ => write!(f, "{}?", inner),
            },
        }
    }
}
