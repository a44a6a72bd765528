//! Syntax tree surface consumed by the importer
//!
//! The bridge generator does not parse source itself. A parser (an external
//! collaborator) supplies declarations in this shape: declaration kind, name,
//! modifiers, parameter clauses with labels and `inout` marks, return
//! clauses, and leading trivia.

use crate::types::NominalKind;
use std::fmt;

/// A parsed source file handed to the declaration visitor
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFileSyntax {
    pub items: Vec<DeclSyntax>,
}

/// A declaration node
#[derive(Debug, Clone, PartialEq)]
pub enum DeclSyntax {
    Nominal(NominalDeclSyntax),
    Extension(ExtensionDeclSyntax),
    Function(FuncDeclSyntax),
    Initializer(InitDeclSyntax),
    Variable(VarDeclSyntax),
    Deinitializer,
}

/// A class, actor, struct, enum, or protocol declaration
#[derive(Debug, Clone, PartialEq)]
pub struct NominalDeclSyntax {
    pub kind: NominalKind,
    pub name: String,
    pub modifiers: Vec<DeclModifier>,
    pub members: Vec<DeclSyntax>,
}

/// An extension of a previously declared type
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionDeclSyntax {
    pub extended_type: TypeSyntax,
    pub members: Vec<DeclSyntax>,
}

/// A function declaration
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDeclSyntax {
    pub name: String,
    pub modifiers: Vec<DeclModifier>,
    pub parameters: Vec<ParameterSyntax>,
    pub return_clause: Option<TypeSyntax>,
    pub leading_trivia: Option<String>,
}

/// An initializer declaration
#[derive(Debug, Clone, PartialEq)]
pub struct InitDeclSyntax {
    pub modifiers: Vec<DeclModifier>,
    pub is_failable: bool,
    pub parameters: Vec<ParameterSyntax>,
    pub leading_trivia: Option<String>,
}

/// A property binding
///
/// A missing type annotation is tolerated here; the signature layer defaults
/// the logical result to void in that case.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclSyntax {
    pub name: String,
    pub modifiers: Vec<DeclModifier>,
    pub annotation: Option<TypeSyntax>,
    /// `let` bindings have no setter
    pub is_constant: bool,
    pub leading_trivia: Option<String>,
}

/// A declaration modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclModifier {
    Public,
    Static,
    Class,
    Mutating,
}

/// A single entry of a parameter clause
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSyntax {
    /// Call-site label; `None` when spelled `_`
    pub argument_label: Option<String>,
    pub name: String,
    pub ty: TypeSyntax,
    pub is_inout: bool,
}

/// A syntactic type, resolved against the symbol table during import
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSyntax {
    Identifier {
        name: String,
        generic_args: Vec<TypeSyntax>,
    },
    Tuple(Vec<TypeSyntax>),
    Metatype(Box<TypeSyntax>),
    Optional(Box<TypeSyntax>),
    Function {
        parameters: Vec<TypeSyntax>,
        result: Box<TypeSyntax>,
    },
}

impl TypeSyntax {
    /// A plain (non-generic) identifier type
    pub fn named(name: &str) -> Self {
        TypeSyntax::Identifier {
            name: name.to_string(),
            generic_args: Vec::new(),
        }
    }

    /// An identifier type with generic arguments
    pub fn generic(name: &str, args: Vec<TypeSyntax>) -> Self {
        TypeSyntax::Identifier {
            name: name.to_string(),
            generic_args: args,
        }
    }
}

impl DeclSyntax {
    pub fn modifiers(&self) -> &[DeclModifier] {
        match self {
            DeclSyntax::Nominal(decl) => &decl.modifiers,
            DeclSyntax::Function(decl) => &decl.modifiers,
            DeclSyntax::Initializer(decl) => &decl.modifiers,
            DeclSyntax::Variable(decl) => &decl.modifiers,
            DeclSyntax::Extension(_) | DeclSyntax::Deinitializer => &[],
        }
    }

    pub fn is_public(&self) -> bool {
        self.modifiers().contains(&DeclModifier::Public)
    }
}

impl FuncDeclSyntax {
    pub fn is_static_or_class(&self) -> bool {
        self.modifiers
            .iter()
            .any(|m| matches!(m, DeclModifier::Static | DeclModifier::Class))
    }

    pub fn is_mutating(&self) -> bool {
        self.modifiers.contains(&DeclModifier::Mutating)
    }
}

impl VarDeclSyntax {
    pub fn is_static_or_class(&self) -> bool {
        self.modifiers
            .iter()
            .any(|m| matches!(m, DeclModifier::Static | DeclModifier::Class))
    }
}

/// Extract a `MANGLED NAME: <string>` marker from leading trivia
///
/// Parsers carry the original symbol name for properties and functions as a
/// comment in leading trivia; the importer records it when present.
pub fn mangled_name_hint(trivia: &str) -> Option<&str> {
    for line in trivia.lines() {
        let line = line.trim_start_matches(|c: char| c == ' ' || c == '\t' || c == '/');
        if let Some(rest) = line.strip_prefix("MANGLED NAME: ") {
            let rest = rest.trim();
            if !rest.is_empty() {
                return Some(rest);
            }
        }
    }
    None
}

impl fmt::Display for TypeSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSyntax::Identifier { name, generic_args } => {
                write!(f, "{}", name)?;
                if !generic_args.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in generic_args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            TypeSyntax::Tuple(elements) => {
                write!(f, "(")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, ")")
            }
            TypeSyntax::Metatype(instance) => write!(f, "{}.Type", instance),
            TypeSyntax::Optional(inner) => write!(f, "{}?", inner),
            TypeSyntax::Function { parameters, result } => {
                write!(f, "(")?;
                for (i, parameter) in parameters.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", parameter)?;
                }
                write!(f, ") -> {}", result)
            }
        }
    }
}

impl fmt::Display for ParameterSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.argument_label {
            Some(label) if *label == self.name => write!(f, "{}: ", self.name)?,
            Some(label) => write!(f, "{} {}: ", label, self.name)?,
            None => write!(f, "_ {}: ", self.name)?,
        }
        if self.is_inout {
            write!(f, "inout ")?;
        }
        write!(f, "{}", self.ty)
    }
}
