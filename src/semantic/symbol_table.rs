//! Symbol table for type name resolution
//!
//! Maps syntactic type references to the canonical type model. User-declared
//! nominals of the module under import shadow standard library names.

use crate::error::{LoweringError, LoweringResult};
use crate::syntax::TypeSyntax;
use crate::types::{FunctionType, KnownTypes, NominalKind, NominalType, NominalTypeDecl, SwiftType};
use std::collections::HashMap;
use std::sync::Arc;

/// Flat registry of nominal declarations plus the well-known table
///
/// Owns every `NominalTypeDecl`; consumers hold shared handles into it.
#[derive(Debug)]
pub struct SymbolTable {
    module_name: String,
    known: KnownTypes,
    nominals: HashMap<String, Arc<NominalTypeDecl>>,
}

impl SymbolTable {
    /// Create a table for the named module, seeded with the well-known types
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            known: KnownTypes::new(),
            nominals: HashMap::new(),
        }
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn known(&self) -> &KnownTypes {
        &self.known
    }

    /// Register a top-level nominal declaration of the module under import
    pub fn declare(&mut self, name: &str, kind: NominalKind) -> Arc<NominalTypeDecl> {
        self.declare_nested(name, kind, None)
    }

    /// Register a nominal declaration nested inside `parent`
    pub fn declare_nested(
        &mut self,
        name: &str,
        kind: NominalKind,
        parent: Option<Arc<NominalTypeDecl>>,
    ) -> Arc<NominalTypeDecl> {
        let decl = Arc::new(NominalTypeDecl {
            name: name.to_string(),
            module_name: self.module_name.clone(),
            parent,
            kind,
        });
        self.nominals.insert(decl.qualified_name(), Arc::clone(&decl));
        decl
    }

    /// Look up a nominal by name: user declarations first, then the standard library
    pub fn lookup(&self, name: &str) -> Option<&Arc<NominalTypeDecl>> {
        self.nominals.get(name).or_else(|| self.known.get(name))
    }

    /// Resolve a syntactic type to the type model
    pub fn resolve(&self, syntax: &TypeSyntax) -> LoweringResult<SwiftType> {
        match syntax {
            TypeSyntax::Identifier { name, generic_args } => {
                if name == "Void" && generic_args.is_empty() {
                    return Ok(SwiftType::void());
                }
                let decl = self
                    .lookup(name)
                    .ok_or_else(|| LoweringError::UnresolvedType(name.clone()))?;
                let generic_args = generic_args
                    .iter()
                    .map(|arg| self.resolve(arg))
                    .collect::<LoweringResult<Vec<_>>>()?;
                Ok(SwiftType::Nominal(NominalType {
                    decl: Arc::clone(decl),
                    generic_args,
                }))
            }
            TypeSyntax::Tuple(elements) => {
                let elements = elements
                    .iter()
                    .map(|element| self.resolve(element))
                    .collect::<LoweringResult<Vec<_>>>()?;
                Ok(SwiftType::Tuple(elements))
            }
            TypeSyntax::Metatype(instance) => {
                Ok(SwiftType::Metatype(Box::new(self.resolve(instance)?)))
            }
            TypeSyntax::Optional(inner) => {
                Ok(SwiftType::Optional(Box::new(self.resolve(inner)?)))
            }
            TypeSyntax::Function { parameters, result } => {
                let parameters = parameters
                    .iter()
                    .map(|parameter| self.resolve(parameter))
                    .collect::<LoweringResult<Vec<_>>>()?;
                Ok(SwiftType::Function(FunctionType {
                    parameters,
                    result: Box::new(self.resolve(result)?),
                }))
            }
        }
    }
}
