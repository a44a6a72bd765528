//! Function signature model
//!
//! A `FunctionSignature` is the semantic shape of a declaration: the implicit
//! `self` parameter (when present), the declared parameters with their
//! conventions, and the result. Signatures are built from syntax plus the
//! enclosing-type context, and are the input of the lowering engine.

use crate::error::LoweringResult;
use crate::semantic::SymbolTable;
use crate::syntax::{FuncDeclSyntax, InitDeclSyntax, ParameterSyntax, VarDeclSyntax};
use crate::types::{NominalType, SwiftType};
use std::fmt;

/// How a value travels between caller and callee
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterConvention {
    ByValue,
    Inout,
    Direct,
}

/// One parameter of a signature
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub convention: ParameterConvention,
    pub argument_label: Option<String>,
    pub parameter_name: Option<String>,
    pub ty: SwiftType,
    /// Set on lowered parameters whose type passes through the C ABI as-is
    pub is_primitive: bool,
}

impl Parameter {
    /// A lowered by-value parameter carrying a synthesized name
    pub fn by_value(name: &str, ty: SwiftType) -> Self {
        Self {
            convention: ParameterConvention::ByValue,
            argument_label: None,
            parameter_name: Some(name.to_string()),
            ty,
            is_primitive: false,
        }
    }

    /// The name this parameter binds inside the thunk, with a positional
    /// fallback for wildcard parameters
    pub fn name_or_index(&self, index: usize) -> String {
        match &self.parameter_name {
            Some(name) => name.clone(),
            None => format!("_{}", index),
        }
    }
}

/// The result slot of a signature
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionResult {
    pub convention: ParameterConvention,
    pub ty: SwiftType,
}

impl FunctionResult {
    pub fn direct(ty: SwiftType) -> Self {
        Self {
            convention: ParameterConvention::Direct,
            ty,
        }
    }

    pub fn void() -> Self {
        Self::direct(SwiftType::void())
    }
}

/// Semantic signature of a function, initializer, or property accessor
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub is_static: bool,
    pub self_parameter: Option<Parameter>,
    pub parameters: Vec<Parameter>,
    pub result: FunctionResult,
}

impl FunctionSignature {
    /// Build the signature of a function declaration
    ///
    /// `self` is absent for free functions and for `static`/`class` methods;
    /// it is passed `inout` when the method is `mutating` on a value type.
    pub fn from_function(
        decl: &FuncDeclSyntax,
        enclosing: Option<&NominalType>,
        symbols: &SymbolTable,
    ) -> LoweringResult<Self> {
        let is_static = decl.is_static_or_class();
        let self_parameter = match enclosing {
            Some(enclosing) if !is_static => Some(self_parameter(enclosing, decl.is_mutating())),
            _ => None,
        };

        let result = match &decl.return_clause {
            Some(syntax) => FunctionResult::direct(symbols.resolve(syntax)?),
            None => FunctionResult::void(),
        };

        Ok(Self {
            is_static,
            self_parameter,
            parameters: build_parameters(&decl.parameters, symbols)?,
            result,
        })
    }

    /// Build the signature of an initializer
    ///
    /// Initializers construct the enclosing type: the result is the nominal
    /// itself and there is no `self`; the thunk calls the initializer through
    /// the type name.
    pub fn from_initializer(
        decl: &InitDeclSyntax,
        enclosing: &NominalType,
        symbols: &SymbolTable,
    ) -> LoweringResult<Self> {
        Ok(Self {
            is_static: true,
            self_parameter: None,
            parameters: build_parameters(&decl.parameters, symbols)?,
            result: FunctionResult::direct(SwiftType::Nominal(enclosing.clone())),
        })
    }

    /// Build the logical getter signature of a property binding
    ///
    /// A binding with no type annotation defaults its logical result to void.
    pub fn getter(
        decl: &VarDeclSyntax,
        enclosing: Option<&NominalType>,
        symbols: &SymbolTable,
    ) -> LoweringResult<Self> {
        let is_static = decl.is_static_or_class();
        let self_parameter = match enclosing {
            Some(enclosing) if !is_static => Some(self_parameter(enclosing, false)),
            _ => None,
        };
        let result = match &decl.annotation {
            Some(syntax) => FunctionResult::direct(symbols.resolve(syntax)?),
            None => FunctionResult::void(),
        };

        Ok(Self {
            is_static,
            self_parameter,
            parameters: Vec::new(),
            result,
        })
    }

    /// Build the mirrored setter signature of a settable property binding
    ///
    /// The new value arrives as a single unlabeled parameter; on value types
    /// the setter mutates `self`.
    pub fn setter(
        decl: &VarDeclSyntax,
        enclosing: Option<&NominalType>,
        symbols: &SymbolTable,
    ) -> LoweringResult<Self> {
        let is_static = decl.is_static_or_class();
        let self_parameter = match enclosing {
            Some(enclosing) if !is_static => Some(self_parameter(enclosing, true)),
            _ => None,
        };
        let ty = match &decl.annotation {
            Some(syntax) => symbols.resolve(syntax)?,
            None => SwiftType::void(),
        };

        Ok(Self {
            is_static,
            self_parameter,
            parameters: vec![Parameter {
                convention: ParameterConvention::ByValue,
                argument_label: None,
                parameter_name: Some("newValue".to_string()),
                ty,
                is_primitive: false,
            }],
            result: FunctionResult::void(),
        })
    }
}

fn self_parameter(enclosing: &NominalType, mutating: bool) -> Parameter {
    let is_value_type = !enclosing.decl.kind.is_reference();
    Parameter {
        convention: if mutating && is_value_type {
            ParameterConvention::Inout
        } else {
            ParameterConvention::ByValue
        },
        argument_label: None,
        parameter_name: Some("self".to_string()),
        ty: SwiftType::Nominal(enclosing.clone()),
        is_primitive: false,
    }
}

fn build_parameters(
    parameters: &[ParameterSyntax],
    symbols: &SymbolTable,
) -> LoweringResult<Vec<Parameter>> {
    parameters
        .iter()
        .map(|parameter| {
            Ok(Parameter {
                convention: if parameter.is_inout {
                    ParameterConvention::Inout
                } else {
                    ParameterConvention::ByValue
                },
                argument_label: parameter.argument_label.clone(),
                parameter_name: Some(parameter.name.clone()),
                ty: symbols.resolve(&parameter.ty)?,
                is_primitive: false,
            })
        })
        .collect()
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, parameter) in self.parameters.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: ", parameter.name_or_index(i))?;
            if parameter.convention == ParameterConvention::Inout {
                write!(f, "inout ")?;
            }
            write!(f, "{}", parameter.ty)?;
        }
        write!(f, ") -> {}", self.result.ty)
    }
}
