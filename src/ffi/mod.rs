//! C declaration projection
//!
//! Maps a lowered, still Swift-typed cdecl signature to a pure C function
//! declaration that a host runtime's foreign-function layer can bind.

pub mod c_types;

use crate::error::LoweringResult;
use crate::lowering::LoweredFunctionSignature;
use std::fmt;

pub use c_types::{parameter_decay, swift_to_c_type, CType};

/// Parameter of a C function declaration
#[derive(Debug, Clone, PartialEq)]
pub struct CParameter {
    pub name: String,
    pub c_type: CType,
}

/// A C function declaration mirroring a lowered cdecl signature
#[derive(Debug, Clone, PartialEq)]
pub struct CFunction {
    pub name: String,
    pub result_type: CType,
    pub parameters: Vec<CParameter>,
    pub is_variadic: bool,
}

/// Project a lowered signature to the C declaration of its entrypoint
pub fn project_function(
    name: &str,
    lowered: &LoweredFunctionSignature,
) -> LoweringResult<CFunction> {
    let parameters = lowered
        .cdecl
        .parameters
        .iter()
        .enumerate()
        .map(|(index, parameter)| {
            Ok(CParameter {
                name: parameter.name_or_index(index),
                c_type: parameter_decay(swift_to_c_type(&parameter.ty)?),
            })
        })
        .collect::<LoweringResult<Vec<_>>>()?;

    Ok(CFunction {
        name: name.to_string(),
        result_type: swift_to_c_type(&lowered.cdecl.result.ty)?,
        parameters,
        is_variadic: false,
    })
}

impl fmt::Display for CFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}(", self.result_type, self.name)?;
        if self.parameters.is_empty() && !self.is_variadic {
            write!(f, "void")?;
        } else {
            for (i, parameter) in self.parameters.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{} {}", parameter.c_type, parameter.name)?;
            }
            if self.is_variadic {
                write!(f, ", ...")?;
            }
        }
        write!(f, ");")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lowering::LoweringEngine;
    use crate::semantic::SymbolTable;
    use crate::signature::{FunctionResult, FunctionSignature, Parameter, ParameterConvention};
    use crate::syntax::TypeSyntax;

    fn signature_of(table: &SymbolTable, parameters: Vec<(&str, TypeSyntax)>, result: Option<TypeSyntax>) -> FunctionSignature {
        FunctionSignature {
            is_static: false,
            self_parameter: None,
            parameters: parameters
                .into_iter()
                .map(|(name, syntax)| Parameter {
                    convention: ParameterConvention::ByValue,
                    argument_label: None,
                    parameter_name: Some(name.to_string()),
                    ty: table.resolve(&syntax).unwrap(),
                    is_primitive: false,
                })
                .collect(),
            result: match result {
                Some(syntax) => FunctionResult::direct(table.resolve(&syntax).unwrap()),
                None => FunctionResult::void(),
            },
        }
    }

    #[test]
    fn test_project_primitive_function() {
        let table = SymbolTable::new("Demo");
        let engine = LoweringEngine::new(table.known());
        let signature = signature_of(
            &table,
            vec![("x", TypeSyntax::named("Int32")), ("y", TypeSyntax::named("Int32"))],
            Some(TypeSyntax::named("Int32")),
        );
        let lowered = engine.lower_function_signature(&signature).unwrap();

        let c_function = project_function("add_c", &lowered).unwrap();
        assert_eq!(
            format!("{}", c_function),
            "int32_t add_c(int32_t x, int32_t y);"
        );
    }

    #[test]
    fn test_project_buffer_function() {
        let table = SymbolTable::new("Demo");
        let engine = LoweringEngine::new(table.known());
        let signature = signature_of(
            &table,
            vec![(
                "b",
                TypeSyntax::generic("UnsafeBufferPointer", vec![TypeSyntax::named("Int32")]),
            )],
            Some(TypeSyntax::named("Int")),
        );
        let lowered = engine.lower_function_signature(&signature).unwrap();

        let c_function = project_function("sum_c", &lowered).unwrap();
        assert_eq!(
            format!("{}", c_function),
            "intptr_t sum_c(void* b_pointer, intptr_t b_count);"
        );
    }

    #[test]
    fn test_project_void_function() {
        let table = SymbolTable::new("Demo");
        let engine = LoweringEngine::new(table.known());
        let signature = signature_of(&table, vec![], None);
        let lowered = engine.lower_function_signature(&signature).unwrap();

        let c_function = project_function("run_c", &lowered).unwrap();
        assert_eq!(format!("{}", c_function), "void run_c(void);");
    }
}
