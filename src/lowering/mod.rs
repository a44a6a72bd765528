//! Function signature lowering
//!
//! The type-directed transformation at the heart of the bridge generator:
//! every parameter and the result of a signature are flattened into
//! C-representable parameters (primitives, raw pointers, and counts), and a
//! conversion tree records how to reconstruct each original value inside the
//! synthesized entrypoint.

use crate::error::{LoweringError, LoweringResult};
use crate::signature::{FunctionResult, FunctionSignature, Parameter, ParameterConvention};
use crate::types::known::{is_primitive, pointer_traits};
use crate::types::{KnownTypes, NominalType, PointerTraits, SwiftType};

/// Field of a multi-parameter group produced from a single original parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentLabel {
    Pointer,
    Count,
}

impl ComponentLabel {
    /// Suffix appended to the original parameter name for this component
    pub fn suffix(&self) -> &'static str {
        match self {
            ComponentLabel::Pointer => "pointer",
            ComponentLabel::Count => "count",
        }
    }
}

/// An argument to a named-argument initializer reconstruction
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledArgument {
    pub label: Option<String>,
    pub argument: ConversionStep,
}

impl LabeledArgument {
    pub fn new(label: &str, argument: ConversionStep) -> Self {
        Self {
            label: Some(label.to_string()),
            argument,
        }
    }
}

/// How to rebuild one original value from its lowered parameters
///
/// A tree whose `Placeholder` and `ExplodedComponent` leaves stand for the
/// lowered parameters the value contributed, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionStep {
    /// The sole lowered value
    Placeholder,
    /// One field of a multi-parameter group (buffer pointers)
    ExplodedComponent(Box<ConversionStep>, ComponentLabel),
    /// Reinterpret a raw pointer as a typed pointer to the given type
    TypedPointer(Box<ConversionStep>, SwiftType),
    /// Dereference
    Pointee(Box<ConversionStep>),
    /// The reconstructed value is read through an indirect pointer
    PassIndirectly(Box<ConversionStep>),
    /// Reinterpret a reference-sized word as a reference of the given type
    UnsafeCastPointer(Box<ConversionStep>, SwiftType),
    /// Construct the given type through a named-argument initializer
    Initialize(SwiftType, Vec<LabeledArgument>),
    /// Build a tuple from element reconstructions
    Tuplify(Vec<ConversionStep>),
}

impl ConversionStep {
    /// Number of free `Placeholder`/`ExplodedComponent` leaves
    ///
    /// In a lowered signature this equals the number of lowered parameters
    /// the reconstructed value contributed.
    pub fn placeholder_count(&self) -> usize {
        match self {
            ConversionStep::Placeholder | ConversionStep::ExplodedComponent(_, _) => 1,
            ConversionStep::TypedPointer(inner, _)
            | ConversionStep::Pointee(inner)
            | ConversionStep::PassIndirectly(inner)
            | ConversionStep::UnsafeCastPointer(inner, _) => inner.placeholder_count(),
            ConversionStep::Initialize(_, arguments) => arguments
                .iter()
                .map(|argument| argument.argument.placeholder_count())
                .sum(),
            ConversionStep::Tuplify(elements) => elements
                .iter()
                .map(ConversionStep::placeholder_count)
                .sum(),
        }
    }

}

/// Lowering of one original parameter (or the result)
#[derive(Debug, Clone, PartialEq)]
pub struct LoweredParameters {
    pub conversion: ConversionStep,
    pub cdecl_parameters: Vec<Parameter>,
}

/// A fully lowered signature, ready for C projection and thunk assembly
#[derive(Debug, Clone, PartialEq)]
pub struct LoweredFunctionSignature {
    pub original: FunctionSignature,
    /// The flat C-compatible signature; never carries a `self` parameter
    pub cdecl: FunctionSignature,
    /// Per original parameter, in declaration order
    pub parameters: Vec<LoweredParameters>,
    /// Lowering of the implicit `self`, whose parameters sit at the end of
    /// the lowered parameter list
    pub self_parameter: Option<LoweredParameters>,
    pub result: LoweredParameters,
    /// The callee writes its result through a caller-provided pointer
    pub indirect_result: bool,
}

/// Type-directed signature lowering
///
/// Borrows the read-only well-known table; each invocation produces owned,
/// immutable records, so callers may shard declarations across threads.
pub struct LoweringEngine<'a> {
    known: &'a KnownTypes,
}

impl<'a> LoweringEngine<'a> {
    pub fn new(known: &'a KnownTypes) -> Self {
        Self { known }
    }

    /// Lower a full signature to its C-compatible form
    pub fn lower_function_signature(
        &self,
        signature: &FunctionSignature,
    ) -> LoweringResult<LoweredFunctionSignature> {
        let mut parameters = Vec::with_capacity(signature.parameters.len());
        for (index, parameter) in signature.parameters.iter().enumerate() {
            parameters.push(self.lower_parameter(
                &parameter.ty,
                parameter.convention,
                &parameter.name_or_index(index),
            )?);
        }

        // The result is first lowered as an ordinary by-value parameter; only
        // its shape decides between direct and indirect return.
        let lowered_result =
            self.lower_parameter(&signature.result.ty, ParameterConvention::ByValue, "_result")?;
        let direct_primitive = matches!(
            lowered_result.cdecl_parameters.as_slice(),
            [only] if only.is_primitive
        );
        let (result, indirect_result, cdecl_result_type) = if lowered_result.cdecl_parameters.is_empty()
        {
            (lowered_result, false, SwiftType::void())
        } else if direct_primitive {
            let result_type = lowered_result.cdecl_parameters[0].ty.clone();
            (lowered_result, false, result_type)
        } else {
            // Re-lower under inout so the storage pointer comes out mutable.
            let indirect =
                self.lower_parameter(&signature.result.ty, ParameterConvention::Inout, "_result")?;
            if indirect.cdecl_parameters.is_empty() {
                return Err(LoweringError::ImproperResultLowering);
            }
            (indirect, true, SwiftType::void())
        };

        let self_parameter = match &signature.self_parameter {
            Some(parameter) => {
                let name = parameter.parameter_name.as_deref().unwrap_or("self");
                Some(self.lower_parameter(&parameter.ty, parameter.convention, name)?)
            }
            None => None,
        };

        // Flat parameter list: original parameters, then the indirect-result
        // storage, then self.
        let mut cdecl_parameters: Vec<Parameter> = parameters
            .iter()
            .flat_map(|lowered| lowered.cdecl_parameters.iter().cloned())
            .collect();
        if indirect_result {
            cdecl_parameters.extend(result.cdecl_parameters.iter().cloned());
        }
        if let Some(lowered_self) = &self_parameter {
            cdecl_parameters.extend(lowered_self.cdecl_parameters.iter().cloned());
        }

        let cdecl = FunctionSignature {
            is_static: false,
            self_parameter: None,
            parameters: cdecl_parameters,
            result: FunctionResult::direct(cdecl_result_type),
        };

        Ok(LoweredFunctionSignature {
            original: signature.clone(),
            cdecl,
            parameters,
            self_parameter,
            result,
            indirect_result,
        })
    }

    /// Lower a single value of the given type and convention
    ///
    /// `name` seeds the synthesized parameter names; tuple elements append
    /// their index, pointer families their component suffix.
    pub fn lower_parameter(
        &self,
        ty: &SwiftType,
        convention: ParameterConvention,
        name: &str,
    ) -> LoweringResult<LoweredParameters> {
        match ty {
            SwiftType::Function(_) | SwiftType::Optional(_) => {
                Err(LoweringError::UnhandledType(ty.clone()))
            }

            SwiftType::Metatype(instance) => Ok(LoweredParameters {
                conversion: ConversionStep::UnsafeCastPointer(
                    Box::new(ConversionStep::Placeholder),
                    (**instance).clone(),
                ),
                cdecl_parameters: vec![Parameter::by_value(name, self.known.unsafe_raw_pointer())],
            }),

            SwiftType::Nominal(nominal) if nominal.decl.is_standard_library() => {
                if is_primitive(&nominal.decl.name) {
                    if convention == ParameterConvention::Inout {
                        return Err(LoweringError::InoutNotSupported(ty.clone()));
                    }
                    return Ok(LoweredParameters {
                        conversion: ConversionStep::Placeholder,
                        cdecl_parameters: vec![Parameter {
                            convention,
                            argument_label: None,
                            parameter_name: Some(name.to_string()),
                            ty: ty.clone(),
                            is_primitive: true,
                        }],
                    });
                }
                if let Some(traits) = pointer_traits(&nominal.decl.name) {
                    return self.lower_pointer_family(ty, nominal, traits, convention, name);
                }
                // Any other standard library nominal (String and friends)
                // lowers by the general nominal rule.
                self.lower_general_nominal(ty, nominal, convention, name)
            }

            SwiftType::Nominal(nominal) => self.lower_general_nominal(ty, nominal, convention, name),

            SwiftType::Tuple(elements) => {
                let mut steps = Vec::with_capacity(elements.len());
                let mut cdecl_parameters = Vec::new();
                for (index, element) in elements.iter().enumerate() {
                    let lowered =
                        self.lower_parameter(element, convention, &format!("{}_{}", name, index))?;
                    steps.push(lowered.conversion);
                    cdecl_parameters.extend(lowered.cdecl_parameters);
                }
                Ok(LoweredParameters {
                    conversion: ConversionStep::Tuplify(steps),
                    cdecl_parameters,
                })
            }
        }
    }

    /// Lower one of the raw/typed/buffer pointer nominals
    fn lower_pointer_family(
        &self,
        ty: &SwiftType,
        nominal: &NominalType,
        traits: PointerTraits,
        convention: ParameterConvention,
        name: &str,
    ) -> LoweringResult<LoweredParameters> {
        let element_type = if traits.requires_element_type {
            match nominal.generic_args.first() {
                Some(element) => Some(element.clone()),
                None => return Err(LoweringError::UnhandledType(ty.clone())),
            }
        } else {
            None
        };

        let component_name =
            |label: ComponentLabel| format!("{}_{}", name, label.suffix());
        let mut cdecl_parameters = vec![Parameter {
            convention,
            argument_label: None,
            parameter_name: Some(component_name(ComponentLabel::Pointer)),
            ty: self.known.raw_pointer(traits.mutable),
            is_primitive: false,
        }];
        if traits.has_count {
            cdecl_parameters.push(Parameter {
                convention,
                argument_label: None,
                parameter_name: Some(component_name(ComponentLabel::Count)),
                ty: self.known.int(),
                is_primitive: true,
            });
        }

        let pointer = ConversionStep::ExplodedComponent(
            Box::new(ConversionStep::Placeholder),
            ComponentLabel::Pointer,
        );
        let conversion = match (element_type, traits.has_count) {
            (None, false) => ConversionStep::Placeholder,
            (Some(element), false) => ConversionStep::TypedPointer(Box::new(pointer), element),
            (None, true) => ConversionStep::Initialize(
                ty.clone(),
                vec![
                    LabeledArgument::new("start", pointer),
                    LabeledArgument::new(
                        "count",
                        ConversionStep::ExplodedComponent(
                            Box::new(ConversionStep::Placeholder),
                            ComponentLabel::Count,
                        ),
                    ),
                ],
            ),
            (Some(element), true) => ConversionStep::Initialize(
                ty.clone(),
                vec![
                    LabeledArgument::new(
                        "start",
                        ConversionStep::TypedPointer(Box::new(pointer), element),
                    ),
                    LabeledArgument::new(
                        "count",
                        ConversionStep::ExplodedComponent(
                            Box::new(ConversionStep::Placeholder),
                            ComponentLabel::Count,
                        ),
                    ),
                ],
            ),
        };

        Ok(LoweredParameters {
            conversion,
            cdecl_parameters,
        })
    }

    /// Lower a user-declared (or non-special standard library) nominal
    ///
    /// Reference kinds travel as a single reference-sized word; value kinds
    /// travel as a pointer to their storage.
    fn lower_general_nominal(
        &self,
        ty: &SwiftType,
        nominal: &NominalType,
        convention: ParameterConvention,
        name: &str,
    ) -> LoweringResult<LoweredParameters> {
        let raw_pointer = self
            .known
            .raw_pointer(convention == ParameterConvention::Inout);

        let conversion = if nominal.decl.kind.is_reference() {
            ConversionStep::UnsafeCastPointer(Box::new(ConversionStep::Placeholder), ty.clone())
        } else {
            ConversionStep::PassIndirectly(Box::new(ConversionStep::Pointee(Box::new(
                ConversionStep::TypedPointer(Box::new(ConversionStep::Placeholder), ty.clone()),
            ))))
        };

        Ok(LoweredParameters {
            conversion,
            cdecl_parameters: vec![Parameter::by_value(name, raw_pointer)],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::SymbolTable;
    use crate::syntax::TypeSyntax;
    use crate::types::NominalKind;

    fn symbols() -> SymbolTable {
        let mut table = SymbolTable::new("Demo");
        table.declare("Point", NominalKind::Struct);
        table.declare("Counter", NominalKind::Class);
        table.declare("Job", NominalKind::Actor);
        table.declare("Direction", NominalKind::Enum);
        table
    }

    fn resolve(table: &SymbolTable, syntax: TypeSyntax) -> SwiftType {
        table.resolve(&syntax).unwrap()
    }

    #[test]
    fn test_primitive_parameter_passes_through() {
        let table = symbols();
        let engine = LoweringEngine::new(table.known());
        let int32 = resolve(&table, TypeSyntax::named("Int32"));

        let lowered = engine
            .lower_parameter(&int32, ParameterConvention::ByValue, "x")
            .unwrap();
        assert_eq!(lowered.conversion, ConversionStep::Placeholder);
        assert_eq!(lowered.cdecl_parameters.len(), 1);
        assert!(lowered.cdecl_parameters[0].is_primitive);
        assert_eq!(lowered.cdecl_parameters[0].ty, int32);
    }

    #[test]
    fn test_inout_primitive_is_rejected() {
        let table = symbols();
        let engine = LoweringEngine::new(table.known());
        let int32 = resolve(&table, TypeSyntax::named("Int32"));

        assert_eq!(
            engine.lower_parameter(&int32, ParameterConvention::Inout, "x"),
            Err(LoweringError::InoutNotSupported(int32))
        );
    }

    #[test]
    fn test_function_and_optional_are_rejected() {
        let table = symbols();
        let engine = LoweringEngine::new(table.known());

        let optional = resolve(
            &table,
            TypeSyntax::Optional(Box::new(TypeSyntax::named("Int32"))),
        );
        assert!(matches!(
            engine.lower_parameter(&optional, ParameterConvention::ByValue, "x"),
            Err(LoweringError::UnhandledType(_))
        ));

        let function = resolve(
            &table,
            TypeSyntax::Function {
                parameters: vec![TypeSyntax::named("Int32")],
                result: Box::new(TypeSyntax::named("Bool")),
            },
        );
        assert!(matches!(
            engine.lower_parameter(&function, ParameterConvention::ByValue, "f"),
            Err(LoweringError::UnhandledType(_))
        ));
    }

    #[test]
    fn test_metatype_lowering() {
        let table = symbols();
        let engine = LoweringEngine::new(table.known());
        let point = resolve(&table, TypeSyntax::named("Point"));
        let meta = SwiftType::Metatype(Box::new(point.clone()));

        let lowered = engine
            .lower_parameter(&meta, ParameterConvention::ByValue, "ty")
            .unwrap();
        assert_eq!(
            lowered.conversion,
            ConversionStep::UnsafeCastPointer(Box::new(ConversionStep::Placeholder), point)
        );
        assert_eq!(
            format!("{}", lowered.cdecl_parameters[0].ty),
            "UnsafeRawPointer"
        );
    }

    #[test]
    fn test_typed_pointer_lowering() {
        let table = symbols();
        let engine = LoweringEngine::new(table.known());
        let pointer = resolve(
            &table,
            TypeSyntax::generic("UnsafeMutablePointer", vec![TypeSyntax::named("Int32")]),
        );

        let lowered = engine
            .lower_parameter(&pointer, ParameterConvention::ByValue, "p")
            .unwrap();
        assert_eq!(lowered.cdecl_parameters.len(), 1);
        assert_eq!(
            lowered.cdecl_parameters[0].parameter_name.as_deref(),
            Some("p_pointer")
        );
        assert_eq!(
            format!("{}", lowered.cdecl_parameters[0].ty),
            "UnsafeMutableRawPointer"
        );

        let int32 = resolve(&table, TypeSyntax::named("Int32"));
        assert_eq!(
            lowered.conversion,
            ConversionStep::TypedPointer(
                Box::new(ConversionStep::ExplodedComponent(
                    Box::new(ConversionStep::Placeholder),
                    ComponentLabel::Pointer,
                )),
                int32,
            )
        );
    }

    #[test]
    fn test_typed_pointer_without_element_is_rejected() {
        let table = symbols();
        let engine = LoweringEngine::new(table.known());
        let bare = resolve(&table, TypeSyntax::named("UnsafePointer"));
        assert!(matches!(
            engine.lower_parameter(&bare, ParameterConvention::ByValue, "p"),
            Err(LoweringError::UnhandledType(_))
        ));
    }

    #[test]
    fn test_buffer_pointer_explodes_into_two_parameters() {
        let table = symbols();
        let engine = LoweringEngine::new(table.known());
        let buffer = resolve(
            &table,
            TypeSyntax::generic("UnsafeBufferPointer", vec![TypeSyntax::named("Int32")]),
        );

        let lowered = engine
            .lower_parameter(&buffer, ParameterConvention::ByValue, "b")
            .unwrap();
        assert_eq!(lowered.cdecl_parameters.len(), 2);
        assert_eq!(
            lowered.cdecl_parameters[0].parameter_name.as_deref(),
            Some("b_pointer")
        );
        assert_eq!(
            format!("{}", lowered.cdecl_parameters[0].ty),
            "UnsafeRawPointer"
        );
        assert_eq!(
            lowered.cdecl_parameters[1].parameter_name.as_deref(),
            Some("b_count")
        );
        assert_eq!(format!("{}", lowered.cdecl_parameters[1].ty), "Int");
        assert!(lowered.cdecl_parameters[1].is_primitive);

        match &lowered.conversion {
            ConversionStep::Initialize(ty, arguments) => {
                assert_eq!(format!("{}", ty), "UnsafeBufferPointer<Int32>");
                assert_eq!(arguments.len(), 2);
                assert_eq!(arguments[0].label.as_deref(), Some("start"));
                assert!(matches!(
                    arguments[0].argument,
                    ConversionStep::TypedPointer(_, _)
                ));
                assert_eq!(arguments[1].label.as_deref(), Some("count"));
                assert_eq!(
                    arguments[1].argument,
                    ConversionStep::ExplodedComponent(
                        Box::new(ConversionStep::Placeholder),
                        ComponentLabel::Count,
                    )
                );
            }
            other => panic!("Expected initializer reconstruction, got {:?}", other),
        }
    }

    #[test]
    fn test_raw_buffer_pointer_initializes_without_typed_pointer() {
        let table = symbols();
        let engine = LoweringEngine::new(table.known());
        let buffer = resolve(&table, TypeSyntax::named("UnsafeMutableRawBufferPointer"));

        let lowered = engine
            .lower_parameter(&buffer, ParameterConvention::ByValue, "b")
            .unwrap();
        assert_eq!(lowered.cdecl_parameters.len(), 2);
        assert_eq!(
            format!("{}", lowered.cdecl_parameters[0].ty),
            "UnsafeMutableRawPointer"
        );
        match &lowered.conversion {
            ConversionStep::Initialize(_, arguments) => {
                assert_eq!(
                    arguments[0].argument,
                    ConversionStep::ExplodedComponent(
                        Box::new(ConversionStep::Placeholder),
                        ComponentLabel::Pointer,
                    )
                );
            }
            other => panic!("Expected initializer reconstruction, got {:?}", other),
        }
    }

    #[test]
    fn test_class_lowering_is_reference_cast() {
        let table = symbols();
        let engine = LoweringEngine::new(table.known());
        let counter = resolve(&table, TypeSyntax::named("Counter"));

        let lowered = engine
            .lower_parameter(&counter, ParameterConvention::ByValue, "c")
            .unwrap();
        assert_eq!(
            lowered.conversion,
            ConversionStep::UnsafeCastPointer(
                Box::new(ConversionStep::Placeholder),
                counter.clone()
            )
        );
        assert_eq!(
            format!("{}", lowered.cdecl_parameters[0].ty),
            "UnsafeRawPointer"
        );

        // Actors lower the same way.
        let job = resolve(&table, TypeSyntax::named("Job"));
        let lowered = engine
            .lower_parameter(&job, ParameterConvention::ByValue, "j")
            .unwrap();
        assert!(matches!(
            lowered.conversion,
            ConversionStep::UnsafeCastPointer(_, _)
        ));
    }

    #[test]
    fn test_value_nominal_lowering_is_indirect() {
        let table = symbols();
        let engine = LoweringEngine::new(table.known());
        let point = resolve(&table, TypeSyntax::named("Point"));

        let lowered = engine
            .lower_parameter(&point, ParameterConvention::ByValue, "p")
            .unwrap();
        assert_eq!(
            lowered.conversion,
            ConversionStep::PassIndirectly(Box::new(ConversionStep::Pointee(Box::new(
                ConversionStep::TypedPointer(Box::new(ConversionStep::Placeholder), point.clone())
            ))))
        );
        assert_eq!(
            format!("{}", lowered.cdecl_parameters[0].ty),
            "UnsafeRawPointer"
        );

        // Inout storage must come back mutable.
        let lowered = engine
            .lower_parameter(&point, ParameterConvention::Inout, "p")
            .unwrap();
        assert_eq!(
            format!("{}", lowered.cdecl_parameters[0].ty),
            "UnsafeMutableRawPointer"
        );
        // The synthesized parameter itself is by-value: it carries an address.
        assert_eq!(
            lowered.cdecl_parameters[0].convention,
            ParameterConvention::ByValue
        );

        // Enums are value types too.
        let direction = resolve(&table, TypeSyntax::named("Direction"));
        let lowered = engine
            .lower_parameter(&direction, ParameterConvention::ByValue, "d")
            .unwrap();
        assert!(matches!(
            lowered.conversion,
            ConversionStep::PassIndirectly(_)
        ));
    }

    #[test]
    fn test_tuple_flattening() {
        let table = symbols();
        let engine = LoweringEngine::new(table.known());
        let tuple = resolve(
            &table,
            TypeSyntax::Tuple(vec![
                TypeSyntax::named("Int32"),
                TypeSyntax::generic("UnsafeBufferPointer", vec![TypeSyntax::named("Double")]),
            ]),
        );

        let lowered = engine
            .lower_parameter(&tuple, ParameterConvention::ByValue, "pair")
            .unwrap();
        let names: Vec<_> = lowered
            .cdecl_parameters
            .iter()
            .map(|parameter| parameter.parameter_name.clone().unwrap())
            .collect();
        assert_eq!(names, vec!["pair_0", "pair_1_pointer", "pair_1_count"]);

        match &lowered.conversion {
            ConversionStep::Tuplify(elements) => {
                assert_eq!(elements.len(), 2);
                assert_eq!(elements[0], ConversionStep::Placeholder);
                assert!(matches!(elements[1], ConversionStep::Initialize(_, _)));
            }
            other => panic!("Expected tuple reconstruction, got {:?}", other),
        }
    }

    #[test]
    fn test_placeholder_count_matches_contributed_parameters() {
        let table = symbols();
        let engine = LoweringEngine::new(table.known());

        for syntax in [
            TypeSyntax::named("Int32"),
            TypeSyntax::named("Point"),
            TypeSyntax::named("Counter"),
            TypeSyntax::generic("UnsafePointer", vec![TypeSyntax::named("Int32")]),
            TypeSyntax::generic("UnsafeMutableBufferPointer", vec![TypeSyntax::named("Double")]),
            TypeSyntax::named("UnsafeRawBufferPointer"),
            TypeSyntax::Tuple(vec![
                TypeSyntax::named("Int32"),
                TypeSyntax::generic("UnsafeBufferPointer", vec![TypeSyntax::named("Double")]),
                TypeSyntax::named("Point"),
            ]),
        ] {
            let ty = resolve(&table, syntax);
            let lowered = engine
                .lower_parameter(&ty, ParameterConvention::ByValue, "v")
                .unwrap();
            assert_eq!(
                lowered.conversion.placeholder_count(),
                lowered.cdecl_parameters.len(),
                "leaf/parameter mismatch for {}",
                ty
            );
        }
    }
}
