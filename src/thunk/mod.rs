//! Thunk body assembly
//!
//! Builds the expression that calls the original declaration from inside the
//! synthesized C-ABI entrypoint. Conversion trees from the lowering engine
//! are rendered against the entrypoint's parameter names, the receiver is
//! reconstructed when the declaration has one, and the return mode picks
//! between a plain call, a direct return, and an indirect store.

use crate::lowering::{ConversionStep, LoweredFunctionSignature, LoweredParameters};
use crate::signature::{Parameter, ParameterConvention};
use crate::types::SwiftType;
use std::fmt;
use std::slice;

/// A labeled call argument
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledExpr {
    pub label: Option<String>,
    pub expr: ThunkExpr,
}

/// An expression inside a thunk body
#[derive(Debug, Clone, PartialEq)]
pub enum ThunkExpr {
    /// A bound parameter or type name
    Name(String),
    /// Member access, `base.name`
    Member(Box<ThunkExpr>, String),
    /// A call with labeled arguments
    Call {
        callee: Box<ThunkExpr>,
        arguments: Vec<LabeledExpr>,
    },
    /// `&value`, passing the address of a reconstructed value
    AddressOf(Box<ThunkExpr>),
    /// A tuple literal
    Tuple(Vec<ThunkExpr>),
    /// Reinterpret a reference-sized word, `unsafeBitCast(value, to: T.self)`
    CastPointer {
        value: Box<ThunkExpr>,
        target: SwiftType,
    },
    /// Rebind a raw pointer, `value.assumingMemoryBound(to: T.self)`
    BindMemory {
        value: Box<ThunkExpr>,
        pointee: SwiftType,
    },
}

/// The single statement forming a thunk body
#[derive(Debug, Clone, PartialEq)]
pub enum ThunkBody {
    /// Call for effect; both the entrypoint and the callee return nothing
    Call(ThunkExpr),
    /// Direct return of a primitive value
    Return(ThunkExpr),
    /// Assignment: an indirect result store, or a property setter
    Assign { target: ThunkExpr, value: ThunkExpr },
}

/// Render a conversion tree against the lowered parameters it consumes
///
/// Each `Placeholder` and `ExplodedComponent` leaf binds the next lowered
/// parameter's name: the leaves of a conversion correspond one-to-one, in
/// order, with the parameters its lowering contributed. The result is a
/// value-position expression: indirection markers are peeled at every
/// nesting level, including inside tuple and initializer reconstructions.
/// Rendering never mutates the tree, so repeated renderings yield identical
/// expressions.
pub fn render_step(step: &ConversionStep, parameters: &[Parameter]) -> ThunkExpr {
    let mut leaves = parameters.iter();
    render_with(step, &mut leaves)
}

/// Render the reconstruction of one lowered value
pub fn render_lowered(lowered: &LoweredParameters) -> ThunkExpr {
    render_step(&lowered.conversion, &lowered.cdecl_parameters)
}

fn render_with(step: &ConversionStep, leaves: &mut slice::Iter<'_, Parameter>) -> ThunkExpr {
    match step {
        // Leaves bind cdecl parameter names; lowering synthesizes a name for
        // every parameter it emits.
        ConversionStep::Placeholder | ConversionStep::ExplodedComponent(_, _) => {
            let parameter = leaves.next().expect("conversion leaf without a lowered parameter");
            ThunkExpr::Name(parameter.parameter_name.clone().unwrap_or_default())
        }
        ConversionStep::TypedPointer(inner, pointee) => ThunkExpr::BindMemory {
            value: Box::new(render_with(inner, leaves)),
            pointee: pointee.clone(),
        },
        ConversionStep::Pointee(inner) => {
            ThunkExpr::Member(Box::new(render_with(inner, leaves)), "pointee".to_string())
        }
        // The marker only flags how the value is read; the address-of itself
        // is applied by the assembler where the callee expects inout storage.
        ConversionStep::PassIndirectly(inner) => render_with(inner, leaves),
        ConversionStep::UnsafeCastPointer(inner, target) => ThunkExpr::CastPointer {
            value: Box::new(render_with(inner, leaves)),
            target: target.clone(),
        },
        ConversionStep::Initialize(ty, arguments) => ThunkExpr::Call {
            callee: Box::new(ThunkExpr::Name(format!("{}", ty))),
            arguments: arguments
                .iter()
                .map(|argument| LabeledExpr {
                    label: argument.label.clone(),
                    expr: render_with(&argument.argument, leaves),
                })
                .collect(),
        },
        ConversionStep::Tuplify(elements) => ThunkExpr::Tuple(
            elements
                .iter()
                .map(|element| render_with(element, leaves))
                .collect(),
        ),
    }
}

/// Render an argument for an `inout` parameter: the address of the
/// reconstructed value
fn render_inout(lowered: &LoweredParameters) -> ThunkExpr {
    match &lowered.conversion {
        ConversionStep::PassIndirectly(inner) => {
            ThunkExpr::AddressOf(Box::new(render_step(inner, &lowered.cdecl_parameters)))
        }
        step => render_step(step, &lowered.cdecl_parameters),
    }
}

/// Assemble the body of the entrypoint calling `callee`
///
/// `callee` is the declaration's simple name for methods and free functions
/// (already qualified by the caller for static members and initializers);
/// the receiver expression is prefixed when the original has a `self`.
pub fn assemble_call(lowered: &LoweredFunctionSignature, callee: &str) -> ThunkBody {
    let mut arguments = Vec::with_capacity(lowered.original.parameters.len());
    for (parameter, lowered_parameter) in lowered.original.parameters.iter().zip(&lowered.parameters)
    {
        // Only an argument the callee takes `inout` is passed by address;
        // by-value arguments read the value.
        let expr = if parameter.convention == ParameterConvention::Inout {
            render_inout(lowered_parameter)
        } else {
            render_lowered(lowered_parameter)
        };
        arguments.push(LabeledExpr {
            label: parameter.argument_label.clone(),
            expr,
        });
    }

    let call = ThunkExpr::Call {
        callee: Box::new(callee_expr(lowered, callee)),
        arguments,
    };

    finish_body(lowered, call)
}

/// Assemble the body of a property getter entrypoint
///
/// The accessed value is a member read (`self.x`), or a plain name read for
/// static and module-scope accessors where `callee` arrives qualified.
pub fn assemble_getter(lowered: &LoweredFunctionSignature, callee: &str) -> ThunkBody {
    finish_body(lowered, callee_expr(lowered, callee))
}

/// Assemble the body of a property setter entrypoint
pub fn assemble_setter(lowered: &LoweredFunctionSignature, callee: &str) -> ThunkBody {
    ThunkBody::Assign {
        target: callee_expr(lowered, callee),
        value: render_lowered(&lowered.parameters[0]),
    }
}

/// The called or accessed name, prefixed with the reconstructed receiver
/// when the original declaration has a `self`
fn callee_expr(lowered: &LoweredFunctionSignature, callee: &str) -> ThunkExpr {
    match &lowered.self_parameter {
        Some(lowered_self) => {
            ThunkExpr::Member(Box::new(render_lowered(lowered_self)), callee.to_string())
        }
        None => ThunkExpr::Name(callee.to_string()),
    }
}

/// Pick the return mode for a reconstructed value or call
fn finish_body(lowered: &LoweredFunctionSignature, value: ThunkExpr) -> ThunkBody {
    if lowered.indirect_result {
        ThunkBody::Assign {
            target: render_lowered(&lowered.result),
            value,
        }
    } else if lowered.original.result.ty.is_void() {
        ThunkBody::Call(value)
    } else {
        ThunkBody::Return(value)
    }
}

/// Print the complete C-ABI entrypoint for a lowered declaration
pub fn render_thunk(symbol: &str, lowered: &LoweredFunctionSignature, body: &ThunkBody) -> String {
    let mut text = format!("@_cdecl(\"{}\")\npublic func {}(", symbol, symbol);
    for (index, parameter) in lowered.cdecl.parameters.iter().enumerate() {
        if index > 0 {
            text.push_str(", ");
        }
        text.push_str(&format!(
            "_ {}: {}",
            parameter.name_or_index(index),
            parameter.ty
        ));
    }
    text.push(')');
    if !lowered.cdecl.result.ty.is_void() {
        text.push_str(&format!(" -> {}", lowered.cdecl.result.ty));
    }
    text.push_str(&format!(" {{\n    {}\n}}", body));
    text
}

impl fmt::Display for ThunkExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThunkExpr::Name(name) => write!(f, "{}", name),
            ThunkExpr::Member(base, name) => write!(f, "{}.{}", base, name),
            ThunkExpr::Call { callee, arguments } => {
                write!(f, "{}(", callee)?;
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if let Some(label) = &argument.label {
                        write!(f, "{}: ", label)?;
                    }
                    write!(f, "{}", argument.expr)?;
                }
                write!(f, ")")
            }
            ThunkExpr::AddressOf(inner) => write!(f, "&{}", inner),
            ThunkExpr::Tuple(elements) => {
                write!(f, "(")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, ")")
            }
            ThunkExpr::CastPointer { value, target } => {
                write!(f, "unsafeBitCast({}, to: {}.self)", value, target)
            }
            ThunkExpr::BindMemory { value, pointee } => {
                write!(f, "{}.assumingMemoryBound(to: {}.self)", value, pointee)
            }
        }
    }
}

impl fmt::Display for ThunkBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThunkBody::Call(call) => write!(f, "{}", call),
            ThunkBody::Return(call) => write!(f, "return {}", call),
            ThunkBody::Assign { target, value } => write!(f, "{} = {}", target, value),
        }
    }
}
