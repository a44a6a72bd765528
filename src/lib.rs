//! Bridgegen: C-ABI bridge generation for Swift declarations
//!
//! This crate extracts the public types, functions, initializers, and
//! properties of a parsed Swift module and produces, for each, a C-calling-
//! convention entrypoint plus the matching C function declaration, ready for
//! binding from a host runtime's foreign-function layer.

pub mod error;
pub mod ffi;
pub mod lowering;
pub mod semantic;
pub mod signature;
pub mod syntax;
pub mod thunk;
pub mod types;
pub mod visitor;

// Re-export core types for convenience
pub use error::*;
pub use lowering::{LoweredFunctionSignature, LoweringEngine};
pub use semantic::SymbolTable;
pub use visitor::DeclarationVisitor;
