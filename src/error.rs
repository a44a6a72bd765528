//! Error types for the bridge generator
//!
//! Defines the error types surfaced by each stage of the import pipeline,
//! from type resolution to signature lowering.

use crate::types::SwiftType;
use thiserror::Error;

/// Top-level error type for all bridge generator errors
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Lowering error: {0}")]
    Lowering(#[from] LoweringError),

    #[error("Import error: {0}")]
    Import(#[from] ImportError),
}

/// Errors produced while lowering a function signature to its C-compatible form
///
/// These are surfaced per declaration and never abort a whole import run:
/// the declaration is skipped and its siblings continue.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoweringError {
    #[error("Type cannot be lowered to a C-compatible form: '{0}'")]
    UnhandledType(SwiftType),

    #[error("'inout' is not supported for primitive type '{0}'")]
    InoutNotSupported(SwiftType),

    #[error("Unable to resolve type: '{0}'")]
    UnresolvedType(String),

    #[error("Improper lowering of a non-direct result")]
    ImproperResultLowering,
}

/// Errors produced while walking declarations during import
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImportError {
    #[error("Initializer declared outside of a nominal type")]
    InitializerOutsideNominal,

    #[error("Global properties are not supported: '{0}'")]
    UnsupportedGlobalVariable(String),
}

/// Result type alias for lowering operations
pub type LoweringResult<T> = Result<T, LoweringError>;

/// Result type alias for import operations
pub type ImportResult<T> = Result<T, ImportError>;
