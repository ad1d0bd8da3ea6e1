//! Semantic error types
//!
//! Every violation the type checker can report, each with the source
//! position of the offending node when the front end supplied one.

use crate::syntax::{Position, Type};
use std::fmt;
use thiserror::Error;

/// What kind of declaration was duplicated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateKind {
    Field,
    Method,
    Parameter,
    Variable,
}

impl fmt::Display for DuplicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DuplicateKind::Field => "field",
            DuplicateKind::Method => "method",
            DuplicateKind::Parameter => "parameter",
            DuplicateKind::Variable => "variable",
        })
    }
}

/// Errors reported during semantic analysis
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CheckError {
    /// Operands of a binary operator have the wrong types
    #[error("Binary expression '{op}' expected two {expected} operands, instead got types {left} {right}")]
    InvalidBinaryOperands {
        /// Operator symbol
        op: String,
        /// Type both operands must have
        expected: Type,
        /// Left operand type
        left: Type,
        /// Right operand type
        right: Type,
        position: Option<Position>,
    },

    #[error("Unknown binary operator '{op}'")]
    UnknownOperator { op: String, position: Option<Position> },

    #[error("Operator '!' expected a boolean operand, got {actual} instead")]
    InvalidNotOperand { actual: Type, position: Option<Position> },

    #[error("Array access expected an array, got {actual} instead")]
    IndexOnNonArray { actual: Type, position: Option<Position> },

    #[error("Length can only be read from an array, got {actual} instead")]
    LengthOnNonArray { actual: Type, position: Option<Position> },

    #[error("Array index should be int, got {actual} instead")]
    ArrayIndexNotInt { actual: Type, position: Option<Position> },

    #[error("Array size should be int, got {actual} instead")]
    ArraySizeNotInt { actual: Type, position: Option<Position> },

    /// Array initializer mixes element types
    #[error("Array can only be composed by elements of one type, got {first} and {other}")]
    MixedArrayElements {
        first: Type,
        other: Type,
        position: Option<Position>,
    },

    /// `new C()` where `C` is neither the declaring class nor imported
    #[error("Class {name} is undeclared")]
    ClassUndeclared { name: String, position: Option<Position> },

    #[error("Variable {name} is undeclared")]
    UndeclaredVariable { name: String, position: Option<Position> },

    #[error("{class} does not contain method {method}.")]
    UndeclaredMethod {
        class: String,
        method: String,
        position: Option<Position>,
    },

    #[error("{class} does not contain field {name}.")]
    UndeclaredField {
        class: String,
        name: String,
        position: Option<Position>,
    },

    #[error("Method {method} expected {expected} parameters, got {actual} instead.")]
    ArgumentCountMismatch {
        method: String,
        expected: usize,
        actual: usize,
        position: Option<Position>,
    },

    #[error("Expected parameter {param} to be type {expected}, got {actual} instead.")]
    ArgumentTypeMismatch {
        param: String,
        expected: Type,
        actual: Type,
        position: Option<Position>,
    },

    /// A varargs parameter that is not the trailing one
    #[error("Varargs parameter {param} of method {method} should be the last parameter")]
    VarargsNotLast {
        method: String,
        param: String,
        position: Option<Position>,
    },

    /// A field or local declared with a varargs type
    #[error("Varargs type is only allowed on the last method parameter, found on {name}")]
    VarargsOutsideParameter { name: String, position: Option<Position> },

    #[error("Variable of type {target} cannot be assigned a value of type {value}.")]
    IncompatibleAssignment {
        target: Type,
        value: Type,
        position: Option<Position>,
    },

    #[error("Method {method} should return type {expected}, got {actual} instead.")]
    ReturnTypeMismatch {
        method: String,
        expected: Type,
        actual: Type,
        position: Option<Position>,
    },

    #[error("Method {method} of type {expected} has no return statement")]
    MissingReturn {
        method: String,
        expected: Type,
        position: Option<Position>,
    },

    /// `if`/`while` condition that is not boolean
    #[error("{statement} statement should receive type boolean, got {actual} instead")]
    ConditionNotBoolean {
        statement: &'static str,
        actual: Type,
        position: Option<Position>,
    },

    #[error("Duplicated {kind} {name}")]
    Duplicate {
        kind: DuplicateKind,
        name: String,
        position: Option<Position>,
    },

    #[error("'this' cannot be used in static method {method}")]
    ThisInStaticMethod { method: String, position: Option<Position> },

    #[error("Field {name} cannot be used in static method {method}")]
    FieldInStaticMethod {
        name: String,
        method: String,
        position: Option<Position>,
    },

    #[error("Cannot invoke method {method} on a value of type {ty}")]
    InvalidReceiver {
        method: String,
        ty: Type,
        position: Option<Position>,
    },

    #[error("Field {name} can only be accessed through 'this'")]
    FieldAccessRequiresThis { name: String, position: Option<Position> },

    #[error("Invalid integer literal {value}")]
    InvalidLiteral { value: String, position: Option<Position> },

    /// Node is missing a child or attribute its kind requires
    #[error("Malformed {kind} node: {message}")]
    MalformedNode {
        kind: String,
        message: String,
        position: Option<Position>,
    },
}

impl CheckError {
    /// Source position of the offending node
    pub fn position(&self) -> Option<Position> {
        use CheckError::*;

        match self {
            InvalidBinaryOperands { position, .. }
            | UnknownOperator { position, .. }
            | InvalidNotOperand { position, .. }
            | IndexOnNonArray { position, .. }
            | LengthOnNonArray { position, .. }
            | ArrayIndexNotInt { position, .. }
            | ArraySizeNotInt { position, .. }
            | MixedArrayElements { position, .. }
            | ClassUndeclared { position, .. }
            | UndeclaredVariable { position, .. }
            | UndeclaredMethod { position, .. }
            | UndeclaredField { position, .. }
            | ArgumentCountMismatch { position, .. }
            | ArgumentTypeMismatch { position, .. }
            | VarargsNotLast { position, .. }
            | VarargsOutsideParameter { position, .. }
            | IncompatibleAssignment { position, .. }
            | ReturnTypeMismatch { position, .. }
            | MissingReturn { position, .. }
            | ConditionNotBoolean { position, .. }
            | Duplicate { position, .. }
            | ThisInStaticMethod { position, .. }
            | FieldInStaticMethod { position, .. }
            | InvalidReceiver { position, .. }
            | FieldAccessRequiresThis { position, .. }
            | InvalidLiteral { position, .. }
            | MalformedNode { position, .. } => *position,
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        use CheckError::*;

        match self {
            InvalidBinaryOperands { .. } => "E1001",
            UnknownOperator { .. } => "E1002",
            InvalidNotOperand { .. } => "E1003",
            IndexOnNonArray { .. } => "E1004",
            LengthOnNonArray { .. } => "E1005",
            ArrayIndexNotInt { .. } => "E1006",
            ArraySizeNotInt { .. } => "E1007",
            MixedArrayElements { .. } => "E1008",
            ClassUndeclared { .. } => "E1009",
            UndeclaredVariable { .. } => "E1010",
            UndeclaredMethod { .. } => "E1011",
            UndeclaredField { .. } => "E1012",
            ArgumentCountMismatch { .. } => "E1013",
            ArgumentTypeMismatch { .. } => "E1014",
            VarargsNotLast { .. } => "E1015",
            VarargsOutsideParameter { .. } => "E1016",
            IncompatibleAssignment { .. } => "E1017",
            ReturnTypeMismatch { .. } => "E1018",
            MissingReturn { .. } => "E1019",
            ConditionNotBoolean { .. } => "E1020",
            Duplicate { .. } => "E1021",
            ThisInStaticMethod { .. } => "E1022",
            FieldInStaticMethod { .. } => "E1023",
            InvalidReceiver { .. } => "E1024",
            FieldAccessRequiresThis { .. } => "E1025",
            InvalidLiteral { .. } => "E1026",
            MalformedNode { .. } => "E1099",
        }
    }
}
