//! IR values and operands
//!
//! Defines the operands used in IR instructions: compiler temporaries,
//! named variables, literals, and the labels jumps refer to.

use crate::syntax::Type;
use std::fmt;

/// Compiler temporary identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TempId(pub u32);

impl TempId {
    /// Create a new temporary ID
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tmp{}", self.0)
    }
}

/// Literal constant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Literal {
    Int(i32),
    Bool(bool),
}

impl Literal {
    pub fn ty(&self) -> Type {
        match self {
            Literal::Int(_) => Type::int(),
            Literal::Bool(_) => Type::boolean(),
        }
    }

    /// Value as it sits in an int-family slot
    pub fn as_i32(&self) -> i32 {
        match self {
            Literal::Int(value) => *value,
            Literal::Bool(value) => i32::from(*value),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(value) => write!(f, "{}", value),
            Literal::Bool(value) => write!(f, "{}", value),
        }
    }
}

/// Key a variable is stored under in a method's variable table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VarKey {
    /// The implicit instance of a non-static method
    This,
    /// A parameter or local declared in the source
    Named(String),
    /// A compiler temporary
    Temp(TempId),
}

impl fmt::Display for VarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarKey::This => f.write_str("this"),
            VarKey::Named(name) => f.write_str(name),
            VarKey::Temp(id) => write!(f, "{}", id),
        }
    }
}

/// Instruction operand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// A compiler temporary
    Temp { id: TempId, ty: Type },
    /// `this`, a parameter or a local
    Var { key: VarKey, ty: Type },
    /// A constant
    Literal(Literal),
}

impl Operand {
    pub fn temp(id: TempId, ty: Type) -> Self {
        Operand::Temp { id, ty }
    }

    pub fn named(name: impl Into<String>, ty: Type) -> Self {
        Operand::Var {
            key: VarKey::Named(name.into()),
            ty,
        }
    }

    pub fn this(class: &str) -> Self {
        Operand::Var {
            key: VarKey::This,
            ty: Type::class(class),
        }
    }

    pub fn int(value: i32) -> Self {
        Operand::Literal(Literal::Int(value))
    }

    pub fn bool(value: bool) -> Self {
        Operand::Literal(Literal::Bool(value))
    }

    pub fn ty(&self) -> Type {
        match self {
            Operand::Temp { ty, .. } | Operand::Var { ty, .. } => ty.clone(),
            Operand::Literal(literal) => literal.ty(),
        }
    }

    /// Variable table key, `None` for literals
    pub fn key(&self) -> Option<VarKey> {
        match self {
            Operand::Temp { id, .. } => Some(VarKey::Temp(*id)),
            Operand::Var { key, .. } => Some(key.clone()),
            Operand::Literal(_) => None,
        }
    }

    pub fn as_literal(&self) -> Option<Literal> {
        match self {
            Operand::Literal(literal) => Some(*literal),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Temp { id, ty } => write!(f, "{}:{}", id, ty),
            Operand::Var { key, ty } => write!(f, "{}:{}", key, ty),
            Operand::Literal(literal) => write!(f, "{}:{}", literal, literal.ty()),
        }
    }
}

/// Jump target
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label(pub String);

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
