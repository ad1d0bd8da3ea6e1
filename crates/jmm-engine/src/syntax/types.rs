//! Type descriptors
//!
//! A [`Type`] is a base name plus two flags: whether the value is an array
//! and whether it is a variable-arity parameter. Two sentinel names exist
//! besides the source-level types: `unknown` marks values whose type is
//! decided outside the compilation unit (calls on imported classes,
//! inherited members), and `<error>` marks expressions that already produced
//! a diagnostic.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Base name of the 32-bit integer type
pub const INT: &str = "int";
/// Base name of the boolean type
pub const BOOLEAN: &str = "boolean";
/// Base name of the void return type
pub const VOID: &str = "void";
/// Base name of the string type
pub const STRING: &str = "String";
/// Sentinel for externally resolved types
pub const UNKNOWN: &str = "unknown";
/// Sentinel for expressions that failed checking
pub const ERROR: &str = "<error>";

/// A resolved type descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Type {
    /// Base type name (`int`, `boolean`, a class name, ...)
    pub name: String,
    /// Whether this is an array of `name`
    #[serde(default)]
    pub is_array: bool,
    /// Whether this is a trailing variable-arity parameter
    #[serde(default, rename = "isVarArgs")]
    pub is_varargs: bool,
}

impl Type {
    /// Create a non-array type with the given base name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_array: false,
            is_varargs: false,
        }
    }

    pub fn int() -> Self {
        Self::new(INT)
    }

    pub fn boolean() -> Self {
        Self::new(BOOLEAN)
    }

    pub fn void() -> Self {
        Self::new(VOID)
    }

    pub fn string() -> Self {
        Self::new(STRING)
    }

    pub fn unknown() -> Self {
        Self::new(UNKNOWN)
    }

    pub fn error() -> Self {
        Self::new(ERROR)
    }

    /// Object type named after a class
    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name)
    }

    /// Array whose elements have base type `name`
    pub fn array_of(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_array: true,
            is_varargs: false,
        }
    }

    /// Variable-arity parameter type. Varargs are arrays at runtime.
    pub fn varargs_of(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_array: true,
            is_varargs: true,
        }
    }

    /// Element type of an array (the base type without array flags)
    pub fn element(&self) -> Type {
        Type::new(self.name.clone())
    }

    /// The same type with the varargs marker removed
    pub fn without_varargs(&self) -> Type {
        Type {
            name: self.name.clone(),
            is_array: self.is_array || self.is_varargs,
            is_varargs: false,
        }
    }

    pub fn is_int(&self) -> bool {
        self.name == INT && !self.is_array
    }

    pub fn is_boolean(&self) -> bool {
        self.name == BOOLEAN && !self.is_array
    }

    pub fn is_void(&self) -> bool {
        self.name == VOID && !self.is_array
    }

    pub fn is_unknown(&self) -> bool {
        self.name == UNKNOWN
    }

    pub fn is_error(&self) -> bool {
        self.name == ERROR
    }

    /// Sentinel types are compatible with everything and never cascade
    /// into further diagnostics.
    pub fn is_sentinel(&self) -> bool {
        self.is_unknown() || self.is_error()
    }

    /// Values held in int-family JVM slots (`int`, `boolean`)
    pub fn is_int_family(&self) -> bool {
        self.is_int() || self.is_boolean()
    }

    /// Non-array type that names a class
    pub fn is_object(&self) -> bool {
        !self.is_array
            && !matches!(self.name.as_str(), INT | BOOLEAN | VOID)
            && !self.is_sentinel()
    }

    /// Structural equality that ignores the varargs marker, so `int...`
    /// matches `int[]`.
    pub fn same_shape(&self, other: &Type) -> bool {
        self.name == other.name
            && (self.is_array || self.is_varargs) == (other.is_array || other.is_varargs)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_varargs {
            write!(f, "{}...", self.name)
        } else if self.is_array {
            write!(f, "{}[]", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Type::int().to_string(), "int");
        assert_eq!(Type::array_of("int").to_string(), "int[]");
        assert_eq!(Type::varargs_of("int").to_string(), "int...");
        assert_eq!(Type::class("Foo").to_string(), "Foo");
    }

    #[test]
    fn test_varargs_matches_array_shape() {
        let varargs = Type::varargs_of("int");
        assert!(varargs.same_shape(&Type::array_of("int")));
        assert!(!varargs.same_shape(&Type::int()));
        assert_ne!(varargs, Type::array_of("int"));
        assert_eq!(varargs.without_varargs(), Type::array_of("int"));
    }

    #[test]
    fn test_classification() {
        assert!(Type::int().is_int_family());
        assert!(Type::boolean().is_int_family());
        assert!(!Type::array_of("int").is_int_family());
        assert!(Type::class("Foo").is_object());
        assert!(Type::string().is_object());
        assert!(!Type::unknown().is_object());
        assert!(Type::error().is_sentinel());
        assert_eq!(Type::array_of("boolean").element(), Type::boolean());
    }
}
