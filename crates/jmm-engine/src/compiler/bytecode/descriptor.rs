//! JVM type descriptors
//!
//! Field descriptors (`I`, `Z`, `[I`, `Lio/Out;`) and method descriptors
//! (`(IZ)V`). Class names are qualified through the [`ImportTable`].

use crate::syntax::{types, Type};
use rustc_hash::FxHashMap;
use std::fmt;

/// Internal name of `java.lang.String`
pub const STRING_CLASS: &str = "java/lang/String";

/// Internal name of `java.lang.Object`
pub const OBJECT_CLASS: &str = "java/lang/Object";

/// Maps simple class names to JVM internal names (`a/b/C`)
#[derive(Debug, Clone, Default)]
pub struct ImportTable {
    classes: FxHashMap<String, String>,
}

impl ImportTable {
    /// Build from dotted import paths such as `java.util.List`
    pub fn new<'a>(imports: impl IntoIterator<Item = &'a String>) -> Self {
        let mut classes = FxHashMap::default();
        // The first import of a simple name wins, as in name resolution
        for path in imports {
            let simple = path.rsplit('.').next().unwrap_or(path).to_string();
            classes.entry(simple).or_insert_with(|| path.replace('.', "/"));
        }
        Self { classes }
    }

    /// Internal name of a class. Imported names are qualified, `String`
    /// maps to `java/lang/String`, anything else is emitted as written.
    pub fn internal_name(&self, simple: &str) -> String {
        match self.classes.get(simple) {
            Some(qualified) => qualified.clone(),
            None if simple == types::STRING => STRING_CLASS.to_string(),
            None => simple.to_string(),
        }
    }
}

/// Field descriptor of a source type. Unknown and error types are
/// emitted as `Ljava/lang/Object;`.
pub fn field_descriptor(ty: &Type, imports: &ImportTable) -> String {
    let base = match ty.name.as_str() {
        types::INT => "I".to_string(),
        types::BOOLEAN => "Z".to_string(),
        types::VOID => "V".to_string(),
        _ if ty.is_sentinel() => format!("L{};", OBJECT_CLASS),
        name => format!("L{};", imports.internal_name(name)),
    };
    if ty.is_array || ty.is_varargs {
        format!("[{}", base)
    } else {
        base
    }
}

/// Method descriptor: parameter descriptors and a return descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub params: Vec<String>,
    pub return_type: String,
}

impl MethodDescriptor {
    pub fn new(params: &[Type], return_type: &Type, imports: &ImportTable) -> Self {
        Self {
            params: params.iter().map(|p| field_descriptor(p, imports)).collect(),
            return_type: field_descriptor(return_type, imports),
        }
    }

    /// `()V`, the constructor descriptor
    pub fn void() -> Self {
        Self {
            params: Vec::new(),
            return_type: "V".to_string(),
        }
    }

    /// Number of argument values the method pops
    pub fn arg_count(&self) -> usize {
        self.params.len()
    }

    pub fn returns_value(&self) -> bool {
        self.return_type != "V"
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}){}", self.params.concat(), self.return_type)
    }
}
