//! Symbol catalog
//!
//! Read-only facts about the compilation unit: imports, the declaring
//! class, its superclass, fields, and method signatures with their
//! parameters and locals. Built once before checking and shared by every
//! later stage.

use crate::compiler::error::{CompileError, CompileResult};
use crate::syntax::{NodeKind, SyntaxNode, Type};

/// A named, typed declaration (field, parameter or local)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub ty: Type,
}

impl Symbol {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Signature of a method declared in the compilation unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: String,
    pub return_type: Type,
    pub params: Vec<Symbol>,
    pub locals: Vec<Symbol>,
    pub is_static: bool,
}

impl MethodSignature {
    pub fn new(name: impl Into<String>, return_type: Type) -> Self {
        Self {
            name: name.into(),
            return_type,
            params: Vec::new(),
            locals: Vec::new(),
            is_static: false,
        }
    }

    pub fn with_param(mut self, name: &str, ty: Type) -> Self {
        self.params.push(Symbol::new(name, ty));
        self
    }

    pub fn with_local(mut self, name: &str, ty: Type) -> Self {
        self.locals.push(Symbol::new(name, ty));
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    /// Read a signature off a `MethodDecl` node
    pub fn from_decl(node: &SyntaxNode) -> CompileResult<Self> {
        let name = node.attr("name").ok_or_else(|| CompileError::InvalidTree {
            message: "method declaration without a name".to_string(),
        })?;
        let return_type = node.declared_type().ok_or_else(|| CompileError::InvalidTree {
            message: format!("method {} has no return type", name),
        })?;

        Ok(Self {
            name: name.to_string(),
            return_type,
            params: symbols_of(node, NodeKind::Param)?,
            locals: symbols_of(node, NodeKind::VarDecl)?,
            is_static: node.flag("isStatic"),
        })
    }

    /// Parameter types as seen by callers (varargs become arrays)
    pub fn param_types(&self) -> Vec<Type> {
        self.params.iter().map(|p| p.ty.without_varargs()).collect()
    }

    /// The trailing varargs parameter, if the signature is well formed
    pub fn varargs_param(&self) -> Option<&Symbol> {
        self.params.last().filter(|p| p.ty.is_varargs)
    }

    /// First varargs parameter that is not the last one
    pub fn misplaced_varargs(&self) -> Option<&Symbol> {
        let count = self.params.len();
        self.params
            .iter()
            .take(count.saturating_sub(1))
            .find(|p| p.ty.is_varargs)
    }

    pub fn param(&self, name: &str) -> Option<&Symbol> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn local(&self, name: &str) -> Option<&Symbol> {
        self.locals.iter().find(|l| l.name == name)
    }
}

fn symbols_of(node: &SyntaxNode, kind: NodeKind) -> CompileResult<Vec<Symbol>> {
    node.children_of(kind)
        .map(|decl| {
            let ty = decl.declared_type().ok_or_else(|| CompileError::InvalidTree {
                message: format!("{} {} has no type", kind, decl.name()),
            })?;
            Ok(Symbol::new(decl.name(), ty))
        })
        .collect()
}

/// What a simple name refers to inside a method body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding<'a> {
    Local(&'a Symbol),
    Param(&'a Symbol),
    Field(&'a Symbol),
    /// The declaring class or an imported class, used as a static receiver
    Class(&'a str),
}

impl Binding<'_> {
    pub fn ty(&self) -> Type {
        match self {
            Binding::Local(symbol) | Binding::Param(symbol) | Binding::Field(symbol) => {
                symbol.ty.clone()
            }
            Binding::Class(name) => Type::class(*name),
        }
    }
}

/// Facts about the compilation unit
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SymbolCatalog {
    imports: Vec<String>,
    class_name: String,
    superclass: Option<String>,
    fields: Vec<Symbol>,
    methods: Vec<MethodSignature>,
}

impl SymbolCatalog {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    /// Add a dotted import path (`a.b.C`)
    pub fn with_import(mut self, path: impl Into<String>) -> Self {
        self.imports.push(path.into());
        self
    }

    pub fn with_superclass(mut self, name: impl Into<String>) -> Self {
        self.superclass = Some(name.into());
        self
    }

    pub fn with_field(mut self, name: &str, ty: Type) -> Self {
        self.fields.push(Symbol::new(name, ty));
        self
    }

    pub fn with_method(mut self, signature: MethodSignature) -> Self {
        self.methods.push(signature);
        self
    }

    /// Build the catalog from a `Program` tree
    pub fn from_tree(root: &SyntaxNode) -> CompileResult<Self> {
        let class = root
            .first_of(NodeKind::ClassDecl)
            .ok_or_else(|| CompileError::InvalidTree {
                message: "program has no class declaration".to_string(),
            })?;
        let class_name = class.attr("name").ok_or_else(|| CompileError::InvalidTree {
            message: "class declaration without a name".to_string(),
        })?;

        let imports = root
            .children_of(NodeKind::ImportDecl)
            .map(|import| {
                import
                    .attr("path")
                    .map(str::to_string)
                    .ok_or_else(|| CompileError::InvalidTree {
                        message: "import declaration without a path".to_string(),
                    })
            })
            .collect::<CompileResult<Vec<_>>>()?;

        let methods = class
            .children_of(NodeKind::MethodDecl)
            .map(MethodSignature::from_decl)
            .collect::<CompileResult<Vec<_>>>()?;

        Ok(Self {
            imports,
            class_name: class_name.to_string(),
            superclass: class.attr("extends").map(str::to_string),
            fields: symbols_of(class, NodeKind::VarDecl)?,
            methods,
        })
    }

    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn superclass(&self) -> Option<&str> {
        self.superclass.as_deref()
    }

    pub fn fields(&self) -> &[Symbol] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Symbol> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn methods(&self) -> &[MethodSignature] {
        &self.methods
    }

    pub fn method(&self, name: &str) -> Option<&MethodSignature> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn return_type(&self, method: &str) -> Option<&Type> {
        self.method(method).map(|m| &m.return_type)
    }

    pub fn parameters(&self, method: &str) -> Option<&[Symbol]> {
        self.method(method).map(|m| m.params.as_slice())
    }

    pub fn locals(&self, method: &str) -> Option<&[Symbol]> {
        self.method(method).map(|m| m.locals.as_slice())
    }

    /// Whether a simple class name matches the last segment of an import
    pub fn is_imported(&self, simple_name: &str) -> bool {
        self.qualified_import(simple_name).is_some()
    }

    /// Dotted import path whose last segment is `simple_name`
    pub fn qualified_import(&self, simple_name: &str) -> Option<&str> {
        self.imports
            .iter()
            .find(|path| path.rsplit('.').next() == Some(simple_name))
            .map(String::as_str)
    }

    /// Resolve a name used inside `method`: locals shadow parameters,
    /// parameters shadow fields, and class names come last.
    pub fn resolve<'a>(&'a self, method: &'a MethodSignature, name: &'a str) -> Option<Binding<'a>> {
        if let Some(local) = method.local(name) {
            return Some(Binding::Local(local));
        }
        if let Some(param) = method.param(name) {
            return Some(Binding::Param(param));
        }
        if let Some(field) = self.field(name) {
            return Some(Binding::Field(field));
        }
        self.is_known_class(name).then_some(Binding::Class(name))
    }

    /// Whether `name` names a class visible in this unit
    pub fn is_known_class(&self, name: &str) -> bool {
        name == self.class_name || self.is_imported(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::build::*;

    fn sample_tree() -> SyntaxNode {
        program(
            vec![import("io"), import("java.util.List")],
            class(
                "Sample",
                Some("Base"),
                vec![var_decl("count", Type::int())],
                vec![
                    method(
                        "sum",
                        Type::int(),
                        vec![param("values", Type::varargs_of("int"))],
                        vec![var_decl("total", Type::int())],
                        vec![ret(var("total"))],
                    ),
                    static_method(
                        "main",
                        Type::void(),
                        vec![param("args", Type::array_of("String"))],
                        vec![],
                        vec![],
                    ),
                ],
            ),
        )
    }

    #[test]
    fn test_from_tree() {
        let catalog = SymbolCatalog::from_tree(&sample_tree()).unwrap();
        assert_eq!(catalog.class_name(), "Sample");
        assert_eq!(catalog.superclass(), Some("Base"));
        assert_eq!(catalog.imports(), ["io".to_string(), "java.util.List".to_string()]);
        assert_eq!(catalog.fields(), [Symbol::new("count", Type::int())]);
        assert_eq!(catalog.return_type("sum"), Some(&Type::int()));
        assert_eq!(
            catalog.parameters("sum").unwrap()[0].ty,
            Type::varargs_of("int")
        );
        assert_eq!(catalog.locals("sum").unwrap()[0].name, "total");
        assert!(catalog.method("main").unwrap().is_static);
        assert!(catalog.method("missing").is_none());
    }

    #[test]
    fn test_imports_match_by_simple_name() {
        let catalog = SymbolCatalog::from_tree(&sample_tree()).unwrap();
        assert!(catalog.is_imported("io"));
        assert!(catalog.is_imported("List"));
        assert!(!catalog.is_imported("util"));
        assert_eq!(catalog.qualified_import("List"), Some("java.util.List"));
        assert!(catalog.is_known_class("Sample"));
    }

    #[test]
    fn test_resolve_shadowing() {
        let catalog = SymbolCatalog::new("A")
            .with_import("io")
            .with_field("x", Type::boolean())
            .with_field("y", Type::boolean());
        let method = MethodSignature::new("f", Type::void())
            .with_param("x", Type::array_of("int"))
            .with_local("y", Type::int());

        assert!(matches!(catalog.resolve(&method, "x"), Some(Binding::Param(_))));
        assert_eq!(catalog.resolve(&method, "y").map(|b| b.ty()), Some(Type::int()));
        assert_eq!(catalog.resolve(&method, "io"), Some(Binding::Class("io")));
        assert_eq!(catalog.resolve(&method, "A"), Some(Binding::Class("A")));
        assert_eq!(catalog.resolve(&method, "nope"), None);
    }

    #[test]
    fn test_varargs_position() {
        let good = MethodSignature::new("f", Type::void())
            .with_param("a", Type::int())
            .with_param("rest", Type::varargs_of("int"));
        assert_eq!(good.varargs_param().map(|p| p.name.as_str()), Some("rest"));
        assert!(good.misplaced_varargs().is_none());
        assert_eq!(good.param_types(), vec![Type::int(), Type::array_of("int")]);

        let bad = MethodSignature::new("g", Type::void())
            .with_param("rest", Type::varargs_of("int"))
            .with_param("a", Type::int());
        assert_eq!(bad.misplaced_varargs().map(|p| p.name.as_str()), Some("rest"));
        assert!(bad.varargs_param().is_none());
    }

    #[test]
    fn test_missing_class_is_invalid_tree() {
        let tree = SyntaxNode::new(NodeKind::Program);
        assert!(matches!(
            SymbolCatalog::from_tree(&tree),
            Err(CompileError::InvalidTree { .. })
        ));
    }
}
