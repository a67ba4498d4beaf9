//! Source rewriting for ES module statements.
//!
//! The linker never prints an AST. It records span edits on the original
//! text (drop an `export` keyword, replace an `import` with a destructuring
//! `const`) and splices them in one pass.

use oxc::ast::ast::{
    Declaration, ImportDeclaration, ImportDeclarationSpecifier, ModuleExportName,
};
use oxc::span::{GetSpan, Span};

/// Replace `start..end` of the source with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Edit {
    start: u32,
    end: u32,
    text: String,
}

impl Edit {
    pub(super) fn replace(span: Span, text: impl Into<String>) -> Self {
        Self {
            start: span.start,
            end: span.end,
            text: text.into(),
        }
    }

    pub(super) fn remove(span: Span) -> Self {
        Self::replace(span, String::new())
    }

    pub(super) fn range(start: u32, end: u32, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    pub(super) fn insert(at: u32, text: impl Into<String>) -> Self {
        Self::range(at, at, text)
    }
}

/// Splice non-overlapping edits into `source`.
pub(super) fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|edit| (edit.start, edit.end));

    let mut out = String::with_capacity(source.len());
    let mut pos = 0usize;
    for edit in edits {
        let start = edit.start as usize;
        out.push_str(&source[pos..start]);
        out.push_str(&edit.text);
        pos = edit.end as usize;
    }
    out.push_str(&source[pos..]);
    out
}

/// One field of a module's export object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum ExportEntry {
    /// `key: expr`
    Named(String, String),
    /// `...expr` (from `export * from`)
    Star(String),
}

/// Wrap a dependency body so its exports become an object bound to `name`.
pub(super) fn wrap_module(name: &str, body: &str, exports: &[ExportEntry]) -> String {
    let stars = exports.iter().filter_map(|entry| match entry {
        ExportEntry::Star(expr) => Some(format!("...{expr}")),
        ExportEntry::Named(..) => None,
    });
    let named = exports.iter().filter_map(|entry| match entry {
        ExportEntry::Named(key, expr) => Some(format!("{key}: {expr}")),
        ExportEntry::Star(_) => None,
    });
    let fields = stars.chain(named).collect::<Vec<_>>().join(", ");

    format!("const {name} = (() => {{\n{body}\nreturn {{ {fields} }};\n}})();\n")
}

/// Source text covered by `span`.
pub(super) fn span_text(source: &str, span: Span) -> &str {
    &source[span.start as usize..span.end as usize]
}

/// Text of an import/export name as written (identifier or string literal).
pub(super) fn export_name<'s>(source: &'s str, name: &ModuleExportName) -> &'s str {
    span_text(source, name.span())
}

/// Property access on `object` for a name written as identifier or string.
pub(super) fn member(object: &str, name: &str) -> String {
    if name.starts_with('"') || name.starts_with('\'') {
        format!("{object}[{name}]")
    } else {
        format!("{object}.{name}")
    }
}

/// `const` bindings equivalent to an import declaration reading `namespace`.
///
/// A bare `import "x"` binds nothing; the module was already evaluated.
pub(super) fn import_bindings(source: &str, decl: &ImportDeclaration, namespace: &str) -> String {
    let Some(specifiers) = &decl.specifiers else {
        return String::new();
    };

    let mut named = Vec::new();
    let mut lines = Vec::new();
    for specifier in specifiers {
        match specifier {
            ImportDeclarationSpecifier::ImportSpecifier(spec) => {
                let imported = export_name(source, &spec.imported);
                named.push(format!("{imported}: {}", spec.local.name));
            }
            ImportDeclarationSpecifier::ImportDefaultSpecifier(spec) => {
                lines.push(format!("const {} = {namespace}.default;", spec.local.name));
            }
            ImportDeclarationSpecifier::ImportNamespaceSpecifier(spec) => {
                lines.push(format!("const {} = {namespace};", spec.local.name));
            }
        }
    }
    if !named.is_empty() {
        lines.push(format!("const {{ {} }} = {namespace};", named.join(", ")));
    }
    lines.join(" ")
}

/// Names bound by an exported declaration.
pub(super) fn declared_names(declaration: &Declaration) -> Vec<String> {
    match declaration {
        Declaration::VariableDeclaration(var) => var
            .declarations
            .iter()
            .flat_map(|declarator| declarator.id.get_binding_identifiers())
            .map(|id| id.name.to_string())
            .collect(),
        Declaration::FunctionDeclaration(func) => {
            func.id.iter().map(|id| id.name.to_string()).collect()
        }
        Declaration::ClassDeclaration(class) => {
            class.id.iter().map(|id| id.name.to_string()).collect()
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_edits_in_order() {
        let source = "export const a = 1;\nexport default a;";
        let edits = vec![
            Edit::range(20, 35, "const __d = "),
            Edit::range(0, 7, ""),
            Edit::insert(source.len() as u32, ";"),
        ];
        assert_eq!(apply_edits(source, edits), "const a = 1;\nconst __d = a;;");
    }

    #[test]
    fn test_apply_edits_empty() {
        assert_eq!(apply_edits("let x = 1;", Vec::new()), "let x = 1;");
    }

    #[test]
    fn test_member_access() {
        assert_eq!(member("__m0", "double"), "__m0.double");
        assert_eq!(member("__m0", "\"a-b\""), "__m0[\"a-b\"]");
    }

    #[test]
    fn test_wrap_module_orders_stars_first() {
        let exports = vec![
            ExportEntry::Named("a".into(), "a".into()),
            ExportEntry::Star("__x0".into()),
        ];
        let code = wrap_module("__m1", "const a = 1;", &exports);
        assert!(code.starts_with("const __m1 = (() => {\nconst a = 1;"));
        assert!(code.contains("return { ...__x0, a: a };"));
    }
}
