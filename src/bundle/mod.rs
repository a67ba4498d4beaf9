//! Script bundling.
//!
//! Links an entry module and every local module it statically imports into
//! a single ES module:
//!
//! ```text
//! import * as __x0 from "lodash";          // externals, hoisted
//! const __m0 = (() => { ...; return { double }; })();   // dependencies,
//! const __m1 = (() => { ...; return { ... }; })();      // post-order
//! const { double: double } = __m0;         // entry, imports hoisted
//! ...
//! ```
//!
//! Externals stay as imports. Dynamic `import()` is not followed. Bundled
//! dependencies must be ES modules (CommonJS is rejected with a hint to mark
//! the package external); a circular import between bundled modules is
//! reported as a transform error.

mod link;
mod resolve;

use std::fs;
use std::path::{Path, PathBuf};

use oxc::allocator::Allocator;
use oxc::ast::ast::{ExportDefaultDeclarationKind, Expression, Program, Statement};
use oxc::parser::Parser;
use oxc::span::{GetSpan, SourceType};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::asset::minify::script_source_type;
use crate::config::BuildOptions;
use crate::error::{IoContext, ProcessError};
use crate::utils::path::{normalize_path, relative_display};

use link::{
    Edit, ExportEntry, apply_edits, declared_names, export_name, import_bindings, member,
    span_text, wrap_module,
};

pub use resolve::{Resolved, resolve};

/// Bundle `entry` into a single unminified ES module.
pub fn bundle(entry: &Path, options: &BuildOptions) -> Result<String, ProcessError> {
    let mut graph = Graph::new(options);
    let entry = normalize_path(entry);
    graph.visiting.insert(entry.clone());
    let body = graph.link(&entry, Role::Entry, "")?;
    Ok(graph.finish(&body))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    /// Top level of the output; keeps its own exports and external imports.
    Entry,
    /// Wrapped in a closure; exports become an object.
    Dependency,
}

/// What an import specifier is bound to in the output.
enum Binding {
    /// Variable holding a bundled module's export object.
    Local(String),
    /// External specifier; read through a hoisted `import * as` namespace.
    External(String),
}

struct Graph<'a> {
    options: &'a BuildOptions,
    /// Linked module path → variable holding its exports
    linked: FxHashMap<PathBuf, String>,
    /// Modules on the current import chain
    visiting: FxHashSet<PathBuf>,
    /// Rendered dependency wrappers, in evaluation order
    chunks: Vec<String>,
    /// External specifiers; index `i` is bound to `__x{i}`
    externals: Vec<String>,
    /// Counter for generated local names
    next_local: usize,
}

impl<'a> Graph<'a> {
    fn new(options: &'a BuildOptions) -> Self {
        Self {
            options,
            linked: FxHashMap::default(),
            visiting: FxHashSet::default(),
            chunks: Vec::new(),
            externals: Vec::new(),
            next_local: 0,
        }
    }

    fn fresh(&mut self, prefix: &str) -> String {
        let name = format!("{prefix}{}", self.next_local);
        self.next_local += 1;
        name
    }

    /// Expression holding the module object behind `binding`.
    fn bind(&mut self, binding: &Binding) -> String {
        match binding {
            Binding::Local(name) => name.clone(),
            Binding::External(specifier) => self.external_namespace(specifier),
        }
    }

    fn external_namespace(&mut self, specifier: &str) -> String {
        let index = match self.externals.iter().position(|s| s == specifier) {
            Some(index) => index,
            None => {
                self.externals.push(specifier.to_string());
                self.externals.len() - 1
            }
        };
        format!("__x{index}")
    }

    /// Resolve an import of `importer`, linking local modules on first use.
    fn dependency(&mut self, specifier: &str, importer: &Path) -> Result<Binding, ProcessError> {
        let path = match resolve(specifier, importer, self.options)? {
            Resolved::External(spec) => return Ok(Binding::External(spec)),
            Resolved::Local(path) => path,
        };

        if let Some(name) = self.linked.get(&path) {
            return Ok(Binding::Local(name.clone()));
        }
        if self.visiting.contains(&path) {
            let cycle = relative_display(&path, &self.options.src);
            return Err(ProcessError::transform(
                importer,
                [format!("circular import of `{cycle}` cannot be bundled")],
            ));
        }

        self.visiting.insert(path.clone());
        let name = self.link(&path, Role::Dependency, specifier)?;
        self.visiting.remove(&path);

        self.linked.insert(path, name.clone());
        Ok(Binding::Local(name))
    }

    /// Rewrite one module.
    ///
    /// For the entry this returns the rewritten source; for a dependency it
    /// pushes the wrapped module and returns the variable bound to it.
    /// Rewritten import bindings are hoisted to the top of the module body,
    /// since imports are initialized before any statement runs.
    fn link(&mut self, path: &Path, role: Role, specifier: &str) -> Result<String, ProcessError> {
        let source = fs::read_to_string(path).at(path)?;
        let source_type = match role {
            Role::Entry => script_source_type(path),
            Role::Dependency => SourceType::mjs(),
        };

        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, &source, source_type).parse();
        if !ret.errors.is_empty() {
            return Err(ProcessError::transform(
                path,
                ret.errors.iter().map(ToString::to_string),
            ));
        }

        if role == Role::Dependency && is_commonjs(&ret.program, &source) {
            let rel = relative_display(path, &self.options.src);
            return Err(ProcessError::transform(
                path,
                [
                    format!("`{rel}` is a CommonJS module; only ES modules can be bundled"),
                    format!("hint: keep it out of the bundle with `--external {specifier}`"),
                ],
            ));
        }

        let mut edits = Vec::new();
        let mut exports = Vec::new();
        let mut hoisted = Vec::new();

        for stmt in &ret.program.body {
            match stmt {
                Statement::ImportDeclaration(decl) => {
                    let binding = self.dependency(decl.source.value.as_str(), path)?;
                    if role == Role::Entry && matches!(binding, Binding::External(_)) {
                        continue;
                    }
                    let namespace = self.bind(&binding);
                    let text = import_bindings(&source, decl, &namespace);
                    if !text.is_empty() {
                        hoisted.push(text);
                    }
                    edits.push(Edit::remove(decl.span));
                }

                Statement::ExportNamedDeclaration(decl) => {
                    if let Some(from) = &decl.source {
                        let binding = self.dependency(from.value.as_str(), path)?;
                        match (role, &binding) {
                            (Role::Entry, Binding::External(_)) => {}
                            (Role::Entry, Binding::Local(ns)) => {
                                let mut fields = Vec::new();
                                let mut names = Vec::new();
                                for spec in &decl.specifiers {
                                    let local = self.fresh("__e");
                                    fields.push(format!("{}: {local}", export_name(&source, &spec.local)));
                                    names.push(format!("{local} as {}", export_name(&source, &spec.exported)));
                                }
                                let text = format!(
                                    "const {{ {} }} = {ns}; export {{ {} }};",
                                    fields.join(", "),
                                    names.join(", ")
                                );
                                edits.push(Edit::replace(decl.span, text));
                            }
                            (Role::Dependency, _) => {
                                let namespace = self.bind(&binding);
                                for spec in &decl.specifiers {
                                    let key = export_name(&source, &spec.exported).to_string();
                                    let value = member(&namespace, export_name(&source, &spec.local));
                                    exports.push(ExportEntry::Named(key, value));
                                }
                                edits.push(Edit::remove(decl.span));
                            }
                        }
                    } else if role == Role::Dependency {
                        if let Some(declaration) = &decl.declaration {
                            edits.push(Edit::range(decl.span.start, declaration.span().start, ""));
                            for name in declared_names(declaration) {
                                exports.push(ExportEntry::Named(name.clone(), name));
                            }
                        } else {
                            for spec in &decl.specifiers {
                                let key = export_name(&source, &spec.exported).to_string();
                                let value = export_name(&source, &spec.local).to_string();
                                exports.push(ExportEntry::Named(key, value));
                            }
                            edits.push(Edit::remove(decl.span));
                        }
                    }
                }

                Statement::ExportDefaultDeclaration(decl) if role == Role::Dependency => {
                    let inner = decl.declaration.span();
                    let named = match &decl.declaration {
                        ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
                            func.id.as_ref().map(|id| id.name.to_string())
                        }
                        ExportDefaultDeclarationKind::ClassDeclaration(class) => {
                            class.id.as_ref().map(|id| id.name.to_string())
                        }
                        _ => None,
                    };
                    match named {
                        Some(name) => {
                            edits.push(Edit::range(decl.span.start, inner.start, ""));
                            exports.push(ExportEntry::Named("default".into(), name));
                        }
                        None => {
                            let local = self.fresh("__d");
                            edits.push(Edit::range(
                                decl.span.start,
                                inner.start,
                                format!("const {local} = "),
                            ));
                            edits.push(Edit::insert(decl.span.end, ";"));
                            exports.push(ExportEntry::Named("default".into(), local));
                        }
                    }
                }

                Statement::ExportAllDeclaration(decl) => {
                    let binding = self.dependency(decl.source.value.as_str(), path)?;
                    match (role, &binding, &decl.exported) {
                        (Role::Entry, Binding::External(_), _) => {}
                        (Role::Entry, Binding::Local(ns), Some(exported)) => {
                            let local = self.fresh("__e");
                            let text = format!(
                                "const {local} = {ns}; export {{ {local} as {} }};",
                                export_name(&source, exported)
                            );
                            edits.push(Edit::replace(decl.span, text));
                        }
                        (Role::Entry, Binding::Local(_), None) => {
                            return Err(ProcessError::transform(
                                path,
                                [format!(
                                    "`{}` cannot be bundled into an entry file; import the names it needs instead",
                                    span_text(&source, decl.span)
                                )],
                            ));
                        }
                        (Role::Dependency, _, Some(exported)) => {
                            let key = export_name(&source, exported).to_string();
                            exports.push(ExportEntry::Named(key, self.bind(&binding)));
                            edits.push(Edit::remove(decl.span));
                        }
                        (Role::Dependency, _, None) => {
                            exports.push(ExportEntry::Star(self.bind(&binding)));
                            edits.push(Edit::remove(decl.span));
                        }
                    }
                }

                _ => {}
            }
        }

        if !hoisted.is_empty() {
            let start = ret.program.hashbang.as_ref().map_or(0, |h| h.span.end);
            edits.push(Edit::insert(start, format!("{}\n", hoisted.join("\n"))));
        }

        let body = apply_edits(&source, edits);
        match role {
            Role::Entry => Ok(body),
            Role::Dependency => {
                let name = format!("__m{}", self.chunks.len());
                self.chunks.push(wrap_module(&name, &body, &exports));
                Ok(name)
            }
        }
    }

    /// Hoisted external imports, then dependencies, then the entry.
    fn finish(self, entry: &str) -> String {
        let mut out = String::new();
        for (index, specifier) in self.externals.iter().enumerate() {
            let quoted = serde_json::to_string(specifier).unwrap_or_default();
            out.push_str(&format!("import * as __x{index} from {quoted};\n"));
        }
        for chunk in &self.chunks {
            out.push_str(chunk);
        }
        out.push_str(entry);
        out
    }
}

/// Whether a dependency is CommonJS rather than an ES module.
///
/// A module with import/export statements is CommonJS only if it also
/// assigns `module.exports`/`exports.*` or calls `require` at the top level.
/// Without module syntax any mention of those is enough, which covers
/// UMD wrappers; plain side-effect scripts still pass.
fn is_commonjs(program: &Program, source: &str) -> bool {
    let has_module_syntax = program.body.iter().any(|stmt| {
        matches!(
            stmt,
            Statement::ImportDeclaration(_)
                | Statement::ExportNamedDeclaration(_)
                | Statement::ExportDefaultDeclaration(_)
                | Statement::ExportAllDeclaration(_)
        )
    });

    if !has_module_syntax {
        return ["module.exports", "exports.", "require("]
            .iter()
            .any(|needle| source.contains(needle));
    }

    program.body.iter().any(|stmt| match stmt {
        Statement::ExpressionStatement(stmt) => match &stmt.expression {
            Expression::AssignmentExpression(assign) => {
                let target = span_text(source, assign.left.span());
                target == "module.exports"
                    || target.starts_with("module.exports.")
                    || target.starts_with("exports.")
            }
            expr => is_require(expr),
        },
        Statement::VariableDeclaration(var) => var
            .declarations
            .iter()
            .any(|declarator| declarator.init.as_ref().is_some_and(is_require)),
        _ => false,
    })
}

fn is_require(expr: &Expression) -> bool {
    matches!(expr, Expression::CallExpression(call)
        if matches!(&call.callee, Expression::Identifier(id) if id.name.as_str() == "require"))
}
