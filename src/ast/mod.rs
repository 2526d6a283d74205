//! AST Frontend (C2): classpath-free Java parsing via `tree-sitter`/`tree-sitter-java`,
//! plus the precompiled structural queries that feed the classifier and Pass 1.

use std::cell::RefCell;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use tree_sitter::{Parser, Query, QueryCursor, Tree};

thread_local! {
    /// One Parser per thread, reused across files: `Parser::new()`/`set_language()`
    /// touch native state and are too costly to pay per file under `rayon`.
    static JAVA_PARSER: RefCell<Option<Parser>> = const { RefCell::new(None) };
}

fn with_parser<F, R>(f: F) -> Result<R>
where
    F: FnOnce(&mut Parser) -> Result<R>,
{
    JAVA_PARSER.with(|cell| {
        let mut parser_opt = cell.borrow_mut();
        if parser_opt.is_none() {
            let mut parser = Parser::new();
            parser
                .set_language(&tree_sitter_java::language())
                .map_err(|e| anyhow!("failed to set tree-sitter-java language: {e}"))?;
            *parser_opt = Some(parser);
        }
        f(parser_opt.as_mut().unwrap())
    })
}

/// Parse one Java source file with no classpath; unresolved references are
/// treated as best-effort type names by every later pass.
pub fn parse(code: &str, file_path: &Path) -> Result<Tree> {
    with_parser(|parser| {
        parser
            .parse(code, None)
            .with_context(|| format!("tree-sitter failed to parse {}", file_path.display()))
    })
}

static TYPE_DECL_QUERY: Lazy<Query> = Lazy::new(|| {
    // Supertype names are matched both bare (`Foo`) and generic (`Foo<Bar>`,
    // where only the raw `Foo` is captured here) since Spring Data
    // repositories are always declared with a generic supertype.
    let source = r#"
        (class_declaration
            name: (identifier) @class_name
            superclass: (superclass [
                (type_identifier) @extends_name
                (generic_type (type_identifier) @extends_name)
            ])?
            interfaces: (super_interfaces (type_list [
                (type_identifier) @implements_name
                (generic_type (type_identifier) @implements_name)
            ]))?
        ) @class_decl
        (interface_declaration
            name: (identifier) @iface_name
            (extends_interfaces (type_list [
                (type_identifier) @iface_extends_name
                (generic_type (type_identifier) @iface_extends_name)
            ]))?
        ) @iface_decl
    "#;
    Query::new(&tree_sitter_java::language(), source).expect("type declaration query must compile")
});

static ANNOTATION_QUERY: Lazy<Query> = Lazy::new(|| {
    let source = r#"
        [
            (marker_annotation name: (identifier) @name)
            (annotation name: (identifier) @name arguments: (annotation_argument_list) @args)
        ] @annotation
    "#;
    Query::new(&tree_sitter_java::language(), source).expect("annotation query must compile")
});

static FIELD_QUERY: Lazy<Query> = Lazy::new(|| {
    let source = r#"
        (field_declaration
            (modifiers)? @modifiers
            type: (_) @field_type
            declarator: (variable_declarator
                name: (identifier) @field_name
                value: (_)? @field_initializer
            )
        ) @field_decl
    "#;
    Query::new(&tree_sitter_java::language(), source).expect("field query must compile")
});

static METHOD_QUERY: Lazy<Query> = Lazy::new(|| {
    let source = r#"
        (method_declaration
            (modifiers)? @modifiers
            type: (_) @return_type
            name: (identifier) @method_name
            parameters: (formal_parameters) @params
        ) @method_decl
    "#;
    Query::new(&tree_sitter_java::language(), source).expect("method query must compile")
});

static CONSTRUCTOR_QUERY: Lazy<Query> = Lazy::new(|| {
    let source = r#"
        (constructor_declaration
            (modifiers)? @modifiers
            name: (identifier) @ctor_name
            parameters: (formal_parameters) @params
        ) @ctor_decl
    "#;
    Query::new(&tree_sitter_java::language(), source).expect("constructor query must compile")
});

static INVOCATION_QUERY: Lazy<Query> = Lazy::new(|| {
    let source = r#"
        (method_invocation
            object: (_)? @receiver
            name: (identifier) @method_name
            arguments: (argument_list) @arguments
        ) @invocation
    "#;
    Query::new(&tree_sitter_java::language(), source).expect("invocation query must compile")
});

static IMPORT_QUERY: Lazy<Query> = Lazy::new(|| {
    let source = r#"
        (import_declaration
            [
                (scoped_identifier) @import_name
                (identifier) @import_name
            ]
        )
    "#;
    Query::new(&tree_sitter_java::language(), source).expect("import query must compile")
});

static PACKAGE_QUERY: Lazy<Query> = Lazy::new(|| {
    let source = r#"
        (package_declaration
            [
                (scoped_identifier) @package_name
                (identifier) @package_name
            ]
        )
    "#;
    Query::new(&tree_sitter_java::language(), source).expect("package query must compile")
});

pub fn type_decl_query() -> &'static Query {
    &TYPE_DECL_QUERY
}
pub fn annotation_query() -> &'static Query {
    &ANNOTATION_QUERY
}
pub fn field_query() -> &'static Query {
    &FIELD_QUERY
}
pub fn method_query() -> &'static Query {
    &METHOD_QUERY
}
pub fn constructor_query() -> &'static Query {
    &CONSTRUCTOR_QUERY
}
pub fn invocation_query() -> &'static Query {
    &INVOCATION_QUERY
}

/// Extract every `import` statement's dotted path, in declaration order.
pub fn extract_imports(tree: &Tree, code: &[u8]) -> Vec<String> {
    let mut cursor = QueryCursor::new();
    let mut imports = Vec::new();
    for m in cursor.matches(&IMPORT_QUERY, tree.root_node(), code) {
        for capture in m.captures {
            if let Ok(text) = capture.node.utf8_text(code) {
                imports.push(text.to_string());
            }
        }
    }
    imports
}

/// Extract the file's `package` declaration, if present.
pub fn extract_package(tree: &Tree, code: &[u8]) -> Option<String> {
    let mut cursor = QueryCursor::new();
    cursor
        .matches(&PACKAGE_QUERY, tree.root_node(), code)
        .next()
        .and_then(|m| m.captures.first().cloned())
        .and_then(|c| c.node.utf8_text(code).ok())
        .map(|s| s.to_string())
}
