//! Recursive extraction of string literals from a Java expression tree:
//! powers URL/topic literal extraction in the component parser. Mirrors the
//! recursive `TreeCursor` walk pattern used for finally-block detection.

use std::collections::HashMap;

use tree_sitter::Node;

use crate::config::ConfigStore;
use crate::properties::{self, PropertyMap};

pub const DYNAMIC: &str = "<dynamic>";

/// Everything `extract_string_from_expression` needs to resolve a literal
/// without re-walking the whole file: the value-field map built by C3, the
/// enclosing method's local variable initializers/assignments, and the
/// method's formal parameter names (so a parameter read is reported as
/// dynamic rather than unresolved).
pub struct ExprContext<'a> {
    pub code: &'a [u8],
    pub value_field_map: &'a HashMap<String, String>,
    pub current_class_fqn: &'a str,
    pub local_initializers: &'a HashMap<String, String>,
    pub method_params: &'a [String],
    pub props: &'a PropertyMap,
}

/// Recursively reduce an expression node to a best-effort string literal.
pub fn extract_string_from_expression(node: Node, ctx: &ExprContext) -> String {
    match node.kind() {
        "string_literal" => {
            let raw = node.utf8_text(ctx.code).unwrap_or("");
            let unquoted = raw.trim_matches('"');
            properties::resolve_all(unquoted, ctx.props)
        }
        "field_access" => extract_field_read(node, ctx),
        "identifier" => extract_variable_read(node, ctx),
        "binary_expression" => extract_binary_concat(node, ctx),
        "method_invocation" => extract_method_call_literal(node, ctx),
        _ => DYNAMIC.to_string(),
    }
}

fn extract_field_read(node: Node, ctx: &ExprContext) -> String {
    let field_name = node
        .child_by_field_name("field")
        .and_then(|n| n.utf8_text(ctx.code).ok())
        .unwrap_or("");
    if field_name.is_empty() {
        return DYNAMIC.to_string();
    }
    let qualified_key = format!("{}.{}", ctx.current_class_fqn, field_name);
    if let Some(value) = ctx.value_field_map.get(&qualified_key) {
        return value.clone();
    }
    // Suffix match: the receiver's exact declaring class wasn't recorded.
    let suffix = format!(".{}", field_name);
    if let Some((_, value)) = ctx.value_field_map.iter().find(|(k, _)| k.ends_with(&suffix)) {
        return value.clone();
    }
    DYNAMIC.to_string()
}

fn extract_variable_read(node: Node, ctx: &ExprContext) -> String {
    let name = node.utf8_text(ctx.code).unwrap_or("");
    if let Some(value) = ctx.local_initializers.get(name) {
        return value.clone();
    }
    // A bare identifier that tree-sitter's grammar cannot distinguish from a
    // local variable is, in practice, often an unqualified reference to a
    // `static final` field on the same class (e.g. `kafkaTemplate.send(MARKS,
    // ...)`); fall back to the same value-field lookup `extract_field_read`
    // uses for an explicit `this.FIELD`/qualified read before giving up.
    let qualified_key = format!("{}.{}", ctx.current_class_fqn, name);
    if let Some(value) = ctx.value_field_map.get(&qualified_key) {
        return value.clone();
    }
    DYNAMIC.to_string()
}

fn extract_binary_concat(node: Node, ctx: &ExprContext) -> String {
    let operator = node
        .child_by_field_name("operator")
        .and_then(|n| n.utf8_text(ctx.code).ok())
        .unwrap_or("");
    if operator != "+" {
        return DYNAMIC.to_string();
    }
    let left = node
        .child_by_field_name("left")
        .map(|n| extract_string_from_expression(n, ctx))
        .unwrap_or_else(|| DYNAMIC.to_string());
    let right = node
        .child_by_field_name("right")
        .map(|n| extract_string_from_expression(n, ctx))
        .unwrap_or_else(|| DYNAMIC.to_string());
    format!("{}{}", left, right)
}

fn extract_method_call_literal(node: Node, ctx: &ExprContext) -> String {
    let method_name = node
        .child_by_field_name("name")
        .and_then(|n| n.utf8_text(ctx.code).ok())
        .unwrap_or("");
    if method_name != "format" {
        return DYNAMIC.to_string();
    }
    if let Some(args) = node.child_by_field_name("arguments") {
        if let Some(first_arg) = args.named_child(0) {
            return extract_string_from_expression(first_arg, ctx);
        }
    }
    DYNAMIC.to_string()
}

/// Standalone config-aware wrapper checked by callers that only need the
/// dynamic/static question without caring *which* literal resolved.
pub fn is_dynamic(value: &str) -> bool {
    value == DYNAMIC || value.contains("${") || value.contains("#{")
}

#[allow(dead_code)]
pub fn allowed_for_analysis(config: &ConfigStore, qualified_name: &str) -> bool {
    !config.is_standard_type(qualified_name)
}
