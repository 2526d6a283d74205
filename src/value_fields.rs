//! Value-Field Map Builder (C3): `fqClass.field -> resolvedString` for
//! `@Value` fields and `static final String` constants.

use std::collections::HashMap;

use tree_sitter::{Node, QueryCursor, Tree};

use crate::ast;
use crate::properties::{self, PropertyMap};

/// Walk every field declaration in one parsed file and record `@Value`
/// fields and `static final String` constants into `out`, keyed by
/// `fqClass.field`. Recursively resolves placeholders via C1.
pub fn collect(tree: &Tree, code: &[u8], class_fqn: &str, props: &PropertyMap, out: &mut HashMap<String, String>) {
    let mut cursor = QueryCursor::new();
    for m in cursor.matches(ast::field_query(), tree.root_node(), code) {
        let mut modifiers_node: Option<Node> = None;
        let mut field_name = None;
        let mut initializer = None;
        for capture in m.captures {
            let capture_name = ast::field_query().capture_names()[capture.index as usize];
            match capture_name {
                "modifiers" => modifiers_node = Some(capture.node),
                "field_name" => field_name = capture.node.utf8_text(code).ok(),
                "field_initializer" => initializer = Some(capture.node),
                _ => {}
            }
        }
        let Some(field_name) = field_name else { continue };
        let key = format!("{}.{}", class_fqn, field_name);

        let modifiers_text = modifiers_node.and_then(|n| n.utf8_text(code).ok()).unwrap_or("");
        let has_value_annotation = modifiers_text.contains("@Value");
        let is_static_final_string =
            modifiers_text.contains("static") && modifiers_text.contains("final") && modifiers_text.contains("String");

        if has_value_annotation {
            if let Some(value_literal) = extract_value_annotation_arg(modifiers_text) {
                out.insert(key, properties::resolve_all(&value_literal, props));
            }
        } else if is_static_final_string {
            if let Some(init_node) = initializer {
                if init_node.kind() == "string_literal" {
                    if let Ok(raw) = init_node.utf8_text(code) {
                        let literal = raw.trim_matches('"');
                        out.insert(key, properties::resolve_all(literal, props));
                    }
                }
            }
        }
    }
}

/// Pull the string literal argument out of an `@Value("${...}")`-shaped
/// annotation's raw modifiers text. `modifiers_text` is the full modifiers
/// node span, so this scans for the first quoted literal following `@Value`.
fn extract_value_annotation_arg(modifiers_text: &str) -> Option<String> {
    let start = modifiers_text.find("@Value")?;
    let rest = &modifiers_text[start..];
    let quote_start = rest.find('"')?;
    let after = &rest[quote_start + 1..];
    let quote_end = after.find('"')?;
    Some(after[..quote_end].to_string())
}
