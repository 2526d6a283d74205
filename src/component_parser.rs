//! Component Parser — Pass 1 (C5) plus Repository Analysis (§4.5 sub-step):
//! walks one parsed Java file's type declarations into [`ParsedComponent`]
//! records with fields, methods, injected dependencies, and raw/external/
//! Kafka call captures.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tree_sitter::{Node, QueryCursor, Tree};

use crate::ast;
use crate::classifier::{self, ClassificationInput};
use crate::config::ConfigStore;
use crate::expr::{self, ExprContext, DYNAMIC};
use crate::model::*;
use crate::properties::PropertyMap;
use crate::symbol_table::ImportIndex;

static ANNOTATION_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"@([A-Za-z_][A-Za-z0-9_]*)").unwrap());

/// A Feign client interface's per-method mapping, discovered while walking a
/// single file. Collected separately from [`ParsedComponent`] because a
/// `@FeignClient` interface is not itself a Spring stereotype component, and
/// because the caller may live in a different file than the client it calls.
#[derive(Debug, Clone, Default)]
pub struct FeignClientInfo {
    pub qualified_name: String,
    pub simple_name: String,
    pub methods: HashMap<String, (HttpMethod, String)>,
}

pub struct FileParseInput<'a> {
    pub code: &'a [u8],
    pub file_path: &'a Path,
    pub package: Option<String>,
    pub imports: Vec<String>,
    pub props: &'a PropertyMap,
    pub config: &'a ConfigStore,
    pub value_field_map: &'a HashMap<String, String>,
    pub base_package: Option<&'a str>,
    /// Repository-wide `entity simple name -> (tableName, tableSource)` map
    /// built from every class's `@Table`/`@Document` annotation (see
    /// [`scan_entity_table_annotations`]), consulted by [`analyze_repository`]
    /// since the entity class usually lives in a different file than the
    /// repository interface that names it.
    pub entity_table_map: &'a HashMap<String, (String, TableSource)>,
}

/// Scan one file's class/interface declarations for `@Table(name=...)` or
/// `@Document(collection=...)` annotations, returning `(simpleName,
/// tableName, source)` triples. Run repository-wide (like the value-field
/// map) since the entity and the repository interface that references it are
/// rarely declared in the same file.
pub fn scan_entity_table_annotations(tree: &Tree, code: &[u8]) -> Vec<(String, String, TableSource)> {
    let mut out = Vec::new();
    let mut cursor = QueryCursor::new();
    let names = ast::type_decl_query().capture_names();
    for m in cursor.matches(ast::type_decl_query(), tree.root_node(), code) {
        let mut decl_node = None;
        let mut class_name = None;
        for capture in m.captures {
            match names[capture.index as usize] {
                "class_decl" | "iface_decl" => decl_node = Some(capture.node),
                "class_name" | "iface_name" => class_name = capture.node.utf8_text(code).ok(),
                _ => {}
            }
        }
        let (Some(decl_node), Some(class_name)) = (decl_node, class_name) else { continue };
        let modifiers_text = leading_modifiers_text(decl_node, code);
        if let Some(table_name) = annotation_named_arg("Table", "name", modifiers_text) {
            out.push((class_name.to_string(), table_name, TableSource::Table));
        } else if let Some(collection) = annotation_named_arg("Document", "collection", modifiers_text) {
            out.push((class_name.to_string(), collection, TableSource::Document));
        }
    }
    out
}

#[derive(Debug, Default)]
pub struct FileParseOutput {
    pub components: Vec<ParsedComponent>,
    pub feign_clients: Vec<FeignClientInfo>,
}

/// Walk every top-level and nested type declaration in one parsed file.
pub fn parse_file(tree: &Tree, input: &FileParseInput) -> FileParseOutput {
    let code = input.code;
    let import_index = ImportIndex::from_imports(input.imports.clone(), input.package.clone());
    let mut output = FileParseOutput::default();

    let mut cursor = QueryCursor::new();
    for m in cursor.matches(ast::type_decl_query(), tree.root_node(), code) {
        let Some(decl) = TypeDecl::from_match(&m, code) else { continue };
        if !classifier::is_in_scope(input.package.as_deref(), input.base_package) {
            continue;
        }

        let modifiers_text = leading_modifiers_text(decl.decl_node, code);
        let annotations = annotation_names(modifiers_text);

        if annotations.iter().any(|a| a == "FeignClient") {
            if let Some(feign) = extract_feign_client(&decl, code, &input.package, modifiers_text) {
                output.feign_clients.push(feign);
            }
            continue;
        }

        let has_kafka_listener_method = method_nodes(decl.decl_node, code)
            .iter()
            .any(|method| method_has_any_annotation(*method, code, &["KafkaListener", "KafkaHandler"]));

        let classification_input = ClassificationInput {
            class_level_annotations: &annotations,
            is_interface: decl.is_interface,
            extended_interface_names: &decl.extends_interfaces,
            has_kafka_listener_method,
        };
        let component_type = classifier::classify(&classification_input);
        if component_type == ComponentType::Unknown {
            continue;
        }

        let qualified_name = qualify(&decl.name, &input.package);
        let mut component = ParsedComponent::new(
            &decl.name,
            &qualified_name,
            input.package.clone(),
            component_type,
            decl.decl_node.start_position().row + 1,
            decl.decl_node.end_position().row + 1,
        );
        component.extends_class = decl.extends.clone();
        component.implemented_interfaces = resolve_interface_names(&decl.implements, &import_index);

        let base_path = class_level_base_path(modifiers_text);
        component.base_url = base_path.clone();

        let fields = collect_fields(decl.decl_node, code, input.config);
        let is_lombok_ctor = annotations.iter().any(|a| a == "RequiredArgsConstructor" || a == "AllArgsConstructor");
        apply_field_injections(&fields, is_lombok_ctor, &mut component);
        apply_constructor_injections(decl.decl_node, code, &fields, &mut component);

        let field_types: HashMap<String, (String, String)> =
            fields.iter().map(|f| (f.name.clone(), (f.type_simple.clone(), f.type_qualified.clone()))).collect();

        for method_node in method_nodes(decl.decl_node, code) {
            process_method(
                method_node,
                code,
                &qualified_name,
                component_type,
                base_path.as_deref().unwrap_or(""),
                &field_types,
                &import_index,
                input,
                &mut component,
            );
        }

        if component_type == ComponentType::Repository && decl.is_interface {
            analyze_repository(decl.decl_node, code, &import_index, input.entity_table_map, &mut component);
        }

        output.components.push(component);
    }

    output
}

fn qualify(simple: &str, package: &Option<String>) -> String {
    match package {
        Some(pkg) if !pkg.is_empty() => format!("{}.{}", pkg, simple),
        _ => simple.to_string(),
    }
}

fn annotation_names(modifiers_text: &str) -> Vec<String> {
    ANNOTATION_NAME.captures_iter(modifiers_text).map(|c| c[1].to_string()).collect()
}

/// Modifiers (including annotations) are the first positional child of a
/// declaration node when present, mirroring the pattern already used for
/// field declarations in [`ast::field_query`].
fn leading_modifiers_text<'a>(node: Node<'a>, code: &'a [u8]) -> &'a str {
    node.child(0)
        .filter(|c| c.kind() == "modifiers")
        .and_then(|c| c.utf8_text(code).ok())
        .unwrap_or("")
}

fn method_has_any_annotation(method_node: Node, code: &[u8], names: &[&str]) -> bool {
    let modifiers = leading_modifiers_text(method_node, code);
    let found = annotation_names(modifiers);
    found.iter().any(|f| names.contains(&f.as_str()))
}

/// The text span of one named annotation within a modifiers node, bounded by
/// the next `@` so sibling annotations' arguments are never scanned into it.
fn scoped_annotation_text<'a>(annotation_name: &str, modifiers_text: &'a str) -> Option<&'a str> {
    let marker = format!("@{}", annotation_name);
    let start = modifiers_text.find(&marker)?;
    let rest = &modifiers_text[start..];
    let end_bound = rest[marker.len()..].find('@').map(|i| i + marker.len()).unwrap_or(rest.len());
    Some(&rest[..end_bound])
}

fn annotation_first_string_arg(annotation_name: &str, modifiers_text: &str) -> Option<String> {
    let scoped = scoped_annotation_text(annotation_name, modifiers_text)?;
    let quote_start = scoped.find('"')?;
    let after = &scoped[quote_start + 1..];
    let quote_end = after.find('"')?;
    Some(after[..quote_end].to_string())
}

fn annotation_named_arg(annotation_name: &str, key: &str, modifiers_text: &str) -> Option<String> {
    let scoped = scoped_annotation_text(annotation_name, modifiers_text)?;
    let pattern = format!(r#"{}\s*=\s*"([^"]*)""#, regex::escape(key));
    let re = Regex::new(&pattern).ok()?;
    re.captures(scoped).map(|c| c[1].to_string())
}

/// Class-level `@RequestMapping`/`@FeignClient` base path, preferring a named
/// `value=`/`path=` argument and otherwise the annotation's first literal.
fn class_level_base_path(modifiers_text: &str) -> Option<String> {
    for annotation in ["RequestMapping", "FeignClient"] {
        if let Some(scoped) = scoped_annotation_text(annotation, modifiers_text) {
            if let Some(named) = annotation_named_arg(annotation, "path", scoped).or_else(|| annotation_named_arg(annotation, "value", scoped)) {
                return Some(named);
            }
            if let Some(first) = annotation_first_string_arg(annotation, modifiers_text) {
                return Some(first);
            }
        }
    }
    None
}

fn join_paths(base: &str, method: &str) -> String {
    let joined = format!("{}/{}", base.trim_end_matches('/'), method.trim_start_matches('/'));
    let mut result = joined.replace("//", "/");
    if result.len() > 1 && result.ends_with('/') {
        result.pop();
    }
    if result.is_empty() {
        result.push('/');
    }
    result
}

struct TypeDecl<'a> {
    decl_node: Node<'a>,
    name: String,
    is_interface: bool,
    extends: Option<String>,
    implements: Vec<String>,
    extends_interfaces: Vec<String>,
}

impl<'a> TypeDecl<'a> {
    fn from_match(m: &tree_sitter::QueryMatch<'a, 'a>, code: &'a [u8]) -> Option<Self> {
        let names = ast::type_decl_query().capture_names();
        let mut decl_node = None;
        let mut is_interface = false;
        let mut name = None;
        let mut extends = None;
        let mut implements = Vec::new();
        let mut extends_interfaces = Vec::new();

        for capture in m.captures {
            match names[capture.index as usize] {
                "class_decl" => {
                    decl_node = Some(capture.node);
                    is_interface = false;
                }
                "iface_decl" => {
                    decl_node = Some(capture.node);
                    is_interface = true;
                }
                "class_name" | "iface_name" => name = capture.node.utf8_text(code).ok().map(String::from),
                "extends_name" => extends = capture.node.utf8_text(code).ok().map(String::from),
                "implements_name" => {
                    if let Ok(text) = capture.node.utf8_text(code) {
                        implements.push(text.to_string());
                    }
                }
                "iface_extends_name" => {
                    if let Ok(text) = capture.node.utf8_text(code) {
                        extends_interfaces.push(text.to_string());
                    }
                }
                _ => {}
            }
        }

        Some(TypeDecl {
            decl_node: decl_node?,
            name: name?,
            is_interface,
            extends,
            implements,
            extends_interfaces,
        })
    }
}

fn type_simple_name(type_text: &str) -> String {
    let no_generic = match type_text.find('<') {
        Some(i) => &type_text[..i],
        None => type_text,
    };
    let no_array = no_generic.trim_end_matches("[]").trim();
    no_array.rsplit('.').next().unwrap_or(no_array).to_string()
}

fn type_qualified_raw(type_text: &str) -> String {
    match type_text.find('<') {
        Some(i) => type_text[..i].trim().to_string(),
        None => type_text.trim().to_string(),
    }
}

fn resolve_type(type_text: &str, import_index: &ImportIndex) -> (String, String) {
    let simple = type_simple_name(type_text);
    let raw_qualified = type_qualified_raw(type_text);
    let qualified = if raw_qualified.contains('.') {
        raw_qualified
    } else {
        import_index.resolve(&simple, &HashMap::new()).unwrap_or(raw_qualified)
    };
    (simple, qualified)
}

fn resolve_interface_names(names: &[String], import_index: &ImportIndex) -> Vec<String> {
    let mut out = Vec::new();
    for name in names {
        let (simple, qualified) = resolve_type(name, import_index);
        if !out.contains(&simple) {
            out.push(simple.clone());
        }
        if qualified != simple && !out.contains(&qualified) {
            out.push(qualified);
        }
    }
    out
}

struct FieldInfo {
    name: String,
    type_simple: String,
    type_qualified: String,
    is_static: bool,
    is_final: bool,
    annotations: Vec<String>,
}

fn collect_fields(decl_node: Node, code: &[u8], config: &ConfigStore) -> Vec<FieldInfo> {
    let mut fields = Vec::new();
    let mut cursor = QueryCursor::new();
    let names = ast::field_query().capture_names();
    for m in cursor.matches(ast::field_query(), decl_node, code) {
        let mut modifiers_text = "";
        let mut type_text = "";
        let mut field_name = None;
        for capture in m.captures {
            match names[capture.index as usize] {
                "modifiers" => modifiers_text = capture.node.utf8_text(code).unwrap_or(""),
                "field_type" => type_text = capture.node.utf8_text(code).unwrap_or(""),
                "field_name" => field_name = capture.node.utf8_text(code).ok(),
                _ => {}
            }
        }
        let Some(field_name) = field_name else { continue };
        let (type_simple, type_qualified) = resolve_type(type_text, &ImportIndex::default());
        if config.is_standard_type(&type_qualified) {
            continue;
        }
        fields.push(FieldInfo {
            name: field_name.to_string(),
            type_simple,
            type_qualified,
            is_static: modifiers_text.contains("static"),
            is_final: modifiers_text.contains("final"),
            annotations: annotation_names(modifiers_text),
        });
    }
    fields
}

fn apply_field_injections(fields: &[FieldInfo], is_lombok_ctor: bool, component: &mut ParsedComponent) {
    for field in fields {
        if is_lombok_ctor && field.is_final && !field.is_static {
            component.injected_dependencies.insert(
                field.name.clone(),
                InjectedDependency::new(&field.name, &field.type_simple, &field.type_qualified, InjectionType::Constructor),
            );
            continue;
        }
        if field.annotations.iter().any(|a| a == "Autowired" || a == "Inject" || a == "Resource") {
            component.injected_dependencies.insert(
                field.name.clone(),
                InjectedDependency::new(&field.name, &field.type_simple, &field.type_qualified, InjectionType::FieldAutowired),
            );
        }
    }
}

fn apply_constructor_injections(decl_node: Node, code: &[u8], fields: &[FieldInfo], component: &mut ParsedComponent) {
    let mut cursor = QueryCursor::new();
    let names = ast::constructor_query().capture_names();
    for m in cursor.matches(ast::constructor_query(), decl_node, code) {
        let mut params_node = None;
        for capture in m.captures {
            if names[capture.index as usize] == "params" {
                params_node = Some(capture.node);
            }
        }
        let Some(params_node) = params_node else { continue };
        for (_, param_type) in extract_formal_params(params_node, code) {
            let (param_simple, _) = resolve_type(&param_type, &ImportIndex::default());
            if let Some(field) = fields.iter().find(|f| f.type_simple == param_simple) {
                component.injected_dependencies.insert(
                    field.name.clone(),
                    InjectedDependency::new(&field.name, &field.type_simple, &field.type_qualified, InjectionType::Constructor),
                );
            }
        }
    }
}

fn extract_formal_params<'a>(params_node: Node<'a>, code: &'a [u8]) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut cursor = params_node.walk();
    for child in params_node.children(&mut cursor) {
        if child.kind() == "formal_parameter" || child.kind() == "spread_parameter" {
            let type_text = child.child_by_field_name("type").and_then(|n| n.utf8_text(code).ok()).unwrap_or("");
            let name_text = child.child_by_field_name("name").and_then(|n| n.utf8_text(code).ok()).unwrap_or("");
            if !name_text.is_empty() {
                out.push((name_text.to_string(), type_text.to_string()));
            }
        }
    }
    out
}

fn method_nodes<'a>(decl_node: Node<'a>, code: &'a [u8]) -> Vec<Node<'a>> {
    let mut cursor = QueryCursor::new();
    let names = ast::method_query().capture_names();
    let mut out = Vec::new();
    for m in cursor.matches(ast::method_query(), decl_node, code) {
        for capture in m.captures {
            if names[capture.index as usize] == "method_decl" {
                out.push(capture.node);
            }
        }
        let _ = code;
    }
    out
}

#[allow(clippy::too_many_arguments)]
fn process_method(
    method_node: Node,
    code: &[u8],
    class_fqn: &str,
    component_type: ComponentType,
    base_path: &str,
    field_types: &HashMap<String, (String, String)>,
    import_index: &ImportIndex,
    input: &FileParseInput,
    component: &mut ParsedComponent,
) {
    let modifiers_text = leading_modifiers_text(method_node, code);
    let annotations = annotation_names(modifiers_text);
    let method_name = method_node.child_by_field_name("name").and_then(|n| n.utf8_text(code).ok()).unwrap_or("");
    let return_type = method_node.child_by_field_name("type").and_then(|n| n.utf8_text(code).ok()).unwrap_or("void");
    let params_node = method_node.child_by_field_name("parameters");
    let params = params_node.map(|p| extract_formal_params(p, code)).unwrap_or_default();
    let param_types: Vec<String> = params.iter().map(|(_, t)| t.clone()).collect();
    let param_names: Vec<String> = params.iter().map(|(n, _)| n.clone()).collect();
    let line_start = method_node.start_position().row + 1;
    let line_end = method_node.end_position().row + 1;

    let mapping_annotation = annotations.iter().find(|a| input.config.mapping_annotations.contains(a.as_str()));
    let is_kafka_listener_method = annotations.iter().any(|a| a == "KafkaListener" || a == "KafkaHandler");
    let is_bean_method = annotations.iter().any(|a| a == "Bean");

    match component_type {
        ComponentType::RestController | ComponentType::Controller => {
            let Some(mapping) = mapping_annotation else { return };
            let mut parsed = ParsedMethod::new(method_name, &param_types, line_start, line_end);
            parsed.http_method = input.config.annotation_to_http_method(mapping);
            let method_path = annotation_named_arg(mapping, "path", modifiers_text)
                .or_else(|| annotation_named_arg(mapping, "value", modifiers_text))
                .or_else(|| annotation_first_string_arg(mapping, modifiers_text))
                .unwrap_or_default();
            parsed.path = Some(join_paths(base_path, &method_path));
            parsed.response_type = Some(return_type.to_string());
            if let Some(first_param_type) = param_types.first() {
                parsed.request_body_type = Some(first_param_type.clone());
            }
            capture_invocations(method_node, code, class_fqn, field_types, &param_names, import_index, input, &mut parsed);
            component.methods.push(parsed);
        }
        ComponentType::Configuration if is_bean_method => {
            let bean_name = annotation_named_arg("Bean", "name", modifiers_text)
                .or_else(|| annotation_first_string_arg("Bean", modifiers_text))
                .unwrap_or_else(|| method_name.to_string());
            let (bean_simple, bean_qualified) = resolve_type(return_type, import_index);
            component.beans.push(ParsedBean {
                method_name: method_name.to_string(),
                bean_type_simple: Some(bean_simple),
                bean_type_qualified: Some(bean_qualified),
                bean_name,
                line_start,
                line_end,
            });
        }
        ComponentType::KafkaListener if is_kafka_listener_method => {
            let raw_topic = annotation_named_arg("KafkaListener", "topics", modifiers_text)
                .or_else(|| annotation_named_arg("KafkaHandler", "topics", modifiers_text))
                .or_else(|| annotation_first_string_arg("KafkaListener", modifiers_text))
                .unwrap_or_default();
            let resolved = if expr::is_dynamic(&raw_topic) {
                None
            } else {
                Some(crate::properties::resolve_all(&raw_topic, input.props))
            };
            let topic_resolved = resolved.is_some();
            let effective_topic = resolved.clone().unwrap_or_else(|| DYNAMIC.to_string());
            let group_id = annotation_named_arg("KafkaListener", "groupId", modifiers_text)
                .map(|g| crate::properties::resolve_all(&g, input.props));
            component.kafka_listener_methods.push(KafkaListenerMethod {
                class_name: class_fqn.to_string(),
                method_name: method_name.to_string(),
                raw_topic,
                resolved_topic: resolved,
                effective_topic,
                topic_resolved,
                group_id,
                line_start,
                line_end,
            });
        }
        ComponentType::Service | ComponentType::KafkaListener => {
            let mut parsed = ParsedMethod::new(method_name, &param_types, line_start, line_end);
            parsed.response_type = Some(return_type.to_string());
            capture_invocations(method_node, code, class_fqn, field_types, &param_names, import_index, input, &mut parsed);
            component.methods.push(parsed);
        }
        _ => {}
    }
}

#[allow(clippy::too_many_arguments)]
fn capture_invocations(
    method_node: Node,
    code: &[u8],
    class_fqn: &str,
    field_types: &HashMap<String, (String, String)>,
    param_names: &[String],
    import_index: &ImportIndex,
    input: &FileParseInput,
    parsed: &mut ParsedMethod,
) {
    let Some(body) = method_node.child_by_field_name("body") else { return };

    let local_types = local_variable_types(body, code);
    let local_initializers = local_string_initializers(body, code, class_fqn, field_types, input);
    let (url_vars, http_url_method) = prescan_http_url_connection(body, code);

    let expr_ctx = ExprContext {
        code,
        value_field_map: input.value_field_map,
        current_class_fqn: class_fqn,
        local_initializers: &local_initializers,
        method_params: param_names,
        props: input.props,
    };

    let mut cursor = QueryCursor::new();
    let names = ast::invocation_query().capture_names();
    for m in cursor.matches(ast::invocation_query(), body, code) {
        let mut receiver = None;
        let mut method_name = None;
        let mut arguments = None;
        let mut invocation_node = None;
        for capture in m.captures {
            match names[capture.index as usize] {
                "receiver" => receiver = Some(capture.node),
                "method_name" => method_name = capture.node.utf8_text(code).ok(),
                "arguments" => arguments = Some(capture.node),
                "invocation" => invocation_node = Some(capture.node),
                _ => {}
            }
        }
        let (Some(method_name), Some(invocation_node)) = (method_name, invocation_node) else { continue };
        let args: Vec<Node> = arguments.map(|a| a.named_children(&mut a.walk()).collect()).unwrap_or_default();
        let line_start = invocation_node.start_position().row + 1;
        let line_end = invocation_node.end_position().row + 1;

        // WebClient fluent chains are captured once, at the `.uri(...)` call
        // that terminates the chain; the intermediate `.get()`/`.post()` call
        // is absorbed into that single external-call record.
        if method_name == "uri" {
            if let Some((base_text, chain_method)) = webclient_chain_base(invocation_node, code) {
                if let Some((decl_simple, decl_qualified)) =
                    lookup_declared_type(&base_text, field_types, &local_types, param_names, import_index)
                {
                    if decl_simple.ends_with("WebClient") || decl_qualified.ends_with("WebClient") {
                        let url = args.first().map(|n| expr::extract_string_from_expression(*n, &expr_ctx)).unwrap_or_else(|| DYNAMIC.to_string());
                        let http_method = match chain_method.as_str() {
                            "get" => HttpMethod::Get,
                            "post" => HttpMethod::Post,
                            "put" => HttpMethod::Put,
                            "delete" => HttpMethod::Delete,
                            "patch" => HttpMethod::Patch,
                            _ => HttpMethod::Request,
                        };
                        parsed.external_calls.push(ParsedExternalCall::new(ExternalClientType::WebClient, http_method, url, line_start, line_end));
                        continue;
                    }
                }
            }
        }

        if method_name == "openConnection" {
            if let Some(receiver_node) = receiver {
                if let Ok(receiver_text) = receiver_node.utf8_text(code) {
                    if let Some(url) = url_vars.get(receiver_text) {
                        let resolved_url = crate::properties::resolve_all(url, input.props);
                        parsed.external_calls.push(ParsedExternalCall::new(
                            ExternalClientType::HttpUrlConnection,
                            http_url_method.unwrap_or(HttpMethod::Get),
                            resolved_url,
                            line_start,
                            line_end,
                        ));
                        continue;
                    }
                }
            }
        }

        let receiver_text = receiver.and_then(|r| r.utf8_text(code).ok());
        let (declared_simple, declared_qualified, self_call) = match receiver_text {
            Some(text) => match lookup_declared_type(text, field_types, &local_types, param_names, import_index) {
                Some((s, q)) => (s, q, false),
                None => continue,
            },
            None => (
                class_fqn.rsplit('.').next().unwrap_or(class_fqn).to_string(),
                class_fqn.to_string(),
                true,
            ),
        };

        if input.config.is_standard_type(&declared_qualified) {
            continue;
        }

        if declared_simple.ends_with("RestTemplate") && input.config.rest_template_methods.contains(method_name) {
            let url = args.first().map(|n| expr::extract_string_from_expression(*n, &expr_ctx)).unwrap_or_else(|| DYNAMIC.to_string());
            let http_method = rest_template_http_method(method_name, &args, code);
            parsed.external_calls.push(ParsedExternalCall::new(ExternalClientType::RestTemplate, http_method, url, line_start, line_end));
            continue;
        }

        if input.config.kafka_producer_types.contains(&declared_simple) && input.config.kafka_producer_methods.contains(method_name) {
            let raw_topic_arg = args.first().map(|n| expr::extract_string_from_expression(*n, &expr_ctx)).unwrap_or_else(|| DYNAMIC.to_string());
            let (effective_topic, resolved_topic, topic_resolved) = if method_name == "sendDefault" {
                ("<default-topic>".to_string(), None, false)
            } else if expr::is_dynamic(&raw_topic_arg) {
                (DYNAMIC.to_string(), None, false)
            } else {
                (raw_topic_arg.clone(), Some(raw_topic_arg.clone()), true)
            };
            parsed.kafka_calls.push(ParsedKafkaCall {
                direction: KafkaDirection::Producer,
                raw_topic: raw_topic_arg,
                resolved_topic,
                effective_topic,
                topic_resolved,
                client_type: declared_simple.clone(),
                class_name: class_fqn.to_string(),
                method_name: method_name.to_string(),
                line_start,
                line_end,
                resolved: false,
                target_service: None,
                target_consumer_class: None,
                target_consumer_method: None,
                resolution_reason: None,
            });
            continue;
        }

        let invocation = RawInvocation {
            target_field_name: receiver_text.map(String::from),
            declared_type_simple: declared_simple,
            declared_type_qualified: declared_qualified,
            method_name: method_name.to_string(),
            signature: crate::canonical_id::method_signature_id(Some(class_fqn), Some(method_name), &format!("({})", args.len())),
            line_start,
            line_end,
            self_call,
        };
        parsed.push_raw_invocation(invocation);
    }
}

fn lookup_declared_type(
    receiver_text: &str,
    field_types: &HashMap<String, (String, String)>,
    local_types: &HashMap<String, String>,
    param_names: &[String],
    import_index: &ImportIndex,
) -> Option<(String, String)> {
    if let Some((simple, qualified)) = field_types.get(receiver_text) {
        return Some((simple.clone(), qualified.clone()));
    }
    if let Some(type_text) = local_types.get(receiver_text) {
        return Some(resolve_type(type_text, import_index));
    }
    if param_names.iter().any(|p| p == receiver_text) {
        // Parameter's declared type isn't tracked here; best-effort callers
        // fall back to `<dynamic>` for any literal extracted through it.
        return None;
    }
    None
}

fn local_variable_types(body: Node, code: &[u8]) -> HashMap<String, String> {
    let mut out = HashMap::new();
    walk_local_var_types(body, code, &mut out);
    out
}

fn walk_local_var_types(node: Node, code: &[u8], out: &mut HashMap<String, String>) {
    if node.kind() == "local_variable_declaration" {
        if let Some(type_node) = node.child_by_field_name("type") {
            let type_text = type_node.utf8_text(code).unwrap_or("").to_string();
            let mut cursor = node.walk();
            for declarator in node.children_by_field_name("declarator", &mut cursor) {
                if let Some(name_node) = declarator.child_by_field_name("name") {
                    if let Ok(name) = name_node.utf8_text(code) {
                        out.insert(name.to_string(), type_text.clone());
                    }
                }
            }
        }
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_local_var_types(child, code, out);
    }
}

/// Local string initializers/assignments, used by [`ExprContext`] to resolve
/// a bare variable read back to its literal (or `${...}`-resolved) value.
fn local_string_initializers(
    body: Node,
    code: &[u8],
    class_fqn: &str,
    field_types: &HashMap<String, (String, String)>,
    input: &FileParseInput,
) -> HashMap<String, String> {
    let mut out = HashMap::new();
    let expr_ctx_without_locals = HashMap::new();
    walk_local_initializers(body, code, class_fqn, field_types, input, &expr_ctx_without_locals, &mut out);
    out
}

fn walk_local_initializers(
    node: Node,
    code: &[u8],
    class_fqn: &str,
    field_types: &HashMap<String, (String, String)>,
    input: &FileParseInput,
    seed_locals: &HashMap<String, String>,
    out: &mut HashMap<String, String>,
) {
    if node.kind() == "local_variable_declaration" {
        let mut cursor = node.walk();
        for declarator in node.children_by_field_name("declarator", &mut cursor) {
            if let (Some(name_node), Some(value_node)) =
                (declarator.child_by_field_name("name"), declarator.child_by_field_name("value"))
            {
                if let Ok(name) = name_node.utf8_text(code) {
                    let ctx = ExprContext {
                        code,
                        value_field_map: input.value_field_map,
                        current_class_fqn: class_fqn,
                        local_initializers: seed_locals,
                        method_params: &[],
                        props: input.props,
                    };
                    let value = expr::extract_string_from_expression(value_node, &ctx);
                    if !expr::is_dynamic(&value) {
                        out.insert(name.to_string(), value);
                    }
                }
            }
        }
    }
    let _ = field_types;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_local_initializers(child, code, class_fqn, field_types, input, seed_locals, out);
    }
}

fn prescan_http_url_connection(body: Node, code: &[u8]) -> (HashMap<String, String>, Option<HttpMethod>) {
    let mut url_vars = HashMap::new();
    let mut http_method = None;
    walk_http_url_connection(body, code, &mut url_vars, &mut http_method);
    (url_vars, http_method)
}

fn walk_http_url_connection(node: Node, code: &[u8], url_vars: &mut HashMap<String, String>, http_method: &mut Option<HttpMethod>) {
    if node.kind() == "local_variable_declaration" {
        let mut cursor = node.walk();
        for declarator in node.children_by_field_name("declarator", &mut cursor) {
            if let (Some(name_node), Some(value_node)) =
                (declarator.child_by_field_name("name"), declarator.child_by_field_name("value"))
            {
                if value_node.kind() == "object_creation_expression" {
                    let is_url_type = value_node
                        .child_by_field_name("type")
                        .and_then(|n| n.utf8_text(code).ok())
                        .map(|t| t == "URL")
                        .unwrap_or(false);
                    if is_url_type {
                        if let Some(args) = value_node.child_by_field_name("arguments") {
                            if let Some(first) = args.named_child(0) {
                                if first.kind() == "string_literal" {
                                    let raw = first.utf8_text(code).unwrap_or("").trim_matches('"');
                                    if let Ok(name) = name_node.utf8_text(code) {
                                        url_vars.insert(name.to_string(), raw.to_string());
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
    if node.kind() == "method_invocation" {
        let is_set_method = node.child_by_field_name("name").and_then(|n| n.utf8_text(code).ok()) == Some("setRequestMethod");
        if is_set_method {
            if let Some(args) = node.child_by_field_name("arguments") {
                if let Some(first) = args.named_child(0) {
                    if first.kind() == "string_literal" {
                        let raw = first.utf8_text(code).unwrap_or("").trim_matches('"');
                        *http_method = HttpMethod::from_literal(raw).or(Some(HttpMethod::Get));
                    }
                }
            }
        }
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_http_url_connection(child, code, url_vars, http_method);
    }
}

/// Walk a `.uri(...)`-terminated method chain back to its base receiver,
/// returning the receiver's source text and the first HTTP-verb call seen
/// along the way (`get`/`post`/... ), if any.
fn webclient_chain_base(uri_invocation: Node, code: &[u8]) -> Option<(String, String)> {
    let mut current = uri_invocation.child_by_field_name("object")?;
    let mut chain_method = None;
    loop {
        match current.kind() {
            "method_invocation" => {
                if chain_method.is_none() {
                    chain_method = current.child_by_field_name("name").and_then(|n| n.utf8_text(code).ok()).map(String::from);
                }
                current = current.child_by_field_name("object")?;
            }
            "identifier" | "field_access" => {
                let text = current.utf8_text(code).ok()?.to_string();
                return Some((text, chain_method.unwrap_or_default()));
            }
            _ => return None,
        }
    }
}

fn rest_template_http_method(method_name: &str, args: &[Node], code: &[u8]) -> HttpMethod {
    match method_name {
        "getForObject" | "getForEntity" => HttpMethod::Get,
        "postForObject" | "postForEntity" => HttpMethod::Post,
        "put" => HttpMethod::Put,
        "delete" => HttpMethod::Delete,
        "patchForObject" => HttpMethod::Patch,
        "exchange" | "execute" => args
            .get(1)
            .and_then(|n| n.utf8_text(code).ok())
            .and_then(HttpMethod::from_literal)
            .unwrap_or(HttpMethod::Request),
        _ => HttpMethod::Request,
    }
}

fn extract_feign_client(decl: &TypeDecl, code: &[u8], package: &Option<String>, modifiers_text: &str) -> Option<FeignClientInfo> {
    let qualified_name = qualify(&decl.name, package);
    let base_path = class_level_base_path(modifiers_text).unwrap_or_default();
    let mut methods = HashMap::new();
    for method_node in method_nodes(decl.decl_node, code) {
        let method_modifiers = leading_modifiers_text(method_node, code);
        let annotations = annotation_names(method_modifiers);
        let Some(mapping) = annotations.iter().find(|a| {
            matches!(a.as_str(), "GetMapping" | "PostMapping" | "PutMapping" | "DeleteMapping" | "PatchMapping" | "RequestMapping")
        }) else {
            continue;
        };
        let Some(method_name) = method_node.child_by_field_name("name").and_then(|n| n.utf8_text(code).ok()) else { continue };
        let http_method = HttpMethod::from_mapping_annotation(mapping).unwrap_or(HttpMethod::Get);
        let method_path = annotation_named_arg(mapping, "path", method_modifiers)
            .or_else(|| annotation_named_arg(mapping, "value", method_modifiers))
            .or_else(|| annotation_first_string_arg(mapping, method_modifiers))
            .unwrap_or_default();
        methods.insert(method_name.to_string(), (http_method, join_paths(&base_path, &method_path)));
    }
    Some(FeignClientInfo { qualified_name, simple_name: decl.name.clone(), methods })
}

/// Reclassify raw invocations whose declared type matches a known Feign
/// client interface into resolved [`ParsedExternalCall`]s. Run once per
/// application after every file's Pass 1 output is available, since the
/// Feign interface and its caller often live in different files.
pub fn reclassify_feign_calls(app: &mut ParsedApplication, feign_clients: &[FeignClientInfo]) {
    let by_qualified: HashMap<&str, &FeignClientInfo> = feign_clients.iter().map(|f| (f.qualified_name.as_str(), f)).collect();
    let by_simple: HashMap<&str, &FeignClientInfo> = feign_clients.iter().map(|f| (f.simple_name.as_str(), f)).collect();

    for (key, component) in app.component_index.iter_mut() {
        if key != &component.qualified_name {
            continue;
        }
        for method in &mut component.methods {
            let mut remaining = Vec::new();
            for invocation in method.raw_invocations.drain(..) {
                let feign = by_qualified
                    .get(invocation.declared_type_qualified.as_str())
                    .or_else(|| by_simple.get(invocation.declared_type_simple.as_str()));
                match feign.and_then(|f| f.methods.get(&invocation.method_name)) {
                    Some((http_method, path)) => {
                        method.external_calls.push(ParsedExternalCall::new(
                            ExternalClientType::Feign,
                            *http_method,
                            path.clone(),
                            invocation.line_start,
                            invocation.line_end,
                        ));
                    }
                    None => remaining.push(invocation),
                }
            }
            method.raw_invocations = remaining;
        }
    }
}

/// Repository analysis sub-step (§4.5): derive entity/table/repository-type
/// metadata from a repository interface's first `*Repository`-named
/// supertype, in AST declaration order.
fn analyze_repository(
    decl_node: Node,
    code: &[u8],
    import_index: &ImportIndex,
    entity_table_map: &HashMap<String, (String, TableSource)>,
    component: &mut ParsedComponent,
) {
    let supertypes = extends_interfaces_full_text(decl_node, code);
    let Some(repo_supertype) = supertypes.iter().find(|s| s.contains("Repository")) else { return };

    component.repository_type = Some(RepositoryType::from_supertype_name(repo_supertype));

    if let Some(entity_arg) = first_generic_argument(repo_supertype) {
        let (entity_simple, _entity_qualified) = resolve_type(&entity_arg, import_index);
        component.entity_class_name = Some(entity_simple.clone());
        match entity_table_map.get(&entity_simple) {
            Some((table_name, source)) => {
                component.table_name = Some(table_name.clone());
                component.table_source = Some(*source);
            }
            None => {
                component.table_name = Some(to_snake_case(&entity_simple));
                component.table_source = Some(TableSource::DerivedFromClassName);
            }
        }
    }

    let mut operations = std::collections::HashSet::new();
    for method_node in method_nodes(decl_node, code) {
        if method_node.child_by_field_name("body").is_some() {
            continue;
        }
        let Some(name) = method_node.child_by_field_name("name").and_then(|n| n.utf8_text(code).ok()) else { continue };
        let lower = name.to_lowercase();
        if lower.contains("find") || lower.contains("get") || lower.contains("read") || lower.contains("query") {
            operations.insert(DatabaseOperation::Read);
        }
        if lower.contains("save") || lower.contains("create") || lower.contains("insert") || lower.contains("persist") {
            operations.insert(DatabaseOperation::Write);
        }
        if lower.contains("update") || lower.contains("merge") {
            operations.insert(DatabaseOperation::Update);
        }
        if lower.contains("delete") || lower.contains("remove") {
            operations.insert(DatabaseOperation::Delete);
        }
    }
    component.database_operations = if operations.is_empty() {
        vec![DatabaseOperation::Read, DatabaseOperation::Write, DatabaseOperation::Delete]
    } else {
        operations.into_iter().collect()
    };
}

/// Full supertype texts (including generics) in declaration order, re-derived
/// directly from the interface node since [`ast::type_decl_query`] only
/// captures the bare type name.
fn extends_interfaces_full_text(decl_node: Node, code: &[u8]) -> Vec<String> {
    let mut out = Vec::new();
    let mut cursor = decl_node.walk();
    for child in decl_node.children(&mut cursor) {
        if child.kind() == "extends_interfaces" {
            let mut inner = child.walk();
            for grandchild in child.children(&mut inner) {
                if grandchild.kind() == "type_list" {
                    let mut list_cursor = grandchild.walk();
                    for type_node in grandchild.named_children(&mut list_cursor) {
                        if let Ok(text) = type_node.utf8_text(code) {
                            out.push(text.to_string());
                        }
                    }
                }
            }
        }
    }
    out
}

fn first_generic_argument(supertype_text: &str) -> Option<String> {
    let start = supertype_text.find('<')?;
    let end = supertype_text.rfind('>')?;
    let inner = &supertype_text[start + 1..end];
    inner.split(',').next().map(|s| s.trim().to_string())
}

fn to_snake_case(name: &str) -> String {
    let mut out = String::new();
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i != 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
