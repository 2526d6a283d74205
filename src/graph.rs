//! Graph Emitter (C9) and the `GraphSink` output boundary. Translates resolved
//! `ParsedApplication`s into idempotent node/edge upsert batches.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::canonical_id as cid;
use crate::model::{ComponentType, KafkaDirection, ParsedApplication, ParsedComponent};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub canonical_id: String,
    pub kind: String,
    pub properties: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub canonical_id: String,
    pub edge_type: String,
    pub src_canonical_id: String,
    pub dst_canonical_id: String,
    pub properties: HashMap<String, Value>,
}

/// Output boundary to the (out-of-scope) graph database persistence layer.
/// Both methods MUST be idempotent: re-upserting an unchanged batch is a no-op.
pub trait GraphSink {
    fn upsert_nodes(&mut self, nodes: Vec<GraphNode>);
    fn upsert_edges(&mut self, edges: Vec<GraphEdge>);
}

/// Test double standing in for a real graph database; merges by
/// `canonical_id`, overwriting properties on conflict.
#[derive(Debug, Default)]
pub struct InMemoryGraphSink {
    pub nodes: HashMap<String, GraphNode>,
    pub edges: HashMap<String, GraphEdge>,
}

impl GraphSink for InMemoryGraphSink {
    fn upsert_nodes(&mut self, nodes: Vec<GraphNode>) {
        for node in nodes {
            self.nodes.insert(node.canonical_id.clone(), node);
        }
    }

    fn upsert_edges(&mut self, edges: Vec<GraphEdge>) {
        for edge in edges {
            self.edges.insert(edge.canonical_id.clone(), edge);
        }
    }
}

fn node(canonical_id: String, kind: &str, properties: HashMap<String, Value>) -> GraphNode {
    GraphNode { canonical_id, kind: kind.to_string(), properties }
}

/// Shared with `cross_app`'s cross-application edge pass so both stay on the
/// same `{edge_type}:{src}->{dst}` canonical-ID scheme.
pub(crate) fn edge(edge_type: &str, src: &str, dst: &str, properties: HashMap<String, Value>) -> GraphEdge {
    GraphEdge {
        canonical_id: cid::edge_id(edge_type, src, dst),
        edge_type: edge_type.to_string(),
        src_canonical_id: src.to_string(),
        dst_canonical_id: dst.to_string(),
        properties,
    }
}

/// Emit the node/edge batch for one resolved [`ParsedApplication`]. C7
/// (cross-application `CALLS_ENDPOINT`/`PRODUCES_TO` resolution) runs
/// separately once every application's Pass 2 output is available; see
/// `cross_app::emit_cross_application_edges`.
pub fn emit_application(app: &ParsedApplication, app_key: &str) -> (Vec<GraphNode>, Vec<GraphEdge>) {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();

    let app_id = cid::application_id(app_key);
    nodes.push(node(app_id.clone(), "Application", HashMap::new()));

    for (key, component) in &app.component_index {
        // component_index carries both qualified and simple-name entries;
        // only emit once per component, keyed by its qualified-name entry.
        if key != &component.qualified_name {
            continue;
        }
        emit_component(component, app, &app_id, &mut nodes, &mut edges);
    }

    (nodes, edges)
}

fn emit_component(
    component: &ParsedComponent,
    app: &ParsedApplication,
    app_id: &str,
    nodes: &mut Vec<GraphNode>,
    edges: &mut Vec<GraphEdge>,
) {
    let prefix = match component.component_type {
        ComponentType::RestController | ComponentType::Controller => "controller",
        ComponentType::Service => "service",
        ComponentType::Repository => "repository",
        ComponentType::KafkaListener => "kafka_listener",
        _ => return,
    };
    let component_id = match component.package_name.as_deref() {
        Some(pkg) if !pkg.is_empty() => format!("{}:{}.{}", prefix, pkg, component.class_name),
        _ => format!("{}:{}", prefix, component.class_name),
    };

    let mut props = HashMap::new();
    props.insert("className".to_string(), Value::String(component.class_name.clone()));
    props.insert("qualifiedName".to_string(), Value::String(component.qualified_name.clone()));
    nodes.push(node(component_id.clone(), component_kind(component.component_type), props));

    let has_edge = format!("HAS_{}", component_kind(component.component_type).to_uppercase());
    edges.push(edge(&has_edge, app_id, &component_id, HashMap::new()));

    if component.component_type.is_controller() {
        for method in &component.methods {
            let (Some(http_method), Some(path)) = (method.http_method, method.path.as_deref()) else {
                continue;
            };
            let endpoint_id = cid::endpoint_id(http_method.as_str(), path);
            let mut endpoint_props = HashMap::new();
            endpoint_props.insert("path".to_string(), Value::String(path.to_string()));
            endpoint_props.insert("httpMethod".to_string(), Value::String(http_method.as_str().to_string()));
            nodes.push(node(endpoint_id.clone(), "Endpoint", endpoint_props));
            edges.push(edge("HAS_ENDPOINT", &component_id, &endpoint_id, HashMap::new()));
            emit_method_calls(component, app, method, &endpoint_id, nodes, edges);
        }
    } else if component.component_type == ComponentType::Repository {
        if let Some(table_name) = &component.table_name {
            let table_id = cid::database_table_id(table_name);
            nodes.push(node(table_id.clone(), "DatabaseTable", HashMap::new()));
            edges.push(edge("ACCESSES", &component_id, &table_id, HashMap::new()));
        }
    } else {
        for method in &component.methods {
            let method_id = cid::method_signature_id(
                Some(&component.qualified_name),
                Some(&method.method_name),
                &format!("({})", extract_param_string(&method.signature)),
            );
            nodes.push(node(method_id.clone(), "Method", HashMap::new()));
            emit_method_calls(component, app, method, &method_id, nodes, edges);
        }
    }

    for kafka_method in &component.kafka_listener_methods {
        let topic_id = cid::kafka_topic_id(&kafka_method.effective_topic);
        nodes.push(node(topic_id.clone(), "KafkaTopic", HashMap::new()));
        let method_id = cid::method_signature_id(
            Some(&component.qualified_name),
            Some(&kafka_method.method_name),
            "()",
        );
        edges.push(edge("CONSUMES_FROM", &method_id, &topic_id, HashMap::new()));
    }
}

fn extract_param_string(signature: &str) -> String {
    signature
        .find('(')
        .and_then(|start| signature.rfind(')').map(|end| signature[start + 1..end].to_string()))
        .unwrap_or_default()
}

fn emit_method_calls(
    component: &ParsedComponent,
    app: &ParsedApplication,
    method: &crate::model::ParsedMethod,
    source_id: &str,
    nodes: &mut Vec<GraphNode>,
    edges: &mut Vec<GraphEdge>,
) {
    for call in &method.external_calls {
        let external_id = cid::external_call_id(call.http_method.as_str(), &call.url, call.resolved);
        let mut props = HashMap::new();
        props.insert("url".to_string(), Value::String(call.url.clone()));
        props.insert("resolved".to_string(), Value::Bool(call.resolved));
        nodes.push(node(external_id.clone(), "ExternalCall", props));
        edges.push(edge("MAKES_EXTERNAL_CALL", source_id, &external_id, HashMap::new()));
    }

    for kafka_call in &method.kafka_calls {
        if kafka_call.direction != KafkaDirection::Producer {
            continue;
        }
        let topic_id = cid::kafka_topic_id(&kafka_call.effective_topic);
        nodes.push(node(topic_id.clone(), "KafkaTopic", HashMap::new()));
        edges.push(edge("PRODUCES_TO", source_id, &topic_id, HashMap::new()));
    }

    emit_calls_edges(component, app, method, source_id, edges);
}

/// Resolve each raw (not-yet-classified-as-external/Kafka) invocation to a
/// concrete target method via the owning component's resolved injections
/// (or the component itself for a self-call) and emit a `CALLS` edge.
/// Targets in `Controller`/`Repository` components never get their own
/// `Method` nodes, so an invocation resolving there is left unemitted.
fn emit_calls_edges(
    component: &ParsedComponent,
    app: &ParsedApplication,
    method: &crate::model::ParsedMethod,
    source_id: &str,
    edges: &mut Vec<GraphEdge>,
) {
    for invocation in &method.raw_invocations {
        let target_qualified = if invocation.self_call {
            Some(component.qualified_name.clone())
        } else {
            invocation
                .target_field_name
                .as_ref()
                .and_then(|field| component.injected_dependencies.get(field))
                .and_then(|dep| dep.resolved_type_qualified.clone())
        };
        let Some(target_qualified) = target_qualified else { continue };
        let Some(target_component) = app.component_index.get(&target_qualified) else { continue };
        if target_component.component_type.is_controller()
            || target_component.component_type == ComponentType::Repository
        {
            continue;
        }
        let Some(target_method) = target_component
            .methods
            .iter()
            .find(|m| m.method_name == invocation.method_name)
        else {
            continue;
        };
        let target_method_id = cid::method_signature_id(
            Some(&target_component.qualified_name),
            Some(&target_method.method_name),
            &format!("({})", extract_param_string(&target_method.signature)),
        );
        edges.push(edge("CALLS", source_id, &target_method_id, HashMap::new()));
    }
}

fn component_kind(component_type: ComponentType) -> &'static str {
    match component_type {
        ComponentType::RestController | ComponentType::Controller => "Controller",
        ComponentType::Service => "Service",
        ComponentType::Repository => "Repository",
        ComponentType::Configuration => "Configuration",
        ComponentType::KafkaListener => "KafkaListener",
        ComponentType::Component => "Component",
        ComponentType::Unknown => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_upsert_is_idempotent() {
        let mut sink = InMemoryGraphSink::default();
        let nodes = vec![node("service:a.b.Foo".to_string(), "Service", HashMap::new())];
        sink.upsert_nodes(nodes.clone());
        sink.upsert_nodes(nodes);
        assert_eq!(sink.nodes.len(), 1);
    }

    #[test]
    fn calls_edge_emitted_between_resolved_service_methods() {
        use crate::model::{ComponentType, InjectedDependency, InjectionType, ParsedMethod, RawInvocation};
        use std::path::PathBuf;

        let mut repo_impl = ParsedComponent::new("PaymentServiceImpl", "a.b.PaymentServiceImpl", Some("a.b".into()), ComponentType::Service, 1, 5);
        repo_impl.methods.push(ParsedMethod::new("charge", &["Long".to_string()], 2, 3));

        let mut caller = ParsedComponent::new("OrderService", "a.b.OrderService", Some("a.b".into()), ComponentType::Service, 1, 10);
        caller.injected_dependencies.insert(
            "paymentService".to_string(),
            {
                let mut dep = InjectedDependency::new("paymentService", "IPaymentService", "a.b.IPaymentService", InjectionType::Constructor);
                dep.resolved_type_simple = Some("PaymentServiceImpl".to_string());
                dep.resolved_type_qualified = Some("a.b.PaymentServiceImpl".to_string());
                dep
            },
        );
        let mut method = ParsedMethod::new("placeOrder", &[], 2, 8);
        method.raw_invocations.push(RawInvocation {
            target_field_name: Some("paymentService".to_string()),
            declared_type_simple: "IPaymentService".to_string(),
            declared_type_qualified: "a.b.IPaymentService".to_string(),
            method_name: "charge".to_string(),
            signature: "charge(Long)".to_string(),
            line_start: 3,
            line_end: 3,
            self_call: false,
        });
        caller.methods.push(method);

        let mut app = ParsedApplication::new_aggregate(PathBuf::from("/repo"));
        app.insert_component(repo_impl);
        app.insert_component(caller);

        let (_, edges) = emit_application(&app, "a.b.App");
        assert!(edges.iter().any(|e| e.edge_type == "CALLS"
            && e.dst_canonical_id.contains("PaymentServiceImpl.charge")));
    }

    #[test]
    fn kafka_listener_emits_node_and_consumes_from_edge() {
        use crate::model::KafkaListenerMethod;
        use std::path::PathBuf;

        let mut listener = ParsedComponent::new(
            "MarksListener",
            "com.example.consumer.MarksListener",
            Some("com.example.consumer".into()),
            ComponentType::KafkaListener,
            1,
            10,
        );
        listener.kafka_listener_methods.push(KafkaListenerMethod {
            class_name: "MarksListener".to_string(),
            method_name: "onMark".to_string(),
            raw_topic: "marks-topic".to_string(),
            resolved_topic: Some("marks-topic".to_string()),
            effective_topic: "marks-topic".to_string(),
            topic_resolved: true,
            group_id: None,
            line_start: 2,
            line_end: 5,
        });

        let mut app = ParsedApplication::new_aggregate(PathBuf::from("/repo"));
        app.insert_component(listener);

        let (nodes, edges) = emit_application(&app, "com.example.App");
        assert!(nodes.iter().any(|n| n.kind == "KafkaListener"));
        assert!(nodes.iter().any(|n| n.kind == "KafkaTopic"));
        assert!(edges.iter().any(|e| {
            e.edge_type == "CONSUMES_FROM"
                && e.src_canonical_id.contains("MarksListener.onMark")
                && e.dst_canonical_id.contains("marks-topic")
        }));
    }

    #[test]
    fn duplicate_node_merges_by_overwriting_properties() {
        let mut sink = InMemoryGraphSink::default();
        let mut first_props = HashMap::new();
        first_props.insert("v".to_string(), Value::String("old".to_string()));
        sink.upsert_nodes(vec![node("service:a.b.Foo".to_string(), "Service", first_props)]);

        let mut second_props = HashMap::new();
        second_props.insert("v".to_string(), Value::String("new".to_string()));
        sink.upsert_nodes(vec![node("service:a.b.Foo".to_string(), "Service", second_props)]);

        assert_eq!(
            sink.nodes.get("service:a.b.Foo").unwrap().properties.get("v"),
            Some(&Value::String("new".to_string()))
        );
    }
}
