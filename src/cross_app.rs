//! Cross-Application Resolver (C7): matches external HTTP calls to concrete
//! endpoints, and Kafka producer topics to consumer listeners, across every
//! analyzed application. Runs once all applications' Pass 2 output exists.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::canonical_id as cid;
use crate::graph::GraphEdge;
use crate::model::{
    ComponentType, HttpMethod, KafkaDirection, ParsedApplication, ParsedExternalCall, ParsedKafkaCall,
};

#[derive(Debug, Clone)]
pub struct EndpointRecord {
    pub service_name: String,
    pub application_class: String,
    pub controller_class: String,
    pub handler_method: String,
    pub http_method: HttpMethod,
    pub path: String,
    pub path_pattern: Regex,
}

#[derive(Debug, Clone)]
struct ConsumerRecord {
    service_name: String,
    class_name: String,
    method_name: String,
    topic: String,
}

/// Build the flattened endpoint registry from every application's controllers,
/// in application/component/method insertion order.
pub fn build_endpoint_registry(apps: &[(String, ParsedApplication)]) -> Vec<EndpointRecord> {
    let mut registry = Vec::new();
    for (service_name, app) in apps {
        let application_class = app.main_class_simple_name.clone().unwrap_or_default();
        for controller_name in &app.controllers {
            let Some(component) = app.component_index.get(controller_name) else { continue };
            for method in &component.methods {
                let (Some(http_method), Some(path)) = (method.http_method, method.path.as_deref()) else {
                    continue;
                };
                registry.push(EndpointRecord {
                    service_name: service_name.clone(),
                    application_class: application_class.clone(),
                    controller_class: component.qualified_name.clone(),
                    handler_method: method.method_name.clone(),
                    http_method,
                    path: path.to_string(),
                    path_pattern: path_to_pattern(path),
                });
            }
        }
    }
    registry
}

/// Turn a canonical path like `/v1/api/users/{id}` into a matcher that accepts
/// any concrete segment in place of each `{var}` token, escaping every other
/// literal segment so dots and other regex metacharacters in the path aren't
/// accidentally interpreted.
fn path_to_pattern(path: &str) -> Regex {
    static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^{}]*\}").unwrap());
    let mut pattern = String::from("^");
    let mut last_end = 0;
    for m in PLACEHOLDER.find_iter(path) {
        pattern.push_str(&regex::escape(&path[last_end..m.start()]));
        pattern.push_str("[^/]+");
        last_end = m.end();
    }
    pattern.push_str(&regex::escape(&path[last_end..]));
    // Fullmatch the normalized URL, but tolerate an extra trailing path
    // segment (the caller's URL may carry more than the endpoint itself
    // declares), per the cross-application resolver's "optional trailing
    // `/…`" matching rule.
    pattern.push_str("(/.*)?$");
    Regex::new(&pattern).unwrap_or_else(|_| {
        Regex::new(&format!("^{}(/.*)?$", regex::escape(path))).unwrap()
    })
}

fn build_consumer_registry(apps: &[(String, ParsedApplication)]) -> Vec<ConsumerRecord> {
    let mut out = Vec::new();
    for (service_name, app) in apps {
        for listener_name in &app.kafka_listeners {
            let Some(component) = app.component_index.get(listener_name) else { continue };
            for listener in &component.kafka_listener_methods {
                if !listener.topic_resolved {
                    continue;
                }
                out.push(ConsumerRecord {
                    service_name: service_name.clone(),
                    class_name: component.qualified_name.clone(),
                    method_name: listener.method_name.clone(),
                    topic: listener.effective_topic.clone(),
                });
            }
        }
    }
    out
}

/// Resolve every external call across every application's methods in place.
pub fn resolve_external_calls(apps: &mut [(String, ParsedApplication)]) {
    let registry = build_endpoint_registry(apps);
    for (_, app) in apps.iter_mut() {
        for (key, component) in app.component_index.iter_mut() {
            if key != &component.qualified_name {
                continue;
            }
            for method in &mut component.methods {
                for call in &mut method.external_calls {
                    resolve_external_call(call, &registry);
                }
            }
        }
    }
}

fn resolve_external_call(call: &mut ParsedExternalCall, registry: &[EndpointRecord]) {
    if call.url.is_empty() || call.url.contains("<dynamic>") {
        call.mark_unresolved("URL is dynamic or empty");
        return;
    }
    let normalized = crate::canonical_id::normalize_external_url(&call.url);
    for record in registry {
        if record.http_method != call.http_method {
            continue;
        }
        if record.path_pattern.is_match(&normalized) {
            call.resolved = true;
            call.target_service = Some(record.service_name.clone());
            call.target_endpoint = Some(record.path.clone());
            call.target_controller_class = Some(record.controller_class.clone());
            call.target_handler_method = Some(record.handler_method.clone());
            call.resolution_reason = None;
            return;
        }
    }
    call.mark_unresolved("no matching endpoint found across analyzed applications");
}

/// Resolve every Kafka producer call across every application's methods in place.
pub fn resolve_kafka_calls(apps: &mut [(String, ParsedApplication)]) {
    let consumers = build_consumer_registry(apps);
    for (_, app) in apps.iter_mut() {
        for (key, component) in app.component_index.iter_mut() {
            if key != &component.qualified_name {
                continue;
            }
            for method in &mut component.methods {
                for call in &mut method.kafka_calls {
                    resolve_kafka_call(call, &consumers);
                }
            }
        }
    }
}

fn resolve_kafka_call(call: &mut ParsedKafkaCall, consumers: &[ConsumerRecord]) {
    if call.direction != KafkaDirection::Producer {
        return;
    }
    let topic = &call.effective_topic;
    if topic == "<dynamic>" || topic == "<default-topic>" || topic.is_empty() || topic.contains("${") || topic.contains("#{") {
        call.resolved = false;
        call.resolution_reason = Some(format!("producer topic is unresolved ({})", topic));
        return;
    }
    for consumer in consumers {
        if &consumer.topic == topic {
            call.resolved = true;
            call.target_service = Some(consumer.service_name.clone());
            call.target_consumer_class = Some(consumer.class_name.clone());
            call.target_consumer_method = Some(consumer.method_name.clone());
            call.resolution_reason = None;
            return;
        }
    }
    call.resolved = false;
    call.resolution_reason = Some(format!("no consumer listener found for topic '{}'", topic));
}

#[allow(dead_code)]
pub fn component_type_is_controller(t: ComponentType) -> bool {
    t.is_controller()
}

/// Emit `CALLS_ENDPOINT` edges (ExternalCall -> Endpoint) for every resolved
/// external call across every application. Must run after
/// [`resolve_external_calls`] has populated `target_endpoint`. Kafka
/// producer/consumer cross-application links need no separate edge type:
/// `PRODUCES_TO`/`CONSUMES_FROM` already meet at the same `KafkaTopic` node
/// since its canonical ID is derived from the topic name alone.
pub fn emit_cross_application_edges(apps: &[(String, ParsedApplication)]) -> Vec<GraphEdge> {
    let mut edges = Vec::new();
    for (_, app) in apps {
        for (key, component) in &app.component_index {
            if key != &component.qualified_name {
                continue;
            }
            for method in &component.methods {
                for call in &method.external_calls {
                    if !call.resolved {
                        continue;
                    }
                    let (Some(target_endpoint), Some(_)) = (&call.target_endpoint, &call.target_controller_class) else {
                        continue;
                    };
                    let external_id = cid::external_call_id(call.http_method.as_str(), &call.url, call.resolved);
                    let endpoint_id = cid::endpoint_id(call.http_method.as_str(), target_endpoint);
                    edges.push(crate::graph::edge("CALLS_ENDPOINT", &external_id, &endpoint_id, std::collections::HashMap::new()));
                }
            }
        }
    }
    edges
}
