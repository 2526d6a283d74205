//! Data model for the extracted architecture graph: applications, components,
//! methods, and the raw/resolved call records produced by the two-pass parser.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Outcome of analyzing one [`ParsedApplication`], derived from per-file and
/// per-element skip counts (never causes the whole run to abort).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Success,
    PartialSuccess,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentType {
    RestController,
    Controller,
    Service,
    Repository,
    Configuration,
    KafkaListener,
    Component,
    Unknown,
}

impl ComponentType {
    pub fn from_annotation(annotation: &str) -> Self {
        match annotation {
            "RestController" => ComponentType::RestController,
            "Controller" => ComponentType::Controller,
            "Service" => ComponentType::Service,
            "Repository" => ComponentType::Repository,
            "Configuration" => ComponentType::Configuration,
            "Component" => ComponentType::Component,
            _ => ComponentType::Unknown,
        }
    }

    pub fn is_controller(&self) -> bool {
        matches!(self, ComponentType::RestController | ComponentType::Controller)
    }

    /// Canonical-ID node-kind prefix; `Unknown`/`KafkaListener`/`Component` are
    /// never emitted as standalone nodes and have no prefix.
    pub fn node_prefix(&self) -> Option<&'static str> {
        match self {
            ComponentType::RestController | ComponentType::Controller => Some("controller"),
            ComponentType::Service => Some("service"),
            ComponentType::Repository => Some("repository"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Request,
}

impl HttpMethod {
    pub fn from_mapping_annotation(annotation: &str) -> Option<Self> {
        match annotation {
            "GetMapping" => Some(HttpMethod::Get),
            "PostMapping" => Some(HttpMethod::Post),
            "PutMapping" => Some(HttpMethod::Put),
            "DeleteMapping" => Some(HttpMethod::Delete),
            "PatchMapping" => Some(HttpMethod::Patch),
            "RequestMapping" => Some(HttpMethod::Request),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Request => "REQUEST",
        }
    }

    pub fn from_literal(s: &str) -> Option<Self> {
        let upper = s.trim().to_uppercase();
        let upper = upper.strip_prefix("HTTPMETHOD.").unwrap_or(&upper);
        match upper {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "DELETE" => Some(HttpMethod::Delete),
            "PATCH" => Some(HttpMethod::Patch),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepositoryType {
    MongoDb,
    Jpa,
    ReactiveMongoDb,
    ReactiveJpa,
    Custom,
}

impl RepositoryType {
    /// Precedence: ReactiveMongoRepository > ReactiveCrudRepository > MongoRepository
    /// > JpaRepository|CrudRepository > Custom.
    pub fn from_supertype_name(name: &str) -> Self {
        if name.contains("ReactiveMongoRepository") {
            RepositoryType::ReactiveMongoDb
        } else if name.contains("ReactiveCrudRepository") {
            RepositoryType::ReactiveJpa
        } else if name.contains("MongoRepository") {
            RepositoryType::MongoDb
        } else if name.contains("JpaRepository") || name.contains("CrudRepository") {
            RepositoryType::Jpa
        } else {
            RepositoryType::Custom
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableSource {
    Table,
    Document,
    DerivedFromClassName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatabaseOperation {
    Read,
    Write,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InjectionType {
    Constructor,
    FieldAutowired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExternalClientType {
    RestTemplate,
    WebClient,
    HttpUrlConnection,
    Feign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KafkaDirection {
    Producer,
    Consumer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamInfo {
    pub name: String,
    pub type_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InjectedDependency {
    pub field_name: String,
    pub declared_type_simple: String,
    pub declared_type_qualified: String,
    pub injection_type: InjectionType,
    pub resolved_type_simple: Option<String>,
    pub resolved_type_qualified: Option<String>,
}

impl InjectedDependency {
    pub fn new(
        field_name: &str,
        declared_type_simple: &str,
        declared_type_qualified: &str,
        injection_type: InjectionType,
    ) -> Self {
        Self {
            field_name: field_name.to_string(),
            declared_type_simple: declared_type_simple.to_string(),
            declared_type_qualified: declared_type_qualified.to_string(),
            injection_type,
            resolved_type_simple: None,
            resolved_type_qualified: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_type_qualified.is_some()
    }
}

/// A captured call-site before Pass 2 resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawInvocation {
    pub target_field_name: Option<String>,
    pub declared_type_simple: String,
    pub declared_type_qualified: String,
    pub method_name: String,
    pub signature: String,
    pub line_start: usize,
    pub line_end: usize,
    pub self_call: bool,
}

impl RawInvocation {
    /// Key used to deduplicate raw invocations within one method.
    pub fn dedup_key(&self) -> String {
        format!("{}#{}", self.declared_type_qualified, self.method_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedExternalCall {
    pub client_type: ExternalClientType,
    pub http_method: HttpMethod,
    pub url: String,
    pub target_class: Option<String>,
    pub target_method: Option<String>,
    pub line_start: usize,
    pub line_end: usize,
    pub resolved: bool,
    pub target_service: Option<String>,
    pub target_endpoint: Option<String>,
    pub target_controller_class: Option<String>,
    pub target_handler_method: Option<String>,
    pub resolution_reason: Option<String>,
}

impl ParsedExternalCall {
    pub fn new(
        client_type: ExternalClientType,
        http_method: HttpMethod,
        url: String,
        line_start: usize,
        line_end: usize,
    ) -> Self {
        Self {
            client_type,
            http_method,
            url,
            target_class: None,
            target_method: None,
            line_start,
            line_end,
            resolved: false,
            target_service: None,
            target_endpoint: None,
            target_controller_class: None,
            target_handler_method: None,
            resolution_reason: None,
        }
    }

    pub fn mark_unresolved(&mut self, reason: impl Into<String>) {
        self.resolved = false;
        self.resolution_reason = Some(reason.into());
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedKafkaCall {
    pub direction: KafkaDirection,
    pub raw_topic: String,
    pub resolved_topic: Option<String>,
    pub effective_topic: String,
    pub topic_resolved: bool,
    pub client_type: String,
    pub class_name: String,
    pub method_name: String,
    pub line_start: usize,
    pub line_end: usize,
    pub resolved: bool,
    pub target_service: Option<String>,
    pub target_consumer_class: Option<String>,
    pub target_consumer_method: Option<String>,
    pub resolution_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KafkaListenerMethod {
    pub class_name: String,
    pub method_name: String,
    pub raw_topic: String,
    pub resolved_topic: Option<String>,
    pub effective_topic: String,
    pub topic_resolved: bool,
    pub group_id: Option<String>,
    pub line_start: usize,
    pub line_end: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedMethod {
    pub method_name: String,
    pub signature: String,
    pub line_start: usize,
    pub line_end: usize,
    pub is_public: bool,
    pub is_private: bool,
    pub http_method: Option<HttpMethod>,
    pub path: Option<String>,
    pub request_body_type: Option<String>,
    pub response_type: Option<String>,
    pub raw_invocations: Vec<RawInvocation>,
    pub external_calls: Vec<ParsedExternalCall>,
    pub kafka_calls: Vec<ParsedKafkaCall>,
}

impl ParsedMethod {
    pub fn new(method_name: &str, param_types: &[String], line_start: usize, line_end: usize) -> Self {
        let signature = format!("{}({})", method_name, param_types.join(","));
        Self {
            method_name: method_name.to_string(),
            signature,
            line_start,
            line_end,
            is_public: true,
            is_private: false,
            http_method: None,
            path: None,
            request_body_type: None,
            response_type: None,
            raw_invocations: Vec::new(),
            external_calls: Vec::new(),
            kafka_calls: Vec::new(),
        }
    }

    /// Push a raw invocation unless one with the same dedup key is already present.
    pub fn push_raw_invocation(&mut self, invocation: RawInvocation) {
        let key = invocation.dedup_key();
        if self
            .raw_invocations
            .iter()
            .any(|existing| existing.dedup_key() == key)
        {
            return;
        }
        self.raw_invocations.push(invocation);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedBean {
    pub method_name: String,
    pub bean_type_simple: Option<String>,
    pub bean_type_qualified: Option<String>,
    pub bean_name: String,
    pub line_start: usize,
    pub line_end: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedComponent {
    pub class_name: String,
    pub qualified_name: String,
    pub package_name: Option<String>,
    pub component_type: ComponentType,
    pub line_start: usize,
    pub line_end: usize,
    pub implemented_interfaces: Vec<String>,
    pub injected_dependencies: HashMap<String, InjectedDependency>,
    pub base_url: Option<String>,
    pub extends_class: Option<String>,
    pub repository_type: Option<RepositoryType>,
    pub entity_class_name: Option<String>,
    pub table_name: Option<String>,
    pub table_source: Option<TableSource>,
    pub database_operations: Vec<DatabaseOperation>,
    pub beans: Vec<ParsedBean>,
    pub methods: Vec<ParsedMethod>,
    pub kafka_listener_methods: Vec<KafkaListenerMethod>,
}

impl ParsedComponent {
    pub fn new(
        class_name: &str,
        qualified_name: &str,
        package_name: Option<String>,
        component_type: ComponentType,
        line_start: usize,
        line_end: usize,
    ) -> Self {
        Self {
            class_name: class_name.to_string(),
            qualified_name: qualified_name.to_string(),
            package_name,
            component_type,
            line_start,
            line_end,
            implemented_interfaces: Vec::new(),
            injected_dependencies: HashMap::new(),
            base_url: None,
            extends_class: None,
            repository_type: None,
            entity_class_name: None,
            table_name: None,
            table_source: None,
            database_operations: Vec::new(),
            beans: Vec::new(),
            methods: Vec::new(),
            kafka_listener_methods: Vec::new(),
        }
    }
}

/// Root per Spring-Boot application, or one aggregate for non-Spring repositories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedApplication {
    pub main_class_simple_name: Option<String>,
    pub main_class_package: Option<String>,
    pub is_spring_boot: bool,
    pub root_path: PathBuf,
    pub line_start: usize,
    pub line_end: usize,
    pub controllers: Vec<String>,
    pub services: Vec<String>,
    pub repositories: Vec<String>,
    pub configurations: Vec<String>,
    pub kafka_listeners: Vec<String>,
    /// Qualified names in classifier-insertion order, independent of
    /// `component_index`'s `HashMap` iteration order. Consumed by the
    /// resolver's interface-to-impl map so DI ambiguity tie-breaks and
    /// endpoint-registry ordering stay deterministic across runs.
    pub component_order: Vec<String>,
    pub interface_to_impls: HashMap<String, Vec<String>>,
    pub component_index: HashMap<String, ParsedComponent>,
    pub status: ApplicationStatus,
}

impl ParsedApplication {
    pub fn new_aggregate(root_path: PathBuf) -> Self {
        Self {
            main_class_simple_name: None,
            main_class_package: None,
            is_spring_boot: false,
            root_path,
            line_start: 0,
            line_end: 0,
            controllers: Vec::new(),
            services: Vec::new(),
            repositories: Vec::new(),
            configurations: Vec::new(),
            kafka_listeners: Vec::new(),
            component_order: Vec::new(),
            interface_to_impls: HashMap::new(),
            component_index: HashMap::new(),
            status: ApplicationStatus::Success,
        }
    }

    pub fn new_spring_boot(
        root_path: PathBuf,
        main_class_simple_name: String,
        main_class_package: Option<String>,
        line_start: usize,
        line_end: usize,
    ) -> Self {
        Self {
            main_class_simple_name: Some(main_class_simple_name),
            main_class_package,
            is_spring_boot: true,
            root_path,
            line_start,
            line_end,
            controllers: Vec::new(),
            services: Vec::new(),
            repositories: Vec::new(),
            configurations: Vec::new(),
            kafka_listeners: Vec::new(),
            component_order: Vec::new(),
            interface_to_impls: HashMap::new(),
            component_index: HashMap::new(),
            status: ApplicationStatus::Success,
        }
    }

    /// Stable application identifier: qualified main class, else `{repoUrl}::NON_SPRING`.
    pub fn app_key(&self, repo_url: &str) -> String {
        match (&self.main_class_package, &self.main_class_simple_name) {
            (Some(pkg), Some(name)) if !pkg.is_empty() => format!("{}.{}", pkg, name),
            (_, Some(name)) => name.clone(),
            _ => format!("{}::NON_SPRING", repo_url),
        }
    }

    /// Insert a component into `component_index` under its qualified name, and,
    /// only if absent, also under its simple name. Duplicate qualified-name
    /// insertion is a silent no-op per the spec's documented double-count
    /// dedup behavior when `@SpringBootApplication` packages nest.
    pub fn insert_component(&mut self, component: ParsedComponent) {
        let qualified = component.qualified_name.clone();
        let simple = component.class_name.clone();
        match component.component_type {
            ComponentType::RestController | ComponentType::Controller => {
                self.controllers.push(qualified.clone());
            }
            ComponentType::Service => self.services.push(qualified.clone()),
            ComponentType::Repository => self.repositories.push(qualified.clone()),
            ComponentType::Configuration => self.configurations.push(qualified.clone()),
            ComponentType::KafkaListener => self.kafka_listeners.push(qualified.clone()),
            ComponentType::Component | ComponentType::Unknown => {}
        }
        if self.component_index.contains_key(&qualified) {
            return;
        }
        self.component_order.push(qualified.clone());
        self.component_index.entry(simple).or_insert_with(|| component.clone());
        self.component_index.insert(qualified, component);
    }

    pub fn lookup(&self, name: &str) -> Option<&ParsedComponent> {
        self.component_index.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_type_prefix_matches_canonical_id_kinds() {
        assert_eq!(ComponentType::Service.node_prefix(), Some("service"));
        assert_eq!(ComponentType::RestController.node_prefix(), Some("controller"));
        assert_eq!(ComponentType::KafkaListener.node_prefix(), None);
    }

    #[test]
    fn http_method_from_literal_strips_enum_prefix() {
        assert_eq!(HttpMethod::from_literal("HttpMethod.DELETE"), Some(HttpMethod::Delete));
        assert_eq!(HttpMethod::from_literal("\"put\""), None);
        assert_eq!(HttpMethod::from_literal("put"), Some(HttpMethod::Put));
    }

    #[test]
    fn repository_type_precedence_prefers_reactive_mongo() {
        assert_eq!(
            RepositoryType::from_supertype_name("ReactiveMongoRepository"),
            RepositoryType::ReactiveMongoDb
        );
        assert_eq!(
            RepositoryType::from_supertype_name("JpaRepository"),
            RepositoryType::Jpa
        );
        assert_eq!(
            RepositoryType::from_supertype_name("SomeCustomRepo"),
            RepositoryType::Custom
        );
    }

    #[test]
    fn insert_component_dedups_by_qualified_name() {
        let mut app = ParsedApplication::new_aggregate(PathBuf::from("/repo"));
        let c1 = ParsedComponent::new("Foo", "a.b.Foo", Some("a.b".into()), ComponentType::Service, 1, 5);
        let mut c2 = ParsedComponent::new("Foo", "a.b.Foo", Some("a.b".into()), ComponentType::Service, 100, 105);
        c2.base_url = Some("should-not-win".into());
        app.insert_component(c1);
        app.insert_component(c2);
        assert_eq!(app.component_index.get("a.b.Foo").unwrap().line_start, 1);
        assert_eq!(app.services.len(), 2, "both insertions still counted toward the ordered list");
    }

    #[test]
    fn push_raw_invocation_dedups_within_method() {
        let mut method = ParsedMethod::new("handle", &["String".to_string()], 1, 10);
        let inv = RawInvocation {
            target_field_name: Some("repo".into()),
            declared_type_simple: "UserRepository".into(),
            declared_type_qualified: "a.b.UserRepository".into(),
            method_name: "findById".into(),
            signature: "findById(Long)".into(),
            line_start: 2,
            line_end: 2,
            self_call: false,
        };
        method.push_raw_invocation(inv.clone());
        method.push_raw_invocation(inv);
        assert_eq!(method.raw_invocations.len(), 1);
    }

    #[test]
    fn app_key_falls_back_to_non_spring_sentinel() {
        let app = ParsedApplication::new_aggregate(PathBuf::from("/repo"));
        assert_eq!(app.app_key("https://example.com/repo.git"), "https://example.com/repo.git::NON_SPRING");
    }
}
