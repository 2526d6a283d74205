//! Versioned configuration store: the annotation/method tables that drive
//! classification, invocation recognition, and the standard-type filter.
//!
//! Mirrors the rule-table-plus-defaults shape of a line-based config analyzer:
//! a fixed set of name tables, loaded once, with an explicit version counter
//! bumped on mutation so callers holding compiled caches know to invalidate.

use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    version: u64,
    pub mapping_annotations: HashSet<String>,
    pub rest_template_methods: HashSet<String>,
    pub webclient_http_methods: HashSet<String>,
    pub kafka_producer_methods: HashSet<String>,
    pub kafka_producer_types: HashSet<String>,
    pub http_url_connection_methods: HashSet<String>,
    pub repository_write_methods: HashSet<String>,
    pub repository_read_methods: HashSet<String>,
    pub allowed_analysis_packages: HashSet<String>,
    /// App-key -> concrete topic name, for opting a specific `sendDefault`
    /// producer into cross-application resolution. Empty by default: the
    /// `<default-topic>` sentinel is never auto-matched (see DESIGN.md).
    pub default_topic_overrides: HashMap<String, String>,
}

fn set_of(items: &[&str]) -> HashSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self {
            version: 1,
            mapping_annotations: set_of(&[
                "GetMapping",
                "PostMapping",
                "PutMapping",
                "DeleteMapping",
                "PatchMapping",
                "RequestMapping",
            ]),
            rest_template_methods: set_of(&[
                "getForObject",
                "getForEntity",
                "postForObject",
                "postForEntity",
                "put",
                "delete",
                "exchange",
                "patchForObject",
                "execute",
            ]),
            webclient_http_methods: set_of(&[
                "get", "post", "put", "delete", "patch", "head", "options", "method",
            ]),
            kafka_producer_methods: set_of(&["send", "sendDefault"]),
            kafka_producer_types: set_of(&["KafkaTemplate", "ReactiveKafkaProducerTemplate"]),
            http_url_connection_methods: set_of(&[
                "openConnection",
                "setRequestMethod",
                "getInputStream",
                "getOutputStream",
                "connect",
            ]),
            repository_write_methods: set_of(&[
                "save",
                "saveAll",
                "saveAndFlush",
                "saveAllAndFlush",
                "delete",
                "deleteAll",
                "deleteById",
                "deleteAllById",
                "deleteInBatch",
                "deleteAllInBatch",
                "insert",
                "update",
                "upsert",
            ]),
            repository_read_methods: set_of(&[
                "findById",
                "findAll",
                "findAllById",
                "existsById",
                "count",
                "getById",
                "getReferenceById",
                "getOne",
            ]),
            allowed_analysis_packages: set_of(&["org.springframework.web.client"]),
            default_topic_overrides: HashMap::new(),
        }
    }
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Register an additional package whose types should be analyzed even
    /// though they'd otherwise match the standard-type filter (e.g. the
    /// caller's own root package, per spec's "plus the caller's own root
    /// package" clause).
    pub fn allow_analysis_package(&mut self, package: impl Into<String>) {
        self.allowed_analysis_packages.insert(package.into());
        self.version += 1;
    }

    pub fn set_default_topic_override(&mut self, app_key: impl Into<String>, topic: impl Into<String>) {
        self.default_topic_overrides.insert(app_key.into(), topic.into());
        self.version += 1;
    }

    pub fn annotation_to_http_method(&self, annotation: &str) -> Option<crate::model::HttpMethod> {
        crate::model::HttpMethod::from_mapping_annotation(annotation)
    }

    const STANDARD_PREFIXES: &'static [&'static str] = &[
        "java.",
        "javax.",
        "jakarta.",
        "org.springframework.",
        "lombok.",
        "org.slf4j.",
        "org.apache.",
    ];

    /// A qualified name is "standard" iff it starts with one of the hardcoded
    /// JDK/framework prefixes and isn't prefix-matched by an allow-listed
    /// analysis package.
    pub fn is_standard_type(&self, qualified_name: &str) -> bool {
        if self
            .allowed_analysis_packages
            .iter()
            .any(|pkg| qualified_name.starts_with(pkg.as_str()))
        {
            return false;
        }
        Self::STANDARD_PREFIXES
            .iter()
            .any(|prefix| qualified_name.starts_with(prefix))
    }
}
