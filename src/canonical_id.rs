//! Canonical-ID Generator (C8): deterministic identity strings for nodes and
//! edges that survive file/line/UUID/whitespace changes across revisions.

use once_cell::sync::Lazy;
use regex::Regex;

static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|/)(\d+)(/|$)").unwrap());
static UUID_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}").unwrap()
});
static PATH_VAR_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^{}]*\}").unwrap());

/// Normalize a path: `{x}` -> `{*}`, numeric/UUID segments -> `{*}`,
/// `<dynamic>` -> `{*}`, strip a trailing `/` unless it's the whole path.
pub fn normalize_path(path: &str) -> String {
    let mut normalized = PATH_VAR_SEGMENT.replace_all(path, "{*}").into_owned();
    normalized = normalized.replace("<dynamic>", "{*}");
    normalized = UUID_SEGMENT.replace_all(&normalized, "{*}").into_owned();
    // Numeric segments: replace a purely-numeric path component with {*}.
    normalized = NUMERIC_SEGMENT
        .replace_all(&normalized, |caps: &regex::Captures| format!("/{}{}", "{*}", &caps[2]))
        .into_owned();
    if normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

/// Strip scheme+host and query string from an external-call URL, then apply
/// path normalization. `<dynamic>` markers embedded mid-path are preserved by
/// [`normalize_path`]'s own substitution.
pub fn normalize_external_url(url: &str) -> String {
    let without_query = url.split('?').next().unwrap_or(url);
    let path_only = match without_query.find("://") {
        Some(idx) => {
            let after_scheme = &without_query[idx + 3..];
            match after_scheme.find('/') {
                Some(slash) => &after_scheme[slash..],
                None => "/",
            }
        }
        None => without_query,
    };
    // A leading `<dynamic>` with no scheme stands in for an unresolved host
    // expression (e.g. a `baseUrl` parameter concatenated onto a path); drop
    // it like any other stripped host rather than normalizing it in place.
    let path_only = path_only.strip_prefix("<dynamic>").unwrap_or(path_only);
    normalize_path(path_only)
}

/// Extract parameter *types* (no names) from a Java-style parameter list
/// `(Type1 p1, Type2 p2)`, preserving generics like `List<String>`.
pub fn extract_param_types(params: &str) -> Vec<String> {
    let trimmed = params.trim();
    let inner = trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(trimmed);
    if inner.trim().is_empty() {
        return Vec::new();
    }
    split_params(inner)
        .into_iter()
        .map(|token| {
            let token = token.trim();
            match token.rfind(' ') {
                Some(idx) => token[..idx].trim().to_string(),
                None => token.to_string(),
            }
        })
        .collect()
}

/// Split a parameter list on top-level commas only (commas inside `<...>`
/// generic brackets do not separate parameters).
fn split_params(inner: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in inner.chars() {
        match c {
            '<' => {
                depth += 1;
                current.push(c);
            }
            '>' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                parts.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current);
    }
    parts
}

pub fn method_signature_id(fq_class: Option<&str>, method_name: Option<&str>, params: &str) -> String {
    let class = match fq_class {
        Some(c) if !c.is_empty() => c,
        _ => return "method:unknown".to_string(),
    };
    let name = match method_name {
        Some(n) if !n.is_empty() => n,
        _ => return "method:unknown".to_string(),
    };
    let param_types = extract_param_types(params).join(",");
    format!("method:{}.{}({})", class, name, param_types)
}

pub fn controller_id(package: Option<&str>, class_name: &str) -> String {
    node_id("controller", package, class_name)
}

pub fn service_id(package: Option<&str>, class_name: &str) -> String {
    node_id("service", package, class_name)
}

pub fn repository_id(package: Option<&str>, class_name: &str) -> String {
    node_id("repository", package, class_name)
}

fn node_id(kind: &str, package: Option<&str>, class_name: &str) -> String {
    match package {
        Some(pkg) if !pkg.is_empty() => format!("{}:{}.{}", kind, pkg, class_name),
        _ => format!("{}:{}", kind, class_name),
    }
}

pub fn application_id(app_key: &str) -> String {
    format!("application:{}", app_key)
}

pub fn endpoint_id(http_method: &str, path: &str) -> String {
    format!("endpoint:{}:{}", http_method.to_uppercase(), normalize_path(path))
}

pub fn external_call_id(http_method: &str, url: &str, resolved: bool) -> String {
    format!(
        "external:{}:{}:resolved={}",
        http_method.to_uppercase(),
        normalize_external_url(url),
        resolved
    )
}

pub fn kafka_topic_id(name: &str) -> String {
    format!("kafka_topic:{}", name)
}

pub fn database_table_id(name: &str) -> String {
    format!("database_table:{}", name.to_lowercase())
}

pub fn edge_id(edge_type: &str, src_canonical: &str, dst_canonical: &str) -> String {
    format!("{}:{}->{}", edge_type.to_lowercase(), src_canonical, dst_canonical)
}
