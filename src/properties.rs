//! Property/placeholder resolution (C1): flattens `application.{yaml,yml,properties}`
//! into a dot-notation key/value map and resolves `${key:default}` placeholders.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// Flat, ordered view of every property file under a repository root.
#[derive(Debug, Clone, Default)]
pub struct PropertyMap {
    pub entries: BTreeMap<String, String>,
}

impl PropertyMap {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|s| s.as_str())
    }

    /// Load and flatten every `application.{yaml,yml,properties}` file found
    /// under `root`, sorted by path so that "last writer wins" is
    /// deterministic across filesystems/platforms.
    pub fn load(root: &Path) -> Self {
        let mut files: Vec<_> = WalkDir::new(root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| is_application_property_file(entry.file_name().to_string_lossy().as_ref()))
            .map(|entry| entry.path().to_path_buf())
            .collect();
        files.sort();

        let mut map = PropertyMap::default();
        for file in files {
            match load_one(&file) {
                Ok(flat) => {
                    for (k, v) in flat {
                        map.entries.insert(k, v);
                    }
                }
                Err(err) => {
                    tracing::warn!(file = %file.display(), error = %err, "skipping malformed configuration file");
                }
            }
        }
        map
    }
}

fn is_application_property_file(file_name: &str) -> bool {
    matches!(
        file_name,
        "application.yaml" | "application.yml" | "application.properties"
    ) || (file_name.starts_with("application-")
        && (file_name.ends_with(".yaml") || file_name.ends_with(".yml") || file_name.ends_with(".properties")))
}

fn load_one(path: &Path) -> Result<BTreeMap<String, String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading property file {}", path.display()))?;
    let file_name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
    if file_name.ends_with(".properties") {
        Ok(parse_properties(&content))
    } else {
        let value: serde_yaml::Value = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing YAML {}", path.display()))?;
        let mut out = BTreeMap::new();
        flatten_yaml(&value, String::new(), &mut out);
        Ok(out)
    }
}

fn parse_properties(content: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let sep = line.find('=').or_else(|| line.find(':'));
        if let Some(idx) = sep {
            let key = line[..idx].trim().to_string();
            let value = line[idx + 1..].trim().to_string();
            if !key.is_empty() {
                out.insert(key, value);
            }
        }
    }
    out
}

/// Flatten a YAML value to dot-notation keys; list entries append `[i]`.
fn flatten_yaml(value: &serde_yaml::Value, prefix: String, out: &mut BTreeMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (k, v) in map {
                let key_str = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    other => serde_yaml_scalar_to_string(other),
                };
                let next_prefix = if prefix.is_empty() {
                    key_str
                } else {
                    format!("{}.{}", prefix, key_str)
                };
                flatten_yaml(v, next_prefix, out);
            }
        }
        serde_yaml::Value::Sequence(seq) => {
            for (i, v) in seq.iter().enumerate() {
                let next_prefix = format!("{}[{}]", prefix, i);
                flatten_yaml(v, next_prefix, out);
            }
        }
        serde_yaml::Value::Null => {
            out.insert(prefix, String::new());
        }
        scalar => {
            out.insert(prefix, serde_yaml_scalar_to_string(scalar));
        }
    }
}

fn serde_yaml_scalar_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => String::new(),
        other => serde_yaml::to_string(other).unwrap_or_default().trim().to_string(),
    }
}

/// Does `text` contain a `${...}` or `#{...}` placeholder?
pub fn has_placeholder(text: &str) -> bool {
    text.contains("${") || text.contains("#{")
}

/// Extract the raw key names inside every `${...}` in `text` (ignores
/// `#{...}` SpEL blocks, which are never evaluated — see resolve_all).
pub fn extract_keys(text: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' && bytes.get(i + 1) == Some(&b'{') {
            if let Some(end) = text[i + 2..].find('}') {
                let inner = &text[i + 2..i + 2 + end];
                let key = inner.split(':').next().unwrap_or(inner);
                keys.push(key.to_string());
                i += 2 + end + 1;
                continue;
            }
        }
        i += 1;
    }
    keys
}

/// Resolve one `${key}` or `${key:default}` placeholder (braces included).
/// Unknown key with no default returns the placeholder unchanged; this never
/// recurses, so a chain of unresolved placeholders cannot loop.
pub fn resolve(placeholder: &str, props: &PropertyMap) -> String {
    let inner = match placeholder.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        Some(inner) => inner,
        None => return placeholder.to_string(),
    };
    let (key, default) = match inner.split_once(':') {
        Some((k, d)) => (k, Some(d)),
        None => (inner, None),
    };
    if let Some(value) = props.get(key) {
        return value.to_string();
    }
    if let Some(default) = default {
        return default.to_string();
    }
    placeholder.to_string()
}

/// Replace every `${...}` occurrence in `text` via [`resolve`]; any `#{...}`
/// SpEL expression is substituted with `<dynamic>` since no expression engine
/// is evaluated.
pub fn resolve_all(text: &str, props: &PropertyMap) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        let dollar = rest.find("${");
        let hash = rest.find("#{");
        let next = match (dollar, hash) {
            (Some(d), Some(h)) => Some(d.min(h)),
            (Some(d), None) => Some(d),
            (None, Some(h)) => Some(h),
            (None, None) => None,
        };
        let Some(start) = next else {
            out.push_str(rest);
            break;
        };
        out.push_str(&rest[..start]);
        let is_dollar = rest.as_bytes()[start] == b'$';
        match rest[start + 2..].find('}') {
            Some(end) => {
                if is_dollar {
                    let placeholder = &rest[start..start + 2 + end + 1];
                    out.push_str(&resolve(placeholder, props));
                } else {
                    out.push_str("<dynamic>");
                }
                rest = &rest[start + 2 + end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                break;
            }
        }
    }
    out
}
