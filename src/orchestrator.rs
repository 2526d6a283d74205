//! Orchestrator (C10): drives the whole pipeline end to end over one
//! repository tree — file discovery, property loading (C1), the
//! repository-wide value-field map (C3), per-application Pass 1/Pass 2
//! (C4–C6), Feign reclassification, cross-application resolution (C7),
//! and graph emission (C9) — into a [`GraphSink`]/[`AnalysisStore`] pair.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use tracing::warn;
use tree_sitter::{QueryCursor, Tree};
use walkdir::WalkDir;

use crate::ast;
use crate::component_parser::{self, FeignClientInfo, FileParseInput};
use crate::config::ConfigStore;
use crate::cross_app;
use crate::graph::{self, GraphSink};
use crate::model::{ApplicationStatus, ParsedApplication, ParsedComponent, TableSource};
use crate::properties::PropertyMap;
use crate::store::AnalysisStore;
use crate::value_fields;

/// One `@SpringBootApplication`-annotated main class discovered while
/// scanning the repository for application roots.
#[derive(Debug, Clone)]
struct SpringBootMain {
    simple_name: String,
    package: Option<String>,
    line_start: usize,
    line_end: usize,
}

impl SpringBootMain {
    fn base_package(&self) -> Option<&str> {
        self.package.as_deref()
    }
}

struct ParsedFile {
    path: PathBuf,
    code: Vec<u8>,
    tree: Tree,
    package: Option<String>,
    imports: Vec<String>,
}

/// Collect every `.java` file under `root`, sorted by path so parallel Pass 1
/// assigns deterministic classification/componentIndex insertion order.
fn discover_java_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().and_then(|e| e.to_str()) == Some("java"))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

/// Scan one parsed file's top-level type declarations for a class carrying
/// `@SpringBootApplication`, mirroring the `(modifiers)` child lookup the
/// component parser uses for class-level annotations.
fn detect_spring_boot_main(tree: &Tree, code: &[u8], package: &Option<String>) -> Option<SpringBootMain> {
    let mut cursor = QueryCursor::new();
    let query = ast::type_decl_query();
    for m in cursor.matches(query, tree.root_node(), code) {
        let Some(class_capture) = m.captures.iter().find(|c| query.capture_names()[c.index as usize] == "class_decl") else {
            continue;
        };
        let modifiers_text = class_capture
            .node
            .child(0)
            .filter(|c| c.kind() == "modifiers")
            .and_then(|c| c.utf8_text(code).ok())
            .unwrap_or("");
        if !modifiers_text.contains("@SpringBootApplication") {
            continue;
        }
        let Some(name_capture) = m.captures.iter().find(|c| query.capture_names()[c.index as usize] == "class_name") else {
            continue;
        };
        let Ok(name) = name_capture.node.utf8_text(code) else { continue };
        return Some(SpringBootMain {
            simple_name: name.to_string(),
            package: package.clone(),
            line_start: class_capture.node.start_position().row + 1,
            line_end: class_capture.node.end_position().row + 1,
        });
    }
    None
}

/// Parse every discovered file once, collecting package/import metadata and
/// any `@SpringBootApplication` main classes along the way. Files that fail
/// to read or parse are skipped and logged, never aborting the whole run.
fn parse_all_files(files: &[PathBuf], cancel: &AtomicBool) -> (Vec<ParsedFile>, Vec<SpringBootMain>, usize) {
    let mut parsed = Vec::with_capacity(files.len());
    let mut mains = Vec::new();
    let mut skipped = 0usize;

    for path in files {
        if cancel.load(Ordering::Relaxed) {
            break;
        }
        let code = match std::fs::read(path) {
            Ok(c) => c,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping unreadable file");
                skipped += 1;
                continue;
            }
        };
        let text = match std::str::from_utf8(&code) {
            Ok(t) => t,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping non-UTF-8 file");
                skipped += 1;
                continue;
            }
        };
        let tree = match ast::parse(text, path) {
            Ok(t) => t,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping unparseable file");
                skipped += 1;
                continue;
            }
        };
        let package = ast::extract_package(&tree, &code);
        let imports = ast::extract_imports(&tree, &code);
        if let Some(main) = detect_spring_boot_main(&tree, &code, &package) {
            mains.push(main);
        }
        parsed.push(ParsedFile { path: path.clone(), code, tree, package, imports });
    }

    (parsed, mains, skipped)
}

/// Build the repository-wide `@Value`/constant value-field map (C3). Scopes
/// each file's fields to its primary public class, derived from the file
/// name per the Java-language convention that a file's public top-level
/// class shares its name — component_parser itself makes the same
/// one-class-per-file assumption when it resolves a declaration's qualified
/// name independently of its siblings.
fn build_value_field_map(parsed_files: &[ParsedFile], props: &PropertyMap) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for pf in parsed_files {
        let stem = pf.path.file_stem().and_then(|s| s.to_str()).unwrap_or("Unknown");
        let class_fqn = match &pf.package {
            Some(pkg) if !pkg.is_empty() => format!("{}.{}", pkg, stem),
            _ => stem.to_string(),
        };
        value_fields::collect(&pf.tree, &pf.code, &class_fqn, props, &mut out);
    }
    out
}

/// Build the repository-wide `entity simple name -> (tableName, tableSource)`
/// map from every class's `@Table`/`@Document` annotation, consulted by the
/// repository-analysis sub-step since the entity class usually lives in a
/// different file than the repository interface naming it.
fn build_entity_table_map(parsed_files: &[ParsedFile]) -> HashMap<String, (String, TableSource)> {
    let mut out = HashMap::new();
    for pf in parsed_files {
        for (simple_name, table_name, source) in component_parser::scan_entity_table_annotations(&pf.tree, &pf.code) {
            out.insert(simple_name, (table_name, source));
        }
    }
    out
}

/// Run Pass 1 (C5) over every file for one application's scope, in parallel.
/// `rayon`'s `par_iter().collect()` preserves input order, so the resulting
/// component list is deterministic given a deterministic file list.
fn run_pass1(
    parsed_files: &[ParsedFile],
    base_package: Option<&str>,
    props: &PropertyMap,
    config: &ConfigStore,
    value_field_map: &HashMap<String, String>,
    entity_table_map: &HashMap<String, (String, TableSource)>,
) -> (Vec<ParsedComponent>, Vec<FeignClientInfo>) {
    let outputs: Vec<_> = parsed_files
        .par_iter()
        .map(|pf| {
            let input = FileParseInput {
                code: &pf.code,
                file_path: &pf.path,
                package: pf.package.clone(),
                imports: pf.imports.clone(),
                props,
                config,
                value_field_map,
                base_package,
                entity_table_map,
            };
            component_parser::parse_file(&pf.tree, &input)
        })
        .collect();

    let mut components = Vec::new();
    let mut feign_clients = Vec::new();
    for output in outputs {
        components.extend(output.components);
        feign_clients.extend(output.feign_clients);
    }
    (components, feign_clients)
}

/// Run the full pipeline over one repository tree and return every
/// application discovered, keyed by its stable `app_key`. `repo_url` feeds
/// the non-Spring aggregate's `{repoUrl}::NON_SPRING` sentinel key.
pub fn analyze_tree(root: &Path, repo_url: &str, config: &ConfigStore, cancel: &AtomicBool) -> Vec<(String, ParsedApplication)> {
    let files = discover_java_files(root);
    let props = PropertyMap::load(root);
    let (parsed_files, mains, skipped_files) = parse_all_files(&files, cancel);
    let value_field_map = build_value_field_map(&parsed_files, &props);
    let entity_table_map = build_entity_table_map(&parsed_files);

    let had_skips = skipped_files > 0;
    let mut apps = Vec::new();

    if mains.is_empty() {
        if cancel.load(Ordering::Relaxed) {
            return apps;
        }
        let (components, feign_clients) = run_pass1(&parsed_files, None, &props, config, &value_field_map, &entity_table_map);
        let mut app = ParsedApplication::new_aggregate(root.to_path_buf());
        for component in components {
            app.insert_component(component);
        }
        crate::resolver::resolve(&mut app);
        component_parser::reclassify_feign_calls(&mut app, &feign_clients);
        if had_skips {
            app.status = ApplicationStatus::PartialSuccess;
        }
        let key = app.app_key(repo_url);
        apps.push((key, app));
    } else {
        for main in &mains {
            if cancel.load(Ordering::Relaxed) {
                break;
            }
            let (components, feign_clients) =
                run_pass1(&parsed_files, main.base_package(), &props, config, &value_field_map, &entity_table_map);
            let mut app = ParsedApplication::new_spring_boot(
                root.to_path_buf(),
                main.simple_name.clone(),
                main.package.clone(),
                main.line_start,
                main.line_end,
            );
            for component in components {
                app.insert_component(component);
            }
            crate::resolver::resolve(&mut app);
            component_parser::reclassify_feign_calls(&mut app, &feign_clients);
            if had_skips {
                app.status = ApplicationStatus::PartialSuccess;
            }
            let key = app.app_key(repo_url);
            apps.push((key, app));
        }
    }

    cross_app::resolve_external_calls(&mut apps);
    cross_app::resolve_kafka_calls(&mut apps);

    apps
}

/// Emit the graph batch for every analyzed application plus the
/// cross-application `CALLS_ENDPOINT` edges, then persist each application's
/// parsed form to `store`. `project_id` scopes the store's keyspace; callers
/// typically pass the repository's clone URL or a local path.
pub fn emit_and_store(
    apps: &[(String, ParsedApplication)],
    project_id: &str,
    sink: &mut dyn GraphSink,
    store: &mut dyn AnalysisStore,
) {
    for (app_key, app) in apps {
        let (nodes, edges) = graph::emit_application(app, app_key);
        sink.upsert_nodes(nodes);
        sink.upsert_edges(edges);
        store.put(project_id, app_key, app.clone());
    }

    let cross_edges = cross_app::emit_cross_application_edges(apps);
    sink.upsert_edges(cross_edges);
}

/// Analyze and persist one repository tree in a single call; the common path
/// for the `scan` CLI subcommand.
pub fn run(
    root: &Path,
    repo_url: &str,
    project_id: &str,
    config: &ConfigStore,
    cancel: &AtomicBool,
    sink: &mut dyn GraphSink,
    store: &mut dyn AnalysisStore,
) -> Vec<(String, ParsedApplication)> {
    let apps = analyze_tree(root, repo_url, config, cancel);
    emit_and_store(&apps, project_id, sink, store);
    apps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::InMemoryGraphSink;
    use crate::store::InMemoryAnalysisStore;
    use std::io::Write;
    use std::sync::atomic::AtomicBool;

    fn write_file(dir: &std::path::Path, relative: &str, contents: &str) {
        let path = dir.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut f = std::fs::File::create(path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn spring_boot_main_partitions_components_into_one_application() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "src/main/java/com/example/App.java",
            r#"
                package com.example;
                @SpringBootApplication
                public class App {}
            "#,
        );
        write_file(
            dir.path(),
            "src/main/java/com/example/web/UserController.java",
            r#"
                package com.example.web;
                @RestController
                public class UserController {
                    @GetMapping("/users/{id}")
                    public String getUser(Long id) { return ""; }
                }
            "#,
        );

        let config = ConfigStore::new();
        let cancel = AtomicBool::new(false);
        let apps = analyze_tree(dir.path(), "https://example.com/repo.git", &config, &cancel);

        assert_eq!(apps.len(), 1);
        let (key, app) = &apps[0];
        assert_eq!(key, "com.example.App");
        assert!(app.is_spring_boot);
        assert_eq!(app.controllers.len(), 1);
    }

    #[test]
    fn no_main_class_falls_back_to_single_aggregate() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "src/main/java/com/example/OrderService.java",
            r#"
                package com.example;
                @Service
                public class OrderService {}
            "#,
        );

        let config = ConfigStore::new();
        let cancel = AtomicBool::new(false);
        let apps = analyze_tree(dir.path(), "https://example.com/repo.git", &config, &cancel);

        assert_eq!(apps.len(), 1);
        let (key, app) = &apps[0];
        assert_eq!(key, "https://example.com/repo.git::NON_SPRING");
        assert!(!app.is_spring_boot);
        assert_eq!(app.services.len(), 1);
    }

    #[test]
    fn run_persists_into_sink_and_store() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "src/main/java/com/example/OrderService.java",
            r#"
                package com.example;
                @Service
                public class OrderService {}
            "#,
        );

        let config = ConfigStore::new();
        let cancel = AtomicBool::new(false);
        let mut sink = InMemoryGraphSink::default();
        let mut store = InMemoryAnalysisStore::default();
        let apps = run(dir.path(), "https://example.com/repo.git", "proj-1", &config, &cancel, &mut sink, &mut store);

        assert_eq!(apps.len(), 1);
        assert!(!sink.nodes.is_empty());
    }
}
