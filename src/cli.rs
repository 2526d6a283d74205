//! CLI surface (ambient, C10's driving entry point): `scan`, `summary`,
//! `status`, dispatched from `main.rs`.

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use anyhow::{bail, Result};
use clap::Subcommand;
use serde_json::json;
use walkdir::WalkDir;

use crate::config::ConfigStore;
use crate::graph::InMemoryGraphSink;
use crate::orchestrator;
use crate::project_detector;
use crate::store::InMemoryAnalysisStore;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the full extraction pipeline (C1-C10) over a repository path.
    Scan {
        /// Repository path to analyze.
        path: PathBuf,

        /// Print the full serialized application set instead of a summary.
        #[arg(long)]
        json: bool,

        /// Only keep applications whose main-class package starts with this prefix.
        #[arg(long = "app-filter")]
        app_filter: Option<String>,
    },

    /// Quick walkdir-based file/package/stack summary, no AST parsing.
    Summary { path: PathBuf },

    /// Print the loaded ConfigStore's version and set sizes.
    Status,
}

pub fn handle_command(command: Command) -> Result<()> {
    match command {
        Command::Scan { path, json, app_filter } => run_scan(&path, json, app_filter.as_deref()),
        Command::Summary { path } => run_summary(&path),
        Command::Status => run_status(),
    }
}

fn run_scan(path: &Path, json_output: bool, app_filter: Option<&str>) -> Result<()> {
    if !path.exists() {
        bail!("path not found: {}", path.display());
    }

    let config = ConfigStore::new();
    let cancel = AtomicBool::new(false);
    let repo_url = path.display().to_string();
    let mut sink = InMemoryGraphSink::default();
    let mut store = InMemoryAnalysisStore::default();

    let mut apps = orchestrator::run(path, &repo_url, &repo_url, &config, &cancel, &mut sink, &mut store);
    if let Some(filter) = app_filter {
        apps.retain(|(_, app)| {
            app.main_class_package
                .as_deref()
                .map(|pkg| pkg.starts_with(filter))
                .unwrap_or(false)
        });
    }

    if json_output {
        let serializable: Vec<_> = apps
            .iter()
            .map(|(app_key, app)| json!({ "appKey": app_key, "application": app }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&serializable)?);
        return Ok(());
    }

    for (app_key, app) in &apps {
        let components: Vec<_> = app
            .component_index
            .iter()
            .filter(|(key, component)| *key == &component.qualified_name)
            .map(|(_, component)| component)
            .collect();

        let endpoint_count: usize = components
            .iter()
            .filter(|c| c.component_type.is_controller())
            .map(|c| c.methods.iter().filter(|m| m.http_method.is_some()).count())
            .sum();
        let unresolved_external: usize = components
            .iter()
            .flat_map(|c| c.methods.iter())
            .flat_map(|m| m.external_calls.iter())
            .filter(|call| !call.resolved)
            .count();
        let unresolved_kafka: usize = components
            .iter()
            .flat_map(|c| c.methods.iter())
            .flat_map(|m| m.kafka_calls.iter())
            .filter(|call| !call.resolved)
            .count();

        println!("Application: {}", app_key);
        println!("  status: {:?}", app.status);
        println!("  controllers: {}", app.controllers.len());
        println!("  services: {}", app.services.len());
        println!("  repositories: {}", app.repositories.len());
        println!("  kafka listeners: {}", app.kafka_listeners.len());
        println!("  endpoints: {}", endpoint_count);
        println!("  unresolved external calls: {}", unresolved_external);
        println!("  unresolved kafka producer calls: {}", unresolved_kafka);
    }

    Ok(())
}

fn run_summary(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("path not found: {}", path.display());
    }

    let mut java_files = 0usize;
    let mut yaml_files = 0usize;
    let mut properties_files = 0usize;
    let mut has_spring_boot_main = false;

    for entry in WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let file_path = entry.path();
        match file_path.extension().and_then(|e| e.to_str()) {
            Some("java") => {
                java_files += 1;
                if !has_spring_boot_main {
                    if let Ok(content) = std::fs::read_to_string(file_path) {
                        if content.contains("@SpringBootApplication") {
                            has_spring_boot_main = true;
                        }
                    }
                }
            }
            Some("yml") | Some("yaml") => yaml_files += 1,
            Some("properties") => properties_files += 1,
            _ => {}
        }
    }

    let stack = project_detector::detect_stack(path);
    let strategy_hint = project_detector::generate_strategy_hint(&stack);

    println!("Path: {}", path.display());
    println!("Java files: {}", java_files);
    println!("YAML files: {}", yaml_files);
    println!("Properties files: {}", properties_files);
    println!("Spring Boot main class detected: {}", has_spring_boot_main);
    println!("Build tool: {}", if stack.build_tool.is_empty() { "unknown" } else { &stack.build_tool });
    println!("JDK version: {}", stack.jdk_version);
    println!("{}", strategy_hint);

    Ok(())
}

fn run_status() -> Result<()> {
    let config = ConfigStore::new();
    println!("ConfigStore version: {}", config.version());
    println!("mapping annotations: {}", config.mapping_annotations.len());
    println!("rest template methods: {}", config.rest_template_methods.len());
    println!("webclient http methods: {}", config.webclient_http_methods.len());
    println!("kafka producer methods: {}", config.kafka_producer_methods.len());
    println!("kafka producer types: {}", config.kafka_producer_types.len());
    println!("http url connection methods: {}", config.http_url_connection_methods.len());
    println!("repository read methods: {}", config.repository_read_methods.len());
    println!("repository write methods: {}", config.repository_write_methods.len());
    println!("allowed analysis packages: {}", config.allowed_analysis_packages.len());
    Ok(())
}
