//! `AnalysisStore` output boundary: the document-store persistence layer is
//! out of scope, but the contract and a test double live here so the
//! orchestrator has somewhere real to write.

use std::collections::HashMap;

use crate::model::ParsedApplication;

pub trait AnalysisStore {
    fn put(&mut self, project_id: &str, app_key: &str, result: ParsedApplication);
}

#[derive(Debug, Default)]
pub struct InMemoryAnalysisStore {
    pub entries: HashMap<(String, String), ParsedApplication>,
}

impl AnalysisStore for InMemoryAnalysisStore {
    fn put(&mut self, project_id: &str, app_key: &str, result: ParsedApplication) {
        self.entries.insert((project_id.to_string(), app_key.to_string()), result);
    }
}
