use std::fs;
use std::path::Path;

use crate::cache::ResponseCache;
use crate::entry::{self, EntryRecord};
use crate::error::AnnotError;
use crate::fetch::{CachingFetcher, UrlFetcher};
use crate::search::{self, UNIPROT_ROOT_URL};

/// Reads the newline-delimited query list. Lines are trimmed and empty
/// lines skipped; semicolon-separated sub-queries inside one line are split
/// at processing time.
pub fn read_queries(path: &Path) -> Result<Vec<String>, AnnotError> {
    let content =
        fs::read_to_string(path).map_err(|_| AnnotError::InputRead(path.to_path_buf()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Drives the search -> select -> extract pipeline, one query at a time.
pub struct App<F: UrlFetcher> {
    resolver: CachingFetcher<F>,
    root_url: String,
}

impl<F: UrlFetcher> App<F> {
    pub fn new(cache: ResponseCache, fetcher: F) -> Self {
        Self::with_root_url(cache, fetcher, UNIPROT_ROOT_URL)
    }

    pub fn with_root_url(cache: ResponseCache, fetcher: F, root_url: &str) -> Self {
        Self {
            resolver: CachingFetcher::new(cache, fetcher),
            root_url: root_url.to_string(),
        }
    }

    /// Processes every line strictly sequentially. Per-query failures are
    /// logged and skipped; cache and filesystem failures abort the run.
    pub fn run(&mut self, lines: &[String]) -> Result<Vec<EntryRecord>, AnnotError> {
        let mut records = Vec::new();
        for line in lines {
            for sub_query in line.split(';') {
                match self.annotate(sub_query, line) {
                    Ok(Some(record)) => records.push(record),
                    Ok(None) => {}
                    Err(err) if err.is_fatal() => return Err(err),
                    Err(err) => {
                        tracing::error!(query = sub_query, error = %err, "query failed, continuing");
                    }
                }
            }
        }
        Ok(records)
    }

    /// Resolves one sub-query to a record. `record_id` is the full input
    /// line the sub-query came from and is what the record carries.
    fn annotate(
        &mut self,
        sub_query: &str,
        record_id: &str,
    ) -> Result<Option<EntryRecord>, AnnotError> {
        let results_url = search::results_url(&self.root_url, sub_query)?;
        let html = self.resolver.resolve(&results_url)?;
        let candidates = search::parse_results(&html)?;

        let Some(candidate) = search::select(&candidates) else {
            tracing::warn!(query = sub_query, "no acceptable search result, skipping query");
            return Ok(None);
        };
        let detail_url = format!("{}{}", self.root_url, candidate.detail_url);
        tracing::info!(query = sub_query, url = %detail_url, "selected entry");

        let xml = self.resolver.resolve(&format!("{detail_url}.xml"))?;
        let record = entry::extract(&xml, record_id)?;
        Ok(Some(record))
    }
}
