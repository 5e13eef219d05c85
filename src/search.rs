use std::collections::HashMap;

use reqwest::Url;

use crate::error::AnnotError;
use crate::markup::{MarkupHandler, walk};

pub const UNIPROT_ROOT_URL: &str = "https://uniprot.org";

/// Organisms excluded by the selection policy. Common model organisms are
/// presumed uninteresting for this tool's purpose; matching is a
/// case-insensitive substring test.
pub const EXCLUDED_ORGANISMS: [&str; 3] = ["human", "mouse", "yeast"];

/// One row-level hit from a search-results table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCandidate {
    pub detail_url: String,
    pub organism: String,
}

/// Builds the search-results URL for one query, percent-escaping the query
/// string.
pub fn results_url(root: &str, query: &str) -> Result<String, AnnotError> {
    let url = Url::parse_with_params(
        &format!("{root}/uniprot/"),
        &[("query", query), ("sort", "score")],
    )
    .map_err(|err| AnnotError::Http(err.to_string()))?;
    Ok(url.to_string())
}

/// Extracts candidates from the markup of a search-results page, in
/// document order.
pub fn parse_results(html: &str) -> Result<Vec<SearchCandidate>, AnnotError> {
    let mut walker = ResultsTableWalker::default();
    walk(html, &mut walker)?;
    Ok(walker.candidates)
}

/// Applies the organism exclusion policy and picks the detail URL of the
/// first surviving candidate.
pub fn select(candidates: &[SearchCandidate]) -> Option<&SearchCandidate> {
    candidates.iter().find(|candidate| {
        let organism = candidate.organism.to_lowercase();
        !EXCLUDED_ORGANISMS
            .iter()
            .any(|excluded| organism.contains(excluded))
    })
}

/// Streaming walker over a tabular search-results page.
///
/// The header region records a label for each column index; body rows are
/// then read positionally: an anchor href in the column labelled "Entry"
/// and cell text in the column labelled "Organism". A candidate is emitted
/// at any tag close once both are set, then both reset, so a row can emit
/// more than once if its cell order populates both early. A body cell whose
/// index has no recorded header label means header and body disagree on the
/// column count, which is a hard error rather than a silent skip.
#[derive(Debug, Default)]
struct ResultsTableWalker {
    candidates: Vec<SearchCandidate>,
    column_labels: HashMap<usize, String>,
    in_header: bool,
    in_body: bool,
    column_index: usize,
    current_url: Option<String>,
    current_organism: Option<String>,
}

impl ResultsTableWalker {
    fn label(&self) -> Result<&str, AnnotError> {
        self.column_labels
            .get(&self.column_index)
            .map(String::as_str)
            .ok_or(AnnotError::ColumnMismatch {
                index: self.column_index,
            })
    }
}

impl MarkupHandler for ResultsTableWalker {
    fn on_tag_open(&mut self, tag: &str, attrs: &[(String, String)]) -> Result<(), AnnotError> {
        if !self.in_header && tag == "thead" {
            self.in_header = true;
            self.column_index = 0;
        }
        if !self.in_body && tag == "tbody" {
            self.in_body = true;
            self.column_index = 0;
        }

        if self.in_body {
            if tag == "tr" {
                self.column_index = 0;
            }
            if self.label()? == "Entry" && tag == "a" {
                if let Some((_, href)) = attrs.iter().find(|(key, _)| key == "href") {
                    self.current_url = Some(href.clone());
                }
            }
        }
        Ok(())
    }

    fn on_text(&mut self, text: &str) -> Result<(), AnnotError> {
        if self.in_header {
            self.column_labels
                .insert(self.column_index, text.to_string());
        }
        if self.in_body && self.label()? == "Organism" {
            self.current_organism = Some(text.to_string());
        }
        Ok(())
    }

    fn on_tag_close(&mut self, tag: &str) -> Result<(), AnnotError> {
        if tag == "thead" {
            self.in_header = false;
        }
        if tag == "tbody" {
            self.in_body = false;
        }

        if tag == "th" && self.in_header {
            self.column_labels.entry(self.column_index).or_default();
            self.column_index += 1;
        }
        if tag == "td" && self.in_body {
            self.column_index += 1;
        }

        if let (Some(detail_url), Some(organism)) = (&self.current_url, &self.current_organism) {
            self.candidates.push(SearchCandidate {
                detail_url: detail_url.clone(),
                organism: organism.clone(),
            });
            self.current_url = None;
            self.current_organism = None;
        }
        Ok(())
    }
}
