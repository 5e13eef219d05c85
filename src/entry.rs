use crate::error::AnnotError;
use crate::tree::{Element, TagPath, parse_document};

pub const UNIPROT_NAMESPACE: &str = "http://uniprot.org/uniprot";

/// The entry status column cannot be recovered from the entry document.
pub const STATUS_PLACEHOLDER: &str = "status parsing is not yet supported";

const GO_PROCESS_PREFIX: &str = "P:";

/// Consolidated annotation for one resolved query. Absent scalar fields
/// render as "unknown".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    pub query: String,
    pub protein: Option<String>,
    pub gene: Option<String>,
    pub organism: Option<String>,
    pub status: Option<String>,
    pub function: Option<String>,
    pub function_publications: Option<String>,
    pub pathway: Option<String>,
    pub biological_processes: Vec<String>,
    pub disruption_phenotype: Option<String>,
}

/// Maps the markup of one entry document into an [`EntryRecord`].
///
/// `query` is stored verbatim as the record identifier, not re-derived
/// from the document.
pub fn extract(xml: &str, query: &str) -> Result<EntryRecord, AnnotError> {
    let root = parse_document(xml)?;

    let protein = scalar_text(
        &root,
        path()
            .child("entry")
            .child("protein")
            .child("recommendedName")
            .child("fullName"),
    );

    let gene = scalar_text(
        &root,
        path()
            .child("entry")
            .child("gene")
            .child_where("name", "type", "primary"),
    );

    let organism = scalar_text(
        &root,
        path()
            .child("entry")
            .child("organism")
            .child_where("name", "type", "scientific"),
    );

    // Function notes and activity-regulation notes are folded into one
    // free-text field.
    let mut function_texts = collect_texts(
        &root,
        path()
            .child("entry")
            .child_where("comment", "type", "function")
            .child("text"),
    );
    function_texts.extend(collect_texts(
        &root,
        path()
            .child("entry")
            .child_where("comment", "type", "activity regulation")
            .child("text"),
    ));
    let function = joined(function_texts);

    let function_publications = joined(collect_texts(
        &root,
        path()
            .child("entry")
            .child_with_attr("reference", "key")
            .child("citation")
            .child("title"),
    ));

    let pathway = scalar_text(
        &root,
        path()
            .child("entry")
            .child_where("comment", "type", "pathway")
            .child("text"),
    );

    let biological_processes = path()
        .child("entry")
        .child_where("dbReference", "type", "GO")
        .child_where("property", "type", "term")
        .find_all(&root)
        .into_iter()
        .filter_map(|node| node.attr("value"))
        .filter_map(|value| value.strip_prefix(GO_PROCESS_PREFIX))
        .map(str::to_string)
        .collect();

    let disruption_phenotype = scalar_text(
        &root,
        path()
            .child("entry")
            .child_where("comment", "type", "disruption phenotype")
            .child("text"),
    );

    Ok(EntryRecord {
        query: query.to_string(),
        protein,
        gene,
        organism,
        status: Some(STATUS_PLACEHOLDER.to_string()),
        function,
        function_publications,
        pathway,
        biological_processes,
        disruption_phenotype,
    })
}

fn path() -> TagPath {
    TagPath::in_namespace(UNIPROT_NAMESPACE)
}

fn scalar_text(root: &Element, path: TagPath) -> Option<String> {
    path.find_one(root).map(|node| node.text().to_string())
}

fn collect_texts(root: &Element, path: TagPath) -> Vec<String> {
    path.find_all(root)
        .into_iter()
        .map(|node| node.text().to_string())
        .collect()
}

fn joined(texts: Vec<String>) -> Option<String> {
    if texts.is_empty() {
        None
    } else {
        Some(texts.join("; "))
    }
}
