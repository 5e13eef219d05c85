use std::fs;

use protannot::entry::{self, STATUS_PLACEHOLDER};
use protannot::report;

#[test]
fn extract_full_entry_document() {
    let xml = fs::read_to_string("tests/fixtures/uniprot_P0AGB6.xml").unwrap();
    let record = entry::extract(&xml, "rpoE").unwrap();

    assert_eq!(record.query, "rpoE");
    assert_eq!(
        record.protein.as_deref(),
        Some("ECF RNA polymerase sigma-E factor")
    );
    assert_eq!(record.gene.as_deref(), Some("rpoE"));
    assert_eq!(
        record.organism.as_deref(),
        Some("Escherichia coli (strain K12)")
    );
    assert_eq!(record.status.as_deref(), Some(STATUS_PLACEHOLDER));

    let function = record.function.as_deref().unwrap();
    assert!(function.starts_with("Sigma factors are initiation factors"));
    assert!(function.contains("; Controls the envelope stress response"));
    assert!(function.ends_with("; Inhibited by the anti-sigma-E factor RseA."));

    let publications = record.function_publications.as_deref().unwrap();
    assert!(publications.contains("heat shock sigma factor of Escherichia coli"));
    assert!(publications.contains("; The complete genome sequence"));

    assert_eq!(
        record.pathway.as_deref(),
        Some("Cell envelope stress response via sigma-E regulon transcription.")
    );
    assert_eq!(
        record.biological_processes,
        vec![
            "DNA-templated transcription initiation".to_string(),
            "response to oxidative stress".to_string(),
        ]
    );
    assert_eq!(
        record.disruption_phenotype.as_deref(),
        Some("Essential, it cannot be disrupted.")
    );
}

#[test]
fn extracted_record_renders_in_both_formats() {
    let xml = fs::read_to_string("tests/fixtures/uniprot_P0AGB6.xml").unwrap();
    let record = entry::extract(&xml, "rpoE").unwrap();

    let human = report::render_human(std::slice::from_ref(&record));
    assert!(human.starts_with("entry: rpoE,\n"));
    assert!(human.contains("gene: rpoE"));
    assert!(human.contains(
        "biologicalProcesses: DNA-templated transcription initiation; response to oxidative stress"
    ));

    let table = report::render_table(std::slice::from_ref(&record));
    let rows: Vec<&str> = table.lines().collect();
    assert_eq!(rows.len(), 2);
    let columns: Vec<&str> = rows[1].split('\t').collect();
    assert_eq!(columns[0], "rpoE");
    assert_eq!(columns[1], "ECF RNA polymerase sigma-E factor");
    assert_eq!(
        columns[6],
        "DNA-templated transcription initiation; response to oxidative stress"
    );
}
