use crate::entry::EntryRecord;

const UNKNOWN: &str = "unknown";

pub const TABLE_HEADER: [&str; 9] = [
    "entry",
    "protein",
    "gene",
    "organism",
    "function",
    "pathway",
    "GO_biology",
    "disruptionPhenotype",
    "Publication",
];

/// Renders records as human-readable `label: value` blocks separated by a
/// blank line. Free text is emitted as-is.
pub fn render_human(records: &[EntryRecord]) -> String {
    records
        .iter()
        .map(render_record)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_record(record: &EntryRecord) -> String {
    let processes = if record.biological_processes.is_empty() {
        UNKNOWN.to_string()
    } else {
        record.biological_processes.join("; ")
    };
    let fields = [
        ("entry", Some(record.query.as_str())),
        ("protein", record.protein.as_deref()),
        ("gene", record.gene.as_deref()),
        ("organism", record.organism.as_deref()),
        ("status", record.status.as_deref()),
        ("function", record.function.as_deref()),
        ("functionPublications", record.function_publications.as_deref()),
        ("pathway", record.pathway.as_deref()),
        ("biologicalProcesses", Some(processes.as_str())),
        ("disruptionPhenotype", record.disruption_phenotype.as_deref()),
    ];
    fields
        .iter()
        .map(|(label, value)| format!("{label}: {}", value.unwrap_or(UNKNOWN)))
        .collect::<Vec<_>>()
        .join(",\n")
}

/// Renders records as a tab-separated table with a fixed header row.
/// Literal tabs inside field values are replaced with spaces so they cannot
/// break the column structure.
pub fn render_table(records: &[EntryRecord]) -> String {
    let mut out = TABLE_HEADER.join("\t");
    out.push('\n');
    for record in records {
        let columns = [
            record.query.clone(),
            cell(record.protein.as_deref()),
            cell(record.gene.as_deref()),
            cell(record.organism.as_deref()),
            cell(record.function.as_deref()),
            cell(record.pathway.as_deref()),
            record.biological_processes.join("; "),
            cell(record.disruption_phenotype.as_deref()),
            cell(record.function_publications.as_deref()),
        ];
        let line = columns
            .iter()
            .map(|value| value.replace('\t', " "))
            .collect::<Vec<_>>()
            .join("\t");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

fn cell(value: Option<&str>) -> String {
    value.unwrap_or(UNKNOWN).to_string()
}
