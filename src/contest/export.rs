use super::domain::{SubmissionRecord, VoteCategory};
use super::store::StoreError;

/// The two downloads offered to organizers: the full record set with every
/// stored field, or the public summary without timestamps and origins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportScope {
    All,
    Top,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("export rendering failed: {0}")]
    Render(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Render the chosen fields of `records` as CSV with one header row. Fields
/// are quoted and escaped by the writer, so free text with embedded commas or
/// quotes survives a round trip.
pub fn export_rows(
    records: &[SubmissionRecord],
    scope: ExportScope,
) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(header(scope)).map_err(render)?;
    for record in records {
        writer.write_record(row(record, scope)).map_err(render)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Render(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| ExportError::Render(err.to_string()))
}

fn header(scope: ExportScope) -> Vec<&'static str> {
    let mut columns = match scope {
        ExportScope::All => vec!["ts"],
        ExportScope::Top => Vec::new(),
    };
    columns.extend([
        "equipo",
        "participantes",
        "departamento",
        "hashtag",
        "lema",
        "dato",
        "filename",
    ]);
    if scope == ExportScope::All {
        columns.push("ip");
    }
    columns.extend(VoteCategory::ordered().map(VoteCategory::column));
    columns.push("total");
    columns
}

fn row(record: &SubmissionRecord, scope: ExportScope) -> Vec<String> {
    let mut cells = match scope {
        ExportScope::All => vec![record.submitted_at.clone()],
        ExportScope::Top => Vec::new(),
    };
    cells.extend([
        record.team.clone(),
        record.participants.clone(),
        record.department.clone(),
        record.hashtag.clone(),
        record.slogan.clone(),
        record.fact.clone(),
        record.filename.clone(),
    ]);
    if scope == ExportScope::All {
        cells.push(record.origin.clone());
    }
    for category in VoteCategory::ordered() {
        cells.push(record.votes.count(category).to_string());
    }
    cells.push(record.votes.total().to_string());
    cells
}

fn render(err: csv::Error) -> ExportError {
    ExportError::Render(err.to_string())
}
