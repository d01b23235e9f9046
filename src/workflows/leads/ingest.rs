use std::io::Read;
use std::path::Path;

use tracing::info;

use super::domain::{ContactFields, LeadRecord, SchemaPresence};

/// Maps the logical fields the pipeline needs onto the column headers of a
/// concrete export. Exact header names are a configuration concern; only
/// company and role title are required for a usable dataset.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ColumnMap {
    pub company: String,
    pub role_title: String,
    pub region: String,
    pub sector: String,
    pub website: String,
    pub email: String,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
}

impl ColumnMap {
    /// Header names used by the JobDigger vacancy export.
    pub fn jobdigger() -> Self {
        Self {
            company: "Bedrijfsnaam".to_string(),
            role_title: "Functietitel".to_string(),
            region: "Standplaats: Provincie".to_string(),
            sector: "Bedrijf: Branche".to_string(),
            website: "Bedrijf: Website".to_string(),
            email: "Contactpersoon: E-mail".to_string(),
            phone: "Contactpersoon: Telefoon".to_string(),
            first_name: "Contactpersoon: Voornaam".to_string(),
            last_name: "Contactpersoon: Achternaam".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LeadImportError {
    #[error("failed to read lead export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid lead CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("required column '{0}' missing from export")]
    MissingColumn(String),
}

/// Ingestion result: the parsed records plus which optional columns were
/// present, so downstream filter/scoring steps know what to skip.
#[derive(Debug)]
pub struct LeadDataset {
    pub records: Vec<LeadRecord>,
    pub schema: SchemaPresence,
}

pub fn read_leads_from_path<P: AsRef<Path>>(
    path: P,
    columns: &ColumnMap,
) -> Result<LeadDataset, LeadImportError> {
    let file = std::fs::File::open(path)?;
    read_leads(file, columns)
}

pub fn read_leads<R: Read>(reader: R, columns: &ColumnMap) -> Result<LeadDataset, LeadImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let company_idx = required_column(&headers, &columns.company)?;
    let title_idx = required_column(&headers, &columns.role_title)?;
    let region_idx = column_index(&headers, &columns.region);
    let sector_idx = column_index(&headers, &columns.sector);
    let website_idx = column_index(&headers, &columns.website);
    let email_idx = column_index(&headers, &columns.email);
    let phone_idx = column_index(&headers, &columns.phone);
    let first_name_idx = column_index(&headers, &columns.first_name);
    let last_name_idx = column_index(&headers, &columns.last_name);

    let schema = SchemaPresence {
        region: region_idx.is_some(),
        sector: sector_idx.is_some(),
        email: email_idx.is_some(),
    };

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        let company = field(&row, Some(company_idx));
        let role_title = field(&row, Some(title_idx));

        // Rows without the natural key cannot be deduplicated or exported.
        let (Some(company), Some(role_title)) = (company, role_title) else {
            continue;
        };

        let mut lead = LeadRecord::new(company, role_title);
        lead.region = field(&row, region_idx);
        lead.sector = field(&row, sector_idx);
        lead.website = field(&row, website_idx);
        lead.contact = ContactFields {
            email: field(&row, email_idx),
            phone: field(&row, phone_idx),
            first_name: field(&row, first_name_idx),
            last_name: field(&row, last_name_idx),
        };
        records.push(lead);
    }

    info!(
        rows = records.len(),
        has_region = schema.region,
        has_sector = schema.sector,
        has_email = schema.email,
        "lead export loaded"
    );

    Ok(LeadDataset { records, schema })
}

fn required_column(headers: &csv::StringRecord, name: &str) -> Result<usize, LeadImportError> {
    column_index(headers, name).ok_or_else(|| LeadImportError::MissingColumn(name.to_string()))
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.trim().eq_ignore_ascii_case(name.trim()))
}

fn field(row: &csv::StringRecord, index: Option<usize>) -> Option<String> {
    index
        .and_then(|idx| row.get(idx))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
