use crate::models::batch::BatchSnapshot;

pub const EXPORT_COLUMNS: [&str; 12] = [
    "batch_id",
    "label_id",
    "label_name",
    "beverage_type",
    "overall_status",
    "field_name",
    "field_status",
    "extracted_value",
    "found_on_image",
    "failure_reason",
    "cfr_reference",
    "images_processed",
];

/// One (label, field) pair of a batch snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub batch_id: String,
    pub label_id: String,
    pub label_name: String,
    pub beverage_type: String,
    pub overall_status: String,
    pub field_name: String,
    pub field_status: String,
    pub extracted_value: Option<String>,
    pub found_on_image: Option<u32>,
    pub failure_reason: Option<String>,
    pub cfr_reference: Option<String>,
    pub images_processed: usize,
}

impl ExportRow {
    fn cells(&self) -> [String; 12] {
        [
            self.batch_id.clone(),
            self.label_id.clone(),
            self.label_name.clone(),
            self.beverage_type.clone(),
            self.overall_status.clone(),
            self.field_name.clone(),
            self.field_status.clone(),
            self.extracted_value.clone().unwrap_or_default(),
            self.found_on_image.map(|i| i.to_string()).unwrap_or_default(),
            self.failure_reason.clone().unwrap_or_default(),
            self.cfr_reference.clone().unwrap_or_default(),
            self.images_processed.to_string(),
        ]
    }
}

/// Flatten a snapshot: results in completion order, fields in check order.
pub fn export_rows(snapshot: &BatchSnapshot) -> Vec<ExportRow> {
    snapshot
        .results
        .iter()
        .flat_map(|result| {
            result.fields.iter().map(move |field| ExportRow {
                batch_id: snapshot.batch_id.clone(),
                label_id: result.label_id.clone(),
                label_name: result.label_name.clone(),
                beverage_type: result.beverage_type.to_string(),
                overall_status: result.overall_status.to_string(),
                field_name: field.field_name.clone(),
                field_status: field.status.to_string(),
                extracted_value: field.extracted_value.clone(),
                found_on_image: field.found_on_image,
                failure_reason: field.failure_reason.clone(),
                cfr_reference: field.cfr_reference.clone(),
                images_processed: result.images_processed,
            })
        })
        .collect()
}

/// Render rows as CSV (RFC 4180 quoting, CRLF line endings) with a header.
pub fn to_csv(rows: &[ExportRow]) -> String {
    let mut out = String::new();
    write_record(&mut out, EXPORT_COLUMNS.iter().copied());
    for row in rows {
        write_record(&mut out, row.cells().iter().map(String::as_str));
    }
    out
}

fn write_record<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>) {
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            out.push(',');
        }
        if cell.contains([',', '"', '\r', '\n']) {
            out.push('"');
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(cell);
        }
    }
    out.push_str("\r\n");
}
