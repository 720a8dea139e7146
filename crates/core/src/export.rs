//! CSV export of callback requests for spreadsheet tools.

use crate::callback::CallbackRequest;
use crate::types::Timestamp;

/// UTF-8 byte-order mark, so spreadsheet tools detect the encoding of
/// Cyrillic names and comments.
pub const BOM: char = '\u{feff}';

/// Fixed header row.
pub const CSV_HEADERS: [&str; 9] = [
    "ID",
    "Date",
    "Name",
    "Phone",
    "Email",
    "ProductType",
    "Comment",
    "Status",
    "FileName",
];

/// Flatten a free-text comment onto one line and replace commas, which the
/// downstream import does not handle.
pub fn sanitize_comment(comment: &str) -> String {
    comment
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .replace(',', ";")
}

/// `DD.MM.YYYY, HH:MM:SS`.
pub fn format_date(date: &Timestamp) -> String {
    date.format("%d.%m.%Y, %H:%M:%S").to_string()
}

fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

/// Build the export document. Records are written in the order given; callers
/// pass the newest-first listing.
pub fn build_callbacks_csv(records: &[CallbackRequest]) -> String {
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(CSV_HEADERS.join(","));

    for record in records {
        let row = [
            record.id.clone(),
            format_date(&record.date),
            record.name.clone(),
            record.phone.clone(),
            record.email.clone(),
            record.product_type.clone(),
            sanitize_comment(&record.comment),
            record.status.to_string(),
            record.file_name.clone().unwrap_or_default(),
        ];
        let cells: Vec<String> = row.iter().map(|cell| quote(cell)).collect();
        lines.push(cells.join(","));
    }

    let mut csv = String::new();
    csv.push(BOM);
    csv.push_str(&lines.join("\n"));
    csv
}

/// Download filename for an export made at `now`: `callbacks-YYYY-MM-DD.csv`.
pub fn export_file_name(now: &Timestamp) -> String {
    format!("callbacks-{}.csv", now.format("%Y-%m-%d"))
}
