use crate::error::Result;
use crate::schema::RawDataset;
use log::debug;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Cell contents treated as missing, in addition to blank cells.
pub const NA_TOKENS: [&str; 8] = ["NA", "N/A", "NaN", "nan", "null", "NULL", "None", "#N/A"];

pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<RawDataset> {
    let file = File::open(path.as_ref())?;
    debug!("Reading expense history from {}", path.as_ref().display());
    read_csv(file)
}

/// Reads a headed CSV into a [`RawDataset`]. Rows shorter than the header are
/// padded with missing cells.
pub fn read_csv<R: Read>(reader: R) -> Result<RawDataset> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::None)
        .from_reader(reader);

    let columns: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let mut row: Vec<Option<String>> = record.iter().map(to_cell).collect();
        if row.len() < columns.len() {
            row.resize(columns.len(), None);
        }
        rows.push(row);
    }

    debug!("Read {} rows across {} columns", rows.len(), columns.len());

    Ok(RawDataset::new(columns, rows))
}

fn to_cell(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || NA_TOKENS.contains(&trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_csv_with_currency_and_blanks() {
        let data = "Month, Miscellaneous ,Financial,CapEx,COGS,Operating,Total\n\
                    2023-01-01,\"$1,200.00\",300,,NA,(50),\n\
                    2023-02-01,100,200\n";
        let raw = read_csv(data.as_bytes()).unwrap();

        assert_eq!(raw.columns[1], " Miscellaneous ");
        assert_eq!(raw.len(), 2);
        assert_eq!(raw.cell(0, 1), Some("$1,200.00"));
        assert_eq!(raw.cell(0, 3), None);
        assert_eq!(raw.cell(0, 4), None);
        assert_eq!(raw.cell(0, 5), Some("(50)"));
        assert_eq!(raw.rows[1].len(), 7);
        assert_eq!(raw.cell(1, 6), None);
    }

    #[test]
    fn test_read_csv_keeps_blank_rows_as_missing() {
        let data = "Month,Total\n2023-01,10\n,\n\n2023-02,20\n";
        let raw = read_csv(data.as_bytes()).unwrap();
        assert_eq!(raw.len(), 3);
        assert_eq!(raw.rows[1], vec![None, None]);
        assert_eq!(raw.cell(2, 0), Some("2023-02"));
    }

    #[test]
    fn test_header_only_is_empty() {
        let raw = read_csv("Month,Total\n".as_bytes()).unwrap();
        assert!(raw.is_empty());
        assert_eq!(raw.columns.len(), 2);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = load_csv("/nonexistent/expenses.csv").unwrap_err();
        assert!(matches!(err, crate::error::ForecastError::IoError(_)));
    }
}
