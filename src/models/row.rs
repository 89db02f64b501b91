use csv::StringRecord;
use serde::{Deserialize, Serialize};

use crate::error::{BhavcopyError, Result};

pub const CODE_COLUMN: usize = 0;
pub const NAME_COLUMN: usize = 1;
pub const OPEN_COLUMN: usize = 4;
pub const HIGH_COLUMN: usize = 5;
pub const LOW_COLUMN: usize = 6;
pub const CLOSE_COLUMN: usize = 7;

// ---------------------------------------------------------------------------
// ReportRow: One symbol's line from the bhavcopy CSV
// ---------------------------------------------------------------------------

/// Raw values are kept exactly as they appear in the CSV, padding included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub code: String,
    pub name: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
}

impl ReportRow {
    /// Map a CSV record by fixed column position. Extra columns are ignored;
    /// a record too short to reach the close column is an error.
    pub fn from_record(record: &StringRecord) -> Result<Self> {
        let column = |i: usize| {
            record.get(i).map(str::to_string).ok_or_else(|| BhavcopyError::MalformedRow {
                line: record.position().map(|p| p.line()).unwrap_or(0),
                columns: record.len(),
            })
        };

        Ok(Self {
            code: column(CODE_COLUMN)?,
            name: column(NAME_COLUMN)?,
            open: column(OPEN_COLUMN)?,
            high: column(HIGH_COLUMN)?,
            low: column(LOW_COLUMN)?,
            close: column(CLOSE_COLUMN)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_fixed_columns() {
        let record = StringRecord::from(vec![
            "500002", "ABB LTD.    ", "A ", "Q", "7210.00", "7300.55", "7150.10", "7282.35", "7280.00",
        ]);
        let row = ReportRow::from_record(&record).unwrap();
        assert_eq!(row.code, "500002");
        assert_eq!(row.name, "ABB LTD.    ");
        assert_eq!(row.open, "7210.00");
        assert_eq!(row.high, "7300.55");
        assert_eq!(row.low, "7150.10");
        assert_eq!(row.close, "7282.35");
    }

    #[test]
    fn short_record_is_malformed() {
        let record = StringRecord::from(vec!["500002", "ABB LTD.", "A", "Q", "7210.00"]);
        match ReportRow::from_record(&record) {
            Err(BhavcopyError::MalformedRow { columns, .. }) => assert_eq!(columns, 5),
            other => panic!("expected MalformedRow, got {:?}", other),
        }
    }
}
