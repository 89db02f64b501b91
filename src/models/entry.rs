use serde::{Deserialize, Serialize};

use super::row::ReportRow;

/// Wire shape of a cached value: `[code, open, high, low, close]`.
type QuoteTuple = (String, String, String, String, String);

// ---------------------------------------------------------------------------
// Quote: The cached value for one symbol
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "QuoteTuple", into = "QuoteTuple")]
pub struct Quote {
    pub code: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
}

impl From<QuoteTuple> for Quote {
    fn from((code, open, high, low, close): QuoteTuple) -> Self {
        Self {
            code,
            open,
            high,
            low,
            close,
        }
    }
}

impl From<Quote> for QuoteTuple {
    fn from(q: Quote) -> Self {
        (q.code, q.open, q.high, q.low, q.close)
    }
}

// ---------------------------------------------------------------------------
// CacheEntry: Key plus cached value
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Symbol name, case preserved.
    pub name: String,
    pub quote: Quote,
}

impl CacheEntry {
    pub fn new(name: impl Into<String>, quote: Quote) -> Self {
        Self {
            name: name.into(),
            quote,
        }
    }

    /// The flat `[name, code, open, high, low, close]` row handed to renderers.
    pub fn to_row(&self) -> [String; 6] {
        [
            self.name.clone(),
            self.quote.code.clone(),
            self.quote.open.clone(),
            self.quote.high.clone(),
            self.quote.low.clone(),
            self.quote.close.clone(),
        ]
    }
}

impl From<ReportRow> for CacheEntry {
    fn from(row: ReportRow) -> Self {
        Self {
            name: row.name,
            quote: Quote {
                code: row.code,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
            },
        }
    }
}
