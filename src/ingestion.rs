use crate::config::{CanonicalField, EngineConfig};
use crate::dates::normalize_date;
use crate::schema::{CanonicalItemRecord, CellValue, LedgerRecord, RawRow};
use log::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestOutput {
    /// Every non-blank row, dated or not.
    pub items: Vec<CanonicalItemRecord>,
    /// Only the rows with a resolvable date.
    pub ledger: Vec<LedgerRecord>,
    /// Rows left out of `ledger` because their date was missing or unparseable.
    pub skipped_count: usize,
    /// Rows with no non-blank cell at all; dropped from both outputs.
    pub blank_count: usize,
}

/// Header lookup for one row: exact labels first, then a normalized
/// (trimmed, lowercased, whitespace-collapsed) comparison.
pub struct HeaderIndex<'r> {
    row: &'r RawRow,
    normalized: Vec<(String, &'r str)>,
}

impl<'r> HeaderIndex<'r> {
    pub fn new(row: &'r RawRow) -> Self {
        let normalized = row
            .keys()
            .map(|label| (normalize_label(label), label.as_str()))
            .collect();
        Self { row, normalized }
    }

    /// Returns the row's header that matches the earliest synonym, preferring
    /// exact matches over case-insensitive ones. Among columns that only differ
    /// by case, the leftmost wins.
    pub fn resolve(&self, synonyms: &[String]) -> Option<&'r str> {
        if let Some((label, _)) = synonyms
            .iter()
            .find_map(|s| self.row.get_key_value(s.as_str()))
        {
            return Some(label.as_str());
        }

        synonyms.iter().find_map(|s| {
            let wanted = normalize_label(s);
            self.normalized
                .iter()
                .find(|(n, _)| *n == wanted)
                .map(|(_, label)| *label)
        })
    }

    pub fn pick(&self, synonyms: &[String]) -> Option<&'r CellValue> {
        self.resolve(synonyms).and_then(|label| self.row.get(label))
    }
}

pub fn resolve_header<'r>(row: &'r RawRow, synonyms: &[String]) -> Option<&'r str> {
    HeaderIndex::new(row).resolve(synonyms)
}

fn normalize_label(label: &str) -> String {
    label
        .trim_start_matches('\u{feff}')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Coerces a cell into a number, falling back to 0 for anything unusable.
pub fn parse_number(value: &CellValue) -> f64 {
    match value {
        CellValue::Number(n) if n.is_finite() => *n,
        CellValue::Text(text) => parse_number_str(text),
        _ => 0.0,
    }
}

/// Parses amounts such as `"1 234 567 so'm"`, `"1,234.50"` or `"99,5"`.
///
/// With both separators present commas are thousands separators. With only
/// commas present the first one is the decimal point and later ones are
/// dropped, so `"1,234,567"` gives 1.234567.
pub fn parse_number_str(raw: &str) -> f64 {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == '\u{2212}' { '-' } else { c })
        .collect();

    let has_comma = compact.contains(',');
    let has_dot = compact.contains('.');

    let unified = if has_comma && has_dot {
        compact.replace(',', "")
    } else if has_comma {
        compact.replacen(',', ".", 1)
    } else {
        compact
    };

    let cleaned: String = unified
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    leading_number(&cleaned).unwrap_or(0.0)
}

/// Longest prefix of the form `-?digits[.digits]`, the way lenient float
/// parsers read `"12.5.3"` as 12.5.
fn leading_number(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut end = usize::from(bytes.first() == Some(&b'-'));
    let mut digits = 0;

    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }

    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        let frac_digits = frac_end - end - 1;
        if frac_digits > 0 {
            digits += frac_digits;
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    s[..end].parse::<f64>().ok().filter(|n| n.is_finite())
}

fn non_negative(value: f64) -> f64 {
    if value > 0.0 {
        value
    } else {
        0.0
    }
}

fn quantity(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.trunc() as u64
    } else {
        0
    }
}

pub struct RecordIngestor<'a> {
    config: &'a EngineConfig,
}

impl<'a> RecordIngestor<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    pub fn ingest(&self, rows: &[RawRow]) -> IngestOutput {
        let mut output = IngestOutput::default();

        for (row_index, row) in rows.iter().enumerate() {
            if row.values().all(CellValue::is_blank) {
                output.blank_count += 1;
                continue;
            }

            let (item, ledger) = self.ingest_row(row_index, row);

            match ledger {
                Some(line) => output.ledger.push(line),
                None => {
                    output.skipped_count += 1;
                    debug!("Row {} has no usable date; excluded from monthly totals", row_index);
                }
            }
            output.items.push(item);
        }

        if output.skipped_count > 0 {
            warn!(
                "{} of {} rows have no resolvable date and were left out of monthly aggregation",
                output.skipped_count,
                output.items.len()
            );
        }
        debug!(
            "Ingested {} item rows, {} ledger rows, {} blank rows",
            output.items.len(),
            output.ledger.len(),
            output.blank_count
        );

        output
    }

    pub fn ingest_row(
        &self,
        row_index: usize,
        row: &RawRow,
    ) -> (CanonicalItemRecord, Option<LedgerRecord>) {
        let headers = &self.config.headers;
        let index = HeaderIndex::new(row);
        let cell = |field: CanonicalField| index.pick(headers.synonyms_for(field));
        let number = |field: CanonicalField| cell(field).map(parse_number).unwrap_or(0.0);

        let sale_date = cell(CanonicalField::Date).and_then(normalize_date);

        let name = cell(CanonicalField::Name)
            .and_then(CellValue::as_display_text)
            .unwrap_or_else(|| self.config.unknown_item_name.clone());

        let item = CanonicalItemRecord {
            name,
            cost: non_negative(number(CanonicalField::Cost)),
            price: non_negative(number(CanonicalField::Price)),
            sold_qty: quantity(number(CanonicalField::SoldQty)),
            stock_qty: quantity(number(CanonicalField::StockQty)),
            sale_date,
            row_index,
        };

        let ledger = sale_date.map(|date| LedgerRecord {
            date,
            sales: number(CanonicalField::Sales),
            cost: number(CanonicalField::Cost),
            expense: number(CanonicalField::Expense),
            credit: number(CanonicalField::Credit),
            debt: number(CanonicalField::Debt),
            row_index,
        });

        (item, ledger)
    }
}

pub fn ingest(rows: &[RawRow], config: &EngineConfig) -> IngestOutput {
    RecordIngestor::new(config).ingest(rows)
}
