use chrono::NaiveDate;

use crate::error::{Result, StoreError};

/// One row of a measurement sheet. Measured quantities are free-text
/// numeric-or-empty strings; `total` is derived and always carries two
/// fractional digits.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct SheetLine {
    pub id: i32,
    pub sheet_id: i32,
    pub position: i32,
    pub activity: String,
    pub description: String,
    pub length: String,
    pub height: String,
    pub quantity: String,
    pub total: String,
    pub notes: String,
    /// Priced-variant columns, independently entered, never derived.
    pub worker_price: Option<String>,
    pub worker_value: Option<String>,
    pub contractor_price: Option<String>,
    pub contractor_value: Option<String>,
}

impl SheetLine {
    pub fn new() -> Self {
        Self {
            id: 0,
            sheet_id: 0,
            position: 0,
            activity: String::new(),
            description: String::new(),
            length: String::new(),
            height: String::new(),
            quantity: "1".to_string(),
            total: "0.00".to_string(),
            notes: String::new(),
            worker_price: None,
            worker_value: None,
            contractor_price: None,
            contractor_value: None,
        }
    }

    /// Derive `total` from the current length/height/quantity strings.
    /// Called after every edit to any of the three factors.
    pub fn recompute_total(&mut self) {
        self.total = compute_total(&self.length, &self.height, &self.quantity);
    }
}

fn parse_factor(value: &str, default: f64) -> f64 {
    value.trim().parse::<f64>().unwrap_or(default)
}

/// `total = round(length * height * quantity, 2)`. Length and height fall
/// back to 0 when unparsable; quantity falls back to 1 when empty or
/// unparsable. Zero and negative inputs pass through unvalidated.
pub fn compute_total(length: &str, height: &str, quantity: &str) -> String {
    let l = parse_factor(length, 0.0);
    let h = parse_factor(height, 0.0);
    let q = parse_factor(quantity, 1.0);
    format!("{:.2}", l * h * q)
}

/// Measurement sheet header plus its ordered line items. `priced` selects
/// the variant whose lines carry the four price/value columns.
#[derive(Debug, Clone)]
pub struct MeasurementSheet {
    pub id: i32,
    pub priced: bool,
    pub client_name: String,
    pub client_email: String,
    pub client_phone1: String,
    pub client_phone2: String,
    pub contractor: String,
    pub site_names: Vec<String>,
    pub sheet_date: NaiveDate,
    pub lines: Vec<SheetLine>,
    pub created_at: i64,
}

impl MeasurementSheet {
    pub fn new(priced: bool) -> Self {
        Self {
            id: 0,
            priced,
            client_name: String::new(),
            client_email: String::new(),
            client_phone1: String::new(),
            client_phone2: String::new(),
            contractor: String::new(),
            site_names: Vec::new(),
            sheet_date: chrono::Local::now().date_naive(),
            lines: Vec::new(),
            created_at: 0,
        }
    }

    /// Client-side validation run before any store call: the header needs a
    /// client name and at least one site, and every line needs description,
    /// length and height. A sheet with no lines cannot be persisted.
    pub fn validate(&self) -> Result<()> {
        if self.client_name.trim().is_empty() {
            return Err(StoreError::validation("Nombre de empresa"));
        }
        if self.site_names.iter().all(|s| s.trim().is_empty()) {
            return Err(StoreError::validation("Obra"));
        }
        if self.lines.is_empty() {
            return Err(StoreError::validation("Conceptos"));
        }
        for line in &self.lines {
            if line.description.trim().is_empty()
                || line.length.trim().is_empty()
                || line.height.trim().is_empty()
            {
                return Err(StoreError::validation("Concepto, L y H"));
            }
        }
        Ok(())
    }

    /// Phone numbers joined the way the report header shows them.
    pub fn phones_joined(&self) -> String {
        [self.client_phone1.as_str(), self.client_phone2.as_str()]
            .iter()
            .filter(|p| !p.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Site names joined by spaces for the project-info block.
    pub fn sites_joined(&self) -> String {
        self.site_names
            .iter()
            .filter(|s| !s.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// How a sheet's measurements were stored: either the pre-line-item flat
/// shape (one measurement embedded in the header row) or the canonical
/// line-item list. Reads normalize to the canonical shape immediately;
/// writes always produce `LineItemList`.
#[derive(Debug, Clone)]
pub enum StoredLines {
    LegacySingleItem {
        description: String,
        length: String,
        height: String,
        quantity: String,
        total: String,
        notes: String,
    },
    LineItemList(Vec<SheetLine>),
}

impl StoredLines {
    pub fn normalize(self) -> Vec<SheetLine> {
        match self {
            StoredLines::LineItemList(lines) => lines,
            StoredLines::LegacySingleItem {
                description,
                length,
                height,
                quantity,
                total,
                notes,
            } => {
                let quantity = if quantity.trim().is_empty() {
                    "1".to_string()
                } else {
                    quantity
                };
                let total = if total.trim().is_empty() {
                    compute_total(&length, &height, &quantity)
                } else {
                    total
                };
                vec![SheetLine {
                    description,
                    length,
                    height,
                    quantity,
                    total,
                    notes,
                    ..SheetLine::new()
                }]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_length_times_height_times_quantity() {
        assert_eq!(compute_total("2", "3.5", "4"), "28.00");
        assert_eq!(compute_total("1.1", "2.2", "1"), "2.42");
        assert_eq!(compute_total("10", "0.5", "2"), "10.00");
    }

    #[test]
    fn empty_quantity_falls_back_to_one() {
        // Round-trip scenario: 2 x 3.5 x 4 = 28.00, then quantity cleared.
        let mut line = SheetLine::new();
        line.length = "2".to_string();
        line.height = "3.5".to_string();
        line.quantity = "4".to_string();
        line.recompute_total();
        assert_eq!(line.total, "28.00");

        line.quantity = String::new();
        line.recompute_total();
        assert_eq!(line.total, "7.00");
    }

    #[test]
    fn unparsable_length_or_height_counts_as_zero() {
        assert_eq!(compute_total("abc", "3", "2"), "0.00");
        assert_eq!(compute_total("3", "", "2"), "0.00");
        assert_eq!(compute_total("x", "y", "z"), "0.00");
    }

    #[test]
    fn negative_inputs_produce_negative_totals() {
        // Accepted silently; may represent deductions.
        assert_eq!(compute_total("-2", "3", "1"), "-6.00");
        assert_eq!(compute_total("0", "5", "3"), "0.00");
    }

    #[test]
    fn editing_one_line_leaves_others_untouched() {
        let mut a = SheetLine::new();
        a.length = "2".to_string();
        a.height = "2".to_string();
        a.recompute_total();

        let mut b = SheetLine::new();
        b.length = "5".to_string();
        b.height = "5".to_string();
        b.recompute_total();
        let b_before = b.clone();

        a.length = "9".to_string();
        a.recompute_total();

        assert_eq!(a.total, "18.00");
        assert_eq!(b, b_before);
    }

    fn valid_sheet() -> MeasurementSheet {
        let mut sheet = MeasurementSheet::new(false);
        sheet.client_name = "Reformas SL".to_string();
        sheet.site_names = vec!["Edificio Norte".to_string()];
        let mut line = SheetLine::new();
        line.description = "Tabique".to_string();
        line.length = "2".to_string();
        line.height = "3".to_string();
        line.recompute_total();
        sheet.lines.push(line);
        sheet
    }

    #[test]
    fn sheet_without_lines_fails_validation() {
        let mut sheet = valid_sheet();
        sheet.lines.clear();
        assert!(sheet.validate().is_err());
    }

    #[test]
    fn line_missing_description_blocks_the_sheet() {
        let mut sheet = valid_sheet();
        sheet.lines[0].description = String::new();
        assert!(sheet.validate().is_err());

        let mut sheet = valid_sheet();
        sheet.lines[0].height = String::new();
        assert!(sheet.validate().is_err());

        assert!(valid_sheet().validate().is_ok());
    }

    #[test]
    fn legacy_sheet_normalizes_to_a_single_line() {
        let lines = StoredLines::LegacySingleItem {
            description: "Enfoscado".to_string(),
            length: "4".to_string(),
            height: "2.5".to_string(),
            quantity: String::new(),
            total: String::new(),
            notes: "pared sur".to_string(),
        }
        .normalize();

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].description, "Enfoscado");
        assert_eq!(lines[0].quantity, "1");
        assert_eq!(lines[0].total, "10.00");
        assert_eq!(lines[0].notes, "pared sur");
    }

    #[test]
    fn legacy_total_is_kept_when_present() {
        let lines = StoredLines::LegacySingleItem {
            description: "Solera".to_string(),
            length: "3".to_string(),
            height: "3".to_string(),
            quantity: "2".to_string(),
            total: "18.00".to_string(),
            notes: String::new(),
        }
        .normalize();

        assert_eq!(lines[0].total, "18.00");
    }

    #[test]
    fn canonical_lines_pass_through_normalization() {
        let mut line = SheetLine::new();
        line.description = "Alicatado".to_string();
        let lines = StoredLines::LineItemList(vec![line.clone()]).normalize();
        assert_eq!(lines, vec![line]);
    }

    #[test]
    fn phones_and_sites_join_like_the_report_header() {
        let mut sheet = MeasurementSheet::new(false);
        sheet.client_phone1 = "600111222".to_string();
        sheet.client_phone2 = "600333444".to_string();
        sheet.site_names = vec![
            "Obra A".to_string(),
            String::new(),
            "Obra B".to_string(),
        ];

        assert_eq!(sheet.phones_joined(), "600111222, 600333444");
        assert_eq!(sheet.sites_joined(), "Obra A Obra B");

        sheet.client_phone2.clear();
        assert_eq!(sheet.phones_joined(), "600111222");
    }
}
