//! Report export: measurement sheets and purchase orders rendered as xlsx
//! workbooks or landscape A4 PDFs, written under the configured export
//! directory with deterministic filenames.

mod pdf;
mod xlsx;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{MeasurementSheet, PurchaseOrder};

/// Writes report files for measurement sheets and purchase orders.
pub struct Exporter {
    output_dir: PathBuf,
}

impl Exporter {
    pub fn new(output_dir: &str) -> Result<Self> {
        // Create the output directory if it doesn't exist
        let path = Path::new(output_dir);
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        Ok(Self {
            output_dir: path.to_path_buf(),
        })
    }

    pub fn export_sheet_xlsx(&self, sheet: &MeasurementSheet) -> Result<PathBuf> {
        let bytes = xlsx::sheet_workbook_bytes(sheet)?;
        let path = self.output_dir.join(sheet_filename(sheet, "xlsx"));
        fs::write(&path, bytes)?;
        Ok(path)
    }

    pub fn export_sheet_pdf(&self, sheet: &MeasurementSheet) -> Result<PathBuf> {
        let markdown = pdf::sheet_markdown(sheet);
        let md_path = self.output_dir.join(sheet_filename(sheet, "md"));
        let pdf_path = self.output_dir.join(sheet_filename(sheet, "pdf"));
        pdf::render_pdf(&markdown, &md_path, &pdf_path)?;
        Ok(pdf_path)
    }

    pub fn export_order_xlsx(&self, order: &PurchaseOrder) -> Result<PathBuf> {
        let bytes = xlsx::order_workbook_bytes(order)?;
        let path = self.output_dir.join(order_filename(order, "xlsx"));
        fs::write(&path, bytes)?;
        Ok(path)
    }

    pub fn export_order_pdf(&self, order: &PurchaseOrder) -> Result<PathBuf> {
        let markdown = pdf::order_markdown(order);
        let md_path = self.output_dir.join(order_filename(order, "md"));
        let pdf_path = self.output_dir.join(order_filename(order, "pdf"));
        pdf::render_pdf(&markdown, &md_path, &pdf_path)?;
        Ok(pdf_path)
    }
}

/// `DD/MM/YYYY`, as shown in report headers.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// `DD-MM-YYYY`, as used in filenames.
pub fn file_date(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

/// Render a decimal string with a comma separator and two fractional
/// digits. Accepts either comma or dot input; empty stays empty and an
/// unparsable value passes through untouched.
pub fn format_decimal_comma(value: &str) -> String {
    if value.trim().is_empty() {
        return String::new();
    }
    match value.trim().replace(',', ".").parse::<f64>() {
        Ok(num) => format!("{num:.2}").replace('.', ","),
        Err(_) => value.to_string(),
    }
}

/// Priced cells persist as optional text; absent and blank both mean zero.
pub(crate) fn price_or_zero(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => "0",
    }
}

/// `Hoja_Mediciones_<sites>_<DD-MM-YYYY>` or the `_Precio_` variant.
pub fn sheet_filename(sheet: &MeasurementSheet, ext: &str) -> String {
    let sites: Vec<&str> = sheet
        .site_names
        .iter()
        .filter(|s| !s.is_empty())
        .map(String::as_str)
        .collect();
    let site_part = if sites.is_empty() {
        "SinObra".to_string()
    } else {
        sites.join("_")
    };

    let prefix = if sheet.priced {
        "Hoja_Mediciones_Precio"
    } else {
        "Hoja_Mediciones"
    };

    format!("{prefix}_{site_part}_{}.{ext}", file_date(sheet.sheet_date))
}

/// `Hoja_Pedidos_<description>_<DD-MM-YYYY>`; the description contributes at
/// most 20 characters with non-alphanumerics replaced by underscores.
pub fn order_filename(order: &PurchaseOrder, ext: &str) -> String {
    let desc: String = order
        .description
        .chars()
        .take(20)
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let desc_part = if desc.is_empty() {
        "SinDescripcion".to_string()
    } else {
        desc
    };

    format!(
        "Hoja_Pedidos_{desc_part}_{}.{ext}",
        file_date(order.order_date)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SheetLine;

    fn sheet_with_sites(priced: bool, sites: &[&str]) -> MeasurementSheet {
        let mut sheet = MeasurementSheet::new(priced);
        sheet.site_names = sites.iter().map(|s| s.to_string()).collect();
        sheet.sheet_date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        sheet
    }

    #[test]
    fn decimal_comma_formatting() {
        assert_eq!(format_decimal_comma("3.5"), "3,50");
        assert_eq!(format_decimal_comma("2,5"), "2,50");
        assert_eq!(format_decimal_comma("28"), "28,00");
        assert_eq!(format_decimal_comma(""), "");
        assert_eq!(format_decimal_comma("   "), "");
        // unparsable values pass through unchanged
        assert_eq!(format_decimal_comma("n/a"), "n/a");
    }

    #[test]
    fn missing_or_blank_prices_count_as_zero() {
        assert_eq!(price_or_zero(None), "0");
        assert_eq!(price_or_zero(Some("")), "0");
        assert_eq!(price_or_zero(Some("  ")), "0");
        assert_eq!(price_or_zero(Some("12.5")), "12.5");
    }

    #[test]
    fn sheet_filename_is_deterministic() {
        let sheet = sheet_with_sites(false, &["Torre Sur", "Fase 2"]);
        let a = sheet_filename(&sheet, "xlsx");
        let b = sheet_filename(&sheet, "xlsx");
        assert_eq!(a, b);
        assert_eq!(a, "Hoja_Mediciones_Torre Sur_Fase 2_05-03-2024.xlsx");
    }

    #[test]
    fn priced_sheet_gets_the_precio_prefix() {
        let sheet = sheet_with_sites(true, &["Nave"]);
        assert_eq!(
            sheet_filename(&sheet, "pdf"),
            "Hoja_Mediciones_Precio_Nave_05-03-2024.pdf"
        );
    }

    #[test]
    fn empty_site_list_falls_back_to_sin_obra() {
        let sheet = sheet_with_sites(false, &["", ""]);
        assert_eq!(
            sheet_filename(&sheet, "xlsx"),
            "Hoja_Mediciones_SinObra_05-03-2024.xlsx"
        );
    }

    #[test]
    fn order_filename_sanitizes_the_description() {
        let mut order = PurchaseOrder::new();
        order.order_date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        order.description = "Sacos de cemento (25kg) y arena".to_string();

        // 20 chars, non-alphanumerics replaced
        assert_eq!(
            order_filename(&order, "xlsx"),
            "Hoja_Pedidos_Sacos_de_cemento__25_15-01-2024.xlsx"
        );

        order.description.clear();
        assert_eq!(
            order_filename(&order, "pdf"),
            "Hoja_Pedidos_SinDescripcion_15-01-2024.pdf"
        );
    }

    #[test]
    fn date_formats() {
        let date = NaiveDate::from_ymd_opt(2023, 12, 1).unwrap();
        assert_eq!(format_date(date), "01/12/2023");
        assert_eq!(file_date(date), "01-12-2023");
    }

    #[test]
    fn exporter_writes_xlsx_into_the_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::new(dir.path().to_str().unwrap()).unwrap();

        let mut sheet = sheet_with_sites(false, &["Obra"]);
        let mut line = SheetLine::new();
        line.description = "Tabique".to_string();
        line.length = "2".to_string();
        line.height = "3".to_string();
        line.recompute_total();
        sheet.lines.push(line);

        let path = exporter.export_sheet_xlsx(&sheet).unwrap();
        assert!(path.exists());
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[0..2], b"PK");
    }
}
