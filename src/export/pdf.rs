//! PDF rendering via a Markdown intermediate converted with pandoc.
//! Pandoc must be installed; a missing binary surfaces as a dedicated
//! error so the UI can tell the user what to install.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::process::Command;

use crate::error::{Result, StoreError};
use crate::export::{format_date, format_decimal_comma, price_or_zero};
use crate::models::{MeasurementSheet, PurchaseOrder};

const HEADER_BG: &str = "#428BCA";

/// Markdown body for a measurement sheet, base or priced.
pub fn sheet_markdown(sheet: &MeasurementSheet) -> String {
    let mut content = String::new();

    let title = if sheet.priced {
        "HOJA DE MEDICIONES PRECIO"
    } else {
        "HOJA DE MEDICIONES"
    };
    content.push_str(&format!(
        "<h1 style=\"text-align: center; font-weight: bold;\">{}</h1>\n\n",
        title
    ));

    // Client block, right aligned like the workbook.
    content.push_str("<div style=\"text-align: right;\">\n");
    content.push_str(&format!("{}<br>\n", sheet.client_name));
    content.push_str(&format!("{}<br>\n", sheet.client_email));
    content.push_str(&format!("{}\n", sheet.phones_joined()));
    content.push_str("</div>\n\n");

    // Project line.
    content.push_str(&format!(
        "**Constructora:** {} &nbsp;&nbsp; **Obra:** {} &nbsp;&nbsp; **Fecha:** {}\n\n",
        sheet.contractor,
        sheet.sites_joined(),
        format_date(sheet.sheet_date)
    ));

    content.push_str("<table style=\"width: 100%; border-collapse: collapse; font-size: 9pt;\">\n");
    content.push_str("<tr>\n");
    let mut headers = vec!["Actividad", "Concepto", "L", "H", "N", "Total"];
    if sheet.priced {
        headers.extend([
            "Precio Trabajador",
            "Valor Trabajador",
            "Precio Constructora",
            "Valor Constructora",
        ]);
    }
    for header in &headers {
        content.push_str(&format!(
            "<th style=\"background-color: {}; color: white; font-weight: bold; border: 1px solid #999; padding: 4px;\">{}</th>\n",
            HEADER_BG, header
        ));
    }
    content.push_str("</tr>\n");

    for line in &sheet.lines {
        content.push_str("<tr>\n");
        push_cell(&mut content, &line.activity, false);
        push_cell(&mut content, &line.description, false);
        push_cell(&mut content, &format_decimal_comma(&line.length), true);
        push_cell(&mut content, &format_decimal_comma(&line.height), true);
        push_cell(&mut content, &line.quantity, true);
        push_cell(&mut content, &format_decimal_comma(&line.total), true);
        if sheet.priced {
            for value in [
                price_or_zero(line.worker_price.as_deref()),
                price_or_zero(line.worker_value.as_deref()),
                price_or_zero(line.contractor_price.as_deref()),
                price_or_zero(line.contractor_value.as_deref()),
            ] {
                push_cell(&mut content, &format_decimal_comma(value), true);
            }
        }
        content.push_str("</tr>\n");
    }

    content.push_str("</table>\n");
    content
}

/// Markdown body for a purchase order.
pub fn order_markdown(order: &PurchaseOrder) -> String {
    let mut content = String::new();

    content.push_str("<h1 style=\"text-align: center; font-weight: bold;\">HOJA DE PEDIDOS</h1>\n\n");

    content.push_str("<table style=\"width: 100%; border-collapse: collapse; font-size: 9pt;\">\n");
    content.push_str("<tr>\n");
    for header in [
        "Fecha",
        "Descripción",
        "Cantidad",
        "Constructora",
        "Obra",
        "Empresa",
        "Proveedor",
        "Trabajador",
        "Costo",
    ] {
        content.push_str(&format!(
            "<th style=\"background-color: {}; color: white; font-weight: bold; border: 1px solid #999; padding: 4px;\">{}</th>\n",
            HEADER_BG, header
        ));
    }
    content.push_str("</tr>\n");

    content.push_str("<tr>\n");
    push_cell(&mut content, &format_date(order.order_date), false);
    push_cell(&mut content, &order.description, false);
    push_cell(&mut content, &order.quantity, true);
    push_cell(&mut content, &order.contractor, false);
    push_cell(&mut content, &order.site, false);
    push_cell(&mut content, &order.company, false);
    push_cell(&mut content, &order.supplier, false);
    push_cell(&mut content, &order.worker, false);
    push_cell(&mut content, &format_decimal_comma(&order.cost), true);
    content.push_str("</tr>\n");

    content.push_str("</table>\n");
    content
}

fn push_cell(content: &mut String, value: &str, centered: bool) {
    let align = if centered { "center" } else { "left" };
    content.push_str(&format!(
        "<td style=\"border: 1px solid #999; padding: 4px; text-align: {};\">{}</td>\n",
        align, value
    ));
}

/// Write the markdown to disk and convert it with pandoc, landscape A4.
pub fn render_pdf(markdown: &str, md_path: &Path, pdf_path: &Path) -> Result<()> {
    let mut file = File::create(md_path)?;
    file.write_all(markdown.as_bytes())?;

    let output = Command::new("pandoc")
        .arg(md_path)
        .arg("-o")
        .arg(pdf_path)
        .arg("-V")
        .arg("geometry:a4paper,landscape,margin=1.5cm")
        .output();

    match output {
        Ok(output) if output.status.success() => Ok(()),
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(StoreError::Export(format!(
                "pandoc no pudo generar el PDF: {}",
                stderr.trim()
            )))
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Err(StoreError::ExportToolMissing(
                "pandoc no está instalado. Instálalo para exportar a PDF (por ejemplo: apt install pandoc).".to_string(),
            ))
        }
        Err(err) => Err(StoreError::Io(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SheetLine;
    use chrono::NaiveDate;

    fn test_sheet(priced: bool) -> MeasurementSheet {
        let mut sheet = MeasurementSheet::new(priced);
        sheet.client_name = "Reformas SL".to_string();
        sheet.client_email = "info@reformas.es".to_string();
        sheet.client_phone1 = "600111222".to_string();
        sheet.contractor = "Constructora Norte".to_string();
        sheet.site_names = vec!["Torre Sur".to_string()];
        sheet.sheet_date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();

        let mut line = SheetLine::new();
        line.activity = "Tabiquería".to_string();
        line.description = "Tabique planta 2".to_string();
        line.length = "2".to_string();
        line.height = "3.5".to_string();
        line.quantity = "4".to_string();
        line.recompute_total();
        sheet.lines.push(line);
        sheet
    }

    #[test]
    fn sheet_markdown_has_title_and_values() {
        let md = sheet_markdown(&test_sheet(false));
        assert!(md.contains("HOJA DE MEDICIONES"));
        assert!(!md.contains("HOJA DE MEDICIONES PRECIO"));
        assert!(md.contains("Reformas SL"));
        assert!(md.contains("Tabique planta 2"));
        assert!(md.contains("28,00"));
        assert!(md.contains("Fecha:** 05/03/2024"));
    }

    #[test]
    fn priced_markdown_adds_price_columns() {
        let mut sheet = test_sheet(true);
        sheet.lines[0].worker_price = Some("10".to_string());
        let md = sheet_markdown(&sheet);
        assert!(md.contains("HOJA DE MEDICIONES PRECIO"));
        assert!(md.contains("Precio Trabajador"));
        assert!(md.contains("10,00"));
    }

    #[test]
    fn blank_price_cells_render_as_zero() {
        // The line editor leaves skipped price fields as empty strings.
        let mut sheet = test_sheet(true);
        sheet.lines[0].worker_price = Some(String::new());
        sheet.lines[0].worker_value = Some(String::new());
        sheet.lines[0].contractor_price = None;
        sheet.lines[0].contractor_value = Some(" ".to_string());

        let md = sheet_markdown(&sheet);
        assert!(md.contains("0,00"));
        assert!(!md.contains("text-align: center;\"></td>"));
    }

    #[test]
    fn order_markdown_has_all_fields() {
        let mut order = PurchaseOrder::new();
        order.order_date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        order.description = "Sacos de cemento".to_string();
        order.quantity = "40".to_string();
        order.cost = "180".to_string();
        order.supplier = "Almacén Pérez".to_string();

        let md = order_markdown(&order);
        assert!(md.contains("HOJA DE PEDIDOS"));
        assert!(md.contains("15/01/2024"));
        assert!(md.contains("Almacén Pérez"));
        assert!(md.contains("180,00"));
    }
}
