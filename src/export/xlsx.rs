//! Workbook layouts for the measurement sheet (base and priced) and the
//! purchase order. The shapes are fixed: merged title row, right-aligned
//! client block, bordered header and data rows, comma-decimal numerics.

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};

use crate::error::{Result, StoreError};
use crate::export::{format_date, format_decimal_comma, price_or_zero};
use crate::models::{MeasurementSheet, PurchaseOrder};

const SHEET_HEADERS: [&str; 6] = ["Actividad", "Concepto", "L", "H", "N", "Total"];
const PRICED_HEADERS: [&str; 4] = [
    "Precio Trabajador",
    "Valor Trabajador",
    "Precio Constructora",
    "Valor Constructora",
];
const ORDER_HEADERS: [&str; 9] = [
    "Fecha",
    "Descripción",
    "Cantidad",
    "Constructora",
    "Obra",
    "Empresa",
    "Proveedor",
    "Trabajador",
    "Costo",
];

const SHEET_WIDTHS: [f64; 6] = [15.0, 50.0, 10.0, 10.0, 10.0, 12.0];
const PRICED_WIDTHS: [f64; 10] = [15.0, 40.0, 8.0, 8.0, 8.0, 12.0, 15.0, 15.0, 18.0, 15.0];
const ORDER_WIDTHS: [f64; 9] = [12.0, 25.0, 10.0, 15.0, 20.0, 15.0, 15.0, 15.0, 12.0];

struct SheetFormats {
    title: Format,
    client_info: Format,
    header: Format,
    bordered: Format,
    numeric: Format,
}

fn formats() -> SheetFormats {
    let title = Format::new()
        .set_bold()
        .set_font_size(14)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin);

    let client_info = Format::new()
        .set_align(FormatAlign::Right)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin);

    let header = Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin);

    let bordered = Format::new().set_border(FormatBorder::Thin);

    let numeric = Format::new()
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin);

    SheetFormats {
        title,
        client_info,
        header,
        bordered,
        numeric,
    }
}

fn xlsx_err(err: XlsxError) -> StoreError {
    StoreError::Export(err.to_string())
}

/// Build the base or priced measurement-sheet workbook and return its bytes.
pub fn sheet_workbook_bytes(sheet: &MeasurementSheet) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let fmt = formats();

    let last_col: u16 = if sheet.priced { 9 } else { 5 };
    let title = if sheet.priced {
        "HOJA DE MEDICIONES PRECIO"
    } else {
        "HOJA DE MEDICIONES"
    };

    let ws = workbook.add_worksheet();
    ws.set_name("Hoja de Mediciones").map_err(xlsx_err)?;

    // Row 0 stays blank as the top margin.
    // Row 1: title merged from column B across the data columns.
    ws.merge_range(1, 1, 1, last_col, title, &fmt.title)
        .map_err(xlsx_err)?;

    // Rows 2-4: client info merged from column D, right aligned.
    ws.merge_range(2, 3, 2, last_col, &sheet.client_name, &fmt.client_info)
        .map_err(xlsx_err)?;
    ws.merge_range(3, 3, 3, last_col, &sheet.client_email, &fmt.client_info)
        .map_err(xlsx_err)?;
    ws.merge_range(4, 3, 4, last_col, &sheet.phones_joined(), &fmt.client_info)
        .map_err(xlsx_err)?;

    // Row 5: project info.
    ws.write_with_format(
        5,
        1,
        format!("Constructora: {}", sheet.contractor),
        &fmt.bordered,
    )
    .map_err(xlsx_err)?;
    ws.write_with_format(5, 2, format!("Obra: {}", sheet.sites_joined()), &fmt.bordered)
        .map_err(xlsx_err)?;
    ws.write_with_format(
        5,
        4,
        format!("Fecha: {}", format_date(sheet.sheet_date)),
        &fmt.bordered,
    )
    .map_err(xlsx_err)?;

    // Row 6 blank separator; row 7 holds the table header.
    let headers: Vec<&str> = if sheet.priced {
        SHEET_HEADERS.iter().chain(PRICED_HEADERS.iter()).copied().collect()
    } else {
        SHEET_HEADERS.to_vec()
    };
    for (col, header) in headers.iter().enumerate() {
        ws.write_with_format(7, col as u16, *header, &fmt.header)
            .map_err(xlsx_err)?;
    }

    // Data rows: activity and description as text, quantity verbatim, the
    // remaining numerics rendered comma-decimal and centered.
    for (i, line) in sheet.lines.iter().enumerate() {
        let row = 8 + i as u32;
        ws.write_with_format(row, 0, &line.activity, &fmt.bordered)
            .map_err(xlsx_err)?;
        ws.write_with_format(row, 1, &line.description, &fmt.bordered)
            .map_err(xlsx_err)?;
        ws.write_with_format(row, 2, format_decimal_comma(&line.length), &fmt.numeric)
            .map_err(xlsx_err)?;
        ws.write_with_format(row, 3, format_decimal_comma(&line.height), &fmt.numeric)
            .map_err(xlsx_err)?;
        ws.write_with_format(row, 4, &line.quantity, &fmt.numeric)
            .map_err(xlsx_err)?;
        ws.write_with_format(row, 5, format_decimal_comma(&line.total), &fmt.numeric)
            .map_err(xlsx_err)?;

        if sheet.priced {
            let price_cells = [
                price_or_zero(line.worker_price.as_deref()),
                price_or_zero(line.worker_value.as_deref()),
                price_or_zero(line.contractor_price.as_deref()),
                price_or_zero(line.contractor_value.as_deref()),
            ];
            for (j, value) in price_cells.iter().enumerate() {
                ws.write_with_format(row, 6 + j as u16, format_decimal_comma(value), &fmt.numeric)
                    .map_err(xlsx_err)?;
            }
        }
    }

    set_widths(ws, if sheet.priced { &PRICED_WIDTHS } else { &SHEET_WIDTHS });

    workbook.save_to_buffer().map_err(xlsx_err)
}

/// Build the single-row purchase-order workbook and return its bytes.
pub fn order_workbook_bytes(order: &PurchaseOrder) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let fmt = formats();

    let ws = workbook.add_worksheet();
    ws.set_name("Hoja de Pedidos").map_err(xlsx_err)?;

    // Row 0: title merged over columns E-H.
    ws.merge_range(0, 4, 0, 7, "HOJA DE PEDIDOS", &fmt.title)
        .map_err(xlsx_err)?;

    // Row 1: header.
    for (col, header) in ORDER_HEADERS.iter().enumerate() {
        ws.write_with_format(1, col as u16, *header, &fmt.header)
            .map_err(xlsx_err)?;
    }

    // Row 2: the order itself; quantity and cost centered.
    let cells = [
        format_date(order.order_date),
        order.description.clone(),
        order.quantity.clone(),
        order.contractor.clone(),
        order.site.clone(),
        order.company.clone(),
        order.supplier.clone(),
        order.worker.clone(),
        order.cost.clone(),
    ];
    for (col, value) in cells.iter().enumerate() {
        let format = if col == 2 || col == 8 {
            &fmt.numeric
        } else {
            &fmt.bordered
        };
        ws.write_with_format(2, col as u16, value, format)
            .map_err(xlsx_err)?;
    }

    set_widths(ws, &ORDER_WIDTHS);

    workbook.save_to_buffer().map_err(xlsx_err)
}

fn set_widths(ws: &mut Worksheet, widths: &[f64]) {
    for (col, width) in widths.iter().enumerate() {
        ws.set_column_width(col as u16, *width).ok();
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
        if priced {
            line.worker_price = Some("10".to_string());
            line.worker_value = Some("280".to_string());
            line.contractor_price = Some("12".to_string());
            line.contractor_value = Some("336".to_string());
        }
        sheet.lines.push(line);
        sheet
    }

    #[test]
    fn base_workbook_is_a_valid_zip() {
        let bytes = sheet_workbook_bytes(&test_sheet(false)).unwrap();
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[0..2], b"PK");
    }

    #[test]
    fn priced_workbook_is_a_valid_zip() {
        let bytes = sheet_workbook_bytes(&test_sheet(true)).unwrap();
        assert_eq!(&bytes[0..2], b"PK");
    }

    #[test]
    fn sheet_with_no_lines_still_renders_the_header() {
        let mut sheet = test_sheet(false);
        sheet.lines.clear();
        let bytes = sheet_workbook_bytes(&sheet).unwrap();
        assert_eq!(&bytes[0..2], b"PK");
    }

    #[test]
    fn order_workbook_is_a_valid_zip() {
        let mut order = PurchaseOrder::new();
        order.order_date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        order.description = "Sacos de cemento".to_string();
        order.quantity = "40".to_string();
        order.cost = "180".to_string();

        let bytes = order_workbook_bytes(&order).unwrap();
        assert_eq!(&bytes[0..2], b"PK");
    }
}
