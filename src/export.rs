use crate::normalizer::Row;
use crate::schema::{FeedbackCategory, schema_for};

fn header(category: FeedbackCategory) -> impl Iterator<Item = &'static str> {
    schema_for(category).fields.iter().map(|f| f.name)
}

fn push_csv_cell(out: &mut String, value: &str) {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        out.push('"');
        out.push_str(&value.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(value);
    }
}

/// Convert a category sheet to CSV
///
/// The first line holds the schema field names. Each row is padded or cut to the
/// schema width so that columns line up with the header. Cells containing commas,
/// quotes or newlines are quoted.
///
/// # Arguments
/// * `category` - The category the rows belong to
/// * `rows` - Stored rows in append order
///
/// # Returns
/// * `String` - CSV content
pub fn to_csv(category: FeedbackCategory, rows: &[Row]) -> String {
    let width = schema_for(category).len();
    let mut csv_content = header(category).collect::<Vec<_>>().join(",");
    csv_content.push('\n');

    for row in rows {
        for c in 0..width {
            if c > 0 {
                csv_content.push(',');
            }
            push_csv_cell(&mut csv_content, row.get(c).map(String::as_str).unwrap_or_default());
        }
        csv_content.push('\n');
    }

    csv_content
}

/// Convert a category sheet to XLSX
///
/// Same layout as [`to_csv`], written as a single worksheet named after the category.
///
/// # Returns
/// * `Result<Vec<u8>, XlsxError>` - XLSX file content as bytes or an error
#[cfg(feature = "web")]
pub fn to_xlsx(category: FeedbackCategory, rows: &[Row]) -> Result<Vec<u8>, rust_xlsxwriter::XlsxError> {
    use rust_xlsxwriter::{Format, Workbook, Worksheet};

    let width = schema_for(category).len();
    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();
    worksheet.set_name(category.sheet_title())?;

    let bold = Format::new().set_bold();
    for (c, name) in header(category).enumerate() {
        worksheet.write_string_with_format(0, c as u16, name, &bold)?;
    }

    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().take(width).enumerate() {
            if !value.is_empty() {
                worksheet.write_string((r + 1) as u32, c as u16, value)?;
            }
        }
    }

    workbook.push_worksheet(worksheet);
    workbook.save_to_buffer()
}
