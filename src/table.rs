//! Table Adapter: spreadsheet in, text items out, result column back in.
//!
//! The first row of the first sheet is the header row. Each data row's cell in
//! the input column becomes one [`TextItem`] at the row's ordinal position, and
//! results are written back into an appended column aligned by that position.

use crate::config::FailedRowPolicy;
use crate::error::TableError;
use crate::types::{ResultSet, TextItem};
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use rust_xlsxwriter::Workbook;

/// MIME type of `.xlsx` uploads
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
/// MIME type of legacy `.xls` uploads
pub const XLS_MIME: &str = "application/vnd.ms-excel";

/// Reject anything that is not an Excel workbook
///
/// The MIME type decides when it is specific; generic or missing types fall
/// back to the file extension.
pub fn check_format(mime_type: Option<&str>, file_name: Option<&str>) -> Result<(), TableError> {
    match mime_type {
        Some(XLSX_MIME | XLS_MIME) => return Ok(()),
        Some(mime) if mime != "application/octet-stream" && !mime.is_empty() => {
            return Err(TableError::UnsupportedFormat {
                mime_type: mime.to_string(),
            });
        }
        _ => {}
    }

    let extension = file_name
        .and_then(|name| std::path::Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("xlsx" | "xls") => Ok(()),
        _ => Err(TableError::UnsupportedFormat {
            mime_type: mime_type
                .or(file_name)
                .unwrap_or("unknown")
                .to_string(),
        }),
    }
}

/// One spreadsheet cell
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    /// No value
    Empty,
    /// String value
    Text(String),
    /// Numeric value
    Number(f64),
    /// Boolean value
    Bool(bool),
}

impl Cell {
    /// Cell rendered as the text sent to the service
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Bool(b) => b.to_string(),
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Bool(b) => Cell::Bool(*b),
            other => Cell::Text(other.to_string()),
        }
    }
}

/// An in-memory sheet: a header row and rectangular data rows
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build a table, padding every row to the header width
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width.max(row.len()), Cell::Empty);
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Header row
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Position of the column named `name`
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Cells of column `name`, top to bottom
    pub fn column(&self, name: &str) -> Result<Vec<&Cell>, TableError> {
        let idx = self.require_column(name)?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// One text item per data row, taken from column `name`
    pub fn text_items(&self, name: &str) -> Result<Vec<TextItem>, TableError> {
        let idx = self.require_column(name)?;
        Ok(self
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| TextItem::new(index, row[idx].as_text()))
            .collect())
    }

    /// Append column `name` filled from `results`
    ///
    /// With [`FailedRowPolicy::Blank`] each result lands on its own row and
    /// failed rows stay empty. With [`FailedRowPolicy::Drop`] failed results
    /// are skipped and the surviving texts are packed from the first row, so
    /// every text after a failure sits above its source row.
    pub fn append_results(&mut self, name: &str, results: &ResultSet, policy: FailedRowPolicy) {
        let mut column = vec![Cell::Empty; self.rows.len()];

        match policy {
            FailedRowPolicy::Blank => {
                for result in results {
                    if let (Some(slot), Some(text)) =
                        (column.get_mut(result.item_index), result.text())
                    {
                        *slot = Cell::Text(text.to_string());
                    }
                }
            }
            FailedRowPolicy::Drop => {
                let survivors = results.iter().filter_map(|r| r.text());
                for (slot, text) in column.iter_mut().zip(survivors) {
                    *slot = Cell::Text(text.to_string());
                }
            }
        }

        self.headers.push(name.to_string());
        for (row, cell) in self.rows.iter_mut().zip(column) {
            row.push(cell);
        }
    }

    fn require_column(&self, name: &str) -> Result<usize, TableError> {
        self.column_index(name)
            .ok_or_else(|| TableError::MissingColumn {
                column: name.to_string(),
            })
    }
}

/// Parse the first sheet of an `.xlsx`/`.xls`/`.ods` workbook
pub fn read_table(bytes: &[u8]) -> Result<Table, TableError> {
    let cursor = std::io::Cursor::new(bytes.to_vec());
    let mut workbook =
        open_workbook_auto_from_rs(cursor).map_err(|e| TableError::Read(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(TableError::Empty)?
        .map_err(|e| TableError::Read(e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or(TableError::Empty)?
        .iter()
        .map(|cell| Cell::from(cell).as_text())
        .collect();

    let data = rows
        .map(|row| row.iter().map(Cell::from).collect())
        .collect();

    Ok(Table::new(headers, data))
}

/// Encode `table` as a single-sheet `.xlsx` workbook
pub fn write_xlsx(table: &Table) -> Result<Vec<u8>, TableError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let write_err = |e: rust_xlsxwriter::XlsxError| TableError::Write(e.to_string());

    for (col, header) in table.headers.iter().enumerate() {
        let col = u16::try_from(col).map_err(|_| TableError::Write("too many columns".into()))?;
        sheet.write_string(0, col, header.as_str()).map_err(write_err)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let row_num = u32::try_from(row_idx + 1)
            .map_err(|_| TableError::Write("too many rows".into()))?;
        for (col, cell) in row.iter().enumerate() {
            let col =
                u16::try_from(col).map_err(|_| TableError::Write("too many columns".into()))?;
            match cell {
                Cell::Empty => {}
                Cell::Text(s) => {
                    sheet.write_string(row_num, col, s.as_str()).map_err(write_err)?;
                }
                Cell::Number(n) => {
                    sheet.write_number(row_num, col, *n).map_err(write_err)?;
                }
                Cell::Bool(b) => {
                    sheet.write_boolean(row_num, col, *b).map_err(write_err)?;
                }
            }
        }
    }

    workbook.save_to_buffer().map_err(write_err)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::xlsx_bytes;
    use crate::types::{TaskErrorKind, TaskResult};

    fn sample() -> Table {
        read_table(&xlsx_bytes(
            &["id", "text_column"],
            &[vec!["a", "first"], vec!["b", "second"], vec!["c", "third"]],
        ))
        .unwrap()
    }

    fn results_with_middle_failure() -> ResultSet {
        ResultSet::from_results(vec![
            TaskResult::success(0, "FIRST"),
            TaskResult::failure(1, TaskErrorKind::PollFailed),
            TaskResult::success(2, "THIRD"),
        ])
    }

    fn texts(cells: Vec<&Cell>) -> Vec<String> {
        cells.into_iter().map(Cell::as_text).collect()
    }

    #[test]
    fn reads_header_and_rows_in_order() {
        let table = sample();
        assert_eq!(table.headers(), &["id".to_string(), "text_column".to_string()]);
        assert_eq!(table.row_count(), 3);

        let items = table.text_items("text_column").unwrap();
        assert_eq!(
            items,
            vec![
                TextItem::new(0, "first"),
                TextItem::new(1, "second"),
                TextItem::new(2, "third"),
            ]
        );
    }

    #[test]
    fn missing_text_column_is_rejected() {
        let table = read_table(&xlsx_bytes(&["body"], &[vec!["x"]])).unwrap();
        match table.text_items("text_column").unwrap_err() {
            TableError::MissingColumn { column } => assert_eq!(column, "text_column"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn header_only_sheet_yields_no_items() {
        let table = read_table(&xlsx_bytes(&["text_column"], &[])).unwrap();
        assert!(table.text_items("text_column").unwrap().is_empty());
    }

    #[test]
    fn garbage_bytes_are_a_read_error() {
        assert!(matches!(
            read_table(b"definitely not a workbook"),
            Err(TableError::Read(_))
        ));
    }

    #[test]
    fn blank_policy_keeps_rows_aligned() {
        let mut table = sample();
        table.append_results(
            "unique_texts",
            &results_with_middle_failure(),
            FailedRowPolicy::Blank,
        );

        assert_eq!(
            texts(table.column("unique_texts").unwrap()),
            vec!["FIRST", "", "THIRD"]
        );
        assert_eq!(table.headers().len(), 3);
    }

    #[test]
    fn drop_policy_packs_survivors_from_the_top() {
        let mut table = sample();
        table.append_results(
            "unique_texts",
            &results_with_middle_failure(),
            FailedRowPolicy::Drop,
        );

        // "THIRD" moves up next to "second": the alignment loss of the filtered variant
        assert_eq!(
            texts(table.column("unique_texts").unwrap()),
            vec!["FIRST", "THIRD", ""]
        );
    }

    #[test]
    fn policies_agree_when_nothing_failed() {
        let results = ResultSet::from_results(vec![
            TaskResult::success(0, "A"),
            TaskResult::success(1, "B"),
            TaskResult::success(2, "C"),
        ]);

        let mut blank = sample();
        blank.append_results("unique_texts", &results, FailedRowPolicy::Blank);
        let mut dropped = sample();
        dropped.append_results("unique_texts", &results, FailedRowPolicy::Drop);

        assert_eq!(blank, dropped);
    }

    #[test]
    fn written_workbook_reads_back_with_result_column() {
        let mut table = sample();
        table.append_results(
            "unique_texts",
            &results_with_middle_failure(),
            FailedRowPolicy::Blank,
        );

        let reread = read_table(&write_xlsx(&table).unwrap()).unwrap();

        assert_eq!(
            reread.headers(),
            &["id".to_string(), "text_column".to_string(), "unique_texts".to_string()]
        );
        assert_eq!(
            texts(reread.column("text_column").unwrap()),
            vec!["first", "second", "third"]
        );
        let results = texts(reread.column("unique_texts").unwrap());
        assert_eq!(results[0], "FIRST");
        assert_eq!(results[1], "");
        assert_eq!(results[2], "THIRD");
    }

    #[test]
    fn numbers_render_without_trailing_zero() {
        assert_eq!(Cell::Number(42.0).as_text(), "42");
        assert_eq!(Cell::Number(2.5).as_text(), "2.5");
        assert_eq!(Cell::Empty.as_text(), "");
        assert_eq!(Cell::Bool(true).as_text(), "true");
    }

    #[test]
    fn format_check_accepts_excel_types() {
        check_format(Some(XLSX_MIME), Some("a.xlsx")).unwrap();
        check_format(Some(XLS_MIME), None).unwrap();
        check_format(Some("application/octet-stream"), Some("Report.XLSX")).unwrap();
        check_format(None, Some("legacy.xls")).unwrap();
    }

    #[test]
    fn format_check_rejects_other_types() {
        assert!(check_format(Some("text/csv"), Some("a.xlsx")).is_err());
        assert!(check_format(None, Some("notes.txt")).is_err());
        assert!(check_format(None, None).is_err());
    }
}
