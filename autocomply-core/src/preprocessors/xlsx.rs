use std::collections::BTreeMap;

use super::ooxml::check_part_sizes;
use super::Preprocessor;
use crate::config::SpreadsheetMode;
use crate::error::DecodeError;
use crate::types::{RawDocument, SourceFormat, Table};

/// Excel workbooks, as a table (first sheet) or as flattened text.
pub struct XlsxPreprocessor {
    mode: SpreadsheetMode,
    max_part_bytes: u64,
    max_sheet_cells: u64,
}

/// A worksheet's populated rows, each padded from column A to the widest
/// populated column.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

/// Non-empty cell values keyed by 0-based row, then 0-based column.
type SparseCells = BTreeMap<u32, BTreeMap<u32, String>>;

impl XlsxPreprocessor {
    pub fn new(mode: SpreadsheetMode, max_part_bytes: u64, max_sheet_cells: u64) -> Self {
        Self {
            mode,
            max_part_bytes,
            max_sheet_cells,
        }
    }

    /// Every worksheet in workbook order.
    pub fn read_sheets(&self, bytes: &[u8]) -> Result<Vec<Sheet>, DecodeError> {
        check_part_sizes(bytes, self.max_part_bytes)?;
        read_workbook(bytes)?
            .into_iter()
            .map(|(name, cells)| {
                let rows = into_grid(cells, self.max_sheet_cells)?;
                tracing::debug!(sheet = %name, rows = rows.len(), "worksheet read");
                Ok(Sheet { name, rows })
            })
            .collect()
    }
}

#[cfg(feature = "xlsx-backend")]
fn read_workbook(bytes: &[u8]) -> Result<Vec<(String, SparseCells)>, DecodeError> {
    use calamine::{Data, Reader, Xlsx};
    use std::io::Cursor;

    fn spreadsheet_error(e: calamine::XlsxError) -> DecodeError {
        DecodeError::Spreadsheet(e.to_string())
    }

    super::catch_decoder_panic("calamine", || {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).map_err(spreadsheet_error)?;
        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let mut cells = SparseCells::new();
            // Streamed cell by cell; a worksheet range would be allocated densely
            let mut reader = workbook
                .worksheet_cells_reader(&name)
                .map_err(spreadsheet_error)?;
            while let Some(cell) = reader.next_cell().map_err(spreadsheet_error)? {
                let (row, column) = cell.get_position();
                let value = match Data::from(cell.get_value().clone()) {
                    Data::Empty => continue,
                    Data::Bool(true) => "TRUE".to_string(),
                    Data::Bool(false) => "FALSE".to_string(),
                    other => other.to_string(),
                };
                if !value.is_empty() {
                    cells.entry(row).or_default().insert(column, value);
                }
            }
            sheets.push((name, cells));
        }
        Ok(sheets)
    })
}

#[cfg(not(feature = "xlsx-backend"))]
fn read_workbook(_bytes: &[u8]) -> Result<Vec<(String, SparseCells)>, DecodeError> {
    Err(DecodeError::FeatureDisabled("xlsx-backend".to_string()))
}

/// Populated rows in order, each padded to the widest populated column.
/// Refuses a grid above `max_cells` before allocating it.
fn into_grid(cells: SparseCells, max_cells: u64) -> Result<Vec<Vec<String>>, DecodeError> {
    let width = cells
        .values()
        .filter_map(|row| row.keys().next_back())
        .map(|column| u64::from(*column) + 1)
        .max()
        .unwrap_or(0);
    let total = (cells.len() as u64).saturating_mul(width);
    if total > max_cells {
        return Err(DecodeError::SheetTooLarge {
            cells: total,
            limit: max_cells,
        });
    }

    // Bounded by `max_cells`, which fits in memory by configuration
    let width = width as usize;
    Ok(cells
        .into_values()
        .map(|row| {
            let mut line = vec![String::new(); width];
            for (column, value) in row {
                line[column as usize] = value;
            }
            line
        })
        .collect())
}

/// `--- Sheet: <name> ---` then each row with tab-separated cells.
pub fn flatten_sheets(sheets: &[Sheet]) -> String {
    let mut lines = Vec::new();
    for sheet in sheets {
        lines.push(format!("--- Sheet: {} ---", sheet.name));
        for row in &sheet.rows {
            lines.push(row.join("\t"));
        }
    }
    lines.join("\n")
}

impl Preprocessor for XlsxPreprocessor {
    fn decode(&self, bytes: &[u8]) -> Result<RawDocument, DecodeError> {
        let sheets = self.read_sheets(bytes)?;
        match self.mode {
            SpreadsheetMode::Text => Ok(RawDocument::Text {
                format: SourceFormat::Xlsx,
                text: flatten_sheets(&sheets),
            }),
            SpreadsheetMode::Table => {
                let table = sheets
                    .into_iter()
                    .next()
                    .map(|sheet| Table::from_grid(sheet.rows))
                    .unwrap_or_default();
                Ok(RawDocument::Table {
                    format: SourceFormat::Xlsx,
                    table,
                })
            }
        }
    }

    fn name(&self) -> &str {
        "xlsx"
    }

    fn supports_format(&self, format: SourceFormat) -> bool {
        format == SourceFormat::Xlsx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sparse(entries: &[(u32, u32, &str)]) -> SparseCells {
        let mut cells = SparseCells::new();
        for (row, column, value) in entries {
            cells.entry(*row).or_default().insert(*column, value.to_string());
        }
        cells
    }

    #[test]
    fn grid_keeps_populated_rows_only() {
        let rows = into_grid(sparse(&[(0, 0, "Test"), (0, 1, "Result"), (3, 2, "PASS")]), 100)
            .unwrap();
        assert_eq!(
            rows,
            vec![vec!["Test", "Result", ""], vec!["", "", "PASS"]]
        );
    }

    #[test]
    fn last_cell_of_the_sheet_is_cheap() {
        // XFD1048576 with a header in A1
        let rows = into_grid(sparse(&[(0, 0, "Test"), (1_048_575, 16_383, "x")]), 1_000_000)
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].len(), 16_384);
        assert_eq!(rows[1][16_383], "x");
        assert_eq!(rows[0][0], "Test");
    }

    #[test]
    fn grid_above_cell_limit_is_refused() {
        let err = into_grid(sparse(&[(0, 0, "a"), (1, u32::MAX - 1, "b")]), 1_000_000)
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::SheetTooLarge {
                cells: 8_589_934_590,
                limit: 1_000_000
            }
        ));
    }

    #[test]
    fn empty_sheet_is_an_empty_grid() {
        assert!(into_grid(SparseCells::new(), 0).unwrap().is_empty());
    }

    #[test]
    fn flattened_text_marks_each_sheet() {
        let sheets = vec![
            Sheet {
                name: "Results".to_string(),
                rows: vec![vec!["Test".into(), "Result".into()], vec!["CAN".into(), "".into()]],
            },
            Sheet {
                name: "Notes".to_string(),
                rows: vec![vec!["GPS fix Passed".into()]],
            },
        ];
        assert_eq!(
            flatten_sheets(&sheets),
            "--- Sheet: Results ---\nTest\tResult\nCAN\t\n--- Sheet: Notes ---\nGPS fix Passed"
        );
    }

    #[cfg(feature = "xlsx-backend")]
    mod workbook {
        use super::*;
        use crate::preprocessors::ooxml::test_support::xlsx_package;

        const RESULTS: &str = r#"<row r="1"><c r="A1" t="inlineStr"><is><t>Test</t></is></c><c r="B1" t="inlineStr"><is><t>Result</t></is></c></row><row r="2"><c r="A2" t="inlineStr"><is><t>CAN wake</t></is></c><c r="C2" t="inlineStr"><is><t>PASS</t></is></c></row><row r="4"><c r="A4" t="b"><v>1</v></c><c r="B4"><v>3.5</v></c></row>"#;

        const NOTES: &str = r#"<row r="1"><c r="A1" t="inlineStr"><is><t>GPS fix Passed</t></is></c></row>"#;

        fn workbook() -> Vec<u8> {
            xlsx_package(&[("Results", RESULTS), ("Notes", NOTES)])
        }

        fn preprocessor(mode: SpreadsheetMode) -> XlsxPreprocessor {
            XlsxPreprocessor::new(mode, 1 << 20, 1_000_000)
        }

        #[test]
        fn sheets_follow_workbook_order() {
            let sheets = preprocessor(SpreadsheetMode::Table)
                .read_sheets(&workbook())
                .unwrap();
            assert_eq!(sheets.len(), 2);
            assert_eq!(sheets[0].name, "Results");
            assert_eq!(
                sheets[0].rows,
                vec![
                    vec!["Test", "Result", ""],
                    vec!["CAN wake", "", "PASS"],
                    vec!["TRUE", "3.5", ""],
                ]
            );
            assert_eq!(sheets[1].rows, vec![vec!["GPS fix Passed"]]);
        }

        #[test]
        fn table_mode_uses_first_sheet_header() {
            let decoded = preprocessor(SpreadsheetMode::Table).decode(&workbook()).unwrap();
            let RawDocument::Table { table, .. } = decoded else {
                panic!("expected table");
            };
            assert_eq!(table.headers, vec!["Test", "Result", "column_3"]);
            assert_eq!(table.rows.len(), 2);
        }

        #[test]
        fn text_mode_flattens_every_sheet() {
            let decoded = preprocessor(SpreadsheetMode::Text).decode(&workbook()).unwrap();
            let RawDocument::Text { text, .. } = decoded else {
                panic!("expected text");
            };
            assert!(text.starts_with("--- Sheet: Results ---\nTest\tResult\t\n"));
            assert!(text.ends_with("--- Sheet: Notes ---\nGPS fix Passed"));
        }

        #[test]
        fn cell_at_xfd1048576_decodes() {
            let bytes = xlsx_package(&[(
                "Big",
                r#"<row r="1"><c r="A1" t="inlineStr"><is><t>Test</t></is></c></row><row r="1048576"><c r="XFD1048576" t="inlineStr"><is><t>x</t></is></c></row>"#,
            )]);
            let sheets = preprocessor(SpreadsheetMode::Table).read_sheets(&bytes).unwrap();
            assert_eq!(sheets[0].rows.len(), 2);
            assert_eq!(sheets[0].rows[1][16_383], "x");
        }

        #[test]
        fn overlong_column_letters_do_not_abort() {
            let bytes = xlsx_package(&[(
                "Bad",
                r#"<row r="1"><c r="ZZZZZZZZZZZZZZZ1" t="inlineStr"><is><t>x</t></is></c></row>"#,
            )]);
            // Rejected, or decoded into a grid no wider than the cell limit
            match preprocessor(SpreadsheetMode::Table).read_sheets(&bytes) {
                Ok(sheets) => {
                    let cells: usize = sheets.iter().flat_map(|s| &s.rows).map(Vec::len).sum();
                    assert!(cells <= 1_000_000);
                }
                Err(e) => assert!(matches!(
                    e,
                    DecodeError::Spreadsheet(_)
                        | DecodeError::SheetTooLarge { .. }
                        | DecodeError::Panicked(_)
                )),
            }
        }

        #[test]
        fn tight_cell_limit_refuses_the_sheet() {
            let err = XlsxPreprocessor::new(SpreadsheetMode::Table, 1 << 20, 4)
                .read_sheets(&workbook())
                .unwrap_err();
            assert!(matches!(err, DecodeError::SheetTooLarge { cells: 9, limit: 4 }));
        }

        #[test]
        fn not_a_workbook() {
            let err = preprocessor(SpreadsheetMode::Table)
                .read_sheets(b"Test,Result")
                .unwrap_err();
            assert!(matches!(err, DecodeError::Archive(_)));
        }
    }
}
