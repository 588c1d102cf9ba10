//! # Spreadsheet output of the price table
//!
//! ## Responsibility
//! Render a [`PriceTable`] as an `.xlsx` workbook with a three-row header:
//! ```text
//! | Город (Отправитель) | Город (Получатель) | СДЭК    | <caption> |           |
//! |                     |                    | Вес, кг |           | Срок, дней|
//! |                     |                    | 0.5     | 2 ...     | от | до   |
//! | Moscow              | Kazan              | 500     | 900 ...   | 1  | 3    |
//! ```
//!
//! ## Guarantees
//! - Header rows are bold; city and weight columns are sized to their header
//! - Unpriced cells stay empty
//!
//! ## NOT Responsible For
//! - Row layout and deduplication (see: `table.rs`)

use super::table::PriceTable;
use super::{ensure_parent, RouteSink, TableLayout};
use crate::model::RouteResult;
use crate::PricerError;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::{Path, PathBuf};

/// Rows above the first route row.
pub const HEADER_ROWS: usize = 3;

const SHEET_NAME: &str = "results";
const CARRIER: &str = "СДЭК";
const WIDTH_PADDING: usize = 7;

/// One cell of the rendered sheet.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetCell {
    /// Nothing written.
    Empty,
    /// A text cell.
    Text(String),
    /// A numeric cell.
    Number(f64),
}

impl SheetCell {
    fn text(value: &str) -> Self {
        Self::Text(value.to_string())
    }

    fn width(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Text(text) => text.chars().count(),
            Self::Number(n) => n.to_string().len(),
        }
    }
}

/// The header rows followed by one row per route.
pub fn sheet_grid(table: &PriceTable) -> Vec<Vec<SheetCell>> {
    let weights = table.weights.len();
    let mut grid = Vec::with_capacity(HEADER_ROWS + table.rows.len());

    grid.push(vec![
        SheetCell::text("Город (Отправитель)"),
        SheetCell::text("Город (Получатель)"),
        SheetCell::text(CARRIER),
        SheetCell::Text(table.caption.clone()),
    ]);

    let mut weight_banner = vec![SheetCell::Empty, SheetCell::Empty, SheetCell::text("Вес, кг")];
    weight_banner.extend(std::iter::repeat(SheetCell::Empty).take(weights.saturating_sub(1)));
    weight_banner.push(SheetCell::text("Срок, дней"));
    grid.push(weight_banner);

    let mut weight_row = vec![SheetCell::Empty, SheetCell::Empty];
    weight_row.extend(table.weights.iter().map(|w| SheetCell::Number(*w)));
    weight_row.extend([SheetCell::text("от"), SheetCell::text("до")]);
    grid.push(weight_row);

    for row in &table.rows {
        let mut cells = vec![
            SheetCell::Text(row.city_from.clone()),
            SheetCell::Text(row.city_to.clone()),
        ];
        cells.extend(
            row.costs
                .iter()
                .map(|cost| cost.map_or(SheetCell::Empty, SheetCell::Number)),
        );
        cells.extend([row.duration_min, row.duration_max].map(|days| {
            days.map_or(SheetCell::Empty, |d| SheetCell::Number(f64::from(d)))
        }));
        grid.push(cells);
    }

    grid
}

/// Column widths derived from the header: the city columns from the first
/// row, the weight and duration columns from the third.
fn column_widths(grid: &[Vec<SheetCell>]) -> Vec<usize> {
    let cities = grid.first().map(|row| row.iter().take(2));
    let values = grid.get(2).map(|row| row.iter().skip(2));
    cities
        .into_iter()
        .flatten()
        .chain(values.into_iter().flatten())
        .map(|cell| cell.width() + WIDTH_PADDING)
        .collect()
}

/// Writes the [`PriceTable`] to an `.xlsx` workbook.
#[derive(Debug, Clone)]
pub struct XlsxTableSink {
    path: PathBuf,
}

impl XlsxTableSink {
    /// Sink writing to `path`, replacing any previous workbook.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the workbook.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn render(&self, grid: &[Vec<SheetCell>]) -> Result<(), XlsxError> {
        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();
        let plain = Format::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;

        for (row_num, (index, row)) in (0u32..).zip(grid.iter().enumerate()) {
            let format = if index < HEADER_ROWS { &bold } else { &plain };
            for (col_num, cell) in (0u16..).zip(row) {
                match cell {
                    SheetCell::Empty => {}
                    SheetCell::Text(text) => {
                        sheet.write_string_with_format(row_num, col_num, text, format)?;
                    }
                    SheetCell::Number(n) => {
                        sheet.write_number_with_format(row_num, col_num, *n, format)?;
                    }
                }
            }
        }

        for (col_num, width) in (0u16..).zip(column_widths(grid)) {
            sheet.set_column_width(col_num, width as f64)?;
        }

        workbook.save(&self.path)
    }
}

impl RouteSink for XlsxTableSink {
    fn write(&self, results: &[RouteResult], layout: &TableLayout) -> Result<(), PricerError> {
        let table = PriceTable::build(results, layout);
        let grid = sheet_grid(&table);
        ensure_parent(&self.path)?;
        self.render(&grid).map_err(|source| PricerError::Spreadsheet {
            path: self.path.display().to_string(),
            source,
        })?;
        tracing::info!(
            path = %self.path.display(),
            rows = table.rows.len(),
            "price workbook written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::PriceRow;

    fn table() -> PriceTable {
        PriceTable {
            caption: "Express, HOME-HOME, 16:00".into(),
            weights: vec![0.5, 2.0],
            rows: vec![
                PriceRow {
                    city_from: "Moscow".into(),
                    city_to: "Kazan".into(),
                    costs: vec![Some(500.0), None],
                    duration_min: Some(1),
                    duration_max: Some(3),
                },
                PriceRow {
                    city_from: "Moscow".into(),
                    city_to: "Omsk".into(),
                    costs: vec![None, None],
                    duration_min: None,
                    duration_max: None,
                },
            ],
        }
    }

    #[test]
    fn test_grid_has_three_header_rows() {
        let grid = sheet_grid(&table());
        assert_eq!(grid.len(), HEADER_ROWS + 2);
        assert_eq!(grid[0][2], SheetCell::text("СДЭК"));
        assert_eq!(grid[0][3], SheetCell::text("Express, HOME-HOME, 16:00"));
        assert_eq!(
            grid[1],
            vec![
                SheetCell::Empty,
                SheetCell::Empty,
                SheetCell::text("Вес, кг"),
                SheetCell::Empty,
                SheetCell::text("Срок, дней"),
            ]
        );
        assert_eq!(
            grid[2][2..],
            [
                SheetCell::Number(0.5),
                SheetCell::Number(2.0),
                SheetCell::text("от"),
                SheetCell::text("до"),
            ]
        );
    }

    #[test]
    fn test_grid_route_rows_leave_unpriced_cells_empty() {
        let grid = sheet_grid(&table());
        assert_eq!(
            grid[3],
            vec![
                SheetCell::text("Moscow"),
                SheetCell::text("Kazan"),
                SheetCell::Number(500.0),
                SheetCell::Empty,
                SheetCell::Number(1.0),
                SheetCell::Number(3.0),
            ]
        );
        assert!(grid[4][2..].iter().all(|c| *c == SheetCell::Empty));
    }

    #[test]
    fn test_column_widths_follow_headers() {
        let widths = column_widths(&sheet_grid(&table()));
        assert_eq!(widths.len(), 6);
        assert_eq!(widths[0], "Город (Отправитель)".chars().count() + WIDTH_PADDING);
        assert_eq!(widths[2], "0.5".len() + WIDTH_PADDING);
        assert_eq!(widths[5], "до".chars().count() + WIDTH_PADDING);
    }

    #[test]
    fn test_xlsx_sink_writes_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let sink = XlsxTableSink::new(dir.path().join("out/prices.xlsx"));
        let layout = TableLayout {
            caption: "Express, HOME-HOME, 16:00".into(),
            weights: vec![0.5, 2.0],
            routes: vec![crate::repository::Route::new("Moscow", "Kazan")],
        };
        sink.write(&[], &layout).unwrap();

        let bytes = std::fs::read(sink.path()).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}
