use std::collections::{BTreeMap, HashMap};

/// The site list in row/column form, as parsed from XML and before it is written out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Column names, in order of first appearance in the document.
    pub columns: Vec<String>,
    /// One entry per site element. Every row holds exactly `columns.len()` cells;
    /// `None` is a field the site element did not carry (or carried empty).
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    /// Number of rows (site elements).
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value of `column` in row `row`, if both exist and the cell is filled.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    /// Row `row` as a field name → value mapping.
    pub fn record(&self, row: usize) -> Option<BTreeMap<&str, Option<&str>>> {
        let cells = self.rows.get(row)?;
        Some(
            self.columns
                .iter()
                .map(String::as_str)
                .zip(cells.iter().map(Option::as_deref))
                .collect(),
        )
    }
}

/// Accumulates rows whose column set is only known once the whole document is read.
#[derive(Debug, Default)]
pub(crate) struct TableBuilder {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Option<String>>>,
}

impl TableBuilder {
    pub(crate) fn start_row(&mut self) {
        self.rows.push(Vec::with_capacity(self.columns.len()));
    }

    /// Set `name` on the current row. A repeated name overwrites the earlier value.
    pub(crate) fn set(&mut self, name: &str, value: Option<String>) {
        let idx = match self.index.get(name) {
            Some(&idx) => idx,
            None => {
                let idx = self.columns.len();
                self.columns.push(name.to_string());
                self.index.insert(name.to_string(), idx);
                idx
            }
        };
        if let Some(row) = self.rows.last_mut() {
            if row.len() <= idx {
                row.resize(idx + 1, None);
            }
            row[idx] = value;
        }
    }

    pub(crate) fn finish(self) -> Table {
        let width = self.columns.len();
        let rows = self
            .rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();
        Table {
            columns: self.columns,
            rows,
        }
    }
}
