use std::collections::HashMap;

use crate::normalization::normalize_header;

/// Trimmed cell text; empty and whitespace-only cells are null.
pub fn clean_cell(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// In-memory table with normalized headers and nullable text cells.
///
/// Column lookups always go through [`normalize_header`], so callers can ask
/// for `"AppID"` or `" appid"` and get the same column. Every row has exactly
/// one cell per header.
#[derive(Debug, Clone, Default)]
pub struct Table {
    name: String,
    headers: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        let headers: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
        let mut index = HashMap::with_capacity(headers.len());
        for (i, h) in headers.iter().enumerate() {
            // first occurrence wins for duplicated headers
            index.entry(h.clone()).or_insert(i);
        }
        Self {
            name: name.into(),
            headers,
            index,
            rows: Vec::new(),
        }
    }

    /// Placeholder for a source that could not be read: no columns, no rows.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row, padding short rows with nulls and dropping extra cells.
    pub fn push_row(&mut self, mut cells: Vec<Option<String>>) {
        cells.resize(self.headers.len(), None);
        self.rows.push(cells);
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.index.get(&normalize_header(column)).copied()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column)?.as_deref()
    }

    /// Cell lookup by column name; `None` for null cells and unknown columns.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.cell(row, idx)
    }

    pub fn row(&self, row: usize) -> Option<&[Option<String>]> {
        self.rows.get(row).map(Vec::as_slice)
    }

    /// Add a null-filled column and return its index. The name must not be
    /// taken already; callers resolve collisions first.
    pub(crate) fn add_column(&mut self, name: &str) -> usize {
        let name = normalize_header(name);
        let idx = self.headers.len();
        self.index.insert(name.clone(), idx);
        self.headers.push(name);
        for row in &mut self.rows {
            row.push(None);
        }
        idx
    }

    pub(crate) fn set_cell(&mut self, row: usize, column: usize, value: Option<String>) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(column)) {
            *cell = value;
        }
    }

    /// Keep only the rows for which `keep(row_index)` is true, preserving order.
    pub(crate) fn retain_rows(&mut self, mut keep: impl FnMut(usize) -> bool) {
        let mut idx = 0;
        self.rows.retain(|_| {
            let kept = keep(idx);
            idx += 1;
            kept
        });
    }
}
