//! Raw row tables as delivered by table sources.
//!
//! A `RowTable` is a two-dimensional array of string cells with header rows
//! already stripped. Rows may be ragged; a cell past the end of a row reads
//! as empty.

/// Two-dimensional array of string cells
pub type RowTable = Vec<Vec<String>>;

/// Zero-based column index into a row
pub type Column = usize;

/// Returns the cell at `col`, or `""` when the row is too short.
pub fn cell(row: &[String], col: Column) -> &str {
    row.get(col).map(String::as_str).unwrap_or("")
}

/// True when any of the required columns is blank.
pub fn has_blank_field(row: &[String], required: &[Column]) -> bool {
    required.iter().any(|&col| cell(row, col).trim().is_empty())
}

/// Builds a `RowTable` from string slices. Handy for fixtures.
pub fn table_from<R, C>(rows: R) -> RowTable
where
    R: IntoIterator<Item = C>,
    C: IntoIterator,
    C::Item: Into<String>,
{
    rows.into_iter()
        .map(|row| row.into_iter().map(Into::into).collect())
        .collect()
}

/// Builds a row of `width` empty cells with the given `(column, value)` pairs set.
pub fn sparse_row(width: usize, cells: &[(Column, &str)]) -> Vec<String> {
    let mut row = vec![String::new(); width];
    for &(col, value) in cells {
        if col >= row.len() {
            row.resize(col + 1, String::new());
        }
        row[col] = value.to_string();
    }
    row
}
