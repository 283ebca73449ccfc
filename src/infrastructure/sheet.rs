//! Trimming of spreadsheet-style exports.

use crate::domain::errors::DatabindError;
use crate::domain::ports::Report;
use crate::domain::table::RowTable;

/// Drops the first `header_rows` rows. The first remaining row fixes the
/// column count: longer rows are truncated to it and shorter ones dropped.
///
/// An export with nothing left is an error.
pub fn trim_to_header(values: RowTable, header_rows: usize, report: Report) -> Result<RowTable, DatabindError> {
    let mut rows = values.into_iter().skip(header_rows);

    let Some(first) = rows.next() else {
        return Err(DatabindError::empty_table(report));
    };
    let width = first.len();

    let mut table = vec![first];
    for mut row in rows {
        if row.len() >= width {
            row.truncate(width);
            table.push(row);
        }
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table::table_from;

    #[test]
    fn test_trim_to_header() {
        let values = table_from(vec![
            vec!["Daily Balances"],
            vec!["MSA", "Org", "Account"],
            vec!["1001", "Electric Sheep", "ES Capital Fund", "extra"],
            vec!["1002", "Firetronics"],
            vec!["1003", "Gone Corp", "GC Fund"],
        ]);

        let table = trim_to_header(values, 1, Report::DailyBalances).unwrap();

        assert_eq!(
            table,
            table_from(vec![
                vec!["MSA", "Org", "Account"],
                vec!["1001", "Electric Sheep", "ES Capital Fund"],
                vec!["1003", "Gone Corp", "GC Fund"],
            ])
        );
    }

    #[test]
    fn test_trim_to_header_empty_export() {
        let values = table_from(vec![vec!["Banner"], vec!["Title"]]);

        let err = trim_to_header(values, 8, Report::DailyBalances).unwrap_err();
        assert_eq!(err.to_string(), "No Daily Balances found");

        let err = trim_to_header(Vec::new(), 0, Report::Rewards).unwrap_err();
        assert_eq!(
            err.to_string(),
            "No Delegation and Staking Rewards Activity found"
        );
    }
}
