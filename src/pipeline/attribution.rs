//! Geometric attribution of a page's tables to the closing or the opening record.

use crate::extraction::PositionedTable;

/// Tables of one page partitioned by the record they belong to.
#[derive(Debug, Default, PartialEq)]
pub struct Attribution<'a> {
    /// Tables for the record that was open when the page began.
    pub previous: Vec<&'a PositionedTable>,
    /// Tables for the record whose title appears on this page.
    pub current: Vec<&'a PositionedTable>,
    /// Tables that cross the title line and belong to neither record.
    pub straddling: Vec<&'a PositionedTable>,
}

/// Partition `tables` around the page's title line.
///
/// Without a title every table belongs to the previously open record. With a title, a table
/// whose bottom is at or above the title's offset closes the previous record, and a table whose
/// top is at or below it opens the new one. Each partition is ordered by top coordinate.
pub fn attribute_tables(tables: &[PositionedTable], title_top: Option<f64>) -> Attribution<'_> {
    let mut sorted: Vec<&PositionedTable> = tables.iter().collect();
    sorted.sort_by(|a, b| a.top().total_cmp(&b.top()));

    let Some(title_top) = title_top else {
        return Attribution {
            previous: sorted,
            ..Attribution::default()
        };
    };

    let mut attribution = Attribution::default();
    for table in sorted {
        if table.bottom() <= title_top {
            attribution.previous.push(table);
        } else if table.top() >= title_top {
            attribution.current.push(table);
        } else {
            attribution.straddling.push(table);
        }
    }
    attribution
}
