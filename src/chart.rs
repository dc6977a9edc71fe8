//! Terminal bar chart of records per publication year.

use crate::error::Result;
use crate::record::ResultSet;
use std::collections::BTreeMap;
use std::io::Write;

/// Widest bar, in cells
const MAX_BAR_WIDTH: usize = 50;

const BAR_CHAR: char = '█';

/// Record count per year, ascending. Records without a year are skipped.
pub fn year_histogram(records: &ResultSet) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        if !record.year.is_empty() {
            *counts.entry(record.year.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// Render the year histogram of `records` to `out`.
///
/// Returns `Ok(false)` without writing anything when there is no year data.
pub fn plot_years<W: Write>(out: &mut W, title: &str, records: &ResultSet) -> Result<bool> {
    let histogram = year_histogram(records);
    if histogram.is_empty() {
        return Ok(false);
    }
    render_bar_chart(out, title, &histogram)?;
    Ok(true)
}

/// Horizontal bars scaled so the largest count spans [`MAX_BAR_WIDTH`].
pub fn render_bar_chart<W: Write>(
    out: &mut W,
    title: &str,
    counts: &BTreeMap<String, usize>,
) -> Result<()> {
    let max = counts.values().copied().max().unwrap_or(0);
    let label_width = counts.keys().map(|k| k.chars().count()).max().unwrap_or(4);

    writeln!(out, "{}", title)?;
    writeln!(out, "{}", "-".repeat(title.chars().count()))?;

    for (label, &count) in counts {
        let width = bar_width(count, max);
        let bar: String = std::iter::repeat(BAR_CHAR).take(width).collect();
        writeln!(out, "{:>lw$} | {} {}", label, bar, count, lw = label_width)?;
    }

    writeln!(out, "{:>lw$}   Number of articles", "Year", lw = label_width)?;
    out.flush()?;
    Ok(())
}

/// Non-zero counts always get at least one cell.
fn bar_width(count: usize, max: usize) -> usize {
    if count == 0 || max == 0 {
        return 0;
    }
    ((count * MAX_BAR_WIDTH + max / 2) / max).max(1)
}
