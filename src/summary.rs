//! Descriptive statistics over a result set.
//!
//! Ties are broken by first occurrence: among equally frequent values, the
//! one that appears earliest in the result set wins.

use crate::record::{Record, ResultSet};
use std::collections::HashMap;
use std::fmt;

/// A most-frequent value and how often it occurs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopValue {
    pub value: String,
    pub count: usize,
}

/// Summary of one run's records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Summary {
    /// The result set was empty; nothing was computed
    NoRecords,
    Computed {
        total: usize,
        /// `None` when no record carries a year
        top_year: Option<TopValue>,
        /// `None` when no record carries a publication
        top_publication: Option<TopValue>,
    },
}

/// Compute the top year and top publication.
pub fn summarize(records: &ResultSet) -> Summary {
    if records.is_empty() {
        return Summary::NoRecords;
    }

    Summary::Computed {
        total: records.len(),
        top_year: most_frequent(records, |r| &r.year),
        top_publication: most_frequent(records, |r| &r.publication),
    }
}

/// Most frequent non-empty value of `field`, first occurrence winning ties.
fn most_frequent<F>(records: &ResultSet, field: F) -> Option<TopValue>
where
    F: Fn(&Record) -> &String,
{
    // counts in first-seen order
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        let value = field(record).trim();
        if value.is_empty() {
            continue;
        }
        match index.get(value) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(value, counts.len());
                counts.push((value, 1));
            }
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (value, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((value, count));
        }
    }

    best.map(|(value, count)| TopValue {
        value: value.to_string(),
        count,
    })
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Summary::NoRecords => write!(f, "No records found for your query."),
            Summary::Computed {
                total,
                top_year,
                top_publication,
            } => {
                writeln!(f, "Total records: {}", total)?;
                match top_year {
                    Some(top) => writeln!(
                        f,
                        "Most common publication year: {} ({} articles)",
                        top.value, top.count
                    )?,
                    None => writeln!(f, "Most common publication year: n/a (no year data)")?,
                }
                match top_publication {
                    Some(top) => write!(
                        f,
                        "Most common journal: {} ({} articles)",
                        top.value, top.count
                    ),
                    None => write!(f, "Most common journal: n/a (no journal data)"),
                }
            }
        }
    }
}
