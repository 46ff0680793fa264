// Row Sorter: stable ordering within separator-delimited segments

mod collate;


pub use collate::TextCollator;

use crate::config::{CardConfig, RowConfig};
use crate::format::DisplayLocale;
use crate::rules::resolve_cell;
use crate::state::StateProvider;
use std::cmp::Ordering;

/// Comparable key for one (row, column)
#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub folded: String,
    pub original: String,
    /// Placeholder for a secondary entity context; currently the folded text
    pub secondary: String,
}

impl SortKey {
    pub fn new(text: &str) -> Self {
        let folded = text.to_lowercase();
        Self {
            secondary: folded.clone(),
            folded,
            original: text.to_string(),
        }
    }

    /// Folded text first, then original case, then the secondary slot
    pub fn compare(&self, other: &Self, collator: &TextCollator) -> Ordering {
        collator
            .compare(&self.folded, &other.folded)
            .then_with(|| collator.compare(&self.original, &other.original))
            .then_with(|| collator.compare(&self.secondary, &other.secondary))
    }
}

/// Sort key for a cell: its displayed text after overwrite rules.
///
/// Merged rows only contribute their first cell; the remaining columns
/// compare as blank.
pub fn cell_sort_key(
    config: &CardConfig,
    row: usize,
    col: usize,
    states: &dyn StateProvider,
    locale: &DisplayLocale,
) -> SortKey {
    let merged = config
        .rows
        .get(row)
        .and_then(RowConfig::as_data)
        .map_or(false, |data| data.merge_columns);
    if merged && col > 0 {
        return SortKey::new("");
    }
    let cell = config.cell(row, col);
    let resolved = resolve_cell(&cell, states, locale);
    SortKey::new(&resolved.display.full_text())
}

/// Compute the display order of the card's rows.
///
/// Returns a permutation of row indices. Separator rows keep their
/// position; each run of data rows between separators is sorted on its
/// own. A header row (`header_from_first_row`) stays first. Ties keep
/// their original relative order, and `sort_desc` flips every column.
pub fn sort_rows(config: &CardConfig, states: &dyn StateProvider, locale: &DisplayLocale) -> Vec<usize> {
    let columns = config.sort_column_indices();
    let mut order: Vec<usize> = (0..config.rows.len()).collect();
    if columns.is_empty() {
        return order;
    }

    let collator = TextCollator::new(&locale.language);
    let start = usize::from(config.header_from_first_row).min(order.len());
    let mut segment_start = start;
    for idx in start..=config.rows.len() {
        let at_boundary = idx == config.rows.len() || config.rows[idx].is_separator();
        if !at_boundary {
            continue;
        }
        sort_segment(
            &mut order[segment_start..idx],
            config,
            &columns,
            &collator,
            states,
            locale,
        );
        segment_start = idx + 1;
    }
    order
}

fn sort_segment(
    segment: &mut [usize],
    config: &CardConfig,
    columns: &[usize],
    collator: &TextCollator,
    states: &dyn StateProvider,
    locale: &DisplayLocale,
) {
    if segment.len() < 2 {
        return;
    }

    let mut keyed: Vec<(usize, Vec<SortKey>)> = segment
        .iter()
        .map(|&row| {
            let keys = columns
                .iter()
                .map(|&col| cell_sort_key(config, row, col, states, locale))
                .collect();
            (row, keys)
        })
        .collect();

    keyed.sort_by(|(row_a, keys_a), (row_b, keys_b)| {
        let ord = keys_a
            .iter()
            .zip(keys_b)
            .map(|(a, b)| a.compare(b, collator))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal);
        let ord = if config.sort_desc { ord.reverse() } else { ord };
        ord.then_with(|| row_a.cmp(row_b))
    });

    for (slot, (row, _)) in segment.iter_mut().zip(keyed) {
        *slot = row;
    }
}
