// Table view model consumed by the HTML renderer

mod html;
mod template;

#[cfg(test)]
mod tests;

pub use html::{escape_html, render_html};
pub use template::{parse_fcc_tag, render_template, FccTag};

use crate::actions::{cell_action, Gesture};
use crate::config::{Align, AppConfig, CardConfig, CellStyle, CellType, EntityDisplay, RowConfig, SeparatorStyle};
use crate::format::DisplayLocale;
use crate::rules::{evaluate_row, resolve_cell, Overwrite, RowStyle, Visibility};
use crate::sort::sort_rows;
use crate::state::StateProvider;
use tracing::debug;

/// Fully resolved table, rows in display order
#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    pub columns: Vec<ColumnView>,
    pub rows: Vec<ViewRow>,
    pub zebra: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnView {
    pub width: Option<String>,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewRow {
    Separator(SeparatorStyle),
    Data(DataRowView),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataRowView {
    /// Index of the row in the card configuration
    pub index: usize,
    pub header: bool,
    pub merged: bool,
    pub style: RowStyle,
    pub cells: Vec<CellView>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellView {
    /// Text including unit
    pub text: String,
    pub icon: Option<String>,
    /// False when only the icon is shown
    pub show_text: bool,
    pub align: Align,
    pub style: Option<CellStyle>,
    pub bg: Option<String>,
    pub fg: Option<String>,
    pub visibility: Option<Visibility>,
    pub interactive: bool,
}

impl TableView {
    /// Visible column count (for separator colspan)
    pub fn visible_columns(&self) -> usize {
        self.columns.iter().filter(|c| !c.hidden).count()
    }
}

/// Resolve one configured cell for display.
pub fn cell_view(
    config: &CardConfig,
    row: usize,
    col: usize,
    states: &dyn StateProvider,
    locale: &DisplayLocale,
) -> CellView {
    let cell = config.cell(row, col);
    let resolved = resolve_cell(&cell, states, locale);
    let outcome = resolved.outcome.unwrap_or_default();

    let icon_only = match &outcome.overwrite {
        Some(Overwrite::Icon(_)) => true,
        Some(_) => false,
        None if outcome.hide => false,
        None => {
            cell.kind == CellType::Icon
                || (cell.kind == CellType::Entity && cell.entity_display == EntityDisplay::Icon)
        }
    };

    let interactive = [Gesture::Tap, Gesture::Hold, Gesture::DoubleTap]
        .iter()
        .any(|g| cell_action(&cell, *g).is_some());

    CellView {
        text: resolved.display.full_text(),
        icon: resolved.display.icon.clone(),
        show_text: !(icon_only && resolved.display.icon.is_some()),
        align: cell.align,
        style: cell.style.clone(),
        bg: outcome.bg,
        fg: outcome.fg,
        visibility: outcome.visibility,
        interactive,
    }
}

/// Build the table view for one render pass.
pub fn build_view(config: &CardConfig, states: &dyn StateProvider, app: &AppConfig) -> TableView {
    let locale = app.display.locale();
    let hidden = config.hidden_columns(app.view.viewport_width);
    let columns = (0..config.column_count)
        .map(|col| ColumnView {
            width: config
                .column_widths
                .get(col)
                .filter(|w| !w.trim().is_empty())
                .cloned(),
            hidden: hidden[col],
        })
        .collect();

    let order = sort_rows(config, states, &locale);
    let rows = order
        .into_iter()
        .map(|idx| match &config.rows[idx] {
            RowConfig::Separator(sep) => ViewRow::Separator(sep.separator.clone()),
            RowConfig::Data(data) => {
                let cell_count = if data.merge_columns { 1 } else { config.column_count };
                let cells = (0..cell_count)
                    .map(|col| cell_view(config, idx, col, states, &locale))
                    .collect();
                ViewRow::Data(DataRowView {
                    index: idx,
                    header: config.header_from_first_row && idx == 0,
                    merged: data.merge_columns,
                    style: evaluate_row(&data.dyn_color, states).unwrap_or_default(),
                    cells,
                })
            }
        })
        .collect();

    debug!(rows = config.rows.len(), columns = config.column_count, "Built table view");

    TableView {
        columns,
        rows,
        zebra: config.zebra,
    }
}

/// Render the card: custom template when enabled, table markup otherwise.
pub fn render_card(config: &CardConfig, states: &dyn StateProvider, app: &AppConfig) -> String {
    match config.custom_template_html.as_deref() {
        Some(html) if config.custom_template_enabled && !html.trim().is_empty() => {
            let locale = app.display.locale();
            render_template(html, |row, col| cell_view(config, row, col, states, &locale))
        }
        _ => render_html(&build_view(config, states, app), config),
    }
}
