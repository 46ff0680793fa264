use super::{CellView, DataRowView, TableView, ViewRow};
use crate::config::{Align, CardConfig, CellPadding, CellStyle, SeparatorStyle};
use serde_json::Value;
use std::fmt::Write;

/// Escape text for HTML element content and attribute values
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the table view as HTML markup.
pub fn render_html(view: &TableView, config: &CardConfig) -> String {
    let mut out = String::new();

    let mut card_css = Vec::new();
    if let Some(padding) = config.card_padding.as_ref().and_then(css_length) {
        card_css.push(format!("padding:{}", padding));
    }
    if let Some(size) = config.text_size.as_deref().filter(|s| !s.is_empty()) {
        card_css.push(format!("font-size:{}", size));
    }
    if config.overflow_x {
        card_css.push("overflow-x:auto".to_string());
    }
    let _ = write!(out, "<div class=\"flex-cells-card\"{}>", style_attr(&card_css));

    let table_class = if view.zebra { "fcc-table zebra" } else { "fcc-table" };
    let _ = write!(out, "<table class=\"{}\">", table_class);

    out.push_str("<colgroup>");
    for column in view.columns.iter().filter(|c| !c.hidden) {
        match &column.width {
            Some(width) => {
                let _ = write!(out, "<col style=\"width:{}\">", escape_html(width));
            }
            None => out.push_str("<col>"),
        }
    }
    out.push_str("</colgroup>");

    let padding = config.cell_padding.as_ref().map(padding_css);
    let mut body = String::new();
    let mut head = String::new();
    for row in &view.rows {
        match row {
            ViewRow::Separator(sep) => render_separator(&mut body, sep, view.visible_columns()),
            ViewRow::Data(data) if data.header => render_row(&mut head, data, view, padding.as_deref(), "th"),
            ViewRow::Data(data) => render_row(&mut body, data, view, padding.as_deref(), "td"),
        }
    }
    if !head.is_empty() {
        let _ = write!(out, "<thead>{}</thead>", head);
    }
    let _ = write!(out, "<tbody>{}</tbody></table></div>", body);
    out
}

fn render_row(out: &mut String, row: &DataRowView, view: &TableView, padding: Option<&str>, tag: &str) {
    let mut css = Vec::new();
    if let Some(bg) = &row.style.bg {
        css.push(format!("background-color:{}", bg));
    }
    if let Some(fg) = &row.style.fg {
        css.push(format!("color:{}", fg));
    }
    if let Some(visibility) = row.style.visibility {
        css.push(format!("visibility:{}", visibility.as_str()));
    }
    let _ = write!(out, "<tr data-row=\"{}\"{}>", row.index + 1, style_attr(&css));

    if row.merged {
        if let Some(cell) = row.cells.first() {
            let span = format!(" colspan=\"{}\"", view.visible_columns().max(1));
            render_cell(out, cell, padding, tag, &span);
        }
    } else {
        for (cell, column) in row.cells.iter().zip(&view.columns) {
            if !column.hidden {
                render_cell(out, cell, padding, tag, "");
            }
        }
    }
    out.push_str("</tr>");
}

fn render_cell(out: &mut String, cell: &CellView, padding: Option<&str>, tag: &str, extra: &str) {
    let mut css = vec![format!("text-align:{}", cell.align.as_str())];
    if let Some(padding) = padding {
        css.push(padding.to_string());
    }
    let class = if cell.interactive { "fcc-cell clickable" } else { "fcc-cell" };
    let _ = write!(
        out,
        "<{tag} class=\"{class}\"{extra}{style}>{content}</{tag}>",
        tag = tag,
        class = class,
        extra = extra,
        style = style_attr(&css),
        content = cell_content(cell, ""),
    );
}

/// Inner markup of a cell: a styled span with optional icon and text.
pub(super) fn cell_content(cell: &CellView, extra_style: &str) -> String {
    let mut css = cell.style.as_ref().map(cell_style_css).unwrap_or_default();
    if let Some(bg) = &cell.bg {
        css.push(format!("background-color:{}", bg));
    }
    if let Some(fg) = &cell.fg {
        css.push(format!("color:{}", fg));
    }
    if let Some(visibility) = cell.visibility {
        css.push(format!("visibility:{}", visibility.as_str()));
    }
    let extra_style = extra_style.trim().trim_end_matches(';');
    if !extra_style.is_empty() {
        css.push(extra_style.to_string());
    }

    let mut inner = String::new();
    if let Some(icon) = &cell.icon {
        let _ = write!(inner, "<ha-icon icon=\"{}\"></ha-icon>", escape_html(icon));
    }
    if cell.show_text {
        if !inner.is_empty() && !cell.text.is_empty() {
            inner.push(' ');
        }
        inner.push_str(&escape_html(&cell.text));
    }
    format!("<span{}>{}</span>", style_attr(&css), inner)
}

fn render_separator(out: &mut String, sep: &SeparatorStyle, colspan: usize) {
    let color = sep.color.as_deref().unwrap_or("var(--divider-color)");
    let width = sep.length.as_deref().filter(|l| !l.is_empty()).unwrap_or("100%");
    let (margin_left, margin_right) = match sep.align {
        Align::Left => ("0", "auto"),
        Align::Center => ("auto", "auto"),
        Align::Right => ("auto", "0"),
    };
    let css = vec![
        "border:none".to_string(),
        format!("border-top:{}px {} {}", sep.thickness, sep.style, color),
        format!("width:{}", width),
        format!("opacity:{}", sep.opacity.clamp(0.0, 1.0)),
        format!(
            "margin:{}px {} {}px {}",
            sep.margin_top, margin_right, sep.margin_bottom, margin_left
        ),
    ];
    let _ = write!(
        out,
        "<tr class=\"fcc-separator\"><td colspan=\"{}\"><hr{}></td></tr>",
        colspan.max(1),
        style_attr(&css)
    );
}

fn cell_style_css(style: &CellStyle) -> Vec<String> {
    let mut css = Vec::new();
    if let Some(color) = style.color.as_deref().filter(|c| !c.is_empty()) {
        css.push(format!("color:{}", color));
    }
    if let Some(background) = style.background.as_deref().filter(|b| !b.is_empty()) {
        css.push(format!("background-color:{}", background));
    }
    if style.bold {
        css.push("font-weight:bold".to_string());
    }
    if style.italic {
        css.push("font-style:italic".to_string());
    }
    let decorations: Vec<&str> = [(style.underline, "underline"), (style.strike, "line-through")]
        .iter()
        .filter(|(on, _)| *on)
        .map(|(_, d)| *d)
        .collect();
    if !decorations.is_empty() {
        css.push(format!("text-decoration:{}", decorations.join(" ")));
    }
    if let Some(size) = style.font_size.as_deref().filter(|s| !s.is_empty()) {
        css.push(format!("font-size:{}", size));
    }
    if let Some(spacing) = style.letter_spacing.as_deref().filter(|s| !s.is_empty()) {
        css.push(format!("letter-spacing:{}", spacing));
    }
    if let Some(transform) = style.text_transform.as_deref().filter(|t| !t.is_empty()) {
        css.push(format!("text-transform:{}", transform));
    }
    css
}

fn padding_css(padding: &CellPadding) -> String {
    let px = |v: Option<f64>| format!("{}px", v.unwrap_or(4.0));
    format!(
        "padding:{} {} {} {}",
        px(padding.top),
        px(padding.right),
        px(padding.bottom),
        px(padding.left)
    )
}

/// Plain numbers are pixels, strings are passed through
fn css_length(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => n.as_f64().map(|f| format!("{}px", f)),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn style_attr(css: &[String]) -> String {
    if css.is_empty() {
        String::new()
    } else {
        format!(" style=\"{}\"", escape_html(&css.join(";")))
    }
}
