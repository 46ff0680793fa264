use super::*;
use crate::state::{EntityState, StateSnapshot};
use serde_json::json;

fn card(value: serde_json::Value) -> CardConfig {
    serde_json::from_value(value).unwrap()
}

fn states() -> StateSnapshot {
    StateSnapshot::new()
        .with(
            EntityState::new("sensor.power", "1234.5")
                .with_attribute("unit_of_measurement", json!("W"))
                .with_attribute("icon", json!("mdi:flash")),
        )
        .with(EntityState::new("sensor.temp", "21.46").with_attribute("unit_of_measurement", json!("°C")))
}

fn data_rows(view: &TableView) -> Vec<&DataRowView> {
    view.rows
        .iter()
        .filter_map(|r| match r {
            ViewRow::Data(d) => Some(d),
            ViewRow::Separator(_) => None,
        })
        .collect()
}

#[test]
fn test_build_view_formats_and_sorts() {
    let config = card(json!({
        "column_count": 2,
        "sort_columns": [2],
        "rows": [
            {"cells": [{"value": "Power"}, {"type": "entity", "value": "sensor.power", "precision": 0}]},
            {"cells": [{"value": "Temp"}, {"type": "entity", "value": "sensor.temp", "precision": 1}]}
        ]
    }));
    let view = build_view(&config, &states(), &AppConfig::default());
    let rows = data_rows(&view);

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].index, 0);
    assert_eq!(rows[0].cells[1].text, "1,235 W");
    assert_eq!(rows[1].cells[1].text, "21.5 °C");
}

#[test]
fn test_short_rows_are_padded_with_blank_cells() {
    let config = card(json!({
        "column_count": 3,
        "rows": [{"cells": [{"value": "only"}]}]
    }));
    let view = build_view(&config, &StateSnapshot::new(), &AppConfig::default());
    let row = data_rows(&view)[0];

    assert_eq!(row.cells.len(), 3);
    assert_eq!(row.cells[2].text, "");
    assert_eq!(row.cells[2].align, Align::Right);
}

#[test]
fn test_merged_row_has_single_cell() {
    let config = card(json!({
        "column_count": 3,
        "rows": [{"cells": [{"value": "Title"}, {"value": "ignored"}], "merge_columns": true}]
    }));
    let view = build_view(&config, &StateSnapshot::new(), &AppConfig::default());
    let row = data_rows(&view)[0];
    assert!(row.merged);
    assert_eq!(row.cells.len(), 1);

    let html = render_html(&view, &config);
    assert!(html.contains("colspan=\"3\""));
    assert!(!html.contains("ignored"));
}

#[test]
fn test_narrow_viewport_hides_columns() {
    let config = card(json!({
        "column_count": 3,
        "hide_on_narrow": [2],
        "narrow_breakpoint": 500,
        "rows": [{"cells": [{"value": "a"}, {"value": "b"}, {"value": "c"}]}]
    }));
    let mut app = AppConfig::default();
    app.view.viewport_width = Some(400);

    let view = build_view(&config, &StateSnapshot::new(), &app);
    assert_eq!(view.visible_columns(), 2);
    let html = render_html(&view, &config);
    assert!(html.contains(">a<"));
    assert!(!html.contains(">b<"));
    assert!(html.contains(">c<"));

    app.view.viewport_width = Some(800);
    let view = build_view(&config, &StateSnapshot::new(), &app);
    assert_eq!(view.visible_columns(), 3);
}

#[test]
fn test_row_rules_style_the_row() {
    let config = card(json!({
        "column_count": 1,
        "rows": [{
            "cells": [{"value": "x"}],
            "dyn_color": [{"entity": "sensor.temp", "op": ">", "val": 20, "bg": "#f00", "overwrite": "text", "text": "nope"}]
        }]
    }));
    let view = build_view(&config, &states(), &AppConfig::default());
    let row = data_rows(&view)[0];
    assert_eq!(row.style.bg.as_deref(), Some("#f00"));
    assert_eq!(row.cells[0].text, "x");

    let html = render_html(&view, &config);
    assert!(html.contains("<tr data-row=\"1\" style=\"background-color:#f00\">"));
}

#[test]
fn test_icon_display_hides_text() {
    let config = card(json!({
        "column_count": 2,
        "rows": [{"cells": [
            {"type": "entity", "value": "sensor.power", "entity_display": "icon"},
            {"type": "icon", "value": "mdi:home"}
        ]}]
    }));
    let view = build_view(&config, &states(), &AppConfig::default());
    let row = data_rows(&view)[0];

    assert_eq!(row.cells[0].icon.as_deref(), Some("mdi:flash"));
    assert!(!row.cells[0].show_text);
    assert!(!row.cells[1].show_text);

    let html = render_html(&view, &config);
    assert!(html.contains("<ha-icon icon=\"mdi:flash\"></ha-icon>"));
    assert!(html.contains("<ha-icon icon=\"mdi:home\"></ha-icon>"));
    assert!(!html.contains("1,234.5"));
}

#[test]
fn test_header_and_separator_markup() {
    let config = card(json!({
        "column_count": 2,
        "header_from_first_row": true,
        "zebra": true,
        "column_widths": ["40%", ""],
        "rows": [
            {"cells": [{"value": "Name"}, {"value": "Value"}]},
            {"separator": {"style": "dashed", "thickness": 2, "color": "red", "length": "50%"}},
            {"cells": [{"value": "a"}, {"value": "b"}]}
        ]
    }));
    let html = render_html(
        &build_view(&config, &StateSnapshot::new(), &AppConfig::default()),
        &config,
    );

    assert!(html.contains("<table class=\"fcc-table zebra\">"));
    assert!(html.contains("<colgroup><col style=\"width:40%\"><col></colgroup>"));
    assert!(html.contains("<thead><tr data-row=\"1\"><th"));
    assert!(html.contains("<td colspan=\"2\"><hr style=\"border:none;border-top:2px dashed red;width:50%"));
}

#[test]
fn test_text_is_escaped() {
    let config = card(json!({
        "column_count": 1,
        "rows": [{"cells": [{"value": "<b>\"x\" & y</b>"}]}]
    }));
    let html = render_html(
        &build_view(&config, &StateSnapshot::new(), &AppConfig::default()),
        &config,
    );
    assert!(html.contains("&lt;b&gt;&quot;x&quot; &amp; y&lt;/b&gt;"));
    assert!(!html.contains("<b>"));
}

#[test]
fn test_cell_style_and_padding_css() {
    let config = card(json!({
        "column_count": 1,
        "card_padding": 12,
        "text_size": "14px",
        "cell_padding": {"top": 2, "left": "6"},
        "rows": [{"cells": [{"value": "s", "align": "center",
            "style": {"bold": true, "underline": true, "strike": true, "color": "blue"}}]}]
    }));
    let html = render_html(
        &build_view(&config, &StateSnapshot::new(), &AppConfig::default()),
        &config,
    );
    assert!(html.contains("<div class=\"flex-cells-card\" style=\"padding:12px;font-size:14px\">"));
    assert!(html.contains("text-align:center;padding:2px 4px 4px 6px"));
    assert!(html.contains("color:blue;font-weight:bold;text-decoration:underline line-through"));
}

#[test]
fn test_rule_colors_apply_to_cell() {
    let config = card(json!({
        "column_count": 1,
        "rows": [{"cells": [{"type": "entity", "value": "sensor.temp",
            "dyn_color": [{"op": ">", "val": 20, "fg": "orange"}]}]}]
    }));
    let view = build_view(&config, &states(), &AppConfig::default());
    assert_eq!(data_rows(&view)[0].cells[0].fg.as_deref(), Some("orange"));
}

#[test]
fn test_interactive_cells_are_marked() {
    let config = card(json!({
        "column_count": 2,
        "rows": [{"cells": [
            {"type": "entity", "value": "sensor.power", "tap_action": {"action": "more-info"}},
            {"type": "entity", "value": "sensor.temp", "tap_action": {"action": "none"}}
        ]}]
    }));
    let view = build_view(&config, &states(), &AppConfig::default());
    let row = data_rows(&view)[0];
    assert!(row.cells[0].interactive);
    assert!(!row.cells[1].interactive);
}

#[test]
fn test_parse_fcc_tag() {
    assert_eq!(
        parse_fcc_tag(r#"<fcc row="2" col="1" style="color:red"/>"#),
        Some(FccTag {
            row: 2,
            col: 1,
            style: "color:red".to_string()
        })
    );
    assert_eq!(
        parse_fcc_tag("<FCC col='3' row=1 />").map(|t| (t.row, t.col)),
        Some((1, 3))
    );
    assert_eq!(parse_fcc_tag(r#"<fcc row="0" col="1"/>"#), None);
    assert_eq!(parse_fcc_tag(r#"<fcc row="1" col="x"/>"#), None);
    assert_eq!(parse_fcc_tag(r#"<fcc row="1"/>"#), None);
    assert_eq!(parse_fcc_tag(r#"<fcc row="1 col="2"/>"#), None);
}

#[test]
fn test_template_substitutes_cells() {
    let config = card(json!({
        "column_count": 2,
        "custom_template_enabled": true,
        "custom_template_html": r#"<div>Power: <fcc row="1" col="2" style="font-weight:bold"/> | <fcc row="0" col="1"/> | <fcc row="1" col="two"/></div>"#,
        "rows": [{"cells": [{"value": "Power"}, {"type": "entity", "value": "sensor.power", "precision": 0}]}]
    }));
    let html = render_card(&config, &states(), &AppConfig::default());

    assert_eq!(
        html,
        r#"<div>Power: <span style="font-weight:bold">1,235 W</span> | <fcc row="0" col="1"/> | <fcc row="1" col="two"/></div>"#
    );
}

#[test]
fn test_template_out_of_range_renders_blank() {
    let html = render_template(r#"a<fcc row="9" col="9"/>b<fccx>"#, |_, _| CellView::default());
    assert_eq!(html, "a<span></span>b<fccx>");
}

#[test]
fn test_template_unterminated_tag_is_literal() {
    let html = render_template(r#"x <fcc row="1" col="1""#, |_, _| CellView {
        text: "v".to_string(),
        show_text: true,
        ..Default::default()
    });
    assert_eq!(html, r#"x <fcc row="1" col="1""#);
}

#[test]
fn test_render_card_without_template_uses_table() {
    let config = card(json!({
        "column_count": 1,
        "custom_template_enabled": true,
        "custom_template_html": "   ",
        "rows": [{"cells": [{"value": "t"}]}]
    }));
    let html = render_card(&config, &StateSnapshot::new(), &AppConfig::default());
    assert!(html.starts_with("<div class=\"flex-cells-card\">"));
}
