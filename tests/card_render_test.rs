// End-to-end tests: card JSON + state snapshot in, formatted/sorted output out

use flexcells::config::{AppConfig, CardConfig, Cell, CellType};
use flexcells::format::{format_cell, DisplayLocale, NumberFormat};
use flexcells::rules::{evaluate, resolve_cell};
use flexcells::sort::sort_rows;
use flexcells::state::{EntityState, StateSnapshot};
use flexcells::view::render_card;
use serde_json::json;
use std::io::Write;

// ── Fixtures ─────────────────────────────────────────────────────────────────

fn snapshot() -> StateSnapshot {
    serde_json::from_value(json!([
        {
            "entity_id": "sensor.energy",
            "state": "1234.5678",
            "attributes": {"unit_of_measurement": "kWh", "friendly_name": "Energy"}
        },
        {
            "entity_id": "light.desk",
            "state": "on",
            "attributes": {"brightness": 255, "items": [{"name": "x"}]}
        },
        {
            "entity_id": "sensor.level",
            "state": "7",
            "attributes": {}
        }
    ]))
    .unwrap()
}

fn card(value: serde_json::Value) -> CardConfig {
    serde_json::from_value(value).unwrap()
}

fn entity_cell(value: serde_json::Value) -> Cell {
    let mut v = value;
    v["type"] = json!("entity");
    serde_json::from_value(v).unwrap()
}

// ── Formatter properties ─────────────────────────────────────────────────────

#[test]
fn test_string_cells_are_verbatim() {
    let states = snapshot();
    for text in ["", "  spaced  ", "1234.5", "<b>", "sensor.energy"] {
        let cell = Cell::text(text);
        assert_eq!(format_cell(&cell, &states, &DisplayLocale::default()).text, text);
    }
}

#[test]
fn test_precision_pins_fraction_digits_per_locale() {
    let states = snapshot();
    let cases = [
        (NumberFormat::CommaDecimal, "1,234.568"),
        (NumberFormat::DecimalComma, "1.234,568"),
        (NumberFormat::None, "1234.568"),
    ];
    for (number_format, expected) in cases {
        let locale = DisplayLocale {
            number_format,
            ..Default::default()
        };
        let cell = entity_cell(json!({"value": "sensor.energy", "precision": 3}));
        let result = format_cell(&cell, &states, &locale);
        assert_eq!(result.text, expected);
        assert_eq!(result.unit, "kWh");
    }
}

#[test]
fn test_rescale_clamps_input() {
    let states = StateSnapshot::new()
        .with(EntityState::new("light.a", "255"))
        .with(EntityState::new("light.b", "0"))
        .with(EntityState::new("light.c", "300"));
    let locale = DisplayLocale::default();

    for (entity, expected) in [("light.a", "100"), ("light.b", "0"), ("light.c", "100")] {
        let cell = entity_cell(json!({
            "value": entity,
            "precision": 0,
            "scale_in_min": 0, "scale_in_max": 255,
            "scale_out_min": 0, "scale_out_max": 100
        }));
        assert_eq!(format_cell(&cell, &states, &locale).text, expected, "{}", entity);
    }
}

#[test]
fn test_attribute_paths() {
    let states = snapshot();
    let locale = DisplayLocale::default();

    let found = entity_cell(json!({"value": "light.desk", "attribute": "items[0].name"}));
    assert_eq!(format_cell(&found, &states, &locale).text, "x");

    let missing = entity_cell(json!({"value": "light.desk", "attribute": "missing.x"}));
    assert_eq!(format_cell(&missing, &states, &locale).full_text(), "n/a");

    let unknown = entity_cell(json!({"value": "sensor.nope"}));
    assert_eq!(format_cell(&unknown, &states, &locale).full_text(), "n/a");
}

#[test]
fn test_format_is_idempotent() {
    let states = snapshot();
    let locale = DisplayLocale::default();
    let cell = entity_cell(json!({
        "value": "sensor.energy",
        "dyn_color": [{"op": ">", "val": 1000, "bg": "red"}]
    }));

    let first = resolve_cell(&cell, &states, &locale);
    let second = resolve_cell(&cell, &states, &locale);
    assert_eq!(first, second);
}

// ── Rule properties ──────────────────────────────────────────────────────────

#[test]
fn test_last_matching_rule_wins() {
    let states = snapshot();
    let cell = entity_cell(json!({
        "value": "sensor.level",
        "dyn_color": [
            {"op": ">", "val": 1, "bg": "red"},
            {"op": ">", "val": 2, "bg": "blue"},
            {"op": ">", "val": 100, "bg": "green"}
        ]
    }));
    let outcome = evaluate(&cell, "7", &states).unwrap();
    assert_eq!(outcome.bg.as_deref(), Some("blue"));
}

#[test]
fn test_between_normalizes_bounds() {
    let states = snapshot();
    let cell = entity_cell(json!({
        "value": "sensor.level",
        "dyn_color": [{"op": "between", "val": "10", "val2": "5", "fg": "orange"}]
    }));
    let outcome = evaluate(&cell, "7", &states).unwrap();
    assert_eq!(outcome.fg.as_deref(), Some("orange"));
}

#[test]
fn test_cell_without_rules_has_no_outcome() {
    let cell = Cell {
        kind: CellType::String,
        ..Cell::text("x")
    };
    assert!(evaluate(&cell, "x", &snapshot()).is_none());
}

// ── Sorter properties ────────────────────────────────────────────────────────

#[test]
fn test_sort_is_stable_across_separators() {
    let config = card(json!({
        "column_count": 2,
        "sort_columns": [2],
        "rows": [
            {"cells": [{"value": "A"}, {"value": "10"}]},
            {"cells": [{"value": "B"}, {"value": "2"}]},
            {"separator": {}},
            {"cells": [{"value": "C"}, {"value": "1"}]}
        ]
    }));
    let order = sort_rows(&config, &snapshot(), &DisplayLocale::default());
    assert_eq!(order, vec![1, 0, 2, 3]);
}

// ── Whole-card rendering ─────────────────────────────────────────────────────

#[test]
fn test_render_card_from_files() {
    let mut card_file = tempfile::NamedTempFile::new().unwrap();
    write!(
        card_file,
        "{}",
        json!({
            "column_count": 2,
            "sort_columns": [1],
            "sort_desc": true,
            "rows": [
                {"cells": [{"value": "Energy"}, {"type": "entity", "value": "sensor.energy", "precision": 1}]},
                {"cells": [{"value": "Desk"}, {"type": "entity", "value": "light.desk",
                    "dyn_color": [{"op": "=", "val": "ON", "overwrite": "text", "text": "lit"}]}]}
            ]
        })
    )
    .unwrap();

    let mut states_file = tempfile::NamedTempFile::new().unwrap();
    write!(
        states_file,
        "{}",
        json!({"sensor.energy": {"entity_id": "sensor.energy", "state": "1234.5678",
            "attributes": {"unit_of_measurement": "kWh"}},
            "light.desk": {"entity_id": "light.desk", "state": "on"}})
    )
    .unwrap();

    let config = CardConfig::load_from_file(card_file.path()).unwrap();
    let states = StateSnapshot::load_from_file(states_file.path()).unwrap();
    let html = render_card(&config, &states, &AppConfig::default());

    let energy = html.find("1,234.6 kWh").unwrap();
    let desk = html.find(">lit<").unwrap();
    assert!(energy < desk, "descending sort puts Energy first: {}", html);
}

#[test]
fn test_render_card_with_template_and_language() {
    let config = card(json!({
        "column_count": 1,
        "custom_template_enabled": true,
        "custom_template_html": "<p>Total <fcc row=\"1\" col=\"1\"/></p>",
        "rows": [{"cells": [{"type": "entity", "value": "sensor.energy", "precision": 2}]}]
    }));
    let mut app = AppConfig::default();
    app.display.language = "de".to_string();

    let html = render_card(&config, &snapshot(), &app);
    assert_eq!(html, "<p>Total <span>1.234,57 kWh</span></p>");
}
