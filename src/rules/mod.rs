// Rule Evaluator: ordered conditional styling and overwrite rules


use crate::config::{Cell, CellType};
use crate::format::{format_cell, DisplayLocale, DisplayResult};
use crate::state::StateProvider;
use crate::value::{coerce_number, display_string};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Comparison operator of a rule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[default]
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "between")]
    Between,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "not_contains")]
    NotContains,
    /// Unrecognized operator; never matches
    #[serde(other)]
    Unknown,
}

/// Legacy source discriminator, used when a rule names no entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSource {
    ThisDisplay,
    ThisState,
    ThisAttr,
    OtherState,
    OtherAttr,
    #[serde(other)]
    Unknown,
}

/// What a matching rule replaces the cell content with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwriteMode {
    Hide,
    Text,
    Icon,
    Entity,
    #[serde(other)]
    None,
}

/// One dynamic styling rule (`dyn_color` entry)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub entity: Option<String>,
    #[serde(default)]
    pub attr: Option<String>,
    #[serde(default)]
    pub src: Option<RuleSource>,
    #[serde(default)]
    pub op: Operator,
    #[serde(default)]
    pub val: Value,
    #[serde(default)]
    pub val2: Option<Value>,
    #[serde(default)]
    pub bg: Option<String>,
    #[serde(default)]
    pub fg: Option<String>,
    /// Only "visible" and "hidden" are honored
    #[serde(default)]
    pub visibility: Option<String>,
    /// Legacy: hide the value, optionally showing `mask` instead
    #[serde(default)]
    pub hide: bool,
    #[serde(default)]
    pub mask: Option<String>,
    #[serde(default)]
    pub overwrite: Option<OverwriteMode>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub overwrite_entity: Option<String>,
    #[serde(default)]
    pub overwrite_attr: Option<String>,
    #[serde(default)]
    pub overwrite_unit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

impl Visibility {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "visible" => Some(Visibility::Visible),
            "hidden" => Some(Visibility::Hidden),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Visibility::Visible => "visible",
            Visibility::Hidden => "hidden",
        }
    }
}

/// Content replacement chosen by the last matching overwrite rule.
///
/// A later mode replaces an earlier one in full; fields are never merged
/// across modes.
#[derive(Debug, Clone, PartialEq)]
pub enum Overwrite {
    Hide,
    Text(String),
    Icon(String),
    Entity {
        entity: String,
        attr: Option<String>,
        unit: Option<String>,
    },
}

/// Accumulated result of evaluating a rule list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleOutcome {
    pub bg: Option<String>,
    pub fg: Option<String>,
    pub hide: bool,
    pub mask: Option<String>,
    pub visibility: Option<Visibility>,
    pub overwrite: Option<Overwrite>,
}

/// Row-level subset of a rule outcome
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowStyle {
    pub bg: Option<String>,
    pub fg: Option<String>,
    pub visibility: Option<Visibility>,
}

/// Evaluate the cell's rules in order.
///
/// Returns `None` when the cell has no rules. Every matching rule writes
/// the properties it sets, so the last match wins per property.
pub fn evaluate(
    cell: &Cell,
    display_text: &str,
    states: &dyn StateProvider,
) -> Option<RuleOutcome> {
    if cell.dyn_color.is_empty() {
        return None;
    }

    let mut outcome = RuleOutcome::default();
    for (idx, rule) in cell.dyn_color.iter().enumerate() {
        let Some(source) = source_value(rule, cell, display_text, states) else {
            debug!(rule = idx, "Rule source did not resolve, skipping");
            continue;
        };
        if rule_matches(rule, &source) {
            apply_rule(rule, &mut outcome);
        }
    }
    Some(outcome)
}

/// Evaluate row-level rules; only bg, fg and visibility propagate.
pub fn evaluate_row(rules: &[Rule], states: &dyn StateProvider) -> Option<RowStyle> {
    let synthetic = Cell {
        dyn_color: rules.to_vec(),
        ..Cell::default()
    };
    evaluate(&synthetic, "", states).map(|outcome| RowStyle {
        bg: outcome.bg,
        fg: outcome.fg,
        visibility: outcome.visibility,
    })
}

fn source_value(
    rule: &Rule,
    cell: &Cell,
    display_text: &str,
    states: &dyn StateProvider,
) -> Option<Value> {
    if let Some(entity) = non_empty(&rule.entity) {
        return states.resolve(entity, non_empty(&rule.attr));
    }

    match rule.src {
        Some(RuleSource::ThisState) => states.resolve(cell.entity_id()?, None),
        Some(RuleSource::ThisAttr) => {
            let attr = non_empty(&rule.attr).or_else(|| cell.attribute_path());
            states.resolve(cell.entity_id()?, attr)
        }
        // Other-entity sources need an explicit entity
        Some(RuleSource::OtherState) | Some(RuleSource::OtherAttr) => None,
        Some(RuleSource::ThisDisplay) | Some(RuleSource::Unknown) | None => {
            Some(Value::String(display_text.to_string()))
        }
    }
}

/// Test one rule against a resolved source value.
pub fn rule_matches(rule: &Rule, source: &Value) -> bool {
    match rule.op {
        Operator::Gt => compare_numeric(source, &rule.val, |a, b| a > b),
        Operator::Ge => compare_numeric(source, &rule.val, |a, b| a >= b),
        Operator::Lt => compare_numeric(source, &rule.val, |a, b| a < b),
        Operator::Le => compare_numeric(source, &rule.val, |a, b| a <= b),
        Operator::Between => {
            let bounds = rule.val2.as_ref().and_then(coerce_number);
            match (coerce_number(source), coerce_number(&rule.val), bounds) {
                (Some(x), Some(a), Some(b)) => a.min(b) <= x && x <= a.max(b),
                _ => false,
            }
        }
        Operator::Contains => contains(source, &rule.val),
        Operator::NotContains => !contains(source, &rule.val),
        Operator::Eq => loosely_equal(source, &rule.val),
        Operator::Ne => !loosely_equal(source, &rule.val),
        Operator::Unknown => false,
    }
}

fn compare_numeric<F>(source: &Value, val: &Value, cmp: F) -> bool
where
    F: Fn(f64, f64) -> bool,
{
    match (coerce_number(source), coerce_number(val)) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

fn contains(source: &Value, val: &Value) -> bool {
    lower_text(source).contains(&lower_text(val))
}

fn loosely_equal(source: &Value, val: &Value) -> bool {
    match (coerce_number(source), coerce_number(val)) {
        (Some(a), Some(b)) => a == b,
        _ => lower_text(source) == lower_text(val),
    }
}

fn lower_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => display_string(other).to_lowercase(),
    }
}

fn apply_rule(rule: &Rule, outcome: &mut RuleOutcome) {
    if let Some(bg) = non_empty(&rule.bg) {
        outcome.bg = Some(bg.to_string());
    }
    if let Some(fg) = non_empty(&rule.fg) {
        outcome.fg = Some(fg.to_string());
    }
    if let Some(visibility) = rule.visibility.as_deref().and_then(Visibility::parse) {
        outcome.visibility = Some(visibility);
    }

    match rule.overwrite {
        Some(mode) if mode != OverwriteMode::None => {
            let overwrite = match mode {
                OverwriteMode::Text => Overwrite::Text(rule.text.clone().unwrap_or_default()),
                OverwriteMode::Icon => Overwrite::Icon(rule.icon.clone().unwrap_or_default()),
                OverwriteMode::Entity => Overwrite::Entity {
                    entity: rule.overwrite_entity.clone().unwrap_or_default(),
                    attr: non_empty(&rule.overwrite_attr).map(str::to_string),
                    unit: rule.overwrite_unit.clone(),
                },
                _ => Overwrite::Hide,
            };
            outcome.hide = true;
            outcome.mask = match overwrite {
                Overwrite::Hide => rule.mask.clone(),
                _ => None,
            };
            outcome.overwrite = Some(overwrite);
        }
        _ => {
            if rule.hide {
                outcome.hide = true;
            }
            if let Some(mask) = &rule.mask {
                outcome.mask = Some(mask.clone());
            }
        }
    }
}

impl RuleOutcome {
    /// Display content after applying the overwrite decision.
    ///
    /// Entity overwrites reformat the other entity with the cell's
    /// formatting options; a hidden value shows its mask (or nothing).
    pub fn effective_display(
        &self,
        cell: &Cell,
        base: &DisplayResult,
        states: &dyn StateProvider,
        locale: &DisplayLocale,
    ) -> DisplayResult {
        match &self.overwrite {
            Some(Overwrite::Text(text)) => DisplayResult::plain(text.clone()),
            Some(Overwrite::Icon(icon)) => DisplayResult {
                text: icon.clone(),
                unit: String::new(),
                icon: Some(icon.clone()).filter(|i| !i.is_empty()),
            },
            Some(Overwrite::Entity { entity, attr, unit }) => {
                let other = Cell {
                    kind: CellType::Entity,
                    value: entity.clone(),
                    attribute: attr.clone(),
                    unit: unit.clone(),
                    use_entity_unit: unit.as_ref().map(|_| false),
                    dyn_color: Vec::new(),
                    ..cell.clone()
                };
                format_cell(&other, states, locale)
            }
            Some(Overwrite::Hide) => DisplayResult::plain(self.mask.clone().unwrap_or_default()),
            None if self.hide => DisplayResult::plain(self.mask.clone().unwrap_or_default()),
            None => base.clone(),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// A cell's formatted value together with its rule decisions
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCell {
    /// Formatter output before rules
    pub base: DisplayResult,
    pub outcome: Option<RuleOutcome>,
    /// What is actually shown after overwrite rules
    pub display: DisplayResult,
}

/// Format a cell and run its rules against the formatted text.
pub fn resolve_cell(cell: &Cell, states: &dyn StateProvider, locale: &DisplayLocale) -> ResolvedCell {
    let base = format_cell(cell, states, locale);
    let outcome = evaluate(cell, &base.full_text(), states);
    let display = match &outcome {
        Some(outcome) => outcome.effective_display(cell, &base, states, locale),
        None => base.clone(),
    };
    ResolvedCell {
        base,
        outcome,
        display,
    }
}
