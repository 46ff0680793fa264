use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Live state of one entity as supplied by the host
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EntityState {
    /// Entity identifier (e.g., "sensor.living_room_temperature")
    #[serde(default)]
    pub entity_id: String,

    /// Raw state string
    #[serde(default, deserialize_with = "state_string")]
    pub state: String,

    /// Attribute tree (arbitrary JSON)
    #[serde(default)]
    pub attributes: Map<String, Value>,

    /// When the state string last changed
    #[serde(default)]
    pub last_changed: Option<DateTime<Utc>>,

    /// When the state or any attribute last changed
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,

    /// Opaque host context
    #[serde(default)]
    pub context: Value,
}

impl EntityState {
    /// Build a state with the given id and state string, no attributes
    pub fn new(entity_id: &str, state: &str) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            state: state.to_string(),
            ..Default::default()
        }
    }

    /// Add an attribute (builder style)
    pub fn with_attribute(mut self, key: &str, value: Value) -> Self {
        self.attributes.insert(key.to_string(), value);
        self
    }

    /// Attribute lookup by top-level key
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Flattened view that attribute paths are resolved against.
    ///
    /// Attributes are spread at the top level; the fixed keys
    /// (`attributes`, `entity_id`, `state`, `last_changed`, `last_updated`,
    /// `context`) are written last and win over same-named attributes.
    pub fn merged_view(&self) -> Value {
        let mut view = self.attributes.clone();
        view.insert("attributes".to_string(), Value::Object(self.attributes.clone()));
        view.insert("entity_id".to_string(), Value::String(self.entity_id.clone()));
        view.insert("state".to_string(), Value::String(self.state.clone()));
        view.insert("last_changed".to_string(), timestamp_value(self.last_changed));
        view.insert("last_updated".to_string(), timestamp_value(self.last_updated));
        view.insert("context".to_string(), self.context.clone());
        Value::Object(view)
    }
}

fn timestamp_value(ts: Option<DateTime<Utc>>) -> Value {
    ts.map(|t| Value::String(t.to_rfc3339()))
        .unwrap_or(Value::Null)
}

/// Hosts occasionally send numeric or boolean states; keep them as text.
fn state_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => crate::value::display_string(&other),
    })
}
