// Tap/hold/double-tap actions and best-effort service write-back


use crate::config::Cell;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

/// Service-invocation sink supplied by the host.
///
/// Calls are fire-and-forget: any error returned here is logged and
/// dropped by [`dispatch`].
pub trait ServiceSink {
    fn call_service(&self, domain: &str, service: &str, data: &Value, target: &Value) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    Toggle,
    CallService,
    PerformAction,
    MoreInfo,
    Navigate,
    Url,
    /// Also used for unrecognized action names
    #[default]
    #[serde(other)]
    None,
}

/// Action attached to a cell gesture
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionConfig {
    #[serde(default)]
    pub action: ActionKind,
    /// Target entity; defaults to the cell's entity
    #[serde(default)]
    pub entity: Option<String>,
    /// "domain.service" (legacy key)
    #[serde(default)]
    pub service: Option<String>,
    /// "domain.service"
    #[serde(default)]
    pub perform_action: Option<String>,
    #[serde(default)]
    pub service_data: Option<Value>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub target: Option<Value>,
    #[serde(default)]
    pub navigation_path: Option<String>,
    #[serde(default)]
    pub url_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Tap,
    Hold,
    DoubleTap,
}

/// Something only the host can do (open dialogs, change location)
#[derive(Debug, Clone, PartialEq)]
pub enum HostRequest {
    MoreInfo(String),
    Navigate(String),
    OpenUrl(String),
}

/// Action configured for a gesture on a cell, if any
pub fn cell_action(cell: &Cell, gesture: Gesture) -> Option<&ActionConfig> {
    let action = match gesture {
        Gesture::Tap => cell.tap_action.as_ref(),
        Gesture::Hold => cell.hold_action.as_ref(),
        Gesture::DoubleTap => cell.double_tap_action.as_ref(),
    }?;
    (action.action != ActionKind::None).then_some(action)
}

/// Handle a gesture on a cell
pub fn handle_gesture(cell: &Cell, gesture: Gesture, sink: &dyn ServiceSink) -> Option<HostRequest> {
    let action = cell_action(cell, gesture)?;
    dispatch(action, cell.entity_id(), sink)
}

/// Execute an action.
///
/// Service actions go to `sink` and never report failure. Actions the host
/// has to carry out are returned as a [`HostRequest`].
pub fn dispatch(action: &ActionConfig, cell_entity: Option<&str>, sink: &dyn ServiceSink) -> Option<HostRequest> {
    let entity = action
        .entity
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .or(cell_entity);

    match action.action {
        ActionKind::Toggle => {
            let Some(entity) = entity else {
                debug!("Toggle action without entity, ignoring");
                return None;
            };
            call_best_effort(sink, "homeassistant", "toggle", &json!({}), &json!({"entity_id": entity}));
            None
        }
        ActionKind::CallService | ActionKind::PerformAction => {
            let name = action
                .perform_action
                .as_deref()
                .or(action.service.as_deref())
                .unwrap_or("");
            let Some((domain, service)) = name.split_once('.') else {
                debug!(service = %name, "Malformed service name, ignoring");
                return None;
            };
            let data = action
                .data
                .clone()
                .or_else(|| action.service_data.clone())
                .unwrap_or_else(|| json!({}));
            let target = action.target.clone().unwrap_or_else(|| json!({}));
            call_best_effort(sink, domain, service, &data, &target);
            None
        }
        ActionKind::MoreInfo => entity.map(|e| HostRequest::MoreInfo(e.to_string())),
        ActionKind::Navigate => action
            .navigation_path
            .clone()
            .filter(|p| !p.is_empty())
            .map(HostRequest::Navigate),
        ActionKind::Url => action
            .url_path
            .clone()
            .filter(|u| !u.is_empty())
            .map(HostRequest::OpenUrl),
        ActionKind::None => None,
    }
}

fn call_best_effort(sink: &dyn ServiceSink, domain: &str, service: &str, data: &Value, target: &Value) {
    if let Err(e) = sink.call_service(domain, service, data, target) {
        debug!(domain = %domain, service = %service, error = %e, "Service call failed, discarding");
    }
}
