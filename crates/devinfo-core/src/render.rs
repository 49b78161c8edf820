//! Text views of the binder states. Pure functions of the state.

use serde_json::Value;

use crate::binder::{ConnectionState, DeveloperState};

pub const CONNECTED_LABEL: &str = "✅ Successfully Connected";
pub const NOT_CONNECTED_LABEL: &str = "❌ Not Connected";
pub const LOADING_LABEL: &str = "Loading...";
pub const ACTIVITIES_HEADING: &str = "Activities:";
pub const ASSETS_HEADING: &str = "Assets:";

/// Two-space indented JSON.
pub fn pretty_dump(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusView {
    NotConnected,
    Connected { dump: String },
}

impl StatusView {
    pub fn from_state(state: &ConnectionState) -> Self {
        match state.connection_status() {
            Some(value) => StatusView::Connected {
                dump: pretty_dump(value),
            },
            None => StatusView::NotConnected,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, StatusView::Connected { .. })
    }

    pub fn lines(&self) -> Vec<String> {
        match self {
            StatusView::NotConnected => vec![NOT_CONNECTED_LABEL.to_string()],
            StatusView::Connected { dump } => {
                let mut lines = vec![CONNECTED_LABEL.to_string()];
                lines.extend(dump.lines().map(str::to_string));
                lines
            }
        }
    }
}

pub fn render_status(state: &ConnectionState) -> String {
    StatusView::from_state(state).lines().join("\n")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeveloperView {
    Loading,
    NotConnected,
    Loaded { activities: String, assets: String },
}

impl DeveloperView {
    pub fn from_state(state: &DeveloperState) -> Self {
        match state {
            DeveloperState::Pending => DeveloperView::Loading,
            DeveloperState::Failed => DeveloperView::NotConnected,
            DeveloperState::Ready(data) => DeveloperView::Loaded {
                activities: pretty_dump(&data.activities),
                assets: pretty_dump(&data.assets),
            },
        }
    }

    pub fn lines(&self) -> Vec<String> {
        match self {
            DeveloperView::Loading => vec![LOADING_LABEL.to_string()],
            DeveloperView::NotConnected => vec![NOT_CONNECTED_LABEL.to_string()],
            DeveloperView::Loaded { activities, assets } => {
                let mut lines = vec![ACTIVITIES_HEADING.to_string()];
                lines.extend(activities.lines().map(str::to_string));
                lines.push(ASSETS_HEADING.to_string());
                lines.extend(assets.lines().map(str::to_string));
                lines
            }
        }
    }
}

pub fn render_developer(state: &DeveloperState) -> String {
    DeveloperView::from_state(state).lines().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::{DeveloperData, MountState};
    use serde_json::json;

    fn dump_section(rendered: &str) -> String {
        rendered.lines().skip(1).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn connected_render_shows_indicator_and_dump() {
        let state = MountState::Ready(json!({"ok": true}));
        let rendered = render_status(&state);
        assert!(rendered.starts_with("✅ Successfully Connected\n"));
        assert!(rendered.contains("\"ok\": true"));
    }

    #[test]
    fn not_connected_render_is_exactly_the_indicator() {
        assert_eq!(render_status(&MountState::Failed), "❌ Not Connected");
        assert_eq!(render_status(&MountState::Pending), "❌ Not Connected");
    }

    #[test]
    fn null_payload_still_counts_as_connected() {
        let rendered = render_status(&MountState::Ready(Value::Null));
        assert_eq!(rendered, "✅ Successfully Connected\nnull");
    }

    #[test]
    fn dump_parses_back_to_the_stored_value() {
        let value = json!({
            "application": {"name": "UNKNOWN", "version": "0.0.1"},
            "health": {"os": {"id": "1", "version": "10.1.2"}},
            "ports": [1000, 39300],
            "beta": null,
            "ratio": 0.5
        });
        let rendered = render_status(&MountState::Ready(value.clone()));
        let parsed: Value = serde_json::from_str(&dump_section(&rendered)).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn nested_structures_use_two_space_indent() {
        let dump = pretty_dump(&json!({"a": {"b": [1]}}));
        assert_eq!(dump, "{\n  \"a\": {\n    \"b\": [\n      1\n    ]\n  }\n}");
    }

    #[test]
    fn render_is_idempotent() {
        let state = MountState::Ready(json!({"user": {"name": "dev"}}));
        assert_eq!(render_status(&state), render_status(&state));
        assert_eq!(
            StatusView::from_state(&state),
            StatusView::from_state(&state)
        );
    }

    #[test]
    fn developer_view_follows_mount_state() {
        assert_eq!(render_developer(&MountState::Pending), "Loading...");
        assert_eq!(render_developer(&MountState::Failed), "❌ Not Connected");

        let data = DeveloperData {
            connection: json!({"ok": true}),
            assets: json!({"iterable": []}),
            activities: json!({"iterable": [{"event": "copied"}]}),
        };
        let rendered = render_developer(&MountState::Ready(data));
        let activities_at = rendered.find("Activities:").unwrap();
        let assets_at = rendered.find("Assets:").unwrap();
        assert!(activities_at < assets_at);
        assert!(rendered.contains("\"event\": \"copied\""));
        assert!(rendered.contains("\"iterable\": []"));
    }
}
