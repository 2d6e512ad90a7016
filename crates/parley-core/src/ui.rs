//! UI flags held by the store. Never persisted.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Main view shown in the window.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ActiveView {
    #[default]
    Chat,
    Sessions,
    Todos,
    Settings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    pub sidebar_expanded: bool,
    pub side_panel_open: bool,
    pub active_view: ActiveView,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            sidebar_expanded: true,
            side_panel_open: false,
            active_view: ActiveView::Chat,
        }
    }
}
