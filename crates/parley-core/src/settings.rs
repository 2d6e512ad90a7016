//! User settings domain model.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Persisted user settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub stream_responses: bool,
    pub auto_save: bool,
    pub sound_notifications: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            stream_responses: true,
            auto_save: true,
            sound_notifications: false,
        }
    }
}

impl Settings {
    /// Shallow-merges `patch` into these settings.
    ///
    /// Returns `true` if any field changed.
    pub fn apply(&mut self, patch: SettingsPatch) -> bool {
        let before = self.clone();
        if let Some(model) = patch.model {
            self.model = model;
        }
        if let Some(temperature) = patch.temperature {
            self.temperature = temperature;
        }
        if let Some(max_tokens) = patch.max_tokens {
            self.max_tokens = max_tokens;
        }
        if let Some(stream_responses) = patch.stream_responses {
            self.stream_responses = stream_responses;
        }
        if let Some(auto_save) = patch.auto_save {
            self.auto_save = auto_save;
        }
        if let Some(sound_notifications) = patch.sound_notifications {
            self.sound_notifications = sound_notifications;
        }
        *self != before
    }
}

/// Partial settings update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub stream_responses: Option<bool>,
    pub auto_save: Option<bool>,
    pub sound_notifications: Option<bool>,
}

impl SettingsPatch {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn stream_responses(mut self, enabled: bool) -> Self {
        self.stream_responses = Some(enabled);
        self
    }

    pub fn auto_save(mut self, enabled: bool) -> Self {
        self.auto_save = Some(enabled);
        self
    }

    pub fn sound_notifications(mut self, enabled: bool) -> Self {
        self.sound_notifications = Some(enabled);
        self
    }
}
