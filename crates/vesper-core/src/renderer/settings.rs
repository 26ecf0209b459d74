// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Video configuration consumed by the renderer.

use serde::{Deserialize, Serialize};

use super::error::SettingsError;

/// User-facing video settings.
///
/// Every field has a default so partial documents are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    /// Vertex buffer upload strategy hint. Empty or `"auto"` lets the renderer choose.
    ///
    /// Recognized values: `persistent-orphan`, `persistent-x3`, `persistent-x2`,
    /// `persistent-nosync`, `maprange`, `maprange+subdata`, `map`, `map+subdata`.
    pub buffer_upload: String,
    /// Requested anisotropic filtering level. Clamped to what the device supports.
    pub max_anisotropic_filtering: u32,
    /// Whether multisample antialiasing may be enabled.
    pub antialiasing: bool,
    /// Use alpha-to-coverage instead of alpha testing for color-keyed geometry when
    /// multisampling is active.
    pub colorkey_alpha_to_coverage: bool,
    /// Allow GPU vertex buffers. When `false`, every vertex buffer uses client memory.
    pub vertex_buffers: bool,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            buffer_upload: String::new(),
            max_anisotropic_filtering: 9001,
            antialiasing: true,
            colorkey_alpha_to_coverage: true,
            vertex_buffers: true,
        }
    }
}

impl VideoSettings {
    /// Parses settings from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Parse`] if the document is malformed.
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the settings as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Parse`] if serialization fails.
    pub fn to_json_string(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
