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

//! Defines the hierarchy of error types for the rendering subsystem.
//!
//! Only device initialization, resource allocation and settings parsing can
//! fail. State changes, flushes and draws are total functions.

use thiserror::Error;

/// An error related to the creation or use of a GPU resource (buffers, textures, fences).
#[derive(Debug, Error)]
pub enum ResourceError {
    /// An error originating from the specific graphics backend implementation.
    #[error("Backend-specific resource error: {0}")]
    BackendError(String),
    /// The handle or ID used to reference a resource is invalid.
    #[error("Invalid resource handle or ID.")]
    InvalidHandle,
    /// The driver could not allocate the requested amount of memory.
    #[error("Out of memory while allocating {requested} bytes.")]
    OutOfMemory {
        /// Size of the failed allocation in bytes.
        requested: u64,
    },
}

/// The top-level error type for the renderer.
#[derive(Debug, Error)]
pub enum RenderError {
    /// An operation needed an initialized device but the device is shut down.
    #[error("Renderer is not initialized.")]
    NotInitialized,
    /// Device initialization failed. No further driver calls are safe.
    #[error("Renderer initialization failed: {0}")]
    InitializationFailed(String),
    /// A resource could not be created or used.
    #[error("Resource error: {0}")]
    ResourceError(#[from] ResourceError),
    /// The graphics context was lost.
    #[error("The graphics device was lost: {0}")]
    DeviceLost(String),
    /// An internal invariant was broken.
    #[error("Internal renderer error: {0}")]
    Internal(String),
}

/// An error raised while loading the video settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings document is not valid JSON or does not match the schema.
    #[error("Invalid video settings: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_errors_convert_into_render_errors() {
        let err: RenderError = ResourceError::OutOfMemory { requested: 64 }.into();
        assert!(matches!(
            err,
            RenderError::ResourceError(ResourceError::OutOfMemory { requested: 64 })
        ));
        assert_eq!(
            err.to_string(),
            "Resource error: Out of memory while allocating 64 bytes."
        );
    }
}
