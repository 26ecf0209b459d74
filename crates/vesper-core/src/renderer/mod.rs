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

//! The backend-agnostic renderer of the Vesper client.
//!
//! This module defines the contracts a graphics backend implements
//! ([`GraphicsDriver`], [`CapabilitySource`]) and everything that sits in front
//! of them: the capability probe, the requested/applied pipeline state cache,
//! texture stages, the transform cache, viewport and clear handling, and the
//! vertex buffer strategies. The [`Renderer`] aggregate ties them together.
//!
//! The concrete OpenGL backend lives in the `vesper-infra` crate. The
//! [`recording`] driver stands in for it in headless runs and tests.

pub mod api;
pub mod buffer;
pub mod capabilities;
pub mod error;
pub mod recording;
pub mod settings;
pub mod state;
pub mod system;
pub mod texture;
pub mod traits;
pub mod transform;
pub mod viewport;

// Re-export the most important traits and types for easier use.
pub use self::api::*;
pub use self::buffer::{BufferStrategy, StrategySelector, UploadPath, VertexBuffer};
pub use self::capabilities::{query_vram, DeviceCapabilities, DeviceInfo};
pub use self::error::{RenderError, ResourceError, SettingsError};
pub use self::settings::VideoSettings;
pub use self::state::{PipelineState, StateCache};
pub use self::system::{device_reset_required, Renderer};
pub use self::texture::{TextureRegistry, TextureStageArray, TextureTable};
pub use self::traits::{
    CapabilitySource, FixedSurface, GraphicsDriver, RenderSurface, SharedSurface,
};
pub use self::transform::{TransformCache, TransformMode};
pub use self::viewport::ClearRequest;
