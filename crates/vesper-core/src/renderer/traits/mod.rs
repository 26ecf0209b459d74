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

//! Defines the contracts between the renderer and its collaborators.
//!
//! - [`GraphicsDriver`]: the command interface of a graphics backend.
//! - [`CapabilitySource`]: what the backend supports, queried once per device.
//! - [`RenderSurface`]: the size of the drawable being rendered to.

mod capability_source;
mod graphics_driver;
mod render_surface;

pub use self::capability_source::CapabilitySource;
pub use self::graphics_driver::GraphicsDriver;
pub use self::render_surface::{FixedSurface, RenderSurface, SharedSurface};
