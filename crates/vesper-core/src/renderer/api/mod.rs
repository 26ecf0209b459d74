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

//! Backend-agnostic rendering API.
//!
//! - **[`enums`]**: pipeline, texture and query enums shared with drivers.
//! - **[`flags`]**: clear and buffer write flag sets.
//! - **[`handles`]**: opaque ids of driver-owned objects.
//! - **[`region`]**: pixel rectangles in the driver convention.
//! - **[`vertex`]**: the vertex formats the renderer draws.

pub mod enums;
pub mod flags;
pub mod handles;
pub mod region;
pub mod vertex;

pub use self::enums::*;
pub use self::flags::{ClearFlags, LockFlags};
pub use self::handles::{BufferId, FenceId, TextureHandle, TextureId};
pub use self::region::NativeRect;
pub use self::vertex::{MeshVertex, MeshVertex3, ScreenVertex, Vertex, VertexLayout};

/// Where the vertices of a draw call come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexSource<'a> {
    /// A buffer object created by the driver.
    Buffer(BufferId),
    /// Vertices in client memory, laid out as the draw's [`VertexLayout`].
    Client(&'a [u8]),
}
