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

//! The fixed set of vertex formats the renderer draws.
//!
//! Every vertex type is `#[repr(C)]` and `Pod` so it can be uploaded as raw
//! bytes. The driver only ever sees a [`VertexLayout`] tag and a byte slice or
//! buffer, never the Rust type.

use bytemuck::{Pod, Zeroable};

/// Identifies the memory layout of a vertex stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexLayout {
    /// [`ScreenVertex`]: pre-transformed pixel-space position, color, one UV set.
    Screen,
    /// [`MeshVertex`]: world-space position, color, one UV set.
    Mesh,
    /// [`MeshVertex3`]: world-space position, color, three UV sets.
    Mesh3,
}

impl VertexLayout {
    /// Size of one vertex in bytes.
    pub const fn stride(self) -> usize {
        match self {
            VertexLayout::Screen => std::mem::size_of::<ScreenVertex>(),
            VertexLayout::Mesh => std::mem::size_of::<MeshVertex>(),
            VertexLayout::Mesh3 => std::mem::size_of::<MeshVertex3>(),
        }
    }

    /// Returns `true` if positions are already in window pixels.
    ///
    /// Such vertices are drawn without the view and projection matrices.
    pub const fn is_screen_space(self) -> bool {
        matches!(self, VertexLayout::Screen)
    }

    /// Number of texture coordinate sets per vertex.
    pub const fn uv_sets(self) -> usize {
        match self {
            VertexLayout::Screen | VertexLayout::Mesh => 1,
            VertexLayout::Mesh3 => 3,
        }
    }
}

/// A vertex type the renderer knows how to draw.
pub trait Vertex: Pod {
    /// The layout tag for this vertex type.
    const LAYOUT: VertexLayout;
}

/// A pre-transformed vertex in window pixels, used for UI and overlays.
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct ScreenVertex {
    /// Pixel position; `z` is the depth value.
    pub position: [f32; 3],
    /// Reciprocal homogeneous W, kept for perspective-correct texturing.
    pub rhw: f32,
    /// Packed `0xAARRGGBB` color.
    pub color: u32,
    /// Texture coordinates.
    pub uv: [f32; 2],
}

impl Vertex for ScreenVertex {
    const LAYOUT: VertexLayout = VertexLayout::Screen;
}

/// A world-space vertex with one texture coordinate set.
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct MeshVertex {
    /// World-space position.
    pub position: [f32; 3],
    /// Packed `0xAARRGGBB` color.
    pub color: u32,
    /// Texture coordinates.
    pub uv: [f32; 2],
}

impl Vertex for MeshVertex {
    const LAYOUT: VertexLayout = VertexLayout::Mesh;
}

/// A world-space vertex with three texture coordinate sets.
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct MeshVertex3 {
    /// World-space position.
    pub position: [f32; 3],
    /// Packed `0xAARRGGBB` color.
    pub color: u32,
    /// Texture coordinate sets.
    pub uv: [[f32; 2]; 3],
}

impl Vertex for MeshVertex3 {
    const LAYOUT: VertexLayout = VertexLayout::Mesh3;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strides_match_packed_sizes() {
        assert_eq!(VertexLayout::Screen.stride(), 28);
        assert_eq!(VertexLayout::Mesh.stride(), 24);
        assert_eq!(VertexLayout::Mesh3.stride(), 40);
    }

    #[test]
    fn only_screen_vertices_skip_the_transform() {
        assert!(ScreenVertex::LAYOUT.is_screen_space());
        assert!(!MeshVertex::LAYOUT.is_screen_space());
        assert!(!MeshVertex3::LAYOUT.is_screen_space());
    }
}
