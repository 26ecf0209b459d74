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

use crate::math::{LinearRgba, Mat4};
use crate::renderer::api::*;
use crate::renderer::error::ResourceError;
use crate::renderer::traits::CapabilitySource;

/// The low-level contract every graphics backend implements.
///
/// Methods map one-to-one onto driver commands and perform no caching of
/// their own: deciding *whether* a call is needed is the job of the state
/// caches in this crate. All calls happen on the rendering thread.
///
/// Texture parameter calls (`texture_wrap`, `texture_filter`) apply to the
/// texture bound on the active unit.
pub trait GraphicsDriver: CapabilitySource {
    // --- Pipeline state ---

    /// Switches a capability on.
    fn enable(&mut self, capability: Capability);

    /// Switches a capability off.
    fn disable(&mut self, capability: Capability);

    /// Selects which face is culled when [`Capability::CullFace`] is enabled.
    fn cull_face(&mut self, face: Face);

    /// Sets the depth comparison function.
    fn depth_func(&mut self, func: CompareFunction);

    /// Enables or disables depth writes.
    fn depth_mask(&mut self, write: bool);

    /// Sets the polygon offset applied when [`Capability::PolygonOffsetFill`] is enabled.
    fn polygon_offset(&mut self, factor: f32, units: f32);

    /// Sets the blend factors.
    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor);

    /// Sets the alpha test function and reference value.
    fn alpha_func(&mut self, func: CompareFunction, reference: f32);

    /// Selects linear fog.
    fn fog_mode_linear(&mut self);

    /// Sets the fog color.
    fn fog_color(&mut self, color: LinearRgba);

    /// Sets the fog start and end distances.
    fn fog_range(&mut self, start: f32, end: f32);

    /// Sets the polygon rasterization mode for both faces.
    fn fill_mode(&mut self, mode: FillMode);

    /// Sets the row alignment used for pixel uploads and read-backs.
    fn pixel_alignment(&mut self, alignment: u32);

    /// Loads a matrix into one of the transform slots.
    fn load_matrix(&mut self, slot: MatrixSlot, matrix: &Mat4);

    /// Sets the viewport.
    fn viewport(&mut self, rect: NativeRect);

    /// Sets the scissor rectangle.
    fn scissor(&mut self, rect: NativeRect);

    // --- Clears ---

    /// Sets the color used by subsequent color clears.
    fn clear_color(&mut self, color: LinearRgba);

    /// Sets the depth used by subsequent depth clears.
    fn clear_depth(&mut self, depth: f32);

    /// Clears the selected planes, respecting the scissor test and depth mask.
    fn clear(&mut self, flags: ClearFlags);

    // --- Textures ---

    /// Selects the texture unit subsequent texture calls apply to.
    fn active_texture(&mut self, unit: usize);

    /// Binds a texture (or nothing) to the active unit.
    fn bind_texture(&mut self, texture: Option<TextureId>);

    /// Sets the wrap mode of the bound texture on both axes.
    fn texture_wrap(&mut self, wrap: WrapMode);

    /// Sets the filters of the bound texture.
    ///
    /// ## Arguments
    /// * `min` - Minification filter.
    /// * `mag` - Magnification filter.
    /// * `mip` - Filter between mip levels, or `None` to sample the base level only.
    fn texture_filter(&mut self, min: FilterMode, mag: FilterMode, mip: Option<FilterMode>);

    /// Sets the anisotropy ceiling of a texture.
    ///
    /// Implementations must leave the binding of the active unit unchanged.
    fn texture_max_anisotropy(&mut self, texture: TextureId, value: f32);

    /// Creates a 2D RGBA8 texture with the given pixels.
    ///
    /// Implementations must leave the binding of the active unit unchanged.
    /// ## Errors
    /// * `ResourceError` - If the texture could not be allocated.
    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureId, ResourceError>;

    /// Deletes a texture. Units it was bound to fall back to no texture.
    fn delete_texture(&mut self, texture: TextureId);

    // --- Buffers and fences ---

    /// Creates a vertex buffer object.
    /// ## Arguments
    /// * `size` - The size in bytes.
    /// * `storage` - Mutable storage with a usage hint, or persistent-mapped storage.
    /// ## Errors
    /// * `ResourceError` - If the buffer could not be allocated or mapped.
    fn create_buffer(&mut self, size: usize, storage: BufferStorage)
        -> Result<BufferId, ResourceError>;

    /// Writes bytes into a buffer at `offset`.
    ///
    /// Writing past the end of the buffer is a contract violation.
    fn write_buffer(&mut self, buffer: BufferId, offset: usize, data: &[u8], method: UploadMethod);

    /// Detaches the current storage of a buffer so new writes never wait for the GPU.
    fn orphan_buffer(&mut self, buffer: BufferId);

    /// Deletes a buffer.
    fn delete_buffer(&mut self, buffer: BufferId);

    /// Inserts a fence after all commands submitted so far.
    fn insert_fence(&mut self) -> FenceId;

    /// Blocks until the GPU has passed the fence.
    fn wait_fence(&mut self, fence: FenceId);

    /// Deletes a fence.
    fn delete_fence(&mut self, fence: FenceId);

    // --- Draws and read-back ---

    /// Draws `count` vertices starting at `first`.
    fn draw(
        &mut self,
        primitive: Primitive,
        layout: VertexLayout,
        source: VertexSource<'_>,
        first: usize,
        count: usize,
    );

    /// Draws indexed vertices.
    /// ## Arguments
    /// * `base_vertex` - Added to every index.
    /// * `vertex_count` - Number of vertices the indices may reference, starting at `base_vertex`.
    /// * `indices` - 16-bit indices in client memory.
    fn draw_indexed(
        &mut self,
        primitive: Primitive,
        layout: VertexLayout,
        source: VertexSource<'_>,
        base_vertex: usize,
        vertex_count: usize,
        indices: &[u16],
    );

    /// Reads back RGB8 pixels, bottom row first, into `out`.
    ///
    /// `out` must hold `width * height * 3` bytes.
    fn read_pixels(&mut self, x: i32, y: i32, width: u32, height: u32, out: &mut [u8]);
}
