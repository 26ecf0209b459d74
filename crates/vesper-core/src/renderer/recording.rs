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

//! A [`GraphicsDriver`] that records every call instead of talking to a GPU.
//!
//! The recording driver backs the headless sandbox and the tests. It answers
//! capability queries from a [`DriverProfile`], hands out sequential ids and
//! keeps buffer contents and a fake framebuffer so uploads and read-backs can
//! be inspected.

use std::collections::{HashMap, HashSet};

use crate::math::{LinearRgba, Mat4};
use crate::renderer::api::*;
use crate::renderer::error::ResourceError;
use crate::renderer::traits::{CapabilitySource, GraphicsDriver};

/// A description of what a fake device reports.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverProfile {
    /// The extension loader version, `None` to simulate a loader failure.
    pub loader: Option<String>,
    /// The context version.
    pub version: (u32, u32),
    /// The version string reported to diagnostics.
    pub version_string: String,
    /// The vendor string.
    pub vendor: String,
    /// The device string.
    pub device: String,
    /// Available extensions.
    pub extensions: HashSet<String>,
    /// Answers to integer queries. Missing queries answer `0`.
    pub integers: HashMap<IntegerQuery, i32>,
    /// Answers to float queries. Missing queries answer `0.0`.
    pub floats: HashMap<FloatQuery, f32>,
}

impl DriverProfile {
    /// A desktop GL 4.6 device with persistent buffers and 4x multisampling.
    pub fn modern() -> Self {
        let extensions = [
            "GL_ARB_texture_non_power_of_two",
            "GL_ARB_draw_elements_base_vertex",
            "GL_ARB_map_buffer_range",
            "GL_ARB_buffer_storage",
            "GL_EXT_texture_filter_anisotropic",
        ];
        Self {
            loader: Some("recording 1.0".to_owned()),
            version: (4, 6),
            version_string: "4.6.0 Recording".to_owned(),
            vendor: "Vesper".to_owned(),
            device: "Recording device".to_owned(),
            extensions: extensions.iter().map(|e| (*e).to_owned()).collect(),
            integers: HashMap::from([
                (IntegerQuery::SampleBuffers, 1),
                (IntegerQuery::Samples, 4),
                (IntegerQuery::MaxTextureUnits, 8),
                (IntegerQuery::MaxTextureSize, 16384),
            ]),
            floats: HashMap::from([(FloatQuery::MaxTextureMaxAnisotropy, 16.0)]),
        }
    }

    /// A GL 2.1 device without extensions or multisampling.
    pub fn legacy() -> Self {
        Self {
            loader: Some("recording 1.0".to_owned()),
            version: (2, 1),
            version_string: "2.1 Recording".to_owned(),
            vendor: "Vesper".to_owned(),
            device: "Legacy recording device".to_owned(),
            extensions: HashSet::new(),
            integers: HashMap::from([
                (IntegerQuery::SampleBuffers, 0),
                (IntegerQuery::MaxTextureUnits, 4),
                (IntegerQuery::MaxTextureSize, 4096),
            ]),
            floats: HashMap::new(),
        }
    }

    /// Simulates a missing extension loader.
    pub fn without_loader(mut self) -> Self {
        self.loader = None;
        self
    }

    /// Adds an extension.
    pub fn with_extension(mut self, name: &str) -> Self {
        self.extensions.insert(name.to_owned());
        self
    }

    /// Removes an extension.
    pub fn without_extension(mut self, name: &str) -> Self {
        self.extensions.remove(name);
        self
    }

    /// Sets the answer to an integer query.
    pub fn with_integer(mut self, query: IntegerQuery, value: i32) -> Self {
        self.integers.insert(query, value);
        self
    }

    /// Sets the answer to a float query.
    pub fn with_float(mut self, query: FloatQuery, value: f32) -> Self {
        self.floats.insert(query, value);
        self
    }

    /// Sets the context version.
    pub fn with_version(mut self, major: u32, minor: u32) -> Self {
        self.version = (major, minor);
        self.version_string = format!("{major}.{minor} Recording");
        self
    }
}

impl CapabilitySource for DriverProfile {
    fn loader_version(&self) -> Option<String> {
        self.loader.clone()
    }

    fn driver_string(&self, which: DriverString) -> String {
        match which {
            DriverString::Version => self.version_string.clone(),
            DriverString::Vendor => self.vendor.clone(),
            DriverString::Device => self.device.clone(),
        }
    }

    fn api_version(&self) -> (u32, u32) {
        self.version
    }

    fn has_extension(&self, name: &str) -> bool {
        self.extensions.contains(name)
    }

    fn query_integer(&self, query: IntegerQuery) -> i32 {
        self.integers.get(&query).copied().unwrap_or(0)
    }

    fn query_float(&self, query: FloatQuery) -> f32 {
        self.floats.get(&query).copied().unwrap_or(0.0)
    }
}

/// The vertex source of a recorded draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordedSource {
    /// A buffer object.
    Buffer(BufferId),
    /// Client memory of the given length in bytes.
    Client {
        /// Length of the client data in bytes.
        len: usize,
    },
}

impl From<VertexSource<'_>> for RecordedSource {
    fn from(source: VertexSource<'_>) -> Self {
        match source {
            VertexSource::Buffer(buffer) => RecordedSource::Buffer(buffer),
            VertexSource::Client(bytes) => RecordedSource::Client { len: bytes.len() },
        }
    }
}

/// One recorded driver call.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum DriverCall {
    Enable(Capability),
    Disable(Capability),
    CullFace(Face),
    DepthFunc(CompareFunction),
    DepthMask(bool),
    PolygonOffset {
        factor: f32,
        units: f32,
    },
    BlendFunc(BlendFactor, BlendFactor),
    AlphaFunc(CompareFunction, f32),
    FogModeLinear,
    FogColor(LinearRgba),
    FogRange(f32, f32),
    FillMode(FillMode),
    PixelAlignment(u32),
    LoadMatrix(MatrixSlot, Mat4),
    Viewport(NativeRect),
    Scissor(NativeRect),
    ClearColor(LinearRgba),
    ClearDepth(f32),
    Clear(ClearFlags),
    ActiveTexture(usize),
    BindTexture(Option<TextureId>),
    TextureWrap(WrapMode),
    TextureFilter {
        min: FilterMode,
        mag: FilterMode,
        mip: Option<FilterMode>,
    },
    TextureMaxAnisotropy(TextureId, f32),
    CreateTexture {
        id: TextureId,
        width: u32,
        height: u32,
    },
    DeleteTexture(TextureId),
    CreateBuffer {
        id: BufferId,
        size: usize,
        storage: BufferStorage,
    },
    WriteBuffer {
        buffer: BufferId,
        offset: usize,
        len: usize,
        method: UploadMethod,
    },
    OrphanBuffer(BufferId),
    DeleteBuffer(BufferId),
    InsertFence(FenceId),
    WaitFence(FenceId),
    DeleteFence(FenceId),
    Draw {
        primitive: Primitive,
        layout: VertexLayout,
        source: RecordedSource,
        first: usize,
        count: usize,
    },
    DrawIndexed {
        primitive: Primitive,
        layout: VertexLayout,
        source: RecordedSource,
        base_vertex: usize,
        vertex_count: usize,
        index_count: usize,
    },
    ReadPixels {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
}

/// The fake framebuffer: RGB8, top row first.
#[derive(Debug, Clone, Default)]
struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

/// A driver that records calls. See the [module docs](self).
#[derive(Debug)]
pub struct RecordingDriver {
    profile: DriverProfile,
    calls: Vec<DriverCall>,
    next_id: usize,
    buffers: HashMap<BufferId, Vec<u8>>,
    textures: HashSet<TextureId>,
    fences: HashSet<FenceId>,
    framebuffer: Framebuffer,
    fail_allocations: bool,
}

impl RecordingDriver {
    /// Creates a driver answering queries from `profile`.
    pub fn new(profile: DriverProfile) -> Self {
        Self {
            profile,
            calls: Vec::new(),
            next_id: 1,
            buffers: HashMap::new(),
            textures: HashSet::new(),
            fences: HashSet::new(),
            framebuffer: Framebuffer::default(),
            fail_allocations: false,
        }
    }

    /// The profile answering capability queries.
    pub fn profile(&self) -> &DriverProfile {
        &self.profile
    }

    /// Every call recorded since the last [`take_calls`](Self::take_calls).
    pub fn calls(&self) -> &[DriverCall] {
        &self.calls
    }

    /// Returns and clears the recorded calls.
    pub fn take_calls(&mut self) -> Vec<DriverCall> {
        std::mem::take(&mut self.calls)
    }

    /// Replaces the fake framebuffer read by `read_pixels`.
    ///
    /// `rgb` holds `width * height` RGB8 pixels, top row first.
    pub fn set_framebuffer(&mut self, width: u32, height: u32, rgb: Vec<u8>) {
        debug_assert_eq!(rgb.len(), width as usize * height as usize * 3);
        self.framebuffer = Framebuffer {
            width,
            height,
            pixels: rgb,
        };
    }

    /// Makes every following texture and buffer allocation fail.
    pub fn fail_allocations(&mut self, fail: bool) {
        self.fail_allocations = fail;
    }

    /// The current contents of a buffer.
    pub fn buffer_contents(&self, buffer: BufferId) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(Vec::as_slice)
    }

    /// Number of buffers that were created and not deleted.
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Number of textures that were created and not deleted.
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Number of fences that were inserted and not deleted.
    pub fn live_fences(&self) -> usize {
        self.fences.len()
    }

    fn allocate_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn record(&mut self, call: DriverCall) {
        log::trace!("{call:?}");
        self.calls.push(call);
    }
}

impl CapabilitySource for RecordingDriver {
    fn loader_version(&self) -> Option<String> {
        self.profile.loader_version()
    }

    fn driver_string(&self, which: DriverString) -> String {
        self.profile.driver_string(which)
    }

    fn api_version(&self) -> (u32, u32) {
        self.profile.api_version()
    }

    fn has_extension(&self, name: &str) -> bool {
        self.profile.has_extension(name)
    }

    fn query_integer(&self, query: IntegerQuery) -> i32 {
        self.profile.query_integer(query)
    }

    fn query_float(&self, query: FloatQuery) -> f32 {
        self.profile.query_float(query)
    }
}

impl GraphicsDriver for RecordingDriver {
    fn enable(&mut self, capability: Capability) {
        self.record(DriverCall::Enable(capability));
    }

    fn disable(&mut self, capability: Capability) {
        self.record(DriverCall::Disable(capability));
    }

    fn cull_face(&mut self, face: Face) {
        self.record(DriverCall::CullFace(face));
    }

    fn depth_func(&mut self, func: CompareFunction) {
        self.record(DriverCall::DepthFunc(func));
    }

    fn depth_mask(&mut self, write: bool) {
        self.record(DriverCall::DepthMask(write));
    }

    fn polygon_offset(&mut self, factor: f32, units: f32) {
        self.record(DriverCall::PolygonOffset { factor, units });
    }

    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.record(DriverCall::BlendFunc(src, dst));
    }

    fn alpha_func(&mut self, func: CompareFunction, reference: f32) {
        self.record(DriverCall::AlphaFunc(func, reference));
    }

    fn fog_mode_linear(&mut self) {
        self.record(DriverCall::FogModeLinear);
    }

    fn fog_color(&mut self, color: LinearRgba) {
        self.record(DriverCall::FogColor(color));
    }

    fn fog_range(&mut self, start: f32, end: f32) {
        self.record(DriverCall::FogRange(start, end));
    }

    fn fill_mode(&mut self, mode: FillMode) {
        self.record(DriverCall::FillMode(mode));
    }

    fn pixel_alignment(&mut self, alignment: u32) {
        self.record(DriverCall::PixelAlignment(alignment));
    }

    fn load_matrix(&mut self, slot: MatrixSlot, matrix: &Mat4) {
        self.record(DriverCall::LoadMatrix(slot, *matrix));
    }

    fn viewport(&mut self, rect: NativeRect) {
        self.record(DriverCall::Viewport(rect));
    }

    fn scissor(&mut self, rect: NativeRect) {
        self.record(DriverCall::Scissor(rect));
    }

    fn clear_color(&mut self, color: LinearRgba) {
        self.record(DriverCall::ClearColor(color));
    }

    fn clear_depth(&mut self, depth: f32) {
        self.record(DriverCall::ClearDepth(depth));
    }

    fn clear(&mut self, flags: ClearFlags) {
        self.record(DriverCall::Clear(flags));
    }

    fn active_texture(&mut self, unit: usize) {
        self.record(DriverCall::ActiveTexture(unit));
    }

    fn bind_texture(&mut self, texture: Option<TextureId>) {
        self.record(DriverCall::BindTexture(texture));
    }

    fn texture_wrap(&mut self, wrap: WrapMode) {
        self.record(DriverCall::TextureWrap(wrap));
    }

    fn texture_filter(&mut self, min: FilterMode, mag: FilterMode, mip: Option<FilterMode>) {
        self.record(DriverCall::TextureFilter { min, mag, mip });
    }

    fn texture_max_anisotropy(&mut self, texture: TextureId, value: f32) {
        self.record(DriverCall::TextureMaxAnisotropy(texture, value));
    }

    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        _rgba: &[u8],
    ) -> Result<TextureId, ResourceError> {
        if self.fail_allocations {
            return Err(ResourceError::OutOfMemory {
                requested: u64::from(width) * u64::from(height) * 4,
            });
        }
        let id = TextureId(self.allocate_id());
        self.textures.insert(id);
        self.record(DriverCall::CreateTexture { id, width, height });
        Ok(id)
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
        self.record(DriverCall::DeleteTexture(texture));
    }

    fn create_buffer(
        &mut self,
        size: usize,
        storage: BufferStorage,
    ) -> Result<BufferId, ResourceError> {
        if self.fail_allocations {
            return Err(ResourceError::OutOfMemory {
                requested: size as u64,
            });
        }
        let id = BufferId(self.allocate_id());
        self.buffers.insert(id, vec![0; size]);
        self.record(DriverCall::CreateBuffer { id, size, storage });
        Ok(id)
    }

    fn write_buffer(&mut self, buffer: BufferId, offset: usize, data: &[u8], method: UploadMethod) {
        if let Some(contents) = self.buffers.get_mut(&buffer) {
            debug_assert!(offset + data.len() <= contents.len());
            if let Some(target) = contents.get_mut(offset..offset + data.len()) {
                target.copy_from_slice(data);
            }
        }
        self.record(DriverCall::WriteBuffer {
            buffer,
            offset,
            len: data.len(),
            method,
        });
    }

    fn orphan_buffer(&mut self, buffer: BufferId) {
        self.record(DriverCall::OrphanBuffer(buffer));
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(&buffer);
        self.record(DriverCall::DeleteBuffer(buffer));
    }

    fn insert_fence(&mut self) -> FenceId {
        let fence = FenceId(self.allocate_id());
        self.fences.insert(fence);
        self.record(DriverCall::InsertFence(fence));
        fence
    }

    fn wait_fence(&mut self, fence: FenceId) {
        self.record(DriverCall::WaitFence(fence));
    }

    fn delete_fence(&mut self, fence: FenceId) {
        self.fences.remove(&fence);
        self.record(DriverCall::DeleteFence(fence));
    }

    fn draw(
        &mut self,
        primitive: Primitive,
        layout: VertexLayout,
        source: VertexSource<'_>,
        first: usize,
        count: usize,
    ) {
        self.record(DriverCall::Draw {
            primitive,
            layout,
            source: source.into(),
            first,
            count,
        });
    }

    fn draw_indexed(
        &mut self,
        primitive: Primitive,
        layout: VertexLayout,
        source: VertexSource<'_>,
        base_vertex: usize,
        vertex_count: usize,
        indices: &[u16],
    ) {
        self.record(DriverCall::DrawIndexed {
            primitive,
            layout,
            source: source.into(),
            base_vertex,
            vertex_count,
            index_count: indices.len(),
        });
    }

    fn read_pixels(&mut self, x: i32, y: i32, width: u32, height: u32, out: &mut [u8]) {
        self.record(DriverCall::ReadPixels {
            x,
            y,
            width,
            height,
        });

        let fb = &self.framebuffer;
        let row_len = width as usize * 3;
        for (row, chunk) in out.chunks_exact_mut(row_len).take(height as usize).enumerate() {
            // Rows are returned bottom first.
            let native_y = y as i64 + row as i64;
            let fb_row = fb.height as i64 - 1 - native_y;
            for (column, pixel) in chunk.chunks_exact_mut(3).enumerate() {
                let fb_x = x as i64 + column as i64;
                let inside =
                    fb_row >= 0 && fb_row < fb.height as i64 && fb_x >= 0 && fb_x < fb.width as i64;
                if !inside {
                    pixel.fill(0);
                    continue;
                }
                let start = (fb_row as usize * fb.width as usize + fb_x as usize) * 3;
                match fb.pixels.get(start..start + 3) {
                    Some(src) => pixel.copy_from_slice(src),
                    None => pixel.fill(0),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_across_object_kinds() {
        let mut driver = RecordingDriver::new(DriverProfile::modern());
        let texture = driver.create_texture(1, 1, &[0; 4]).unwrap();
        let buffer = driver
            .create_buffer(16, BufferStorage::Mutable(BufferUsage::Static))
            .unwrap();
        let fence = driver.insert_fence();
        assert_ne!(texture.0, buffer.0);
        assert_ne!(buffer.0, fence.0);
        assert_eq!(driver.live_textures(), 1);
        assert_eq!(driver.live_fences(), 1);
    }

    #[test]
    fn writes_land_in_the_buffer() {
        let mut driver = RecordingDriver::new(DriverProfile::modern());
        let buffer = driver.create_buffer(8, BufferStorage::Persistent).unwrap();
        driver.write_buffer(buffer, 4, &[1, 2, 3, 4], UploadMethod::Persistent);
        assert_eq!(
            driver.buffer_contents(buffer),
            Some(&[0, 0, 0, 0, 1, 2, 3, 4][..])
        );
    }

    #[test]
    fn failing_allocations() {
        let mut driver = RecordingDriver::new(DriverProfile::modern());
        driver.fail_allocations(true);
        assert!(matches!(
            driver.create_buffer(64, BufferStorage::Persistent),
            Err(ResourceError::OutOfMemory { requested: 64 })
        ));
        assert!(driver.take_calls().is_empty());
    }

    #[test]
    fn read_back_is_bottom_row_first() {
        let mut driver = RecordingDriver::new(DriverProfile::modern());
        // 1x2 framebuffer: top pixel red, bottom pixel blue.
        driver.set_framebuffer(1, 2, vec![255, 0, 0, 0, 0, 255]);
        let mut out = [0u8; 6];
        driver.read_pixels(0, 0, 1, 2, &mut out);
        assert_eq!(out, [0, 0, 255, 255, 0, 0]);
    }
}
