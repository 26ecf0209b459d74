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

//! OpenGL implementation of the driver contracts on top of `glow`.

use std::collections::HashMap;
use std::fmt;
use std::mem::offset_of;
use std::ptr::NonNull;

use anyhow::{anyhow, bail, Result};
use glow::{HasContext, PixelPackData, PixelUnpackData};
use vesper_core::math::{LinearRgba, Mat4};
use vesper_core::renderer::api::*;
use vesper_core::renderer::capabilities::extensions;
use vesper_core::renderer::error::ResourceError;
use vesper_core::renderer::traits::{CapabilitySource, GraphicsDriver};

use super::conversions::{min_filter, CapabilityTarget, IntoGl};
use super::shader::{attributes, FixedFunctionProgram, FixedFunctionState};

// Vendor enumerants glow does not name.
const GPU_MEMORY_INFO_DEDICATED_VIDMEM_NVX: u32 = 0x9047;
const GPU_MEMORY_INFO_CURRENT_AVAILABLE_VIDMEM_NVX: u32 = 0x9049;
const VBO_FREE_MEMORY_ATI: u32 = 0x87FB;
const TEXTURE_FREE_MEMORY_ATI: u32 = 0x87FC;
const TEXTURE_MAX_ANISOTROPY_EXT: u32 = 0x84FE;
const MAX_TEXTURE_MAX_ANISOTROPY_EXT: u32 = 0x84FF;

/// Nanoseconds a single fence wait blocks before checking again.
const FENCE_WAIT_STEP_NS: i32 = 1_000_000;

const PERSISTENT_FLAGS: u32 =
    glow::MAP_WRITE_BIT | glow::MAP_PERSISTENT_BIT | glow::MAP_COHERENT_BIT;

/// A buffer object and how it was allocated.
#[derive(Debug)]
struct GlBuffer {
    raw: glow::Buffer,
    size: usize,
    storage: BufferStorage,
    /// The persistent mapping, for [`BufferStorage::Persistent`] buffers.
    mapping: Option<NonNull<u8>>,
}

/// Buffers used to feed draws whose data lives in client memory.
#[derive(Debug)]
struct ScratchBuffers {
    vertices: glow::Buffer,
    indices: glow::Buffer,
}

/// A [`GraphicsDriver`] talking to an OpenGL 3.3+ core context.
///
/// The legacy fixed-function subset the renderer relies on (matrix slots,
/// linear fog, alpha test, stage-0 modulation) is emulated by a single
/// shader program. Vertices in client memory are streamed through scratch
/// buffers, since core contexts cannot source them directly.
///
/// The context must be current on the calling thread for the whole life of
/// the driver.
pub struct GlowDriver {
    gl: glow::Context,
    loader: Option<String>,
    program: FixedFunctionProgram,
    fixed: FixedFunctionState,
    vao: glow::VertexArray,
    scratch: ScratchBuffers,
    map_buffer_range: bool,
    next_id: usize,
    buffers: HashMap<BufferId, GlBuffer>,
    textures: HashMap<TextureId, glow::Texture>,
    fences: HashMap<FenceId, glow::Fence>,
    active_unit: usize,
    bound: Vec<Option<TextureId>>,
}

impl fmt::Debug for GlowDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlowDriver")
            .field("loader", &self.loader)
            .field("buffers", &self.buffers.len())
            .field("textures", &self.textures.len())
            .field("fences", &self.fences.len())
            .field("active_unit", &self.active_unit)
            .finish_non_exhaustive()
    }
}

impl GlowDriver {
    /// Wraps a current OpenGL context.
    ///
    /// ## Arguments
    /// * `gl` - The context, already current on this thread.
    /// * `loader` - Name and version of the function loader that produced `gl`.
    ///   An empty string means no loader is available, which the renderer
    ///   treats as fatal during initialization.
    ///
    /// ## Errors
    /// Fails if the context is older than 3.3 or the shader program does not build.
    pub fn new(gl: glow::Context, loader: &str) -> Result<Self> {
        let version = gl.version();
        if (version.major, version.minor) < (3, 3) {
            bail!(
                "OpenGL 3.3 or newer is required, the context reports {}.{}",
                version.major,
                version.minor
            );
        }
        log::debug!(
            "Creating OpenGL driver for {}.{} context",
            version.major,
            version.minor
        );

        let program = FixedFunctionProgram::new(&gl)
            .map_err(|log| anyhow!("Failed to build the fixed-function program: {log}"))?;
        let (vao, scratch) = unsafe {
            let vao = gl.create_vertex_array().map_err(|e| anyhow!(e))?;
            gl.bind_vertex_array(Some(vao));
            let vertices = gl.create_buffer().map_err(|e| anyhow!(e))?;
            let indices = gl.create_buffer().map_err(|e| anyhow!(e))?;
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(indices));
            for index in [attributes::POSITION, attributes::COLOR, attributes::UV] {
                gl.enable_vertex_attrib_array(index);
            }
            (vao, ScratchBuffers { vertices, indices })
        };
        program.bind(&gl);

        let map_buffer_range = gl.supported_extensions().contains(extensions::MAP_BUFFER_RANGE)
            || (version.major, version.minor) >= (3, 0);
        let units = unsafe { gl.get_parameter_i32(glow::MAX_TEXTURE_IMAGE_UNITS) }.max(1) as usize;

        Ok(Self {
            gl,
            loader: (!loader.is_empty()).then(|| loader.to_owned()),
            program,
            fixed: FixedFunctionState::default(),
            vao,
            scratch,
            map_buffer_range,
            next_id: 1,
            buffers: HashMap::new(),
            textures: HashMap::new(),
            fences: HashMap::new(),
            active_unit: 0,
            bound: vec![None; units],
        })
    }

    /// The wrapped context.
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    fn allocate_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Creates the storage of a buffer object and maps it if it is persistent.
    fn allocate_buffer(
        &self,
        size: usize,
        storage: BufferStorage,
    ) -> Result<(glow::Buffer, Option<NonNull<u8>>), ResourceError> {
        let length = i32::try_from(size).map_err(|_| ResourceError::OutOfMemory {
            requested: size as u64,
        })?;
        unsafe {
            let raw = self.gl.create_buffer().map_err(ResourceError::BackendError)?;
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(raw));
            let mapping = match storage {
                BufferStorage::Mutable(usage) => {
                    self.gl
                        .buffer_data_size(glow::ARRAY_BUFFER, length, usage.into_gl());
                    None
                }
                BufferStorage::Persistent => {
                    self.gl
                        .buffer_storage(glow::ARRAY_BUFFER, length, None, PERSISTENT_FLAGS);
                    let ptr = self
                        .gl
                        .map_buffer_range(glow::ARRAY_BUFFER, 0, length, PERSISTENT_FLAGS);
                    Some(NonNull::new(ptr))
                }
            };

            if self.gl.get_error() == glow::OUT_OF_MEMORY {
                self.gl.delete_buffer(raw);
                return Err(ResourceError::OutOfMemory {
                    requested: size as u64,
                });
            }
            match mapping {
                None => Ok((raw, None)),
                Some(Some(ptr)) => Ok((raw, Some(ptr))),
                Some(None) => {
                    self.gl.delete_buffer(raw);
                    Err(ResourceError::BackendError(
                        "persistent mapping of a vertex buffer failed".to_string(),
                    ))
                }
            }
        }
    }

    /// Maps `length` bytes at `offset`, copies `data` to `data_offset` inside
    /// the mapping and unmaps. Falls back to a sub-data upload when mapping fails.
    fn write_mapped(
        &self,
        raw: glow::Buffer,
        offset: usize,
        length: usize,
        data_offset: usize,
        data: &[u8],
        access: u32,
    ) {
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(raw));
            let ptr = self.gl.map_buffer_range(
                glow::ARRAY_BUFFER,
                offset as i32,
                length as i32,
                access,
            );
            if ptr.is_null() {
                log::warn!("Mapping a vertex buffer failed, uploading with sub-data instead");
                self.gl.buffer_sub_data_u8_slice(
                    glow::ARRAY_BUFFER,
                    (offset + data_offset) as i32,
                    data,
                );
                return;
            }
            std::ptr::copy_nonoverlapping(data.as_ptr(), ptr.add(data_offset), data.len());
            self.gl.unmap_buffer(glow::ARRAY_BUFFER);
        }
    }

    /// Binds the vertex source and points the attributes at it, skipping
    /// `base_vertex` vertices. Returns `false` if the source is unknown.
    fn bind_vertices(
        &mut self,
        layout: VertexLayout,
        source: VertexSource<'_>,
        base_vertex: usize,
    ) -> bool {
        let raw = match source {
            VertexSource::Buffer(id) => match self.buffers.get(&id) {
                Some(buffer) => buffer.raw,
                None => {
                    log::warn!("Draw from unknown vertex buffer {id:?} skipped");
                    return false;
                }
            },
            VertexSource::Client(bytes) => {
                unsafe {
                    self.gl
                        .bind_buffer(glow::ARRAY_BUFFER, Some(self.scratch.vertices));
                    self.gl
                        .buffer_data_u8_slice(glow::ARRAY_BUFFER, bytes, glow::STREAM_DRAW);
                }
                self.scratch.vertices
            }
        };

        let stride = layout.stride() as i32;
        let base = (base_vertex * layout.stride()) as i32;
        let (color, uv) = match layout {
            VertexLayout::Screen => (
                offset_of!(ScreenVertex, color),
                offset_of!(ScreenVertex, uv),
            ),
            VertexLayout::Mesh => (offset_of!(MeshVertex, color), offset_of!(MeshVertex, uv)),
            VertexLayout::Mesh3 => (
                offset_of!(MeshVertex3, color),
                offset_of!(MeshVertex3, uv),
            ),
        };
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(raw));
            self.gl.vertex_attrib_pointer_f32(
                attributes::POSITION,
                3,
                glow::FLOAT,
                false,
                stride,
                base,
            );
            self.gl.vertex_attrib_pointer_f32(
                attributes::COLOR,
                4,
                glow::UNSIGNED_BYTE,
                true,
                stride,
                base + color as i32,
            );
            self.gl.vertex_attrib_pointer_f32(
                attributes::UV,
                2,
                glow::FLOAT,
                false,
                stride,
                base + uv as i32,
            );
        }
        true
    }

    /// Uploads the emulated fixed-function state ahead of a draw.
    fn prepare_draw(&mut self) {
        self.program.upload(&self.gl, &mut self.fixed);
    }

    fn set_shader_capability(&mut self, target: CapabilityTarget, enabled: bool) {
        match target {
            CapabilityTarget::Native(cap) => unsafe {
                if enabled {
                    self.gl.enable(cap)
                } else {
                    self.gl.disable(cap)
                }
            },
            CapabilityTarget::ShaderFog => self.fixed.update(|s| s.fog_enabled = enabled),
            CapabilityTarget::ShaderAlphaTest => self.fixed.update(|s| s.alpha_test = enabled),
        }
    }

    fn raw_texture(&self, texture: Option<TextureId>) -> Option<glow::Texture> {
        texture.and_then(|id| self.textures.get(&id).copied())
    }
}

impl Drop for GlowDriver {
    fn drop(&mut self) {
        unsafe {
            for (_, fence) in self.fences.drain() {
                self.gl.delete_sync(fence);
            }
            for (_, buffer) in self.buffers.drain() {
                self.gl.delete_buffer(buffer.raw);
            }
            for (_, texture) in self.textures.drain() {
                self.gl.delete_texture(texture);
            }
            self.gl.delete_buffer(self.scratch.vertices);
            self.gl.delete_buffer(self.scratch.indices);
            self.gl.delete_vertex_array(self.vao);
        }
        self.program.destroy(&self.gl);
    }
}

impl CapabilitySource for GlowDriver {
    fn loader_version(&self) -> Option<String> {
        self.loader.clone()
    }

    fn driver_string(&self, which: DriverString) -> String {
        let name = match which {
            DriverString::Version => glow::VERSION,
            DriverString::Vendor => glow::VENDOR,
            DriverString::Device => glow::RENDERER,
        };
        unsafe { self.gl.get_parameter_string(name) }
    }

    fn api_version(&self) -> (u32, u32) {
        let version = self.gl.version();
        (version.major, version.minor)
    }

    fn has_extension(&self, name: &str) -> bool {
        self.gl.supported_extensions().contains(name)
    }

    fn query_integer(&self, query: IntegerQuery) -> i32 {
        let nvx = || self.has_extension(extensions::NVX_GPU_MEMORY_INFO);
        let ati = || self.has_extension(extensions::ATI_MEMINFO);
        // ATI queries return four values; the first is the total free pool.
        let ati_free = |name| {
            let mut values = [0i32; 4];
            unsafe { self.gl.get_parameter_i32_slice(name, &mut values) };
            values[0]
        };
        unsafe {
            match query {
                IntegerQuery::SampleBuffers => self.gl.get_parameter_i32(glow::SAMPLE_BUFFERS),
                IntegerQuery::Samples => self.gl.get_parameter_i32(glow::SAMPLES),
                IntegerQuery::MaxTextureUnits => {
                    self.gl.get_parameter_i32(glow::MAX_TEXTURE_IMAGE_UNITS)
                }
                IntegerQuery::MaxTextureSize => self.gl.get_parameter_i32(glow::MAX_TEXTURE_SIZE),
                IntegerQuery::DedicatedVideoMemory if nvx() => {
                    self.gl.get_parameter_i32(GPU_MEMORY_INFO_DEDICATED_VIDMEM_NVX)
                }
                IntegerQuery::AvailableVideoMemory if nvx() => self
                    .gl
                    .get_parameter_i32(GPU_MEMORY_INFO_CURRENT_AVAILABLE_VIDMEM_NVX),
                IntegerQuery::VboFreeMemory if ati() => ati_free(VBO_FREE_MEMORY_ATI),
                IntegerQuery::TextureFreeMemory if ati() => ati_free(TEXTURE_FREE_MEMORY_ATI),
                _ => 0,
            }
        }
    }

    fn query_float(&self, query: FloatQuery) -> f32 {
        match query {
            FloatQuery::MaxTextureMaxAnisotropy
                if self.has_extension(extensions::TEXTURE_FILTER_ANISOTROPIC) =>
            unsafe { self.gl.get_parameter_f32(MAX_TEXTURE_MAX_ANISOTROPY_EXT) },
            FloatQuery::MaxTextureMaxAnisotropy => 0.0,
        }
    }
}

impl GraphicsDriver for GlowDriver {
    // --- Pipeline state ---

    fn enable(&mut self, capability: Capability) {
        self.set_shader_capability(capability.into_gl(), true);
    }

    fn disable(&mut self, capability: Capability) {
        self.set_shader_capability(capability.into_gl(), false);
    }

    fn cull_face(&mut self, face: Face) {
        unsafe { self.gl.cull_face(face.into_gl()) };
    }

    fn depth_func(&mut self, func: CompareFunction) {
        unsafe { self.gl.depth_func(func.into_gl()) };
    }

    fn depth_mask(&mut self, write: bool) {
        unsafe { self.gl.depth_mask(write) };
    }

    fn polygon_offset(&mut self, factor: f32, units: f32) {
        unsafe { self.gl.polygon_offset(factor, units) };
    }

    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        unsafe { self.gl.blend_func(src.into_gl(), dst.into_gl()) };
    }

    fn alpha_func(&mut self, func: CompareFunction, reference: f32) {
        self.fixed.update(|s| {
            s.alpha_func = func;
            s.alpha_ref = reference;
        });
    }

    fn fog_mode_linear(&mut self) {
        // The emulated fog is always linear.
    }

    fn fog_color(&mut self, color: LinearRgba) {
        self.fixed.update(|s| s.fog_color = color);
    }

    fn fog_range(&mut self, start: f32, end: f32) {
        self.fixed.update(|s| {
            s.fog_start = start;
            s.fog_end = end;
        });
    }

    fn fill_mode(&mut self, mode: FillMode) {
        unsafe { self.gl.polygon_mode(glow::FRONT_AND_BACK, mode.into_gl()) };
    }

    fn pixel_alignment(&mut self, alignment: u32) {
        unsafe {
            self.gl.pixel_store_i32(glow::PACK_ALIGNMENT, alignment as i32);
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, alignment as i32);
        }
    }

    fn load_matrix(&mut self, slot: MatrixSlot, matrix: &Mat4) {
        let matrix = *matrix;
        self.fixed.update(|s| match slot {
            MatrixSlot::ModelView => s.model_view = matrix,
            MatrixSlot::Projection => s.projection = matrix,
        });
    }

    fn viewport(&mut self, rect: NativeRect) {
        unsafe { self.gl.viewport(rect.x, rect.y, rect.width, rect.height) };
    }

    fn scissor(&mut self, rect: NativeRect) {
        unsafe { self.gl.scissor(rect.x, rect.y, rect.width, rect.height) };
    }

    // --- Clears ---

    fn clear_color(&mut self, color: LinearRgba) {
        unsafe { self.gl.clear_color(color.r, color.g, color.b, color.a) };
    }

    fn clear_depth(&mut self, depth: f32) {
        unsafe { self.gl.clear_depth_f32(depth) };
    }

    fn clear(&mut self, flags: ClearFlags) {
        let mut mask = 0;
        if flags.contains(ClearFlags::COLOR) {
            mask |= glow::COLOR_BUFFER_BIT;
        }
        if flags.contains(ClearFlags::DEPTH) {
            mask |= glow::DEPTH_BUFFER_BIT;
        }
        if mask != 0 {
            unsafe { self.gl.clear(mask) };
        }
    }

    // --- Textures ---

    fn active_texture(&mut self, unit: usize) {
        debug_assert!(unit < self.bound.len(), "texture unit {unit} out of range");
        self.active_unit = unit;
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit as u32) };
    }

    fn bind_texture(&mut self, texture: Option<TextureId>) {
        let raw = self.raw_texture(texture);
        unsafe { self.gl.bind_texture(glow::TEXTURE_2D, raw) };
        if let Some(slot) = self.bound.get_mut(self.active_unit) {
            *slot = texture;
        }
        if self.active_unit == 0 {
            let enabled = raw.is_some();
            if self.fixed.texture_enabled != enabled {
                self.fixed.update(|s| s.texture_enabled = enabled);
            }
        }
    }

    fn texture_wrap(&mut self, wrap: WrapMode) {
        let value = wrap.into_gl();
        unsafe {
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, value);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, value);
        }
    }

    fn texture_filter(&mut self, min: FilterMode, mag: FilterMode, mip: Option<FilterMode>) {
        unsafe {
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                min_filter(min, mip),
            );
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, mag.into_gl());
        }
    }

    fn texture_max_anisotropy(&mut self, texture: TextureId, value: f32) {
        let Some(raw) = self.textures.get(&texture).copied() else {
            return;
        };
        let previous = self.raw_texture(self.bound.get(self.active_unit).copied().flatten());
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, Some(raw));
            self.gl
                .tex_parameter_f32(glow::TEXTURE_2D, TEXTURE_MAX_ANISOTROPY_EXT, value);
            self.gl.bind_texture(glow::TEXTURE_2D, previous);
        }
    }

    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureId, ResourceError> {
        debug_assert_eq!(rgba.len(), (width * height * 4) as usize);
        let previous = self.raw_texture(self.bound.get(self.active_unit).copied().flatten());
        let raw = unsafe {
            let raw = self.gl.create_texture().map_err(ResourceError::BackendError)?;
            self.gl.bind_texture(glow::TEXTURE_2D, Some(raw));
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA8 as i32,
                width as i32,
                height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                PixelUnpackData::Slice(Some(rgba)),
            );
            let error = self.gl.get_error();
            if error == glow::OUT_OF_MEMORY {
                self.gl.bind_texture(glow::TEXTURE_2D, previous);
                self.gl.delete_texture(raw);
                return Err(ResourceError::OutOfMemory {
                    requested: rgba.len() as u64,
                });
            }
            self.gl.generate_mipmap(glow::TEXTURE_2D);
            self.gl.bind_texture(glow::TEXTURE_2D, previous);
            raw
        };

        let id = TextureId(self.allocate_id());
        self.textures.insert(id, raw);
        Ok(id)
    }

    fn delete_texture(&mut self, texture: TextureId) {
        let Some(raw) = self.textures.remove(&texture) else {
            return;
        };
        // GL unbinds deleted textures from every unit on its own.
        for (unit, slot) in self.bound.iter_mut().enumerate() {
            if *slot == Some(texture) {
                *slot = None;
                if unit == 0 {
                    self.fixed.update(|s| s.texture_enabled = false);
                }
            }
        }
        unsafe { self.gl.delete_texture(raw) };
    }

    // --- Buffers and fences ---

    fn create_buffer(
        &mut self,
        size: usize,
        storage: BufferStorage,
    ) -> Result<BufferId, ResourceError> {
        let (raw, mapping) = self.allocate_buffer(size, storage)?;
        let id = BufferId(self.allocate_id());
        log::trace!("Created {size} byte vertex buffer {id:?} ({storage:?})");
        self.buffers.insert(
            id,
            GlBuffer {
                raw,
                size,
                storage,
                mapping,
            },
        );
        Ok(id)
    }

    fn write_buffer(&mut self, buffer: BufferId, offset: usize, data: &[u8], method: UploadMethod) {
        let Some(entry) = self.buffers.get(&buffer) else {
            log::warn!("Write to unknown vertex buffer {buffer:?} skipped");
            return;
        };
        debug_assert!(offset + data.len() <= entry.size, "write past buffer end");
        let (raw, size, mapping) = (entry.raw, entry.size, entry.mapping);

        match method {
            UploadMethod::Persistent => match mapping {
                Some(ptr) => unsafe {
                    std::ptr::copy_nonoverlapping(
                        data.as_ptr(),
                        ptr.as_ptr().add(offset),
                        data.len(),
                    );
                },
                None => log::error!("Persistent write to unmapped vertex buffer {buffer:?}"),
            },
            UploadMethod::SubData => unsafe {
                self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(raw));
                self.gl
                    .buffer_sub_data_u8_slice(glow::ARRAY_BUFFER, offset as i32, data);
            },
            UploadMethod::MapWhole { invalidate } if self.map_buffer_range => {
                let mut access = glow::MAP_WRITE_BIT;
                if invalidate {
                    access |= glow::MAP_INVALIDATE_BUFFER_BIT;
                }
                self.write_mapped(raw, 0, size, offset, data, access);
            }
            UploadMethod::MapWhole { .. } => unsafe {
                self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(raw));
                self.gl
                    .buffer_sub_data_u8_slice(glow::ARRAY_BUFFER, offset as i32, data);
            },
            UploadMethod::MapRange {
                invalidate,
                unsynchronized,
            } => {
                let mut access = glow::MAP_WRITE_BIT;
                if invalidate {
                    access |= glow::MAP_INVALIDATE_RANGE_BIT;
                }
                if unsynchronized {
                    access |= glow::MAP_UNSYNCHRONIZED_BIT;
                }
                self.write_mapped(raw, offset, data.len(), 0, data, access);
            }
        }
    }

    fn orphan_buffer(&mut self, buffer: BufferId) {
        let Some(entry) = self.buffers.get(&buffer) else {
            return;
        };
        let (raw, size, storage) = (entry.raw, entry.size, entry.storage);
        match storage {
            BufferStorage::Mutable(usage) => unsafe {
                self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(raw));
                self.gl
                    .buffer_data_size(glow::ARRAY_BUFFER, size as i32, usage.into_gl());
            },
            // Immutable storage cannot be respecified; swap in a fresh object.
            BufferStorage::Persistent => match self.allocate_buffer(size, storage) {
                Ok((fresh, mapping)) => {
                    unsafe { self.gl.delete_buffer(raw) };
                    if let Some(entry) = self.buffers.get_mut(&buffer) {
                        entry.raw = fresh;
                        entry.mapping = mapping;
                    }
                }
                Err(error) => log::warn!("Orphaning vertex buffer {buffer:?} failed: {error}"),
            },
        }
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if let Some(entry) = self.buffers.remove(&buffer) {
            unsafe { self.gl.delete_buffer(entry.raw) };
        }
    }

    fn insert_fence(&mut self) -> FenceId {
        let id = FenceId(self.allocate_id());
        match unsafe { self.gl.fence_sync(glow::SYNC_GPU_COMMANDS_COMPLETE, 0) } {
            Ok(fence) => {
                self.fences.insert(id, fence);
            }
            Err(error) => {
                // Without a fence the only safe wait is a full one.
                log::warn!("Creating a fence failed ({error}), finishing instead");
                unsafe { self.gl.finish() };
            }
        }
        id
    }

    fn wait_fence(&mut self, fence: FenceId) {
        let Some(raw) = self.fences.get(&fence).copied() else {
            return;
        };
        loop {
            let status = unsafe {
                self.gl
                    .client_wait_sync(raw, glow::SYNC_FLUSH_COMMANDS_BIT, FENCE_WAIT_STEP_NS)
            };
            match status {
                glow::ALREADY_SIGNALED | glow::CONDITION_SATISFIED => break,
                glow::TIMEOUT_EXPIRED => continue,
                _ => {
                    log::error!("Waiting on fence {fence:?} failed");
                    break;
                }
            }
        }
    }

    fn delete_fence(&mut self, fence: FenceId) {
        if let Some(raw) = self.fences.remove(&fence) {
            unsafe { self.gl.delete_sync(raw) };
        }
    }

    // --- Draws and read-back ---

    fn draw(
        &mut self,
        primitive: Primitive,
        layout: VertexLayout,
        source: VertexSource<'_>,
        first: usize,
        count: usize,
    ) {
        if count == 0 || !self.bind_vertices(layout, source, 0) {
            return;
        }
        self.prepare_draw();
        unsafe {
            self.gl
                .draw_arrays(primitive.into_gl(), first as i32, count as i32)
        };
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
        debug_assert!(
            indices.iter().all(|&i| (i as usize) < vertex_count),
            "index out of the declared vertex range"
        );
        if indices.is_empty() || !self.bind_vertices(layout, source, base_vertex) {
            return;
        }
        self.prepare_draw();
        unsafe {
            self.gl
                .bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(self.scratch.indices));
            self.gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(indices),
                glow::STREAM_DRAW,
            );
            self.gl.draw_elements(
                primitive.into_gl(),
                indices.len() as i32,
                glow::UNSIGNED_SHORT,
                0,
            );
        }
    }

    fn read_pixels(&mut self, x: i32, y: i32, width: u32, height: u32, out: &mut [u8]) {
        debug_assert_eq!(out.len(), (width * height * 3) as usize);
        unsafe {
            self.gl.read_pixels(
                x,
                y,
                width as i32,
                height as i32,
                glow::RGB,
                glow::UNSIGNED_BYTE,
                PixelPackData::Slice(Some(out)),
            );
        }
    }
}
