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

//! The renderer aggregate.
//!
//! [`Renderer`] owns the driver and every cache sitting in front of it. State
//! setters are cheap and never reach the driver; draws flush the pipeline
//! state, the texture stages and the transform first.
//!
//! The device has two lifecycle phases. The pipeline state cache, the
//! transform cache and the strategy selector live as long as the renderer,
//! while the capability record and the texture stage array only exist between
//! [`Renderer::reinit`] and [`Renderer::shutdown`].

use std::fmt;

use image::{imageops, RgbImage};

use super::api::{
    BlendFactor, BufferUsage, Capability, ClearFlags, CompareFunction, CullMode, FillMode,
    FilterMode, LockFlags, Primitive, TextureHandle, Vertex, VertexLayout, VertexSource, WrapMode,
};
use super::buffer::{StrategySelector, VertexBuffer};
use super::capabilities::{self, DeviceCapabilities, DeviceInfo};
use super::error::RenderError;
use super::settings::VideoSettings;
use super::state::StateCache;
use super::texture::{TextureRegistry, TextureStageArray, TextureTable};
use super::traits::{GraphicsDriver, RenderSurface};
use super::transform::{TransformCache, TransformMode};
use super::viewport::{self, ClearRequest, ViewportState};
use crate::diagnostics::DiagnosticsSink;
use crate::math::{Color, Mat4, Rect};

/// Resources that only exist while the device is initialized.
#[derive(Debug)]
struct DeviceState {
    caps: DeviceCapabilities,
    stages: TextureStageArray,
}

/// Returns `true` if resizing the window destroys the graphics context on this platform.
///
/// `fullscreen_involved` tells whether the window leaves or enters fullscreen.
pub fn device_reset_required(fullscreen_involved: bool) -> bool {
    if cfg!(any(
        target_os = "linux",
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd",
        target_os = "dragonfly"
    )) {
        false
    } else if cfg!(target_os = "windows") {
        fullscreen_involved
    } else {
        true
    }
}

/// The renderer: caches in front of a [`GraphicsDriver`].
pub struct Renderer<D: GraphicsDriver> {
    driver: D,
    surface: Box<dyn RenderSurface>,
    settings: VideoSettings,

    // --- Live for the whole renderer lifetime ---
    state: StateCache,
    transform: TransformCache,
    viewport: ViewportState,
    selector: StrategySelector,
    info: Option<DeviceInfo>,

    // --- Live between reinit and shutdown ---
    device: Option<DeviceState>,
    max_anisotropy: f32,
}

impl<D: GraphicsDriver> fmt::Debug for Renderer<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("settings", &self.settings)
            .field("state", &self.state)
            .field("transform", &self.transform)
            .field("viewport", &self.viewport)
            .field("info", &self.info)
            .field("device", &self.device)
            .field("max_anisotropy", &self.max_anisotropy)
            .finish_non_exhaustive()
    }
}

impl<D: GraphicsDriver> Renderer<D> {
    /// Creates an uninitialized renderer.
    ///
    /// Nothing is sent to the driver until [`initialize`](Self::initialize).
    pub fn new(driver: D, surface: Box<dyn RenderSurface>, settings: VideoSettings) -> Self {
        log::info!("Renderer created (uninitialized).");
        Self {
            driver,
            surface,
            state: StateCache::new(settings.colorkey_alpha_to_coverage),
            settings,
            transform: TransformCache::new(),
            viewport: ViewportState::default(),
            selector: StrategySelector::new(),
            info: None,
            device: None,
            max_anisotropy: 1.0,
        }
    }

    // --- Lifecycle ---

    /// Identifies the device, publishes it to `diagnostics` and brings it up.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InitializationFailed`] if the renderer was already
    /// initialized or the driver has no extension loader, and any error of
    /// [`reinit`](Self::reinit).
    pub fn initialize(
        &mut self,
        diagnostics: &mut dyn DiagnosticsSink,
        textures: &mut dyn TextureRegistry,
    ) -> Result<(), RenderError> {
        if self.info.is_some() {
            return Err(RenderError::InitializationFailed(
                "Renderer is already initialized.".to_owned(),
            ));
        }
        log::info!("Renderer: Initializing...");

        let info = capabilities::describe_device(&self.driver, diagnostics)?;
        self.info = Some(info);
        self.reinit(textures)
    }

    /// Brings up a freshly created device: probes it, puts it in the baseline
    /// state, creates the texture stages and restores the registry's textures.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NotInitialized`] before [`initialize`](Self::initialize),
    /// or the error of the first texture that could not be restored.
    pub fn reinit(&mut self, textures: &mut dyn TextureRegistry) -> Result<(), RenderError> {
        if self.info.is_none() {
            return Err(RenderError::NotInitialized);
        }
        if self.device.is_some() {
            log::debug!("Renderer: reinit on a live device, shutting it down first");
            self.state.reset(&mut self.driver);
            self.shutdown(textures);
        }

        let caps = capabilities::probe_capabilities(&self.driver, &self.settings);

        if caps.msaa_samples > 0 {
            self.driver.disable(Capability::Multisample);
        }
        self.state.synchronize(&mut self.driver);
        self.driver.pixel_alignment(1);

        let stages = TextureStageArray::new(caps.texture_units);
        let supported_anisotropy = caps.max_anisotropy;
        let msaa_samples = caps.msaa_samples;
        self.device = Some(DeviceState { caps, stages });

        let (width, height) = self.surface.drawable_size();
        self.viewport = ViewportState::default();
        self.set_viewport(Rect::from_size(width as i32, height as i32));
        self.transform.invalidate();
        self.clear(&ClearRequest::default());

        textures.restore_all(&mut self.driver)?;

        if supported_anisotropy > 1.0 {
            self.set_max_anisotropy(self.settings.max_anisotropic_filtering as f32, textures);
        }

        if self.settings.antialiasing {
            self.set_antialiasing(true);
        }

        log::debug!(
            "Renderer: device ready ({width}x{height}, {msaa_samples}x MSAA, {supported_anisotropy}x anisotropy)"
        );
        Ok(())
    }

    /// Tears down the device-lifetime resources and releases every texture.
    ///
    /// Vertex buffers must be destroyed by their owners before this is called.
    pub fn shutdown(&mut self, textures: &mut dyn TextureRegistry) {
        if self.device.take().is_none() {
            return;
        }
        textures.release_all(&mut self.driver);
        self.max_anisotropy = 1.0;
        log::debug!("Renderer: device shut down");
    }

    /// Must be called before the window is resized or switches fullscreen mode.
    pub fn before_resize(&mut self, fullscreen_involved: bool, textures: &mut dyn TextureRegistry) {
        if self.device.is_some() && device_reset_required(fullscreen_involved) {
            log::debug!("Renderer: window change destroys the context");
            self.shutdown(textures);
        }
    }

    /// Must be called after the window was resized. Brings the device back up
    /// if [`before_resize`](Self::before_resize) shut it down.
    ///
    /// # Errors
    ///
    /// See [`reinit`](Self::reinit).
    pub fn after_resize(&mut self, textures: &mut dyn TextureRegistry) -> Result<(), RenderError> {
        if self.device.is_none() && self.info.is_some() {
            return self.reinit(textures);
        }
        let (width, height) = self.surface.drawable_size();
        self.set_viewport(Rect::from_size(width as i32, height as i32));
        Ok(())
    }

    /// Returns `true` while the device is up.
    pub fn is_initialized(&self) -> bool {
        self.device.is_some()
    }

    /// The capabilities of the current device.
    pub fn capabilities(&self) -> Option<&DeviceCapabilities> {
        self.device.as_ref().map(|d| &d.caps)
    }

    /// The identification of the device, once initialized.
    pub fn device_info(&self) -> Option<&DeviceInfo> {
        self.info.as_ref()
    }

    /// The driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// The driver, mutably. Calls made through it bypass every cache.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// The settings the renderer was created with.
    pub fn settings(&self) -> &VideoSettings {
        &self.settings
    }

    /// The current drawable size.
    pub fn drawable_size(&self) -> (u32, u32) {
        self.surface.drawable_size()
    }

    /// The vertex buffer strategy selector.
    pub fn strategy_selector(&self) -> &StrategySelector {
        &self.selector
    }

    // --- Cached pipeline state ---

    /// The pipeline state cache.
    pub fn pipeline_state(&self) -> &StateCache {
        &self.state
    }

    /// Requests a cull mode.
    pub fn set_cull(&mut self, mode: CullMode) {
        self.state.set_cull(mode);
    }

    /// Requests fog on or off.
    pub fn set_fog(&mut self, enable: bool) {
        self.state.set_fog(enable);
    }

    /// Requests color keying on or off.
    pub fn set_color_key(&mut self, enable: bool) {
        self.state.set_color_key(enable);
    }

    /// Requests depth testing on or off.
    pub fn set_depth_test(&mut self, enable: bool) {
        self.state.set_depth_test(enable);
    }

    /// Requests depth writes on or off.
    pub fn set_depth_write(&mut self, enable: bool) {
        self.state.set_depth_write(enable);
    }

    /// Requests a depth bias in integer units.
    pub fn set_depth_offset(&mut self, offset: i32) {
        self.state.set_depth_offset(offset);
    }

    /// Requests blend factors. `One`/`Zero` disables blending.
    pub fn set_blend(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.state.set_blend(src, dst);
    }

    /// Switches between alpha-to-coverage and the alpha test for color keying
    /// while multisampling.
    pub fn set_colorkey_alpha_to_coverage(&mut self, enable: bool) {
        self.settings.colorkey_alpha_to_coverage = enable;
        self.state.set_alpha_to_coverage(&mut self.driver, enable);
    }

    // --- Immediate state ---

    /// Sets the fog color.
    pub fn set_fog_color(&mut self, color: Color) {
        self.driver.fog_color(color.to_linear());
    }

    /// Sets the linear fog range.
    pub fn set_fog_range(&mut self, start: f32, end: f32) {
        self.driver.fog_range(start, end);
    }

    /// Sets the alpha test function; `reference` is in `[0, 1]`.
    pub fn set_alpha_func(&mut self, func: CompareFunction, reference: f32) {
        self.driver.alpha_func(func, reference);
    }

    /// Switches between wireframe and solid rasterization.
    pub fn set_fill_mode(&mut self, mode: FillMode) {
        self.driver.fill_mode(mode);
    }

    /// Enables or disables multisample antialiasing.
    ///
    /// Ignored without multisample buffers, when enabling while the
    /// `antialiasing` setting is off, or when nothing changes.
    pub fn set_antialiasing(&mut self, enable: bool) {
        let Some(device) = &self.device else {
            return;
        };
        if device.caps.msaa_samples == 0 {
            return;
        }
        if enable && !self.settings.antialiasing {
            return;
        }
        if enable == self.state.is_msaa_active() {
            return;
        }
        self.state.set_multisample(&mut self.driver, enable);
    }

    /// Changes the anisotropy ceiling of every texture.
    ///
    /// The value is clamped to what the device supports. Textures pick up the
    /// new value lazily, the next time they are bound.
    pub fn set_max_anisotropy(&mut self, value: f32, textures: &mut dyn TextureRegistry) {
        let supported = self.capabilities().map_or(1.0, |c| c.max_anisotropy);
        let value = value.clamp(1.0, supported.max(1.0));
        if value == self.max_anisotropy {
            return;
        }
        self.max_anisotropy = value;
        textures.set_max_anisotropy(value);
    }

    /// The current anisotropy ceiling.
    pub fn max_anisotropy(&self) -> f32 {
        self.max_anisotropy
    }

    // --- Texture stages ---

    /// The texture stages of the current device.
    pub fn texture_stages(&self) -> Option<&TextureStageArray> {
        self.device.as_ref().map(|d| &d.stages)
    }

    /// Requests a texture on a stage. `None` unbinds.
    ///
    /// Handles the registry does not know (or whose texture is released) unbind as well.
    pub fn set_texture(
        &mut self,
        stage: usize,
        texture: Option<TextureHandle>,
        textures: &mut dyn TextureRegistry,
    ) {
        let Some(device) = &mut self.device else {
            return;
        };
        let id = texture.and_then(|handle| textures.resolve(handle, &mut self.driver));
        device.stages.set_texture(stage, id);
    }

    /// Requests a wrap mode on a stage.
    pub fn set_texture_wrap(&mut self, stage: usize, wrap: WrapMode) {
        if let Some(device) = &mut self.device {
            device.stages.set_wrap(stage, wrap);
        }
    }

    /// Requests filters on a stage.
    pub fn set_texture_filters(
        &mut self,
        stage: usize,
        min: FilterMode,
        mag: FilterMode,
        mip: Option<FilterMode>,
    ) {
        if let Some(device) = &mut self.device {
            device.stages.set_filters(stage, min, mag, mip);
        }
    }

    /// Deletes a texture and drops every stage reference to it.
    pub fn delete_texture(&mut self, handle: TextureHandle, textures: &mut TextureTable) {
        if let Some(id) = textures.remove(handle, &mut self.driver) {
            if let Some(device) = &mut self.device {
                device.stages.forget(id);
            }
        }
    }

    // --- Transform ---

    /// Sets the view matrix used by world-space draws.
    pub fn set_view_matrix(&mut self, view: &Mat4) {
        self.transform.set_view(view);
    }

    /// The view matrix.
    pub fn view_matrix(&self) -> &Mat4 {
        self.transform.view()
    }

    /// Sets the projection matrix used by world-space draws.
    pub fn set_projection_matrix(&mut self, projection: &Mat4) {
        self.transform.set_projection(projection);
    }

    /// The projection matrix.
    pub fn projection_matrix(&self) -> &Mat4 {
        self.transform.projection()
    }

    /// The transform currently loaded in the driver.
    pub fn transform_mode(&self) -> TransformMode {
        self.transform.mode()
    }

    // --- Viewport, scissor and clear ---

    /// Sets the viewport, in top-left-origin pixels.
    pub fn set_viewport(&mut self, rect: Rect) {
        let height = self.drawable_height();
        if self.viewport.set(&mut self.driver, rect, height) {
            self.transform.viewport_changed();
        }
    }

    /// The current viewport.
    pub fn viewport(&self) -> Rect {
        *self.viewport.current()
    }

    /// Restricts rendering to `rect`; an invalid rectangle lifts the restriction.
    pub fn set_scissor(&mut self, rect: &Rect) {
        let height = self.drawable_height();
        viewport::set_scissor(&mut self.driver, rect, height);
    }

    /// Clears the drawable or a set of regions of it.
    pub fn clear(&mut self, request: &ClearRequest<'_>) {
        if request.flags.contains(ClearFlags::DEPTH) {
            self.state.ensure_depth_write(&mut self.driver);
        }
        let height = self.drawable_height();
        viewport::clear(&mut self.driver, request, height);
    }

    fn drawable_height(&self) -> i32 {
        self.surface.drawable_size().1 as i32
    }

    // --- Vertex buffers and draws ---

    /// Creates a vertex buffer with the strategy the device and settings allow.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NotInitialized`] without a device, or the driver's
    /// resource error if the allocation fails.
    pub fn create_vertex_buffer<V: Vertex>(
        &mut self,
        capacity: usize,
        usage: BufferUsage,
    ) -> Result<VertexBuffer<V>, RenderError> {
        let device = self.device.as_ref().ok_or(RenderError::NotInitialized)?;
        let strategy = self
            .selector
            .select(&device.caps, usage, &self.settings.buffer_upload);
        Ok(VertexBuffer::with_strategy(
            &mut self.driver,
            strategy,
            usage,
            capacity,
        )?)
    }

    /// Writes vertices into a buffer. See [`VertexBuffer::write`].
    pub fn write_vertices<V: Vertex>(
        &mut self,
        buffer: &mut VertexBuffer<V>,
        offset: usize,
        vertices: &[V],
        flags: LockFlags,
    ) {
        buffer.write(&mut self.driver, offset, vertices, flags);
    }

    /// Releases a vertex buffer.
    pub fn destroy_vertex_buffer<V: Vertex>(&mut self, buffer: VertexBuffer<V>) {
        buffer.destroy(&mut self.driver);
    }

    /// Draws `count` vertices of a buffer starting at `first`.
    pub fn draw_buffer<V: Vertex>(
        &mut self,
        buffer: &mut VertexBuffer<V>,
        primitive: Primitive,
        first: usize,
        count: usize,
    ) {
        if self.before_draw(V::LAYOUT) {
            buffer.draw(&mut self.driver, primitive, first, count);
        }
    }

    /// Draws indexed vertices of a buffer. Indices are relative to `base_vertex`.
    pub fn draw_buffer_indexed<V: Vertex>(
        &mut self,
        buffer: &mut VertexBuffer<V>,
        primitive: Primitive,
        base_vertex: usize,
        vertex_count: usize,
        indices: &[u16],
    ) {
        if self.before_draw(V::LAYOUT) {
            buffer.draw_indexed(&mut self.driver, primitive, base_vertex, vertex_count, indices);
        }
    }

    /// Draws vertices from client memory.
    pub fn draw<V: Vertex>(&mut self, primitive: Primitive, vertices: &[V]) {
        if self.before_draw(V::LAYOUT) {
            let bytes: &[u8] = bytemuck::cast_slice(vertices);
            self.driver
                .draw(primitive, V::LAYOUT, VertexSource::Client(bytes), 0, vertices.len());
        }
    }

    /// Draws indexed vertices from client memory.
    pub fn draw_indexed<V: Vertex>(
        &mut self,
        primitive: Primitive,
        vertices: &[V],
        indices: &[u16],
    ) {
        if self.before_draw(V::LAYOUT) {
            let bytes: &[u8] = bytemuck::cast_slice(vertices);
            self.driver.draw_indexed(
                primitive,
                V::LAYOUT,
                VertexSource::Client(bytes),
                0,
                vertices.len(),
                indices,
            );
        }
    }

    /// Flushes every cache ahead of a draw with the given layout.
    ///
    /// Returns `false` if the draw must be skipped.
    fn before_draw(&mut self, layout: VertexLayout) -> bool {
        let Some(device) = &mut self.device else {
            log::warn!("Renderer: draw call skipped, the device is not initialized");
            return false;
        };

        self.state.flush(&mut self.driver);
        device.stages.flush(&mut self.driver);

        if layout.is_screen_space() {
            self.transform
                .disable(&mut self.driver, self.viewport.current());
        } else {
            self.transform.enable(&mut self.driver);
        }
        true
    }

    // --- Snapshots ---

    /// Reads the drawable back into an image, top row first.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NotInitialized`] without a device.
    pub fn snapshot(&mut self) -> Result<RgbImage, RenderError> {
        if self.device.is_none() {
            return Err(RenderError::NotInitialized);
        }
        let (width, height) = self.surface.drawable_size();
        let row_len = width as usize * 3;
        let mut pixels = vec![0u8; row_len * height as usize];
        self.driver.read_pixels(0, 0, width, height, &mut pixels);

        // The driver returns the bottom row first.
        let flipped: Vec<u8> = pixels
            .chunks_exact(row_len.max(1))
            .rev()
            .flatten()
            .copied()
            .collect();

        RgbImage::from_raw(width, height, flipped).ok_or_else(|| {
            RenderError::Internal(format!("read-back does not fit a {width}x{height} image"))
        })
    }

    /// Reads the drawable back and scales it to `width` x `height`.
    ///
    /// # Errors
    ///
    /// See [`snapshot`](Self::snapshot).
    pub fn snapshot_resized(&mut self, width: u32, height: u32) -> Result<RgbImage, RenderError> {
        let full = self.snapshot()?;
        if full.dimensions() == (width, height) {
            return Ok(full);
        }
        Ok(imageops::resize(
            &full,
            width,
            height,
            imageops::FilterType::Triangle,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::NullDiagnostics;
    use crate::renderer::recording::{DriverCall, DriverProfile, RecordingDriver};
    use crate::renderer::traits::FixedSurface;

    fn renderer(profile: DriverProfile) -> Renderer<RecordingDriver> {
        Renderer::new(
            RecordingDriver::new(profile),
            Box::new(FixedSurface::new(64, 32)),
            VideoSettings::default(),
        )
    }

    #[test]
    fn draws_before_initialization_are_skipped() {
        let mut renderer = renderer(DriverProfile::modern());
        renderer.set_fog(true);
        renderer.draw::<crate::renderer::api::MeshVertex>(Primitive::TriangleList, &[]);
        assert!(renderer.driver().calls().is_empty());
    }

    #[test]
    fn initialize_twice_fails() {
        let mut renderer = renderer(DriverProfile::modern());
        let mut textures = TextureTable::new();
        renderer
            .initialize(&mut NullDiagnostics, &mut textures)
            .unwrap();
        assert!(matches!(
            renderer.initialize(&mut NullDiagnostics, &mut textures),
            Err(RenderError::InitializationFailed(_))
        ));
    }

    #[test]
    fn reinit_enables_antialiasing_from_settings() {
        let mut renderer = renderer(DriverProfile::modern());
        renderer
            .initialize(&mut NullDiagnostics, &mut TextureTable::new())
            .unwrap();
        assert!(renderer.pipeline_state().is_msaa_active());
        assert!(renderer
            .driver()
            .calls()
            .contains(&DriverCall::Enable(Capability::Multisample)));
        assert_eq!(renderer.max_anisotropy(), 16.0);
    }

    #[test]
    fn antialiasing_needs_sample_buffers() {
        let mut renderer = renderer(DriverProfile::legacy());
        renderer
            .initialize(&mut NullDiagnostics, &mut TextureTable::new())
            .unwrap();
        renderer.set_antialiasing(true);
        assert!(!renderer.pipeline_state().is_msaa_active());
    }

    #[test]
    fn platform_reset_policy() {
        if cfg!(target_os = "linux") {
            assert!(!device_reset_required(true));
            assert!(!device_reset_required(false));
        } else if cfg!(target_os = "windows") {
            assert!(device_reset_required(true));
            assert!(!device_reset_required(false));
        } else if cfg!(target_os = "macos") {
            assert!(device_reset_required(false));
        }
    }
}
