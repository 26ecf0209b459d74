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

//! Inspection of the graphics driver at device initialization.
//!
//! [`describe_device`] identifies the driver, logs it and publishes it to the
//! crash diagnostics. [`probe_capabilities`] turns the extension set into the
//! feature flags the rest of the renderer consults. Missing optional features
//! are logged as warnings and disabled; only a missing extension loader is fatal.

use crate::diagnostics::DiagnosticsSink;
use crate::renderer::api::{DriverString, FloatQuery, IntegerQuery};
use crate::renderer::error::RenderError;
use crate::renderer::settings::VideoSettings;
use crate::renderer::traits::CapabilitySource;

/// Extension names the probe looks for.
pub mod extensions {
    /// Non-power-of-two texture sizes.
    pub const TEXTURE_NPOT: &str = "GL_ARB_texture_non_power_of_two";
    /// `glDrawElementsBaseVertex`.
    pub const DRAW_ELEMENTS_BASE_VERTEX: &str = "GL_ARB_draw_elements_base_vertex";
    /// `glMapBufferRange`.
    pub const MAP_BUFFER_RANGE: &str = "GL_ARB_map_buffer_range";
    /// Immutable, persistently mapped buffer storage.
    pub const BUFFER_STORAGE: &str = "GL_ARB_buffer_storage";
    /// Anisotropic texture filtering.
    pub const TEXTURE_FILTER_ANISOTROPIC: &str = "GL_EXT_texture_filter_anisotropic";
    /// NVIDIA video memory queries.
    pub const NVX_GPU_MEMORY_INFO: &str = "GL_NVX_gpu_memory_info";
    /// AMD video memory queries.
    pub const ATI_MEMINFO: &str = "GL_ATI_meminfo";
}

/// Diagnostics keys published by [`describe_device`].
pub mod keys {
    /// Extension loader version.
    pub const LOADER: &str = "GL loader";
    /// Driver version string.
    pub const VERSION: &str = "OpenGL version";
    /// Driver vendor string.
    pub const VENDOR: &str = "OpenGL vendor";
    /// Device name.
    pub const DEVICE: &str = "OpenGL device";
    /// Total video memory in bytes.
    pub const VRAM_SIZE: &str = "VRAM size";
    /// Available video memory in bytes.
    pub const VRAM_AVAILABLE: &str = "VRAM available";
    /// Library credits entry.
    pub const CREDITS: &str = "graphics";
}

/// Identification of the graphics device.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceInfo {
    /// Extension loader version.
    pub loader: String,
    /// Full driver version string.
    pub version: String,
    /// Vendor string.
    pub vendor: String,
    /// Device string.
    pub device: String,
    /// Total video memory in bytes, `0` if unknown.
    pub vram_total: u64,
    /// Available video memory in bytes, `0` if unknown.
    pub vram_free: u64,
}

impl DeviceInfo {
    /// Human readable VRAM summary, e.g. `"8192 MiB, 6000 MiB free"` or `"(unknown)"`.
    pub fn vram_summary(&self) -> String {
        const MIB: u64 = 1024 * 1024;
        let mut parts = Vec::with_capacity(2);
        if self.vram_total != 0 {
            parts.push(format!("{} MiB", self.vram_total / MIB));
        }
        if self.vram_free != 0 {
            parts.push(format!("{} MiB free", self.vram_free / MIB));
        }
        if parts.is_empty() {
            "(unknown)".to_owned()
        } else {
            parts.join(", ")
        }
    }

    /// The library credits line: loader on the first line, API version on the second.
    pub fn credits(&self) -> String {
        let version = self.version.split_whitespace().next().unwrap_or_default();
        format!("{}\nOpenGL {version}", self.loader)
    }
}

/// Feature flags of the current device. Immutable between device init and shutdown.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeviceCapabilities {
    /// Textures may have non-power-of-two sizes.
    pub texture_npot: bool,
    /// Largest supported anisotropic filtering level, `1.0` if unsupported.
    pub max_anisotropy: f32,
    /// Immutable persistent-mapped buffer storage is available.
    pub buffer_storage: bool,
    /// Buffer ranges can be mapped.
    pub map_buffer_range: bool,
    /// Indexed draws can use a base vertex.
    pub draw_base_vertex: bool,
    /// Multisample count of the default framebuffer, `0` without multisampling.
    pub msaa_samples: u32,
    /// Vertex arrays can be used for client-memory draws.
    pub vertex_arrays: bool,
    /// GPU vertex buffers are used.
    pub vertex_buffers: bool,
    /// Number of texture units.
    pub texture_units: usize,
}

/// Identifies the device, logs it and publishes it to `diagnostics`.
///
/// # Errors
///
/// Returns [`RenderError::InitializationFailed`] if the driver has no
/// extension loader. No further driver call is safe in that case.
pub fn describe_device(
    source: &dyn CapabilitySource,
    diagnostics: &mut dyn DiagnosticsSink,
) -> Result<DeviceInfo, RenderError> {
    let Some(loader) = source.loader_version() else {
        log::error!("GL extension loader initialization failed");
        return Err(RenderError::InitializationFailed(
            "no OpenGL extension loader available".to_owned(),
        ));
    };
    log::info!("Using GL loader {loader}");
    diagnostics.set_text(keys::LOADER, &loader);

    let version = source.driver_string(DriverString::Version);
    log::info!("Using OpenGL {version}");
    diagnostics.set_text(keys::VERSION, &version);

    let vendor = source.driver_string(DriverString::Vendor);
    log::info!(" ├─ Vendor: {vendor}");
    diagnostics.set_text(keys::VENDOR, &vendor);

    let device = source.driver_string(DriverString::Device);
    log::info!(" ├─ Device: {device}");
    diagnostics.set_text(keys::DEVICE, &device);

    let (vram_total, vram_free) = query_vram(source);
    let info = DeviceInfo {
        loader,
        version,
        vendor,
        device,
        vram_total,
        vram_free,
    };

    if vram_total != 0 {
        diagnostics.set_number(keys::VRAM_SIZE, vram_total);
    }
    if vram_free != 0 {
        diagnostics.set_number(keys::VRAM_AVAILABLE, vram_free);
    }
    log::info!(" └─ VRAM: {}", info.vram_summary());

    diagnostics.set_library_credits(keys::CREDITS, &info.credits());

    Ok(info)
}

/// Total and free video memory in bytes, from whichever vendor extension exists.
///
/// Unknown values are `0`.
pub fn query_vram(source: &dyn CapabilitySource) -> (u64, u64) {
    let kib = |query: IntegerQuery| u64::try_from(source.query_integer(query)).unwrap_or(0) * 1024;

    if source.has_extension(extensions::NVX_GPU_MEMORY_INFO) {
        (
            kib(IntegerQuery::DedicatedVideoMemory),
            kib(IntegerQuery::AvailableVideoMemory),
        )
    } else if source.has_extension(extensions::ATI_MEMINFO) {
        let free = kib(IntegerQuery::VboFreeMemory).max(kib(IntegerQuery::TextureFreeMemory));
        (0, free)
    } else {
        (0, 0)
    }
}

/// Derives the capability flags of the current device.
pub fn probe_capabilities(
    source: &dyn CapabilitySource,
    settings: &VideoSettings,
) -> DeviceCapabilities {
    let mut texture_npot =
        source.has_extension(extensions::TEXTURE_NPOT) || source.supports_version(2, 0);
    if !texture_npot {
        log::warn!("Missing OpenGL extension ARB_texture_non_power_of_two.");
    } else if !source.supports_version(3, 0)
        && source.query_integer(IntegerQuery::MaxTextureSize) < 8192
    {
        log::warn!("Old hardware detected, ignoring OpenGL extension ARB_texture_non_power_of_two.");
        texture_npot = false;
    }

    let vertex_arrays = !cfg!(target_arch = "wasm32");

    let draw_base_vertex = source.has_extension(extensions::DRAW_ELEMENTS_BASE_VERTEX)
        || source.supports_version(3, 2);
    if !draw_base_vertex {
        log::warn!("Missing OpenGL extension ARB_draw_elements_base_vertex!");
    }

    let map_buffer_range =
        source.has_extension(extensions::MAP_BUFFER_RANGE) || source.supports_version(3, 0);
    let buffer_storage =
        source.has_extension(extensions::BUFFER_STORAGE) || source.supports_version(4, 4);

    let vertex_buffers = vertex_arrays && settings.vertex_buffers;
    if vertex_buffers && !map_buffer_range {
        log::warn!("Missing OpenGL extension ARB_map_buffer_range, VBO performance will suffer.");
    }

    let msaa_samples = if source.query_integer(IntegerQuery::SampleBuffers) > 0 {
        u32::try_from(source.query_integer(IntegerQuery::Samples)).unwrap_or(0)
    } else {
        0
    };

    let texture_units =
        usize::try_from(source.query_integer(IntegerQuery::MaxTextureUnits)).unwrap_or(0);

    let max_anisotropy = if source.has_extension(extensions::TEXTURE_FILTER_ANISOTROPIC) {
        source
            .query_float(FloatQuery::MaxTextureMaxAnisotropy)
            .max(1.0)
    } else {
        log::warn!("Missing OpenGL extension EXT_texture_filter_anisotropic.");
        1.0
    };

    let caps = DeviceCapabilities {
        texture_npot,
        max_anisotropy,
        buffer_storage,
        map_buffer_range,
        draw_base_vertex,
        msaa_samples,
        vertex_arrays,
        vertex_buffers,
        texture_units,
    };
    log::debug!("Device capabilities: {caps:?}");
    caps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticValue;
    use crate::renderer::recording::DriverProfile;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct MapSink(BTreeMap<String, DiagnosticValue>);

    impl DiagnosticsSink for MapSink {
        fn set_text(&mut self, key: &str, value: &str) {
            self.0
                .insert(key.to_owned(), DiagnosticValue::Text(value.to_owned()));
        }

        fn set_number(&mut self, key: &str, value: u64) {
            self.0.insert(key.to_owned(), DiagnosticValue::Number(value));
        }
    }

    #[test]
    fn missing_loader_is_fatal() {
        let profile = DriverProfile::modern().without_loader();
        let mut sink = MapSink::default();
        let result = describe_device(&profile, &mut sink);
        assert!(matches!(result, Err(RenderError::InitializationFailed(_))));
        assert!(sink.0.is_empty());
    }

    #[test]
    fn publishes_identification_and_nvidia_vram() {
        let profile = DriverProfile::modern()
            .with_extension(extensions::NVX_GPU_MEMORY_INFO)
            .with_integer(IntegerQuery::DedicatedVideoMemory, 8 * 1024 * 1024)
            .with_integer(IntegerQuery::AvailableVideoMemory, 6 * 1024 * 1024);
        let mut sink = MapSink::default();
        let info = describe_device(&profile, &mut sink).unwrap();

        assert_eq!(info.vram_total, 8 * 1024 * 1024 * 1024);
        assert_eq!(info.vram_summary(), "8192 MiB, 6144 MiB free");
        assert_eq!(
            sink.0.get(keys::VRAM_SIZE),
            Some(&DiagnosticValue::Number(8 * 1024 * 1024 * 1024))
        );
        assert_eq!(
            sink.0.get(keys::VERSION),
            Some(&DiagnosticValue::Text(profile.version_string.clone()))
        );
        assert!(sink.0.contains_key(keys::CREDITS));
    }

    #[test]
    fn ati_reports_the_larger_free_pool() {
        let profile = DriverProfile::modern()
            .with_extension(extensions::ATI_MEMINFO)
            .with_integer(IntegerQuery::VboFreeMemory, 1024)
            .with_integer(IntegerQuery::TextureFreeMemory, 4096);
        let info = describe_device(&profile, &mut MapSink::default()).unwrap();
        assert_eq!(info.vram_total, 0);
        assert_eq!(info.vram_free, 4096 * 1024);
        assert_eq!(info.vram_summary(), "4 MiB free");
    }

    #[test]
    fn unknown_vram() {
        let info = DeviceInfo::default();
        assert_eq!(info.vram_summary(), "(unknown)");
    }

    #[test]
    fn credits_keep_the_first_version_token() {
        let info = DeviceInfo {
            loader: "glow 0.16".to_owned(),
            version: "4.6.0 NVIDIA 550.54".to_owned(),
            ..DeviceInfo::default()
        };
        assert_eq!(info.credits(), "glow 0.16\nOpenGL 4.6.0");
    }

    #[test]
    fn modern_profile_capabilities() {
        let caps = probe_capabilities(&DriverProfile::modern(), &VideoSettings::default());
        assert!(caps.texture_npot);
        assert!(caps.buffer_storage);
        assert!(caps.map_buffer_range);
        assert!(caps.vertex_buffers);
        assert_eq!(caps.msaa_samples, 4);
        assert_eq!(caps.max_anisotropy, 16.0);
    }

    #[test]
    fn old_hardware_loses_npot() {
        let profile = DriverProfile::legacy()
            .with_extension(extensions::TEXTURE_NPOT)
            .with_integer(IntegerQuery::MaxTextureSize, 4096);
        let caps = probe_capabilities(&profile, &VideoSettings::default());
        assert!(!caps.texture_npot);
    }

    #[test]
    fn sample_count_uses_the_samples_query() {
        let profile = DriverProfile::modern()
            .with_integer(IntegerQuery::SampleBuffers, 1)
            .with_integer(IntegerQuery::Samples, 8);
        let caps = probe_capabilities(&profile, &VideoSettings::default());
        assert_eq!(caps.msaa_samples, 8);

        let profile = profile.with_integer(IntegerQuery::SampleBuffers, 0);
        let caps = probe_capabilities(&profile, &VideoSettings::default());
        assert_eq!(caps.msaa_samples, 0);
    }

    #[test]
    fn settings_can_disable_vertex_buffers() {
        let settings = VideoSettings {
            vertex_buffers: false,
            ..VideoSettings::default()
        };
        let caps = probe_capabilities(&DriverProfile::modern(), &settings);
        assert!(caps.vertex_arrays);
        assert!(!caps.vertex_buffers);
    }
}
