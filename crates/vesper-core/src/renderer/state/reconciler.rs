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

//! Lazy reconciliation of requested pipeline state against driver state.
//!
//! Setters only touch the *requested* snapshot. [`StateCache::flush`] diffs it
//! against the *applied* snapshot right before a draw and emits one driver call
//! group per differing field, in a fixed order:
//!
//! ```text
//! cull -> fog -> color key -> depth test -> depth write -> depth offset -> blend
//! ```

use super::PipelineState;
use crate::renderer::api::{BlendFactor, Capability, CompareFunction, CullMode, Face};
use crate::renderer::traits::GraphicsDriver;

/// The requested/applied pipeline state pair.
#[derive(Debug, Clone)]
pub struct StateCache {
    /// What callers asked for. May race ahead of the driver arbitrarily.
    requested: PipelineState,
    /// What the driver has been told to assume.
    applied: PipelineState,
    /// The face last passed to `cull_face`, kept separately from the cull mode so
    /// toggling culling off and on again does not re-send it.
    cull_face: Face,
    /// Multisampling is currently active.
    msaa_active: bool,
    /// Color keying prefers alpha-to-coverage while multisampling.
    alpha_to_coverage: bool,
}

impl StateCache {
    /// Creates a cache. [`synchronize`](Self::synchronize) must run before the first flush.
    pub fn new(colorkey_alpha_to_coverage: bool) -> Self {
        Self {
            requested: PipelineState::default(),
            applied: PipelineState::default(),
            cull_face: Face::Back,
            msaa_active: false,
            alpha_to_coverage: colorkey_alpha_to_coverage,
        }
    }

    /// Puts a freshly created device into the state described by
    /// [`PipelineState::default`] and resets the applied snapshot to match.
    ///
    /// The requested snapshot is kept so the next flush restores it.
    pub fn synchronize(&mut self, driver: &mut dyn GraphicsDriver) {
        self.msaa_active = false;

        self.cull_face = Face::Back;

        driver.fog_mode_linear();
        driver.alpha_func(CompareFunction::NotEqual, 0.0);

        // Depth testing stays enabled; "off" is expressed as `Always` so depth
        // writes keep working.
        driver.enable(Capability::DepthTest);
        driver.depth_func(CompareFunction::Always);

        driver.enable(Capability::PolygonOffsetFill);

        driver.enable(Capability::Blend);
        driver.blend_func(BlendFactor::One, BlendFactor::Zero);

        self.applied = PipelineState::default();
        log::trace!("Pipeline state cache synchronized");
    }

    // --- Setters (requested snapshot only) ---

    /// Requests a cull mode.
    #[inline]
    pub fn set_cull(&mut self, mode: CullMode) {
        self.requested.cull = mode;
    }

    /// Requests fog on or off.
    #[inline]
    pub fn set_fog(&mut self, enable: bool) {
        self.requested.fog = enable;
    }

    /// Requests color keying on or off.
    #[inline]
    pub fn set_color_key(&mut self, enable: bool) {
        self.requested.color_key = enable;
    }

    /// Requests depth testing on or off.
    #[inline]
    pub fn set_depth_test(&mut self, enable: bool) {
        self.requested.depth_test = enable;
    }

    /// Requests depth writes on or off.
    #[inline]
    pub fn set_depth_write(&mut self, enable: bool) {
        self.requested.depth_write = enable;
    }

    /// Requests a depth bias in integer units.
    #[inline]
    pub fn set_depth_offset(&mut self, offset: i32) {
        self.requested.depth_offset = offset;
    }

    /// Requests blend factors. `One`/`Zero` disables blending.
    #[inline]
    pub fn set_blend(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.requested.blend_src = src;
        self.requested.blend_dst = dst;
    }

    /// Changes the color-key alpha-to-coverage preference.
    ///
    /// A color key already applied to the driver is taken down with the old
    /// mechanism before the preference flips.
    pub fn set_alpha_to_coverage(&mut self, driver: &mut dyn GraphicsDriver, enable: bool) {
        if self.alpha_to_coverage == enable {
            return;
        }
        self.retire_color_key(driver);
        self.alpha_to_coverage = enable;
    }

    // --- Accessors ---

    /// The requested snapshot.
    pub fn requested(&self) -> &PipelineState {
        &self.requested
    }

    /// The snapshot the driver currently reflects.
    pub fn applied(&self) -> &PipelineState {
        &self.applied
    }

    /// The face the driver currently culls when culling is enabled.
    pub fn cull_face(&self) -> Face {
        self.cull_face
    }

    /// Returns `true` if multisampling is active.
    pub fn is_msaa_active(&self) -> bool {
        self.msaa_active
    }

    /// Returns `true` if a flush would emit driver calls.
    pub fn is_dirty(&self) -> bool {
        self.requested != self.applied
    }

    // --- Driver interaction ---

    /// Emits the driver calls that move the applied snapshot to the requested one.
    pub fn flush(&mut self, driver: &mut dyn GraphicsDriver) {
        if !self.is_dirty() {
            return;
        }

        let applied = self.applied;
        let requested = self.requested;

        if applied.cull != requested.cull {
            match requested.cull.face() {
                None => driver.disable(Capability::CullFace),
                Some(face) => {
                    if applied.cull == CullMode::None {
                        driver.enable(Capability::CullFace);
                    }
                    if self.cull_face != face {
                        driver.cull_face(face);
                        self.cull_face = face;
                    }
                }
            }
        }

        if applied.fog != requested.fog {
            if requested.fog {
                driver.enable(Capability::Fog);
            } else {
                driver.disable(Capability::Fog);
            }
        }

        self.flush_color_key(driver, &applied, &requested);

        if applied.depth_test != requested.depth_test {
            driver.depth_func(if requested.depth_test {
                CompareFunction::LessEqual
            } else {
                CompareFunction::Always
            });
        }

        if applied.depth_write != requested.depth_write {
            driver.depth_mask(requested.depth_write);
        }

        if applied.depth_offset != requested.depth_offset {
            let offset = -(requested.depth_offset as f32);
            driver.polygon_offset(offset, offset);
        }

        if applied.blend_src != requested.blend_src || applied.blend_dst != requested.blend_dst {
            driver.blend_func(requested.blend_src, requested.blend_dst);
        }

        self.applied = requested;
    }

    /// Color keying uses alpha-to-coverage while multisampling with blending off,
    /// and the alpha test otherwise. Alpha-to-coverage combined with blending
    /// would apply the source alpha twice, so toggling blending while color
    /// keying is on swaps one mechanism for the other.
    fn flush_color_key(
        &self,
        driver: &mut dyn GraphicsDriver,
        applied: &PipelineState,
        requested: &PipelineState,
    ) {
        let use_a2c = self.msaa_active && self.alpha_to_coverage;
        let applied_blend = applied.is_blend_enabled();
        let requested_blend = requested.is_blend_enabled();

        let changed = applied.color_key != requested.color_key
            || (use_a2c && requested.color_key && applied_blend != requested_blend);
        if !changed {
            return;
        }

        let disable_a2c =
            use_a2c && !applied_blend && (!requested.color_key || requested_blend);
        let enable_a2c = use_a2c && !requested_blend && (!applied.color_key || applied_blend);

        if applied.color_key {
            if disable_a2c {
                driver.disable(Capability::AlphaToCoverage);
            } else if !requested.color_key || enable_a2c {
                driver.disable(Capability::AlphaTest);
            }
        }

        if requested.color_key {
            if enable_a2c {
                driver.enable(Capability::AlphaToCoverage);
            } else if !applied.color_key || disable_a2c {
                driver.enable(Capability::AlphaTest);
            }
        }
    }

    /// Returns a live device to the state described by [`PipelineState::default`]
    /// so that [`synchronize`](Self::synchronize) can assume it again.
    ///
    /// The requested snapshot is kept.
    pub fn reset(&mut self, driver: &mut dyn GraphicsDriver) {
        let requested = self.requested;
        self.requested = PipelineState::default();
        self.flush(driver);
        self.requested = requested;

        if self.cull_face != Face::Back {
            driver.cull_face(Face::Back);
            self.cull_face = Face::Back;
        }
    }

    /// Takes an applied color key down with the current mechanism. The next
    /// flush re-applies it.
    fn retire_color_key(&mut self, driver: &mut dyn GraphicsDriver) {
        if self.applied.color_key {
            let color_key = self.requested.color_key;
            self.requested.color_key = false;
            self.flush(driver);
            self.requested.color_key = color_key;
        }
    }

    /// Makes sure depth writes are on in the driver, as clears respect the depth mask.
    ///
    /// Only the applied snapshot changes; the next flush restores the requested value.
    pub fn ensure_depth_write(&mut self, driver: &mut dyn GraphicsDriver) {
        if !self.applied.depth_write {
            driver.depth_mask(true);
            self.applied.depth_write = true;
        }
    }

    /// Switches multisampling on or off.
    ///
    /// The color-key mechanism differs with and without multisampling, so a
    /// color key already applied to the driver is taken down first and
    /// re-applied with the new mechanism on the next flush.
    pub fn set_multisample(&mut self, driver: &mut dyn GraphicsDriver, enable: bool) {
        self.retire_color_key(driver);

        if enable {
            driver.enable(Capability::Multisample);
        } else {
            driver.disable(Capability::Multisample);
        }
        self.msaa_active = enable;
    }
}
