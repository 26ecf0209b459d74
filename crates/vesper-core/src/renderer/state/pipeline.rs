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

//! The value type describing the cached part of the pipeline configuration.

use crate::renderer::api::{BlendFactor, CullMode};

/// A snapshot of the pipeline state handled by the [`StateCache`](super::StateCache).
///
/// The default value is the state the driver is put into when the device is
/// (re)initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineState {
    /// Face culling.
    pub cull: CullMode,
    /// Linear fog.
    pub fog: bool,
    /// Color keying: texels with zero alpha are discarded.
    pub color_key: bool,
    /// Depth testing (`LessEqual` when on, `Always` when off).
    pub depth_test: bool,
    /// Depth writes.
    pub depth_write: bool,
    /// Depth bias in integer units. Positive values pull geometry toward the viewer.
    pub depth_offset: i32,
    /// Source blend factor.
    pub blend_src: BlendFactor,
    /// Destination blend factor.
    pub blend_dst: BlendFactor,
}

impl PipelineState {
    /// Returns `true` unless the blend factors are the pass-through `One`/`Zero`.
    #[inline]
    pub fn is_blend_enabled(&self) -> bool {
        !(self.blend_src == BlendFactor::One && self.blend_dst == BlendFactor::Zero)
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            cull: CullMode::None,
            fog: false,
            color_key: false,
            depth_test: false,
            depth_write: true,
            depth_offset: 0,
            blend_src: BlendFactor::One,
            blend_dst: BlendFactor::Zero,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_zero_is_not_blending() {
        let mut state = PipelineState::default();
        assert!(!state.is_blend_enabled());

        state.blend_src = BlendFactor::SrcAlpha;
        state.blend_dst = BlendFactor::InvSrcAlpha;
        assert!(state.is_blend_enabled());

        state.blend_src = BlendFactor::One;
        state.blend_dst = BlendFactor::One;
        assert!(state.is_blend_enabled());
    }
}
