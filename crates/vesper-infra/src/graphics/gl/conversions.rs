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

//! Conversions from the renderer's driver-level enums to OpenGL enumerants.

use vesper_core::renderer::api::{
    BlendFactor, BufferUsage, Capability, CompareFunction, Face, FillMode, FilterMode, Primitive,
    WrapMode,
};

/// A local extension trait converting renderer types into OpenGL enumerants.
/// This avoids Rust's orphan rules while keeping an idiomatic `.into_gl()` syntax.
pub trait IntoGl<T> {
    /// Consumes self and converts it into an OpenGL value.
    fn into_gl(self) -> T;
}

// --- Pipeline state ---

/// Where a fixed-function capability lives once the fixed-function pipeline is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityTarget {
    /// A regular `glEnable`/`glDisable` capability.
    Native(u32),
    /// Emulated fog, evaluated in the fragment shader.
    ShaderFog,
    /// Emulated alpha test, evaluated in the fragment shader.
    ShaderAlphaTest,
}

impl IntoGl<CapabilityTarget> for Capability {
    fn into_gl(self) -> CapabilityTarget {
        match self {
            Capability::CullFace => CapabilityTarget::Native(glow::CULL_FACE),
            Capability::Fog => CapabilityTarget::ShaderFog,
            Capability::AlphaTest => CapabilityTarget::ShaderAlphaTest,
            Capability::AlphaToCoverage => CapabilityTarget::Native(glow::SAMPLE_ALPHA_TO_COVERAGE),
            Capability::DepthTest => CapabilityTarget::Native(glow::DEPTH_TEST),
            Capability::PolygonOffsetFill => CapabilityTarget::Native(glow::POLYGON_OFFSET_FILL),
            Capability::Blend => CapabilityTarget::Native(glow::BLEND),
            Capability::ScissorTest => CapabilityTarget::Native(glow::SCISSOR_TEST),
            Capability::Multisample => CapabilityTarget::Native(glow::MULTISAMPLE),
        }
    }
}

impl IntoGl<u32> for Face {
    fn into_gl(self) -> u32 {
        match self {
            Face::Front => glow::FRONT,
            Face::Back => glow::BACK,
        }
    }
}

impl IntoGl<u32> for CompareFunction {
    fn into_gl(self) -> u32 {
        match self {
            CompareFunction::Never => glow::NEVER,
            CompareFunction::Less => glow::LESS,
            CompareFunction::Equal => glow::EQUAL,
            CompareFunction::LessEqual => glow::LEQUAL,
            CompareFunction::Greater => glow::GREATER,
            CompareFunction::NotEqual => glow::NOTEQUAL,
            CompareFunction::GreaterEqual => glow::GEQUAL,
            CompareFunction::Always => glow::ALWAYS,
        }
    }
}

impl IntoGl<u32> for BlendFactor {
    fn into_gl(self) -> u32 {
        match self {
            BlendFactor::Zero => glow::ZERO,
            BlendFactor::One => glow::ONE,
            BlendFactor::SrcColor => glow::SRC_COLOR,
            BlendFactor::SrcAlpha => glow::SRC_ALPHA,
            BlendFactor::InvSrcColor => glow::ONE_MINUS_SRC_COLOR,
            BlendFactor::InvSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
            BlendFactor::SrcAlphaSaturate => glow::SRC_ALPHA_SATURATE,
            BlendFactor::DstColor => glow::DST_COLOR,
            BlendFactor::DstAlpha => glow::DST_ALPHA,
            BlendFactor::InvDstColor => glow::ONE_MINUS_DST_COLOR,
            BlendFactor::InvDstAlpha => glow::ONE_MINUS_DST_ALPHA,
        }
    }
}

impl IntoGl<u32> for FillMode {
    fn into_gl(self) -> u32 {
        match self {
            FillMode::Wireframe => glow::LINE,
            FillMode::Solid => glow::FILL,
        }
    }
}

/// Compare functions as the integer codes understood by the fixed-function shader.
pub fn compare_function_code(func: CompareFunction) -> i32 {
    match func {
        CompareFunction::Never => 0,
        CompareFunction::Less => 1,
        CompareFunction::Equal => 2,
        CompareFunction::LessEqual => 3,
        CompareFunction::Greater => 4,
        CompareFunction::NotEqual => 5,
        CompareFunction::GreaterEqual => 6,
        CompareFunction::Always => 7,
    }
}

// --- Textures ---

impl IntoGl<i32> for WrapMode {
    fn into_gl(self) -> i32 {
        (match self {
            WrapMode::Repeat => glow::REPEAT,
            WrapMode::Mirror => glow::MIRRORED_REPEAT,
            WrapMode::Clamp => glow::CLAMP_TO_EDGE,
        }) as i32
    }
}

/// The `GL_TEXTURE_MIN_FILTER` value for a minification filter and an optional mip filter.
pub fn min_filter(min: FilterMode, mip: Option<FilterMode>) -> i32 {
    let value = match (min, mip) {
        (FilterMode::Nearest, None) => glow::NEAREST,
        (FilterMode::Linear, None) => glow::LINEAR,
        (FilterMode::Nearest, Some(FilterMode::Nearest)) => glow::NEAREST_MIPMAP_NEAREST,
        (FilterMode::Nearest, Some(FilterMode::Linear)) => glow::NEAREST_MIPMAP_LINEAR,
        (FilterMode::Linear, Some(FilterMode::Nearest)) => glow::LINEAR_MIPMAP_NEAREST,
        (FilterMode::Linear, Some(FilterMode::Linear)) => glow::LINEAR_MIPMAP_LINEAR,
    };
    value as i32
}

impl IntoGl<i32> for FilterMode {
    fn into_gl(self) -> i32 {
        (match self {
            FilterMode::Nearest => glow::NEAREST,
            FilterMode::Linear => glow::LINEAR,
        }) as i32
    }
}

// --- Buffers and draws ---

impl IntoGl<u32> for BufferUsage {
    fn into_gl(self) -> u32 {
        match self {
            BufferUsage::Static => glow::STATIC_DRAW,
            BufferUsage::Dynamic => glow::DYNAMIC_DRAW,
            BufferUsage::Stream => glow::STREAM_DRAW,
        }
    }
}

impl IntoGl<u32> for Primitive {
    fn into_gl(self) -> u32 {
        match self {
            Primitive::TriangleList => glow::TRIANGLES,
            Primitive::TriangleStrip => glow::TRIANGLE_STRIP,
            Primitive::TriangleFan => glow::TRIANGLE_FAN,
            Primitive::LineList => glow::LINES,
            Primitive::LineStrip => glow::LINE_STRIP,
        }
    }
}
