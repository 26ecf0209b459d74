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

//! Enums shared by the renderer front-end and the graphics drivers.

/// Which triangles are culled, expressed by the winding of their front face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    /// No face culling.
    #[default]
    None,
    /// Cull clockwise-wound triangles (culls back faces).
    Clockwise,
    /// Cull counter-clockwise-wound triangles (culls front faces).
    CounterClockwise,
}

impl CullMode {
    /// The face the driver must cull for this mode, or `None` if culling is off.
    pub const fn face(self) -> Option<Face> {
        match self {
            CullMode::None => None,
            CullMode::Clockwise => Some(Face::Back),
            CullMode::CounterClockwise => Some(Face::Front),
        }
    }
}

/// A polygon face as understood by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    /// The front face.
    Front,
    /// The back face.
    Back,
}

/// A factor of the blend equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    /// `0`
    Zero,
    /// `1`
    One,
    /// Source color.
    SrcColor,
    /// Source alpha.
    SrcAlpha,
    /// `1 - source color`.
    InvSrcColor,
    /// `1 - source alpha`.
    InvSrcAlpha,
    /// `min(source alpha, 1 - destination alpha)`.
    SrcAlphaSaturate,
    /// Destination color.
    DstColor,
    /// Destination alpha.
    DstAlpha,
    /// `1 - destination color`.
    InvDstColor,
    /// `1 - destination alpha`.
    InvDstAlpha,
}

/// A comparison used by depth and alpha tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunction {
    /// Never passes.
    Never,
    /// Passes if the new value is less than the stored one.
    Less,
    /// Passes if both values are equal.
    Equal,
    /// Passes if the new value is less than or equal to the stored one.
    LessEqual,
    /// Passes if the new value is greater than the stored one.
    Greater,
    /// Passes if both values differ.
    NotEqual,
    /// Passes if the new value is greater than or equal to the stored one.
    GreaterEqual,
    /// Always passes.
    Always,
}

/// A driver capability that can be switched on and off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Face culling.
    CullFace,
    /// Linear fog.
    Fog,
    /// Classic alpha test.
    AlphaTest,
    /// Multisample alpha-to-coverage.
    AlphaToCoverage,
    /// Depth testing.
    DepthTest,
    /// Polygon offset for filled primitives.
    PolygonOffsetFill,
    /// Color blending.
    Blend,
    /// Scissor test.
    ScissorTest,
    /// Multisample rasterization.
    Multisample,
}

/// The primitive topology of a draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Independent triangles.
    TriangleList,
    /// A triangle strip.
    TriangleStrip,
    /// A triangle fan.
    TriangleFan,
    /// Independent lines.
    LineList,
    /// A line strip.
    LineStrip,
}

/// Polygon rasterization mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillMode {
    /// Only polygon edges are drawn.
    Wireframe,
    /// Polygons are filled.
    Solid,
}

/// Texture coordinate wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    /// Repeat the texture.
    #[default]
    Repeat,
    /// Repeat the texture, mirrored on every other repetition.
    Mirror,
    /// Clamp to the edge texels.
    Clamp,
}

/// Texture sampling filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// Nearest texel.
    Nearest,
    /// Bilinear interpolation.
    #[default]
    Linear,
}

/// Which matrix stack a matrix is loaded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatrixSlot {
    /// The model-view matrix.
    ModelView,
    /// The projection matrix.
    Projection,
}

/// Identification strings reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverString {
    /// The full version string (e.g. `"4.6.0 NVIDIA 550.54"`).
    Version,
    /// The vendor string.
    Vendor,
    /// The device (renderer) string.
    Device,
}

/// Integer state queried once at device initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegerQuery {
    /// Number of multisample buffers of the default framebuffer.
    SampleBuffers,
    /// Number of samples per pixel of the default framebuffer.
    Samples,
    /// Number of texture units usable by the fixed-function stages.
    MaxTextureUnits,
    /// Largest supported texture dimension.
    MaxTextureSize,
    /// Dedicated video memory in KiB (`NVX_gpu_memory_info`).
    DedicatedVideoMemory,
    /// Currently available video memory in KiB (`NVX_gpu_memory_info`).
    AvailableVideoMemory,
    /// Free memory in the VBO pool in KiB (`ATI_meminfo`).
    VboFreeMemory,
    /// Free memory in the texture pool in KiB (`ATI_meminfo`).
    TextureFreeMemory,
}

/// Float state queried once at device initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatQuery {
    /// The largest supported anisotropic filtering level.
    MaxTextureMaxAnisotropy,
}

/// Expected update frequency of a vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Written once, drawn many times.
    Static,
    /// Rewritten occasionally.
    Dynamic,
    /// Rewritten every frame, usually several times.
    Stream,
}

/// How the driver should allocate a buffer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferStorage {
    /// Mutable storage with the given usage hint. Supports orphaning and mapping.
    Mutable(BufferUsage),
    /// Immutable storage that stays mapped coherently for its whole lifetime.
    Persistent,
}

/// How bytes reach a buffer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadMethod {
    /// A plain sub-data upload.
    SubData,
    /// Map the whole buffer, write, unmap.
    MapWhole {
        /// The previous contents may be discarded.
        invalidate: bool,
    },
    /// Map only the written range, write, unmap.
    MapRange {
        /// The previous contents of the range may be discarded.
        invalidate: bool,
        /// Skip the implicit synchronization with pending draws.
        unsynchronized: bool,
    },
    /// Write through the persistent mapping.
    Persistent,
}
