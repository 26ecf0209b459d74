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

//! The shader program standing in for the fixed-function pipeline.
//!
//! Core contexts have no matrix stacks, fog or alpha test. The driver keeps
//! their state in a [`FixedFunctionState`] and uploads it as uniforms right
//! before a draw when something changed.

use glow::{HasContext, UniformLocation};
use vesper_core::math::{LinearRgba, Mat4};
use vesper_core::renderer::api::CompareFunction;

use super::conversions::compare_function_code;

const VERTEX_SOURCE: &str = include_str!("shaders/fixed_function.vert");
const FRAGMENT_SOURCE: &str = include_str!("shaders/fixed_function.frag");

/// Attribute locations bound by the vertex shader.
pub mod attributes {
    /// `vec3` position.
    pub const POSITION: u32 = 0;
    /// Normalized `vec4` color, BGRA byte order.
    pub const COLOR: u32 = 1;
    /// `vec2` texture coordinates of the first set.
    pub const UV: u32 = 2;
}

/// CPU-side copy of the emulated fixed-function state.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct FixedFunctionState {
    /// Matrix loaded into the model-view slot.
    pub model_view: Mat4,
    /// Matrix loaded into the projection slot.
    pub projection: Mat4,
    /// A texture is bound on unit 0.
    pub texture_enabled: bool,
    pub fog_enabled: bool,
    pub fog_color: LinearRgba,
    /// Eye distance where linear fog starts.
    pub fog_start: f32,
    /// Eye distance where linear fog is opaque.
    pub fog_end: f32,
    pub alpha_test: bool,
    pub alpha_func: CompareFunction,
    pub alpha_ref: f32,
    dirty: bool,
}

impl Default for FixedFunctionState {
    fn default() -> Self {
        Self {
            model_view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            texture_enabled: false,
            fog_enabled: false,
            fog_color: LinearRgba::default(),
            fog_start: 0.0,
            fog_end: 1.0,
            alpha_test: false,
            alpha_func: CompareFunction::Always,
            alpha_ref: 0.0,
            dirty: true,
        }
    }
}

impl FixedFunctionState {
    /// Applies `change` and marks the state for upload.
    pub fn update(&mut self, change: impl FnOnce(&mut Self)) {
        change(self);
        self.dirty = true;
    }

    /// Returns `true` if the uniforms are out of date.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

#[derive(Debug)]
struct Uniforms {
    model_view: Option<UniformLocation>,
    projection: Option<UniformLocation>,
    texture_enabled: Option<UniformLocation>,
    texture0: Option<UniformLocation>,
    fog_enabled: Option<UniformLocation>,
    fog_color: Option<UniformLocation>,
    fog_range: Option<UniformLocation>,
    alpha_test: Option<UniformLocation>,
    alpha_func: Option<UniformLocation>,
    alpha_ref: Option<UniformLocation>,
}

/// The linked uber-shader and its uniform locations.
#[derive(Debug)]
pub struct FixedFunctionProgram {
    program: glow::Program,
    uniforms: Uniforms,
}

impl FixedFunctionProgram {
    /// Compiles and links the program.
    ///
    /// ## Errors
    /// Returns the compiler or linker log on failure.
    pub fn new(gl: &glow::Context) -> Result<Self, String> {
        unsafe {
            let program = gl.create_program()?;
            let compile = |ty, src: &str| -> Result<glow::Shader, String> {
                let shader = gl.create_shader(ty)?;
                gl.shader_source(shader, src);
                gl.compile_shader(shader);
                if !gl.get_shader_compile_status(shader) {
                    let log = gl.get_shader_info_log(shader);
                    gl.delete_shader(shader);
                    return Err(log);
                }
                Ok(shader)
            };

            let vert = compile(glow::VERTEX_SHADER, VERTEX_SOURCE)?;
            let frag = match compile(glow::FRAGMENT_SHADER, FRAGMENT_SOURCE) {
                Ok(frag) => frag,
                Err(log) => {
                    gl.delete_shader(vert);
                    gl.delete_program(program);
                    return Err(log);
                }
            };

            gl.attach_shader(program, vert);
            gl.attach_shader(program, frag);
            gl.link_program(program);
            let linked = gl.get_program_link_status(program);
            gl.detach_shader(program, vert);
            gl.detach_shader(program, frag);
            gl.delete_shader(vert);
            gl.delete_shader(frag);
            if !linked {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                return Err(log);
            }

            let location = |name: &str| gl.get_uniform_location(program, name);
            let uniforms = Uniforms {
                model_view: location("u_model_view"),
                projection: location("u_projection"),
                texture_enabled: location("u_texture_enabled"),
                texture0: location("u_texture0"),
                fog_enabled: location("u_fog_enabled"),
                fog_color: location("u_fog_color"),
                fog_range: location("u_fog_range"),
                alpha_test: location("u_alpha_test"),
                alpha_func: location("u_alpha_func"),
                alpha_ref: location("u_alpha_ref"),
            };

            Ok(Self { program, uniforms })
        }
    }

    /// Makes the program current and samples unit 0.
    pub fn bind(&self, gl: &glow::Context) {
        unsafe {
            gl.use_program(Some(self.program));
            gl.uniform_1_i32(self.uniforms.texture0.as_ref(), 0);
        }
    }

    /// Uploads `state` if it changed since the last upload.
    pub fn upload(&self, gl: &glow::Context, state: &mut FixedFunctionState) {
        if !state.dirty {
            return;
        }
        let u = &self.uniforms;
        unsafe {
            gl.uniform_matrix_4_f32_slice(
                u.model_view.as_ref(),
                false,
                &state.model_view.to_cols_array(),
            );
            gl.uniform_matrix_4_f32_slice(
                u.projection.as_ref(),
                false,
                &state.projection.to_cols_array(),
            );
            gl.uniform_1_i32(u.texture_enabled.as_ref(), state.texture_enabled as i32);
            gl.uniform_1_i32(u.fog_enabled.as_ref(), state.fog_enabled as i32);
            let fog = state.fog_color;
            gl.uniform_4_f32(u.fog_color.as_ref(), fog.r, fog.g, fog.b, fog.a);
            gl.uniform_2_f32(u.fog_range.as_ref(), state.fog_start, state.fog_end);
            gl.uniform_1_i32(u.alpha_test.as_ref(), state.alpha_test as i32);
            gl.uniform_1_i32(
                u.alpha_func.as_ref(),
                compare_function_code(state.alpha_func),
            );
            gl.uniform_1_f32(u.alpha_ref.as_ref(), state.alpha_ref);
        }
        state.dirty = false;
    }

    /// Deletes the program.
    pub fn destroy(&self, gl: &glow::Context) {
        unsafe { gl.delete_program(self.program) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_legacy_pipeline() {
        let state = FixedFunctionState::default();
        assert!(state.is_dirty());
        assert_eq!(state.alpha_func, CompareFunction::Always);
        assert_eq!((state.fog_start, state.fog_end), (0.0, 1.0));
        assert_eq!(state.model_view, Mat4::IDENTITY);
    }

    #[test]
    fn sources_declare_every_uniform() {
        for name in ["u_model_view", "u_projection"] {
            assert!(VERTEX_SOURCE.contains(name), "{name}");
        }
        for name in [
            "u_texture_enabled",
            "u_texture0",
            "u_fog_enabled",
            "u_fog_color",
            "u_fog_range",
            "u_alpha_test",
            "u_alpha_func",
            "u_alpha_ref",
        ] {
            assert!(FRAGMENT_SOURCE.contains(name), "{name}");
        }
    }

    #[test]
    fn alpha_codes_follow_the_shader_switch() {
        assert!(FRAGMENT_SOURCE.contains("case 5: return alpha != u_alpha_ref;"));
        assert_eq!(compare_function_code(CompareFunction::NotEqual), 5);
        assert_eq!(compare_function_code(CompareFunction::Always), 7);
    }
}
