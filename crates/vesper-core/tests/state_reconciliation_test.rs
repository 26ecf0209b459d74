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

use anyhow::Result;
use vesper_core::diagnostics::NullDiagnostics;
use vesper_core::renderer::recording::{DriverCall, DriverProfile, RecordedSource, RecordingDriver};
use vesper_core::renderer::{
    BlendFactor, Capability, CompareFunction, CullMode, Face, MatrixSlot, MeshVertex, Primitive,
    Renderer, TextureTable, VertexLayout, VideoSettings, FixedSurface,
};

fn triangle() -> [MeshVertex; 3] {
    [MeshVertex::default(); 3]
}

fn draw_call() -> DriverCall {
    DriverCall::Draw {
        primitive: Primitive::TriangleList,
        layout: VertexLayout::Mesh,
        source: RecordedSource::Client { len: 3 * 24 },
        first: 0,
        count: 3,
    }
}

/// An initialized renderer whose first world-space draw already happened.
fn ready_renderer(
    profile: DriverProfile,
    settings: VideoSettings,
) -> Result<Renderer<RecordingDriver>> {
    let mut renderer = Renderer::new(
        RecordingDriver::new(profile),
        Box::new(FixedSurface::new(320, 240)),
        settings,
    );
    renderer.initialize(&mut NullDiagnostics, &mut TextureTable::new())?;
    renderer.draw(Primitive::TriangleList, &triangle());
    renderer.driver_mut().take_calls();
    Ok(renderer)
}

#[test]
fn test_second_flush_is_free() -> Result<()> {
    let mut renderer = ready_renderer(DriverProfile::legacy(), VideoSettings::default())?;
    renderer.set_depth_test(true);
    renderer.set_cull(CullMode::CounterClockwise);

    renderer.draw(Primitive::TriangleList, &triangle());
    assert!(renderer.driver_mut().take_calls().len() > 1);

    renderer.draw(Primitive::TriangleList, &triangle());
    assert_eq!(renderer.driver_mut().take_calls(), vec![draw_call()]);
    Ok(())
}

#[test]
fn test_only_touched_fields_are_sent() -> Result<()> {
    let mut renderer = ready_renderer(DriverProfile::legacy(), VideoSettings::default())?;
    for offset in 1..=5 {
        renderer.set_depth_offset(offset);
    }
    renderer.draw(Primitive::TriangleList, &triangle());
    assert_eq!(
        renderer.driver_mut().take_calls(),
        vec![
            DriverCall::PolygonOffset {
                factor: -5.0,
                units: -5.0,
            },
            draw_call(),
        ]
    );
    Ok(())
}

#[test]
fn test_requests_reverted_before_a_draw_cost_nothing() -> Result<()> {
    let mut renderer = ready_renderer(DriverProfile::legacy(), VideoSettings::default())?;
    renderer.set_fog(true);
    renderer.set_blend(BlendFactor::SrcAlpha, BlendFactor::InvSrcAlpha);
    renderer.set_fog(false);
    renderer.set_blend(BlendFactor::One, BlendFactor::Zero);
    renderer.draw(Primitive::TriangleList, &triangle());
    assert_eq!(renderer.driver_mut().take_calls(), vec![draw_call()]);
    Ok(())
}

#[test]
fn test_fixed_flush_order() -> Result<()> {
    let mut renderer = ready_renderer(DriverProfile::legacy(), VideoSettings::default())?;
    renderer.set_blend(BlendFactor::SrcAlpha, BlendFactor::InvSrcAlpha);
    renderer.set_depth_offset(2);
    renderer.set_depth_write(false);
    renderer.set_depth_test(true);
    renderer.set_color_key(true);
    renderer.set_fog(true);
    renderer.set_cull(CullMode::Clockwise);
    renderer.draw(Primitive::TriangleList, &triangle());

    assert_eq!(
        renderer.driver_mut().take_calls(),
        vec![
            DriverCall::Enable(Capability::CullFace),
            DriverCall::Enable(Capability::Fog),
            DriverCall::Enable(Capability::AlphaTest),
            DriverCall::DepthFunc(CompareFunction::LessEqual),
            DriverCall::DepthMask(false),
            DriverCall::PolygonOffset {
                factor: -2.0,
                units: -2.0,
            },
            DriverCall::BlendFunc(BlendFactor::SrcAlpha, BlendFactor::InvSrcAlpha),
            draw_call(),
        ]
    );
    Ok(())
}

#[test]
fn test_cull_direction_is_cached() -> Result<()> {
    let mut renderer = ready_renderer(DriverProfile::legacy(), VideoSettings::default())?;

    renderer.set_cull(CullMode::CounterClockwise);
    renderer.draw(Primitive::TriangleList, &triangle());
    assert_eq!(
        renderer.driver_mut().take_calls(),
        vec![
            DriverCall::Enable(Capability::CullFace),
            DriverCall::CullFace(Face::Front),
            draw_call(),
        ]
    );

    renderer.set_cull(CullMode::None);
    renderer.draw(Primitive::TriangleList, &triangle());
    renderer.driver_mut().take_calls();

    // Same direction as last time: only the toggle.
    renderer.set_cull(CullMode::CounterClockwise);
    renderer.draw(Primitive::TriangleList, &triangle());
    assert_eq!(
        renderer.driver_mut().take_calls(),
        vec![DriverCall::Enable(Capability::CullFace), draw_call()]
    );

    // Direction change while enabled: only the direction.
    renderer.set_cull(CullMode::Clockwise);
    renderer.draw(Primitive::TriangleList, &triangle());
    assert_eq!(
        renderer.driver_mut().take_calls(),
        vec![DriverCall::CullFace(Face::Back), draw_call()]
    );
    Ok(())
}

#[test]
fn test_color_key_swaps_to_alpha_test_when_blending() -> Result<()> {
    let mut renderer = ready_renderer(DriverProfile::modern(), VideoSettings::default())?;
    assert!(renderer.pipeline_state().is_msaa_active());

    renderer.set_color_key(true);
    renderer.draw(Primitive::TriangleList, &triangle());
    assert_eq!(
        renderer.driver_mut().take_calls(),
        vec![DriverCall::Enable(Capability::AlphaToCoverage), draw_call()]
    );

    renderer.set_blend(BlendFactor::SrcAlpha, BlendFactor::InvSrcAlpha);
    renderer.draw(Primitive::TriangleList, &triangle());
    assert_eq!(
        renderer.driver_mut().take_calls(),
        vec![
            DriverCall::Disable(Capability::AlphaToCoverage),
            DriverCall::Enable(Capability::AlphaTest),
            DriverCall::BlendFunc(BlendFactor::SrcAlpha, BlendFactor::InvSrcAlpha),
            draw_call(),
        ]
    );

    renderer.set_blend(BlendFactor::One, BlendFactor::Zero);
    renderer.draw(Primitive::TriangleList, &triangle());
    assert_eq!(
        renderer.driver_mut().take_calls(),
        vec![
            DriverCall::Disable(Capability::AlphaTest),
            DriverCall::Enable(Capability::AlphaToCoverage),
            DriverCall::BlendFunc(BlendFactor::One, BlendFactor::Zero),
            draw_call(),
        ]
    );
    Ok(())
}

#[test]
fn test_color_key_with_blending_uses_alpha_test() -> Result<()> {
    let mut renderer = ready_renderer(DriverProfile::modern(), VideoSettings::default())?;
    renderer.set_blend(BlendFactor::SrcAlpha, BlendFactor::InvSrcAlpha);
    renderer.set_color_key(true);
    renderer.draw(Primitive::TriangleList, &triangle());
    assert_eq!(
        renderer.driver_mut().take_calls(),
        vec![
            DriverCall::Enable(Capability::AlphaTest),
            DriverCall::BlendFunc(BlendFactor::SrcAlpha, BlendFactor::InvSrcAlpha),
            draw_call(),
        ]
    );
    Ok(())
}

#[test]
fn test_toggling_antialiasing_retires_the_color_key() -> Result<()> {
    let mut renderer = ready_renderer(DriverProfile::modern(), VideoSettings::default())?;
    renderer.set_color_key(true);
    renderer.draw(Primitive::TriangleList, &triangle());
    renderer.driver_mut().take_calls();

    renderer.set_antialiasing(false);
    assert_eq!(
        renderer.driver_mut().take_calls(),
        vec![
            DriverCall::Disable(Capability::AlphaToCoverage),
            DriverCall::Disable(Capability::Multisample),
        ]
    );
    assert!(renderer.pipeline_state().requested().color_key);

    // Without multisampling the color key falls back to the alpha test.
    renderer.draw(Primitive::TriangleList, &triangle());
    assert_eq!(
        renderer.driver_mut().take_calls(),
        vec![DriverCall::Enable(Capability::AlphaTest), draw_call()]
    );

    // Unchanged: nothing happens.
    renderer.set_antialiasing(false);
    assert!(renderer.driver().calls().is_empty());
    Ok(())
}

#[test]
fn test_changing_the_alpha_to_coverage_option_retires_the_color_key() -> Result<()> {
    let mut renderer = ready_renderer(DriverProfile::modern(), VideoSettings::default())?;
    assert!(renderer.pipeline_state().is_msaa_active());
    renderer.set_color_key(true);
    renderer.draw(Primitive::TriangleList, &triangle());
    assert_eq!(
        renderer.driver_mut().take_calls(),
        vec![DriverCall::Enable(Capability::AlphaToCoverage), draw_call()]
    );

    renderer.set_colorkey_alpha_to_coverage(false);
    assert_eq!(
        renderer.driver_mut().take_calls(),
        vec![DriverCall::Disable(Capability::AlphaToCoverage)]
    );

    renderer.set_color_key(false);
    renderer.draw(Primitive::TriangleList, &triangle());
    assert_eq!(renderer.driver_mut().take_calls(), vec![draw_call()]);

    // Back on: the alpha test applied in the meantime is taken down first.
    renderer.set_color_key(true);
    renderer.draw(Primitive::TriangleList, &triangle());
    assert_eq!(
        renderer.driver_mut().take_calls(),
        vec![DriverCall::Enable(Capability::AlphaTest), draw_call()]
    );

    renderer.set_colorkey_alpha_to_coverage(true);
    renderer.draw(Primitive::TriangleList, &triangle());
    assert_eq!(
        renderer.driver_mut().take_calls(),
        vec![
            DriverCall::Disable(Capability::AlphaTest),
            DriverCall::Enable(Capability::AlphaToCoverage),
            draw_call(),
        ]
    );
    Ok(())
}

#[test]
fn test_antialiasing_setting_blocks_enabling() -> Result<()> {
    let settings = VideoSettings {
        antialiasing: false,
        ..VideoSettings::default()
    };
    let mut renderer = ready_renderer(DriverProfile::modern(), settings)?;
    assert!(!renderer.pipeline_state().is_msaa_active());

    renderer.set_antialiasing(true);
    assert!(renderer.driver().calls().is_empty());
    assert!(!renderer.pipeline_state().is_msaa_active());
    Ok(())
}

#[test]
fn test_world_draws_load_the_view_once() -> Result<()> {
    let mut renderer = Renderer::new(
        RecordingDriver::new(DriverProfile::legacy()),
        Box::new(FixedSurface::new(320, 240)),
        VideoSettings::default(),
    );
    renderer.initialize(&mut NullDiagnostics, &mut TextureTable::new())?;
    renderer.driver_mut().take_calls();

    renderer.draw(Primitive::TriangleList, &triangle());
    renderer.draw(Primitive::TriangleList, &triangle());
    let loads = renderer
        .driver()
        .calls()
        .iter()
        .filter(|call| matches!(call, DriverCall::LoadMatrix(MatrixSlot::ModelView, _)))
        .count();
    assert_eq!(loads, 1);
    Ok(())
}
