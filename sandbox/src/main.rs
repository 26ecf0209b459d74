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

// Vesper Sandbox
// Drives a few frames of the renderer headlessly and prints what reached the driver.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use vesper_core::math::{Color, Mat4, Rect};
use vesper_core::renderer::recording::{DriverCall, DriverProfile, RecordingDriver};
use vesper_core::renderer::{
    BlendFactor, BufferUsage, ClearFlags, ClearRequest, CullMode, LockFlags, MeshVertex,
    Primitive, Renderer, ScreenVertex, SharedSurface, TextureTable, VideoSettings,
};
use vesper_infra::VramMonitor;
use vesper_telemetry::{init_logging, CrashDiagnostics};

const TRIANGLES_PER_FRAME: usize = 64;

fn load_settings() -> Result<VideoSettings> {
    match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading video settings from {path}"))?;
            Ok(VideoSettings::from_json_str(&json)?)
        }
        None => Ok(VideoSettings::default()),
    }
}

/// A fan of triangles around the origin, recolored every frame.
fn world_triangles(frame: usize) -> Vec<MeshVertex> {
    let color = Color::new(255, (frame * 40 % 256) as u8, 64, 255).to_argb();
    (0..TRIANGLES_PER_FRAME)
        .flat_map(|i| {
            let angle = i as f32 / TRIANGLES_PER_FRAME as f32 * std::f32::consts::TAU;
            let next = (i + 1) as f32 / TRIANGLES_PER_FRAME as f32 * std::f32::consts::TAU;
            [
                MeshVertex {
                    position: [0.0, 0.0, 5.0],
                    color,
                    uv: [0.5, 0.5],
                },
                MeshVertex {
                    position: [angle.cos(), angle.sin(), 5.0],
                    color,
                    uv: [0.0, 0.0],
                },
                MeshVertex {
                    position: [next.cos(), next.sin(), 5.0],
                    color,
                    uv: [1.0, 1.0],
                },
            ]
        })
        .collect()
}

fn overlay_quad(width: f32, height: f32) -> [ScreenVertex; 4] {
    let color = Color::new(255, 255, 255, 160).to_argb();
    let corner = |x: f32, y: f32, u: f32, v: f32| ScreenVertex {
        position: [x, y, 0.0],
        rhw: 1.0,
        color,
        uv: [u, v],
    };
    [
        corner(8.0, 8.0, 0.0, 0.0),
        corner(width - 8.0, 8.0, 1.0, 0.0),
        corner(width - 8.0, 40.0, 1.0, 1.0),
        corner(8.0, 40.0, 0.0, 1.0),
    ]
}

/// Counts recorded calls by variant name.
fn call_histogram(calls: &[DriverCall]) -> BTreeMap<String, usize> {
    let mut histogram = BTreeMap::new();
    for call in calls {
        let debug = format!("{call:?}");
        let name = debug
            .split(|c: char| !c.is_alphanumeric())
            .next()
            .unwrap_or_default()
            .to_owned();
        *histogram.entry(name).or_insert(0) += 1;
    }
    histogram
}

fn main() -> Result<()> {
    init_logging()?;

    let settings = load_settings()?;
    let diagnostics = Arc::new(CrashDiagnostics::new());
    let surface = SharedSurface::new(1280, 720);
    let mut textures = TextureTable::new();
    let mut renderer = Renderer::new(
        RecordingDriver::new(DriverProfile::modern()),
        Box::new(surface.clone()),
        settings,
    );

    let mut sink: &CrashDiagnostics = &diagnostics;
    renderer.initialize(&mut sink, &mut textures)?;
    renderer.driver_mut().take_calls();

    let checker = textures.create(
        renderer.driver_mut(),
        2,
        2,
        [[255u8, 255, 255, 255], [0, 0, 0, 255], [0, 0, 0, 255], [255, 255, 255, 255]].concat(),
    )?;

    let vertices = world_triangles(0);
    let mut world =
        renderer.create_vertex_buffer::<MeshVertex>(vertices.len(), BufferUsage::Stream)?;
    log::info!("World geometry uses the {} strategy", world.strategy());

    renderer.set_projection_matrix(&Mat4::from_scale(0.75, 1.0, 0.1));
    renderer.set_view_matrix(&Mat4::from_translation(0.0, 0.0, -1.0));

    for frame in 0..3 {
        let (width, height) = renderer.drawable_size();
        renderer.clear(&ClearRequest {
            flags: ClearFlags::COLOR | ClearFlags::DEPTH,
            color: Color::rgb(16, 16, 32),
            ..ClearRequest::default()
        });

        // World pass.
        renderer.set_cull(CullMode::CounterClockwise);
        renderer.set_depth_test(true);
        renderer.set_depth_write(true);
        renderer.set_fog(true);
        renderer.set_blend(BlendFactor::One, BlendFactor::Zero);
        renderer.set_texture(0, Some(checker), &mut textures);
        let vertices = world_triangles(frame);
        renderer.write_vertices(&mut world, 0, &vertices, LockFlags::DISCARD);
        renderer.draw_buffer(&mut world, Primitive::TriangleList, 0, vertices.len());

        // Overlay pass.
        renderer.set_cull(CullMode::None);
        renderer.set_depth_test(false);
        renderer.set_depth_write(false);
        renderer.set_fog(false);
        renderer.set_blend(BlendFactor::SrcAlpha, BlendFactor::InvSrcAlpha);
        renderer.set_texture(0, None, &mut textures);
        renderer.set_scissor(&Rect::from_size(width as i32, height as i32 / 2));
        renderer.draw_indexed(
            Primitive::TriangleList,
            &overlay_quad(width as f32, height as f32),
            &[0, 1, 2, 2, 3, 0],
        );
        renderer.set_scissor(&Rect::default());

        let calls = renderer.driver_mut().take_calls();
        log::info!("Frame {frame}: {} driver calls", calls.len());
        for (name, count) in call_histogram(&calls) {
            log::debug!("  {name}: {count}");
        }
    }

    // A windowed resize never needs a new device on the desktop platforms we ship.
    surface.resize(1600, 900);
    renderer.before_resize(false, &mut textures);
    renderer.after_resize(&mut textures)?;

    let thumbnail = renderer.snapshot_resized(160, 90)?;
    log::info!(
        "Snapshot thumbnail: {}x{}",
        thumbnail.width(),
        thumbnail.height()
    );

    let mut monitor = VramMonitor::new("sandbox");
    let vram = monitor.sample(renderer.driver());
    log::info!("VRAM sample: {vram:?}");

    renderer.destroy_vertex_buffer(world);
    renderer.shutdown(&mut textures);

    let selector = renderer.strategy_selector();
    log::info!(
        "Upload hint fallbacks: {}, distinct warnings: {}",
        selector.fallback_count(),
        selector.warning_count()
    );
    println!("{}", diagnostics.report());
    Ok(())
}
