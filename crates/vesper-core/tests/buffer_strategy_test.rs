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
use vesper_core::renderer::capabilities::extensions;
use vesper_core::renderer::recording::{DriverCall, DriverProfile, RecordedSource, RecordingDriver};
use vesper_core::renderer::{
    BufferStorage, BufferStrategy, BufferUsage, FixedSurface, LockFlags, MeshVertex, Primitive,
    RenderError, Renderer, ScreenVertex, TextureTable, UploadPath, VertexLayout, VideoSettings,
};

fn renderer(profile: DriverProfile, settings: VideoSettings) -> Result<Renderer<RecordingDriver>> {
    let mut renderer = Renderer::new(
        RecordingDriver::new(profile),
        Box::new(FixedSurface::new(256, 256)),
        settings,
    );
    renderer.initialize(&mut NullDiagnostics, &mut TextureTable::new())?;
    renderer.driver_mut().take_calls();
    Ok(renderer)
}

fn with_hint(hint: &str) -> VideoSettings {
    VideoSettings {
        buffer_upload: hint.to_owned(),
        ..VideoSettings::default()
    }
}

#[test]
fn test_no_storage_no_range_dynamic_uses_whole_buffer_mapping() -> Result<()> {
    // GL 2.1 without ARB_map_buffer_range or ARB_buffer_storage.
    let mut renderer = renderer(DriverProfile::legacy(), VideoSettings::default())?;
    let buffer = renderer.create_vertex_buffer::<MeshVertex>(1000, BufferUsage::Dynamic)?;

    assert_eq!(
        buffer.strategy(),
        BufferStrategy::Map {
            upload: UploadPath::Map
        }
    );
    assert_eq!(buffer.capacity(), 1000);
    renderer.destroy_vertex_buffer(buffer);
    assert_eq!(renderer.driver().live_buffers(), 0);
    Ok(())
}

#[test]
fn test_bad_hint_warns_once_for_many_buffers() -> Result<()> {
    let mut renderer = renderer(DriverProfile::modern(), with_hint("persistent-x7"))?;

    let mut buffers = Vec::new();
    for _ in 0..4 {
        buffers.push(renderer.create_vertex_buffer::<MeshVertex>(64, BufferUsage::Stream)?);
    }

    for buffer in &buffers {
        assert_eq!(buffer.strategy(), BufferStrategy::PersistentFenced { slots: 3 });
    }
    assert_eq!(renderer.strategy_selector().fallback_count(), 4);
    assert_eq!(renderer.strategy_selector().warning_count(), 1);

    for buffer in buffers {
        renderer.destroy_vertex_buffer(buffer);
    }
    Ok(())
}

#[test]
fn test_unsupported_hint_falls_back_to_next_best() -> Result<()> {
    let profile = DriverProfile::modern()
        .with_version(2, 1)
        .without_extension(extensions::BUFFER_STORAGE);
    let mut renderer = renderer(profile, with_hint("persistent-x2"))?;
    let buffer = renderer.create_vertex_buffer::<MeshVertex>(32, BufferUsage::Stream)?;

    assert_eq!(
        buffer.strategy(),
        BufferStrategy::MapRange {
            upload: UploadPath::Map
        }
    );
    assert_eq!(renderer.strategy_selector().warning_count(), 1);
    renderer.destroy_vertex_buffer(buffer);
    Ok(())
}

#[test]
fn test_disabled_vertex_buffers_use_client_memory() -> Result<()> {
    let settings = VideoSettings {
        vertex_buffers: false,
        ..VideoSettings::default()
    };
    let mut renderer = renderer(DriverProfile::modern(), settings)?;
    let mut buffer = renderer.create_vertex_buffer::<ScreenVertex>(4, BufferUsage::Stream)?;
    assert_eq!(buffer.strategy(), BufferStrategy::Immediate);
    assert!(renderer.driver().calls().is_empty());

    renderer.write_vertices(&mut buffer, 0, &[ScreenVertex::default(); 4], LockFlags::DISCARD);
    renderer.draw_buffer(&mut buffer, Primitive::TriangleStrip, 0, 4);
    assert!(renderer.driver().calls().contains(&DriverCall::Draw {
        primitive: Primitive::TriangleStrip,
        layout: VertexLayout::Screen,
        source: RecordedSource::Client { len: 4 * 28 },
        first: 0,
        count: 4,
    }));
    renderer.destroy_vertex_buffer(buffer);
    Ok(())
}

#[test]
fn test_streaming_through_a_fenced_ring() -> Result<()> {
    let mut renderer = renderer(DriverProfile::modern(), VideoSettings::default())?;
    let mut buffer = renderer.create_vertex_buffer::<MeshVertex>(6, BufferUsage::Stream)?;
    let id = buffer.buffer_id().expect("buffer object");
    assert_eq!(
        renderer.driver_mut().take_calls(),
        vec![DriverCall::CreateBuffer {
            id,
            size: 6 * 24 * 3,
            storage: BufferStorage::Persistent,
        }]
    );

    // Four frames: the fourth discard re-enters the slot of the first frame.
    for _ in 0..4 {
        renderer.write_vertices(&mut buffer, 0, &[MeshVertex::default(); 3], LockFlags::DISCARD);
        renderer.draw_buffer(&mut buffer, Primitive::TriangleList, 0, 3);
    }

    let calls = renderer.driver_mut().take_calls();
    let firsts: Vec<usize> = calls
        .iter()
        .filter_map(|call| match call {
            DriverCall::Draw { first, .. } => Some(*first),
            _ => None,
        })
        .collect();
    assert_eq!(firsts, vec![6, 12, 0, 6]);

    let waits = calls
        .iter()
        .filter(|call| matches!(call, DriverCall::WaitFence(_)))
        .count();
    assert_eq!(waits, 1);

    renderer.destroy_vertex_buffer(buffer);
    assert_eq!(renderer.driver().live_fences(), 0);
    Ok(())
}

#[test]
fn test_buffers_need_a_device() {
    let mut renderer = Renderer::new(
        RecordingDriver::new(DriverProfile::modern()),
        Box::new(FixedSurface::new(1, 1)),
        VideoSettings::default(),
    );
    let result = renderer.create_vertex_buffer::<MeshVertex>(16, BufferUsage::Static);
    assert!(matches!(result, Err(RenderError::NotInitialized)));
}
