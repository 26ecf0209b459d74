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

//! Typed vertex buffers backed by one upload strategy for their whole lifetime.

use bytemuck::Zeroable;

use super::ring::FenceRing;
use super::strategy::{BufferStrategy, UploadPath};
use crate::renderer::api::{
    BufferId, BufferStorage, BufferUsage, LockFlags, Primitive, UploadMethod, Vertex,
    VertexLayout, VertexSource,
};
use crate::renderer::error::ResourceError;
use crate::renderer::traits::GraphicsDriver;

/// Where the vertices live.
#[derive(Debug)]
enum Storage<V> {
    /// Client memory, drawn through the immediate path.
    Client(Vec<V>),
    /// A single buffer object.
    Buffer(BufferId),
    /// A buffer object split in fenced slots of `capacity` vertices each.
    Ring { buffer: BufferId, ring: FenceRing },
}

/// A fixed-capacity buffer of `V` vertices.
///
/// Created through [`Renderer::create_vertex_buffer`](crate::Renderer::create_vertex_buffer),
/// which picks the strategy. The buffer must be released with
/// [`destroy`](Self::destroy) before the device shuts down.
#[derive(Debug)]
pub struct VertexBuffer<V: Vertex> {
    strategy: BufferStrategy,
    usage: BufferUsage,
    capacity: usize,
    storage: Storage<V>,
}

impl<V: Vertex> VertexBuffer<V> {
    /// Allocates a buffer for `capacity` vertices using `strategy`.
    ///
    /// # Errors
    ///
    /// Returns the driver's [`ResourceError`] if the buffer object cannot be created.
    pub fn with_strategy(
        driver: &mut dyn GraphicsDriver,
        strategy: BufferStrategy,
        usage: BufferUsage,
        capacity: usize,
    ) -> Result<Self, ResourceError> {
        debug_assert!(capacity > 0, "vertex buffers need a non-zero capacity");
        let slot_size = capacity * V::LAYOUT.stride();

        let storage = match strategy {
            BufferStrategy::Immediate => Storage::Client(vec![V::zeroed(); capacity]),
            BufferStrategy::Map { .. } | BufferStrategy::MapRange { .. } => {
                Storage::Buffer(driver.create_buffer(slot_size, BufferStorage::Mutable(usage))?)
            }
            BufferStrategy::PersistentOrphan | BufferStrategy::PersistentUnsynchronized => {
                Storage::Buffer(driver.create_buffer(slot_size, BufferStorage::Persistent)?)
            }
            BufferStrategy::PersistentFenced { slots } => Storage::Ring {
                buffer: driver.create_buffer(slot_size * slots, BufferStorage::Persistent)?,
                ring: FenceRing::new(slots),
            },
        };

        log::debug!(
            "Created {strategy} vertex buffer: {capacity} x {:?} vertices, {usage:?} usage",
            V::LAYOUT
        );

        Ok(Self {
            strategy,
            usage,
            capacity,
            storage,
        })
    }

    /// The strategy backing this buffer.
    pub fn strategy(&self) -> BufferStrategy {
        self.strategy
    }

    /// The usage pattern given at creation.
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// Capacity in vertices.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The vertex layout.
    pub fn layout(&self) -> VertexLayout {
        V::LAYOUT
    }

    /// The buffer object, `None` for client-memory buffers.
    pub fn buffer_id(&self) -> Option<BufferId> {
        match &self.storage {
            Storage::Client(_) => None,
            Storage::Buffer(buffer) | Storage::Ring { buffer, .. } => Some(*buffer),
        }
    }

    /// Writes `vertices` starting at vertex `offset`.
    ///
    /// [`LockFlags::DISCARD`] declares the previous contents dead, which lets
    /// the strategy hand out fresh storage instead of waiting for the GPU.
    /// [`LockFlags::NO_OVERWRITE`] promises the range is not used by a pending draw.
    /// Writing past the capacity is a contract violation.
    pub fn write(
        &mut self,
        driver: &mut dyn GraphicsDriver,
        offset: usize,
        vertices: &[V],
        flags: LockFlags,
    ) {
        debug_assert!(
            offset + vertices.len() <= self.capacity,
            "write of {} vertices at {offset} overflows a buffer of {}",
            vertices.len(),
            self.capacity
        );

        let discard = flags.contains(LockFlags::DISCARD);
        let stride = V::LAYOUT.stride();
        let bytes: &[u8] = bytemuck::cast_slice(vertices);

        match &mut self.storage {
            Storage::Client(data) => {
                if let Some(target) = data.get_mut(offset..offset + vertices.len()) {
                    target.copy_from_slice(vertices);
                }
            }
            Storage::Buffer(buffer) => {
                let buffer = *buffer;
                let method = match self.strategy {
                    BufferStrategy::Map {
                        upload: UploadPath::Map,
                    } => UploadMethod::MapWhole {
                        invalidate: discard,
                    },
                    BufferStrategy::MapRange {
                        upload: UploadPath::Map,
                    } => UploadMethod::MapRange {
                        invalidate: discard,
                        unsynchronized: flags.contains(LockFlags::NO_OVERWRITE),
                    },
                    BufferStrategy::Map {
                        upload: UploadPath::SubData,
                    }
                    | BufferStrategy::MapRange {
                        upload: UploadPath::SubData,
                    } => {
                        if discard {
                            driver.orphan_buffer(buffer);
                        }
                        UploadMethod::SubData
                    }
                    BufferStrategy::PersistentOrphan => {
                        if discard {
                            driver.orphan_buffer(buffer);
                        }
                        UploadMethod::Persistent
                    }
                    _ => UploadMethod::Persistent,
                };
                driver.write_buffer(buffer, offset * stride, bytes, method);
            }
            Storage::Ring { buffer, ring } => {
                if discard {
                    ring.advance(driver);
                }
                let base = ring.current_slot() * self.capacity;
                driver.write_buffer(
                    *buffer,
                    (base + offset) * stride,
                    bytes,
                    UploadMethod::Persistent,
                );
            }
        }
    }

    /// Draws `count` vertices starting at `first`.
    ///
    /// State must already be flushed, which is what the renderer's draw methods do.
    pub(crate) fn draw(
        &mut self,
        driver: &mut dyn GraphicsDriver,
        primitive: Primitive,
        first: usize,
        count: usize,
    ) {
        debug_assert!(first + count <= self.capacity);
        match &mut self.storage {
            Storage::Client(data) => {
                let bytes: &[u8] = bytemuck::cast_slice(data.as_slice());
                driver.draw(primitive, V::LAYOUT, VertexSource::Client(bytes), first, count);
            }
            Storage::Buffer(buffer) => {
                driver.draw(primitive, V::LAYOUT, VertexSource::Buffer(*buffer), first, count);
            }
            Storage::Ring { buffer, ring } => {
                let base = ring.current_slot() * self.capacity;
                driver.draw(
                    primitive,
                    V::LAYOUT,
                    VertexSource::Buffer(*buffer),
                    base + first,
                    count,
                );
                ring.fence_current(driver);
            }
        }
    }

    /// Draws indexed vertices. Indices are relative to `base_vertex`.
    pub(crate) fn draw_indexed(
        &mut self,
        driver: &mut dyn GraphicsDriver,
        primitive: Primitive,
        base_vertex: usize,
        vertex_count: usize,
        indices: &[u16],
    ) {
        debug_assert!(base_vertex + vertex_count <= self.capacity);
        match &mut self.storage {
            Storage::Client(data) => {
                let bytes: &[u8] = bytemuck::cast_slice(data.as_slice());
                driver.draw_indexed(
                    primitive,
                    V::LAYOUT,
                    VertexSource::Client(bytes),
                    base_vertex,
                    vertex_count,
                    indices,
                );
            }
            Storage::Buffer(buffer) => {
                driver.draw_indexed(
                    primitive,
                    V::LAYOUT,
                    VertexSource::Buffer(*buffer),
                    base_vertex,
                    vertex_count,
                    indices,
                );
            }
            Storage::Ring { buffer, ring } => {
                let base = ring.current_slot() * self.capacity;
                driver.draw_indexed(
                    primitive,
                    V::LAYOUT,
                    VertexSource::Buffer(*buffer),
                    base + base_vertex,
                    vertex_count,
                    indices,
                );
                ring.fence_current(driver);
            }
        }
    }

    /// Releases the buffer object and its fences.
    pub fn destroy(self, driver: &mut dyn GraphicsDriver) {
        match self.storage {
            Storage::Client(_) => {}
            Storage::Buffer(buffer) => driver.delete_buffer(buffer),
            Storage::Ring { buffer, mut ring } => {
                ring.destroy(driver);
                driver.delete_buffer(buffer);
            }
        }
    }
}
