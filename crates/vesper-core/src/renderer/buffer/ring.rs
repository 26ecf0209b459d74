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

//! Fence bookkeeping for multi-buffered persistent vertex buffers.
//!
//! A fenced buffer is split into N equal slots. The CPU writes one slot while
//! the GPU may still read the others:
//!
//! ```text
//! Draws from slot 0:  [Slot 0: fence A] ← GPU reads
//! Discard → slot 1:   [Slot 1: CPU writes]
//! Discard → slot 2:   [Slot 2: CPU writes]
//! Discard → slot 0:   wait(fence A), then CPU writes
//! ```
//!
//! Waiting on the fence of the slot being entered is the only place the
//! renderer blocks on the GPU.

use crate::renderer::api::FenceId;
use crate::renderer::traits::GraphicsDriver;

/// The slot cursor and per-slot fences of a multi-buffered buffer.
#[derive(Debug)]
pub struct FenceRing {
    /// The fence guarding each slot, `None` if nothing was drawn from it.
    fences: Vec<Option<FenceId>>,
    /// The slot being written and drawn from.
    current: usize,
}

impl FenceRing {
    /// Creates a ring of `slots` slots, starting at slot 0.
    pub fn new(slots: usize) -> Self {
        debug_assert!(slots > 0, "a fence ring needs at least one slot");
        Self {
            fences: vec![None; slots.max(1)],
            current: 0,
        }
    }

    /// The current slot index.
    pub fn current_slot(&self) -> usize {
        self.current
    }

    /// Returns the number of slots.
    pub fn slot_count(&self) -> usize {
        self.fences.len()
    }

    /// Moves to the next slot, waiting until the GPU is done with its previous contents.
    pub fn advance(&mut self, driver: &mut dyn GraphicsDriver) {
        self.current = (self.current + 1) % self.fences.len();
        if let Some(fence) = self.fences[self.current].take() {
            driver.wait_fence(fence);
            driver.delete_fence(fence);
        }
    }

    /// Guards the current slot with a fence placed after the last submitted draw.
    pub fn fence_current(&mut self, driver: &mut dyn GraphicsDriver) {
        let fence = driver.insert_fence();
        if let Some(previous) = self.fences[self.current].replace(fence) {
            driver.delete_fence(previous);
        }
    }

    /// Deletes every pending fence.
    pub fn destroy(&mut self, driver: &mut dyn GraphicsDriver) {
        for fence in self.fences.iter_mut().filter_map(Option::take) {
            driver.delete_fence(fence);
        }
    }
}
