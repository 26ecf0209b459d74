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

use std::cell::Cell;
use std::rc::Rc;

/// Provides the current size of the drawable the renderer targets.
pub trait RenderSurface {
    /// The drawable size in pixels as `(width, height)`.
    fn drawable_size(&self) -> (u32, u32);
}

/// A surface whose size never changes, e.g. an offscreen target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSurface {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FixedSurface {
    /// Creates a fixed-size surface.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl RenderSurface for FixedSurface {
    fn drawable_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// A surface size shared between the window layer and the renderer.
///
/// Cloning shares the underlying size; the window layer calls
/// [`resize`](SharedSurface::resize) and the renderer observes the new size.
#[derive(Debug, Clone, Default)]
pub struct SharedSurface {
    size: Rc<Cell<(u32, u32)>>,
}

impl SharedSurface {
    /// Creates a shared surface with an initial size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Rc::new(Cell::new((width, height))),
        }
    }

    /// Updates the size seen by every clone.
    pub fn resize(&self, width: u32, height: u32) {
        self.size.set((width, height));
    }
}

impl RenderSurface for SharedSurface {
    fn drawable_size(&self) -> (u32, u32) {
        self.size.get()
    }
}
