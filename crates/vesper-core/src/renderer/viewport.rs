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

//! Viewport, scissor and clear orchestration.
//!
//! Callers work with top-left-origin [`Rect`]s; everything sent to the driver
//! goes through [`Rect::to_native`] with the current drawable height.

use crate::math::{Color, Rect};
use crate::renderer::api::{Capability, ClearFlags};
use crate::renderer::traits::GraphicsDriver;

/// A clear request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearRequest<'a> {
    /// The planes to clear.
    pub flags: ClearFlags,
    /// The color written to the color buffer.
    pub color: Color,
    /// The depth written to the depth buffer.
    pub depth: f32,
    /// Regions to clear. Empty clears the whole drawable.
    pub rects: &'a [Rect],
}

impl Default for ClearRequest<'_> {
    fn default() -> Self {
        Self {
            flags: ClearFlags::COLOR | ClearFlags::DEPTH,
            color: Color::TRANSPARENT,
            depth: 1.0,
            rects: &[],
        }
    }
}

impl<'a> ClearRequest<'a> {
    /// Clears the given planes of the whole drawable with default values.
    pub fn new(flags: ClearFlags) -> Self {
        Self {
            flags,
            ..Self::default()
        }
    }

    /// Sets the clear color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Sets the clear depth.
    pub fn with_depth(mut self, depth: f32) -> Self {
        self.depth = depth;
        self
    }

    /// Restricts the clear to a set of regions.
    pub fn with_rects(mut self, rects: &'a [Rect]) -> Self {
        self.rects = rects;
        self
    }
}

/// The viewport last sent to the driver.
#[derive(Debug, Clone, Default)]
pub struct ViewportState {
    current: Rect,
}

impl ViewportState {
    /// The current viewport.
    pub fn current(&self) -> &Rect {
        &self.current
    }

    /// Sends a new viewport to the driver.
    ///
    /// Returns `false` without touching the driver if `rect` is the current viewport.
    pub fn set(
        &mut self,
        driver: &mut dyn GraphicsDriver,
        rect: Rect,
        drawable_height: i32,
    ) -> bool {
        if rect == self.current {
            return false;
        }
        self.current = rect;
        driver.viewport(rect.to_native(drawable_height));
        true
    }
}

/// Restricts rendering to `rect`, or lifts the restriction if `rect` is invalid.
pub fn set_scissor(driver: &mut dyn GraphicsDriver, rect: &Rect, drawable_height: i32) {
    if rect.is_valid() {
        driver.enable(Capability::ScissorTest);
        driver.scissor(rect.to_native(drawable_height));
    } else {
        driver.disable(Capability::ScissorTest);
    }
}

/// Emits the clear values and the clear itself, once per region if any.
///
/// The caller is responsible for making depth writes effective before a
/// depth clear, since clears respect the depth mask.
pub fn clear(driver: &mut dyn GraphicsDriver, request: &ClearRequest<'_>, drawable_height: i32) {
    let mut planes = ClearFlags::EMPTY;

    if request.flags.contains(ClearFlags::COLOR) {
        driver.clear_color(request.color.to_linear());
        planes |= ClearFlags::COLOR;
    }

    if request.flags.contains(ClearFlags::DEPTH) {
        driver.clear_depth(request.depth);
        planes |= ClearFlags::DEPTH;
    }

    if request.rects.is_empty() {
        driver.clear(planes);
        return;
    }

    driver.enable(Capability::ScissorTest);
    for rect in request.rects {
        driver.scissor(rect.to_native(drawable_height));
        driver.clear(planes);
    }
    driver.disable(Capability::ScissorTest);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::NativeRect;
    use crate::renderer::recording::{DriverCall, DriverProfile, RecordingDriver};

    #[test]
    fn unchanged_viewport_is_skipped() {
        let mut driver = RecordingDriver::new(DriverProfile::modern());
        let mut viewport = ViewportState::default();
        let rect = Rect::new(0, 0, 320, 200);

        assert!(viewport.set(&mut driver, rect, 200));
        assert!(!viewport.set(&mut driver, rect, 200));
        assert_eq!(
            driver.take_calls(),
            vec![DriverCall::Viewport(NativeRect {
                x: 0,
                y: 0,
                width: 320,
                height: 200,
            })]
        );
    }

    #[test]
    fn invalid_scissor_disables_the_test() {
        let mut driver = RecordingDriver::new(DriverProfile::modern());
        set_scissor(&mut driver, &Rect::new(5, 5, 0, 0), 100);
        assert_eq!(
            driver.take_calls(),
            vec![DriverCall::Disable(Capability::ScissorTest)]
        );

        set_scissor(&mut driver, &Rect::new(10, 10, 30, 20), 100);
        assert_eq!(
            driver.take_calls(),
            vec![
                DriverCall::Enable(Capability::ScissorTest),
                DriverCall::Scissor(NativeRect {
                    x: 10,
                    y: 80,
                    width: 20,
                    height: 10,
                }),
            ]
        );
    }

    #[test]
    fn regions_are_cleared_one_by_one() {
        let mut driver = RecordingDriver::new(DriverProfile::modern());
        let rects = [Rect::new(0, 0, 10, 10), Rect::new(20, 20, 40, 30)];
        let request = ClearRequest::new(ClearFlags::COLOR)
            .with_color(Color::BLACK)
            .with_rects(&rects);
        clear(&mut driver, &request, 100);

        assert_eq!(
            driver.take_calls(),
            vec![
                DriverCall::ClearColor(Color::BLACK.to_linear()),
                DriverCall::Enable(Capability::ScissorTest),
                DriverCall::Scissor(NativeRect {
                    x: 0,
                    y: 90,
                    width: 10,
                    height: 10,
                }),
                DriverCall::Clear(ClearFlags::COLOR),
                DriverCall::Scissor(NativeRect {
                    x: 20,
                    y: 70,
                    width: 20,
                    height: 10,
                }),
                DriverCall::Clear(ClearFlags::COLOR),
                DriverCall::Disable(Capability::ScissorTest),
            ]
        );
    }

    #[test]
    fn full_clear_sets_both_values() {
        let mut driver = RecordingDriver::new(DriverProfile::modern());
        clear(&mut driver, &ClearRequest::default().with_depth(0.5), 100);
        assert_eq!(
            driver.take_calls(),
            vec![
                DriverCall::ClearColor(Color::TRANSPARENT.to_linear()),
                DriverCall::ClearDepth(0.5),
                DriverCall::Clear(ClearFlags::COLOR | ClearFlags::DEPTH),
            ]
        );
    }
}
