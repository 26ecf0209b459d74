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

//! Pixel regions in the driver's bottom-left-origin convention.

use crate::math::Rect;

/// A rectangle as the driver expects it: origin at the bottom-left corner of the
/// drawable, `y` growing upwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NativeRect {
    /// Left edge in pixels.
    pub x: i32,
    /// Bottom edge in pixels, measured from the bottom of the drawable.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl NativeRect {
    /// Converts a top-left-origin rectangle for a drawable of the given height.
    pub const fn from_rect(rect: &Rect, drawable_height: i32) -> Self {
        Self {
            x: rect.left,
            y: drawable_height - rect.bottom,
            width: rect.width(),
            height: rect.height(),
        }
    }
}

impl Rect {
    /// Converts this rectangle to the driver convention. See [`NativeRect::from_rect`].
    pub const fn to_native(&self, drawable_height: i32) -> NativeRect {
        NativeRect::from_rect(self, drawable_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flips_the_vertical_axis() {
        let native = Rect::new(10, 20, 110, 70).to_native(600);
        assert_eq!(
            native,
            NativeRect {
                x: 10,
                y: 530,
                width: 100,
                height: 50,
            }
        );
    }

    #[test]
    fn full_window_maps_to_origin() {
        let native = Rect::from_size(800, 600).to_native(600);
        assert_eq!((native.x, native.y), (0, 0));
        assert_eq!((native.width, native.height), (800, 600));
    }
}
