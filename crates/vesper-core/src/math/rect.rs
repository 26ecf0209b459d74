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

//! Defines `Rect`, an axis-aligned pixel rectangle with a top-left origin.

/// An axis-aligned rectangle in window pixels.
///
/// The origin is the top-left corner of the window and `y` grows downwards.
/// `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// The left edge (inclusive).
    pub left: i32,
    /// The top edge (inclusive).
    pub top: i32,
    /// The right edge (exclusive).
    pub right: i32,
    /// The bottom edge (exclusive).
    pub bottom: i32,
}

impl Rect {
    /// Creates a rectangle from its four edges.
    #[inline]
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Creates a rectangle anchored at the origin with the given size.
    #[inline]
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// The width of the rectangle in pixels.
    #[inline]
    pub const fn width(&self) -> i32 {
        self.right - self.left
    }

    /// The height of the rectangle in pixels.
    #[inline]
    pub const fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Returns `true` if the rectangle has a non-negative extent on both axes.
    ///
    /// A degenerate rectangle (zero width or height) is still valid; it is
    /// used to request an empty scissor region.
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.left <= self.right && self.top <= self.bottom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_accessors() {
        let r = Rect::new(10, 20, 110, 70);
        assert_eq!(r.width(), 100);
        assert_eq!(r.height(), 50);
        assert!(r.is_valid());
    }

    #[test]
    fn inverted_rect_is_invalid() {
        assert!(!Rect::new(10, 0, 5, 10).is_valid());
        assert!(!Rect::new(0, 10, 10, 5).is_valid());
        assert!(Rect::new(3, 3, 3, 3).is_valid());
    }
}
