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

//! Tracks which matrices are loaded in the driver.
//!
//! World-space draws need the view and projection matrices, pixel-space draws
//! need identity and a pixel-to-clip projection built from the viewport.
//! Switching between the two only reloads matrices when the cached mode differs.

use crate::math::{Mat4, Rect};
use crate::renderer::api::MatrixSlot;
use crate::renderer::traits::GraphicsDriver;

/// The matrices currently loaded in the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransformMode {
    /// Unknown; the next switch must reload.
    #[default]
    Unset,
    /// Identity model-view and a pixel-space projection.
    NoTransform,
    /// The view and projection matrices.
    ModelViewProjection,
}

/// Caches the loaded transform and the current view/projection matrices.
#[derive(Debug, Clone, Default)]
pub struct TransformCache {
    mode: TransformMode,
    view: Mat4,
    projection: Mat4,
}

impl TransformCache {
    /// Creates a cache in the [`TransformMode::Unset`] mode with identity matrices.
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached mode.
    pub fn mode(&self) -> TransformMode {
        self.mode
    }

    /// The current view matrix.
    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    /// The current projection matrix.
    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Loads the view and projection matrices for world-space draws.
    pub fn enable(&mut self, driver: &mut dyn GraphicsDriver) {
        if self.mode == TransformMode::ModelViewProjection {
            return;
        }
        driver.load_matrix(MatrixSlot::ModelView, &self.view);
        driver.load_matrix(MatrixSlot::Projection, &self.projection);
        self.mode = TransformMode::ModelViewProjection;
    }

    /// Loads the pixel-space transform for screen-space draws.
    pub fn disable(&mut self, driver: &mut dyn GraphicsDriver, viewport: &Rect) {
        if self.mode == TransformMode::NoTransform {
            return;
        }
        driver.load_matrix(MatrixSlot::ModelView, &Mat4::IDENTITY);
        driver.load_matrix(MatrixSlot::Projection, &pixel_projection(viewport));
        self.mode = TransformMode::NoTransform;
    }

    /// Sets the view matrix. A different matrix invalidates a loaded world transform.
    pub fn set_view(&mut self, view: &Mat4) {
        if self.view == *view {
            return;
        }
        self.invalidate_world();
        self.view = *view;
    }

    /// Sets the projection matrix. A different matrix invalidates a loaded world transform.
    pub fn set_projection(&mut self, projection: &Mat4) {
        if self.projection == *projection {
            return;
        }
        self.invalidate_world();
        self.projection = *projection;
    }

    /// Forgets a loaded pixel-space transform, which depends on the viewport.
    pub fn viewport_changed(&mut self) {
        if self.mode == TransformMode::NoTransform {
            self.mode = TransformMode::Unset;
        }
    }

    /// Forgets whatever is loaded.
    pub fn invalidate(&mut self) {
        self.mode = TransformMode::Unset;
    }

    fn invalidate_world(&mut self) {
        if self.mode == TransformMode::ModelViewProjection {
            self.mode = TransformMode::Unset;
        }
    }
}

/// Maps pixel coordinates inside `viewport` to clip space, flipping `y` and
/// moving sample points to pixel centers.
pub fn pixel_projection(viewport: &Rect) -> Mat4 {
    let width = viewport.width() as f32;
    let height = viewport.height() as f32;
    Mat4::from_translation(-1.0, 1.0, 0.0)
        * Mat4::from_scale(2.0 / width, -2.0 / height, 1.0)
        * Mat4::from_translation(0.5 - viewport.left as f32, 0.5 - viewport.top as f32, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::recording::{DriverCall, DriverProfile, RecordingDriver};
    use approx::assert_relative_eq;

    #[test]
    fn enable_loads_once() {
        let mut driver = RecordingDriver::new(DriverProfile::modern());
        let mut cache = TransformCache::new();
        let view = Mat4::from_translation(0.0, 0.0, -5.0);
        cache.set_view(&view);

        cache.enable(&mut driver);
        cache.enable(&mut driver);
        assert_eq!(
            driver.take_calls(),
            vec![
                DriverCall::LoadMatrix(MatrixSlot::ModelView, view),
                DriverCall::LoadMatrix(MatrixSlot::Projection, Mat4::IDENTITY),
            ]
        );
        assert_eq!(cache.mode(), TransformMode::ModelViewProjection);
    }

    #[test]
    fn identical_view_keeps_the_cache() {
        let mut driver = RecordingDriver::new(DriverProfile::modern());
        let mut cache = TransformCache::new();
        let view = Mat4::from_scale(2.0, 2.0, 2.0);
        cache.set_view(&view);
        cache.enable(&mut driver);

        cache.set_view(&view);
        assert_eq!(cache.mode(), TransformMode::ModelViewProjection);

        cache.set_view(&Mat4::IDENTITY);
        assert_eq!(cache.mode(), TransformMode::Unset);
    }

    #[test]
    fn matrix_changes_do_not_touch_pixel_mode() {
        let mut driver = RecordingDriver::new(DriverProfile::modern());
        let mut cache = TransformCache::new();
        cache.disable(&mut driver, &Rect::from_size(640, 480));

        cache.set_projection(&Mat4::from_scale(1.0, 2.0, 1.0));
        assert_eq!(cache.mode(), TransformMode::NoTransform);

        cache.viewport_changed();
        assert_eq!(cache.mode(), TransformMode::Unset);
    }

    #[test]
    fn pixel_projection_maps_corners_to_clip_space() {
        let viewport = Rect::new(100, 50, 500, 350);
        let m = pixel_projection(&viewport);

        let top_left = m.transform_point([100.0, 50.0, 0.0]);
        assert_relative_eq!(top_left[0], -1.0 + 1.0 / 400.0, epsilon = 1e-5);
        assert_relative_eq!(top_left[1], 1.0 - 1.0 / 300.0, epsilon = 1e-5);

        let bottom_right = m.transform_point([499.5, 349.5, 0.0]);
        assert_relative_eq!(bottom_right[0], 1.0, epsilon = 1e-5);
        assert_relative_eq!(bottom_right[1], -1.0, epsilon = 1e-5);
    }
}
