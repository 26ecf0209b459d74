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

//! Per-texture-unit cached configuration.
//!
//! Each unit keeps a requested and an applied [`TextureStageState`]. Setters
//! mark a unit dirty; [`TextureStageArray::flush`] only walks units up to the
//! highest one touched since the previous flush.

use crate::renderer::api::{FilterMode, TextureId, WrapMode};
use crate::renderer::traits::GraphicsDriver;

/// Sampler parameters of a texture unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerState {
    /// Wrap mode on both axes.
    pub wrap: WrapMode,
    /// Minification filter.
    pub min: FilterMode,
    /// Magnification filter.
    pub mag: FilterMode,
    /// Mipmap filter, `None` to disable mipmapping.
    pub mip: Option<FilterMode>,
}

impl Default for SamplerState {
    fn default() -> Self {
        Self {
            wrap: WrapMode::Repeat,
            min: FilterMode::Linear,
            mag: FilterMode::Linear,
            mip: Some(FilterMode::Linear),
        }
    }
}

/// The binding and sampler configuration of one texture unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureStageState {
    /// The bound texture.
    pub texture: Option<TextureId>,
    /// Sampler parameters applied to the bound texture.
    pub sampler: SamplerState,
}

/// One texture unit with its requested and applied configuration.
#[derive(Debug, Clone, Default)]
pub struct TextureStage {
    requested: TextureStageState,
    applied: TextureStageState,
    dirty: bool,
}

impl TextureStage {
    /// The configuration callers asked for.
    pub fn requested(&self) -> &TextureStageState {
        &self.requested
    }

    /// The configuration the driver reflects.
    pub fn applied(&self) -> &TextureStageState {
        &self.applied
    }

    /// Returns `true` if the unit changed since it was last applied.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns `true` if applying this unit would emit driver calls.
    fn needs_apply(&self) -> bool {
        let requested = &self.requested;
        self.dirty
            && (requested.texture != self.applied.texture
                || (requested.texture.is_some() && requested.sampler != self.applied.sampler))
    }

    fn apply(&mut self, driver: &mut dyn GraphicsDriver) {
        let requested = self.requested;
        let applied = self.applied;
        let rebound = requested.texture != applied.texture;

        if rebound {
            driver.bind_texture(requested.texture);
        }

        // Sampler parameters live in the texture object, so a new binding needs them again.
        if requested.texture.is_some() {
            if rebound || requested.sampler.wrap != applied.sampler.wrap {
                driver.texture_wrap(requested.sampler.wrap);
            }
            let filters_changed = requested.sampler.min != applied.sampler.min
                || requested.sampler.mag != applied.sampler.mag
                || requested.sampler.mip != applied.sampler.mip;
            if rebound || filters_changed {
                driver.texture_filter(
                    requested.sampler.min,
                    requested.sampler.mag,
                    requested.sampler.mip,
                );
            }
        }

        self.applied = requested;
        self.dirty = false;
    }
}

/// The texture units of a device.
///
/// Created when the device is initialized and dropped when it shuts down.
#[derive(Debug, Clone)]
pub struct TextureStageArray {
    stages: Vec<TextureStage>,
    /// Highest unit touched since the last flush.
    highest_touched: Option<usize>,
    /// The unit last passed to `active_texture`, `None` if unknown.
    active_unit: Option<usize>,
}

impl TextureStageArray {
    /// Creates `units` texture units with no texture bound.
    pub fn new(units: usize) -> Self {
        Self {
            stages: vec![TextureStage::default(); units],
            highest_touched: None,
            active_unit: None,
        }
    }

    /// The number of units.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns `true` if the device exposes no texture unit.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Returns a unit, if it exists.
    pub fn stage(&self, index: usize) -> Option<&TextureStage> {
        self.stages.get(index)
    }

    /// The highest unit touched since the last flush.
    pub fn highest_touched(&self) -> Option<usize> {
        self.highest_touched
    }

    fn touch(&mut self, index: usize) -> Option<&mut TextureStage> {
        debug_assert!(
            index < self.stages.len(),
            "texture stage {index} out of range ({} units)",
            self.stages.len()
        );
        let stage = self.stages.get_mut(index)?;
        stage.dirty = true;
        self.highest_touched = Some(self.highest_touched.map_or(index, |h| h.max(index)));
        Some(stage)
    }

    /// Requests a texture binding on a unit.
    pub fn set_texture(&mut self, index: usize, texture: Option<TextureId>) {
        if self.stages.get(index).map(|s| s.requested.texture) == Some(texture) {
            return;
        }
        if let Some(stage) = self.touch(index) {
            stage.requested.texture = texture;
        }
    }

    /// Requests a wrap mode on a unit.
    pub fn set_wrap(&mut self, index: usize, wrap: WrapMode) {
        if self.stages.get(index).map(|s| s.requested.sampler.wrap) == Some(wrap) {
            return;
        }
        if let Some(stage) = self.touch(index) {
            stage.requested.sampler.wrap = wrap;
        }
    }

    /// Requests filters on a unit.
    pub fn set_filters(
        &mut self,
        index: usize,
        min: FilterMode,
        mag: FilterMode,
        mip: Option<FilterMode>,
    ) {
        let unchanged = self.stages.get(index).is_some_and(|s| {
            let sampler = &s.requested.sampler;
            sampler.min == min && sampler.mag == mag && sampler.mip == mip
        });
        if unchanged {
            return;
        }
        if let Some(stage) = self.touch(index) {
            stage.requested.sampler.min = min;
            stage.requested.sampler.mag = mag;
            stage.requested.sampler.mip = mip;
        }
    }

    /// Applies every dirty unit up to the highest one touched since the last flush.
    pub fn flush(&mut self, driver: &mut dyn GraphicsDriver) {
        let Some(highest) = self.highest_touched.take() else {
            return;
        };

        for (index, stage) in self.stages.iter_mut().enumerate().take(highest + 1) {
            if !stage.needs_apply() {
                stage.applied = stage.requested;
                stage.dirty = false;
                continue;
            }
            if self.active_unit != Some(index) {
                driver.active_texture(index);
                self.active_unit = Some(index);
            }
            stage.apply(driver);
        }
    }

    /// Drops every reference to a texture that is being deleted.
    ///
    /// Deleting a texture unbinds it in the driver, so the applied binding is
    /// cleared as well.
    pub fn forget(&mut self, texture: TextureId) {
        for index in 0..self.stages.len() {
            let stage = &mut self.stages[index];
            if stage.applied.texture == Some(texture) {
                stage.applied.texture = None;
            }
            if stage.requested.texture == Some(texture) {
                self.set_texture(index, None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::recording::{DriverCall, DriverProfile, RecordingDriver};

    fn driver() -> RecordingDriver {
        RecordingDriver::new(DriverProfile::modern())
    }

    #[test]
    fn binding_applies_sampler_parameters() {
        let mut driver = driver();
        let mut stages = TextureStageArray::new(4);
        stages.set_texture(0, Some(TextureId(7)));
        stages.flush(&mut driver);

        assert_eq!(
            driver.take_calls(),
            vec![
                DriverCall::ActiveTexture(0),
                DriverCall::BindTexture(Some(TextureId(7))),
                DriverCall::TextureWrap(WrapMode::Repeat),
                DriverCall::TextureFilter {
                    min: FilterMode::Linear,
                    mag: FilterMode::Linear,
                    mip: Some(FilterMode::Linear),
                },
            ]
        );
    }

    #[test]
    fn only_touched_units_are_walked() {
        let mut driver = driver();
        let mut stages = TextureStageArray::new(8);
        stages.set_texture(2, Some(TextureId(1)));
        assert_eq!(stages.highest_touched(), Some(2));

        stages.flush(&mut driver);
        assert_eq!(stages.highest_touched(), None);

        let calls = driver.take_calls();
        assert_eq!(calls[0], DriverCall::ActiveTexture(2));
        assert_eq!(calls[1], DriverCall::BindTexture(Some(TextureId(1))));

        stages.flush(&mut driver);
        assert!(driver.take_calls().is_empty());
    }

    #[test]
    fn active_unit_is_cached() {
        let mut driver = driver();
        let mut stages = TextureStageArray::new(2);
        stages.set_texture(1, Some(TextureId(3)));
        stages.flush(&mut driver);
        driver.take_calls();

        stages.set_wrap(1, WrapMode::Clamp);
        stages.flush(&mut driver);
        assert_eq!(driver.take_calls(), vec![DriverCall::TextureWrap(WrapMode::Clamp)]);
    }

    #[test]
    fn sampler_changes_without_texture_are_deferred() {
        let mut driver = driver();
        let mut stages = TextureStageArray::new(1);
        stages.set_filters(0, FilterMode::Nearest, FilterMode::Nearest, None);
        stages.flush(&mut driver);
        assert!(driver.take_calls().is_empty());

        stages.set_texture(0, Some(TextureId(9)));
        stages.flush(&mut driver);
        assert_eq!(
            driver.take_calls(),
            vec![
                DriverCall::ActiveTexture(0),
                DriverCall::BindTexture(Some(TextureId(9))),
                DriverCall::TextureWrap(WrapMode::Repeat),
                DriverCall::TextureFilter {
                    min: FilterMode::Nearest,
                    mag: FilterMode::Nearest,
                    mip: None,
                },
            ]
        );
    }

    #[test]
    fn identical_requests_do_not_dirty() {
        let mut stages = TextureStageArray::new(2);
        stages.set_wrap(1, WrapMode::Repeat);
        stages.set_texture(0, None);
        assert_eq!(stages.highest_touched(), None);
        assert!(!stages.stage(1).is_some_and(TextureStage::is_dirty));
    }

    #[test]
    fn forgetting_a_texture_clears_bindings() {
        let mut driver = driver();
        let mut stages = TextureStageArray::new(2);
        stages.set_texture(0, Some(TextureId(4)));
        stages.flush(&mut driver);
        driver.take_calls();

        stages.forget(TextureId(4));
        assert_eq!(stages.stage(0).and_then(|s| s.applied().texture), None);
        assert_eq!(stages.stage(0).and_then(|s| s.requested().texture), None);

        stages.flush(&mut driver);
        assert!(driver.take_calls().is_empty());
    }
}
