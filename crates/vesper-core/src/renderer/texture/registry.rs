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

//! The registry of loaded textures.
//!
//! Driver textures die with the device. The registry keeps enough to rebuild
//! them, so a device shutdown/reinit is a two-phase handoff: release every
//! driver texture before the device goes away, restore them after the new
//! device is ready.

use crate::renderer::api::{TextureHandle, TextureId};
use crate::renderer::error::ResourceError;
use crate::renderer::traits::GraphicsDriver;

/// Owner of every texture the renderer may bind.
pub trait TextureRegistry {
    /// Deletes every driver texture. Handles stay valid.
    fn release_all(&mut self, driver: &mut dyn GraphicsDriver);

    /// Re-creates every released driver texture.
    ///
    /// Textures that fail are skipped; the first failure is returned.
    /// ## Errors
    /// * `ResourceError` - If any texture could not be re-created.
    fn restore_all(&mut self, driver: &mut dyn GraphicsDriver) -> Result<(), ResourceError>;

    /// Changes the anisotropy ceiling. Textures pick it up lazily, the next
    /// time they are resolved for binding.
    fn set_max_anisotropy(&mut self, value: f32);

    /// Returns the driver texture behind a handle, applying a pending
    /// anisotropy update first.
    fn resolve(&mut self, handle: TextureHandle, driver: &mut dyn GraphicsDriver)
        -> Option<TextureId>;
}

#[derive(Debug)]
struct TextureEntry {
    width: u32,
    height: u32,
    /// CPU copy of the RGBA8 pixels.
    pixels: Vec<u8>,
    /// The driver texture, `None` while released.
    id: Option<TextureId>,
    /// The driver texture has not seen the current anisotropy ceiling yet.
    anisotropy_stale: bool,
}

/// A [`TextureRegistry`] that keeps a CPU copy of every texture.
#[derive(Debug)]
pub struct TextureTable {
    entries: Vec<Option<TextureEntry>>,
    free: Vec<usize>,
    max_anisotropy: f32,
}

impl Default for TextureTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
            max_anisotropy: 1.0,
        }
    }

    /// Uploads a new RGBA8 texture and returns its handle.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::BackendError`] if `rgba` does not hold
    /// `width * height` pixels, or the driver error if the upload fails.
    pub fn create(
        &mut self,
        driver: &mut dyn GraphicsDriver,
        width: u32,
        height: u32,
        rgba: Vec<u8>,
    ) -> Result<TextureHandle, ResourceError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(ResourceError::BackendError(format!(
                "expected {expected} bytes of RGBA data for a {width}x{height} texture, got {}",
                rgba.len()
            )));
        }

        let id = driver.create_texture(width, height, &rgba)?;
        let entry = TextureEntry {
            width,
            height,
            pixels: rgba,
            id: Some(id),
            anisotropy_stale: self.max_anisotropy > 1.0,
        };

        let index = match self.free.pop() {
            Some(index) => {
                self.entries[index] = Some(entry);
                index
            }
            None => {
                self.entries.push(Some(entry));
                self.entries.len() - 1
            }
        };
        Ok(TextureHandle(index))
    }

    /// Deletes a texture and returns the driver texture it used, if any.
    pub fn remove(
        &mut self,
        handle: TextureHandle,
        driver: &mut dyn GraphicsDriver,
    ) -> Option<TextureId> {
        let entry = self.entries.get_mut(handle.0)?.take()?;
        self.free.push(handle.0);
        if let Some(id) = entry.id {
            driver.delete_texture(id);
        }
        entry.id
    }

    /// The driver texture currently backing a handle, without side effects.
    pub fn texture_id(&self, handle: TextureHandle) -> Option<TextureId> {
        self.entry(handle).and_then(|e| e.id)
    }

    /// The size of a texture.
    pub fn size(&self, handle: TextureHandle) -> Option<(u32, u32)> {
        self.entry(handle).map(|e| (e.width, e.height))
    }

    /// The current anisotropy ceiling.
    pub fn max_anisotropy(&self) -> f32 {
        self.max_anisotropy
    }

    /// Number of live textures.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// Returns `true` if the table holds no texture.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry(&self, handle: TextureHandle) -> Option<&TextureEntry> {
        self.entries.get(handle.0).and_then(Option::as_ref)
    }
}

impl TextureRegistry for TextureTable {
    fn release_all(&mut self, driver: &mut dyn GraphicsDriver) {
        let mut released = 0;
        for entry in self.entries.iter_mut().flatten() {
            if let Some(id) = entry.id.take() {
                driver.delete_texture(id);
                released += 1;
            }
        }
        log::debug!("Released {released} textures");
    }

    fn restore_all(&mut self, driver: &mut dyn GraphicsDriver) -> Result<(), ResourceError> {
        let mut first_error = None;
        let mut restored = 0;
        for entry in self.entries.iter_mut().flatten() {
            if entry.id.is_some() {
                continue;
            }
            match driver.create_texture(entry.width, entry.height, &entry.pixels) {
                Ok(id) => {
                    entry.id = Some(id);
                    entry.anisotropy_stale = self.max_anisotropy > 1.0;
                    restored += 1;
                }
                Err(e) => {
                    log::warn!(
                        "Failed to restore {}x{} texture: {e}",
                        entry.width,
                        entry.height
                    );
                    first_error.get_or_insert(e);
                }
            }
        }
        log::debug!("Restored {restored} textures");
        first_error.map_or(Ok(()), Err)
    }

    fn set_max_anisotropy(&mut self, value: f32) {
        self.max_anisotropy = value;
        for entry in self.entries.iter_mut().flatten() {
            entry.anisotropy_stale = true;
        }
    }

    fn resolve(
        &mut self,
        handle: TextureHandle,
        driver: &mut dyn GraphicsDriver,
    ) -> Option<TextureId> {
        let max_anisotropy = self.max_anisotropy;
        let entry = self.entries.get_mut(handle.0)?.as_mut()?;
        let id = entry.id?;
        if entry.anisotropy_stale {
            driver.texture_max_anisotropy(id, max_anisotropy);
            entry.anisotropy_stale = false;
        }
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::recording::{DriverCall, DriverProfile, RecordingDriver};

    fn pixels(width: u32, height: u32) -> Vec<u8> {
        vec![0xff; (width * height * 4) as usize]
    }

    #[test]
    fn rejects_mismatched_pixel_data() {
        let mut driver = RecordingDriver::new(DriverProfile::modern());
        let mut table = TextureTable::new();
        assert!(table.create(&mut driver, 4, 4, vec![0; 3]).is_err());
        assert!(table.is_empty());
    }

    #[test]
    fn release_and_restore_keep_handles() {
        let mut driver = RecordingDriver::new(DriverProfile::modern());
        let mut table = TextureTable::new();
        let handle = table.create(&mut driver, 2, 2, pixels(2, 2)).unwrap();
        let before = table.texture_id(handle).unwrap();

        table.release_all(&mut driver);
        assert_eq!(table.texture_id(handle), None);
        assert!(driver.calls().contains(&DriverCall::DeleteTexture(before)));

        table.restore_all(&mut driver).unwrap();
        let after = table.texture_id(handle).unwrap();
        assert_ne!(before, after);
        assert_eq!(table.size(handle), Some((2, 2)));
    }

    #[test]
    fn anisotropy_is_applied_lazily_once() {
        let mut driver = RecordingDriver::new(DriverProfile::modern());
        let mut table = TextureTable::new();
        let handle = table.create(&mut driver, 1, 1, pixels(1, 1)).unwrap();
        let id = table.texture_id(handle).unwrap();
        driver.take_calls();

        table.set_max_anisotropy(8.0);
        assert!(driver.take_calls().is_empty());

        assert_eq!(table.resolve(handle, &mut driver), Some(id));
        assert_eq!(table.resolve(handle, &mut driver), Some(id));
        assert_eq!(
            driver.take_calls(),
            vec![DriverCall::TextureMaxAnisotropy(id, 8.0)]
        );
    }

    #[test]
    fn removed_handles_are_recycled() {
        let mut driver = RecordingDriver::new(DriverProfile::modern());
        let mut table = TextureTable::new();
        let first = table.create(&mut driver, 1, 1, pixels(1, 1)).unwrap();
        let id = table.texture_id(first);
        assert_eq!(table.remove(first, &mut driver), id);
        assert_eq!(table.remove(first, &mut driver), None);

        let second = table.create(&mut driver, 1, 1, pixels(1, 1)).unwrap();
        assert_eq!(first, second);
        assert_eq!(table.len(), 1);
    }
}
