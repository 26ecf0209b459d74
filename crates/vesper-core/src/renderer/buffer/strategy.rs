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

//! Selection of the vertex buffer upload strategy.
//!
//! The choice depends on the device capabilities, the usage pattern of the
//! buffer and the user's `buffer_upload` hint. Selection never fails: a hint
//! that cannot be honored is reported once and auto mode decides instead.

use std::collections::HashSet;
use std::fmt;

use crate::renderer::api::BufferUsage;
use crate::renderer::capabilities::DeviceCapabilities;

/// How bytes are uploaded by the mapped strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadPath {
    /// Map the buffer (or range) and write through the mapping.
    Map,
    /// Upload with sub-data calls.
    SubData,
}

/// The concrete implementation backing a vertex buffer, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferStrategy {
    /// No buffer object: vertices stay in client memory.
    Immediate,
    /// Mutable buffer object, whole-buffer uploads.
    Map {
        /// Upload path.
        upload: UploadPath,
    },
    /// Mutable buffer object, uploads limited to the written range.
    MapRange {
        /// Upload path.
        upload: UploadPath,
    },
    /// Persistently mapped buffer, orphaned when the contents are discarded.
    PersistentOrphan,
    /// Persistently mapped buffer split in `slots` regions, each guarded by a fence.
    PersistentFenced {
        /// Number of regions (2 for double, 3 for triple buffering).
        slots: usize,
    },
    /// Persistently mapped buffer without any synchronization.
    PersistentUnsynchronized,
}

impl BufferStrategy {
    /// Returns `true` for the persistent-mapped strategies.
    pub fn is_persistent(&self) -> bool {
        matches!(
            self,
            BufferStrategy::PersistentOrphan
                | BufferStrategy::PersistentFenced { .. }
                | BufferStrategy::PersistentUnsynchronized
        )
    }
}

impl fmt::Display for BufferStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferStrategy::Immediate => write!(f, "immediate"),
            BufferStrategy::Map {
                upload: UploadPath::Map,
            } => write!(f, "map"),
            BufferStrategy::Map {
                upload: UploadPath::SubData,
            } => write!(f, "map+subdata"),
            BufferStrategy::MapRange {
                upload: UploadPath::Map,
            } => write!(f, "maprange"),
            BufferStrategy::MapRange {
                upload: UploadPath::SubData,
            } => write!(f, "maprange+subdata"),
            BufferStrategy::PersistentOrphan => write!(f, "persistent-orphan"),
            BufferStrategy::PersistentFenced { slots } => write!(f, "persistent-x{slots}"),
            BufferStrategy::PersistentUnsynchronized => write!(f, "persistent-nosync"),
        }
    }
}

/// A parsed `buffer_upload` hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyHint {
    /// Empty or `"auto"`.
    Auto,
    /// `"persistent-orphan"`.
    PersistentOrphan,
    /// `"persistent-x3"`.
    PersistentTriple,
    /// `"persistent-x2"`.
    PersistentDouble,
    /// `"persistent-nosync"`.
    PersistentUnsynchronized,
    /// `"maprange"` or `"maprange+subdata"`.
    MapRange(UploadPath),
    /// `"map"` or `"map+subdata"`.
    Map(UploadPath),
    /// Anything else.
    Unknown,
}

impl StrategyHint {
    /// Parses a hint. Surrounding whitespace and case are ignored.
    pub fn parse(hint: &str) -> Self {
        match hint.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => StrategyHint::Auto,
            "persistent-orphan" => StrategyHint::PersistentOrphan,
            "persistent-x3" => StrategyHint::PersistentTriple,
            "persistent-x2" => StrategyHint::PersistentDouble,
            "persistent-nosync" => StrategyHint::PersistentUnsynchronized,
            "maprange" => StrategyHint::MapRange(UploadPath::Map),
            "maprange+subdata" => StrategyHint::MapRange(UploadPath::SubData),
            "map" => StrategyHint::Map(UploadPath::Map),
            "map+subdata" => StrategyHint::Map(UploadPath::SubData),
            _ => StrategyHint::Unknown,
        }
    }
}

/// Resolves buffer strategies and remembers which hints were already reported.
#[derive(Debug, Default)]
pub struct StrategySelector {
    warned: HashSet<String>,
    fallbacks: usize,
}

impl StrategySelector {
    /// Creates a selector that has not reported anything yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks the strategy for a new buffer.
    ///
    /// ## Arguments
    /// * `caps` - Capabilities of the current device.
    /// * `usage` - Usage pattern of the buffer.
    /// * `hint` - The `buffer_upload` setting; empty for auto.
    pub fn select(
        &mut self,
        caps: &DeviceCapabilities,
        usage: BufferUsage,
        hint: &str,
    ) -> BufferStrategy {
        if !caps.vertex_buffers {
            return BufferStrategy::Immediate;
        }

        let parsed = StrategyHint::parse(hint);
        let strategy = match resolve_hint(caps, usage, parsed) {
            Some(strategy) => strategy,
            None => {
                self.fallbacks += 1;
                if self.warned.insert(hint.to_owned()) {
                    log::warn!("Ignoring unsupported video.buffer_upload setting: {hint}");
                }
                auto_strategy(caps, usage)
            }
        };

        log::trace!("Selected {strategy} vertex buffer strategy for {usage:?} usage");
        strategy
    }

    /// Number of selections where the hint had to be ignored.
    pub fn fallback_count(&self) -> usize {
        self.fallbacks
    }

    /// Number of distinct hints that were reported.
    pub fn warning_count(&self) -> usize {
        self.warned.len()
    }
}

/// The strategy a hint asks for, or `None` if it cannot be honored.
fn resolve_hint(
    caps: &DeviceCapabilities,
    usage: BufferUsage,
    hint: StrategyHint,
) -> Option<BufferStrategy> {
    let persistent = caps.buffer_storage && caps.map_buffer_range;
    match hint {
        StrategyHint::Auto => Some(auto_strategy(caps, usage)),
        StrategyHint::PersistentOrphan if persistent && usage != BufferUsage::Static => {
            Some(BufferStrategy::PersistentOrphan)
        }
        StrategyHint::PersistentTriple if persistent && usage == BufferUsage::Stream => {
            Some(BufferStrategy::PersistentFenced { slots: 3 })
        }
        StrategyHint::PersistentDouble if persistent && usage == BufferUsage::Stream => {
            Some(BufferStrategy::PersistentFenced { slots: 2 })
        }
        StrategyHint::PersistentUnsynchronized if persistent && usage != BufferUsage::Static => {
            Some(BufferStrategy::PersistentUnsynchronized)
        }
        StrategyHint::MapRange(upload) if caps.map_buffer_range => {
            Some(BufferStrategy::MapRange { upload })
        }
        StrategyHint::Map(upload) => Some(BufferStrategy::Map { upload }),
        _ => None,
    }
}

/// The strategy chosen when no usable hint is given.
fn auto_strategy(caps: &DeviceCapabilities, usage: BufferUsage) -> BufferStrategy {
    if caps.buffer_storage && caps.map_buffer_range {
        match usage {
            BufferUsage::Stream => return BufferStrategy::PersistentFenced { slots: 3 },
            BufferUsage::Dynamic => return BufferStrategy::PersistentOrphan,
            BufferUsage::Static => {}
        }
    }
    if caps.map_buffer_range {
        BufferStrategy::MapRange {
            upload: UploadPath::Map,
        }
    } else {
        BufferStrategy::Map {
            upload: UploadPath::Map,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(buffer_storage: bool, map_buffer_range: bool) -> DeviceCapabilities {
        DeviceCapabilities {
            buffer_storage,
            map_buffer_range,
            vertex_arrays: true,
            vertex_buffers: true,
            ..DeviceCapabilities::default()
        }
    }

    #[test]
    fn auto_mode_prefers_persistent_buffers() {
        let mut selector = StrategySelector::new();
        let full = caps(true, true);
        assert_eq!(
            selector.select(&full, BufferUsage::Stream, ""),
            BufferStrategy::PersistentFenced { slots: 3 }
        );
        assert_eq!(
            selector.select(&full, BufferUsage::Dynamic, "auto"),
            BufferStrategy::PersistentOrphan
        );
        assert_eq!(
            selector.select(&full, BufferUsage::Static, ""),
            BufferStrategy::MapRange {
                upload: UploadPath::Map
            }
        );
    }

    #[test]
    fn falls_back_to_whole_buffer_mapping() {
        let mut selector = StrategySelector::new();
        assert_eq!(
            selector.select(&caps(false, false), BufferUsage::Dynamic, ""),
            BufferStrategy::Map {
                upload: UploadPath::Map
            }
        );
    }

    #[test]
    fn no_vertex_buffers_means_immediate() {
        let mut selector = StrategySelector::new();
        let mut no_vbo = caps(true, true);
        no_vbo.vertex_buffers = false;
        assert_eq!(
            selector.select(&no_vbo, BufferUsage::Stream, "persistent-x3"),
            BufferStrategy::Immediate
        );
        assert_eq!(selector.fallback_count(), 0);
    }

    #[test]
    fn honors_compatible_hints() {
        let mut selector = StrategySelector::new();
        let full = caps(true, true);
        assert_eq!(
            selector.select(&full, BufferUsage::Stream, "persistent-x2"),
            BufferStrategy::PersistentFenced { slots: 2 }
        );
        assert_eq!(
            selector.select(&full, BufferUsage::Dynamic, "persistent-nosync"),
            BufferStrategy::PersistentUnsynchronized
        );
        assert_eq!(
            selector.select(&full, BufferUsage::Stream, "maprange+subdata"),
            BufferStrategy::MapRange {
                upload: UploadPath::SubData
            }
        );
        assert_eq!(
            selector.select(&full, BufferUsage::Static, "map+subdata"),
            BufferStrategy::Map {
                upload: UploadPath::SubData
            }
        );
        assert_eq!(selector.fallback_count(), 0);
    }

    #[test]
    fn incompatible_hints_fall_back_to_auto() {
        let mut selector = StrategySelector::new();

        // Double buffering only makes sense for streamed data.
        assert_eq!(
            selector.select(&caps(true, true), BufferUsage::Dynamic, "persistent-x2"),
            BufferStrategy::PersistentOrphan
        );
        // No buffer storage.
        assert_eq!(
            selector.select(&caps(false, true), BufferUsage::Stream, "persistent-orphan"),
            BufferStrategy::MapRange {
                upload: UploadPath::Map
            }
        );
        // No range mapping.
        assert_eq!(
            selector.select(&caps(false, false), BufferUsage::Static, "maprange"),
            BufferStrategy::Map {
                upload: UploadPath::Map
            }
        );
        assert_eq!(selector.fallback_count(), 3);
        assert_eq!(selector.warning_count(), 3);
    }

    #[test]
    fn unknown_hint_is_reported_once() {
        let mut selector = StrategySelector::new();
        let full = caps(true, true);
        for _ in 0..5 {
            assert_eq!(
                selector.select(&full, BufferUsage::Stream, "turbo"),
                BufferStrategy::PersistentFenced { slots: 3 }
            );
        }
        assert_eq!(selector.fallback_count(), 5);
        assert_eq!(selector.warning_count(), 1);
    }

    #[test]
    fn hint_parsing() {
        assert_eq!(StrategyHint::parse(" Auto "), StrategyHint::Auto);
        assert_eq!(
            StrategyHint::parse("maprange+subdata"),
            StrategyHint::MapRange(UploadPath::SubData)
        );
        assert_eq!(StrategyHint::parse("persistent-x4"), StrategyHint::Unknown);
    }

    #[test]
    fn display_matches_hint_names() {
        for name in [
            "map",
            "map+subdata",
            "maprange",
            "maprange+subdata",
            "persistent-orphan",
            "persistent-x3",
            "persistent-x2",
            "persistent-nosync",
        ] {
            let strategy = resolve_hint(
                &caps(true, true),
                BufferUsage::Stream,
                StrategyHint::parse(name),
            );
            assert_eq!(strategy.map(|s| s.to_string()).as_deref(), Some(name));
        }
    }
}
