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

//! VRAM Resource Monitor
//!
//! Samples video memory through the vendor extensions the capability probe
//! already understands (`NVX_gpu_memory_info`, `ATI_meminfo`) and keeps the
//! peak usage seen so far.

use vesper_core::renderer::query_vram;
use vesper_core::renderer::traits::CapabilitySource;

/// One VRAM sample. Fields the driver cannot report are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VramUsageReport {
    /// Bytes in use, known only when both the capacity and the free pool are.
    pub current_bytes: Option<u64>,
    /// Largest `current_bytes` seen by the monitor.
    pub peak_bytes: Option<u64>,
    /// Free bytes.
    pub free_bytes: Option<u64>,
    /// Dedicated video memory in bytes.
    pub total_capacity_bytes: Option<u64>,
}

/// Tracks VRAM usage of the device behind a [`CapabilitySource`].
#[derive(Debug)]
pub struct VramMonitor {
    /// Unique identifier for this monitor instance
    monitor_id: String,
    peak_bytes: Option<u64>,
    last: VramUsageReport,
}

impl VramMonitor {
    /// Create a new VRAM monitor
    pub fn new(monitor_id: impl Into<String>) -> Self {
        Self {
            monitor_id: monitor_id.into(),
            peak_bytes: None,
            last: VramUsageReport::default(),
        }
    }

    /// The identifier given at construction.
    pub fn monitor_id(&self) -> &str {
        &self.monitor_id
    }

    /// Queries the driver and returns the new report.
    pub fn sample(&mut self, source: &dyn CapabilitySource) -> VramUsageReport {
        let (total, free) = query_vram(source);
        let known = |bytes: u64| (bytes != 0).then_some(bytes);
        let total_capacity_bytes = known(total);
        let free_bytes = known(free);
        let current_bytes = total_capacity_bytes
            .zip(free_bytes)
            .map(|(total, free)| total.saturating_sub(free));

        if let Some(current) = current_bytes {
            self.peak_bytes = Some(self.peak_bytes.map_or(current, |peak| peak.max(current)));
        }

        self.last = VramUsageReport {
            current_bytes,
            peak_bytes: self.peak_bytes,
            free_bytes,
            total_capacity_bytes,
        };
        log::trace!("[{}] {:?}", self.monitor_id, self.last);
        self.last
    }

    /// The report of the last [`sample`](Self::sample) call.
    pub fn last_report(&self) -> VramUsageReport {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vesper_core::renderer::api::IntegerQuery;
    use vesper_core::renderer::capabilities::extensions;
    use vesper_core::renderer::recording::{DriverProfile, RecordingDriver};

    const MIB_IN_KIB: i32 = 1024;

    fn nvidia(total_mib: i32, free_mib: i32) -> RecordingDriver {
        RecordingDriver::new(
            DriverProfile::modern()
                .with_extension(extensions::NVX_GPU_MEMORY_INFO)
                .with_integer(IntegerQuery::DedicatedVideoMemory, total_mib * MIB_IN_KIB)
                .with_integer(IntegerQuery::AvailableVideoMemory, free_mib * MIB_IN_KIB),
        )
    }

    #[test]
    fn tracks_usage_and_peak() {
        let mut monitor = VramMonitor::new("gpu0");
        let report = monitor.sample(&nvidia(1024, 768));
        assert_eq!(report.total_capacity_bytes, Some(1024 << 20));
        assert_eq!(report.current_bytes, Some(256 << 20));
        assert_eq!(report.peak_bytes, Some(256 << 20));

        let report = monitor.sample(&nvidia(1024, 1000));
        assert_eq!(report.current_bytes, Some(24 << 20));
        assert_eq!(report.peak_bytes, Some(256 << 20));
        assert_eq!(monitor.last_report(), report);
    }

    #[test]
    fn free_pool_only_has_no_usage() {
        let driver = RecordingDriver::new(
            DriverProfile::modern()
                .with_extension(extensions::ATI_MEMINFO)
                .with_integer(IntegerQuery::VboFreeMemory, 2 * MIB_IN_KIB),
        );
        let mut monitor = VramMonitor::new("ati");
        let report = monitor.sample(&driver);
        assert_eq!(report.free_bytes, Some(2 << 20));
        assert_eq!(report.current_bytes, None);
        assert_eq!(report.peak_bytes, None);
    }

    #[test]
    fn unknown_device_reports_nothing() {
        let mut monitor = VramMonitor::new("legacy");
        let report = monitor.sample(&RecordingDriver::new(DriverProfile::legacy()));
        assert_eq!(report, VramUsageReport::default());
        assert_eq!(monitor.monitor_id(), "legacy");
    }
}
