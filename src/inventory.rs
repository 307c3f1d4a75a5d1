//! Snapshot of the installed platforms and their devices.

use core::fmt::Display;
use serde::Serialize;
use crate::cli::found_line;
use crate::error::{render, Result};
use crate::prelude::{Platform, Device, DeviceType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inventory {
    pub platform_count: usize,
    pub platforms: Vec<PlatformInfo>
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformInfo {
    pub index: usize,
    pub name: String,
    pub vendor: String,
    pub version: String,
    pub profile: String,
    pub devices: Vec<DeviceInfo>,
    /// Why some of the fields above could not be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub index: usize,
    pub name: String,
    pub vendor: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub version: String,
    pub driver_version: String,
    pub available: bool,
    pub compute_units: u32,
    pub max_work_group_size: usize,
    pub global_mem_bytes: u64,
    /// Set when the device could not be queried; the device then counts as unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>
}

const UNKNOWN : &str = "<unknown>";

impl Inventory {
    /// Queries every platform and its devices of type `ty`.
    ///
    /// Only a failure to list the platforms is an error. A platform or device whose
    /// info cannot be read is still listed, with the failure in its `error` field.
    pub fn discover (ty: DeviceType) -> Result<Self> {
        let platforms = Platform::all()?
            .iter()
            .enumerate()
            .map(|(index, platform)| PlatformInfo::query(index, platform, ty))
            .collect::<Vec<_>>();

        Ok(Self { platform_count: platforms.len(), platforms })
    }

    /// Devices across all platforms.
    #[inline]
    pub fn device_count (&self) -> usize {
        self.platforms.iter().map(|p| p.devices.len()).sum()
    }
}

impl PlatformInfo {
    fn query (index: usize, platform: &Platform, ty: DeviceType) -> Self {
        let mut error = None;
        let devices: Vec<DeviceInfo> = match Device::all(platform, ty) {
            Ok(devices) => devices.iter()
                .enumerate()
                .map(|(index, device)| DeviceInfo::query(index, device))
                .collect(),

            Err(e) => {
                let e = render(&e);
                log::warn!("failed to list the devices of platform #{index}: {e}");
                error = Some(e);
                Vec::new()
            }
        };

        let mut read = |field: Result<String>| match field {
            Ok(x) => x,
            Err(e) => {
                let e = render(&e);
                log::warn!("failed to query platform #{index}: {e}");
                error.get_or_insert(e);
                UNKNOWN.into()
            }
        };

        Self {
            index,
            name: read(platform.name()),
            vendor: read(platform.vendor()),
            version: read(platform.version()),
            profile: read(platform.profile()),
            devices,
            error
        }
    }
}

impl DeviceInfo {
    fn query (index: usize, device: &Device) -> Self {
        match Self::try_query(index, device) {
            Ok(info) => info,
            Err(e) => {
                let e = render(&e);
                log::warn!("failed to query device #{index}: {e}");
                Self::unreadable(index, device.name().unwrap_or_else(|_| UNKNOWN.into()), e)
            }
        }
    }

    fn try_query (index: usize, device: &Device) -> Result<Self> {
        Ok(Self {
            index,
            name: device.name()?,
            vendor: device.vendor()?,
            kind: device.ty()?.to_string(),
            version: device.version()?,
            driver_version: device.driver_version()?,
            available: device.available()?,
            compute_units: device.max_compute_units()?,
            max_work_group_size: device.max_work_group_size()?,
            global_mem_bytes: device.global_mem_size()?,
            error: None
        })
    }

    /// Entry for a device whose info could not be read.
    pub fn unreadable (index: usize, name: String, error: String) -> Self {
        Self {
            index,
            name,
            vendor: UNKNOWN.into(),
            kind: UNKNOWN.into(),
            version: UNKNOWN.into(),
            driver_version: UNKNOWN.into(),
            available: false,
            compute_units: 0,
            max_work_group_size: 0,
            global_mem_bytes: 0,
            error: Some(error)
        }
    }
}

impl Display for Inventory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "{}", found_line(self.platform_count, "platform"))?;
        for platform in &self.platforms {
            writeln!(f, "Platform #{}: {} ({})", platform.index, platform.name, platform.vendor)?;
            writeln!(f, "  {} [{}]", platform.version, platform.profile)?;
            if let Some(e) = &platform.error {
                writeln!(f, "  error: {e}")?;
            }
            writeln!(f, "  {}", found_line(platform.devices.len(), "device"))?;

            for device in &platform.devices {
                writeln!(f, "  Device #{}: {} [{}]", device.index, device.name, device.kind)?;
                if let Some(e) = &device.error {
                    writeln!(f, "    error: {e}")?;
                    writeln!(f, "    (not available)")?;
                    continue
                }

                writeln!(f, "    vendor: {}", device.vendor)?;
                writeln!(f, "    version: {} (driver {})", device.version, device.driver_version)?;
                writeln!(f, "    compute units: {}, max work group: {}, global memory: {} MiB", device.compute_units, device.max_work_group_size, device.global_mem_bytes / (1024 * 1024))?;
                if !device.available {
                    writeln!(f, "    (not available)")?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample () -> Inventory {
        let device = DeviceInfo {
            index: 0,
            name: "gfx1030".into(),
            vendor: "Advanced Micro Devices, Inc.".into(),
            kind: "GPU".into(),
            version: "OpenCL 2.0".into(),
            driver_version: "3513.0".into(),
            available: true,
            compute_units: 36,
            max_work_group_size: 256,
            global_mem_bytes: 16 * 1024 * 1024 * 1024,
            error: None
        };

        Inventory {
            platform_count: 1,
            platforms: vec![PlatformInfo {
                index: 0,
                name: "AMD Accelerated Parallel Processing".into(),
                vendor: "Advanced Micro Devices, Inc.".into(),
                version: "OpenCL 2.1 AMD-APP".into(),
                profile: "FULL_PROFILE".into(),
                devices: vec![device.clone(), DeviceInfo { index: 1, available: false, ..device }],
                error: None
            }]
        }
    }

    #[test]
    fn counts_devices () {
        assert_eq!(sample().device_count(), 2);
    }

    #[test]
    fn text_output () {
        let text = sample().to_string();
        assert!(text.starts_with("Found 1 platform(s)\n"));
        assert!(text.contains("  Found 2 device(s)\n"));
        assert!(text.contains("  Device #1: gfx1030 [GPU]\n"));
        assert!(text.contains("global memory: 16384 MiB"));
        assert_eq!(text.matches("(not available)").count(), 1);
    }

    #[test]
    fn json_output () {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["platform_count"], 1);
        assert_eq!(json["platforms"][0]["devices"][0]["type"], "GPU");
        assert_eq!(json["platforms"][0]["devices"][1]["available"], false);
        assert!(json["platforms"][0].get("error").is_none());
        assert!(json["platforms"][0]["devices"][0].get("error").is_none());
    }

    #[test]
    fn unreadable_device_is_listed_as_unavailable () {
        let mut inventory = sample();
        inventory.platforms[0].devices.push(DeviceInfo::unreadable(2, "gfx1100".into(), "out of resources (code -5)".into()));
        assert_eq!(inventory.device_count(), 3);

        let text = inventory.to_string();
        assert!(text.contains("  Found 3 device(s)\n"));
        assert!(text.contains("  Device #2: gfx1100 [<unknown>]\n    error: out of resources (code -5)\n    (not available)\n"));
        assert_eq!(text.matches("(not available)").count(), 2);

        let json = serde_json::to_value(&inventory).unwrap();
        let device = &json["platforms"][0]["devices"][2];
        assert_eq!(device["available"], false);
        assert_eq!(device["error"], "out of resources (code -5)");
        assert_eq!(device["compute_units"], 0);
    }
}
