//! Pieces shared by the `cl-platforms` and `cl-vecadd` binaries.

use clap::ValueEnum;
use serde::Serialize;
use crate::device::DeviceType;

/// Exit code when every step succeeded.
pub const EXIT_OK : u8 = 0;
/// Exit code when an OpenCL call or the device selection failed.
pub const EXIT_ERROR : u8 = 1;
/// Exit code when the device result did not match the host sum.
pub const EXIT_MISMATCH : u8 = 2;

/// Device type filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DeviceKind {
    /// Any device
    #[default]
    All,
    /// The platform's default device
    Default,
    Cpu,
    Gpu,
    Accelerator,
    Custom
}

impl From<DeviceKind> for DeviceType {
    fn from(value: DeviceKind) -> Self {
        match value {
            DeviceKind::All => DeviceType::ALL,
            DeviceKind::Default => DeviceType::DEFAULT,
            DeviceKind::Cpu => DeviceType::CPU,
            DeviceKind::Gpu => DeviceType::GPU,
            DeviceKind::Accelerator => DeviceType::ACCELERATOR,
            DeviceKind::Custom => DeviceType::CUSTOM
        }
    }
}

/// Element type of the vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ElementKind {
    /// 32-bit signed integer
    #[default]
    Int,
    /// 32-bit unsigned integer
    Uint,
    /// 64-bit signed integer
    Long,
    /// 64-bit unsigned integer
    Ulong,
    /// 32-bit float
    Float
}

/// `Found N <what>(s)` line printed as soon as a count is known.
#[inline]
pub fn found_line (count: usize, what: &str) -> String {
    format!("Found {count} {what}(s)")
}

/// Prints `value` as pretty JSON on stdout. Nothing is printed if serialization fails.
pub fn print_json<S: Serialize + ?Sized> (value: &S) -> serde_json::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

/// Installs the `env_logger` backend.
///
/// `verbose` picks the default filter (warn, info, debug, trace); `RUST_LOG` overrides it.
pub fn init_logging (verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace"
    };

    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_kind_maps_to_flags () {
        assert_eq!(DeviceType::from(DeviceKind::default()), DeviceType::ALL);
        assert_eq!(DeviceType::from(DeviceKind::Gpu), DeviceType::GPU);
        assert_eq!(DeviceType::from(DeviceKind::Accelerator), DeviceType::ACCELERATOR);
    }

    #[test]
    fn value_names () {
        assert_eq!(DeviceKind::from_str("gpu", true), Ok(DeviceKind::Gpu));
        assert_eq!(DeviceKind::from_str("CPU", true), Ok(DeviceKind::Cpu));
        assert_eq!(ElementKind::from_str("ulong", false), Ok(ElementKind::Ulong));
        assert!(ElementKind::from_str("double", false).is_err());
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer> (&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("report is not representable"))
        }
    }

    #[test]
    fn json_failure_is_returned () {
        let err = print_json(&Unserializable).unwrap_err();
        assert!(err.to_string().contains("report is not representable"));
        assert!(print_json(&[1, 2, 3]).is_ok());
    }

    #[test]
    fn found_lines () {
        assert_eq!(found_line(0, "platform"), "Found 0 platform(s)");
        assert_eq!(found_line(0, "device"), "Found 0 device(s)");
        assert_eq!(found_line(3, "device"), "Found 3 device(s)");
    }
}
