//! cl-vecadd: adds two vectors on an OpenCL device and checks the result on the host.
//!
//! Usage:
//!   cl-vecadd [OPTIONS]
//!
//! Examples:
//!   cl-vecadd
//!   cl-vecadd -n 1048576 -t gpu --profile
//!   cl-vecadd --element float --platform 1 --device 0 --json

use std::process::ExitCode;
use clap::{builder::TypedValueParser, ArgAction, Parser};
use clprobe::cli::{found_line, init_logging, print_json, DeviceKind, ElementKind, EXIT_ERROR, EXIT_MISMATCH, EXIT_OK};
use clprobe::error::render;
use clprobe::platform::Platform;
use clprobe::vecadd::{device_count, run, Element, VecAddConfig, VecAddReport, DEFAULT_ELEMENTS};

/// Mismatches printed in text mode before the rest are summarized.
const MAX_LISTED : usize = 16;

/// OpenCL vector addition check
#[derive(Parser, Debug)]
#[command(name = "cl-vecadd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of elements per vector
    #[arg(short = 'n', long, default_value_t = DEFAULT_ELEMENTS, value_parser = clap::value_parser!(u64).range(1..).try_map(usize::try_from))]
    elements: usize,

    /// Only consider devices of this type
    #[arg(short = 't', long = "type", value_enum, default_value_t = DeviceKind::All)]
    device_type: DeviceKind,

    /// Element type of the vectors
    #[arg(short, long, value_enum, default_value_t = ElementKind::Int)]
    element: ElementKind,

    /// Platform index (default: first platform with a matching device)
    #[arg(long, value_name = "INDEX")]
    platform: Option<usize>,

    /// Device index within the selected platform
    #[arg(long, value_name = "INDEX")]
    device: Option<usize>,

    /// Report the kernel execution time
    #[arg(long)]
    profile: bool,

    /// Emit the full report as JSON
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn config (&self) -> VecAddConfig {
        VecAddConfig::new()
            .elements(self.elements)
            .device_type(self.device_type.into())
            .platform(self.platform)
            .device(self.device)
            .profile(self.profile)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = args.config();
    log::debug!("{config:?}");

    let result = match args.element {
        ElementKind::Int => execute::<i32>(&config, args.json),
        ElementKind::Uint => execute::<u32>(&config, args.json),
        ElementKind::Long => execute::<i64>(&config, args.json),
        ElementKind::Ulong => execute::<u64>(&config, args.json),
        ElementKind::Float => execute::<f32>(&config, args.json)
    };

    match result {
        Ok(true) => ExitCode::from(EXIT_OK),
        Ok(false) => ExitCode::from(EXIT_MISMATCH),
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Runs the addition and prints the outcome. `Ok(false)` means the check failed.
fn execute<T: Element> (config: &VecAddConfig, json: bool) -> Result<bool, String> {
    if json {
        let report = run::<T>(config).map_err(|e| render(&e))?;
        print_json(&report).map_err(|e| format!("failed to serialize report: {e}"))?;
        return Ok(report.passed());
    }

    // counts go out before anything that can fail later on
    let platforms = Platform::count().map_err(|e| render(&e))?;
    println!("{}", found_line(platforms as usize, "platform"));
    let devices = device_count(config).map_err(|e| render(&e))?;
    println!("{}", found_line(devices, "device"));

    let report = run::<T>(config).map_err(|e| render(&e))?;
    print_report(&report);
    Ok(report.passed())
}

fn print_report<T: Element> (report: &VecAddReport<T>) {
    println!("Using {} on {}", report.device_name, report.platform_name);

    if let Some(ns) = report.kernel_time_ns {
        println!("Kernel time: {:.3} ms", ns as f64 / 1e6);
    }

    let verification = &report.verification;
    if report.passed() {
        println!("PASSED: output[i] == a[i] + b[i] for all {} {} elements", verification.checked, report.element_type);
        return;
    }

    println!("FAILED: {} of {} elements differ", verification.mismatches.len(), verification.checked);
    if !verification.lengths_match {
        println!("  output has {} elements, inputs have {}", report.c.len(), report.a.len());
    }

    for m in verification.mismatches.iter().take(MAX_LISTED) {
        println!("  [{}] expected {:?}, got {:?}", m.index, m.expected, m.actual);
    }

    if verification.mismatches.len() > MAX_LISTED {
        println!("  ... and {} more", verification.mismatches.len() - MAX_LISTED);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clprobe::device::DeviceType;

    #[test]
    fn defaults () {
        let args = Args::try_parse_from(["cl-vecadd"]).unwrap();
        assert_eq!(args.config(), VecAddConfig::default());
        assert_eq!(args.element, ElementKind::Int);
        assert!(!args.json);
    }

    #[test]
    fn options_map_to_config () {
        let args = Args::try_parse_from(["cl-vecadd", "-n", "256", "-t", "gpu", "--platform", "1", "--device", "0", "--profile", "-vv"]).unwrap();
        let config = args.config();
        assert_eq!(config.elements, 256);
        assert_eq!(config.device_type, DeviceType::GPU);
        assert_eq!(config.platform, Some(1));
        assert_eq!(config.device, Some(0));
        assert!(config.profile);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn zero_elements_rejected () {
        assert!(Args::try_parse_from(["cl-vecadd", "-n", "0"]).is_err());
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn largest_count_kept_whole () {
        let args = Args::try_parse_from(["cl-vecadd", "-n", "18446744073709551615"]).unwrap();
        assert_eq!(args.elements, usize::MAX);
    }

    #[cfg(target_pointer_width = "32")]
    #[test]
    fn count_wider_than_usize_rejected () {
        assert!(Args::try_parse_from(["cl-vecadd", "-n", "4294967296"]).is_err());
        assert_eq!(Args::try_parse_from(["cl-vecadd", "-n", "4294967295"]).unwrap().elements, usize::MAX);
    }
}
