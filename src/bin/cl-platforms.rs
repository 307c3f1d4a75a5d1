//! cl-platforms: reports how many OpenCL platforms and devices are installed.
//!
//! Usage:
//!   cl-platforms [OPTIONS]
//!
//! Examples:
//!   cl-platforms
//!   cl-platforms -t gpu --json

use std::process::ExitCode;
use clap::{ArgAction, Parser};
use clprobe::cli::{init_logging, print_json, DeviceKind, EXIT_ERROR, EXIT_OK};
use clprobe::error::render;
use clprobe::inventory::Inventory;
use clprobe::platform::Platform;

/// OpenCL platform and device discovery
#[derive(Parser, Debug)]
#[command(name = "cl-platforms")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Only list devices of this type
    #[arg(short = 't', long = "type", value_enum, default_value_t = DeviceKind::All)]
    device_type: DeviceKind,

    /// Print only the platform count
    #[arg(short, long)]
    count: bool,

    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.count {
        return match Platform::count() {
            Ok(count) => {
                println!("{count}");
                ExitCode::from(EXIT_OK)
            },
            Err(e) => {
                eprintln!("error: {}", render(&e));
                ExitCode::from(EXIT_ERROR)
            }
        };
    }

    let inventory = match Inventory::discover(args.device_type.into()) {
        Ok(x) => x,
        Err(e) => {
            eprintln!("error: {}", render(&e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if args.json {
        if let Err(e) = print_json(&inventory) {
            eprintln!("error: failed to serialize inventory: {e}");
            return ExitCode::from(EXIT_ERROR);
        }
    } else {
        print!("{inventory}");
    }

    log::info!("{} platform(s), {} device(s)", inventory.platform_count, inventory.device_count());
    ExitCode::from(EXIT_OK)
}
