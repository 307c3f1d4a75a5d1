//! OpenCL capability check: platform discovery and a verified vector addition.
//!
//! Thin owned wrappers over `opencl-sys` plus the linear vector-addition flow
//! used by the `cl-platforms` and `cl-vecadd` binaries.

macro_rules! flat_mod {
    ($($i:ident),+) => {
        $(
            mod $i;
            pub use $i::*;
        )+
    }
}

pub mod prelude {
    pub use crate::platform::Platform;
    pub use crate::device::{Device, DeviceType};
    pub use crate::context::{Context, ContextProps};
    pub use crate::queue::{CommandQueue, CommandQueueProps};
    pub use crate::error::{ErrorCL, Result};
    pub use crate::program::Program;
    pub use crate::event::{Event, EventStatus};
    pub use crate::buffer::{MemBuffer, MemFlags};
    pub use crate::kernel::Kernel;
}

pub mod error;
pub mod platform;
pub mod device;
pub mod context;
pub mod queue;
pub mod buffer;
pub mod event;
pub mod program;
pub mod kernel;

pub mod vecadd;
pub mod inventory;
pub mod cli;

pub(crate) mod utils;
