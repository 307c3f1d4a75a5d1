use core::fmt::Display;

macro_rules! error_codes {
    ($($name:ident = $code:literal => $msg:literal),+ $(,)?) => {
        /// Status codes reported by the OpenCL runtime.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ErrorCL {
            $($name,)+
            /// A code this crate has no name for.
            Unknown(i32)
        }

        impl ErrorCL {
            /// Raw `cl_int` status code.
            #[inline]
            pub const fn code (self) -> i32 {
                match self {
                    $(Self::$name => $code,)+
                    Self::Unknown(code) => code
                }
            }

            #[inline]
            const fn message (self) -> &'static str {
                match self {
                    $(Self::$name => $msg,)+
                    Self::Unknown(_) => "Unknown OpenCL error"
                }
            }
        }

        impl From<i32> for ErrorCL {
            #[inline]
            fn from (value: i32) -> Self {
                match value {
                    $($code => Self::$name,)+
                    other => Self::Unknown(other)
                }
            }
        }
    };
}

error_codes! {
    DeviceNotFound = -1 => "Device not found",
    DeviceNotAvailable = -2 => "Device not available",
    CompilerNotAvailable = -3 => "Compiler not available",
    MemObjectAllocationFailure = -4 => "Memory object allocation failure",
    OutOfResources = -5 => "Out of resources",
    OutOfHostMemory = -6 => "Out of host memory",
    ProfilingInfoNotAvailable = -7 => "Profiling info not available",
    MemCopyOverlap = -8 => "Memory copy overlap",
    ImageFormatMismatch = -9 => "Image format mismatch",
    ImageFormatNotSupported = -10 => "Image format not supported",
    BuildProgramFailure = -11 => "Build program failure",
    MapFailure = -12 => "Map failure",
    MisalignedSubBufferOffset = -13 => "Misaligned sub-buffer offset",
    ExecutionStatusErrorForEventsInWaitList = -14 => "Execution status error for events in wait list",
    CompileProgramFailure = -15 => "Program compilation failure",
    LinkerNotAvailable = -16 => "Linker not available",
    LinkProgramFailure = -17 => "Program linking failure",
    DevicePartitionFailed = -18 => "Device partition failure",
    KernelArgInfoNotAvailable = -19 => "Kernel argument info not available",
    InvalidValue = -30 => "Invalid value",
    InvalidDeviceType = -31 => "Invalid device type",
    InvalidPlatform = -32 => "Invalid platform",
    InvalidDevice = -33 => "Invalid device",
    InvalidContext = -34 => "Invalid context",
    InvalidQueueProperties = -35 => "Invalid queue properties",
    InvalidCommandQueue = -36 => "Invalid command queue",
    InvalidHostPtr = -37 => "Invalid host pointer",
    InvalidMemObject = -38 => "Invalid memory object",
    InvalidImageFormatDescriptor = -39 => "Invalid image format descriptor",
    InvalidImageSize = -40 => "Invalid image size",
    InvalidSampler = -41 => "Invalid sampler",
    InvalidBinary = -42 => "Invalid binary",
    InvalidBuildOptions = -43 => "Invalid build options",
    InvalidProgram = -44 => "Invalid program",
    InvalidProgramExecutable = -45 => "Invalid program executable",
    InvalidKernelName = -46 => "Invalid kernel name",
    InvalidKernelDefinition = -47 => "Invalid kernel definition",
    InvalidKernel = -48 => "Invalid kernel",
    InvalidArgIndex = -49 => "Invalid argument index",
    InvalidArgValue = -50 => "Invalid argument value",
    InvalidArgSize = -51 => "Invalid argument size",
    InvalidKernelArgs = -52 => "Invalid kernel arguments",
    InvalidWorkDimension = -53 => "Invalid work dimension",
    InvalidWorkGroupSize = -54 => "Invalid work group size",
    InvalidWorkItemSize = -55 => "Invalid work item size",
    InvalidGlobalOffset = -56 => "Invalid global offset",
    InvalidEventWaitList = -57 => "Invalid event wait list",
    InvalidEvent = -58 => "Invalid event",
    InvalidOperation = -59 => "Invalid operation",
    InvalidGlObject = -60 => "Invalid gl object",
    InvalidBufferSize = -61 => "Invalid buffer size",
    InvalidMipLevel = -62 => "Invalid mip level",
    InvalidGlobalWorkSize = -63 => "Invalid global work size",
    InvalidProperty = -64 => "Invalid property",
    InvalidImageDescriptor = -65 => "Invalid image descriptor",
    InvalidCompilerOptions = -66 => "Invalid compiler options",
    InvalidLinkerOptions = -67 => "Invalid linker options",
    InvalidDevicePartitionCount = -68 => "Invalid device partition count",
    InvalidPipeSize = -69 => "Invalid pipe size",
    InvalidDeviceQueue = -70 => "Invalid device queue",
    InvalidSpecId = -71 => "Invalid specialization constant id",
    MaxSizeRestrictionExceeded = -72 => "Max size restriction exceeded",
    PlatformNotFound = -1001 => "No OpenCL platform found",
}

impl Display for ErrorCL {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unknown(code) => write!(f, "{} ({code})", self.message()),
            _ => self.message().fmt(f)
        }
    }
}

impl From<ErrorCL> for i32 {
    #[inline(always)]
    fn from(value: ErrorCL) -> Self {
        value.code()
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "error-stack")] {
        pub type Result<T> = error_stack::Result<T, ErrorCL>;

        impl error_stack::Context for ErrorCL {}

        /// Builds the error for `err`, attaching whatever `hint` has to say about it.
        pub(crate) fn raise<T> (err: ErrorCL, hint: impl FnOnce(ErrorCL) -> Option<String>) -> Result<T> {
            let report = error_stack::Report::new(err);
            match hint(err) {
                Some(msg) => Err(report.attach_printable(msg)),
                None => Err(report)
            }
        }

        /// Human-readable rendering of an error, including attached hints.
        pub fn render (err: &error_stack::Report<ErrorCL>) -> String {
            format!("{err:?}")
        }
    } else {
        pub type Result<T> = core::result::Result<T, ErrorCL>;

        impl std::error::Error for ErrorCL {}

        /// Builds the error for `err`. Hints are only kept with the `error-stack` feature.
        #[inline(always)]
        pub(crate) fn raise<T> (err: ErrorCL, _hint: impl FnOnce(ErrorCL) -> Option<String>) -> Result<T> {
            Err(err)
        }

        /// Human-readable rendering of an error.
        pub fn render (err: &ErrorCL) -> String {
            format!("{err} (code {})", err.code())
        }
    }
}

/// Turns a raw status code into a [`Result`].
#[inline]
pub(crate) fn check (code: i32) -> Result<()> {
    check_with(code, |_| None)
}

#[inline]
pub(crate) fn check_with (code: i32, hint: impl FnOnce(ErrorCL) -> Option<String>) -> Result<()> {
    match code {
        0 => Ok(()),
        code => raise(ErrorCL::from(code), hint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_round_trip () {
        for code in (-19..=-1).chain(-72..=-30).chain([-1001]) {
            let err = ErrorCL::from(code);
            assert!(!matches!(err, ErrorCL::Unknown(_)), "code {code} has no name");
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn gaps_are_unknown () {
        assert_eq!(ErrorCL::from(-25), ErrorCL::Unknown(-25));
        assert_eq!(ErrorCL::from(-9999).code(), -9999);
        assert_eq!(ErrorCL::Unknown(-25).to_string(), "Unknown OpenCL error (-25)");
    }

    #[test]
    fn messages () {
        assert_eq!(ErrorCL::BuildProgramFailure.to_string(), "Build program failure");
        assert_eq!(ErrorCL::from(-1001).to_string(), "No OpenCL platform found");
        assert_eq!(i32::from(ErrorCL::InvalidKernelName), -46);
    }

    #[cfg(not(feature = "error-stack"))]
    #[test]
    fn check_maps_status () {
        assert_eq!(check(0), Ok(()));
        assert_eq!(check(-5), Err(ErrorCL::OutOfResources));
        assert_eq!(check_with(-33, |_| Some("ignored".into())), Err(ErrorCL::InvalidDevice));
    }
}
