use std::ffi::{c_char, CString};
use opencl_sys::{cl_program, cl_program_build_info, clReleaseProgram, clCreateProgramWithSource, clBuildProgram, clGetProgramBuildInfo, CL_PROGRAM_BUILD_LOG};
use crate::error::{raise, ErrorCL, Result};
use crate::prelude::{Context, Device};
use crate::utils::{info_string, log_release};

/// OpenCL program
#[derive(PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Program (pub(crate) cl_program);

impl Program {
    /// Creates a program from OpenCL C source and builds it for every device of `ctx`.
    pub fn from_source (ctx: &Context, source: &str) -> Result<Self> {
        Self::from_source_with_options(ctx, source, "")
    }

    pub fn from_source_with_options (ctx: &Context, source: &str, options: &str) -> Result<Self> {
        let lens = [source.len()];
        let strings = [source.as_ptr().cast::<c_char>()];

        let mut err = 0;
        let id = unsafe {
            clCreateProgramWithSource(ctx.0, 1, strings.as_ptr(), lens.as_ptr(), &mut err)
        };

        if err != 0 {
            return raise(ErrorCL::from(err), |e| match e {
                ErrorCL::InvalidContext => Some("context is not a valid context".into()),
                _ => None
            });
        }

        let this = Self(id);
        this.build(&ctx.devices()?, options)?;
        Ok(this)
    }

    /// Compiles and links the program for `devices`.
    /// On a compiler failure the build log of each device is logged at error level.
    pub fn build (&self, devices: &[Device], options: &str) -> Result<()> {
        let options = match CString::new(options) {
            Ok(x) => x,
            Err(_) => return raise(ErrorCL::InvalidBuildOptions, |_| Some("build options contain a nul byte".into()))
        };

        let len = match u32::try_from(devices.len()) {
            Ok(len) => len,
            Err(_) => return raise(ErrorCL::InvalidValue, |_| Some("too many devices".into()))
        };

        let err = unsafe {
            clBuildProgram(self.0, len, devices.as_ptr().cast(), options.as_ptr(), None, core::ptr::null_mut())
        };

        if err == 0 {
            log::debug!("built program for {len} device(s)");
            return Ok(());
        }

        let err = ErrorCL::from(err);
        let mut logs = String::new();
        if err == ErrorCL::BuildProgramFailure {
            for device in devices {
                let name = device.name().unwrap_or_else(|_| String::from("<unknown device>"));
                match self.build_log(device) {
                    Ok(log) => {
                        log::error!("build log for {name}:\n{log}");
                        logs.push_str(&format!("{name}:\n{log}\n"));
                    },
                    Err(e) => log::warn!("no build log for {name}: {e:?}")
                }
            }
        }

        raise(err, move |e| match e {
            ErrorCL::BuildProgramFailure if !logs.is_empty() => Some(logs),
            ErrorCL::InvalidBuildOptions => Some("the build options are invalid".into()),
            ErrorCL::CompilerNotAvailable => Some("no compiler is available for a target device".into()),
            _ => None
        })
    }

    /// Compiler output for the last build on `device`.
    pub fn build_log (&self, device: &Device) -> Result<String> {
        info_string(|size, value, size_ret| unsafe {
            clGetProgramBuildInfo(self.0, device.0, CL_PROGRAM_BUILD_LOG as cl_program_build_info, size, value, size_ret)
        })
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        log_release("program", unsafe { clReleaseProgram(self.0) });
    }
}
