use core::ptr::addr_of;
use std::ffi::CString;
use opencl_sys::{cl_kernel, cl_kernel_info, cl_mem, cl_uint, clReleaseKernel, clCreateKernel, clGetKernelInfo, clSetKernelArg, clEnqueueNDRangeKernel, CL_KERNEL_FUNCTION_NAME, CL_KERNEL_NUM_ARGS};
use crate::error::{check_with, raise, ErrorCL, Result};
use crate::prelude::{Program, CommandQueue, Event, MemBuffer};
use crate::utils::{info_string, info_value, log_release};

#[derive(PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Kernel (pub(crate) cl_kernel);

impl Kernel {
    /// Creates the kernel object for the `__kernel` function `name` of a built program.
    pub fn new (program: &Program, name: &str) -> Result<Self> {
        let c_name = match CString::new(name) {
            Ok(x) => x,
            Err(_) => return raise(ErrorCL::InvalidKernelName, |_| Some(format!("kernel name {name:?} contains a nul byte")))
        };

        let mut err = 0;
        let id = unsafe { clCreateKernel(program.0, c_name.as_ptr(), &mut err) };
        if err == 0 { return Ok(Self(id)); }

        raise(ErrorCL::from(err), |e| match e {
            ErrorCL::InvalidProgram => Some("program is not a valid program object".into()),
            ErrorCL::InvalidProgramExecutable => Some("there is no successfully built executable for program".into()),
            ErrorCL::InvalidKernelName => Some(format!("kernel '{name}' not found in program")),
            ErrorCL::InvalidKernelDefinition => Some(format!("the function definition for __kernel function '{name}' is not the same for all devices")),
            _ => None
        })
    }

    /// Sets a by-value argument.
    #[inline(always)]
    pub fn set_arg<T: Copy> (&mut self, idx: u32, v: T) -> Result<()> {
        let err = unsafe { clSetKernelArg(self.0, idx, core::mem::size_of::<T>(), addr_of!(v).cast()) };
        self.parse_error_set_arg(err, idx, core::mem::size_of::<T>())
    }

    /// Binds a buffer to a `__global` pointer argument.
    #[inline(always)]
    pub fn set_mem_arg<T: Copy> (&mut self, idx: u32, v: &MemBuffer<T>) -> Result<()> {
        let err = unsafe { clSetKernelArg(self.0, idx, core::mem::size_of::<cl_mem>(), addr_of!(v.id).cast()) };
        self.parse_error_set_arg(err, idx, core::mem::size_of::<cl_mem>())
    }

    /// Return the kernel function name.
    #[inline(always)]
    pub fn name (&self) -> Result<String> {
        info_string(|size, value, size_ret| unsafe {
            clGetKernelInfo(self.0, CL_KERNEL_FUNCTION_NAME as cl_kernel_info, size, value, size_ret)
        })
    }

    /// Return the number of arguments to _kernel_.
    #[inline(always)]
    pub fn num_args (&self) -> Result<u32> {
        unsafe {
            info_value::<cl_uint>(|size, value, size_ret| unsafe {
                clGetKernelInfo(self.0, CL_KERNEL_NUM_ARGS as cl_kernel_info, size, value, size_ret)
            })
        }
    }

    /// Dispatches the kernel over an `N`-dimensional range.
    pub fn enqueue<const N: usize> (&mut self, queue: &CommandQueue, global_dims: &[usize; N], local_dims: Option<&[usize; N]>) -> Result<Event> {
        let dim_len = match u32::try_from(N) {
            Ok(x @ 1..=3) => x,
            _ => return raise(ErrorCL::InvalidWorkDimension, |_| Some(format!("{N} is not a valid work dimension"))),
        };

        let local_dims = match local_dims {
            Some(x) => x.as_ptr(),
            None => core::ptr::null()
        };

        let mut event = core::ptr::null_mut();
        let err = unsafe {
            clEnqueueNDRangeKernel(queue.id, self.0, dim_len, core::ptr::null(), global_dims.as_ptr(), local_dims, 0, core::ptr::null(), &mut event)
        };

        if err == 0 {
            log::debug!("enqueued kernel over {global_dims:?}");
            return Ok(Event(event));
        }

        raise(ErrorCL::from(err), |e| match e {
            ErrorCL::InvalidProgramExecutable => Some("there is no successfully built program executable available for device associated with the command queue".into()),
            ErrorCL::InvalidCommandQueue => Some("command queue is not a valid command-queue".into()),
            ErrorCL::InvalidKernel => Some("kernel is not a valid kernel object".into()),
            ErrorCL::InvalidContext => Some("context associated with the command queue and kernel is not the same".into()),
            ErrorCL::InvalidKernelArgs => Some("the kernel argument values have not been specified".into()),
            ErrorCL::InvalidWorkGroupSize => Some("local work size is specified and is invalid".into()),
            ErrorCL::InvalidGlobalWorkSize => Some(format!("{global_dims:?} is not a valid global work size")),
            ErrorCL::OutOfResources => Some("insufficient resources to execute the kernel".into()),
            ErrorCL::MemObjectAllocationFailure => Some("failed to allocate memory for a buffer argument".into()),
            _ => None
        })
    }

    fn parse_error_set_arg (&self, err: i32, idx: u32, size: usize) -> Result<()> {
        check_with(err, |e| match e {
            ErrorCL::InvalidKernel => Some(format!("'{:?}' is not a valid kernel", self.0)),
            ErrorCL::InvalidArgIndex => Some(format!("'{idx}' is not a valid argument index")),
            ErrorCL::InvalidArgValue => Some("arg value specified is NULL for an argument that is not declared with the __local qualifier or vice-versa".into()),
            ErrorCL::InvalidMemObject => Some("arg value is not a valid memory object for an argument declared to be a memory object".into()),
            ErrorCL::InvalidArgSize => Some(format!("{size} != size of the declared data type")),
            _ => None
        })
    }
}

impl Drop for Kernel {
    #[inline(always)]
    fn drop(&mut self) {
        log_release("kernel", unsafe { clReleaseKernel(self.0) });
    }
}
