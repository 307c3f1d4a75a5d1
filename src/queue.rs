use opencl_sys::{cl_command_queue, cl_command_queue_properties, CL_QUEUE_OUT_OF_ORDER_EXEC_MODE_ENABLE, CL_QUEUE_PROFILING_ENABLE, clCreateCommandQueue, clFinish, clReleaseCommandQueue};
use crate::error::{check, raise, ErrorCL, Result};
use crate::prelude::{Context, Device};
use crate::utils::log_release;

bitflags::bitflags! {
    /// Describes the command-queue properties supported by the device.
    #[repr(transparent)]
    pub struct CommandQueueProps: cl_command_queue_properties {
        const OUT_OF_ORDER_EXEC_MODE_ENABLE = CL_QUEUE_OUT_OF_ORDER_EXEC_MODE_ENABLE;
        const PROFILING_ENABLE = CL_QUEUE_PROFILING_ENABLE;
    }
}

impl Default for CommandQueueProps {
    #[inline(always)]
    fn default() -> Self {
        Self::empty()
    }
}

/// OpenCL command queue bound to one device of a context.
#[derive(PartialEq, Eq, Hash)]
pub struct CommandQueue {
    pub(crate) id: cl_command_queue,
    props: CommandQueueProps
}

impl CommandQueue {
    pub fn new (ctx: &Context, device: &Device, props: impl Into<Option<CommandQueueProps>>) -> Result<Self> {
        let props = props.into().unwrap_or_default();
        let mut err = 0;

        // 1.2 entry point; the 2.0 replacement is missing from 1.x runtimes.
        #[allow(deprecated)]
        let id = unsafe {
            clCreateCommandQueue(ctx.0, device.0, props.bits(), &mut err)
        };

        if err != 0 {
            return raise(ErrorCL::from(err), |e| match e {
                ErrorCL::InvalidContext => Some("context is not a valid context".into()),
                ErrorCL::InvalidDevice => Some("device is not a valid device or is not associated with context".into()),
                ErrorCL::InvalidQueueProperties => Some(format!("{props:?} are valid but not supported by the device")),
                _ => None
            });
        }

        log::debug!("created command queue with {props:?}");
        Ok(Self { id, props })
    }

    #[inline(always)]
    pub fn id (&self) -> cl_command_queue {
        self.id
    }

    #[inline(always)]
    pub fn props (&self) -> CommandQueueProps {
        self.props
    }

    #[inline(always)]
    pub fn profiling (&self) -> bool {
        self.props.contains(CommandQueueProps::PROFILING_ENABLE)
    }

    /// Blocks until every previously queued command has completed.
    #[inline]
    pub fn finish (&self) -> Result<()> {
        check(unsafe { clFinish(self.id) })
    }
}

impl Drop for CommandQueue {
    #[inline(always)]
    fn drop (&mut self) {
        log_release("command queue", unsafe { clReleaseCommandQueue(self.id) });
    }
}
