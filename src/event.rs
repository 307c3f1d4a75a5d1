use core::time::Duration;
use opencl_sys::{cl_event, cl_event_info, cl_int, cl_profiling_info, cl_ulong, clWaitForEvents, clGetEventInfo, clGetEventProfilingInfo, clReleaseEvent, CL_EVENT_COMMAND_EXECUTION_STATUS, CL_COMPLETE, CL_RUNNING, CL_SUBMITTED, CL_QUEUED, CL_PROFILING_COMMAND_START, CL_PROFILING_COMMAND_END};
use crate::error::{check_with, ErrorCL, Result};
use crate::utils::{info_value, log_release};

/// Execution status of the command an [`Event`] tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventStatus {
    Queued,
    Submitted,
    Running,
    Complete,
    /// The command terminated abnormally.
    Error(ErrorCL)
}

impl From<cl_int> for EventStatus {
    fn from(value: cl_int) -> Self {
        match value {
            x if x == CL_COMPLETE as cl_int => Self::Complete,
            x if x == CL_RUNNING as cl_int => Self::Running,
            x if x == CL_SUBMITTED as cl_int => Self::Submitted,
            x if x == CL_QUEUED as cl_int => Self::Queued,
            err => Self::Error(ErrorCL::from(err))
        }
    }
}

/// Event returned by an enqueued command.
#[derive(PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Event (pub(crate) cl_event);

impl Event {
    /// Blocks until the command completes.
    #[inline]
    pub fn wait (&self) -> Result<()> {
        let err = unsafe { clWaitForEvents(1, &self.0) };
        check_with(err, |e| match e {
            ErrorCL::ExecutionStatusErrorForEventsInWaitList => Some("the command terminated abnormally".into()),
            _ => None
        })
    }

    #[inline]
    pub fn status (&self) -> Result<EventStatus> {
        let status = unsafe {
            info_value::<cl_int>(|size, value, size_ret| unsafe {
                clGetEventInfo(self.0, CL_EVENT_COMMAND_EXECUTION_STATUS as cl_event_info, size, value, size_ret)
            })?
        };

        Ok(EventStatus::from(status))
    }

    /// Device time between the command starting and finishing.
    /// Requires the queue to have been created with profiling enabled.
    pub fn duration (&self) -> Result<Duration> {
        let start = self.profiling_info(CL_PROFILING_COMMAND_START as cl_profiling_info)?;
        let end = self.profiling_info(CL_PROFILING_COMMAND_END as cl_profiling_info)?;
        Ok(Duration::from_nanos(end.saturating_sub(start)))
    }

    #[inline]
    fn profiling_info (&self, ty: cl_profiling_info) -> Result<cl_ulong> {
        unsafe {
            info_value::<cl_ulong>(|size, value, size_ret| unsafe {
                clGetEventProfilingInfo(self.0, ty, size, value, size_ret)
            })
        }
    }
}

impl Drop for Event {
    #[inline(always)]
    fn drop (&mut self) {
        log_release("event", unsafe { clReleaseEvent(self.0) });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_from_code () {
        assert_eq!(EventStatus::from(0), EventStatus::Complete);
        assert_eq!(EventStatus::from(1), EventStatus::Running);
        assert_eq!(EventStatus::from(2), EventStatus::Submitted);
        assert_eq!(EventStatus::from(3), EventStatus::Queued);
        assert_eq!(EventStatus::from(-5), EventStatus::Error(ErrorCL::OutOfResources));
    }
}
