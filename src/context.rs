use opencl_sys::{cl_context, cl_context_properties, cl_device_id, CL_CONTEXT_PLATFORM, CL_CONTEXT_DEVICES, clCreateContext, clReleaseContext, clRetainContext, clGetContextInfo};
use crate::error::{check, raise, ErrorCL, Result};
use crate::prelude::{Platform, Device};
use crate::utils::{info_vec, log_release};

/// OpenCL context
#[derive(PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Context (pub(crate) cl_context);

impl Context {
    pub fn new (props: Option<ContextProps>, devices: &[Device]) -> Result<Self> {
        let props = props.map(ContextProps::build);
        let props_ptr = props.as_ref().map_or(core::ptr::null(), |x| x.as_ptr());

        let len = match u32::try_from(devices.len()) {
            Ok(0) | Err(_) => return raise(ErrorCL::InvalidValue, |_| Some(format!("cannot create a context for {} devices", devices.len()))),
            Ok(len) => len
        };

        let mut err = 0;
        let id = unsafe {
            clCreateContext(props_ptr, len, devices.as_ptr().cast(), None, core::ptr::null_mut(), &mut err)
        };

        if err != 0 {
            return raise(ErrorCL::from(err), |e| match e {
                ErrorCL::InvalidPlatform => Some("the platform in the context properties is not a valid platform".into()),
                ErrorCL::InvalidProperty => Some("unsupported context property name or value".into()),
                ErrorCL::InvalidDevice => Some("a device is invalid or not associated with the specified platform".into()),
                ErrorCL::DeviceNotAvailable => Some("a device is currently not available".into()),
                _ => None
            });
        }

        log::debug!("created context for {len} device(s)");
        Ok(Context(id))
    }

    /// Devices the context was created with.
    pub fn devices (&self) -> Result<Vec<Device>> {
        let ids = unsafe {
            info_vec::<cl_device_id>(|size, value, size_ret| unsafe {
                clGetContextInfo(self.0, CL_CONTEXT_DEVICES, size, value, size_ret)
            })?
        };

        Ok(ids.into_iter().map(Device).collect())
    }
}

impl Clone for Context {
    #[inline(always)]
    fn clone(&self) -> Self {
        if let Err(e) = check(unsafe { clRetainContext(self.0) }) {
            log::error!("failed to retain context: {e:?}");
        }

        Self(self.0)
    }
}

impl Drop for Context {
    #[inline(always)]
    fn drop (&mut self) {
        log_release("context", unsafe { clReleaseContext(self.0) });
    }
}

/// OpenCL context properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ContextProps {
    pub platform: Option<Platform>,
}

impl ContextProps {
    #[inline(always)]
    pub fn new () -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn platform (mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Zero-terminated property list in the layout `clCreateContext` expects.
    #[inline]
    pub fn build (self) -> Vec<cl_context_properties> {
        let mut result = Vec::<cl_context_properties>::with_capacity(3);

        if let Some(platform) = self.platform {
            result.extend([
                CL_CONTEXT_PLATFORM as cl_context_properties,
                platform.0 as cl_context_properties
            ])
        }

        result.push(0);
        result
    }
}
