use core::fmt::{Debug, Display};
use opencl_sys::{cl_device_id, cl_device_info, cl_device_type, cl_bool, cl_uint, cl_ulong, cl_platform_id, clGetDeviceIDs, clGetDeviceInfo, CL_DEVICE_TYPE_DEFAULT, CL_DEVICE_TYPE_CPU, CL_DEVICE_TYPE_GPU, CL_DEVICE_TYPE_ACCELERATOR, CL_DEVICE_TYPE_CUSTOM, CL_DEVICE_TYPE_ALL, CL_DEVICE_NAME, CL_DEVICE_VENDOR, CL_DEVICE_VERSION, CL_DRIVER_VERSION, CL_DEVICE_TYPE, CL_DEVICE_AVAILABLE, CL_DEVICE_MAX_COMPUTE_UNITS, CL_DEVICE_MAX_WORK_GROUP_SIZE, CL_DEVICE_GLOBAL_MEM_SIZE, CL_DEVICE_PLATFORM};
use crate::error::{check, raise, ErrorCL, Result};
use crate::platform::Platform;
use crate::utils::{info_string, info_value};

bitflags::bitflags! {
    /// Kinds of compute device a platform can expose.
    #[repr(transparent)]
    pub struct DeviceType: cl_device_type {
        const DEFAULT = CL_DEVICE_TYPE_DEFAULT;
        const CPU = CL_DEVICE_TYPE_CPU;
        const GPU = CL_DEVICE_TYPE_GPU;
        const ACCELERATOR = CL_DEVICE_TYPE_ACCELERATOR;
        const CUSTOM = CL_DEVICE_TYPE_CUSTOM;
        const ALL = CL_DEVICE_TYPE_ALL;
    }
}

impl Default for DeviceType {
    #[inline(always)]
    fn default() -> Self {
        Self::ALL
    }
}

impl Display for DeviceType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if *self == Self::ALL {
            return f.write_str("ALL");
        }

        const NAMES : [(DeviceType, &str); 5] = [
            (DeviceType::CPU, "CPU"),
            (DeviceType::GPU, "GPU"),
            (DeviceType::ACCELERATOR, "ACCELERATOR"),
            (DeviceType::CUSTOM, "CUSTOM"),
            (DeviceType::DEFAULT, "DEFAULT")
        ];

        let mut first = true;
        for (flag, name) in NAMES {
            if !self.contains(flag) { continue }
            if !first { f.write_str(" | ")?; }
            f.write_str(name)?;
            first = false;
        }

        if first {
            f.write_str("NONE")?;
        }

        Ok(())
    }
}

/// OpenCL device
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Device (pub(crate) cl_device_id);

impl Device {
    /// Devices of `platform` matching `ty`. A platform with no matching device yields an empty list.
    pub fn all (platform: &Platform, ty: DeviceType) -> Result<Vec<Device>> {
        let mut cnt : cl_uint = 0;
        let err = unsafe { clGetDeviceIDs(platform.0, ty.bits(), 0, core::ptr::null_mut(), &mut cnt) };

        match err {
            0 => {},
            err if ErrorCL::from(err) == ErrorCL::DeviceNotFound => return Ok(Vec::new()),
            err => return raise(ErrorCL::from(err), |e| match e {
                ErrorCL::InvalidPlatform => Some(format!("'{:?}' is not a valid platform", platform.0)),
                ErrorCL::InvalidDeviceType => Some(format!("'{ty}' is not a valid device type")),
                _ => None
            })
        }

        let mut result = vec![core::ptr::null_mut(); cnt as usize];
        check(unsafe { clGetDeviceIDs(platform.0, ty.bits(), cnt, result.as_mut_ptr(), core::ptr::null_mut()) })?;
        Ok(result.into_iter().map(Device).collect())
    }

    /// First device of any type on the first platform that has one.
    pub fn first () -> Result<Option<Device>> {
        for platform in Platform::all()? {
            if let Some(device) = Self::all(platform, DeviceType::ALL)?.into_iter().next() {
                return Ok(Some(device));
            }
        }

        Ok(None)
    }

    #[inline(always)]
    pub fn id (&self) -> cl_device_id {
        self.0
    }

    /// Device name string.
    #[inline(always)]
    pub fn name (&self) -> Result<String> {
        self.get_info_string(CL_DEVICE_NAME)
    }

    /// Vendor name string.
    #[inline(always)]
    pub fn vendor (&self) -> Result<String> {
        self.get_info_string(CL_DEVICE_VENDOR)
    }

    /// OpenCL version supported by the device.
    #[inline(always)]
    pub fn version (&self) -> Result<String> {
        self.get_info_string(CL_DEVICE_VERSION)
    }

    /// OpenCL software driver version string.
    #[inline(always)]
    pub fn driver_version (&self) -> Result<String> {
        self.get_info_string(CL_DRIVER_VERSION)
    }

    /// The OpenCL device type.
    #[inline(always)]
    pub fn ty (&self) -> Result<DeviceType> {
        unsafe { self.get_info::<cl_device_type>(CL_DEVICE_TYPE) }.map(DeviceType::from_bits_truncate)
    }

    /// Is ```true``` if the device is available and ```false``` if the device is not available.
    #[inline(always)]
    pub fn available (&self) -> Result<bool> {
        unsafe { self.get_info::<cl_bool>(CL_DEVICE_AVAILABLE) }.map(|x| x != 0)
    }

    /// The number of parallel compute cores on the OpenCL device. The minimum value is 1.
    #[inline(always)]
    pub fn max_compute_units (&self) -> Result<u32> {
        unsafe { self.get_info::<cl_uint>(CL_DEVICE_MAX_COMPUTE_UNITS) }
    }

    /// Maximum number of work-items in a work-group executing a kernel on a single compute unit.
    #[inline(always)]
    pub fn max_work_group_size (&self) -> Result<usize> {
        unsafe { self.get_info::<usize>(CL_DEVICE_MAX_WORK_GROUP_SIZE) }
    }

    /// Size of global memory in bytes.
    #[inline(always)]
    pub fn global_mem_size (&self) -> Result<u64> {
        unsafe { self.get_info::<cl_ulong>(CL_DEVICE_GLOBAL_MEM_SIZE) }
    }

    /// The platform associated with this device.
    #[inline(always)]
    pub fn platform (&self) -> Result<Platform> {
        unsafe { self.get_info::<cl_platform_id>(CL_DEVICE_PLATFORM) }.map(Platform)
    }

    #[inline]
    fn get_info_string (&self, ty: cl_device_info) -> Result<String> {
        info_string(|size, value, size_ret| unsafe {
            clGetDeviceInfo(self.0, ty, size, value, size_ret)
        })
    }

    #[inline]
    unsafe fn get_info<T: Copy> (&self, ty: cl_device_info) -> Result<T> {
        info_value(|size, value, size_ret| unsafe {
            clGetDeviceInfo(self.0, ty, size, value, size_ret)
        })
    }
}

impl Debug for Device {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Device")
            .field("id", &self.0)
            .field("name", &self.name().ok())
            .field("vendor", &self.vendor().ok())
            .field("type", &self.ty().ok())
            .finish()
    }
}

unsafe impl Send for Device {}
unsafe impl Sync for Device {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_type_display () {
        assert_eq!(DeviceType::GPU.to_string(), "GPU");
        assert_eq!((DeviceType::GPU | DeviceType::DEFAULT).to_string(), "GPU | DEFAULT");
        assert_eq!(DeviceType::ALL.to_string(), "ALL");
        assert_eq!(DeviceType::empty().to_string(), "NONE");
        assert_eq!(DeviceType::default(), DeviceType::ALL);
    }

    #[test]
    fn truncates_unknown_bits () {
        let ty = DeviceType::from_bits_truncate(CL_DEVICE_TYPE_CPU | (1 << 40));
        assert_eq!(ty, DeviceType::CPU);
    }
}
