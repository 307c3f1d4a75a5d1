use core::fmt::Debug;
use once_cell::sync::OnceCell;
use opencl_sys::{clGetPlatformIDs, clGetPlatformInfo, cl_platform_id, cl_platform_info, CL_PLATFORM_PROFILE, CL_PLATFORM_VERSION, CL_PLATFORM_NAME, CL_PLATFORM_VENDOR, CL_PLATFORM_EXTENSIONS};
use crate::error::{check, raise, ErrorCL, Result};
use crate::utils::info_string;

static PLATFORMS : OnceCell<Vec<Platform>> = OnceCell::new();

/// OpenCL platform
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform (pub(crate) cl_platform_id);

impl Platform {
    /// Number of platforms visible through the ICD loader.
    /// A loader with no registered platforms reports zero rather than an error.
    pub fn count () -> Result<u32> {
        let mut cnt = 0;
        let err = unsafe { clGetPlatformIDs(0, core::ptr::null_mut(), &mut cnt) };

        match err {
            0 => Ok(cnt),
            err if ErrorCL::from(err) == ErrorCL::PlatformNotFound => Ok(0),
            err => raise(ErrorCL::from(err), |_| Some("querying the number of platforms failed".into()))
        }
    }

    /// Every platform, queried once and cached for the rest of the process.
    pub fn all () -> Result<&'static [Platform]> {
        PLATFORMS.get_or_try_init(|| -> Result<Vec<Platform>> {
            let cnt = Self::count()?;
            log::debug!("found {cnt} OpenCL platform(s)");
            if cnt == 0 {
                return Ok(Vec::new());
            }

            let mut result = vec![core::ptr::null_mut(); cnt as usize];
            check(unsafe { clGetPlatformIDs(cnt, result.as_mut_ptr(), core::ptr::null_mut()) })?;
            Ok(result.into_iter().map(Platform).collect())
        }).map(Vec::as_slice)
    }

    #[inline(always)]
    pub fn id (&self) -> cl_platform_id {
        self.0
    }

    /// OpenCL profile string.
    #[inline(always)]
    pub fn profile (&self) -> Result<String> {
        self.get_info_string(CL_PLATFORM_PROFILE)
    }

    /// OpenCL version string.
    #[inline(always)]
    pub fn version (&self) -> Result<String> {
        self.get_info_string(CL_PLATFORM_VERSION)
    }

    /// Platform name string.
    #[inline(always)]
    pub fn name (&self) -> Result<String> {
        self.get_info_string(CL_PLATFORM_NAME)
    }

    /// Platform vendor string.
    #[inline(always)]
    pub fn vendor (&self) -> Result<String> {
        self.get_info_string(CL_PLATFORM_VENDOR)
    }

    /// Extension names supported by every device of the platform.
    #[inline]
    pub fn extensions (&self) -> Result<Vec<String>> {
        let all = self.get_info_string(CL_PLATFORM_EXTENSIONS)?;
        Ok(all.split_whitespace().map(String::from).collect())
    }

    #[inline]
    fn get_info_string (&self, ty: cl_platform_info) -> Result<String> {
        info_string(|size, value, size_ret| unsafe {
            clGetPlatformInfo(self.0, ty, size, value, size_ret)
        })
    }
}

impl Debug for Platform {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Platform")
            .field("id", &self.0)
            .field("name", &self.name().ok())
            .field("vendor", &self.vendor().ok())
            .field("version", &self.version().ok())
            .finish()
    }
}

unsafe impl Send for Platform {}
unsafe impl Sync for Platform {}
