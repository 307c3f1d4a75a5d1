//! Element-wise vector addition on the device, checked against the host.
//!
//! [`run`] does the whole job: it discovers a device, uploads two input vectors,
//! builds and dispatches a one-line kernel, reads the sum back and verifies it.

use core::fmt::Debug;
use num_traits::{FromPrimitive, WrappingAdd};
use serde::Serialize;
use crate::error::{raise, ErrorCL, Result};
use crate::prelude::*;

/// Name of the `__kernel` function generated by [`kernel_source`].
pub const KERNEL_NAME : &str = "vector_add";

/// Element count used when none is configured.
pub const DEFAULT_ELEMENTS : usize = 10;

/// Host scalar types with a matching OpenCL C type.
///
/// # Safety
/// Every bit pattern must be a valid value of the implementing type, since output
/// buffers are allocated uninitialized.
pub unsafe trait Element: Copy + Default + PartialEq + Debug + Serialize + FromPrimitive + 'static {
    /// OpenCL C spelling of the type.
    const CL_TYPE: &'static str;

    /// Addition as the device performs it.
    fn add (self, rhs: Self) -> Self;
}

macro_rules! impl_int {
    ($($ty:ty => $cl:literal),+) => {
        $(
            unsafe impl Element for $ty {
                const CL_TYPE: &'static str = $cl;

                #[inline(always)]
                fn add (self, rhs: Self) -> Self {
                    WrappingAdd::wrapping_add(&self, &rhs)
                }
            }
        )+
    };
}

impl_int! {
    i32 => "int",
    u32 => "uint",
    i64 => "long",
    u64 => "ulong"
}

unsafe impl Element for f32 {
    const CL_TYPE: &'static str = "float";

    #[inline(always)]
    fn add (self, rhs: Self) -> Self {
        self + rhs
    }
}

/// OpenCL C source of the addition kernel for `T`.
pub fn kernel_source<T: Element> () -> String {
    format!(
"__kernel void {KERNEL_NAME}(__global const {ty}* a, __global const {ty}* b, __global {ty}* c)
{{
    const size_t i = get_global_id(0);
    c[i] = a[i] + b[i];
}}
", ty = T::CL_TYPE)
}

/// Settings for [`run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VecAddConfig {
    /// Length of each vector.
    pub elements: usize,
    /// Device types considered when selecting a device.
    pub device_type: DeviceType,
    /// Index into [`Platform::all`]. When unset the first platform with a matching device is used.
    pub platform: Option<usize>,
    /// Index into the matching devices of the selected platform.
    pub device: Option<usize>,
    /// Create the queue with profiling enabled and report the kernel time.
    pub profile: bool
}

impl VecAddConfig {
    #[inline(always)]
    pub fn new () -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn elements (mut self, elements: usize) -> Self {
        self.elements = elements;
        self
    }

    #[inline(always)]
    pub fn device_type (mut self, ty: DeviceType) -> Self {
        self.device_type = ty;
        self
    }

    #[inline(always)]
    pub fn platform (mut self, idx: impl Into<Option<usize>>) -> Self {
        self.platform = idx.into();
        self
    }

    #[inline(always)]
    pub fn device (mut self, idx: impl Into<Option<usize>>) -> Self {
        self.device = idx.into();
        self
    }

    #[inline(always)]
    pub fn profile (mut self, profile: bool) -> Self {
        self.profile = profile;
        self
    }
}

impl Default for VecAddConfig {
    fn default() -> Self {
        Self {
            elements: DEFAULT_ELEMENTS,
            device_type: DeviceType::ALL,
            platform: None,
            device: None,
            profile: false
        }
    }
}

/// Device chosen by [`select_device`], with the counts seen while choosing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub platform: Platform,
    pub device: Device,
    pub platform_count: usize,
    /// Matching devices, as counted by [`device_count`].
    pub device_count: usize
}

/// Devices matching `config.device_type` on the configured platform, or on every
/// platform when none is configured. An out-of-range platform index counts as zero.
pub fn device_count (config: &VecAddConfig) -> Result<usize> {
    let platforms = Platform::all()?;
    let considered = match config.platform {
        Some(idx) => platforms.get(idx..=idx).unwrap_or_default(),
        None => platforms
    };

    let mut count = 0;
    for platform in considered {
        count += Device::all(platform, config.device_type)?.len();
    }

    log::debug!("{count} {} device(s) on {} platform(s)", config.device_type, considered.len());
    Ok(count)
}

/// Picks the platform and device described by `config`.
pub fn select_device (config: &VecAddConfig) -> Result<Selection> {
    let platforms = Platform::all()?;
    if platforms.is_empty() {
        return raise(ErrorCL::PlatformNotFound, |_| Some("no OpenCL platform is installed".into()));
    }

    let (platform, devices) = match config.platform {
        Some(idx) => match platforms.get(idx) {
            Some(platform) => (*platform, Device::all(platform, config.device_type)?),
            None => return raise(ErrorCL::InvalidPlatform, |_| Some(format!("platform index {idx} is out of range ({} platform(s) found)", platforms.len())))
        },

        None => {
            let mut found = None;
            for platform in platforms {
                let devices = Device::all(platform, config.device_type)?;
                if !devices.is_empty() {
                    found = Some((*platform, devices));
                    break
                }
            }

            match found {
                Some(x) => x,
                None => return raise(ErrorCL::DeviceNotFound, |_| Some(format!("no {} device on any of {} platform(s)", config.device_type, platforms.len())))
            }
        }
    };

    if devices.is_empty() {
        return raise(ErrorCL::DeviceNotFound, |_| Some(format!("the selected platform has no {} device", config.device_type)));
    }

    let idx = config.device.unwrap_or(0);
    let device = match devices.get(idx) {
        Some(device) => *device,
        None => return raise(ErrorCL::InvalidDevice, |_| Some(format!("device index {idx} is out of range ({} device(s) found)", devices.len())))
    };

    Ok(Selection { platform, device, platform_count: platforms.len(), device_count: device_count(config)? })
}

/// Element where the device result differs from the host sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Mismatch<T> {
    pub index: usize,
    pub expected: T,
    pub actual: T
}

/// Outcome of comparing `c` against `a + b`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verification<T> {
    /// Number of elements compared.
    pub checked: usize,
    /// Whether all three vectors have the same length.
    pub lengths_match: bool,
    pub mismatches: Vec<Mismatch<T>>
}

impl<T> Verification<T> {
    #[inline]
    pub fn passed (&self) -> bool {
        self.lengths_match && self.mismatches.is_empty()
    }
}

/// Checks `c[i] == a[i] + b[i]` for every index.
pub fn verify<T: Element> (a: &[T], b: &[T], c: &[T]) -> Verification<T> {
    let mismatches = a.iter().zip(b).zip(c)
        .enumerate()
        .filter_map(|(index, ((&a, &b), &actual))| {
            let expected = a.add(b);
            (expected != actual).then_some(Mismatch { index, expected, actual })
        })
        .collect();

    Verification {
        checked: a.len().min(b.len()).min(c.len()),
        lengths_match: a.len() == b.len() && b.len() == c.len(),
        mismatches
    }
}

/// Input vector with `v[i] = i`.
pub fn fill<T: Element> (len: usize) -> Result<Vec<T>> {
    (0..len).map(|i| match T::from_usize(i) {
        Some(x) => Ok(x),
        None => raise(ErrorCL::InvalidValue, |_| Some(format!("{len} elements do not fit in '{}'", T::CL_TYPE)))
    }).collect()
}

/// Everything observed during one [`run`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VecAddReport<T> {
    pub platform_count: usize,
    pub device_count: usize,
    pub platform_name: String,
    pub device_name: String,
    pub element_type: &'static str,
    pub a: Vec<T>,
    pub b: Vec<T>,
    pub c: Vec<T>,
    pub verification: Verification<T>,
    /// Kernel execution time in nanoseconds, when profiling was requested.
    pub kernel_time_ns: Option<u64>
}

impl<T> VecAddReport<T> {
    #[inline(always)]
    pub fn passed (&self) -> bool {
        self.verification.passed()
    }
}

/// Runs the full addition and check. Handles are released in reverse order of creation as they go out of scope.
pub fn run<T: Element> (config: &VecAddConfig) -> Result<VecAddReport<T>> {
    let n = config.elements;
    if n == 0 {
        return raise(ErrorCL::InvalidBufferSize, |_| Some("the vectors must have at least one element".into()));
    }

    let a = fill::<T>(n)?;
    let b = fill::<T>(n)?;

    let selection = select_device(config)?;
    let platform_name = selection.platform.name()?;
    let device_name = selection.device.name()?;
    log::info!("using '{device_name}' on '{platform_name}'");

    let ctx = Context::new(Some(ContextProps::new().platform(selection.platform)), core::slice::from_ref(&selection.device))?;
    let props = match config.profile {
        true => CommandQueueProps::PROFILING_ENABLE,
        false => CommandQueueProps::empty()
    };
    let queue = CommandQueue::new(&ctx, &selection.device, props)?;

    // Element guarantees any bit pattern is valid, and `c` is fully overwritten by the kernel.
    let (mut buf_a, mut buf_b, buf_c) = unsafe {
        (
            MemBuffer::<T>::uninit(&ctx, n, MemFlags::READ_ONLY)?,
            MemBuffer::<T>::uninit(&ctx, n, MemFlags::READ_ONLY)?,
            MemBuffer::<T>::uninit(&ctx, n, MemFlags::WRITE_ONLY)?
        )
    };

    buf_a.write(&queue, 0, &a)?;
    buf_b.write(&queue, 0, &b)?;
    log::debug!("uploaded {n} elements per input");

    let program = Program::from_source(&ctx, &kernel_source::<T>())?;
    let mut kernel = Kernel::new(&program, KERNEL_NAME)?;
    kernel.set_mem_arg(0, &buf_a)?;
    kernel.set_mem_arg(1, &buf_b)?;
    kernel.set_mem_arg(2, &buf_c)?;

    let event = kernel.enqueue(&queue, &[n], None)?;
    event.wait()?;

    let kernel_time_ns = match queue.profiling() {
        true => Some(u64::try_from(event.duration()?.as_nanos()).unwrap_or(u64::MAX)),
        false => None
    };

    let c = buf_c.to_vec(&queue)?;
    queue.finish()?;

    let verification = verify(&a, &b, &c);
    match verification.passed() {
        true => log::info!("verified {} elements", verification.checked),
        false => log::warn!("{} of {} elements differ", verification.mismatches.len(), verification.checked)
    }

    Ok(VecAddReport {
        platform_count: selection.platform_count,
        device_count: selection.device_count,
        platform_name,
        device_name,
        element_type: T::CL_TYPE,
        a,
        b,
        c,
        verification,
        kernel_time_ns
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config () {
        let config = VecAddConfig::default();
        assert_eq!(config.elements, 10);
        assert_eq!(config.device_type, DeviceType::ALL);
        assert_eq!(config.platform, None);
        assert_eq!(config.device, None);
        assert!(!config.profile);
    }

    #[test]
    fn config_builder () {
        let config = VecAddConfig::new().elements(64).device_type(DeviceType::GPU).platform(1).device(2).profile(true);
        assert_eq!(config.elements, 64);
        assert_eq!(config.device_type, DeviceType::GPU);
        assert_eq!(config.platform, Some(1));
        assert_eq!(config.device, Some(2));
        assert!(config.profile);
    }

    #[test]
    fn kernel_source_uses_type () {
        let src = kernel_source::<i32>();
        assert!(src.starts_with("__kernel void vector_add(__global const int* a, __global const int* b, __global int* c)"));
        assert!(src.contains("c[i] = a[i] + b[i];"));
        assert!(kernel_source::<f32>().contains("__global float* c"));
        assert!(kernel_source::<u64>().contains("__global const ulong* a"));
    }

    #[test]
    fn fill_is_identity () {
        assert_eq!(fill::<i32>(10).unwrap(), [0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(fill::<f32>(3).unwrap(), [0.0, 1.0, 2.0]);
        assert!(fill::<u64>(0).unwrap().is_empty());
    }

    #[test]
    fn verify_passes_on_sum () {
        let a = fill::<i32>(10).unwrap();
        let b = fill::<i32>(10).unwrap();
        let c = a.iter().zip(&b).map(|(x, y)| x + y).collect::<Vec<_>>();

        let verification = verify(&a, &b, &c);
        assert!(verification.passed());
        assert_eq!(verification.checked, 10);
    }

    #[test]
    fn verify_reports_every_mismatch () {
        let a = [1, 2, 3, 4];
        let b = [10, 20, 30, 40];
        let c = [11, 0, 33, 45];

        let verification = verify(&a, &b, &c);
        assert!(!verification.passed());
        assert_eq!(verification.mismatches, vec![
            Mismatch { index: 1, expected: 22, actual: 0 },
            Mismatch { index: 3, expected: 44, actual: 45 }
        ]);
    }

    #[test]
    fn verify_short_output_fails () {
        let verification = verify(&[1u32, 2], &[1, 2], &[2]);
        assert!(verification.mismatches.is_empty());
        assert!(!verification.lengths_match);
        assert!(!verification.passed());
        assert_eq!(verification.checked, 1);
    }

    #[test]
    fn integer_addition_wraps () {
        assert_eq!(Element::add(i32::MAX, 1), i32::MIN);
        assert_eq!(Element::add(u32::MAX, 2), 1);
    }

    #[cfg(not(feature = "error-stack"))]
    #[test]
    fn zero_elements_rejected () {
        let err = run::<i32>(&VecAddConfig::new().elements(0)).unwrap_err();
        assert_eq!(err, ErrorCL::InvalidBufferSize);
    }
}
