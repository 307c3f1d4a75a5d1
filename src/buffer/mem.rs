use core::marker::PhantomData;
use opencl_sys::{cl_mem, clCreateBuffer, clReleaseMemObject, clEnqueueReadBuffer, clEnqueueWriteBuffer, CL_TRUE};
use crate::error::{check_with, raise, ErrorCL, Result};
use crate::prelude::{Context, CommandQueue};
use crate::utils::log_release;
use super::MemFlags;

/// Device buffer holding `len` values of `T`.
pub struct MemBuffer<T: Copy> {
    pub(crate) id: cl_mem,
    len: usize,
    phtm: PhantomData<T>
}

impl<T: Copy> MemBuffer<T> {
    /// Allocates a buffer and initializes it with the contents of `v`.
    #[inline]
    pub fn new (ctx: &Context, flags: impl Into<Option<MemFlags>>, v: &[T]) -> Result<Self> {
        let flags = flags.into().unwrap_or_default() | MemFlags::COPY_HOST_PTR;
        unsafe { Self::create(ctx, flags, v.len(), v.as_ptr() as *mut T) }
    }

    /// Allocates a buffer of `len` elements without initializing it.
    /// # Safety
    /// Until written, the contents are whatever the device memory held. Reading them back
    /// is only sound if every bit pattern is a valid `T`.
    #[inline]
    pub unsafe fn uninit (ctx: &Context, len: usize, flags: impl Into<Option<MemFlags>>) -> Result<Self> {
        let flags = flags.into().unwrap_or_default();
        if flags.intersects(MemFlags::COPY_HOST_PTR | MemFlags::USE_HOST_PTR) {
            return raise(ErrorCL::InvalidValue, |_| Some(format!("{flags:?} require a host pointer")));
        }

        Self::create(ctx, flags, len, core::ptr::null_mut())
    }

    unsafe fn create (ctx: &Context, flags: MemFlags, len: usize, host: *mut T) -> Result<Self> {
        let size = match len.checked_mul(core::mem::size_of::<T>()) {
            Some(0) | None => return raise(ErrorCL::InvalidBufferSize, |_| Some(format!("cannot allocate a buffer of {len} elements of {} bytes", core::mem::size_of::<T>()))),
            Some(size) => size
        };

        let mut err = 0;
        let id = clCreateBuffer(ctx.0, flags.bits(), size, host.cast(), &mut err);

        if err != 0 {
            return raise(ErrorCL::from(err), |e| match e {
                ErrorCL::InvalidBufferSize => Some(format!("{size} bytes exceeds the device's maximum allocation size")),
                ErrorCL::MemObjectAllocationFailure => Some(format!("failed to allocate {size} bytes of device memory")),
                ErrorCL::InvalidValue => Some(format!("{flags:?} is not a valid combination of memory flags")),
                _ => None
            });
        }

        log::trace!("allocated {size} byte buffer with {flags:?}");
        Ok(Self { id, len, phtm: PhantomData })
    }

    /// Number of elements.
    #[inline(always)]
    pub fn len (&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty (&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn id (&self) -> cl_mem {
        self.id
    }

    /// Blocking upload of `src` into the buffer, starting at element `offset`.
    pub fn write (&mut self, queue: &CommandQueue, offset: usize, src: &[T]) -> Result<()> {
        self.check_range(offset, src.len())?;
        let size = core::mem::size_of::<T>();

        let err = unsafe {
            clEnqueueWriteBuffer(queue.id, self.id, CL_TRUE, offset * size, src.len() * size, src.as_ptr().cast(), 0, core::ptr::null(), core::ptr::null_mut())
        };

        check_with(err, |e| match e {
            ErrorCL::InvalidContext => Some("queue and buffer belong to different contexts".into()),
            _ => None
        })
    }

    /// Blocking download of the buffer, starting at element `offset`, into `dst`.
    pub fn read (&self, queue: &CommandQueue, offset: usize, dst: &mut [T]) -> Result<()> {
        self.check_range(offset, dst.len())?;
        let size = core::mem::size_of::<T>();

        let err = unsafe {
            clEnqueueReadBuffer(queue.id, self.id, CL_TRUE, offset * size, dst.len() * size, dst.as_mut_ptr().cast(), 0, core::ptr::null(), core::ptr::null_mut())
        };

        check_with(err, |e| match e {
            ErrorCL::InvalidContext => Some("queue and buffer belong to different contexts".into()),
            _ => None
        })
    }

    /// Downloads the whole buffer.
    #[inline]
    pub fn to_vec (&self, queue: &CommandQueue) -> Result<Vec<T>> where T: Default {
        let mut result = vec![T::default(); self.len];
        self.read(queue, 0, &mut result)?;
        Ok(result)
    }

    fn check_range (&self, offset: usize, len: usize) -> Result<()> {
        match offset.checked_add(len) {
            Some(end) if end <= self.len => Ok(()),
            _ => raise(ErrorCL::InvalidValue, |_| Some(format!("range {offset}..{offset}+{len} is out of bounds for a buffer of {} elements", self.len)))
        }
    }
}

impl<T: Copy> Drop for MemBuffer<T> {
    #[inline(always)]
    fn drop (&mut self) {
        log_release("buffer", unsafe { clReleaseMemObject(self.id) });
    }
}
