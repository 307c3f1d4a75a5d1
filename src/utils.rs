use core::mem::MaybeUninit;
use std::ffi::c_void;
use crate::error::{check, ErrorCL, Result};

/// Reads a string-valued info parameter through one of the `clGet*Info` entry points.
///
/// `get` receives `(param_value_size, param_value, param_value_size_ret)`.
pub(crate) fn info_string (mut get: impl FnMut(usize, *mut c_void, *mut usize) -> i32) -> Result<String> {
    let mut len = 0;
    check(get(0, core::ptr::null_mut(), &mut len))?;

    let mut bytes = vec![0u8; len];
    check(get(len, bytes.as_mut_ptr().cast(), core::ptr::null_mut()))?;
    Ok(c_string(bytes))
}

/// Reads a fixed-size info parameter.
///
/// # Safety
/// `T` must match the type the runtime documents for the queried parameter.
pub(crate) unsafe fn info_value<T: Copy> (mut get: impl FnMut(usize, *mut c_void, *mut usize) -> i32) -> Result<T> {
    let mut value = MaybeUninit::<T>::uninit();
    check(get(core::mem::size_of::<T>(), value.as_mut_ptr().cast(), core::ptr::null_mut()))?;
    Ok(value.assume_init())
}

/// Reads an array-valued info parameter.
///
/// # Safety
/// Same as [`info_value`], for the element type of the array.
pub(crate) unsafe fn info_vec<T: Copy> (mut get: impl FnMut(usize, *mut c_void, *mut usize) -> i32) -> Result<Vec<T>> {
    let mut size = 0;
    check(get(0, core::ptr::null_mut(), &mut size))?;

    let len = size / core::mem::size_of::<T>();
    let mut result = Vec::<T>::with_capacity(len);
    check(get(len * core::mem::size_of::<T>(), result.as_mut_ptr().cast(), core::ptr::null_mut()))?;
    result.set_len(len);
    Ok(result)
}

/// Logs a failed `clRelease*` call. Releases happen in `Drop`, where there is no caller to report to.
#[inline]
pub(crate) fn log_release (what: &str, code: i32) {
    match code {
        0 => log::trace!("released {what}"),
        code => log::warn!("failed to release {what}: {}", ErrorCL::from(code))
    }
}

fn c_string (mut bytes: Vec<u8>) -> String {
    while bytes.last() == Some(&0) {
        bytes.pop();
    }

    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_terminator () {
        assert_eq!(c_string(b"NVIDIA CUDA\0".to_vec()), "NVIDIA CUDA");
        assert_eq!(c_string(b"\0".to_vec()), "");
        assert_eq!(c_string(Vec::new()), "");
    }

    #[test]
    fn lossy_on_invalid_utf8 () {
        assert_eq!(c_string(vec![b'a', 0xff, b'b', 0]), "a\u{fffd}b");
    }

    #[test]
    fn info_string_queries_size_first () {
        let mut calls = Vec::new();
        let s = info_string(|size, value, size_ret| {
            calls.push(size);
            let src = b"Portable Computing Language\0";
            if size_ret.is_null() {
                unsafe { core::ptr::copy_nonoverlapping(src.as_ptr(), value.cast::<u8>(), size) };
            } else {
                unsafe { *size_ret = src.len() };
            }
            0
        }).unwrap();

        assert_eq!(s, "Portable Computing Language");
        assert_eq!(calls, [0, 28]);
    }

    #[cfg(not(feature = "error-stack"))]
    #[test]
    fn info_string_propagates_status () {
        let err = info_string(|_, _, _| -30).unwrap_err();
        assert_eq!(err, ErrorCL::InvalidValue);
    }
}
