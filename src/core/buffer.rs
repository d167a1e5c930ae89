//! Purpose: Copy data across the plugin boundary with explicit ownership.
//! Exports: `PluginBuffer`, `copy_c_str`, `copy_c_str_array`, `to_c_string`, `read_two_call`.
//! Role: Every byte or string the host keeps is a host-owned copy made here.
//! Invariants: A `PluginBuffer` invokes its release callback exactly once, on drop.
//! Invariants: Nothing returned from this module aliases plugin memory.
use std::ffi::{CStr, CString, c_char};

use super::error::{Error, ErrorKind};

/// Plugin-owned bytes that must go back through the plugin's destroy call.
pub struct PluginBuffer<R: FnOnce(*mut u8, u32)> {
    ptr: *mut u8,
    len: u32,
    release: Option<R>,
}

impl<R: FnOnce(*mut u8, u32)> PluginBuffer<R> {
    pub fn new(ptr: *mut u8, len: u32, release: R) -> Self {
        Self {
            ptr,
            len,
            release: Some(release),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ptr.is_null() || self.len == 0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        if self.is_empty() {
            return Vec::new();
        }
        unsafe { std::slice::from_raw_parts(self.ptr, self.len as usize) }.to_vec()
    }
}

impl<R: FnOnce(*mut u8, u32)> Drop for PluginBuffer<R> {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release(self.ptr, self.len);
        }
    }
}

/// Copies a plugin string; `None` for null, lossy for invalid UTF-8.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
pub unsafe fn copy_c_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let value = unsafe { CStr::from_ptr(ptr) };
    Some(value.to_string_lossy().into_owned())
}

/// Copies a `const char* const*` array of `len` entries, skipping null entries.
///
/// # Safety
/// `ptr` must be null or point to at least `len` string pointers.
pub unsafe fn copy_c_str_array(ptr: *const *const c_char, len: u32) -> Vec<String> {
    if ptr.is_null() || len == 0 {
        return Vec::new();
    }
    let entries = unsafe { std::slice::from_raw_parts(ptr, len as usize) };
    entries
        .iter()
        .filter_map(|entry| unsafe { copy_c_str(*entry) })
        .collect()
}

pub fn to_c_string(value: &str, label: &str) -> Result<CString, Error> {
    CString::new(value).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("{label} contains an interior NUL byte"))
            .with_source(err)
    })
}

pub fn buffer_len(bytes: &[u8]) -> Result<u32, Error> {
    u32::try_from(bytes.len()).map_err(|_| {
        Error::new(ErrorKind::Usage).with_message("buffer exceeds the 4 GiB plugin limit")
    })
}

/// Runs the size-then-data protocol into a host-allocated buffer.
///
/// `fetch` fills the buffer and reports the translated status of the data call.
pub fn read_two_call(
    size: u32,
    fetch: impl FnOnce(&mut [u8]) -> Result<(), Error>,
) -> Result<Vec<u8>, Error> {
    if size == 0 {
        return Ok(Vec::new());
    }
    let mut buffer = vec![0u8; size as usize];
    fetch(&mut buffer)?;
    Ok(buffer)
}
