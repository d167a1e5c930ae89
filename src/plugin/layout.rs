//! Purpose: UI window layout exchange shared by encoder, model and motion plugins.
//! Exports: `LayoutSlots`.
//! Role: Size-then-data retrieval and component updates over opaque layout blobs.
//! Invariants: Blobs are copied out and never interpreted here.
//! Invariants: A plugin without layout entry points yields an empty layout, not an error.
use std::ffi::{c_int, c_void};

use crate::core::buffer::{buffer_len, read_two_call, to_c_string};
use crate::core::error::Error;
use crate::core::lifecycle::PluginHost;
use crate::core::symbols::PluginSymbols;

use super::sys::{DataSizeFn, ReadDataFn, SetComponentLayoutFn, StatusFn};

#[derive(Clone, Copy, Debug, Default)]
pub struct LayoutSlots {
    pub load: Option<StatusFn>,
    pub size: Option<DataSizeFn>,
    pub data: Option<ReadDataFn>,
    pub set_component: Option<SetComponentLayoutFn>,
}

impl LayoutSlots {
    pub fn is_supported(&self) -> bool {
        self.load.is_some() && self.size.is_some() && self.data.is_some()
    }

    pub(crate) fn window_layout<S: PluginSymbols>(
        &self,
        host: &PluginHost<S>,
        instance: *mut c_void,
    ) -> Result<Vec<u8>, Error> {
        let (Some(load), Some(size_fn), Some(data_fn)) = (self.load, self.size, self.data) else {
            return Ok(Vec::new());
        };
        let mut status = 0;
        unsafe { load(instance, &mut status) };
        host.check(status)?;
        let mut size = 0u32;
        unsafe { size_fn(instance, &mut size) };
        read_two_call(size, |buffer| {
            let mut status = 0;
            unsafe { data_fn(instance, buffer.as_mut_ptr(), buffer.len() as u32, &mut status) };
            host.check(status)
        })
    }

    /// Returns whether the plugin asks for the window layout to be reloaded.
    pub(crate) fn set_component_layout<S: PluginSymbols>(
        &self,
        host: &PluginHost<S>,
        instance: *mut c_void,
        id: &str,
        data: &[u8],
    ) -> Result<bool, Error> {
        let Some(set_component) = self.set_component else {
            return Ok(false);
        };
        let id = to_c_string(id, "component id")?;
        let len = buffer_len(data)?;
        let mut reload: c_int = 0;
        let mut status = 0;
        unsafe {
            set_component(
                instance,
                id.as_ptr(),
                data.as_ptr(),
                len,
                &mut reload,
                &mut status,
            )
        };
        host.check(status)?;
        Ok(reload != 0)
    }
}
