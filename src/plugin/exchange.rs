//! Purpose: Configure/execute/retrieve plumbing shared by model and motion plugins.
//! Exports: `ExecutionState`, `Execution`.
//! Role: Keeps the two transform proxies identical in how they report success and hand out output.
//! Invariants: Output is only fetched after an execute that reported success.
//! Invariants: Any configuration call after an execute returns the proxy to `Configured`.
use std::ffi::{c_int, c_void};

use serde::Serialize;
use tracing::debug;

use crate::core::buffer::{buffer_len, copy_c_str, read_two_call, to_c_string};
use crate::core::error::{Error, ErrorKind};
use crate::core::lifecycle::PluginHost;
use crate::core::symbols::PluginSymbols;

use super::sys::{
    CountFunctionsFn, DataSizeFn, DescribeFn, FunctionNameFn, ReadDataFn, SetBytesFn,
    SetFramesFn, SetIndicesFn, SetNamedFramesFn, StatusFn,
};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    #[default]
    Configured,
    Executing,
    Succeeded,
    Failed,
}

#[derive(Debug, Default)]
pub(crate) struct Execution {
    state: ExecutionState,
}

impl Execution {
    pub(crate) fn state(&self) -> ExecutionState {
        self.state
    }

    pub(crate) fn reconfigure(&mut self) {
        self.state = ExecutionState::Configured;
    }

    pub(crate) fn run<S: PluginSymbols>(
        &mut self,
        host: &PluginHost<S>,
        execute: StatusFn,
        instance: *mut c_void,
    ) -> Result<(), Error> {
        self.state = ExecutionState::Executing;
        let mut status = 0;
        unsafe { execute(instance, &mut status) };
        match host.check(status) {
            Ok(()) => {
                self.state = ExecutionState::Succeeded;
                debug!(plugin = %host.file_name(), "execute succeeded");
                Ok(())
            }
            Err(err) => {
                self.state = ExecutionState::Failed;
                debug!(plugin = %host.file_name(), error = %err, "execute failed");
                Err(err)
            }
        }
    }

    pub(crate) fn output<S: PluginSymbols>(
        &self,
        host: &PluginHost<S>,
        size_fn: DataSizeFn,
        data_fn: ReadDataFn,
        instance: *mut c_void,
    ) -> Result<Vec<u8>, Error> {
        if self.state != ExecutionState::Succeeded {
            return Err(Error::new(ErrorKind::Lifecycle)
                .with_message(format!(
                    "output is unavailable while execution is {:?}",
                    self.state
                ))
                .with_hint("Call execute() and check it succeeded before reading output."));
        }
        let mut size = 0u32;
        unsafe { size_fn(instance, &mut size) };
        read_two_call(size, |buffer| {
            let mut status = 0;
            unsafe { data_fn(instance, buffer.as_mut_ptr(), buffer.len() as u32, &mut status) };
            host.check(status)
        })
    }
}

pub(crate) fn function_count(count: CountFunctionsFn, instance: *mut c_void) -> usize {
    let value = unsafe { count(instance as *const c_void) };
    usize::try_from(value).unwrap_or(0)
}

pub(crate) fn function_name(
    name: FunctionNameFn,
    instance: *mut c_void,
    index: usize,
) -> Option<String> {
    let index = c_int::try_from(index).ok()?;
    unsafe { copy_c_str(name(instance as *const c_void, index)) }
}

/// Function indices cross the boundary as `c_int`.
pub(crate) fn function_index(index: usize) -> Result<c_int, Error> {
    c_int::try_from(index).map_err(|_| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("function index {index} is out of range"))
            .with_hint("Use an index listed by the plugin's functions.")
    })
}

pub(crate) fn describe(describe: Option<DescribeFn>, instance: *mut c_void) -> Option<String> {
    let describe = describe?;
    unsafe { copy_c_str(describe(instance as *const c_void)) }
}

/// Sends a byte blob; a plugin without the entry point accepts it silently.
pub(crate) fn send_bytes<S: PluginSymbols>(
    host: &PluginHost<S>,
    setter: Option<SetBytesFn>,
    instance: *mut c_void,
    data: &[u8],
) -> Result<(), Error> {
    let Some(setter) = setter else {
        return Ok(());
    };
    let len = buffer_len(data)?;
    let mut status = 0;
    unsafe { setter(instance, data.as_ptr(), len, &mut status) };
    host.check(status)
}

/// Sends an index list; an empty list is still sent so the plugin clears prior state.
pub(crate) fn send_indices<S: PluginSymbols>(
    host: &PluginHost<S>,
    setter: Option<SetIndicesFn>,
    instance: *mut c_void,
    indices: &[i32],
) -> Result<(), Error> {
    let Some(setter) = setter else {
        return Ok(());
    };
    let len = u32::try_from(indices.len())
        .map_err(|_| Error::new(ErrorKind::Usage).with_message("too many indices"))?;
    let mut status = 0;
    unsafe { setter(instance, indices.as_ptr(), len, &mut status) };
    host.check(status)
}

pub(crate) fn send_frames<S: PluginSymbols>(
    host: &PluginHost<S>,
    setter: Option<SetFramesFn>,
    instance: *mut c_void,
    frames: &[u32],
) -> Result<(), Error> {
    let Some(setter) = setter else {
        return Ok(());
    };
    let len = u32::try_from(frames.len())
        .map_err(|_| Error::new(ErrorKind::Usage).with_message("too many keyframes"))?;
    let mut status = 0;
    unsafe { setter(instance, frames.as_ptr(), len, &mut status) };
    host.check(status)
}

pub(crate) fn send_named_frames<S: PluginSymbols>(
    host: &PluginHost<S>,
    setter: Option<SetNamedFramesFn>,
    instance: *mut c_void,
    name: &str,
    frames: &[u32],
) -> Result<(), Error> {
    let Some(setter) = setter else {
        return Ok(());
    };
    let name = to_c_string(name, "track name")?;
    let len = u32::try_from(frames.len())
        .map_err(|_| Error::new(ErrorKind::Usage).with_message("too many keyframes"))?;
    let mut status = 0;
    unsafe { setter(instance, name.as_ptr(), frames.as_ptr(), len, &mut status) };
    host.check(status)
}
