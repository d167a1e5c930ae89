//! Purpose: Typed option values and the byte encoding used by every `SetOption` entry point.
//! Exports: `OptionValue`, `OptionKind`, `OptionKey`.
//! Role: Validates a value against its key before anything reaches the plugin.
//! Invariants: Integers cross as exactly 4 native-endian bytes; strings as `strlen` bytes.
use std::ffi::{CString, c_void};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::buffer::to_c_string;
use crate::core::error::{Error, ErrorKind};

use super::sys::SetOptionFn;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    Int,
    U32,
    Str,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Int(i32),
    U32(u32),
    Str(String),
}

impl OptionValue {
    pub fn kind(&self) -> OptionKind {
        match self {
            OptionValue::Int(_) => OptionKind::Int,
            OptionValue::U32(_) => OptionKind::U32,
            OptionValue::Str(_) => OptionKind::Str,
        }
    }

    pub fn flag(enabled: bool) -> Self {
        OptionValue::Int(i32::from(enabled))
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        OptionValue::Int(value)
    }
}

impl From<u32> for OptionValue {
    fn from(value: u32) -> Self {
        OptionValue::U32(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Str(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Str(value)
    }
}

/// A category's option key with the value kind the plugin expects for it.
pub trait OptionKey: Copy + fmt::Debug {
    fn raw(self) -> u32;
    fn kind(self) -> OptionKind;
}

pub(crate) fn validate<K: OptionKey>(key: K, value: &OptionValue) -> Result<(), Error> {
    let kind = value.kind();
    // Int and U32 share the 4-byte layout, so either satisfies an integer key.
    let compatible = match (key.kind(), kind) {
        (OptionKind::Str, OptionKind::Str) => true,
        (OptionKind::Str, _) | (_, OptionKind::Str) => false,
        _ => true,
    };
    if compatible {
        return Ok(());
    }
    Err(Error::new(ErrorKind::Usage)
        .with_message(format!(
            "option {key:?} expects a {:?} value, got {kind:?}",
            key.kind()
        )))
}

enum Encoded {
    Word([u8; 4]),
    Text(CString),
}

impl Encoded {
    fn new(value: &OptionValue) -> Result<Self, Error> {
        Ok(match value {
            OptionValue::Int(v) => Encoded::Word(v.to_ne_bytes()),
            OptionValue::U32(v) => Encoded::Word(v.to_ne_bytes()),
            OptionValue::Str(v) => Encoded::Text(to_c_string(v, "option value")?),
        })
    }

    fn as_raw(&self) -> (*const c_void, u32) {
        match self {
            Encoded::Word(bytes) => (bytes.as_ptr().cast(), 4),
            Encoded::Text(text) => (
                text.as_ptr().cast(),
                text.as_bytes().len() as u32,
            ),
        }
    }
}

/// Calls `SetOption` and returns the raw status out-parameter.
pub(crate) fn forward(
    set_option: SetOptionFn,
    instance: *mut c_void,
    key: u32,
    value: &OptionValue,
) -> Result<i32, Error> {
    let encoded = Encoded::new(value)?;
    let (ptr, size) = encoded.as_raw();
    let mut status = 0;
    unsafe { set_option(instance, key, ptr, size, &mut status) };
    Ok(status)
}
