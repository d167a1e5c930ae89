//! Purpose: Effect compiler proxy turning effect sources into compiled binaries.
//! Exports: `EffectCompiler`, `EffectSymbols`, `EffectOption`.
//! Role: Synchronous compile calls plus a plugin-side include filesystem.
//! Invariants: Compiled binaries are copied and then released through `DestroyBinary`.
//! Invariants: A compile that yields nothing is `Ok(None)`, not an error.
use std::path::Path;

use tracing::debug;

use crate::core::abi::Category;
use crate::core::buffer::{PluginBuffer, buffer_len, to_c_string};
use crate::core::error::{Error, ErrorKind};
use crate::core::lifecycle::PluginHost;

use super::decoder::extensions;
use super::impl_proxy;
use super::options::{self, OptionKey, OptionKind, OptionValue};
use super::sys::{
    AddIncludeSourceFn, CompileFileFn, CompileSourceFn, DestroyBinaryFn, ExtensionsFn,
    GetValueFn, SetOptionFn,
};

crate::plugin_symbols! {
    pub struct EffectSymbols for Category::EffectCompiler;
    required {
        get_option: GetValueFn = "GetOption",
        set_option: SetOptionFn = "SetOption",
        available_extensions: ExtensionsFn = "GetAvailableExtensions",
        create_binary_from_file: CompileFileFn = "CreateBinaryFromFile",
        create_binary_from_memory: CompileSourceFn = "CreateBinaryFromMemory",
        add_include_source: AddIncludeSourceFn = "AddIncludeSource",
        destroy_binary: DestroyBinaryFn = "DestroyBinary",
    }
    optional {}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EffectOption {
    ShaderVersion,
    Optimization,
    Validation,
    OutputEssl,
    OutputHlsl,
    OutputMsl,
    OutputSpirv,
    EnableMmeMipmap,
}

impl OptionKey for EffectOption {
    fn raw(self) -> u32 {
        match self {
            EffectOption::ShaderVersion => 0,
            EffectOption::Optimization => 1,
            EffectOption::Validation => 2,
            EffectOption::OutputEssl => 3,
            EffectOption::OutputHlsl => 4,
            EffectOption::OutputMsl => 5,
            EffectOption::OutputSpirv => 6,
            EffectOption::EnableMmeMipmap => 7,
        }
    }

    fn kind(self) -> OptionKind {
        match self {
            EffectOption::ShaderVersion => OptionKind::U32,
            _ => OptionKind::Int,
        }
    }
}

pub struct EffectCompiler {
    host: PluginHost<EffectSymbols>,
}

impl_proxy!(EffectCompiler, EffectSymbols);

impl EffectCompiler {
    pub fn set_option(
        &mut self,
        key: EffectOption,
        value: impl Into<OptionValue>,
    ) -> Result<(), Error> {
        let value = value.into();
        options::validate(key, &value)?;
        self.set_raw_option(key.raw(), value)
    }

    pub fn set_raw_option(
        &mut self,
        key: u32,
        value: impl Into<OptionValue>,
    ) -> Result<(), Error> {
        let (symbols, instance) = self.host.active()?;
        let status = options::forward(symbols.set_option, instance, key, &value.into())?;
        self.host.check(status)
    }

    pub fn option(&mut self, key: EffectOption) -> Result<u32, Error> {
        let (symbols, instance) = self.host.active()?;
        let mut value = 0u32;
        let mut size = std::mem::size_of::<u32>() as u32;
        let mut status = 0;
        unsafe {
            (symbols.get_option)(
                instance,
                key.raw(),
                (&mut value as *mut u32).cast(),
                &mut size,
                &mut status,
            )
        };
        self.host.check(status)?;
        if size != 4 {
            return Err(Error::new(ErrorKind::Protocol)
                .with_message(format!("option {key:?} reported {size} bytes, expected 4")));
        }
        Ok(value)
    }

    pub fn set_shader_version(&mut self, version: u32) -> Result<(), Error> {
        self.set_option(EffectOption::ShaderVersion, version)
    }

    pub fn set_mipmap_enabled(&mut self, enabled: bool) -> Result<(), Error> {
        self.set_option(EffectOption::EnableMmeMipmap, OptionValue::flag(enabled))
    }

    pub fn compile_file(&mut self, path: &Path) -> Result<Option<Vec<u8>>, Error> {
        let (symbols, instance) = self.host.active()?;
        let location = to_c_string(&path.to_string_lossy(), "effect path")?;
        let mut size = 0u32;
        let data =
            unsafe { (symbols.create_binary_from_file)(instance, location.as_ptr(), &mut size) };
        let compiled = take_binary(symbols.destroy_binary, instance, data, size);
        debug!(
            path = %path.display(),
            bytes = compiled.as_ref().map_or(0, Vec::len),
            "compiled effect file"
        );
        Ok(compiled)
    }

    pub fn compile_source(&mut self, source: &str) -> Result<Option<Vec<u8>>, Error> {
        let (symbols, instance) = self.host.active()?;
        let text = to_c_string(source, "effect source")?;
        let len = buffer_len(source.as_bytes())?;
        let mut size = 0u32;
        let data = unsafe {
            (symbols.create_binary_from_memory)(instance, text.as_ptr(), len, &mut size)
        };
        Ok(take_binary(symbols.destroy_binary, instance, data, size))
    }

    /// Registers a virtual file the plugin resolves `#include` directives against.
    pub fn add_include_source(&mut self, path: &str, data: &[u8]) -> Result<(), Error> {
        let (symbols, instance) = self.host.active()?;
        let location = to_c_string(path, "include path")?;
        let len = buffer_len(data)?;
        unsafe { (symbols.add_include_source)(instance, location.as_ptr(), data.as_ptr(), len) };
        Ok(())
    }

    pub fn available_extensions(&mut self) -> Result<Vec<String>, Error> {
        let (symbols, instance) = self.host.active()?;
        Ok(extensions(symbols.available_extensions, instance))
    }
}

fn take_binary(
    destroy: DestroyBinaryFn,
    instance: *mut std::ffi::c_void,
    data: *mut u8,
    size: u32,
) -> Option<Vec<u8>> {
    let binary = PluginBuffer::new(data, size, move |ptr, len| {
        if !ptr.is_null() {
            unsafe { destroy(instance, ptr, len) };
        }
    });
    if binary.is_empty() {
        return None;
    }
    Some(binary.to_vec())
}
