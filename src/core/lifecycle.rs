//! Purpose: Generic load/create/destroy/unload state machine shared by every plugin category.
//! Exports: `PluginHost`, `Instance`, `LifecycleState`, `PluginDescriptor`.
//! Role: Owns the library handle, the resolved table and the opaque instance for one proxy.
//! Invariants: The instance is `Some` only in `Created`/`Active`; destroy clears it before returning.
//! Invariants: `Initialize` runs once per successful load and `Terminate` once per unload.
//! Invariants: On ABI mismatch or missing symbols the library is closed and no table is kept.
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::abi::{AbiVersion, Category};
use super::buffer::{copy_c_str, to_c_string};
use super::error::{Error, ErrorKind};
use super::library::{Library, Loader};
use super::status::{self, FailureSource};
use super::symbols::{BaseSymbols, DescribeFn, PluginSymbols, SymbolResolver};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Unloaded,
    Loaded,
    Created,
    Active,
    Destroyed,
}

/// Opaque handle returned by a plugin's `Create`; only this crate can mint one.
#[derive(Debug)]
pub struct Instance(NonNull<c_void>);

// The handle is owned by exactly one host and plugin calls are serialized by `&mut`.
unsafe impl Send for Instance {}

impl Instance {
    pub(crate) fn from_raw(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    pub(crate) fn as_ptr(&self) -> *mut c_void {
        self.0.as_ptr()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PluginDescriptor {
    pub category: Category,
    pub path: PathBuf,
    pub name: String,
    pub version: AbiVersion,
}

struct Bound<S> {
    library: Box<dyn Library>,
    symbols: S,
    version: AbiVersion,
}

pub struct PluginHost<S: PluginSymbols> {
    loader: Arc<dyn Loader>,
    path: PathBuf,
    name: String,
    bound: Option<Bound<S>>,
    instance: Option<Instance>,
    state: LifecycleState,
}

impl<S: PluginSymbols> PluginHost<S> {
    pub fn new(loader: Arc<dyn Loader>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = file_name(&path);
        Self {
            loader,
            path,
            name,
            bound: None,
            instance: None,
            state: LifecycleState::Unloaded,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.bound.is_some()
    }

    pub fn has_instance(&self) -> bool {
        self.instance.is_some()
    }

    pub fn version(&self) -> Option<AbiVersion> {
        self.bound.as_ref().map(|bound| bound.version)
    }

    pub fn descriptor(&self) -> Option<PluginDescriptor> {
        self.version().map(|version| PluginDescriptor {
            category: S::CATEGORY,
            path: self.path.clone(),
            name: self.name.clone(),
            version,
        })
    }

    pub fn load(&mut self) -> Result<(), Error> {
        if self.bound.is_some() {
            return Ok(());
        }
        debug!(path = %self.path.display(), category = %S::CATEGORY, "loading plugin");
        let mut library = self.loader.open(&self.path)?;
        match bind::<S>(library.as_ref()) {
            Ok((symbols, version)) => {
                unsafe { (symbols.base().initialize)() };
                debug!(plugin = %self.name, version = %version, "plugin initialized");
                self.bound = Some(Bound {
                    library,
                    symbols,
                    version,
                });
                self.state = LifecycleState::Loaded;
                Ok(())
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "rejecting plugin");
                library.close();
                Err(err.with_path(self.path.clone()))
            }
        }
    }

    pub fn create(&mut self) -> Result<(), Error> {
        let Some(bound) = self.bound.as_ref() else {
            return Err(not_loaded(&self.path));
        };
        if self.instance.is_some() {
            return Ok(());
        }
        let base = bound.symbols.base();
        let raw = match base.create_with_location {
            Some(create_with_location) => {
                let location = to_c_string(&self.path.to_string_lossy(), "plugin path")?;
                unsafe { create_with_location(location.as_ptr()) }
            }
            None => unsafe { (base.create)() },
        };
        let instance = Instance::from_raw(raw).ok_or_else(|| {
            Error::new(ErrorKind::NullObject)
                .with_message(format!("The plugin {} tried passing nullptr", self.name))
                .with_path(self.path.clone())
        })?;
        debug!(plugin = %self.name, "plugin instance created");
        self.instance = Some(instance);
        self.state = LifecycleState::Created;
        Ok(())
    }

    pub fn destroy(&mut self) {
        let Some(instance) = self.instance.take() else {
            return;
        };
        if let Some(bound) = self.bound.as_ref() {
            unsafe { (bound.symbols.base().destroy)(instance.as_ptr()) };
            debug!(plugin = %self.name, "plugin instance destroyed");
        }
        self.state = LifecycleState::Destroyed;
    }

    pub fn unload(&mut self) {
        self.destroy();
        let Some(mut bound) = self.bound.take() else {
            return;
        };
        unsafe { (bound.symbols.base().terminate)() };
        bound.library.close();
        debug!(plugin = %self.name, "plugin unloaded");
        self.state = LifecycleState::Unloaded;
    }

    /// Table and instance for a plugin call; fails unless `create` succeeded.
    pub fn active(&mut self) -> Result<(S, *mut c_void), Error> {
        let (Some(bound), Some(instance)) = (self.bound.as_ref(), self.instance.as_ref()) else {
            return Err(Error::new(ErrorKind::Lifecycle)
                .with_message(format!("plugin {} has no live instance", self.name))
                .with_hint("Call load() and create() before using the plugin.")
                .with_path(self.path.clone()));
        };
        let pair = (bound.symbols, instance.as_ptr());
        self.state = LifecycleState::Active;
        Ok(pair)
    }

    /// Resolved table without requiring an instance.
    pub fn symbols(&self) -> Option<&S> {
        self.bound.as_ref().map(|bound| &bound.symbols)
    }

    /// Converts a status out-parameter into a `Result`, consulting the plugin for `REFER_REASON`.
    pub fn check(&self, code: i32) -> Result<(), Error> {
        match self.translate(code) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    pub fn translate(&self, code: i32) -> Option<Error> {
        status::translate(code, &self.reporter())
    }

    pub fn failure_reason(&self) -> Option<String> {
        self.reporter().failure_reason()
    }

    pub fn recovery_suggestion(&self) -> Option<String> {
        self.reporter().recovery_suggestion()
    }

    fn reporter(&self) -> Reporter<'_> {
        Reporter {
            name: &self.name,
            base: self.bound.as_ref().map(|bound| bound.symbols.base()),
            instance: self.instance.as_ref().map(Instance::as_ptr),
        }
    }
}

impl<S: PluginSymbols> Drop for PluginHost<S> {
    fn drop(&mut self) {
        self.unload();
    }
}

fn bind<S: PluginSymbols>(library: &dyn Library) -> Result<(S, AbiVersion), Error> {
    let mut resolver = SymbolResolver::new(library, S::CATEGORY.symbol_prefix());
    let mut symbols = S::resolve_required(&mut resolver)?;
    let version = AbiVersion::from_raw(unsafe { (symbols.base().get_abi_version)() });
    let expected = S::CATEGORY.expected_major();
    if !version.is_compatible(expected) {
        return Err(Error::new(ErrorKind::AbiMismatch)
            .with_message(format!(
                "{} plugin reports ABI {version}, host expects major {expected}",
                S::CATEGORY
            ))
            .with_hint("Rebuild the plugin against a matching SDK."));
    }
    let host = S::CATEGORY.host_version();
    if version.minor() > host.minor() {
        debug!(
            reported = %version,
            host = %host,
            "plugin is newer than host; newer entry points are ignored"
        );
    }
    symbols.resolve_optional(&resolver);
    Ok((symbols, version))
}

fn not_loaded(path: &Path) -> Error {
    Error::new(ErrorKind::Lifecycle)
        .with_message("plugin library is not loaded")
        .with_hint("Call load() before create().")
        .with_path(path)
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

struct Reporter<'a> {
    name: &'a str,
    base: Option<BaseSymbols>,
    instance: Option<*mut c_void>,
}

impl Reporter<'_> {
    fn describe(&self, pick: fn(&BaseSymbols) -> DescribeFn) -> Option<String> {
        let (base, instance) = (self.base.as_ref()?, self.instance?);
        unsafe { copy_c_str(pick(base)(instance as *const c_void)) }
    }
}

impl FailureSource for Reporter<'_> {
    fn plugin_name(&self) -> &str {
        self.name
    }

    fn failure_reason(&self) -> Option<String> {
        self.describe(|base| base.failure_reason)
    }

    fn recovery_suggestion(&self) -> Option<String> {
        self.describe(|base| base.recovery_suggestion)
    }
}

#[cfg(test)]
mod tests {
    use super::file_name;
    use std::path::Path;

    #[test]
    fn file_name_is_last_component() {
        assert_eq!(file_name(Path::new("/opt/plugins/libwav.so")), "libwav.so");
        assert_eq!(file_name(Path::new("plugin.dll")), "plugin.dll");
    }
}
