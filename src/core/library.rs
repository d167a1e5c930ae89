//! Purpose: Open plugin libraries and hand out raw symbol addresses.
//! Exports: `Loader`, `Library`, `RawSymbol`, `DynamicLoader`, `StaticLoader`, `StaticBundle`.
//! Role: Leaf of the plugin stack; everything above works against the traits, not libloading.
//! Invariants: `Library::close` is idempotent and symbols are never served after close.
//! Invariants: Each `Loader::open` yields an independent handle, even for the same path.
use std::collections::HashMap;
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, warn};

use super::error::{Error, ErrorKind};

/// Untyped address of an exported function.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RawSymbol(NonNull<c_void>);

impl RawSymbol {
    pub fn new(ptr: *const c_void) -> Option<Self> {
        NonNull::new(ptr as *mut c_void).map(Self)
    }

    pub fn as_ptr(self) -> *const c_void {
        self.0.as_ptr()
    }

    /// Reinterprets the address as a typed function pointer.
    ///
    /// # Safety
    /// `F` must be a function pointer type matching the exported signature.
    pub unsafe fn cast<F: Copy>(self) -> Result<F, Error> {
        if std::mem::size_of::<F>() != std::mem::size_of::<*const c_void>() {
            return Err(Error::new(ErrorKind::Internal).with_message(format!(
                "symbol cast to {} is not pointer-sized",
                std::any::type_name::<F>()
            )));
        }
        let ptr = self.as_ptr();
        Ok(unsafe { std::mem::transmute_copy::<*const c_void, F>(&ptr) })
    }
}

pub trait Library: Send {
    fn symbol(&self, name: &str) -> Option<RawSymbol>;
    fn close(&mut self);
    fn is_closed(&self) -> bool;
}

pub trait Loader: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn Library>, Error>;
}

/// Loads plugins from shared objects on disk.
#[derive(Clone, Copy, Debug, Default)]
pub struct DynamicLoader;

impl Loader for DynamicLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn Library>, Error> {
        // Library initializers run here; plugins are trusted to that extent.
        let library = unsafe { libloading::Library::new(path) }.map_err(|err| {
            Error::new(ErrorKind::LibraryOpen)
                .with_message("failed to open plugin library")
                .with_path(path)
                .with_hint("Check that the file is a shared library built for this platform.")
                .with_source(err)
        })?;
        debug!(path = %path.display(), "opened plugin library");
        Ok(Box::new(DynamicLibrary {
            inner: Some(library),
            path: path.to_path_buf(),
        }))
    }
}

struct DynamicLibrary {
    inner: Option<libloading::Library>,
    path: PathBuf,
}

impl Library for DynamicLibrary {
    fn symbol(&self, name: &str) -> Option<RawSymbol> {
        let library = self.inner.as_ref()?;
        let symbol = unsafe { library.get::<*const c_void>(name.as_bytes()) }.ok()?;
        RawSymbol::new(*symbol)
    }

    fn close(&mut self) {
        if let Some(library) = self.inner.take() {
            if let Err(err) = library.close() {
                warn!(path = %self.path.display(), error = %err, "failed to close plugin library");
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.inner.is_none()
    }
}

/// Name to address table for a plugin linked into the host binary.
#[derive(Clone, Debug, Default)]
pub struct StaticBundle {
    symbols: HashMap<String, usize>,
}

impl StaticBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, address: *const c_void) -> Self {
        self.insert(name, address);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, address: *const c_void) {
        self.symbols.insert(name.into(), address as usize);
    }

    pub fn remove(&mut self, name: &str) {
        self.symbols.remove(name);
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Serves statically linked plugins by path, counting opens and closes.
#[derive(Clone, Default)]
pub struct StaticLoader {
    bundles: HashMap<PathBuf, Arc<StaticBundle>>,
    counters: Arc<LoaderCounters>,
}

#[derive(Debug, Default)]
struct LoaderCounters {
    opens: AtomicUsize,
    closes: AtomicUsize,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bundle(mut self, path: impl Into<PathBuf>, bundle: StaticBundle) -> Self {
        self.bundles.insert(path.into(), Arc::new(bundle));
        self
    }

    pub fn open_count(&self) -> usize {
        self.counters.opens.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.counters.closes.load(Ordering::SeqCst)
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.bundles.keys().map(PathBuf::as_path)
    }
}

impl Loader for StaticLoader {
    fn open(&self, path: &Path) -> Result<Box<dyn Library>, Error> {
        let bundle = self.bundles.get(path).ok_or_else(|| {
            Error::new(ErrorKind::LibraryOpen)
                .with_message("no statically linked plugin registered for path")
                .with_path(path)
        })?;
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StaticLibrary {
            bundle: Some(Arc::clone(bundle)),
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct StaticLibrary {
    bundle: Option<Arc<StaticBundle>>,
    counters: Arc<LoaderCounters>,
}

impl Library for StaticLibrary {
    fn symbol(&self, name: &str) -> Option<RawSymbol> {
        let bundle = self.bundle.as_ref()?;
        let address = bundle.symbols.get(name)?;
        RawSymbol::new(*address as *const c_void)
    }

    fn close(&mut self) {
        if self.bundle.take().is_some() {
            self.counters.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_closed(&self) -> bool {
        self.bundle.is_none()
    }
}
