//! Purpose: Resolve per-category function tables from an open library.
//! Exports: `SymbolResolver`, `PluginSymbols`, `BaseSymbols`, `plugin_symbols!`.
//! Role: Bridge from untyped `RawSymbol`s to typed tables owned by one proxy.
//! Invariants: Every missing required name is reported, not only the first.
//! Invariants: Optional slots stay `None` unless the library exports them.
use std::ffi::{c_char, c_void};

use tracing::warn;

use super::abi::Category;
use super::error::{Error, ErrorKind};
use super::library::Library;

pub type GetAbiVersionFn = unsafe extern "C" fn() -> u32;
pub type InitializeFn = unsafe extern "C" fn();
pub type TerminateFn = unsafe extern "C" fn();
pub type CreateFn = unsafe extern "C" fn() -> *mut c_void;
pub type CreateWithLocationFn = unsafe extern "C" fn(*const c_char) -> *mut c_void;
pub type DestroyFn = unsafe extern "C" fn(*mut c_void);
pub type DescribeFn = unsafe extern "C" fn(*const c_void) -> *const c_char;

/// Slots every category exports with identical signatures.
#[derive(Clone, Copy, Debug)]
pub struct BaseSymbols {
    pub get_abi_version: GetAbiVersionFn,
    pub initialize: InitializeFn,
    pub create: CreateFn,
    pub create_with_location: Option<CreateWithLocationFn>,
    pub destroy: DestroyFn,
    pub failure_reason: DescribeFn,
    pub recovery_suggestion: DescribeFn,
    pub terminate: TerminateFn,
}

pub trait PluginSymbols: Copy + Send + 'static {
    const CATEGORY: Category;

    fn resolve_required(resolver: &mut SymbolResolver<'_>) -> Result<Self, Error>;
    fn resolve_optional(&mut self, resolver: &SymbolResolver<'_>);
    fn base(&self) -> BaseSymbols;
}

pub struct SymbolResolver<'a> {
    library: &'a dyn Library,
    prefix: &'static str,
    missing: Vec<String>,
}

impl<'a> SymbolResolver<'a> {
    pub fn new(library: &'a dyn Library, prefix: &'static str) -> Self {
        Self {
            library,
            prefix,
            missing: Vec::new(),
        }
    }

    pub fn full_name(&self, suffix: &str) -> String {
        format!("{}{}", self.prefix, suffix)
    }

    /// Looks up `<prefix><suffix>`, recording the name if absent.
    pub fn required<F: Copy>(&mut self, suffix: &str) -> Option<F> {
        let resolved = self.optional::<F>(suffix);
        if resolved.is_none() {
            self.missing.push(self.full_name(suffix));
        }
        resolved
    }

    pub fn optional<F: Copy>(&self, suffix: &str) -> Option<F> {
        let name = self.full_name(suffix);
        let symbol = self.library.symbol(&name)?;
        // Tables declare the C signature for every suffix they request.
        match unsafe { symbol.cast::<F>() } {
            Ok(resolved) => Some(resolved),
            Err(err) => {
                warn!(symbol = %name, error = %err, "unusable symbol");
                None
            }
        }
    }

    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    pub fn missing_error(&self) -> Error {
        Error::new(ErrorKind::MissingSymbol)
            .with_message(format!(
                "{} required symbol(s) not exported",
                self.missing.len()
            ))
            .with_symbols(self.missing.clone())
    }
}

/// Declares a category function table.
///
/// The base slots (`GetABIVersion`, `Initialize`, `Create`, `CreateWithLocation`,
/// `Destroy`, `GetFailureReason`, `GetRecoverySuggestion`, `Terminate`) are
/// added to every table.
#[macro_export]
macro_rules! plugin_symbols {
    (
        $(#[$meta:meta])*
        pub struct $name:ident for $category:expr;
        required {
            $($req:ident: $req_ty:ty = $req_sym:literal,)*
        }
        optional {
            $($opt:ident: $opt_ty:ty = $opt_sym:literal,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug)]
        pub struct $name {
            pub base: $crate::core::symbols::BaseSymbols,
            $(pub $req: $req_ty,)*
            $(pub $opt: Option<$opt_ty>,)*
        }

        impl $crate::core::symbols::PluginSymbols for $name {
            const CATEGORY: $crate::core::abi::Category = $category;

            fn resolve_required(
                resolver: &mut $crate::core::symbols::SymbolResolver<'_>,
            ) -> Result<Self, $crate::core::error::Error> {
                use $crate::core::symbols as sym;
                let get_abi_version = resolver.required::<sym::GetAbiVersionFn>("GetABIVersion");
                let initialize = resolver.required::<sym::InitializeFn>("Initialize");
                let create = resolver.required::<sym::CreateFn>("Create");
                let destroy = resolver.required::<sym::DestroyFn>("Destroy");
                let failure_reason = resolver.required::<sym::DescribeFn>("GetFailureReason");
                let recovery_suggestion =
                    resolver.required::<sym::DescribeFn>("GetRecoverySuggestion");
                let terminate = resolver.required::<sym::TerminateFn>("Terminate");
                $(let $req = resolver.required::<$req_ty>($req_sym);)*
                match (
                    get_abi_version,
                    initialize,
                    create,
                    destroy,
                    failure_reason,
                    recovery_suggestion,
                    terminate,
                    $($req,)*
                ) {
                    (
                        Some(get_abi_version),
                        Some(initialize),
                        Some(create),
                        Some(destroy),
                        Some(failure_reason),
                        Some(recovery_suggestion),
                        Some(terminate),
                        $(Some($req),)*
                    ) => Ok(Self {
                        base: sym::BaseSymbols {
                            get_abi_version,
                            initialize,
                            create,
                            create_with_location: None,
                            destroy,
                            failure_reason,
                            recovery_suggestion,
                            terminate,
                        },
                        $($req,)*
                        $($opt: None,)*
                    }),
                    _ => Err(resolver.missing_error()),
                }
            }

            fn resolve_optional(&mut self, resolver: &$crate::core::symbols::SymbolResolver<'_>) {
                self.base.create_with_location = resolver.optional("CreateWithLocation");
                $(self.$opt = resolver.optional::<$opt_ty>($opt_sym);)*
            }

            fn base(&self) -> $crate::core::symbols::BaseSymbols {
                self.base
            }
        }
    };
}
