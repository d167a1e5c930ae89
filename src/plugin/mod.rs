//! Purpose: Typed proxies for the five plugin categories.
//! Exports: `PluginProxy`, `Decoder`, `Encoder`, `EffectCompiler`, `ModelIo`, `MotionIo`.
//! Role: Memory-safe surface over one function table and one opaque instance each.
//! Invariants: Proxy methods other than load/unload fail with `Lifecycle` until `create` succeeds.
//! Invariants: Proxies never hold plugin memory past the call that produced it.
use crate::core::abi::AbiVersion;
use crate::core::error::Error;
use crate::core::lifecycle::{LifecycleState, PluginDescriptor, PluginHost};
use crate::core::symbols::PluginSymbols;

pub use decoder::{AudioFormat, Decoder, DecoderOption, VideoFormat};
pub use effect::{EffectCompiler, EffectOption};
pub use encoder::{Encoder, EncoderOption, EncoderState};
pub use exchange::ExecutionState;
pub use model_io::{ModelIo, ModelObjectKind};
pub use motion_io::{KeyframeKind, MotionIo, NamedKeyframeKind};
pub use options::{OptionKey, OptionKind, OptionValue};

/// Lifecycle surface shared by every category proxy.
pub trait PluginProxy: Sized {
    type Symbols: PluginSymbols;

    fn from_host(host: PluginHost<Self::Symbols>) -> Self;
    fn host(&self) -> &PluginHost<Self::Symbols>;
    fn host_mut(&mut self) -> &mut PluginHost<Self::Symbols>;

    fn load(&mut self) -> Result<(), Error> {
        self.host_mut().load()
    }

    fn create(&mut self) -> Result<(), Error> {
        self.host_mut().create()
    }

    fn destroy(&mut self) {
        self.host_mut().destroy();
    }

    fn unload(&mut self) {
        self.host_mut().unload();
    }

    fn state(&self) -> LifecycleState {
        self.host().state()
    }

    fn version(&self) -> Option<AbiVersion> {
        self.host().version()
    }

    fn descriptor(&self) -> Option<PluginDescriptor> {
        self.host().descriptor()
    }

    fn failure_reason(&self) -> Option<String> {
        self.host().failure_reason()
    }

    fn recovery_suggestion(&self) -> Option<String> {
        self.host().recovery_suggestion()
    }

    /// Error built from the plugin's own reason and suggestion text.
    fn last_error(&self) -> Error {
        Error::new(crate::core::error::ErrorKind::ReferReason)
            .with_message(self.failure_reason().unwrap_or_default())
            .with_suggestion(self.recovery_suggestion().unwrap_or_default())
    }
}

macro_rules! impl_proxy {
    ($proxy:ident, $symbols:ty $(, $field:ident: $init:expr)*) => {
        impl $crate::plugin::PluginProxy for $proxy {
            type Symbols = $symbols;

            fn from_host(host: $crate::core::lifecycle::PluginHost<$symbols>) -> Self {
                Self { host $(, $field: $init)* }
            }

            fn host(&self) -> &$crate::core::lifecycle::PluginHost<$symbols> {
                &self.host
            }

            fn host_mut(&mut self) -> &mut $crate::core::lifecycle::PluginHost<$symbols> {
                &mut self.host
            }
        }

        impl $proxy {
            pub fn new(
                loader: std::sync::Arc<dyn $crate::core::library::Loader>,
                path: impl Into<std::path::PathBuf>,
            ) -> Self {
                <Self as $crate::plugin::PluginProxy>::from_host(
                    $crate::core::lifecycle::PluginHost::new(loader, path),
                )
            }
        }
    };
}

pub(crate) use impl_proxy;

pub mod decoder;
pub mod effect;
pub mod encoder;
pub mod exchange;
pub mod layout;
pub mod model_io;
pub mod motion_io;
pub mod options;
pub mod sys;
