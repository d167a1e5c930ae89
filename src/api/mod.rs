//! Purpose: Define the stable public Rust API boundary for emplug.
//! Exports: Proxies, factory, registry, transform policy, host options and errors.
//! Role: Public, additive-only surface; hides symbol tables and raw signatures.
//! Invariants: Raw function pointers and instance handles are never reachable from here.

pub use crate::config::{HostOptions, Language, RenderBackend};
pub use crate::core::abi::{AbiVersion, Category, is_compatible};
pub use crate::core::completion::{Completion, WaitOutcome};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind, PLUGIN_DOMAIN};
pub use crate::core::library::{DynamicLoader, Loader, StaticBundle, StaticLoader};
pub use crate::core::lifecycle::{LifecycleState, PluginDescriptor};
pub use crate::core::status::StatusCode;
pub use crate::factory::PluginFactory;
pub use crate::plugin::{
    AudioFormat, Decoder, DecoderOption, EffectCompiler, EffectOption, Encoder, EncoderOption,
    EncoderState, ExecutionState, KeyframeKind, ModelIo, ModelObjectKind, MotionIo,
    NamedKeyframeKind, OptionKey, OptionKind, OptionValue, PluginProxy, VideoFormat,
};
pub use crate::registry::{PluginRegistry, discover};
pub use crate::transform::{
    TransformOutcome, TransformRequest, backup_path, transform_model, transform_motion,
};
