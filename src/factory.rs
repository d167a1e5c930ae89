//! Purpose: Build ready-to-use category proxies from a library path and host settings.
//! Exports: `PluginFactory`.
//! Role: The only place category policy (effect dialect, plugin language) meets orchestration.
//! Invariants: A failed load or create is always followed by destroy and unload before returning.
//! Invariants: Post-create configuration failures are logged and never discard the proxy.
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{HostOptions, RenderBackend};
use crate::core::error::{Error, ErrorKind};
use crate::core::library::{DynamicLoader, Loader};
use crate::core::lifecycle::{PluginDescriptor, PluginHost};
use crate::plugin::{
    Decoder, EffectCompiler, EffectOption, Encoder, ModelIo, MotionIo, OptionValue, PluginProxy,
};

#[derive(Clone)]
pub struct PluginFactory {
    loader: Arc<dyn Loader>,
    options: HostOptions,
}

impl PluginFactory {
    pub fn new(loader: Arc<dyn Loader>, options: HostOptions) -> Self {
        Self { loader, options }
    }

    /// Factory backed by shared objects on disk.
    pub fn dynamic(options: HostOptions) -> Self {
        Self::new(Arc::new(DynamicLoader), options)
    }

    pub fn options(&self) -> &HostOptions {
        &self.options
    }

    pub fn loader(&self) -> Arc<dyn Loader> {
        Arc::clone(&self.loader)
    }

    /// Loads and creates any proxy type, rolling back on failure.
    pub fn create<P: PluginProxy>(&self, path: impl Into<PathBuf>) -> Result<P, Error> {
        let mut proxy = P::from_host(PluginHost::new(Arc::clone(&self.loader), path));
        let result = proxy.load().and_then(|()| proxy.create());
        if let Err(err) = result {
            warn!(
                plugin = %proxy.host().file_name(),
                error = %err,
                "plugin unavailable; rolling back"
            );
            self.destroy(&mut proxy);
            return Err(err);
        }
        debug!(plugin = %proxy.host().file_name(), "plugin ready");
        Ok(proxy)
    }

    pub fn create_decoder(&self, path: impl Into<PathBuf>) -> Result<Decoder, Error> {
        self.create(path)
    }

    pub fn create_encoder(&self, path: impl Into<PathBuf>) -> Result<Encoder, Error> {
        let mut encoder: Encoder = self.create(path)?;
        encoder.set_wait_timeout(self.options.wait_timeout);
        Ok(encoder)
    }

    pub fn create_effect_compiler(
        &self,
        path: impl Into<PathBuf>,
    ) -> Result<EffectCompiler, Error> {
        let mut compiler: EffectCompiler = self.create(path)?;
        for (key, value) in effect_settings(&self.options) {
            if let Err(err) = compiler.set_option(key, value) {
                warn!(
                    plugin = %compiler.host().file_name(),
                    option = ?key,
                    error = %err,
                    "effect compiler rejected host setting"
                );
            }
        }
        Ok(compiler)
    }

    pub fn create_model_io(&self, path: impl Into<PathBuf>) -> Result<ModelIo, Error> {
        let mut plugin: ModelIo = self.create(path)?;
        if let Err(err) = plugin.set_language(self.options.language) {
            warn!(plugin = %plugin.host().file_name(), error = %err, "failed to set language");
        }
        Ok(plugin)
    }

    pub fn create_motion_io(&self, path: impl Into<PathBuf>) -> Result<MotionIo, Error> {
        let mut plugin: MotionIo = self.create(path)?;
        if let Err(err) = plugin.set_language(self.options.language) {
            warn!(plugin = %plugin.host().file_name(), error = %err, "failed to set language");
        }
        Ok(plugin)
    }

    /// Loads a library as `P` without creating an instance, then unloads it.
    pub fn probe<P: PluginProxy>(
        &self,
        path: impl Into<PathBuf>,
    ) -> Result<PluginDescriptor, Error> {
        let mut proxy = P::from_host(PluginHost::new(Arc::clone(&self.loader), path));
        proxy.load()?;
        let descriptor = proxy.descriptor().ok_or_else(|| {
            Error::new(ErrorKind::Internal).with_message("loaded plugin has no descriptor")
        });
        proxy.unload();
        descriptor
    }

    /// Destroy then unload; a proxy that is already torn down is left alone.
    pub fn destroy<P: PluginProxy>(&self, proxy: &mut P) {
        proxy.destroy();
        proxy.unload();
    }
}

/// Options sent to a freshly created effect compiler for the active backend.
pub(crate) fn effect_settings(options: &HostOptions) -> Vec<(EffectOption, OptionValue)> {
    let mut settings = vec![(
        EffectOption::Optimization,
        OptionValue::flag(!options.debug),
    )];
    match options.render_backend {
        RenderBackend::Metal => settings.push((EffectOption::OutputMsl, OptionValue::Int(1))),
        RenderBackend::D3d11 => settings.push((EffectOption::OutputHlsl, OptionValue::Int(1))),
        RenderBackend::Gles3 => {
            settings.push((EffectOption::OutputEssl, OptionValue::Int(1)));
            settings.push((EffectOption::ShaderVersion, OptionValue::U32(300)));
        }
        RenderBackend::GlCore33 => {
            settings.push((EffectOption::ShaderVersion, OptionValue::U32(330)))
        }
        RenderBackend::Other => {}
    }
    settings
}

#[cfg(test)]
mod tests {
    use super::effect_settings;
    use crate::config::{HostOptions, RenderBackend};
    use crate::plugin::{EffectOption, OptionValue};

    #[test]
    fn gles3_selects_essl_300() {
        let options = HostOptions::new().with_render_backend(RenderBackend::Gles3);
        let settings = effect_settings(&options);
        assert_eq!(
            settings,
            vec![
                (EffectOption::Optimization, OptionValue::Int(1)),
                (EffectOption::OutputEssl, OptionValue::Int(1)),
                (EffectOption::ShaderVersion, OptionValue::U32(300)),
            ]
        );
    }

    #[test]
    fn debug_builds_disable_optimization() {
        let options = HostOptions::new()
            .with_debug(true)
            .with_render_backend(RenderBackend::Metal);
        let settings = effect_settings(&options);
        assert_eq!(settings[0], (EffectOption::Optimization, OptionValue::Int(0)));
        assert_eq!(settings[1], (EffectOption::OutputMsl, OptionValue::Int(1)));
    }

    #[test]
    fn unknown_backend_only_sets_optimization() {
        let options = HostOptions::new().with_render_backend(RenderBackend::Other);
        assert_eq!(effect_settings(&options).len(), 1);
    }
}
