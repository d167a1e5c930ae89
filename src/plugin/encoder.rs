//! Purpose: Encoder proxy for audio/video sink plugins.
//! Exports: `Encoder`, `EncoderSymbols`, `EncoderOption`, `EncoderState`.
//! Role: Drives open/encode/interrupt/close and hands completion to a waiting thread.
//! Invariants: Once interrupted, frames are dropped on the host side and never forwarded.
//! Invariants: The plugin's `Close` runs at most once per open; every `close` posts completion.
//! Invariants: `Interrupt` always reaches the plugin, whatever the encoder state.
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::core::abi::Category;
use crate::core::buffer::{buffer_len, to_c_string};
use crate::core::completion::{Completion, WaitOutcome};
use crate::core::error::{Error, ErrorKind};
use crate::core::lifecycle::PluginHost;

use super::PluginProxy;
use super::decoder::extensions;
use super::layout::LayoutSlots;
use super::options::{self, OptionKey, OptionKind, OptionValue};
use super::sys::{
    CloseFn, DataSizeFn, EncodeFrameFn, ExtensionsFn, OpenFn, ReadDataFn, SetComponentLayoutFn,
    SetOptionFn, StatusFn,
};

crate::plugin_symbols! {
    pub struct EncoderSymbols for Category::Encoder;
    required {
        open: OpenFn = "Open",
        set_option: SetOptionFn = "SetOption",
        encode_audio_frame: EncodeFrameFn = "EncodeAudioFrame",
        encode_video_frame: EncodeFrameFn = "EncodeVideoFrame",
        interrupt: StatusFn = "Interrupt",
        video_extensions: ExtensionsFn = "GetAllAvailableVideoFormatExtensions",
        close: CloseFn = "Close",
    }
    optional {
        load_ui_window_layout: StatusFn = "LoadUIWindowLayout",
        ui_window_layout_size: DataSizeFn = "GetUIWindowLayoutDataSize",
        ui_window_layout_data: ReadDataFn = "GetUIWindowLayoutData",
        set_ui_component_layout: SetComponentLayoutFn = "SetUIComponentLayoutData",
    }
}

impl EncoderSymbols {
    fn layout(&self) -> LayoutSlots {
        LayoutSlots {
            load: self.load_ui_window_layout,
            size: self.ui_window_layout_size,
            data: self.ui_window_layout_data,
            set_component: self.set_ui_component_layout,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EncoderOption {
    Fps,
    Duration,
    Location,
    AudioFrequency,
    AudioChannels,
    AudioBits,
    VideoWidth,
    VideoHeight,
    VideoYFlip,
    VideoHdrBits,
}

impl OptionKey for EncoderOption {
    fn raw(self) -> u32 {
        match self {
            EncoderOption::Fps => 0,
            EncoderOption::Duration => 1,
            EncoderOption::Location => 2,
            EncoderOption::AudioFrequency => 3,
            EncoderOption::AudioChannels => 4,
            EncoderOption::AudioBits => 5,
            EncoderOption::VideoWidth => 6,
            EncoderOption::VideoHeight => 7,
            EncoderOption::VideoYFlip => 8,
            EncoderOption::VideoHdrBits => 9,
        }
    }

    fn kind(self) -> OptionKind {
        match self {
            EncoderOption::Location => OptionKind::Str,
            EncoderOption::VideoYFlip => OptionKind::Int,
            _ => OptionKind::U32,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderState {
    Idle,
    Opened,
    Encoding,
    Interrupted,
    Closed,
}

#[derive(Clone, Copy)]
enum Stream {
    Audio,
    Video,
}

pub struct Encoder {
    host: PluginHost<EncoderSymbols>,
    state: EncoderState,
    completion: Arc<Completion>,
    wait_limit: Option<Duration>,
}

impl PluginProxy for Encoder {
    type Symbols = EncoderSymbols;

    fn from_host(host: PluginHost<EncoderSymbols>) -> Self {
        Self {
            host,
            state: EncoderState::Idle,
            completion: Arc::new(Completion::new()),
            wait_limit: None,
        }
    }

    fn host(&self) -> &PluginHost<EncoderSymbols> {
        &self.host
    }

    fn host_mut(&mut self) -> &mut PluginHost<EncoderSymbols> {
        &mut self.host
    }

    fn create(&mut self) -> Result<(), Error> {
        if self.host.has_instance() {
            return Ok(());
        }
        self.host.create()?;
        self.state = EncoderState::Idle;
        self.completion = Arc::new(Completion::new());
        Ok(())
    }

    fn destroy(&mut self) {
        if matches!(self.state, EncoderState::Opened | EncoderState::Encoding) {
            warn!(plugin = %self.host.file_name(), "destroying encoder that was never closed");
        }
        self.host.destroy();
        self.state = EncoderState::Idle;
    }
}

impl Encoder {
    pub fn new(
        loader: Arc<dyn crate::core::library::Loader>,
        path: impl Into<std::path::PathBuf>,
    ) -> Self {
        Self::from_host(PluginHost::new(loader, path))
    }

    pub fn encoder_state(&self) -> EncoderState {
        self.state
    }

    /// Deadline `cancel` allows for completion; `None` waits forever.
    pub fn set_wait_timeout(&mut self, timeout: Option<Duration>) {
        self.wait_limit = timeout;
    }

    pub fn wait_limit(&self) -> Option<Duration> {
        self.wait_limit
    }

    pub fn open(&mut self, path: &Path) -> Result<bool, Error> {
        let (symbols, instance) = self.host.active()?;
        if matches!(self.state, EncoderState::Opened | EncoderState::Encoding) {
            return Err(Error::new(ErrorKind::Lifecycle)
                .with_message(format!("encoder is already open ({:?})", self.state))
                .with_hint("Call close() before opening another output."));
        }
        let location = to_c_string(&path.to_string_lossy(), "output path")?;
        let mut status = 0;
        let opened = unsafe { (symbols.open)(instance, location.as_ptr(), &mut status) };
        self.host.check(status)?;
        if opened != 0 {
            // An interrupt sent before open still suppresses frames until close.
            if self.state != EncoderState::Interrupted {
                self.state = EncoderState::Opened;
            }
            self.completion = Arc::new(Completion::new());
        }
        debug!(plugin = %self.host.file_name(), path = %path.display(), "encoder open");
        Ok(opened != 0)
    }

    pub fn set_option(
        &mut self,
        key: EncoderOption,
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

    pub fn set_size(&mut self, width: u32, height: u32) -> Result<(), Error> {
        self.set_option(EncoderOption::VideoWidth, width)?;
        self.set_option(EncoderOption::VideoHeight, height)
    }

    pub fn encode_audio_frame(&mut self, index: u32, data: &[u8]) -> Result<(), Error> {
        self.encode(Stream::Audio, index, data)
    }

    pub fn encode_video_frame(&mut self, index: u32, data: &[u8]) -> Result<(), Error> {
        self.encode(Stream::Video, index, data)
    }

    fn encode(&mut self, stream: Stream, index: u32, data: &[u8]) -> Result<(), Error> {
        let (symbols, instance) = self.host.active()?;
        match self.state {
            EncoderState::Interrupted => return Ok(()),
            EncoderState::Idle | EncoderState::Closed => {
                return Err(Error::new(ErrorKind::Lifecycle)
                    .with_message("encoder is not open")
                    .with_hint("Call open() before encoding frames."));
            }
            EncoderState::Opened | EncoderState::Encoding => {}
        }
        let encode = match stream {
            Stream::Audio => symbols.encode_audio_frame,
            Stream::Video => symbols.encode_video_frame,
        };
        let len = buffer_len(data)?;
        let mut status = 0;
        unsafe { encode(instance, index, data.as_ptr(), len, &mut status) };
        self.state = EncoderState::Encoding;
        self.host.check(status)
    }

    /// Asks the plugin to stop its encode thread; the call does not wait for it.
    pub fn interrupt(&mut self) -> Result<(), Error> {
        let (symbols, instance) = self.host.active()?;
        let mut status = 0;
        unsafe { (symbols.interrupt)(instance, &mut status) };
        self.state = EncoderState::Interrupted;
        debug!(plugin = %self.host.file_name(), "encoder interrupted");
        self.host.check(status)
    }

    pub fn close(&mut self) -> Result<bool, Error> {
        let (symbols, instance) = self.host.active()?;
        let previous = std::mem::replace(&mut self.state, EncoderState::Closed);
        let result = match previous {
            EncoderState::Opened | EncoderState::Encoding => {
                let mut status = 0;
                let closed = unsafe { (symbols.close)(instance, &mut status) };
                self.host.check(status).map(|()| closed != 0)
            }
            EncoderState::Interrupted | EncoderState::Idle | EncoderState::Closed => Ok(true),
        };
        self.completion.post();
        result
    }

    /// Blocks until a `close` has posted completion. Once released, returns at once.
    pub fn wait(&self) {
        self.completion.wait();
    }

    pub fn wait_timeout(&self, timeout: Duration) -> WaitOutcome {
        self.completion.wait_timeout(timeout)
    }

    /// Shared handle for waiting on another thread.
    pub fn completion(&self) -> Arc<Completion> {
        Arc::clone(&self.completion)
    }

    /// Waits for completion within the configured limit, or forever when none is set.
    pub fn wait_bounded(&self) -> Result<(), Error> {
        let Some(limit) = self.wait_limit else {
            self.wait();
            return Ok(());
        };
        match self.wait_timeout(limit) {
            WaitOutcome::Signaled => Ok(()),
            WaitOutcome::TimedOut => {
                warn!(plugin = %self.host.file_name(), ?limit, "encoder did not complete");
                Err(Error::new(ErrorKind::Timeout)
                    .with_message(format!(
                        "encoder did not complete within {} ms",
                        limit.as_millis()
                    ))
                    .with_hint("Raise --wait-timeout-ms or check the plugin's encode thread."))
            }
        }
    }

    pub fn cancel(&mut self) -> Result<(), Error> {
        self.interrupt()?;
        self.close()?;
        self.wait_bounded()
    }

    pub fn video_extensions(&mut self) -> Result<Vec<String>, Error> {
        let (symbols, instance) = self.host.active()?;
        Ok(extensions(symbols.video_extensions, instance))
    }

    pub fn has_ui_window_layout(&self) -> bool {
        self.host
            .symbols()
            .is_some_and(|symbols| symbols.layout().is_supported())
    }

    pub fn ui_window_layout(&mut self) -> Result<Vec<u8>, Error> {
        let (symbols, instance) = self.host.active()?;
        symbols.layout().window_layout(&self.host, instance)
    }

    pub fn set_ui_component_layout(&mut self, id: &str, data: &[u8]) -> Result<bool, Error> {
        let (symbols, instance) = self.host.active()?;
        symbols
            .layout()
            .set_component_layout(&self.host, instance, id, data)
    }
}
