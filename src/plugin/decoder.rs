//! Purpose: Decoder proxy for audio/video source plugins.
//! Exports: `Decoder`, `DecoderSymbols`, `DecoderOption`, `AudioFormat`, `VideoFormat`.
//! Role: Opens media through the plugin and copies decoded frames into host buffers.
//! Invariants: Every decoded frame is released with the same index, pointer and size, even on failure.
//! Invariants: After `interrupt`, decode calls succeed with no bytes and never reach the plugin.
use std::ffi::c_void;
use std::path::Path;

use tracing::{debug, warn};

use crate::core::abi::Category;
use crate::core::buffer::{PluginBuffer, copy_c_str_array, to_c_string};
use crate::core::error::{Error, ErrorKind};
use crate::core::lifecycle::PluginHost;

use super::options::{self, OptionKey, OptionKind, OptionValue};
use super::sys::{
    CloseFn, DecodeFrameFn, DestroyFrameFn, ExtensionsFn, GetValueFn, OpenFn, SetOptionFn,
};
use super::impl_proxy;

crate::plugin_symbols! {
    pub struct DecoderSymbols for Category::Decoder;
    required {
        open: OpenFn = "Open",
        set_option: SetOptionFn = "SetOption",
        audio_format_value: GetValueFn = "GetAudioFormatValue",
        video_format_value: GetValueFn = "GetVideoFormatValue",
        decode_audio_frame: DecodeFrameFn = "DecodeAudioFrame",
        decode_video_frame: DecodeFrameFn = "DecodeVideoFrame",
        destroy_audio_frame: DestroyFrameFn = "DestroyAudioFrame",
        destroy_video_frame: DestroyFrameFn = "DestroyVideoFrame",
        audio_extensions: ExtensionsFn = "GetAllAvailableAudioFormatExtensions",
        video_extensions: ExtensionsFn = "GetAllAvailableVideoFormatExtensions",
        close: CloseFn = "Close",
    }
    optional {}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DecoderOption {
    Fps,
    AudioLocation,
    VideoLocation,
}

impl OptionKey for DecoderOption {
    fn raw(self) -> u32 {
        match self {
            DecoderOption::Fps => 0,
            DecoderOption::AudioLocation => 1,
            DecoderOption::VideoLocation => 2,
        }
    }

    fn kind(self) -> OptionKind {
        match self {
            DecoderOption::Fps => OptionKind::U32,
            DecoderOption::AudioLocation | DecoderOption::VideoLocation => OptionKind::Str,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AudioFormat {
    NumBits = 0,
    NumChannels = 1,
    Frequency = 2,
    Duration = 3,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VideoFormat {
    Width = 0,
    Height = 1,
    Stride = 2,
    Duration = 3,
}

#[derive(Clone, Copy)]
enum Stream {
    Audio,
    Video,
}

pub struct Decoder {
    host: PluginHost<DecoderSymbols>,
    interrupted: bool,
}

impl_proxy!(Decoder, DecoderSymbols, interrupted: false);

impl Decoder {
    pub fn open(&mut self, path: &Path) -> Result<bool, Error> {
        let (symbols, instance) = self.host.active()?;
        let location = to_c_string(&path.to_string_lossy(), "media path")?;
        let mut status = 0;
        let opened = unsafe { (symbols.open)(instance, location.as_ptr(), &mut status) };
        self.host.check(status)?;
        debug!(
            plugin = %self.host.file_name(),
            path = %path.display(),
            opened = opened != 0,
            "decoder open"
        );
        Ok(opened != 0)
    }

    pub fn set_option(
        &mut self,
        key: DecoderOption,
        value: impl Into<OptionValue>,
    ) -> Result<(), Error> {
        let value = value.into();
        options::validate(key, &value)?;
        self.set_raw_option(key.raw(), value)
    }

    /// Forwards a key the host has no typed name for; the plugin decides if it is valid.
    pub fn set_raw_option(
        &mut self,
        key: u32,
        value: impl Into<OptionValue>,
    ) -> Result<(), Error> {
        let (symbols, instance) = self.host.active()?;
        let status = options::forward(symbols.set_option, instance, key, &value.into())?;
        self.host.check(status)
    }

    pub fn audio_format_value(&mut self, key: AudioFormat) -> Result<u32, Error> {
        let (symbols, instance) = self.host.active()?;
        self.format_value(symbols.audio_format_value, instance, key as u32)
    }

    pub fn video_format_value(&mut self, key: VideoFormat) -> Result<u32, Error> {
        let (symbols, instance) = self.host.active()?;
        self.format_value(symbols.video_format_value, instance, key as u32)
    }

    fn format_value(
        &self,
        query: GetValueFn,
        instance: *mut c_void,
        key: u32,
    ) -> Result<u32, Error> {
        let mut value = 0u32;
        let mut size = std::mem::size_of::<u32>() as u32;
        let mut status = 0;
        unsafe {
            query(
                instance,
                key,
                (&mut value as *mut u32).cast(),
                &mut size,
                &mut status,
            )
        };
        self.host.check(status)?;
        if size != 4 {
            return Err(Error::new(ErrorKind::Protocol).with_message(format!(
                "format value {key} reported {size} bytes, expected 4"
            )));
        }
        Ok(value)
    }

    pub fn decode_audio_frame(&mut self, index: u32) -> Result<Vec<u8>, Error> {
        self.decode(Stream::Audio, index)
    }

    pub fn decode_video_frame(&mut self, index: u32) -> Result<Vec<u8>, Error> {
        self.decode(Stream::Video, index)
    }

    /// Decodes frames `0..count` in order; a failed frame closes the decoder before returning.
    pub fn decode_audio_frames(
        &mut self,
        count: u32,
        each: impl FnMut(u32, &[u8]),
    ) -> Result<(), Error> {
        self.decode_run(Stream::Audio, count, each)
    }

    pub fn decode_video_frames(
        &mut self,
        count: u32,
        each: impl FnMut(u32, &[u8]),
    ) -> Result<(), Error> {
        self.decode_run(Stream::Video, count, each)
    }

    fn decode_run(
        &mut self,
        stream: Stream,
        count: u32,
        mut each: impl FnMut(u32, &[u8]),
    ) -> Result<(), Error> {
        for index in 0..count {
            match self.decode(stream, index) {
                Ok(frame) => each(index, &frame),
                Err(err) => {
                    if let Err(close_err) = self.close() {
                        warn!(
                            plugin = %self.host.file_name(),
                            error = %close_err,
                            "failed to close decoder after a decode error"
                        );
                    }
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    fn decode(&mut self, stream: Stream, index: u32) -> Result<Vec<u8>, Error> {
        let (symbols, instance) = self.host.active()?;
        if self.interrupted {
            return Ok(Vec::new());
        }
        let (decode, release) = match stream {
            Stream::Audio => (symbols.decode_audio_frame, symbols.destroy_audio_frame),
            Stream::Video => (symbols.decode_video_frame, symbols.destroy_video_frame),
        };
        let mut data: *mut u8 = std::ptr::null_mut();
        let mut size = 0u32;
        let mut status = 0;
        unsafe { decode(instance, index, &mut data, &mut size, &mut status) };
        let frame = PluginBuffer::new(data, size, move |ptr, len| unsafe {
            release(instance, index, ptr, len)
        });
        if status != 0 && !frame.is_empty() {
            warn!(
                plugin = %self.host.file_name(),
                index,
                status,
                "releasing frame from a failed decode"
            );
        }
        self.host.check(status)?;
        Ok(frame.to_vec())
    }

    /// Host-side stop flag; later decodes return empty frames without calling the plugin.
    pub fn interrupt(&mut self) {
        self.interrupted = true;
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    pub fn audio_extensions(&mut self) -> Result<Vec<String>, Error> {
        let (symbols, instance) = self.host.active()?;
        Ok(extensions(symbols.audio_extensions, instance))
    }

    pub fn video_extensions(&mut self) -> Result<Vec<String>, Error> {
        let (symbols, instance) = self.host.active()?;
        Ok(extensions(symbols.video_extensions, instance))
    }

    pub fn close(&mut self) -> Result<bool, Error> {
        let (symbols, instance) = self.host.active()?;
        if self.interrupted {
            self.interrupted = false;
            return Ok(true);
        }
        let mut status = 0;
        let closed = unsafe { (symbols.close)(instance, &mut status) };
        self.host.check(status)?;
        Ok(closed != 0)
    }

    pub fn load_audio(&mut self, path: &Path, fps: u32) -> Result<bool, Error> {
        self.set_option(DecoderOption::Fps, fps)?;
        self.open(path)
    }

    pub fn load_video(&mut self, path: &Path, fps: u32) -> Result<bool, Error> {
        self.set_option(DecoderOption::Fps, fps)?;
        self.open(path)
    }

    /// Longest of the audio and video durations; a stream the plugin does not know counts as zero.
    pub fn duration(&mut self) -> Result<u32, Error> {
        let audio = tolerate_unknown(self.audio_format_value(AudioFormat::Duration))?;
        let video = tolerate_unknown(self.video_format_value(VideoFormat::Duration))?;
        Ok(audio.max(video))
    }
}

fn tolerate_unknown(result: Result<u32, Error>) -> Result<u32, Error> {
    match result {
        Err(err) if err.kind() == ErrorKind::UnknownOption => Ok(0),
        other => other,
    }
}

pub(crate) fn extensions(query: ExtensionsFn, instance: *mut c_void) -> Vec<String> {
    let mut len = 0u32;
    let items = unsafe { query(instance, &mut len) };
    unsafe { copy_c_str_array(items, len) }
}
