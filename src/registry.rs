//! Purpose: Find plugin libraries on disk and pick a decoder for a media file.
//! Exports: `discover`, `is_plugin_library`, `PluginRegistry`.
//! Role: Startup scan layered on the factory; unusable plugins are dropped, not reported as fatal.
//! Invariants: Discovery order is sorted by path so the first matching decoder is deterministic.
//! Invariants: Every decoder kept by the registry reports at least one extension.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::error::{Error, ErrorKind};
use crate::factory::PluginFactory;
use crate::plugin::Decoder;

const LIBRARY_EXTENSIONS: [&str; 3] = ["so", "dylib", "dll"];

pub fn is_plugin_library(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            LIBRARY_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Shared libraries directly inside `dir`, sorted by path.
pub fn discover(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let entries = std::fs::read_dir(dir).map_err(|err| {
        let kind = if err.kind() == std::io::ErrorKind::NotFound {
            ErrorKind::NotFound
        } else {
            ErrorKind::Io
        };
        Error::new(kind)
            .with_message("failed to read plugin directory")
            .with_path(dir)
            .with_source(err)
    })?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read plugin directory entry")
                .with_path(dir)
                .with_source(err)
        })?;
        let path = entry.path();
        if path.is_file() && is_plugin_library(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

struct DecoderEntry {
    decoder: Decoder,
    extensions: Vec<String>,
}

/// Decoders that loaded successfully, indexed by the extensions they accept.
#[derive(Default)]
pub struct PluginRegistry {
    decoders: Vec<DecoderEntry>,
    by_extension: BTreeMap<String, Vec<usize>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scan<I, P>(factory: &PluginFactory, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut registry = Self::new();
        for path in paths {
            let path = path.into();
            match factory.create_decoder(path.clone()) {
                Ok(decoder) => registry.register(factory, decoder),
                Err(err) => debug!(path = %path.display(), error = %err, "not a decoder"),
            }
        }
        registry
    }

    /// Keeps the decoder if it reports any extension, otherwise tears it down.
    pub fn register(&mut self, factory: &PluginFactory, mut decoder: Decoder) {
        let extensions = match collect_extensions(&mut decoder) {
            Ok(extensions) => extensions,
            Err(err) => {
                warn!(error = %err, "decoder failed to report extensions");
                Vec::new()
            }
        };
        if extensions.is_empty() {
            factory.destroy(&mut decoder);
            return;
        }
        let slot = self.decoders.len();
        for extension in &extensions {
            let indices = self.by_extension.entry(extension.clone()).or_default();
            if !indices.contains(&slot) {
                indices.push(slot);
            }
        }
        self.decoders.push(DecoderEntry {
            decoder,
            extensions,
        });
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.by_extension.keys().map(String::as_str)
    }

    pub fn decoder_extensions(&self, index: usize) -> Option<&[String]> {
        self.decoders
            .get(index)
            .map(|entry| entry.extensions.as_slice())
    }

    /// First registered decoder that accepts the file's extension.
    pub fn decoder_for(&mut self, path: &Path) -> Option<&mut Decoder> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        let slot = *self.by_extension.get(&extension)?.first()?;
        self.decoders.get_mut(slot).map(|entry| &mut entry.decoder)
    }

    pub fn shutdown(&mut self, factory: &PluginFactory) {
        for entry in &mut self.decoders {
            factory.destroy(&mut entry.decoder);
        }
        self.decoders.clear();
        self.by_extension.clear();
    }
}

fn collect_extensions(decoder: &mut Decoder) -> Result<Vec<String>, Error> {
    let mut extensions = decoder.audio_extensions()?;
    extensions.extend(decoder.video_extensions()?);
    let mut normalized: Vec<String> = extensions
        .into_iter()
        .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect();
    normalized.sort();
    normalized.dedup();
    Ok(normalized)
}
