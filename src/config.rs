//! Purpose: Host-side settings that shape how plugins are configured after creation.
//! Exports: `HostOptions`, `Language`, `RenderBackend`.
//! Role: Input to the factory; loadable from JSON and overridable from CLI flags.
//! Invariants: Defaults describe a release build on a desktop GL core profile at 60 fps.
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    Japanese,
    English,
    ChineseSimplified,
    ChineseTraditional,
    Korean,
}

impl Language {
    /// Value passed to a plugin's `SetLanguage`.
    pub fn code(self) -> i32 {
        match self {
            Language::Japanese => 0,
            Language::English => 1,
            Language::ChineseSimplified => 2,
            Language::ChineseTraditional => 3,
            Language::Korean => 4,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderBackend {
    Metal,
    D3d11,
    Gles3,
    #[default]
    GlCore33,
    Other,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HostOptions {
    pub language: Language,
    pub render_backend: RenderBackend,
    pub debug: bool,
    pub frame_rate: u32,
    #[serde(with = "millis")]
    pub wait_timeout: Option<Duration>,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            language: Language::default(),
            render_backend: RenderBackend::default(),
            debug: false,
            frame_rate: 60,
            wait_timeout: None,
        }
    }
}

impl HostOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_render_backend(mut self, backend: RenderBackend) -> Self {
        self.render_backend = backend;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_frame_rate(mut self, frame_rate: u32) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    pub fn with_wait_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.wait_timeout = timeout;
        self
    }

    pub fn from_json_file(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            let kind = if err.kind() == std::io::ErrorKind::NotFound {
                ErrorKind::NotFound
            } else {
                ErrorKind::Io
            };
            Error::new(kind)
                .with_message("failed to read host options")
                .with_path(path)
                .with_source(err)
        })?;
        Self::from_json_str(&text).map_err(|err| err.with_path(path))
    }

    pub fn from_json_str(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message("invalid host options json")
                .with_source(err)
        })
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&(duration.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        let value = Option::<u64>::deserialize(deserializer)?;
        Ok(value.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::{HostOptions, Language, RenderBackend};
    use std::time::Duration;

    #[test]
    fn partial_json_keeps_defaults() {
        let options =
            HostOptions::from_json_str(r#"{"render_backend":"metal","wait_timeout":250}"#)
                .expect("options");
        assert_eq!(options.render_backend, RenderBackend::Metal);
        assert_eq!(options.wait_timeout, Some(Duration::from_millis(250)));
        assert_eq!(options.frame_rate, 60);
        assert_eq!(options.language, Language::Japanese);
    }

    #[test]
    fn options_file_round_trips_through_disk() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("host.json");
        let options = HostOptions::new()
            .with_language(Language::English)
            .with_debug(true);
        std::fs::write(&path, serde_json::to_string(&options).expect("json")).expect("write");
        let loaded = HostOptions::from_json_file(&path).expect("load");
        assert_eq!(loaded.language, Language::English);
        assert!(loaded.debug);
        assert!(loaded.wait_timeout.is_none());
    }

    #[test]
    fn missing_file_is_not_found() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = HostOptions::from_json_file(&temp.path().join("absent.json"))
            .err()
            .expect("error");
        assert_eq!(err.kind(), crate::core::error::ErrorKind::NotFound);
    }
}
