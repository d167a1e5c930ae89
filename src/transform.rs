//! Purpose: Run a model or motion transform and decide whether its output is usable.
//! Exports: `Transform`, `TransformRequest`, `TransformOutcome`, `transform_model`, `transform_motion`, `backup_path`.
//! Role: Caller-side policy above the proxies; proxies report raw results, this module falls back.
//! Invariants: A failed execute, fetch or validation always yields the original input back.
//! Invariants: Every selection and mask kind is sent before execute, empty lists included.
//! Invariants: Backups hold the pre-transform input and are written only after validation passes.
use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use time::macros::format_description;
use tracing::{debug, warn};

use crate::core::error::{Error, ErrorKind};
use crate::plugin::{KeyframeKind, ModelIo, ModelObjectKind, MotionIo, NamedKeyframeKind};

/// Execute surface shared by model and motion plugins.
pub trait Transform {
    fn display_name(&mut self) -> String;
    fn select_function(&mut self, index: usize) -> Result<(), Error>;
    /// Replaces whatever selection the plugin kept from a previous run.
    fn supply_selection(&mut self, request: &TransformRequest<'_>) -> Result<(), Error>;
    fn supply_input(&mut self, input: &[u8]) -> Result<(), Error>;
    fn run(&mut self) -> Result<(), Error>;
    fn fetch_output(&mut self) -> Result<Vec<u8>, Error>;
}

impl Transform for ModelIo {
    fn display_name(&mut self) -> String {
        self.name().unwrap_or_default()
    }

    fn select_function(&mut self, index: usize) -> Result<(), Error> {
        self.set_function(index)
    }

    fn supply_selection(&mut self, request: &TransformRequest<'_>) -> Result<(), Error> {
        for kind in ModelObjectKind::ALL {
            self.set_selected_indices(kind, lookup(request.selected_objects, kind))?;
        }
        for kind in ModelObjectKind::MASKABLE {
            self.set_masked_indices(kind, lookup(request.masked_objects, kind))?;
        }
        Ok(())
    }

    fn supply_input(&mut self, input: &[u8]) -> Result<(), Error> {
        self.set_input_data(input)
    }

    fn run(&mut self) -> Result<(), Error> {
        self.execute()
    }

    fn fetch_output(&mut self) -> Result<Vec<u8>, Error> {
        self.output_data()
    }
}

impl Transform for MotionIo {
    fn display_name(&mut self) -> String {
        self.name().unwrap_or_default()
    }

    fn select_function(&mut self, index: usize) -> Result<(), Error> {
        self.set_function(index)
    }

    fn supply_selection(&mut self, request: &TransformRequest<'_>) -> Result<(), Error> {
        for kind in KeyframeKind::ALL {
            self.set_selected_keyframes(kind, lookup(request.selected_keyframes, kind))?;
        }
        for &(kind, name, frames) in request.named_keyframes {
            self.set_named_selected_keyframes(kind, name, frames)?;
        }
        Ok(())
    }

    fn supply_input(&mut self, input: &[u8]) -> Result<(), Error> {
        self.set_input_data(input)
    }

    fn run(&mut self) -> Result<(), Error> {
        self.execute()
    }

    fn fetch_output(&mut self) -> Result<Vec<u8>, Error> {
        self.output_data()
    }
}

fn lookup<'a, K: PartialEq, T>(lists: &[(K, &'a [T])], kind: K) -> &'a [T] {
    lists
        .iter()
        .find(|(candidate, _)| *candidate == kind)
        .map(|(_, list)| *list)
        .unwrap_or_default()
}

#[derive(Clone, Copy, Debug)]
pub struct TransformRequest<'a> {
    pub function: usize,
    pub input: &'a [u8],
    /// File the input was read from; required for backups.
    pub source: Option<&'a Path>,
    pub backup: bool,
    /// Model object selections; kinds not listed are sent as empty.
    pub selected_objects: &'a [(ModelObjectKind, &'a [i32])],
    pub masked_objects: &'a [(ModelObjectKind, &'a [i32])],
    /// Motion keyframe selections; kinds not listed are sent as empty.
    pub selected_keyframes: &'a [(KeyframeKind, &'a [u32])],
    pub named_keyframes: &'a [(NamedKeyframeKind, &'a str, &'a [u32])],
}

impl<'a> TransformRequest<'a> {
    pub fn new(function: usize, input: &'a [u8]) -> Self {
        Self {
            function,
            input,
            source: None,
            backup: false,
            selected_objects: &[],
            masked_objects: &[],
            selected_keyframes: &[],
            named_keyframes: &[],
        }
    }

    pub fn with_selected_objects(mut self, lists: &'a [(ModelObjectKind, &'a [i32])]) -> Self {
        self.selected_objects = lists;
        self
    }

    pub fn with_masked_objects(mut self, lists: &'a [(ModelObjectKind, &'a [i32])]) -> Self {
        self.masked_objects = lists;
        self
    }

    pub fn with_selected_keyframes(mut self, lists: &'a [(KeyframeKind, &'a [u32])]) -> Self {
        self.selected_keyframes = lists;
        self
    }

    pub fn with_named_keyframes(
        mut self,
        lists: &'a [(NamedKeyframeKind, &'a str, &'a [u32])],
    ) -> Self {
        self.named_keyframes = lists;
        self
    }

    pub fn with_backup(mut self, source: &'a Path) -> Self {
        self.source = Some(source);
        self.backup = true;
        self
    }
}

#[derive(Debug)]
pub enum TransformOutcome {
    Applied {
        output: Vec<u8>,
        backup: Option<PathBuf>,
    },
    Fallback {
        input: Vec<u8>,
        error: Error,
    },
}

impl TransformOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, TransformOutcome::Applied { .. })
    }

    /// Bytes the caller should keep: the plugin output or the untouched input.
    pub fn bytes(&self) -> &[u8] {
        match self {
            TransformOutcome::Applied { output, .. } => output,
            TransformOutcome::Fallback { input, .. } => input,
        }
    }
}

pub fn transform_model(
    plugin: &mut ModelIo,
    request: TransformRequest<'_>,
    validate: impl FnOnce(&[u8]) -> Result<(), Error>,
) -> TransformOutcome {
    transform(plugin, request, validate)
}

pub fn transform_motion(
    plugin: &mut MotionIo,
    request: TransformRequest<'_>,
    validate: impl FnOnce(&[u8]) -> Result<(), Error>,
) -> TransformOutcome {
    transform(plugin, request, validate)
}

pub fn transform<T: Transform>(
    plugin: &mut T,
    request: TransformRequest<'_>,
    validate: impl FnOnce(&[u8]) -> Result<(), Error>,
) -> TransformOutcome {
    let name = plugin.display_name();
    let output = plugin
        .select_function(request.function)
        .and_then(|()| plugin.supply_selection(&request))
        .and_then(|()| plugin.supply_input(request.input))
        .and_then(|()| plugin.run())
        .and_then(|()| plugin.fetch_output())
        .and_then(|output| {
            if output.is_empty() {
                return Err(Error::new(ErrorKind::Protocol)
                    .with_message(format!("plugin {name} produced no output")));
            }
            validate(&output)?;
            Ok(output)
        });
    let output = match output {
        Ok(output) => output,
        Err(error) => {
            warn!(plugin = %name, error = %error, "transform rejected; keeping original input");
            return TransformOutcome::Fallback {
                input: request.input.to_vec(),
                error,
            };
        }
    };
    debug!(plugin = %name, bytes = output.len(), "transform applied");
    let backup = match (request.backup, request.source) {
        (true, Some(source)) => match write_backup(source, request.input) {
            Ok(path) => Some(path),
            Err(err) => {
                warn!(path = %source.display(), error = %err, "failed to write backup");
                None
            }
        },
        _ => None,
    };
    TransformOutcome::Applied { output, backup }
}

/// `<dir>/<stem>_backup_at_<YYYYmmdd_HHMMSS>.<ext>` next to `source`.
pub fn backup_path(source: &Path, at: OffsetDateTime) -> Result<PathBuf, Error> {
    let stamp = at
        .format(format_description!("[year][month][day]_[hour][minute][second]"))
        .map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to format backup timestamp")
                .with_source(err)
        })?;
    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .ok_or_else(|| {
            Error::new(ErrorKind::Usage)
                .with_message("backup source has no file name")
                .with_path(source)
        })?;
    let mut name = format!("{stem}_backup_at_{stamp}");
    if let Some(ext) = source.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    Ok(source.with_file_name(name))
}

fn write_backup(source: &Path, input: &[u8]) -> Result<PathBuf, Error> {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let path = backup_path(source, now)?;
    std::fs::write(&path, input).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to write backup")
            .with_path(&path)
            .with_source(err)
    })?;
    debug!(path = %path.display(), "wrote transform backup");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::backup_path;
    use std::path::Path;
    use time::macros::datetime;

    #[test]
    fn backup_name_keeps_directory_and_extension() {
        let at = datetime!(2024-03-09 07:05:01 UTC);
        let path = backup_path(Path::new("/models/miku.pmx"), at).expect("path");
        assert_eq!(path, Path::new("/models/miku_backup_at_20240309_070501.pmx"));
    }

    #[test]
    fn backup_name_without_extension() {
        let at = datetime!(2024-12-31 23:59:59 UTC);
        let path = backup_path(Path::new("motion"), at).expect("path");
        assert_eq!(path, Path::new("motion_backup_at_20241231_235959"));
    }
}
