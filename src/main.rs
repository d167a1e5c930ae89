//! Purpose: `emplug` CLI entry point for inspecting and exercising nanoem plugins.
//! Role: Binary crate root; parses args, builds the factory, emits JSON on stdout.
//! Invariants: Commands emit one JSON document on stdout on success.
//! Invariants: Errors are emitted as JSON on stderr unless stderr is a terminal.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
#![allow(clippy::result_large_err)]
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{
    Args, CommandFactory, Parser, Subcommand, ValueEnum, ValueHint,
    error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use tracing_subscriber::EnvFilter;

mod command_dispatch;
mod inspect_json;

use emplug::api::{
    Category, Error, ErrorKind, HostOptions, Language, PluginFactory, RenderBackend, to_exit_code,
};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Try `emplug --help`."));
            }
        },
    };

    let options = cli.host.resolve()?;
    let factory = PluginFactory::dynamic(options);
    command_dispatch::dispatch_command(cli.command, &factory)
        .map_err(add_plugin_hint)
        .map_err(add_io_hint)
        .map_err(add_internal_hint)
}

#[derive(Parser)]
#[command(
    name = "emplug",
    version,
    about = "Load, inspect and drive nanoem application plugins",
    long_about = r#"Load nanoem application plugins (decoders, encoders, effect compilers,
model and motion transforms), negotiate their ABI, and drive them from the shell.

Output is JSON on stdout. Errors are JSON on stderr when stderr is not a terminal."#,
    after_help = r#"EXAMPLES
  $ emplug list ./plugins
  $ emplug inspect ./plugins/plugin_ffmpeg.so --category decoder
  $ emplug decode ./plugins/plugin_ffmpeg.so song.wav --frames 4
  $ emplug run-model ./plugins/plugin_model.so miku.pmx --function 0 --output out.pmx

LOGGING
  RUST_LOG=debug emplug inspect ...   (default filter: warn)"#,
    arg_required_else_help = true
)]
struct Cli {
    #[command(flatten)]
    host: HostArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct HostArgs {
    #[arg(
        long,
        global = true,
        help = "Host options JSON file (flags below override its values)",
        value_hint = ValueHint::FilePath
    )]
    options: Option<PathBuf>,
    #[arg(long, global = true, value_enum, help = "Language forwarded to model/motion plugins")]
    language: Option<LanguageCli>,
    #[arg(long, global = true, value_enum, help = "Render backend used to pick the effect dialect")]
    backend: Option<BackendCli>,
    #[arg(long, global = true, help = "Disable effect optimization")]
    debug: bool,
    #[arg(long, global = true, help = "Frame rate forwarded to decoders before open")]
    frame_rate: Option<u32>,
    #[arg(long, global = true, help = "Encoder wait timeout in milliseconds")]
    wait_timeout_ms: Option<u64>,
}

impl HostArgs {
    fn resolve(&self) -> Result<HostOptions, Error> {
        let mut options = match &self.options {
            Some(path) => HostOptions::from_json_file(path)?,
            None => HostOptions::default(),
        };
        if let Some(language) = self.language {
            options = options.with_language(language.into());
        }
        if let Some(backend) = self.backend {
            options = options.with_render_backend(backend.into());
        }
        if self.debug {
            options = options.with_debug(true);
        }
        if let Some(frame_rate) = self.frame_rate {
            options = options.with_frame_rate(frame_rate);
        }
        if let Some(ms) = self.wait_timeout_ms {
            options = options.with_wait_timeout(Some(Duration::from_millis(ms)));
        }
        Ok(options)
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum LanguageCli {
    Japanese,
    English,
    ChineseSimplified,
    ChineseTraditional,
    Korean,
}

impl From<LanguageCli> for Language {
    fn from(value: LanguageCli) -> Self {
        match value {
            LanguageCli::Japanese => Language::Japanese,
            LanguageCli::English => Language::English,
            LanguageCli::ChineseSimplified => Language::ChineseSimplified,
            LanguageCli::ChineseTraditional => Language::ChineseTraditional,
            LanguageCli::Korean => Language::Korean,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum BackendCli {
    Metal,
    D3d11,
    Gles3,
    GlCore33,
    Other,
}

impl From<BackendCli> for RenderBackend {
    fn from(value: BackendCli) -> Self {
        match value {
            BackendCli::Metal => RenderBackend::Metal,
            BackendCli::D3d11 => RenderBackend::D3d11,
            BackendCli::Gles3 => RenderBackend::Gles3,
            BackendCli::GlCore33 => RenderBackend::GlCore33,
            BackendCli::Other => RenderBackend::Other,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum CategoryCli {
    Decoder,
    Encoder,
    EffectCompiler,
    ModelIo,
    MotionIo,
}

impl From<CategoryCli> for Category {
    fn from(value: CategoryCli) -> Self {
        match value {
            CategoryCli::Decoder => Category::Decoder,
            CategoryCli::Encoder => Category::Encoder,
            CategoryCli::EffectCompiler => Category::EffectCompiler,
            CategoryCli::ModelIo => Category::ModelIo,
            CategoryCli::MotionIo => Category::MotionIo,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum StreamCli {
    Audio,
    Video,
}

#[derive(Subcommand)]
enum Command {
    #[command(
        arg_required_else_help = true,
        about = "Describe one plugin library as JSON",
        long_about = r#"Load and create the plugin as the given category, then report its
ABI version, SHA-256 fingerprint and category details (extensions or functions)."#,
        after_help = r#"EXAMPLES
  $ emplug inspect ./plugins/plugin_ffmpeg.so --category decoder
  $ emplug inspect ./plugins/plugin_model.so --category model-io --language english"#
    )]
    Inspect {
        #[arg(help = "Plugin library path", value_hint = ValueHint::FilePath)]
        plugin: PathBuf,
        #[arg(long, value_enum, help = "Category to load the plugin as")]
        category: CategoryCli,
    },
    #[command(
        arg_required_else_help = true,
        about = "List plugin libraries in a directory",
        long_about = r#"Find shared libraries (.so, .dylib, .dll) in a directory and report which
plugin categories each one loads as. Libraries that load as nothing are listed with an empty set."#,
        after_help = r#"EXAMPLES
  $ emplug list ./plugins"#
    )]
    List {
        #[arg(help = "Directory to scan", value_hint = ValueHint::DirPath)]
        dir: PathBuf,
    },
    #[command(
        arg_required_else_help = true,
        about = "Decode frames through a decoder plugin",
        long_about = r#"Open a media file through a decoder plugin at the host frame rate and decode
the first N frames of one stream. Reports format values and byte counts, not frame contents."#,
        after_help = r#"EXAMPLES
  $ emplug decode ./plugins/plugin_ffmpeg.so song.wav --frames 8
  $ emplug decode ./plugins/plugin_ffmpeg.so clip.mp4 --stream video --frame-rate 30"#
    )]
    Decode {
        #[arg(help = "Decoder plugin path", value_hint = ValueHint::FilePath)]
        plugin: PathBuf,
        #[arg(help = "Media file to open", value_hint = ValueHint::FilePath)]
        input: PathBuf,
        #[arg(long, default_value_t = 1, help = "Number of frames to decode")]
        frames: u32,
        #[arg(long, value_enum, default_value = "audio", help = "Stream to decode")]
        stream: StreamCli,
    },
    #[command(
        arg_required_else_help = true,
        about = "Run a model transform plugin",
        long_about = r#"Send a model file through a model I/O plugin function. When the plugin fails or
its output does not look like a model of the same format, the input is kept and nothing is written."#,
        after_help = r#"EXAMPLES
  $ emplug run-model ./plugins/plugin_model.so miku.pmx --function 0 --output out.pmx
  $ emplug run-model ./plugins/plugin_model.so miku.pmx --function 1 --output miku.pmx --backup"#
    )]
    RunModel(TransformArgs),
    #[command(
        arg_required_else_help = true,
        about = "Run a motion transform plugin",
        long_about = r#"Send a motion file through a motion I/O plugin function, with the same
fallback and backup behavior as run-model."#,
        after_help = r#"EXAMPLES
  $ emplug run-motion ./plugins/plugin_motion.so dance.vmd --function 0 --output out.vmd"#
    )]
    RunMotion(TransformArgs),
    #[command(
        arg_required_else_help = true,
        about = "Generate shell completions",
        long_about = r#"Generate shell completion scripts.

Prints a completion script for the given shell to stdout."#,
        after_help = r#"EXAMPLES
  $ emplug completion bash > ~/.local/share/bash-completion/completions/emplug
  $ emplug completion zsh > ~/.zfunc/_emplug"#
    )]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct TransformArgs {
    #[arg(help = "Plugin library path", value_hint = ValueHint::FilePath)]
    plugin: PathBuf,
    #[arg(help = "Input file", value_hint = ValueHint::FilePath)]
    input: PathBuf,
    #[arg(long, default_value_t = 0, help = "Plugin function index")]
    function: usize,
    #[arg(long, help = "Where to write the transformed bytes", value_hint = ValueHint::FilePath)]
    output: PathBuf,
    #[arg(long, help = "Write a timestamped backup of the input next to it")]
    backup: bool,
}

fn read_file(path: &Path, label: &str) -> Result<Vec<u8>, Error> {
    std::fs::read(path).map_err(|err| {
        let kind = if err.kind() == io::ErrorKind::NotFound {
            ErrorKind::NotFound
        } else {
            ErrorKind::Io
        };
        Error::new(kind)
            .with_message(format!("failed to read {label}"))
            .with_path(path)
            .with_source(err)
    })
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), Error> {
    std::fs::write(path, bytes).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to write output")
            .with_path(path)
            .with_source(err)
    })
}

fn add_plugin_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::MissingSymbol => err.with_hint(
            "The library does not export this category's entry points. Try another --category.",
        ),
        ErrorKind::ReferReason if err.suggestion().is_none() => {
            err.with_hint("The plugin reported a failure without a recovery suggestion.")
        }
        _ => err,
    }
}

fn add_io_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::Io => err.with_hint("I/O error. Check the path, filesystem, and disk space."),
        ErrorKind::NotFound => err.with_hint("Check the path exists and is readable."),
        _ => err,
    }
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint(
        "Unexpected internal failure. Retry with RUST_LOG=debug and share command/context if it persists.",
    )
}

fn emit_json(value: Value) {
    let json = if io::stdout().is_terminal() {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err));
        return;
    }
    let json = serde_json::to_string(&error_json(err)).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
        ErrorKind::LibraryOpen => "failed to open plugin library".to_string(),
        ErrorKind::MissingSymbol => "plugin is missing required symbols".to_string(),
        ErrorKind::AbiMismatch => "plugin ABI is incompatible".to_string(),
        ErrorKind::Lifecycle => "plugin is not ready".to_string(),
        ErrorKind::NullObject => "plugin returned a null object".to_string(),
        ErrorKind::UnknownOption => "plugin does not recognize the option".to_string(),
        ErrorKind::ReferReason => "plugin reported a failure".to_string(),
        ErrorKind::UnknownStatus => "plugin returned an unknown status".to_string(),
        ErrorKind::Protocol => "plugin broke the call protocol".to_string(),
        ErrorKind::Timeout => "plugin did not finish in time".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

pub(crate) fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("domain".to_string(), json!(err.domain()));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(suggestion) = err.suggestion() {
        inner.insert("suggestion".to_string(), json!(suggestion));
    }
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(status) = err.status() {
        inner.insert("status".to_string(), json!(status));
    }
    if !err.missing_symbols().is_empty() {
        inner.insert("missing_symbols".to_string(), json!(err.missing_symbols()));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error) -> String {
    let mut lines = vec![format!("error: {}", error_message(err))];
    if let Some(suggestion) = err.suggestion() {
        lines.push(format!("suggestion: {suggestion}"));
    }
    if let Some(hint) = err.hint() {
        lines.push(format!("hint: {hint}"));
    }
    if let Some(path) = err.path() {
        lines.push(format!("path: {}", path.display()));
    }
    for symbol in err.missing_symbols() {
        lines.push(format!("missing: {symbol}"));
    }
    if let Some(cause) = error_causes(err).first() {
        lines.push(format!("caused by: {cause}"));
    }
    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}
