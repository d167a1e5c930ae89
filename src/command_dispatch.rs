//! Purpose: Hold top-level CLI command dispatch for `emplug`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Every proxy created here is torn down through the factory before returning.
//! Invariants: Transform fallbacks never write the output file.

use super::*;
use crate::inspect_json::{
    DecodeSummary, decode_json, descriptor_json, fingerprint, probe_json, transform_json,
    with_details,
};
use emplug::api::{
    AudioFormat, Decoder, EffectCompiler, Encoder, ModelIo, MotionIo, PluginDescriptor,
    PluginProxy, TransformOutcome, TransformRequest, VideoFormat, discover, transform_model,
    transform_motion,
};
use sha2::{Digest, Sha256};

pub(super) fn dispatch_command(
    command: Command,
    factory: &PluginFactory,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "emplug", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Inspect { plugin, category } => {
            let fingerprint = fingerprint(&read_file(&plugin, "plugin library")?);
            let value = match Category::from(category) {
                Category::Decoder => {
                    let mut decoder = factory.create_decoder(&plugin)?;
                    let details = decoder_details(&mut decoder);
                    finish(factory, &mut decoder, &fingerprint, details)?
                }
                Category::Encoder => {
                    let mut encoder = factory.create_encoder(&plugin)?;
                    let details = encoder_details(&mut encoder);
                    finish(factory, &mut encoder, &fingerprint, details)?
                }
                Category::EffectCompiler => {
                    let mut compiler = factory.create_effect_compiler(&plugin)?;
                    let details = effect_details(&mut compiler);
                    finish(factory, &mut compiler, &fingerprint, details)?
                }
                Category::ModelIo => {
                    let mut model = factory.create_model_io(&plugin)?;
                    let details = model_details(&mut model);
                    finish(factory, &mut model, &fingerprint, details)?
                }
                Category::MotionIo => {
                    let mut motion = factory.create_motion_io(&plugin)?;
                    let details = motion_details(&mut motion);
                    finish(factory, &mut motion, &fingerprint, details)?
                }
            };
            emit_json(value);
            Ok(RunOutcome::ok())
        }
        Command::List { dir } => {
            let plugins: Vec<Value> = discover(&dir)?
                .into_iter()
                .map(|path| {
                    let found = probe_all(factory, &path);
                    probe_json(&path.display().to_string(), &found)
                })
                .collect();
            emit_json(json!({ "dir": dir.display().to_string(), "plugins": plugins }));
            Ok(RunOutcome::ok())
        }
        Command::Decode {
            plugin,
            input,
            frames,
            stream,
        } => {
            let mut decoder = factory.create_decoder(&plugin)?;
            let result = decode_frames(factory, &mut decoder, &input, frames, stream);
            let descriptor = decoder
                .descriptor()
                .map(|descriptor| descriptor_json(&descriptor, None));
            factory.destroy(&mut decoder);
            let summary = result?;
            emit_json(decode_json(descriptor.unwrap_or(Value::Null), &summary));
            Ok(RunOutcome::ok())
        }
        Command::RunModel(args) => {
            let mut model = factory.create_model_io(&args.plugin)?;
            let result = run_transform(&mut model, &args, |plugin, request, validate| {
                transform_model(plugin, request, validate)
            });
            factory.destroy(&mut model);
            result
        }
        Command::RunMotion(args) => {
            let mut motion = factory.create_motion_io(&args.plugin)?;
            let result = run_transform(&mut motion, &args, |plugin, request, validate| {
                transform_motion(plugin, request, validate)
            });
            factory.destroy(&mut motion);
            result
        }
    }
}

fn finish<P: PluginProxy>(
    factory: &PluginFactory,
    proxy: &mut P,
    fingerprint: &str,
    details: Map<String, Value>,
) -> Result<Value, Error> {
    let descriptor = proxy.descriptor();
    factory.destroy(proxy);
    let descriptor = descriptor.ok_or_else(|| {
        Error::new(ErrorKind::Internal).with_message("created plugin has no descriptor")
    })?;
    Ok(with_details(
        descriptor_json(&descriptor, Some(fingerprint)),
        details,
    ))
}

fn insert_result<T: serde::Serialize>(
    map: &mut Map<String, Value>,
    key: &str,
    result: Result<T, Error>,
) {
    let value = match result {
        Ok(value) => json!(value),
        Err(err) => error_json(&err),
    };
    map.insert(key.to_string(), value);
}

fn decoder_details(decoder: &mut Decoder) -> Map<String, Value> {
    let mut map = Map::new();
    insert_result(&mut map, "audio_extensions", decoder.audio_extensions());
    insert_result(&mut map, "video_extensions", decoder.video_extensions());
    map
}

fn encoder_details(encoder: &mut Encoder) -> Map<String, Value> {
    let mut map = Map::new();
    insert_result(&mut map, "video_extensions", encoder.video_extensions());
    map.insert(
        "ui_window_layout".to_string(),
        json!(encoder.has_ui_window_layout()),
    );
    map
}

fn effect_details(compiler: &mut EffectCompiler) -> Map<String, Value> {
    let mut map = Map::new();
    insert_result(&mut map, "extensions", compiler.available_extensions());
    map
}

fn model_details(model: &mut ModelIo) -> Map<String, Value> {
    let mut map = Map::new();
    insert_result(&mut map, "display_name", model.name());
    insert_result(&mut map, "description", model.description());
    insert_result(&mut map, "version", model.plugin_version());
    insert_result(&mut map, "functions", model.functions());
    map.insert(
        "ui_window_layout".to_string(),
        json!(model.has_ui_window_layout()),
    );
    map
}

fn motion_details(motion: &mut MotionIo) -> Map<String, Value> {
    let mut map = Map::new();
    insert_result(&mut map, "display_name", motion.name());
    insert_result(&mut map, "description", motion.description());
    insert_result(&mut map, "version", motion.plugin_version());
    insert_result(&mut map, "functions", motion.functions());
    map.insert(
        "ui_window_layout".to_string(),
        json!(motion.has_ui_window_layout()),
    );
    map
}

fn probe_all(factory: &PluginFactory, path: &Path) -> Vec<(Category, String)> {
    let attempts: [(Category, Result<PluginDescriptor, Error>); 5] = [
        (Category::Decoder, factory.probe::<Decoder>(path)),
        (Category::Encoder, factory.probe::<Encoder>(path)),
        (
            Category::EffectCompiler,
            factory.probe::<EffectCompiler>(path),
        ),
        (Category::ModelIo, factory.probe::<ModelIo>(path)),
        (Category::MotionIo, factory.probe::<MotionIo>(path)),
    ];
    attempts
        .into_iter()
        .filter_map(|(category, result)| {
            result
                .ok()
                .map(|descriptor| (category, descriptor.version.to_string()))
        })
        .collect()
}

fn decode_frames(
    factory: &PluginFactory,
    decoder: &mut Decoder,
    input: &Path,
    frames: u32,
    stream: StreamCli,
) -> Result<DecodeSummary, Error> {
    let fps = factory.options().frame_rate;
    let opened = match stream {
        StreamCli::Audio => decoder.load_audio(input, fps)?,
        StreamCli::Video => decoder.load_video(input, fps)?,
    };
    if !opened {
        let err = decoder.last_error();
        let err = if err.message().is_none_or(str::is_empty) {
            err.with_message("decoder plugin could not open the input")
        } else {
            err
        };
        return Err(err.with_path(input));
    }

    let mut format = Map::new();
    match stream {
        StreamCli::Audio => {
            for (key, name) in [
                (AudioFormat::NumBits, "bits"),
                (AudioFormat::NumChannels, "channels"),
                (AudioFormat::Frequency, "frequency"),
            ] {
                insert_result(&mut format, name, decoder.audio_format_value(key));
            }
        }
        StreamCli::Video => {
            for (key, name) in [
                (VideoFormat::Width, "width"),
                (VideoFormat::Height, "height"),
                (VideoFormat::Stride, "stride"),
            ] {
                insert_result(&mut format, name, decoder.video_format_value(key));
            }
        }
    }
    let duration = decoder.duration().ok();

    let mut hasher = Sha256::new();
    let mut frame_sizes = Vec::new();
    let mut collect = |_: u32, bytes: &[u8]| {
        hasher.update(bytes);
        frame_sizes.push(bytes.len());
    };
    let decoded = match stream {
        StreamCli::Audio => decoder.decode_audio_frames(frames, &mut collect),
        StreamCli::Video => decoder.decode_video_frames(frames, &mut collect),
    };
    decoded.map_err(|err| err.with_path(input))?;
    decoder.close()?;

    let digest = hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<String>();
    Ok(DecodeSummary {
        opened,
        format,
        frame_sizes,
        digest: format!("sha256:{digest}"),
        duration,
    })
}

fn run_transform<P, F>(plugin: &mut P, args: &TransformArgs, run: F) -> Result<RunOutcome, Error>
where
    P: PluginProxy,
    F: FnOnce(
        &mut P,
        TransformRequest<'_>,
        &dyn Fn(&[u8]) -> Result<(), Error>,
    ) -> TransformOutcome,
{
    let input = read_file(&args.input, "input")?;
    let mut request = TransformRequest::new(args.function, &input);
    if args.backup {
        request = request.with_backup(&args.input);
    }
    let descriptor = plugin
        .descriptor()
        .map(|descriptor| descriptor_json(&descriptor, None))
        .unwrap_or(Value::Null);
    let expected_magic = known_magic(&input);
    let validate = |output: &[u8]| -> Result<(), Error> {
        match expected_magic {
            Some(magic) if !output.starts_with(magic) => Err(Error::new(ErrorKind::Protocol)
                .with_message("plugin output is not in the input's file format")),
            _ => Ok(()),
        }
    };
    let outcome = run(plugin, request, &validate);
    if let TransformOutcome::Applied { output, .. } = &outcome {
        write_file(&args.output, output)?;
    }
    let output_path = args.output.display().to_string();
    emit_json(transform_json(descriptor, &outcome, &output_path));
    match outcome {
        TransformOutcome::Applied { .. } => Ok(RunOutcome::ok()),
        TransformOutcome::Fallback { error, .. } => {
            Ok(RunOutcome::with_code(to_exit_code(error.kind())))
        }
    }
}

/// Leading magic of the model/motion formats the CLI can sanity-check.
fn known_magic(input: &[u8]) -> Option<&'static [u8]> {
    const MAGICS: [&[u8]; 4] = [b"PMX ", b"Pmd", b"Vocaloid Motion Data", b"NMD"];
    MAGICS.into_iter().find(|magic| input.starts_with(magic))
}
