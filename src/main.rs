use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use rw2exr_rs::image_pipeline::{ConversionConfig, ExrCompression, FailurePolicy};
use rw2exr_rs::job::{self, ConversionMode, JobEvent};
use rw2exr_rs::logger::{self, error, info};

const USAGE: &str = "\
Usage: rw2exr [OPTIONS] INPUT

Converts Panasonic RW2 files to linear 32-bit float OpenEXR.

Options:
  -b, --batch              INPUT is a directory; convert every .rw2 file in it
  -o, --output PATH        Output file or directory (defaults to next to the input)
  -c, --compression NAME   none, rle, zip1, zip (default) or piz
      --continue-on-error  Keep converting after a file fails (batch mode)
      --keep-partial       Leave a partially written output file after a failure
  -h, --help               Print this help";

struct CliOptions {
    input: String,
    output: Option<String>,
    mode: ConversionMode,
    config: ConversionConfig,
}

/// `Ok(None)` means help was requested.
fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Option<CliOptions>> {
    let mut args = args.into_iter();
    let mut input = None;
    let mut output = None;
    let mut mode = ConversionMode::Single;
    let mut builder = ConversionConfig::builder();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "-b" | "--batch" => mode = ConversionMode::Batch,
            "-o" | "--output" => {
                output = Some(args.next().context("--output needs a path")?);
            }
            "-c" | "--compression" => {
                let name = args.next().context("--compression needs a value")?;
                let compression = ExrCompression::from_name(&name)
                    .with_context(|| format!("unknown compression '{}'", name))?;
                builder = builder.compression(compression);
            }
            "--continue-on-error" => builder = builder.failure_policy(FailurePolicy::ContinueOnError),
            "--keep-partial" => builder = builder.remove_partial_output(false),
            flag if flag.starts_with('-') && flag.len() > 1 => bail!("unknown option '{}'", flag),
            _ if input.is_none() => input = Some(arg),
            _ => bail!("unexpected argument '{}'", arg),
        }
    }

    let Some(input) = input else {
        bail!("missing INPUT");
    };

    Ok(Some(CliOptions {
        input,
        output,
        mode,
        config: builder.build(),
    }))
}

fn run() -> Result<bool> {
    let Some(options) = parse_args(std::env::args().skip(1))? else {
        println!("{}", USAGE);
        return Ok(true);
    };

    info!(
        input = %options.input,
        output = ?options.output,
        mode = ?options.mode,
        compression = ?options.config.compression,
        "Starting rw2exr"
    );

    let mut handle = job::start_with_config(
        &options.input,
        options.output.as_deref(),
        options.mode,
        options.config,
    )
    .context("failed to start conversion job")?;

    let mut succeeded = false;
    for event in handle.events() {
        match event {
            JobEvent::Progress(progress) => println!("[{:>3}%] {}", progress.percent, progress.message),
            JobEvent::Completed(done) => {
                println!("{}", done.message);
                succeeded = done.succeeded;
            }
        }
    }

    Ok(succeeded)
}

fn main() -> ExitCode {
    logger::init();

    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("{}", USAGE);
            ExitCode::from(2)
        }
    }
}
