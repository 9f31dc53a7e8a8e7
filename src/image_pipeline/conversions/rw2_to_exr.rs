use std::fs;
use std::path::Path;

use tracing::{info, instrument, warn};

use crate::image_pipeline::{
    common::error::{ConversionError, Result},
    conversions::FileConverter,
    exr::{ConversionConfig, ExrFileWriter, FloatImageEncoder, LinearImageBuffer},
    raw::{DecodeOptions, RawDecoder, RawLoaderDecoder},
};

pub struct Rw2ToExrPipeline<D: RawDecoder, E: FloatImageEncoder> {
    decoder: D,
    encoder: E,
    config: ConversionConfig,
    decode_options: DecodeOptions,
}

impl Rw2ToExrPipeline<RawLoaderDecoder, ExrFileWriter> {
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            decoder: RawLoaderDecoder,
            encoder: ExrFileWriter::new(config.compression),
            config,
            decode_options: DecodeOptions::linear16(),
        }
    }
}

impl Default for Rw2ToExrPipeline<RawLoaderDecoder, ExrFileWriter> {
    fn default() -> Self {
        Self::new(ConversionConfig::default())
    }
}

impl<D: RawDecoder, E: FloatImageEncoder> Rw2ToExrPipeline<D, E> {
    pub fn with_custom(decoder: D, encoder: E, config: ConversionConfig) -> Self {
        Self {
            decoder,
            encoder,
            config,
            decode_options: DecodeOptions::linear16(),
        }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Options passed to the decoder for every file.
    pub fn decode_options(&self) -> &DecodeOptions {
        &self.decode_options
    }

    fn remove_partial_output(&self, output: &Path) {
        if !self.config.remove_partial_output || !output.is_file() {
            return;
        }
        match fs::remove_file(output) {
            Ok(()) => info!(output = %output.display(), "Removed partial output"),
            Err(e) => warn!(output = %output.display(), "Could not remove partial output: {}", e),
        }
    }
}

/// Name used in error messages: the file name when there is one.
fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn ensure_parent_dir(output: &Path) -> std::io::Result<()> {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

impl<D: RawDecoder, E: FloatImageEncoder> FileConverter for Rw2ToExrPipeline<D, E> {
    #[instrument(skip(self, input, output))]
    fn convert_file(&self, input: &Path, output: &Path) -> Result<()> {
        let file = file_label(input);
        info!(
            input = %input.display(),
            output = %output.display(),
            "Converting file"
        );

        let decoded = {
            let _span = tracing::info_span!("decode_raw").entered();
            self.decoder
                .decode(input, &self.decode_options)
                .map_err(|e| ConversionError::DecodeFailed {
                    file: file.clone(),
                    reason: format!("{:#}", e),
                })?
        };

        if decoded.bits_per_sample != 16 {
            return Err(ConversionError::DecodeFailed {
                file,
                reason: format!(
                    "expected 16-bit samples, decoder produced {}-bit",
                    decoded.bits_per_sample
                ),
            });
        }

        let image = {
            let _span = tracing::info_span!(
                "normalize",
                width = decoded.width,
                height = decoded.height
            )
            .entered();
            LinearImageBuffer::from_rgb16(&decoded).map_err(|e| ConversionError::DecodeFailed {
                file: file.clone(),
                reason: format!("{:#}", e),
            })?
        };
        drop(decoded);

        {
            let _span = tracing::info_span!("prepare_output").entered();
            ensure_parent_dir(output).map_err(|e| ConversionError::OutputPathError {
                file: file.clone(),
                reason: format!("{}: {}", output.display(), e),
            })?;
        }

        let (width, height) = (image.width(), image.height());
        {
            let _span = tracing::info_span!("encode_exr").entered();
            if let Err(e) = self.encoder.write_exr(output, image) {
                self.remove_partial_output(output);
                return Err(ConversionError::EncodeFailed {
                    file,
                    reason: format!("{:#}", e),
                });
            }
        }

        info!(width, height, "Conversion complete");
        Ok(())
    }
}
