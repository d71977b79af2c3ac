//! File persistence for captured frames
//!
//! Frames are encoded with the `image` crate and written as
//! `<dir>/<base><NNNN>.<ext>` with a four-digit counter that wraps at
//! 10000. Names are claimed with create-new semantics so an existing file
//! is never overwritten; the counter simply advances past it.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::Context;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};

use crate::config::CaptureConfig;
use crate::frame::RasterFrame;
use crate::transfer::FrameSink;

/// On-disk image format for saved frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FileFormat {
    #[default]
    Png,
    Jpeg,
    Bmp,
    Tiff,
}

impl FileFormat {
    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Png => "png",
            FileFormat::Jpeg => "jpg",
            FileFormat::Bmp => "bmp",
            FileFormat::Tiff => "tiff",
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            FileFormat::Png => ImageFormat::Png,
            FileFormat::Jpeg => ImageFormat::Jpeg,
            FileFormat::Bmp => ImageFormat::Bmp,
            FileFormat::Tiff => ImageFormat::Tiff,
        }
    }
}

/// Counter-named file sink for raster frames.
pub struct FileSink {
    dir: PathBuf,
    base_name: String,
    counter: u32,
    format: FileFormat,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>, base_name: &str, counter: u32, format: FileFormat) -> Self {
        Self {
            dir: dir.into(),
            base_name: base_name.to_owned(),
            counter: counter % 10_000,
            format,
        }
    }

    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::new(
            config.save_dir.clone(),
            &config.base_name,
            config.counter,
            config.format,
        )
    }

    /// Next file number the sink will try.
    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the advanced counter back into a config so it can be
    /// persisted across runs.
    pub fn update_config(&self, config: &mut CaptureConfig) {
        config.counter = self.counter;
    }

    /// Claim the next free counter-named path. After one full counter wrap
    /// without a free name this gives up instead of spinning.
    fn create_next(&mut self) -> anyhow::Result<(File, PathBuf)> {
        for _ in 0..10_000 {
            let name = format!(
                "{}{:04}.{}",
                self.base_name,
                self.counter,
                self.format.extension()
            );
            let path = self.dir.join(name);
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(file) => {
                    self.counter = (self.counter + 1) % 10_000;
                    return Ok((file, path));
                }
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                    self.counter = (self.counter + 1) % 10_000;
                }
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("failed to create {}", path.display()));
                }
            }
        }
        anyhow::bail!(
            "no free file name in {} for base '{}'",
            self.dir.display(),
            self.base_name
        )
    }
}

impl FrameSink for FileSink {
    fn store(&mut self, frame: RasterFrame) -> anyhow::Result<()> {
        let rgba = frame.to_rgba()?;
        let (file, path) = self.create_next()?;
        let mut writer = BufWriter::new(file);
        let result = match self.format {
            // the JPEG encoder has no alpha channel
            FileFormat::Jpeg => DynamicImage::ImageRgba8(rgba)
                .to_rgb8()
                .write_to(&mut writer, ImageFormat::Jpeg),
            other => DynamicImage::ImageRgba8(rgba).write_to(&mut writer, other.image_format()),
        };
        result.with_context(|| format!("failed to encode {}", path.display()))?;
        log::info!("saved frame to {}", path.display());
        Ok(())
    }
}
