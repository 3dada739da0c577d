use anyhow::{anyhow, Context};
use image::{imageops, RgbaImage};
use nokhwa::{
    pixel_format::RgbAFormat,
    utils::{CameraIndex, RequestedFormat, RequestedFormatType, Resolution},
    Camera,
};

use crate::config;

/// Something that produces video frames on demand.
pub trait FrameSource {
    /// Blocks until the next frame is available.
    fn read_frame(&mut self) -> anyhow::Result<RgbaImage>;
}

pub struct Webcam {
    camera: Camera,
    mirror: bool,
}

impl Webcam {
    pub fn open(config: &config::Camera) -> anyhow::Result<Self> {
        let index = CameraIndex::Index(config.index);
        let resolution = Resolution::new(config.width, config.height);

        let mut camera = Camera::new(
            index.clone(),
            RequestedFormat::new::<RgbAFormat>(RequestedFormatType::HighestResolution(resolution)),
        )
        .or_else(|e| {
            log::warn!(
                "camera {} can't deliver {}x{}: {e}, using its default format",
                config.index,
                config.width,
                config.height,
            );
            Camera::new(
                index,
                RequestedFormat::new::<RgbAFormat>(RequestedFormatType::None),
            )
        })
        .with_context(|| format!("failed to open camera {}", config.index))?;

        camera
            .open_stream()
            .context("failed to start camera stream")?;

        log::info!(
            "camera opened: {} ({}x{})",
            camera.info().human_name(),
            camera.resolution().width(),
            camera.resolution().height(),
        );

        Ok(Self {
            camera,
            mirror: config.mirror,
        })
    }
}

impl FrameSource for Webcam {
    fn read_frame(&mut self) -> anyhow::Result<RgbaImage> {
        let buffer = self.camera.frame()?;
        let resolution = buffer.resolution();
        let pixels = buffer.decode_image::<RgbAFormat>()?.into_raw();
        let mut frame = RgbaImage::from_raw(resolution.width(), resolution.height(), pixels)
            .ok_or_else(|| {
                anyhow!(
                    "camera delivered a truncated {}x{} frame",
                    resolution.width(),
                    resolution.height()
                )
            })?;

        if self.mirror {
            imageops::flip_horizontal_in_place(&mut frame);
        }
        Ok(frame)
    }
}

impl Drop for Webcam {
    fn drop(&mut self) {
        log::info!("releasing camera");
        if let Err(e) = self.camera.stop_stream() {
            log::warn!("failed to stop camera stream: {e}");
        }
    }
}
