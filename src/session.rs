// SPDX-License-Identifier: GPL-3.0-only

//! Preview session wiring
//!
//! Owns everything one running preview needs: the GPU context, the shared
//! texture renderer, an offscreen surface, the capture thread and the state
//! shared with the UI (toggle, FPS). Front ends (terminal, headless,
//! snapshot) only call into this.

use crate::backends::camera::{CaptureLoopController, CaptureStats, open_source, spawn_capture};
use crate::config::Config;
use crate::errors::{AppError, AppResult, RenderError};
use crate::gpu::{self, GpuContext, GpuDeviceInfo};
use crate::media::pixel_codec;
use crate::pipelines::preview::{
    DisplaySink, FramePipeline, ProcessingToggle, SharedFps, TextureSink, ToggleState,
    toggle_processing,
};
use crate::processing::EngineKind;
use crate::shaders::{OffscreenTarget, SURFACE_FORMAT, TextureRenderer};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::{error, info, warn};

/// Upload target that survives renderer re-creation after device loss
struct RendererSlot(RwLock<Arc<TextureRenderer>>);

impl RendererSlot {
    fn get(&self) -> Option<Arc<TextureRenderer>> {
        self.0.read().ok().map(|r| Arc::clone(&r))
    }

    fn replace(&self, renderer: Arc<TextureRenderer>) {
        if let Ok(mut slot) = self.0.write() {
            *slot = renderer;
        }
    }
}

impl TextureSink for RendererSlot {
    fn upload_rgba(&self, rgba: &[u8], width: u32, height: u32) {
        if let Some(renderer) = self.get() {
            renderer.upload_rgba(rgba, width, height);
        }
    }
}

/// A rendered surface read back to the CPU
#[derive(Debug, Clone)]
pub struct SurfaceImage {
    pub width: u32,
    pub height: u32,
    /// Packed `0xAARRGGBB`, row-major
    pub pixels: Vec<u32>,
}

impl SurfaceImage {
    /// Pixel at `(x, y)`, clamped to the image
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        if self.width == 0 || self.height == 0 {
            return 0;
        }
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.pixels
            .get((y * self.width + x) as usize)
            .copied()
            .unwrap_or_default()
    }

    /// Convert to an `image` buffer for saving
    pub fn to_rgba_image(&self) -> AppResult<image::RgbaImage> {
        let bytes =
            pixel_codec::encode_to_upload_format(Some(&self.pixels), self.width, self.height)?;
        image::RgbaImage::from_raw(self.width, self.height, bytes)
            .ok_or_else(|| AppError::Other("Surface size does not match its pixels".into()))
    }
}

/// Directory snapshots go to (`~/Pictures/edge-preview`)
pub fn snapshot_dir() -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(crate::constants::APP_ID)
}

/// Timestamped snapshot file name
pub fn snapshot_file_name() -> String {
    format!("IMG_{}.png", chrono::Local::now().format("%Y%m%d_%H%M%S"))
}

fn setup_gpu(
    width: u32,
    height: u32,
    mirrored: bool,
) -> AppResult<(GpuContext, Arc<TextureRenderer>, OffscreenTarget)> {
    let ctx = gpu::create_device_blocking("edge-preview")?;
    let renderer = TextureRenderer::new(&ctx, SURFACE_FORMAT);
    if let Some(e) = renderer.program_error() {
        warn!(error = %e, "Preview surface will stay black");
    }
    renderer.set_mirrored(mirrored);
    renderer.resize(width, height);
    let target = OffscreenTarget::new(&ctx, width, height);
    Ok((ctx, Arc::new(renderer), target))
}

pub struct PreviewSession {
    ctx: GpuContext,
    renderer: Arc<RendererSlot>,
    target: OffscreenTarget,
    mirrored: bool,
    toggle: Arc<ProcessingToggle>,
    display: Arc<dyn DisplaySink>,
    fps: Arc<SharedFps>,
    stats: Arc<CaptureStats>,
    capture: CaptureLoopController,
    source_name: String,
    engine: EngineKind,
}

impl PreviewSession {
    /// Set up the GPU and start capturing according to `config`
    pub fn start(config: &Config, display: Arc<dyn DisplaySink>) -> AppResult<Self> {
        let (ctx, renderer, target) = setup_gpu(
            config.surface_width,
            config.surface_height,
            config.mirror_preview,
        )?;
        info!(gpu = %ctx.info, "Preview GPU ready");

        let source = open_source(&config.source, config.capture_width, config.capture_height)?;
        let source_name = source.name();

        let initial = if config.processing_enabled {
            ToggleState::Processed
        } else {
            ToggleState::Raw
        };
        let toggle = Arc::new(ProcessingToggle::new(initial));
        display.set_status(initial);

        let slot = Arc::new(RendererSlot(RwLock::new(renderer)));
        let pipeline = FramePipeline::new(
            config.engine.create(config.edge_threshold),
            Arc::clone(&toggle),
            slot.clone(),
            Arc::clone(&display),
        )
        .with_raw_display(config.raw_display);
        let fps = pipeline.shared_fps();

        let (capture, stats) = spawn_capture(source, pipeline, config.capture_fps)?;

        info!(
            source = %source_name,
            engine = %config.engine,
            fps = config.capture_fps,
            "Preview session started"
        );

        Ok(Self {
            ctx,
            renderer: slot,
            target,
            mirrored: config.mirror_preview,
            toggle,
            display,
            fps,
            stats,
            capture,
            source_name,
            engine: config.engine,
        })
    }

    pub fn gpu_info(&self) -> &GpuDeviceInfo {
        &self.ctx.info
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn engine(&self) -> EngineKind {
        self.engine
    }

    pub fn toggle_state(&self) -> ToggleState {
        self.toggle.state()
    }

    /// User action: flip between processed and raw display
    pub fn toggle_processing(&self) -> ToggleState {
        toggle_processing(&self.toggle, self.display.as_ref())
    }

    /// Last measured preview FPS (0 before the first window closes)
    pub fn fps(&self) -> f32 {
        self.fps.get()
    }

    pub fn capture_stats(&self) -> &CaptureStats {
        &self.stats
    }

    /// Whether any frame has reached the texture yet
    pub fn has_frame(&self) -> bool {
        self.renderer
            .get()
            .is_some_and(|r| r.texture_size().is_some())
    }

    pub fn surface_size(&self) -> (u32, u32) {
        self.target.size()
    }

    /// Surface geometry changed
    pub fn resize_surface(&mut self, width: u32, height: u32) {
        if self.target.resize(width, height)
            && let Some(renderer) = self.renderer.get()
        {
            renderer.resize(width, height);
        }
    }

    /// Draw the latest frame onto the offscreen surface
    pub fn render(&mut self) -> AppResult<()> {
        if self.ctx.is_lost() {
            self.recover()?;
        }
        let renderer = self
            .renderer
            .get()
            .ok_or_else(|| AppError::Other("Renderer unavailable".into()))?;
        renderer.draw(self.target.view());
        Ok(())
    }

    /// Draw and read the surface back
    pub fn render_and_read(&mut self) -> AppResult<SurfaceImage> {
        self.render()?;
        let (width, height) = self.target.size();
        let rgba = self.target.read_rgba_blocking()?;
        Ok(SurfaceImage {
            width,
            height,
            pixels: pixel_codec::decode_upload_format(&rgba),
        })
    }

    /// Rebuild every GPU handle after the device was lost
    fn recover(&mut self) -> AppResult<()> {
        error!("GPU device lost, recreating renderer");
        let (width, height) = self.target.size();
        let (ctx, renderer, target) = setup_gpu(width, height, self.mirrored).map_err(|e| {
            error!(error = %e, "GPU recovery failed");
            AppError::Render(RenderError::DeviceLost)
        })?;
        self.renderer.replace(renderer);
        self.ctx = ctx;
        self.target = target;
        Ok(())
    }

    /// Stop the capture thread
    pub fn stop(&mut self) {
        self.capture.stop();
        info!(
            delivered = self.stats.delivered(),
            dropped = self.stats.dropped(),
            failed = self.stats.failed(),
            last_pass_us = self.stats.last_pass().as_micros() as u64,
            "Preview session stopped"
        );
    }
}

impl Drop for PreviewSession {
    fn drop(&mut self) {
        if self.capture.is_running() {
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_image_pixel_clamps() {
        let image = SurfaceImage {
            width: 2,
            height: 1,
            pixels: vec![0xFF11_2233, 0xFF44_5566],
        };
        assert_eq!(image.pixel(0, 0), 0xFF11_2233);
        assert_eq!(image.pixel(9, 9), 0xFF44_5566);
    }

    #[test]
    fn test_snapshot_file_name() {
        let name = snapshot_file_name();
        assert!(name.starts_with("IMG_"));
        assert!(name.ends_with(".png"));
    }

    #[test]
    fn test_surface_image_to_rgba() {
        let image = SurfaceImage {
            width: 1,
            height: 1,
            pixels: vec![0xFF10_2030],
        };
        let rgba = image.to_rgba_image().unwrap();
        assert_eq!(rgba.get_pixel(0, 0).0, [0x10, 0x20, 0x30, 0xFF]);
    }
}
