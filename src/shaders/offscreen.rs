// SPDX-License-Identifier: GPL-3.0-only

//! Offscreen render target
//!
//! Stands in for a window surface: the renderer draws into an RGBA texture
//! which can be read back for the terminal viewer and snapshots.

use super::gpu_processor::{
    CachedDimensions, padded_bytes_per_row, read_buffer_async, strip_row_padding,
};
use crate::errors::RenderError;
use crate::gpu::{GpuContext, wgpu};
use tracing::debug;

/// Color format of the offscreen surface
pub const SURFACE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

const BYTES_PER_PIXEL: u32 = 4;

pub struct OffscreenTarget {
    ctx: GpuContext,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    readback: wgpu::Buffer,
    dims: CachedDimensions,
}

impl OffscreenTarget {
    pub fn new(ctx: &GpuContext, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let (texture, view, readback) = create_resources(ctx, width, height);
        Self {
            ctx: ctx.clone(),
            texture,
            view,
            readback,
            dims: CachedDimensions::new(width, height),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.dims.width, self.dims.height)
    }

    /// View to pass to the renderer's draw
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Reallocate for a new size; returns `true` if anything changed
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 || !self.dims.needs_update(width, height) {
            return false;
        }
        debug!(width, height, "Resizing offscreen target");
        let (texture, view, readback) = create_resources(&self.ctx, width, height);
        self.texture = texture;
        self.view = view;
        self.readback = readback;
        self.dims.update(width, height);
        true
    }

    /// Copy the rendered image back as tightly packed RGBA bytes
    pub async fn read_rgba(&self) -> Result<Vec<u8>, RenderError> {
        let CachedDimensions { width, height } = self.dims;
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("offscreen readback"),
            });

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row(width, BYTES_PER_PIXEL)),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.ctx.queue.submit(std::iter::once(encoder.finish()));

        let padded = read_buffer_async(&self.ctx.device, &self.readback).await?;
        Ok(strip_row_padding(&padded, width, height, BYTES_PER_PIXEL))
    }

    /// Blocking wrapper around [`read_rgba`](Self::read_rgba)
    pub fn read_rgba_blocking(&self) -> Result<Vec<u8>, RenderError> {
        pollster::block_on(self.read_rgba())
    }
}

fn create_resources(
    ctx: &GpuContext,
    width: u32,
    height: u32,
) -> (wgpu::Texture, wgpu::TextureView, wgpu::Buffer) {
    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("offscreen surface"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: SURFACE_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let readback = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("offscreen readback buffer"),
        size: padded_bytes_per_row(width, BYTES_PER_PIXEL) as u64 * height as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    (texture, view, readback)
}
