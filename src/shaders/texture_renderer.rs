// SPDX-License-Identifier: GPL-3.0-only

//! Preview texture renderer
//!
//! Draws the latest frame as a textured quad. Uploads come from the capture
//! thread and draws from the render thread; the texture slot is the only
//! state both touch and sits behind a mutex, so a draw always sees either
//! the previous or the new texture, never a partial replacement.
//!
//! If the shader or pipeline fails validation the renderer keeps running
//! with an invalid program: draws only clear the target.
//!
//! Frames wider or taller than the device texture limit are refused and the
//! previous texture stays on screen.

use super::projection::{self, Mat4};
use crate::errors::{FrameError, RenderError};
use crate::gpu::wgpu::util::DeviceExt;
use crate::gpu::{GpuContext, wgpu};
use crate::media::pixel_codec::{self, UPLOAD_BYTES_PER_PIXEL};
use crate::pipelines::preview::TextureSink;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// WGSL source of the quad program
pub const SHADER_SOURCE: &str = include_str!("texture_quad.wgsl");

/// Vertex attribute locations
pub const ATTRIB_POSITION: u32 = 0;
pub const ATTRIB_TEX_COORD: u32 = 1;

/// Bind group indices and bindings
pub const UNIFORM_GROUP: u32 = 0;
pub const UNIFORM_MVP_BINDING: u32 = 0;
pub const TEXTURE_GROUP: u32 = 1;
pub const TEXTURE_BINDING: u32 = 0;
pub const SAMPLER_BINDING: u32 = 1;

/// Texture format of uploaded frames
pub const FRAME_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Quad corners as a triangle strip
pub const QUAD_POSITIONS: [[f32; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [-1.0, 1.0], [1.0, 1.0]];

/// Texture coordinates per corner, V flipped so row 0 of the frame is on top
pub const QUAD_TEX_COORDS: [[f32; 2]; 4] = [[0.0, 1.0], [1.0, 1.0], [0.0, 0.0], [1.0, 0.0]];

/// Projection state, recomputed on resize
#[derive(Debug, Clone, Copy, PartialEq)]
struct ViewState {
    width: u32,
    height: u32,
    aspect: f32,
    mirrored: bool,
    mvp: Mat4,
}

struct FrameTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    width: u32,
    height: u32,
}

/// Compiled quad pipeline
struct Program {
    pipeline: wgpu::RenderPipeline,
}

pub struct TextureRenderer {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    program: Result<Program, RenderError>,
    max_dimension: u32,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    position_buffer: wgpu::Buffer,
    tex_coord_buffer: wgpu::Buffer,
    view: Mutex<ViewState>,
    texture: Mutex<Option<FrameTexture>>,
}

impl TextureRenderer {
    /// Set up the quad program for targets of `target_format`
    pub fn new(ctx: &GpuContext, target_format: wgpu::TextureFormat) -> Self {
        Self::with_shader(ctx, target_format, SHADER_SOURCE)
    }

    /// Set up with a custom WGSL program exposing `vs_main` and `fs_main`
    pub fn with_shader(
        ctx: &GpuContext,
        target_format: wgpu::TextureFormat,
        shader_source: &str,
    ) -> Self {
        let device = &ctx.device;

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("preview uniform layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: UNIFORM_MVP_BINDING,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("preview texture layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: TEXTURE_BINDING,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: SAMPLER_BINDING,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let view = ViewState {
            width: 1,
            height: 1,
            aspect: 1.0,
            mirrored: true,
            mvp: projection::preview_mvp(1.0, true),
        };

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("preview mvp"),
            contents: bytemuck::cast_slice(&view.mvp),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("preview uniform bind group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: UNIFORM_MVP_BINDING,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let position_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("preview quad positions"),
            contents: bytemuck::cast_slice(&QUAD_POSITIONS),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let tex_coord_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("preview quad tex coords"),
            contents: bytemuck::cast_slice(&QUAD_TEX_COORDS),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("preview sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let program = build_program(
            device,
            &[&uniform_layout, &texture_layout],
            target_format,
            shader_source,
        );

        Self {
            device: Arc::clone(&ctx.device),
            queue: Arc::clone(&ctx.queue),
            program,
            max_dimension: ctx.device.limits().max_texture_dimension_2d,
            uniform_buffer,
            uniform_bind_group,
            texture_layout,
            sampler,
            position_buffer,
            tex_coord_buffer,
            view: Mutex::new(view),
            texture: Mutex::new(None),
        }
    }

    /// Whether the program compiled and linked
    pub fn is_program_valid(&self) -> bool {
        self.program.is_ok()
    }

    /// Why the program failed to build, if it did
    pub fn program_error(&self) -> Option<&RenderError> {
        self.program.as_ref().err()
    }

    /// Largest texture side the device accepts
    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Recompute the projection for a `width`x`height` surface.
    ///
    /// Zero dimensions are ignored and the previous matrix kept.
    pub fn resize(&self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            debug!(width, height, "Ignoring resize to empty surface");
            return;
        }
        let Ok(mut view) = self.view.lock() else {
            warn!("View state lock poisoned, skipping resize");
            return;
        };
        if view.width == width && view.height == height {
            return;
        }
        let aspect = width as f32 / height as f32;
        *view = ViewState {
            width,
            height,
            aspect,
            mirrored: view.mirrored,
            mvp: projection::preview_mvp(aspect, view.mirrored),
        };
        debug!(width, height, aspect, "Preview projection updated");
    }

    /// Mirror the preview horizontally (selfie orientation)
    pub fn set_mirrored(&self, mirrored: bool) {
        if let Ok(mut view) = self.view.lock() {
            view.mirrored = mirrored;
            view.mvp = projection::preview_mvp(view.aspect, mirrored);
        }
    }

    /// Current surface aspect ratio
    pub fn aspect(&self) -> f32 {
        self.view.lock().map(|v| v.aspect).unwrap_or(1.0)
    }

    /// Current model-view-projection matrix
    pub fn mvp(&self) -> Mat4 {
        self.view
            .lock()
            .map(|v| v.mvp)
            .unwrap_or(projection::IDENTITY)
    }

    /// Dimensions of the current frame texture
    pub fn texture_size(&self) -> Option<(u32, u32)> {
        self.texture
            .lock()
            .ok()
            .and_then(|slot| (*slot).as_ref().map(|t| (t.width, t.height)))
    }

    /// Encode packed pixels and replace the frame texture.
    ///
    /// Invalid input leaves the current texture untouched.
    pub fn update_texture(
        &self,
        pixels: Option<&[u32]>,
        width: u32,
        height: u32,
    ) -> Result<(), FrameError> {
        self.check_limit(width, height)?;
        let rgba = pixel_codec::encode_to_upload_format(pixels, width, height)
            .inspect_err(|e| debug!(error = %e, "Ignoring texture update"))?;
        self.write_frame(&rgba, width, height);
        Ok(())
    }

    fn check_limit(&self, width: u32, height: u32) -> Result<(), FrameError> {
        if width > self.max_dimension || height > self.max_dimension {
            return Err(FrameError::TooLarge {
                width,
                height,
                max: self.max_dimension,
            });
        }
        Ok(())
    }

    fn write_frame(&self, rgba: &[u8], width: u32, height: u32) {
        if let Err(e) = self.check_limit(width, height) {
            warn!(error = %e, "Dropping frame");
            return;
        }

        let expected = width as usize * height as usize * UPLOAD_BYTES_PER_PIXEL;
        if width == 0 || height == 0 || rgba.len() != expected {
            debug!(
                width,
                height,
                len = rgba.len(),
                "Ignoring upload with mismatched size"
            );
            return;
        }

        let Ok(mut slot) = self.texture.lock() else {
            warn!("Texture lock poisoned, dropping frame");
            return;
        };

        let needs_new_texture = (*slot)
            .as_ref()
            .is_none_or(|t| t.width != width || t.height != height);
        if needs_new_texture {
            debug!(width, height, "Creating preview texture");
            *slot = Some(self.create_frame_texture(width, height));
        }

        if let Some(frame) = &*slot {
            self.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &frame.texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                rgba,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * width),
                    rows_per_image: Some(height),
                },
                wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
            );
        }
    }

    fn create_frame_texture(&self, width: u32, height: u32) -> FrameTexture {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("preview frame texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FRAME_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("preview texture bind group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: TEXTURE_BINDING,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: SAMPLER_BINDING,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        FrameTexture {
            texture,
            bind_group,
            width,
            height,
        }
    }

    /// Clear `target` to black and draw the current frame on it
    pub fn draw(&self, target: &wgpu::TextureView) {
        let mvp = self.mvp();
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&mvp));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("preview draw"),
            });

        {
            let slot = self.texture.lock().ok();
            let frame = slot.as_deref().and_then(Option::as_ref);

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("preview pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let (Ok(program), Some(frame)) = (&self.program, frame) {
                pass.set_pipeline(&program.pipeline);
                pass.set_bind_group(UNIFORM_GROUP, &self.uniform_bind_group, &[]);
                pass.set_bind_group(TEXTURE_GROUP, &frame.bind_group, &[]);
                pass.set_vertex_buffer(0, self.position_buffer.slice(..));
                pass.set_vertex_buffer(1, self.tex_coord_buffer.slice(..));
                pass.draw(0..QUAD_POSITIONS.len() as u32, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

impl TextureSink for TextureRenderer {
    fn upload_rgba(&self, rgba: &[u8], width: u32, height: u32) {
        self.write_frame(rgba, width, height);
    }
}

/// Compile and link the quad program, capturing validation errors
fn build_program(
    device: &wgpu::Device,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
    target_format: wgpu::TextureFormat,
    shader_source: &str,
) -> Result<Program, RenderError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("preview quad shader"),
        source: wgpu::ShaderSource::Wgsl(shader_source.into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("preview pipeline layout"),
        bind_group_layouts,
        push_constant_ranges: &[],
    });

    let vertex_buffers = [
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x2,
                offset: 0,
                shader_location: ATTRIB_POSITION,
            }],
        },
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x2,
                offset: 0,
                shader_location: ATTRIB_TEX_COORD,
            }],
        },
    ];

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("preview pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &vertex_buffers,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: target_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });

    match pollster::block_on(device.pop_error_scope()) {
        None => {
            info!(format = ?target_format, "Preview program ready");
            Ok(Program { pipeline })
        }
        Some(e) => {
            error!(error = %e, "Preview program failed to build, output will be blank");
            Err(RenderError::ProgramInvalid(e.to_string()))
        }
    }
}
