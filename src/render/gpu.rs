//! wgpu backend for the grid: device setup, texture uploads, the immediate
//! mode [`Painter`] and the pass that replays what it recorded.

use std::ops::Range;
use std::sync::Arc;

use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};
use lyon::math::{Angle, Box2D, Transform, point};
use lyon::path::builder::BorderRadii;
use lyon::path::{Path, Winding};
use lyon::tessellation::{BuffersBuilder, FillOptions, FillTessellator, FillVertex, VertexBuffers};
use tracing::{debug, info, warn};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::paint::{BlendMode, Color, Painter, Quad, TextureFactory};
use crate::pixbuf::PixelBuffer;

/// `src * min(src_alpha, 1 - dst_alpha) + dst` on both channels.
const SATURATE: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlphaSaturated,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlphaSaturated,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

/// Tessellation tolerance for rounded rects with smoothing on and off.
const SMOOTH_TOLERANCE: f32 = 0.05;
const COARSE_TOLERANCE: f32 = 0.5;

/// Samples per pixel for frames containing smoothed geometry.
const MSAA_SAMPLES: u32 = 4;

/// Device, queue and the configured window surface. Created once by the
/// viewer and handed by reference to everything that talks to the GPU.
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub surface: wgpu::Surface<'static>,
    pub config: wgpu::SurfaceConfiguration,
    /// 1 when the surface format cannot be multisampled.
    pub sample_count: u32,
    msaa: Option<wgpu::TextureView>,
}

impl GpuContext {
    pub fn new(window: Arc<Window>) -> Result<Self> {
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window.clone())
            .context("failed to create surface")?;
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("failed to acquire GPU adapter")?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(wgpu::TextureFormat::is_srgb)
            .or_else(|| caps.formats.first().copied())
            .context("surface reports no texture formats")?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("grid-device"),
            required_features: wgpu::Features::empty(),
            required_limits: adapter.limits(),
            memory_hints: wgpu::MemoryHints::default(),
            trace: wgpu::Trace::default(),
            ..Default::default()
        }))
        .context("failed to acquire GPU device")?;

        let size = window.inner_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let sample_count = msaa_sample_count(adapter.get_texture_format_features(format).flags);
        if sample_count == 1 {
            warn!(format = ?format, "surface format cannot be multisampled; edges stay aliased");
        }
        let msaa = create_msaa_view(&device, &config, sample_count);
        info!(
            width = config.width,
            height = config.height,
            format = ?config.format,
            sample_count,
            "grid surface configured",
        );

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            surface,
            config,
            sample_count,
            msaa,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.msaa = create_msaa_view(&self.device, &self.config, self.sample_count);
        debug!(
            width = self.config.width,
            height = self.config.height,
            "grid surface resized"
        );
    }
}

fn msaa_sample_count(flags: wgpu::TextureFormatFeatureFlags) -> u32 {
    if flags.sample_count_supported(MSAA_SAMPLES) {
        MSAA_SAMPLES
    } else {
        1
    }
}

fn create_msaa_view(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    sample_count: u32,
) -> Option<wgpu::TextureView> {
    (sample_count > 1).then(|| {
        device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("grid-msaa"),
                size: wgpu::Extent3d {
                    width: config.width,
                    height: config.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count,
                dimension: wgpu::TextureDimension::D2,
                format: config.format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default())
    })
}

/// A cell texture, bound and ready to draw.
#[derive(Clone)]
pub struct GpuTexture {
    bind_group: Arc<wgpu::BindGroup>,
}

/// Uploads cell textures. Cloned into the loader thread.
#[derive(Clone)]
pub struct GpuTextureFactory {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    layout: Arc<wgpu::BindGroupLayout>,
    sampler: Arc<wgpu::Sampler>,
}

impl GpuTextureFactory {
    fn upload(&self, width: u32, height: u32, pixels: &[u8]) -> GpuTexture {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("cell"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            texture.as_image_copy(),
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("cell-bind"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });
        GpuTexture {
            bind_group: Arc::new(bind_group),
        }
    }
}

impl TextureFactory for GpuTextureFactory {
    type Texture = GpuTexture;

    fn create_texture(&self, pixels: &PixelBuffer) -> GpuTexture {
        self.upload(pixels.width(), pixels.height(), pixels.pixels())
    }
}

/// GL style matrix stack: every transform applies before the current one.
#[derive(Debug, Clone, Default)]
pub struct MatrixStack {
    current: Transform,
    saved: Vec<Transform>,
}

impl MatrixStack {
    pub fn push(&mut self) {
        self.saved.push(self.current);
    }

    /// Restore the last pushed matrix. Unbalanced pops are ignored.
    pub fn pop(&mut self) {
        if let Some(t) = self.saved.pop() {
            self.current = t;
        }
    }

    pub fn translate(&mut self, x: f32, y: f32) {
        self.current = Transform::translation(x, y).then(&self.current);
    }

    pub fn scale(&mut self, x: f32, y: f32) {
        self.current = Transform::scale(x, y).then(&self.current);
    }

    pub fn rotate(&mut self, degrees: f32) {
        self.current = Transform::rotation(Angle::degrees(degrees)).then(&self.current);
    }

    pub fn apply(&self, x: f32, y: f32) -> [f32; 2] {
        self.current.transform_point(point(x, y)).to_array()
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }
}

/// Triangle list covering a rounded rectangle.
pub fn rounded_rect_triangles(
    tessellator: &mut FillTessellator,
    quad: Quad,
    radius: f32,
    tolerance: f32,
) -> Vec<[f32; 2]> {
    let mut builder = Path::builder();
    builder.add_rounded_rectangle(
        &Box2D::new(point(quad.x1, quad.y1), point(quad.x2, quad.y2)),
        &BorderRadii::new(radius.max(0.0)),
        Winding::Positive,
    );
    let path = builder.build();

    let mut buffers: VertexBuffers<[f32; 2], u32> = VertexBuffers::new();
    let result = tessellator.tessellate_path(
        &path,
        &FillOptions::tolerance(tolerance),
        &mut BuffersBuilder::new(&mut buffers, |v: FillVertex| v.position().to_array()),
    );
    if let Err(err) = result {
        warn!(error = ?err, "rounded rect tessellation failed");
        return Vec::new();
    }
    buffers
        .indices
        .iter()
        .filter_map(|&i| buffers.vertices.get(i as usize).copied())
        .collect()
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct Vertex {
    pos: [f32; 2],
    uv: [f32; 2],
    color: [f32; 4],
}

struct Batch {
    texture: Arc<wgpu::BindGroup>,
    blend: BlendMode,
    vertices: Range<u32>,
}

/// Records one frame of draw calls as triangles in clip space, batched by
/// texture and blend mode. Replayed by [`GridRenderer::render`].
pub struct WgpuPainter {
    viewport: (f32, f32),
    matrix: MatrixStack,
    color: Color,
    blend: BlendMode,
    smoothing: bool,
    /// Set once anything is drawn with smoothing on; the frame is then multisampled.
    antialias: bool,
    white: Arc<wgpu::BindGroup>,
    tessellator: FillTessellator,
    vertices: Vec<Vertex>,
    batches: Vec<Batch>,
}

impl WgpuPainter {
    fn to_clip(&self, x: f32, y: f32) -> [f32; 2] {
        let [px, py] = self.matrix.apply(x, y);
        [
            px / self.viewport.0 * 2.0 - 1.0,
            1.0 - py / self.viewport.1 * 2.0,
        ]
    }

    fn emit(&mut self, texture: &Arc<wgpu::BindGroup>, points: &[([f32; 2], [f32; 2])]) {
        if points.is_empty() {
            return;
        }
        let start = self.vertices.len() as u32;
        let color = self.color.to_array();
        for &([x, y], uv) in points {
            let pos = self.to_clip(x, y);
            self.vertices.push(Vertex { pos, uv, color });
        }
        let end = self.vertices.len() as u32;
        self.antialias |= self.smoothing;

        if let Some(last) = self.batches.last_mut() {
            if last.blend == self.blend
                && last.vertices.end == start
                && Arc::ptr_eq(&last.texture, texture)
            {
                last.vertices.end = end;
                return;
            }
        }
        self.batches.push(Batch {
            texture: Arc::clone(texture),
            blend: self.blend,
            vertices: start..end,
        });
    }

    fn quad_points(quad: Quad) -> [([f32; 2], [f32; 2]); 6] {
        let tl = ([quad.x1, quad.y1], [0.0, 0.0]);
        let tr = ([quad.x2, quad.y1], [1.0, 0.0]);
        let bl = ([quad.x1, quad.y2], [0.0, 1.0]);
        let br = ([quad.x2, quad.y2], [1.0, 1.0]);
        [tl, bl, tr, tr, bl, br]
    }
}

impl Painter for WgpuPainter {
    type Texture = GpuTexture;

    fn push_matrix(&mut self) {
        self.matrix.push();
    }

    fn pop_matrix(&mut self) {
        self.matrix.pop();
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.matrix.translate(x, y);
    }

    fn scale(&mut self, x: f32, y: f32) {
        self.matrix.scale(x, y);
    }

    fn rotate(&mut self, degrees: f32) {
        self.matrix.rotate(degrees);
    }

    fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    fn set_blend(&mut self, mode: BlendMode) {
        self.blend = mode;
    }

    fn set_smoothing(&mut self, enabled: bool) {
        self.smoothing = enabled;
    }

    fn fill_rect(&mut self, quad: Quad) {
        let white = Arc::clone(&self.white);
        self.emit(&white, &Self::quad_points(quad));
    }

    fn rounded_rect(&mut self, quad: Quad, radius: f32) {
        let tolerance = if self.smoothing {
            SMOOTH_TOLERANCE
        } else {
            COARSE_TOLERANCE
        };
        let points: Vec<_> =
            rounded_rect_triangles(&mut self.tessellator, quad, radius, tolerance)
                .into_iter()
                .map(|p| (p, [0.0, 0.0]))
                .collect();
        let white = Arc::clone(&self.white);
        self.emit(&white, &points);
    }

    fn textured_quad(&mut self, texture: &GpuTexture, quad: Quad) {
        self.emit(&texture.bind_group, &Self::quad_points(quad));
    }
}

struct BlendPipelines {
    saturate: wgpu::RenderPipeline,
    replace: wgpu::RenderPipeline,
}

impl BlendPipelines {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Self {
        Self {
            saturate: create_pipeline(
                device,
                layout,
                shader,
                format,
                Some(SATURATE),
                sample_count,
                "grid-saturate",
            ),
            replace: create_pipeline(
                device,
                layout,
                shader,
                format,
                None,
                sample_count,
                "grid-replace",
            ),
        }
    }

    fn get(&self, blend: BlendMode) -> &wgpu::RenderPipeline {
        match blend {
            BlendMode::Saturate => &self.saturate,
            BlendMode::Replace => &self.replace,
        }
    }
}

/// Pipelines and shared resources for drawing a grid frame.
pub struct GridRenderer {
    single: BlendPipelines,
    /// Multisampled variants, when the surface supports them.
    multi: Option<BlendPipelines>,
    layout: Arc<wgpu::BindGroupLayout>,
    sampler: Arc<wgpu::Sampler>,
    white: GpuTexture,
}

impl GridRenderer {
    pub fn new(ctx: &GpuContext) -> Self {
        let device = &ctx.device;
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("grid"),
            source: wgpu::ShaderSource::Wgsl(std::borrow::Cow::Borrowed(include_str!(
                "shaders/grid.wgsl"
            ))),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("grid-texture-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("grid-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("grid-pipeline-layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });
        let format = ctx.config.format;
        let single = BlendPipelines::new(device, &pipeline_layout, &shader, format, 1);
        let multi = (ctx.sample_count > 1).then(|| {
            BlendPipelines::new(device, &pipeline_layout, &shader, format, ctx.sample_count)
        });

        let factory = GpuTextureFactory {
            device: Arc::clone(&ctx.device),
            queue: Arc::clone(&ctx.queue),
            layout: Arc::new(layout),
            sampler: Arc::new(sampler),
        };
        let white = factory.upload(1, 1, &[255, 255, 255, 255]);

        Self {
            single,
            multi,
            layout: factory.layout,
            sampler: factory.sampler,
            white,
        }
    }

    pub fn texture_factory(&self, ctx: &GpuContext) -> GpuTextureFactory {
        GpuTextureFactory {
            device: Arc::clone(&ctx.device),
            queue: Arc::clone(&ctx.queue),
            layout: Arc::clone(&self.layout),
            sampler: Arc::clone(&self.sampler),
        }
    }

    /// A painter mapping a `width`×`height` pixel area onto the whole target.
    pub fn painter(&self, width: u32, height: u32) -> WgpuPainter {
        WgpuPainter {
            viewport: (width.max(1) as f32, height.max(1) as f32),
            matrix: MatrixStack::default(),
            color: Color::WHITE,
            blend: BlendMode::Replace,
            smoothing: false,
            antialias: false,
            white: Arc::clone(&self.white.bind_group),
            tessellator: FillTessellator::new(),
            vertices: Vec::new(),
            batches: Vec::new(),
        }
    }

    /// Clear `target` to transparent black and replay `painter`. Frames with
    /// smoothed geometry go through the multisampled target and resolve into
    /// `target`.
    pub fn render(
        &self,
        ctx: &GpuContext,
        painter: WgpuPainter,
        target: &wgpu::TextureView,
        encoder: &mut wgpu::CommandEncoder,
    ) {
        if painter.matrix.depth() != 0 {
            warn!(depth = painter.matrix.depth(), "unbalanced matrix stack");
        }
        let vbuf = (!painter.vertices.is_empty()).then(|| {
            ctx.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("grid-vertices"),
                    contents: bytemuck::cast_slice(&painter.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                })
        });

        let (pipelines, view, resolve_target, store) =
            match (painter.antialias, self.multi.as_ref(), ctx.msaa.as_ref()) {
                (true, Some(multi), Some(msaa)) => {
                    (multi, msaa, Some(target), wgpu::StoreOp::Discard)
                }
                _ => (&self.single, target, None, wgpu::StoreOp::Store),
            };

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("grid-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        let Some(vbuf) = vbuf else {
            return;
        };
        rpass.set_vertex_buffer(0, vbuf.slice(..));
        let mut bound: Option<BlendMode> = None;
        for batch in &painter.batches {
            if bound != Some(batch.blend) {
                rpass.set_pipeline(pipelines.get(batch.blend));
                bound = Some(batch.blend);
            }
            rpass.set_bind_group(0, batch.texture.as_ref(), &[]);
            rpass.draw(batch.vertices.clone(), 0..1);
        }
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    sample_count: u32,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![
                    0 => Float32x2,
                    1 => Float32x2,
                    2 => Float32x4
                ],
            }],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: sample_count,
            ..Default::default()
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview: None,
        cache: None,
    })
}
