//! wgpu backend for [`Surface`].
//!
//! Drawing calls are recorded on the CPU into a [`QuadBatcher`]: one instance
//! per filled rectangle, one instance range per fill color. [`QuadSurface::present`]
//! uploads the instances, clears to the background and issues one instanced
//! draw per range.

use std::ops::Range;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use winit::window::Window;

use crate::error::GpuError;
use crate::palette::Color;
use crate::render::{Rect, Surface};
use crate::viewport::Viewport;

pub const QUAD_SHADER: &str = include_str!("quad.wgsl");

const INITIAL_INSTANCE_CAPACITY: usize = 1024;

/// Per-rectangle vertex data.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct QuadInstance {
    /// x, y, width, height in logical units.
    pub rect: [f32; 4],
    pub color: [f32; 4],
}

impl QuadInstance {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x4, 1 => Float32x4];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Globals {
    viewport: [f32; 2],
    _padding: [f32; 2],
}

/// CPU-side recording of one frame of draw calls.
#[derive(Debug, Clone, Default)]
pub struct QuadBatcher {
    instances: Vec<QuadInstance>,
    batches: Vec<Range<u32>>,
    fill: [f32; 4],
    linear: bool,
}

impl QuadBatcher {
    /// `linear` selects linear-space colors for sRGB render targets.
    pub fn new(linear: bool) -> Self {
        Self {
            linear,
            fill: [0.0, 0.0, 0.0, 1.0],
            ..Default::default()
        }
    }

    /// Drop everything recorded so far.
    pub fn reset(&mut self) {
        self.instances.clear();
        self.batches.clear();
    }

    pub fn set_fill(&mut self, color: Color) {
        self.fill = self.convert(color);
        let start = self.instances.len() as u32;
        match self.batches.last_mut() {
            // a batch with no rectangles yet just switches color
            Some(last) if last.is_empty() => *last = start..start,
            _ => self.batches.push(start..start),
        }
    }

    pub fn push(&mut self, rect: Rect) {
        if self.batches.is_empty() {
            self.batches.push(0..0);
        }
        self.instances.push(QuadInstance {
            rect: [rect.x, rect.y, rect.width, rect.height],
            color: self.fill,
        });
        if let Some(last) = self.batches.last_mut() {
            last.end += 1;
        }
    }

    /// Convert a palette color for the render target.
    pub fn convert(&self, color: Color) -> [f32; 4] {
        if self.linear {
            color.to_linear_f32()
        } else {
            color.to_srgb_f32()
        }
    }

    pub fn instances(&self) -> &[QuadInstance] {
        &self.instances
    }

    /// Non-empty instance ranges, one per fill color.
    pub fn batches(&self) -> impl Iterator<Item = Range<u32>> + '_ {
        self.batches.iter().filter(|b| !b.is_empty()).cloned()
    }
}

/// Window surface rendering instanced quads.
pub struct QuadSurface {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    batcher: QuadBatcher,
    background: wgpu::Color,
    viewport: Viewport,
}

impl QuadSurface {
    pub async fn new(window: Arc<Window>, background: Color) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Starfield Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or(GpuError::UnsupportedSurface)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Quad Shader"),
            source: wgpu::ShaderSource::Wgsl(QUAD_SHADER.into()),
        });

        let viewport = Viewport::from_physical(size.width, size.height, window.scale_factor());
        let globals_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Globals Buffer"),
            size: std::mem::size_of::<Globals>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Globals Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Globals Bind Group"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Quad Pipeline Layout"),
            bind_group_layouts: &[&globals_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Quad Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[QuadInstance::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let instance_buffer = create_instance_buffer(&device, INITIAL_INSTANCE_CAPACITY);
        let batcher = QuadBatcher::new(surface_format.is_srgb());
        let [r, g, b, a] = batcher.convert(background);

        let surface = Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            globals_buffer,
            globals_bind_group,
            instance_buffer,
            instance_capacity: INITIAL_INSTANCE_CAPACITY,
            batcher,
            background: wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: a as f64,
            },
            viewport,
        };
        surface.write_globals();
        Ok(surface)
    }

    /// Current surface size in physical pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Re-apply the current configuration after the surface was lost or
    /// went out of date.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Upload the recorded frame and present it.
    pub fn present(&mut self) -> Result<(), wgpu::SurfaceError> {
        let instances = self.batcher.instances();
        if instances.len() > self.instance_capacity {
            let capacity = instances.len().next_power_of_two();
            log::debug!("Growing instance buffer to {} quads", capacity);
            self.instance_buffer = create_instance_buffer(&self.device, capacity);
            self.instance_capacity = capacity;
        }
        if !instances.is_empty() {
            self.queue
                .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(instances));
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Quad Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Quad Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.background),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.globals_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
            for batch in self.batcher.batches() {
                render_pass.draw(0..6, batch);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn write_globals(&self) {
        let globals = Globals {
            viewport: [self.viewport.width.max(1.0), self.viewport.height.max(1.0)],
            _padding: [0.0; 2],
        };
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));
    }
}

impl Surface for QuadSurface {
    fn resize(&mut self, viewport: Viewport, scale_factor: f64) {
        let width = (viewport.width as f64 * scale_factor).round() as u32;
        let height = (viewport.height as f64 * scale_factor).round() as u32;
        self.viewport = viewport;
        self.write_globals();

        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// The whole target is cleared to the background when the frame is
    /// presented, whatever `region` says.
    fn clear(&mut self, _region: Rect) {
        self.batcher.reset();
    }

    fn set_fill_color(&mut self, color: Color) {
        self.batcher.set_fill(color);
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.batcher.push(Rect::new(x, y, width, height));
    }
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Instance Buffer"),
        size: (std::mem::size_of::<QuadInstance>() * capacity) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_shader_validates() {
        let module = naga::front::wgsl::parse_str(QUAD_SHADER).expect("quad shader should parse");
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module)
        .expect("quad shader should validate");

        let entry_points: Vec<_> = module.entry_points.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(entry_points, vec!["vs_main", "fs_main"]);
    }

    #[test]
    fn test_gpu_struct_sizes() {
        assert_eq!(std::mem::size_of::<QuadInstance>(), 32);
        assert_eq!(std::mem::size_of::<Globals>(), 16);
    }

    #[test]
    fn test_batcher_groups_by_fill() {
        let red = Color::rgb(255, 0, 0);
        let blue = Color::rgb(0, 0, 255);
        let mut batcher = QuadBatcher::new(false);

        batcher.set_fill(red);
        batcher.push(Rect::new(0.0, 0.0, 1.0, 1.0));
        batcher.push(Rect::new(1.0, 1.0, 2.0, 2.0));
        batcher.set_fill(blue);
        batcher.push(Rect::new(5.0, 5.0, 3.0, 3.0));

        assert_eq!(batcher.batches().collect::<Vec<_>>(), vec![0..2, 2..3]);
        assert_eq!(batcher.instances()[0].color, red.to_srgb_f32());
        assert_eq!(batcher.instances()[2].color, blue.to_srgb_f32());
        assert_eq!(batcher.instances()[2].rect, [5.0, 5.0, 3.0, 3.0]);
    }

    #[test]
    fn test_batcher_collapses_unused_fills() {
        let mut batcher = QuadBatcher::new(true);
        batcher.set_fill(Color::WHITE);
        batcher.set_fill(Color::BLACK);
        batcher.push(Rect::new(0.0, 0.0, 1.0, 1.0));

        assert_eq!(batcher.batches().collect::<Vec<_>>(), vec![0..1]);
        assert_eq!(batcher.instances()[0].color, Color::BLACK.to_linear_f32());

        batcher.reset();
        assert!(batcher.instances().is_empty());
        assert_eq!(batcher.batches().count(), 0);
    }

    #[test]
    fn test_rect_without_fill_gets_a_batch() {
        let mut batcher = QuadBatcher::new(false);
        batcher.push(Rect::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(batcher.batches().collect::<Vec<_>>(), vec![0..1]);
    }
}
