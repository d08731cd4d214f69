//! Rendering system: surface, depth buffer, sky, water tiles and spray.
//!
//! Owns the GPU simulation so compute and draw passes share one command
//! encoder and one submit per frame.

use std::sync::Arc;

use log::info;
use wgpu::util::DeviceExt;

use crate::camera::CameraSystem;
use crate::error::GpuError;
use crate::gpu::{
    create_shader, GpuContext, GpuOcean, ShaderKind, SkyUniforms, SprayUniforms, WaterUniforms,
};
use crate::ocean::{FrameInput, Particle, PatchMesh, Slot, Vertex};
use crate::params::{OceanConfig, RenderConfig};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Spray billboard half-size (meters)
const SPRAY_SIZE_M: f32 = 0.35;

fn uniform_layout_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn read_only_storage_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn depth_state(compare: wgpu::CompareFunction, write: bool) -> Option<wgpu::DepthStencilState> {
    Some(wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: write,
        depth_compare: compare,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    })
}

/// Rendering system managing the surface, draw pipelines and the simulation
pub struct RenderSystem {
    pub surface: wgpu::Surface<'static>,
    pub gpu: GpuContext,
    surface_config: wgpu::SurfaceConfiguration,
    render_config: RenderConfig,
    depth_view: wgpu::TextureView,
    ocean: GpuOcean,
    sky_pipeline: wgpu::RenderPipeline,
    water_pipeline: wgpu::RenderPipeline,
    spray_pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    sky_uniform_buffer: wgpu::Buffer,
    sky_bind_group: wgpu::BindGroup,
    water_uniform_buffer: wgpu::Buffer,
    /// Indexed by the foam slot read this frame; binds the slot written
    water_bind_groups: [wgpu::BindGroup; 2],
    spray_uniform_buffer: wgpu::Buffer,
    spray_bind_group: wgpu::BindGroup,
}

impl RenderSystem {
    /// Create new rendering system
    pub async fn new(
        window: Arc<winit::window::Window>,
        ocean_config: OceanConfig,
        mut render_config: RenderConfig,
    ) -> Result<Self, GpuError> {
        let size = window.inner_size();
        render_config.window_width = size.width.max(1);
        render_config.window_height = size.height.max(1);

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // Window must have 'static lifetime via Arc
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let gpu = GpuContext::from_adapter(adapter).await?;
        let device = &gpu.device;

        let surface_caps = surface.get_capabilities(&gpu.adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: render_config.window_width,
            height: render_config.window_height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            // CPU blocks in get_current_texture beyond two frames in flight
            desired_maximum_frame_latency: 2,
        };
        surface.configure(device, &surface_config);
        let depth_view = create_depth_view(device, surface_config.width, surface_config.height);

        let ocean = GpuOcean::new(device, ocean_config)?;
        let grid = *ocean.grid();
        let patch_size_m = ocean.config().patch_size_m;

        let mesh = PatchMesh::new(render_config.mesh_resolution, patch_size_m);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Water Vertex Buffer"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Water Index Buffer"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let uniform_buffer = |label: &str, size: usize| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: size as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let sky_uniform_buffer = uniform_buffer("Sky Uniform Buffer", std::mem::size_of::<SkyUniforms>());
        let water_uniform_buffer =
            uniform_buffer("Water Uniform Buffer", std::mem::size_of::<WaterUniforms>());
        let spray_uniform_buffer =
            uniform_buffer("Spray Uniform Buffer", std::mem::size_of::<SprayUniforms>());

        let vertex_and_fragment = wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT;

        // Sky
        let sky_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sky Bind Group Layout"),
            entries: &[uniform_layout_entry(0, vertex_and_fragment)],
        });
        let sky_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sky Bind Group"),
            layout: &sky_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: sky_uniform_buffer.as_entire_binding(),
            }],
        });

        // Water: displacement in both stages, foam in the fragment stage only
        let water_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Water Bind Group Layout"),
            entries: &[
                uniform_layout_entry(0, vertex_and_fragment),
                read_only_storage_entry(1, vertex_and_fragment),
                read_only_storage_entry(2, wgpu::ShaderStages::FRAGMENT),
            ],
        });
        let water_bind_groups = [Slot::A, Slot::B].map(|current| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Water Bind Group"),
                layout: &water_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: water_uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: ocean.displacement_buffer().as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: ocean.foam_buffer(current.other()).as_entire_binding(),
                    },
                ],
            })
        });

        // Spray
        let spray_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Spray Bind Group Layout"),
            entries: &[uniform_layout_entry(0, vertex_and_fragment)],
        });
        let spray_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Spray Bind Group"),
            layout: &spray_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: spray_uniform_buffer.as_entire_binding(),
            }],
        });

        let color_target = |blend: Option<wgpu::BlendState>| {
            Some(wgpu::ColorTargetState {
                format: surface_config.format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })
        };

        let pipeline = |label: &str,
                        kind: ShaderKind,
                        layout: &wgpu::BindGroupLayout,
                        buffers: &[wgpu::VertexBufferLayout],
                        blend: Option<wgpu::BlendState>,
                        depth_stencil: Option<wgpu::DepthStencilState>| {
            let shader = create_shader(device, kind, &grid);
            let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(label),
                bind_group_layouts: &[layout],
                push_constant_ranges: &[],
            });
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers,
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[color_target(blend)],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        let sky_pipeline = pipeline(
            "Sky Pipeline",
            ShaderKind::Sky,
            &sky_layout,
            &[],
            None,
            depth_state(wgpu::CompareFunction::Always, false),
        );

        let water_pipeline = pipeline(
            "Water Pipeline",
            ShaderKind::Water,
            &water_layout,
            &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[
                    wgpu::VertexAttribute {
                        offset: 0,
                        shader_location: 0,
                        format: wgpu::VertexFormat::Float32x3,
                    },
                    wgpu::VertexAttribute {
                        offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                        shader_location: 1,
                        format: wgpu::VertexFormat::Float32x2,
                    },
                ],
            }],
            None,
            depth_state(wgpu::CompareFunction::Less, true),
        );

        // One instance per pool slot, read straight from the storage buffer
        let spray_pipeline = pipeline(
            "Spray Pipeline",
            ShaderKind::SprayRender,
            &spray_layout,
            &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Particle>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &[
                    wgpu::VertexAttribute {
                        offset: 0,
                        shader_location: 0,
                        format: wgpu::VertexFormat::Float32x4,
                    },
                    wgpu::VertexAttribute {
                        offset: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                        shader_location: 1,
                        format: wgpu::VertexFormat::Float32x4,
                    },
                ],
            }],
            Some(wgpu::BlendState::ALPHA_BLENDING),
            depth_state(wgpu::CompareFunction::Less, false),
        );

        info!(
            "Renderer ready: {}x{}, {} water tiles, {} spray slots",
            surface_config.width,
            surface_config.height,
            render_config.tile_count(),
            ocean.config().particle_capacity
        );

        Ok(Self {
            surface,
            surface_config,
            depth_view,
            ocean,
            sky_pipeline,
            water_pipeline,
            spray_pipeline,
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count(),
            sky_uniform_buffer,
            sky_bind_group,
            water_uniform_buffer,
            water_bind_groups,
            spray_uniform_buffer,
            spray_bind_group,
            render_config,
            gpu,
        })
    }

    pub fn render_config(&self) -> &RenderConfig {
        &self.render_config
    }

    pub fn ocean(&self) -> &GpuOcean {
        &self.ocean
    }

    /// Reconfigure the surface and depth buffer for a new window size
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.render_config.window_width = width;
        self.render_config.window_height = height;
        self.surface.configure(&self.gpu.device, &self.surface_config);
        self.depth_view = create_depth_view(&self.gpu.device, width, height);
    }

    /// Reconfigure with the current size (after `Lost` / `Outdated`)
    pub fn reconfigure(&mut self) {
        self.resize(self.surface_config.width, self.surface_config.height);
    }

    fn write_uniforms(&self, input: &FrameInput, camera: &CameraSystem) {
        let queue = &self.gpu.queue;
        let view_proj = camera.view_proj(&self.render_config);
        let exposure = input.params.exposure;

        let water = WaterUniforms::new(
            view_proj,
            camera.local_eye(),
            input.time_s,
            self.ocean.config().patch_size_m,
            self.render_config.tile_radius,
            &input.params,
        );
        queue.write_buffer(&self.water_uniform_buffer, 0, bytemuck::bytes_of(&water));

        let sky = SkyUniforms {
            inv_view_proj: view_proj.inverse().to_cols_array_2d(),
            params: [exposure, input.time_s, 0.0, 0.0],
        };
        queue.write_buffer(&self.sky_uniform_buffer, 0, bytemuck::bytes_of(&sky));

        let (right, up) = camera.basis();
        let spray = SprayUniforms {
            view_proj: view_proj.to_cols_array_2d(),
            camera_right: right.extend(0.0).to_array(),
            camera_up: up.extend(0.0).to_array(),
            params: [SPRAY_SIZE_M, exposure, 0.0, 0.0],
        };
        queue.write_buffer(&self.spray_uniform_buffer, 0, bytemuck::bytes_of(&spray));
    }

    /// Simulate and draw one frame with a single submit
    pub fn render(&mut self, input: &FrameInput, camera: &CameraSystem) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.ocean.prepare(&self.gpu.queue, input);
        self.write_uniforms(input, camera);

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.ocean.encode(&mut encoder);

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            // Sky first, behind everything
            render_pass.set_pipeline(&self.sky_pipeline);
            render_pass.set_bind_group(0, &self.sky_bind_group, &[]);
            render_pass.draw(0..3, 0..1);

            render_pass.set_pipeline(&self.water_pipeline);
            render_pass.set_bind_group(
                0,
                &self.water_bind_groups[self.ocean.foam_slot().index()],
                &[],
            );
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..self.index_count, 0, 0..self.render_config.tile_count());

            render_pass.set_pipeline(&self.spray_pipeline);
            render_pass.set_bind_group(0, &self.spray_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.ocean.particle_buffer().slice(..));
            render_pass.draw(0..6, 0..self.ocean.config().particle_capacity);
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        self.ocean.finish_frame();

        Ok(())
    }
}
