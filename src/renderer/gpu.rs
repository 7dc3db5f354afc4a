use std::sync::Arc;

use glam::{Mat4, Vec3};
use tracing::{debug, info};
use wgpu::util::DeviceExt;

use crate::error::{Result, ViewerError};
use crate::renderer::camera::{Camera, CameraUniform};
use crate::scene::Scene;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const AMBIENT_INTENSITY: f32 = 0.6;
const DIRECTIONAL_INTENSITY: f32 = 0.8;
const LIGHT_POSITION: Vec3 = Vec3::new(10.0, 20.0, 15.0);

const SKY_TOP: u32 = 0x87CEEB;
const SKY_BOTTOM: u32 = 0xEE90EC;
const SKY_STOPS: [f32; 2] = [0.15, 0.85];
const GRID_OPACITY: f32 = 0.2;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniforms {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub light_dir: [f32; 4],
    pub light: [f32; 4],
    pub grid_color: [f32; 4],
    pub sky_top: [f32; 4],
    pub sky_bottom: [f32; 4],
    pub sky_stops: [f32; 4],
}

impl SceneUniforms {
    /// `linear_output` is set when the surface encodes to sRGB on write, so
    /// shader colors must be linear.
    fn new(model: Mat4, normal_matrix: Mat4, linear_output: bool) -> Self {
        let light_dir = LIGHT_POSITION.normalize();
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: normal_matrix.to_cols_array_2d(),
            light_dir: [light_dir.x, light_dir.y, light_dir.z, 0.0],
            light: [AMBIENT_INTENSITY, DIRECTIONAL_INTENSITY, 0.0, 0.0],
            grid_color: [0.0, 0.0, 0.0, GRID_OPACITY],
            sky_top: hex_color(SKY_TOP, linear_output),
            sky_bottom: hex_color(SKY_BOTTOM, linear_output),
            sky_stops: [SKY_STOPS[0], SKY_STOPS[1], 0.0, 0.0],
        }
    }
}

/// `0xRRGGBB` as RGBA, optionally converted from sRGB to linear.
fn hex_color(hex: u32, linear: bool) -> [f32; 4] {
    let channel = |shift: u32| {
        let c = ((hex >> shift) & 0xFF) as f32 / 255.0;
        if !linear {
            c
        } else if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    [channel(16), channel(8), channel(0), 1.0]
}

/// GPU copies of the scene's mesh and grid.
#[derive(Default)]
pub struct MeshBuffers {
    pub vertex_buffer: Option<wgpu::Buffer>,
    pub normal_buffer: Option<wgpu::Buffer>,
    pub color_buffer: Option<wgpu::Buffer>,
    pub index_buffer: Option<wgpu::Buffer>,
    pub index_count: u32,

    pub grid_buffer: Option<wgpu::Buffer>,
    pub grid_vertex_count: u32,

    pub uploaded_generation: Option<u64>,
}

fn vertex_buffer(device: &wgpu::Device, label: &str, data: &[f32]) -> Option<wgpu::Buffer> {
    if data.is_empty() {
        return None;
    }
    Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(data),
        usage: wgpu::BufferUsages::VERTEX,
    }))
}

impl MeshBuffers {
    fn upload(&mut self, device: &wgpu::Device, scene: &Scene) {
        match scene.mesh() {
            Some(scene_mesh) if !scene_mesh.mesh.is_empty() => {
                let mesh = &scene_mesh.mesh;
                self.vertex_buffer = vertex_buffer(device, "Mesh Vertex Buffer", &mesh.vertices);
                self.normal_buffer = vertex_buffer(device, "Mesh Normal Buffer", &mesh.normals);
                self.color_buffer = vertex_buffer(device, "Mesh Color Buffer", &mesh.colors);
                self.index_buffer = Some(device.create_buffer_init(
                    &wgpu::util::BufferInitDescriptor {
                        label: Some("Mesh Index Buffer"),
                        contents: bytemuck::cast_slice(&mesh.indices),
                        usage: wgpu::BufferUsages::INDEX,
                    },
                ));
                self.index_count = mesh.indices.len() as u32;
            }
            _ => {
                self.vertex_buffer = None;
                self.normal_buffer = None;
                self.color_buffer = None;
                self.index_buffer = None;
                self.index_count = 0;
            }
        }

        let grid_vertices = scene.grid().map(|g| g.vertices()).unwrap_or_default();
        self.grid_buffer = vertex_buffer(device, "Grid Vertex Buffer", &grid_vertices);
        self.grid_vertex_count = (grid_vertices.len() / 3) as u32;

        self.uploaded_generation = Some(scene.generation());
        debug!(
            indices = self.index_count,
            grid_vertices = self.grid_vertex_count,
            "scene uploaded"
        );
    }
}

pub struct GpuState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,

    pub pipeline_background: wgpu::RenderPipeline,
    pub pipeline_grid: wgpu::RenderPipeline,
    pub pipeline_mesh: wgpu::RenderPipeline,

    pub camera_buffer: wgpu::Buffer,
    pub scene_buffer: wgpu::Buffer,
    pub scene_bind_group: wgpu::BindGroup,

    pub mesh_buffers: MeshBuffers,

    pub depth_texture: wgpu::TextureView,
    linear_output: bool,
}

const POSITION_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
const NORMAL_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x3];
const COLOR_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32x3];

/// One tightly packed `vec3<f32>` stream per attribute.
fn float3_layout(attributes: &'static [wgpu::VertexAttribute]) -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: 12,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes,
    }
}

impl GpuState {
    pub async fn new(window: Arc<winit::window::Window>, vsync: bool) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .map_err(|e| ViewerError::gpu(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| ViewerError::gpu("no compatible adapter"))?;

        info!(adapter = ?adapter.get_info().name, "GPU adapter selected");

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .map_err(|e| ViewerError::gpu(e.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| ViewerError::gpu("surface reports no formats"))?;
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
            present_mode: present_mode(vsync),
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        let linear_output = config.format.is_srgb();
        if !linear_output {
            info!(format = ?config.format, "no sRGB surface, colors written unconverted");
        }

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders.wgsl").into()),
        });

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let scene_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Uniform Buffer"),
            contents: bytemuck::cast_slice(&[SceneUniforms::new(
                Mat4::IDENTITY,
                Mat4::IDENTITY,
                linear_output,
            )]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let scene_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Scene Bind Group Layout"),
                entries: &[uniform_entry(0), uniform_entry(1)],
            });

        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &scene_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: scene_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&scene_bind_group_layout],
            push_constant_ranges: &[],
        });

        let color_target = Some(wgpu::ColorTargetState {
            format: config.format,
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            write_mask: wgpu::ColorWrites::ALL,
        });

        let pipeline_background = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Background Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_background"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_background"),
                targets: &[color_target.clone()],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let pipeline_grid = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Grid Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_grid"),
                buffers: &[float3_layout(&POSITION_ATTRS)],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_grid"),
                targets: &[color_target.clone()],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let pipeline_mesh = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Mesh Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_mesh"),
                buffers: &[
                    float3_layout(&POSITION_ATTRS),
                    float3_layout(&NORMAL_ATTRS),
                    float3_layout(&COLOR_ATTRS),
                ],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_mesh"),
                targets: &[color_target],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let depth_texture = Self::create_depth_texture(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            pipeline_background,
            pipeline_grid,
            pipeline_mesh,
            camera_buffer,
            scene_buffer,
            scene_bind_group,
            mesh_buffers: MeshBuffers::default(),
            depth_texture,
            linear_output,
        })
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
    ) -> wgpu::TextureView {
        let size = wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = Self::create_depth_texture(&self.device, &self.config);
        }
    }

    pub fn update_camera(&self, camera: &Camera) {
        let uniform = CameraUniform::from_camera(camera);
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    pub fn set_vsync(&mut self, enabled: bool) {
        self.config.present_mode = present_mode(enabled);
        self.surface.configure(&self.device, &self.config);
    }

    /// Re-uploads mesh, grid and model transform when the scene changed.
    pub fn sync_scene(&mut self, scene: &Scene) {
        if self.mesh_buffers.uploaded_generation == Some(scene.generation()) {
            return;
        }

        let (model, normal) = scene
            .mesh()
            .map(|m| (m.placement.model_matrix(), m.placement.normal_matrix()))
            .unwrap_or((Mat4::IDENTITY, Mat4::IDENTITY));
        self.queue.write_buffer(
            &self.scene_buffer,
            0,
            bytemuck::cast_slice(&[SceneUniforms::new(model, normal, self.linear_output)]),
        );

        self.mesh_buffers.upload(&self.device, scene);
    }

    /// Background, grid and mesh in a single pass.
    pub fn render_scene(&self, view: &wgpu::TextureView, encoder: &mut wgpu::CommandEncoder) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_texture,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_bind_group(0, &self.scene_bind_group, &[]);

        render_pass.set_pipeline(&self.pipeline_background);
        render_pass.draw(0..3, 0..1);

        let buffers = &self.mesh_buffers;
        if let (Some(vertices), Some(normals), Some(colors), Some(indices)) = (
            &buffers.vertex_buffer,
            &buffers.normal_buffer,
            &buffers.color_buffer,
            &buffers.index_buffer,
        ) {
            render_pass.set_pipeline(&self.pipeline_mesh);
            render_pass.set_vertex_buffer(0, vertices.slice(..));
            render_pass.set_vertex_buffer(1, normals.slice(..));
            render_pass.set_vertex_buffer(2, colors.slice(..));
            render_pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..buffers.index_count, 0, 0..1);
        }

        // grid after the mesh so its translucent lines blend over it
        if let Some(grid) = &buffers.grid_buffer {
            render_pass.set_pipeline(&self.pipeline_grid);
            render_pass.set_vertex_buffer(0, grid.slice(..));
            render_pass.draw(0..buffers.grid_vertex_count, 0..1);
        }
    }
}

fn present_mode(vsync: bool) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::AutoVsync
    } else {
        wgpu::PresentMode::AutoNoVsync
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_color_endpoints() {
        assert_eq!(hex_color(0x000000, true), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(hex_color(0xFFFFFF, true), [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn sky_is_only_linearized_for_srgb_surfaces() {
        let raw = SceneUniforms::new(Mat4::IDENTITY, Mat4::IDENTITY, false);
        assert_eq!(raw.sky_top, [135.0 / 255.0, 206.0 / 255.0, 235.0 / 255.0, 1.0]);

        let linear = SceneUniforms::new(Mat4::IDENTITY, Mat4::IDENTITY, true);
        assert!(linear.sky_top[0] < raw.sky_top[0]);
        assert!(linear.sky_bottom[1] < raw.sky_bottom[1]);
    }

    #[test]
    fn uniforms_match_wgsl_layout() {
        // two mat4x4 plus six vec4
        assert_eq!(std::mem::size_of::<SceneUniforms>(), 2 * 64 + 6 * 16);
        assert_eq!(std::mem::size_of::<CameraUniform>(), 80);
    }
}
