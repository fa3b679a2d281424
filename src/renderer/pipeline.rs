//! WebGPU mesh renderer
//!
//! One instanced pipeline for lit opaque meshes and a blended variant for
//! particles. Both share the uniform block and the instance buffer.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use super::shapes::{self, MeshData};
use super::vertex::{InstanceRaw, MeshVertex};
use crate::scene::{MeshId, SceneFrame};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
/// Instances the buffer starts with; it grows on demand
const INITIAL_INSTANCES: usize = 1024;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 3],
    fog_density: f32,
    fog_color: [f32; 3],
    ambient: f32,
    light_dir: [f32; 3],
    _pad: f32,
}

/// A mesh living on the GPU
struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, label: &str, mesh: &MeshData) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_vertices")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_indices")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        }
    }
}

/// A run of instances in the instance buffer drawn with one mesh
struct Batch {
    mesh: Option<MeshId>,
    range: std::ops::Range<u32>,
}

/// Main render state
pub struct MeshRenderer {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    opaque_pipeline: wgpu::RenderPipeline,
    particle_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    depth_view: wgpu::TextureView,
    meshes: HashMap<MeshId, GpuMesh>,
    particle_mesh: GpuMesh,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    /// Viewport size in pixels
    pub size: (u32, u32),
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth"),
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

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("instances"),
        size: (capacity * std::mem::size_of::<InstanceRaw>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn to_color(c: Vec3) -> wgpu::Color {
    wgpu::Color {
        r: c.x as f64,
        g: c.y as f64,
        b: c.z as f64,
        a: 1.0,
    }
}

impl MeshRenderer {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
    ) -> Result<Self, wgpu::RequestDeviceError> {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("fish-frenzy-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(adapter);
        log::info!("Surface formats: {:?}", surface_caps.formats);

        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        log::info!("Using surface format: {:?}", surface_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("mesh.wgsl").into()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniforms"),
            size: std::mem::size_of::<Uniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("mesh_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("mesh_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let make_pipeline = |label: &str, entry: &str, blend: wgpu::BlendState, depth_write: bool| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[MeshVertex::desc(), InstanceRaw::desc()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(entry),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: config.format,
                        blend: Some(blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    // Models and the floor are viewed from both sides
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: depth_write,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        };

        let opaque_pipeline =
            make_pipeline("opaque_pipeline", "fs_main", wgpu::BlendState::REPLACE, true);
        let particle_pipeline = make_pipeline(
            "particle_pipeline",
            "fs_particle",
            wgpu::BlendState::ALPHA_BLENDING,
            false,
        );

        let mut meshes = HashMap::new();
        meshes.insert(MeshId::Floor, GpuMesh::upload(&device, "floor", &shapes::plane()));
        meshes.insert(
            MeshId::CoralBase,
            GpuMesh::upload(&device, "coral_base", &shapes::cylinder(0.2, 0.5, 1.5, 8)),
        );
        meshes.insert(
            MeshId::CoralBranch,
            GpuMesh::upload(&device, "coral_branch", &shapes::cone(0.2, 1.5, 8)),
        );
        let particle_mesh = GpuMesh::upload(&device, "particle", &shapes::octahedron());

        let instance_buffer = create_instance_buffer(&device, INITIAL_INSTANCES);
        let depth_view = create_depth_view(&device, width, height);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            opaque_pipeline,
            particle_pipeline,
            uniform_buffer,
            bind_group,
            depth_view,
            meshes,
            particle_mesh,
            instance_buffer,
            instance_capacity: INITIAL_INSTANCES,
            size: (width, height),
        })
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_view(&self.device, new_width, new_height);
        }
    }

    /// Upload a loaded model so instances using `id` get drawn
    pub fn upload_mesh(&mut self, id: MeshId, mesh: &MeshData) {
        let label = format!("{id:?}");
        self.meshes
            .insert(id, GpuMesh::upload(&self.device, &label, mesh));
    }

    /// Lay out every instance contiguously, grouped by mesh. Particles go last
    /// and are marked with `mesh: None`.
    fn collect_instances(&self, frame: &SceneFrame) -> (Vec<InstanceRaw>, Vec<Batch>) {
        let mut groups: HashMap<MeshId, Vec<InstanceRaw>> = HashMap::new();
        for inst in &frame.instances {
            if !self.meshes.contains_key(&inst.mesh) {
                continue;
            }
            groups
                .entry(inst.mesh)
                .or_default()
                .push(InstanceRaw::new(inst.transform, inst.color));
        }

        let mut data = Vec::with_capacity(frame.instances.len() + frame.particles.len());
        let mut batches = Vec::with_capacity(groups.len() + 1);
        for (mesh, raws) in groups {
            let start = data.len() as u32;
            data.extend(raws);
            batches.push(Batch {
                mesh: Some(mesh),
                range: start..data.len() as u32,
            });
        }

        if !frame.particles.is_empty() {
            let start = data.len() as u32;
            data.extend(frame.particles.iter().map(|p| {
                let model = Mat4::from_scale_rotation_translation(
                    Vec3::splat(p.size),
                    glam::Quat::IDENTITY,
                    p.pos,
                );
                InstanceRaw::new(model, p.color)
            }));
            batches.push(Batch {
                mesh: None,
                range: start..data.len() as u32,
            });
        }

        (data, batches)
    }

    /// Upload the frame's instances and draw it
    pub fn render(&mut self, frame: &SceneFrame) -> Result<(), wgpu::SurfaceError> {
        let aspect = self.size.0 as f32 / self.size.1.max(1) as f32;
        let uniforms = Uniforms {
            view_proj: frame.camera.view_proj(aspect).to_cols_array_2d(),
            camera_pos: frame.camera.eye.to_array(),
            fog_density: frame.fog_density,
            fog_color: frame.fog_color.to_array(),
            ambient: 0.5,
            light_dir: [0.0, 1.0, 1.0],
            _pad: 0.0,
        };
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let (data, batches) = self.collect_instances(frame);
        if data.len() > self.instance_capacity {
            self.instance_capacity = data.len().next_power_of_two();
            self.instance_buffer = create_instance_buffer(&self.device, self.instance_capacity);
            log::debug!("Instance buffer grown to {}", self.instance_capacity);
        }
        if !data.is_empty() {
            self.queue
                .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&data));
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("mesh_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("mesh_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(to_color(frame.clear_color)),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
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
                multiview_mask: None,
            });

            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));

            render_pass.set_pipeline(&self.opaque_pipeline);
            for batch in &batches {
                let Some(id) = batch.mesh else { continue };
                let Some(mesh) = self.meshes.get(&id) else {
                    continue;
                };
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..mesh.index_count, 0, batch.range.clone());
            }

            if let Some(batch) = batches.iter().find(|b| b.mesh.is_none()) {
                let mesh = &self.particle_mesh;
                render_pass.set_pipeline(&self.particle_pipeline);
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..mesh.index_count, 0, batch.range.clone());
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
