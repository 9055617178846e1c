//! Headless GPU context.
//!
//! Owns the wgpu device and queue together with the resources every capture
//! frame shares: the camera uniform, the light uniform and the mesh pipeline.
//! No window or surface is involved, frames are rendered to offscreen
//! textures (see [`crate::data_structures::texture::RenderTarget`]).

use anyhow::Context as _;
use wgpu::util::DeviceExt;

use crate::{
    camera::{Camera, CameraUniform},
    data_structures::texture::Texture,
    pipelines::{basic::mk_mesh_pipeline, light::LightResources},
    scene::{DirectionalLight, Scene},
};

#[derive(Debug)]
pub struct CameraResources {
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    fn new(device: &wgpu::Device) -> Self {
        let uniform = CameraUniform::new();

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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
            label: Some("camera_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn update(&mut self, queue: &wgpu::Queue, camera: &Camera) {
        self.uniform.update_view_proj(camera);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

pub struct Context {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub camera: CameraResources,
    pub light: LightResources,
    pub pipeline: wgpu::RenderPipeline,
    pub clear_colour: wgpu::Color,
}

impl Context {
    pub async fn new() -> anyhow::Result<Self> {
        // The instance is a handle to our GPU
        // BackendBit::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
        log::debug!("WGPU setup");
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable GPU adapter found")?;
        log::info!("rendering on {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("capture device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create GPU device")?;

        let camera = CameraResources::new(&device);
        let light = LightResources::new(
            &device,
            &[DirectionalLight::key(), DirectionalLight::fill()],
        );
        let pipeline = mk_mesh_pipeline(
            &device,
            Texture::COLOR_FORMAT,
            &camera.bind_group_layout,
            &light.bind_group_layout,
        );

        Ok(Self {
            device,
            queue,
            camera,
            light,
            pipeline,
            clear_colour: wgpu::Color::BLACK,
        })
    }

    /// Bring the uniforms in line with `scene` and its attached `camera`.
    pub fn write_scene<M>(&mut self, scene: &Scene<M>, camera: &Camera) {
        self.camera.update(&self.queue, camera);
        self.light.update(&self.queue, scene.lights());
    }
}
