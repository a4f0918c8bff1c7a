//! Main renderer managing wgpu state and rendering.

use crate::{
    camera::{Camera, CameraUniform},
    mesh::Mesh,
    pipeline::{create_camera_bind_group_layout, create_fade_pipeline, create_scene_pipeline},
    texture::Texture,
    vertex::{InstanceData, OverlayVertex},
};
use anyhow::Result;
use glam::Vec3;
use std::sync::Arc;
use wgpu::util::DeviceExt;
use winit::window::Window;

/// Main renderer state.
pub struct Renderer {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,
    pub window: Arc<Window>,

    scene_pipeline: wgpu::RenderPipeline,
    transparent_pipeline: wgpu::RenderPipeline,
    fade_pipeline: wgpu::RenderPipeline,

    camera_bind_group: wgpu::BindGroup,
    camera_buffer: wgpu::Buffer,
    camera_uniform: CameraUniform,

    depth_texture: Texture,

    // Instance buffer for batched rendering
    instance_buffer: wgpu::Buffer,
    max_instances: u32,
    /// Current write offset into instance_buffer for this frame. Each
    /// draw writes a unique region so `queue.write_buffer` calls don't
    /// overwrite each other before the command buffer executes.
    frame_instance_offset: u32,
}

impl Renderer {
    /// Create a new renderer for the given window.
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("Failed to find suitable GPU adapter"))?;

        log::info!("Using GPU: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Main Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        // Prefer Mailbox (low-latency vsync) if available; otherwise AutoVsync.
        let present_mode = surface_caps
            .present_modes
            .iter()
            .find(|m| matches!(m, wgpu::PresentMode::Mailbox))
            .copied()
            .unwrap_or(wgpu::PresentMode::AutoVsync);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 1,
        };
        surface.configure(&device, &config);

        let camera_uniform = CameraUniform::new();
        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout = create_camera_bind_group_layout(&device);
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let scene_pipeline =
            create_scene_pipeline(&device, &config, &camera_bind_group_layout, false);
        let transparent_pipeline =
            create_scene_pipeline(&device, &config, &camera_bind_group_layout, true);
        let fade_pipeline = create_fade_pipeline(&device, &config);

        let depth_texture =
            Texture::create_depth_texture(&device, config.width, config.height, "Depth Texture");

        let max_instances = 4096u32;
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Instance Buffer"),
            size: (std::mem::size_of::<InstanceData>() * max_instances as usize) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            window,
            scene_pipeline,
            transparent_pipeline,
            fade_pipeline,
            camera_bind_group,
            camera_buffer,
            camera_uniform,
            depth_texture,
            instance_buffer,
            max_instances,
            frame_instance_offset: 0,
        })
    }

    /// Handle window resize.
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = Texture::create_depth_texture(
                &self.device,
                self.config.width,
                self.config.height,
                "Depth Texture",
            );
        }
    }

    /// Update the camera uniform and the scene light that travels with it.
    pub fn update_camera(&mut self, camera: &Camera, light_position: Vec3, light_color: [f32; 4]) {
        self.camera_uniform.update(camera, light_position, light_color);
        self.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera_uniform]),
        );
    }

    /// Begin a new frame, returns the surface texture and command encoder.
    pub fn begin_frame(&mut self) -> Result<(wgpu::SurfaceTexture, wgpu::CommandEncoder)> {
        self.frame_instance_offset = 0;
        let output = self.surface.get_current_texture()?;
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        Ok((output, encoder))
    }

    /// Clear color and depth without drawing anything. Call first in the
    /// frame; subsequent passes load.
    pub fn clear(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        clear_color: [f32; 4],
    ) {
        let [r, g, b, a] = clear_color;
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Clear Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: r as f64,
                        g: g as f64,
                        b: b as f64,
                        a: a as f64,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_texture.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
    }

    fn stage_instances(&mut self, instances: &[InstanceData]) -> Option<(u32, u32)> {
        let offset = self.frame_instance_offset;
        let remaining = self.max_instances.saturating_sub(offset) as usize;
        let instance_count = instances.len().min(remaining);
        if instance_count == 0 {
            return None;
        }

        let byte_offset = (offset as usize * std::mem::size_of::<InstanceData>()) as u64;
        self.queue.write_buffer(
            &self.instance_buffer,
            byte_offset,
            bytemuck::cast_slice(&instances[..instance_count]),
        );
        self.frame_instance_offset = offset + instance_count as u32;
        Some((offset, instance_count as u32))
    }

    /// Render a mesh with instancing, loading existing frame content.
    pub fn render_instanced_load(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        mesh: &Mesh,
        instances: &[InstanceData],
    ) {
        self.render_batch(encoder, view, mesh, instances, false);
    }

    /// Render a mesh with alpha blending. Draw after all opaque batches.
    pub fn render_transparent_load(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        mesh: &Mesh,
        instances: &[InstanceData],
    ) {
        self.render_batch(encoder, view, mesh, instances, true);
    }

    fn render_batch(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        mesh: &Mesh,
        instances: &[InstanceData],
        transparent: bool,
    ) {
        if instances.is_empty() {
            return;
        }
        let Some((offset, instance_count)) = self.stage_instances(instances) else {
            return;
        };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_texture.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if transparent {
            render_pass.set_pipeline(&self.transparent_pipeline);
        } else {
            render_pass.set_pipeline(&self.scene_pipeline);
        }
        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
        render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..mesh.num_indices, 0, offset..(offset + instance_count));
    }

    /// Render the fullscreen fade overlay. Call as the very last pass
    /// before end_frame. Skipped when opacity is (near) zero.
    pub fn render_fade(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        opacity: f32,
    ) {
        if opacity <= 0.001 {
            return;
        }
        let color = [0.0, 0.0, 0.0, opacity.min(1.0)];
        let vertices = [
            OverlayVertex { position: [-1.0, -1.0], color },
            OverlayVertex { position: [3.0, -1.0], color },
            OverlayVertex { position: [-1.0, 3.0], color },
        ];
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Fade Vertex Buffer"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Fade Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        render_pass.set_pipeline(&self.fade_pipeline);
        render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
        render_pass.draw(0..3, 0..1);
    }

    /// End frame and present.
    pub fn end_frame(&self, output: wgpu::SurfaceTexture, encoder: wgpu::CommandEncoder) {
        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }

    /// Get window dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Access the device for mesh creation.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }
}
