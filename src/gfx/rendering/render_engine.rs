//! WGPU-based rendering engine
//!
//! Owns the surface, device and depth buffer, turns a [`DrawCommand`] list
//! into a render pass and hands the encoder to a UI callback before
//! presenting.

use std::sync::Arc;

use slotmap::SecondaryMap;
use thiserror::Error;
use wgpu::TextureFormat;

use crate::assets::{CubeMapData, TextureData, MAX_TEXTURE_DIMENSION};
use crate::gfx::{
    camera::FrameUniform,
    geometry::DrawMesh,
    resources::{
        global_bindings::{object_bind_group_layout, FrameBindings, ObjectBinding, ObjectUniform},
        texture_resource::TextureResource,
        MaterialId, Resources, ShaderMaterial, TextureKind,
    },
    scene::{EntityId, GameScene},
};
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutWithDesc},
    uniform_buffer::RawUniformBuffer,
};

use super::pipeline_manager::PipelineManager;
use super::render_queue::DrawCommand;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create device: {0}")]
    NoDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface has no supported formats")]
    NoSurfaceFormat,
    #[error("failed to acquire surface texture: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

/// GPU state for one material: uniform buffer plus bind group 2
struct MaterialBinding {
    buffer: Option<RawUniformBuffer>,
    bind_group: wgpu::BindGroup,
    texture_generation: u64,
}

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    format: TextureFormat,
    clear_color: wgpu::Color,
    pub pipeline_manager: PipelineManager,
    frame_bindings: FrameBindings,
    object_layout: BindGroupLayoutWithDesc,
    object_bindings: SecondaryMap<EntityId, ObjectBinding>,
    material_bindings: SecondaryMap<MaterialId, MaterialBinding>,
    white_texture: TextureResource,
    flat_cube_map: TextureResource,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        vsync: bool,
        clear_color: [f32; 4],
    ) -> Result<RenderEngine, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: MAX_TEXTURE_DIMENSION,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        // Textures are sRGB, so the surface must be too for correct gamma
        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or(RenderError::NoSurfaceFormat)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: if vsync {
                wgpu::PresentMode::Fifo
            } else {
                wgpu::PresentMode::Immediate
            },
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");

        let frame_bindings = FrameBindings::new(&device);
        let object_layout = object_bind_group_layout(&device);

        let white_texture = TextureResource::create_texture_2d(
            &device,
            &queue,
            &TextureData::solid_color(1, 1, [255, 255, 255, 255]),
            "White Fallback",
        );
        let flat_cube_map = TextureResource::create_cube_map(
            &device,
            &queue,
            &CubeMapData::solid_color(1, [255, 255, 255, 255]),
            "Cube Fallback",
        );

        let device_handle: Arc<wgpu::Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let pipeline_manager = PipelineManager::new(
            device_handle.clone(),
            format,
            frame_bindings.bind_group_layout().clone(),
            object_layout.layout.clone(),
        );

        Ok(RenderEngine {
            surface,
            device: device_handle,
            queue: queue_handle,
            config,
            depth_texture,
            format,
            clear_color: wgpu::Color {
                r: clear_color[0] as f64,
                g: clear_color[1] as f64,
                b: clear_color[2] as f64,
                a: clear_color[3] as f64,
            },
            pipeline_manager,
            frame_bindings,
            object_layout,
            object_bindings: SecondaryMap::new(),
            material_bindings: SecondaryMap::new(),
            white_texture,
            flat_cube_map,
        })
    }

    /// Creates or refreshes GPU state for everything the draw list touches
    fn prepare(
        &mut self,
        resources: &mut Resources,
        scene: &GameScene,
        frame: FrameUniform,
        commands: &[DrawCommand],
    ) {
        resources.upload_pending(&self.device, &self.queue);
        self.frame_bindings.update(&self.queue, frame);
        self.object_bindings.retain(|entity, _| scene.contains(entity));

        for command in commands {
            match *command {
                DrawCommand::BindShader(id) => {
                    if let Some(shader) = resources.shader_mut(id) {
                        self.pipeline_manager.ensure(id, shader);
                        self.pipeline_manager.upload_block(&self.queue, id, shader);
                    }
                }
                DrawCommand::ApplyMaterial(id) => self.prepare_material(resources, id),
                DrawCommand::Draw { entity, .. } => {
                    let Some(transform) = scene.transform(entity) else {
                        continue;
                    };
                    if !self.object_bindings.contains_key(entity) {
                        let binding = ObjectBinding::new(&self.device, &self.object_layout);
                        self.object_bindings.insert(entity, binding);
                    }
                    if let Some(binding) = self.object_bindings.get_mut(entity) {
                        binding.update(
                            &self.queue,
                            ObjectUniform::new(transform.world_matrix(), transform.normal_matrix()),
                        );
                    }
                }
            }
        }
    }

    fn prepare_material(&mut self, resources: &mut Resources, id: MaterialId) {
        let Some(material) = resources.material(id) else {
            return;
        };
        let Some(pipeline) = self.pipeline_manager.get(material.shader()) else {
            return;
        };

        let stale = self
            .material_bindings
            .get(id)
            .map_or(true, |b| b.texture_generation != material.texture_generation());
        if stale {
            let buffer = (!material.block().layout().is_empty()).then(|| {
                RawUniformBuffer::new(
                    &self.device,
                    material.block().label(),
                    material.block().layout().size() as u64,
                )
            });
            let bind_group = self.material_bind_group(
                resources,
                material,
                pipeline.material_layout(),
                buffer.as_ref(),
            );
            self.material_bindings.insert(
                id,
                MaterialBinding {
                    buffer,
                    bind_group,
                    texture_generation: material.texture_generation(),
                },
            );
            // New buffer starts empty
            if let Some(material) = resources.material_mut(id) {
                material.block_mut().mark_dirty();
            }
        }

        let (Some(binding), Some(material)) =
            (self.material_bindings.get_mut(id), resources.material_mut(id))
        else {
            return;
        };
        if material.block().is_dirty() {
            if let Some(buffer) = &mut binding.buffer {
                buffer.update_bytes(&self.queue, material.block().bytes());
            }
            material.block_mut().mark_clean();
        }
    }

    fn material_bind_group(
        &self,
        resources: &Resources,
        material: &ShaderMaterial,
        layout: &BindGroupLayoutWithDesc,
        buffer: Option<&RawUniformBuffer>,
    ) -> wgpu::BindGroup {
        let mut builder = BindGroupBuilder::new(layout);
        if let Some(buffer) = buffer {
            builder = builder.resource(buffer.binding_resource());
        }
        for (slot, &texture) in material.slots().iter().zip(material.textures()) {
            let fallback = match slot.kind {
                TextureKind::D2 => &self.white_texture,
                TextureKind::Cube => &self.flat_cube_map,
            };
            let resource = texture
                .and_then(|id| resources.texture(id))
                .filter(|t| t.kind() == slot.kind)
                .and_then(|t| t.resource())
                .unwrap_or(fallback);
            builder = builder.texture(&resource.view).sampler(&resource.sampler);
        }
        builder.create(&self.device, material.block().label())
    }

    /// Encodes the draw list, runs the UI callback and presents
    pub fn render_frame<F>(
        &mut self,
        resources: &mut Resources,
        scene: &GameScene,
        frame: FrameUniform,
        commands: &[DrawCommand],
        ui_callback: Option<F>,
    ) -> Result<(), RenderError>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.prepare(resources, scene, frame, commands);
        let resources: &Resources = resources;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
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
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            // Draws are skipped until a pipeline and material are in place
            let mut shader_ready = false;
            let mut material_ready = false;
            for command in commands {
                match *command {
                    DrawCommand::BindShader(id) => {
                        shader_ready = false;
                        material_ready = false;
                        if let Some(pipeline) = self.pipeline_manager.get(id) {
                            render_pass.set_pipeline(pipeline.pipeline());
                            render_pass.set_bind_group(0, self.frame_bindings.bind_group(), &[]);
                            render_pass.set_bind_group(1, pipeline.block_bind_group(), &[]);
                            shader_ready = true;
                        }
                    }
                    DrawCommand::ApplyMaterial(id) => {
                        material_ready = false;
                        if let Some(binding) = self.material_bindings.get(id) {
                            render_pass.set_bind_group(2, &binding.bind_group, &[]);
                            material_ready = true;
                        }
                    }
                    DrawCommand::Draw { entity, mesh } => {
                        if !(shader_ready && material_ready) {
                            continue;
                        }
                        let (Some(binding), Some(mesh)) =
                            (self.object_bindings.get(entity), resources.mesh(mesh))
                        else {
                            continue;
                        };
                        render_pass.set_bind_group(3, binding.bind_group(), &[]);
                        render_pass.draw_mesh(mesh);
                    }
                }
            }
        }

        if let Some(ui_callback) = ui_callback {
            ui_callback(
                &self.device,
                &self.queue,
                &mut encoder,
                &surface_texture_view,
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}
