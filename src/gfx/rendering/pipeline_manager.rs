//! Render pipeline management for registered shaders
//!
//! Each [`Shader`] gets one pipeline, created lazily the first time it is
//! bound, together with the bind group layouts it implies: group 1 for the
//! shader's own uniform block and group 2 for its materials.

use std::sync::Arc;

use slotmap::SecondaryMap;
use wgpu::*;

use crate::gfx::geometry::VertexPosNormTexCol;
use crate::gfx::resources::{
    texture_resource::TextureResource, Shader, ShaderId, TextureKind,
};
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
    uniform_buffer::RawUniformBuffer,
};

/// Fixed-function state for one pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub cull_mode: Option<Face>,
    pub depth_compare: CompareFunction,
    pub depth_write: bool,
    pub color_format: TextureFormat,
}

impl PipelineConfig {
    pub fn for_shader(shader: &Shader, color_format: TextureFormat) -> Self {
        let settings = shader.settings();
        Self {
            label: shader.name().to_string(),
            cull_mode: settings.cull_mode,
            depth_compare: settings.depth_compare,
            depth_write: settings.depth_write,
            color_format,
        }
    }
}

/// GPU state owned by one shader
pub struct ShaderPipeline {
    pipeline: RenderPipeline,
    block_buffer: Option<RawUniformBuffer>,
    block_bind_group: BindGroup,
    material_layout: BindGroupLayoutWithDesc,
}

impl ShaderPipeline {
    pub fn pipeline(&self) -> &RenderPipeline {
        &self.pipeline
    }

    pub fn block_bind_group(&self) -> &BindGroup {
        &self.block_bind_group
    }

    /// Layout for bind group 2 of materials using this shader
    pub fn material_layout(&self) -> &BindGroupLayoutWithDesc {
        &self.material_layout
    }
}

/// Builds the group 2 layout: optional uniform, then texture and sampler per slot
pub fn material_layout_builder(shader: &Shader) -> BindGroupLayoutBuilder {
    let mut builder = BindGroupLayoutBuilder::new();
    if !shader.material_layout().is_empty() {
        builder = builder.next_binding_rendering(binding_types::uniform());
    }
    for slot in shader.texture_slots() {
        let texture = match slot.kind {
            TextureKind::D2 => binding_types::texture_2d(),
            TextureKind::Cube => binding_types::texture_cube(),
        };
        builder = builder
            .next_binding_fragment(texture)
            .next_binding_fragment(binding_types::sampler(SamplerBindingType::Filtering));
    }
    builder
}

/// Manages per-shader pipelines with lazy creation
pub struct PipelineManager {
    device: Arc<Device>,
    color_format: TextureFormat,
    frame_layout: BindGroupLayout,
    object_layout: BindGroupLayout,
    pipelines: SecondaryMap<ShaderId, ShaderPipeline>,
}

impl PipelineManager {
    pub fn new(
        device: Arc<Device>,
        color_format: TextureFormat,
        frame_layout: BindGroupLayout,
        object_layout: BindGroupLayout,
    ) -> Self {
        Self {
            device,
            color_format,
            frame_layout,
            object_layout,
            pipelines: SecondaryMap::new(),
        }
    }

    /// Gets or creates the pipeline for a shader
    pub fn ensure(&mut self, id: ShaderId, shader: &Shader) -> &ShaderPipeline {
        if !self.pipelines.contains_key(id) {
            let created = self.create(shader);
            log::info!("Created pipeline for shader '{}'", shader.name());
            self.pipelines.insert(id, created);
        }
        &self.pipelines[id]
    }

    pub fn get(&self, id: ShaderId) -> Option<&ShaderPipeline> {
        self.pipelines.get(id)
    }

    /// Uploads the shader's uniform block if it changed since the last upload
    pub fn upload_block(&mut self, queue: &Queue, id: ShaderId, shader: &mut Shader) {
        let Some(pipeline) = self.pipelines.get_mut(id) else {
            return;
        };
        if !shader.block().is_dirty() {
            return;
        }
        if let Some(buffer) = &mut pipeline.block_buffer {
            buffer.update_bytes(queue, shader.block().bytes());
        }
        shader.block_mut().mark_clean();
    }

    fn create(&self, shader: &Shader) -> ShaderPipeline {
        let module = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(shader.name()),
            source: ShaderSource::Wgsl(shader.source().into()),
        });

        let block_size = shader.block().layout().size();
        let (block_layout, block_buffer) = if block_size == 0 {
            (BindGroupLayoutBuilder::new(), None)
        } else {
            (
                BindGroupLayoutBuilder::new().next_binding_rendering(binding_types::uniform()),
                Some(RawUniformBuffer::new(
                    &self.device,
                    shader.name(),
                    block_size as u64,
                )),
            )
        };
        let block_layout =
            block_layout.create(&self.device, &format!("{} Shader Block Layout", shader.name()));
        let mut block_group = BindGroupBuilder::new(&block_layout);
        if let Some(buffer) = &block_buffer {
            block_group = block_group.resource(buffer.binding_resource());
        }
        let block_bind_group =
            block_group.create(&self.device, &format!("{} Shader Block", shader.name()));

        let material_layout = material_layout_builder(shader)
            .create(&self.device, &format!("{} Material Layout", shader.name()));

        let config = PipelineConfig::for_shader(shader, self.color_format);
        let pipeline_layout = self.device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some(&format!("{} Layout", config.label)),
            bind_group_layouts: &[
                &self.frame_layout,
                &block_layout.layout,
                &material_layout.layout,
                &self.object_layout,
            ],
            push_constant_ranges: &[],
        });

        let pipeline = self.device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(&config.label),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                buffers: &[VertexPosNormTexCol::desc()],
                compilation_options: PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                targets: &[Some(ColorTargetState {
                    format: config.color_format,
                    blend: Some(BlendState::REPLACE),
                    write_mask: ColorWrites::ALL,
                })],
                compilation_options: PipelineCompilationOptions::default(),
            }),
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: FrontFace::Ccw,
                cull_mode: config.cull_mode,
                polygon_mode: PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(DepthStencilState {
                format: TextureResource::DEPTH_FORMAT,
                depth_write_enabled: config.depth_write,
                depth_compare: config.depth_compare,
                stencil: StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        ShaderPipeline {
            pipeline,
            block_buffer,
            block_bind_group,
            material_layout,
        }
    }

    /// Returns pipeline manager statistics
    pub fn get_stats(&self) -> PipelineStats {
        PipelineStats {
            total_pipelines: self.pipelines.len(),
        }
    }
}

/// Statistics about pipeline manager state
#[derive(Debug)]
pub struct PipelineStats {
    pub total_pipelines: usize,
}
