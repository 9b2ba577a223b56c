use std::collections::HashMap;
use std::num::NonZeroU64;

use wgpu::util::DeviceExt;

use crate::paint::Color;
use crate::shader::{
    CompiledStage, ProgramLayout, ShaderError, ShaderProgram, StageKind, UniformLocation,
};

use super::backend::{GpuBackend, ProgramId, StageId, TextureId};
use super::quad::{QUAD_POSITIONS, QUAD_TEX_COORDS, QUAD_VERTEX_COUNT};
use super::ctx::uniform_stride;
use super::{RenderCtx, RenderTarget};

/// wgpu implementation of [`GpuBackend`].
///
/// Commands issued during a frame are recorded; [`encode`](Self::encode)
/// replays them into a single render pass. Each draw snapshots its
/// program's uniform block, and the snapshots are uploaded into a
/// per-program ring buffer addressed with dynamic offsets, so every draw
/// sees the uniform values that were current when it was issued.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,
    uniform_alignment: u32,

    next_id: u32,
    stages: HashMap<StageId, WgpuStage>,
    programs: HashMap<ProgramId, WgpuProgram>,
    textures: HashMap<TextureId, WgpuTexture>,

    texture_bgl: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    positions: wgpu::Buffer,
    tex_coords: wgpu::Buffer,
    fallback_texture: TextureId,

    current: Option<ProgramId>,
    bound_texture: Option<TextureId>,
    frame: FrameCommands,
}

struct WgpuStage {
    kind: StageKind,
    module: wgpu::ShaderModule,
}

struct WgpuProgram {
    pipeline: wgpu::RenderPipeline,
    uniform_bgl: wgpu::BindGroupLayout,
    binding: u32,
    block_size: u32,
    /// Block size rounded up to the device's dynamic offset alignment.
    stride: u32,
    shadow: Vec<u8>,
    ring: Option<UniformRing>,
}

struct UniformRing {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    capacity: u32,
}

struct WgpuTexture {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

#[derive(Debug, Clone, PartialEq)]
struct PendingDraw {
    program: ProgramId,
    texture: TextureId,
    uniforms: Vec<u8>,
}

/// Work recorded for the frame that `encode` will replay next.
///
/// A clear starts a new frame: anything recorded before it belongs to a
/// frame that was never encoded (e.g. surface acquisition failed) and is
/// dropped.
#[derive(Debug, Default)]
struct FrameCommands {
    clear: Option<Color>,
    draws: Vec<PendingDraw>,
}

impl FrameCommands {
    fn clear(&mut self, color: Color) {
        if !self.draws.is_empty() {
            log::debug!("dropping {} draws from an unencoded frame", self.draws.len());
        }
        self.draws.clear();
        self.clear = Some(color);
    }

    fn push(&mut self, draw: PendingDraw) {
        self.draws.push(draw);
    }

    fn forget_program(&mut self, program: ProgramId) {
        self.draws.retain(|d| d.program != program);
    }

    fn take(&mut self) -> (Option<Color>, Vec<PendingDraw>) {
        (self.clear.take(), std::mem::take(&mut self.draws))
    }
}

/// Slot of each draw inside its program's uniform ring, plus the number of
/// slots each program needs this frame.
fn ring_slots(draws: &[PendingDraw]) -> (Vec<u32>, HashMap<ProgramId, u32>) {
    let mut slots = Vec::with_capacity(draws.len());
    let mut counts: HashMap<ProgramId, u32> = HashMap::new();
    for draw in draws {
        let count = counts.entry(draw.program).or_insert(0);
        slots.push(*count);
        *count += 1;
    }
    (slots, counts)
}

impl WgpuBackend {
    pub fn new(ctx: &RenderCtx<'_>) -> Self {
        let device = ctx.device;
        let texture_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("orrery texture bgl"),
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

        // Pixel-art sprites: no filtering.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("orrery sprite sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let positions = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("orrery quad positions"),
            contents: bytemuck::cast_slice(&QUAD_POSITIONS),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let tex_coords = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("orrery quad tex coords"),
            contents: bytemuck::cast_slice(&QUAD_TEX_COORDS),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let mut backend = Self {
            device: device.clone(),
            queue: ctx.queue.clone(),
            surface_format: ctx.surface_format,
            uniform_alignment: ctx.uniform_alignment,
            next_id: 0,
            stages: HashMap::new(),
            programs: HashMap::new(),
            textures: HashMap::new(),
            texture_bgl,
            sampler,
            positions,
            tex_coords,
            fallback_texture: TextureId(0),
            current: None,
            bound_texture: None,
            frame: FrameCommands::default(),
        };

        let white = image::RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
        backend.fallback_texture = backend.create_texture(&white);

        backend
    }

    /// Replays the commands recorded since the last call into one render
    /// pass on `target`. The caller submits and presents the frame.
    pub fn encode(&mut self, target: &mut RenderTarget<'_>) {
        let (clear, draws) = self.frame.take();

        if clear.is_none() && draws.is_empty() {
            return;
        }

        let (slots, counts) = ring_slots(&draws);

        for (id, count) in &counts {
            if let Some(program) = self.programs.get_mut(id) {
                program.ensure_ring(&self.device, *count);
            }
        }

        for (draw, slot) in draws.iter().zip(&slots) {
            let Some(program) = self.programs.get(&draw.program) else { continue };
            let Some(ring) = program.ring.as_ref() else { continue };
            let offset = (*slot as u64) * (program.stride as u64);
            self.queue.write_buffer(&ring.buffer, offset, &draw.uniforms);
        }

        let load = match clear {
            Some(color) => wgpu::LoadOp::Clear(color.to_wgpu()),
            None => wgpu::LoadOp::Load,
        };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("orrery sprite pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_vertex_buffer(0, self.positions.slice(..));
        rpass.set_vertex_buffer(1, self.tex_coords.slice(..));

        let mut active = None;
        for (draw, slot) in draws.iter().zip(&slots) {
            let Some(program) = self.programs.get(&draw.program) else { continue };
            let Some(ring) = program.ring.as_ref() else { continue };
            let Some(texture) = self
                .textures
                .get(&draw.texture)
                .or_else(|| self.textures.get(&self.fallback_texture))
            else {
                continue;
            };

            if active != Some(draw.program) {
                rpass.set_pipeline(&program.pipeline);
                active = Some(draw.program);
            }
            rpass.set_bind_group(0, &ring.bind_group, &[slot * program.stride]);
            rpass.set_bind_group(1, &texture.bind_group, &[]);
            rpass.draw(0..QUAD_VERTEX_COUNT, 0..1);
        }
    }

    fn alloc(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl WgpuProgram {
    fn ensure_ring(&mut self, device: &wgpu::Device, slots: u32) {
        if self.ring.as_ref().is_some_and(|r| r.capacity >= slots) {
            return;
        }

        let capacity = slots.next_power_of_two().max(4);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("orrery uniform ring"),
            size: capacity as u64 * self.stride as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("orrery uniform bind group"),
            layout: &self.uniform_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: self.binding,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(self.block_size as u64),
                }),
            }],
        });

        log::debug!("uniform ring grown to {capacity} slots");
        self.ring = Some(UniformRing {
            buffer,
            bind_group,
            capacity,
        });
    }
}

impl GpuBackend for WgpuBackend {
    fn create_stage(&mut self, stage: &CompiledStage) -> Result<StageId, ShaderError> {
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(stage.entry_point()),
            source: wgpu::ShaderSource::Wgsl(stage.source().into()),
        });

        let id = StageId(self.alloc());
        self.stages.insert(
            id,
            WgpuStage {
                kind: stage.kind(),
                module,
            },
        );
        Ok(id)
    }

    fn create_program(
        &mut self,
        vertex: StageId,
        fragment: StageId,
        layout: &ProgramLayout,
    ) -> Result<ProgramId, ShaderError> {
        let (Some(vs), Some(fs)) = (self.stages.get(&vertex), self.stages.get(&fragment)) else {
            return Err(ShaderError::Backend(format!(
                "unknown stages {vertex:?} / {fragment:?}"
            )));
        };
        if vs.kind != StageKind::Vertex || fs.kind != StageKind::Fragment {
            return Err(ShaderError::Backend("stage kinds do not match".into()));
        }

        let attribute = |name: &str| {
            layout
                .attribute(name)
                .ok_or_else(|| ShaderError::MissingAttribute(name.to_owned()))
        };
        let position_attr = [wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: 0,
            shader_location: attribute(ShaderProgram::POSITION_ATTRIBUTE)?,
        }];
        let tex_coord_attr = [wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: 0,
            shader_location: attribute(ShaderProgram::TEX_COORD_ATTRIBUTE)?,
        }];
        let vertex_buffers = [
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &position_attr,
            },
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &tex_coord_attr,
            },
        ];

        let block = &layout.uniforms;
        let min_binding_size = NonZeroU64::new(block.size as u64)
            .ok_or_else(|| ShaderError::Backend("uniform block is empty".into()))?;

        let uniform_bgl = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("orrery uniform bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: block.binding,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: Some(min_binding_size),
                    },
                    count: None,
                }],
            });

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("orrery sprite pipeline layout"),
                bind_group_layouts: &[&uniform_bgl, &self.texture_bgl],
                immediate_size: 0,
            });

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("orrery sprite pipeline"),
                layout: Some(&pipeline_layout),

                vertex: wgpu::VertexState {
                    module: &vs.module,
                    entry_point: Some(&layout.vertex_entry),
                    compilation_options: Default::default(),
                    buffers: &vertex_buffers,
                },

                fragment: Some(wgpu::FragmentState {
                    module: &fs.module,
                    entry_point: Some(&layout.fragment_entry),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.surface_format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
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

                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        let stride = uniform_stride(block.size, self.uniform_alignment);

        let id = ProgramId(self.alloc());
        self.programs.insert(
            id,
            WgpuProgram {
                pipeline,
                uniform_bgl,
                binding: block.binding,
                block_size: block.size,
                stride,
                shadow: vec![0; block.size as usize],
                ring: None,
            },
        );
        Ok(id)
    }

    fn delete_stage(&mut self, stage: StageId) {
        self.stages.remove(&stage);
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.programs.remove(&program);
        self.frame.forget_program(program);
        if self.current == Some(program) {
            self.current = None;
        }
    }

    fn use_program(&mut self, program: ProgramId) {
        self.current = Some(program);
    }

    fn current_program(&self) -> Option<ProgramId> {
        self.current
    }

    fn write_uniform(&mut self, program: ProgramId, location: UniformLocation, bytes: &[u8]) {
        let Some(p) = self.programs.get_mut(&program) else { return };
        let start = location.0 as usize;
        match p.shadow.get_mut(start..start + bytes.len()) {
            Some(dst) => dst.copy_from_slice(bytes),
            None => log::warn!("uniform write at {location:?} exceeds block size"),
        }
    }

    fn create_texture(&mut self, image: &image::RgbaImage) -> TextureId {
        let (width, height) = image.dimensions();
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("orrery sprite texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("orrery texture bind group"),
            layout: &self.texture_bgl,
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

        let id = TextureId(self.alloc());
        self.textures.insert(
            id,
            WgpuTexture {
                _texture: texture,
                bind_group,
            },
        );
        id
    }

    fn clear(&mut self, color: Color) {
        self.frame.clear(color);
    }

    fn bind_texture(&mut self, texture: TextureId) {
        self.bound_texture = Some(texture);
    }

    fn draw_quad(&mut self) {
        let Some(program) = self.current else {
            log::warn!("draw_quad without a bound program; skipped");
            return;
        };
        let Some(p) = self.programs.get(&program) else { return };

        self.frame.push(PendingDraw {
            program,
            texture: self.bound_texture.unwrap_or(self.fallback_texture),
            uniforms: p.shadow.clone(),
        });
    }
}
