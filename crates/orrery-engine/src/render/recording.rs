use std::collections::HashMap;

use glam::Mat4;

use crate::paint::Color;
use crate::shader::{CompiledStage, ProgramLayout, ShaderError, StageKind, UniformLocation};

use super::backend::{GpuBackend, ProgramId, StageId, TextureId};

/// A command observed by [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    Clear(Color),
    UseProgram(ProgramId),
    BindTexture(TextureId),
    Draw(RecordedDraw),
}

/// Snapshot of the state a quad draw was issued with.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub program: ProgramId,
    pub texture: Option<TextureId>,
    /// The whole uniform block as it was at draw time.
    pub uniforms: Vec<u8>,
}

impl RecordedDraw {
    pub fn mat4_at(&self, location: UniformLocation) -> Option<Mat4> {
        read_mat4(&self.uniforms, location)
    }
}

#[derive(Debug)]
struct RecordedProgram {
    uniforms: Vec<u8>,
}

/// Headless backend that records commands instead of talking to a GPU.
///
/// Tracks live stages and programs so tests can check that everything a
/// program creates is released again.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_id: u32,
    stages: HashMap<StageId, StageKind>,
    programs: HashMap<ProgramId, RecordedProgram>,
    textures: HashMap<TextureId, (u32, u32)>,
    current: Option<ProgramId>,
    texture: Option<TextureId>,
    commands: Vec<RecordedCommand>,
    fail_program_creation: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following `create_program` call fail.
    pub fn fail_program_creation(&mut self, fail: bool) {
        self.fail_program_creation = fail;
    }

    pub fn live_stages(&self) -> usize {
        self.stages.len()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    /// Stages plus programs. Textures belong to the loader and are not counted.
    pub fn live_resources(&self) -> usize {
        self.live_stages() + self.live_programs()
    }

    pub fn texture_size(&self, texture: TextureId) -> Option<(u32, u32)> {
        self.textures.get(&texture).copied()
    }

    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    /// Drains the recorded commands, e.g. at the end of a simulated frame.
    pub fn take_commands(&mut self) -> Vec<RecordedCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn draws(&self) -> impl Iterator<Item = &RecordedDraw> {
        self.commands.iter().filter_map(|c| match c {
            RecordedCommand::Draw(d) => Some(d),
            _ => None,
        })
    }

    pub fn uniform_mat4(&self, program: ProgramId, location: UniformLocation) -> Option<Mat4> {
        read_mat4(&self.programs.get(&program)?.uniforms, location)
    }

    pub fn uniform_vec4(&self, program: ProgramId, location: UniformLocation) -> Option<[f32; 4]> {
        let bytes = &self.programs.get(&program)?.uniforms;
        let start = location.0 as usize;
        let slice = bytes.get(start..start + 16)?;
        Some(bytemuck::pod_read_unaligned(slice))
    }

    fn alloc(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

fn read_mat4(bytes: &[u8], location: UniformLocation) -> Option<Mat4> {
    let start = location.0 as usize;
    let slice = bytes.get(start..start + 64)?;
    let cols: [f32; 16] = bytemuck::pod_read_unaligned(slice);
    Some(Mat4::from_cols_array(&cols))
}

impl GpuBackend for RecordingBackend {
    fn create_stage(&mut self, stage: &CompiledStage) -> Result<StageId, ShaderError> {
        let id = StageId(self.alloc());
        self.stages.insert(id, stage.kind());
        Ok(id)
    }

    fn create_program(
        &mut self,
        vertex: StageId,
        fragment: StageId,
        layout: &ProgramLayout,
    ) -> Result<ProgramId, ShaderError> {
        if self.fail_program_creation {
            return Err(ShaderError::Backend("program creation disabled".into()));
        }
        if self.stages.get(&vertex) != Some(&StageKind::Vertex)
            || self.stages.get(&fragment) != Some(&StageKind::Fragment)
        {
            return Err(ShaderError::Backend(format!(
                "invalid stages {vertex:?} / {fragment:?}"
            )));
        }

        let id = ProgramId(self.alloc());
        self.programs.insert(
            id,
            RecordedProgram {
                uniforms: vec![0; layout.uniforms.size as usize],
            },
        );
        Ok(id)
    }

    fn delete_stage(&mut self, stage: StageId) {
        self.stages.remove(&stage);
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.programs.remove(&program);
        if self.current == Some(program) {
            self.current = None;
        }
    }

    fn use_program(&mut self, program: ProgramId) {
        self.current = Some(program);
        self.commands.push(RecordedCommand::UseProgram(program));
    }

    fn current_program(&self) -> Option<ProgramId> {
        self.current
    }

    fn write_uniform(&mut self, program: ProgramId, location: UniformLocation, bytes: &[u8]) {
        let Some(p) = self.programs.get_mut(&program) else { return };
        let start = location.0 as usize;
        match p.uniforms.get_mut(start..start + bytes.len()) {
            Some(dst) => dst.copy_from_slice(bytes),
            None => log::warn!("uniform write at {location:?} exceeds block size"),
        }
    }

    fn create_texture(&mut self, image: &image::RgbaImage) -> TextureId {
        let id = TextureId(self.alloc());
        self.textures.insert(id, image.dimensions());
        id
    }

    fn clear(&mut self, color: Color) {
        self.commands.push(RecordedCommand::Clear(color));
    }

    fn bind_texture(&mut self, texture: TextureId) {
        self.texture = Some(texture);
        self.commands.push(RecordedCommand::BindTexture(texture));
    }

    fn draw_quad(&mut self) {
        let Some(program) = self.current else {
            log::warn!("draw_quad without a bound program; skipped");
            return;
        };
        let Some(p) = self.programs.get(&program) else { return };
        self.commands.push(RecordedCommand::Draw(RecordedDraw {
            program,
            texture: self.texture,
            uniforms: p.uniforms.clone(),
        }));
    }
}
