use crate::paint::Color;
use crate::shader::{CompiledStage, ProgramLayout, ShaderError, UniformLocation};

/// Opaque handle to a compiled shader stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct StageId(pub u32);

/// Opaque handle to a linked shader program. Never zero.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ProgramId(pub u32);

/// Opaque handle to an uploaded texture.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureId(pub u32);

/// GPU command surface used by shader programs and the sprite loop.
///
/// Handle-based and immediate-mode: callers bind state, then
/// draw. Backends decide when the recorded work reaches the GPU.
pub trait GpuBackend {
    /// Creates a backend object for an already validated stage.
    fn create_stage(&mut self, stage: &CompiledStage) -> Result<StageId, ShaderError>;

    /// Links two stages into a program with the given layout.
    fn create_program(
        &mut self,
        vertex: StageId,
        fragment: StageId,
        layout: &ProgramLayout,
    ) -> Result<ProgramId, ShaderError>;

    fn delete_stage(&mut self, stage: StageId);

    fn delete_program(&mut self, program: ProgramId);

    /// Makes `program` current for subsequent uniform writes and draws.
    fn use_program(&mut self, program: ProgramId);

    fn current_program(&self) -> Option<ProgramId>;

    /// Writes raw bytes into `program`'s uniform block at `location`.
    fn write_uniform(&mut self, program: ProgramId, location: UniformLocation, bytes: &[u8]);

    /// Uploads straight-alpha RGBA8 pixels.
    fn create_texture(&mut self, image: &image::RgbaImage) -> TextureId;

    /// Clears the color target at the start of the frame.
    fn clear(&mut self, color: Color);

    fn bind_texture(&mut self, texture: TextureId);

    /// Draws the shared 6-vertex quad with the current program, texture and
    /// uniform values.
    fn draw_quad(&mut self);
}
