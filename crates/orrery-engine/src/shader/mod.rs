//! Shader programs.
//!
//! WGSL sources are compiled and reflected on the CPU (`reflect`), then
//! handed to a `render::GpuBackend` which owns the GPU-side objects.
//! `ShaderProgram` is the narrow, typed surface the render loop uses.

mod error;
mod program;
pub(crate) mod reflect;

pub use error::ShaderError;
pub use program::{AttributeLocation, ShaderProgram, UniformLocation};
pub use reflect::{
    compile_stage, link, CompiledStage, ProgramLayout, StageKind, UniformBlock, UniformKind,
    UniformMember,
};
