use std::fmt;
use std::path::PathBuf;

use super::StageKind;

/// Failure while loading, compiling or linking a shader program.
#[derive(Debug)]
pub enum ShaderError {
    /// A shader source file could not be read as UTF-8 text.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A stage failed to parse or validate. `message` is the rendered
    /// diagnostic, including the offending source span.
    Compile { stage: StageKind, message: String },

    /// The source compiled but declares no entry point for its stage.
    MissingEntryPoint { stage: StageKind },

    /// The two stages cannot be combined into one program.
    Link(String),

    /// No member of the uniform block carries this name.
    MissingUniform(String),

    /// A uniform exists under the expected name but has the wrong type.
    UniformType { name: String, expected: &'static str },

    /// No vertex input carries this name.
    MissingAttribute(String),

    /// The backend refused to create a GPU object.
    Backend(String),
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::Io { path, source } => {
                write!(f, "failed to read shader source {}: {source}", path.display())
            }
            ShaderError::Compile { stage, message } => {
                write!(f, "{stage} shader failed to compile:\n{message}")
            }
            ShaderError::MissingEntryPoint { stage } => {
                write!(f, "{stage} shader has no {stage} entry point")
            }
            ShaderError::Link(msg) => write!(f, "shader program failed to link: {msg}"),
            ShaderError::MissingUniform(name) => write!(f, "uniform `{name}` not found"),
            ShaderError::UniformType { name, expected } => {
                write!(f, "uniform `{name}` must be a {expected}")
            }
            ShaderError::MissingAttribute(name) => write!(f, "vertex attribute `{name}` not found"),
            ShaderError::Backend(msg) => write!(f, "shader backend error: {msg}"),
        }
    }
}

impl std::error::Error for ShaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ShaderError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
