use std::fmt;
use std::path::{Path, PathBuf};

use super::{GpuBackend, TextureId};

/// Failure to read or decode a texture file.
#[derive(Debug)]
pub struct TextureError {
    pub path: PathBuf,
    pub source: image::ImageError,
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unable to load image {}: {}", self.path.display(), self.source)
    }
}

impl std::error::Error for TextureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Decodes an image file to RGBA8 and uploads it through `backend`.
pub fn load_texture<B>(backend: &mut B, path: impl AsRef<Path>) -> Result<TextureId, TextureError>
where
    B: GpuBackend + ?Sized,
{
    let path = path.as_ref();
    let image = image::open(path)
        .map_err(|source| TextureError {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();

    let (w, h) = image.dimensions();
    let id = backend.create_texture(&image);
    log::debug!("texture {} ({w}x{h}) -> {id:?}", path.display());
    Ok(id)
}
