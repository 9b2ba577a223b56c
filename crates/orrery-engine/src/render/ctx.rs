/// What a backend needs from the GPU layer to build sprite pipelines.
pub struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    /// Color target format of every sprite pipeline.
    pub surface_format: wgpu::TextureFormat,
    /// Required spacing of dynamic uniform offsets, in bytes.
    pub uniform_alignment: u32,
}

impl<'a> RenderCtx<'a> {
    pub fn new(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let uniform_alignment = device.limits().min_uniform_buffer_offset_alignment.max(1);
        Self {
            device,
            queue,
            surface_format,
            uniform_alignment,
        }
    }
}

/// Rounds a uniform block size up to the next dynamic offset boundary.
pub(crate) fn uniform_stride(block_size: u32, alignment: u32) -> u32 {
    block_size.div_ceil(alignment) * alignment
}

/// One frame's color attachment and the encoder recording into it.
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub color_view: &'a wgpu::TextureView,
}

impl<'a> RenderTarget<'a> {
    #[inline]
    pub fn new(encoder: &'a mut wgpu::CommandEncoder, color_view: &'a wgpu::TextureView) -> Self {
        Self { encoder, color_view }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_rounds_up_to_alignment() {
        assert_eq!(uniform_stride(208, 256), 256);
        assert_eq!(uniform_stride(256, 256), 256);
        assert_eq!(uniform_stride(257, 256), 512);
        assert_eq!(uniform_stride(208, 1), 208);
    }
}
