/// Surface and device preferences for the window's GPU context.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Use an sRGB surface format when the surface offers one. Sprite
    /// textures are uploaded as sRGB, so this keeps colors unchanged.
    pub prefer_srgb: bool,

    /// FIFO blocks `present` on vsync and is available on every backend.
    pub present_mode: wgpu::PresentMode,

    /// `None` takes the surface's first supported alpha mode.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    pub required_features: wgpu::Features,

    /// Downlevel limits by default; the sprite pipeline needs nothing more.
    pub required_limits: wgpu::Limits,

    /// Hint only.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults(),
            desired_maximum_frame_latency: 2,
        }
    }
}
