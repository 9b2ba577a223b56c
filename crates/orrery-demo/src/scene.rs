use orrery_engine::paint::Color;
use orrery_engine::render::GpuBackend;
use orrery_engine::shader::ShaderProgram;
use orrery_engine::sprite::{Sprite, draw_sprites};

/// The animated scene: a list of sprites advanced by elapsed time.
#[derive(Debug, Clone)]
pub struct Simulation {
    sprites: Vec<Sprite>,
}

impl Simulation {
    pub fn new(sprites: Vec<Sprite>) -> Self {
        Self { sprites }
    }

    /// Advances every sprite by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        for sprite in &mut self.sprites {
            sprite.advance(dt);
        }
    }

    pub fn draw<B>(&self, backend: &mut B, program: &ShaderProgram, clear: Color)
    where
        B: GpuBackend + ?Sized,
    {
        draw_sprites(backend, program, &self.sprites, clear);
    }

    pub fn sprites(&self) -> &[Sprite] {
        &self.sprites
    }
}
