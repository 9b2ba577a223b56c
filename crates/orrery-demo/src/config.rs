use std::path::{Path, PathBuf};

use glam::{Mat4, Vec2};
use orrery_engine::device::GpuInit;
use orrery_engine::logging::LoggingConfig;
use orrery_engine::paint::Color;
use orrery_engine::render::TextureId;
use orrery_engine::sprite::{Composition, Motion, Sprite};
use orrery_engine::window::RuntimeConfig;

/// Orthographic projection bounds in world units.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ortho {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl Ortho {
    /// Right-handed orthographic matrix with a [0, 1] depth range.
    pub fn matrix(&self) -> Mat4 {
        Mat4::orthographic_rh(self.left, self.right, self.bottom, self.top, self.near, self.far)
    }
}

impl Default for Ortho {
    fn default() -> Self {
        Self {
            left: -5.0,
            right: 5.0,
            bottom: -3.75,
            top: 3.75,
            near: -1.0,
            far: 1.0,
        }
    }
}

/// Initial state of one sprite.
#[derive(Debug, Clone)]
pub struct SpriteConfig {
    pub texture: PathBuf,
    pub position: Vec2,
    /// Degrees.
    pub angle: f32,
    pub motion: Motion,
    pub composition: Composition,
}

impl SpriteConfig {
    pub fn build(&self, texture: TextureId) -> Sprite {
        Sprite::new(
            texture,
            self.position,
            self.angle,
            self.motion,
            self.composition,
        )
    }
}

/// Everything the demo needs to start. There are no CLI flags; edit the
/// defaults to change the scene.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub runtime: RuntimeConfig,
    pub gpu: GpuInit,
    pub logging: LoggingConfig,

    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,

    pub clear_color: Color,
    pub tint: Color,
    pub projection: Ortho,

    /// Drawn in order.
    pub sprites: Vec<SpriteConfig>,
}

fn crate_path(rel: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(rel)
}

impl Default for DemoConfig {
    fn default() -> Self {
        let earth = SpriteConfig {
            texture: crate_path("assets/earth.png"),
            position: Vec2::ZERO,
            angle: 0.0,
            motion: Motion {
                velocity: Vec2::ZERO,
                angular_velocity: -90.0,
            },
            composition: Composition::RotateScale { factor: 2.0 },
        };

        let hero = SpriteConfig {
            texture: crate_path("assets/fly.png"),
            position: Vec2::new(2.0, 1.0),
            angle: 0.0,
            motion: Motion {
                velocity: Vec2::new(0.05, 0.0),
                angular_velocity: 45.0,
            },
            composition: Composition::RotateTranslate { depth: 1.0 },
        };

        Self {
            runtime: RuntimeConfig::default(),
            gpu: GpuInit::default(),
            logging: LoggingConfig::default(),
            vertex_shader: crate_path("shaders/vertex_textured.wgsl"),
            fragment_shader: crate_path("shaders/fragment_textured.wgsl"),
            clear_color: Color::new(0.2, 0.5, 0.7, 1.0),
            tint: Color::WHITE,
            projection: Ortho::default(),
            sprites: vec![earth, hero],
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    #[test]
    fn projection_maps_bounds_to_clip_edges() {
        let m = Ortho::default().matrix();
        let top_right = m.transform_point3(Vec3::new(5.0, 3.75, 0.0));
        let bottom_left = m.transform_point3(Vec3::new(-5.0, -3.75, 0.0));
        assert!(top_right.truncate().abs_diff_eq(Vec2::new(1.0, 1.0), 1e-6));
        assert!(bottom_left.truncate().abs_diff_eq(Vec2::new(-1.0, -1.0), 1e-6));
    }

    #[test]
    fn sprite_depths_fall_inside_clip_range() {
        let m = Ortho::default().matrix();
        for z in [0.0, 1.0] {
            let depth = m.transform_point3(Vec3::new(0.0, 0.0, z)).z;
            assert!((0.0..=1.0).contains(&depth), "z={z} -> {depth}");
        }
    }

    #[test]
    fn default_scene_is_earth_then_hero() {
        let cfg = DemoConfig::default();
        assert_eq!(cfg.sprites.len(), 2);
        assert!(cfg.sprites[0].texture.ends_with("assets/earth.png"));
        assert!(cfg.sprites[1].texture.ends_with("assets/fly.png"));
        assert_eq!(cfg.sprites[1].position, Vec2::new(2.0, 1.0));
    }

    #[test]
    fn shipped_assets_exist() {
        let cfg = DemoConfig::default();
        assert!(cfg.vertex_shader.is_file());
        assert!(cfg.fragment_shader.is_file());
        for sprite in &cfg.sprites {
            assert!(sprite.texture.is_file(), "{}", sprite.texture.display());
        }
    }
}
