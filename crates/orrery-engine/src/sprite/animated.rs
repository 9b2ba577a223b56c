use glam::{Mat4, Vec2, Vec3};

use crate::render::TextureId;

/// How a sprite's model matrix is built from its state.
///
/// Both variants rotate first. The difference is observable: scaling after
/// rotation grows the sprite along its own rotated axes, translating after
/// rotation makes it revolve around the rotation pivot instead of spinning
/// in place.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Composition {
    /// `Rotate(angle) · Scale(factor, factor, 1)`. Position is not used.
    RotateScale { factor: f32 },
    /// `Rotate(angle) · Translate(x, y, depth)`.
    RotateTranslate { depth: f32 },
}

impl Composition {
    /// Builds the model matrix for the given state. Angle is in degrees.
    pub fn model_matrix(self, position: Vec2, angle: f32) -> Mat4 {
        let rotate = Mat4::from_rotation_z(angle.to_radians());
        match self {
            Composition::RotateScale { factor } => {
                rotate * Mat4::from_scale(Vec3::new(factor, factor, 1.0))
            }
            Composition::RotateTranslate { depth } => {
                rotate * Mat4::from_translation(position.extend(depth))
            }
        }
    }
}

/// Constant rates a sprite advances by each second.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Motion {
    /// World units per second.
    pub velocity: Vec2,
    /// Degrees per second. Negative is clockwise.
    pub angular_velocity: f32,
}

/// A textured quad with time-driven transform state.
///
/// `position` and `angle` are authoritative; the model matrix is rebuilt
/// from them on every `advance`, never accumulated. The angle is not
/// wrapped.
#[derive(Debug, Clone)]
pub struct Sprite {
    pub texture: TextureId,
    position: Vec2,
    angle: f32,
    motion: Motion,
    composition: Composition,
    model: Mat4,
}

impl Sprite {
    pub fn new(
        texture: TextureId,
        position: Vec2,
        angle: f32,
        motion: Motion,
        composition: Composition,
    ) -> Self {
        Self {
            texture,
            position,
            angle,
            motion,
            composition,
            model: composition.model_matrix(position, angle),
        }
    }

    /// Advances state by `dt` seconds and recomputes the model matrix.
    pub fn advance(&mut self, dt: f32) {
        self.position += self.motion.velocity * dt;
        self.angle += self.motion.angular_velocity * dt;
        self.model = self.composition.model_matrix(self.position, self.angle);
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Rotation in degrees.
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn spinner(rate: f32) -> Sprite {
        Sprite::new(
            TextureId(1),
            Vec2::ZERO,
            0.0,
            Motion {
                velocity: Vec2::ZERO,
                angular_velocity: rate,
            },
            Composition::RotateScale { factor: 2.0 },
        )
    }

    fn flyer() -> Sprite {
        Sprite::new(
            TextureId(2),
            Vec2::new(2.0, 1.0),
            0.0,
            Motion {
                velocity: Vec2::new(0.05, 0.0),
                angular_velocity: 45.0,
            },
            Composition::RotateTranslate { depth: 1.0 },
        )
    }

    #[test]
    fn two_steps_equal_one_combined_step() {
        let mut split = spinner(-90.0);
        split.advance(0.3);
        split.advance(0.45);

        let mut whole = spinner(-90.0);
        whole.advance(0.75);

        assert!((split.angle() - whole.angle()).abs() < EPS);
        assert!(split.model_matrix().abs_diff_eq(whole.model_matrix(), EPS));
    }

    #[test]
    fn zero_dt_changes_nothing() {
        let mut s = flyer();
        s.advance(0.7);
        let (pos, angle, model) = (s.position(), s.angle(), s.model_matrix());

        s.advance(0.0);
        assert_eq!(s.position(), pos);
        assert_eq!(s.angle(), angle);
        assert_eq!(s.model_matrix(), model);
    }

    #[test]
    fn rotate_scale_composes_rotation_then_scale() {
        let mut s = spinner(-90.0);
        s.advance(0.5);
        let expected = Mat4::from_rotation_z((-45.0f32).to_radians())
            * Mat4::from_scale(Vec3::new(2.0, 2.0, 1.0));
        assert_eq!(s.model_matrix(), expected);
    }

    #[test]
    fn rotate_translate_composes_rotation_then_translation() {
        let mut s = flyer();
        s.advance(2.0);
        let expected = Mat4::from_rotation_z(s.angle().to_radians())
            * Mat4::from_translation(Vec3::new(s.position().x, 1.0, 1.0));
        assert_eq!(s.model_matrix(), expected);
    }

    #[test]
    fn translated_sprite_revolves_around_pivot() {
        let s = Sprite::new(
            TextureId(1),
            Vec2::new(2.0, 1.0),
            90.0,
            Motion::default(),
            Composition::RotateTranslate { depth: 1.0 },
        );
        let center = s.model_matrix().transform_point3(Vec3::ZERO);
        assert!(center.abs_diff_eq(Vec3::new(-1.0, 2.0, 1.0), EPS));
    }

    #[test]
    fn angle_is_never_wrapped() {
        let mut s = spinner(-90.0);
        s.advance(10.0);
        assert_eq!(s.angle(), -900.0);
    }

    #[test]
    fn scale_sprite_ignores_position() {
        let a = Composition::RotateScale { factor: 2.0 }.model_matrix(Vec2::ZERO, 30.0);
        let b = Composition::RotateScale { factor: 2.0 }.model_matrix(Vec2::new(5.0, 5.0), 30.0);
        assert_eq!(a, b);
    }
}
