use crate::paint::Color;
use crate::render::GpuBackend;
use crate::shader::ShaderProgram;

use super::Sprite;

/// Clears the target and draws `sprites` in slice order through `program`.
///
/// Per sprite: bind its texture, push its model matrix, draw the shared
/// quad. Presenting the frame is the caller's job.
pub fn draw_sprites<B>(backend: &mut B, program: &ShaderProgram, sprites: &[Sprite], clear: Color)
where
    B: GpuBackend + ?Sized,
{
    backend.clear(clear);
    program.bind(backend);

    for sprite in sprites {
        backend.bind_texture(sprite.texture);
        program.set_model_matrix(backend, &sprite.model_matrix());
        backend.draw_quad();
    }
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec2};

    use super::*;
    use crate::render::{RecordedCommand, RecordingBackend, TextureId};
    use crate::shader::reflect::tests::{FRAGMENT_SRC, VERTEX_SRC};
    use crate::sprite::{Composition, Motion};

    fn sprite(texture: u32, angle: f32, composition: Composition) -> Sprite {
        Sprite::new(
            TextureId(texture),
            Vec2::new(2.0, 1.0),
            angle,
            Motion::default(),
            composition,
        )
    }

    #[test]
    fn draws_in_order_with_each_sprites_matrix_and_texture() {
        let mut backend = RecordingBackend::new();
        let program = ShaderProgram::load(&mut backend, VERTEX_SRC, FRAGMENT_SRC).unwrap();
        let sprites = [
            sprite(10, -90.0, Composition::RotateScale { factor: 2.0 }),
            sprite(11, 45.0, Composition::RotateTranslate { depth: 1.0 }),
        ];

        draw_sprites(&mut backend, &program, &sprites, Color::new(0.2, 0.5, 0.7, 1.0));

        assert_eq!(
            backend.commands().first(),
            Some(&RecordedCommand::Clear(Color::new(0.2, 0.5, 0.7, 1.0)))
        );

        let draws: Vec<_> = backend.draws().collect();
        assert_eq!(draws.len(), 2);
        for (draw, sprite) in draws.iter().zip(&sprites) {
            assert_eq!(draw.program, program.id());
            assert_eq!(draw.texture, Some(sprite.texture));
            assert_eq!(
                draw.mat4_at(program.model_location()),
                Some(sprite.model_matrix())
            );
        }
    }

    #[test]
    fn empty_sprite_list_only_clears() {
        let mut backend = RecordingBackend::new();
        let program = ShaderProgram::load(&mut backend, VERTEX_SRC, FRAGMENT_SRC).unwrap();

        draw_sprites(&mut backend, &program, &[], Color::WHITE);

        assert_eq!(backend.draws().count(), 0);
        assert!(matches!(backend.commands()[0], RecordedCommand::Clear(_)));
        assert_eq!(
            backend.uniform_mat4(program.id(), program.model_location()),
            Some(Mat4::ZERO)
        );
    }
}
