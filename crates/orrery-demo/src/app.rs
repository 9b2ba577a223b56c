use anyhow::{Context, Result};
use glam::Mat4;
use orrery_engine::core::{App, AppControl, FrameCtx};
use orrery_engine::render::{GpuBackend, RenderCtx, WgpuBackend, load_texture};
use orrery_engine::shader::ShaderProgram;

use crate::config::DemoConfig;
use crate::scene::Simulation;

/// GPU-side state, alive between `on_init` and `on_exit`.
struct Loaded {
    backend: WgpuBackend,
    program: ShaderProgram,
    simulation: Simulation,
}

pub struct DemoApp {
    config: DemoConfig,
    loaded: Option<Loaded>,
}

impl DemoApp {
    pub fn new(config: DemoConfig) -> Self {
        Self {
            config,
            loaded: None,
        }
    }
}

fn load_simulation<B>(backend: &mut B, config: &DemoConfig) -> Result<Simulation>
where
    B: GpuBackend + ?Sized,
{
    let mut sprites = Vec::with_capacity(config.sprites.len());
    for sprite in &config.sprites {
        let texture = load_texture(backend, &sprite.texture)?;
        sprites.push(sprite.build(texture));
    }
    Ok(Simulation::new(sprites))
}

/// Loads the program and every sprite texture, then sets the per-run
/// uniforms. On failure nothing the program created is left alive.
fn load_scene<B>(backend: &mut B, config: &DemoConfig) -> Result<(ShaderProgram, Simulation)>
where
    B: GpuBackend + ?Sized,
{
    let program = ShaderProgram::load_files(backend, &config.vertex_shader, &config.fragment_shader)
        .context("failed to load sprite shader program")?;

    let simulation = match load_simulation(backend, config) {
        Ok(sim) => sim,
        Err(err) => {
            program.cleanup(backend);
            return Err(err.context("failed to load sprite textures"));
        }
    };

    // Uniform writes only land on the bound program.
    program.bind(backend);
    program.set_view_matrix(backend, &Mat4::IDENTITY);
    program.set_projection_matrix(backend, &config.projection.matrix());
    program.set_color(backend, config.tint);

    Ok((program, simulation))
}

impl App for DemoApp {
    fn on_init(&mut self, ctx: &RenderCtx<'_>) -> Result<()> {
        let mut backend = WgpuBackend::new(ctx);
        let (program, simulation) = load_scene(&mut backend, &self.config)?;

        log::info!("scene ready: {} sprites", simulation.sprites().len());
        self.loaded = Some(Loaded {
            backend,
            program,
            simulation,
        });
        Ok(())
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Some(loaded) = self.loaded.as_mut() else {
            return AppControl::Exit;
        };
        let Loaded {
            backend,
            program,
            simulation,
        } = loaded;

        simulation.update(ctx.time.dt);
        simulation.draw(&mut *backend, program, self.config.clear_color);

        ctx.render(|_rctx, target| backend.encode(target))
    }

    fn on_exit(&mut self) {
        if let Some(Loaded {
            mut backend,
            program,
            ..
        }) = self.loaded.take()
        {
            program.cleanup(&mut backend);
            log::debug!("shader program released");
        }
    }
}

#[cfg(test)]
mod tests {
    use orrery_engine::render::RecordingBackend;

    use super::*;

    #[test]
    fn scene_loads_program_and_sets_run_uniforms() {
        let config = DemoConfig::default();
        let mut backend = RecordingBackend::new();

        let (program, simulation) = load_scene(&mut backend, &config).unwrap();

        assert_eq!(simulation.sprites().len(), 2);
        assert_eq!(backend.current_program(), Some(program.id()));
        assert_eq!(
            backend.uniform_mat4(program.id(), program.view_location()),
            Some(Mat4::IDENTITY)
        );
        assert_eq!(
            backend.uniform_mat4(program.id(), program.projection_location()),
            Some(config.projection.matrix())
        );
        assert_eq!(
            backend.uniform_vec4(program.id(), program.color_location()),
            Some(config.tint.to_array())
        );

        program.cleanup(&mut backend);
        assert_eq!(backend.live_resources(), 0);
    }

    #[test]
    fn missing_texture_fails_and_releases_program() {
        let mut config = DemoConfig::default();
        config.sprites[1].texture = "/definitely/not/here/fly.png".into();
        let mut backend = RecordingBackend::new();

        let err = load_scene(&mut backend, &config).unwrap_err();

        assert!(format!("{err:#}").contains("fly.png"));
        assert_eq!(backend.live_resources(), 0);
        assert_eq!(backend.draws().count(), 0);
    }

    #[test]
    fn missing_shader_fails_before_creating_anything() {
        let mut config = DemoConfig::default();
        config.vertex_shader = "/definitely/not/here/vertex.wgsl".into();
        let mut backend = RecordingBackend::new();

        assert!(load_scene(&mut backend, &config).is_err());
        assert_eq!(backend.live_resources(), 0);
    }
}
