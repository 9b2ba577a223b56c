use std::path::Path;

use glam::Mat4;

use crate::paint::Color;
use crate::render::{GpuBackend, ProgramId, StageId};

use super::reflect::{compile_stage, link, ProgramLayout, StageKind, UniformKind};
use super::ShaderError;

/// Byte offset of a member inside the program's uniform block.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct UniformLocation(pub u32);

/// `@location` index of a vertex input.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct AttributeLocation(pub u32);

/// A linked vertex + fragment program with its standard per-draw uniforms.
///
/// Every location is resolved once, by name, during [`ShaderProgram::load`]
/// and never changes afterwards. Uniform setters only take effect while the
/// program is the backend's current program; call [`bind`](Self::bind) first.
///
/// The GPU objects are released by [`cleanup`](Self::cleanup), which
/// consumes the program.
#[derive(Debug)]
pub struct ShaderProgram {
    program: ProgramId,
    vertex_stage: StageId,
    fragment_stage: StageId,

    model: UniformLocation,
    view: UniformLocation,
    projection: UniformLocation,
    color: UniformLocation,

    position: AttributeLocation,
    tex_coord: AttributeLocation,
}

impl ShaderProgram {
    pub const MODEL_UNIFORM: &'static str = "model";
    pub const VIEW_UNIFORM: &'static str = "view";
    pub const PROJECTION_UNIFORM: &'static str = "projection";
    pub const COLOR_UNIFORM: &'static str = "color";
    pub const POSITION_ATTRIBUTE: &'static str = "position";
    pub const TEX_COORD_ATTRIBUTE: &'static str = "tex_coord";

    /// Reads two UTF-8 WGSL files and loads them as a program.
    pub fn load_files<B>(
        backend: &mut B,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Self, ShaderError>
    where
        B: GpuBackend + ?Sized,
    {
        let vertex_source = read_source(vertex_path.as_ref())?;
        let fragment_source = read_source(fragment_path.as_ref())?;
        Self::load(backend, &vertex_source, &fragment_source)
    }

    /// Compiles both stages, links them and resolves every location.
    ///
    /// All validation happens before the backend creates anything. If the
    /// backend itself fails part way, objects it already created are
    /// released before the error is returned.
    pub fn load<B>(
        backend: &mut B,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, ShaderError>
    where
        B: GpuBackend + ?Sized,
    {
        let vertex = compile_stage(StageKind::Vertex, vertex_source)?;
        let fragment = compile_stage(StageKind::Fragment, fragment_source)?;
        let layout = link(&vertex, &fragment)?;

        let model = uniform_location(&layout, Self::MODEL_UNIFORM, UniformKind::Mat4)?;
        let view = uniform_location(&layout, Self::VIEW_UNIFORM, UniformKind::Mat4)?;
        let projection = uniform_location(&layout, Self::PROJECTION_UNIFORM, UniformKind::Mat4)?;
        let color = uniform_location(&layout, Self::COLOR_UNIFORM, UniformKind::Vec4)?;
        let position = attribute_location(&layout, Self::POSITION_ATTRIBUTE)?;
        let tex_coord = attribute_location(&layout, Self::TEX_COORD_ATTRIBUTE)?;

        let vertex_stage = backend.create_stage(&vertex)?;
        let fragment_stage = match backend.create_stage(&fragment) {
            Ok(id) => id,
            Err(e) => {
                backend.delete_stage(vertex_stage);
                return Err(e);
            }
        };
        let program = match backend.create_program(vertex_stage, fragment_stage, &layout) {
            Ok(id) => id,
            Err(e) => {
                backend.delete_stage(fragment_stage);
                backend.delete_stage(vertex_stage);
                return Err(e);
            }
        };

        log::info!("shader program {program:?} loaded");

        Ok(Self {
            program,
            vertex_stage,
            fragment_stage,
            model,
            view,
            projection,
            color,
            position,
            tex_coord,
        })
    }

    /// Makes this program current on `backend`.
    pub fn bind<B: GpuBackend + ?Sized>(&self, backend: &mut B) {
        backend.use_program(self.program);
    }

    pub fn set_model_matrix<B: GpuBackend + ?Sized>(&self, backend: &mut B, matrix: &Mat4) {
        self.upload_mat4(backend, self.model, matrix);
    }

    pub fn set_view_matrix<B: GpuBackend + ?Sized>(&self, backend: &mut B, matrix: &Mat4) {
        self.upload_mat4(backend, self.view, matrix);
    }

    pub fn set_projection_matrix<B: GpuBackend + ?Sized>(&self, backend: &mut B, matrix: &Mat4) {
        self.upload_mat4(backend, self.projection, matrix);
    }

    /// Straight-alpha tint uniform.
    pub fn set_color<B: GpuBackend + ?Sized>(&self, backend: &mut B, color: Color) {
        self.upload(backend, self.color, bytemuck::cast_slice(&color.to_array()));
    }

    /// Releases the program and both stages.
    pub fn cleanup<B: GpuBackend + ?Sized>(self, backend: &mut B) {
        backend.delete_program(self.program);
        backend.delete_stage(self.vertex_stage);
        backend.delete_stage(self.fragment_stage);
        log::debug!("shader program {:?} released", self.program);
    }

    pub fn id(&self) -> ProgramId {
        self.program
    }

    pub fn model_location(&self) -> UniformLocation {
        self.model
    }

    pub fn view_location(&self) -> UniformLocation {
        self.view
    }

    pub fn projection_location(&self) -> UniformLocation {
        self.projection
    }

    pub fn color_location(&self) -> UniformLocation {
        self.color
    }

    pub fn position_attribute(&self) -> AttributeLocation {
        self.position
    }

    pub fn tex_coord_attribute(&self) -> AttributeLocation {
        self.tex_coord
    }

    fn upload_mat4<B: GpuBackend + ?Sized>(
        &self,
        backend: &mut B,
        location: UniformLocation,
        matrix: &Mat4,
    ) {
        // Column-major, matching WGSL's mat4x4 memory layout.
        let cols = matrix.to_cols_array();
        self.upload(backend, location, bytemuck::cast_slice(&cols));
    }

    fn upload<B: GpuBackend + ?Sized>(&self, backend: &mut B, location: UniformLocation, bytes: &[u8]) {
        if backend.current_program() != Some(self.program) {
            log::trace!(
                "uniform write at {location:?} skipped: program {:?} is not bound",
                self.program
            );
            return;
        }
        backend.write_uniform(self.program, location, bytes);
    }
}

fn read_source(path: &Path) -> Result<String, ShaderError> {
    std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn uniform_location(
    layout: &ProgramLayout,
    name: &str,
    kind: UniformKind,
) -> Result<UniformLocation, ShaderError> {
    let member = layout
        .uniform(name)
        .ok_or_else(|| ShaderError::MissingUniform(name.to_owned()))?;

    if member.kind != kind {
        let expected = match kind {
            UniformKind::Mat4 => "mat4x4<f32>",
            UniformKind::Vec4 => "vec4<f32>",
            UniformKind::Other => "supported type",
        };
        return Err(ShaderError::UniformType {
            name: name.to_owned(),
            expected,
        });
    }

    Ok(UniformLocation(member.offset))
}

fn attribute_location(layout: &ProgramLayout, name: &str) -> Result<AttributeLocation, ShaderError> {
    layout
        .attribute(name)
        .map(AttributeLocation)
        .ok_or_else(|| ShaderError::MissingAttribute(name.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingBackend;
    use crate::shader::reflect::tests::{FRAGMENT_SRC, VERTEX_SRC};

    fn load(backend: &mut RecordingBackend) -> ShaderProgram {
        ShaderProgram::load(backend, VERTEX_SRC, FRAGMENT_SRC).unwrap()
    }

    #[test]
    fn load_yields_valid_handle_and_distinct_locations() {
        let mut backend = RecordingBackend::new();
        let program = load(&mut backend);

        assert_ne!(program.id().0, 0);

        let mut uniforms = vec![
            program.model_location(),
            program.view_location(),
            program.projection_location(),
            program.color_location(),
        ];
        uniforms.sort();
        uniforms.dedup();
        assert_eq!(uniforms.len(), 4);

        assert_ne!(program.position_attribute(), program.tex_coord_attribute());
    }

    #[test]
    fn cleanup_returns_resource_count_to_baseline() {
        let mut backend = RecordingBackend::new();
        let baseline = backend.live_resources();

        let program = load(&mut backend);
        assert_eq!(backend.live_stages(), 2);
        assert_eq!(backend.live_programs(), 1);

        program.cleanup(&mut backend);
        assert_eq!(backend.live_resources(), baseline);
    }

    #[test]
    fn uniform_writes_are_ignored_until_bound() {
        let mut backend = RecordingBackend::new();
        let program = load(&mut backend);
        let m = Mat4::from_scale(glam::Vec3::new(2.0, 3.0, 1.0));

        program.set_model_matrix(&mut backend, &m);
        assert_eq!(
            backend.uniform_mat4(program.id(), program.model_location()),
            Some(Mat4::ZERO)
        );

        program.bind(&mut backend);
        program.set_model_matrix(&mut backend, &m);
        assert_eq!(backend.uniform_mat4(program.id(), program.model_location()), Some(m));
    }

    #[test]
    fn each_setter_targets_its_own_location() {
        let mut backend = RecordingBackend::new();
        let program = load(&mut backend);
        program.bind(&mut backend);

        let view = Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 0.0));
        let projection = Mat4::orthographic_rh(-5.0, 5.0, -3.75, 3.75, -1.0, 1.0);
        program.set_view_matrix(&mut backend, &view);
        program.set_projection_matrix(&mut backend, &projection);
        program.set_color(&mut backend, Color::new(1.0, 0.0, 0.0, 1.0));

        let id = program.id();
        assert_eq!(backend.uniform_mat4(id, program.view_location()), Some(view));
        assert_eq!(backend.uniform_mat4(id, program.projection_location()), Some(projection));
        assert_eq!(backend.uniform_mat4(id, program.model_location()), Some(Mat4::ZERO));
        assert_eq!(
            backend.uniform_vec4(id, program.color_location()),
            Some([1.0, 0.0, 0.0, 1.0])
        );
    }

    #[test]
    fn compile_failure_creates_nothing() {
        let mut backend = RecordingBackend::new();
        let err = ShaderProgram::load(&mut backend, "not wgsl", FRAGMENT_SRC).unwrap_err();
        assert!(matches!(err, ShaderError::Compile { stage: StageKind::Vertex, .. }));
        assert_eq!(backend.live_resources(), 0);
    }

    #[test]
    fn backend_link_failure_releases_stages() {
        let mut backend = RecordingBackend::new();
        backend.fail_program_creation(true);
        let err = ShaderProgram::load(&mut backend, VERTEX_SRC, FRAGMENT_SRC).unwrap_err();
        assert!(matches!(err, ShaderError::Backend(_)));
        assert_eq!(backend.live_resources(), 0);
    }

    #[test]
    fn missing_color_uniform_is_reported() {
        let vertex = VERTEX_SRC.replace("    color: vec4<f32>,\n", "");
        let mut backend = RecordingBackend::new();
        let err = ShaderProgram::load(&mut backend, &vertex, FRAGMENT_SRC).unwrap_err();
        assert!(matches!(err, ShaderError::MissingUniform(ref n) if n == "color"));
    }

    #[test]
    fn mistyped_uniform_is_reported() {
        let vertex = VERTEX_SRC.replace("color: vec4<f32>", "color: mat4x4<f32>");
        let mut backend = RecordingBackend::new();
        let err = ShaderProgram::load(&mut backend, &vertex, FRAGMENT_SRC).unwrap_err();
        assert!(matches!(err, ShaderError::UniformType { ref name, .. } if name == "color"));
    }

    #[test]
    fn missing_attribute_is_reported() {
        let vertex = VERTEX_SRC.replace("tex_coord", "uv_in");
        let mut backend = RecordingBackend::new();
        let err = ShaderProgram::load(&mut backend, &vertex, FRAGMENT_SRC).unwrap_err();
        assert!(matches!(err, ShaderError::MissingAttribute(ref n) if n == "tex_coord"));
    }

    #[test]
    fn unreadable_file_is_io_error() {
        let mut backend = RecordingBackend::new();
        let err = ShaderProgram::load_files(
            &mut backend,
            "/definitely/not/here/vertex.wgsl",
            "/definitely/not/here/fragment.wgsl",
        )
        .unwrap_err();
        assert!(matches!(err, ShaderError::Io { .. }));
        assert_eq!(backend.live_resources(), 0);
    }
}
