//! WGSL front end: parse, validate and reflect shader stages with `naga`.
//!
//! Conventions a program must follow:
//! - exactly one `var<uniform>` struct block, at `@group(0)`
//! - textures at `@group(1) @binding(0)`, samplers at `@group(1) @binding(1)`

use std::collections::BTreeSet;
use std::fmt;

use naga::valid::{Capabilities, ValidationFlags, Validator};

use super::ShaderError;

/// Pipeline stage a source is compiled for.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum StageKind {
    Vertex,
    Fragment,
}

impl StageKind {
    fn naga_stage(self) -> naga::ShaderStage {
        match self {
            StageKind::Vertex => naga::ShaderStage::Vertex,
            StageKind::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StageKind::Vertex => "vertex",
            StageKind::Fragment => "fragment",
        })
    }
}

/// A parsed and validated shader stage, ready to hand to a backend.
#[derive(Debug)]
pub struct CompiledStage {
    kind: StageKind,
    entry_point: String,
    entry_index: usize,
    source: String,
    module: naga::Module,
}

impl CompiledStage {
    pub fn kind(&self) -> StageKind {
        self.kind
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// WGSL text the stage was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    fn entry(&self) -> &naga::EntryPoint {
        &self.module.entry_points[self.entry_index]
    }
}

/// Parses and validates `source` as a `kind` stage.
///
/// The first entry point declared for the stage is used.
pub fn compile_stage(kind: StageKind, source: &str) -> Result<CompiledStage, ShaderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| ShaderError::Compile {
        stage: kind,
        message: e.emit_to_string(source),
    })?;

    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|e| ShaderError::Compile {
            stage: kind,
            message: e.emit_to_string(source),
        })?;

    let entry_index = module
        .entry_points
        .iter()
        .position(|ep| ep.stage == kind.naga_stage())
        .ok_or(ShaderError::MissingEntryPoint { stage: kind })?;
    let entry_point = module.entry_points[entry_index].name.clone();

    log::debug!("compiled {kind} stage, entry point `{entry_point}`");

    Ok(CompiledStage {
        kind,
        entry_point,
        entry_index,
        source: source.to_owned(),
        module,
    })
}

/// Type of a uniform block member, as far as the program API cares.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UniformKind {
    Mat4,
    Vec4,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UniformMember {
    pub name: String,
    /// Byte offset inside the block.
    pub offset: u32,
    pub kind: UniformKind,
}

/// The program's single uniform buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformBlock {
    pub group: u32,
    pub binding: u32,
    /// Total block size in bytes, including trailing padding.
    pub size: u32,
    pub members: Vec<UniformMember>,
}

/// Everything a backend needs to know about a linked program.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramLayout {
    pub vertex_entry: String,
    pub fragment_entry: String,
    pub uniforms: UniformBlock,
    /// Named vertex inputs and their `@location` indices.
    pub attributes: Vec<(String, u32)>,
}

impl ProgramLayout {
    pub fn uniform(&self, name: &str) -> Option<&UniformMember> {
        self.uniforms.members.iter().find(|m| m.name == name)
    }

    pub fn attribute(&self, name: &str) -> Option<u32> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, loc)| *loc)
    }
}

const TEXTURE_GROUP: u32 = 1;
const TEXTURE_BINDING: u32 = 0;
const SAMPLER_BINDING: u32 = 1;

/// Checks that the two stages fit together and extracts the program layout.
pub fn link(vertex: &CompiledStage, fragment: &CompiledStage) -> Result<ProgramLayout, ShaderError> {
    if vertex.kind != StageKind::Vertex || fragment.kind != StageKind::Fragment {
        return Err(ShaderError::Link(format!(
            "expected vertex + fragment stages, got {} + {}",
            vertex.kind, fragment.kind
        )));
    }

    let outputs: BTreeSet<u32> = vertex
        .entry()
        .function
        .result
        .as_ref()
        .map(|r| io_locations(&vertex.module, None, r.ty, r.binding.as_ref()))
        .unwrap_or_default()
        .into_iter()
        .map(|(_, loc)| loc)
        .collect();

    for arg in &fragment.entry().function.arguments {
        let inputs = io_locations(&fragment.module, arg.name.as_deref(), arg.ty, arg.binding.as_ref());
        for (name, loc) in inputs {
            if !outputs.contains(&loc) {
                return Err(ShaderError::Link(format!(
                    "fragment input `{name}` at @location({loc}) has no matching vertex output"
                )));
            }
        }
    }

    let uniforms = match (uniform_block(&vertex.module)?, uniform_block(&fragment.module)?) {
        (Some(v), Some(f)) if v != f => {
            return Err(ShaderError::Link(
                "vertex and fragment stages declare different uniform blocks".into(),
            ));
        }
        (Some(block), _) | (None, Some(block)) => block,
        (None, None) => return Err(ShaderError::Link("no uniform block declared".into())),
    };

    if uniforms.group != 0 {
        return Err(ShaderError::Link(format!(
            "uniform block must live in @group(0), found @group({})",
            uniforms.group
        )));
    }

    check_texture_bindings(&fragment.module)?;

    let mut attributes = Vec::new();
    for arg in &vertex.entry().function.arguments {
        let name = arg.name.as_deref();
        attributes.extend(io_locations(&vertex.module, name, arg.ty, arg.binding.as_ref()));
    }

    log::debug!(
        "linked program: {} uniform bytes, {} attributes",
        uniforms.size,
        attributes.len()
    );

    Ok(ProgramLayout {
        vertex_entry: vertex.entry_point.clone(),
        fragment_entry: fragment.entry_point.clone(),
        uniforms,
        attributes,
    })
}

/// Collects `(name, location)` pairs for an entry-point argument or result,
/// looking through a struct if the value itself carries no binding.
fn io_locations(
    module: &naga::Module,
    name: Option<&str>,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
) -> Vec<(String, u32)> {
    match binding {
        Some(naga::Binding::Location { location, .. }) => {
            vec![(name.unwrap_or_default().to_owned(), *location)]
        }
        Some(naga::Binding::BuiltIn(_)) => Vec::new(),
        None => match &module.types[ty].inner {
            naga::TypeInner::Struct { members, .. } => members
                .iter()
                .filter_map(|m| match m.binding {
                    Some(naga::Binding::Location { location, .. }) => {
                        Some((m.name.clone().unwrap_or_default(), location))
                    }
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        },
    }
}

fn uniform_block(module: &naga::Module) -> Result<Option<UniformBlock>, ShaderError> {
    let mut blocks = module.global_variables.iter().filter_map(|(_, var)| {
        if var.space != naga::AddressSpace::Uniform {
            return None;
        }
        let binding = var.binding.as_ref()?;
        let naga::TypeInner::Struct { members, span } = &module.types[var.ty].inner else {
            return None;
        };

        let members = members
            .iter()
            .map(|m| UniformMember {
                name: m.name.clone().unwrap_or_default(),
                offset: m.offset,
                kind: uniform_kind(&module.types[m.ty].inner),
            })
            .collect();

        Some(UniformBlock {
            group: binding.group,
            binding: binding.binding,
            size: *span,
            members,
        })
    });

    let first = blocks.next();
    if let Some(extra) = blocks.next() {
        return Err(ShaderError::Link(format!(
            "only one uniform block is supported, found another at @group({}) @binding({})",
            extra.group, extra.binding
        )));
    }
    Ok(first)
}

fn uniform_kind(inner: &naga::TypeInner) -> UniformKind {
    match *inner {
        naga::TypeInner::Matrix {
            columns: naga::VectorSize::Quad,
            rows: naga::VectorSize::Quad,
            scalar,
        } if scalar == naga::Scalar::F32 => UniformKind::Mat4,
        naga::TypeInner::Vector {
            size: naga::VectorSize::Quad,
            scalar,
        } if scalar == naga::Scalar::F32 => UniformKind::Vec4,
        _ => UniformKind::Other,
    }
}

fn check_texture_bindings(module: &naga::Module) -> Result<(), ShaderError> {
    for (_, var) in module.global_variables.iter() {
        let Some(binding) = var.binding.as_ref() else { continue };
        let expected = match module.types[var.ty].inner {
            naga::TypeInner::Image { .. } => TEXTURE_BINDING,
            naga::TypeInner::Sampler { .. } => SAMPLER_BINDING,
            _ => continue,
        };
        if binding.group != TEXTURE_GROUP || binding.binding != expected {
            let name = var.name.as_deref().unwrap_or("<unnamed>");
            return Err(ShaderError::Link(format!(
                "`{name}` must be bound at @group({TEXTURE_GROUP}) @binding({expected})"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const VERTEX_SRC: &str = r#"
struct Uniforms {
    model: mat4x4<f32>,
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    color: vec4<f32>,
}

@group(0) @binding(0) var<uniform> u: Uniforms;

struct VsOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@location(0) position: vec2<f32>, @location(1) tex_coord: vec2<f32>) -> VsOut {
    var out: VsOut;
    out.clip = u.projection * u.view * u.model * vec4<f32>(position, 0.0, 1.0);
    out.uv = tex_coord;
    return out;
}
"#;

    pub(crate) const FRAGMENT_SRC: &str = r#"
@group(1) @binding(0) var sprite_texture: texture_2d<f32>;
@group(1) @binding(1) var sprite_sampler: sampler;

@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return textureSample(sprite_texture, sprite_sampler, uv);
}
"#;

    fn stages() -> (CompiledStage, CompiledStage) {
        (
            compile_stage(StageKind::Vertex, VERTEX_SRC).unwrap(),
            compile_stage(StageKind::Fragment, FRAGMENT_SRC).unwrap(),
        )
    }

    #[test]
    fn compile_finds_entry_points() {
        let (vs, fs) = stages();
        assert_eq!(vs.entry_point(), "vs_main");
        assert_eq!(fs.entry_point(), "fs_main");
    }

    #[test]
    fn syntax_error_is_compile_error() {
        let err = compile_stage(StageKind::Vertex, "fn broken( {").unwrap_err();
        assert!(matches!(err, ShaderError::Compile { stage: StageKind::Vertex, .. }));
    }

    #[test]
    fn wrong_stage_has_no_entry_point() {
        let err = compile_stage(StageKind::Fragment, VERTEX_SRC).unwrap_err();
        assert!(matches!(err, ShaderError::MissingEntryPoint { stage: StageKind::Fragment }));
    }

    #[test]
    fn link_reflects_uniform_offsets() {
        let (vs, fs) = stages();
        let layout = link(&vs, &fs).unwrap();
        assert_eq!(layout.uniforms.group, 0);
        assert_eq!(layout.uniforms.size, 208);
        assert_eq!(layout.uniform("model").map(|m| m.offset), Some(0));
        assert_eq!(layout.uniform("view").map(|m| m.offset), Some(64));
        assert_eq!(layout.uniform("projection").map(|m| m.offset), Some(128));
        let color = layout.uniform("color").unwrap();
        assert_eq!((color.offset, color.kind), (192, UniformKind::Vec4));
    }

    #[test]
    fn link_reflects_attribute_locations() {
        let (vs, fs) = stages();
        let layout = link(&vs, &fs).unwrap();
        assert_eq!(layout.attribute("position"), Some(0));
        assert_eq!(layout.attribute("tex_coord"), Some(1));
        assert_eq!(layout.attribute("normal"), None);
    }

    #[test]
    fn link_rejects_unmatched_fragment_input() {
        let vs = compile_stage(StageKind::Vertex, VERTEX_SRC).unwrap();
        let fs = compile_stage(
            StageKind::Fragment,
            r#"
@fragment
fn fs_main(@location(3) tint: vec4<f32>) -> @location(0) vec4<f32> {
    return tint;
}
"#,
        )
        .unwrap();
        assert!(matches!(link(&vs, &fs), Err(ShaderError::Link(_))));
    }

    #[test]
    fn link_rejects_swapped_stages() {
        let (vs, fs) = stages();
        assert!(matches!(link(&fs, &vs), Err(ShaderError::Link(_))));
    }

    #[test]
    fn link_rejects_misplaced_texture() {
        let vs = compile_stage(StageKind::Vertex, VERTEX_SRC).unwrap();
        let fs = compile_stage(
            StageKind::Fragment,
            r#"
@group(2) @binding(0) var tex: texture_2d<f32>;
@group(1) @binding(1) var samp: sampler;

@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return textureSample(tex, samp, uv);
}
"#,
        )
        .unwrap();
        assert!(matches!(link(&vs, &fs), Err(ShaderError::Link(_))));
    }

    #[test]
    fn link_rejects_second_uniform_block() {
        let vertex = VERTEX_SRC.replace(
            "@group(0) @binding(0) var<uniform> u: Uniforms;",
            "@group(0) @binding(0) var<uniform> u: Uniforms;\n\
             struct Extra { tint: vec4<f32> }\n\
             @group(0) @binding(1) var<uniform> extra: Extra;",
        );
        let vs = compile_stage(StageKind::Vertex, &vertex).unwrap();
        let fs = compile_stage(StageKind::Fragment, FRAGMENT_SRC).unwrap();
        let err = link(&vs, &fs).unwrap_err();
        assert!(matches!(err, ShaderError::Link(ref m) if m.contains("one uniform block")));
    }
}
