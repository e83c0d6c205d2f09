//! glTF 2.0 serialization of an exported [`Document`]
//!
//! Output indices line up one to one with document ids: node `i` in the
//! document is node `i` in the glTF, and likewise for meshes and skins.

use anyhow::{bail, Context, Result};
use glb_builder::{
    assemble_glb, json, AnimationBuilder, BufferBuilder, GltfBuilder, MeshBuilder, SkinBuilder,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::document::{AccessorData, AccessorId, Document};

/// `asset.generator` of every written file
pub const GENERATOR: &str = concat!("scene-export ", env!("CARGO_PKG_VERSION"));

/// Build the glTF JSON root and its binary buffer
///
/// With `buffer_uri` the buffer is referenced externally (`.gltf` + `.bin`);
/// without it the buffer is meant for a GLB BIN chunk.
pub fn to_gltf(document: &Document, buffer_uri: Option<&str>) -> Result<(json::Root, Vec<u8>)> {
    let mut buffer = BufferBuilder::new();
    let mut gltf = GltfBuilder::new();

    for mesh in document.meshes() {
        let mut builder = MeshBuilder::new()
            .positions(vec3(document, mesh.positions)?)
            .indices(indices(document, mesh.indices)?);
        if let Some(normals) = mesh.normals {
            builder = builder.normals(vec3(document, normals)?);
        }
        if let Some(uvs) = mesh.uvs {
            builder = builder.uvs(vec2(document, uvs)?);
        }
        for set in &mesh.joint_sets {
            builder = builder.joint_set(joints(document, set.joints)?, vec4(document, set.weights)?);
        }
        let accessors = builder.build(&mut buffer);
        gltf = gltf.add_mesh_from_accessors(&mesh.name, &accessors);
    }

    for skin in document.skins() {
        let accessors = SkinBuilder::new()
            .inverse_bind_matrices(mat4(document, skin.inverse_bind_matrices)?)
            .build(&mut buffer);
        let joints: Vec<u32> = skin.joints.iter().map(|joint| joint.0).collect();
        gltf = gltf.add_skin(
            &skin.name,
            skin.skeleton.map(|root| root.0),
            &joints,
            &accessors,
        );
    }

    for animation in document.animations() {
        let mut builder = AnimationBuilder::new(scalars(document, animation.times)?);
        for channel in &animation.channels {
            builder = builder.node_tracks(
                channel.node.0,
                vec3(document, channel.translations)?,
                vec4(document, channel.rotations)?,
                vec3(document, channel.scales)?,
            );
        }
        // glTF requires at least one channel per animation
        if builder.track_count() == 0 {
            tracing::warn!("Animation '{}' has no animated nodes, skipping", animation.name);
            continue;
        }
        let accessors = builder.build(&mut buffer);
        gltf = gltf.add_animation(&animation.name, &accessors);
    }

    for node in document.nodes() {
        let children: Vec<u32> = node.children.iter().map(|child| child.0).collect();
        gltf = gltf.add_node(
            &node.name,
            node.translation,
            node.rotation,
            node.scale,
            &children,
            node.mesh.map(|mesh| mesh.0),
            node.skin.map(|skin| skin.0),
        );
    }

    let roots: Vec<u32> = document.roots().iter().map(|root| root.0).collect();
    if !roots.is_empty() {
        gltf = gltf.add_scene("Scene", &roots);
    }
    gltf = gltf.buffer_byte_length(buffer.data().len() as u64);
    if let Some(uri) = buffer_uri {
        gltf = gltf.buffer_uri(uri);
    }

    let root = gltf.build(buffer.views(), buffer.accessors(), GENERATOR);
    Ok((root, buffer.data().to_vec()))
}

/// Serialize the document as a binary glTF container
pub fn glb_bytes(document: &Document) -> Result<Vec<u8>> {
    let (root, data) = to_gltf(document, None)?;
    assemble_glb(&root, &data)
}

/// Write a `.glb` file
pub fn write_glb(path: &Path, document: &Document) -> Result<()> {
    let bytes = glb_bytes(document)?;
    let file = File::create(path).with_context(|| format!("Failed to create output: {:?}", path))?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Write a `.gltf` JSON file plus its sibling `.bin` buffer
pub fn write_gltf(path: &Path, document: &Document) -> Result<()> {
    let bin_path = path.with_extension("bin");
    let bin_name = bin_path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("Invalid output path: {:?}", path))?
        .to_string();

    let (root, data) = to_gltf(document, Some(&bin_name))?;
    let text = json::serialize::to_string_pretty(&root).context("Failed to serialize glTF JSON")?;

    std::fs::write(path, text).with_context(|| format!("Failed to write {:?}", path))?;
    if !data.is_empty() {
        std::fs::write(&bin_path, &data)
            .with_context(|| format!("Failed to write {:?}", bin_path))?;
    }
    Ok(())
}

/// Write by extension: `.gltf` gives JSON + `.bin`, anything else GLB
pub fn write_document(path: &Path, document: &Document) -> Result<()> {
    let is_gltf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gltf"));
    if is_gltf {
        write_gltf(path, document)
    } else {
        write_glb(path, document)
    }
}

// ============================================================================
// Typed accessor lookup
// ============================================================================

macro_rules! typed_accessor {
    ($name:ident, $variant:ident, $ty:ty) => {
        fn $name(document: &Document, id: AccessorId) -> Result<&[$ty]> {
            match document.accessor(id) {
                AccessorData::$variant(values) => Ok(values),
                other => bail!(
                    "Accessor {} is {}, expected {}",
                    id.0,
                    other.kind_name(),
                    stringify!($variant)
                ),
            }
        }
    };
}

typed_accessor!(scalars, Scalar, f32);
typed_accessor!(vec2, Vec2, [f32; 2]);
typed_accessor!(vec3, Vec3, [f32; 3]);
typed_accessor!(vec4, Vec4, [f32; 4]);
typed_accessor!(mat4, Mat4, [f32; 16]);
typed_accessor!(joints, Joints, [u16; 4]);
typed_accessor!(indices, Indices, u32);
