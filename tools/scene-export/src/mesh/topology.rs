//! Face triangulation and vertex unification
//!
//! Triangles and convex faces come out as a fan around the first corner.
//! Concave faces are ear-clipped in their own plane; faces with no ear left
//! (self-intersecting outlines) are rejected.

use glam::{DVec2, DVec3};
use hashbrown::HashMap;

use super::types::{CornerKey, DEGENERATE_AREA_EPSILON, NO_ATTRIBUTE};
use crate::authoring::MeshData;
use crate::error::{ExportError, Result};

/// Unified corners and the triangle list over them
#[derive(Debug)]
pub(crate) struct Topology {
    /// One entry per output vertex, in first-use order
    pub corners: Vec<CornerKey>,
    pub indices: Vec<u32>,
    pub skipped_faces: usize,
}

pub(crate) fn triangulate(mesh: &MeshData, max_degenerate_faces: usize) -> Result<Topology> {
    let mut corners = Vec::new();
    let mut lookup: HashMap<CornerKey, u32> = HashMap::new();
    let mut indices = Vec::with_capacity(mesh.faces.len() * 3);
    let mut skipped_faces = 0usize;
    let mut face_vertices = Vec::new();

    for (face_index, face) in mesh.faces.iter().enumerate() {
        let corner_count = face.positions.len();
        let positions = index_stream(
            mesh,
            face_index,
            "position",
            &face.positions,
            corner_count,
            mesh.positions.len(),
        )?;
        let normals = optional_stream(
            mesh,
            face_index,
            "normal",
            face.normals.as_deref(),
            &face.positions,
            mesh.normals.len(),
        )?;
        let uvs = optional_stream(
            mesh,
            face_index,
            "uv",
            face.uvs.as_deref(),
            &face.positions,
            mesh.uvs.len(),
        )?;

        let normal = vector_area(mesh, positions);
        if corner_count < 3 || normal.length() * 0.5 < DEGENERATE_AREA_EPSILON {
            skipped_faces += 1;
            if skipped_faces > max_degenerate_faces {
                return Err(ExportError::topology(
                    &mesh.name,
                    format!(
                        "face {face_index} is degenerate ({skipped_faces} degenerate faces, {max_degenerate_faces} tolerated)"
                    ),
                ));
            }
            continue;
        }

        face_vertices.clear();
        for corner in 0..corner_count {
            let key = CornerKey {
                position: positions[corner],
                normal: normals.map_or(NO_ATTRIBUTE, |n| n[corner]),
                uv: uvs.map_or(NO_ATTRIBUTE, |uv| uv[corner]),
            };
            let vertex = *lookup.entry(key).or_insert_with(|| {
                corners.push(key);
                corners.len() as u32 - 1
            });
            face_vertices.push(vertex);
        }

        let outline = project_to_plane(mesh, positions, normal);
        let triangles = ear_clip(&outline).ok_or_else(|| {
            ExportError::topology(
                &mesh.name,
                format!("face {face_index} has a self-intersecting outline"),
            )
        })?;
        for [a, b, c] in triangles {
            indices.extend_from_slice(&[face_vertices[a], face_vertices[b], face_vertices[c]]);
        }
    }

    if indices.is_empty() {
        return Err(ExportError::topology(&mesh.name, "mesh has no triangles"));
    }

    if skipped_faces > 0 {
        tracing::warn!(
            "Mesh '{}': skipped {} degenerate faces",
            mesh.name,
            skipped_faces
        );
    }

    Ok(Topology {
        corners,
        indices,
        skipped_faces,
    })
}

/// Index stream of an attribute the mesh may not carry
///
/// Returns `None` when the mesh has no values for the attribute. Faces
/// without an explicit stream reuse their position indices.
fn optional_stream<'a>(
    mesh: &MeshData,
    face_index: usize,
    attribute: &str,
    explicit: Option<&'a [u32]>,
    positions: &'a [u32],
    attribute_len: usize,
) -> Result<Option<&'a [u32]>> {
    if attribute_len == 0 {
        return Ok(None);
    }
    let stream = explicit.unwrap_or(positions);
    index_stream(
        mesh,
        face_index,
        attribute,
        stream,
        positions.len(),
        attribute_len,
    )
    .map(Some)
}

fn index_stream<'a>(
    mesh: &MeshData,
    face_index: usize,
    attribute: &str,
    stream: &'a [u32],
    corner_count: usize,
    attribute_len: usize,
) -> Result<&'a [u32]> {
    if stream.len() != corner_count {
        return Err(ExportError::topology(
            &mesh.name,
            format!(
                "face {face_index} has {} {attribute} indices for {corner_count} corners",
                stream.len()
            ),
        ));
    }

    if let Some(&index) = stream.iter().find(|&&index| index as usize >= attribute_len) {
        return Err(ExportError::topology(
            &mesh.name,
            format!("face {face_index} references {attribute} {index}, mesh has {attribute_len}"),
        ));
    }

    Ok(stream)
}

fn point(mesh: &MeshData, position: u32) -> DVec3 {
    DVec3::from(mesh.positions[position as usize].map(f64::from))
}

/// Twice the polygon's vector area; points along the face normal
fn vector_area(mesh: &MeshData, positions: &[u32]) -> DVec3 {
    let Some((&first, rest)) = positions.split_first() else {
        return DVec3::ZERO;
    };
    let origin = point(mesh, first);
    rest.windows(2).fold(DVec3::ZERO, |area, pair| {
        area + (point(mesh, pair[0]) - origin).cross(point(mesh, pair[1]) - origin)
    })
}

/// Face corners in a 2D basis of the face plane, counter-clockwise about `normal`
fn project_to_plane(mesh: &MeshData, positions: &[u32], normal: DVec3) -> Vec<DVec2> {
    let normal = normal.normalize();
    let u = normal.any_orthonormal_vector();
    let v = normal.cross(u);
    positions
        .iter()
        .map(|&position| {
            let p = point(mesh, position);
            DVec2::new(p.dot(u), p.dot(v))
        })
        .collect()
}

/// Triangulate a counter-clockwise simple polygon into corner index triples
///
/// Strictly convex polygons yield the fan around corner 0. Returns `None`
/// when no ear can be found.
fn ear_clip(outline: &[DVec2]) -> Option<Vec<[usize; 3]>> {
    let count = outline.len();
    let convex = (0..count).all(|i| {
        let a = outline[(i + count - 1) % count];
        let b = outline[i];
        let c = outline[(i + 1) % count];
        (b - a).perp_dot(c - b) > 0.0
    });
    if convex {
        return Some((1..count - 1).map(|i| [0, i, i + 1]).collect());
    }

    let mut remaining: Vec<usize> = (0..count).collect();
    let mut triangles = Vec::with_capacity(count.saturating_sub(2));

    while remaining.len() > 3 {
        // Collinear corners only count as ears once no strict ear is left
        let ear = find_ear(outline, &remaining, false)
            .or_else(|| find_ear(outline, &remaining, true))?;
        let count = remaining.len();
        triangles.push([
            remaining[(ear + count - 1) % count],
            remaining[ear],
            remaining[(ear + 1) % count],
        ]);
        remaining.remove(ear);
    }

    if let [a, b, c] = remaining[..] {
        triangles.push([a, b, c]);
    }
    Some(triangles)
}

fn find_ear(outline: &[DVec2], remaining: &[usize], allow_flat: bool) -> Option<usize> {
    let count = remaining.len();
    (0..count).find(|&i| {
        let a = outline[remaining[(i + count - 1) % count]];
        let b = outline[remaining[i]];
        let c = outline[remaining[(i + 1) % count]];

        let turn = (b - a).perp_dot(c - b);
        let convex = if allow_flat { turn >= 0.0 } else { turn > 0.0 };
        convex
            && remaining.iter().all(|&other| {
                let p = outline[other];
                p == a || p == b || p == c || !in_triangle(p, a, b, c)
            })
    })
}

/// Inside or on the boundary of counter-clockwise triangle `abc`
fn in_triangle(p: DVec2, a: DVec2, b: DVec2, c: DVec2) -> bool {
    (b - a).perp_dot(p - a) >= 0.0
        && (c - b).perp_dot(p - b) >= 0.0
        && (a - c).perp_dot(p - c) >= 0.0
}
