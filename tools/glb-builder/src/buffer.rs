//! Binary buffer packing with automatic alignment and accessor creation

use crate::utils::{align_buffer, compute_bounds};
use gltf_json as json;
use gltf_json::accessor::{ComponentType, GenericComponentType, Type};
use gltf_json::validation::Checked::Valid;

/// Accessor index returned by buffer operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessorIndex(pub u32);

impl AccessorIndex {
    pub fn as_json_index(&self) -> json::Index<json::Accessor> {
        json::Index::new(self.0)
    }
}

/// Layout of one accessor appended to the buffer
struct AccessorLayout {
    count: usize,
    component_type: ComponentType,
    type_: Type,
    target: Option<json::buffer::Target>,
    min: Option<json::Value>,
    max: Option<json::Value>,
}

/// Builder for a single binary buffer with 4-byte aligned views
pub struct BufferBuilder {
    buffer: Vec<u8>,
    views: Vec<json::buffer::View>,
    accessors: Vec<json::Accessor>,
}

impl BufferBuilder {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            views: Vec::new(),
            accessors: Vec::new(),
        }
    }

    /// Binary buffer data packed so far
    pub fn data(&self) -> &[u8] {
        &self.buffer
    }

    pub fn views(&self) -> &[json::buffer::View] {
        &self.views
    }

    pub fn accessors(&self) -> &[json::Accessor] {
        &self.accessors
    }

    /// Append raw bytes as a new view plus an accessor describing them
    fn push(&mut self, bytes: &[u8], layout: AccessorLayout) -> AccessorIndex {
        let offset = self.buffer.len();
        self.buffer.extend_from_slice(bytes);

        self.views.push(json::buffer::View {
            buffer: json::Index::new(0),
            byte_length: bytes.len().into(),
            byte_offset: Some((offset as u64).into()),
            byte_stride: None,
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            target: layout.target.map(Valid),
        });

        let accessor_idx = self.accessors.len() as u32;
        self.accessors.push(json::Accessor {
            buffer_view: Some(json::Index::new(self.views.len() as u32 - 1)),
            byte_offset: Some(0u64.into()),
            count: layout.count.into(),
            component_type: Valid(GenericComponentType(layout.component_type)),
            extensions: Default::default(),
            extras: Default::default(),
            type_: Valid(layout.type_),
            min: layout.min,
            max: layout.max,
            name: None,
            normalized: false,
            sparse: None,
        });

        align_buffer(&mut self.buffer);
        AccessorIndex(accessor_idx)
    }

    /// Pack Vec3 positions; glTF requires min/max bounds on POSITION
    pub fn pack_positions(&mut self, positions: &[[f32; 3]]) -> AccessorIndex {
        let (min, max) = compute_bounds(positions);
        self.push(
            bytemuck::cast_slice(positions),
            AccessorLayout {
                count: positions.len(),
                component_type: ComponentType::F32,
                type_: Type::Vec3,
                target: Some(json::buffer::Target::ArrayBuffer),
                min: Some(json::Value::Array(
                    min.into_iter().map(json::Value::from).collect(),
                )),
                max: Some(json::Value::Array(
                    max.into_iter().map(json::Value::from).collect(),
                )),
            },
        )
    }

    /// Pack Vec3 vertex attributes (normals)
    pub fn pack_vec3(&mut self, data: &[[f32; 3]]) -> AccessorIndex {
        self.pack_f32(bytemuck::cast_slice(data), data.len(), Type::Vec3, true)
    }

    /// Pack Vec2 vertex attributes (UVs)
    pub fn pack_vec2(&mut self, data: &[[f32; 2]]) -> AccessorIndex {
        self.pack_f32(bytemuck::cast_slice(data), data.len(), Type::Vec2, true)
    }

    /// Pack Vec4 vertex attributes (weights)
    pub fn pack_vec4(&mut self, data: &[[f32; 4]]) -> AccessorIndex {
        self.pack_f32(bytemuck::cast_slice(data), data.len(), Type::Vec4, true)
    }

    /// Pack Vec3 animation output (translations, scales)
    pub fn pack_track_vec3(&mut self, data: &[[f32; 3]]) -> AccessorIndex {
        self.pack_f32(bytemuck::cast_slice(data), data.len(), Type::Vec3, false)
    }

    /// Pack Vec4 animation output (rotations)
    pub fn pack_track_vec4(&mut self, data: &[[f32; 4]]) -> AccessorIndex {
        self.pack_f32(bytemuck::cast_slice(data), data.len(), Type::Vec4, false)
    }

    fn pack_f32(
        &mut self,
        bytes: &[u8],
        count: usize,
        type_: Type,
        vertex_attribute: bool,
    ) -> AccessorIndex {
        self.push(
            bytes,
            AccessorLayout {
                count,
                component_type: ComponentType::F32,
                type_,
                target: vertex_attribute.then_some(json::buffer::Target::ArrayBuffer),
                min: None,
                max: None,
            },
        )
    }

    /// Pack joint indices (Vec4<u16>)
    pub fn pack_joints(&mut self, joints: &[[u16; 4]]) -> AccessorIndex {
        self.push(
            bytemuck::cast_slice(joints),
            AccessorLayout {
                count: joints.len(),
                component_type: ComponentType::U16,
                type_: Type::Vec4,
                target: Some(json::buffer::Target::ArrayBuffer),
                min: None,
                max: None,
            },
        )
    }

    /// Pack u32 triangle indices
    pub fn pack_indices(&mut self, indices: &[u32]) -> AccessorIndex {
        self.push(
            bytemuck::cast_slice(indices),
            AccessorLayout {
                count: indices.len(),
                component_type: ComponentType::U32,
                type_: Type::Scalar,
                target: Some(json::buffer::Target::ElementArrayBuffer),
                min: None,
                max: None,
            },
        )
    }

    /// Pack column-major Mat4 data (inverse bind matrices)
    pub fn pack_mat4(&mut self, matrices: &[[f32; 16]]) -> AccessorIndex {
        self.push(
            bytemuck::cast_slice(matrices),
            AccessorLayout {
                count: matrices.len(),
                component_type: ComponentType::F32,
                type_: Type::Mat4,
                target: None,
                min: None,
                max: None,
            },
        )
    }

    /// Pack scalar f32 data with min/max (animation sampler input)
    pub fn pack_scalars_with_bounds(&mut self, scalars: &[f32]) -> AccessorIndex {
        let min_val = scalars.iter().copied().fold(f32::INFINITY, f32::min) as f64;
        let max_val = scalars.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
        self.push(
            bytemuck::cast_slice(scalars),
            AccessorLayout {
                count: scalars.len(),
                component_type: ComponentType::F32,
                type_: Type::Scalar,
                target: None,
                min: Some(json::Value::Array(vec![json::Value::from(min_val)])),
                max: Some(json::Value::Array(vec![json::Value::from(max_val)])),
            },
        )
    }
}

impl Default for BufferBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_carry_bounds() {
        let mut builder = BufferBuilder::new();
        let idx = builder.pack_positions(&[[0.0, -1.0, 0.0], [1.0, 2.0, 3.0]]);

        assert_eq!(idx, AccessorIndex(0));
        assert_eq!(builder.data().len(), 24);
        let accessor = &builder.accessors()[0];
        assert!(accessor.min.is_some());
        assert!(accessor.max.is_some());
    }

    #[test]
    fn test_joints_are_padded_to_alignment() {
        let mut builder = BufferBuilder::new();
        builder.pack_joints(&[[0, 1, 2, 3]]);
        // 1 vertex * 4 * u16 = 8 bytes, already aligned
        assert_eq!(builder.data().len(), 8);

        let idx = builder.pack_indices(&[0, 1, 2]);
        assert_eq!(idx, AccessorIndex(1));
        assert_eq!(builder.data().len(), 20);
        assert_eq!(builder.views().len(), 2);
    }

    #[test]
    fn test_animation_tracks_have_no_buffer_target() {
        let mut builder = BufferBuilder::new();
        builder.pack_track_vec4(&[[0.0, 0.0, 0.0, 1.0]]);
        builder.pack_vec4(&[[1.0, 0.0, 0.0, 0.0]]);

        assert!(builder.views()[0].target.is_none());
        assert!(builder.views()[1].target.is_some());
    }

    #[test]
    fn test_scalar_bounds() {
        let mut builder = BufferBuilder::new();
        builder.pack_scalars_with_bounds(&[0.0, 0.5, 1.0]);
        let accessor = &builder.accessors()[0];
        assert_eq!(
            accessor.max,
            Some(json::Value::Array(vec![json::Value::from(1.0f64)]))
        );
    }
}
