//! Baked TRS animation tracks

use crate::buffer::{AccessorIndex, BufferBuilder};

/// Accessor indices for one animated node's tracks
#[derive(Debug, Clone)]
pub struct NodeTrackAccessors {
    pub node: u32,
    pub translations: AccessorIndex,
    pub rotations: AccessorIndex,
    pub scales: AccessorIndex,
}

/// Accessor indices for a whole animation
#[derive(Debug, Clone)]
pub struct AnimationAccessors {
    pub times: AccessorIndex,
    pub tracks: Vec<NodeTrackAccessors>,
}

struct NodeTracks {
    node: u32,
    translations: Vec<[f32; 3]>,
    rotations: Vec<[f32; 4]>,
    scales: Vec<[f32; 3]>,
}

/// Builder for an animation whose tracks share one time input
pub struct AnimationBuilder {
    times: Vec<f32>,
    tracks: Vec<NodeTracks>,
}

impl AnimationBuilder {
    pub fn new(times: &[f32]) -> Self {
        Self {
            times: times.to_vec(),
            tracks: Vec::new(),
        }
    }

    /// Add the baked tracks of one node; every track has one sample per time
    pub fn node_tracks(
        mut self,
        node: u32,
        translations: &[[f32; 3]],
        rotations: &[[f32; 4]],
        scales: &[[f32; 3]],
    ) -> Self {
        self.tracks.push(NodeTracks {
            node,
            translations: translations.to_vec(),
            rotations: rotations.to_vec(),
            scales: scales.to_vec(),
        });
        self
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn build(self, buffer: &mut BufferBuilder) -> AnimationAccessors {
        let times = buffer.pack_scalars_with_bounds(&self.times);
        let tracks = self
            .tracks
            .iter()
            .map(|track| NodeTrackAccessors {
                node: track.node,
                translations: buffer.pack_track_vec3(&track.translations),
                rotations: buffer.pack_track_vec4(&track.rotations),
                scales: buffer.pack_track_vec3(&track.scales),
            })
            .collect();

        AnimationAccessors { times, tracks }
    }
}
