//! Clip baking

use crate::args::{ClipArg, ExportArgs};
use crate::document::{AccessorData, AnimationId, Document, OutputAnimation, OutputChannel};
use crate::error::{ExportError, Result};
use crate::scene::ExportableScene;

use super::node::NodeAnimation;

/// Absorbs float error in `(end - start) * rate` so whole frame counts stay whole
const FRAME_EPSILON: f64 = 1e-6;

/// Upper bound on samples per clip
pub const MAX_CLIP_FRAMES: usize = 1 << 20;

/// Number of frames sampled for `[start, end]` at `rate`, both ends inclusive
///
/// Saturates at `usize::MAX` for ranges too long to sample.
pub fn frame_count(start: f64, end: f64, rate: f64) -> usize {
    let steps = ((end - start) * rate + FRAME_EPSILON).floor();
    (steps as usize).saturating_add(1)
}

/// One named time range baked into an output animation
#[derive(Debug, Clone)]
pub struct ExportableClip {
    name: String,
    /// Output seconds, frame 0 at 0.0
    times: Vec<f32>,
    animations: Vec<NodeAnimation>,
}

impl ExportableClip {
    pub fn build(args: &ExportArgs, clip: &ClipArg, scene: &ExportableScene<'_>) -> Result<Self> {
        let host = scene.host();
        let rate = args.frame_rate.unwrap_or_else(|| host.frame_rate());
        validate(clip, rate)?;

        let count = frame_count(clip.start, clip.end, rate);
        let offsets: Vec<f64> = (0..count).map(|i| i as f64 / rate).collect();
        let host_times: Vec<f64> = offsets.iter().map(|offset| clip.start + offset).collect();

        let mut animations = Vec::new();
        for node in scene.nodes() {
            if !args.selection.is_animatable(node.path(), node.kind()) {
                continue;
            }
            let animation = node
                .create_animation(host, &host_times, args.scale_factor)
                .map_err(|failure| ExportError::ClipSampling {
                    clip: clip.name.clone(),
                    node: node.name().to_string(),
                    frame: failure.frame,
                    source: Box::new(failure.source),
                })?;
            animations.push(animation);
        }

        tracing::info!(
            "Clip '{}': {} frames at {} fps, {} animated nodes",
            clip.name,
            count,
            rate,
            animations.len()
        );

        Ok(Self {
            name: clip.name.clone(),
            times: offsets.into_iter().map(|t| t as f32).collect(),
            animations,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn times(&self) -> &[f32] {
        &self.times
    }

    pub fn animations(&self) -> &[NodeAnimation] {
        &self.animations
    }

    /// Push the shared time accessor, per-node tracks and the animation entry
    pub fn register(&self, document: &mut Document) -> AnimationId {
        let times = document.push_accessor(AccessorData::Scalar(self.times.clone()));
        let channels = self
            .animations
            .iter()
            .map(|animation| OutputChannel {
                node: animation.node(),
                translations: document
                    .push_accessor(AccessorData::Vec3(animation.translations().to_vec())),
                rotations: document
                    .push_accessor(AccessorData::Vec4(animation.rotations().to_vec())),
                scales: document.push_accessor(AccessorData::Vec3(animation.scales().to_vec())),
            })
            .collect();

        document.push_animation(OutputAnimation {
            name: self.name.clone(),
            times,
            channels,
        })
    }
}

fn validate(clip: &ClipArg, rate: f64) -> Result<()> {
    let invalid = |reason: String| ExportError::InvalidClip {
        clip: clip.name.clone(),
        reason,
    };

    if !clip.start.is_finite() || !clip.end.is_finite() {
        return Err(invalid(format!(
            "bounds must be finite, got [{}, {}]",
            clip.start, clip.end
        )));
    }
    if clip.end < clip.start {
        return Err(invalid(format!(
            "end {} is before start {}",
            clip.end, clip.start
        )));
    }
    if !rate.is_finite() || rate <= 0.0 {
        return Err(invalid(format!("frame rate must be positive, got {rate}")));
    }
    let count = frame_count(clip.start, clip.end, rate);
    if count > MAX_CLIP_FRAMES {
        return Err(invalid(format!(
            "{count} frames at {rate} fps exceeds the limit of {MAX_CLIP_FRAMES}"
        )));
    }
    Ok(())
}
