//! Export configuration
//!
//! One immutable [`ExportArgs`] value is threaded by reference through the
//! whole pipeline. It is loaded from an optional `export.toml` and then
//! overridden by command-line flags.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;

use crate::authoring::{NodeKind, NodePath};

/// Default number of joint influences kept per vertex (one glTF joint set)
pub const DEFAULT_MAX_JOINT_INFLUENCES: usize = 4;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportArgs {
    /// Unit conversion applied to translations and positions (e.g. 0.01 for cm -> m)
    pub scale_factor: f64,
    /// Overrides the host's native frame rate when baking clips
    pub frame_rate: Option<f64>,
    /// Upper bound on joint influences kept per vertex
    pub max_joint_influences: usize,
    /// Nodes whose meshes are exported; empty selects everything
    #[serde(rename = "select")]
    pub selection: Selection,
    pub clips: Vec<ClipArg>,
    /// Skin deformers to disregard, by name
    pub ignore_mesh_deformers: Vec<String>,
    /// Degenerate faces skipped per mesh before the mesh is rejected
    pub max_degenerate_faces: usize,
    pub name_collision: NameCollision,
    /// Log a summary of every extracted skeleton at debug level
    pub dump_skeletons: bool,
}

impl Default for ExportArgs {
    fn default() -> Self {
        Self {
            scale_factor: 1.0,
            frame_rate: None,
            max_joint_influences: DEFAULT_MAX_JOINT_INFLUENCES,
            selection: Selection::default(),
            clips: Vec::new(),
            ignore_mesh_deformers: Vec::new(),
            max_degenerate_faces: 0,
            name_collision: NameCollision::default(),
            dump_skeletons: false,
        }
    }
}

impl ExportArgs {
    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if !self.scale_factor.is_finite() || self.scale_factor <= 0.0 {
            bail!("scale_factor must be positive, got {}", self.scale_factor);
        }
        if let Some(rate) = self.frame_rate {
            if !rate.is_finite() || rate <= 0.0 {
                bail!("frame_rate must be positive, got {}", rate);
            }
        }
        if self.max_joint_influences == 0 {
            bail!("max_joint_influences must be at least 1");
        }

        let mut names = BTreeSet::new();
        for clip in &self.clips {
            if !names.insert(clip.name.as_str()) {
                bail!("clip '{}' is declared twice", clip.name);
            }
        }
        Ok(())
    }

    pub fn is_ignored_deformer(&self, name: &str) -> bool {
        self.ignore_mesh_deformers.iter().any(|ignored| ignored == name)
    }
}

/// Load export settings from a TOML file
pub fn load_args(path: &Path) -> Result<ExportArgs> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read export config: {:?}", path))?;
    let args: ExportArgs = toml::from_str(&content)
        .with_context(|| format!("Failed to parse export config: {:?}", path))?;
    Ok(args)
}

/// Export selection membership
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Selection {
    paths: BTreeSet<NodePath>,
}

impl Selection {
    pub fn from_paths(paths: impl IntoIterator<Item = NodePath>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
        }
    }

    pub fn is_everything(&self) -> bool {
        self.paths.is_empty()
    }

    /// Whether the node's mesh shape is exported
    pub fn has_item(&self, path: &NodePath) -> bool {
        self.is_everything() || self.paths.contains(path)
    }

    /// Whether the node receives baked animation tracks
    ///
    /// Joints always animate so skinned meshes deform; other nodes only when
    /// selected.
    pub fn is_animatable(&self, path: &NodePath, kind: NodeKind) -> bool {
        kind == NodeKind::Joint || self.has_item(path)
    }
}

/// A named time range to bake, in host seconds
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClipArg {
    pub name: String,
    pub start: f64,
    pub end: f64,
}

impl FromStr for ClipArg {
    type Err = anyhow::Error;

    /// Parse `name:start:end`
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.rsplitn(3, ':');
        let (Some(end), Some(start), Some(name)) = (parts.next(), parts.next(), parts.next())
        else {
            bail!("clip must be given as name:start:end, got '{}'", s);
        };
        if name.is_empty() {
            bail!("clip name is empty in '{}'", s);
        }

        Ok(Self {
            name: name.to_string(),
            start: start
                .trim()
                .parse()
                .with_context(|| format!("Invalid clip start in '{}'", s))?,
            end: end
                .trim()
                .parse()
                .with_context(|| format!("Invalid clip end in '{}'", s))?,
        })
    }
}

/// What happens when two nodes resolve to the same display name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NameCollision {
    /// Append `_1`, `_2`, ... until the name is unique
    #[default]
    Suffix,
    /// Abort the export
    Fail,
}
