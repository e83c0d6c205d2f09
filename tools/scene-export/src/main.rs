//! scene-export - authored scene to glTF exporter
//!
//! Reads a JSON scene description and writes a `.glb` (or `.gltf` + `.bin`)
//! with the node hierarchy, skinned meshes and baked animation clips.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use scene_export::{
    args, export_scene, formats, ClipArg, Document, ExportArgs, MemoryScene, NameCollision,
    NodePath, Selection,
};

#[derive(Parser)]
#[command(name = "scene-export")]
#[command(about = "Export authored scenes to glTF 2.0")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a scene to .glb or .gltf
    Export {
        /// Input scene description (JSON)
        input: PathBuf,

        /// Output file; `.gltf` writes JSON plus a sibling `.bin`
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        settings: SettingsArgs,
    },

    /// Run the export without writing and print a summary
    Check {
        /// Input scene description (JSON)
        input: PathBuf,

        #[command(flatten)]
        settings: SettingsArgs,
    },
}

/// Flags layered over the optional export.toml
#[derive(Args)]
struct SettingsArgs {
    /// Export settings (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Unit conversion for translations and positions
    #[arg(long)]
    scale_factor: Option<f64>,

    /// Clip sampling rate (default: the scene's frame rate)
    #[arg(long)]
    frame_rate: Option<f64>,

    /// Maximum joint influences per vertex
    #[arg(long)]
    max_influences: Option<usize>,

    /// Clip to bake, as name:start:end (repeatable)
    #[arg(long = "clip")]
    clips: Vec<ClipArg>,

    /// Node path whose mesh is exported (repeatable; default: everything)
    #[arg(long = "select")]
    select: Vec<String>,

    /// Degenerate faces tolerated per mesh
    #[arg(long)]
    max_degenerate_faces: Option<usize>,

    /// Behavior when two nodes share a name
    #[arg(long, value_enum)]
    name_collision: Option<NameCollision>,

    /// Log every extracted skeleton at debug level
    #[arg(long)]
    dump_skeletons: bool,
}

impl SettingsArgs {
    fn resolve(self) -> Result<ExportArgs> {
        let mut export = match &self.config {
            Some(path) => args::load_args(path)?,
            None => ExportArgs::default(),
        };

        if let Some(scale_factor) = self.scale_factor {
            export.scale_factor = scale_factor;
        }
        if let Some(frame_rate) = self.frame_rate {
            export.frame_rate = Some(frame_rate);
        }
        if let Some(max_influences) = self.max_influences {
            export.max_joint_influences = max_influences;
        }
        if !self.clips.is_empty() {
            export.clips = self.clips;
        }
        if !self.select.is_empty() {
            export.selection = Selection::from_paths(self.select.into_iter().map(NodePath::new));
        }
        if let Some(max_degenerate_faces) = self.max_degenerate_faces {
            export.max_degenerate_faces = max_degenerate_faces;
        }
        if let Some(policy) = self.name_collision {
            export.name_collision = policy;
        }
        export.dump_skeletons |= self.dump_skeletons;

        export.validate()?;
        Ok(export)
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            input,
            output,
            settings,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension("glb"));
            let args = settings.resolve()?;
            tracing::info!("Exporting {:?} -> {:?}", input, output);

            let document = run(&input, &args)?;
            formats::write_document(&output, &document)?;
            tracing::info!("Done!");
        }

        Commands::Check { input, settings } => {
            let args = settings.resolve()?;
            tracing::info!("Checking {:?}", input);

            let document = run(&input, &args)?;
            print_summary(&document);
            tracing::info!("Scene is exportable!");
        }
    }

    Ok(())
}

fn run(input: &Path, args: &ExportArgs) -> Result<Document> {
    let scene = MemoryScene::load(input)?;
    export_scene(&scene, args).with_context(|| format!("Failed to export {:?}", input))
}

fn print_summary(document: &Document) {
    println!("nodes:      {}", document.nodes().len());
    println!("roots:      {}", document.roots().len());
    println!("meshes:     {}", document.meshes().len());
    println!("skins:      {}", document.skins().len());
    println!("animations: {}", document.animations().len());
    for animation in document.animations() {
        println!(
            "  {} ({} frames, {} channels)",
            animation.name,
            document.accessor(animation.times).len(),
            animation.channels.len()
        );
    }
}
