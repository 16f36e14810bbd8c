//! page-export - PAGE asset export tool
//!
//! Converts authoring assets (OBJ, glTF/GLB) to PAGE native binary formats
//! (.mesh, .skel, .anim, .track) and inspects existing PAGE files.

use anyhow::Result;
use clap::{Parser, Subcommand};
use page_common::AssetKind;
use std::path::PathBuf;

use page_export::{animation, inspect, manifest, mesh, skeleton, track};

#[derive(Parser)]
#[command(name = "page-export")]
#[command(about = "PAGE asset export tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build assets from a manifest file
    Build {
        /// Path to assets.toml manifest
        #[arg(default_value = "assets.toml")]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate manifest without building
    Check {
        /// Path to assets.toml manifest
        #[arg(default_value = "assets.toml")]
        manifest: PathBuf,
    },

    /// Export a single mesh file
    Mesh {
        /// Input mesh file (OBJ/glTF/GLB)
        input: PathBuf,

        /// Output .mesh file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep the source triangle and vertex order
        #[arg(long)]
        no_optimize: bool,
    },

    /// Export skeleton (bone hierarchy) from glTF
    Skeleton {
        /// Input glTF/GLB file
        input: PathBuf,

        /// Output .skel file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skin index (default: first skin)
        #[arg(short, long)]
        skin: Option<usize>,

        /// List available skins instead of exporting
        #[arg(long)]
        list: bool,
    },

    /// Export animation clip from glTF
    Animation {
        /// Input glTF/GLB file
        input: PathBuf,

        /// Output .anim file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Animation index (default: first animation)
        #[arg(short, long)]
        animation: Option<usize>,

        /// Skin index (default: first skin)
        #[arg(short, long)]
        skin: Option<usize>,

        /// List available animations instead of exporting
        #[arg(long)]
        list: bool,
    },

    /// Export a walkable track surface from OBJ
    Track {
        /// Input OBJ file
        input: PathBuf,

        /// Output .track file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print a summary of a PAGE file
    Inspect {
        /// Any .mesh/.skel/.anim/.track/.cam file
        file: PathBuf,
    },
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
        Commands::Build {
            manifest,
            output,
            verbose,
        } => {
            if verbose {
                tracing::info!("Building assets from {:?}", manifest);
            }
            let config = manifest::load_manifest(&manifest)?;
            manifest::build_all(&config, output.as_deref())?;
            tracing::info!("Build complete!");
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            manifest::validate(&config)?;
            tracing::info!("Manifest is valid!");
        }

        Commands::Mesh {
            input,
            output,
            no_optimize,
        } => {
            let output =
                output.unwrap_or_else(|| input.with_extension(AssetKind::Mesh.extension()));
            tracing::info!("Converting {:?} -> {:?}", input, output);
            let options = mesh::MeshOptions {
                optimize: !no_optimize,
            };
            mesh::convert_mesh(&input, &output, options)?;
            tracing::info!("Done!");
        }

        Commands::Skeleton {
            input,
            output,
            skin,
            list,
        } => {
            if list {
                skeleton::list_skins(&input)?;
            } else {
                let output = output
                    .unwrap_or_else(|| input.with_extension(AssetKind::Skeleton.extension()));
                tracing::info!("Exporting skeleton {:?} -> {:?}", input, output);
                skeleton::convert_gltf_skeleton(&input, &output, skin)?;
                tracing::info!("Done!");
            }
        }

        Commands::Animation {
            input,
            output,
            animation,
            skin,
            list,
        } => {
            if list {
                animation::list_animations(&input)?;
            } else {
                let output = output
                    .unwrap_or_else(|| input.with_extension(AssetKind::Animation.extension()));
                tracing::info!("Exporting animation {:?} -> {:?}", input, output);
                animation::convert_gltf_animation(&input, &output, animation, skin)?;
                tracing::info!("Done!");
            }
        }

        Commands::Track { input, output } => {
            let output =
                output.unwrap_or_else(|| input.with_extension(AssetKind::Track.extension()));
            tracing::info!("Exporting track {:?} -> {:?}", input, output);
            track::convert_obj_track(&input, &output)?;
            tracing::info!("Done!");
        }

        Commands::Inspect { file } => {
            let summary = inspect::inspect_file(&file)?;
            tracing::info!("{:?}: {}", file, summary);
        }
    }

    Ok(())
}
