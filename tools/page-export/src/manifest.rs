//! Manifest parsing and build orchestration
//!
//! Parses assets.toml and coordinates asset conversion. Relative source
//! paths and the output directory are resolved against the directory the
//! manifest lives in.

use anyhow::{Context, Result, bail};
use hashbrown::HashMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use page_common::AssetKind;

use crate::mesh::MeshOptions;

/// Root manifest structure
#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub meshes: HashMap<String, MeshEntry>,
    #[serde(default)]
    pub skeletons: HashMap<String, SkeletonEntry>,
    #[serde(default)]
    pub animations: HashMap<String, AnimationEntry>,
    #[serde(default)]
    pub tracks: HashMap<String, TrackEntry>,
    /// Directory relative paths are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("assets/")
}

fn default_optimize() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MeshEntry {
    Simple(PathBuf),
    Detailed {
        path: PathBuf,
        #[serde(default = "default_optimize")]
        optimize: bool,
    },
}

impl MeshEntry {
    pub fn path(&self) -> &Path {
        match self {
            MeshEntry::Simple(p) => p,
            MeshEntry::Detailed { path, .. } => path,
        }
    }

    pub fn options(&self) -> MeshOptions {
        match self {
            MeshEntry::Simple(_) => MeshOptions::default(),
            MeshEntry::Detailed { optimize, .. } => MeshOptions {
                optimize: *optimize,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SkeletonEntry {
    Simple(PathBuf),
    Detailed {
        path: PathBuf,
        #[serde(default)]
        skin: Option<usize>,
    },
}

impl SkeletonEntry {
    pub fn path(&self) -> &Path {
        match self {
            SkeletonEntry::Simple(p) => p,
            SkeletonEntry::Detailed { path, .. } => path,
        }
    }

    pub fn skin(&self) -> Option<usize> {
        match self {
            SkeletonEntry::Simple(_) => None,
            SkeletonEntry::Detailed { skin, .. } => *skin,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AnimationEntry {
    Simple(PathBuf),
    Detailed {
        path: PathBuf,
        #[serde(default)]
        animation: Option<usize>,
        #[serde(default)]
        skin: Option<usize>,
    },
}

impl AnimationEntry {
    pub fn path(&self) -> &Path {
        match self {
            AnimationEntry::Simple(p) => p,
            AnimationEntry::Detailed { path, .. } => path,
        }
    }

    pub fn animation(&self) -> Option<usize> {
        match self {
            AnimationEntry::Simple(_) => None,
            AnimationEntry::Detailed { animation, .. } => *animation,
        }
    }

    pub fn skin(&self) -> Option<usize> {
        match self {
            AnimationEntry::Simple(_) => None,
            AnimationEntry::Detailed { skin, .. } => *skin,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TrackEntry {
    Simple(PathBuf),
    Detailed { path: PathBuf },
}

impl TrackEntry {
    pub fn path(&self) -> &Path {
        match self {
            TrackEntry::Simple(p) => p,
            TrackEntry::Detailed { path } => path,
        }
    }
}

impl Manifest {
    /// Parse manifest text; relative paths resolve against `base_dir`
    pub fn parse(content: &str, base_dir: &Path) -> Result<Self> {
        let mut manifest: Manifest = toml::from_str(content)?;
        manifest.base_dir = base_dir.to_path_buf();
        Ok(manifest)
    }

    /// Resolve a path from the manifest
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.base_dir.join(path)
    }

    /// Every source file with its asset kind and entry name, sorted by
    /// kind then name
    pub fn sources(&self) -> Vec<(AssetKind, &str, PathBuf)> {
        let groups = [
            (AssetKind::Mesh, entries(&self.meshes, MeshEntry::path)),
            (AssetKind::Skeleton, entries(&self.skeletons, SkeletonEntry::path)),
            (AssetKind::Animation, entries(&self.animations, AnimationEntry::path)),
            (AssetKind::Track, entries(&self.tracks, TrackEntry::path)),
        ];

        let mut sources = Vec::new();
        for (kind, group) in groups {
            for (name, path) in group {
                sources.push((kind, name, self.resolve(path)));
            }
        }
        sources
    }
}

/// Names and source paths of one manifest section, sorted by name
fn entries<'a, E>(
    section: &'a HashMap<String, E>,
    path: fn(&'a E) -> &'a Path,
) -> Vec<(&'a str, &'a Path)> {
    let mut entries: Vec<(&str, &Path)> = section
        .iter()
        .map(|(name, entry)| (name.as_str(), path(entry)))
        .collect();
    entries.sort_by_key(|&(name, _)| name);
    entries
}

/// Load and parse a manifest file
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {:?}", path))?;
    let base_dir = path.parent().unwrap_or(Path::new(""));
    Manifest::parse(&content, base_dir)
        .with_context(|| format!("Failed to parse manifest: {:?}", path))
}

/// Validate a manifest without building
pub fn validate(manifest: &Manifest) -> Result<()> {
    // Check that all source files exist
    for (kind, name, path) in manifest.sources() {
        if !path.exists() {
            bail!("{:?} '{}' source not found: {:?}", kind, name, path);
        }
    }
    Ok(())
}

/// Build all assets from a manifest
///
/// Each entry `name` is written to `<output>/<name>.<extension>`.
pub fn build_all(manifest: &Manifest, output_override: Option<&Path>) -> Result<()> {
    let output_dir = match output_override {
        Some(dir) => dir.to_path_buf(),
        None => manifest.resolve(&manifest.output.dir),
    };
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    validate(manifest)?;

    let output_for = |kind: AssetKind, name: &str| {
        output_dir.join(format!("{}.{}", name, kind.extension()))
    };

    for (kind, name, source) in manifest.sources() {
        let output = output_for(kind, name);
        tracing::info!("Converting {:?}: {} -> {:?}", kind, name, output);

        let result = match kind {
            AssetKind::Mesh => {
                let options = manifest.meshes[name].options();
                crate::mesh::convert_mesh(&source, &output, options).map(drop)
            }
            AssetKind::Skeleton => {
                let skin = manifest.skeletons[name].skin();
                crate::skeleton::convert_gltf_skeleton(&source, &output, skin).map(drop)
            }
            AssetKind::Animation => {
                let entry = &manifest.animations[name];
                crate::animation::convert_gltf_animation(
                    &source,
                    &output,
                    entry.animation(),
                    entry.skin(),
                )
                .map(drop)
            }
            AssetKind::Track => crate::track::convert_obj_track(&source, &output).map(drop),
            // Camera sets have no authoring source
            AssetKind::CameraSet => Ok(()),
        };
        result.with_context(|| format!("Failed to build {:?} '{}'", kind, name))?;
    }

    Ok(())
}
