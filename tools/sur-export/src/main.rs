//! sur-export - SUR mesh tool
//!
//! Inspects SUR files and converts meshes between SUR (ascii/binary) and
//! Wavefront OBJ, one file at a time or in batches from a manifest.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use sur_codec::{Axis, FormatVersion, ReadOptions, Transform, WriteOptions};
use sur_export::{ConvertOptions, MeshFile, manifest, mesh};

#[derive(Parser)]
#[command(name = "sur-export")]
#[command(about = "SUR mesh conversion tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show format, counts and bounds of a SUR file
    Info {
        /// Input .sur file
        input: PathBuf,
    },

    /// Convert a single mesh (OBJ -> SUR, SUR -> OBJ, SUR -> SUR)
    Convert {
        /// Input .sur or .obj file
        input: PathBuf,

        /// Output file (default: input with the other extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// SUR encoding to write (ascii or binary)
        #[arg(short, long, default_value = "ascii")]
        format: FormatVersion,

        /// Store facet normals (binary SUR) or emit them (OBJ)
        #[arg(long)]
        facet_normals: bool,

        /// Reverse triangle winding
        #[arg(long)]
        flip_winding: bool,

        /// Global scale, multiplied into coordinates on the SUR side
        #[arg(long, default_value_t = 1.0)]
        scale: f64,

        /// SUR axis that points forward
        #[arg(long, default_value = "Y", allow_hyphen_values = true)]
        forward: Axis,

        /// SUR axis that points up
        #[arg(long, default_value = "Z", allow_hyphen_values = true)]
        up: Axis,
    },

    /// Build meshes from a manifest file
    Build {
        /// Path to meshes.toml manifest
        #[arg(default_value = "meshes.toml")]
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
        /// Path to meshes.toml manifest
        #[arg(default_value = "meshes.toml")]
        manifest: PathBuf,
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
        Commands::Info { input } => {
            let info = mesh::inspect(&input, &ReadOptions::default())?;
            mesh::log_info(&input, &info);
        }

        Commands::Convert {
            input,
            output,
            format,
            facet_normals,
            flip_winding,
            scale,
            forward,
            up,
        } => {
            let Some(source) = MeshFile::from_path(&input) else {
                anyhow::bail!("Unsupported mesh format: {:?} (use .sur or .obj)", input);
            };
            let output = output
                .unwrap_or_else(|| input.with_extension(source.default_target().extension()));

            let options = ConvertOptions {
                read: ReadOptions::default(),
                write: WriteOptions {
                    facet_normals,
                    flip_winding,
                    ..WriteOptions::with_version(format)
                },
                transform: Transform::new(scale, forward, up)?,
            };

            tracing::info!("Converting {:?} -> {:?}", input, output);
            mesh::convert(&input, &output, &options)?;
            tracing::info!("Done!");
        }

        Commands::Build {
            manifest,
            output,
            verbose,
        } => {
            if verbose {
                tracing::info!("Building meshes from {:?}", manifest);
            }
            let config = manifest::load_manifest(&manifest)?;
            let written = manifest::build_all(&config, output.as_deref())?;
            tracing::info!("Build complete! {} mesh(es) written", written.len());
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            manifest::validate(&config)?;
            tracing::info!("Manifest is valid!");
        }
    }

    Ok(())
}
