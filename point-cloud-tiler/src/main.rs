/// Depth image to point mesh converter main entry point
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use point_cloud_tiler::config::{DepthSign, PipelineConfig, PlyFormat};
use point_cloud_tiler::merger::merge_to_file;
use point_cloud_tiler::pipeline::{
    MergeOverrides, generate_single, generate_tiles, resolve_merge_params,
};
use point_cloud_tiler::raster::SourceRasters;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SignArg {
    /// Z = depth
    Positive,
    /// Z = -depth
    Negative,
}

#[derive(Parser, Debug)]
#[command(name = "point-cloud-tiler", version)]
struct Args {
    /// JSON configuration file; flags below override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Sign convention for the Z axis.
    #[arg(long, value_enum, global = true)]
    depth_sign: Option<SignArg>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a colour/depth/normal triple into a single mesh file.
    Generate {
        rgb_file: PathBuf,
        depth_file: PathBuf,
        normal_file: PathBuf,
        ply_file: PathBuf,
        /// Write an ASCII body instead of binary.
        #[arg(long)]
        ascii: bool,
    },
    /// Convert into overlapping tiles, one binary mesh per tile.
    Tile {
        rgb_file: PathBuf,
        depth_file: PathBuf,
        normal_file: PathBuf,
        output_dir: PathBuf,
        #[arg(long)]
        num_samples: Option<usize>,
        #[arg(long)]
        padding: Option<usize>,
    },
    /// Reunify the tiles of a directory into one mesh file.
    Merge {
        input_dir: PathBuf,
        output_file: PathBuf,
        #[arg(long)]
        num_samples: Option<usize>,
        #[arg(long)]
        padding: Option<usize>,
        /// Full image width; read from the tile manifest when omitted.
        #[arg(long)]
        width: Option<usize>,
        /// Full image height; read from the tile manifest when omitted.
        #[arg(long)]
        height: Option<usize>,
        #[arg(long)]
        ascii: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(sign) = args.depth_sign {
        config.camera.depth_sign = match sign {
            SignArg::Positive => DepthSign::Positive,
            SignArg::Negative => DepthSign::Negative,
        };
    }

    match args.command {
        Command::Generate {
            rgb_file,
            depth_file,
            normal_file,
            ply_file,
            ascii,
        } => {
            let rasters = SourceRasters::load(&rgb_file, &depth_file, &normal_file)?;
            let format = if ascii { PlyFormat::Ascii } else { config.format };
            generate_single(&rasters, &config.camera, &ply_file, format)?;
        }
        Command::Tile {
            rgb_file,
            depth_file,
            normal_file,
            output_dir,
            num_samples,
            padding,
        } => {
            let mut tiling = config.tiling;
            tiling.num_samples = num_samples.unwrap_or(tiling.num_samples);
            tiling.padding = padding.unwrap_or(tiling.padding);

            let rasters = SourceRasters::load(&rgb_file, &depth_file, &normal_file)?;
            let manifest = generate_tiles(&rasters, &config.camera, &tiling, &output_dir)?;
            info!("Wrote {} tiles", manifest.tiles.len());
        }
        Command::Merge {
            input_dir,
            output_file,
            num_samples,
            padding,
            width,
            height,
            ascii,
        } => {
            let overrides = MergeOverrides {
                image_width: width,
                image_height: height,
                num_samples,
                padding,
            };
            let params = resolve_merge_params(&input_dir, &overrides, &config.tiling)?;
            let format = if ascii { PlyFormat::Ascii } else { config.format };
            let report = merge_to_file(&input_dir, &params, &output_file, format)?;
            for path in &report.missing_tiles {
                info!("  missing: {}", path.display());
            }
            for (path, reason) in &report.malformed_tiles {
                info!("  malformed: {} ({})", path.display(), reason);
            }
        }
    }

    Ok(())
}
