//! Command-line argument parsing for the galaxy viewer.

use std::path::PathBuf;

use clap::Parser;
use galaxy_core::Rgb;

use crate::config::ClampedParameter;
use crate::{Config, ConfigError};

/// Galaxy viewer command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "galaxy", about = "Procedural spiral galaxy viewer")]
pub struct CliArgs {
    /// Window width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Number of points.
    #[arg(long)]
    pub count: Option<u32>,

    /// Number of spiral arms.
    #[arg(long)]
    pub branches: Option<u32>,

    /// Galaxy radius.
    #[arg(long)]
    pub radius: Option<f32>,

    /// Twist in radians per unit radius.
    #[arg(long, allow_hyphen_values = true)]
    pub spin: Option<f32>,

    /// Core color as #rrggbb.
    #[arg(long)]
    pub inside_color: Option<String>,

    /// Rim color as #rrggbb.
    #[arg(long)]
    pub outside_color: Option<String>,

    /// Seed for reproducible generation.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config, then snap the galaxy parameters
    /// into bounds. Returns the fields that had to be clamped, whether the
    /// bad value came from the file or the command line.
    pub fn apply_cli_overrides(
        &mut self,
        args: &CliArgs,
    ) -> Result<Vec<ClampedParameter>, ConfigError> {
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }

        let params = &mut self.galaxy.parameters;
        if let Some(count) = args.count {
            params.count = count;
        }
        if let Some(branches) = args.branches {
            params.branches = branches;
        }
        if let Some(radius) = args.radius {
            params.radius = radius;
        }
        if let Some(spin) = args.spin {
            params.spin = spin;
        }
        if let Some(ref hex) = args.inside_color {
            params.inside_color = parse_color("inside-color", hex)?;
        }
        if let Some(ref hex) = args.outside_color {
            params.outside_color = parse_color("outside-color", hex)?;
        }

        if let Some(seed) = args.seed {
            self.galaxy.seed = Some(seed);
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }

        Ok(self.clamp_parameters())
    }
}

fn parse_color(flag: &'static str, hex: &str) -> Result<Rgb, ConfigError> {
    Rgb::from_hex(hex).map_err(|source| ConfigError::ColorError { flag, source })
}
