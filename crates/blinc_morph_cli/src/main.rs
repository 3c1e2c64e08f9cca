//! Blinc Morph CLI - inspect and edit SVG paths from the command line
//!
//! ```text
//! blinc-morph info "M 0 0 L 10 10 Z" --json
//! blinc-morph edit "M 0 0 L 10 10 L 20 20" --op "split 0 2 0.5"
//! blinc-morph interpolate "M 0 0 L 10 0" "M 0 10 L 10 10" --fraction 0.5
//! ```

mod config;
mod ops;

use std::path::PathBuf;

use anyhow::{Context, Result};
use blinc_morph::{interpolate, Command, HitOptions, Path, Point, Rect};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::config::MorphConfig;
use crate::ops::Op;

/// Non-destructive SVG path editing
#[derive(Parser, Debug)]
#[command(name = "blinc-morph")]
#[command(about = "Inspect, edit, project and interpolate SVG paths")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./blinc_morph.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Decimal places in printed paths, overriding the config
    #[arg(short, long, global = true)]
    precision: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print subpaths, commands, length and bounds
    Info {
        path: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Apply edit operations in order and print the result
    Edit {
        path: String,
        /// Operation such as "split 0 2 0.5" or "reverse 1" (repeatable)
        #[arg(long = "op", required = true)]
        ops: Vec<String>,
    },

    /// Check whether two paths can be interpolated
    Morphable { start: String, end: String },

    /// Blend two morphable paths
    Interpolate {
        start: String,
        end: String,
        #[arg(long, default_value = "0.5")]
        fraction: f64,
    },

    /// Closest point on the path
    Project {
        path: String,
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
        /// Only consider this subpath
        #[arg(long)]
        sub: Option<usize>,
    },

    /// Hit test endpoints, strokes and filled shapes
    Hit {
        path: String,
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
    },
}

#[derive(Serialize)]
struct PathInfo {
    path: String,
    length: f64,
    bounding_box: Option<Rect>,
    sub_paths: Vec<SubPathInfo>,
}

#[derive(Serialize)]
struct SubPathInfo {
    commands: Vec<String>,
    is_closed: bool,
    is_reversed: bool,
    shift_offset: usize,
    is_split: bool,
    is_collapsing: bool,
}

struct Printer {
    precision: Option<usize>,
}

impl Printer {
    fn path(&self, path: &Path) -> String {
        match self.precision {
            Some(precision) => path.path_string_with_precision(precision),
            None => path.path_string(),
        }
    }
}

fn parse(data: &str) -> Result<Path> {
    Path::parse(data).with_context(|| format!("Failed to parse path \"{}\"", data))
}

fn path_info(path: &Path, printer: &Printer) -> PathInfo {
    PathInfo {
        path: printer.path(path),
        length: path.path_length(),
        bounding_box: path.bounding_box(),
        sub_paths: path
            .sub_paths()
            .iter()
            .map(|sub_path| SubPathInfo {
                commands: sub_path.commands().iter().map(Command::to_string).collect(),
                is_closed: sub_path.is_closed(),
                is_reversed: sub_path.is_reversed(),
                shift_offset: sub_path.shift_offset(),
                is_split: sub_path.is_split(),
                is_collapsing: sub_path.is_collapsing(),
            })
            .collect(),
    }
}

fn run(cli: Cli, config: &MorphConfig) -> Result<()> {
    let printer = Printer {
        precision: cli.precision.or(config.format.precision),
    };

    match cli.command {
        Commands::Info { path, json } => {
            let path = parse(&path)?;
            let info = path_info(&path, &printer);
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("path:   {}", info.path);
                println!("length: {}", info.length);
                if let Some(rect) = info.bounding_box {
                    println!("bounds: {} .. {}", rect.min, rect.max);
                }
                for (sub_idx, sub_path) in info.sub_paths.iter().enumerate() {
                    println!(
                        "subpath {} ({}, {} commands)",
                        sub_idx,
                        if sub_path.is_closed { "closed" } else { "open" },
                        sub_path.commands.len()
                    );
                    for (cmd_idx, command) in sub_path.commands.iter().enumerate() {
                        println!("  {:>3}  {}", cmd_idx, command);
                    }
                }
            }
        }

        Commands::Edit { path, ops } => {
            let path = parse(&path)?;
            let ops = ops
                .iter()
                .map(|raw| {
                    raw.parse::<Op>()
                        .with_context(|| format!("Invalid operation \"{}\"", raw))
                })
                .collect::<Result<Vec<_>>>()?;

            let mut mutator = path.mutate();
            for op in &ops {
                debug!(?op, "applying operation");
                op.apply(&mut mutator)
                    .with_context(|| format!("Failed to apply {:?}", op))?;
            }
            println!("{}", printer.path(&mutator.build()));
        }

        Commands::Morphable { start, end } => {
            let (start, end) = (parse(&start)?, parse(&end)?);
            println!("{}", start.is_morphable_with(&end));
        }

        Commands::Interpolate {
            start,
            end,
            fraction,
        } => {
            let (start, end) = (parse(&start)?, parse(&end)?);
            let blended = interpolate(&start, &end, fraction)?;
            println!("{}", printer.path(&blended));
        }

        Commands::Project { path, x, y, sub } => {
            let path = parse(&path)?;
            match path.project(Point::new(x, y), sub) {
                Some(projection) => println!(
                    "subpath {} command {} t={} d={} at {}",
                    projection.sub_idx,
                    projection.cmd_idx,
                    projection.result.t,
                    projection.result.d,
                    projection.result.point()
                ),
                None => println!("no drawable commands"),
            }
        }

        Commands::Hit { path, x, y } => {
            let path = parse(&path)?;
            let hit = &config.hit_test;
            let point_in_range = |d: f64, _: &Command| d <= hit.point_radius;
            let segment_in_range = |d: f64, _: &Command| d <= hit.segment_radius;
            let options = HitOptions {
                is_point_in_range: Some(&point_in_range),
                is_segment_in_range: Some(&segment_in_range),
                find_shapes: hit.find_shapes,
                restrict_to_sub_idx: None,
            };
            let result = path.hit_test(Point::new(x, y), &options);
            if let Some(hit) = result.endpoint_hits.first() {
                println!("endpoint: subpath {} command {}", hit.sub_idx, hit.cmd_idx);
            } else if let Some(hit) = result.segment_hits.first() {
                println!("segment: subpath {} command {}", hit.sub_idx, hit.cmd_idx);
            } else if let Some(sub_idx) = result.shape_hits.first() {
                println!("shape: subpath {}", sub_idx);
            } else {
                println!("no hit");
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = MorphConfig::load(cli.config.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!(command = ?cli.command, "blinc-morph");
    run(cli, &config)
}
