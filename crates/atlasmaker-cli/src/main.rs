use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use atlasmaker_core::import::{decode_file, import_files_with, is_image};
use atlasmaker_core::{AtlasConfig, AtlasPacker, SortOrder, SpriteRegistry, layers_to_json, trim_image};
use clap::{ArgAction, Parser, Subcommand};
use globset::{Glob, GlobSet, GlobSetBuilder};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "atlasmaker",
    about = "Trim sprites and pack them into atlas layers",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import sprites and pack them into layers
    Pack(PackArgs),
    /// Print the trimmed opaque bounds of each image
    Trim(InputArgs),
    /// Simple timing bench (imports once, times one rebuild)
    Bench(PackArgs),
}

#[derive(Parser, Debug, Clone)]
struct InputArgs {
    /// Input file or directory
    #[arg(help_heading = "Input")]
    input: PathBuf,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input")]
    exclude: Vec<String>,
    /// Trim alpha threshold (0..=255)
    #[arg(long, default_value_t = 0, help_heading = "Image Processing")]
    trim_threshold: u8,
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    #[command(flatten)]
    input: InputArgs,
    /// YAML config file path (overrides layout options)
    #[arg(long, help_heading = "Layout")]
    config: Option<PathBuf>,
    /// Layer side in pixels (power of two)
    #[arg(long, default_value_t = atlasmaker_core::DEFAULT_SIDE, help_heading = "Layout")]
    side: u32,
    /// Sort order: area_asc|area_desc|max_side_desc|name_asc|none
    #[arg(long, default_value = "area_asc", help_heading = "Layout")]
    sort_order: String,
    /// Outline every placement in red when layers are composited (bench)
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    outlines: bool,
    /// Print the layer layout as JSON on stdout
    #[arg(long, default_value_t = false, help_heading = "Output")]
    json: bool,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Output")]
    print_config: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);
    let progress = cli.progress && !cli.quiet;
    match &cli.command {
        Commands::Pack(args) => run_pack(args, progress),
        Commands::Trim(args) => run_trim(args),
        Commands::Bench(args) => run_bench(args),
    }
}

fn build_config(args: &PackArgs) -> anyhow::Result<AtlasConfig> {
    let mut cfg = AtlasConfig {
        side: args.side,
        sort_order: parse_sort_order(&args.sort_order)?,
        trim_threshold: args.input.trim_threshold,
        outlines: args.outlines,
    };
    if let Some(path) = &args.config {
        let file = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)?;
        cfg = y.into_atlas_config(cfg)?;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn import(
    args: &InputArgs,
    registry: &SpriteRegistry,
    threshold: u8,
    show_progress: bool,
) -> anyhow::Result<()> {
    let filter = PathFilter::new(&args.include, &args.exclude)?;
    let paths = filter.collect(&args.input);
    let bar = if show_progress {
        let bar = ProgressBar::new(paths.len() as u64);
        bar.set_style(ProgressStyle::with_template(
            "{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        bar
    } else {
        ProgressBar::hidden()
    };
    let report = import_files_with(registry, &paths, threshold, |p| {
        if let Some(name) = p.file_name() {
            bar.set_message(name.to_string_lossy().into_owned());
        }
        bar.inc(1);
    });
    bar.finish_and_clear();

    for (path, reason) in &report.failed {
        error!(?path, %reason, "skip image");
    }
    if !report.skipped.is_empty() {
        warn!(count = report.skipped.len(), "skipped files with duplicate identifiers");
    }
    info!(imported = report.imported.len(), total = registry.len(), "loaded sprites");
    Ok(())
}

fn run_pack(args: &PackArgs, show_progress: bool) -> anyhow::Result<()> {
    let cfg = build_config(args)?;
    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
        return Ok(());
    }

    let registry = Arc::new(SpriteRegistry::new());
    import(&args.input, &registry, cfg.trim_threshold, show_progress)?;
    let packer = AtlasPacker::new(registry, cfg)?;
    packer.rebuild()?;

    let stats = packer.stats();
    info!(
        layers = stats.num_layers,
        used_area = stats.used_area,
        total_area = stats.total_layer_area,
        occupancy = format!("{:.2}%", stats.occupancy * 100.0),
        "stats"
    );
    if args.json {
        let layers = packer.fetch_layers();
        println!("{}", serde_json::to_string_pretty(&layers_to_json(&layers))?);
    } else {
        println!("{}", stats.summary());
    }
    Ok(())
}

fn run_trim(args: &InputArgs) -> anyhow::Result<()> {
    let paths = PathFilter::new(&args.include, &args.exclude)?.collect(&args.input);
    for p in &paths {
        match decode_file(p) {
            Ok(img) => {
                let rgba = img.to_rgba8();
                let r = trim_image(&rgba, args.trim_threshold);
                println!(
                    "{} {}x{} -> ({}, {}, {}, {})",
                    p.display(),
                    rgba.width(),
                    rgba.height(),
                    r.x,
                    r.y,
                    r.w,
                    r.h
                );
            }
            Err(e) => error!(?p, error = %e, "skip image"),
        }
    }
    Ok(())
}

fn run_bench(args: &PackArgs) -> anyhow::Result<()> {
    let cfg = build_config(args)?;
    let registry = Arc::new(SpriteRegistry::new());
    import(&args.input, &registry, cfg.trim_threshold, false)?;
    let packer = AtlasPacker::new(registry, cfg)?;

    let start = Instant::now();
    packer.rebuild()?;
    let pack_time = start.elapsed();
    let start = Instant::now();
    let canvases = packer.render_layers();
    let compose_time = start.elapsed();

    let stats = packer.stats();
    println!(
        "sprites={} layers={} occupancy={:.2}% pack={} compose={} ({} canvases)",
        packer.registry().len(),
        stats.num_layers,
        stats.occupancy * 100.0,
        fmt_dur(pack_time),
        fmt_dur(compose_time),
        canvases.len()
    );
    Ok(())
}

fn fmt_dur(d: Duration) -> String {
    let ms = d.as_secs_f64() * 1000.0;
    if ms >= 1.0 {
        format!("{:.1}ms", ms)
    } else {
        format!("{}us", d.as_micros())
    }
}

/// Include/exclude globs applied to `/`-separated paths; only image files pass.
struct PathFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl PathFilter {
    fn new(include: &[String], exclude: &[String]) -> anyhow::Result<Self> {
        Ok(Self {
            include: glob_set(include)?,
            exclude: glob_set(exclude)?,
        })
    }

    fn accepts(&self, path: &Path) -> bool {
        if !is_image(path) {
            return false;
        }
        let normalized = path.to_string_lossy().replace('\\', "/");
        let included = self.include.as_ref().is_none_or(|set| set.is_match(&normalized));
        let excluded = self.exclude.as_ref().is_some_and(|set| set.is_match(&normalized));
        included && !excluded
    }

    /// Image files under `root` (or `root` itself), in file-name order.
    fn collect(&self, root: &Path) -> Vec<PathBuf> {
        WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "cannot read entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && self.accepts(entry.path()))
            .map(|entry| entry.into_path())
            .collect()
    }
}

fn glob_set(patterns: &[String]) -> anyhow::Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("bad glob {:?}", pattern))?);
    }
    Ok(Some(builder.build()?))
}

/// `RUST_LOG` wins when set; otherwise `-q` and `-v` pick the level.
fn init_tracing(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    side: Option<u32>,
    sort_order: Option<String>,
    trim_threshold: Option<u8>,
    outlines: Option<bool>,
}

impl YamlConfig {
    fn into_atlas_config(self, mut cfg: AtlasConfig) -> anyhow::Result<AtlasConfig> {
        if let Some(v) = self.side {
            cfg.side = v;
        }
        if let Some(v) = self.sort_order {
            cfg.sort_order = parse_sort_order(&v)?;
        }
        if let Some(v) = self.trim_threshold {
            cfg.trim_threshold = v;
        }
        if let Some(v) = self.outlines {
            cfg.outlines = v;
        }
        Ok(cfg)
    }
}

fn parse_sort_order(s: &str) -> anyhow::Result<SortOrder> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown sort order: {}", s))
}
