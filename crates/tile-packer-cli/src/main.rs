use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{ArgAction, Parser};
use image::RgbaImage;
use indicatif::{ProgressBar, ProgressStyle};
use tile_packer_core::{
    DEFAULT_PROJECT_FILE, DirectorySink, FsSourceLoader, OutputFormat, ProjectConfig, RunConfig,
    TilesetSink, pack_project,
};
use tracing::info;

mod scan;

#[derive(Parser, Debug)]
#[command(
    name = "tile-packer",
    about = "Pack tile images into tilesets, keeping placements stable across runs",
    version,
    author
)]
struct Cli {
    /// Project directory (project file + source images). Without it, an
    /// example project file is written to the current directory.
    #[arg(help_heading = "Input/Output")]
    dir: Option<PathBuf>,
    /// Project file, relative to the project directory (.yaml or .json)
    #[arg(long, default_value = DEFAULT_PROJECT_FILE, help_heading = "Input/Output")]
    config: PathBuf,
    /// Include patterns (glob), matched against project-relative paths
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob), matched against project-relative paths
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,
    /// Do not look for new or removed source files
    #[arg(long, default_value_t = false, help_heading = "Input/Output")]
    no_scan: bool,

    /// Discard every recorded placement and pack from scratch
    #[arg(long, default_value_t = false, help_heading = "Packing")]
    rewrite: bool,
    /// Pack and render, but write neither tilesets nor the project file
    #[arg(long, default_value_t = false, help_heading = "Packing")]
    dry_run: bool,

    /// Print the project (after discovery) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "yaml", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,

    /// Show a progress spinner (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action = ArgAction::Set, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(short, long, default_value_t = false, help_heading = "Logging/UX")]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.dir {
        None => write_example(&cli.config),
        Some(dir) => run_project(dir, &cli, cli.progress && !cli.quiet),
    }
}

fn write_example(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("{} already exists; not overwriting", path.display());
    }
    ProjectConfig::example()
        .save(path)
        .with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), "wrote example project file");
    Ok(())
}

fn run_project(dir: &Path, cli: &Cli, show_progress: bool) -> anyhow::Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("{} is not a directory", dir.display());
    }
    let config_path = dir.join(&cli.config);
    let mut project = if config_path.exists() {
        ProjectConfig::load(&config_path)?
    } else {
        info!(path = %config_path.display(), "no project file; starting from defaults");
        ProjectConfig::example()
    };
    if cli.rewrite {
        project.clear_placements();
    }

    let out_dir = dir.join(&project.output_path);
    if !cli.no_scan {
        let format: OutputFormat = project.output_format.parse()?;
        let removed = scan::prune_missing(&mut project, dir);
        let found = scan::discover_sources(dir, &out_dir, format, &cli.include, &cli.exclude)?;
        let added = scan::add_new_entries(&mut project, found);
        info!(added, removed, total = project.entries.len(), "scanned sources");
    }

    if cli.print_config {
        project.sort_for_persist();
        let text = match cli.print_config_format.as_str() {
            "yaml" => serde_yaml::to_string(&project)?,
            "json" => serde_json::to_string_pretty(&project)?,
            other => anyhow::bail!("unknown print format: {}", other),
        };
        println!("{}", text);
        return Ok(());
    }

    let cfg = RunConfig::from_project(&project)?;
    let mut loader = FsSourceLoader::new(dir);
    let directory = (!cli.dry_run).then(|| DirectorySink::new(&out_dir, cfg.format));
    let mut sink = ProgressSink::new(directory, show_progress);
    let result = pack_project(&project, &mut loader, &mut sink);
    sink.finish();
    let out = result.with_context(|| format!("pack {}", dir.display()))?;

    if cli.dry_run {
        info!(tilesets = sink.count, "dry run: nothing written");
    } else {
        out.project
            .save(&config_path)
            .with_context(|| format!("write {}", config_path.display()))?;
        info!(out_dir = %out_dir.display(), tilesets = sink.count, "wrote tilesets");
    }
    info!("{}", out.summary.summary());
    Ok(())
}

/// Forwards tilesets to the output directory (none on dry runs) and ticks a spinner.
struct ProgressSink {
    inner: Option<DirectorySink>,
    bar: Option<ProgressBar>,
    count: usize,
}

impl ProgressSink {
    fn new(inner: Option<DirectorySink>, progress: bool) -> Self {
        let bar = progress.then(|| {
            let b = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner:.green} saved {pos} tilesets [{elapsed_precise}] {wide_msg}",
            ) {
                b.set_style(style);
            }
            b.enable_steady_tick(Duration::from_millis(100));
            b
        });
        Self {
            inner,
            bar,
            count: 0,
        }
    }

    fn finish(&self) {
        if let Some(b) = &self.bar {
            b.finish_and_clear();
        }
    }
}

impl TilesetSink for ProgressSink {
    fn write_tileset(&mut self, index: usize, image: RgbaImage) -> tile_packer_core::Result<()> {
        if let Some(b) = &self.bar {
            b.set_message(format!("tileset {index}"));
        }
        if let Some(inner) = &mut self.inner {
            inner.write_tileset(index, image)?;
        }
        self.count += 1;
        if let Some(b) = &self.bar {
            b.inc(1);
        }
        Ok(())
    }
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}
