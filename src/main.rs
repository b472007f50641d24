use anyhow::Context;
use clap::{Parser, Subcommand};
use commit_meta::{
    write_dataset, BrushRect, CommitMeta, GitRepository, MetaConfig, RenderUpdate, Report,
    Surface, UiEvent,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// デフォルトの除外パターン
const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    "**/node_modules/**",  // Node.jsの依存関係
    "**/dist/**",          // ビルド成果物
    "**/build/**",         // ビルドディレクトリ
    "**/target/**",        // Rustのビルドディレクトリ
    "**/vendor/**",        // 依存関係
    "**/*.min.*",          // minifyされたファイル
    "**/*.lock",           // ロックファイル
    "**/package-lock.json",
    "**/*.png",            // 画像
    "**/*.jpg",
    "**/*.svg",
    "**/*.ico",
    "**/*.pdf",
];

#[derive(Parser)]
#[command(
    version,
    about = "Aggregates per-line commit history into statistics and visualizations",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (default: ./meta.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print summary statistics of a dataset
    Stats {
        /// Path to the per-line dataset (loc.csv)
        dataset: PathBuf,

        /// Output format (json or csv)
        #[arg(short, long, default_value = "json")]
        format: String,
    },

    /// Render the scatterplot, selection and file breakdown
    Render {
        /// Path to the per-line dataset (loc.csv)
        dataset: PathBuf,

        /// Time slider position (0-100)
        #[arg(short, long, default_value_t = 100.0)]
        progress: f64,

        /// Brush rectangle in chart coordinates: x0,y0,x1,y1
        #[arg(short, long, value_parser = parse_brush)]
        brush: Option<BrushRect>,

        /// Output format (html, svg or json)
        #[arg(short, long, default_value = "html")]
        format: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate a per-line dataset from a Git repository
    Generate {
        /// Path to Git repository
        #[arg(short, long)]
        repo: PathBuf,

        /// Repository slug used in commit URLs (owner/name)
        #[arg(long)]
        slug: Option<String>,

        /// Include only files matching these patterns
        #[arg(short = 'i', long = "include")]
        include_patterns: Option<Vec<String>>,

        /// Exclude files matching these patterns
        #[arg(short = 'e', long = "exclude")]
        exclude_patterns: Option<Vec<String>>,

        /// Use no default exclude patterns
        #[arg(long)]
        no_default_excludes: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn parse_brush(value: &str) -> Result<BrushRect, String> {
    let parts = value
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid brush coordinate: {e}"))?;
    match parts.as_slice() {
        [x0, y0, x1, y1] => Ok(BrushRect::new(*x0, *y0, *x1, *y1)),
        _ => Err(format!("expected 4 comma separated numbers, got {}", parts.len())),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn write_output(output: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(content.as_bytes())
                .context("Failed to write to stdout")?;
            stdout.write_all(b"\n").context("Failed to write to stdout")
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = MetaConfig::load(cli.config.as_deref()).context("Failed to load config")?;

    match cli.command {
        Command::Stats { dataset, format } => {
            let meta = CommitMeta::from_path(&dataset)
                .with_context(|| format!("Failed to load {}", dataset.display()))?;
            let stats = meta.stats();

            match format.as_str() {
                "json" => {
                    let json = serde_json::to_string_pretty(&stats)
                        .context("Failed to serialize to JSON")?;
                    write_output(None, &json)?;
                }
                "csv" => {
                    let mut wtr = csv::Writer::from_writer(std::io::stdout());
                    wtr.serialize(&stats).context("Failed to write CSV record")?;
                    wtr.flush().context("Failed to flush CSV writer")?;
                }
                _ => anyhow::bail!("Unsupported output format: {}", format),
            }
        }

        Command::Render {
            dataset,
            progress,
            brush,
            format,
            output,
        } => {
            let meta = CommitMeta::from_path(&dataset)
                .with_context(|| format!("Failed to load {}", dataset.display()))?;
            let mut state = meta
                .into_state(config.chart.layout())
                .context("Failed to build chart state")?;

            let mut updates: Vec<RenderUpdate> = state.load(progress);
            if brush.is_some() {
                state.dispatch(UiEvent::Brush(brush), &mut updates);
            }

            let content = match format.as_str() {
                "json" => serde_json::to_string_pretty(&updates)
                    .context("Failed to serialize to JSON")?,
                "html" | "svg" => {
                    let mut report = Report::default();
                    for update in updates {
                        report.apply(update);
                    }
                    if format == "svg" {
                        report.svg()
                    } else {
                        report.html()
                    }
                }
                _ => anyhow::bail!("Unsupported output format: {}", format),
            };
            write_output(output.as_deref(), &content)?;
        }

        Command::Generate {
            repo,
            slug,
            include_patterns,
            exclude_patterns,
            no_default_excludes,
            output,
        } => {
            let mut includes = config.generate.include.clone();
            includes.extend(include_patterns.unwrap_or_default());

            let mut excludes = Vec::new();
            if !no_default_excludes {
                excludes.extend(DEFAULT_EXCLUDE_PATTERNS.iter().map(|s| s.to_string()));
            }
            excludes.extend(config.generate.exclude.clone());
            excludes.extend(exclude_patterns.unwrap_or_default());

            let git_repo = GitRepository::open(&repo, includes, excludes)
                .context("Failed to open repository")?;
            let slug = slug
                .or_else(|| config.dataset.repo.clone())
                .or_else(|| git_repo.origin_slug())
                .unwrap_or_else(|| {
                    let name = repo
                        .canonicalize()
                        .ok()
                        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
                        .unwrap_or_else(|| "repo".to_string());
                    format!("local/{name}")
                });

            let rows = git_repo
                .blame_rows(&slug)
                .context("Failed to blame repository")?;

            match output {
                Some(path) => {
                    let file = std::fs::File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    write_dataset(&rows, file).context("Failed to write dataset")?;
                }
                None => {
                    write_dataset(&rows, std::io::stdout()).context("Failed to write dataset")?
                }
            }
        }
    }

    Ok(())
}
