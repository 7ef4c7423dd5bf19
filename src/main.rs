use clap::{Parser, Subcommand};
use spindle::config::{self, SiteConfig};
use spindle::output;
use spindle::pipeline::Pipeline;
use spindle::types::VersionInfo;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let version = VersionInfo::current();
    if version.on_release_tag {
        version.version
    } else {
        // Leaked once at startup, called exactly once
        Box::leak(version.display().into_boxed_str())
    }
}

#[derive(Parser)]
#[command(name = "spindle")]
#[command(about = "Static site generator: markdown and assets in, HTML site out")]
#[command(long_about = "\
Static site generator: markdown and assets in, HTML site out

The source directory is mirrored into the destination. Markdown files are
rendered to HTML, everything else is copied as is.

Source structure:

  site/
  ├── _config.toml             # Site config (optional)
  ├── _data/                   # Site-wide data, keyed by file name
  │   └── authors.yaml
  ├── README.md                # → index.html
  ├── _README.yaml             # Companion data for README.md
  ├── blog/
  │   ├── first-post.md        # → blog/first-post.html
  │   └── cover.jpg            # → blog/cover.jpg
  └── _drafts/                 # Leading _ or . = never built

Metadata resolution (later wins):
  companion _<name>.yaml (or .yml) → frontmatter block between --- lines
  title, excerpt, url and created are lifted out of the merged data.

Run 'spindle gen-config' to generate a documented _config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Source directory
    #[arg(long, default_value = ".", global = true)]
    source: PathBuf,

    /// Output directory (overrides `destination` in _config.toml)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Log each file as it is processed
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Prepare the site metadata, then render and copy it to the destination
    Build {
        /// Print the prepared site as JSON instead of writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate the source directory without building
    Check,
    /// Print a stock _config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Build { dry_run } => {
            let mut pipeline = open_pipeline(&cli.source, cli.output.as_deref())?;

            if dry_run {
                let site = pipeline.prepare()?;
                println!("{}", serde_json::to_string_pretty(site)?);
                return Ok(());
            }

            println!("==> Preparing {}", cli.source.display());
            let site = pipeline.prepare()?;
            output::print_site_output(site);
            output::print_diagnostics(pipeline.diagnostics());

            println!(
                "==> Building \u{2192} {}",
                pipeline.context().destination().display()
            );
            let summary = pipeline.build()?;
            if let Some(site) = pipeline.site() {
                output::print_export_output(site, &summary);
            }
            println!("==> Build complete: {}", summary.destination.display());
        }
        Command::Check => {
            let mut pipeline = open_pipeline(&cli.source, cli.output.as_deref())?;
            println!("==> Checking {}", cli.source.display());
            let site = pipeline.prepare()?;
            output::print_site_output(site);
            output::print_diagnostics(pipeline.diagnostics());
            println!("==> Source is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise `--verbose` picks debug over info.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "spindle=debug"
        } else {
            "spindle=info"
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Load `_config.toml` from the source and apply the `--output` override.
///
/// `--output` is relative to the working directory, unlike `destination` in
/// the config file which is relative to the source.
fn open_pipeline(
    source: &Path,
    output: Option<&Path>,
) -> Result<Pipeline, Box<dyn std::error::Error>> {
    let mut config: SiteConfig = config::load_config(source)?;
    if let Some(output) = output {
        config.destination = std::path::absolute(output)?
            .to_string_lossy()
            .into_owned();
        config.validate()?;
    }
    Ok(Pipeline::new(source, config)?)
}
