use clap::{Parser, Subcommand};
use leafpress::config::{self, SiteConfig};
use leafpress::diagnostics::{Diagnostic, Severity};
use leafpress::engine::{self, EngineError};
use leafpress::output;
use leafpress::store::{DirStore, MemStore, Store};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "leafpress")]
#[command(version)]
#[command(about = "Static site generator for markdown document trees")]
#[command(long_about = "\
Static site generator for markdown document trees

Content is a tree of markdown documents; templates are a tree of HTML
documents carrying {{title}}/{{content}} placeholders and nested
<content-view>/<collection-view> regions with applies-to filters. Each
content document renders through the most specific applicable view and is
re-wrapped by every enclosing view up to the site shell.

Conventions:

  content/
  ├── index.md                 # Singleton page
  ├── image.png                # Copied through unchanged
  ├── _draft.md                # Leading underscore = not published
  └── post/
      ├── index.md             # Empty file = listing of its siblings
      └── first-steps.md
  templates/
  ├── template.html            # Site shell; may contain view regions
  └── style.css                # Copied through unchanged

Diagnostics (malformed templates, broken links, ambiguous views) never
stop a build; they are printed and any error makes the exit status 1.")]
struct Cli {
    /// Content directory (default: leafpress.toml, then ./content)
    #[arg(long, global = true)]
    content: Option<PathBuf>,

    /// Template directory (default: leafpress.toml, then ./templates)
    #[arg(long, global = true)]
    templates: Option<PathBuf>,

    /// Output directory (default: leafpress.toml, then ./dist)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Wait for Enter before exiting, so a double-clicked run stays visible
    #[arg(long, global = true)]
    pause: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the content tree through the view templates
    Build,
    /// Validate templates and content without writing any output
    Check,
    /// Print a documented leafpress.toml with all options
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let site = SiteConfig::load_or_default(Path::new("."))?;
    let content = cli.content.clone().unwrap_or(site.content);
    let templates = cli.templates.clone().unwrap_or(site.templates);
    let output_dir = cli.output.clone().unwrap_or(site.output);

    let had_errors = match cli.command {
        Command::Build => {
            log::info!(
                "==> Building {} + {} -> {}",
                content.display(),
                templates.display(),
                output_dir.display()
            );
            let mut output_store = DirStore::new(&output_dir);
            run_and_report(
                &DirStore::new(&content),
                &DirStore::new(&templates),
                &mut output_store,
            )?
        }
        Command::Check => {
            log::info!(
                "==> Checking {} + {}",
                content.display(),
                templates.display()
            );
            let mut scratch = MemStore::new();
            run_and_report(
                &DirStore::new(&content),
                &DirStore::new(&templates),
                &mut scratch,
            )?
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            false
        }
    };

    if cli.pause {
        pause();
    }
    if had_errors {
        std::process::exit(1);
    }
    Ok(())
}

/// Run one pass, print every diagnostic at its severity's log level, and
/// say whether any was an error.
fn run_and_report(
    content: &dyn Store,
    templates: &dyn Store,
    output_store: &mut dyn Store,
) -> Result<bool, EngineError> {
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let report = engine::run(content, templates, output_store, &mut |d| {
        diagnostics.push(d)
    })?;
    for diagnostic in &diagnostics {
        match diagnostic.severity {
            Severity::Error => log::error!("{}", diagnostic.to_text()),
            Severity::Warn => log::warn!("{}", diagnostic.to_text()),
            Severity::Info => log::info!("{}", diagnostic.to_text()),
        }
    }
    log::info!("{}", output::run_summary(&report));
    Ok(diagnostics.iter().any(|d| d.severity == Severity::Error))
}

fn pause() {
    print!("Press [Enter] to exit: ");
    let _ = std::io::stdout().flush();
    let mut line = String::new();
    let _ = std::io::stdin().read_line(&mut line);
}
