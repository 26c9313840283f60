//! wlp-cleaner command line
//!
//! Usage:
//!   wlp-cleaner project.wlp                  # writes project.cleaned.wlp
//!   wlp-cleaner project.wlp -o out.wlp
//!   wlp-cleaner project.wlp --schema components.json

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use wlp_cleaner::bundle::{EditorBundle, SchemaFile, SchemaSource};
use wlp_cleaner::cleanup::{cleanup_project, CleanupOptions};
use wlp_cleaner::config::Config;
use wlp_cleaner::document::Document;
use wlp_cleaner::schema::SchemaTable;

#[derive(Parser)]
#[command(name = "wlp-cleaner", version)]
#[command(about = "Remove default values and invalid components from a Wonderland Engine project")]
struct Cli {
    /// Project file to clean
    project: PathBuf,

    /// Output file (default: <name>.cleaned.<ext> next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Editor bundle to extract component schemas from
    #[arg(long, conflicts_with = "schema")]
    bundle: Option<PathBuf>,

    /// Script evaluated before the editor bundle
    #[arg(long, conflicts_with = "schema")]
    bundle_extra: Option<PathBuf>,

    /// Stub browser globals that older bundles expect
    #[arg(long, conflicts_with = "schema")]
    legacy_preamble: bool,

    /// Pre-extracted component schema map (JSON) instead of the editor bundle
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Tolerance for snapping transform components to 0 or 1
    #[arg(long)]
    epsilon: Option<f64>,

    /// Config file (default: <config dir>/wlp-cleaner/config.ron)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    apply_overrides(&mut config, &cli);
    if !config.epsilon.is_finite() || config.epsilon < 0.0 {
        bail!("epsilon must be a non-negative number, got {}", config.epsilon);
    }

    let source: Box<dyn SchemaSource> = match &cli.schema {
        Some(path) => Box::new(SchemaFile::new(path)),
        None => Box::new(EditorBundle {
            path: config.bundle.path.clone(),
            extra_path: config.bundle.extra_path.clone(),
            legacy_preamble: config.bundle.legacy_preamble,
            interpreter: config.interpreter.clone(),
        }),
    };
    let dynamic = source.extract().context("Failed to extract component schemas")?;
    let schema = SchemaTable::build(&dynamic).context("Invalid component schemas")?;
    info!("Schema table has {} component types", schema.len());

    let text = std::fs::read_to_string(&cli.project)
        .with_context(|| format!("Failed to read {}", cli.project.display()))?;
    let mut doc = Document::parse(&text)
        .with_context(|| format!("Failed to parse {}", cli.project.display()))?;

    let options = CleanupOptions {
        epsilon: config.epsilon,
    };
    let stats = cleanup_project(&mut doc, &schema, &options)
        .with_context(|| format!("Failed to clean {}", cli.project.display()))?;

    let output = cli.output.clone().unwrap_or_else(|| default_output_path(&cli.project));
    write_atomic(&output, &doc.to_string())
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Wrote {}", output.display());

    println!("{}", stats);
    Ok(())
}

/// Command line flags win over the config file
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(epsilon) = cli.epsilon {
        config.epsilon = epsilon;
    }
    if let Some(path) = &cli.bundle {
        config.bundle.path = path.clone();
    }
    if let Some(path) = &cli.bundle_extra {
        config.bundle.extra_path = Some(path.clone());
    }
    if cli.legacy_preamble {
        config.bundle.legacy_preamble = true;
    }
}

/// `<dir>/<stem>.cleaned.<ext>`, with `wlp` when the input has no extension
fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "wlp".to_string());
    input.with_file_name(format!("{}.cleaned.{}", stem, ext))
}

/// Write through a temp file in the destination directory, then rename it
/// into place
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(contents.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("games/demo/demo.wlp")),
            PathBuf::from("games/demo/demo.cleaned.wlp")
        );
        assert_eq!(default_output_path(Path::new("demo")), PathBuf::from("demo.cleaned.wlp"));
        assert_eq!(
            default_output_path(Path::new("backup.v2.json")),
            PathBuf::from("backup.v2.cleaned.json")
        );
    }

    #[test]
    fn test_write_atomic_replaces_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.wlp");
        std::fs::write(&path, "old").unwrap();

        write_atomic(&path, "{}\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}\n");
        // Only the output is left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "wlp-cleaner",
            "p.wlp",
            "--epsilon",
            "0.5",
            "--bundle",
            "b.cjs",
            "--legacy-preamble",
        ]);
        let mut config = Config::default();
        apply_overrides(&mut config, &cli);
        assert_eq!(config.epsilon, 0.5);
        assert_eq!(config.bundle.path, PathBuf::from("b.cjs"));
        assert!(config.bundle.legacy_preamble);
        assert_eq!(config.bundle.extra_path, None);
    }

    #[test]
    fn test_schema_conflicts_with_bundle() {
        let result = Cli::try_parse_from([
            "wlp-cleaner",
            "p.wlp",
            "--schema",
            "s.json",
            "--bundle",
            "b.cjs",
        ]);
        assert!(result.is_err());
    }
}
