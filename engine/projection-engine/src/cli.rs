//! # Command Line Interface
//!
//! CLI for building projection exports and inspecting simulation curves.

use crate::builder::ProjectionBuilder;
use crate::cache::ProjectionStore;
use crate::config::{CurveKind, ProjectionConfig};
use crate::export::write_snapshot;
use crate::source::CsvRecordSource;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use curve_stats::{CurveNormalizer, PercentileExtractor, DEFAULT_TAIL};
use std::path::PathBuf;

/// Projection CLI for simulated fantasy scoring tables
#[derive(Parser)]
#[command(name = "projection-cli")]
#[command(about = "Derive mean/median/ceiling projections from simulation curves")]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Simulation table CSV (overrides config and PROJECTION_CSV)
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write players.json and projections/<id>.json
    Build {
        /// Output directory
        #[arg(short, long, default_value = "./data")]
        out: PathBuf,
    },
    /// List loaded players
    Players,
    /// Print one player's projection
    Show {
        /// Player id (e.g., "josh-allen")
        id: String,
    },
    /// Evaluate a single curve given as JSON text
    Tail {
        /// Curve JSON, e.g. '[{"pts": 10, "pct": 90}]'
        #[arg(long)]
        curve: String,
        /// Survival probability to solve for
        #[arg(long, default_value_t = DEFAULT_TAIL)]
        target: f64,
        /// How to read the curve points
        #[arg(long, value_enum, default_value_t = KindArg::Survival)]
        kind: KindArg,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Survival,
    Mass,
}

impl From<KindArg> for CurveKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Survival => CurveKind::Survival,
            KindArg::Mass => CurveKind::Mass,
        }
    }
}

/// CLI handler
pub struct CliHandler {
    config: ProjectionConfig,
}

impl CliHandler {
    /// Resolve configuration: file (or defaults), then environment, then flags
    pub fn new(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => ProjectionConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ProjectionConfig::default(),
        };
        let mut config = config.with_env_overrides().context("Invalid environment overrides")?;
        if let Some(csv) = &cli.csv {
            config.source.csv_path = csv.clone();
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    /// Handle CLI commands
    pub async fn handle_command(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Build { out } => self.build(out).await,
            Commands::Players => self.players(),
            Commands::Show { id } => self.show(&id),
            Commands::Tail { curve, target, kind } => self.tail(&curve, target, kind),
        }
    }

    fn store(&self) -> ProjectionStore<CsvRecordSource> {
        let source = CsvRecordSource::new(&self.config.source.csv_path, self.config.columns.clone());
        ProjectionStore::new(source, ProjectionBuilder::new(&self.config.stats))
    }

    async fn build(&self, out: PathBuf) -> Result<()> {
        let snapshot = self
            .store()
            .ensure_fresh()
            .with_context(|| format!("Failed to load {}", self.config.source.csv_path.display()))?;
        let summary = write_snapshot(&snapshot, &out).await.context("Failed to write export")?;

        println!("✅ Wrote {} players", summary.projection_count);
        println!("• {}", summary.players_path.display());
        println!("• {}/<id>.json", summary.projections_dir.display());
        if summary.removed_count > 0 {
            println!("• removed {} stale projection files", summary.removed_count);
        }
        Ok(())
    }

    fn players(&self) -> Result<()> {
        let snapshot = self.store().ensure_fresh()?;
        println!("{}", serde_json::to_string_pretty(snapshot.players())?);
        Ok(())
    }

    fn show(&self, id: &str) -> Result<()> {
        let projection = self.store().projection(id)?;
        println!("{}", serde_json::to_string_pretty(&projection)?);
        Ok(())
    }

    fn tail(&self, raw: &str, target: f64, kind: KindArg) -> Result<()> {
        anyhow::ensure!((0.0..=1.0).contains(&target), "target must be within [0, 1], got {target}");

        let normalizer = CurveNormalizer::with_duplicate_policy(self.config.stats.duplicate_policy);
        let curve = match CurveKind::from(kind) {
            CurveKind::Survival => normalizer.normalize_str(raw),
            CurveKind::Mass => normalizer.normalize_mass_str(raw),
        };

        match PercentileExtractor::new(target).estimate(&curve) {
            Some(estimate) => println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "target": target,
                    "score": estimate.score,
                    "resolution": estimate.resolution,
                    "points": curve.len(),
                }))?
            ),
            None => println!("No curve points; no statistic"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tail_command() {
        let cli = Cli::try_parse_from([
            "projection-cli",
            "tail",
            "--curve",
            r#"[{"pts": 10, "pct": 90}]"#,
            "--target",
            "0.5",
            "--kind",
            "mass",
        ])
        .unwrap();

        match cli.command {
            Commands::Tail { target, kind, .. } => {
                assert_eq!(target, 0.5);
                assert!(matches!(kind, KindArg::Mass));
            }
            _ => panic!("expected tail command"),
        }
    }

    #[test]
    fn test_csv_flag_overrides_config() {
        let cli =
            Cli::try_parse_from(["projection-cli", "--csv", "sims/week1.csv", "players"]).unwrap();
        let handler = CliHandler::new(&cli).unwrap();
        assert_eq!(handler.config().source.csv_path, PathBuf::from("sims/week1.csv"));
    }
}
