#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for danger-zone computation.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use danger_map_cli::{
    CliError, OutputFormat,
    input::{self, InputKind},
    render,
};
use danger_map_geo::DistanceKind;
use danger_map_zone_models::DangerZone;
use danger_map_zones::{
    ZoneClusterer, ZoneConfig,
    config::{DEFAULT_CONFIG_TOML, RiskKind, SearchStrategy, TieBreak},
};

#[derive(Parser)]
#[command(name = "danger_map", about = "Danger zone clustering for incident maps")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute danger zones and write them as JSON or `GeoJSON`
    Zones {
        #[command(flatten)]
        input: InputArgs,
        /// Output format: `json` or `geojson`
        #[arg(long, default_value = "json")]
        format: OutputFormat,
        /// Draw zones as circle polygons with this many vertices (`GeoJSON` only)
        #[arg(long, value_parser = clap::value_parser!(u16).range(3..))]
        circle_segments: Option<u16>,
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the map popup text of every zone
    Summary {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Print the built-in configuration as TOML
    DefaultConfig,
}

#[derive(Args)]
struct InputArgs {
    /// JSON array of incidents (or reports, with `--reports`)
    #[arg(long)]
    input: PathBuf,
    /// Treat the input as report records and convert them
    #[arg(long)]
    reports: bool,
    /// TOML zone configuration (defaults to the built-in one)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Reference time in epoch milliseconds (defaults to the system clock)
    #[arg(long, allow_hyphen_values = true)]
    now: Option<i64>,
    /// Neighborhood search: `linear` or `rtree`
    #[arg(long)]
    search: Option<SearchStrategy>,
    /// Distance model: `haversine` or `geodesic`
    #[arg(long)]
    distance: Option<DistanceKind>,
    /// Risk model: `count` or `weighted`
    #[arg(long)]
    risk: Option<RiskKind>,
    /// Order of incidents with equal timestamps: `input_order` or `id`
    #[arg(long)]
    tie_break: Option<TieBreak>,
    /// Fail on the first invalid record instead of skipping it
    #[arg(long)]
    strict: bool,
}

impl InputArgs {
    /// The configuration file (or default) with command-line overrides.
    fn config(&self) -> Result<ZoneConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => ZoneConfig::load(path)?,
            None => ZoneConfig::embedded_default()?,
        };

        if let Some(search) = self.search {
            config.clustering.search = search;
        }
        if let Some(distance) = self.distance {
            config.clustering.distance = distance;
        }
        if let Some(risk) = self.risk {
            config.clustering.risk = risk;
        }
        if let Some(tie_break) = self.tie_break {
            config.clustering.tie_break = tie_break;
        }

        config.validate()?;
        Ok(config)
    }

    fn compute(&self) -> Result<(ZoneClusterer, Vec<DangerZone>), CliError> {
        let config = self.config()?;
        let kind = if self.reports {
            InputKind::Reports
        } else {
            InputKind::Incidents
        };
        let incidents = input::load(&self.input, kind, self.strict)?;

        let clusterer = ZoneClusterer::new(&config);
        let zones = match self.now {
            Some(now) => clusterer.compute_zones_at(&incidents, now),
            None => clusterer.compute_zones(&incidents),
        };

        log::info!(
            "Computed {} zones from {} incidents",
            zones.len(),
            incidents.len()
        );
        Ok((clusterer, zones))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Zones {
            input,
            format,
            circle_segments,
            output,
        } => {
            let (_, zones) = input.compute()?;
            let text = render(&zones, format, circle_segments)?;

            if let Some(path) = output {
                std::fs::write(&path, text).map_err(|source| CliError::Io {
                    path: path.clone(),
                    source,
                })?;
                log::info!("Wrote {} zones to {}", zones.len(), path.display());
            } else {
                println!("{text}");
            }
        }
        Commands::Summary { input } => {
            let (clusterer, zones) = input.compute()?;
            for zone in &zones {
                println!("{}", zone.id);
                println!("{}", clusterer.describer().summary(zone));
                println!();
            }
        }
        Commands::DefaultConfig => {
            print!("{DEFAULT_CONFIG_TOML}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_zones_flags() {
        let cli = Cli::try_parse_from([
            "danger_map",
            "zones",
            "--input",
            "incidents.json",
            "--format",
            "geojson",
            "--circle-segments",
            "24",
            "--search",
            "rtree",
            "--distance",
            "geodesic",
            "--tie-break",
            "id",
            "--now",
            "1700000000000",
        ])
        .unwrap();

        let Commands::Zones {
            input,
            format,
            circle_segments,
            output,
        } = cli.command
        else {
            panic!("expected the zones command");
        };
        assert_eq!(format, OutputFormat::Geojson);
        assert_eq!(circle_segments, Some(24));
        assert_eq!(output, None);
        assert_eq!(input.search, Some(SearchStrategy::RTree));
        assert_eq!(input.distance, Some(DistanceKind::Geodesic));
        assert_eq!(input.tie_break, Some(TieBreak::Id));
        assert_eq!(input.now, Some(1_700_000_000_000));
        assert!(!input.reports);

        let config = input.config().unwrap();
        assert_eq!(config.clustering.search, SearchStrategy::RTree);
        assert_eq!(config.clustering.distance, DistanceKind::Geodesic);
        assert_eq!(config.radius, ZoneConfig::default().radius);
        assert_eq!(config.description, ZoneConfig::default().description);
    }

    #[test]
    fn rejects_degenerate_circles() {
        assert!(
            Cli::try_parse_from([
                "danger_map",
                "zones",
                "--input",
                "x.json",
                "--circle-segments",
                "2",
            ])
            .is_err()
        );
    }

    #[test]
    fn rejects_unknown_strategy() {
        assert!(
            Cli::try_parse_from([
                "danger_map",
                "summary",
                "--input",
                "x.json",
                "--search",
                "kdtree",
            ])
            .is_err()
        );
    }
}
