//! One-shot classification of a single coordinate or a CSV of incident
//! reports against a boundaries file.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use barangay::boundaries::{self, AxisOrder};
use barangay::{Point, RegionClassifier, RegionIndex};

mod incidents;
use incidents::{load_incidents, IncidentOutput, IncidentRow};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "locate")]
#[command(about = "Classify coordinates into barangays")]
struct Args {
    /// Boundaries JSON file
    #[arg(short, long)]
    boundaries: PathBuf,

    /// How the boundaries file fills lat/long
    #[arg(long, value_enum, default_value_t = AxisOrder::LatLong)]
    axis_order: AxisOrder,

    /// Restrict to one province
    #[arg(long)]
    province: Option<String>,

    /// Restrict to one municipality of the province
    #[arg(long, requires = "province")]
    municipality: Option<String>,

    /// Nearby radius bands in meters
    #[arg(long, value_delimiter = ',', default_values_t = [200, 500])]
    bands: Vec<u32>,

    /// Latitude of a single point
    #[arg(long, allow_hyphen_values = true, requires = "long", conflicts_with = "incidents")]
    lat: Option<String>,

    /// Longitude of a single point
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    long: Option<String>,

    /// CSV of incidents with id, lat and long columns
    #[arg(short, long, required_unless_present = "lat")]
    incidents: Option<PathBuf>,

    /// Write JSON lines here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean JSON
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let classifier = RegionClassifier::new(args.bands.clone())?;
    // Fails before any point is classified if a polygon is malformed
    let snapshot = boundaries::load_snapshot(&args.boundaries, args.axis_order)?;
    let index = snapshot.index_for(args.province.as_deref(), args.municipality.as_deref())?;
    info!(
        "Classifying against {} polygons with bands {:?}",
        index.len(),
        classifier.bands()
    );

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    match (&args.lat, &args.long, &args.incidents) {
        (Some(lat), Some(long), _) => {
            let point = Point::parse(lat, long)?;
            let result = classifier.locate_indexed(&point, index)?;
            serde_json::to_writer(&mut out, &result)?;
            writeln!(out)?;
        }
        (_, _, Some(path)) => {
            let rows = load_incidents(path)?;
            let outputs = classify_rows(&classifier, index, &rows)?;
            let failed = outputs.iter().filter(|o| o.error.is_some()).count();
            for output in &outputs {
                serde_json::to_writer(&mut out, output)?;
                writeln!(out)?;
            }
            if failed > 0 {
                warn!("{} of {} incidents could not be classified", failed, outputs.len());
            }
            info!("Classified {} incidents", outputs.len() - failed);
        }
        _ => anyhow::bail!("Pass either --lat/--long or --incidents"),
    }

    out.flush()?;
    Ok(())
}

/// Classify every row in parallel, keeping input order.
///
/// A bad coordinate only fails its own row.
fn classify_rows(
    classifier: &RegionClassifier,
    index: &RegionIndex,
    rows: &[IncidentRow],
) -> Result<Vec<IncidentOutput>> {
    let pb = ProgressBar::new(rows.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    let outputs = rows
        .par_iter()
        .map(|row| {
            let classified = Point::parse(&row.lat, &row.long)
                .and_then(|point| classifier.locate_indexed(&point, index));
            pb.inc(1);
            match classified {
                Ok(result) => IncidentOutput {
                    id: row.id.clone(),
                    result: Some(result),
                    error: None,
                },
                Err(e) => IncidentOutput {
                    id: row.id.clone(),
                    result: None,
                    error: Some(e.to_string()),
                },
            }
        })
        .collect();

    pb.finish_with_message("done");
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use barangay::Polygon;

    fn square(name: &str, lat: f64, lon: f64, size: f64) -> Polygon {
        let corners = [
            (lat, lon),
            (lat + size, lon),
            (lat + size, lon + size),
            (lat, lon + size),
        ];
        Polygon::new(
            name,
            corners
                .iter()
                .map(|&(lat, lon)| Point::new(lat, lon).unwrap())
                .collect(),
        )
    }

    fn row(id: &str, lat: &str, long: &str) -> IncidentRow {
        IncidentRow {
            id: id.to_string(),
            lat: lat.to_string(),
            long: long.to_string(),
        }
    }

    #[test]
    fn test_classify_rows_keeps_order_and_row_errors() {
        let index = RegionIndex::build(vec![
            square("Poblacion", 7.0, 125.0, 0.01),
            square("Katidtuan", 7.02, 125.0, 0.01),
        ])
        .unwrap();
        let classifier = RegionClassifier::default();
        let rows = vec![
            row("a", "7.025", "125.005"),
            row("b", "abc", "125.0"),
            row("c", "7.005", "125.005"),
            row("d", "95.0", "125.0"),
        ];

        let outputs = classify_rows(&classifier, &index, &rows).unwrap();
        let ids: Vec<&str> = outputs.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c", "d"]);

        assert_eq!(
            outputs[0].result.as_ref().unwrap().matched_names,
            vec!["Katidtuan".to_string()]
        );
        assert!(outputs[1].result.is_none());
        assert!(outputs[1].error.is_some());
        assert_eq!(
            outputs[2].result.as_ref().unwrap().best_match(),
            Some("Poblacion")
        );
        assert!(outputs[3].error.is_some());
    }

    #[test]
    fn test_args_single_point() {
        let args = Args::try_parse_from([
            "locate",
            "--boundaries",
            "b.json",
            "--lat",
            "7.11",
            "--long",
            "-125.03",
            "--bands",
            "100,300",
        ])
        .unwrap();
        assert_eq!(args.long.as_deref(), Some("-125.03"));
        assert_eq!(args.bands, vec![100, 300]);
        assert_eq!(args.axis_order, AxisOrder::LatLong);
    }

    #[test]
    fn test_args_require_input() {
        assert!(Args::try_parse_from(["locate", "--boundaries", "b.json"]).is_err());
        assert!(Args::try_parse_from(["locate", "-b", "b.json", "--lat", "7.1"]).is_err());
        assert!(Args::try_parse_from([
            "locate",
            "-b",
            "b.json",
            "--municipality",
            "Kabacan",
            "-i",
            "x.csv"
        ])
        .is_err());

        let args = Args::try_parse_from([
            "locate",
            "-b",
            "b.json",
            "--axis-order",
            "long-lat",
            "-i",
            "x.csv",
        ])
        .unwrap();
        assert_eq!(args.axis_order, AxisOrder::LongLat);
    }
}
