#![allow(clippy::missing_docs_in_private_items)]
#![allow(clippy::arithmetic_side_effects)]
#![allow(clippy::indexing_slicing)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

//! Probe-length report for `OpenTable`.
//!
//! Runs two experiments over synthetic postal records:
//! - lookup cost against occupancy (10% to 99% of a table without growth) for both
//!   probe modes
//! - insertion overhead of filling tables of two initial sizes with growth at 85%
//!
//! Results are printed and the average probe lengths are plotted to a PNG file.

use std::{
    error::Error,
    hint::black_box,
    path::{Path, PathBuf},
    time::Instant,
};

use clap::Parser;
use openhash::{
    OpenTable, PostalRecord, ProbeMode, TableConfig, TableExtensions, from_records, postal_key,
};
use plotters::prelude::*;
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use tracing::info;
use tracing_subscriber::EnvFilter;

const OCCUPANCY: [f64; 10] = [0.10, 0.20, 0.30, 0.40, 0.50, 0.60, 0.70, 0.80, 0.90, 0.99];
const MODES: [(ProbeMode, &str); 2] =
    [(ProbeMode::Linear, "Linear probing"), (ProbeMode::DoubleHash, "Double hashing")];
const GROWTH_THRESHOLD: f64 = 0.85;
const GROWTH_START_SMALL: usize = 1000;
const KEY_SPACE: usize = 100_000;
const STATES: [&str; 6] = ["SP", "RJ", "MG", "BA", "RS", "AC"];
const CITIES: [&str; 6] = ["Campinas", "Niteroi", "Uberlandia", "Salvador", "Pelotas", "Xapuri"];

#[derive(Parser, Debug)]
#[command(name = "probe_report", about = "Measure probe lengths of linear and double hashing")]
struct Args {
    /// Number of synthetic postal records (each with a distinct key)
    #[arg(long, default_value_t = 50_000)]
    records: usize,
    /// Bucket count of the occupancy experiment
    #[arg(long, default_value_t = 6100)]
    buckets: usize,
    /// Lookups timed per occupancy level
    #[arg(long, default_value_t = 1_000_000)]
    searches: usize,
    /// Seed of the record generator
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Plot destination
    #[arg(long, default_value = "probe_lengths.png")]
    output: PathBuf,
}

/// Lookup statistics for one mode at one occupancy level.
#[derive(Debug, Clone, Copy)]
struct Sample {
    occupancy: f64,
    hit_probes: f64,
    miss_probes: f64,
    worst_probes: usize,
    millis: f64,
}

fn generate_records(count: usize, seed: u64) -> Vec<PostalRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut prefixes: Vec<usize> = (0..KEY_SPACE).collect();
    prefixes.shuffle(&mut rng);
    prefixes
        .into_iter()
        .take(count.min(KEY_SPACE))
        .map(|prefix| {
            let suffix = rng.random_range(0..1000);
            let place = rng.random_range(0..STATES.len());
            PostalRecord::new(format!("{prefix:05}-{suffix:03}"), CITIES[place], STATES[place])
        })
        .collect()
}

fn occupancy_experiment(
    records: &[PostalRecord],
    buckets: usize,
    searches: usize,
    mode: ProbeMode,
) -> Result<Vec<Sample>, Box<dyn Error>> {
    let absent: Vec<String> = (0..1000).map(|i| format!("x{i:04}")).collect();
    let mut samples = Vec::with_capacity(OCCUPANCY.len());

    for occupancy in OCCUPANCY {
        let count = ((buckets as f64 * occupancy) as usize).min(records.len());
        if count == 0 {
            continue;
        }
        let table = from_records(
            TableConfig::new(buckets).with_mode(mode).fixed(),
            postal_key,
            records[..count].iter().cloned(),
        )?;
        let keys: Vec<&str> = records[..count].iter().map(PostalRecord::key).collect();

        let start = Instant::now();
        for i in 0..searches {
            black_box(table.search(keys[i % count]));
        }
        let millis = start.elapsed().as_secs_f64() * 1e3;

        let sample = Sample {
            occupancy,
            hit_probes: table.average_probe_length(keys.iter()),
            miss_probes: table.average_probe_length(absent.iter()),
            worst_probes: keys.iter().map(|key| table.probe_length(key)).max().unwrap_or(0),
            millis,
        };
        println!(
            "  {:>3.0}%: hit = {:.2}, miss = {:.2}, worst = {}, {} lookups in {:.1} ms",
            occupancy * 100.0,
            sample.hit_probes,
            sample.miss_probes,
            sample.worst_probes,
            searches,
            sample.millis
        );
        samples.push(sample);
        table.destroy();
    }

    Ok(samples)
}

fn growth_experiment(
    records: &[PostalRecord],
    initial_buckets: usize,
    mode: ProbeMode,
) -> Result<(), Box<dyn Error>> {
    let copies = records.to_vec();
    let config =
        TableConfig::new(initial_buckets).with_mode(mode).with_max_load_factor(GROWTH_THRESHOLD);

    let start = Instant::now();
    let mut table = OpenTable::new(config, postal_key)?;
    let inserted = table.try_extend(copies)?;
    let millis = start.elapsed().as_secs_f64() * 1e3;

    println!(
        "  {initial_buckets:>5} initial buckets: {inserted} records, final capacity {}, load {:.2}, {millis:.1} ms",
        table.capacity(),
        table.load_factor()
    );
    table.destroy();
    Ok(())
}

fn plot(path: &Path, results: &[(&str, Vec<Sample>)]) -> Result<(), Box<dyn Error>> {
    let font_family = "sans-serif";
    let colors = [RGBColor(220, 50, 50), RGBColor(50, 90, 220)];

    let root = BitMapBackend::new(path, (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_probes = results
        .iter()
        .flat_map(|(_, samples)| samples.iter())
        .fold(1.0, |max, s| if s.hit_probes > max { s.hit_probes } else { max }) *
        1.1;

    let mut chart = ChartBuilder::on(&root)
        .caption("Average Probes per Successful Lookup", (font_family, 35))
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..100.0, 0.0..max_probes)?;

    chart
        .configure_mesh()
        .x_desc("Occupancy (%)")
        .y_desc("Average probes")
        .axis_desc_style((font_family, 16))
        .draw()?;

    for (index, (label, samples)) in results.iter().enumerate() {
        let color = colors[index % colors.len()];
        let style = ShapeStyle::from(&color).stroke_width(2);
        chart
            .draw_series(LineSeries::new(
                samples.iter().map(|s| (s.occupancy * 100.0, s.hit_probes)),
                style,
            ))?
            .label(*label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
        chart.draw_series(
            samples.iter().map(|s| Circle::new((s.occupancy * 100.0, s.hit_probes), 4, color.filled())),
        )?;
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .position(SeriesLabelPosition::UpperLeft)
        .draw()?;

    root.present()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let records = generate_records(args.records, args.seed);
    info!(records = records.len(), seed = args.seed, "generated postal records");

    let mut results = Vec::with_capacity(MODES.len());
    for (mode, label) in MODES {
        println!("Lookup cost against occupancy, {label} ({} buckets):", args.buckets);
        results.push((label, occupancy_experiment(&records, args.buckets, args.searches, mode)?));
    }

    for (mode, label) in MODES {
        println!("Insertion overhead with growth at {GROWTH_THRESHOLD}, {label}:");
        for initial in [args.buckets, GROWTH_START_SMALL] {
            growth_experiment(&records, initial, mode)?;
        }
    }

    plot(&args.output, &results)?;
    info!(path = %args.output.display(), "plot written");
    Ok(())
}
