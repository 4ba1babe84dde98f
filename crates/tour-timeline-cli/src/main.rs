//! `tour-plan` CLI — inspect tour version ranges and delivery dates from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Which version governs which part of March?
//! tour-plan ranges -i plan.json --tour 1 --from 2026-03-01 --to 2026-03-31
//!
//! # Delivery dates as JSON (plan read from stdin)
//! cat plan.json | tour-plan dates --tour 1 --from 2026-03-01 --to 2026-03-31 --format json
//!
//! # Stops of a tour version, in sequence
//! tour-plan lines -i plan.json --tour-version 10
//!
//! # Active tours of a client
//! tour-plan tours -i plan.json --client 0
//!
//! # Resolver decisions on stderr
//! tour-plan -v ranges -i plan.json --tour 1 --from 2026-03-01 --to 2026-03-31
//! ```

use std::io::{self, Read};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tour_timeline::{
    delivery_days, retrieve_tour_version_ranges, CalendarConfig, Frequency, InMemoryTourRepository,
    OnNonBusinessDay, PlanningDocument, TimelineResolver, TourRepository, TourVersionRange,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "tour-plan",
    version,
    about = "Tour version timeline and delivery date inspector"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log resolver decisions to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which tour version is effective in each part of the interval
    Ranges {
        #[command(flatten)]
        query: RangeQuery,
    },
    /// List the delivery dates within the interval
    Dates {
        #[command(flatten)]
        query: RangeQuery,
    },
    /// List the lines (stops) of a tour version
    Lines {
        /// Planning document (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Tour version id
        #[arg(long)]
        tour_version: u32,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// List the active tours of a client
    Tours {
        /// Planning document (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        #[arg(long, default_value_t = 0)]
        client: u32,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

#[derive(clap::Args)]
struct RangeQuery {
    /// Planning document (reads from stdin if omitted)
    #[arg(short, long)]
    input: Option<String>,
    /// Tour id
    #[arg(long)]
    tour: u32,
    /// First day of the interval (YYYY-MM-DD)
    #[arg(long)]
    from: NaiveDate,
    /// Last day of the interval (YYYY-MM-DD)
    #[arg(long)]
    to: NaiveDate,
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// JSON view of a [`TourVersionRange`].
#[derive(Serialize)]
struct RangeView {
    tour_version_id: u32,
    valid_from: NaiveDate,
    valid_to: NaiveDate,
    frequency: Option<Frequency>,
    on_non_business_day: Option<OnNonBusinessDay>,
}

impl RangeView {
    fn of(range: &TourVersionRange) -> Self {
        Self {
            tour_version_id: range.version().id,
            valid_from: range.valid_from(),
            valid_to: range.valid_to(),
            frequency: range.generator().map(|g| *g.frequency()),
            on_non_business_day: range.generator().map(|g| g.shifter().policy()),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Ranges { query } => {
            let ranges = resolve_query(&query)?;
            match query.format {
                Format::Json => {
                    let views: Vec<RangeView> = ranges.iter().map(RangeView::of).collect();
                    println!("{}", serde_json::to_string_pretty(&views)?);
                }
                Format::Text => {
                    for range in &ranges {
                        println!(
                            "{}\t{}\t{}\t{}",
                            range.version().id,
                            range.valid_from(),
                            range.valid_to(),
                            describe(range)
                        );
                    }
                }
            }
        }
        Commands::Dates { query } => {
            let ranges = resolve_query(&query)?;
            let days = delivery_days(&ranges);
            match query.format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&days)?),
                Format::Text => {
                    for day in &days {
                        println!("{}\t{}", day.date, day.tour_version_id);
                    }
                }
            }
        }
        Commands::Lines {
            input,
            tour_version,
            format,
        } => {
            let (_, repository) = load(input.as_deref())?;
            let version = repository.tour_version(tour_version)?.clone();
            let lines = repository.retrieve_tour_version_lines(&version)?;
            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&lines)?),
                Format::Text => {
                    for line in &lines {
                        println!(
                            "{}\t{}\t{}\t{}",
                            line.seq_no, line.id, line.bpartner_id, line.bpartner_location_id
                        );
                    }
                }
            }
        }
        Commands::Tours {
            input,
            client,
            format,
        } => {
            let (_, repository) = load(input.as_deref())?;
            let tours = repository.retrieve_all_tours(client)?;
            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&tours)?),
                Format::Text => {
                    for tour in &tours {
                        println!("{}\t{}", tour.id, tour.name);
                    }
                }
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn resolve_query(query: &RangeQuery) -> Result<Vec<TourVersionRange>> {
    let (calendar, repository) = load(query.input.as_deref())?;
    let resolver = TimelineResolver::new(Arc::new(calendar.build()));
    let tour = repository.tour(query.tour)?.clone();

    debug!(tour = tour.id, from = %query.from, to = %query.to, "resolving tour version ranges");
    retrieve_tour_version_ranges(&repository, &resolver, &tour, query.from, query.to)
        .with_context(|| format!("Failed to resolve ranges for tour {}", tour.id))
}

fn load(path: Option<&str>) -> Result<(CalendarConfig, InMemoryTourRepository)> {
    let json = read_input(path)?;
    let document = PlanningDocument::from_json(&json).context("Failed to parse planning document")?;
    Ok(document.into_parts())
}

fn describe(range: &TourVersionRange) -> String {
    let Some(generator) = range.generator() else {
        return "no deliveries".to_string();
    };

    let rule = match generator.frequency() {
        Frequency::Weekly {
            every_nth_week,
            only_days,
        } => {
            let on = if only_days.is_empty() {
                "every day".to_string()
            } else {
                only_days
                    .iter()
                    .map(|d| d.to_string())
                    .collect::<Vec<_>>()
                    .join(",")
            };
            format!("every {} week(s) on {}", every_nth_week, on)
        }
        Frequency::Monthly {
            every_nth_month,
            month_day,
        } => format!("every {} month(s) on day {}", every_nth_month, month_day),
    };

    let policy = match generator.shifter().policy() {
        OnNonBusinessDay::Cancel => "cancel",
        OnNonBusinessDay::MoveToNextBusinessDay => "move",
    };
    format!("{}; {} on non-business days", rule, policy)
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}
