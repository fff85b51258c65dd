use crate::{BookingDetails, PlannerConfig, TripPlanner};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{value_parser, Arg, ArgMatches, Command};
use std::time::Duration;
use tracing::{error, info};

/// CLI entry point for the trip-planner tool
pub async fn run() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let matches = Command::new("trip-planner")
        .version("0.1.0")
        .about("Plan trips from web search results and an LLM completion API")
        .subcommand_required(true)
        .arg(
            Arg::new("model")
                .short('m')
                .long("model")
                .value_name("MODEL")
                .global(true)
                .help("Completion model (or set TRIP_PLANNER_MODEL)"),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECONDS")
                .global(true)
                .value_parser(value_parser!(u64))
                .help("Per-request timeout in seconds (or set REQUEST_TIMEOUT_SECS)"),
        )
        .subcommand(
            Command::new("plan")
                .about("Generate a full trip plan for a destination")
                .arg(Arg::new("destination").required(true).index(1)),
        )
        .subcommand(
            Command::new("adjust")
                .about("Generate a plan, then re-plan its itinerary for a number of days")
                .arg(Arg::new("destination").required(true).index(1))
                .arg(
                    Arg::new("days")
                        .required(true)
                        .index(2)
                        .value_parser(value_parser!(u32)),
                ),
        )
        .subcommand(
            Command::new("book")
                .about("Submit a mock booking")
                .arg(Arg::new("destination").required(true).index(1))
                .arg(
                    Arg::new("start-date")
                        .long("start-date")
                        .value_name("YYYY-MM-DD")
                        .required(true),
                )
                .arg(
                    Arg::new("days")
                        .long("days")
                        .required(true)
                        .value_parser(value_parser!(u32)),
                )
                .arg(
                    Arg::new("travelers")
                        .long("travelers")
                        .default_value("1")
                        .value_parser(value_parser!(u32)),
                ),
        )
        .get_matches();

    let planner = TripPlanner::new(build_config(&matches)?);
    info!(
        "Using model {} (worst-case completion latency {:?})",
        planner.config().model,
        planner.config().worst_case_latency()
    );

    let output = match matches.subcommand() {
        Some(("plan", sub)) => {
            let destination = required(sub, "destination")?;
            serde_json::to_string_pretty(&planner.plan_trip(destination).await)?
        }
        Some(("adjust", sub)) => {
            let destination = required(sub, "destination")?;
            let days = *sub.get_one::<u32>("days").context("missing days")?;
            serde_json::to_string_pretty(&planner.adjust_trip_duration(destination, days).await)?
        }
        Some(("book", sub)) => {
            let start_date = required(sub, "start-date")?;
            let details = BookingDetails {
                destination: required(sub, "destination")?.to_string(),
                start_date: NaiveDate::parse_from_str(start_date, "%Y-%m-%d")
                    .with_context(|| format!("invalid start date `{start_date}`"))?,
                duration_days: *sub.get_one::<u32>("days").context("missing days")?,
                travelers: *sub.get_one::<u32>("travelers").context("missing travelers")?,
            };
            serde_json::to_string_pretty(&planner.book_trip(&details).await)?
        }
        _ => {
            error!("Unknown subcommand");
            anyhow::bail!("unknown subcommand");
        }
    };

    println!("{output}");
    Ok(())
}

fn build_config(matches: &ArgMatches) -> Result<PlannerConfig> {
    let mut config = PlannerConfig::from_env().context("failed to read configuration")?;

    if let Some(model) = matches.get_one::<String>("model") {
        config = config.with_model(model.as_str());
    }
    if let Some(seconds) = matches.get_one::<u64>("timeout") {
        config = config.with_timeout(Duration::from_secs(*seconds));
    }

    Ok(config)
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("missing argument `{name}`"))
}
