use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod data;
mod kpi;
mod models;
mod report;

use models::{Dimension, FilterState};

#[derive(Parser)]
#[command(name = "marketing-kpi")]
#[command(about = "Marketing KPI aggregation and segment reporting over transaction datasets", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print KPI totals and the top segments for a dataset
    Summary {
        #[arg(long)]
        data: PathBuf,
        #[arg(long = "filter", value_name = "DIMENSION=VALUE", value_parser = parse_filter)]
        filters: Vec<(Dimension, String)>,
        #[arg(long)]
        dimension: Option<Dimension>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        data: PathBuf,
        #[arg(long = "filter", value_name = "DIMENSION=VALUE", value_parser = parse_filter)]
        filters: Vec<(Dimension, String)>,
        #[arg(long)]
        dimension: Option<Dimension>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// List the filterable values for each dimension
    Dimensions {
        #[arg(long)]
        data: PathBuf,
    },
    /// Write the bundled sample dataset
    Sample {
        #[arg(long, default_value = "sample_transactions.csv")]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Summary {
            data,
            filters,
            dimension,
            limit,
        } => {
            let transactions = data::load_transactions(&data)?;
            let filters = FilterState::from_pairs(filters);
            debug!("active filters: {}", report::describe_filters(&filters));

            let rows = kpi::filter_transactions(&transactions, &filters);
            let summary = kpi::compute_summary(&rows);

            println!(
                "Key indicators over {} of {} transactions:",
                rows.len(),
                transactions.len()
            );
            println!("- Revenue: {:.2}", report::money(summary.revenue));
            println!("- Orders: {}", summary.orders);
            println!("- Leads: {}", summary.leads);
            println!("- Conversion rate: {:.2} %", summary.conversion_rate);
            println!("- Average order value: {:.2}", summary.average_order_value);
            println!("- Revenue per lead: {:.2}", summary.revenue_per_lead);

            if let Some(dimension) = dimension {
                let segments = kpi::group_by_dimension(&rows, Some(dimension));
                println!("Top segments by {dimension}:");

                if segments.is_empty() {
                    println!("No transactions match the active filters.");
                }
                for segment in segments.iter().take(limit) {
                    println!(
                        "- {}: revenue {:.2} ({} orders, {} leads, conversion {:.2} %)",
                        segment.dimension_value,
                        report::money(segment.summary.revenue),
                        segment.summary.orders,
                        segment.summary.leads,
                        segment.summary.conversion_rate
                    );
                }
            }
        }
        Commands::Report {
            data,
            filters,
            dimension,
            out,
        } => {
            let transactions = data::load_transactions(&data)?;
            let filters = FilterState::from_pairs(filters);
            let report = report::build_report(&transactions, &filters, dimension);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write report to {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Dimensions { data } => {
            let transactions = data::load_transactions(&data)?;
            for dimension in Dimension::ALL {
                let values = kpi::dimension_values(&transactions, dimension);
                if values.is_empty() {
                    println!("{dimension}: (none)");
                } else {
                    println!("{dimension}: {}", values.join(", "));
                }
            }
        }
        Commands::Sample { out } => {
            let rows = data::sample_transactions()?;
            data::write_sample(&out)?;
            println!("Wrote {} sample transactions to {}.", rows.len(), out.display());
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn parse_filter(raw: &str) -> Result<(Dimension, String), String> {
    let (dimension, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid filter '{raw}', expected dimension=value"))?;
    let dimension = dimension.trim().parse::<Dimension>()?;

    let value = value.trim();
    if value.is_empty() {
        return Err(format!("invalid filter '{raw}', value must not be empty"));
    }

    Ok((dimension, value.to_string()))
}
