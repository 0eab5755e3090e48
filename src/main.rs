use clap::Parser;
use anyhow::{Context, Result};
use log::info;

use ls_router::config::ScenarioConfig;
use ls_router::simulation::{Network, ScenarioReport, TraceResult};

#[derive(Parser)]
#[command(name = "lsrouter", about = "Runs a link-state routing scenario")]
struct Cli {
    /// Scenario file (JSON)
    #[arg(long, required_unless_present = "dump_config")]
    scenario: Option<String>,

    /// Print the report as JSON instead of tables
    #[arg(long)]
    json: bool,

    /// Print an example scenario and exit
    #[arg(long)]
    dump_config: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    if cli.dump_config {
        println!("{}", serde_json::to_string_pretty(&ScenarioConfig::example())?);
        return Ok(());
    }

    let path = cli.scenario.context("--scenario is required")?;
    let config = ScenarioConfig::load(&path)?;
    info!(
        "Running scenario {}: {} routers, {} links, {} events over {} ms",
        path,
        config.routers.len(),
        config.links.len(),
        config.events.len(),
        config.duration_ms
    );

    let report = Network::run_scenario(&config)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &ScenarioReport) {
    println!(
        "t={} ms, {} packets delivered, {} lost in flight",
        report.time_ms, report.stats.delivered, report.stats.lost_in_flight
    );

    for (router, table) in &report.tables {
        println!("\n{} ({} routes)", router, table.len());
        for (destination, entry) in table.iter() {
            println!("  {:<12} port {:<4} metric {}", destination, entry.port, entry.metric);
        }
    }

    if !report.traces.is_empty() {
        println!();
    }
    for trace in &report.traces {
        let status = match trace.result {
            TraceResult::Delivered => "delivered",
            TraceResult::Unreachable => "unreachable",
            TraceResult::SendFailed => "send failed",
            TraceResult::Looped => "loop",
            TraceResult::HopLimit => "hop limit",
        };
        println!("trace {} -> {}: {} [{}]", trace.from, trace.to, trace.path.join(" -> "), status);
    }
}
