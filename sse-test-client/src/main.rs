use anyhow::Result;
use clap::Parser;
use colored::*;

mod api_client;
mod output;
mod scenarios;
mod sse_client;

use api_client::ApiClient;
use output::print_test_summary;
use sse_client::Connection;

#[derive(Parser)]
#[command(name = "sse-test-client")]
#[command(about = "Live scenario runner for the chat relay")]
struct Cli {
    /// Base URL of the relay (e.g., http://localhost:8080)
    #[arg(long, default_value = "http://localhost:8080")]
    base_url: String,

    /// Test scenario to run
    #[arg(long, value_enum, default_value = "all")]
    scenario: ScenarioChoice,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

#[derive(clap::ValueEnum, Clone)]
enum ScenarioChoice {
    /// Both receivers get the connected acknowledgment
    ConnectionTest,
    /// One submitted message reaches every receiver
    FanOut,
    /// A multi-line message arrives as one event with its lines intact
    MultiLine,
    /// A receiver attached later sees no earlier messages
    LateJoin,
    /// Run every scenario
    All,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    }

    println!("{}", "=== SETUP PHASE ===".bright_white().bold());

    let api_client = ApiClient::new(reqwest::Client::new(), cli.base_url.clone());

    // Establish SSE connections
    println!("{} Establishing SSE connections...", "→".blue());
    let mut sse1 = Connection::establish(&cli.base_url, "Receiver 1".to_string()).await?;
    let mut sse2 = Connection::establish(&cli.base_url, "Receiver 2".to_string()).await?;

    println!("{} Receiver 1 SSE connection established", "✓".green());
    println!("{} Receiver 2 SSE connection established", "✓".green());

    // Run test scenarios
    println!("\n{}", "=== TEST PHASE ===".bright_white().bold());

    let mut results = Vec::new();

    // Every scenario relies on both receivers being attached first.
    results.push(scenarios::test_connection(&mut sse1, &mut sse2).await?);

    match cli.scenario {
        ScenarioChoice::ConnectionTest => {}
        ScenarioChoice::FanOut => {
            results.push(scenarios::test_fan_out(&api_client, &mut sse1, &mut sse2).await?);
        }
        ScenarioChoice::MultiLine => {
            results.push(scenarios::test_multi_line(&api_client, &mut sse2).await?);
        }
        ScenarioChoice::LateJoin => {
            results.push(scenarios::test_late_join(&api_client, &cli.base_url, &mut sse1).await?);
        }
        ScenarioChoice::All => {
            results.push(scenarios::test_fan_out(&api_client, &mut sse1, &mut sse2).await?);
            results.push(scenarios::test_multi_line(&api_client, &mut sse2).await?);
            results.push(scenarios::test_late_join(&api_client, &cli.base_url, &mut sse1).await?);
        }
    }

    // Print summary
    println!("\n{}", "=== RESULTS ===".bright_white().bold());
    print_test_summary(&results);

    let all_passed = results.iter().all(|r| r.passed);

    if all_passed {
        println!("\n{}", "All tests passed! ✓".bright_green().bold());
    } else {
        println!("\n{}", "Some tests failed! ✗".bright_red().bold());
    }

    std::process::exit(if all_passed { 0 } else { 1 });
}
