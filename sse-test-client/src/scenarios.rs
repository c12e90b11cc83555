use anyhow::Result;
use colored::*;
use std::time::{Duration, Instant};

use crate::api_client::ApiClient;
use crate::output::{print_event, TestResult};
use crate::sse_client::Connection;

const CONNECTED: &str = "Connected";
const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

fn unique_text(prefix: &str) -> String {
    format!("{} {}", prefix, uuid::Uuid::new_v4())
}

pub async fn test_connection(sse1: &mut Connection, sse2: &mut Connection) -> Result<TestResult> {
    let start = Instant::now();

    println!("\n{}", "=== TEST: Connection ===".bright_cyan().bold());

    for sse in [sse1, sse2] {
        println!(
            "{} Waiting for {} to receive the connected event...",
            "→".blue(),
            sse.label
        );

        match sse.wait_for_chat(CONNECTED, EVENT_TIMEOUT).await {
            Ok(event) => print_event(&sse.label, &event),
            Err(e) => {
                println!("{} {}", "✗".red(), e);
                return Ok(TestResult::fail(
                    "connection",
                    format!("{}: {}", sse.label, e),
                    start.elapsed(),
                ));
            }
        }
    }

    println!("{} Both receivers connected", "✓".green());
    Ok(TestResult::pass("connection", start.elapsed()))
}

pub async fn test_fan_out(
    api_client: &ApiClient,
    sse1: &mut Connection,
    sse2: &mut Connection,
) -> Result<TestResult> {
    let start = Instant::now();

    println!("\n{}", "=== TEST: Fan-out ===".bright_cyan().bold());

    let text = unique_text("fan-out");
    println!("{} Submitting message {:?}...", "→".blue(), text);
    api_client.submit_message(&text).await?;

    for sse in [sse1, sse2] {
        match sse.wait_for_chat(&text, EVENT_TIMEOUT).await {
            Ok(event) => print_event(&sse.label, &event),
            Err(e) => {
                println!("{} {}", "✗".red(), e);
                return Ok(TestResult::fail(
                    "fan_out",
                    format!("{} never received the message: {}", sse.label, e),
                    start.elapsed(),
                ));
            }
        }
    }

    println!("{} Message delivered to every receiver", "✓".green());
    Ok(TestResult::pass("fan_out", start.elapsed()))
}

pub async fn test_multi_line(api_client: &ApiClient, sse: &mut Connection) -> Result<TestResult> {
    let start = Instant::now();

    println!("\n{}", "=== TEST: Multi-line ===".bright_cyan().bold());

    let text = format!("{}\nsecond line\n\nfourth line", unique_text("multi-line"));
    println!("{} Submitting a four line message...", "→".blue());
    api_client.submit_message(&text).await?;

    match sse.wait_for_chat(&text, EVENT_TIMEOUT).await {
        Ok(event) => {
            print_event(&sse.label, &event);
            println!("{} Message arrived as one event, lines intact", "✓".green());
            Ok(TestResult::pass("multi_line", start.elapsed()))
        }
        Err(e) => {
            println!("{} {}", "✗".red(), e);
            Ok(TestResult::fail(
                "multi_line",
                format!("Multi-line message not reassembled: {}", e),
                start.elapsed(),
            ))
        }
    }
}

pub async fn test_late_join(
    api_client: &ApiClient,
    base_url: &str,
    sse: &mut Connection,
) -> Result<TestResult> {
    let start = Instant::now();

    println!("\n{}", "=== TEST: Late join ===".bright_cyan().bold());

    let before = unique_text("before");
    api_client.submit_message(&before).await?;
    sse.wait_for_chat(&before, EVENT_TIMEOUT).await?;
    println!("{} Existing receiver saw the first message", "✓".green());

    println!("{} Opening a new receiver...", "→".blue());
    let mut late = Connection::establish(base_url, "Receiver 3 (late)".to_string()).await?;
    late.wait_for_chat(CONNECTED, EVENT_TIMEOUT).await?;

    let after = unique_text("after");
    api_client.submit_message(&after).await?;

    let events = late.drain(Duration::from_secs(2)).await;
    let saw_before = events.iter().any(|e| e.data == before);
    let saw_after = events.iter().any(|e| e.data == after);

    if saw_after && !saw_before {
        println!(
            "{} Late receiver only saw messages sent after it attached",
            "✓".green()
        );
        Ok(TestResult::pass("late_join", start.elapsed()))
    } else {
        println!("{} Unexpected history on the late receiver", "✗".red());
        Ok(TestResult::fail(
            "late_join",
            format!("saw_before={}, saw_after={}", saw_before, saw_after),
            start.elapsed(),
        ))
    }
}
