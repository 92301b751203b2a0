//! Run the full anchoring pipeline over a JSON request.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Args;
use tracing::debug;

use dayanchor_core::timeline::format_minute;
use dayanchor_core::{AnchorEngine, AnchorRequest, AnchorResult, EngineConfig};

#[derive(Args)]
pub struct AnchorArgs {
    /// Request file, or "-" for stdin
    #[arg(long, short, default_value = "-")]
    pub input: PathBuf,
    /// Output the full result as JSON
    #[arg(long)]
    pub json: bool,
}

fn read_request(input: &Path) -> Result<AnchorRequest, Box<dyn std::error::Error>> {
    let content = if input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(input)
            .map_err(|e| format!("cannot read {}: {e}", input.display()))?
    };
    Ok(serde_json::from_str(&content)?)
}

pub fn run(args: AnchorArgs) -> Result<(), Box<dyn std::error::Error>> {
    let request = read_request(&args.input)?;
    debug!(fingerprint = %request.fingerprint()?, "anchoring request");

    let engine = AnchorEngine::with_config(EngineConfig::load()?);
    let result = engine.run(&request)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }
    Ok(())
}

fn print_result(result: &AnchorResult) {
    if let Some(date) = result.date {
        println!("Plan for {date}");
    }
    println!(
        "{:<20} {:<13} {:>6} {:<11} {}",
        "TASK", "SLOT", "CONF", "STATUS", "REASON"
    );
    for a in &result.assignments {
        let status = if a.was_rescheduled { "moved" } else { "kept" };
        println!(
            "{:<20} {:<13} {:>6.2} {:<11} {}",
            a.task_id,
            format!(
                "{}-{}",
                format_minute(a.assigned_start_minute),
                format_minute(a.assigned_end_minute)
            ),
            a.confidence_score,
            status,
            a.reasoning
        );
    }

    println!();
    println!(
        "rescheduled: {}  kept: {}  average confidence: {:.2}",
        result.tasks_rescheduled, result.tasks_kept_original, result.average_confidence
    );
    if let Some(wake) = &result.summary.optimal_wake_window {
        println!("wake window: {wake}");
    }
    if let Some(sleep) = &result.summary.optimal_sleep_window {
        println!("sleep window: {sleep}");
    }
}
