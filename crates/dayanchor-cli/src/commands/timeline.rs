//! Energy timeline preview without any tasks or calendar.

use clap::Args;

use dayanchor_core::{AnchorRequest, EngineConfig, EnergyZone, TimelineSummary, TimelineSynthesizer};

#[derive(Args)]
pub struct TimelineArgs {
    /// Peak window text, e.g. "8:00 AM - 10:00 AM"
    #[arg(long)]
    pub peak: Vec<String>,
    /// Maintenance window text
    #[arg(long)]
    pub maintenance: Vec<String>,
    /// Recovery window text
    #[arg(long)]
    pub recovery: Vec<String>,
    /// Wake-up anchor window
    #[arg(long)]
    pub wake: Option<String>,
    /// Wind-down anchor window
    #[arg(long)]
    pub sleep: Option<String>,
    /// Output slots and summary as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: TimelineArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig::load()?;
    let request = AnchorRequest {
        peak_windows: args.peak,
        maintenance_windows: args.maintenance,
        recovery_windows: args.recovery,
        wake_window: args.wake,
        sleep_window: args.sleep,
        ..Default::default()
    };

    let timeline = TimelineSynthesizer::with_config(config.energy).synthesize(&request.energy_windows());
    let summary = TimelineSummary::from_timeline(&timeline);

    if args.json {
        let out = serde_json::json!({
            "timeline": timeline,
            "summary": summary,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print!("{}", timeline.render_ascii_chart());
    println!("\nSummary:");
    println!(
        "  Wake window: {}",
        summary.optimal_wake_window.as_deref().unwrap_or("none")
    );
    println!(
        "  Sleep window: {}",
        summary.optimal_sleep_window.as_deref().unwrap_or("none")
    );
    for zone in EnergyZone::ALL {
        let periods = &summary.zone_periods[&zone];
        println!(
            "  {zone}: {} min ({})",
            summary.zone_total_minutes[&zone],
            if periods.is_empty() { "-".to_string() } else { periods.join(", ") }
        );
    }
    Ok(())
}
