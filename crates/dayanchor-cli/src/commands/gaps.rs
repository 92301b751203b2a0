//! Gap detection over busy intervals given on the command line.

use clap::Args;

use dayanchor_core::{CalendarEvent, EngineConfig, GapFinder, RestWindow, TimeInterval};

#[derive(Args)]
pub struct GapsArgs {
    /// Busy interval as HH:MM-HH:MM (repeatable)
    #[arg(long)]
    pub busy: Vec<TimeInterval>,
    /// Minimum gap length in minutes
    #[arg(long)]
    pub min_gap: Option<u16>,
    /// Rest window as HH:MM-HH:MM; may wrap midnight
    #[arg(long)]
    pub rest: Option<RestWindow>,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: GapsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig::load()?;

    let mut finder = GapFinder::from_config(&config.gaps);
    if let Some(min_gap) = args.min_gap {
        finder = finder.with_min_gap(min_gap);
    }
    if let Some(rest) = args.rest {
        finder = finder.with_rest_window(rest);
    }

    let events: Vec<CalendarEvent> = args
        .busy
        .iter()
        .map(|iv| CalendarEvent::new(iv.start_minute as i64, iv.end_minute as i64, ""))
        .collect();
    let gaps = finder.find_gaps_for_events(&events)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&gaps)?);
        return Ok(());
    }

    if gaps.is_empty() {
        println!("no free gaps");
        return Ok(());
    }
    for gap in &gaps {
        println!(
            "{}  {:>4} min  {:?} {:?}",
            gap.interval,
            gap.remaining_minutes,
            gap.gap_kind,
            gap.size_class
        );
    }
    Ok(())
}
