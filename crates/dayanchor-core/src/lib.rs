//! # DayAnchor Core Library
//!
//! This library turns sparse time-window hints ("peak energy 8-10am and
//! 2-4pm") plus one day's calendar into a minute-accurate plan. It is the
//! engine behind the `dayanchor` CLI and any service that embeds it.
//!
//! ## Architecture
//!
//! Data flows strictly one way:
//!
//! - **Parser**: window strings to minute-of-day intervals
//! - **Synthesizer**: intervals to a 96-slot energy timeline
//! - **Summary**: wake/sleep windows and zone periods of a timeline
//! - **Gap Finder**: calendar events to free-capacity gaps
//! - **Coordinator**: tasks, timeline and gaps to slot assignments
//!
//! Every step is a pure, synchronous computation. Nothing is cached and no
//! state survives a call, so concurrent runs for different users need no
//! coordination.
//!
//! ## Key Components
//!
//! - [`AnchorEngine`]: the full pipeline behind one call
//! - [`TimelineSynthesizer`]: energy curve construction
//! - [`GapFinder`]: calendar gap detection
//! - [`AnchoringCoordinator`]: greedy task placement
//! - [`EngineConfig`]: every tunable constant, loaded from TOML

pub mod anchor;
pub mod energy;
pub mod error;
pub mod scheduler;
pub mod storage;
pub mod timeline;

pub use anchor::{anchor, AnchorEngine, AnchorRequest, AnchorResult};
pub use energy::{
    parse_time_windows, parse_window_list, synthesize_timeline, EnergyBlock, EnergySlot,
    EnergyTimeline, EnergyWindows, EnergyZone, TimelineSummary, TimelineSynthesizer,
};
pub use error::{ConfigError, CoreError, ValidationError};
pub use scheduler::{AnchorOutcome, AnchoringCoordinator, CandidateTask, SlotAssignment};
pub use storage::{EnergyConfig, EngineConfig, GapConfig, ScoringConfig};
pub use timeline::{
    detect_gaps, AvailableSlot, CalendarEvent, GapFinder, GapKind, GapSize, RestWindow,
    TimeInterval,
};
