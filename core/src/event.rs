//! Simulation events and the observer seam.
//!
//! RULE: The engine never writes to stdout. Anything that used to be
//! an inline warning is an event handed to the injected `EventSink`,
//! so tests can assert on emitted events without capturing streams.

use crate::types::MonthIndex;
use serde::{Deserialize, Serialize};

/// Every notable occurrence during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    RunInitialized {
        seed: u64,
    },
    DemandSpike {
        month: MonthIndex,
        factor: f64,
    },
    ProductionIssue {
        month: MonthIndex,
        penalty: f64,
    },
    IngredientRestock {
        month: MonthIndex,
        amount: f64,
        boosted: bool,
    },
    ShortageRecorded {
        month: MonthIndex,
        level: u8,
        cumulative: u32,
    },
    BoostScheduled {
        month: MonthIndex,
        start: MonthIndex,
        end: MonthIndex,
    },
}

/// Observer invoked at defined event points during simulation.
pub trait EventSink {
    fn record(&mut self, event: &SimEvent);
}

/// Default sink: routes events to the `log` facade.
#[derive(Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn record(&mut self, event: &SimEvent) {
        match event {
            SimEvent::DemandSpike { month, factor } => {
                log::warn!("month={month} demand spike x{factor:.2}");
            }
            SimEvent::ProductionIssue { month, penalty } => {
                log::warn!("month={month} production issue, output x{penalty:.2}");
            }
            SimEvent::ShortageRecorded {
                month,
                level,
                cumulative,
            } => {
                log::warn!("month={month} shortage level {level} (total {cumulative})");
            }
            other => log::debug!("{other:?}"),
        }
    }
}

/// Collecting sink for tests.
#[derive(Debug, Default)]
pub struct VecSink {
    pub events: Vec<SimEvent>,
}

impl EventSink for VecSink {
    fn record(&mut self, event: &SimEvent) {
        self.events.push(event.clone());
    }
}
