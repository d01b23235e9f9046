//! Time-driven nurture sequencing: a fixed message cadence advanced one step
//! per poll against the contact store.

pub mod processor;
pub mod schedule;

pub use processor::{
    MessageSender, NurtureProcessor, NurtureSummary, OutboundMessage, RecordOutcome, SendError,
};
pub use schedule::{DueStep, NurtureSequence, SequenceStep};
