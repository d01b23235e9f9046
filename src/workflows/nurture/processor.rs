use chrono::NaiveDate;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::workflows::leads::store::{ContactRecord, ContactStore, FieldPatch, StoreError};

use super::schedule::{NurtureSequence, SequenceStep};

/// Outbound message transport. The real implementation wraps SMTP or a mail
/// API; tests and the demo service substitute their own.
pub trait MessageSender: Send + Sync {
    fn send(&self, message: &OutboundMessage<'_>) -> Result<(), SendError>;
}

/// Everything the transport needs to render and deliver one nurture message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage<'a> {
    pub recipient: &'a str,
    pub recipient_name: Option<&'a str>,
    pub step: &'a SequenceStep,
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("message transport failed: {0}")]
    Transport(String),
}

/// Result counters for one poll over the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NurtureSummary {
    pub processed: usize,
    pub sent: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Per-record outcome, reported alongside the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOutcome {
    Sent,
    Skipped,
    Error,
}

/// Polls the contact store for records in the nurture-active state and
/// advances each one at most one sequence step per poll.
pub struct NurtureProcessor<S, M> {
    store: S,
    sender: M,
    sequence: NurtureSequence,
    active_state: String,
}

impl<S, M> NurtureProcessor<S, M>
where
    S: ContactStore,
    M: MessageSender,
{
    pub fn new(store: S, sender: M, sequence: NurtureSequence, active_state: &str) -> Self {
        Self {
            store,
            sender,
            sequence,
            active_state: active_state.to_string(),
        }
    }

    /// One poll: fetch candidates, try to advance each, report counters.
    /// Failures stay per-record; the poll itself only fails when the store
    /// read does.
    pub fn process_all(&self, today: NaiveDate) -> Result<NurtureSummary, StoreError> {
        let records = self.store.records_in_state(&self.active_state)?;
        info!(
            candidates = records.len(),
            state = %self.active_state,
            "nurture poll start"
        );

        let mut summary = NurtureSummary::default();
        for record in records {
            summary.processed += 1;
            match self.process_record(&record, today) {
                RecordOutcome::Sent => summary.sent += 1,
                RecordOutcome::Skipped => summary.skipped += 1,
                RecordOutcome::Error => summary.errors += 1,
            }
        }

        info!(
            processed = summary.processed,
            sent = summary.sent,
            skipped = summary.skipped,
            errors = summary.errors,
            "nurture poll complete"
        );
        Ok(summary)
    }

    fn process_record(&self, record: &ContactRecord, today: NaiveDate) -> RecordOutcome {
        // No qualifying event recorded yet: nothing to schedule from.
        let Some(trigger_date) = record.trigger_date else {
            return RecordOutcome::Skipped;
        };

        let Some(due) = self
            .sequence
            .due_step(record.sequence_position, trigger_date, today)
        else {
            return RecordOutcome::Skipped;
        };

        let Some(recipient) = record.email.as_deref().filter(|email| !email.is_empty()) else {
            warn!(record = %record.id.0, "nurture candidate has no email address");
            return RecordOutcome::Error;
        };

        let message = OutboundMessage {
            recipient,
            recipient_name: record.contact_name.as_deref(),
            step: due.step,
        };

        if let Err(err) = self.sender.send(&message) {
            // State untouched: the step stays eligible on the next poll.
            error!(record = %record.id.0, step = due.position, %err, "nurture send failed");
            return RecordOutcome::Error;
        }

        // Position and last-sent date advance in a single patch so the store
        // never observes one without the other.
        let patch = FieldPatch {
            sequence_position: Some(due.position),
            last_sent_date: Some(today),
            ..FieldPatch::default()
        };
        if let Err(err) = self.store.update_fields(&record.id, patch) {
            // The message went out but the store does not know: report an
            // error and leave the step eligible rather than silently losing
            // the sequence position.
            error!(record = %record.id.0, step = due.position, %err, "failed to persist nurture state");
            return RecordOutcome::Error;
        }

        let note = format!(
            "Nurture message {} sent: {} (template {})",
            due.position, due.step.label, due.step.template_id
        );
        if let Err(err) = self.store.add_note(&record.id, &note) {
            warn!(record = %record.id.0, %err, "could not attach nurture note");
        }

        info!(
            record = %record.id.0,
            step = due.position,
            label = %due.step.label,
            elapsed_days = due.elapsed_days,
            "nurture message sent"
        );
        RecordOutcome::Sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::leads::domain::LeadRecord;
    use crate::workflows::leads::store::{InMemoryContactStore, RecordId, RecordUpsert};
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct MemorySender {
        sent: Arc<Mutex<Vec<(String, u32)>>>,
        fail: Arc<Mutex<bool>>,
    }

    impl MemorySender {
        fn sent(&self) -> Vec<(String, u32)> {
            self.sent.lock().expect("sender mutex poisoned").clone()
        }

        fn set_failing(&self, failing: bool) {
            *self.fail.lock().expect("sender mutex poisoned") = failing;
        }
    }

    impl MessageSender for MemorySender {
        fn send(&self, message: &OutboundMessage<'_>) -> Result<(), SendError> {
            if *self.fail.lock().expect("sender mutex poisoned") {
                return Err(SendError::Transport("smtp down".to_string()));
            }
            self.sent
                .lock()
                .expect("sender mutex poisoned")
                .push((message.recipient.to_string(), message.step.template_id));
            Ok(())
        }
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn seeded_store(trigger: Option<NaiveDate>) -> (InMemoryContactStore, RecordId) {
        let store = InMemoryContactStore::new();
        let mut lead = LeadRecord::new("Jansen", "Corporate Recruiter");
        lead.contact.email = Some("j.jansen@jansen.nl".to_string());
        let id = store
            .create_or_update(RecordUpsert::from_lead(&lead, "qualified"))
            .expect("insert");
        if let Some(trigger) = trigger {
            store.set_trigger_date(&id, trigger).expect("set trigger");
        }
        (store, id)
    }

    fn processor(
        store: InMemoryContactStore,
        sender: MemorySender,
    ) -> NurtureProcessor<InMemoryContactStore, MemorySender> {
        NurtureProcessor::new(store, sender, NurtureSequence::standard(), "qualified")
    }

    #[test]
    fn advances_exactly_one_step_per_poll() {
        let trigger = date(2026, 8, 1);
        let (store, id) = seeded_store(Some(trigger));
        let sender = MemorySender::default();
        let processor = processor(store.clone(), sender.clone());

        // 20 days later: thresholds 1, 3, 5, 8, 11 and 14 have all passed,
        // but only step one may fire.
        let summary = processor.process_all(date(2026, 8, 21)).expect("poll");
        assert_eq!(summary.sent, 1);
        let record = store.get(&id).expect("record");
        assert_eq!(record.sequence_position, 1);
        assert_eq!(record.last_sent_date, Some(date(2026, 8, 21)));
        assert_eq!(sender.sent().len(), 1);
        assert_eq!(sender.sent()[0].1, 55);
    }

    #[test]
    fn failed_send_leaves_state_unchanged_and_retries_next_poll() {
        let trigger = date(2026, 8, 1);
        let (store, id) = seeded_store(Some(trigger));
        let sender = MemorySender::default();
        sender.set_failing(true);
        let processor = processor(store.clone(), sender.clone());

        let summary = processor.process_all(date(2026, 8, 5)).expect("poll");
        assert_eq!(summary.errors, 1);
        assert_eq!(store.get(&id).expect("record").sequence_position, 0);

        sender.set_failing(false);
        let summary = processor.process_all(date(2026, 8, 5)).expect("poll");
        assert_eq!(summary.sent, 1);
        assert_eq!(store.get(&id).expect("record").sequence_position, 1);
    }

    #[test]
    fn terminal_records_are_skipped_forever() {
        let trigger = date(2026, 1, 1);
        let (store, id) = seeded_store(Some(trigger));
        store
            .update_fields(
                &id,
                FieldPatch {
                    sequence_position: Some(8),
                    ..FieldPatch::default()
                },
            )
            .expect("patch");
        let sender = MemorySender::default();
        let processor = processor(store.clone(), sender.clone());

        for _ in 0..3 {
            let summary = processor.process_all(date(2026, 8, 1)).expect("poll");
            assert_eq!(summary.skipped, 1);
            assert_eq!(summary.sent, 0);
        }
        assert!(sender.sent().is_empty());
        assert_eq!(store.get(&id).expect("record").sequence_position, 8);
    }

    #[test]
    fn records_without_trigger_date_are_skipped() {
        let (store, id) = seeded_store(None);
        let sender = MemorySender::default();
        let processor = processor(store.clone(), sender.clone());

        let summary = processor.process_all(date(2026, 8, 1)).expect("poll");
        assert_eq!(summary.skipped, 1);
        assert!(sender.sent().is_empty());
        assert_eq!(store.get(&id).expect("record").sequence_position, 0);
    }

    #[test]
    fn missing_email_counts_as_error_not_panic() {
        let store = InMemoryContactStore::new();
        let lead = LeadRecord::new("Zonder Email BV", "Recruiter");
        let id = store
            .create_or_update(RecordUpsert::from_lead(&lead, "qualified"))
            .expect("insert");
        store
            .set_trigger_date(&id, date(2026, 8, 1))
            .expect("trigger");
        let sender = MemorySender::default();
        let processor = processor(store.clone(), sender.clone());

        let summary = processor.process_all(date(2026, 8, 10)).expect("poll");
        assert_eq!(summary.errors, 1);
        assert!(sender.sent().is_empty());
    }

    #[test]
    fn successful_send_attaches_a_note() {
        let (store, id) = seeded_store(Some(date(2026, 8, 1)));
        let sender = MemorySender::default();
        let processor = processor(store.clone(), sender);

        processor.process_all(date(2026, 8, 3)).expect("poll");
        let notes = store.notes_for(&id);
        assert_eq!(notes.len(), 1);
        assert!(notes[0].contains("Check-in"));
    }
}
