use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One message in the nurture cadence. `day_offset` counts from the record's
/// trigger date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceStep {
    pub day_offset: i64,
    pub template_id: u32,
    pub label: String,
}

/// A fixed, ordered message sequence. Positions are 1-based in the stored
/// bookkeeping: position 0 means not started, position `len` is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NurtureSequence {
    steps: Vec<SequenceStep>,
}

/// A step that is due now: the stored position to advance to plus the step
/// content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueStep<'a> {
    pub position: u8,
    pub step: &'a SequenceStep,
    pub elapsed_days: i64,
}

impl NurtureSequence {
    pub fn new(steps: Vec<SequenceStep>) -> Self {
        Self { steps }
    }

    /// The production eight-email cadence.
    pub fn standard() -> Self {
        let steps = [
            (1, 55, "Check-in"),
            (3, 56, "Is het gelukt"),
            (5, 57, "Resultaten"),
            (8, 58, "Tip Functietitel"),
            (11, 59, "Tip Salaris"),
            (14, 60, "Tip Opening"),
            (21, 61, "Gesprek Aanbod"),
            (30, 62, "Final Check-in"),
        ]
        .into_iter()
        .map(|(day_offset, template_id, label)| SequenceStep {
            day_offset,
            template_id,
            label: label.to_string(),
        })
        .collect();
        Self::new(steps)
    }

    pub fn len(&self) -> u8 {
        self.steps.len() as u8
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn is_terminal(&self, position: u8) -> bool {
        position >= self.len()
    }

    /// Determine the single step due for a record, if any. Only the next
    /// sequential step is ever considered, even when several day thresholds
    /// have passed since the last poll. Consistency problems (position past
    /// the end, a trigger date in the future) log a warning and yield `None`.
    pub fn due_step(
        &self,
        position: u8,
        trigger_date: NaiveDate,
        today: NaiveDate,
    ) -> Option<DueStep<'_>> {
        if position > self.len() {
            warn!(
                position,
                sequence_len = self.len(),
                "sequence position beyond sequence length, treating as complete"
            );
            return None;
        }
        if self.is_terminal(position) {
            return None;
        }

        let elapsed_days = (today - trigger_date).num_days();
        if elapsed_days < 0 {
            warn!(
                %trigger_date,
                %today,
                "trigger date lies in the future, no step eligible"
            );
            return None;
        }

        let next = position as usize; // position is 1-based, steps are 0-based
        let step = &self.steps[next];
        if elapsed_days >= step.day_offset {
            Some(DueStep {
                position: position + 1,
                step,
                elapsed_days,
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    #[test]
    fn standard_sequence_has_eight_ascending_steps() {
        let sequence = NurtureSequence::standard();
        assert_eq!(sequence.len(), 8);
        let offsets: Vec<i64> = (0..8)
            .map(|position| {
                sequence
                    .due_step(position, date(2020, 1, 1), date(2021, 1, 1))
                    .expect("all steps long overdue")
                    .step
                    .day_offset
            })
            .collect();
        assert_eq!(offsets, vec![1, 3, 5, 8, 11, 14, 21, 30]);
    }

    #[test]
    fn only_the_next_step_fires_even_when_many_are_overdue() {
        let sequence = NurtureSequence::standard();
        let trigger = date(2026, 8, 1);
        let today = date(2026, 8, 21); // 20 days later, thresholds 1/3/5/8 all passed

        let due = sequence.due_step(0, trigger, today).expect("step one due");
        assert_eq!(due.position, 1);
        assert_eq!(due.step.template_id, 55);
        assert_eq!(due.elapsed_days, 20);
    }

    #[test]
    fn step_is_not_due_before_its_day_offset() {
        let sequence = NurtureSequence::standard();
        let trigger = date(2026, 8, 1);
        // Position 1 -> next step is day 3; two days elapsed is too early.
        assert!(sequence.due_step(1, trigger, date(2026, 8, 3)).is_none());
        assert!(sequence.due_step(1, trigger, date(2026, 8, 4)).is_some());
    }

    #[test]
    fn terminal_position_never_yields_a_step() {
        let sequence = NurtureSequence::standard();
        let trigger = date(2020, 1, 1);
        assert!(sequence.due_step(8, trigger, date(2026, 1, 1)).is_none());
        assert!(sequence.is_terminal(8));
    }

    #[test]
    fn inconsistent_state_degrades_to_no_step() {
        let sequence = NurtureSequence::standard();
        // Position beyond the sequence length.
        assert!(sequence.due_step(12, date(2020, 1, 1), date(2026, 1, 1)).is_none());
        // Trigger date in the future.
        assert!(sequence.due_step(0, date(2030, 1, 1), date(2026, 1, 1)).is_none());
    }
}
