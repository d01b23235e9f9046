use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{LeadKey, LeadRecord};

/// Identifier handed out by the contact store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub String);

/// Upsert payload for a qualified lead. The store keys on the natural
/// (company, role title) pair with last-write-wins semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordUpsert {
    pub key: LeadKey,
    pub company: String,
    pub role_title: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub state: String,
    pub success_score: Option<u8>,
    pub enrichment_source: Option<String>,
}

impl RecordUpsert {
    pub fn from_lead(lead: &LeadRecord, state: &str) -> Self {
        Self {
            key: lead.natural_key(),
            company: lead.company_name.clone(),
            role_title: lead.role_title.clone(),
            contact_name: lead.contact_name(),
            email: lead.contact.email.clone(),
            phone: lead.contact.phone.clone(),
            state: state.to_string(),
            success_score: lead.success_score,
            enrichment_source: lead.enrichment_source.clone(),
        }
    }
}

/// A record as read back from the store, including the nurture bookkeeping
/// fields the scheduler operates on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub id: RecordId,
    pub company: String,
    pub role_title: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub state: String,
    /// Date of the qualifying event; nurture never fires without it.
    pub trigger_date: Option<NaiveDate>,
    /// Last nurture step sent, 0 = sequence not started.
    pub sequence_position: u8,
    pub last_sent_date: Option<NaiveDate>,
}

/// Partial update applied with `update_fields`. Absent members leave the
/// stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldPatch {
    pub state: Option<String>,
    pub trigger_date: Option<NaiveDate>,
    pub sequence_position: Option<u8>,
    pub last_sent_date: Option<NaiveDate>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("contact store unavailable: {0}")]
    Unavailable(String),
}

/// The external CRM, reduced to the keyed-store surface the pipeline and the
/// nurture processor need. Writes per record are assumed atomic upserts.
pub trait ContactStore: Send + Sync {
    fn create_or_update(&self, upsert: RecordUpsert) -> Result<RecordId, StoreError>;
    fn add_note(&self, id: &RecordId, text: &str) -> Result<(), StoreError>;
    fn records_in_state(&self, state: &str) -> Result<Vec<ContactRecord>, StoreError>;
    fn update_fields(&self, id: &RecordId, patch: FieldPatch) -> Result<(), StoreError>;
}

/// Mutex-guarded map implementation backing the CLI, the demo service, and
/// the test suites.
#[derive(Default, Clone)]
pub struct InMemoryContactStore {
    inner: Arc<Mutex<StoreInner>>,
}

#[derive(Default)]
struct StoreInner {
    records: HashMap<RecordId, ContactRecord>,
    notes: HashMap<RecordId, Vec<String>>,
    by_key: HashMap<LeadKey, RecordId>,
    next_id: u64,
}

impl InMemoryContactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notes_for(&self, id: &RecordId) -> Vec<String> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        inner.notes.get(id).cloned().unwrap_or_default()
    }

    pub fn get(&self, id: &RecordId) -> Option<ContactRecord> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        inner.records.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.lock().expect("store mutex poisoned");
        inner.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Test/demo helper: stamp the qualifying event date on a record.
    pub fn set_trigger_date(&self, id: &RecordId, date: NaiveDate) -> Result<(), StoreError> {
        self.update_fields(
            id,
            FieldPatch {
                trigger_date: Some(date),
                ..FieldPatch::default()
            },
        )
    }
}

impl ContactStore for InMemoryContactStore {
    fn create_or_update(&self, upsert: RecordUpsert) -> Result<RecordId, StoreError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");

        let id = match inner.by_key.get(&upsert.key) {
            Some(existing) => existing.clone(),
            None => {
                inner.next_id += 1;
                let id = RecordId(format!("rec-{:06}", inner.next_id));
                inner.by_key.insert(upsert.key.clone(), id.clone());
                id
            }
        };

        let existing = inner.records.get(&id);
        let record = ContactRecord {
            id: id.clone(),
            company: upsert.company,
            role_title: upsert.role_title,
            contact_name: upsert.contact_name,
            email: upsert.email,
            state: upsert.state,
            trigger_date: existing.and_then(|record| record.trigger_date),
            sequence_position: existing.map(|record| record.sequence_position).unwrap_or(0),
            last_sent_date: existing.and_then(|record| record.last_sent_date),
        };
        inner.records.insert(id.clone(), record);
        Ok(id)
    }

    fn add_note(&self, id: &RecordId, text: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        if !inner.records.contains_key(id) {
            return Err(StoreError::NotFound);
        }
        inner
            .notes
            .entry(id.clone())
            .or_default()
            .push(text.to_string());
        Ok(())
    }

    fn records_in_state(&self, state: &str) -> Result<Vec<ContactRecord>, StoreError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        let mut records: Vec<ContactRecord> = inner
            .records
            .values()
            .filter(|record| record.state == state)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(records)
    }

    fn update_fields(&self, id: &RecordId, patch: FieldPatch) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let record = inner.records.get_mut(id).ok_or(StoreError::NotFound)?;
        if let Some(state) = patch.state {
            record.state = state;
        }
        if let Some(trigger_date) = patch.trigger_date {
            record.trigger_date = Some(trigger_date);
        }
        if let Some(position) = patch.sequence_position {
            record.sequence_position = position;
        }
        if let Some(last_sent) = patch.last_sent_date {
            record.last_sent_date = Some(last_sent);
        }
        Ok(())
    }
}
