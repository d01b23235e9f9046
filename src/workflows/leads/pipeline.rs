use serde::Serialize;
use tracing::info;

use super::domain::{LeadRecord, Priority};
#[cfg(test)]
use super::domain::SchemaPresence;
use super::enrichment::{EnrichmentReport, EnrichmentWaterfall};
use super::filter::{FilterReport, FilterStage};
use super::ingest::LeadDataset;
use super::keywords::KeywordSets;
use super::scoring::{PriorityBreakdown, ScoringStage, ShortlistReport, TierBreakdown};
use super::store::{ContactStore, RecordUpsert, StoreError};

/// The fixed phase order of a qualification run. Later phases assume earlier
/// ones have fully completed; the pipeline never interleaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Filter,
    Score,
    Shortlist,
    Validate,
    Prioritize,
    Enrich,
    Export,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Phase::Filter,
        Phase::Score,
        Phase::Shortlist,
        Phase::Validate,
        Phase::Prioritize,
        Phase::Enrich,
        Phase::Export,
    ];

    pub fn number(self) -> u8 {
        match self {
            Phase::Filter => 1,
            Phase::Score => 2,
            Phase::Shortlist => 3,
            Phase::Validate => 4,
            Phase::Prioritize => 5,
            Phase::Enrich => 6,
            Phase::Export => 7,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        Phase::ALL.into_iter().find(|phase| phase.number() == number)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Phase::Filter => "clean & filter",
            Phase::Score => "tier scoring",
            Phase::Shortlist => "shortlist cut",
            Phase::Validate => "sector validation",
            Phase::Prioritize => "success scoring",
            Phase::Enrich => "contact enrichment",
            Phase::Export => "contact store export",
        }
    }
}

/// Caller-tunable knobs for one run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Resume from this phase; earlier phases pass records through untouched.
    pub start_phase: Phase,
    /// Shortlist cap applied in phase 3.
    pub max_shortlist: usize,
    /// Interactive confirmation flag. Accepted for CLI parity and ignored.
    pub confirm: bool,
    /// State written to the contact store for exported leads.
    pub export_state: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            start_phase: Phase::Filter,
            max_shortlist: 500,
            confirm: false,
            export_state: "lead".to_string(),
        }
    }
}

/// Counters from the sector-validation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub flagged_unknown_sector: usize,
    pub flagged_possible_intermediary: usize,
}

/// Per-phase statistics for one run. Phases skipped via `start_phase` stay
/// `None`; an executed phase always reports, even when it eliminated nothing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineSummary {
    pub initial: usize,
    pub survivors: usize,
    pub filter: Option<FilterReport>,
    pub tiers: Option<TierBreakdown>,
    pub shortlist: Option<ShortlistReport>,
    pub validation: Option<ValidationReport>,
    pub priorities: Option<PriorityBreakdown>,
    pub enrichment: Option<EnrichmentReport>,
    pub final_priorities: Option<PriorityBreakdown>,
    pub exported: Option<usize>,
}

/// Final survivor set plus the audit statistics.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub records: Vec<LeadRecord>,
    pub summary: PipelineSummary,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("contact store write failed: {0}")]
    Store(#[from] StoreError),
}

/// Orchestrates the qualification phases over an ingested dataset.
pub struct LeadPipeline {
    filter: FilterStage,
    scoring: ScoringStage,
}

impl LeadPipeline {
    pub fn new(keywords: &KeywordSets) -> Self {
        Self {
            filter: FilterStage::new(keywords),
            scoring: ScoringStage::new(keywords),
        }
    }

    /// Run every phase from `options.start_phase` onward. Always produces a
    /// complete summary for the executed phases; a single record's enrichment
    /// failure is counted, never raised.
    pub fn run(
        &self,
        dataset: LeadDataset,
        options: &PipelineOptions,
        mut waterfall: Option<&mut EnrichmentWaterfall>,
        store: &dyn ContactStore,
    ) -> Result<PipelineOutcome, PipelineError> {
        let LeadDataset {
            mut records,
            schema,
        } = dataset;
        let mut summary = PipelineSummary {
            initial: records.len(),
            ..PipelineSummary::default()
        };

        for phase in Phase::ALL {
            if phase < options.start_phase {
                info!(phase = phase.number(), label = phase.label(), "phase skipped");
                continue;
            }
            info!(phase = phase.number(), label = phase.label(), "phase start");

            match phase {
                Phase::Filter => {
                    let (survivors, report) = self.filter.run(records, schema);
                    records = survivors;
                    summary.filter = Some(report);
                }
                Phase::Score => {
                    let (scored, breakdown) = self.scoring.assign_tiers(records, schema);
                    records = scored;
                    summary.tiers = Some(breakdown);
                }
                Phase::Shortlist => {
                    let (kept, report) = self.scoring.shortlist(records, options.max_shortlist);
                    records = kept;
                    summary.shortlist = Some(report);
                }
                Phase::Validate => {
                    summary.validation = Some(validate_sectors(&mut records));
                }
                Phase::Prioritize => {
                    let (prioritized, breakdown) =
                        self.scoring.assign_priorities(records, schema);
                    records = prioritized;
                    summary.priorities = Some(breakdown);
                }
                Phase::Enrich => {
                    let report = match waterfall {
                        Some(ref mut waterfall) => waterfall.run(&mut records),
                        None => EnrichmentReport::default(),
                    };
                    summary.enrichment = Some(report);

                    // Enrichment may have filled a previously empty address;
                    // recompute the success scores and priorities.
                    let (reprioritized, breakdown) =
                        self.scoring.assign_priorities(records, schema);
                    records = reprioritized;
                    summary.final_priorities = Some(breakdown);
                }
                Phase::Export => {
                    summary.exported = Some(self.export(&records, options, store)?);
                }
            }
        }

        summary.survivors = records.len();
        Ok(PipelineOutcome { records, summary })
    }

    /// Write the outreach-ready set (priority A with a usable email) to the
    /// contact store, best score first.
    fn export(
        &self,
        records: &[LeadRecord],
        options: &PipelineOptions,
        store: &dyn ContactStore,
    ) -> Result<usize, PipelineError> {
        let mut outreach_ready: Vec<&LeadRecord> = records
            .iter()
            .filter(|lead| {
                lead.priority == Some(Priority::A) && self.scoring.has_usable_email(lead)
            })
            .collect();
        outreach_ready.sort_by(|a, b| {
            b.success_score
                .unwrap_or(0)
                .cmp(&a.success_score.unwrap_or(0))
        });

        for lead in &outreach_ready {
            store.create_or_update(RecordUpsert::from_lead(lead, &options.export_state))?;
        }

        info!(exported = outreach_ready.len(), "export complete");
        Ok(outreach_ready.len())
    }
}

/// Flags records whose sector claim deserves a manual check: unknown sectors,
/// and company names that smell like a staffing outfit despite surviving the
/// competitor filter.
fn validate_sectors(records: &mut [LeadRecord]) -> ValidationReport {
    let mut report = ValidationReport::default();

    for lead in records.iter_mut() {
        let sector = lead
            .sector
            .as_deref()
            .unwrap_or("")
            .trim()
            .to_lowercase();
        if sector.is_empty() || sector == "onbekend" || sector == "unknown" {
            lead.needs_validation = true;
            lead.validation_reason = Some("sector unknown".to_string());
            report.flagged_unknown_sector += 1;
            continue;
        }

        let company = lead.company_name.to_lowercase();
        if company.contains("techniek") || company.contains("technical") || company.contains("tech ")
        {
            lead.needs_validation = true;
            lead.validation_reason = Some("possible intermediary".to_string());
            report.flagged_possible_intermediary += 1;
        }
    }

    info!(
        unknown_sector = report.flagged_unknown_sector,
        possible_intermediary = report.flagged_possible_intermediary,
        "sector validation complete"
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::leads::store::InMemoryContactStore;

    fn dataset(records: Vec<LeadRecord>) -> LeadDataset {
        LeadDataset {
            records,
            schema: SchemaPresence {
                region: true,
                sector: true,
                email: true,
            },
        }
    }

    fn recruiter_lead(company: &str, email: Option<&str>) -> LeadRecord {
        let mut lead = LeadRecord::new(company, "Corporate Recruiter");
        lead.region = Some("Gelderland".to_string());
        lead.sector = Some("Machinebouw".to_string());
        lead.contact.email = email.map(str::to_string);
        lead
    }

    #[test]
    fn phases_execute_in_order_and_narrow_monotonically() {
        let store = InMemoryContactStore::new();
        let pipeline = LeadPipeline::new(&KeywordSets::dutch_defaults());
        let rows = vec![
            recruiter_lead("A", Some("j.devries@a.nl")),
            recruiter_lead("A", None),
            recruiter_lead("B", None),
        ];

        let outcome = pipeline
            .run(dataset(rows), &PipelineOptions::default(), None, &store)
            .expect("run completes");

        let summary = outcome.summary;
        assert_eq!(summary.initial, 3);
        let filter = summary.filter.expect("filter ran");
        assert_eq!(filter.removed_duplicates, 1);
        assert!(filter.survivors() <= summary.initial);
        assert!(summary.survivors <= filter.survivors());
        assert!(summary.tiers.is_some());
        assert!(summary.shortlist.is_some());
        assert!(summary.priorities.is_some());
        assert!(summary.final_priorities.is_some());
    }

    #[test]
    fn export_writes_only_priority_a_with_usable_email() {
        let store = InMemoryContactStore::new();
        let pipeline = LeadPipeline::new(&KeywordSets::dutch_defaults());
        let rows = vec![
            recruiter_lead("Met Email", Some("j.devries@a.nl")),
            recruiter_lead("Zonder Email", None),
            recruiter_lead("Generiek", Some("info@b.nl")),
        ];

        let outcome = pipeline
            .run(dataset(rows), &PipelineOptions::default(), None, &store)
            .expect("run completes");

        assert_eq!(outcome.summary.exported, Some(1));
        assert_eq!(store.len(), 1);
        let exported = store.records_in_state("lead").expect("query");
        assert_eq!(exported[0].company, "Met Email");
    }

    #[test]
    fn resume_skips_earlier_phases() {
        let store = InMemoryContactStore::new();
        let pipeline = LeadPipeline::new(&KeywordSets::dutch_defaults());
        // A duplicate that phase 1 would remove survives when resuming at
        // phase 5.
        let rows = vec![
            recruiter_lead("A", Some("j@a.nl")),
            recruiter_lead("A", Some("j@a.nl")),
        ];
        let options = PipelineOptions {
            start_phase: Phase::Prioritize,
            ..PipelineOptions::default()
        };

        let outcome = pipeline
            .run(dataset(rows), &options, None, &store)
            .expect("run completes");

        assert!(outcome.summary.filter.is_none());
        assert!(outcome.summary.tiers.is_none());
        assert!(outcome.summary.shortlist.is_none());
        assert_eq!(outcome.summary.survivors, 2);
        assert!(outcome.summary.priorities.is_some());
    }

    #[test]
    fn validation_flags_unknown_sectors_and_tech_names() {
        let mut records = vec![
            recruiter_lead("Gewoon BV", None),
            recruiter_lead("Onbekend BV", None),
            recruiter_lead("Snel Techniek Detachering", None),
        ];
        records[1].sector = Some("onbekend".to_string());

        let report = validate_sectors(&mut records);
        assert_eq!(report.flagged_unknown_sector, 1);
        assert_eq!(report.flagged_possible_intermediary, 1);
        assert!(!records[0].needs_validation);
        assert!(records[1].needs_validation);
        assert_eq!(
            records[2].validation_reason.as_deref(),
            Some("possible intermediary")
        );
    }

    #[test]
    fn phase_numbers_round_trip() {
        for phase in Phase::ALL {
            assert_eq!(Phase::from_number(phase.number()), Some(phase));
        }
        assert_eq!(Phase::from_number(0), None);
        assert_eq!(Phase::from_number(8), None);
    }
}
