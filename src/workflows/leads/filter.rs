use std::collections::HashSet;

use serde::Serialize;
use tracing::info;

use super::domain::{LeadKey, LeadRecord, SchemaPresence};
use super::keywords::KeywordSets;
use super::matching::{contains_any, WordMatcher};

/// Per-step elimination counters for the clean-and-filter phase. The survivor
/// count always equals `initial` minus the sum of the step counters; steps
/// skipped because a column is absent contribute zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterReport {
    pub initial: usize,
    pub removed_duplicates: usize,
    pub removed_intermediary: usize,
    pub removed_wrong_region: usize,
    pub removed_excluded_sector: usize,
    pub removed_excluded_title: usize,
    pub removed_non_recruiter: usize,
}

impl FilterReport {
    pub fn survivors(&self) -> usize {
        self.initial
            - self.removed_duplicates
            - self.removed_intermediary
            - self.removed_wrong_region
            - self.removed_excluded_sector
            - self.removed_excluded_title
            - self.removed_non_recruiter
    }
}

/// Deterministic predicate-based row elimination. Step order is part of the
/// contract: each step operates on the survivors of the previous one, so the
/// counters depend on it.
pub struct FilterStage {
    competitor_matcher: WordMatcher,
    excluded_sector_matcher: WordMatcher,
    hr_role_matcher: WordMatcher,
    excluded_titles: Vec<String>,
    regions: Vec<String>,
}

impl FilterStage {
    pub fn new(keywords: &KeywordSets) -> Self {
        Self {
            competitor_matcher: WordMatcher::compile(&keywords.competitors),
            excluded_sector_matcher: WordMatcher::compile(&keywords.excluded_sectors),
            hr_role_matcher: WordMatcher::compile(&keywords.hr_roles),
            excluded_titles: keywords.excluded_titles.clone(),
            regions: keywords.regions.clone(),
        }
    }

    /// Run all six steps, consuming the input set and returning survivors
    /// plus the audit counters. Dropped records never re-enter the pipeline.
    pub fn run(
        &self,
        records: Vec<LeadRecord>,
        schema: SchemaPresence,
    ) -> (Vec<LeadRecord>, FilterReport) {
        let mut report = FilterReport {
            initial: records.len(),
            ..FilterReport::default()
        };

        // Step 1: dedup on (company, role title), first occurrence wins.
        let mut seen: HashSet<LeadKey> = HashSet::new();
        let before = records.len();
        let records: Vec<LeadRecord> = records
            .into_iter()
            .filter(|lead| seen.insert(lead.natural_key()))
            .collect();
        report.removed_duplicates = before - records.len();

        // Step 2: drop staffing/secondment firms on company + sector text.
        let before = records.len();
        let records: Vec<LeadRecord> = records
            .into_iter()
            .map(|mut lead| {
                let text = format!(
                    "{} {}",
                    lead.company_name,
                    lead.sector.as_deref().unwrap_or("")
                );
                lead.is_competitor = self.competitor_matcher.matches(&text);
                lead
            })
            .filter(|lead| !lead.is_competitor)
            .collect();
        report.removed_intermediary = before - records.len();

        // Step 3: region allow-list, substring semantics. No-op without the
        // region column.
        let records: Vec<LeadRecord> = if schema.region {
            let before = records.len();
            let kept: Vec<LeadRecord> = records
                .into_iter()
                .filter(|lead| contains_any(lead.region.as_deref().unwrap_or(""), &self.regions))
                .collect();
            report.removed_wrong_region = before - kept.len();
            kept
        } else {
            records
        };

        // Step 4: excluded sectors, whole-word semantics. No-op without the
        // sector column.
        let records: Vec<LeadRecord> = if schema.sector {
            let before = records.len();
            let kept: Vec<LeadRecord> = records
                .into_iter()
                .map(|mut lead| {
                    lead.is_excluded_sector = self
                        .excluded_sector_matcher
                        .matches(lead.sector.as_deref().unwrap_or(""));
                    lead
                })
                .filter(|lead| !lead.is_excluded_sector)
                .collect();
            report.removed_excluded_sector = before - kept.len();
            kept
        } else {
            records
        };

        // Step 5: excluded titles (intern/student/marketer), substring
        // semantics by design.
        let before = records.len();
        let records: Vec<LeadRecord> = records
            .into_iter()
            .filter(|lead| !contains_any(&lead.role_title, &self.excluded_titles))
            .collect();
        report.removed_excluded_title = before - records.len();

        // Step 6: keep only genuine HR/recruiter titles, whole-word semantics.
        let before = records.len();
        let records: Vec<LeadRecord> = records
            .into_iter()
            .map(|mut lead| {
                lead.is_hr_role = self.hr_role_matcher.matches(&lead.role_title);
                lead
            })
            .filter(|lead| lead.is_hr_role)
            .collect();
        report.removed_non_recruiter = before - records.len();

        info!(
            initial = report.initial,
            survivors = report.survivors(),
            duplicates = report.removed_duplicates,
            intermediaries = report.removed_intermediary,
            wrong_region = report.removed_wrong_region,
            excluded_sector = report.removed_excluded_sector,
            excluded_title = report.removed_excluded_title,
            non_recruiter = report.removed_non_recruiter,
            "filter stage complete"
        );

        (records, report)
    }
}
