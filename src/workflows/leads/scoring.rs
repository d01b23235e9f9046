use serde::Serialize;
use tracing::info;

use super::domain::{LeadRecord, Priority, SchemaPresence, Tier};
use super::keywords::KeywordSets;
use super::matching::{contains_any, is_generic_email, WordMatcher};

/// Tier counts after the first scoring pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierBreakdown {
    pub golden: usize,
    pub silver: usize,
    pub bronze: usize,
    pub interim: usize,
}

/// Before/after counts for the shortlist cut.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ShortlistReport {
    pub before: usize,
    pub after: usize,
}

/// Priority counts after the success-scoring pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityBreakdown {
    pub a: usize,
    pub b: usize,
    pub c: usize,
    pub d: usize,
}

/// Additive, deterministic scoring: the score is a pure function of the
/// record's fields and the keyword sets, with no hidden state.
pub struct ScoringStage {
    preferred_matcher: WordMatcher,
    regions: Vec<String>,
    generic_email_prefixes: Vec<String>,
}

impl ScoringStage {
    pub fn new(keywords: &KeywordSets) -> Self {
        Self {
            preferred_matcher: WordMatcher::compile(&keywords.preferred_sectors),
            regions: keywords.regions.clone(),
            generic_email_prefixes: keywords.generic_email_prefixes.clone(),
        }
    }

    /// First pass: build the additive tier score and assign a tier.
    ///
    /// The two fixed baselines (+1 active opportunity, +1 no internal
    /// recruiter) and the neutral size assumption (+0.5) reflect what the
    /// export cannot tell us; only the preferred-sector bonus varies per row.
    pub fn assign_tiers(
        &self,
        records: Vec<LeadRecord>,
        schema: SchemaPresence,
    ) -> (Vec<LeadRecord>, TierBreakdown) {
        let mut breakdown = TierBreakdown::default();
        let records: Vec<LeadRecord> = records
            .into_iter()
            .map(|mut lead| {
                let mut score = 1.0; // assumed active opportunity
                score += 0.5; // company size unknown, neutral assumption

                if schema.sector {
                    lead.preferred_sector = self
                        .preferred_matcher
                        .matches(lead.sector.as_deref().unwrap_or(""));
                    if lead.preferred_sector {
                        score += 1.0;
                    }
                }

                score += 1.0; // assumed no internal recruiter

                lead.score = score;
                let tier = Tier::from_score(score);
                lead.tier = Some(tier);
                match tier {
                    Tier::Golden => breakdown.golden += 1,
                    Tier::Silver => breakdown.silver += 1,
                    Tier::Bronze => breakdown.bronze += 1,
                    Tier::Interim => breakdown.interim += 1,
                }
                lead
            })
            .collect();

        info!(
            golden = breakdown.golden,
            silver = breakdown.silver,
            bronze = breakdown.bronze,
            interim = breakdown.interim,
            "tier scoring complete"
        );

        (records, breakdown)
    }

    /// Shortlist cut: GOLDEN and SILVER only, ordered by score descending with
    /// the tier label as alphabetical tie-break, truncated to `max_leads`.
    pub fn shortlist(
        &self,
        records: Vec<LeadRecord>,
        max_leads: usize,
    ) -> (Vec<LeadRecord>, ShortlistReport) {
        let before = records.len();
        let mut kept: Vec<LeadRecord> = records
            .into_iter()
            .filter(|lead| matches!(lead.tier, Some(Tier::Golden) | Some(Tier::Silver)))
            .collect();

        kept.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| tier_label(a).cmp(tier_label(b)))
        });
        kept.truncate(max_leads);

        let report = ShortlistReport {
            before,
            after: kept.len(),
        };
        info!(before, after = report.after, "shortlist cut complete");
        (kept, report)
    }

    /// Second, independent pass: the 0-100 success score and A-D priority.
    /// Run once before enrichment to select candidates and once after so a
    /// filled email raises the score.
    pub fn assign_priorities(
        &self,
        records: Vec<LeadRecord>,
        schema: SchemaPresence,
    ) -> (Vec<LeadRecord>, PriorityBreakdown) {
        let mut breakdown = PriorityBreakdown::default();
        let records: Vec<LeadRecord> = records
            .into_iter()
            .map(|mut lead| {
                let score = self.success_score(&lead, schema);
                lead.success_score = Some(score);
                let priority = Priority::from_success_score(score);
                lead.priority = Some(priority);
                match priority {
                    Priority::A => breakdown.a += 1,
                    Priority::B => breakdown.b += 1,
                    Priority::C => breakdown.c += 1,
                    Priority::D => breakdown.d += 1,
                }
                lead
            })
            .collect();

        info!(
            priority_a = breakdown.a,
            priority_b = breakdown.b,
            priority_c = breakdown.c,
            priority_d = breakdown.d,
            "success scoring complete"
        );

        (records, breakdown)
    }

    pub fn success_score(&self, lead: &LeadRecord, schema: SchemaPresence) -> u8 {
        // Unknown tier falls back to the BRONZE base.
        let mut score: i32 = lead.tier.map(Tier::success_base).unwrap_or(30);

        if lead.preferred_sector {
            score += 15;
        }

        if schema.region && contains_any(lead.region.as_deref().unwrap_or(""), &self.regions) {
            score += 10;
        }

        // The +8 "has any email" and +7 "and it is personal" bonuses are
        // deliberately separate contributions; both are observable in the
        // aggregate.
        if lead.contact.has_email() {
            score += 8;
            let email = lead.contact.email.as_deref().unwrap_or("");
            if !is_generic_email(email, &self.generic_email_prefixes) {
                score += 7;
            }
        }

        score.clamp(0, 100) as u8
    }

    /// True when the record already carries an address worth writing to:
    /// non-empty and not a role account.
    pub fn has_usable_email(&self, lead: &LeadRecord) -> bool {
        lead.contact.has_email()
            && !is_generic_email(
                lead.contact.email.as_deref().unwrap_or(""),
                &self.generic_email_prefixes,
            )
    }
}

fn tier_label(lead: &LeadRecord) -> &'static str {
    lead.tier.map(Tier::label).unwrap_or("UNSCORED")
}
