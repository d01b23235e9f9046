use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::remote::{RateLimiter, Retryable, RetryPolicy};

use super::domain::{LeadRecord, Priority};
use super::keywords::KeywordSets;
use super::matching::is_generic_email;

/// Contact details returned by a provider on a successful match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedContact {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub confidence: f32,
    pub source: String,
}

/// What the waterfall hands each provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentQuery {
    pub company: String,
    pub website: Option<String>,
    pub existing_contact: Option<String>,
}

impl EnrichmentQuery {
    fn for_lead(lead: &LeadRecord) -> Self {
        Self {
            company: lead.company_name.clone(),
            website: lead.website.clone(),
            existing_contact: lead.contact_name(),
        }
    }
}

/// Provider failure taxonomy. Transient failures are retried by the policy;
/// permanent ones abandon the record's enrichment immediately.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("transient provider failure: {0}")]
    Transient(String),
    #[error("permanent provider failure: {0}")]
    Permanent(String),
}

impl Retryable for ProviderError {
    fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Transient(_))
    }
}

/// Explicit interface every enrichment source implements. `Ok(None)` is the
/// no-match signal; errors follow the transient/permanent taxonomy above.
pub trait EnrichmentProvider: Send {
    fn name(&self) -> &str;
    fn enrich(&self, query: &EnrichmentQuery) -> Result<Option<EnrichedContact>, ProviderError>;
}

/// Counters for one enrichment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentReport {
    /// Priority-A records that lacked a usable email.
    pub candidates: usize,
    /// Records a provider resolved to a usable email.
    pub enriched: usize,
    /// Records every provider declined.
    pub unmatched: usize,
    /// Records abandoned after retry exhaustion or a permanent failure.
    pub failed: usize,
}

/// Ordered provider waterfall. Providers for one record are tried strictly in
/// configured order, never concurrently: first usable email wins, and a second
/// in-flight provider would double-spend the rate budget.
pub struct EnrichmentWaterfall {
    providers: Vec<Box<dyn EnrichmentProvider>>,
    limiter: RateLimiter,
    retry: RetryPolicy,
    generic_email_prefixes: Vec<String>,
}

impl EnrichmentWaterfall {
    pub fn new(
        providers: Vec<Box<dyn EnrichmentProvider>>,
        limiter: RateLimiter,
        retry: RetryPolicy,
        keywords: &KeywordSets,
    ) -> Self {
        Self {
            providers,
            limiter,
            retry,
            generic_email_prefixes: keywords.generic_email_prefixes.clone(),
        }
    }

    /// Enrich every priority-A record lacking a usable email, in place.
    /// Records that already carry a personal address are never re-enriched,
    /// and one record's failure never aborts the batch.
    pub fn run(&mut self, records: &mut [LeadRecord]) -> EnrichmentReport {
        let mut report = EnrichmentReport::default();

        for lead in records.iter_mut() {
            if lead.priority != Some(Priority::A) || self.usable_email(lead) {
                continue;
            }
            report.candidates += 1;

            match self.enrich_lead(lead) {
                Outcome::Enriched => report.enriched += 1,
                Outcome::NoMatch => report.unmatched += 1,
                Outcome::Failed => report.failed += 1,
            }
        }

        info!(
            candidates = report.candidates,
            enriched = report.enriched,
            unmatched = report.unmatched,
            failed = report.failed,
            "enrichment waterfall complete"
        );

        report
    }

    fn enrich_lead(&mut self, lead: &mut LeadRecord) -> Outcome {
        let query = EnrichmentQuery::for_lead(lead);

        for provider in &self.providers {
            self.limiter.acquire();

            let result = self
                .retry
                .run(provider.name(), || provider.enrich(&query));

            match result {
                Ok(Some(contact)) if self.usable(&contact.email) => {
                    apply_contact(lead, contact);
                    return Outcome::Enriched;
                }
                Ok(Some(contact)) => {
                    // A generic address is no better than what we have;
                    // fall through to the next provider.
                    warn!(
                        company = %lead.company_name,
                        provider = provider.name(),
                        email = %contact.email,
                        "provider returned a role address, trying next"
                    );
                }
                Ok(None) => {}
                Err(err) => {
                    // Retries are already exhausted (or the failure was
                    // permanent). Keep the record's original contact data
                    // and move on to the next record.
                    warn!(
                        company = %lead.company_name,
                        provider = provider.name(),
                        %err,
                        "enrichment abandoned for record"
                    );
                    return Outcome::Failed;
                }
            }
        }

        Outcome::NoMatch
    }

    fn usable_email(&self, lead: &LeadRecord) -> bool {
        lead.contact.has_email()
            && !is_generic_email(
                lead.contact.email.as_deref().unwrap_or(""),
                &self.generic_email_prefixes,
            )
    }

    fn usable(&self, email: &str) -> bool {
        !email.trim().is_empty() && !is_generic_email(email, &self.generic_email_prefixes)
    }
}

enum Outcome {
    Enriched,
    NoMatch,
    Failed,
}

fn apply_contact(lead: &mut LeadRecord, contact: EnrichedContact) {
    lead.contact.email = Some(contact.email);
    if contact.first_name.is_some() {
        lead.contact.first_name = contact.first_name;
    }
    if contact.last_name.is_some() {
        lead.contact.last_name = contact.last_name;
    }
    if contact.phone.is_some() {
        lead.contact.phone = contact.phone;
    }
    lead.enrichment_confidence = contact.confidence;
    lead.enrichment_source = Some(contact.source);
}
