use serde::{Deserialize, Serialize};

/// One candidate outreach target, created by ingestion and narrowed through
/// the pipeline phases. Derived fields are append-only: stages fill them in
/// but never clear what an earlier stage wrote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub company_name: String,
    pub role_title: String,
    pub region: Option<String>,
    pub sector: Option<String>,
    pub website: Option<String>,
    pub contact: ContactFields,

    // Derived by the pipeline.
    #[serde(default)]
    pub is_competitor: bool,
    #[serde(default)]
    pub is_excluded_sector: bool,
    #[serde(default)]
    pub is_hr_role: bool,
    #[serde(default)]
    pub preferred_sector: bool,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub tier: Option<Tier>,
    #[serde(default)]
    pub success_score: Option<u8>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub needs_validation: bool,
    #[serde(default)]
    pub validation_reason: Option<String>,
    #[serde(default)]
    pub enrichment_source: Option<String>,
    #[serde(default)]
    pub enrichment_confidence: f32,
}

impl LeadRecord {
    pub fn new(company_name: impl Into<String>, role_title: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            role_title: role_title.into(),
            region: None,
            sector: None,
            website: None,
            contact: ContactFields::default(),
            is_competitor: false,
            is_excluded_sector: false,
            is_hr_role: false,
            preferred_sector: false,
            score: 0.0,
            tier: None,
            success_score: None,
            priority: None,
            needs_validation: false,
            validation_reason: None,
            enrichment_source: None,
            enrichment_confidence: 0.0,
        }
    }

    /// Composite natural key used for dedup and store upserts. First
    /// occurrence wins, so the key is case-folded but otherwise untouched.
    pub fn natural_key(&self) -> LeadKey {
        LeadKey {
            company: self.company_name.trim().to_lowercase(),
            role_title: self.role_title.trim().to_lowercase(),
        }
    }

    pub fn contact_name(&self) -> Option<String> {
        let name = format!(
            "{} {}",
            self.contact.first_name.as_deref().unwrap_or(""),
            self.contact.last_name.as_deref().unwrap_or("")
        );
        let name = name.trim().to_string();
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }
}

/// Dedup/upsert key: lower-cased (company, role title).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeadKey {
    pub company: String,
    pub role_title: String,
}

/// Nullable contact details carried from ingestion and filled by enrichment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactFields {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl ContactFields {
    pub fn has_email(&self) -> bool {
        self.email
            .as_deref()
            .map(|email| !email.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Coarse qualification bucket assigned by the tier scoring pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Golden,
    Silver,
    Bronze,
    Interim,
}

impl Tier {
    pub fn from_score(score: f32) -> Self {
        if score >= 3.5 {
            Tier::Golden
        } else if score >= 2.5 {
            Tier::Silver
        } else if score >= 1.5 {
            Tier::Bronze
        } else {
            Tier::Interim
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Tier::Golden => "GOLDEN",
            Tier::Silver => "SILVER",
            Tier::Bronze => "BRONZE",
            Tier::Interim => "INTERIM",
        }
    }

    /// Base contribution to the post-enrichment success score.
    pub const fn success_base(self) -> i32 {
        match self {
            Tier::Golden => 60,
            Tier::Silver => 45,
            Tier::Bronze => 30,
            Tier::Interim => 15,
        }
    }
}

/// Outreach urgency bucket derived from the success score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    A,
    B,
    C,
    D,
}

impl Priority {
    pub fn from_success_score(score: u8) -> Self {
        if score >= 80 {
            Priority::A
        } else if score >= 60 {
            Priority::B
        } else if score >= 40 {
            Priority::C
        } else {
            Priority::D
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Priority::A => "A - direct approach",
            Priority::B => "B - nurture",
            Priority::C => "C - interim potential",
            Priority::D => "D - exclude",
        }
    }
}

/// Which optional columns the ingested dataset actually carried. Filter and
/// scoring steps keyed on an absent column degrade to no-ops instead of
/// failing the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaPresence {
    pub region: bool,
    pub sector: bool,
    pub email: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries_are_inclusive() {
        assert_eq!(Tier::from_score(3.5), Tier::Golden);
        assert_eq!(Tier::from_score(3.49), Tier::Silver);
        assert_eq!(Tier::from_score(2.5), Tier::Silver);
        assert_eq!(Tier::from_score(1.5), Tier::Bronze);
        assert_eq!(Tier::from_score(1.0), Tier::Interim);
    }

    #[test]
    fn priority_boundaries_are_inclusive() {
        assert_eq!(Priority::from_success_score(80), Priority::A);
        assert_eq!(Priority::from_success_score(79), Priority::B);
        assert_eq!(Priority::from_success_score(60), Priority::B);
        assert_eq!(Priority::from_success_score(40), Priority::C);
        assert_eq!(Priority::from_success_score(39), Priority::D);
    }

    #[test]
    fn natural_key_folds_case_and_whitespace() {
        let mut lead = LeadRecord::new("  Van Dijk Staal  ", "Corporate Recruiter");
        let key = lead.natural_key();
        assert_eq!(key.company, "van dijk staal");
        assert_eq!(key.role_title, "corporate recruiter");

        lead.company_name = "VAN DIJK STAAL".to_string();
        assert_eq!(lead.natural_key().company, key.company);
    }
}
