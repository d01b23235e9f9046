use serde::{Deserialize, Serialize};

/// Keyword sets driving the filter and scoring stages. These are configuration
/// data, not code: callers may load their own lists, and the matching logic is
/// testable independently of the Dutch defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordSets {
    /// Staffing/secondment firms we never approach (whole-word match on
    /// company name + sector text).
    pub competitors: Vec<String>,
    /// Sectors outside the ideal customer profile (whole-word match).
    pub excluded_sectors: Vec<String>,
    /// Job-title fragments that disqualify a vacancy (substring match).
    pub excluded_titles: Vec<String>,
    /// HR/recruiter role markers a title must carry (whole-word match).
    pub hr_roles: Vec<String>,
    /// Sectors that earn the preferred-sector score bonus (whole-word match).
    pub preferred_sectors: Vec<String>,
    /// Region allow-list (substring match on the region field).
    pub regions: Vec<String>,
    /// Local-part prefixes marking a role account rather than a person.
    pub generic_email_prefixes: Vec<String>,
}

impl KeywordSets {
    /// The production lists for the Dutch market, as shipped with the
    /// original automation.
    pub fn dutch_defaults() -> Self {
        Self {
            competitors: to_strings(&[
                "uitzendbureau",
                "staffing",
                "detachering",
                "secondment",
                "werving en selectie bureau",
                "recruitment bureau",
                "executive search",
                "headhunting",
                "interim bureau",
                "payroll",
                "hr diensten",
                "hr services",
                "talentbureau",
                "arbeidsmarkt",
                "flexwerk",
                "uitzenden",
                "detacheren",
                "professionals leveren",
            ]),
            excluded_sectors: to_strings(&[
                "it",
                "ict",
                "software",
                "technology",
                "tech",
                "finance",
                "bank",
                "insurance",
                "verzekering",
                "zorg",
                "healthcare",
                "medisch",
                "gezondheid",
                "consultancy",
                "consulting",
                "advies",
                "retail",
                "detailhandel",
                "winkel",
                "overheid",
                "gemeente",
                "government",
                "onderwijs",
                "education",
                "school",
            ]),
            excluded_titles: to_strings(&[
                "stage",
                "meewerkstage",
                "afstudeerstage",
                "werkstudent",
                "student",
                "marketeer",
                "recruitment marketeer",
                "campus recruiter",
                "medewerker p&o",
                "medewerker hr",
                "hr medewerker",
                "staf recruiter",
                "accountmanager",
            ]),
            hr_roles: to_strings(&[
                "recruiter",
                "recruitment",
                "talent acquisition",
                "talent",
                "hr",
                "human resources",
                "personeelszaken",
                "p&o",
                "hrm",
                "hr manager",
                "hr advisor",
                "hr adviseur",
                "hr business partner",
                "hrbp",
                "people",
                "people manager",
                "werving",
                "selectie",
                "werving en selectie",
                "werving & selectie",
                "technical recruiter",
                "it recruiter",
                "recruitment consultant",
                "recruitment specialist",
                "talent scout",
                "recruitment officer",
                "corporate recruiter",
                "recruitment manager",
                "recruitment coordinator",
                "talent partner",
            ]),
            preferred_sectors: to_strings(&[
                "oil & gas",
                "olie",
                "gas",
                "constructie",
                "bouw",
                "construction",
                "productie",
                "manufacturing",
                "production",
                "automation",
                "automatisering",
                "industrieel",
                "renewable energy",
                "energie",
                "energy",
                "duurzaam",
                "metaal",
                "staal",
                "metal",
                "machinebouw",
                "installatie",
                "techniek",
                "installation",
                "offshore",
                "maritiem",
                "procesindustrie",
                "chemie",
                "engineering",
                "ingenieur",
                "hightech",
                "semiconductors",
                "semiconductor",
            ]),
            regions: to_strings(&[
                "gelderland",
                "overijssel",
                "noord-brabant",
                "limburg",
                "utrecht",
                "flevoland",
            ]),
            generic_email_prefixes: to_strings(&[
                "info",
                "hr",
                "recruitment",
                "recruiter",
                "vacature",
                "vacatures",
                "jobs",
                "career",
                "careers",
                "werk",
                "werken",
                "solliciteer",
                "contact",
                "hello",
                "hallo",
                "algemeen",
                "office",
                "admin",
                "receptie",
                "frontdesk",
                "support",
                "helpdesk",
            ]),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}
