use regex::Regex;

/// Whole-word keyword matcher: each keyword is compiled once into a
/// `\b<keyword>\b` pattern evaluated against lower-cased text. Substring
/// matching deliberately stays separate (`contains_any`); the two semantics
/// differ per filter step and the difference is observable in the counts.
#[derive(Debug, Clone)]
pub struct WordMatcher {
    patterns: Vec<Regex>,
}

impl WordMatcher {
    pub fn compile(keywords: &[String]) -> Self {
        let patterns = keywords
            .iter()
            .map(|keyword| keyword.trim().to_lowercase())
            .filter(|keyword| !keyword.is_empty())
            .map(|keyword| {
                // Escaped literals always compile.
                Regex::new(&format!(r"\b{}\b", regex::escape(&keyword)))
                    .expect("escaped keyword is a valid pattern")
            })
            .collect();
        Self { patterns }
    }

    pub fn matches(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let lower = text.to_lowercase();
        self.patterns.iter().any(|pattern| pattern.is_match(&lower))
    }
}

/// Case-insensitive containment against any keyword in the list.
pub fn contains_any(text: &str, keywords: &[String]) -> bool {
    if text.is_empty() {
        return false;
    }
    let lower = text.to_lowercase();
    keywords
        .iter()
        .map(|keyword| keyword.trim().to_lowercase())
        .filter(|keyword| !keyword.is_empty())
        .any(|keyword| lower.contains(&keyword))
}

/// An email is generic iff its lower-cased local part starts with one of the
/// role-account prefixes (info, hr, sales and friends). Empty input is not
/// generic; it is simply absent.
pub fn is_generic_email(email: &str, prefixes: &[String]) -> bool {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return false;
    }
    let local = email.split('@').next().unwrap_or("");
    prefixes
        .iter()
        .map(|prefix| prefix.trim().to_lowercase())
        .filter(|prefix| !prefix.is_empty())
        .any(|prefix| local.starts_with(&prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn word_matcher_requires_standalone_tokens() {
        let matcher = WordMatcher::compile(&keywords(&["it", "zorg"]));
        assert!(matcher.matches("IT dienstverlening"));
        assert!(matcher.matches("thuiszorg en zorg"));
        // "it" inside a larger word must not match.
        assert!(!matcher.matches("facilitaire diensten"));
        assert!(!matcher.matches("veiligheid"));
    }

    #[test]
    fn word_matcher_handles_punctuation_in_keywords() {
        let matcher = WordMatcher::compile(&keywords(&["p&o", "oil & gas"]));
        assert!(matcher.matches("Medewerker P&O"));
        assert!(matcher.matches("offshore oil & gas services"));
        assert!(!matcher.matches("politie"));
    }

    #[test]
    fn contains_any_is_plain_substring() {
        let titles = keywords(&["stage", "student"]);
        assert!(contains_any("Afstudeerstage HR", &titles));
        assert!(contains_any("Werkstudent recruitment", &titles));
        assert!(!contains_any("Corporate Recruiter", &titles));
        assert!(!contains_any("", &titles));
    }

    #[test]
    fn generic_email_checks_local_part_prefix() {
        let prefixes = keywords(&["info", "hr", "sales"]);
        assert!(is_generic_email("Info@bedrijf.nl", &prefixes));
        assert!(is_generic_email("hr-team@bedrijf.nl", &prefixes));
        assert!(!is_generic_email("j.devries@bedrijf.nl", &prefixes));
        assert!(!is_generic_email("", &prefixes));
        assert!(!is_generic_email("   ", &prefixes));
    }
}
