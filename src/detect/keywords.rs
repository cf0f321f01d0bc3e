use crate::domain::Priority;

/// Vocabulary signalling that registration may be opening up. Order is
/// fixed; matched keywords are reported in this order.
pub const CRITICAL_KEYWORDS: &[&str] = &[
    "warteliste",
    "anmeldung",
    "registrierung",
    "bewerbung",
    "antrag",
    "formular",
    "bewerben",
    "jetzt anmelden",
    "freie plätze",
    "< 50 personen",
    "verfügbar",
    "öffnung",
    "geöffnet",
];

/// Vocabulary for relevant but non-urgent updates.
pub const IMPORTANT_KEYWORDS: &[&str] = &[
    "aktualisiert",
    "neu",
    "änderung",
    "information",
    "termin",
    "frist",
    "deadline",
];

#[derive(Debug, Clone)]
pub struct KeywordMatch {
    pub matched: bool,
    pub priority: Priority,
    pub confidence: f64,
    pub description: String,
    pub keywords: Vec<String>,
}

impl KeywordMatch {
    fn none() -> Self {
        Self {
            matched: false,
            priority: Priority::Info,
            confidence: 0.0,
            description: String::new(),
            keywords: Vec::new(),
        }
    }
}

/// Scan normalized HTML for critical/important vocabulary. Matching is
/// case-insensitive substring containment; critical matches always win
/// over important ones. Confidence grows with the match count, capped
/// at 1.0 (critical) and 0.9 (important).
pub fn detect_keywords(normalized_html: &str) -> KeywordMatch {
    let haystack = normalized_html.to_lowercase();

    let matched_critical: Vec<String> = CRITICAL_KEYWORDS
        .iter()
        .filter(|kw| haystack.contains(*kw))
        .map(|kw| kw.to_string())
        .collect();

    if !matched_critical.is_empty() {
        let description = critical_description(&matched_critical);
        let confidence = (0.9 + matched_critical.len() as f64 * 0.02).min(1.0);
        return KeywordMatch {
            matched: true,
            priority: Priority::Critical,
            confidence,
            description: description.to_string(),
            keywords: matched_critical,
        };
    }

    let matched_important: Vec<String> = IMPORTANT_KEYWORDS
        .iter()
        .filter(|kw| haystack.contains(*kw))
        .map(|kw| kw.to_string())
        .collect();

    if !matched_important.is_empty() {
        let description = important_description(&matched_important);
        let confidence = (0.7 + matched_important.len() as f64 * 0.05).min(0.9);
        return KeywordMatch {
            matched: true,
            priority: Priority::Important,
            confidence,
            description: description.to_string(),
            keywords: matched_important,
        };
    }

    KeywordMatch::none()
}

// Most specific message wins; generic fallback otherwise.
fn critical_description(matched: &[String]) -> &'static str {
    if matched.iter().any(|k| k == "warteliste" || k == "anmeldung") {
        "⚠️ Die Warteliste könnte bald öffnen! Neue Informationen zur Anmeldung gefunden."
    } else if matched.iter().any(|k| k == "formular" || k == "antrag") {
        "📝 Anmeldeformular wurde gefunden! Jetzt könnte eine Bewerbung möglich sein."
    } else {
        "🚨 Wichtige Änderung auf der Seite!"
    }
}

fn important_description(matched: &[String]) -> &'static str {
    if matched.iter().any(|k| k == "termin" || k == "öffnung") {
        "📅 Neue Informationen zu Terminen oder Öffnungszeiten."
    } else {
        "ℹ️ Relevante Änderung auf der Seite gefunden."
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_match_on_plain_content() {
        let result = detect_keywords("<p>willkommen auf unserer seite</p>");
        assert!(!result.matched);
        assert_eq!(result.priority, Priority::Info);
        assert_eq!(result.confidence, 0.0);
        assert!(result.keywords.is_empty());
    }

    #[test]
    fn critical_keywords_win_over_important() {
        let result = detect_keywords("<p>Neu: die Warteliste ist geöffnet</p>");
        assert!(result.matched);
        assert_eq!(result.priority, Priority::Critical);
        assert_eq!(
            result.keywords,
            vec!["warteliste".to_string(), "geöffnet".to_string()]
        );
    }

    #[test]
    fn matching_is_case_insensitive() {
        let result = detect_keywords("<p>WARTELISTE</p>");
        assert!(result.matched);
        assert_eq!(result.priority, Priority::Critical);
    }

    #[test]
    fn keyword_order_follows_vocabulary_order() {
        let result = detect_keywords("formular vor antrag vor anmeldung");
        assert_eq!(result.keywords, vec!["anmeldung", "antrag", "formular"]);
    }

    #[test]
    fn critical_confidence_scales_with_match_count() {
        let one = detect_keywords("warteliste");
        assert!((one.confidence - 0.92).abs() < 1e-9);

        let many = detect_keywords(
            "warteliste anmeldung registrierung bewerbung antrag formular bewerben",
        );
        assert_eq!(many.confidence, 1.0);
    }

    #[test]
    fn important_match_without_critical_terms() {
        let result = detect_keywords("<p>die seite wurde aktualisiert, neuer termin</p>");
        assert!(result.matched);
        assert_eq!(result.priority, Priority::Important);
        assert_eq!(
            result.description,
            "📅 Neue Informationen zu Terminen oder Öffnungszeiten."
        );
        // "aktualisiert", "neu" and "termin" all match.
        assert!((result.confidence - 0.85).abs() < 1e-9);
    }

    #[test]
    fn frist_alone_gets_generic_description() {
        let result = detect_keywords("<p>letzte frist beachten</p>");
        assert!(result.matched);
        assert_eq!(result.priority, Priority::Important);
        // Only "termin" and "öffnung" key the schedule message.
        assert_eq!(result.description, "ℹ️ Relevante Änderung auf der Seite gefunden.");
    }

    #[test]
    fn important_confidence_is_capped() {
        let result =
            detect_keywords("aktualisiert neu änderung information termin frist deadline");
        assert_eq!(result.confidence, 0.9);
    }
}
