use crate::{
    detect::{detect_forms, detect_keywords, generate_diff},
    domain::{ChangeType, Classification, Priority, Snapshot},
};

const INITIAL_CHECK_DESCRIPTION: &str = "Initial check - no previous data";
const NO_CHANGE_DESCRIPTION: &str = "No significant changes detected";
const CONTENT_CHANGE_DESCRIPTION: &str =
    "📝 Die Seite wurde aktualisiert. Schau dir die Änderungen im Diff an.";

/// Decide whether a meaningful change occurred between two snapshots
/// and how urgent it is. Pure and synchronous; safe to run concurrently
/// for different targets.
///
/// Escalation order once the hashes differ: new form > new keywords >
/// generic content change. Form and keyword escalation fire on novelty
/// only; a condition present in both snapshots never re-alerts.
pub fn classify(
    previous: Option<&Snapshot>,
    current_html: &str,
    current: &Snapshot,
) -> Classification {
    // First observation of a target establishes the baseline and must
    // never alert, whatever the page contains.
    let Some(previous) = previous else {
        return Classification {
            has_changed: false,
            change_type: ChangeType::None,
            priority: Priority::Info,
            confidence: 1.0,
            description: INITIAL_CHECK_DESCRIPTION.to_string(),
            diff: None,
            matched_keywords: None,
        };
    };

    // Hash equality short-circuits everything; no detector runs.
    if previous.hash == current.hash {
        return Classification::unchanged(0.0, NO_CHANGE_DESCRIPTION);
    }

    let current_forms = detect_forms(current_html);
    if current_forms.detected {
        let previous_forms = detect_forms(&previous.original_html);
        if !previous_forms.detected {
            tracing::warn!(
                target: "detect",
                form_type = ?current_forms.form_type,
                confidence = current_forms.confidence,
                "new form detected"
            );
            return Classification {
                has_changed: true,
                change_type: ChangeType::Form,
                priority: Priority::Critical,
                confidence: current_forms.confidence,
                description: current_forms.description().to_string(),
                diff: Some(generate_diff(&previous.original_html, current_html)),
                matched_keywords: None,
            };
        }
    }

    let current_keywords = detect_keywords(&current.normalized_html);
    if current_keywords.matched {
        let previous_keywords = detect_keywords(&previous.normalized_html);
        // Set difference: only terms absent from the previous snapshot
        // count. Order stays cosmetic (vocabulary order).
        let new_keywords: Vec<String> = current_keywords
            .keywords
            .iter()
            .filter(|kw| !previous_keywords.keywords.contains(kw))
            .cloned()
            .collect();

        if !new_keywords.is_empty() {
            tracing::warn!(
                target: "detect",
                keywords = ?new_keywords,
                priority = current_keywords.priority.as_str(),
                "new keywords detected"
            );
            return Classification {
                has_changed: true,
                change_type: ChangeType::Keyword,
                priority: current_keywords.priority,
                confidence: current_keywords.confidence,
                description: current_keywords.description,
                diff: Some(generate_diff(&previous.original_html, current_html)),
                matched_keywords: Some(new_keywords),
            };
        }
    }

    // Hash moved but nothing novel escalated: cosmetic or unrelated
    // text change, informational only.
    Classification {
        has_changed: true,
        change_type: ChangeType::Content,
        priority: Priority::Info,
        confidence: 1.0,
        description: CONTENT_CHANGE_DESCRIPTION.to_string(),
        diff: Some(generate_diff(&previous.original_html, current_html)),
        matched_keywords: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(html: &str) -> Snapshot {
        Snapshot::capture(html)
    }

    #[test]
    fn first_check_never_alerts() {
        let html = "<form><input><input type=\"submit\"></form> warteliste";
        let current = snapshot(html);
        let result = classify(None, html, &current);
        assert!(!result.has_changed);
        assert_eq!(result.change_type, ChangeType::None);
        assert_eq!(result.priority, Priority::Info);
        assert_eq!(result.confidence, 1.0);
        assert!(result.diff.is_none());
        assert!(result.matched_keywords.is_none());
    }

    #[test]
    fn equal_hashes_short_circuit() {
        // Whitespace-only difference normalizes away, so the hashes match
        // even though the raw documents differ.
        let previous = snapshot("<p>inhalt</p>");
        let current_html = "<p>inhalt</p>\n\n   ";
        let current = snapshot(current_html);
        assert_ne!(previous.original_html, current.original_html);
        let result = classify(Some(&previous), current_html, &current);
        assert!(!result.has_changed);
        assert_eq!(result.change_type, ChangeType::None);
        assert_eq!(result.confidence, 0.0);
        assert!(result.diff.is_none());
    }

    #[test]
    fn new_form_escalates_to_critical() {
        let previous = snapshot("<p>noch kein formularbereich online</p>");
        let current_html = "<p>jetzt</p><form><input type=\"text\" name=\"vorname\">\
                            <input type=\"submit\"></form>";
        let current = snapshot(current_html);
        let result = classify(Some(&previous), current_html, &current);
        assert!(result.has_changed);
        assert_eq!(result.change_type, ChangeType::Form);
        assert_eq!(result.priority, Priority::Critical);
        assert!(result.diff.is_some());
    }

    #[test]
    fn persistent_form_never_fires_form_change() {
        let form = "<form><input type=\"text\"><input type=\"submit\"></form>";
        let previous_html = format!("{form}<p>alter text</p>");
        let current_html = format!("{form}<p>ganz anderer text</p>");
        let previous = snapshot(&previous_html);
        let current = snapshot(&current_html);
        let result = classify(Some(&previous), &current_html, &current);
        assert!(result.has_changed);
        // Falls through to the content check, never FORM.
        assert_eq!(result.change_type, ChangeType::Content);
        assert_eq!(result.priority, Priority::Info);
    }

    #[test]
    fn keyword_novelty_reports_only_new_terms() {
        let previous = snapshot("<p>der antrag liegt aus</p>");
        let current_html = "<p>der antrag liegt aus, die warteliste öffnet</p>";
        let current = snapshot(current_html);
        let result = classify(Some(&previous), current_html, &current);
        assert!(result.has_changed);
        assert_eq!(result.change_type, ChangeType::Keyword);
        assert_eq!(result.priority, Priority::Critical);
        assert_eq!(result.matched_keywords, Some(vec!["warteliste".to_string()]));
    }

    #[test]
    fn persistent_keywords_downgrade_to_content() {
        let previous = snapshot("<p>warteliste info alt</p>");
        let current_html = "<p>warteliste info neu gefasst</p>";
        let current = snapshot(current_html);
        let result = classify(Some(&previous), current_html, &current);
        assert!(result.has_changed);
        assert_ne!(result.change_type, ChangeType::Form);
        assert_eq!(result.priority, Priority::Info);
    }

    #[test]
    fn plain_content_change_is_informational() {
        // Vocabulary-free wording; "neuer" would trip the keyword
        // detector through its "neu" substring.
        let previous = snapshot("<p>alter inhalt</p>");
        let current_html = "<p>ganz anderer inhalt</p>";
        let current = snapshot(current_html);
        let result = classify(Some(&previous), current_html, &current);
        assert!(result.has_changed);
        assert_eq!(result.change_type, ChangeType::Content);
        assert_eq!(result.priority, Priority::Info);
        assert_eq!(result.confidence, 1.0);
        assert!(result.diff.is_some());
        assert!(result.matched_keywords.is_none());
    }
}
