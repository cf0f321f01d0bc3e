use similar::{ChangeTag, TextDiff};

/// Fixed sentinel returned when diffing cannot produce useful output.
/// A diffing problem must never abort the classification pipeline.
pub const DIFF_FAILED: &str = "Diff generation failed";

const HUNK_SEPARATOR: &str = "@@ ... @@";
const CONTEXT_LINES: usize = 3;

// Operator-facing diffs are truncated rather than shipped whole; a
// full-page rewrite produces megabytes nobody reads.
const MAX_INPUT_BYTES: usize = 4 * 1024 * 1024;
const MAX_OUTPUT_BYTES: usize = 64 * 1024;

/// Line-oriented diff between two HTML documents: `+` additions, `-`
/// deletions, two-space context, `@@ ... @@` between non-adjacent
/// hunks. Returns [`DIFF_FAILED`] instead of erroring on pathological
/// input.
pub fn generate_diff(old: &str, new: &str) -> String {
    if old.len() > MAX_INPUT_BYTES || new.len() > MAX_INPUT_BYTES {
        tracing::warn!(
            target: "detect",
            old_bytes = old.len(),
            new_bytes = new.len(),
            "diff input too large, returning sentinel"
        );
        return DIFF_FAILED.to_string();
    }

    let diff = TextDiff::from_lines(old, new);
    let mut out = String::new();

    'groups: for (index, group) in diff.grouped_ops(CONTEXT_LINES).iter().enumerate() {
        if index > 0 {
            out.push_str(HUNK_SEPARATOR);
            out.push('\n');
        }
        for op in group {
            for change in diff.iter_changes(op) {
                let prefix = match change.tag() {
                    ChangeTag::Delete => "-",
                    ChangeTag::Insert => "+",
                    ChangeTag::Equal => "  ",
                };
                out.push_str(prefix);
                out.push_str(change.value().trim_end_matches('\n'));
                out.push('\n');
                if out.len() > MAX_OUTPUT_BYTES {
                    out.push_str(HUNK_SEPARATOR);
                    out.push_str(" (truncated)\n");
                    break 'groups;
                }
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_inputs_produce_empty_diff() {
        assert_eq!(generate_diff("a\nb\n", "a\nb\n"), "");
    }

    #[test]
    fn marks_additions_and_deletions() {
        let diff = generate_diff("alt\ngleich\n", "neu\ngleich\n");
        assert!(diff.contains("-alt"));
        assert!(diff.contains("+neu"));
        assert!(diff.contains("  gleich"));
    }

    #[test]
    fn separates_non_adjacent_hunks() {
        let mut old = String::new();
        let mut new = String::new();
        for i in 0..40 {
            old.push_str(&format!("zeile {i}\n"));
            new.push_str(&format!("zeile {i}\n"));
        }
        let old = old.replacen("zeile 2\n", "alt oben\n", 1);
        let new = new.replacen("zeile 38\n", "neu unten\n", 1);
        let diff = generate_diff(&old, &new);
        assert!(diff.contains(HUNK_SEPARATOR));
        assert!(diff.contains("-alt oben"));
        assert!(diff.contains("+zeile 2"));
        assert!(diff.contains("+neu unten"));
    }

    #[test]
    fn oversized_input_returns_sentinel() {
        let huge = "x".repeat(MAX_INPUT_BYTES + 1);
        assert_eq!(generate_diff(&huge, "klein"), DIFF_FAILED);
    }

    #[test]
    fn oversized_output_is_truncated() {
        let old = (0..20_000).map(|i| format!("a{i}\n")).collect::<String>();
        let new = (0..20_000).map(|i| format!("b{i}\n")).collect::<String>();
        let diff = generate_diff(&old, &new);
        assert!(diff.len() < MAX_OUTPUT_BYTES + 1024);
        assert!(diff.contains("(truncated)"));
    }
}
