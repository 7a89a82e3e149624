//! Text canonicalization for keyword matching.

/// Uppercase `text`, collapse every whitespace run to one space and trim.
///
/// No other folding is applied. Never fails; empty input yields an empty
/// string.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let upper = text.to_uppercase();

    let mut out = String::with_capacity(upper.len());
    for word in upper.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// [`normalize`] for optional input; `None` yields an empty string.
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_and_uppercases() {
        assert_eq!(normalize(" a  B\tc "), "A B C");
        assert_eq!(normalize("form\n1\r\n  asset"), "FORM 1 ASSET");
    }

    #[test]
    fn test_empty_and_absent() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \t\n"), "");
        assert_eq!(normalize_opt(None), "");
        assert_eq!(normalize_opt(Some("exhibit a")), "EXHIBIT A");
    }

    #[test]
    fn test_only_case_and_whitespace_change() {
        assert_eq!(normalize("\u{2460} item"), "\u{2460} ITEM");
        assert_eq!(normalize("file\u{00A0}no"), "FILE NO");
        assert_eq!(normalize("Schedule A/B: 1,000.00"), "SCHEDULE A/B: 1,000.00");
    }

    #[test]
    fn test_idempotent() {
        let once = normalize("  Individual  Estate\tProperty ");
        assert_eq!(normalize(&once), once);
    }
}
