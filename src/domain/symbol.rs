//! Symbol normalization and registry-key fallback rules.
//!
//! Stocks are keyed by their exchange-qualified name (e.g. `RELIANCE.NS`).
//! Callers frequently pass the bare name, so resolution walks an ordered
//! candidate list and short-circuits on the first hit.

/// Suffix appended when a symbol carries no recognized exchange suffix.
pub const DEFAULT_SUFFIX: &str = ".NS";

/// Exchange suffixes accepted as-is, in fallback priority order.
pub const RECOGNIZED_SUFFIXES: &[&str] = &[".NS", ".BO"];

fn has_recognized_suffix(symbol: &str) -> bool {
    RECOGNIZED_SUFFIXES.iter().any(|s| symbol.ends_with(s))
}

/// Canonical storage key for a user-supplied symbol: uppercased, with the
/// default exchange suffix appended when none is present.
pub fn normalize(symbol: &str) -> String {
    let upper = symbol.trim().to_uppercase();
    if has_recognized_suffix(&upper) {
        upper
    } else {
        format!("{upper}{DEFAULT_SUFFIX}")
    }
}

/// Registry lookup candidates in resolution priority order: the symbol as
/// given (uppercased), then each recognized suffix appended. A symbol that
/// already carries a suffix yields only itself.
pub fn registry_candidates(symbol: &str) -> Vec<String> {
    let upper = symbol.trim().to_uppercase();
    let mut candidates = vec![upper.clone()];
    if !has_recognized_suffix(&upper) {
        for suffix in RECOGNIZED_SUFFIXES {
            candidates.push(format!("{upper}{suffix}"));
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_appends_default_suffix() {
        assert_eq!(normalize("reliance"), "RELIANCE.NS");
        assert_eq!(normalize(" TCS "), "TCS.NS");
    }

    #[test]
    fn test_normalize_keeps_recognized_suffix() {
        assert_eq!(normalize("RELIANCE.NS"), "RELIANCE.NS");
        assert_eq!(normalize("sensexco.bo"), "SENSEXCO.BO");
    }

    #[test]
    fn test_candidates_for_bare_symbol() {
        assert_eq!(
            registry_candidates("infy"),
            vec!["INFY", "INFY.NS", "INFY.BO"]
        );
    }

    #[test]
    fn test_candidates_for_qualified_symbol() {
        assert_eq!(registry_candidates("INFY.BO"), vec!["INFY.BO"]);
    }
}
