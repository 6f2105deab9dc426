//! Government Health Warning Statement check (27 CFR Part 16).
//!
//! The statement must appear verbatim. Whitespace runs are collapsed before
//! comparison; the "GOVERNMENT WARNING:" heading is case-sensitive and the
//! remaining words are compared case-insensitively.

pub const WARNING_CFR: &str = "27 CFR Part 16";

pub const WARNING_TEXT: &str = "GOVERNMENT WARNING: (1) According to the Surgeon General, women should not drink
alcoholic beverages during pregnancy because of the risk of birth defects.
(2) Consumption of alcoholic beverages impairs your ability to drive a car or
operate machinery, and may cause health problems.";

/// Why the observed warning text was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningViolation {
    Missing,
    Incomplete,
    Heading,
    MissingClauses,
    ClausesOutOfOrder,
    Wording,
}

impl WarningViolation {
    pub fn reason(self) -> &'static str {
        match self {
            Self::Missing => "Government Warning missing — required per 27 CFR Part 16",
            Self::Incomplete => {
                "Government Warning appears incomplete — required text missing (27 CFR Part 16)"
            }
            Self::Heading => {
                "Government Warning heading must be exactly 'GOVERNMENT WARNING:' in all caps (27 CFR Part 16)"
            }
            Self::MissingClauses => {
                "Government Warning must include both numbered clauses (1) and (2) (27 CFR Part 16)"
            }
            Self::ClausesOutOfOrder => {
                "Government Warning must include both numbered clauses in order (27 CFR Part 16)"
            }
            Self::Wording => {
                "Government Warning wording does not match required verbatim text (27 CFR Part 16)"
            }
        }
    }
}

fn words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Check observed warning text against the required statement.
pub fn validate_warning_exact(text: Option<&str>) -> Result<(), WarningViolation> {
    let text = match text {
        Some(t) if !t.is_empty() => t,
        _ => return Err(WarningViolation::Missing),
    };

    let expected = words(WARNING_TEXT);
    let observed = words(text);

    if observed.len() < 3 {
        return Err(WarningViolation::Incomplete);
    }
    if observed[0] != "GOVERNMENT" || observed[1] != "WARNING:" {
        return Err(WarningViolation::Heading);
    }

    let clause_one = observed.iter().position(|w| *w == "(1)");
    let clause_two = observed.iter().position(|w| *w == "(2)");
    match (clause_one, clause_two) {
        (Some(one), Some(two)) if two < one => return Err(WarningViolation::ClausesOutOfOrder),
        (Some(_), Some(_)) => {}
        _ => return Err(WarningViolation::MissingClauses),
    }

    if observed.len() != expected.len() {
        return Err(WarningViolation::Wording);
    }

    for (idx, (want, got)) in expected.iter().zip(&observed).enumerate() {
        if idx < 2 {
            if want != got {
                return Err(WarningViolation::Heading);
            }
        } else if want.to_lowercase() != got.to_lowercase() {
            return Err(WarningViolation::Wording);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_text_passes() {
        assert_eq!(validate_warning_exact(Some(WARNING_TEXT)), Ok(()));
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        let reflowed = words(WARNING_TEXT).join("   \n\t");
        assert_eq!(validate_warning_exact(Some(&reflowed)), Ok(()));
    }

    #[test]
    fn test_body_case_is_ignored() {
        let shouted = format!("GOVERNMENT WARNING: {}", words(WARNING_TEXT)[2..].join(" ").to_uppercase());
        assert_eq!(validate_warning_exact(Some(&shouted)), Ok(()));
    }

    #[test]
    fn test_missing() {
        assert_eq!(validate_warning_exact(None), Err(WarningViolation::Missing));
        assert_eq!(validate_warning_exact(Some("")), Err(WarningViolation::Missing));
    }

    #[test]
    fn test_two_words_is_incomplete() {
        assert_eq!(
            validate_warning_exact(Some("GOVERNMENT WARNING:")),
            Err(WarningViolation::Incomplete)
        );
    }

    #[test]
    fn test_heading_case_must_match() {
        let text = WARNING_TEXT.replacen("WARNING:", "Warning:", 1);
        let err = validate_warning_exact(Some(&text)).unwrap_err();
        assert_eq!(err, WarningViolation::Heading);
        assert!(err.reason().contains("heading must be exactly"));
    }

    #[test]
    fn test_missing_second_clause() {
        let text = WARNING_TEXT.replace("(2) ", "");
        let err = validate_warning_exact(Some(&text)).unwrap_err();
        assert_eq!(err, WarningViolation::MissingClauses);
        assert!(err.reason().contains("numbered clauses"));
    }

    #[test]
    fn test_clauses_out_of_order() {
        let text = WARNING_TEXT
            .replace("(1)", "(X)")
            .replace("(2)", "(1)")
            .replace("(X)", "(2)");
        assert_eq!(
            validate_warning_exact(Some(&text)),
            Err(WarningViolation::ClausesOutOfOrder)
        );
    }

    #[test]
    fn test_paraphrase_fails_wording() {
        let text = WARNING_TEXT.replace("health problems", "health issues");
        assert_eq!(validate_warning_exact(Some(&text)), Err(WarningViolation::Wording));

        let extra = format!("{WARNING_TEXT} Enjoy responsibly.");
        assert_eq!(validate_warning_exact(Some(&extra)), Err(WarningViolation::Wording));
    }
}
