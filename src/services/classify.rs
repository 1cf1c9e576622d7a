//! Role classification: mapping free-text titles onto the fixed
//! relationship taxonomy.
//!
//! The match is ordered and the first matching rule wins, which is the
//! tie-break for composite titles: "Founder and CEO" is a `Founder`
//! relationship, not a `CEO` one. The precedence must not be reordered;
//! downstream graphs built from the same sources depend on it for output
//! parity.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::data::entities::RoleKind;

static FOUNDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)founder").expect("valid pattern"));

static CHIEF_EXECUTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)CEO|chief exec|president").expect("valid pattern"));

/// `c.o` catches the C-suite abbreviations (CTO, COO, CFO, ...) by their
/// first and last letters.
static OFFICER_OR_VP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)c.o|vp|director|vice president|partner|chief").expect("valid pattern")
});

static ADVISER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)adviser|board|consultant").expect("valid pattern"));

/// Classifies a free-text role title into the taxonomy. `None` means the
/// title is unclassified: the caller skips edge creation and may log the
/// title for taxonomy review.
pub fn classify_role(title: &str) -> Option<RoleKind> {
    if FOUNDER.is_match(title) {
        Some(RoleKind::Founder)
    } else if CHIEF_EXECUTIVE.is_match(title) {
        Some(RoleKind::Ceo)
    } else if OFFICER_OR_VP.is_match(title) {
        Some(RoleKind::Vp)
    } else if ADVISER.is_match(title) {
        Some(RoleKind::Adviser)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn founder_outranks_ceo_in_composite_titles() {
        assert_eq!(classify_role("Founder and CEO"), Some(RoleKind::Founder));
        assert_eq!(classify_role("Co-Founder & President"), Some(RoleKind::Founder));
    }

    #[test]
    fn chief_executive_titles() {
        assert_eq!(classify_role("CEO"), Some(RoleKind::Ceo));
        assert_eq!(classify_role("Chief Executive Officer"), Some(RoleKind::Ceo));
        assert_eq!(classify_role("President"), Some(RoleKind::Ceo));
    }

    #[test]
    fn officer_and_vp_titles() {
        assert_eq!(classify_role("VP of Engineering"), Some(RoleKind::Vp));
        assert_eq!(classify_role("CTO"), Some(RoleKind::Vp));
        assert_eq!(classify_role("COO"), Some(RoleKind::Vp));
        assert_eq!(classify_role("Managing Director"), Some(RoleKind::Vp));
        assert_eq!(classify_role("General Partner"), Some(RoleKind::Vp));
    }

    #[test]
    fn adviser_titles() {
        assert_eq!(classify_role("Technical Adviser"), Some(RoleKind::Adviser));
        assert_eq!(classify_role("Board Member"), Some(RoleKind::Adviser));
        assert_eq!(classify_role("Consultant"), Some(RoleKind::Adviser));
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(classify_role("fOuNdEr"), Some(RoleKind::Founder));
        assert_eq!(classify_role("BOARD OBSERVER"), Some(RoleKind::Adviser));
    }

    #[test]
    fn unmatched_titles_are_unclassified() {
        assert_eq!(classify_role("Marketing Manager"), None);
        assert_eq!(classify_role(""), None);
    }
}
