use lazy_static::lazy_static;
use regex::Regex;

/// Collapses a display name into the form used for duplicate detection.
/// Lowercases, then strips everything except ASCII letters, digits,
/// underscores and Hangul syllables, so "FC Seoul", "fc-seoul" and
/// "FC  SEOUL!" all collide on "fcseoul". The display name itself is
/// stored untouched.
pub fn canonical_name(display: &str) -> String {
    lazy_static! {
        static ref STRIP_RE: Regex = Regex::new(r"[^a-z0-9_가-힣]").unwrap();
    }
    STRIP_RE
        .replace_all(&display.to_lowercase(), "")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_and_punctuation_collide() {
        assert_eq!(canonical_name("FC Seoul"), "fcseoul");
        assert_eq!(canonical_name("fc-seoul"), "fcseoul");
        assert_eq!(canonical_name("FC  SEOUL!"), "fcseoul");
    }

    #[test]
    fn test_hangul_preserved() {
        assert_eq!(canonical_name("FC 강남"), "fc강남");
        assert_eq!(canonical_name("  강동   드래곤즈  "), "강동드래곤즈");
    }

    #[test]
    fn test_underscore_preserved() {
        assert_eq!(canonical_name("team_one"), "team_one");
        assert_eq!(canonical_name("Team_One FC"), "team_onefc");
    }

    #[test]
    fn test_idempotent() {
        for name in ["FC Seoul", "강동 드래곤즈", "team_one!!", "  x  "] {
            let once = canonical_name(name);
            assert_eq!(canonical_name(&once), once);
        }
    }

    #[test]
    fn test_distinct_names_stay_distinct() {
        assert_ne!(canonical_name("FC Seoul"), canonical_name("FC Busan"));
        assert_ne!(canonical_name("강남 FC"), canonical_name("강북 FC"));
    }
}
