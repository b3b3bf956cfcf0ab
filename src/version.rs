//! Picks the release version to mirror out of an index's version list.

use std::str::FromStr;

use log::warn;
use pep440_rs::{Version, VersionSpecifiers};

/// Returns the highest version satisfying `specifiers`, or `None` when no
/// listed version does.
///
/// Versions are compared by PEP 440 precedence, not lexically, so `1.10`
/// beats `1.9` and `2.0` beats `2.0rc1`. The returned value is the raw
/// string exactly as the index listed it, since it is the lookup key for
/// the release files. Entries that are not valid PEP 440 versions are
/// dropped with a warning.
pub fn select_best<'a, I>(specifiers: &VersionSpecifiers, versions: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&str, Version)> = None;
    for raw in versions {
        let version = match Version::from_str(raw) {
            Ok(version) => version,
            Err(err) => {
                warn!("skipping unparsable version {:?}: {}", raw, err);
                continue;
            }
        };
        if !specifiers.contains(&version) {
            continue;
        }
        let replace = match &best {
            Some((_, current)) => version > *current,
            None => true,
        };
        if replace {
            best = Some((raw, version));
        }
    }
    best.map(|(raw, _)| raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specifiers(s: &str) -> VersionSpecifiers {
        VersionSpecifiers::from_str(s).unwrap()
    }

    #[test]
    fn test_picks_highest_version() {
        let best = select_best(&specifiers(""), ["1.0", "2.0", "1.5"]);
        assert_eq!(best, Some("2.0"));
    }

    #[test]
    fn test_orders_by_pep440_not_lexically() {
        let best = select_best(&specifiers(""), ["1.9", "1.10"]);
        assert_eq!(best, Some("1.10"));
    }

    #[test]
    fn test_release_beats_its_prerelease() {
        let best = select_best(&specifiers(""), ["2.0rc1", "2.0", "2.0a1"]);
        assert_eq!(best, Some("2.0"));
    }

    #[test]
    fn test_respects_upper_bound() {
        let best = select_best(&specifiers("<2.0"), ["1.0", "1.5", "2.0"]);
        assert_eq!(best, Some("1.5"));
    }

    #[test]
    fn test_picks_highest_inside_range() {
        let best = select_best(&specifiers(">=1.0,<2.0"), ["0.9", "1.0", "1.9", "2.0"]);
        assert_eq!(best, Some("1.9"));
    }

    #[test]
    fn test_respects_compound_specifiers() {
        let best = select_best(&specifiers(">=1.2,<1.9"), ["1.0", "1.2", "1.8.4", "1.9"]);
        assert_eq!(best, Some("1.8.4"));
    }

    #[test]
    fn test_exact_pin() {
        let best = select_best(&specifiers("==1.2"), ["1.0", "1.2", "1.3"]);
        assert_eq!(best, Some("1.2"));
    }

    #[test]
    fn test_none_when_nothing_matches() {
        assert_eq!(select_best(&specifiers(">5.0"), ["1.0", "2.0"]), None);
        assert_eq!(select_best(&specifiers(""), []), None);
    }

    #[test]
    fn test_impossible_specifiers_yield_none() {
        let best = select_best(&specifiers(">2.0,<1.0"), ["0.5", "1.5", "2.5"]);
        assert_eq!(best, None);
    }

    #[test]
    fn test_skips_unparsable_versions() {
        let best = select_best(&specifiers(""), ["not-a-version", "1.0"]);
        assert_eq!(best, Some("1.0"));
    }

    #[test]
    fn test_returns_raw_index_spelling() {
        // "1.0.0" and "1.0" normalize to the same version; the raw key the
        // index used must come back untouched.
        let best = select_best(&specifiers("==1.0"), ["1.0.0"]);
        assert_eq!(best, Some("1.0.0"));
    }

    #[test]
    fn test_epoch_outranks_plain_version() {
        let best = select_best(&specifiers(""), ["9.9", "1!1.0"]);
        assert_eq!(best, Some("1!1.0"));
    }
}
