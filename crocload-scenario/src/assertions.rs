//! Pure predicates behind the scenario's checks

use jsonpath_lib::select;
use serde_json::Value;

/// Path inspected by the listing check
pub const FIRST_NAME_PATH: &str = "$[0].name";

/// `len` letters drawn uniformly from a-z; repeats are possible
pub fn random_suffix(len: usize) -> String {
    (0..len).map(|_| fastrand::lowercase()).collect()
}

pub fn croc_name(prefix: &str, suffix: &str) -> String {
    format!("{} {}", prefix, suffix)
}

/// Whether the youngest age is strictly above `minimum`.
///
/// An absent or non-numeric age fails the whole set, as does an empty set.
pub fn all_older_than(ages: &[Option<f64>], minimum: u32) -> bool {
    let Some(ages) = ages.iter().copied().collect::<Option<Vec<f64>>>() else {
        return false;
    };
    ages.into_iter()
        .reduce(f64::min)
        .is_some_and(|youngest| youngest > f64::from(minimum))
}

/// Whether any string matched by `$[0].name` in `body` contains `needle`.
///
/// Only the first element of the listing is inspected.
pub fn first_name_contains(body: &str, needle: &str) -> bool {
    let Ok(document) = serde_json::from_str::<Value>(body) else {
        return false;
    };
    match select(&document, FIRST_NAME_PATH) {
        Ok(matches) => matches
            .iter()
            .any(|value| value.as_str().is_some_and(|name| name.contains(needle))),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_suffix_is_five_lowercase_letters() {
        for _ in 0..200 {
            let suffix = random_suffix(5);
            assert_eq!(suffix.len(), 5);
            assert!(suffix.chars().all(|c| c.is_ascii_lowercase()));
        }
        assert_eq!(random_suffix(0), "");
    }

    #[test]
    fn test_croc_name() {
        assert_eq!(croc_name("Jerry", "abcde"), "Jerry abcde");
    }

    #[test]
    fn test_ages_strictly_above_minimum() {
        let ages = |list: &[f64]| list.iter().map(|a| Some(*a)).collect::<Vec<_>>();
        assert!(all_older_than(&ages(&[6.0, 7.0, 8.0, 9.0]), 5));
        assert!(!all_older_than(&ages(&[4.0, 7.0, 8.0, 9.0]), 5));
        assert!(!all_older_than(&ages(&[5.0, 7.0]), 5));
    }

    #[test]
    fn test_missing_age_fails() {
        assert!(!all_older_than(&[Some(10.0), None, Some(8.0)], 5));
        assert!(!all_older_than(&[], 5));
    }

    #[test]
    fn test_listing_first_name() {
        assert!(first_name_contains(
            r#"[{"name":"Jerry abcde"},{"name":"Fred xyz"}]"#,
            "Jerry"
        ));
        assert!(!first_name_contains(
            r#"[{"name":"Fred xyz"},{"name":"Jerry abcde"}]"#,
            "Jerry"
        ));
    }

    #[test]
    fn test_listing_edge_cases() {
        assert!(!first_name_contains("[]", "Jerry"));
        assert!(!first_name_contains(r#"[{"id":1}]"#, "Jerry"));
        assert!(!first_name_contains(r#"[{"name":42}]"#, "Jerry"));
        assert!(!first_name_contains("not json", "Jerry"));
    }
}
