//! Text normalization helpers shared by ingestion and the boundary loader
//!
//! Division names coming from the sales file and from the boundary dataset
//! must compare equal after the same normalization, so both sides call
//! [`normalize_division_name`].

/// Cell spellings treated as "no value" when reading delimited text.
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Title-case a string: the first letter of every alphabetic run is upper-cased,
/// the remaining letters of the run are lower-cased.
///
/// Any non-alphabetic character starts a new run, so `"north-east"` becomes
/// `"North-East"` and `"o'neil"` becomes `"O'Neil"`.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_word = false;

    for ch in value.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }

    out
}

/// Trim surrounding whitespace and title-case.
pub fn normalize_division_name(value: &str) -> String {
    title_case(value.trim())
}

/// Whether a raw cell should be read as a missing value.
pub fn is_missing_marker(raw: &str) -> bool {
    MISSING_MARKERS.contains(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case_words() {
        assert_eq!(title_case("dhaka"), "Dhaka");
        assert_eq!(title_case("CHATTOGRAM division"), "Chattogram Division");
        assert_eq!(title_case("north-east"), "North-East");
        assert_eq!(title_case("o'neil"), "O'Neil");
    }

    #[test]
    fn test_normalize_division_name_trims() {
        assert_eq!(normalize_division_name("  dhaka "), "Dhaka");
        assert_eq!(
            normalize_division_name("  dhaka "),
            normalize_division_name("Dhaka")
        );
    }

    #[test]
    fn test_missing_markers() {
        assert!(is_missing_marker(""));
        assert!(is_missing_marker("NaN"));
        assert!(is_missing_marker("N/A"));
        assert!(!is_missing_marker("Unknown"));
        assert!(!is_missing_marker(" "));
    }
}
