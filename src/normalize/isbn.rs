//! ISBN cleanup, checksum validation, and ISBN-10 → ISBN-13 conversion.

use crate::normalize::clean_text;

/// Keep only digits and `X` (uppercased). Empty results become `None`.
pub fn only_digits_x(raw: Option<&str>) -> Option<String> {
    let s = clean_text(raw)?;
    let out: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == 'x' || *c == 'X')
        .map(|c| c.to_ascii_uppercase())
        .collect();
    (!out.is_empty()).then_some(out)
}

pub fn is_valid_isbn10(raw: Option<&str>) -> bool {
    let Some(s) = only_digits_x(raw) else {
        return false;
    };
    let bytes = s.as_bytes();
    if bytes.len() != 10 {
        return false;
    }

    let mut total = 0u32;
    for (i, b) in bytes[..9].iter().enumerate() {
        if !b.is_ascii_digit() {
            return false;
        }
        total += (i as u32 + 1) * u32::from(b - b'0');
    }
    let check = match bytes[9] {
        b'X' => 10,
        b if b.is_ascii_digit() => u32::from(b - b'0'),
        _ => return false,
    };
    total % 11 == check
}

pub fn is_valid_isbn13(raw: Option<&str>) -> bool {
    let Some(s) = only_digits_x(raw) else {
        return false;
    };
    if s.len() != 13 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let total: u32 = s
        .bytes()
        .enumerate()
        .map(|(i, b)| {
            let weight = if i % 2 == 0 { 1 } else { 3 };
            weight * u32::from(b - b'0')
        })
        .sum();
    total % 10 == 0
}

/// Convert a 10-character ISBN to its `978`-prefixed ISBN-13.
///
/// Only the length and digits of the first nine characters are checked; call
/// `is_valid_isbn10` first when the checksum matters.
pub fn to_isbn13_from10(raw: Option<&str>) -> Option<String> {
    let s = only_digits_x(raw)?;
    if s.len() != 10 {
        return None;
    }
    let core = format!("978{}", &s[..9]);
    if !core.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let total: u32 = core
        .bytes()
        .enumerate()
        .map(|(i, b)| {
            let weight = if i % 2 == 0 { 1 } else { 3 };
            weight * u32::from(b - b'0')
        })
        .sum();
    let check = (10 - total % 10) % 10;
    Some(format!("{core}{check}"))
}

/// Pick the best *valid* `(isbn13, isbn10)` pair.
///
/// A valid ISBN-13 wins; otherwise a valid ISBN-10 is converted. With neither,
/// both sides are `None`. Used to decide whether a catalog lookup can go by ISBN.
pub fn pick_best_isbn(isbn13: Option<&str>, isbn10: Option<&str>) -> (Option<String>, Option<String>) {
    if is_valid_isbn13(isbn13) {
        return (only_digits_x(isbn13), only_digits_x(isbn10));
    }
    if is_valid_isbn10(isbn10) {
        return (to_isbn13_from10(isbn10), only_digits_x(isbn10));
    }
    (None, None)
}

/// Resolve identifiers for integration.
///
/// Unlike `pick_best_isbn`, a non-empty ISBN-13 is kept even when its checksum
/// fails: presence, not validity, decides the canonical key. A missing ISBN-13
/// is derived from a valid ISBN-10.
pub fn resolve_isbns(isbn13: Option<&str>, isbn10: Option<&str>) -> (Option<String>, Option<String>) {
    let clean10 = only_digits_x(isbn10);
    let clean13 = only_digits_x(isbn13).or_else(|| {
        if is_valid_isbn10(clean10.as_deref()) {
            to_isbn13_from10(clean10.as_deref())
        } else {
            None
        }
    });
    (clean13, clean10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleans_separators_and_case() {
        assert_eq!(only_digits_x(Some("0-306-40615-2")), Some("0306406152".to_string()));
        assert_eq!(only_digits_x(Some("080442957x")), Some("080442957X".to_string()));
        assert_eq!(only_digits_x(Some("n/a")), None);
        assert_eq!(only_digits_x(Some("ISBN")), None);
        assert_eq!(only_digits_x(None), None);
    }

    #[test]
    fn validates_checksums() {
        assert!(is_valid_isbn10(Some("0306406152")));
        assert!(is_valid_isbn10(Some("080442957X")));
        assert!(!is_valid_isbn10(Some("0306406153")));
        assert!(is_valid_isbn13(Some("978-0-306-40615-7")));
        assert!(!is_valid_isbn13(Some("9780306406158")));
        assert!(!is_valid_isbn13(None));
    }

    #[test]
    fn converts_isbn10_to_isbn13() {
        assert_eq!(to_isbn13_from10(Some("0306406152")), Some("9780306406157".to_string()));
        assert_eq!(to_isbn13_from10(Some("12345")), None);
    }

    #[test]
    fn pick_best_prefers_valid_isbn13() {
        let (i13, i10) = pick_best_isbn(Some("9780306406157"), None);
        assert_eq!(i13.as_deref(), Some("9780306406157"));
        assert_eq!(i10, None);

        let (i13, i10) = pick_best_isbn(Some("garbage"), Some("0306406152"));
        assert_eq!(i13.as_deref(), Some("9780306406157"));
        assert_eq!(i10.as_deref(), Some("0306406152"));

        assert_eq!(pick_best_isbn(Some("123"), Some("456")), (None, None));
    }

    #[test]
    fn resolve_keeps_present_isbn13() {
        let (i13, _) = resolve_isbns(Some("9781111111111"), None);
        assert_eq!(i13.as_deref(), Some("9781111111111"));

        let (i13, i10) = resolve_isbns(None, Some("0306406152"));
        assert_eq!(i13.as_deref(), Some("9780306406157"));
        assert_eq!(i10.as_deref(), Some("0306406152"));

        assert_eq!(resolve_isbns(Some("nan"), None), (None, None));
    }
}
