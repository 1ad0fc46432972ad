//! Western to Persian digit mapping.

use std::borrow::Cow;

pub const WESTERN_DIGITS: [char; 10] = ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];

/// Extended Arabic-Indic digits, U+06F0..=U+06F9
pub const PERSIAN_DIGITS: [char; 10] = ['۰', '۱', '۲', '۳', '۴', '۵', '۶', '۷', '۸', '۹'];

pub fn persian_digit(c: char) -> Option<char> {
    if c.is_ascii_digit() {
        Some(PERSIAN_DIGITS[(c as u8 - b'0') as usize])
    } else {
        None
    }
}

/// ASCII bytes never occur inside multi-byte UTF-8 sequences, so a byte scan
/// is exact.
pub fn contains_western_digit(text: &str) -> bool {
    text.bytes().any(|b| b.is_ascii_digit())
}

/// Replace every Western digit with its Persian counterpart.
/// Borrows the input when there is nothing to replace.
pub fn to_persian_digits(text: &str) -> Cow<'_, str> {
    if !contains_western_digit(text) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.chars()
            .map(|c| persian_digit(c).unwrap_or(c))
            .collect(),
    )
}

/// Injectable handle over the mapping functions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlyphMapper;

impl GlyphMapper {
    pub fn needs_mapping(&self, text: &str) -> bool {
        contains_western_digit(text)
    }

    pub fn map<'a>(&self, text: &'a str) -> Cow<'a, str> {
        to_persian_digits(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "no digits here",
        "قیمت: 1250 تومان",
        "0123456789",
        "۱۲۳ already",
        "mixed ۱2۳4",
        "٠١٢ arabic-indic stay",
        "１２ fullwidth stay",
        "tel: +98-21-5550199 ✈️",
    ];

    #[test]
    fn test_every_digit_maps_in_order() {
        for (western, persian) in WESTERN_DIGITS.iter().zip(PERSIAN_DIGITS.iter()) {
            assert_eq!(persian_digit(*western), Some(*persian));
        }
        assert_eq!(to_persian_digits("0123456789"), "۰۱۲۳۴۵۶۷۸۹");
    }

    #[test]
    fn test_price_example() {
        assert_eq!(to_persian_digits("قیمت: 1250 تومان"), "قیمت: ۱۲۵۰ تومان");
    }

    fn only_digits_changed(before: &str, after: &str) -> bool {
        before.chars().count() == after.chars().count()
            && before.chars().zip(after.chars()).all(|(b, a)| match persian_digit(b) {
                Some(persian) => a == persian,
                None => a == b,
            })
    }

    #[test]
    fn test_samples() {
        for sample in SAMPLES {
            let once = to_persian_digits(sample);
            assert!(!contains_western_digit(&once), "digits left in {once:?}");
            assert!(only_digits_changed(sample, &once), "{sample:?} -> {once:?}");
            assert_eq!(to_persian_digits(&once), once);
        }
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_idempotent(text in any::<String>()) {
            let once = to_persian_digits(&text).into_owned();
            let twice = to_persian_digits(&once);
            prop_assert_eq!(&once, &twice);
            prop_assert!(matches!(twice, Cow::Borrowed(_)));
        }

        #[test]
        fn test_only_digits_change(text in any::<String>()) {
            let converted = to_persian_digits(&text);
            prop_assert!(!contains_western_digit(&converted));
            prop_assert!(only_digits_changed(&text, &converted));
        }

        #[test]
        fn test_digit_heavy_text(text in "[0-9a-z ,.:۰-۹آ-ی]{0,64}") {
            let converted = to_persian_digits(&text);
            prop_assert!(!contains_western_digit(&converted));
            prop_assert!(only_digits_changed(&text, &converted));
            prop_assert_eq!(GlyphMapper.needs_mapping(&text), contains_western_digit(&text));
        }
    }

    #[test]
    fn test_borrows_when_unchanged() {
        assert!(matches!(to_persian_digits("بدون عدد"), Cow::Borrowed(_)));
        assert!(matches!(to_persian_digits("۱۲۳"), Cow::Borrowed(_)));
        assert!(matches!(GlyphMapper.map("7"), Cow::Owned(_)));
    }

    #[test]
    fn test_other_numeral_systems_are_untouched() {
        assert!(!contains_western_digit("٠١٢٣ ۴۵۶ １２"));
        assert_eq!(persian_digit('٣'), None);
        assert_eq!(persian_digit('a'), None);
    }
}
