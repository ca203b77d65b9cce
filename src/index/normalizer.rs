use unicode_normalization::UnicodeNormalization;

use crate::value::{CellValue, NormalizedValue};

/// Collapse null and whitespace-only cells into the empty sentinel.
pub fn normalize(v: CellValue) -> NormalizedValue {
    if v.is_blank() {
        NormalizedValue::Empty
    } else {
        NormalizedValue::Value(v)
    }
}

/// Case-insensitive ordering key for display strings: NFKC, then lowercase.
pub fn sort_key(s: &str) -> String {
    s.nfkc().collect::<String>().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_cells_collapse() {
        assert_eq!(normalize(CellValue::Null), NormalizedValue::Empty);
        assert_eq!(normalize(CellValue::from("")), NormalizedValue::Empty);
        assert_eq!(normalize(CellValue::from(" \t ")), NormalizedValue::Empty);
        assert_eq!(
            normalize(CellValue::from(" a ")),
            NormalizedValue::Value(CellValue::from(" a "))
        );
        assert_eq!(
            normalize(CellValue::Int(0)),
            NormalizedValue::Value(CellValue::Int(0))
        );
    }

    #[test]
    fn sort_key_folds_case() {
        assert_eq!(sort_key("FoLdEr"), "folder");
        assert_eq!(sort_key("ＡＢ"), "ab");
    }
}
