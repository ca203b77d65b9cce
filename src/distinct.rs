use std::cmp::Ordering;

use croaring::Bitmap;

use crate::index::column::ColumnIndex;
use crate::index::normalizer::sort_key;
use crate::schema::ColumnOrder;
use crate::value::NormalizedValue;

/// One selectable value of a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistinctValue {
    pub value: NormalizedValue,
    pub display: String,
    /// Rows holding the value in the whole store, regardless of visibility.
    pub row_count: u64,
}

/// Values of `idx`, restricted to those with at least one row in `visible`
/// when given. Empty sorts first; the rest follow `order`.
pub fn distinct_values(
    idx: &ColumnIndex,
    visible: Option<&Bitmap>,
    order: ColumnOrder,
) -> Vec<DistinctValue> {
    let mut out: Vec<(DistinctValue, String)> = idx
        .iter()
        .filter(|(_, p)| visible.map_or(true, |vis| p.rows.intersect(vis)))
        .map(|(v, p)| {
            let display = v.display();
            let key = sort_key(&display);
            (
                DistinctValue {
                    value: v.clone(),
                    display,
                    row_count: p.count,
                },
                key,
            )
        })
        .collect();

    out.sort_by(|(a, ka), (b, kb)| compare(a, ka, b, kb, order));
    out.into_iter().map(|(d, _)| d).collect()
}

fn compare(
    a: &DistinctValue,
    ka: &str,
    b: &DistinctValue,
    kb: &str,
    order: ColumnOrder,
) -> Ordering {
    match (a.value.is_empty(), b.value.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }
    let primary = match order {
        ColumnOrder::Lexical => ka.cmp(kb),
        ColumnOrder::Natural => a.value.natural_cmp(&b.value),
    };
    // distinct keys can share a display string (1, 1.0, "1"); typed order settles them
    primary
        .then_with(|| a.display.cmp(&b.display))
        .then_with(|| a.value.natural_cmp(&b.value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::all_rows;
    use crate::schema::Column;
    use crate::value::{CellValue, EMPTY_DISPLAY};

    fn index(cells: Vec<CellValue>) -> ColumnIndex {
        let col = Column::new("c", |c: &CellValue| c.clone());
        ColumnIndex::build(&col, &cells)
    }

    fn displays(v: &[DistinctValue]) -> Vec<&str> {
        v.iter().map(|d| d.display.as_str()).collect()
    }

    #[test]
    fn lexical_is_case_insensitive_with_empty_first() {
        let idx = index(vec![
            "beta".into(),
            "Alpha".into(),
            CellValue::Null,
            "gamma".into(),
            "  ".into(),
            "alpha2".into(),
        ]);
        let out = distinct_values(&idx, None, ColumnOrder::Lexical);
        assert_eq!(
            displays(&out),
            vec![EMPTY_DISPLAY, "Alpha", "alpha2", "beta", "gamma"]
        );
        assert_eq!(out[0].row_count, 2);
    }

    #[test]
    fn natural_orders_numbers() {
        let idx = index(vec![CellValue::Int(10), CellValue::Int(9), CellValue::Null, CellValue::Int(100)]);
        let lexical = distinct_values(&idx, None, ColumnOrder::Lexical);
        assert_eq!(displays(&lexical), vec![EMPTY_DISPLAY, "10", "100", "9"]);
        let natural = distinct_values(&idx, None, ColumnOrder::Natural);
        assert_eq!(displays(&natural), vec![EMPTY_DISPLAY, "9", "10", "100"]);
    }

    #[test]
    fn same_display_orders_by_kind() {
        let cells = vec![
            CellValue::from("1"),
            CellValue::Float(1.0),
            CellValue::Int(1),
            CellValue::from("1"),
        ];
        for order in [ColumnOrder::Lexical, ColumnOrder::Natural] {
            let out = distinct_values(&index(cells.clone()), None, order);
            let values: Vec<CellValue> = out.into_iter().map(|d| d.value.into()).collect();
            assert_eq!(
                values,
                vec![CellValue::Int(1), CellValue::Float(1.0), CellValue::from("1")]
            );
        }
    }

    #[test]
    fn visible_restricts_values_not_counts() {
        let idx = index(vec!["a".into(), "b".into(), "a".into(), "c".into()]);
        let mut vis = Bitmap::new();
        vis.add(2);
        vis.add(3);
        let out = distinct_values(&idx, Some(&vis), ColumnOrder::Lexical);
        assert_eq!(displays(&out), vec!["a", "c"]);
        assert_eq!(out[0].row_count, 2);

        let none = distinct_values(&idx, Some(&Bitmap::new()), ColumnOrder::Lexical);
        assert!(none.is_empty());
        let all = distinct_values(&idx, Some(&all_rows(4)), ColumnOrder::Lexical);
        assert_eq!(all.len(), 3);
    }
}
