use gridfilter::{CellValue, Column, ColumnRegistry, FilterEngine};
use proptest::collection::{hash_set, vec};
use proptest::prelude::*;

type Row = (u8, u8, Option<u8>);

fn registry() -> ColumnRegistry<Row> {
    ColumnRegistry::new()
        .with(Column::new("A", |r: &Row| CellValue::from(u32::from(r.0))))
        .with(Column::new("B", |r: &Row| CellValue::from(format!("b{}", r.1))))
        .with(Column::new("C", |r: &Row| CellValue::from(r.2.map(|c| format!("c{c}")))))
}

fn rows() -> impl Strategy<Value = Vec<Row>> {
    vec((0u8..5, 0u8..4, proptest::option::of(0u8..3)), 0..200)
}

proptest! {
    #[test]
    fn matches_brute_force(
        data in rows(),
        a in hash_set(0u8..6, 0..4),
        b in hash_set(0u8..5, 0..3),
    ) {
        let mut e = FilterEngine::new(data.clone(), registry()).unwrap();
        e.set_filter("A", a.iter().map(|v| u32::from(*v))).unwrap();
        e.set_filter("B", b.iter().map(|v| format!("b{v}"))).unwrap();

        let expected: Vec<u32> = data
            .iter()
            .enumerate()
            .filter(|(_, r)| a.is_empty() || a.contains(&r.0))
            .filter(|(_, r)| b.is_empty() || b.contains(&r.1))
            .map(|(i, _)| i as u32)
            .collect();
        prop_assert_eq!(e.filtered_positions(), expected.as_slice());
    }

    #[test]
    fn postings_partition_rows(data in rows()) {
        let mut e = FilterEngine::new(data.clone(), registry()).unwrap();
        e.build_all_indexes_parallel(&["A", "B", "C"]).unwrap();
        for column in ["A", "B", "C"] {
            let idx = e.column_index(column).unwrap();
            let total: u64 = idx.iter().map(|(_, p)| p.count).sum();
            prop_assert_eq!(total, data.len() as u64);
            let mut union = croaring::Bitmap::new();
            for (_, p) in idx.iter() {
                prop_assert!(!union.intersect(&p.rows));
                union.or_inplace(&p.rows);
            }
            prop_assert_eq!(union.cardinality(), data.len() as u64);
        }
    }

    #[test]
    fn cascade_lists_only_reachable_values(
        data in rows(),
        a in hash_set(0u8..5, 1..3),
    ) {
        let mut e = FilterEngine::new(data.clone(), registry()).unwrap();
        e.set_filter("A", a.iter().map(|v| u32::from(*v))).unwrap();

        let mut reachable: Vec<String> = data
            .iter()
            .filter(|r| a.contains(&r.0))
            .map(|r| format!("b{}", r.1))
            .collect();
        reachable.sort();
        reachable.dedup();

        let listed: Vec<String> = e
            .distinct_values("B", true)
            .unwrap()
            .into_iter()
            .map(|d| d.display)
            .collect();
        prop_assert_eq!(listed, reachable);

        let full = e.distinct_values("B", false).unwrap();
        let mut all: Vec<u8> = data.iter().map(|r| r.1).collect();
        all.sort();
        all.dedup();
        prop_assert_eq!(full.len(), all.len());
    }

    #[test]
    fn sort_preserves_filtered_set(data in rows(), c in hash_set(0u8..3, 1..3), asc in any::<bool>()) {
        let selection: Vec<Option<String>> = c.iter().map(|v| Some(format!("c{v}"))).chain([None]).collect();

        let mut e = FilterEngine::new(data, registry()).unwrap();
        e.set_filter("C", selection.clone()).unwrap();
        let mut before = e.filtered_owned();
        e.sort_by("A", asc).unwrap();
        let mut after = e.filtered_owned();

        before.sort();
        after.sort();
        prop_assert_eq!(before, after);
    }
}
