use super::value::{cell_value, compare_values, Row};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

/// `key: None` means rows stay in the order they were supplied.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortState {
    pub key: Option<String>,
    pub direction: SortDirection,
}

impl SortState {
    pub fn by(key: &str, direction: SortDirection) -> Self {
        Self {
            key: Some(key.to_string()),
            direction,
        }
    }

    /// Header click: same key flips direction, a new key starts ascending.
    pub fn clicked(&self, key: &str) -> Self {
        match self.key.as_deref() {
            Some(k) if k == key => SortState::by(key, self.direction.toggled()),
            _ => SortState::by(key, SortDirection::Asc),
        }
    }
}

pub fn compare_rows(a: &Row, b: &Row, key: &str, direction: SortDirection) -> Ordering {
    let ord = compare_values(cell_value(a, key), cell_value(b, key));
    match direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
    }
}

/// Orders `order`, a list of indices into `rows`, by `sort`. Stable: rows
/// with equal keys keep their relative order in either direction.
pub fn sort_rows(rows: &[Row], order: &mut [usize], sort: &SortState) {
    if let Some(key) = sort.key.as_deref() {
        order.sort_by(|&a, &b| compare_rows(&rows[a], &rows[b], key, sort.direction));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::value::display_text;
    use serde_json::json;

    fn people() -> Vec<Row> {
        serde_json::from_value(json!([
            { "id": 1, "name": "Bob", "age": 30 },
            { "id": 2, "name": "Amy", "age": 25 },
            { "id": 3, "name": "Cara", "age": 25 }
        ]))
        .expect("rows")
    }

    fn sorted(rows: &[Row], sort: &SortState) -> Vec<usize> {
        let mut order: Vec<usize> = (0..rows.len()).collect();
        sort_rows(rows, &mut order, sort);
        order
    }

    fn names(rows: &[Row], order: &[usize]) -> Vec<String> {
        order.iter().map(|&i| display_text(&rows[i]["name"])).collect()
    }

    #[test]
    fn ascending_age_keeps_ties_in_input_order() {
        let rows = people();
        let order = sorted(&rows, &SortState::by("age", SortDirection::Asc));
        assert_eq!(names(&rows, &order), vec!["Amy", "Cara", "Bob"]);
    }

    #[test]
    fn descending_keeps_ties_in_input_order_too() {
        let rows = people();
        let order = sorted(&rows, &SortState::by("age", SortDirection::Desc));
        assert_eq!(names(&rows, &order), vec!["Bob", "Amy", "Cara"]);
    }

    #[test]
    fn no_key_returns_input_order() {
        let rows = people();
        assert_eq!(sorted(&rows, &SortState::default()), vec![0, 1, 2]);
    }

    #[test]
    fn only_the_given_indices_are_reordered() {
        let rows = people();
        let mut order = vec![2, 0];
        sort_rows(&rows, &mut order, &SortState::by("name", SortDirection::Asc));
        assert_eq!(order, vec![0, 2]);
    }

    #[test]
    fn descending_is_reverse_of_ascending_for_distinct_keys() {
        let rows = people();
        let asc = sorted(&rows, &SortState::by("name", SortDirection::Asc));
        let mut desc = sorted(&rows, &SortState::by("name", SortDirection::Desc));
        desc.reverse();
        assert_eq!(asc, desc);
        assert_eq!(names(&rows, &asc), vec!["Amy", "Bob", "Cara"]);
    }

    #[test]
    fn adjacent_pairs_are_ordered() {
        let rows: Vec<Row> = serde_json::from_value(json!([
            { "d": "2024-05-01" }, { "d": "2023-12-31" }, { "d": null },
            { "d": "2024-01-15" }, { }, { "d": "2024-05-01" }
        ]))
        .expect("rows");
        let order = sorted(&rows, &SortState::by("d", SortDirection::Asc));
        for pair in order.windows(2) {
            assert_ne!(
                compare_rows(&rows[pair[0]], &rows[pair[1]], "d", SortDirection::Asc),
                Ordering::Greater
            );
        }
        assert_eq!(order[4..], [0, 5]);
    }

    #[test]
    fn stability_holds_for_many_ties() {
        let rows: Vec<Row> = (0..40)
            .map(|i| {
                serde_json::from_value(json!({ "seq": i, "bucket": i % 3 })).expect("row")
            })
            .collect();
        for dir in [SortDirection::Asc, SortDirection::Desc] {
            let order = sorted(&rows, &SortState::by("bucket", dir));
            for pair in order.windows(2) {
                let (a, b) = (&rows[pair[0]], &rows[pair[1]]);
                if a["bucket"] == b["bucket"] {
                    assert!(a["seq"].as_i64() < b["seq"].as_i64());
                }
            }
        }
    }

    #[test]
    fn header_click_toggles_or_resets() {
        let s = SortState::default().clicked("age");
        assert_eq!(s, SortState::by("age", SortDirection::Asc));
        let s = s.clicked("age");
        assert_eq!(s.direction, SortDirection::Desc);
        let s = s.clicked("age");
        assert_eq!(s.direction, SortDirection::Asc);
        let s = s.clicked("age").clicked("name");
        assert_eq!(s, SortState::by("name", SortDirection::Asc));
    }
}
