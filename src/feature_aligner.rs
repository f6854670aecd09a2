//! Feature construction and alignment for price model inference.
//!
//! A [`FeatureRow`] is built from the raw property attributes plus a one-hot
//! encoding of the categorical fields, then projected onto the column list the
//! model declares it was fit on.

use crate::types::property::{City, Furnishing, PropertyInput};
use serde::Serialize;
use std::fmt;

/// A single cell of a feature row.
///
/// Raw categorical attributes are carried as text; nothing checks that a
/// column is numeric until the model consumes it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
}

impl FeatureValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(v) => Some(*v),
            FeatureValue::Text(_) => None,
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        FeatureValue::Number(v)
    }
}

impl From<u32> for FeatureValue {
    fn from(v: u32) -> Self {
        FeatureValue::Number(v as f64)
    }
}

impl From<&str> for FeatureValue {
    fn from(v: &str) -> Self {
        FeatureValue::Text(v.to_string())
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Number(v) => write!(f, "{}", v),
            FeatureValue::Text(s) => f.write_str(s),
        }
    }
}

/// Ordered mapping from feature name to value.
///
/// Column order is significant: models consume the row positionally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRow {
    columns: Vec<(String, FeatureValue)>,
}

impl FeatureRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a column. An existing column keeps its position and takes the
    /// new value; a new column is appended.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FeatureValue>) {
        let name = name.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.columns.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in row order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Merge `other` into a copy of `self`; `other` wins on equal keys.
    pub fn merged(&self, other: &FeatureRow) -> FeatureRow {
        let mut merged = self.clone();
        for (name, value) in other.iter() {
            merged.insert(name, value.clone());
        }
        merged
    }

    /// Numeric view of the row, in column order.
    ///
    /// Fails with the name of the first non-numeric column.
    pub fn to_numeric(&self) -> Result<Vec<f64>, String> {
        self.columns
            .iter()
            .map(|(name, value)| value.as_number().ok_or_else(|| name.clone()))
            .collect()
    }

    /// Copy of the row with columns sorted by name and NaN cells zeroed.
    pub fn sorted_and_filled(&self) -> FeatureRow {
        let mut columns: Vec<(String, FeatureValue)> = self
            .columns
            .iter()
            .map(|(name, value)| {
                let value = match value {
                    FeatureValue::Number(v) if v.is_nan() => FeatureValue::Number(0.0),
                    other => other.clone(),
                };
                (name.clone(), value)
            })
            .collect();
        columns.sort_by(|a, b| a.0.cmp(&b.0));
        FeatureRow { columns }
    }
}

impl<K: Into<String>, V: Into<FeatureValue>> FromIterator<(K, V)> for FeatureRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = FeatureRow::new();
        for (name, value) in iter {
            row.insert(name, value);
        }
        row
    }
}

/// Raw attributes as submitted, categorical fields still textual.
pub fn raw_features(input: &PropertyInput) -> FeatureRow {
    let mut row = FeatureRow::new();
    row.insert("bedrooms", input.bedrooms);
    row.insert("bathrooms", input.bathrooms);
    row.insert("land_size_m2", input.land_size_m2);
    row.insert("building_size_m2", input.building_size_m2);
    row.insert("floors", input.floors);
    row.insert("city", input.city.label());
    row.insert("furnishing", input.furnishing.label());
    row
}

/// One-hot encoding of city and furnishing.
///
/// Cities are emitted under two key spellings, `city_ {name}` and
/// `city_{name}`, since trained models have been seen with either.
pub fn build_onehot(city: City, furnishing: Furnishing) -> FeatureRow {
    let mut row = FeatureRow::new();
    for c in City::ALL {
        row.insert(format!("city_ {}", c.label()), indicator(c == city));
    }
    for c in City::ALL {
        row.insert(format!("city_{}", c.label()), indicator(c == city));
    }
    for f in Furnishing::ALL {
        row.insert(format!("furnishing_{}", f.label()), indicator(f == furnishing));
    }
    row
}

fn indicator(hit: bool) -> f64 {
    if hit {
        1.0
    } else {
        0.0
    }
}

/// Project the merged raw and one-hot features onto the expected columns.
///
/// Without an expected list (or with an empty one) the merged row is returned
/// unchanged. Otherwise the result has exactly the expected columns in the
/// expected order; columns absent from the merge are zero and columns the
/// model does not know about are dropped.
pub fn align(raw: &FeatureRow, onehot: &FeatureRow, expected: Option<&[String]>) -> FeatureRow {
    let merged = raw.merged(onehot);

    match expected {
        Some(expected) if !expected.is_empty() => expected
            .iter()
            .map(|name| {
                let value = merged
                    .get(name)
                    .cloned()
                    .unwrap_or(FeatureValue::Number(0.0));
                (name.clone(), value)
            })
            .collect(),
        _ => merged,
    }
}

/// Build the model-ready row for a property in one step.
pub fn prepare_features(input: &PropertyInput, expected: Option<&[String]>) -> FeatureRow {
    let raw = raw_features(input);
    let onehot = build_onehot(input.city, input.furnishing);
    align(&raw, &onehot, expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bogor_input() -> PropertyInput {
        PropertyInput::new(City::Bogor, Furnishing::Furnished)
            .with_rooms(3, 2)
            .with_sizes(100.0, 90.0)
            .with_floors(2)
    }

    fn names(row: &FeatureRow) -> Vec<&str> {
        row.names().collect()
    }

    #[test]
    fn test_align_to_expected_columns() {
        let expected = vec!["bedrooms".to_string(), "city_Bogor".to_string()];
        let row = prepare_features(&bogor_input(), Some(&expected));

        assert_eq!(names(&row), vec!["bedrooms", "city_Bogor"]);
        assert_eq!(row.get("bedrooms"), Some(&FeatureValue::Number(3.0)));
        assert_eq!(row.get("city_Bogor"), Some(&FeatureValue::Number(1.0)));
    }

    #[test]
    fn test_unknown_expected_column_defaults_to_zero() {
        let expected = vec![
            "garage".to_string(),
            "floors".to_string(),
            "city_ Depok".to_string(),
        ];
        let row = prepare_features(&bogor_input(), Some(&expected));

        assert_eq!(names(&row), vec!["garage", "floors", "city_ Depok"]);
        assert_eq!(row.to_numeric().unwrap(), vec![0.0, 2.0, 0.0]);
    }

    #[test]
    fn test_expected_key_set_matches_for_any_input() {
        let expected: Vec<String> = ["furnishing_baru", "land_size_m2", "city_ Tangerang", "x"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        for city in City::ALL {
            for furnishing in Furnishing::ALL {
                let input = PropertyInput::new(city, furnishing).with_sizes(250.0, 40.0);
                let row = prepare_features(&input, Some(&expected));
                let got: Vec<String> = row.names().map(str::to_string).collect();
                assert_eq!(got, expected);
            }
        }
    }

    #[test]
    fn test_absent_expected_list_returns_union() {
        let input = bogor_input();
        let raw = raw_features(&input);
        let onehot = build_onehot(input.city, input.furnishing);

        let row = align(&raw, &onehot, None);

        assert_eq!(row.len(), raw.len() + onehot.len());
        assert!(raw.names().chain(onehot.names()).all(|n| row.contains(n)));
        // Raw columns come first, in submission order
        assert_eq!(names(&row)[..3], ["bedrooms", "bathrooms", "land_size_m2"]);
        assert_eq!(row.get("city"), Some(&FeatureValue::Text("Bogor".into())));
    }

    #[test]
    fn test_empty_expected_list_behaves_as_absent() {
        let input = bogor_input();
        let empty: Vec<String> = Vec::new();
        assert_eq!(
            prepare_features(&input, Some(&empty)),
            prepare_features(&input, None)
        );
    }

    #[test]
    fn test_onehot_sets_single_city_per_variant() {
        for city in City::ALL {
            let row = build_onehot(city, Furnishing::Baru);

            let spaced: Vec<f64> = row
                .iter()
                .filter(|(n, _)| n.starts_with("city_ "))
                .filter_map(|(_, v)| v.as_number())
                .collect();
            let compact: Vec<f64> = row
                .iter()
                .filter(|(n, _)| n.starts_with("city_") && !n.starts_with("city_ "))
                .filter_map(|(_, v)| v.as_number())
                .collect();

            assert_eq!(spaced.len(), City::ALL.len());
            assert_eq!(compact.len(), City::ALL.len());
            assert_eq!(spaced.iter().sum::<f64>(), 1.0);
            assert_eq!(compact.iter().sum::<f64>(), 1.0);
            assert_eq!(
                row.get(&format!("city_{}", city.label())),
                Some(&FeatureValue::Number(1.0))
            );
        }
    }

    #[test]
    fn test_onehot_furnishing() {
        let row = build_onehot(City::Depok, Furnishing::SemiFurnished);
        assert_eq!(
            row.get("furnishing_semi furnished"),
            Some(&FeatureValue::Number(1.0))
        );
        let total: f64 = row
            .iter()
            .filter(|(n, _)| n.starts_with("furnishing_"))
            .filter_map(|(_, v)| v.as_number())
            .sum();
        assert_eq!(total, 1.0);
        assert_eq!(row.len(), 2 * City::ALL.len() + Furnishing::ALL.len());
    }

    #[test]
    fn test_merge_overwrites_in_place() {
        let a: FeatureRow = vec![("a", 1.0), ("b", 2.0)].into_iter().collect();
        let b: FeatureRow = vec![("c", 3.0), ("a", 9.0)].into_iter().collect();

        let merged = a.merged(&b);
        assert_eq!(names(&merged), vec!["a", "b", "c"]);
        assert_eq!(merged.to_numeric().unwrap(), vec![9.0, 2.0, 3.0]);
    }

    #[test]
    fn test_sorted_and_filled() {
        let row: FeatureRow = vec![("zeta", f64::NAN), ("alpha", 1.0), ("mid", 2.0)]
            .into_iter()
            .collect();

        let sorted = row.sorted_and_filled();
        assert_eq!(names(&sorted), vec!["alpha", "mid", "zeta"]);
        assert_eq!(sorted.to_numeric().unwrap(), vec![1.0, 2.0, 0.0]);
    }

    #[test]
    fn test_to_numeric_reports_text_column() {
        let row = raw_features(&bogor_input());
        assert_eq!(row.to_numeric(), Err("city".to_string()));
    }
}
