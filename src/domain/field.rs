//! Named field values and the capability record kinds use to expose them.

use crate::domain::identity::Identity;
use chrono::NaiveDateTime;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

/// Field name to value, with names folded to lower case on insert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    fields: BTreeMap<String, FieldValue>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field. A name differing only by case replaces the earlier value.
    pub fn insert(&mut self, name: &str, value: impl Into<FieldValue>) {
        self.fields.insert(name.to_lowercase(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, FieldValue> {
        self.fields.iter()
    }
}

impl<'a> IntoIterator for &'a FieldMap {
    type Item = (&'a String, &'a FieldValue);
    type IntoIter = btree_map::Iter<'a, String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Enumerates the named fields of a record kind.
///
/// A kind built on top of another calls the parent's `provide_fields` before
/// adding its own, so every ancestor's fields reach the map.
pub trait FieldProvider {
    fn provide_fields(&self, out: &mut FieldMap);
}

/// User-defined data kind carried by [`crate::domain::record::Record::Custom`].
pub trait CustomData: FieldProvider + fmt::Debug + Send + Sync {
    fn identity(&self) -> &Identity;
    fn time(&self) -> NaiveDateTime;
    /// Headline value, exposed as the `value` column.
    fn value(&self) -> f64;
}

/// Custom data whose columns are only known at runtime (vendor datasets with
/// free-form headers).
#[derive(Debug, Clone)]
pub struct GenericCustomData {
    pub identity: Identity,
    pub time: NaiveDateTime,
    pub value: f64,
    pub properties: FieldMap,
}

impl GenericCustomData {
    pub fn new(identity: Identity, time: NaiveDateTime, value: f64) -> Self {
        Self {
            identity,
            time,
            value,
            properties: FieldMap::new(),
        }
    }

    pub fn with_property(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.properties.insert(name, value);
        self
    }
}

impl FieldProvider for GenericCustomData {
    fn provide_fields(&self, out: &mut FieldMap) {
        for (name, value) in &self.properties {
            out.insert(name, value.clone());
        }
    }
}

impl CustomData for GenericCustomData {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn time(&self) -> NaiveDateTime {
        self.time
    }

    fn value(&self) -> f64 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_folded_to_lower_case() {
        let mut map = FieldMap::new();
        map.insert("LastPrice", 101.0);
        assert!(map.contains("lastprice"));
        assert_eq!(map.names().collect::<Vec<_>>(), vec!["lastprice"]);
    }

    #[test]
    fn case_variants_collapse_to_one_entry() {
        let mut map = FieldMap::new();
        map.insert("Close", 1.0);
        map.insert("CLOSE", 2.0);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("close"), Some(&FieldValue::Number(2.0)));
    }

    #[test]
    fn generic_custom_data_provides_properties() {
        let time = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let data = GenericCustomData::new(Identity::custom("LTCUSD", "usa"), time, 5.0)
            .with_property("Transactions", 12.0)
            .with_property("Source", "quandl");

        let mut out = FieldMap::new();
        data.provide_fields(&mut out);

        assert_eq!(out.get("transactions"), Some(&FieldValue::Number(12.0)));
        assert_eq!(out.get("source"), Some(&FieldValue::Text("quandl".into())));
        assert!(!out.contains("value"));
    }
}
