//! Patient → study → series → instance index of the loaded files.
//!
//! A [`Hierarchy`] is an immutable value. Engines assemble one with a
//! [`HierarchyBuilder`] after every successful load and hand out copies; the
//! session never patches it in place.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use crate::error::HierarchyError;

/// Series Instance UID used to filter the navigable range
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeriesKey(String);

impl SeriesKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SeriesKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// String-keyed map that keeps insertion order and unique keys.
///
/// Serializes as a plain map; deserializing rejects duplicate keys.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> OrderedMap<V> {
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(entry_key, _)| entry_key == key)
            .map(|(_, value)| value)
    }

    fn get_or_insert_with(&mut self, key: &str, value: impl FnOnce() -> V) -> &mut V {
        let position = match self.entries.iter().position(|(k, _)| k == key) {
            Some(position) => position,
            None => {
                self.entries.push((key.to_string(), value()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[position].1
    }

    /// Inserts or replaces in place. Returns `false` if the key was already present.
    fn insert(&mut self, key: &str, value: V) -> bool {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => {
                *existing = value;
                false
            }
            None => {
                self.entries.push((key.to_string(), value));
                true
            }
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct OrderedMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
    type Value = OrderedMap<V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map with unique string keys")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = OrderedMap::default();
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            if map.contains_key(&key) {
                return Err(serde::de::Error::custom(format!("duplicate key `{key}`")));
            }
            map.entries.push((key, value));
        }
        Ok(map)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Hierarchy {
    patients: OrderedMap<Patient>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Patient {
    studies: OrderedMap<Study>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Study {
    series: OrderedMap<Series>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Series {
    instances: OrderedMap<Instance>,
    #[serde(default)]
    pub series_number: Option<i32>,
    #[serde(default)]
    pub series_date: String,
    #[serde(default)]
    pub series_time: String,
    #[serde(default)]
    pub modality: String,
    #[serde(default)]
    pub body_part_examined: String,
}

/// Descriptive attributes taken from the first instance seen in a series
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesAttributes {
    pub series_number: Option<i32>,
    pub series_date: String,
    pub series_time: String,
    pub modality: String,
    pub body_part_examined: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Instance {
    #[serde(default)]
    pub instance_number: Option<i32>,
}

impl Hierarchy {
    /// Parses a serialized snapshot, rejecting unknown fields and duplicate keys
    pub fn from_json(snapshot: &str) -> Result<Self, HierarchyError> {
        Ok(serde_json::from_str(snapshot)?)
    }

    pub fn patients(&self) -> &OrderedMap<Patient> {
        &self.patients
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    fn all_series(&self) -> impl Iterator<Item = (&str, &Series)> {
        self.patients
            .values()
            .flat_map(|patient| patient.studies.values())
            .flat_map(|study| study.series.iter())
    }

    pub fn series(&self, key: &SeriesKey) -> Option<&Series> {
        self.all_series()
            .find(|(series_key, _)| *series_key == key.as_str())
            .map(|(_, series)| series)
    }

    pub fn contains_series(&self, key: &SeriesKey) -> bool {
        self.series(key).is_some()
    }

    pub fn series_keys(&self) -> Vec<SeriesKey> {
        self.all_series().map(|(key, _)| SeriesKey::new(key)).collect()
    }

    pub fn series_count(&self) -> usize {
        self.all_series().count()
    }

    pub fn instance_count(&self) -> usize {
        self.all_series()
            .map(|(_, series)| series.instances.len())
            .sum()
    }

    /// Depth-first listing for tree widgets, parents before children
    pub fn nodes(&self) -> Vec<TreeNode<'_>> {
        let mut nodes = Vec::new();
        for (patient_id, patient) in self.patients.iter() {
            nodes.push(TreeNode::new(Level::Patient, patient_id));
            for (study_uid, study) in patient.studies.iter() {
                nodes.push(TreeNode::new(Level::Study, study_uid));
                for (series_uid, series) in study.series.iter() {
                    nodes.push(TreeNode::new(Level::Series, series_uid));
                    for (sop_uid, _) in series.instances.iter() {
                        nodes.push(TreeNode::new(Level::Instance, sop_uid));
                    }
                }
            }
        }
        nodes
    }
}

impl Patient {
    pub fn studies(&self) -> &OrderedMap<Study> {
        &self.studies
    }
}

impl Study {
    pub fn series(&self) -> &OrderedMap<Series> {
        &self.series
    }
}

impl Series {
    pub fn instances(&self) -> &OrderedMap<Instance> {
        &self.instances
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Patient,
    Study,
    Series,
    Instance,
}

impl Level {
    pub fn depth(self) -> usize {
        match self {
            Level::Patient => 0,
            Level::Study => 1,
            Level::Series => 2,
            Level::Instance => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeNode<'a> {
    pub level: Level,
    pub key: &'a str,
}

impl<'a> TreeNode<'a> {
    fn new(level: Level, key: &'a str) -> Self {
        Self { level, key }
    }

    /// Key to filter on when this node is picked; only series nodes are selectable
    pub fn series_key(&self) -> Option<SeriesKey> {
        matches!(self.level, Level::Series).then(|| SeriesKey::new(self.key))
    }
}

/// Identifiers and attributes of one decoded instance
#[derive(Debug, Clone, Default)]
pub struct InstanceRecord {
    pub patient_id: String,
    pub study_instance_uid: String,
    pub series_instance_uid: String,
    pub sop_instance_uid: String,
    pub instance_number: Option<i32>,
    pub series: SeriesAttributes,
}

#[derive(Debug, Default)]
pub struct HierarchyBuilder {
    hierarchy: Hierarchy,
}

impl HierarchyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, record: &InstanceRecord) -> &mut Self {
        let series = self
            .hierarchy
            .patients
            .get_or_insert_with(&record.patient_id, Patient::default)
            .studies
            .get_or_insert_with(&record.study_instance_uid, Study::default)
            .series
            .get_or_insert_with(&record.series_instance_uid, || Series {
                instances: OrderedMap::default(),
                series_number: record.series.series_number,
                series_date: record.series.series_date.clone(),
                series_time: record.series.series_time.clone(),
                modality: record.series.modality.clone(),
                body_part_examined: record.series.body_part_examined.clone(),
            });
        let instance = Instance {
            instance_number: record.instance_number,
        };
        if !series.instances.insert(&record.sop_instance_uid, instance) {
            warn!(
                "Duplicate SOP Instance UID {} in series {}",
                record.sop_instance_uid,
                record.series_instance_uid
            );
        }
        self
    }

    pub fn build(self) -> Hierarchy {
        self.hierarchy
    }
}
