//! Running validity checks collected during an audit pass.
//!
//! Each record class gets its aggregate on first touch. Numeric and temporal
//! fields track a `[min, max]` range; categorical checks collect the raw
//! values that failed them so a human can review them later. Nothing in here
//! rejects data.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDateTime, Utc};
use log::debug;
use serde::Serialize;

use crate::detect::{parse_float, parse_timestamp};
use crate::element::{Node, Tag, Way};
use crate::normalise::check_postcode;

/// Tag key holding postcodes.
pub const POSTCODE_KEY: &str = "addr:postcode";

/// Tag key holding English names.
pub const NAME_EN_KEY: &str = "name:en";

/// Final tokens accepted on English way names.
pub const EXPECTED_SUFFIXES: [&str; 32] = [
    "Road",
    "Street",
    "Expressway",
    "Bridge",
    "Highway",
    "River",
    "Lake",
    "Hutong",
    "Park",
    "Zone",
    "Area",
    "Alley",
    "Market",
    "Campus",
    "Gate",
    "Hall",
    "Engineering",
    "China",
    "Elegance",
    "Avenue",
    "Mansion",
    "Square",
    "Palace",
    "Hotel",
    "Rail",
    "Quarter",
    "Building",
    "Line",
    "Apartment",
    "Airport",
    "Institute",
    "College",
];

const LATITUDE_SEED: (f64, f64) = (90.0, 0.0);
const LONGITUDE_SEED: (f64, f64) = (180.0, -180.0);

/// Inclusive range of observed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bounds<T> {
    /// Smallest observed value.
    pub min: T,
    /// Largest observed value.
    pub max: T,
}

/// Running `[min, max]` aggregate starting from sentinel bounds.
///
/// The seed is only a placeholder: the first observation replaces both
/// bounds, so a seeded value is never reported as if it had been observed.
///
/// # Examples
/// ```
/// use wrangle_core::{Bounds, RangeTracker};
///
/// let mut latitude = RangeTracker::seeded(90.0, 0.0);
/// assert_eq!(latitude.bounds(), None);
///
/// latitude.observe(-33.9);
/// latitude.observe(-34.1);
/// assert_eq!(latitude.bounds(), Some(Bounds { min: -34.1, max: -33.9 }));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RangeTracker<T> {
    min: T,
    max: T,
    observations: u64,
}

impl<T: PartialOrd + Copy> RangeTracker<T> {
    /// Create a tracker holding the sentinel bounds.
    pub const fn seeded(min: T, max: T) -> Self {
        Self {
            min,
            max,
            observations: 0,
        }
    }

    /// Fold a value into the range.
    pub fn observe(&mut self, value: T) {
        if self.observations == 0 {
            self.min = value;
            self.max = value;
        } else {
            if value < self.min {
                self.min = value;
            }
            if value > self.max {
                self.max = value;
            }
        }
        self.observations += 1;
    }

    /// Observed range, or `None` when nothing was observed.
    pub fn bounds(&self) -> Option<Bounds<T>> {
        (self.observations > 0).then_some(Bounds {
            min: self.min,
            max: self.max,
        })
    }

    /// Number of values folded into the range.
    pub const fn observations(&self) -> u64 {
        self.observations
    }
}

/// Validity aggregates for nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeValidity {
    lat: RangeTracker<f64>,
    lon: RangeTracker<f64>,
    timestamp: RangeTracker<NaiveDateTime>,
}

impl NodeValidity {
    fn seeded(now: NaiveDateTime) -> Self {
        Self {
            lat: RangeTracker::seeded(LATITUDE_SEED.0, LATITUDE_SEED.1),
            lon: RangeTracker::seeded(LONGITUDE_SEED.0, LONGITUDE_SEED.1),
            timestamp: RangeTracker::seeded(now, DateTime::<Utc>::UNIX_EPOCH.naive_utc()),
        }
    }

    fn report(&self) -> NodeValidityReport {
        NodeValidityReport {
            lat: self.lat.bounds(),
            lon: self.lon.bounds(),
            timestamp: self.timestamp.bounds(),
        }
    }
}

/// Validity aggregates for ways.
#[derive(Debug, Clone, PartialEq)]
pub struct WayValidity {
    timestamp: RangeTracker<NaiveDateTime>,
}

impl WayValidity {
    fn seeded(now: NaiveDateTime) -> Self {
        Self {
            timestamp: RangeTracker::seeded(now, DateTime::<Utc>::UNIX_EPOCH.naive_utc()),
        }
    }
}

/// Validity aggregates for tags of one entity class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagValidity {
    /// Postcodes that failed [`check_postcode`], by raw value.
    pub postcode: BTreeSet<String>,
    /// Unexpected name suffixes mapped to the names carrying them. Only
    /// populated for way tags.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub name_en: BTreeMap<String, BTreeSet<String>>,
}

impl TagValidity {
    fn check_postcode(&mut self, tag: &Tag) {
        if !tag.has_key(POSTCODE_KEY) {
            return;
        }
        let postcode = tag.value.as_deref().unwrap_or_default();
        if !check_postcode(postcode) {
            debug!("unexpected postcode {postcode:?}");
            self.postcode.insert(postcode.to_owned());
        }
    }

    fn check_name_suffix(&mut self, tag: &Tag) {
        if !tag.has_key(NAME_EN_KEY) {
            return;
        }
        let name = tag.value.as_deref().unwrap_or_default();
        let Some(suffix) = name_suffix(name) else {
            return;
        };
        if !EXPECTED_SUFFIXES.contains(&suffix) {
            debug!("unexpected street suffix {suffix:?} in {name:?}");
            self.name_en
                .entry(suffix.to_owned())
                .or_default()
                .insert(name.to_owned());
        }
    }
}

/// Final whitespace-delimited token of a name, punctuation included.
///
/// # Examples
/// ```
/// use wrangle_core::name_suffix;
///
/// assert_eq!(name_suffix("Dongzhimen Outer St."), Some("St."));
/// assert_eq!(name_suffix("   "), None);
/// ```
#[must_use]
pub fn name_suffix(name: &str) -> Option<&str> {
    name.split_whitespace().next_back()
}

/// Reported ranges for nodes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodeValidityReport {
    /// Latitude range.
    pub lat: Option<Bounds<f64>>,
    /// Longitude range.
    pub lon: Option<Bounds<f64>>,
    /// Timestamp range.
    pub timestamp: Option<Bounds<NaiveDateTime>>,
}

/// Reported ranges for ways.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WayValidityReport {
    /// Timestamp range.
    pub timestamp: Option<Bounds<NaiveDateTime>>,
}

/// Validity section of the audit report. A class that never appeared in the
/// document is `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldValidity {
    /// Node ranges.
    pub node: Option<NodeValidityReport>,
    /// Node tag anomalies.
    pub node_tags: Option<TagValidity>,
    /// Way ranges.
    pub way: Option<WayValidityReport>,
    /// Way tag anomalies.
    pub way_tags: Option<TagValidity>,
}

/// Accumulates validity aggregates across one pass over a document.
#[derive(Debug, Clone)]
pub struct ValidityTracker {
    seed_time: NaiveDateTime,
    node: Option<NodeValidity>,
    way: Option<WayValidity>,
    node_tags: Option<TagValidity>,
    way_tags: Option<TagValidity>,
}

impl Default for ValidityTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidityTracker {
    /// Create a tracker whose timestamp ranges are seeded with the current
    /// time.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed_time(Utc::now().naive_utc())
    }

    /// Create a tracker with an explicit upper sentinel for timestamp ranges.
    #[must_use]
    pub const fn with_seed_time(seed_time: NaiveDateTime) -> Self {
        Self {
            seed_time,
            node: None,
            way: None,
            node_tags: None,
            way_tags: None,
        }
    }

    /// Fold a node's coordinates and timestamp into the node ranges.
    pub fn observe_node(&mut self, node: &Node) {
        let seed_time = self.seed_time;
        let validity = self
            .node
            .get_or_insert_with(|| NodeValidity::seeded(seed_time));
        if let Some(lat) = node.lat.as_deref().and_then(parse_coordinate) {
            validity.lat.observe(lat);
        }
        if let Some(lon) = node.lon.as_deref().and_then(parse_coordinate) {
            validity.lon.observe(lon);
        }
        if let Some(timestamp) = node.attributes.timestamp.as_deref().and_then(parse_timestamp) {
            validity.timestamp.observe(timestamp);
        }
    }

    /// Fold a way's timestamp into the way range.
    pub fn observe_way(&mut self, way: &Way) {
        let seed_time = self.seed_time;
        let validity = self
            .way
            .get_or_insert_with(|| WayValidity::seeded(seed_time));
        if let Some(timestamp) = way.attributes.timestamp.as_deref().and_then(parse_timestamp) {
            validity.timestamp.observe(timestamp);
        }
    }

    /// Run the postcode check on a node tag.
    pub fn observe_node_tag(&mut self, tag: &Tag) {
        self.node_tags
            .get_or_insert_with(TagValidity::default)
            .check_postcode(tag);
    }

    /// Run the name-suffix and postcode checks on a way tag.
    pub fn observe_way_tag(&mut self, tag: &Tag) {
        let validity = self.way_tags.get_or_insert_with(TagValidity::default);
        validity.check_name_suffix(tag);
        validity.check_postcode(tag);
    }

    /// Snapshot the aggregates as a report.
    #[must_use]
    pub fn report(&self) -> FieldValidity {
        FieldValidity {
            node: self.node.as_ref().map(NodeValidity::report),
            node_tags: self.node_tags.clone(),
            way: self.way.as_ref().map(|way| WayValidityReport {
                timestamp: way.timestamp.bounds(),
            }),
            way_tags: self.way_tags.clone(),
        }
    }
}

fn parse_coordinate(raw: &str) -> Option<f64> {
    parse_float(raw).filter(|value| value.is_finite())
}
