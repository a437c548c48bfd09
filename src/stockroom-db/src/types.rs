//! Persisted entities and query payloads for the inventory store.
//!
//! These types are plain data; all behavior that touches the store lives
//! behind the repository traits.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use stockroom::{HistoryEvent, RawPart};

/// Physical package descriptor shared by many part types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Footprint {
    pub id: i64,
    pub name: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub pins: i64,
    /// Connected plus unconnected holes to the PCB.
    pub holes: Option<i64>,
    /// Formatting template with `%d` replaced by the pin count.
    pub kicad: Option<String>,
}

/// Payload for creating a footprint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewFootprint {
    pub name: String,
    pub pins: i64,
    pub holes: Option<i64>,
    pub kicad: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
}

/// Catalog entry for one reusable kind of component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartType {
    pub id: i64,
    pub name: String,
    pub summary: String,
    pub description: String,
    pub manufacturer: String,
    pub footprint_id: i64,
    pub datasheet: Option<String>,
}

/// Payload for creating a part type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPartType {
    pub name: String,
    pub summary: String,
    pub description: String,
    pub manufacturer: String,
    pub footprint_id: i64,
    pub datasheet: Option<String>,
}

/// Update payload for part types; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartTypeUpdate {
    pub name: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    pub datasheet: Option<String>,
}

/// Vendor/supplier of parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: i64,
    pub name: String,
    pub shortname: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    /// Default VAT in percent, `None` when included in prices.
    pub vat: Option<f64>,
    pub home: Option<String>,
    /// Template with `%s` replaced by the vendor SKU for a direct link.
    pub url: Option<String>,
    /// Reference to a price-lookup facility.
    pub prices: Option<String>,
    /// Shipments pass through customs.
    pub customs: bool,
}

/// Payload for creating a source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSource {
    pub name: String,
    pub shortname: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub vat: Option<f64>,
    pub home: Option<String>,
    pub url: Option<String>,
    pub prices: Option<String>,
    pub customs: bool,
}

/// Vendor link for a part type: where it can be bought and under which SKU.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartSource {
    pub id: i64,
    pub part_type_id: i64,
    pub source_id: i64,
    pub sku: String,
}

/// One historical price point attached to a [`PartSource`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Price {
    pub id: i64,
    pub part_source_id: i64,
    pub time: DateTime<Utc>,
    /// Quantity break the price applies from.
    pub amount: i64,
    pub price: f64,
    /// VAT in percent, `None` when included.
    pub vat: Option<f64>,
    pub currency: Option<String>,
}

/// Payload for recording a price point.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPrice {
    pub part_source_id: i64,
    pub amount: i64,
    pub price: f64,
    pub vat: Option<f64>,
    pub currency: Option<String>,
}

/// Storage place referenced by history events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub summary: Option<String>,
    pub description: Option<String>,
}

/// A pile: a fungible quantity of one part type from one source/date/price
/// lot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub id: i64,
    pub part_type_id: i64,
    pub source_id: Option<i64>,
    pub count: i64,
    pub date: Option<NaiveDate>,
    pub price: Option<f64>,
    pub vat: Option<f64>,
    pub assignment_id: Option<i64>,
    pub history_id: Option<i64>,
    pub soldered: bool,
    pub usable: bool,
}

impl Part {
    /// Derived status of the pile; never stored.
    pub fn status(&self) -> PileStatus {
        if !self.usable {
            PileStatus::Destroyed
        } else if self.soldered {
            PileStatus::Soldered
        } else if self.assignment_id.is_some() {
            PileStatus::Assigned
        } else {
            PileStatus::Free
        }
    }
}

/// Payload for creating a pile at intake.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPart {
    pub part_type_id: i64,
    pub source_id: Option<i64>,
    pub count: i64,
    pub date: Option<NaiveDate>,
    pub price: Option<f64>,
    pub vat: Option<f64>,
}

/// Derived lifecycle state of a pile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PileStatus {
    Free,
    Assigned,
    Soldered,
    Destroyed,
}

impl std::fmt::Display for PileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Assigned => write!(f, "assigned"),
            Self::Soldered => write!(f, "soldered"),
            Self::Destroyed => write!(f, "destroyed"),
        }
    }
}

/// One audit record in a backward-linked chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    pub id: i64,
    /// Previous head of the chain; `None` at the origin.
    pub parent_id: Option<i64>,
    pub time: DateTime<Utc>,
    pub event: HistoryEvent,
    pub description: Option<String>,
    pub location_id: Option<i64>,
}

/// Payload for appending a history event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHistory {
    pub event: HistoryEvent,
    pub description: Option<String>,
    pub location_id: Option<i64>,
}

impl NewHistory {
    pub fn event(event: HistoryEvent) -> Self {
        Self {
            event,
            description: None,
            location_id: None,
        }
    }
}

/// A build project grouping built items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub summary: String,
    pub description: String,
    pub started: Option<NaiveDate>,
}

/// One concrete built unit of a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub project_id: i64,
    pub serial: String,
    /// Built as a kit rather than an assembled version.
    pub kit: bool,
    pub description: Option<String>,
    pub history_id: Option<i64>,
}

/// A request for `count` units of a part type against one item, satisfied
/// incrementally by linked piles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: i64,
    pub part_type_id: i64,
    pub item_id: i64,
    pub count: i64,
}

/// Normalized search token, optionally an alias for a canonical term.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Term {
    pub id: i64,
    pub term: String,
    pub alias_for_id: Option<i64>,
}

/// Filter for part-type listings; every field narrows by substring.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PartTypeFilter {
    pub name: Option<String>,
    pub manufacturer: Option<String>,
    pub footprint: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Filter for pile listings.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PartFilter {
    pub part_type_id: Option<i64>,
    pub assignment_id: Option<i64>,
    /// When set, only piles with this usability flag.
    pub usable: Option<bool>,
    /// When set, only free piles (no assignment, not soldered, usable).
    pub free: bool,
}

/// Input to the candidate matcher: a loosely structured part description.
///
/// Each present field produces one independent candidate filter; the result
/// is the intersection of all produced filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchQuery {
    pub search_name: Option<String>,
    pub sku: Option<String>,
    pub manufacturer: Option<String>,
    pub footprint: Option<String>,
    pub source: Option<i64>,
    pub item: Option<i64>,
    pub project: Option<i64>,
    /// Let part types with a blank manufacturer pass the manufacturer
    /// filter.
    pub allow_blank_manufacturer: bool,
}

impl Default for MatchQuery {
    fn default() -> Self {
        Self {
            search_name: None,
            sku: None,
            manufacturer: None,
            footprint: None,
            source: None,
            item: None,
            project: None,
            allow_blank_manufacturer: true,
        }
    }
}

impl MatchQuery {
    /// Build the matcher input for an intake line.
    pub fn from_raw(raw: &RawPart) -> Self {
        fn opt(s: &str) -> Option<String> {
            if s.trim().is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        }
        Self {
            search_name: opt(&raw.search_name),
            sku: opt(&raw.sku),
            manufacturer: opt(&raw.manufacturer),
            footprint: opt(&raw.footprint),
            source: raw.source,
            ..Default::default()
        }
    }
}

/// Database statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DbStats {
    pub footprint_count: i64,
    pub part_type_count: i64,
    pub source_count: i64,
    pub part_count: i64,
    pub project_count: i64,
    pub item_count: i64,
    pub assignment_count: i64,
    pub term_count: i64,
    pub history_count: i64,
}

/// Pick the applicable price for a requested quantity from a price history:
/// breaks with `amount <= quantity` qualify, the most recent wins, a lower
/// unit price breaks ties.
pub fn pick_price(prices: impl IntoIterator<Item = Price>, quantity: i64) -> Option<Price> {
    prices
        .into_iter()
        .filter(|p| p.amount <= quantity)
        .max_by(|a, b| {
            a.time.cmp(&b.time).then_with(|| {
                b.price
                    .partial_cmp(&a.price)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn price(amount: i64, unit: f64, day: u32) -> Price {
        Price {
            id: 0,
            part_source_id: 1,
            time: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
            amount,
            price: unit,
            vat: None,
            currency: Some("EUR".into()),
        }
    }

    #[test]
    fn test_pick_price_respects_quantity_break() {
        let prices = vec![price(1, 0.10, 1), price(100, 0.04, 1)];
        let best = pick_price(prices, 10).unwrap();
        assert_eq!(best.amount, 1);
    }

    #[test]
    fn test_pick_price_prefers_recent() {
        let prices = vec![price(1, 0.08, 1), price(1, 0.12, 5)];
        let best = pick_price(prices, 1).unwrap();
        assert_eq!(best.price, 0.12);
    }

    #[test]
    fn test_pick_price_tie_takes_cheaper() {
        let prices = vec![price(1, 0.08, 2), price(1, 0.05, 2)];
        let best = pick_price(prices, 50).unwrap();
        assert_eq!(best.price, 0.05);
    }

    #[test]
    fn test_pick_price_empty() {
        assert!(pick_price(Vec::new(), 10).is_none());
        // no applicable break for a tiny quantity
        assert!(pick_price(vec![price(100, 0.04, 1)], 10).is_none());
    }

    #[test]
    fn test_pile_status_derivation() {
        let mut part = Part {
            id: 1,
            part_type_id: 1,
            source_id: None,
            count: 5,
            date: None,
            price: None,
            vat: None,
            assignment_id: None,
            history_id: None,
            soldered: false,
            usable: true,
        };
        assert_eq!(part.status(), PileStatus::Free);
        part.assignment_id = Some(3);
        assert_eq!(part.status(), PileStatus::Assigned);
        part.soldered = true;
        assert_eq!(part.status(), PileStatus::Soldered);
        part.usable = false;
        assert_eq!(part.status(), PileStatus::Destroyed);
    }

    #[test]
    fn test_match_query_from_raw_skips_blank_fields() {
        let raw = RawPart {
            search_name: "10k resistor".into(),
            manufacturer: "  ".into(),
            sku: "YAG-10K".into(),
            source: Some(2),
            ..Default::default()
        };
        let query = MatchQuery::from_raw(&raw);
        assert_eq!(query.search_name.as_deref(), Some("10k resistor"));
        assert!(query.manufacturer.is_none());
        assert_eq!(query.sku.as_deref(), Some("YAG-10K"));
        assert_eq!(query.source, Some(2));
        assert!(query.allow_blank_manufacturer);
    }
}
