// Data structures for the internal ticket model and pagination.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Search parameters supplied by the calling layer, already validated there
/// (non-blank airports, present or future departure date, page >= 0,
/// 1 <= size <= 100).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SearchCriteria {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub round_trip: bool,
    pub passengers: u32,
    pub page: usize,
    pub size: usize,
}

/// One priced itinerary, either normalized from the provider or synthesized
/// locally. Return fields are populated iff the offer is round-trip shaped.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FlightOffer {
    pub id: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: NaiveDateTime,
    pub arrival_time: NaiveDateTime,
    pub return_departure_time: Option<NaiveDateTime>,
    pub return_arrival_time: Option<NaiveDateTime>,
    pub airline: String,
    /// None when the provider exposes no price for the offer.
    pub cost: Option<f64>,
    pub stops: u32,
    pub round_trip: bool,
    /// Human-readable, e.g. "5h 7m".
    pub duration: String,
    pub baggage: String,
    pub travel_class: String,
    pub segments: Vec<FlightSegment>,
    pub return_segments: Vec<FlightSegment>,
}

/// A single flight leg between two airports. Upstream data is inconsistently
/// populated, so everything beyond airports, times and carrier is optional.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FlightSegment {
    pub departure_airport: String,
    pub arrival_airport: String,
    pub departure_time: NaiveDateTime,
    pub arrival_time: NaiveDateTime,
    pub airline: String,
    pub flight_number: Option<String>,
    pub duration: Option<String>,
    pub aircraft: Option<String>,
    pub terminal: Option<String>,
    pub gate: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PaginationMetadata {
    pub page: usize,
    pub size: usize,
    pub total_elements: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PaginationMetadata {
    /// Computes metadata from the true total. An out-of-range page still gets
    /// consistent numbers: `total_pages = ceil(total / size)`.
    pub fn compute(total_elements: usize, page: usize, size: usize) -> Self {
        let size = size.max(1);
        let total_pages = (total_elements + size - 1) / size;
        Self {
            page,
            size,
            total_elements,
            total_pages,
            has_next: page + 1 < total_pages,
            has_previous: page > 0,
        }
    }
}

/// The slice of offers for one requested page plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub metadata: PaginationMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0, 0, 5, 0, false, false; "empty total")]
    #[test_case(12, 0, 5, 3, true, false; "first of three pages")]
    #[test_case(12, 1, 5, 3, true, true; "middle page")]
    #[test_case(12, 2, 5, 3, false, true; "last page")]
    #[test_case(10, 0, 5, 2, true, false; "exact multiple")]
    #[test_case(1, 0, 100, 1, false, false; "single element")]
    #[test_case(7, 9, 3, 3, false, true; "page far out of range")]
    fn pagination_metadata_invariants(
        total: usize,
        page: usize,
        size: usize,
        expected_pages: usize,
        expected_next: bool,
        expected_previous: bool,
    ) {
        let metadata = PaginationMetadata::compute(total, page, size);
        assert_eq!(metadata.total_pages, expected_pages);
        assert_eq!(metadata.has_next, expected_next);
        assert_eq!(metadata.has_previous, expected_previous);
        assert_eq!(metadata.total_elements, total);
    }

    #[test]
    fn zero_size_is_clamped_before_division() {
        let metadata = PaginationMetadata::compute(10, 0, 0);
        assert_eq!(metadata.size, 1);
        assert_eq!(metadata.total_pages, 10);
    }

    #[test]
    fn criteria_deserializes_from_json() {
        let json = r#"
            {
                "origin": "JFK",
                "destination": "LAX",
                "departure_date": "2026-09-01",
                "return_date": null,
                "round_trip": false,
                "passengers": 1,
                "page": 0,
                "size": 20
            }
        "#;
        let criteria: SearchCriteria = serde_json::from_str(json).expect("valid criteria");
        assert_eq!(criteria.origin, "JFK");
        assert!(criteria.return_date.is_none());
    }
}
