// Structural parsing of the provider's schema-loose flight-offer document
// into the internal ticket model.
//
// The document is walked as an untyped tree and fields are extracted
// defensively rather than bound to a rigid schema. A malformed offer is
// dropped; its siblings are kept.

use chrono::NaiveDateTime;
use serde_json::Value;
use tracing::{debug, warn};

use crate::duration::format_iso_duration;
use crate::model::{FlightOffer, FlightSegment, SearchCriteria};

// The provider does not guarantee baggage or cabin fields.
const DEFAULT_BAGGAGE: &str = "1 checked bag";
const DEFAULT_TRAVEL_CLASS: &str = "Economy";

/// Maps a raw provider response body into internal offers. Invalid JSON or a
/// missing `data` array yields an empty list; per-offer failures degrade
/// per-offer.
pub fn normalize_offers(body: &str, criteria: &SearchCriteria) -> Vec<FlightOffer> {
    let document: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "provider response is not valid JSON");
            return Vec::new();
        }
    };

    let Some(data) = document.get("data").and_then(Value::as_array) else {
        warn!("provider response carries no data array");
        return Vec::new();
    };

    let offers: Vec<FlightOffer> = data
        .iter()
        .filter_map(|offer| normalize_offer(offer, criteria))
        .collect();

    debug!(
        received = data.len(),
        kept = offers.len(),
        "normalized provider offers"
    );
    offers
}

fn normalize_offer(offer: &Value, criteria: &SearchCriteria) -> Option<FlightOffer> {
    let id = offer.get("id").and_then(Value::as_str)?.to_string();
    let cost = extract_price(offer);

    let itineraries = offer.get("itineraries").and_then(Value::as_array)?;
    let outbound = itineraries.first()?;
    let raw_segments = outbound.get("segments").and_then(Value::as_array)?;
    let first = raw_segments.first()?;
    let last = raw_segments.last()?;

    // Multi-segment itineraries flatten to a single door-to-door leg.
    let origin = airport_code(first.get("departure")?)?;
    let destination = airport_code(last.get("arrival")?)?;
    let departure_time = leg_time(first.get("departure")?)?;
    let arrival_time = leg_time(last.get("arrival")?)?;
    let airline = first.get("carrierCode").and_then(Value::as_str)?.to_string();
    let stops = (raw_segments.len() - 1) as u32;
    let duration = first
        .get("duration")
        .and_then(Value::as_str)
        .map(format_iso_duration)
        .unwrap_or_default();

    let segments = raw_segments
        .iter()
        .map(normalize_segment)
        .collect::<Option<Vec<_>>>()?;

    // The return leg is only attempted for round-trip searches. A round-trip
    // request answered with a single itinerary is a known provider quirk; the
    // offer is still emitted one-way shaped.
    let mut return_departure_time = None;
    let mut return_arrival_time = None;
    let mut return_segments = Vec::new();
    if criteria.round_trip {
        if let Some(inbound) = itineraries.get(1) {
            let (departure, arrival, segments) = normalize_return_leg(inbound)?;
            return_departure_time = Some(departure);
            return_arrival_time = Some(arrival);
            return_segments = segments;
        }
    }

    Some(FlightOffer {
        id,
        origin,
        destination,
        departure_time,
        arrival_time,
        return_departure_time,
        return_arrival_time,
        airline,
        cost,
        stops,
        round_trip: criteria.round_trip,
        duration,
        baggage: extract_baggage(offer).unwrap_or_else(|| DEFAULT_BAGGAGE.to_string()),
        travel_class: extract_travel_class(offer)
            .unwrap_or_else(|| DEFAULT_TRAVEL_CLASS.to_string()),
        segments,
        return_segments,
    })
}

fn normalize_return_leg(
    itinerary: &Value,
) -> Option<(NaiveDateTime, NaiveDateTime, Vec<FlightSegment>)> {
    let raw_segments = itinerary.get("segments").and_then(Value::as_array)?;
    let first = raw_segments.first()?;
    let last = raw_segments.last()?;
    let departure = leg_time(first.get("departure")?)?;
    let arrival = leg_time(last.get("arrival")?)?;
    let segments = raw_segments
        .iter()
        .map(normalize_segment)
        .collect::<Option<Vec<_>>>()?;
    Some((departure, arrival, segments))
}

fn normalize_segment(segment: &Value) -> Option<FlightSegment> {
    let departure = segment.get("departure")?;
    let arrival = segment.get("arrival")?;
    Some(FlightSegment {
        departure_airport: airport_code(departure)?,
        arrival_airport: airport_code(arrival)?,
        departure_time: leg_time(departure)?,
        arrival_time: leg_time(arrival)?,
        airline: segment.get("carrierCode").and_then(Value::as_str)?.to_string(),
        flight_number: optional_text(segment, "number"),
        duration: segment
            .get("duration")
            .and_then(Value::as_str)
            .map(format_iso_duration),
        aircraft: segment
            .get("aircraft")
            .and_then(|aircraft| aircraft.get("code"))
            .and_then(Value::as_str)
            .map(str::to_string),
        terminal: optional_text(departure, "terminal"),
        gate: optional_text(departure, "gate"),
    })
}

/// Price comes from `price.total` when present, otherwise from the first
/// `pricingOptions` entry. Neither existing leaves the cost unset.
fn extract_price(offer: &Value) -> Option<f64> {
    let direct = offer.get("price").and_then(|price| price.get("total"));
    let fallback = offer
        .get("pricingOptions")
        .and_then(Value::as_array)
        .and_then(|options| options.first())
        .and_then(|option| option.get("price"))
        .and_then(|price| price.get("total"));

    direct
        .or(fallback)
        .and_then(parse_money)
        .filter(|amount| *amount >= 0.0)
}

fn parse_money(value: &Value) -> Option<f64> {
    match value {
        Value::String(text) => text.parse().ok(),
        Value::Number(number) => number.as_f64(),
        _ => None,
    }
}

fn extract_travel_class(offer: &Value) -> Option<String> {
    let cabin = offer
        .get("travelerPricings")
        .and_then(Value::as_array)?
        .first()?
        .get("fareDetailsBySegment")
        .and_then(Value::as_array)?
        .first()?
        .get("cabin")
        .and_then(Value::as_str)?;
    Some(title_case(cabin))
}

fn extract_baggage(offer: &Value) -> Option<String> {
    let quantity = offer
        .get("travelerPricings")
        .and_then(Value::as_array)?
        .first()?
        .get("fareDetailsBySegment")
        .and_then(Value::as_array)?
        .first()?
        .get("includedCheckedBags")
        .and_then(|bags| bags.get("quantity"))
        .and_then(Value::as_u64)?;
    match quantity {
        1 => Some("1 checked bag".to_string()),
        n => Some(format!("{} checked bags", n)),
    }
}

// Provider cabins arrive upper-cased ("ECONOMY").
fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

fn airport_code(endpoint: &Value) -> Option<String> {
    endpoint
        .get("iataCode")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn leg_time(endpoint: &Value) -> Option<NaiveDateTime> {
    endpoint
        .get("at")
        .and_then(Value::as_str)
        .and_then(parse_provider_time)
}

/// Provider timestamps occasionally carry a trailing zone marker. It is
/// stripped, not converted: downstream consumers expect zone-less local
/// times.
fn parse_provider_time(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

fn optional_text(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}
