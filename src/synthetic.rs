// Fallback offer generation for when the provider is unavailable or empty.

use chrono::{Duration, NaiveDateTime, NaiveTime};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::duration::format_hours_minutes;
use crate::model::{FlightOffer, FlightSegment, SearchCriteria};

// Fixed carrier set, name and code.
const AIRLINES: [(&str, &str); 5] = [
    ("Delta", "DL"),
    ("American Airlines", "AA"),
    ("United", "UA"),
    ("Southwest", "WN"),
    ("JetBlue", "B6"),
];

const AIRCRAFT: [&str; 5] = [
    "Boeing 737-800",
    "Airbus A320",
    "Boeing 787-9",
    "Airbus A321neo",
    "Embraer E175",
];

const TERMINALS: [&str; 4] = ["1", "2", "A", "B"];
const GATE_CONCOURSES: [char; 4] = ['A', 'B', 'C', 'D'];

/// Produces randomized but internally consistent offers matching the
/// requested route, dates and trip shape. Output is structurally
/// indistinguishable from normalized live offers.
///
/// The random source is injectable so a fixed seed reproduces the exact
/// same offers in tests.
pub struct SyntheticOfferGenerator {
    rng: Mutex<StdRng>,
}

impl SyntheticOfferGenerator {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Generates between 5 and 10 offers for the given criteria.
    pub fn generate(&self, criteria: &SearchCriteria) -> Vec<FlightOffer> {
        let mut rng = self.rng.lock();
        let count = rng.gen_range(5..=10);
        let offers = (0..count)
            .map(|index| build_offer(&mut rng, criteria, index))
            .collect::<Vec<_>>();
        debug!(count = offers.len(), "generated synthetic offers");
        offers
    }
}

impl Default for SyntheticOfferGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn build_offer(rng: &mut StdRng, criteria: &SearchCriteria, index: usize) -> FlightOffer {
    let (airline, carrier_code) = AIRLINES[rng.gen_range(0..AIRLINES.len())];

    let departure_time = criteria.departure_date.and_time(random_clock_time(rng));
    let hours = rng.gen_range(1..=6u32);
    let minutes = rng.gen_range(0..60u32);
    let flight_duration = Duration::hours(hours as i64) + Duration::minutes(minutes as i64);
    let arrival_time = departure_time + flight_duration;

    let cost = rng.gen_range(100..800) as f64;
    let stops = rng.gen_range(0..2u32);

    let outbound_segment = build_segment(
        rng,
        &criteria.origin,
        &criteria.destination,
        departure_time,
        arrival_time,
        airline,
        carrier_code,
        hours,
        minutes,
    );

    let mut offer = FlightOffer {
        id: format!("SYN-{}-{:04}", index + 1, rng.gen_range(0..10_000u32)),
        origin: criteria.origin.clone(),
        destination: criteria.destination.clone(),
        departure_time,
        arrival_time,
        return_departure_time: None,
        return_arrival_time: None,
        airline: airline.to_string(),
        cost: Some(cost),
        stops,
        round_trip: criteria.round_trip,
        duration: format_hours_minutes(hours, minutes),
        baggage: "1 checked bag".to_string(),
        travel_class: "Economy".to_string(),
        segments: vec![outbound_segment],
        return_segments: Vec::new(),
    };

    if criteria.round_trip {
        if let Some(return_date) = criteria.return_date {
            let return_departure = return_date.and_time(random_clock_time(rng));
            // The return leg reuses the outbound flight duration.
            let return_arrival = return_departure + flight_duration;
            offer.return_departure_time = Some(return_departure);
            offer.return_arrival_time = Some(return_arrival);
            offer.return_segments = vec![build_segment(
                rng,
                &criteria.destination,
                &criteria.origin,
                return_departure,
                return_arrival,
                airline,
                carrier_code,
                hours,
                minutes,
            )];
        }
    }

    offer
}

#[allow(clippy::too_many_arguments)]
fn build_segment(
    rng: &mut StdRng,
    from: &str,
    to: &str,
    departure_time: NaiveDateTime,
    arrival_time: NaiveDateTime,
    airline: &str,
    carrier_code: &str,
    hours: u32,
    minutes: u32,
) -> FlightSegment {
    FlightSegment {
        departure_airport: from.to_string(),
        arrival_airport: to.to_string(),
        departure_time,
        arrival_time,
        airline: airline.to_string(),
        flight_number: Some(format!("{}{}", carrier_code, rng.gen_range(100..10_000u32))),
        duration: Some(format_hours_minutes(hours, minutes)),
        aircraft: Some(AIRCRAFT[rng.gen_range(0..AIRCRAFT.len())].to_string()),
        terminal: Some(TERMINALS[rng.gen_range(0..TERMINALS.len())].to_string()),
        gate: Some(format!(
            "{}{}",
            GATE_CONCOURSES[rng.gen_range(0..GATE_CONCOURSES.len())],
            rng.gen_range(1..40u32)
        )),
    }
}

// Clock times run 06:00 through 21:45 at 15-minute granularity.
fn random_clock_time(rng: &mut StdRng) -> NaiveTime {
    let hour = 6 + rng.gen_range(0..16u32);
    let minute = 15 * rng.gen_range(0..4u32);
    NaiveTime::from_hms_opt(hour, minute, 0).expect("clock time within valid range")
}
