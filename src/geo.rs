//! Vehicle location lookup and map links

use crate::core::{Coordinates, normalize_plate};
use crate::facade::Ledger;
use rand::Rng;

/// Rectangular area of the campus lot, in degrees.
#[derive(Debug, Clone, Copy)]
pub struct Zone {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl Zone {
    pub fn contains(&self, point: Coordinates) -> bool {
        (self.lat_min..=self.lat_max).contains(&point.lat)
            && (self.lon_min..=self.lon_max).contains(&point.lon)
    }
}

pub const CAMPUS_ZONES: [Zone; 3] = [
    Zone {
        lat_min: 6.2318,
        lat_max: 6.2323,
        lon_min: -75.6108,
        lon_max: -75.6098,
    },
    Zone {
        lat_min: 6.2302,
        lat_max: 6.2310,
        lon_min: -75.6118,
        lon_max: -75.6108,
    },
    Zone {
        lat_min: 6.2310,
        lat_max: 6.2318,
        lon_min: -75.6120,
        lon_max: -75.6110,
    },
];

/// Zoom level used for generated map links.
pub const MAP_ZOOM: u8 = 18;

/// A uniformly random point inside one of the campus zones.
pub fn random_campus_location<R: Rng>(rng: &mut R) -> Coordinates {
    let zone = &CAMPUS_ZONES[rng.gen_range(0..CAMPUS_ZONES.len())];
    Coordinates::new(
        rng.gen_range(zone.lat_min..zone.lat_max),
        rng.gen_range(zone.lon_min..zone.lon_max),
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationSource {
    /// The vehicle is parked right now.
    Parked,
    /// Taken from the most recent completed visit.
    LastKnown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found {
        plate: String,
        coordinates: Coordinates,
        source: LocationSource,
    },
    /// Parked, but checked in without coordinates.
    NoCoordinates,
    NotFound,
}

/// Where is `plate`? A parked vehicle answers for itself; otherwise the
/// latest visit with that plate is used.
pub fn locate(ledger: &Ledger, plate: &str) -> Lookup {
    let plate = normalize_plate(plate);
    if let Some(vehicle) = ledger.find_active(&plate) {
        return match vehicle.location() {
            Some(coordinates) => Lookup::Found {
                plate,
                coordinates,
                source: LocationSource::Parked,
            },
            None => Lookup::NoCoordinates,
        };
    }

    ledger
        .history()
        .iter()
        .rev()
        .find(|r| r.plate == plate)
        .and_then(|r| r.location())
        .map(|coordinates| Lookup::Found {
            plate,
            coordinates,
            source: LocationSource::LastKnown,
        })
        .unwrap_or(Lookup::NotFound)
}

pub fn map_link(coordinates: Coordinates) -> String {
    format!(
        "https://www.openstreetmap.org/?mlat={lat:.6}&mlon={lon:.6}#map={zoom}/{lat:.6}/{lon:.6}",
        lat = coordinates.lat,
        lon = coordinates.lon,
        zoom = MAP_ZOOM
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;
    use crate::core::{ManualClock, parse_timestamp};
    use crate::storage::DurabilityMode;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn ledger() -> Ledger {
        let config = LedgerConfig::new().durability(DurabilityMode::None);
        let clock = ManualClock::new(parse_timestamp("2025-08-01 12:00:00").unwrap());
        Ledger::open_with_clock(config, clock).unwrap()
    }

    #[test]
    fn test_random_location_stays_on_campus() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let point = random_campus_location(&mut rng);
            assert!(CAMPUS_ZONES.iter().any(|zone| zone.contains(point)));
        }
    }

    #[test]
    fn test_locate_parked_and_last_known() {
        let mut ledger = ledger();
        let here = Coordinates::new(6.2320, -75.6100);
        ledger
            .check_in(ledger.new_vehicle("geo1", "car").with_location(here))
            .unwrap();

        assert_eq!(
            locate(&ledger, "GEO1"),
            Lookup::Found {
                plate: "GEO1".to_string(),
                coordinates: here,
                source: LocationSource::Parked
            }
        );

        ledger.check_out("geo1").unwrap();
        assert!(matches!(
            locate(&ledger, "geo1"),
            Lookup::Found { source: LocationSource::LastKnown, .. }
        ));
        assert_eq!(locate(&ledger, "NONE99"), Lookup::NotFound);
    }

    #[test]
    fn test_parked_without_coordinates() {
        let mut ledger = ledger();
        ledger.check_in(ledger.new_vehicle("BARE1", "moto")).unwrap();
        assert_eq!(locate(&ledger, "bare1"), Lookup::NoCoordinates);
    }

    #[test]
    fn test_map_link() {
        let link = map_link(Coordinates::new(6.23, -75.61));
        assert_eq!(
            link,
            "https://www.openstreetmap.org/?mlat=6.230000&mlon=-75.610000#map=18/6.230000/-75.610000"
        );
    }
}
