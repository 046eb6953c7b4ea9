use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A geographic query point. The full set of locations is the query plan for
/// one harvest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(alias = "city")]
    pub name: String,
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lon")]
    pub longitude: f64,
}

impl Location {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }

    /// Builds the query issued for this location on `as_of_date`.
    pub fn query(&self, as_of_date: NaiveDate) -> RawQuery {
        RawQuery {
            latitude: self.latitude,
            longitude: self.longitude,
            as_of_date,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub as_of_date: NaiveDate,
}

// Roughly 100-mile search circles; neighbours overlap on purpose.
const US_GRID: &[(&str, f64, f64)] = &[
    ("Seattle", 47.6062, -122.3321),
    ("Portland", 45.5152, -122.6784),
    ("San Francisco", 37.7749, -122.4194),
    ("Los Angeles", 34.0522, -118.2437),
    ("San Diego", 32.7157, -117.1611),
    ("Sacramento", 38.5816, -121.4944),
    ("Fresno", 36.7378, -119.7871),
    ("Las Vegas", 36.1699, -115.1398),
    ("Phoenix", 33.4484, -112.0740),
    ("Tucson", 32.2226, -110.9747),
    ("Albuquerque", 35.0844, -106.6504),
    ("Denver", 39.7392, -104.9903),
    ("Salt Lake City", 40.7608, -111.8910),
    ("Boise", 43.6150, -116.2023),
    ("El Paso", 31.7619, -106.4850),
    ("San Antonio", 29.4241, -98.4936),
    ("Austin", 30.2672, -97.7431),
    ("Dallas", 32.7767, -96.7970),
    ("Houston", 29.7604, -95.3698),
    ("Oklahoma City", 35.4676, -97.5164),
    ("Tulsa", 36.1540, -95.9928),
    ("Kansas City", 39.0997, -94.5786),
    ("Omaha", 41.2565, -95.9345),
    ("Minneapolis", 44.9778, -93.2650),
    ("Milwaukee", 43.0389, -87.9065),
    ("Chicago", 41.8781, -87.6298),
    ("St. Louis", 38.6270, -90.1994),
    ("Indianapolis", 39.7684, -86.1581),
    ("Detroit", 42.3314, -83.0458),
    ("Cleveland", 41.4993, -81.6944),
    ("Cincinnati", 39.1031, -84.5120),
    ("Columbus", 39.9612, -82.9988),
    ("Memphis", 35.1495, -90.0490),
    ("Nashville", 36.1627, -86.7816),
    ("Birmingham", 33.5186, -86.8104),
    ("Atlanta", 33.7490, -84.3880),
    ("Jacksonville", 30.3322, -81.6557),
    ("Orlando", 28.5383, -81.3792),
    ("Tampa", 27.9506, -82.4572),
    ("Miami", 25.7617, -80.1918),
    ("New Orleans", 29.9511, -90.0715),
    ("Charlotte", 35.2271, -80.8431),
    ("Raleigh", 35.7796, -78.6382),
    ("Richmond", 37.5407, -77.4360),
    ("Washington DC", 38.9072, -77.0369),
    ("Baltimore", 39.2904, -76.6122),
    ("Philadelphia", 39.9526, -75.1652),
    ("New York", 40.7128, -74.0060),
    ("Newark", 40.7357, -74.1724),
    ("Boston", 42.3601, -71.0589),
    ("Buffalo", 42.8864, -78.8784),
    ("Pittsburgh", 40.4406, -79.9959),
    ("Spokane", 47.6588, -117.4260),
    ("Billings", 45.7833, -108.5007),
    ("Fargo", 46.8772, -96.7898),
    ("Des Moines", 41.5868, -93.6250),
    ("Little Rock", 34.7465, -92.2896),
    ("Jackson", 32.2988, -90.1848),
    ("Louisville", 38.2527, -85.7585),
    ("Charleston", 32.7765, -79.9311),
    ("Columbia", 34.0007, -81.0348),
    ("Providence", 41.8240, -71.4128),
    ("Hartford", 41.7658, -72.6734),
    ("Anchorage", 61.2181, -149.9003),
    ("Honolulu", 21.3099, -157.8581),
];

/// The built-in query plan: a grid of US metro areas.
pub fn default_locations() -> Vec<Location> {
    US_GRID
        .iter()
        .map(|(name, lat, lon)| Location::new(*name, *lat, *lon))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grid_has_unique_coordinates() {
        let locations = default_locations();
        assert_eq!(locations.len(), 65);
        for (i, a) in locations.iter().enumerate() {
            for b in &locations[i + 1..] {
                assert!(
                    a.latitude != b.latitude || a.longitude != b.longitude,
                    "{} and {} share coordinates",
                    a.name,
                    b.name
                );
            }
        }
    }

    #[test]
    fn query_carries_coordinates_and_date() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let query = Location::new("Austin", 30.2672, -97.7431).query(date);
        assert_eq!(query.latitude, 30.2672);
        assert_eq!(query.longitude, -97.7431);
        assert_eq!(query.as_of_date, date);
    }
}
