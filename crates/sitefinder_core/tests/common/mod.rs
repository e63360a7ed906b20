//! Deterministic site fixture shared by integration tests.
//!
//! Expected result sets are computed from the fixture data here, never
//! hardcoded in the tests that use them.

#![allow(dead_code)]

use geo::{HaversineDistance, Intersects, LineString, Point, Polygon};
use rusqlite::Connection;
use sitefinder_core::{
    Address, AttributeCategory, AttributeGroup, Site, SiteRepository, SiteShape,
    SqliteSiteRepository,
};

pub const GRID_SITES: usize = 40;
pub const SECTORS: [&str; 4] = ["Chemicals", "Food", "Metals", "Paper"];

/// Scenario point for toxic-release queries.
pub const TRI_LAT: f64 = 45.0;
pub const TRI_LON: f64 = -96.0;

/// Scenario point east of every playground polygon.
pub const PARK_LAT: f64 = 44.9805;
pub const PARK_LON: f64 = -93.25;
pub const PARK_RADIUS_M: f64 = 5_000.0;

const PARK_SIDE_DEG: f64 = 0.001;

/// South-east of the PG-6 triangle: its hypotenuse is ~963 m away, every
/// vertex more than 1.1 km.
pub const DIAGONAL_LAT: f64 = 45.0;
pub const DIAGONAL_LON: f64 = -92.995;

pub struct Fixture {
    pub sites: Vec<Site>,
}

impl Fixture {
    /// Ids within `radius_m` of the point that satisfy `filter`, sorted.
    pub fn expected_ids(
        &self,
        lat: f64,
        lon: f64,
        radius_m: f64,
        filter: impl Fn(&Site) -> bool,
    ) -> Vec<String> {
        let origin = Point::new(lon, lat);
        let mut ids: Vec<String> = self
            .sites
            .iter()
            .filter(|site| reference_distance(&site.shape, origin) <= radius_m)
            .filter(|site| filter(site))
            .map(|site| site.site_id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn site(&self, site_id: &str) -> &Site {
        self.sites
            .iter()
            .find(|site| site.site_id == site_id)
            .unwrap_or_else(|| panic!("fixture has no site {site_id}"))
    }
}

/// Seeds the grid, two far-away facilities and five playground polygons.
pub fn seed(conn: &Connection) -> Fixture {
    let repo = SqliteSiteRepository::new(conn);
    let mut sites = Vec::new();

    for i in 0..GRID_SITES {
        let lat = 44.0 + (i % 8) as f64 * 0.25;
        let lon = -96.5 + (i / 8) as f64 * 0.5;
        let mut site = Site::new(
            format!("TRI-{i:03}"),
            format!("Facility {i}"),
            address(&format!("Town {i}")),
            SiteShape::point(lon, lat),
        );
        site.sector = Some(SECTORS[i % SECTORS.len()].to_string());
        site.carcinogen = Some(i % 3 == 0);
        site.release_types = match i % 5 {
            0 => vec!["AIR", "WATER"],
            1 => vec!["AIR"],
            2 => vec!["LAND", "WATER"],
            3 => vec!["LAND"],
            _ => vec![],
        }
        .into_iter()
        .map(str::to_string)
        .collect();
        site.total_releases = Some(i as f64 * 10.5);
        sites.push(site);
    }

    for (id, lon, lat) in [("TRI-FL1", -82.46, 27.95), ("TRI-WA1", -122.3, 47.6)] {
        let mut site = Site::new(id, "Far Facility", address("Far"), SiteShape::point(lon, lat));
        site.sector = Some("Chemicals".to_string());
        site.carcinogen = Some(true);
        site.release_types = vec!["AIR".to_string(), "WATER".to_string()];
        sites.push(site);
    }

    let substrates = ["wood_chips", "rubber", "sand", "wood_chips", "rubber"];
    for (k, substrate) in substrates.iter().enumerate() {
        let min_lon = -93.27 + k as f64 * 0.01;
        let min_lat = 44.98;
        let mut site = Site::new(
            format!("PG-{}", k + 1),
            format!("Playground {}", k + 1),
            address("Minneapolis"),
            SiteShape::polygon(vec![
                [min_lon, min_lat],
                [min_lon + PARK_SIDE_DEG, min_lat],
                [min_lon + PARK_SIDE_DEG, min_lat + PARK_SIDE_DEG],
                [min_lon, min_lat + PARK_SIDE_DEG],
            ]),
        );
        site.substrate_type = Some(substrate.to_string());
        sites.push(site);
    }

    sites.push(Site::new(
        "PG-6",
        "Playground 6",
        address("St. Paul"),
        SiteShape::polygon(vec![[-93.01, 45.0], [-92.99, 45.02], [-93.01, 45.02]]),
    ));

    for site in &sites {
        repo.insert_site(site).unwrap();
    }

    put(&repo, "PG-1", AttributeCategory::Equipment, &[("slides", Some(2)), ("standard_swings", Some(1))]);
    put(&repo, "PG-2", AttributeCategory::Equipment, &[("slides", Some(1)), ("standard_swings", Some(0))]);
    put(&repo, "PG-4", AttributeCategory::Equipment, &[("slides", Some(0)), ("standard_swings", Some(3))]);
    put(&repo, "PG-5", AttributeCategory::Equipment, &[("slides", None), ("standard_swings", Some(2))]);
    put(&repo, "PG-1", AttributeCategory::Amenities, &[("benches", Some(1))]);
    put(&repo, "PG-2", AttributeCategory::Amenities, &[("benches", Some(2))]);
    put(&repo, "PG-4", AttributeCategory::Amenities, &[("benches", Some(0))]);
    put(&repo, "PG-1", AttributeCategory::SportsFacilities, &[("skate_park", Some(1))]);

    Fixture { sites }
}

/// Corner point of a playground polygon.
pub fn playground_corner(index: usize) -> (f64, f64) {
    (44.98, -93.27 + (index - 1) as f64 * 0.01)
}

fn put(
    repo: &SqliteSiteRepository<'_>,
    site_id: &str,
    category: AttributeCategory,
    values: &[(&str, Option<u32>)],
) {
    let mut group = AttributeGroup::new(category);
    for (name, value) in values {
        group.set(name, *value).unwrap();
    }
    repo.put_attribute_group(site_id, &group).unwrap();
}

fn address(city: &str) -> Address {
    Address {
        street1: "100 Main St".to_string(),
        city: city.to_string(),
        state: "MN".to_string(),
        zip: "55401".to_string(),
        ..Address::default()
    }
}

/// Haversine distance to a point; for polygons, 0 when the origin is inside,
/// otherwise the minimum over points sampled densely along every edge.
fn reference_distance(shape: &SiteShape, origin: Point<f64>) -> f64 {
    const EDGE_STEPS: usize = 2_000;
    match shape {
        SiteShape::Point([lon, lat]) => Point::new(*lon, *lat).haversine_distance(&origin),
        SiteShape::Polygon(rings) => {
            let mut line_strings = rings.iter().map(|ring| {
                LineString::from(ring.iter().map(|[lon, lat]| (*lon, *lat)).collect::<Vec<_>>())
            });
            let exterior = line_strings.next().unwrap();
            let polygon = Polygon::new(exterior, line_strings.collect());
            if origin.intersects(&polygon) {
                return 0.0;
            }
            rings
                .iter()
                .flat_map(|ring| ring.windows(2))
                .flat_map(|edge| {
                    let [[lon0, lat0], [lon1, lat1]] = [edge[0], edge[1]];
                    (0..=EDGE_STEPS).map(move |step| {
                        let t = step as f64 / EDGE_STEPS as f64;
                        Point::new(lon0 + (lon1 - lon0) * t, lat0 + (lat1 - lat0) * t)
                    })
                })
                .map(|sample| sample.haversine_distance(&origin))
                .fold(f64::INFINITY, f64::min)
        }
    }
}
