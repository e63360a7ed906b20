//! Geodesic SQL scalar functions.
//!
//! - `st_dwithin(shape_json, lon, lat, radius_m)` -> 0/1
//! - `st_distance(shape_json, lon, lat)` -> meters
//!
//! `shape_json` is the GeoJSON geometry stored in `sites.shape_json`.

use crate::model::site::SiteShape;
use crate::query::proximity::{distance_to_shape_meters, within_distance};
use geo::Point;
use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::Connection;

pub fn register_geo_functions(conn: &Connection) -> rusqlite::Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

    conn.create_scalar_function("st_dwithin", 4, flags, |ctx| {
        let shape = shape_arg(ctx, 0)?;
        let point = point_args(ctx, 1)?;
        let radius_meters: f64 = ctx.get(3)?;
        Ok(within_distance(&shape, point, radius_meters))
    })?;

    conn.create_scalar_function("st_distance", 3, flags, |ctx| {
        let shape = shape_arg(ctx, 0)?;
        let point = point_args(ctx, 1)?;
        Ok(distance_to_shape_meters(&shape, point))
    })?;

    Ok(())
}

fn shape_arg(ctx: &Context<'_>, idx: usize) -> rusqlite::Result<SiteShape> {
    let raw: String = ctx.get(idx)?;
    SiteShape::from_json(&raw).map_err(|err| rusqlite::Error::UserFunctionError(Box::new(err)))
}

fn point_args(ctx: &Context<'_>, first_idx: usize) -> rusqlite::Result<Point<f64>> {
    let lon: f64 = ctx.get(first_idx)?;
    let lat: f64 = ctx.get(first_idx + 1)?;
    Ok(Point::new(lon, lat))
}
