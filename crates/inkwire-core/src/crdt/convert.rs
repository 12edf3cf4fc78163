//! Conversion between Stroke and Loro values.

use crate::stroke::{Stroke, StrokeColor};
use kurbo::Point;
use loro::{LoroList, LoroMap, LoroMapValue, LoroResult, LoroValue};

const KEY_POINTS: &str = "points";
const KEY_COLOR_R: &str = "color_r";
const KEY_COLOR_G: &str = "color_g";
const KEY_COLOR_B: &str = "color_b";
const KEY_COLOR_A: &str = "color_a";
const KEY_SIZE: &str = "size";

// Helpers to extract values from LoroMapValue (derefs to HashMap<String, LoroValue>)
fn get_double(map: &LoroMapValue, key: &str) -> Option<f64> {
    match map.get(key)? {
        LoroValue::Double(d) => Some(*d),
        LoroValue::I64(i) => Some(*i as f64),
        _ => None,
    }
}

fn get_i64(map: &LoroMapValue, key: &str) -> Option<i64> {
    match map.get(key)? {
        LoroValue::I64(i) => Some(*i),
        LoroValue::Double(d) => Some(*d as i64),
        _ => None,
    }
}

/// Write a stroke's fields into a Loro map.
pub fn stroke_to_loro(stroke: &Stroke, map: &LoroMap) -> LoroResult<()> {
    map.insert(KEY_COLOR_R, stroke.color.r as i64)?;
    map.insert(KEY_COLOR_G, stroke.color.g as i64)?;
    map.insert(KEY_COLOR_B, stroke.color.b as i64)?;
    map.insert(KEY_COLOR_A, stroke.color.a as i64)?;
    map.insert(KEY_SIZE, stroke.size)?;

    // Store points as a list of [x, y] pairs
    let points_list = map.insert_container(KEY_POINTS, LoroList::new())?;
    for point in &stroke.points {
        let pair = points_list.insert_container(points_list.len(), LoroList::new())?;
        pair.push(point.x)?;
        pair.push(point.y)?;
    }

    Ok(())
}

/// Read a stroke back out of a Loro map value. Returns `None` for
/// malformed entries; a bad remote stroke must never corrupt the
/// local view, so callers drop it silently.
pub fn stroke_from_loro(map: &LoroMapValue) -> Option<Stroke> {
    let r = get_i64(map, KEY_COLOR_R)? as u8;
    let g = get_i64(map, KEY_COLOR_G)? as u8;
    let b = get_i64(map, KEY_COLOR_B)? as u8;
    let a = get_i64(map, KEY_COLOR_A)? as u8;
    let size = get_double(map, KEY_SIZE)?;

    let points: Vec<Point> = if let Some(LoroValue::List(points_list)) = map.get(KEY_POINTS) {
        points_list
            .iter()
            .filter_map(|p| {
                if let LoroValue::List(coords) = p {
                    if coords.len() >= 2 {
                        let x = match coords.first()? {
                            LoroValue::Double(d) => *d,
                            LoroValue::I64(i) => *i as f64,
                            _ => return None,
                        };
                        let y = match coords.get(1)? {
                            LoroValue::Double(d) => *d,
                            LoroValue::I64(i) => *i as f64,
                            _ => return None,
                        };
                        return Some(Point::new(x, y));
                    }
                }
                None
            })
            .collect()
    } else {
        vec![]
    };

    Some(Stroke::from_points(points, StrokeColor::new(r, g, b, a), size))
}
