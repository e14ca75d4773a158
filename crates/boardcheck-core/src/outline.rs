//! Chaining loose graphic items into closed polygons.
//!
//! Used for the board outline (Edge.Cuts) and for footprint courtyards.

use crate::error::PolygonizeError;
use crate::geometry::{Containment, Coord, GraphicShape, Point, Polygon};

/// Endpoint tolerance when chaining segments: 1 µm.
pub const CHAINING_EPSILON: Coord = 1_000;

fn close_enough(a: &Point, b: &Point, epsilon: Coord) -> bool {
    (a.x - b.x).abs() <= epsilon && (a.y - b.y).abs() <= epsilon
}

/// Build closed polygons from graphic items.
///
/// Rectangles, circles and polygons close on their own. Segments are chained
/// end to end. Loops are ordered by decreasing area; a loop lying inside an
/// earlier polygon becomes one of its holes, any other loop starts a new
/// polygon. The first polygon returned is therefore the largest.
pub fn polygonize(shapes: &[GraphicShape], epsilon: Coord) -> Result<Vec<Polygon>, PolygonizeError> {
    let mut loops: Vec<Vec<Point>> = Vec::new();
    let mut segments: Vec<(Point, Point)> = Vec::new();

    for shape in shapes {
        match shape {
            GraphicShape::Segment { start, end } => {
                if start != end {
                    segments.push((*start, *end));
                }
            }
            GraphicShape::Rect { start, end } => {
                loops.push(GraphicShape::rect_corners(start, end));
            }
            GraphicShape::Circle { center, radius } => {
                loops.push(GraphicShape::circle_points(center, *radius));
            }
            GraphicShape::Polygon { points } => loops.push(points.clone()),
        }
    }

    loops.extend(chain_segments(segments, epsilon)?);

    if loops.is_empty() {
        return Err(PolygonizeError::Empty);
    }

    for ring in &loops {
        let poly = Polygon::new(ring.clone());
        if !poly.is_valid() {
            let at = ring.first().copied().unwrap_or_default();
            return Err(PolygonizeError::Degenerate { at });
        }
    }

    let mut by_area: Vec<(f64, Vec<Point>)> = loops
        .into_iter()
        .map(|ring| (Polygon::new(ring.clone()).area(), ring))
        .collect();
    by_area.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut polygons: Vec<Polygon> = Vec::new();
    for (_, ring) in by_area {
        let host = polygons
            .iter_mut()
            .find(|poly| ring.iter().all(|p| poly.contains(p) == Containment::Inside));
        match host {
            Some(poly) => poly.holes.push(ring),
            None => polygons.push(Polygon::new(ring)),
        }
    }
    Ok(polygons)
}

fn chain_segments(
    mut pending: Vec<(Point, Point)>,
    epsilon: Coord,
) -> Result<Vec<Vec<Point>>, PolygonizeError> {
    let mut loops = Vec::new();

    while !pending.is_empty() {
        let (first, mut tail) = pending.remove(0);
        let mut ring = vec![first];

        loop {
            if close_enough(&tail, &first, epsilon) && ring.len() > 1 {
                break;
            }
            let next = pending.iter().position(|(a, b)| {
                close_enough(a, &tail, epsilon) || close_enough(b, &tail, epsilon)
            });
            let Some(idx) = next else {
                return Err(PolygonizeError::OpenChain { at: tail });
            };
            let (a, b) = pending.remove(idx);
            ring.push(tail);
            tail = if close_enough(&a, &tail, epsilon) { b } else { a };
        }
        loops.push(ring);
    }
    Ok(loops)
}
