//! Distance and intersection predicates over board shapes.
//!
//! All functions are pure. Orientation tests run on exact `i128` cross
//! products; distances are measured in `f64` from integer inputs.

use crate::geometry::{Containment, Coord, Point, Polygon, Segment, Shape};

/// Closest approach between two features.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proximity {
    /// Edge-to-edge distance, never negative.
    pub distance: f64,
    /// Midpoint of the closest approach, used as a marker location.
    pub location: Point,
}

impl Proximity {
    fn new(distance: f64, location: Point) -> Self {
        Self { distance, location }
    }

    fn touching(location: Point) -> Self {
        Self::new(0.0, location)
    }

    fn closer(self, other: Proximity) -> Proximity {
        if other.distance < self.distance {
            other
        } else {
            self
        }
    }

    /// Violation convention used everywhere: strictly closer than `clearance`.
    pub fn violates(&self, clearance: Coord) -> bool {
        self.distance < clearance as f64
    }
}

/// Cross product of `o->a` and `o->b`.
pub fn cross(o: &Point, a: &Point, b: &Point) -> i128 {
    (a.x - o.x) as i128 * (b.y - o.y) as i128 - (a.y - o.y) as i128 * (b.x - o.x) as i128
}

/// True when `p` lies on the closed segment.
pub fn point_on_segment(p: &Point, seg: &Segment) -> bool {
    cross(&seg.start, &seg.end, p) == 0 && seg.bbox().contains_point(p)
}

/// Exact perpendicular or endpoint distance from `p` to `seg`.
/// The location is the closest point on the segment.
pub fn point_segment_distance(p: &Point, seg: &Segment) -> Proximity {
    let ax = seg.start.x as f64;
    let ay = seg.start.y as f64;
    let abx = (seg.end.x - seg.start.x) as f64;
    let aby = (seg.end.y - seg.start.y) as f64;
    let len2 = abx * abx + aby * aby;
    if len2 == 0.0 {
        return Proximity::new(p.distance_to(&seg.start), seg.start);
    }
    let t = (((p.x as f64 - ax) * abx + (p.y as f64 - ay) * aby) / len2).clamp(0.0, 1.0);
    let cx = ax + t * abx;
    let cy = ay + t * aby;
    let distance = (p.x as f64 - cx).hypot(p.y as f64 - cy);
    Proximity::new(distance, Point::new(cx.round() as Coord, cy.round() as Coord))
}

/// Closed-segment intersection test, touching and collinear overlap included.
pub fn segments_intersect(a: &Segment, b: &Segment) -> bool {
    let d1 = cross(&b.start, &b.end, &a.start).signum();
    let d2 = cross(&b.start, &b.end, &a.end).signum();
    let d3 = cross(&a.start, &a.end, &b.start).signum();
    let d4 = cross(&a.start, &a.end, &b.end).signum();

    if d1 * d2 < 0 && d3 * d4 < 0 {
        return true;
    }
    (d1 == 0 && point_on_segment(&a.start, b))
        || (d2 == 0 && point_on_segment(&a.end, b))
        || (d3 == 0 && point_on_segment(&b.start, a))
        || (d4 == 0 && point_on_segment(&b.end, a))
}

/// True when the segments cross at a single interior point of both.
pub fn segments_cross_properly(a: &Segment, b: &Segment) -> bool {
    let d1 = cross(&b.start, &b.end, &a.start).signum();
    let d2 = cross(&b.start, &b.end, &a.end).signum();
    let d3 = cross(&a.start, &a.end, &b.start).signum();
    let d4 = cross(&a.start, &a.end, &b.end).signum();
    d1 * d2 < 0 && d3 * d4 < 0
}

/// Intersection point of two segments, for marker placement.
/// Collinear overlaps report the first shared point found.
pub fn segment_intersection(a: &Segment, b: &Segment) -> Option<Point> {
    if !segments_intersect(a, b) {
        return None;
    }
    let rx = (a.end.x - a.start.x) as i128;
    let ry = (a.end.y - a.start.y) as i128;
    let sx = (b.end.x - b.start.x) as i128;
    let sy = (b.end.y - b.start.y) as i128;
    let denom = rx * sy - ry * sx;
    if denom == 0 {
        return [b.start, b.end]
            .into_iter()
            .find(|p| point_on_segment(p, a))
            .or_else(|| [a.start, a.end].into_iter().find(|p| point_on_segment(p, b)));
    }
    let qpx = (b.start.x - a.start.x) as i128;
    let qpy = (b.start.y - a.start.y) as i128;
    let t = (qpx * sy - qpy * sx) as f64 / denom as f64;
    Some(Point::new(
        (a.start.x as f64 + t * rx as f64).round() as Coord,
        (a.start.y as f64 + t * ry as f64).round() as Coord,
    ))
}

/// Centreline distance between two segments; zero when they intersect.
pub fn segment_distance(a: &Segment, b: &Segment) -> Proximity {
    if let Some(p) = segment_intersection(a, b) {
        return Proximity::touching(p);
    }
    let towards = |p: &Point, seg: &Segment| {
        let near = point_segment_distance(p, seg);
        Proximity::new(near.distance, p.midpoint(&near.location))
    };
    towards(&a.start, b)
        .closer(towards(&a.end, b))
        .closer(towards(&b.start, a))
        .closer(towards(&b.end, a))
}

/// The zero-width skeleton of a shape.
enum Core<'a> {
    Point(Point),
    Segment(Segment),
    Polygon(&'a Polygon),
}

fn core_of(shape: &Shape) -> (Core<'_>, f64) {
    match shape {
        Shape::Circle { center, radius } => (Core::Point(*center), *radius as f64),
        Shape::Segment { seg, width } => {
            let core = if seg.is_degenerate() {
                Core::Point(seg.start)
            } else {
                Core::Segment(*seg)
            };
            (core, *width as f64 / 2.0)
        }
        Shape::Polygon(poly) => (Core::Polygon(poly), 0.0),
    }
}

fn point_polygon_distance(p: &Point, poly: &Polygon) -> Proximity {
    if poly.covers(p) {
        return Proximity::touching(*p);
    }
    poly.edges()
        .map(|edge| {
            let near = point_segment_distance(p, &edge);
            Proximity::new(near.distance, p.midpoint(&near.location))
        })
        .fold(Proximity::new(f64::INFINITY, *p), Proximity::closer)
}

fn segment_polygon_distance(seg: &Segment, poly: &Polygon) -> Proximity {
    for end in [seg.start, seg.end] {
        if poly.covers(&end) {
            return Proximity::touching(end);
        }
    }
    poly.edges()
        .map(|edge| segment_distance(seg, &edge))
        .fold(Proximity::new(f64::INFINITY, seg.start), Proximity::closer)
}

fn polygon_polygon_distance(a: &Polygon, b: &Polygon) -> Proximity {
    if let Some(p) = a.outline.iter().find(|p| b.covers(p)) {
        return Proximity::touching(*p);
    }
    if let Some(p) = b.outline.iter().find(|p| a.covers(p)) {
        return Proximity::touching(*p);
    }
    let fallback = a.outline.first().copied().unwrap_or_default();
    a.edges()
        .flat_map(|ea| b.edges().map(move |eb| segment_distance(&ea, &eb)))
        .fold(Proximity::new(f64::INFINITY, fallback), Proximity::closer)
}

fn core_distance(a: &Core<'_>, b: &Core<'_>) -> Proximity {
    match (a, b) {
        (Core::Point(p), Core::Point(q)) => Proximity::new(p.distance_to(q), p.midpoint(q)),
        (Core::Point(p), Core::Segment(s)) | (Core::Segment(s), Core::Point(p)) => {
            let near = point_segment_distance(p, s);
            Proximity::new(near.distance, p.midpoint(&near.location))
        }
        (Core::Segment(s), Core::Segment(t)) => segment_distance(s, t),
        (Core::Point(p), Core::Polygon(poly)) | (Core::Polygon(poly), Core::Point(p)) => {
            point_polygon_distance(p, poly)
        }
        (Core::Segment(s), Core::Polygon(poly)) | (Core::Polygon(poly), Core::Segment(s)) => {
            segment_polygon_distance(s, poly)
        }
        (Core::Polygon(pa), Core::Polygon(pb)) => polygon_polygon_distance(pa, pb),
    }
}

/// Edge-to-edge distance between two shapes, zero when they touch or overlap.
/// Polygon holes count as open space: a shape sitting in a hole is measured
/// against the hole boundary.
pub fn shape_distance(a: &Shape, b: &Shape) -> Proximity {
    let (core_a, radius_a) = core_of(a);
    let (core_b, radius_b) = core_of(b);
    let near = core_distance(&core_a, &core_b);
    Proximity::new((near.distance - radius_a - radius_b).max(0.0), near.location)
}

/// True iff the shapes are at least `min_distance` apart.
pub fn clearance_satisfied(a: &Shape, b: &Shape, min_distance: Coord) -> bool {
    !shape_distance(a, b).violates(min_distance)
}

/// True when `p` falls within the shape (boundary included).
pub fn hit_test(shape: &Shape, p: &Point) -> bool {
    let (core, radius) = core_of(shape);
    core_distance(&core, &Core::Point(*p)).distance <= radius
}

/// Distance from a point to the nearest boundary edge of a polygon,
/// regardless of whether the point is inside.
pub fn distance_to_boundary(p: &Point, poly: &Polygon) -> Proximity {
    poly.edges()
        .map(|edge| point_segment_distance(p, &edge))
        .fold(Proximity::new(f64::INFINITY, *p), Proximity::closer)
}

/// True when both polygons share interior area. Touching edges alone do not
/// count as overlap.
pub fn polygons_overlap(a: &Polygon, b: &Polygon) -> bool {
    let crossing = a
        .edges()
        .any(|ea| b.edges().any(|eb| segments_cross_properly(&ea, &eb)));
    if crossing {
        return true;
    }
    let strictly_inside = |from: &Polygon, to: &Polygon| {
        from.outline
            .iter()
            .any(|p| to.contains(p) == Containment::Inside)
            || from
                .edges()
                .any(|e| to.contains(&e.midpoint()) == Containment::Inside)
    };
    if strictly_inside(a, b) || strictly_inside(b, a) {
        return true;
    }
    // Identical or boundary-coincident outlines: test an interior sample.
    interior_sample(a).is_some_and(|p| b.contains(&p) == Containment::Inside)
}

/// A point strictly inside the polygon, found from the centroid of a
/// triangle fan if one exists.
fn interior_sample(poly: &Polygon) -> Option<Point> {
    let ring = &poly.outline;
    if ring.len() < 3 {
        return None;
    }
    let origin = ring[0];
    ring.windows(2).skip(1).find_map(|w| {
        let c = Point::new(
            (origin.x + w[0].x + w[1].x) / 3,
            (origin.y + w[0].y + w[1].y) / 3,
        );
        (poly.contains(&c) == Containment::Inside).then_some(c)
    })
}
