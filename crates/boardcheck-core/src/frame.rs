//! Canonical test frame for a reference segment.
//!
//! The reference is moved so its start sits at the origin and its end lies on
//! the positive X axis. Candidates transformed into that frame reduce to an
//! interval test on X plus a perpendicular offset on Y, which keeps repeated
//! tests against one reference cheap.

use crate::geometry::{Coord, Point, Polygon, Segment, Shape};
use crate::predicates::{self, Proximity};

/// A point expressed in a [`SegmentFrame`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalPoint {
    pub x: f64,
    pub y: f64,
}

/// Immutable canonical frame built from one thick reference segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentFrame {
    origin: Point,
    cos: f64,
    sin: f64,
    length: f64,
    half_width: f64,
    reference: Segment,
}

impl SegmentFrame {
    pub fn new(reference: Segment, width: Coord) -> Self {
        let dx = (reference.end.x - reference.start.x) as f64;
        let dy = (reference.end.y - reference.start.y) as f64;
        let length = dx.hypot(dy);
        let (cos, sin) = if length > 0.0 {
            (dx / length, dy / length)
        } else {
            (1.0, 0.0)
        };
        Self {
            origin: reference.start,
            cos,
            sin,
            length,
            half_width: width as f64 / 2.0,
            reference,
        }
    }

    pub fn reference(&self) -> &Segment {
        &self.reference
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn half_width(&self) -> f64 {
        self.half_width
    }

    pub fn to_local(&self, p: &Point) -> LocalPoint {
        let dx = (p.x - self.origin.x) as f64;
        let dy = (p.y - self.origin.y) as f64;
        LocalPoint {
            x: dx * self.cos + dy * self.sin,
            y: -dx * self.sin + dy * self.cos,
        }
    }

    pub fn to_world(&self, p: LocalPoint) -> Point {
        Point::new(
            self.origin.x + (p.x * self.cos - p.y * self.sin).round() as Coord,
            self.origin.y + (p.x * self.sin + p.y * self.cos).round() as Coord,
        )
    }

    /// Distance from a local point to the reference centreline.
    pub fn axis_distance(&self, p: LocalPoint) -> f64 {
        if p.x < 0.0 {
            p.x.hypot(p.y)
        } else if p.x > self.length {
            (p.x - self.length).hypot(p.y)
        } else {
            p.y.abs()
        }
    }

    /// Closest point on the reference centreline to a local point.
    fn axis_foot(&self, p: LocalPoint) -> LocalPoint {
        LocalPoint {
            x: p.x.clamp(0.0, self.length),
            y: 0.0,
        }
    }

    /// Centreline distance from the reference to a world point.
    pub fn distance_to_point(&self, p: &Point) -> f64 {
        self.axis_distance(self.to_local(p))
    }

    /// Centreline-to-centreline approach between the reference and a segment,
    /// with the marker at the middle of the gap.
    pub fn axis_segment(&self, other: &Segment) -> (f64, LocalPoint) {
        let a = self.to_local(&other.start);
        let b = self.to_local(&other.end);

        // Lies on, or crosses, the X axis inside the reference span.
        if a.y == 0.0 && b.y == 0.0 {
            let lo = a.x.min(b.x);
            if a.x.max(b.x) >= 0.0 && lo <= self.length {
                return (0.0, LocalPoint { x: lo.max(0.0), y: 0.0 });
            }
        } else if (a.y <= 0.0 && b.y >= 0.0) || (a.y >= 0.0 && b.y <= 0.0) {
            let x = a.x + (b.x - a.x) * (a.y / (a.y - b.y));
            if (0.0..=self.length).contains(&x) {
                return (0.0, LocalPoint { x, y: 0.0 });
            }
        }

        let mut best = (f64::INFINITY, a);
        for p in [a, b] {
            let d = self.axis_distance(p);
            if d < best.0 {
                best = (d, mid(p, self.axis_foot(p)));
            }
        }
        // Reference endpoints against the other segment.
        for end in [LocalPoint { x: 0.0, y: 0.0 }, LocalPoint { x: self.length, y: 0.0 }] {
            let (d, foot) = local_point_segment(end, a, b);
            if d < best.0 {
                best = (d, mid(end, foot));
            }
        }
        best
    }

    /// Edge-to-edge approach between the thick reference and `shape`.
    pub fn clearance_to(&self, shape: &Shape) -> Proximity {
        match shape {
            Shape::Circle { center, radius } => {
                let local = self.to_local(center);
                let d = self.axis_distance(local);
                let at = self.to_world(mid(local, self.axis_foot(local)));
                Proximity {
                    distance: (d - self.half_width - *radius as f64).max(0.0),
                    location: at,
                }
            }
            Shape::Segment { seg, width } => {
                let (d, at) = self.axis_segment(seg);
                Proximity {
                    distance: (d - self.half_width - *width as f64 / 2.0).max(0.0),
                    location: self.to_world(at),
                }
            }
            Shape::Polygon(poly) => self.polygon_clearance(poly),
        }
    }

    fn polygon_clearance(&self, poly: &Polygon) -> Proximity {
        if poly.covers(&self.reference.start) {
            return Proximity {
                distance: 0.0,
                location: self.reference.start,
            };
        }
        let mut best = (f64::INFINITY, LocalPoint { x: 0.0, y: 0.0 });
        for edge in poly.edges() {
            let found = self.axis_segment(&edge);
            if found.0 < best.0 {
                best = found;
            }
        }
        Proximity {
            distance: (best.0 - self.half_width).max(0.0),
            location: self.to_world(best.1),
        }
    }

    /// Interior crossing between the reference and `other`, if any.
    pub fn crosses(&self, other: &Segment) -> Option<Point> {
        if predicates::segments_cross_properly(&self.reference, other) {
            predicates::segment_intersection(&self.reference, other)
        } else {
            None
        }
    }

    /// True when `other` projects onto the reference span along X.
    pub fn span_overlaps(&self, other: &Segment) -> bool {
        let a = self.to_local(&other.start).x;
        let b = self.to_local(&other.end).x;
        a.max(b) > 0.0 && a.min(b) < self.length
    }
}

fn mid(a: LocalPoint, b: LocalPoint) -> LocalPoint {
    LocalPoint {
        x: (a.x + b.x) / 2.0,
        y: (a.y + b.y) / 2.0,
    }
}

fn local_point_segment(p: LocalPoint, a: LocalPoint, b: LocalPoint) -> (f64, LocalPoint) {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let len2 = abx * abx + aby * aby;
    let t = if len2 == 0.0 {
        0.0
    } else {
        (((p.x - a.x) * abx + (p.y - a.y) * aby) / len2).clamp(0.0, 1.0)
    };
    let foot = LocalPoint {
        x: a.x + t * abx,
        y: a.y + t * aby,
    };
    ((p.x - foot.x).hypot(p.y - foot.y), foot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;

    fn frame(x1: Coord, y1: Coord, x2: Coord, y2: Coord, w: Coord) -> SegmentFrame {
        SegmentFrame::new(Segment::new(Point::new(x1, y1), Point::new(x2, y2)), w)
    }

    #[test]
    fn test_local_roundtrip_on_diagonal() {
        let f = frame(100, 100, 1100, 1100, 0);
        let local = f.to_local(&Point::new(1100, 1100));
        assert!((local.x - f.length()).abs() < 1e-6);
        assert!(local.y.abs() < 1e-6);
        assert_eq!(f.to_world(local), Point::new(1100, 1100));
    }

    #[test]
    fn test_parallel_track_clearance() {
        let f = frame(0, 0, 1000, 0, 0);
        let other = Shape::Segment {
            seg: Segment::new(Point::new(0, 50), Point::new(1000, 50)),
            width: 0,
        };
        let near = f.clearance_to(&other);
        assert!((near.distance - 50.0).abs() < 1e-9);
        assert!(near.violates(100));
        assert!(f.span_overlaps(&Segment::new(Point::new(0, 50), Point::new(1000, 50))));
    }

    #[test]
    fn test_circle_beyond_end() {
        let f = frame(0, 0, 1000, 0, 200);
        let via = Shape::Circle {
            center: Point::new(1300, 400),
            radius: 100,
        };
        let near = f.clearance_to(&via);
        assert!((near.distance - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_crossing_detected() {
        let f = frame(0, 0, 1000, 0, 10);
        let other = Segment::new(Point::new(500, -500), Point::new(500, 500));
        assert_eq!(f.crosses(&other), Some(Point::new(500, 0)));
        assert_eq!(f.clearance_to(&Shape::Segment { seg: other, width: 10 }).distance, 0.0);
    }

    #[test]
    fn test_polygon_clearance_matches_generic() {
        let f = frame(0, 0, 1000, 0, 100);
        let pad = Shape::Polygon(Polygon::rectangle(Point::new(500, 500), Size::new(200, 200), 0.0));
        let framed = f.clearance_to(&pad).distance;
        let generic = predicates::shape_distance(
            &Shape::Segment {
                seg: *f.reference(),
                width: 100,
            },
            &pad,
        )
        .distance;
        assert!((framed - generic).abs() < 1e-6);
        assert!((framed - 350.0).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_reference_behaves_as_point() {
        let f = frame(10, 10, 10, 10, 0);
        assert!((f.distance_to_point(&Point::new(13, 14)) - 5.0).abs() < 1e-9);
    }
}
