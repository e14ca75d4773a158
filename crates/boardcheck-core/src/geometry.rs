use serde::{Deserialize, Serialize};

/// A board coordinate or length in internal units (nanometres).
pub type Coord = i64;

pub const NM_PER_MM: f64 = 1_000_000.0;

/// Number of straight edges used when a circle has to become a polygon.
pub const CIRCLE_SEGMENTS: usize = 32;

/// Convert millimetres to internal units.
pub fn mm(value: f64) -> Coord {
    (value * NM_PER_MM).round() as Coord
}

/// Convert an internal length to millimetres.
pub fn to_mm(value: f64) -> f64 {
    value / NM_PER_MM
}

/// A 2D point in board coordinates.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Point {
    pub x: Coord,
    pub y: Coord,
}

impl Point {
    pub const fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x - other.x) as f64).hypot((self.y - other.y) as f64)
    }

    pub fn translate(&self, dx: Coord, dy: Coord) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn midpoint(&self, other: &Point) -> Self {
        Self {
            x: (self.x + other.x) / 2,
            y: (self.y + other.y) / 2,
        }
    }

    /// Rotate counter-clockwise about `center`, snapping back to the grid.
    pub fn rotate_about(&self, center: &Point, degrees: f64) -> Self {
        if degrees == 0.0 {
            return *self;
        }
        let rad = degrees.to_radians();
        let (sin_r, cos_r) = rad.sin_cos();
        let dx = (self.x - center.x) as f64;
        let dy = (self.y - center.y) as f64;
        Self {
            x: center.x + (dx * cos_r - dy * sin_r).round() as Coord,
            y: center.y + (dx * sin_r + dy * cos_r).round() as Coord,
        }
    }
}

/// Width and height of a rectangular extent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub w: Coord,
    pub h: Coord,
}

impl Size {
    pub const fn new(w: Coord, h: Coord) -> Self {
        Self { w, h }
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BBox {
    pub min: Point,
    pub max: Point,
}

impl BBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut bbox = BBox::new(*first, *first);
        for p in &points[1..] {
            bbox.min.x = bbox.min.x.min(p.x);
            bbox.min.y = bbox.min.y.min(p.y);
            bbox.max.x = bbox.max.x.max(p.x);
            bbox.max.y = bbox.max.y.max(p.y);
        }
        Some(bbox)
    }

    pub fn width(&self) -> Coord {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> Coord {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        self.min.midpoint(&self.max)
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn intersects(&self, other: &BBox) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn union(&self, other: &BBox) -> Self {
        Self {
            min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// Grow the box by `margin` on every side.
    pub fn inflate(&self, margin: Coord) -> Self {
        Self {
            min: self.min.translate(-margin, -margin),
            max: self.max.translate(margin, margin),
        }
    }

    /// Gap between two boxes; zero when they touch or overlap.
    pub fn gap_to(&self, other: &BBox) -> f64 {
        let dx = (self.min.x.max(other.min.x) - self.max.x.min(other.max.x)).max(0);
        let dy = (self.min.y.max(other.min.y) - self.max.y.min(other.max.y)).max(0);
        (dx as f64).hypot(dy as f64)
    }
}

/// A straight line segment between two points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }

    /// A segment whose endpoints coincide behaves as a point.
    pub fn is_degenerate(&self) -> bool {
        self.start == self.end
    }

    pub fn bbox(&self) -> BBox {
        BBox::new(
            Point::new(self.start.x.min(self.end.x), self.start.y.min(self.end.y)),
            Point::new(self.start.x.max(self.end.x), self.start.y.max(self.end.y)),
        )
    }

    pub fn midpoint(&self) -> Point {
        self.start.midpoint(&self.end)
    }

    pub fn has_endpoint(&self, p: &Point) -> bool {
        self.start == *p || self.end == *p
    }

    /// The endpoint shared with `other`, if any.
    pub fn shared_endpoint(&self, other: &Segment) -> Option<Point> {
        [self.start, self.end]
            .into_iter()
            .find(|p| other.has_endpoint(p))
    }

    /// True when both segments lie on the same infinite line.
    pub fn is_collinear_with(&self, other: &Segment) -> bool {
        crate::predicates::cross(&self.start, &self.end, &other.start) == 0
            && crate::predicates::cross(&self.start, &self.end, &other.end) == 0
    }

    /// Same endpoints, in either direction.
    pub fn same_span(&self, other: &Segment) -> bool {
        (self.start == other.start && self.end == other.end)
            || (self.start == other.end && self.end == other.start)
    }
}

/// Where a point lies relative to a polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    Inside,
    OnBoundary,
    Outside,
}

/// A closed polygon with optional holes. Rings are implicitly closed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polygon {
    pub outline: Vec<Point>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holes: Vec<Vec<Point>>,
}

impl Polygon {
    pub fn new(outline: Vec<Point>) -> Self {
        Self {
            outline,
            holes: Vec::new(),
        }
    }

    pub fn with_holes(outline: Vec<Point>, holes: Vec<Vec<Point>>) -> Self {
        Self { outline, holes }
    }

    /// Rectangle of `size` centred on `center`, rotated counter-clockwise.
    pub fn rectangle(center: Point, size: Size, rotation_deg: f64) -> Self {
        let hw = size.w / 2;
        let hh = size.h / 2;
        let outline = [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)]
            .iter()
            .map(|&(dx, dy)| center.translate(dx, dy).rotate_about(&center, rotation_deg))
            .collect();
        Self::new(outline)
    }

    pub fn from_bbox(bbox: &BBox) -> Self {
        Self::new(vec![
            bbox.min,
            Point::new(bbox.max.x, bbox.min.y),
            bbox.max,
            Point::new(bbox.min.x, bbox.max.y),
        ])
    }

    pub fn bbox(&self) -> Option<BBox> {
        BBox::from_points(&self.outline)
    }

    pub fn vertex_count(&self) -> usize {
        self.outline.len() + self.holes.iter().map(Vec::len).sum::<usize>()
    }

    /// Outline first, then holes.
    pub fn rings(&self) -> impl Iterator<Item = &[Point]> {
        std::iter::once(self.outline.as_slice()).chain(self.holes.iter().map(Vec::as_slice))
    }

    /// Every boundary edge, hole edges included.
    pub fn edges(&self) -> impl Iterator<Item = Segment> + '_ {
        self.rings().flat_map(ring_edges)
    }

    /// Enclosed area: outline minus holes.
    pub fn area(&self) -> f64 {
        let outer = ring_area2(&self.outline).abs();
        let holes: i128 = self.holes.iter().map(|h| ring_area2(h).abs()).sum();
        (outer - holes).max(0) as f64 / 2.0
    }

    /// At least a triangle with non-zero area.
    pub fn is_valid(&self) -> bool {
        self.outline.len() >= 3 && ring_area2(&self.outline) != 0
    }

    /// Even-odd point location across the outline and all holes.
    pub fn contains(&self, p: &Point) -> Containment {
        let mut inside = false;
        for ring in self.rings() {
            for edge in ring_edges(ring) {
                if crate::predicates::point_on_segment(p, &edge) {
                    return Containment::OnBoundary;
                }
                let (a, b) = (edge.start, edge.end);
                if (a.y > p.y) != (b.y > p.y) {
                    let x_cross = a.x as f64
                        + (p.y - a.y) as f64 * (b.x - a.x) as f64 / (b.y - a.y) as f64;
                    if (p.x as f64) < x_cross {
                        inside = !inside;
                    }
                }
            }
        }
        if inside {
            Containment::Inside
        } else {
            Containment::Outside
        }
    }

    /// Inside or on the boundary.
    pub fn covers(&self, p: &Point) -> bool {
        self.contains(p) != Containment::Outside
    }
}

/// Closed ring edges, including the edge back to the first vertex.
pub fn ring_edges(ring: &[Point]) -> impl Iterator<Item = Segment> + '_ {
    let n = ring.len();
    (0..if n >= 2 { n } else { 0 }).map(move |i| Segment::new(ring[i], ring[(i + 1) % n]))
}

/// Twice the signed area of a ring (positive when counter-clockwise).
pub fn ring_area2(ring: &[Point]) -> i128 {
    let n = ring.len();
    if n < 3 {
        return 0;
    }
    (0..n)
        .map(|i| {
            let a = ring[i];
            let b = ring[(i + 1) % n];
            a.x as i128 * b.y as i128 - b.x as i128 * a.y as i128
        })
        .sum()
}

/// A copper shape: a core (point, segment or polygon) inflated by a radius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { center: Point, radius: Coord },
    /// A track-like stadium: `width` is the full width across the centreline.
    Segment { seg: Segment, width: Coord },
    Polygon(Polygon),
}

impl Shape {
    pub fn circle(center: Point, diameter: Coord) -> Self {
        Shape::Circle {
            center,
            radius: diameter / 2,
        }
    }

    pub fn bbox(&self) -> BBox {
        match self {
            Shape::Circle { center, radius } => BBox::new(*center, *center).inflate(*radius),
            Shape::Segment { seg, width } => seg.bbox().inflate(width / 2),
            Shape::Polygon(poly) => poly.bbox().unwrap_or_default(),
        }
    }

    /// A representative point, used to anchor violation markers.
    pub fn anchor(&self) -> Point {
        match self {
            Shape::Circle { center, .. } => *center,
            Shape::Segment { seg, .. } => seg.midpoint(),
            Shape::Polygon(poly) => poly.bbox().map(|b| b.center()).unwrap_or_default(),
        }
    }
}

/// A graphic drawing primitive as authored on a non-routing layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GraphicShape {
    Segment { start: Point, end: Point },
    Rect { start: Point, end: Point },
    Circle { center: Point, radius: Coord },
    Polygon { points: Vec<Point> },
}

impl GraphicShape {
    /// Corners of a rectangle graphic, counter-clockwise from `start`.
    pub fn rect_corners(start: &Point, end: &Point) -> Vec<Point> {
        vec![
            *start,
            Point::new(end.x, start.y),
            *end,
            Point::new(start.x, end.y),
        ]
    }

    /// Regular polygon approximation of a circle graphic.
    pub fn circle_points(center: &Point, radius: Coord) -> Vec<Point> {
        (0..CIRCLE_SEGMENTS)
            .map(|i| {
                let angle = 360.0 * i as f64 / CIRCLE_SEGMENTS as f64;
                center.translate(radius, 0).rotate_about(center, angle)
            })
            .collect()
    }

    pub fn bbox(&self) -> BBox {
        match self {
            GraphicShape::Segment { start, end } | GraphicShape::Rect { start, end } => {
                Segment::new(*start, *end).bbox()
            }
            GraphicShape::Circle { center, radius } => BBox::new(*center, *center).inflate(*radius),
            GraphicShape::Polygon { points } => BBox::from_points(points).unwrap_or_default(),
        }
    }

    pub fn start_point(&self) -> Point {
        match self {
            GraphicShape::Segment { start, .. } | GraphicShape::Rect { start, .. } => *start,
            GraphicShape::Circle { center, .. } => *center,
            GraphicShape::Polygon { points } => points.first().copied().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance() {
        let a = Point::new(0, 0);
        let b = Point::new(3, 4);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_mm_conversion() {
        assert_eq!(mm(0.25), 250_000);
        assert!((to_mm(1_500_000.0) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let p = Point::new(1000, 0).rotate_about(&Point::new(0, 0), 90.0);
        assert_eq!(p, Point::new(0, 1000));
    }

    #[test]
    fn test_bbox_intersection() {
        let a = BBox::new(Point::new(0, 0), Point::new(10, 10));
        let b = BBox::new(Point::new(5, 5), Point::new(15, 15));
        let c = BBox::new(Point::new(20, 20), Point::new(30, 30));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!((a.gap_to(&c) - (200.0f64).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_rectangle_area() {
        let r = Polygon::rectangle(Point::new(0, 0), Size::new(100, 50), 0.0);
        assert!((r.area() - 5000.0).abs() < 1e-9);
        assert!(r.is_valid());
    }

    #[test]
    fn test_contains_with_hole() {
        let outer = vec![
            Point::new(0, 0),
            Point::new(100, 0),
            Point::new(100, 100),
            Point::new(0, 100),
        ];
        let hole = vec![
            Point::new(40, 40),
            Point::new(60, 40),
            Point::new(60, 60),
            Point::new(40, 60),
        ];
        let poly = Polygon::with_holes(outer, vec![hole]);
        assert_eq!(poly.contains(&Point::new(10, 10)), Containment::Inside);
        assert_eq!(poly.contains(&Point::new(50, 50)), Containment::Outside);
        assert_eq!(poly.contains(&Point::new(40, 50)), Containment::OnBoundary);
        assert_eq!(poly.contains(&Point::new(150, 50)), Containment::Outside);
        assert!((poly.area() - 9600.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_polygon_invalid() {
        let line = Polygon::new(vec![Point::new(0, 0), Point::new(10, 0), Point::new(20, 0)]);
        assert!(!line.is_valid());
    }
}
