use crate::coord::{Coord, GeoPoint, RawPair};

/// GeoJSON-shaped geometry, generic over the vertex type.
///
/// The same shape travels through the pipeline with different vertices: raw
/// tokens straight out of a parser, numeric pairs in some CRS, and finally
/// WGS84 points in the drawing model.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape<T> {
    Point(T),
    LineString(Vec<T>),
    /// Exterior ring first, then holes. Rings are closed.
    Polygon(Vec<Vec<T>>),
}

/// Geometry exactly as parsed; CRS and axis meaning not yet resolved.
pub type RawGeometry = Shape<RawPair>;
/// Geometry with numeric (north, east) vertices in a known CRS.
pub type CrsGeometry = Shape<Coord>;
/// Drawing-model geometry: longitude-first WGS84 degrees.
pub type Geometry = Shape<GeoPoint>;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Point,
    LineString,
    Polygon,
}

impl<T> Shape<T> {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Point(_) => ShapeKind::Point,
            Shape::LineString(_) => ShapeKind::LineString,
            Shape::Polygon(_) => ShapeKind::Polygon,
        }
    }

    /// Visit every vertex in ring/line order.
    pub fn vertices(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        match self {
            Shape::Point(p) => Box::new(std::iter::once(p)),
            Shape::LineString(ps) => Box::new(ps.iter()),
            Shape::Polygon(rings) => Box::new(rings.iter().flatten()),
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> Shape<U> {
        match self {
            Shape::Point(p) => Shape::Point(f(p)),
            Shape::LineString(ps) => Shape::LineString(ps.iter().map(&mut f).collect()),
            Shape::Polygon(rings) => Shape::Polygon(
                rings
                    .iter()
                    .map(|ring| ring.iter().map(&mut f).collect())
                    .collect(),
            ),
        }
    }

    /// Fallible [`Shape::map`]; stops at the first error.
    pub fn try_map<U, E>(&self, mut f: impl FnMut(&T) -> Result<U, E>) -> Result<Shape<U>, E> {
        Ok(match self {
            Shape::Point(p) => Shape::Point(f(p)?),
            Shape::LineString(ps) => {
                Shape::LineString(ps.iter().map(&mut f).collect::<Result<_, _>>()?)
            }
            Shape::Polygon(rings) => {
                let mut out = Vec::with_capacity(rings.len());
                for ring in rings {
                    out.push(ring.iter().map(&mut f).collect::<Result<Vec<_>, _>>()?);
                }
                Shape::Polygon(out)
            }
        })
    }
}

/// A committed drawing-model geometry plus audit metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Geometry,
    /// Text the user originally entered or uploaded. Display only.
    pub coordinate_verbatim: Option<String>,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            coordinate_verbatim: None,
        }
    }

    pub fn with_verbatim(mut self, text: impl Into<String>) -> Self {
        self.coordinate_verbatim = Some(text.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{Shape, ShapeKind};

    #[test]
    fn vertices_flatten_rings() {
        let poly = Shape::Polygon(vec![vec![1, 2, 3, 1], vec![7, 8, 9, 7]]);
        assert_eq!(poly.kind(), ShapeKind::Polygon);
        assert_eq!(poly.vertices().copied().collect::<Vec<_>>(), [1, 2, 3, 1, 7, 8, 9, 7]);
    }

    #[test]
    fn try_map_stops_on_error() {
        let line = Shape::LineString(vec![1, 2, -3, 4]);
        let mut seen = 0;
        let res: Result<Shape<u32>, String> = line.try_map(|v| {
            seen += 1;
            u32::try_from(*v).map_err(|_| format!("negative: {v}"))
        });
        assert_eq!(res, Err("negative: -3".to_string()));
        assert_eq!(seen, 3);

        let doubled = line.map(|v| v * 2);
        assert_eq!(doubled, Shape::LineString(vec![2, 4, -6, 8]));
    }
}
