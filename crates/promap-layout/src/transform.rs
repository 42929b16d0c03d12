use crate::orientation::{Orientation, Point, classify};

impl Orientation {
  /// Map a point into top-to-bottom flow.
  ///
  /// Vertical layouts are already top-to-bottom and pass through untouched;
  /// horizontal layouts have their axes exchanged.
  pub fn to_vertical(&self, point: Point) -> Point {
    match self {
      Orientation::Vertical => point,
      Orientation::Horizontal => Point {
        x: point.y,
        y: point.x,
      },
    }
  }
}

/// A layout after orientation normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedLayout {
  /// Orientation the input was classified as.
  pub orientation: Orientation,
  /// Output points, index-aligned with the input.
  pub points: Vec<Point>,
}

/// Classify `points` once and transform each of them with the result.
pub fn normalize(points: &[Point]) -> NormalizedLayout {
  let orientation = classify(points);
  NormalizedLayout {
    orientation,
    points: points.iter().map(|p| orientation.to_vertical(*p)).collect(),
  }
}
