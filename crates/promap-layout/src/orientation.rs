use serde::{Deserialize, Serialize};

/// A point on the process canvas (Y grows downward).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
  pub x: f64,
  pub y: f64,
}

impl Point {
  pub fn new(x: f64, y: f64) -> Self {
    Self { x, y }
  }
}

/// Dominant flow direction of a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
  Horizontal,
  Vertical,
}

/// Axis-aligned extent of a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
  pub min_x: f64,
  pub max_x: f64,
  pub min_y: f64,
  pub max_y: f64,
}

impl Extent {
  /// Compute the extent of `points`, or `None` when there are none.
  pub fn of<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Self> {
    let mut points = points.into_iter();
    let first = points.next()?;

    let seed = Extent {
      min_x: first.x,
      max_x: first.x,
      min_y: first.y,
      max_y: first.y,
    };

    Some(points.fold(seed, |extent, p| Extent {
      min_x: extent.min_x.min(p.x),
      max_x: extent.max_x.max(p.x),
      min_y: extent.min_y.min(p.y),
      max_y: extent.max_y.max(p.y),
    }))
  }

  pub fn x_range(&self) -> f64 {
    self.max_x - self.min_x
  }

  pub fn y_range(&self) -> f64 {
    self.max_y - self.min_y
  }

  /// Horizontal only when the x spread strictly exceeds the y spread.
  pub fn orientation(&self) -> Orientation {
    if self.x_range() > self.y_range() {
      Orientation::Horizontal
    } else {
      Orientation::Vertical
    }
  }
}

/// Classify the dominant orientation of a layout.
///
/// Ties, empty input, a single point and fully coincident points all
/// classify as [`Orientation::Vertical`].
pub fn classify(points: &[Point]) -> Orientation {
  Extent::of(points)
    .map(|extent| extent.orientation())
    .unwrap_or(Orientation::Vertical)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_extent_of_points() {
    let points = [
      Point::new(10.0, -5.0),
      Point::new(-20.0, 40.0),
      Point::new(5.0, 0.0),
    ];
    let extent = Extent::of(&points).unwrap();

    assert_eq!(extent.min_x, -20.0);
    assert_eq!(extent.max_x, 10.0);
    assert_eq!(extent.x_range(), 30.0);
    assert_eq!(extent.y_range(), 45.0);
  }

  #[test]
  fn test_empty_extent() {
    assert_eq!(Extent::of(&[] as &[Point]), None);
  }

  #[test]
  fn test_wide_layout_is_horizontal() {
    let points = [
      Point::new(0.0, 0.0),
      Point::new(300.0, 0.0),
      Point::new(600.0, 0.0),
    ];
    assert_eq!(classify(&points), Orientation::Horizontal);
  }

  #[test]
  fn test_tall_layout_is_vertical() {
    let points = [Point::new(0.0, 0.0), Point::new(50.0, 400.0)];
    assert_eq!(classify(&points), Orientation::Vertical);
  }

  #[test]
  fn test_tie_is_vertical() {
    let points = [Point::new(0.0, 0.0), Point::new(100.0, 100.0)];
    assert_eq!(classify(&points), Orientation::Vertical);
  }

  #[test]
  fn test_degenerate_inputs_are_vertical() {
    assert_eq!(classify(&[]), Orientation::Vertical);
    assert_eq!(classify(&[Point::new(500.0, 0.0)]), Orientation::Vertical);
    assert_eq!(
      classify(&[Point::new(7.0, 7.0), Point::new(7.0, 7.0)]),
      Orientation::Vertical
    );
  }
}
