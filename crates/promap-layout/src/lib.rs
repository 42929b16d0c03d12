//! Promap Layout
//!
//! Pure geometry used when a blueprint is materialized:
//!
//! 1. **Classify**: the bounding-box spread of all step positions decides
//!    whether the blueprint flows horizontally or vertically.
//! 2. **Transform**: horizontal blueprints are re-oriented to a top-to-bottom
//!    flow by swapping axes, which keeps relative spacing and branch fan-out
//!    without rescaling.
//!
//! Classification happens once per blueprint; the resulting [`Orientation`]
//! is then applied to every point independently.
//!
//! ```
//! use promap_layout::{Orientation, Point, normalize};
//!
//! let points = [Point::new(0.0, 0.0), Point::new(300.0, 0.0)];
//! let layout = normalize(&points);
//!
//! assert_eq!(layout.orientation, Orientation::Horizontal);
//! assert_eq!(layout.points[1], Point::new(0.0, 300.0));
//! ```

mod orientation;
mod transform;

pub use orientation::{Extent, Orientation, Point, classify};
pub use transform::{NormalizedLayout, normalize};
