pub mod area;
pub mod smoothing;
pub mod threshold;
pub mod vectorize;

pub use area::{estimate_area, AreaEstimator, AreaResult};
pub use smoothing::{smooth, Smoother, WindowShape};
pub use threshold::{threshold, Comparator, Thresholder};
pub use vectorize::{label_components, rasterize, vectorize, Adjacency, PolygonFeature, Vectorizer};
