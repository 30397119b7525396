pub mod bridge;
pub mod histogram;
pub mod model;
