pub mod ascii_grid;
pub mod synthetic;

pub use ascii_grid::AsciiGridSource;
pub use synthetic::SyntheticSource;
