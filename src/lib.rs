pub mod pls;
pub mod statistics;
mod dense;
mod error;
mod utils;

pub use error::PrmError;
pub use utils::RowDistances;
pub use utils::RowScale;
