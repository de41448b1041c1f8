pub mod observation;
pub mod pollutant;

pub use observation::*;
pub use pollutant::*;
