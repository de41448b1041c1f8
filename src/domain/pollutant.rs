use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Pollutants tracked by the forecaster.
///
/// Declaration order is the canonical order used for feature layouts,
/// persisted artifacts and response maps.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Pollutant {
    /// Fine particulate matter (µg/m³)
    Pm25,
    /// Coarse particulate matter (µg/m³)
    Pm10,
    /// Carbon dioxide (ppm)
    Co2,
    /// Nitrogen dioxide (ppb)
    No2,
    /// Sulfur dioxide (ppb)
    So2,
    /// Ozone (ppb)
    O3,
}

impl Pollutant {
    pub const ALL: [Pollutant; 6] = [
        Pollutant::Pm25,
        Pollutant::Pm10,
        Pollutant::Co2,
        Pollutant::No2,
        Pollutant::So2,
        Pollutant::O3,
    ];

    /// Iterate pollutants in canonical order
    pub fn all() -> impl Iterator<Item = Pollutant> {
        Pollutant::iter()
    }

    /// Column name of the raw concentration
    pub fn column(&self) -> &'static str {
        match self {
            Pollutant::Pm25 => "pm25",
            Pollutant::Pm10 => "pm10",
            Pollutant::Co2 => "co2",
            Pollutant::No2 => "no2",
            Pollutant::So2 => "so2",
            Pollutant::O3 => "o3",
        }
    }
}
