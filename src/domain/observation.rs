//! Observation records and the time-ordered series built from them

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Pollutant;
use crate::error::{AirQualityError, Result};

/// Season index used throughout the pipeline: (month - 1) / 3
///
/// 0 = Jan-Mar, 1 = Apr-Jun, 2 = Jul-Sep, 3 = Oct-Dec.
pub fn season_of_month(month: u32) -> u32 {
    (month.clamp(1, 12) - 1) / 3
}

/// Calendar context of a single hour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalContext {
    /// Hour of day (0-23)
    pub hour: u32,
    /// Day of week (0=Monday, 6=Sunday)
    pub day_of_week: u32,
    /// Month (1-12)
    pub month: u32,
    /// Season index (0-3)
    pub season: u32,
}

impl TemporalContext {
    pub fn from_timestamp(timestamp: NaiveDateTime) -> Self {
        let month = timestamp.month();
        Self {
            hour: timestamp.hour(),
            day_of_week: timestamp.weekday().num_days_from_monday(),
            month,
            season: season_of_month(month),
        }
    }

    /// Monday through Friday
    pub fn is_weekday(&self) -> bool {
        self.day_of_week < 5
    }
}

/// One hourly sample of weather and pollutant concentrations
///
/// Temporal attributes are never stored; they are derived from `timestamp`
/// on access. A `None` reading is a data gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    #[serde(alias = "datetime")]
    pub timestamp: NaiveDateTime,
    /// Air temperature (Celsius)
    pub temperature: f64,
    /// Relative humidity (%)
    pub humidity: f64,
    /// Wind speed (m/s)
    pub wind_speed: f64,
    /// Air pressure (hPa)
    pub pressure: f64,
    #[serde(default)]
    pub pm25: Option<f64>,
    #[serde(default)]
    pub pm10: Option<f64>,
    #[serde(default)]
    pub co2: Option<f64>,
    #[serde(default)]
    pub no2: Option<f64>,
    #[serde(default)]
    pub so2: Option<f64>,
    #[serde(default)]
    pub o3: Option<f64>,
}

impl ObservationRecord {
    /// Record with weather only; every pollutant reading is missing
    pub fn new(
        timestamp: NaiveDateTime,
        temperature: f64,
        humidity: f64,
        wind_speed: f64,
        pressure: f64,
    ) -> Self {
        Self {
            timestamp,
            temperature,
            humidity,
            wind_speed,
            pressure,
            pm25: None,
            pm10: None,
            co2: None,
            no2: None,
            so2: None,
            o3: None,
        }
    }

    pub fn temporal(&self) -> TemporalContext {
        TemporalContext::from_timestamp(self.timestamp)
    }

    pub fn reading(&self, pollutant: Pollutant) -> Option<f64> {
        match pollutant {
            Pollutant::Pm25 => self.pm25,
            Pollutant::Pm10 => self.pm10,
            Pollutant::Co2 => self.co2,
            Pollutant::No2 => self.no2,
            Pollutant::So2 => self.so2,
            Pollutant::O3 => self.o3,
        }
    }

    pub fn set_reading(&mut self, pollutant: Pollutant, value: Option<f64>) {
        let slot = match pollutant {
            Pollutant::Pm25 => &mut self.pm25,
            Pollutant::Pm10 => &mut self.pm10,
            Pollutant::Co2 => &mut self.co2,
            Pollutant::No2 => &mut self.no2,
            Pollutant::So2 => &mut self.so2,
            Pollutant::O3 => &mut self.o3,
        };
        *slot = value;
    }

    pub fn with_reading(mut self, pollutant: Pollutant, value: f64) -> Self {
        self.set_reading(pollutant, Some(value));
        self
    }
}

/// Records ordered strictly by timestamp
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObservationSeries {
    records: Vec<ObservationRecord>,
}

impl ObservationSeries {
    /// Build a series from records that are already in strict time order
    pub fn new(records: Vec<ObservationRecord>) -> Result<Self> {
        if let Some(index) = records
            .windows(2)
            .position(|pair| pair[1].timestamp <= pair[0].timestamp)
        {
            return Err(AirQualityError::UnorderedSeries { index: index + 1 });
        }
        Ok(Self { records })
    }

    /// Sort records by timestamp, rejecting duplicate timestamps
    pub fn sorted(mut records: Vec<ObservationRecord>) -> Result<Self> {
        records.sort_by_key(|r| r.timestamp);
        Self::new(records)
    }

    pub fn records(&self) -> &[ObservationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Readings of one pollutant in series order
    pub fn column(&self, pollutant: Pollutant) -> Vec<Option<f64>> {
        self.records.iter().map(|r| r.reading(pollutant)).collect()
    }

    pub fn into_records(self) -> Vec<ObservationRecord> {
        self.records
    }
}

/// Current weather and calendar context used to seed a forecast
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct CurrentConditions {
    #[validate(range(min = -90.0, max = 60.0))]
    pub temperature: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub humidity: f64,
    #[validate(range(min = 0.0, max = 150.0))]
    pub wind_speed: f64,
    #[validate(range(min = 800.0, max = 1100.0))]
    pub pressure: f64,
    #[validate(range(max = 23))]
    pub hour: u32,
    #[validate(range(max = 6))]
    pub day_of_week: u32,
    #[validate(range(min = 1, max = 12))]
    pub month: u32,
    #[validate(range(max = 3))]
    pub season: u32,
}

impl CurrentConditions {
    /// Conditions for the hour of an observed record
    pub fn from_record(record: &ObservationRecord) -> Self {
        let temporal = record.temporal();
        Self {
            temperature: record.temperature,
            humidity: record.humidity,
            wind_speed: record.wind_speed,
            pressure: record.pressure,
            hour: temporal.hour,
            day_of_week: temporal.day_of_week,
            month: temporal.month,
            season: temporal.season,
        }
    }

    /// Reject out-of-range fields
    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|e| AirQualityError::InvalidInput(e.to_string()))
    }

    pub fn temporal(&self) -> TemporalContext {
        TemporalContext {
            hour: self.hour,
            day_of_week: self.day_of_week,
            month: self.month,
            season: self.season,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_temporal_derived_from_timestamp() {
        // 2020-01-06 was a Monday
        let record = ObservationRecord::new(ts(6, 8), 10.0, 50.0, 3.0, 1013.0);
        let temporal = record.temporal();
        assert_eq!(temporal.hour, 8);
        assert_eq!(temporal.day_of_week, 0);
        assert_eq!(temporal.month, 1);
        assert_eq!(temporal.season, 0);
        assert!(temporal.is_weekday());
    }

    #[test]
    fn test_season_index() {
        assert_eq!(season_of_month(1), 0);
        assert_eq!(season_of_month(3), 0);
        assert_eq!(season_of_month(4), 1);
        assert_eq!(season_of_month(9), 2);
        assert_eq!(season_of_month(12), 3);
    }

    #[test]
    fn test_series_rejects_unordered() {
        let a = ObservationRecord::new(ts(1, 1), 0.0, 50.0, 1.0, 1013.0);
        let b = ObservationRecord::new(ts(1, 0), 0.0, 50.0, 1.0, 1013.0);
        let err = ObservationSeries::new(vec![a.clone(), b.clone()]).unwrap_err();
        assert!(matches!(err, AirQualityError::UnorderedSeries { index: 1 }));

        let sorted = ObservationSeries::sorted(vec![a.clone(), b]).unwrap();
        assert_eq!(sorted.records()[1], a);
    }

    #[test]
    fn test_series_rejects_duplicates() {
        let a = ObservationRecord::new(ts(1, 1), 0.0, 50.0, 1.0, 1013.0);
        assert!(ObservationSeries::sorted(vec![a.clone(), a]).is_err());
    }

    #[test]
    fn test_reading_accessors() {
        let mut record = ObservationRecord::new(ts(1, 0), 0.0, 50.0, 1.0, 1013.0)
            .with_reading(Pollutant::No2, 21.5);
        assert_eq!(record.reading(Pollutant::No2), Some(21.5));
        assert_eq!(record.reading(Pollutant::O3), None);
        record.set_reading(Pollutant::No2, None);
        assert_eq!(record.reading(Pollutant::No2), None);
    }

    #[test]
    fn test_record_accepts_datetime_alias() {
        let json = r#"{"datetime":"2020-01-01T05:00:00","temperature":3.0,"humidity":60.0,
            "wind_speed":2.0,"pressure":1010.0,"pm25":12.5}"#;
        let record: ObservationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.timestamp, ts(1, 5));
        assert_eq!(record.pm25, Some(12.5));
        assert_eq!(record.o3, None);
    }

    #[test]
    fn test_conditions_validation() {
        let record = ObservationRecord::new(ts(1, 5), 3.0, 60.0, 2.0, 1010.0);
        let mut conditions = CurrentConditions::from_record(&record);
        assert!(conditions.check().is_ok());

        conditions.hour = 24;
        assert!(matches!(
            conditions.check(),
            Err(AirQualityError::InvalidInput(_))
        ));
    }
}
