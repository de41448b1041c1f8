//! Feature engineering for pollutant forecasting models
//!
//! Turns an observation series (or a single current-conditions snapshot)
//! into the fixed feature layout shared by training and inference.

use std::collections::HashMap;

use crate::domain::{CurrentConditions, ObservationSeries, Pollutant, TemporalContext};
use crate::ml::FeatureVector;

/// Weather and calendar columns, in layout order
pub const BASE_COLUMNS: [&str; 8] = [
    "temperature",
    "humidity",
    "wind_speed",
    "pressure",
    "hour",
    "day_of_week",
    "month",
    "season",
];

/// Per-pollutant features derived from a target column's history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedFeature {
    /// Value one hour earlier
    Lag1,
    /// Value 24 hours earlier
    Lag24,
    /// Trailing 3-hour mean including the current hour
    Rolling3h,
    /// Trailing 24-hour mean including the current hour
    Rolling24h,
}

impl DerivedFeature {
    pub const ALL: [DerivedFeature; 4] = [
        DerivedFeature::Lag1,
        DerivedFeature::Lag24,
        DerivedFeature::Rolling3h,
        DerivedFeature::Rolling24h,
    ];

    fn suffix(&self) -> &'static str {
        match self {
            DerivedFeature::Lag1 => "lag1",
            DerivedFeature::Lag24 => "lag24",
            DerivedFeature::Rolling3h => "rolling_3h",
            DerivedFeature::Rolling24h => "rolling_24h",
        }
    }

    pub fn column(&self, pollutant: Pollutant) -> String {
        format!("{}_{}", pollutant.column(), self.suffix())
    }

    fn compute(&self, values: &[Option<f64>]) -> Vec<Option<f64>> {
        match self {
            DerivedFeature::Lag1 => lag(values, 1),
            DerivedFeature::Lag24 => lag(values, 24),
            DerivedFeature::Rolling3h => rolling_mean(values, 3),
            DerivedFeature::Rolling24h => rolling_mean(values, 24),
        }
    }
}

/// The ordered feature columns seen by every model
///
/// Base columns first, then lag columns per pollutant, then rolling columns
/// per pollutant. Raw targets and timestamps never appear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureLayout {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl FeatureLayout {
    pub fn standard() -> Self {
        let mut names: Vec<String> = BASE_COLUMNS.iter().map(|c| c.to_string()).collect();
        for p in Pollutant::all() {
            names.push(DerivedFeature::Lag1.column(p));
            names.push(DerivedFeature::Lag24.column(p));
        }
        for p in Pollutant::all() {
            names.push(DerivedFeature::Rolling3h.column(p));
            names.push(DerivedFeature::Rolling24h.column(p));
        }
        let index = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        Self { names, index }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn derived_index(&self, pollutant: Pollutant, feature: DerivedFeature) -> Option<usize> {
        self.index_of(&feature.column(pollutant))
    }
}

impl Default for FeatureLayout {
    fn default() -> Self {
        Self::standard()
    }
}

/// Order-stable column store with optional (gap-aware) values
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    rows: usize,
    names: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
}

impl FeatureFrame {
    /// Base weather/calendar columns plus every raw pollutant column
    pub fn from_series(series: &ObservationSeries) -> Self {
        let records = series.records();
        let mut frame = Self::empty(records.len());

        let temporal: Vec<TemporalContext> = records.iter().map(|r| r.temporal()).collect();
        frame.upsert("temperature", records.iter().map(|r| Some(r.temperature)).collect());
        frame.upsert("humidity", records.iter().map(|r| Some(r.humidity)).collect());
        frame.upsert("wind_speed", records.iter().map(|r| Some(r.wind_speed)).collect());
        frame.upsert("pressure", records.iter().map(|r| Some(r.pressure)).collect());
        frame.upsert("hour", temporal.iter().map(|t| Some(t.hour as f64)).collect());
        frame.upsert(
            "day_of_week",
            temporal.iter().map(|t| Some(t.day_of_week as f64)).collect(),
        );
        frame.upsert("month", temporal.iter().map(|t| Some(t.month as f64)).collect());
        frame.upsert("season", temporal.iter().map(|t| Some(t.season as f64)).collect());

        for p in Pollutant::all() {
            frame.upsert(p.column(), series.column(p));
        }
        frame
    }

    /// Single-row frame holding only base columns; no target history exists
    pub fn from_conditions(conditions: &CurrentConditions) -> Self {
        let mut frame = Self::empty(1);
        let values = [
            conditions.temperature,
            conditions.humidity,
            conditions.wind_speed,
            conditions.pressure,
            conditions.hour as f64,
            conditions.day_of_week as f64,
            conditions.month as f64,
            conditions.season as f64,
        ];
        for (name, value) in BASE_COLUMNS.iter().zip(values) {
            frame.upsert(name, vec![Some(value)]);
        }
        frame
    }

    fn empty(rows: usize) -> Self {
        Self {
            rows,
            names: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Insert a column, or replace it in place if the name already exists
    ///
    /// Columns shorter than the frame are padded with gaps; longer ones are
    /// truncated.
    pub fn upsert(&mut self, name: &str, mut values: Vec<Option<f64>>) {
        values.resize(self.rows, None);
        match self.names.iter().position(|n| n == name) {
            Some(i) => self.columns[i] = values,
            None => {
                self.names.push(name.to_string());
                self.columns.push(values);
            }
        }
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Row-major matrix in layout order
    ///
    /// Gaps are forward-filled, then zero-filled. Layout columns missing from
    /// the frame are all zero.
    pub fn feature_matrix(&self, layout: &FeatureLayout) -> Vec<Vec<f64>> {
        let filled: Vec<Vec<f64>> = layout
            .names()
            .iter()
            .map(|name| match self.column(name) {
                Some(values) => forward_fill(values)
                    .into_iter()
                    .map(|v| v.unwrap_or(0.0))
                    .collect(),
                None => vec![0.0; self.rows],
            })
            .collect();

        (0..self.rows)
            .map(|row| filled.iter().map(|column| column[row]).collect())
            .collect()
    }

    /// Forward-filled target column; leading gaps stay missing
    pub fn target(&self, pollutant: Pollutant) -> Vec<Option<f64>> {
        self.column(pollutant.column())
            .map(forward_fill)
            .unwrap_or_else(|| vec![None; self.rows])
    }
}

/// Derives lag and rolling features for every pollutant column present
#[derive(Debug, Clone, Default)]
pub struct FeaturePipeline {
    layout: FeatureLayout,
}

impl FeaturePipeline {
    pub fn new() -> Self {
        Self {
            layout: FeatureLayout::standard(),
        }
    }

    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    pub fn augment(&self, series: &ObservationSeries) -> FeatureFrame {
        self.augment_frame(&FeatureFrame::from_series(series))
    }

    /// Return a copy of `frame` with derived columns (re)computed
    ///
    /// Existing derived columns are overwritten in place; unrelated columns
    /// keep their values and position.
    pub fn augment_frame(&self, frame: &FeatureFrame) -> FeatureFrame {
        let mut augmented = frame.clone();
        for p in Pollutant::all() {
            let Some(values) = frame.column(p.column()).map(|v| v.to_vec()) else {
                continue;
            };
            for feature in DerivedFeature::ALL {
                augmented.upsert(&feature.column(p), feature.compute(&values));
            }
        }
        augmented
    }

    /// Feature vector for a forecast seeded from current conditions
    pub fn conditions_vector(&self, conditions: &CurrentConditions) -> FeatureVector {
        let frame = self.augment_frame(&FeatureFrame::from_conditions(conditions));
        let features = frame
            .feature_matrix(&self.layout)
            .into_iter()
            .next()
            .unwrap_or_else(|| vec![0.0; self.layout.len()]);
        FeatureVector {
            features,
            feature_names: self.layout.names().to_vec(),
        }
    }
}

/// Shift values forward by `periods`; the first positions become gaps
pub fn lag(values: &[Option<f64>], periods: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| if i >= periods { values[i - periods] } else { None })
        .collect()
}

/// Trailing mean over `window` positions ending at each index
///
/// Gaps are skipped; a window with no observed value yields a gap.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let observed: Vec<f64> = values[start..=i].iter().flatten().copied().collect();
            if observed.is_empty() {
                None
            } else {
                Some(observed.iter().sum::<f64>() / observed.len() as f64)
            }
        })
        .collect()
}

/// Carry the last observed value forward over gaps
pub fn forward_fill(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut last = None;
    values
        .iter()
        .map(|v| {
            if v.is_some() {
                last = *v;
            }
            last
        })
        .collect()
}
