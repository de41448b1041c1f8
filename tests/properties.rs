use air_quality_forecaster::aqi::composite_index;
use air_quality_forecaster::domain::Pollutant;
use air_quality_forecaster::forecast::features::{lag, rolling_mean, FeaturePipeline};
use air_quality_forecaster::simulation::{EnvironmentConfig, EnvironmentSimulator};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn pollutant() -> impl Strategy<Value = Pollutant> {
    prop::sample::select(Pollutant::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn simulated_pollutants_are_non_negative(seed in any::<u64>(), n in 1usize..200) {
        let simulator = EnvironmentSimulator::new(EnvironmentConfig::default().with_random_seed(seed)).unwrap();
        let series = simulator.generate(n);
        prop_assert_eq!(series.len(), n);
        for record in series.records() {
            for p in Pollutant::all() {
                let value = record.reading(p).unwrap();
                prop_assert!(value >= 0.0, "{} was {}", p, value);
            }
        }
    }

    #[test]
    fn augmentation_is_idempotent(seed in any::<u64>(), n in 1usize..60) {
        let series = EnvironmentSimulator::new(EnvironmentConfig::default().with_random_seed(seed))
            .unwrap()
            .generate(n);
        let pipeline = FeaturePipeline::new();
        let once = pipeline.augment(&series);
        let twice = pipeline.augment_frame(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn lag_one_shifts_by_one(values in prop::collection::vec(prop::option::of(0.0f64..1000.0), 1..50)) {
        let lagged = lag(&values, 1);
        prop_assert_eq!(lagged.len(), values.len());
        prop_assert_eq!(lagged[0], None);
        for i in 1..values.len() {
            prop_assert_eq!(lagged[i], values[i - 1]);
        }
    }

    #[test]
    fn rolling_mean_stays_within_window_bounds(values in prop::collection::vec(0.0f64..500.0, 1..50)) {
        let wrapped: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
        let means = rolling_mean(&wrapped, 3);
        for (i, mean) in means.iter().enumerate() {
            let window = &values[i.saturating_sub(2)..=i];
            let lo = window.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mean = mean.unwrap();
            prop_assert!(mean >= lo - 1e-9 && mean <= hi + 1e-9);
        }
    }

    #[test]
    fn composite_index_is_bounded(p in pollutant(), c in 0.0f64..100_000.0) {
        let result = composite_index(&BTreeMap::from([(p, c)]));
        prop_assert!(result.aqi <= 500);
        prop_assert_eq!(result.dominant_pollutant, Some(p));
    }
}
