//! Wine recognition dataset
//!
//! 178 wines from three cultivars described by 13 chemical measurements.
//! Rows are drawn from per-class normal profiles with a fixed seed, so every
//! call returns the same frame.

use polars::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{Result, StudioError};

/// Name of the label column
pub const WINE_TARGET: &str = "target";

/// Feature column names, in frame order
pub const WINE_FEATURES: [&str; 13] = [
    "alcohol",
    "malic_acid",
    "ash",
    "alcalinity_of_ash",
    "magnesium",
    "total_phenols",
    "flavanoids",
    "nonflavanoid_phenols",
    "proanthocyanins",
    "color_intensity",
    "hue",
    "od280/od315_of_diluted_wines",
    "proline",
];

/// Rows per class (class 0, 1, 2)
pub const WINE_CLASS_COUNTS: [usize; 3] = [59, 71, 48];

const WINE_SEED: u64 = 0x5749_4E45;

/// (mean, std) per feature for each class
const CLASS_PROFILES: [[(f64, f64); 13]; 3] = [
    [
        (13.74, 0.46), (2.01, 0.69), (2.46, 0.23), (17.04, 2.55), (106.34, 10.50),
        (2.84, 0.34), (2.98, 0.40), (0.29, 0.07), (1.90, 0.41), (5.53, 1.24),
        (1.06, 0.12), (3.16, 0.36), (1115.71, 221.52),
    ],
    [
        (12.28, 0.54), (1.93, 1.02), (2.24, 0.32), (20.24, 3.35), (94.55, 16.75),
        (2.26, 0.55), (2.08, 0.71), (0.36, 0.12), (1.63, 0.60), (3.09, 0.92),
        (1.06, 0.20), (2.79, 0.50), (519.51, 157.21),
    ],
    [
        (13.15, 0.53), (3.33, 1.09), (2.44, 0.18), (21.42, 2.26), (99.31, 10.89),
        (1.68, 0.36), (0.78, 0.29), (0.45, 0.12), (1.15, 0.41), (7.40, 2.31),
        (0.68, 0.11), (1.68, 0.27), (629.90, 115.10),
    ],
];

/// Load the bundled wine dataset: 13 float features plus an `i32` target column.
pub fn load_wine() -> Result<DataFrame> {
    let mut rng = ChaCha8Rng::seed_from_u64(WINE_SEED);
    let n_rows: usize = WINE_CLASS_COUNTS.iter().sum();

    let mut features: Vec<Vec<f64>> = vec![Vec::with_capacity(n_rows); WINE_FEATURES.len()];
    let mut target: Vec<i32> = Vec::with_capacity(n_rows);

    for (class, (&count, profile)) in WINE_CLASS_COUNTS.iter().zip(CLASS_PROFILES.iter()).enumerate() {
        let distributions = profile
            .iter()
            .map(|&(mean, std)| Normal::new(mean, std).map_err(|e| StudioError::DataError(e.to_string())))
            .collect::<Result<Vec<_>>>()?;

        for _ in 0..count {
            for (j, dist) in distributions.iter().enumerate() {
                // Measurements are positive; keep the lower tail above zero.
                let floor = profile[j].0 * 0.1;
                let value = dist.sample(&mut rng).max(floor);
                features[j].push(round_measurement(j, value));
            }
            target.push(class as i32);
        }
    }

    let mut columns: Vec<Column> = WINE_FEATURES
        .iter()
        .zip(features)
        .map(|(name, values)| Series::new((*name).into(), values).into())
        .collect();
    columns.push(Series::new(WINE_TARGET.into(), target).into());

    Ok(DataFrame::new(columns)?)
}

fn round_measurement(feature_idx: usize, value: f64) -> f64 {
    match WINE_FEATURES[feature_idx] {
        "magnesium" | "proline" => value.round(),
        "hue" | "nonflavanoid_phenols" => (value * 1000.0).round() / 1000.0,
        _ => (value * 100.0).round() / 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wine_shape() {
        let df = load_wine().unwrap();
        assert_eq!(df.height(), 178);
        assert_eq!(df.width(), WINE_FEATURES.len() + 1);
        assert!(df.column(WINE_TARGET).is_ok());
    }

    #[test]
    fn test_wine_is_fixed() {
        let a = load_wine().unwrap();
        let b = load_wine().unwrap();
        assert!(a.equals(&b));
    }

    #[test]
    fn test_wine_class_counts() {
        let df = load_wine().unwrap();
        let target: Vec<i32> = df
            .column(WINE_TARGET)
            .unwrap()
            .as_materialized_series()
            .i32()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap())
            .collect();
        for (class, &expected) in WINE_CLASS_COUNTS.iter().enumerate() {
            let n = target.iter().filter(|&&t| t == class as i32).count();
            assert_eq!(n, expected);
        }
    }
}
