use crate::models::TermStats;

/// Z-score magnitude above which a term is an outlier
pub const OUTLIER_Z: f64 = 2.0;

/// Floor for every statistical term recommendation, and the fallback term
/// when no usable data exists.
pub const MIN_TERM_DAYS: i64 = 30;

/// Mean and population standard deviation. `None` for an empty sample.
pub fn summarize(values: &[i64]) -> Option<TermStats> {
    if values.is_empty() {
        return None;
    }
    let count = values.len();
    let n = count as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;

    Some(TermStats {
        mean,
        std_dev: variance.sqrt(),
        count,
    })
}

/// A zero standard deviation never produces outliers.
pub fn is_outlier(value: f64, mean: f64, std_dev: f64) -> bool {
    if std_dev == 0.0 {
        return false;
    }
    ((value - mean) / std_dev).abs() > OUTLIER_Z
}

/// Indices of the values that survive one outlier pass against the
/// statistics of the full input (no iterative recomputation).
pub fn clean_indices(values: &[i64]) -> Vec<usize> {
    let Some(stats) = summarize(values) else {
        return Vec::new();
    };
    values
        .iter()
        .enumerate()
        .filter(|(_, &v)| !is_outlier(v as f64, stats.mean, stats.std_dev))
        .map(|(i, _)| i)
        .collect()
}

/// Single-pass outlier rejection. An empty result means "no reliable data".
pub fn filter_outliers(values: &[i64]) -> Vec<i64> {
    clean_indices(values).into_iter().map(|i| values[i]).collect()
}

/// `max(floor, round(mean + 0.5 * std_dev))`, rounding halves to even
/// (42.5 -> 42, 53.5 -> 54).
pub fn padded_term(mean: f64, std_dev: f64, floor: i64) -> i64 {
    let padded = (mean + 0.5 * std_dev).round_ties_even() as i64;
    padded.max(floor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_uses_population_deviation() {
        let stats = summarize(&[20, 22]).unwrap();
        assert_eq!(stats.mean, 21.0);
        assert_eq!(stats.std_dev, 1.0);
        assert_eq!(stats.count, 2);
        assert!(summarize(&[]).is_none());
    }

    #[test]
    fn uniform_sample_is_left_untouched() {
        for sample in [vec![30], vec![45, 45, 45, 45], vec![0; 12]] {
            assert_eq!(filter_outliers(&sample), sample);
        }
    }

    #[test]
    fn rejects_values_beyond_two_sigma() {
        let sample = vec![10, 10, 10, 10, 10, 10, 10, 10, 10, 100];
        // mean 19, std 27: z(100) = 3
        assert_eq!(filter_outliers(&sample), vec![10; 9]);
    }

    #[test]
    fn second_pass_on_clean_uniform_set_is_stable() {
        let sample = vec![10, 10, 10, 10, 10, 10, 10, 10, 10, 100];
        let once = filter_outliers(&sample);
        assert_eq!(filter_outliers(&once), once);
    }

    #[test]
    fn single_pass_uses_original_statistics() {
        // With 200 in the sample, 20 sits at the mean and survives. Once 200
        // is gone the recomputed deviation shrinks and 20 becomes an outlier,
        // so a second pass removes it: the filter is not a fixed point.
        let mut sample = vec![10; 18];
        sample.push(20);
        sample.push(200);

        let once = filter_outliers(&sample);
        assert_eq!(once.len(), 19);
        assert!(once.contains(&20));

        let twice = filter_outliers(&once);
        assert_eq!(twice, vec![10; 18]);
    }

    #[test]
    fn empty_input_yields_empty_clean_set() {
        assert!(filter_outliers(&[]).is_empty());
    }

    #[test]
    fn padded_term_is_floored_at_thirty() {
        assert_eq!(padded_term(21.0, 1.0, MIN_TERM_DAYS), 30);
        assert_eq!(padded_term(44.0, 1.0, 30), 45);
    }

    #[test]
    fn padded_term_rounds_halves_to_even() {
        assert_eq!(padded_term(40.0, 5.0, 30), 42);
        assert_eq!(padded_term(41.0, 1.0, 30), 42);
        assert_eq!(padded_term(40.0, 27.0, 30), 54);
        assert_eq!(padded_term(35.0, 5.0, 30), 38);
    }
}
