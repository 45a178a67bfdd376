//! Numeric helpers shared by the predictor, the aggregator and the
//! CAT inference

pub mod errors;

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Default lower/upper bound applied to PSI values before logit transformation
pub const CLIP_THRESHOLD: f64 = 0.01;

#[cfg(not(windows))]
const TICK_SETTINGS: (&str, u64) = ("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ", 80);
#[cfg(windows)]
const TICK_SETTINGS: (&str, u64) = (r"+-x| ", 200);

/// Clips `x` into `[threshold, 1 - threshold]`
///
/// # Examples
///
/// ```rust
/// use splicing_outlier::utils::clip;
///
/// assert_eq!(clip(0.0, 0.01), 0.01);
/// assert_eq!(clip(0.5, 0.01), 0.5);
/// assert_eq!(clip(1.0, 0.01), 0.99);
/// ```
pub fn clip(x: f64, threshold: f64) -> f64 {
    x.max(threshold).min(1.0 - threshold)
}

pub fn logit(x: f64) -> f64 {
    (x / (1.0 - x)).ln()
}

pub fn expit(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Converts a change in logit(PSI) into a change in PSI
///
/// `ref_psi` is clipped by `clip_threshold` before the conversion.
/// For heterozygous carriers (`genotype == Some(1)`) the predicted PSI
/// is the mean of reference and alternative PSI.
///
/// # Examples
///
/// ```rust
/// use splicing_outlier::utils::delta_logit_psi_to_delta_psi;
///
/// let delta = delta_logit_psi_to_delta_psi(0.0, 0.3, 0.01, None);
/// assert!(delta.abs() < 1e-12);
///
/// let delta = delta_logit_psi_to_delta_psi(-10.0, 0.8, 0.01, None);
/// assert!(delta < -0.79);
/// ```
pub fn delta_logit_psi_to_delta_psi(
    delta_logit_psi: f64,
    ref_psi: f64,
    clip_threshold: f64,
    genotype: Option<u8>,
) -> f64 {
    let ref_psi = clip(ref_psi, clip_threshold);
    let mut pred_psi = expit(delta_logit_psi + logit(ref_psi));
    if genotype == Some(1) {
        pred_psi = (pred_psi + ref_psi) / 2.0;
    }
    pred_psi - ref_psi
}

/// Returns, for every group, the row with the largest absolute `value`
///
/// Rows without a group key or with a `NaN` value are ignored. On ties the
/// first row of the group is kept. Groups are returned ordered by key.
pub fn get_abs_max_rows<T, K, F, V>(rows: &[T], key: F, value: V) -> Vec<T>
where
    T: Clone,
    K: Ord,
    F: Fn(&T) -> Option<K>,
    V: Fn(&T) -> f64,
{
    let mut best: BTreeMap<K, (usize, f64)> = BTreeMap::new();
    for (idx, row) in rows.iter().enumerate() {
        let Some(k) = key(row) else {
            continue;
        };
        let v = value(row).abs();
        if v.is_nan() {
            continue;
        }
        match best.entry(k) {
            Entry::Vacant(e) => {
                e.insert((idx, v));
            }
            Entry::Occupied(mut e) => {
                if v > e.get().1 {
                    e.insert((idx, v));
                }
            }
        }
    }
    best.into_values().map(|(idx, _)| rows[idx].clone()).collect()
}

/// Returns a spinner that reports processed batches, or a hidden bar
pub fn get_progress_bar(progress: bool, msg: &str) -> ProgressBar {
    if !progress {
        return ProgressBar::hidden();
    }
    let progress_bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars(TICK_SETTINGS.0)
        .template(" {spinner} {msg:<30} {pos} batches [{elapsed_precise}]")
    {
        progress_bar.set_style(style);
    }
    progress_bar.enable_steady_tick(Duration::from_millis(TICK_SETTINGS.1));
    progress_bar.set_message(msg.to_owned());
    progress_bar
}
