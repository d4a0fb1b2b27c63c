//! Display helpers: trigger alignment and plot axes.
//!
//! These are the pure parts of the "pull" side: a renderer pops a block,
//! aligns it to the trigger level so the trace holds still across
//! refreshes, and labels both plots with real units.

/// First index where the signal crosses `level` upward, scanning from 0:
/// the first `i` with `samples[i] <= level` and `samples[i + 1] > level`.
/// Returns 0 when no crossing exists, so the caller displays the whole
/// block.
pub fn trigger_index(samples: &[f32], level: f32) -> usize {
    for i in 0..samples.len().saturating_sub(1) {
        if samples[i] <= level && samples[i + 1] > level {
            return i;
        }
    }
    0
}

/// Time axis in seconds for `len` samples at `sample_rate`: 0, 1/R, 2/R, …
pub fn time_axis(len: usize, sample_rate: u32) -> Vec<f32> {
    let sr = sample_rate.max(1) as f32;
    (0..len).map(|i| i as f32 / sr).collect()
}

/// Frequency axis in Hz for a half-spectrum of `half_len` bins out of an
/// `n`-point transform: bin k sits at `k · sample_rate / n`.
pub fn frequency_axis(half_len: usize, n: usize, sample_rate: u32) -> Vec<f32> {
    let step = if n == 0 {
        0.0
    } else {
        sample_rate as f32 / n as f32
    };
    (0..half_len).map(|k| k as f32 * step).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_first_upward_crossing() {
        let s = [0.5, 0.2, -0.1, 0.1, -0.2, 0.3];
        // level 0: s[2] <= 0 < s[3] is the first upward pass.
        assert_eq!(trigger_index(&s, 0.0), 2);
        // level 0.25: s[1] = 0.2 <= 0.25, s[2] below; first pass is 4 → 5.
        assert_eq!(trigger_index(&s, 0.25), 4);
    }

    #[test]
    fn crossing_must_be_strict_above() {
        // Touching the level without exceeding it is not a trigger.
        let s = [-1.0, 0.0, 0.0, -1.0];
        assert_eq!(trigger_index(&s, 0.0), 0);
    }

    #[test]
    fn no_crossing_returns_start() {
        assert_eq!(trigger_index(&[0.1, 0.2, 0.3], 0.5), 0);
        assert_eq!(trigger_index(&[], 0.0), 0);
        assert_eq!(trigger_index(&[1.0], 0.0), 0);
    }

    #[test]
    fn axes_have_expected_spacing() {
        let t = time_axis(3, 10);
        assert_eq!(t, vec![0.0, 0.1, 0.2]);
        let f = frequency_axis(3, 8, 80);
        assert_eq!(f, vec![0.0, 10.0, 20.0]);
        assert!(frequency_axis(0, 0, 80).is_empty());
    }
}
