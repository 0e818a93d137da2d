//! Selection of the historical distance that best predicts a race at a requested distance.
//!
//! Runs at a longer (or near-identical) distance are preferred to much shorter ones; when
//! only shorter runs exist, their speeds are penalised for the extra distance still to be
//! covered.

/// Distances no more than this far below the requested distance are treated as
/// equivalent to longer ones.
pub const TOLERANCE: f64 = 50.0;

/// Speed lost (m/s) for every 100 m of additional race distance.
pub const PENALTY_PER_100M: f64 = 0.5;

/// Resolves the closest usable distance among `available`. Candidates at or above
/// `requested - TOLERANCE` are preferred; if there are none, the overall closest distance
/// is chosen. Equidistant candidates resolve to the first encountered. `None` only if
/// `available` is empty.
pub fn resolve(requested: f64, available: &[f64]) -> Option<f64> {
    let threshold = requested - TOLERANCE;
    closest(requested, available.iter().copied().filter(|&d| d >= threshold))
        .or_else(|| closest(requested, available.iter().copied()))
}

fn closest(requested: f64, candidates: impl Iterator<Item = f64>) -> Option<f64> {
    let mut best: Option<(f64, f64)> = None;
    for candidate in candidates {
        let diff = (candidate - requested).abs();
        match best {
            Some((_, best_diff)) if best_diff <= diff => {}
            _ => best = Some((candidate, diff)),
        }
    }
    best.map(|(candidate, _)| candidate)
}

/// The speed adjustment (m/s) to add to speeds observed at `resolved` when predicting
/// a race at `requested`. Negative when the resolved distance is shorter.
#[inline]
pub fn speed_adjustment(requested: f64, resolved: f64) -> f64 {
    -PENALTY_PER_100M * (requested - resolved) / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_float_eq::*;

    const AVAILABLE: [f64; 3] = [1000.0, 1200.0, 1400.0];

    #[test]
    fn resolve_within_tolerance() {
        assert_eq!(Some(1200.0), resolve(1190.0, &AVAILABLE));
        assert_eq!(Some(1200.0), resolve(1200.0, &AVAILABLE));
    }

    #[test]
    fn resolve_prefers_longer() {
        // 1200 is closer to 1290 but lies outside the tolerance window
        assert_eq!(Some(1400.0), resolve(1290.0, &AVAILABLE));
        assert_eq!(Some(1200.0), resolve(1240.0, &AVAILABLE));
    }

    #[test]
    fn resolve_below_all() {
        assert_eq!(Some(1000.0), resolve(900.0, &AVAILABLE));
    }

    #[test]
    fn resolve_falls_back_to_shorter() {
        assert_eq!(Some(1400.0), resolve(1800.0, &AVAILABLE));
        assert_eq!(Some(1000.0), resolve(1650.0, &[1000.0]));
    }

    #[test]
    fn resolve_empty() {
        assert_eq!(None, resolve(1200.0, &[]));
    }

    #[test]
    fn resolve_tie_keeps_first() {
        assert_eq!(Some(1175.0), resolve(1200.0, &[1175.0, 1225.0]));
        assert_eq!(Some(1225.0), resolve(1200.0, &[1225.0, 1175.0]));
    }

    #[test]
    fn adjustment() {
        assert_float_absolute_eq!(-2.0, speed_adjustment(1800.0, 1400.0));
        assert_float_absolute_eq!(0.25, speed_adjustment(1150.0, 1200.0));
        assert_eq!(0.0, speed_adjustment(1200.0, 1200.0));
    }
}
