//! Bridge between centipawn evaluations and win probabilities.
//!
//! The Monte Carlo engine works in reward space while the evaluator works
//! in centipawns; a logistic curve with a fixed slope converts between
//! the two. The inverse is total: probabilities at the boundaries map to
//! the mate sentinels so an `info score cp` line can always be produced.

use crate::MATE;

/// Logistic slope: one pawn of advantage shifts the curve by 1/4 of its
/// dynamic range around equality.
const SIGMOID_SCALE: f64 = 1.0 / 400.0;

/// Keeps the sigmoid tails strictly inside the open interval; beyond
/// roughly 15000 centipawns the raw curve rounds to exactly 0 or 1 in
/// f64.
const PROB_FLOOR: f64 = 1e-12;

/// Estimated probability of winning given a centipawn score for the side
/// to move. Strictly inside `(0, 1)` for every finite score.
pub fn winning_prob(centipawns: i32) -> f64 {
    let p = 1.0 / (1.0 + (-SIGMOID_SCALE * f64::from(centipawns)).exp());
    p.clamp(PROB_FLOOR, 1.0 - PROB_FLOOR)
}

/// Inverse of [`winning_prob`], rounded to the nearest centipawn.
///
/// Saturated probabilities map to the mate sentinels; a NaN input (a
/// degenerate reward average) maps to equality.
pub fn centipawn_from_prob(p: f64) -> i32 {
    if p.is_nan() {
        return 0;
    }
    if p <= 0.0 {
        return -MATE;
    }
    if p >= 1.0 {
        return MATE;
    }
    let cp = (p / (1.0 - p)).ln() / SIGMOID_SCALE;
    cp.round().clamp(f64::from(-MATE), f64::from(MATE)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_maps_to_even_odds() {
        assert!((winning_prob(0) - 0.5).abs() < 1e-12);
        assert_eq!(centipawn_from_prob(0.5), 0);
    }

    #[test]
    fn monotonic_in_centipawns() {
        assert!(winning_prob(100) > winning_prob(0));
        assert!(winning_prob(0) > winning_prob(-100));
    }

    #[test]
    fn boundaries_map_to_mate_sentinels() {
        assert_eq!(centipawn_from_prob(0.0), -MATE);
        assert_eq!(centipawn_from_prob(1.0), MATE);
        assert_eq!(centipawn_from_prob(-0.25), -MATE);
        assert_eq!(centipawn_from_prob(1.5), MATE);
    }

    #[test]
    fn round_trip_within_one_centipawn() {
        for cp in (-2000..=2000).step_by(37) {
            let back = centipawn_from_prob(winning_prob(cp));
            assert!((back - cp).abs() <= 1, "cp {cp} round-tripped to {back}");
        }
    }
}
