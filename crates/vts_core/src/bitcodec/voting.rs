//! Weighted voting across bit-analysis methods.

use crate::models::{BitSymbol, DecodedBit};

use super::methods::MethodVote;

/// Combine method votes into a final bit decision.
///
/// Methods that abstained are simply absent from `votes`. The symbol with
/// the greater summed weight wins; an exact tie is decided by the single
/// most confident method. The returned confidence is the weight-weighted
/// mean confidence of the methods that voted for the winner.
pub(crate) fn combine_votes(votes: &[MethodVote]) -> Option<DecodedBit> {
    if votes.is_empty() {
        return None;
    }

    let weight_for = |symbol: BitSymbol| -> f64 {
        votes
            .iter()
            .filter(|v| v.symbol == symbol)
            .map(|v| v.weight)
            .sum()
    };
    let weight_zero = weight_for(BitSymbol::Zero);
    let weight_one = weight_for(BitSymbol::One);

    let winner = if weight_zero > weight_one {
        BitSymbol::Zero
    } else if weight_one > weight_zero {
        BitSymbol::One
    } else {
        votes
            .iter()
            .max_by(|a, b| {
                a.confidence
                    .partial_cmp(&b.confidence)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })?
            .symbol
    };

    let (weight_sum, weighted_conf) = votes
        .iter()
        .filter(|v| v.symbol == winner)
        .fold((0.0, 0.0), |(w, c), v| {
            (w + v.weight, c + v.weight * v.confidence)
        });

    Some(DecodedBit {
        symbol: winner,
        confidence: (weighted_conf / weight_sum).clamp(0.0, 1.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vote(symbol: BitSymbol, confidence: f64, weight: f64) -> MethodVote {
        MethodVote {
            symbol,
            confidence,
            weight,
        }
    }

    #[test]
    fn empty_votes_yield_none() {
        assert!(combine_votes(&[]).is_none());
    }

    #[test]
    fn single_vote_wins() {
        let decided = combine_votes(&[vote(BitSymbol::One, 0.7, 2.0)]).unwrap();
        assert_eq!(decided.symbol, BitSymbol::One);
        assert_eq!(decided.confidence, 0.7);
    }

    #[test]
    fn heavier_weight_beats_majority_count() {
        // FFT (2.0) says zero, the two light methods (1.0 each) say one:
        // 2.0 vs 2.0 is a tie, decided by highest confidence.
        let decided = combine_votes(&[
            vote(BitSymbol::Zero, 0.9, 2.0),
            vote(BitSymbol::One, 0.6, 1.0),
            vote(BitSymbol::One, 0.5, 1.0),
        ])
        .unwrap();
        assert_eq!(decided.symbol, BitSymbol::Zero);
    }

    #[test]
    fn two_light_methods_lose_to_heavy_plus_light() {
        let decided = combine_votes(&[
            vote(BitSymbol::Zero, 0.8, 2.0),
            vote(BitSymbol::Zero, 0.6, 1.0),
            vote(BitSymbol::One, 0.99, 1.0),
        ])
        .unwrap();
        assert_eq!(decided.symbol, BitSymbol::Zero);
        // Weighted mean of the zero voters: (2*0.8 + 1*0.6) / 3.
        assert!((decided.confidence - (2.0 * 0.8 + 0.6) / 3.0).abs() < 1e-12);
    }

    #[test]
    fn tie_goes_to_most_confident_method() {
        let decided = combine_votes(&[
            vote(BitSymbol::Zero, 0.55, 1.0),
            vote(BitSymbol::One, 0.95, 1.0),
        ])
        .unwrap();
        assert_eq!(decided.symbol, BitSymbol::One);
        assert_eq!(decided.confidence, 0.95);
    }

    #[test]
    fn losing_confidences_do_not_dilute_winner() {
        let decided = combine_votes(&[
            vote(BitSymbol::One, 0.9, 2.0),
            vote(BitSymbol::One, 0.9, 1.0),
            vote(BitSymbol::Zero, 0.1, 1.0),
        ])
        .unwrap();
        assert_eq!(decided.symbol, BitSymbol::One);
        assert!((decided.confidence - 0.9).abs() < 1e-12);
    }
}
