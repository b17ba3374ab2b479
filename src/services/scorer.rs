use crate::{
    config::ScoringConfig,
    state::{bet::Bet, matches::Match},
};

/// Scoring strategy applied to the bets of a finished match.
///
/// Must be a pure function of its inputs: one score per bet, in the same order.
pub trait Scorer: Send + Sync {
    /// Score `bets`, all targeting the finished match `finished`.
    fn score(&self, finished: &dyn Match, bets: &[Bet]) -> Vec<i32>;
}

/// Awards fixed points for the right outcome, plus a bonus for the exact score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeScorer {
    outcome_points: i32,
    exact_score_bonus: i32,
}

impl OutcomeScorer {
    /// Build a scorer with explicit point values.
    pub fn new(outcome_points: i32, exact_score_bonus: i32) -> Self {
        Self {
            outcome_points,
            exact_score_bonus,
        }
    }
}

impl From<ScoringConfig> for OutcomeScorer {
    fn from(value: ScoringConfig) -> Self {
        Self::new(value.outcome_points, value.exact_score_bonus)
    }
}

impl Scorer for OutcomeScorer {
    fn score(&self, finished: &dyn Match, bets: &[Bet]) -> Vec<i32> {
        bets.iter()
            .map(|bet| {
                if !bet.is_correct(finished) {
                    return 0;
                }
                if bet.is_exact(finished) {
                    self.outcome_points + self.exact_score_bonus
                } else {
                    self.outcome_points
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::state::matches::{FinalScore, Odds, SeasonMatch};

    #[test]
    fn scores_are_aligned_with_bets() {
        let kickoff = datetime!(2024-02-04 20:45 UTC);
        let scheduled = SeasonMatch::scheduled("Lyon", "Nice", "2024", "Ligue 1", kickoff, 21);
        let finished = scheduled
            .clone()
            .finish(FinalScore::new(2, 1), Odds::new(2.0, 3.2, 3.6));
        let bets = vec![
            Bet::new(&scheduled, 1, 1),
            Bet::new(&scheduled, 2, 1),
            Bet::new(&scheduled, 1, 0),
            Bet::new(&scheduled, 0, 3),
        ];

        let scores = OutcomeScorer::new(500, 250).score(&finished, &bets);

        assert_eq!(scores, vec![0, 750, 500, 0]);
    }

    #[test]
    fn default_config_awards_outcome_points_only() {
        let scorer = OutcomeScorer::from(ScoringConfig::default());
        assert_eq!(scorer, OutcomeScorer::new(500, 0));
    }

    #[test]
    fn no_bets_no_scores() {
        let finished = SeasonMatch::finished(
            "Lyon",
            "Nice",
            "2024",
            "Ligue 1",
            datetime!(2024-02-04 20:45 UTC),
            21,
            FinalScore::new(0, 0),
            Odds::new(2.0, 3.2, 3.6),
        );
        assert!(OutcomeScorer::new(1, 1).score(&finished, &[]).is_empty());
    }
}
