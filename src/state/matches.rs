//! Fixture model: the `Match` capability the coordinator depends on and the
//! season fixture that implements it.

use std::{cmp::Ordering, fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Namespace used to derive deterministic match identifiers.
const MATCH_NAMESPACE: Uuid = Uuid::from_u128(0x6c69_6775_6169_4e00_8a3d_5f2e_9b71_c0de);

/// Shared, read-only handle to a match snapshot.
pub type SharedMatch = Arc<dyn Match>;

/// Stable identifier of a fixture, derived from its defining attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(Uuid);

impl MatchId {
    /// Derive the identifier of the fixture `home` vs `away` kicking off at `kickoff`.
    ///
    /// The same attributes always produce the same identifier, so a snapshot
    /// rebuilt by an upstream source can be matched against the stored fixture.
    /// The kickoff enters the hash as Unix nanoseconds, so its UTC offset does not matter.
    pub fn derive(
        home_team: &str,
        away_team: &str,
        season: &str,
        competition: &str,
        kickoff: OffsetDateTime,
    ) -> Self {
        let name = format!(
            "{home_team}|{away_team}|{season}|{competition}|{}",
            kickoff.unix_timestamp_nanos()
        );
        Self(Uuid::new_v5(&MATCH_NAMESPACE, name.as_bytes()))
    }

    /// Underlying UUID value.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for MatchId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

/// Lifecycle of a fixture as seen by the coordinator. Live matches are still `Scheduled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Not finished yet (includes matches in progress).
    Scheduled,
    /// Final whistle blown; the result is authoritative.
    Finished,
}

/// Result category of a match, also used for predictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The home team scored more goals.
    HomeWin,
    /// Both teams scored the same number of goals.
    Draw,
    /// The away team scored more goals.
    AwayWin,
}

impl Outcome {
    /// Categorise a home/away goal pair.
    pub fn from_goals(home: u32, away: u32) -> Self {
        match home.cmp(&away) {
            Ordering::Greater => Outcome::HomeWin,
            Ordering::Equal => Outcome::Draw,
            Ordering::Less => Outcome::AwayWin,
        }
    }
}

/// Final score of a finished match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalScore {
    /// Goals scored by the home team.
    pub home: u32,
    /// Goals scored by the away team.
    pub away: u32,
}

impl FinalScore {
    /// Build a score from home and away goals.
    pub fn new(home: u32, away: u32) -> Self {
        Self { home, away }
    }

    /// Result category of this score.
    pub fn outcome(&self) -> Outcome {
        Outcome::from_goals(self.home, self.away)
    }
}

/// Market odds captured when the match finished.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Odds {
    /// Decimal odds for a home win.
    pub home_win: f64,
    /// Decimal odds for a draw.
    pub draw: f64,
    /// Decimal odds for an away win.
    pub away_win: f64,
}

impl Odds {
    /// Build odds from the three market prices.
    pub fn new(home_win: f64, draw: f64, away_win: f64) -> Self {
        Self {
            home_win,
            draw,
            away_win,
        }
    }
}

/// Winner of a finished match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Winner {
    /// The home team won; carries its name.
    Home(String),
    /// The away team won; carries its name.
    Away(String),
    /// Nobody won.
    Draw,
}

/// Capability exposed by every fixture the coordinator handles.
///
/// Different competitions may carry different finished attributes; the
/// coordinator only relies on identity, status, kickoff and the final score.
pub trait Match: fmt::Debug + Send + Sync {
    /// Deterministic identifier of the fixture.
    fn id(&self) -> MatchId;
    /// Name of the home team.
    fn home_team(&self) -> &str;
    /// Name of the away team.
    fn away_team(&self) -> &str;
    /// Season the fixture belongs to.
    fn season(&self) -> &str;
    /// Competition the fixture belongs to.
    fn competition(&self) -> &str;
    /// Scheduled kickoff time.
    fn kickoff(&self) -> OffsetDateTime;
    /// Match day / round number within the competition.
    fn round(&self) -> u32;
    /// Current lifecycle status.
    fn status(&self) -> MatchStatus;
    /// Final score, present iff the match is finished.
    fn score(&self) -> Option<FinalScore>;
    /// Odds captured at finish time, if the source provides them.
    fn odds(&self) -> Option<Odds>;

    /// Whether the match is finished.
    fn is_finished(&self) -> bool {
        self.status() == MatchStatus::Finished
    }

    /// Result category, present iff the match is finished.
    fn outcome(&self) -> Option<Outcome> {
        self.score().map(|score| score.outcome())
    }

    /// Winner of the match, `None` until it is finished.
    fn winner(&self) -> Option<Winner> {
        let winner = match self.outcome()? {
            Outcome::HomeWin => Winner::Home(self.home_team().to_owned()),
            Outcome::AwayWin => Winner::Away(self.away_team().to_owned()),
            Outcome::Draw => Winner::Draw,
        };
        Some(winner)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct MatchResult {
    score: FinalScore,
    odds: Odds,
}

/// Regular-season fixture between two teams.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonMatch {
    id: MatchId,
    home_team: String,
    away_team: String,
    season: String,
    competition: String,
    kickoff: OffsetDateTime,
    round: u32,
    result: Option<MatchResult>,
}

impl SeasonMatch {
    /// Build a fixture that has not been played yet.
    pub fn scheduled(
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        season: impl Into<String>,
        competition: impl Into<String>,
        kickoff: OffsetDateTime,
        round: u32,
    ) -> Self {
        let home_team = home_team.into();
        let away_team = away_team.into();
        let season = season.into();
        let competition = competition.into();
        let id = MatchId::derive(&home_team, &away_team, &season, &competition, kickoff);

        Self {
            id,
            home_team,
            away_team,
            season,
            competition,
            kickoff,
            round,
            result: None,
        }
    }

    /// Build a snapshot of a fixture that has already finished.
    #[allow(clippy::too_many_arguments)]
    pub fn finished(
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        season: impl Into<String>,
        competition: impl Into<String>,
        kickoff: OffsetDateTime,
        round: u32,
        score: FinalScore,
        odds: Odds,
    ) -> Self {
        Self::scheduled(home_team, away_team, season, competition, kickoff, round)
            .finish(score, odds)
    }

    /// Record the final result. A fixture that is already finished keeps its result.
    pub fn finish(mut self, score: FinalScore, odds: Odds) -> Self {
        if self.result.is_none() {
            self.result = Some(MatchResult { score, odds });
        }
        self
    }

    /// Wrap the fixture into a shared handle.
    pub fn shared(self) -> SharedMatch {
        Arc::new(self)
    }
}

impl Match for SeasonMatch {
    fn id(&self) -> MatchId {
        self.id
    }

    fn home_team(&self) -> &str {
        &self.home_team
    }

    fn away_team(&self) -> &str {
        &self.away_team
    }

    fn season(&self) -> &str {
        &self.season
    }

    fn competition(&self) -> &str {
        &self.competition
    }

    fn kickoff(&self) -> OffsetDateTime {
        self.kickoff
    }

    fn round(&self) -> u32 {
        self.round
    }

    fn status(&self) -> MatchStatus {
        if self.result.is_some() {
            MatchStatus::Finished
        } else {
            MatchStatus::Scheduled
        }
    }

    fn score(&self) -> Option<FinalScore> {
        self.result.map(|result| result.score)
    }

    fn odds(&self) -> Option<Odds> {
        self.result.map(|result| result.odds)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    const KICKOFF: OffsetDateTime = datetime!(2024-01-01 15:00 UTC);

    fn finished(home: &str, away: &str, home_goals: u32, away_goals: u32) -> SeasonMatch {
        SeasonMatch::finished(
            home,
            away,
            "2024",
            "Premier League",
            KICKOFF,
            1,
            FinalScore::new(home_goals, away_goals),
            Odds::new(1.0, 2.0, 3.0),
        )
    }

    #[test]
    fn home_team_wins() {
        let m = finished("Manchester United", "Liverpool", 3, 1);
        assert_eq!(m.winner(), Some(Winner::Home("Manchester United".into())));
    }

    #[test]
    fn away_team_wins() {
        let m = finished("Arsenal", "Chelsea", 0, 2);
        assert_eq!(m.winner(), Some(Winner::Away("Chelsea".into())));
    }

    #[test]
    fn draw_has_no_winning_team() {
        let m = finished("Tottenham", "West Ham", 1, 1);
        assert_eq!(m.winner(), Some(Winner::Draw));
        assert_eq!(m.outcome(), Some(Outcome::Draw));
    }

    #[test]
    fn scheduled_match_has_no_result() {
        let m = SeasonMatch::scheduled("A", "B", "2024", "Cup", KICKOFF, 3);
        assert_eq!(m.status(), MatchStatus::Scheduled);
        assert!(m.score().is_none());
        assert!(m.odds().is_none());
        assert!(m.winner().is_none());
    }

    #[test]
    fn identifier_is_stable_across_recreation() {
        let scheduled = SeasonMatch::scheduled("A", "B", "2024", "Cup", KICKOFF, 3);
        let again = SeasonMatch::scheduled("A", "B", "2024", "Cup", KICKOFF, 3);
        let finished = scheduled
            .clone()
            .finish(FinalScore::new(1, 0), Odds::new(1.5, 3.0, 4.0));

        assert_eq!(scheduled.id(), again.id());
        assert_eq!(scheduled.id(), finished.id());
    }

    #[test]
    fn identifier_hashes_the_kickoff_instant() {
        let utc = SeasonMatch::scheduled("A", "B", "2024", "Cup", KICKOFF, 3);
        let paris = datetime!(2024-01-01 16:00 +1);
        let local = SeasonMatch::scheduled("A", "B", "2024", "Cup", paris, 3);
        let name = format!("A|B|2024|Cup|{}", KICKOFF.unix_timestamp_nanos());

        assert_eq!(utc.id(), local.id());
        assert_eq!(
            utc.id().as_uuid(),
            Uuid::new_v5(&MATCH_NAMESPACE, name.as_bytes())
        );
    }

    #[test]
    fn identifier_depends_on_fixture_attributes() {
        let base = SeasonMatch::scheduled("A", "B", "2024", "Cup", KICKOFF, 3);
        let swapped = SeasonMatch::scheduled("B", "A", "2024", "Cup", KICKOFF, 3);
        let later = SeasonMatch::scheduled(
            "A",
            "B",
            "2024",
            "Cup",
            datetime!(2024-01-01 17:00 UTC),
            3,
        );

        assert_ne!(base.id(), swapped.id());
        assert_ne!(base.id(), later.id());
    }

    #[test]
    fn finishing_twice_keeps_first_result() {
        let odds = Odds::new(2.0, 2.0, 2.0);
        let m = finished("A", "B", 2, 1).finish(FinalScore::new(0, 0), odds);
        assert_eq!(m.score(), Some(FinalScore::new(2, 1)));
    }
}
