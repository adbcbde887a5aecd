use crate::{Bracket, PoolName, Round, Team, TournamentRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Points awarded per confirmed team in each round, plus the champion bonus.
///
/// Carried as configuration so a tournament can change its rules without
/// touching the engine. `version` identifies the rule set in saved output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringScheme {
    pub version: u32,
    pub prequarterfinalist: u32,
    pub quarterfinalist: u32,
    pub semifinalist: u32,
    pub finalist: u32,
    pub champion: u32,
}

impl Default for ScoringScheme {
    fn default() -> Self {
        Self {
            version: 2,
            prequarterfinalist: 100,
            quarterfinalist: 200,
            semifinalist: 400,
            finalist: 800,
            champion: 1600,
        }
    }
}

impl ScoringScheme {
    pub fn round_value(&self, round: Round) -> u32 {
        match round {
            Round::PreQuarters => self.prequarterfinalist,
            Round::Quarters => self.quarterfinalist,
            Round::Semis => self.semifinalist,
            Round::Final => self.finalist,
        }
    }

    /// Every slot of every round correct, plus the champion. Saturates at
    /// `u32::MAX`; [`ScoringScheme::checked_max_points`] reports the overflow.
    pub fn max_points(&self) -> u32 {
        Round::ALL
            .into_iter()
            .map(|round| self.round_value(round).saturating_mul(round.game_count() as u32 * 2))
            .fold(self.champion, u32::saturating_add)
    }

    /// `None` when the maximum does not fit in a `u32`.
    pub fn checked_max_points(&self) -> Option<u32> {
        Round::ALL.into_iter().try_fold(self.champion, |total, round| {
            self.round_value(round)
                .checked_mul(round.game_count() as u32 * 2)
                .and_then(|points| total.checked_add(points))
        })
    }
}

/// Teams the master bracket has confirmed as reaching each round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmedAdvancement {
    pub prequarterfinalists: HashSet<Team>,
    pub quarterfinalists: HashSet<Team>,
    pub semifinalists: HashSet<Team>,
    pub finalists: HashSet<Team>,
    pub champion: Option<Team>,
}

impl ConfirmedAdvancement {
    pub fn from_master(master: &TournamentRecord) -> Self {
        let bracket = &master.bracket;
        let winners = |round: Round| -> HashSet<Team> {
            bracket.round(round).iter().filter_map(|g| g.winner.clone()).collect()
        };

        let prequarterfinalists = bracket
            .round(Round::PreQuarters)
            .iter()
            .flat_map(|g| g.occupants().cloned())
            .collect();

        let mut quarterfinalists = winners(Round::PreQuarters);
        quarterfinalists.extend(PoolName::ALL.into_iter().filter_map(|pool| master.pools.leader(pool)).cloned());

        Self {
            prequarterfinalists,
            quarterfinalists,
            semifinalists: winners(Round::Quarters),
            finalists: winners(Round::Semis),
            champion: bracket.champion().cloned(),
        }
    }

    /// Teams confirmed to have reached `round`.
    pub fn round(&self, round: Round) -> &HashSet<Team> {
        match round {
            Round::PreQuarters => &self.prequarterfinalists,
            Round::Quarters => &self.quarterfinalists,
            Round::Semis => &self.semifinalists,
            Round::Final => &self.finalists,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub current_score: u32,
    pub possible_points_remaining: u32,
    pub max_points: u32,
}

/// Score a user bracket against the master results.
///
/// Without a master nothing is confirmed yet and every point is still
/// available. Remaining points are simply what has not been earned, so a
/// bracket whose picks were already eliminated still shows them as possible.
pub fn score(user: &Bracket, master: Option<&TournamentRecord>, scheme: &ScoringScheme) -> Score {
    match master {
        Some(master) => score_against(user, &ConfirmedAdvancement::from_master(master), scheme),
        None => {
            let max_points = scheme.max_points();
            Score { current_score: 0, possible_points_remaining: max_points, max_points }
        }
    }
}

/// Score against an already derived confirmation set, for ranking many brackets.
pub fn score_against(user: &Bracket, confirmed: &ConfirmedAdvancement, scheme: &ScoringScheme) -> Score {
    let mut current_score: u32 = 0;
    for round in Round::ALL {
        let picked: HashSet<&Team> = user.round(round).iter().flat_map(|g| g.occupants()).collect();
        let hits = picked.into_iter().filter(|team| confirmed.round(round).contains(*team)).count() as u32;
        current_score = current_score.saturating_add(hits.saturating_mul(scheme.round_value(round)));
    }
    if let Some(champion) = user.champion()
        && confirmed.champion.as_ref() == Some(champion)
    {
        current_score = current_score.saturating_add(scheme.champion);
    }

    let max_points = scheme.max_points();
    Score {
        current_score,
        possible_points_remaining: max_points.saturating_sub(current_score),
        max_points,
    }
}
