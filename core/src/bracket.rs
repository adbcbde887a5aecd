use crate::{EngineError, EngineResult, Team, TeamRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Rounds and slots
// ---------------------------------------------------------------------------

/// Elimination rounds, earliest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Round {
    PreQuarters,
    Quarters,
    Semis,
    Final,
}

impl Round {
    pub const ALL: [Round; 4] = [Round::PreQuarters, Round::Quarters, Round::Semis, Round::Final];

    pub fn label(self) -> &'static str {
        match self {
            Round::PreQuarters => "Prequarterfinals",
            Round::Quarters => "Quarterfinals",
            Round::Semis => "Semifinals",
            Round::Final => "Final",
        }
    }

    /// Document key of the round inside a serialized bracket.
    pub fn key(self) -> &'static str {
        match self {
            Round::PreQuarters => "prequarters",
            Round::Quarters => "quarters",
            Round::Semis => "semis",
            Round::Final => "final",
        }
    }

    pub fn next(self) -> Option<Self> {
        match self {
            Round::PreQuarters => Some(Round::Quarters),
            Round::Quarters => Some(Round::Semis),
            Round::Semis => Some(Round::Final),
            Round::Final => None,
        }
    }

    /// Stable game ids belonging to this round.
    pub fn game_ids(self) -> RangeInclusive<u8> {
        match self {
            Round::PreQuarters => 1..=4,
            Round::Quarters => 5..=8,
            Round::Semis => 9..=10,
            Round::Final => 11..=11,
        }
    }

    pub fn game_count(self) -> usize {
        self.game_ids().count()
    }

    pub fn of_game(game_id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|round| round.game_ids().contains(&game_id))
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Team position within a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    One,
    Two,
}

impl Slot {
    pub const BOTH: [Slot; 2] = [Slot::One, Slot::Two];

    pub fn number(self) -> u8 {
        match self {
            Slot::One => 1,
            Slot::Two => 2,
        }
    }
}

impl FromStr for Slot {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        match s.trim() {
            "1" => Ok(Slot::One),
            "2" => Ok(Slot::Two),
            other => Err(EngineError::MalformedInput(format!("slot must be 1 or 2, got {other:?}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Round-advancement map
// ---------------------------------------------------------------------------

/// Where the winner of game `from` lands in the next round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advance {
    pub from: u8,
    pub to: u8,
    pub slot: Slot,
}

const fn advance(from: u8, to: u8, slot: Slot) -> Advance {
    Advance { from, to, slot }
}

/// Quarterfinal slot one is the bye slot, filled from pool leaders, so every
/// prequarterfinal winner lands in slot two.
pub const ADVANCEMENT: [Advance; 10] = [
    advance(1, 5, Slot::Two),
    advance(2, 6, Slot::Two),
    advance(3, 7, Slot::Two),
    advance(4, 8, Slot::Two),
    advance(5, 9, Slot::One),
    advance(6, 9, Slot::Two),
    advance(7, 10, Slot::One),
    advance(8, 10, Slot::Two),
    advance(9, 11, Slot::One),
    advance(10, 11, Slot::Two),
];

/// `None` for the final, which feeds nothing.
pub fn advancement(game_id: u8) -> Option<Advance> {
    ADVANCEMENT.iter().find(|a| a.from == game_id).copied()
}

// ---------------------------------------------------------------------------
// Games and the bracket
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: u8,
    pub team1: TeamRef,
    pub team2: TeamRef,
    #[serde(default)]
    pub winner: Option<Team>,
}

impl Game {
    fn new(id: u8) -> Self {
        Self { id, team1: TeamRef::Tbd, team2: TeamRef::Tbd, winner: None }
    }

    pub fn slot(&self, slot: Slot) -> &TeamRef {
        match slot {
            Slot::One => &self.team1,
            Slot::Two => &self.team2,
        }
    }

    pub(crate) fn slot_mut(&mut self, slot: Slot) -> &mut TeamRef {
        match slot {
            Slot::One => &mut self.team1,
            Slot::Two => &mut self.team2,
        }
    }

    /// Teams currently occupying either slot.
    pub fn occupants(&self) -> impl Iterator<Item = &Team> {
        [&self.team1, &self.team2].into_iter().filter_map(TeamRef::team)
    }

    pub fn is_decided(&self) -> bool {
        self.winner.is_some()
    }
}

/// Single-elimination bracket: 4 prequarterfinals, 4 quarterfinals,
/// 2 semifinals and the final, with game ids 1 through 11.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    prequarters: Vec<Game>,
    quarters: Vec<Game>,
    semis: Vec<Game>,
    #[serde(rename = "final")]
    final_round: Vec<Game>,
}

impl Default for Bracket {
    fn default() -> Self {
        empty_bracket()
    }
}

/// The bracket shape with every slot TBD and no winners.
pub fn empty_bracket() -> Bracket {
    let games = |round: Round| round.game_ids().map(Game::new).collect();
    Bracket {
        prequarters: games(Round::PreQuarters),
        quarters: games(Round::Quarters),
        semis: games(Round::Semis),
        final_round: games(Round::Final),
    }
}

impl Bracket {
    pub fn round(&self, round: Round) -> &[Game] {
        match round {
            Round::PreQuarters => &self.prequarters,
            Round::Quarters => &self.quarters,
            Round::Semis => &self.semis,
            Round::Final => &self.final_round,
        }
    }

    fn round_mut(&mut self, round: Round) -> &mut Vec<Game> {
        match round {
            Round::PreQuarters => &mut self.prequarters,
            Round::Quarters => &mut self.quarters,
            Round::Semis => &mut self.semis,
            Round::Final => &mut self.final_round,
        }
    }

    pub fn games(&self) -> impl Iterator<Item = (Round, &Game)> {
        Round::ALL
            .into_iter()
            .flat_map(move |round| self.round(round).iter().map(move |game| (round, game)))
    }

    pub fn game(&self, game_id: u8) -> Option<&Game> {
        let round = Round::of_game(game_id)?;
        self.round(round).iter().find(|g| g.id == game_id)
    }

    pub(crate) fn game_mut(&mut self, game_id: u8) -> Option<&mut Game> {
        let round = Round::of_game(game_id)?;
        self.round_mut(round).iter_mut().find(|g| g.id == game_id)
    }

    /// Winner of the final, if picked.
    pub fn champion(&self) -> Option<&Team> {
        self.final_round.first().and_then(|g| g.winner.as_ref())
    }

    /// Whether the first two rounds have been filled from pool standings.
    pub fn is_generated(&self) -> bool {
        [Round::PreQuarters, Round::Quarters]
            .into_iter()
            .flat_map(|round| self.round(round))
            .any(|g| !g.team1.is_tbd())
    }
}
