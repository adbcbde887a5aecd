pub mod bracket;
pub mod client;
pub mod leaderboard;
pub mod populate;
pub mod propagation;
pub mod scoring;
pub mod seeding;
pub mod store;

pub use bracket::{ADVANCEMENT, Advance, Bracket, Game, Round, Slot, advancement, empty_bracket};
pub use populate::populate;
pub use propagation::select_winner;
pub use scoring::{ConfirmedAdvancement, Score, ScoringScheme, score};
pub use seeding::{Seeding, assign_pools, create_record};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Display form of the undetermined team.
pub const TBD: &str = "TBD";

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error("seed {0} is assigned to more than one team")]
    DuplicateSeed(u8),
    #[error("game {game_id} is not part of the {round}")]
    UnknownGame { round: Round, game_id: u8 },
    #[error("there is no game {0} in the bracket")]
    GameOutOfRange(u8),
    #[error("invalid team reference {0:?}, expected \"Name (seed)\"")]
    InvalidTeam(String),
    #[error("{team} is not in {pool}")]
    UnknownTeam { pool: PoolName, team: String },
    #[error("position {index} is out of range for {pool}")]
    PositionOutOfRange { pool: PoolName, index: usize },
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

/// A seeded team. Serialized as its display string, e.g. `"Oregon (2)"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Team {
    pub name: String,
    pub seed: u8,
}

impl Team {
    pub fn new(name: impl Into<String>, seed: u8) -> Self {
        Self { name: name.into(), seed }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.seed)
    }
}

impl FromStr for Team {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        let invalid = || EngineError::InvalidTeam(s.to_owned());
        let body = s.trim().strip_suffix(')').ok_or_else(invalid)?;
        let (name, seed) = body.rsplit_once('(').ok_or_else(invalid)?;
        let name = name.trim_end();
        let seed = seed.trim().parse::<u8>().map_err(|_| invalid())?;
        if name.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(name, seed))
    }
}

impl TryFrom<String> for Team {
    type Error = EngineError;

    fn try_from(value: String) -> EngineResult<Self> {
        value.parse()
    }
}

impl From<Team> for String {
    fn from(team: Team) -> Self {
        team.to_string()
    }
}

/// Occupant of a bracket slot: a team, or the "TBD" sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TeamRef {
    #[default]
    Tbd,
    Team(Team),
}

impl TeamRef {
    pub fn team(&self) -> Option<&Team> {
        match self {
            TeamRef::Tbd => None,
            TeamRef::Team(team) => Some(team),
        }
    }

    pub fn is_tbd(&self) -> bool {
        matches!(self, TeamRef::Tbd)
    }

    pub fn holds(&self, team: &Team) -> bool {
        self.team() == Some(team)
    }
}

impl From<Team> for TeamRef {
    fn from(team: Team) -> Self {
        TeamRef::Team(team)
    }
}

impl From<Option<&Team>> for TeamRef {
    fn from(team: Option<&Team>) -> Self {
        team.cloned().map_or(TeamRef::Tbd, TeamRef::Team)
    }
}

impl fmt::Display for TeamRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeamRef::Tbd => f.write_str(TBD),
            TeamRef::Team(team) => team.fmt(f),
        }
    }
}

impl FromStr for TeamRef {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        let s = s.trim();
        if s.is_empty() || s == TBD {
            Ok(TeamRef::Tbd)
        } else {
            s.parse().map(TeamRef::Team)
        }
    }
}

impl TryFrom<String> for TeamRef {
    type Error = EngineError;

    fn try_from(value: String) -> EngineResult<Self> {
        value.parse()
    }
}

impl From<TeamRef> for String {
    fn from(team: TeamRef) -> Self {
        team.to_string()
    }
}

// ---------------------------------------------------------------------------
// Pools
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PoolName {
    A,
    B,
    C,
    D,
}

impl PoolName {
    pub const ALL: [PoolName; 4] = [PoolName::A, PoolName::B, PoolName::C, PoolName::D];

    pub fn label(self) -> &'static str {
        match self {
            PoolName::A => "Pool A",
            PoolName::B => "Pool B",
            PoolName::C => "Pool C",
            PoolName::D => "Pool D",
        }
    }

    fn index(self) -> usize {
        match self {
            PoolName::A => 0,
            PoolName::B => 1,
            PoolName::C => 2,
            PoolName::D => 3,
        }
    }
}

impl fmt::Display for PoolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepts "Pool A", "A" or "a".
impl FromStr for PoolName {
    type Err = EngineError;

    fn from_str(s: &str) -> EngineResult<Self> {
        let letter = s.trim();
        let letter = letter.strip_prefix("Pool ").unwrap_or(letter);
        match letter.to_ascii_uppercase().as_str() {
            "A" => Ok(PoolName::A),
            "B" => Ok(PoolName::B),
            "C" => Ok(PoolName::C),
            "D" => Ok(PoolName::D),
            _ => Err(EngineError::MalformedInput(format!("unknown pool {s:?}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStanding {
    pub team: Team,
    pub wins: u32,
    pub losses: u32,
    /// Derived by the populator; never edited directly.
    pub advanced: bool,
}

impl PoolStanding {
    pub fn new(team: Team) -> Self {
        Self { team, wins: 0, losses: 0, advanced: false }
    }
}

/// The four pools, each in predicted (or actual) finish order.
///
/// Serialized as a map keyed by pool label. A map missing any of the four
/// pools, or carrying a key that is not a pool, is rejected as malformed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, Vec<PoolStanding>>",
    into = "BTreeMap<String, Vec<PoolStanding>>"
)]
pub struct Pools {
    pools: [Vec<PoolStanding>; 4],
}

impl Pools {
    pub fn pool(&self, name: PoolName) -> &[PoolStanding] {
        &self.pools[name.index()]
    }

    pub(crate) fn pool_mut(&mut self, name: PoolName) -> &mut Vec<PoolStanding> {
        &mut self.pools[name.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (PoolName, &[PoolStanding])> {
        PoolName::ALL.into_iter().map(|name| (name, self.pool(name)))
    }

    /// Team at `rank` (0-based) in a pool, or TBD when the pool is short.
    pub fn entry(&self, name: PoolName, rank: usize) -> TeamRef {
        self.pool(name).get(rank).map(|s| &s.team).into()
    }

    pub fn leader(&self, name: PoolName) -> Option<&Team> {
        self.pool(name).first().map(|s| &s.team)
    }

    pub fn len(&self) -> usize {
        self.pools.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move the team at `from` to `to` within one pool.
    pub fn move_team(&mut self, name: PoolName, from: usize, to: usize) -> EngineResult<()> {
        let pool = self.pool_mut(name);
        for index in [from, to] {
            if index >= pool.len() {
                return Err(EngineError::PositionOutOfRange { pool: name, index });
            }
        }
        let standing = pool.remove(from);
        pool.insert(to, standing);
        Ok(())
    }

    /// Resolve a team within a pool by seed (`"7"`) or display string.
    pub fn find_team(&self, name: PoolName, query: &str) -> EngineResult<Team> {
        let query = query.trim();
        let found = match query.parse::<u8>() {
            Ok(seed) => self.pool(name).iter().find(|s| s.team.seed == seed),
            Err(_) => {
                let team: Team = query.parse()?;
                self.pool(name).iter().find(|s| s.team == team)
            }
        };
        found
            .map(|s| s.team.clone())
            .ok_or_else(|| EngineError::UnknownTeam { pool: name, team: query.to_owned() })
    }

    pub fn set_record(
        &mut self,
        name: PoolName,
        team: &Team,
        wins: u32,
        losses: u32,
    ) -> EngineResult<()> {
        let standing = self
            .pool_mut(name)
            .iter_mut()
            .find(|s| &s.team == team)
            .ok_or_else(|| EngineError::UnknownTeam { pool: name, team: team.to_string() })?;
        standing.wins = wins;
        standing.losses = losses;
        Ok(())
    }

    /// Flag exactly the top `count` standings of every pool as advanced.
    pub(crate) fn mark_advanced(&mut self, count: usize) {
        for pool in &mut self.pools {
            for (rank, standing) in pool.iter_mut().enumerate() {
                standing.advanced = rank < count;
            }
        }
    }
}

impl TryFrom<BTreeMap<String, Vec<PoolStanding>>> for Pools {
    type Error = EngineError;

    fn try_from(mut map: BTreeMap<String, Vec<PoolStanding>>) -> EngineResult<Self> {
        let mut pools = Pools::default();
        for name in PoolName::ALL {
            let standings = map
                .remove(name.label())
                .ok_or_else(|| EngineError::MalformedInput(format!("{name} is missing")))?;
            *pools.pool_mut(name) = standings;
        }
        if let Some(unknown) = map.keys().next() {
            return Err(EngineError::MalformedInput(format!("unexpected pool {unknown:?}")));
        }
        Ok(pools)
    }
}

impl From<Pools> for BTreeMap<String, Vec<PoolStanding>> {
    fn from(pools: Pools) -> Self {
        PoolName::ALL
            .into_iter()
            .zip(pools.pools)
            .map(|(name, standings)| (name.label().to_owned(), standings))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tournament record
// ---------------------------------------------------------------------------

/// One tournament prediction (or the master results): pools plus bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentRecord {
    pub name: String,
    pub pools: Pools,
    pub bracket: Bracket,
}

impl TournamentRecord {
    /// Reordering a pool invalidates every bracket pick made from it.
    pub fn reorder(&mut self, pool: PoolName, from: usize, to: usize) -> EngineResult<()> {
        self.pools.move_team(pool, from, to)?;
        self.bracket = empty_bracket();
        Ok(())
    }

    pub fn repopulate(&mut self) {
        self.bracket = populate(&mut self.pools);
    }
}
