use crate::{EngineError, EngineResult, PoolName, PoolStanding, Pools, Team, TournamentRecord, empty_bracket};
use log::{debug, warn};

/// Teams required for the standard four-pools-of-five draw.
pub const FIELD_SIZE: usize = 20;

/// Pool for each seed rank (index 0 = top seed), following the published
/// snake draw: A {1, 8, 12, 13, 17}, B {2, 7, 11, 14, 18},
/// C {3, 6, 10, 15, 19}, D {4, 5, 9, 16, 20}.
const POOL_DRAW: [PoolName; FIELD_SIZE] = {
    use PoolName::{A, B, C, D};
    [A, B, C, D, D, C, B, A, D, C, B, A, A, B, C, D, A, B, C, D]
};

/// Result of assigning teams to pools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seeding {
    /// Full field placed by the fixed draw.
    Standard(Pools),
    /// Short field dealt round-robin; not a scoring-valid configuration.
    Fallback(Pools),
}

impl Seeding {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Seeding::Fallback(_))
    }

    pub fn pools(&self) -> &Pools {
        match self {
            Seeding::Standard(pools) | Seeding::Fallback(pools) => pools,
        }
    }

    pub fn into_pools(self) -> Pools {
        match self {
            Seeding::Standard(pools) | Seeding::Fallback(pools) => pools,
        }
    }
}

/// Place teams into pools A–D by seed.
///
/// Input order is irrelevant; teams are ranked by seed first. With fewer than
/// [`FIELD_SIZE`] teams the result is flagged [`Seeding::Fallback`]. Teams
/// ranked below the field size are left out.
pub fn assign_pools(teams: &[Team]) -> EngineResult<Seeding> {
    let mut ranked: Vec<&Team> = teams.iter().collect();
    ranked.sort_by_key(|t| t.seed);
    if let Some(pair) = ranked.windows(2).find(|w| w[0].seed == w[1].seed) {
        return Err(EngineError::DuplicateSeed(pair[0].seed));
    }

    let mut pools = Pools::default();

    if ranked.len() < FIELD_SIZE {
        warn!(
            "only {} teams supplied, dealing pools round-robin instead of the {FIELD_SIZE}-team draw",
            ranked.len()
        );
        for (rank, team) in ranked.into_iter().enumerate() {
            let pool = PoolName::ALL[rank % PoolName::ALL.len()];
            pools.pool_mut(pool).push(PoolStanding::new(team.clone()));
        }
        return Ok(Seeding::Fallback(pools));
    }

    if ranked.len() > FIELD_SIZE {
        warn!("ignoring {} teams seeded below {FIELD_SIZE}", ranked.len() - FIELD_SIZE);
    }
    for (team, pool) in ranked.into_iter().zip(POOL_DRAW) {
        pools.pool_mut(pool).push(PoolStanding::new(team.clone()));
    }
    debug!("assigned {} teams to pools", pools.len());
    Ok(Seeding::Standard(pools))
}

/// A freshly created record: seeded pools and an empty bracket.
#[derive(Debug, Clone)]
pub struct Seeded {
    pub record: TournamentRecord,
    pub fallback: bool,
}

pub fn create_record(name: &str, teams: &[Team]) -> EngineResult<Seeded> {
    let seeding = assign_pools(teams)?;
    let fallback = seeding.is_fallback();
    Ok(Seeded {
        record: TournamentRecord {
            name: name.to_owned(),
            pools: seeding.into_pools(),
            bracket: empty_bracket(),
        },
        fallback,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(seeds: impl IntoIterator<Item = u8>) -> Vec<Team> {
        seeds.into_iter().map(|seed| Team::new(format!("Team {seed}"), seed)).collect()
    }

    fn seeds_of(pools: &Pools, name: PoolName) -> Vec<u8> {
        pools.pool(name).iter().map(|s| s.team.seed).collect()
    }

    #[test]
    fn standard_draw_matches_published_table() {
        let seeding = assign_pools(&field(1..=20)).unwrap();
        assert!(!seeding.is_fallback());
        let pools = seeding.pools();
        assert_eq!(seeds_of(pools, PoolName::A), vec![1, 8, 12, 13, 17]);
        assert_eq!(seeds_of(pools, PoolName::B), vec![2, 7, 11, 14, 18]);
        assert_eq!(seeds_of(pools, PoolName::C), vec![3, 6, 10, 15, 19]);
        assert_eq!(seeds_of(pools, PoolName::D), vec![4, 5, 9, 16, 20]);
    }

    #[test]
    fn draw_ignores_input_order() {
        let expected = assign_pools(&field(1..=20)).unwrap();
        let mut reversed = field(1..=20);
        reversed.reverse();
        assert_eq!(assign_pools(&reversed).unwrap(), expected);

        // A fixed interleaving rather than a random shuffle keeps the test deterministic.
        let interleaved: Vec<u8> = (1..=20).step_by(2).chain((2..=20).step_by(2)).collect();
        assert_eq!(assign_pools(&field(interleaved)).unwrap(), expected);
    }

    #[test]
    fn initial_standings_are_blank() {
        let seeding = assign_pools(&field(1..=20)).unwrap();
        for (_, standings) in seeding.pools().iter() {
            assert_eq!(standings.len(), 5);
            for standing in standings {
                assert_eq!((standing.wins, standing.losses, standing.advanced), (0, 0, false));
            }
        }
    }

    #[test]
    fn draw_uses_seed_rank_not_seed_value() {
        let seeding = assign_pools(&field((1..=20).map(|s| s * 2))).unwrap();
        assert_eq!(seeds_of(seeding.pools(), PoolName::A), vec![2, 16, 24, 26, 34]);
    }

    #[test]
    fn short_field_falls_back_to_round_robin() {
        let seeding = assign_pools(&field([6, 1, 5, 2, 3, 4])).unwrap();
        assert!(seeding.is_fallback());
        let pools = seeding.pools();
        assert_eq!(seeds_of(pools, PoolName::A), vec![1, 5]);
        assert_eq!(seeds_of(pools, PoolName::B), vec![2, 6]);
        assert_eq!(seeds_of(pools, PoolName::C), vec![3]);
        assert_eq!(seeds_of(pools, PoolName::D), vec![4]);
    }

    #[test]
    fn empty_field_yields_empty_fallback_pools() {
        let seeding = assign_pools(&[]).unwrap();
        assert!(seeding.is_fallback());
        assert!(seeding.pools().is_empty());
    }

    #[test]
    fn oversized_field_keeps_top_twenty() {
        let seeding = assign_pools(&field(1..=24)).unwrap();
        assert!(!seeding.is_fallback());
        assert_eq!(seeding.pools().len(), 20);
        assert_eq!(seeds_of(seeding.pools(), PoolName::D), vec![4, 5, 9, 16, 20]);
    }

    #[test]
    fn duplicate_seeds_are_rejected() {
        let mut teams = field(1..=20);
        teams[19].seed = 3;
        assert_eq!(assign_pools(&teams), Err(EngineError::DuplicateSeed(3)));
    }

    #[test]
    fn create_record_starts_with_empty_bracket() {
        let seeded = create_record("Nationals", &field(1..=20)).unwrap();
        assert!(!seeded.fallback);
        assert_eq!(seeded.record.name, "Nationals");
        assert_eq!(seeded.record.bracket, empty_bracket());
    }
}
