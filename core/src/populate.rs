use crate::{Bracket, PoolName, Pools, Slot, empty_bracket};
use log::debug;

/// Teams per pool that reach the bracket.
pub const ADVANCING_PER_POOL: usize = 3;

/// Pool winners receive quarterfinal byes, into slot one of these games.
const BYES: [(u8, PoolName); 4] = [(5, PoolName::A), (6, PoolName::D), (7, PoolName::C), (8, PoolName::B)];

/// Prequarterfinal crossovers: each pool's second place meets another pool's third.
const CROSSOVERS: [(u8, PoolName, PoolName); 4] = [
    (1, PoolName::A, PoolName::D),
    (2, PoolName::B, PoolName::C),
    (3, PoolName::C, PoolName::B),
    (4, PoolName::D, PoolName::A),
];

/// Build a fresh bracket from the current pool order.
///
/// Recomputes the advanced flag for every standing. Winners are never
/// carried over, and short pools leave TBD slots.
pub fn populate(pools: &mut Pools) -> Bracket {
    pools.mark_advanced(ADVANCING_PER_POOL);

    let mut bracket = empty_bracket();
    for (game_id, pool) in BYES {
        if let Some(game) = bracket.game_mut(game_id) {
            *game.slot_mut(Slot::One) = pools.entry(pool, 0);
        }
    }
    for (game_id, second, third) in CROSSOVERS {
        if let Some(game) = bracket.game_mut(game_id) {
            *game.slot_mut(Slot::One) = pools.entry(second, 1);
            *game.slot_mut(Slot::Two) = pools.entry(third, 2);
        }
    }

    debug!("populated bracket from {} pool standings", pools.len());
    bracket
}
