use crate::{Bracket, EngineError, EngineResult, Round, Slot, Team, TeamRef, advancement};
use log::{debug, trace};
use std::mem;

impl Bracket {
    /// Toggle the team in `slot` of a game as its winner.
    ///
    /// Picking the current winner again deselects it. Every downstream slot and
    /// winner that depended on the previous state is cleared. Picking an
    /// undetermined slot does nothing.
    pub fn select_winner(&mut self, round: Round, game_id: u8, slot: Slot) -> EngineResult<()> {
        if Round::of_game(game_id) != Some(round) {
            return Err(EngineError::UnknownGame { round, game_id });
        }
        let game = self.game_mut(game_id).ok_or(EngineError::GameOutOfRange(game_id))?;

        let Some(team) = game.slot(slot).team().cloned() else {
            trace!("game {game_id} slot {} is undetermined, nothing to pick", slot.number());
            return Ok(());
        };

        if game.winner.as_ref() == Some(&team) {
            game.winner = None;
            debug!("deselected {team} in game {game_id}");
            self.retract(game_id, team);
        } else {
            game.winner = Some(team.clone());
            debug!("picked {team} to win game {game_id}");
            self.advance(game_id, team);
        }
        Ok(())
    }

    /// Write a fresh winner into the next round and invalidate whatever was
    /// decided there.
    fn advance(&mut self, game_id: u8, team: Team) {
        let Some(adv) = advancement(game_id) else {
            return;
        };
        let Some(next) = self.game_mut(adv.to) else {
            return;
        };
        let previous = mem::replace(next.slot_mut(adv.slot), TeamRef::Team(team.clone()));
        trace!("game {} slot {} now {team}, was {previous}", adv.to, adv.slot.number());
        let stale = next.winner.take();
        if let Some(stale) = stale {
            self.retract(adv.to, stale);
        }
    }

    /// Remove `team` from the game fed by `game_id`, walking forward while
    /// anything there had already been decided.
    fn retract(&mut self, mut game_id: u8, mut team: Team) {
        while let Some(adv) = advancement(game_id) {
            let Some(next) = self.game_mut(adv.to) else {
                return;
            };
            let mut changed = false;
            for slot in Slot::BOTH {
                let occupant = next.slot_mut(slot);
                if occupant.holds(&team) {
                    *occupant = TeamRef::Tbd;
                    changed = true;
                }
            }
            let former = next.winner.take();
            if changed {
                trace!("cleared {team} from game {}", adv.to);
            }
            match former {
                Some(former) => {
                    game_id = adv.to;
                    team = former;
                }
                None => return,
            }
        }
    }
}

/// Value-returning form of [`Bracket::select_winner`]; the input is left untouched.
pub fn select_winner(bracket: &Bracket, round: Round, game_id: u8, slot: Slot) -> EngineResult<Bracket> {
    let mut next = bracket.clone();
    next.select_winner(round, game_id, slot)?;
    Ok(next)
}
