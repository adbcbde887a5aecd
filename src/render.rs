use crate::state::session::{Access, Origin, Session};
use ultibracket_core::leaderboard::LeaderboardRow;
use ultibracket_core::{Bracket, Game, Pools, Round, Score, ScoringScheme, TeamRef};

// ---------------------------------------------------------------------------
// Session views
// ---------------------------------------------------------------------------

pub fn session(session: &Session, lock_status: &str) -> String {
    let mut out = String::new();
    let access = match session.access {
        Access::Editable => "editable",
        Access::Locked => "locked",
        Access::ViewOnly => "view only",
    };
    let origin = match session.origin {
        Origin::Draft => ", unsaved draft",
        Origin::Published => "",
        Origin::Fresh => ", new",
    };
    out.push_str(&format!("{} ({access}{origin})\n", session.bracket_name));
    out.push_str(&format!("{}  |  {lock_status}\n\n", session.record.name));
    out.push_str(&pools(&session.record.pools, session.is_master()));
    out.push('\n');
    out.push_str(&bracket(&session.record.bracket));
    if session.can_edit() && (session.is_dirty() || session.origin == Origin::Draft) {
        out.push_str("\nUnsaved changes; run `save` to publish or `discard` to drop them.\n");
    }
    out
}

/// Pools in ranked order. Teams reaching the bracket carry a `*`.
pub fn pools(pools: &Pools, with_records: bool) -> String {
    let mut out = String::new();
    for (name, standings) in pools.iter() {
        out.push_str(&format!("{name}\n"));
        for (rank, standing) in standings.iter().enumerate() {
            let marker = if standing.advanced { "*" } else { " " };
            out.push_str(&format!("  {}. {marker} {}", rank + 1, standing.team));
            if with_records {
                out.push_str(&format!("  {}-{}", standing.wins, standing.losses));
            }
            out.push('\n');
        }
    }
    out
}

pub fn bracket(bracket: &Bracket) -> String {
    if !bracket.is_generated() {
        return "Bracket not generated yet; run `populate` after ranking the pools.\n".to_string();
    }
    let mut out = String::new();
    for round in Round::ALL {
        out.push_str(&format!("{round}\n"));
        for game in bracket.round(round) {
            out.push_str(&game_line(game));
        }
    }
    match bracket.champion() {
        Some(champion) => out.push_str(&format!("\nChampion: {champion}\n")),
        None => out.push_str("\nChampion: TBD\n"),
    }
    out
}

fn game_line(game: &Game) -> String {
    let side = |slot: &TeamRef| {
        let won = slot.team().is_some() && slot.team() == game.winner.as_ref();
        if won { format!("[{slot}]") } else { slot.to_string() }
    };
    format!("  {:>2}. {}  vs  {}\n", game.id, side(&game.team1), side(&game.team2))
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

pub fn score(bracket_name: &str, score: &Score, has_master: bool) -> String {
    let mut out = format!("{bracket_name}\n");
    if !has_master {
        out.push_str("No master results yet; nothing has been scored.\n");
    }
    out.push_str(&format!("  Current score:     {}\n", score.current_score));
    out.push_str(&format!("  Possible remaining: {}\n", score.possible_points_remaining));
    out.push_str(&format!("  Max points:        {}\n", score.max_points));
    out
}

pub fn leaderboard(tournament: &str, rows: &[LeaderboardRow]) -> String {
    if rows.is_empty() {
        return format!("No brackets saved for {tournament} yet.\n");
    }
    let name_width = rows.iter().map(|r| r.bracket_name.len()).max().unwrap_or(0).max(7);
    let mut out = format!("{tournament}\n");
    out.push_str(&format!(
        "  #  {:<name_width$}  {:>6}  {:>9}  Champion\n",
        "Bracket", "Score", "Remaining"
    ));
    for (rank, row) in rows.iter().enumerate() {
        let champion = row.champion.as_ref().map_or_else(|| "-".to_string(), ToString::to_string);
        out.push_str(&format!(
            "{:>3}  {:<name_width$}  {:>6}  {:>9}  {champion}\n",
            rank + 1,
            row.bracket_name,
            row.score.current_score,
            row.score.possible_points_remaining,
        ));
    }
    out
}

pub fn rules(scheme: &ScoringScheme) -> String {
    let mut out = format!("Scoring rules (version {})\n", scheme.version);
    for round in Round::ALL {
        out.push_str(&format!(
            "  {:<16} {:>5} per correct team ({} slots)\n",
            round.label(),
            scheme.round_value(round),
            round.game_count() * 2
        ));
    }
    out.push_str(&format!("  {:<16} {:>5} for the exact champion\n", "Champion", scheme.champion));
    out.push_str(&format!("  Maximum: {}\n", scheme.max_points()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ultibracket_core::{Slot, Team, create_record};

    fn record() -> ultibracket_core::TournamentRecord {
        let teams: Vec<Team> = (1..=20).map(|seed| Team::new(format!("Team {seed}"), seed)).collect();
        create_record("Nationals", &teams).unwrap().record
    }

    #[test]
    fn ungenerated_bracket_prompts_populate() {
        assert!(bracket(&record().bracket).contains("populate"));
    }

    #[test]
    fn winners_are_bracketed() {
        let mut record = record();
        record.repopulate();
        record.bracket.select_winner(Round::PreQuarters, 1, Slot::Two).unwrap();
        let text = bracket(&record.bracket);
        assert!(text.contains(" 1. Team 8 (8)  vs  [Team 9 (9)]"), "{text}");
        assert!(text.contains(" 5. Team 1 (1)  vs  Team 9 (9)"), "{text}");
        assert!(text.ends_with("Champion: TBD\n"));
    }

    #[test]
    fn pools_mark_advancing_teams() {
        let mut record = record();
        record.repopulate();
        let text = pools(&record.pools, true);
        assert!(text.contains("Pool A\n  1. * Team 1 (1)  0-0\n"), "{text}");
        assert!(text.contains("  4.   Team 13 (13)  0-0\n"), "{text}");
    }

    #[test]
    fn rules_list_max_points() {
        let text = rules(&ScoringScheme::default());
        assert!(text.contains("version 2"));
        assert!(text.contains("Maximum: 7200"));
    }

    #[test]
    fn empty_leaderboard_says_so() {
        assert_eq!(leaderboard("Nationals", &[]), "No brackets saved for Nationals yet.\n");
    }
}
