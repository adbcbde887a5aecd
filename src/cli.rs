use crate::app::Target;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use ultibracket_core::leaderboard::SortColumn;
use ultibracket_core::{PoolName, Slot};

/// College ultimate nationals bracket challenge
///
/// Rank each pool, generate the bracket, pick winners and compare against the
/// official results. Edits are kept as a local draft until `save` publishes them.
#[derive(Parser, Debug)]
#[command(version, about = "College ultimate nationals bracket challenge")]
pub struct Args {
    /// Settings file (TOML); defaults to ~/.config/ultibracket/settings.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Whether to log on the debug level
    #[arg(long, global = true)]
    pub debug: bool,

    /// Act as this user instead of ULTIBRACKET_USER or $USER
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Work on the master results bracket
    #[arg(long, global = true, conflicts_with = "view")]
    pub master: bool,

    /// Open another user's published bracket read-only
    #[arg(long, global = true, value_name = "USER")]
    pub view: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print pools, bracket and lock status
    Show,

    /// Move a team within a pool (positions start at 1); clears the bracket
    Reorder { pool: PoolName, from: usize, to: usize },

    /// Generate the bracket from the current pool order
    Populate,

    /// Toggle the winner of a game (ids 1-11), slot 1 or 2
    Pick { game_id: u8, slot: Slot },

    /// Enter a team's pool result, by seed or "Name (seed)" (master only)
    Record { pool: PoolName, team: String, wins: u32, losses: u32 },

    /// Publish the bracket
    Save {
        /// Display name for the bracket
        #[arg(long)]
        name: Option<String>,
    },

    /// Throw away unsaved edits
    Discard,

    /// Delete the published master results (admin only)
    DeleteMaster {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Score the bracket against the master results
    Score,

    /// Rank every published bracket for the tournament
    Leaderboard {
        /// score, remaining, name or champion
        #[arg(long, default_value = "score")]
        sort: SortColumn,

        /// Sort ascending regardless of column
        #[arg(long, conflicts_with = "desc")]
        asc: bool,

        /// Sort descending regardless of column
        #[arg(long)]
        desc: bool,
    },

    /// Print the scoring rules
    Rules,
}

impl Args {
    /// Whose bracket the command acts on.
    pub fn target(&self) -> Target {
        match (&self.view, self.master) {
            (Some(owner), _) => Target::View(owner.clone()),
            (None, true) => Target::Master,
            (None, false) => Target::Own,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_pick_and_reorder() {
        let args = Args::parse_from(["ultibracket", "--user", "u1", "pick", "5", "2"]);
        assert_eq!(args.user.as_deref(), Some("u1"));
        assert_eq!(args.command, Command::Pick { game_id: 5, slot: Slot::Two });

        let args = Args::parse_from(["ultibracket", "reorder", "Pool C", "3", "1"]);
        assert_eq!(args.command, Command::Reorder { pool: PoolName::C, from: 3, to: 1 });
        assert_eq!(args.target(), Target::Own);
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let args = Args::parse_from(["ultibracket", "record", "a", "1", "4", "0", "--master"]);
        assert!(args.master);
        assert_eq!(args.target(), Target::Master);
        assert_eq!(
            args.command,
            Command::Record { pool: PoolName::A, team: "1".into(), wins: 4, losses: 0 }
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Args::try_parse_from(["ultibracket", "pick", "5", "3"]).is_err());
        assert!(Args::try_parse_from(["ultibracket", "leaderboard", "--sort", "points"]).is_err());
        assert!(Args::try_parse_from(["ultibracket", "--master", "--view", "u2", "show"]).is_err());
    }

    #[test]
    fn leaderboard_defaults_to_score() {
        let args = Args::parse_from(["ultibracket", "leaderboard", "--view", "u2"]);
        assert_eq!(args.target(), Target::View("u2".into()));
        assert_eq!(args.command, Command::Leaderboard { sort: SortColumn::Score, asc: false, desc: false });
    }
}
