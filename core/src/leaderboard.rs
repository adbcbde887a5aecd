use crate::scoring::{ConfirmedAdvancement, Score, ScoringScheme, score_against};
use crate::store::SavedBracket;
use crate::{Team, TournamentRecord};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    pub owner_id: String,
    pub bracket_name: String,
    pub champion: Option<Team>,
    #[serde(flatten)]
    pub score: Score,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Score,
    Remaining,
    Name,
    Champion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortColumn {
    /// Points columns rank highest first; text columns read alphabetically.
    pub fn default_order(self) -> SortOrder {
        match self {
            SortColumn::Score | SortColumn::Remaining => SortOrder::Descending,
            SortColumn::Name | SortColumn::Champion => SortOrder::Ascending,
        }
    }
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "score" => Ok(SortColumn::Score),
            "remaining" => Ok(SortColumn::Remaining),
            "name" => Ok(SortColumn::Name),
            "champion" => Ok(SortColumn::Champion),
            other => Err(format!("unknown sort column {other:?} (score, remaining, name, champion)")),
        }
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortColumn::Score => "score",
            SortColumn::Remaining => "remaining",
            SortColumn::Name => "name",
            SortColumn::Champion => "champion",
        })
    }
}

/// Score every saved bracket against the master. Rows come back ranked by score.
pub fn build(entries: &[SavedBracket], master: Option<&TournamentRecord>, scheme: &ScoringScheme) -> Vec<LeaderboardRow> {
    let confirmed = master.map(ConfirmedAdvancement::from_master);
    let mut rows: Vec<LeaderboardRow> = entries
        .iter()
        .map(|entry| {
            let score = match &confirmed {
                Some(confirmed) => score_against(&entry.record.bracket, confirmed, scheme),
                None => crate::score(&entry.record.bracket, None, scheme),
            };
            LeaderboardRow {
                owner_id: entry.owner_id.clone().unwrap_or_default(),
                bracket_name: entry.bracket_name.clone(),
                champion: entry.record.bracket.champion().cloned(),
                score,
            }
        })
        .collect();
    sort_rows(&mut rows, SortColumn::Score, SortColumn::Score.default_order());
    rows
}

/// Stable sort; equal keys fall back to bracket name, then owner.
pub fn sort_rows(rows: &mut [LeaderboardRow], column: SortColumn, order: SortOrder) {
    rows.sort_by(|a, b| {
        let primary = match column {
            SortColumn::Score => a.score.current_score.cmp(&b.score.current_score),
            SortColumn::Remaining => {
                a.score.possible_points_remaining.cmp(&b.score.possible_points_remaining)
            }
            SortColumn::Name => a.bracket_name.to_lowercase().cmp(&b.bracket_name.to_lowercase()),
            SortColumn::Champion => compare_champions(a.champion.as_ref(), b.champion.as_ref()),
        };
        let primary = match order {
            SortOrder::Ascending => primary,
            SortOrder::Descending => primary.reverse(),
        };
        primary
            .then_with(|| a.bracket_name.to_lowercase().cmp(&b.bracket_name.to_lowercase()))
            .then_with(|| a.owner_id.cmp(&b.owner_id))
    });
}

/// Brackets without a champion sort last.
fn compare_champions(a: Option<&Team>, b: Option<&Team>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.name.cmp(&b.name),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
