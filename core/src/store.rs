use crate::{Team, TournamentRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("network error for {1}: {0}")]
    Network(reqwest::Error, String),
    #[error("store error for {1}: {0}")]
    Api(reqwest::Error, String),
    #[error("parse error for {1}: {0}")]
    Parsing(reqwest::Error, String),
    #[error("could not access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid document at {path}: {source}")]
    Serde {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid document key: {0}")]
    InvalidKey(String),
}

// ---------------------------------------------------------------------------
// Document keys
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    User,
    Master,
}

impl RecordKind {
    pub fn collection(self) -> &'static str {
        match self {
            RecordKind::User => "userBrackets",
            RecordKind::Master => "tournaments",
        }
    }
}

/// Identifies one stored bracket: a user's prediction or a tournament's results.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub kind: RecordKind,
    pub owner_id: Option<String>,
    pub tournament_name: String,
}

impl RecordKey {
    pub fn user(owner_id: impl Into<String>, tournament_name: impl Into<String>) -> Self {
        Self {
            kind: RecordKind::User,
            owner_id: Some(owner_id.into()),
            tournament_name: tournament_name.into(),
        }
    }

    pub fn master(tournament_name: impl Into<String>) -> Self {
        Self { kind: RecordKind::Master, owner_id: None, tournament_name: tournament_name.into() }
    }

    /// `tournaments/<slug>` or `userBrackets/<owner>_<slug>`.
    pub fn document_id(&self) -> StoreResult<String> {
        let slug = slugify(&self.tournament_name);
        if slug.is_empty() {
            return Err(StoreError::InvalidKey(format!(
                "tournament name {:?} has no usable characters",
                self.tournament_name
            )));
        }
        match (self.kind, self.owner_id.as_deref()) {
            (RecordKind::Master, _) => Ok(slug),
            (RecordKind::User, Some(owner)) if is_plain_id(owner) => Ok(format!("{owner}_{slug}")),
            (RecordKind::User, Some(owner)) => {
                Err(StoreError::InvalidKey(format!("owner id {owner:?} is not a plain identifier")))
            }
            (RecordKind::User, None) => Err(StoreError::InvalidKey("user bracket without an owner".into())),
        }
    }

    pub fn path(&self) -> StoreResult<String> {
        Ok(format!("{}/{}", self.kind.collection(), self.document_id()?))
    }
}

fn is_plain_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Trimmed and lowercased, whitespace runs become one hyphen, and anything
/// other than ASCII word characters or hyphens is dropped.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_space = false;
    for c in name.trim().chars() {
        if c.is_whitespace() {
            if !in_space {
                slug.push('-');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            slug.push(c.to_ascii_lowercase());
        }
    }
    slug
}

// ---------------------------------------------------------------------------
// Stored documents
// ---------------------------------------------------------------------------

/// A tournament record as persisted, with the ownership metadata around it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedBracket {
    pub kind: RecordKind,
    #[serde(default)]
    pub owner_id: Option<String>,
    pub tournament_name: String,
    #[serde(default)]
    pub bracket_name: String,
    pub record: TournamentRecord,
    /// Copied from the bracket's final on save, for listing without decoding the bracket.
    #[serde(default)]
    pub champion: Option<Team>,
    pub saved_at: DateTime<Utc>,
}

impl SavedBracket {
    pub fn new(key: &RecordKey, bracket_name: impl Into<String>, record: TournamentRecord) -> Self {
        Self {
            kind: key.kind,
            owner_id: key.owner_id.clone(),
            tournament_name: key.tournament_name.clone(),
            bracket_name: bracket_name.into(),
            champion: record.bracket.champion().cloned(),
            record,
            saved_at: Utc::now(),
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey {
            kind: self.kind,
            owner_id: self.owner_id.clone(),
            tournament_name: self.tournament_name.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Store boundary
// ---------------------------------------------------------------------------

/// Opaque document persistence. Implementations never interpret the bracket.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn load(&self, key: &RecordKey) -> StoreResult<Option<SavedBracket>>;

    /// Returns the document id written.
    async fn save(&self, doc: &SavedBracket) -> StoreResult<String>;

    /// Deleting a missing document is not an error.
    async fn delete(&self, key: &RecordKey) -> StoreResult<()>;

    /// Every document of `kind` belonging to the tournament.
    async fn list(&self, kind: RecordKind, tournament_name: &str) -> StoreResult<Vec<SavedBracket>>;
}

/// Process-local store, used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<String, SavedBracket>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn load(&self, key: &RecordKey) -> StoreResult<Option<SavedBracket>> {
        let path = key.path()?;
        Ok(self.docs.lock().await.get(&path).cloned())
    }

    async fn save(&self, doc: &SavedBracket) -> StoreResult<String> {
        let key = doc.key();
        let path = key.path()?;
        self.docs.lock().await.insert(path, doc.clone());
        key.document_id()
    }

    async fn delete(&self, key: &RecordKey) -> StoreResult<()> {
        let path = key.path()?;
        self.docs.lock().await.remove(&path);
        Ok(())
    }

    async fn list(&self, kind: RecordKind, tournament_name: &str) -> StoreResult<Vec<SavedBracket>> {
        let docs = self.docs.lock().await;
        let mut found: Vec<SavedBracket> = docs
            .values()
            .filter(|d| d.kind == kind && d.tournament_name == tournament_name)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.owner_id.cmp(&b.owner_id));
        Ok(found)
    }
}

/// One pretty-printed JSON file per document: `<root>/<collection>/<id>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn file_for(&self, key: &RecordKey) -> StoreResult<PathBuf> {
        Ok(self.root.join(key.kind.collection()).join(format!("{}.json", key.document_id()?)))
    }

    async fn read_doc(path: &Path) -> StoreResult<Option<SavedBracket>> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path: path.to_owned(), source }),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| StoreError::Serde { path: path.to_owned(), source })
    }
}

#[async_trait]
impl RecordStore for FileStore {
    async fn load(&self, key: &RecordKey) -> StoreResult<Option<SavedBracket>> {
        let path = self.file_for(key)?;
        Self::read_doc(&path).await
    }

    async fn save(&self, doc: &SavedBracket) -> StoreResult<String> {
        let key = doc.key();
        let path = self.file_for(&key)?;
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| StoreError::Io { path: dir.to_owned(), source })?;
        }
        let body = serde_json::to_string_pretty(doc)
            .map_err(|source| StoreError::Serde { path: path.clone(), source })?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|source| StoreError::Io { path: path.clone(), source })?;
        debug!("wrote {}", path.display());
        key.document_id()
    }

    async fn delete(&self, key: &RecordKey) -> StoreResult<()> {
        let path = self.file_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    async fn list(&self, kind: RecordKind, tournament_name: &str) -> StoreResult<Vec<SavedBracket>> {
        let dir = self.root.join(kind.collection());
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::Io { path: dir, source }),
        };

        let mut found = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| StoreError::Io { path: dir.clone(), source })?
        {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            match Self::read_doc(&path).await {
                Ok(Some(doc)) if doc.tournament_name == tournament_name => found.push(doc),
                Ok(_) => {}
                Err(e) => warn!("skipping unreadable document: {e}"),
            }
        }
        found.sort_by(|a, b| a.owner_id.cmp(&b.owner_id));
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Round, Slot, create_record};

    const TOURNAMENT: &str = "USA Ultimate College Nationals 2025";

    fn record() -> TournamentRecord {
        let teams: Vec<Team> = (1..=20).map(|seed| Team::new(format!("Team {seed}"), seed)).collect();
        let mut record = create_record(TOURNAMENT, &teams).unwrap().record;
        record.repopulate();
        record
    }

    fn temp_root(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ultibracket-store-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify(TOURNAMENT), "usa-ultimate-college-nationals-2025");
        assert_eq!(slugify("  D-I  Nationals!! "), "d-i-nationals");
        assert_eq!(slugify("St. Olaf's Invite"), "st-olafs-invite");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn document_ids_follow_collection_layout() {
        assert_eq!(
            RecordKey::master(TOURNAMENT).path().unwrap(),
            "tournaments/usa-ultimate-college-nationals-2025"
        );
        assert_eq!(
            RecordKey::user("u123", TOURNAMENT).path().unwrap(),
            "userBrackets/u123_usa-ultimate-college-nationals-2025"
        );
    }

    #[test]
    fn bad_keys_are_rejected() {
        assert!(matches!(RecordKey::master("!!!").document_id(), Err(StoreError::InvalidKey(_))));
        assert!(matches!(RecordKey::user("../x", TOURNAMENT).document_id(), Err(StoreError::InvalidKey(_))));
        let ownerless = RecordKey { kind: RecordKind::User, owner_id: None, tournament_name: TOURNAMENT.into() };
        assert!(ownerless.document_id().is_err());
    }

    #[test]
    fn saved_bracket_derives_champion() {
        let mut record = record();
        record.bracket.select_winner(Round::PreQuarters, 1, Slot::One).unwrap();
        record.bracket.select_winner(Round::Quarters, 5, Slot::One).unwrap();
        let doc = SavedBracket::new(&RecordKey::user("u1", TOURNAMENT), "Chalk", record.clone());
        assert_eq!(doc.champion, None);

        let mut complete = record;
        complete.bracket.select_winner(Round::Quarters, 6, Slot::One).unwrap();
        complete.bracket.select_winner(Round::Semis, 9, Slot::Two).unwrap();
        complete.bracket.select_winner(Round::Final, 11, Slot::One).unwrap();
        let doc = SavedBracket::new(&RecordKey::user("u1", TOURNAMENT), "Chalk", complete);
        assert_eq!(doc.champion.map(|t| t.seed), Some(4));
    }

    #[test]
    fn saved_bracket_json_uses_camel_case() {
        let doc = SavedBracket::new(&RecordKey::user("u1", TOURNAMENT), "Mine", record());
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["ownerId"], "u1");
        assert_eq!(json["bracketName"], "Mine");
        assert_eq!(json["kind"], "user");
        assert!(json["record"]["pools"]["Pool A"].is_array());
    }

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryStore::new();
        let key = RecordKey::user("u1", TOURNAMENT);
        assert!(store.load(&key).await.unwrap().is_none());

        let doc = SavedBracket::new(&key, "Mine", record());
        let id = store.save(&doc).await.unwrap();
        assert_eq!(id, "u1_usa-ultimate-college-nationals-2025");
        assert_eq!(store.load(&key).await.unwrap(), Some(doc));

        store.delete(&key).await.unwrap();
        assert!(store.load(&key).await.unwrap().is_none());
        store.delete(&key).await.unwrap();
    }

    #[tokio::test]
    async fn memory_store_lists_by_kind_and_tournament() {
        let store = MemoryStore::new();
        for owner in ["b", "a"] {
            let key = RecordKey::user(owner, TOURNAMENT);
            store.save(&SavedBracket::new(&key, owner, record())).await.unwrap();
        }
        let master = RecordKey::master(TOURNAMENT);
        store.save(&SavedBracket::new(&master, "Results", record())).await.unwrap();
        let other = RecordKey::user("c", "Another Event");
        store.save(&SavedBracket::new(&other, "c", record())).await.unwrap();

        let users = store.list(RecordKind::User, TOURNAMENT).await.unwrap();
        let owners: Vec<_> = users.iter().filter_map(|d| d.owner_id.as_deref()).collect();
        assert_eq!(owners, vec!["a", "b"]);
        assert_eq!(store.list(RecordKind::Master, TOURNAMENT).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn file_store_round_trip() {
        let root = temp_root("round-trip");
        let store = FileStore::new(&root);
        let key = RecordKey::master(TOURNAMENT);
        assert!(store.load(&key).await.unwrap().is_none());

        let doc = SavedBracket::new(&key, "Results", record());
        store.save(&doc).await.unwrap();
        assert!(root.join("tournaments/usa-ultimate-college-nationals-2025.json").exists());
        assert_eq!(store.load(&key).await.unwrap(), Some(doc));

        store.delete(&key).await.unwrap();
        assert!(store.load(&key).await.unwrap().is_none());
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn file_store_lists_and_skips_other_files() {
        let root = temp_root("list");
        let store = FileStore::new(&root);
        assert!(store.list(RecordKind::User, TOURNAMENT).await.unwrap().is_empty());

        for owner in ["u2", "u1"] {
            let key = RecordKey::user(owner, TOURNAMENT);
            store.save(&SavedBracket::new(&key, owner, record())).await.unwrap();
        }
        std::fs::write(root.join("userBrackets/notes.txt"), "ignore me").unwrap();

        let listed = store.list(RecordKind::User, TOURNAMENT).await.unwrap();
        let owners: Vec<_> = listed.iter().filter_map(|d| d.owner_id.clone()).collect();
        assert_eq!(owners, vec!["u1".to_owned(), "u2".to_owned()]);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn file_store_reports_corrupt_documents() {
        let root = temp_root("corrupt");
        let store = FileStore::new(&root);
        let key = RecordKey::master(TOURNAMENT);
        std::fs::create_dir_all(root.join("tournaments")).unwrap();
        std::fs::write(root.join("tournaments/usa-ultimate-college-nationals-2025.json"), "{ nope").unwrap();

        assert!(matches!(store.load(&key).await, Err(StoreError::Serde { .. })));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn file_store_list_skips_corrupt_documents() {
        let root = temp_root("list-corrupt");
        let store = FileStore::new(&root);
        let key = RecordKey::user("u1", TOURNAMENT);
        store.save(&SavedBracket::new(&key, "Chalk", record())).await.unwrap();
        std::fs::write(root.join("userBrackets/u2_usa-ultimate-college-nationals-2025.json"), "{ nope").unwrap();

        let listed = store.list(RecordKind::User, TOURNAMENT).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].bracket_name, "Chalk");
        let _ = std::fs::remove_dir_all(&root);
    }
}
