use log::{debug, info};
use thiserror::Error;
use ultibracket_core::store::{RecordKey, RecordKind, SavedBracket};
use ultibracket_core::{EngineError, EngineResult, PoolName, Round, Slot, TournamentRecord};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Cannot save user bracket, it is locked.")]
    Locked,
    #[error("no user identity; pass --user or set ULTIBRACKET_USER")]
    Anonymous,
    #[error("this bracket belongs to someone else and is read-only")]
    ReadOnly,
    #[error("Please populate the bracket from pool rankings before saving.")]
    NotGenerated,
    #[error("User bracket name cannot be empty.")]
    EmptyName,
    #[error("only the master bracket accepts pool results")]
    MasterOnly,
    #[error("{0}")]
    Unavailable(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// How the caller relates to the bracket being opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Master,
    Owner,
    Viewer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Editable,
    Locked,
    ViewOnly,
}

/// Where the session's record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Draft,
    Published,
    Fresh,
}

/// One bracket being viewed or edited. Edits apply in order to the in-memory
/// record; nothing here touches storage.
#[derive(Debug, Clone)]
pub struct Session {
    pub key: RecordKey,
    pub role: Role,
    pub bracket_name: String,
    pub record: TournamentRecord,
    pub access: Access,
    pub origin: Origin,
    dirty: bool,
}

impl Session {
    /// Open `stored` (a draft or the published document), or start a fresh
    /// record when there is none and the caller may create one.
    pub fn open(
        key: RecordKey,
        role: Role,
        locked: bool,
        stored: Option<(Origin, SavedBracket)>,
        fresh: impl FnOnce() -> EngineResult<TournamentRecord>,
    ) -> Result<Self, SessionError> {
        let access = match role {
            Role::Master => Access::Editable,
            Role::Owner if locked => Access::Locked,
            Role::Owner => Access::Editable,
            Role::Viewer => Access::ViewOnly,
        };

        if let Some((origin, doc)) = stored {
            debug!("opened {:?} bracket {:?} from {origin:?}", key.kind, doc.bracket_name);
            return Ok(Self {
                key,
                role,
                bracket_name: doc.bracket_name,
                record: doc.record,
                access,
                origin,
                dirty: false,
            });
        }

        let bracket_name = match (role, key.owner_id.as_deref()) {
            (Role::Master, _) => key.tournament_name.clone(),
            (Role::Owner, Some(owner)) if !locked => format!("{owner}'s Bracket"),
            (Role::Owner, _) => {
                return Err(SessionError::Unavailable(
                    "Cannot create or view this bracket (it may not exist, or is locked).".into(),
                ));
            }
            (Role::Viewer, _) => {
                return Err(SessionError::Unavailable("Bracket not found for the specified user.".into()));
            }
        };

        info!("starting a new bracket for {}", key.tournament_name);
        Ok(Self {
            key,
            role,
            bracket_name,
            record: fresh()?,
            access,
            origin: Origin::Fresh,
            dirty: true,
        })
    }

    pub fn is_master(&self) -> bool {
        self.key.kind == RecordKind::Master
    }

    /// Unsaved edits exist that a draft should capture.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn can_edit(&self) -> bool {
        self.access == Access::Editable
    }

    fn ensure_editable(&self) -> Result<(), SessionError> {
        match self.access {
            Access::Editable => Ok(()),
            Access::Locked => Err(SessionError::Locked),
            Access::ViewOnly => Err(SessionError::ReadOnly),
        }
    }

    /// Moving a team wipes the bracket; it must be populated again.
    pub fn reorder(&mut self, pool: PoolName, from: usize, to: usize) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.record.reorder(pool, from, to)?;
        self.dirty = true;
        Ok(())
    }

    pub fn populate(&mut self) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.record.repopulate();
        self.dirty = true;
        Ok(())
    }

    /// Toggle a winner by game id; the round follows from the id.
    pub fn pick(&mut self, game_id: u8, slot: Slot) -> Result<(), SessionError> {
        self.ensure_editable()?;
        let round = Round::of_game(game_id).ok_or(EngineError::GameOutOfRange(game_id))?;
        self.record.bracket.select_winner(round, game_id, slot)?;
        self.dirty = true;
        Ok(())
    }

    /// Enter a team's pool result on the master.
    pub fn set_pool_record(
        &mut self,
        pool: PoolName,
        team: &str,
        wins: u32,
        losses: u32,
    ) -> Result<(), SessionError> {
        if !self.is_master() {
            return Err(SessionError::MasterOnly);
        }
        self.ensure_editable()?;
        let team = self.record.pools.find_team(pool, team)?;
        self.record.pools.set_record(pool, &team, wins, losses)?;
        self.dirty = true;
        Ok(())
    }

    pub fn rename(&mut self, name: &str) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.bracket_name = name.trim().to_string();
        self.dirty = true;
        Ok(())
    }

    /// The document to publish, once every save rule passes.
    pub fn prepare_save(&self) -> Result<SavedBracket, SessionError> {
        self.ensure_editable()?;
        if !self.is_master() && self.bracket_name.trim().is_empty() {
            return Err(SessionError::EmptyName);
        }
        if !self.record.bracket.is_generated() {
            return Err(SessionError::NotGenerated);
        }
        Ok(SavedBracket::new(&self.key, self.bracket_name.trim(), self.record.clone()))
    }

    /// Snapshot of the in-progress edits, saved without any publishing rules.
    pub fn to_draft(&self) -> SavedBracket {
        SavedBracket::new(&self.key, self.bracket_name.clone(), self.record.clone())
    }

    pub fn mark_saved(&mut self) {
        self.origin = Origin::Published;
        self.dirty = false;
    }
}
