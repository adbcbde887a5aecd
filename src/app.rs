use crate::cli::Command;
use crate::render;
use crate::state::app_settings::{AppSettings, StoreBackend};
use crate::state::identity::Identity;
use crate::state::lock::{LockGate, MASTER_BANNER};
use crate::state::session::{Origin, Role, Session, SessionError};
use anyhow::{Context, bail};
use log::{info, warn};
use std::sync::Arc;
use ultibracket_core::client::HttpStore;
use ultibracket_core::leaderboard::{self, SortOrder};
use ultibracket_core::store::{FileStore, RecordKey, RecordKind, RecordStore};
use ultibracket_core::{create_record, score};

/// Whose bracket a command acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Own,
    Master,
    View(String),
}

pub struct App {
    pub settings: AppSettings,
    identity: Identity,
    lock: LockGate,
    store: Arc<dyn RecordStore>,
    drafts: Arc<dyn RecordStore>,
}

impl App {
    pub fn new(settings: AppSettings, identity: Identity) -> Self {
        let store: Arc<dyn RecordStore> = match &settings.store {
            StoreBackend::File => Arc::new(FileStore::new(settings.data_dir.clone())),
            StoreBackend::Remote { base_url, token } => {
                let client = HttpStore::new(base_url.clone());
                Arc::new(match token {
                    Some(token) => client.with_token(token.clone()),
                    None => client,
                })
            }
        };
        let drafts: Arc<dyn RecordStore> = Arc::new(FileStore::new(settings.drafts_dir()));
        Self::with_stores(settings, identity, store, drafts)
    }

    pub fn with_stores(
        settings: AppSettings,
        identity: Identity,
        store: Arc<dyn RecordStore>,
        drafts: Arc<dyn RecordStore>,
    ) -> Self {
        let lock = LockGate::new(settings.lock_deadline);
        Self { settings, identity, lock, store, drafts }
    }

    /// Run one command and return what to print.
    pub async fn execute(&self, target: &Target, command: Command) -> anyhow::Result<String> {
        match command {
            Command::Show => self.on_show(target).await,
            Command::Reorder { pool, from, to } => {
                let (from, to) = (position(from)?, position(to)?);
                self.on_edit(target, |session| session.reorder(pool, from, to)).await
            }
            Command::Populate => self.on_edit(target, Session::populate).await,
            Command::Pick { game_id, slot } => {
                self.on_edit(target, |session| session.pick(game_id, slot)).await
            }
            Command::Record { pool, team, wins, losses } => {
                self.on_edit(target, |session| session.set_pool_record(pool, &team, wins, losses))
                    .await
            }
            Command::Save { name } => self.on_save(target, name.as_deref()).await,
            Command::Discard => self.on_discard(target).await,
            Command::DeleteMaster { yes } => self.on_delete_master(target, yes).await,
            Command::Score => self.on_score(target).await,
            Command::Leaderboard { sort, asc, desc } => {
                let order = if asc {
                    SortOrder::Ascending
                } else if desc {
                    SortOrder::Descending
                } else {
                    sort.default_order()
                };
                self.on_leaderboard(sort, order).await
            }
            Command::Rules => Ok(render::rules(&self.settings.scoring)),
        }
    }

    // -----------------------------------------------------------------------
    // Command handlers
    // -----------------------------------------------------------------------

    async fn on_show(&self, target: &Target) -> anyhow::Result<String> {
        let session = self.open_session(target).await?;
        Ok(render::session(&session, &self.lock_status(&session)))
    }

    async fn on_edit(
        &self,
        target: &Target,
        edit: impl FnOnce(&mut Session) -> Result<(), SessionError>,
    ) -> anyhow::Result<String> {
        let mut session = self.open_session(target).await?;
        edit(&mut session)?;
        if session.is_dirty() {
            self.drafts.save(&session.to_draft()).await.context("could not keep the draft")?;
            session.origin = Origin::Draft;
        }
        Ok(render::session(&session, &self.lock_status(&session)))
    }

    async fn on_save(&self, target: &Target, name: Option<&str>) -> anyhow::Result<String> {
        let mut session = self.open_session(target).await?;
        if let Some(name) = name {
            session.rename(name)?;
        }
        let doc = session.prepare_save()?;
        let id = self.store.save(&doc).await.context("could not publish the bracket")?;
        self.drafts.delete(&session.key).await.context("could not clear the draft")?;
        session.mark_saved();
        info!("published {id}");

        Ok(if session.is_master() {
            format!("Master bracket \"{}\" saved successfully!\n", session.key.tournament_name)
        } else {
            format!("Bracket \"{}\" saved successfully!\n", session.bracket_name)
        })
    }

    async fn on_discard(&self, target: &Target) -> anyhow::Result<String> {
        let (key, role) = self.resolve(target)?;
        if role == Role::Viewer {
            return Err(SessionError::ReadOnly.into());
        }
        self.drafts.delete(&key).await.context("could not remove the draft")?;
        Ok("Unsaved changes discarded.\n".to_string())
    }

    async fn on_delete_master(&self, target: &Target, confirmed: bool) -> anyhow::Result<String> {
        if *target != Target::Master {
            bail!("delete-master acts on the master bracket; pass --master");
        }
        if !confirmed {
            bail!("refusing to delete the master results without --yes");
        }
        let (key, _) = self.resolve(target)?;
        self.store.delete(&key).await.context("could not delete the master bracket")?;
        self.drafts.delete(&key).await.context("could not remove the master draft")?;
        warn!("master results for {} deleted", key.tournament_name);
        Ok(format!("Master bracket \"{}\" deleted; scores reset.\n", key.tournament_name))
    }

    async fn on_score(&self, target: &Target) -> anyhow::Result<String> {
        let session = self.open_session(target).await?;
        let master = self.load_master().await?;
        let master_record = master.as_ref().map(|doc| &doc.record);
        let result = score(&session.record.bracket, master_record, &self.settings.scoring);
        Ok(render::score(&session.bracket_name, &result, master.is_some()))
    }

    async fn on_leaderboard(
        &self,
        sort: leaderboard::SortColumn,
        order: SortOrder,
    ) -> anyhow::Result<String> {
        let tournament = &self.settings.tournament_name;
        let (entries, master) = futures_util::future::try_join(
            self.store.list(RecordKind::User, tournament),
            self.store.load(&RecordKey::master(&self.settings.master_id)),
        )
        .await
        .context("could not load brackets")?;

        let mut rows = leaderboard::build(&entries, master.as_ref().map(|m| &m.record), &self.settings.scoring);
        leaderboard::sort_rows(&mut rows, sort, order);
        Ok(render::leaderboard(tournament, &rows))
    }

    // -----------------------------------------------------------------------
    // Session plumbing
    // -----------------------------------------------------------------------

    fn resolve(&self, target: &Target) -> Result<(RecordKey, Role), anyhow::Error> {
        let tournament = &self.settings.tournament_name;
        match target {
            Target::Master => {
                if !self.identity.is_admin(&self.settings.admins) {
                    bail!("only tournament admins may open the master bracket");
                }
                Ok((RecordKey::master(&self.settings.master_id), Role::Master))
            }
            Target::View(owner) if self.identity.user_id() == Some(owner.as_str()) => {
                Ok((RecordKey::user(owner, tournament), Role::Owner))
            }
            Target::View(owner) => Ok((RecordKey::user(owner, tournament), Role::Viewer)),
            Target::Own => {
                let owner = self.identity.user_id().ok_or(SessionError::Anonymous)?;
                Ok((RecordKey::user(owner, tournament), Role::Owner))
            }
        }
    }

    /// Draft first, then the published document, then a fresh record.
    async fn open_session(&self, target: &Target) -> anyhow::Result<Session> {
        let (key, role) = self.resolve(target)?;

        let draft = match role {
            Role::Viewer => None,
            Role::Master | Role::Owner => self.drafts.load(&key).await.context("could not read the draft")?,
        };
        let stored = match draft {
            Some(doc) => Some((Origin::Draft, doc)),
            None => self
                .store
                .load(&key)
                .await
                .with_context(|| format!("could not load the bracket for {}", key.tournament_name))?
                .map(|doc| (Origin::Published, doc)),
        };

        let teams = match stored {
            Some(_) => Vec::new(),
            None => self.settings.teams()?,
        };
        let name = self.settings.tournament_name.clone();
        let session = Session::open(key, role, self.lock.is_locked(), stored, || {
            let seeded = create_record(&name, &teams)?;
            if seeded.fallback {
                warn!("team list is short; pools were dealt round-robin");
            }
            Ok(seeded.record)
        })?;
        Ok(session)
    }

    async fn load_master(&self) -> anyhow::Result<Option<ultibracket_core::store::SavedBracket>> {
        self.store
            .load(&RecordKey::master(&self.settings.master_id))
            .await
            .context("could not load the master bracket")
    }

    fn lock_status(&self, session: &Session) -> String {
        if session.is_master() {
            MASTER_BANNER.to_string()
        } else {
            self.lock.countdown_at(chrono::Utc::now())
        }
    }
}

/// One-based position from the command line to a zero-based index.
fn position(one_based: usize) -> anyhow::Result<usize> {
    one_based.checked_sub(1).context("pool positions start at 1")
}
