use chrono::{DateTime, Utc};
use log::LevelFilter;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use ultibracket_core::{ScoringScheme, Team};

const EMBEDDED_TEAMS_JSON: &str = include_str!("../../data/teams_2025.json");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("failed to parse config file {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },

    #[error("invalid team list {path}: {source}")]
    Teams { path: String, source: serde_json::Error },

    #[error("invalid value for `{field}`: {message}")]
    Invalid { field: &'static str, message: String },
}

/// Where published brackets live.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreBackend {
    /// JSON files under the data directory.
    File,
    /// A hosted document store.
    Remote {
        base_url: String,
        #[serde(default)]
        token: Option<String>,
    },
}

/// Nationals is played in two divisions, each with its own brackets and master.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Division {
    Mens,
    Womens,
}

impl Division {
    pub fn label(self) -> &'static str {
        match self {
            Division::Mens => "Men's Division",
            Division::Womens => "Women's Division",
        }
    }

    fn id_suffix(self) -> &'static str {
        match self {
            Division::Mens => "MENS",
            Division::Womens => "WOMENS",
        }
    }
}

impl FromStr for Division {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mens" | "men" => Ok(Division::Mens),
            "womens" | "women" => Ok(Division::Womens),
            other => Err(ConfigError::Invalid {
                field: "division",
                message: format!("{other:?} is not mens or womens"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub tournament_name: String,
    /// Name the master results are filed under.
    pub master_id: String,
    /// When set, suffixes the tournament name and master id per division.
    pub division: Option<Division>,
    pub lock_deadline: DateTime<Utc>,
    /// Local drafts, and published brackets with the file backend.
    pub data_dir: PathBuf,
    pub store: StoreBackend,
    /// JSON list of `{ "name": …, "seed": … }`. Defaults to the 2025 field.
    pub teams_file: Option<PathBuf>,
    /// Users allowed to edit the master. Empty means anyone passing `--master`.
    pub admins: Vec<String>,
    pub log_level: Option<String>,
    pub scoring: ScoringScheme,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            tournament_name: "USA Ultimate College Nationals 2025".to_string(),
            master_id: "MASTER_BRACKET_USAU_2025".to_string(),
            division: None,
            lock_deadline: default_lock_deadline(),
            data_dir: default_data_dir(),
            store: StoreBackend::File,
            teams_file: None,
            admins: Vec::new(),
            log_level: None,
            scoring: ScoringScheme::default(),
        }
    }
}

fn default_lock_deadline() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-05-23T17:30:00Z")
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn default_data_dir() -> PathBuf {
    if let Ok(data_dir) = std::env::var("XDG_DATA_HOME")
        && !data_dir.trim().is_empty()
    {
        return PathBuf::from(data_dir).join("ultibracket");
    }
    if let Ok(home) = std::env::var("HOME")
        && !home.trim().is_empty()
    {
        return PathBuf::from(home).join(".local").join("share").join("ultibracket");
    }
    PathBuf::from("ultibracket-data")
}

fn default_config_path() -> Option<PathBuf> {
    if let Ok(config_dir) = std::env::var("XDG_CONFIG_HOME")
        && !config_dir.trim().is_empty()
    {
        return Some(PathBuf::from(config_dir).join("ultibracket").join("settings.toml"));
    }
    if let Ok(home) = std::env::var("HOME")
        && !home.trim().is_empty()
    {
        return Some(PathBuf::from(home).join(".config").join("ultibracket").join("settings.toml"));
    }
    None
}

#[derive(Debug, Deserialize)]
struct TeamEntry {
    name: String,
    seed: u8,
}

impl AppSettings {
    /// Defaults, then the settings file, then `ULTIBRACKET_*` environment overrides.
    ///
    /// An explicitly named file (`--config` or `ULTIBRACKET_CONFIG`) must exist;
    /// the default location is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var("ULTIBRACKET_CONFIG").ok().filter(|p| !p.trim().is_empty());
        let (path, required) = match (explicit, env_path) {
            (Some(path), _) => (Some(path.to_path_buf()), true),
            (None, Some(path)) => (Some(PathBuf::from(path)), true),
            (None, None) => (default_config_path(), false),
        };

        let file = match path {
            Some(path) => match std::fs::read_to_string(&path) {
                Ok(content) => Some((path, content)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => None,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(ConfigError::FileNotFound { path });
                }
                Err(source) => return Err(ConfigError::Read { path, source }),
            },
            None => None,
        };

        Self::from_parts(file.as_ref().map(|(p, c)| (p.as_path(), c.as_str())), |key| {
            std::env::var(key).ok()
        })
    }

    pub fn from_parts(
        file: Option<(&Path, &str)>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut settings = match file {
            Some((path, content)) => toml::from_str::<AppSettings>(content)
                .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?,
            None => AppSettings::default(),
        };
        settings.apply_env(env)?;
        settings.validate()?;
        settings.apply_division();
        Ok(settings)
    }

    /// `"<name> - Men's Division"` and `"<id>_MENS"`, and likewise for women.
    fn apply_division(&mut self) {
        if let Some(division) = self.division {
            self.tournament_name = format!("{} - {}", self.tournament_name.trim(), division.label());
            self.master_id = format!("{}_{}", self.master_id.trim(), division.id_suffix());
        }
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(name) = var("ULTIBRACKET_TOURNAMENT") {
            self.tournament_name = name;
        }
        if let Some(id) = var("ULTIBRACKET_MASTER_ID") {
            self.master_id = id;
        }
        if let Some(deadline) = var("ULTIBRACKET_LOCK_DEADLINE") {
            self.lock_deadline = DateTime::parse_from_rfc3339(deadline.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| ConfigError::Invalid { field: "lock_deadline", message: e.to_string() })?;
        }
        if let Some(division) = var("ULTIBRACKET_DIVISION") {
            self.division = Some(division.parse()?);
        }
        if let Some(dir) = var("ULTIBRACKET_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(base_url) = var("ULTIBRACKET_STORE_URL") {
            let token = match &self.store {
                StoreBackend::Remote { token, .. } => token.clone(),
                StoreBackend::File => None,
            };
            self.store = StoreBackend::Remote { base_url, token };
        }
        if let Some(new_token) = var("ULTIBRACKET_STORE_TOKEN")
            && let StoreBackend::Remote { token, .. } = &mut self.store
        {
            *token = Some(new_token);
        }
        if let Some(path) = var("ULTIBRACKET_TEAMS") {
            self.teams_file = Some(PathBuf::from(path));
        }
        if let Some(level) = var("ULTIBRACKET_LOG") {
            self.log_level = Some(level);
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tournament_name.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "tournament_name", message: "must not be empty".into() });
        }
        if self.master_id.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "master_id", message: "must not be empty".into() });
        }
        if let StoreBackend::Remote { base_url, .. } = &self.store
            && !(base_url.starts_with("http://") || base_url.starts_with("https://"))
        {
            return Err(ConfigError::Invalid {
                field: "store.base_url",
                message: format!("{base_url:?} is not an http(s) URL"),
            });
        }
        if self.scoring.checked_max_points().is_none() {
            return Err(ConfigError::Invalid {
                field: "scoring",
                message: "round values add up to more than a 32-bit total".into(),
            });
        }
        self.level_filter()?;
        Ok(())
    }

    pub fn level_filter(&self) -> Result<Option<LevelFilter>, ConfigError> {
        self.log_level
            .as_deref()
            .map(|level| {
                LevelFilter::from_str(level.trim())
                    .map_err(|e| ConfigError::Invalid { field: "log_level", message: e.to_string() })
            })
            .transpose()
    }

    pub fn drafts_dir(&self) -> PathBuf {
        self.data_dir.join("drafts")
    }

    /// The seeded field for new brackets.
    pub fn teams(&self) -> Result<Vec<Team>, ConfigError> {
        let (label, content) = match &self.teams_file {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .map_err(|source| ConfigError::Read { path: path.clone(), source })?;
                (path.display().to_string(), content)
            }
            None => ("embedded 2025 field".to_string(), EMBEDDED_TEAMS_JSON.to_string()),
        };
        parse_teams(&content).map_err(|source| ConfigError::Teams { path: label, source })
    }
}

fn parse_teams(content: &str) -> Result<Vec<Team>, serde_json::Error> {
    let entries: Vec<TeamEntry> = serde_json::from_str(content)?;
    Ok(entries.into_iter().map(|e| Team::new(e.name, e.seed)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_2025_nationals() {
        let settings = AppSettings::from_parts(None, env_of(&[])).unwrap();
        assert_eq!(settings.tournament_name, "USA Ultimate College Nationals 2025");
        assert_eq!(settings.master_id, "MASTER_BRACKET_USAU_2025");
        assert_eq!(settings.division, None);
        assert_eq!(settings.lock_deadline.to_rfc3339(), "2025-05-23T17:30:00+00:00");
        assert_eq!(settings.store, StoreBackend::File);
        assert_eq!(settings.scoring, ScoringScheme::default());
        assert_eq!(settings.level_filter().unwrap(), None);
    }

    #[test]
    fn embedded_field_has_twenty_seeds() {
        let teams = AppSettings::default().teams().unwrap();
        assert_eq!(teams.len(), 20);
        assert_eq!(teams[0], Team::new("Massachusetts", 1));
        assert_eq!(teams[19], Team::new("Ottawa", 20));
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let toml = r#"
            tournament_name = "D-III Nationals"
            lock_deadline = "2026-05-22T15:00:00Z"
            admins = ["commissioner"]
            log_level = "debug"

            [store]
            backend = "remote"
            base_url = "https://brackets.example.org/v1"

            [scoring]
            version = 3
            champion = 3200
        "#;
        let settings = AppSettings::from_parts(Some((Path::new("settings.toml"), toml)), env_of(&[])).unwrap();
        assert_eq!(settings.tournament_name, "D-III Nationals");
        assert_eq!(settings.master_id, "MASTER_BRACKET_USAU_2025");
        assert_eq!(settings.admins, vec!["commissioner".to_string()]);
        assert_eq!(settings.level_filter().unwrap(), Some(LevelFilter::Debug));
        assert_eq!(
            settings.store,
            StoreBackend::Remote { base_url: "https://brackets.example.org/v1".into(), token: None }
        );
        assert_eq!(settings.scoring.version, 3);
        assert_eq!(settings.scoring.champion, 3200);
        assert_eq!(settings.scoring.finalist, 800);
    }

    #[test]
    fn environment_wins_over_file() {
        let toml = r#"tournament_name = "From File""#;
        let env = env_of(&[
            ("ULTIBRACKET_TOURNAMENT", "From Env"),
            ("ULTIBRACKET_STORE_URL", "http://localhost:8080"),
            ("ULTIBRACKET_STORE_TOKEN", "t0k"),
            ("ULTIBRACKET_DATA_DIR", "/tmp/ub"),
        ]);
        let settings = AppSettings::from_parts(Some((Path::new("s.toml"), toml)), env).unwrap();
        assert_eq!(settings.tournament_name, "From Env");
        assert_eq!(
            settings.store,
            StoreBackend::Remote { base_url: "http://localhost:8080".into(), token: Some("t0k".into()) }
        );
        assert_eq!(settings.drafts_dir(), PathBuf::from("/tmp/ub/drafts"));
    }

    #[test]
    fn division_suffixes_names() {
        let settings = AppSettings::from_parts(None, env_of(&[("ULTIBRACKET_DIVISION", "womens")])).unwrap();
        assert_eq!(settings.division, Some(Division::Womens));
        assert_eq!(settings.tournament_name, "USA Ultimate College Nationals 2025 - Women's Division");
        assert_eq!(settings.master_id, "MASTER_BRACKET_USAU_2025_WOMENS");

        let toml = "division = \"mens\"";
        let settings = AppSettings::from_parts(Some((Path::new("s.toml"), toml)), env_of(&[])).unwrap();
        assert_eq!(settings.tournament_name, "USA Ultimate College Nationals 2025 - Men's Division");
        assert_eq!(settings.master_id, "MASTER_BRACKET_USAU_2025_MENS");

        let err = AppSettings::from_parts(None, env_of(&[("ULTIBRACKET_DIVISION", "open")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "division", .. }), "{err}");
    }

    #[test]
    fn blank_environment_values_are_ignored() {
        let settings =
            AppSettings::from_parts(None, env_of(&[("ULTIBRACKET_TOURNAMENT", "  ")])).unwrap();
        assert_eq!(settings.tournament_name, "USA Ultimate College Nationals 2025");
    }

    #[test]
    fn bad_values_are_reported() {
        let err = AppSettings::from_parts(None, env_of(&[("ULTIBRACKET_LOCK_DEADLINE", "friday")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "lock_deadline", .. }), "{err}");

        let err = AppSettings::from_parts(None, env_of(&[("ULTIBRACKET_LOG", "chatty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "log_level", .. }), "{err}");

        let err = AppSettings::from_parts(Some((Path::new("s.toml"), "tournament_name = 3")), env_of(&[]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "{err}");

        let toml = "[scoring]\nfinalist = 4294967295";
        let err = AppSettings::from_parts(Some((Path::new("s.toml"), toml)), env_of(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "scoring", .. }), "{err}");

        let toml = "[store]\nbackend = \"remote\"\nbase_url = \"ftp://nope\"";
        let err = AppSettings::from_parts(Some((Path::new("s.toml"), toml)), env_of(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "store.base_url", .. }), "{err}");
    }

    #[test]
    fn teams_file_is_read() {
        let path = std::env::temp_dir().join(format!("ultibracket-teams-{}.json", std::process::id()));
        std::fs::write(&path, r#"[{ "name": "Alpha", "seed": 2 }, { "name": "Beta", "seed": 1 }]"#).unwrap();
        let settings = AppSettings { teams_file: Some(path.clone()), ..AppSettings::default() };
        let teams = settings.teams().unwrap();
        assert_eq!(teams, vec![Team::new("Alpha", 2), Team::new("Beta", 1)]);
        let _ = std::fs::remove_file(&path);
    }
}
