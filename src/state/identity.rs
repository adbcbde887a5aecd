/// Who is running the command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    User(String),
    Anonymous,
}

impl Identity {
    /// `--user`, then `ULTIBRACKET_USER`, then the login name.
    pub fn resolve(flag: Option<&str>, env: impl Fn(&str) -> Option<String>) -> Self {
        flag.map(str::to_owned)
            .or_else(|| env("ULTIBRACKET_USER"))
            .or_else(|| env("USER"))
            .map(|id| id.trim().to_owned())
            .filter(|id| !id.is_empty())
            .map_or(Identity::Anonymous, Identity::User)
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Identity::User(id) => Some(id),
            Identity::Anonymous => None,
        }
    }

    /// With no admin list configured, anyone may act on the master.
    pub fn is_admin(&self, admins: &[String]) -> bool {
        admins.is_empty() || self.user_id().is_some_and(|id| admins.iter().any(|a| a == id))
    }
}
