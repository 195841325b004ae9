//! Configuration types, built from environment variables.

use secrecy::SecretString;

use crate::error::{ConfigError, Error, Result};

/// Which backend the chore store runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataMode {
    /// Remote libsql database (Turso), requires url + auth token.
    Remote,
    /// Local libsql file.
    Local,
    /// In-memory database, lost on restart. Demo and test use.
    Memory,
}

impl DataMode {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(DataMode::Remote),
            "local" => Ok(DataMode::Local),
            "memory" => Ok(DataMode::Memory),
            other => Err(Error::Config(ConfigError::InvalidValue {
                key: "CHOREBOARD_DATA_MODE".into(),
                message: format!("expected remote, local or memory, got {other:?}"),
            })),
        }
    }
}

/// One child on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Child {
    /// Stable identifier chores are owned by (e.g. "astrid").
    pub slug: String,
    /// Name shown in the UI (e.g. "Astrid").
    pub display_name: String,
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct ChoreboardConfig {
    /// Port the HTTP server listens on.
    pub port: u16,
    /// Store backend selection.
    pub data_mode: DataMode,
    /// Path of the local database file (local mode).
    pub db_path: String,
    /// Remote database URL (remote mode).
    pub db_url: Option<String>,
    /// Remote database auth token (remote mode).
    pub db_token: Option<SecretString>,
    /// Shared household password. Unset means login always fails with a
    /// server error, matching the behavior of an unconfigured install.
    pub password: Option<SecretString>,
    /// Parent PIN guarding the editor.
    pub parent_pin: Option<SecretString>,
    /// The two children chores can be assigned to.
    pub children: Vec<Child>,
}

impl ChoreboardConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self> {
        let port: u16 = std::env::var("CHOREBOARD_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let data_mode = match std::env::var("CHOREBOARD_DATA_MODE") {
            Ok(raw) => DataMode::parse(&raw)?,
            Err(_) => DataMode::Local,
        };

        let db_path = std::env::var("CHOREBOARD_DB_PATH")
            .unwrap_or_else(|_| "./data/choreboard.db".to_string());

        let db_url = std::env::var("CHOREBOARD_DB_URL").ok();
        let db_token = std::env::var("CHOREBOARD_DB_TOKEN")
            .ok()
            .map(SecretString::from);

        if data_mode == DataMode::Remote && db_url.is_none() {
            return Err(Error::Config(ConfigError::MissingEnvVar(
                "CHOREBOARD_DB_URL".into(),
            )));
        }

        let password = std::env::var("CHOREBOARD_PASSWORD")
            .ok()
            .map(SecretString::from);
        let parent_pin = std::env::var("CHOREBOARD_PARENT_PIN")
            .ok()
            .map(SecretString::from);

        let roster = std::env::var("CHOREBOARD_CHILDREN")
            .unwrap_or_else(|_| "astrid:Astrid,emilia:Emilia".to_string());
        let children = parse_children(&roster)?;

        Ok(Self {
            port,
            data_mode,
            db_path,
            db_url,
            db_token,
            password,
            parent_pin,
            children,
        })
    }

    /// Look up a child by slug.
    pub fn child(&self, slug: &str) -> Option<&Child> {
        self.children.iter().find(|c| c.slug == slug)
    }
}

/// Parse the child roster from `slug:Display,slug:Display`.
/// The board is built for exactly two children.
fn parse_children(raw: &str) -> Result<Vec<Child>> {
    let children: Vec<Child> = raw
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (slug, display_name) = match entry.split_once(':') {
                Some((slug, display)) => (slug.trim(), display.trim()),
                None => (entry, entry),
            };
            if slug.is_empty() {
                return Err(Error::Config(ConfigError::InvalidValue {
                    key: "CHOREBOARD_CHILDREN".into(),
                    message: format!("empty child slug in {entry:?}"),
                }));
            }
            Ok(Child {
                slug: slug.to_string(),
                display_name: if display_name.is_empty() {
                    slug.to_string()
                } else {
                    display_name.to_string()
                },
            })
        })
        .collect::<Result<_>>()?;

    if children.len() != 2 {
        return Err(Error::Config(ConfigError::InvalidValue {
            key: "CHOREBOARD_CHILDREN".into(),
            message: format!("expected exactly two children, got {}", children.len()),
        }));
    }
    if children[0].slug == children[1].slug {
        return Err(Error::Config(ConfigError::InvalidValue {
            key: "CHOREBOARD_CHILDREN".into(),
            message: format!("duplicate child slug {:?}", children[0].slug),
        }));
    }

    Ok(children)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_default_roster() {
        let children = parse_children("astrid:Astrid,emilia:Emilia").unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].slug, "astrid");
        assert_eq!(children[0].display_name, "Astrid");
        assert_eq!(children[1].slug, "emilia");
    }

    #[test]
    fn roster_without_display_names_uses_slug() {
        let children = parse_children("ada, bo ").unwrap();
        assert_eq!(children[0].display_name, "ada");
        assert_eq!(children[1].slug, "bo");
    }

    #[test]
    fn roster_must_have_two_children() {
        assert!(parse_children("solo:Solo").is_err());
        assert!(parse_children("a:A,b:B,c:C").is_err());
        assert!(parse_children("").is_err());
    }

    #[test]
    fn roster_rejects_duplicate_slugs() {
        assert!(parse_children("ada:Ada,ada:Other").is_err());
    }

    #[test]
    fn data_mode_parsing() {
        assert_eq!(DataMode::parse("remote").unwrap(), DataMode::Remote);
        assert_eq!(DataMode::parse(" Local ").unwrap(), DataMode::Local);
        assert_eq!(DataMode::parse("MEMORY").unwrap(), DataMode::Memory);
        assert!(DataMode::parse("postgres").is_err());
    }
}
