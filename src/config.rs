use clap::Parser;
use std::collections::HashMap;
use std::io::Read;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

pub const DEFAULT_DATABASE_URL: &str = "sqlite:taskpad.db?mode=rwc";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_STATIC_DIR: &str = "static";

#[derive(Parser, Debug, Default)]
#[command(name = "taskpad")]
#[command(about = "Edit tasks in the browser")]
pub struct Args {
    /// Database URL (overrides DATABASE_URL from .env)
    #[arg(long)]
    pub db: Option<String>,

    /// Address to listen on (overrides TASKPAD_BIND)
    #[arg(long)]
    pub bind: Option<String>,

    /// Directory served under /static (overrides TASKPAD_STATIC_DIR)
    #[arg(long)]
    pub static_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub static_dir: String,
}

impl Config {
    /// Resolve settings: command line, then `.env`, then environment, then defaults.
    pub fn load(args: Args) -> Self {
        // A missing .env file is fine
        let dotenv = dotenvy::dotenv_iter().map(read_dotenv).unwrap_or_default();
        Self::resolve(args, layered(&dotenv, |key| std::env::var(key).ok()))
    }

    fn resolve(args: Args, env: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            database_url: args
                .db
                .or_else(|| env("DATABASE_URL"))
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            bind_addr: args
                .bind
                .or_else(|| env("TASKPAD_BIND"))
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            static_dir: args
                .static_dir
                .or_else(|| env("TASKPAD_STATIC_DIR"))
                .unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string()),
        }
    }
}

// Entries that fail to parse are skipped
fn read_dotenv<R: Read>(iter: dotenvy::Iter<R>) -> HashMap<String, String> {
    iter.filter_map(|entry| match entry {
        Ok(pair) => Some(pair),
        Err(e) => {
            tracing::warn!(error = %e, "skipping malformed .env entry");
            None
        }
    })
    .collect()
}

/// Lookup that consults the `.env` entries before `env`.
fn layered<'a>(
    dotenv: &'a HashMap<String, String>,
    env: impl Fn(&str) -> Option<String> + 'a,
) -> impl Fn(&str) -> Option<String> + 'a {
    move |key: &str| dotenv.get(key).cloned().or_else(|| env(key))
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the default `info` level.
pub fn install_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = Config::resolve(Args::default(), |_| None);
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.static_dir, DEFAULT_STATIC_DIR);
    }

    #[test]
    fn test_flag_beats_environment() {
        let env = |key: &str| (key == "DATABASE_URL").then(|| "sqlite:env.db".to_string());

        let config = Config::resolve(Args::default(), env);
        assert_eq!(config.database_url, "sqlite:env.db");

        let args = Args {
            db: Some("sqlite:flag.db".to_string()),
            ..Args::default()
        };
        assert_eq!(Config::resolve(args, env).database_url, "sqlite:flag.db");
    }

    #[test]
    fn test_parses_command_line() {
        let args = Args::parse_from(["taskpad", "--bind", "127.0.0.1:8080"]);
        assert_eq!(args.bind.as_deref(), Some("127.0.0.1:8080"));
        assert!(args.db.is_none());
    }

    #[test]
    fn test_dotenv_beats_process_environment() {
        let path = std::env::temp_dir().join(format!("taskpad-config-{}.env", std::process::id()));
        std::fs::write(
            &path,
            "DATABASE_URL=sqlite:from_dotenv.db\nTASKPAD_STATIC_DIR=public\n",
        )
        .unwrap();
        let dotenv = read_dotenv(dotenvy::from_path_iter(&path).unwrap());
        std::fs::remove_file(&path).unwrap();

        let process_env = |key: &str| match key {
            "DATABASE_URL" => Some("sqlite:from_process_env.db".to_string()),
            "TASKPAD_BIND" => Some("127.0.0.1:4000".to_string()),
            _ => None,
        };
        let config = Config::resolve(Args::default(), layered(&dotenv, process_env));
        assert_eq!(config.database_url, "sqlite:from_dotenv.db");
        assert_eq!(config.static_dir, "public");
        assert_eq!(config.bind_addr, "127.0.0.1:4000");

        let args = Args {
            static_dir: Some("assets".to_string()),
            ..Args::default()
        };
        let config = Config::resolve(args, layered(&dotenv, process_env));
        assert_eq!(config.static_dir, "assets");
    }
}
