use serde::de::StdError;
use std::fmt;
use std::sync::PoisonError;
use thiserror::Error;

pub type CpgResult<T, E = CpgError> = Result<T, E>;

#[derive(Debug, Error)]
pub enum CpgError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("tree-sitter error: {0}")]
    TreeSitter(#[from] tree_sitter::LanguageError),

    #[error("connection-pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("time error: {0}")]
    Time(#[from] std::time::SystemTimeError),

    #[error("poisoned lock: {0}")]
    Poison(String),

    #[error("parse error in {file}: {reason}")]
    Parse { file: String, reason: String },

    #[error("store corrupted: {0}")]
    StoreCorruption(String),

    #[error(transparent)]
    Other(#[from] Box<dyn StdError + Send + Sync + 'static>),

    #[error("{0}")]
    Msg(String),
}

impl<T> From<PoisonError<T>> for CpgError
where
    T: fmt::Debug,
{
    fn from(err: PoisonError<T>) -> Self {
        CpgError::Poison(err.to_string())
    }
}

impl From<&str> for CpgError {
    fn from(s: &str) -> Self {
        CpgError::Msg(s.to_owned())
    }
}

impl From<String> for CpgError {
    fn from(s: String) -> Self {
        CpgError::Msg(s)
    }
}

#[test]
fn io_conversion_retains_message() {
    let e = std::io::Error::new(std::io::ErrorKind::Other, "boom!");
    let n: CpgError = e.into();
    assert!(matches!(n, CpgError::Io(_)));
    assert!(n.to_string().contains("boom"));
}

#[test]
fn poison_conversion_maps_correct_variant() {
    let lock = std::sync::Arc::new(std::sync::Mutex::new(()));

    {
        let lock2 = std::sync::Arc::clone(&lock);
        std::thread::spawn(move || {
            let _guard = lock2.lock().unwrap();
            panic!("intentional - poison the mutex");
        })
        .join()
        .ok();
    }

    let poison = lock.lock().unwrap_err();
    let err: CpgError = poison.into();

    assert!(matches!(err, CpgError::Poison(_)));
}

#[test]
fn simple_string_into_msg() {
    let err: CpgError = "plain msg".into();
    assert!(matches!(err, CpgError::Msg(s) if s == "plain msg"));
}
