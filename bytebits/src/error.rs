use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config error: {0}")]
    Parse(String),

    #[error("a widget needs at least one row")]
    NoRows,

    #[error("{values} initial values given for {rows} rows")]
    TooManyValues { values: usize, rows: usize },
}
