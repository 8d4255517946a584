#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("time format error: {0}")]
    TimeFormat(#[from] time::error::Format),
}
