use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Fs(#[from] lfs::Error),
    #[error("cannot name {0:?} inside the image")]
    BadInputName(PathBuf),
}

pub type Result<T> = core::result::Result<T, Error>;
