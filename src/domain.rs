pub mod core;

use serde::{de::DeserializeOwned, Serialize};
use std::{
    error::Error,
    fmt::{Debug, Display},
    hash::Hash,
    ops::Deref,
};
use thiserror::Error;
use uuid::Uuid;

pub trait Id:
    Copy
    + Eq
    + Hash
    + Deref<Target = Uuid>
    + From<Uuid>
    + Display
    + Debug
    + Serialize
    + DeserializeOwned
{
    /// 新しいIDを採番する
    fn generate() -> Self {
        Self::from(Uuid::new_v4())
    }
}

pub trait Event: Clone + Debug + Serialize + DeserializeOwned {
    type Id: Id;

    fn id(&self) -> Self::Id;
}

pub trait Entity {
    type Id: Id;

    const ENTITY_NAME: &'static str;

    fn id(&self) -> Self::Id;
}

pub type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum DataAccessError {
    #[error("Database connection error: {0}")]
    ConnectionError(BoxError),
    #[error("Database query error: {0}")]
    QueryError(BoxError),
    #[error("Data read error: {0}")]
    ReadError(BoxError),
    #[error("Data write error: {0}")]
    WriteError(BoxError),
    #[error("Client side error: {0}")]
    ClientSideError(BoxError),
    #[error("Record already exists: {0}")]
    AlreadyExists(String),
}
