use thiserror::Error;

use crate::event::EventKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("{kind} event is missing required field `{field}`")]
    MissingField {
        kind: EventKind,
        field: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, MappingError>;
