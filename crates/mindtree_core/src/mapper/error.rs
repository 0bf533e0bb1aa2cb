//! Mapper error type.

use crate::mapper::mapping::MappingError;
use crate::model::id::TopicId;
use crate::service::editor::EditError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by mapper operations.
pub type MapperResult<T> = Result<T, MapperError>;

/// Errors from loading or saving flat records.
///
/// `position` is the zero-based index of the offending record.
#[derive(Debug)]
pub enum MapperError {
    /// Field mapping is incomplete or contradictory.
    Mapping(MappingError),
    /// Input contains no records.
    Empty,
    /// Record is not a key-value object.
    NotAnObject { position: usize },
    /// Required field is absent or null.
    MissingField { position: usize, field: String },
    /// Field holds a value of the wrong shape.
    WrongShape {
        position: usize,
        field: String,
        expected: &'static str,
    },
    /// Two records carry the same external identifier.
    DuplicateId { position: usize, id: String },
    /// A second record claims to be the central topic.
    DuplicateRoot { position: usize },
    /// A child record appears before any central-topic record.
    MissingRoot { position: usize },
    /// Parent identifier has not been seen in an earlier record.
    UnknownParent { position: usize, parent: String },
    /// Topic links to a parent that is not live in its sheet.
    DanglingParent(TopicId),
    /// Sheet has no live central topic.
    MissingCentral,
    /// Tree edit refused while building a sheet.
    Edit(EditError),
    /// JSON encoding or decoding failed.
    Json(serde_json::Error),
    /// Reading or writing the underlying stream failed.
    Io(std::io::Error),
}

impl Display for MapperError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mapping(err) => write!(f, "{err}"),
            Self::Empty => write!(f, "no records to load"),
            Self::NotAnObject { position } => write!(f, "record {position} is not an object"),
            Self::MissingField { position, field } => {
                write!(f, "record {position} is missing field `{field}`")
            }
            Self::WrongShape {
                position,
                field,
                expected,
            } => write!(f, "record {position} field `{field}` must be {expected}"),
            Self::DuplicateId { position, id } => {
                write!(f, "record {position} repeats id `{id}`")
            }
            Self::DuplicateRoot { position } => {
                write!(f, "record {position} is a second central topic")
            }
            Self::MissingRoot { position } => {
                write!(f, "record {position} appears before the central topic")
            }
            Self::UnknownParent { position, parent } => write!(
                f,
                "record {position} references parent `{parent}` not seen in an earlier record"
            ),
            Self::DanglingParent(id) => write!(f, "topic {id} has no live parent"),
            Self::MissingCentral => write!(f, "sheet has no central topic"),
            Self::Edit(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MapperError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Mapping(err) => Some(err),
            Self::Edit(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MappingError> for MapperError {
    fn from(value: MappingError) -> Self {
        Self::Mapping(value)
    }
}

impl From<EditError> for MapperError {
    fn from(value: EditError) -> Self {
        Self::Edit(value)
    }
}

impl From<serde_json::Error> for MapperError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<std::io::Error> for MapperError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
