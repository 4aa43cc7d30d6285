use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("unknown content type `{tag}`")]
    UnknownContentType { tag: String },
    #[error("entry `{entry_id}` has content type `{actual}`, expected `{expected}`")]
    ContentTypeMismatch {
        entry_id: String,
        expected: &'static str,
        actual: String,
    },
    #[error("failed to decode fields of entry `{entry_id}`: {message}")]
    FieldDecode { entry_id: String, message: String },
}

impl DomainError {
    pub fn unknown_content_type(tag: impl Into<String>) -> Self {
        Self::UnknownContentType { tag: tag.into() }
    }

    pub fn field_decode(entry_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FieldDecode {
            entry_id: entry_id.into(),
            message: message.into(),
        }
    }
}
