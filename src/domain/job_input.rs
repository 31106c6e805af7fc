use std::sync::Arc;

use bytes::Bytes;

/// Raw material a job was created from. Owned by the job until it reaches a
/// terminal state; clones are cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobInput {
    Pdf(Bytes),
    Text(Arc<str>),
}

impl JobInput {
    pub fn pdf(data: impl Into<Bytes>) -> Self {
        Self::Pdf(data.into())
    }

    pub fn text(text: impl Into<Arc<str>>) -> Self {
        Self::Text(text.into())
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Pdf(data) => data.len(),
            Self::Text(text) => text.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
