use crate::entity::{article, lab, submission};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLab {
    pub owner_id: i64,
    pub title: String,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArticle {
    pub owner_id: i64,
    pub title: String,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubmission {
    pub lab_id: i64,
    pub owner_id: i64,
}

/// Outcome of deleting a parent entity together with its assets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeleteEntityResponse {
    pub success: bool,
    /// Keys of blobs that could not be removed; their rows are gone regardless.
    pub unremoved_blobs: Vec<String>,
}

/// A row of any of the three owning tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityRecord {
    Lab(lab::Model),
    Article(article::Model),
    Submission(submission::Model),
}

impl EntityRecord {
    pub fn id(&self) -> i64 {
        match self {
            EntityRecord::Lab(m) => m.id,
            EntityRecord::Article(m) => m.id,
            EntityRecord::Submission(m) => m.id,
        }
    }
}
