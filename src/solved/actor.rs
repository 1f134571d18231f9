//! The already-identified user a request acts on behalf of.

use crate::db::UserRecord;

/// Who is asking. Authentication happens upstream; this only carries the
/// facts authorization needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    User {
        id: i64,
        username: String,
        is_staff: bool,
    },
}

impl Actor {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::User { .. })
    }

    /// Staff covers both administrators and moderators.
    pub fn is_staff(&self) -> bool {
        matches!(self, Self::User { is_staff: true, .. })
    }

    pub fn current_user_id(&self) -> Option<i64> {
        match self {
            Self::User { id, .. } => Some(*id),
            Self::Anonymous => None,
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            Self::User { username, .. } => Some(username),
            Self::Anonymous => None,
        }
    }
}

impl From<UserRecord> for Actor {
    fn from(user: UserRecord) -> Self {
        Self::User {
            id: user.id,
            username: user.username,
            is_staff: user.is_staff,
        }
    }
}
