use uuid::Uuid;

/// Identity of the signed-in user, passed explicitly into each repository.
///
/// A repository built without a session is the signed-out state: every
/// operation on it is a silent no-op and its mirror stays empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
}

impl Session {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}
