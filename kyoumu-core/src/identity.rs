use serde::{Deserialize, Serialize};

use crate::model::{User, UserId};

/// The acting principal, resolved by the (external) authentication layer
/// and passed explicitly into every engine call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub username: String,
    pub is_admin: bool,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Identity {
            id: user.id,
            username: user.username.clone(),
            is_admin: user.is_admin,
        }
    }
}
