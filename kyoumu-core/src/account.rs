//! Account lifecycle. Credential hashing and session handling belong to the
//! authentication layer; this module only records its results.

use tracing::info;

use crate::error::Error;
use crate::model::{NewUser, User};
use crate::store::{Store, StoreTx};

/// Registers a new user. `secret_hash` is the already-hashed credential —
/// plaintext never reaches this crate. New users are never admins; the flag
/// is flipped out-of-band by an operator.
pub fn sign_up<S: Store>(store: &S, username: &str, secret_hash: &str) -> Result<User, Error> {
    let user = store.transaction(|tx| {
        if tx.user_by_username(username)?.is_some() {
            return Err(Error::UsernameTaken {
                username: username.to_string(),
            });
        }
        let user = tx.insert_user(&NewUser {
            username: username.to_string(),
            secret_hash: secret_hash.to_string(),
            is_admin: false,
        })?;
        Ok(user)
    })?;
    info!(user = user.id, "signed up");
    Ok(user)
}
