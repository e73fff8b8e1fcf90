/// bcrypt work factor for stored password hashes.
pub const HASH_COST: u32 = 12;

#[cfg(not(test))]
const ACTIVE_COST: u32 = HASH_COST;
#[cfg(test)]
// Lowest cost bcrypt accepts.
const ACTIVE_COST: u32 = 4;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("failed to hash password: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

pub fn hash_password(plain: &str) -> Result<String, PasswordError> {
    Ok(bcrypt::hash(plain, ACTIVE_COST)?)
}

/// `false` for a wrong password and for a stored hash that does not parse.
pub fn verify_password(plain: &str, stored_hash: &str) -> bool {
    match bcrypt::verify(plain, stored_hash) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!("Stored password hash is not a valid bcrypt hash: {}", e);
            false
        }
    }
}
