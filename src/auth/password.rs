/// Hash a plaintext password with bcrypt at the given cost.
pub fn hash_password(plain: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(plain, cost)
}

/// Verify plaintext against a stored bcrypt hash (constant-time via bcrypt).
/// A malformed stored hash verifies as false.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    bcrypt::verify(plain, hash).unwrap_or(false)
}
