use rand::Rng;

/// URL-safe alphabet for share tokens.
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Share token length. 64^10 values; collisions are treated as negligible
/// at expected volume, so there is no uniqueness retry loop.
pub const SHARE_TOKEN_LEN: usize = 10;

/// Generate a random public share token.
pub fn share_token() -> String {
    let mut rng = rand::rng();
    (0..SHARE_TOKEN_LEN)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}
