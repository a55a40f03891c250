use rand::Rng;

use super::normalize_text;

/// Two characters by construction: the short-link token scheme re-inserts
/// the separator after the first two characters.
pub const JOB_NO_PREFIX: &str = "WO";

/// One candidate job number. Uniqueness is enforced by the caller
/// retrying against the order collection until no collision exists.
pub fn random_job_no<R: Rng>(rng: &mut R) -> String {
    format!("{}-{:04}", JOB_NO_PREFIX, rng.gen_range(0..10_000u32))
}

/// Short-link token: the job number with its separator removed. This is
/// obfuscation, not a security boundary.
pub fn job_no_to_token(job_no: &str) -> String {
    normalize_text(job_no).replace('-', "")
}

/// Reverses [`job_no_to_token`] by re-inserting the separator after the
/// first two characters. Tokens shorter than three characters are invalid.
pub fn token_to_job_no(token: &str) -> Option<String> {
    let sanitized = normalize_text(token);
    let mut chars = sanitized.chars();
    let prefix: String = chars.by_ref().take(2).collect();
    let rest: String = chars.collect();
    if prefix.chars().count() != 2 || rest.is_empty() {
        return None;
    }
    Some(format!("{prefix}-{rest}"))
}
