use chrono::Utc;
use rand::Rng;

/// Generate a human-readable booking reference: a configurable prefix, the
/// current date, and a random six-digit disambiguator.
///
/// Uniqueness is enforced by the storage layer; a collision on insert is
/// treated as retryable and the caller regenerates.
pub fn generate(prefix: &str) -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{}-{}-{:06}", prefix, date, suffix)
}
