use chrono::Utc;
use rand::Rng;

const ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const SLUG_LEN: usize = 9;

/// Fresh chat conversation id: a random slug plus a millisecond timestamp,
/// unique enough for one backend without coordination.
pub fn conversation_id() -> String {
    let mut rng = rand::thread_rng();
    let slug: String = (0..SLUG_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("conv_{slug}_{}", Utc::now().timestamp_millis())
}

/// Ephemeral conversation id for one analysis question, so analysis
/// traffic never threads into the chat transcript.
pub fn analysis_conversation_id(template_id: &str) -> String {
    format!("analyze_{template_id}_{}", Utc::now().timestamp_millis())
}
