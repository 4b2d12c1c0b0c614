use rand::{distributions::Alphanumeric, thread_rng, Rng};

pub const STATE_LENGTH: usize = 32;

/// Random value for the OAuth `state` parameter.
pub fn generate_state() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}
