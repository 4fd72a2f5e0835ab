//! Random selection for the novelty commands

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::domain::entities::Mention;

/// Uniform choice over the given mentions
pub fn pick_random<R: Rng + ?Sized>(mentions: &[Mention], rng: &mut R) -> Option<Mention> {
    mentions.choose(rng).cloned()
}

/// Uniform choice over caller-supplied tokens, displayed as a handle.
///
/// Returns `None` for an empty token list.
pub fn pick_from_tokens<R: Rng + ?Sized>(tokens: &[String], rng: &mut R) -> Option<String> {
    tokens.choose(rng).map(|token| as_handle(token))
}

fn as_handle(token: &str) -> String {
    if token.starts_with('@') {
        token.to_string()
    } else {
        format!("@{}", token)
    }
}
