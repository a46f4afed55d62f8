//! Activity name generator.

use hpk_core::ACTIVITIES;
use rand::Rng;

/// Pick one activity uniformly from the vocabulary.
pub fn generate_activity<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    ACTIVITIES[rng.gen_range(0..ACTIVITIES.len())]
}
