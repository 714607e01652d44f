//! Per-instance seed derivation
//!
//! Every randomized agent instance owns a generator seeded from the run seed,
//! its role and its instance index, so a fixed run seed reproduces every node
//! value no matter in which order chains execute.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seed stream owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeedRole {
    /// Architect instances
    Architect,
    /// Coder instances
    Coder,
    /// Tester instances
    Tester,
    /// Security reviewer instances
    Security,
    /// The runner's architecture selection
    Runner,
}

impl SeedRole {
    /// Offset mixed into the run seed
    #[inline]
    #[must_use]
    pub const fn offset(self) -> u64 {
        match self {
            SeedRole::Architect => 0,
            SeedRole::Coder => 10,
            SeedRole::Tester => 20,
            SeedRole::Security => 30,
            SeedRole::Runner => 40,
        }
    }
}

/// Derive the seed of one agent instance
#[must_use]
pub fn derive_seed(base: u64, role: SeedRole, index: u64) -> u64 {
    let mixed = base
        .wrapping_add(role.offset().wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add(index.wrapping_mul(0xD1B5_4A32_D192_ED03));
    splitmix64(mixed)
}

/// Seeded generator for one agent instance
#[inline]
#[must_use]
pub fn instance_rng(base: u64, role: SeedRole, index: u64) -> StdRng {
    StdRng::seed_from_u64(derive_seed(base, role, index))
}

/// Use the requested seed or draw a fresh one
#[must_use]
pub fn resolve_seed(requested: Option<u64>) -> u64 {
    match requested {
        Some(seed) => seed,
        None => {
            let seed = rand::rng().random::<u64>();
            tracing::info!("No seed requested, drew seed {}", seed);
            seed
        }
    }
}

/// Round to a fixed number of decimal places
#[inline]
#[must_use]
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
