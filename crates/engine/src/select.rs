use {
    rand::{Rng, SeedableRng, rngs::StdRng, seq::index},
    tracing::info,
};

use crate::{
    error::{Error, Result},
    types::Account,
};

/// Draw `sample_size` distinct accounts uniformly at random, without
/// replacement. A `seed` makes the draw reproducible.
///
/// The chosen accounts keep their relative source order. Asking for more
/// accounts than exist is a configuration error and selects nothing.
pub fn select_accounts(
    all: &[Account],
    sample_size: usize,
    seed: Option<u64>,
) -> Result<Vec<Account>> {
    check_sample_size(sample_size, all.len())?;
    let selected = match seed {
        Some(seed) => draw(all, sample_size, &mut StdRng::seed_from_u64(seed)),
        None => draw(all, sample_size, &mut rand::rng()),
    };
    info!(
        requested = sample_size,
        available = all.len(),
        seeded = seed.is_some(),
        "accounts sampled"
    );
    Ok(selected)
}

/// Reject a sample larger than the pool it would be drawn from.
pub fn check_sample_size(requested: usize, available: usize) -> Result<()> {
    if requested > available {
        return Err(Error::sample_too_large(requested, available));
    }
    Ok(())
}

fn draw<R: Rng + ?Sized>(all: &[Account], amount: usize, rng: &mut R) -> Vec<Account> {
    let mut picked = index::sample(rng, all.len(), amount).into_vec();
    picked.sort_unstable();
    picked.into_iter().map(|i| all[i].clone()).collect()
}
