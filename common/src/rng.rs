use rand::prelude::{SeedableRng, StdRng};

/// A deterministic rng for one stream (e.g. one rollout trial) of a seeded run.
pub fn create_rng_from_seed(seed: u64, stream: u64) -> StdRng {
    let mut bytes = [0; 32];
    bytes[..8].clone_from_slice(&seed.to_le_bytes());
    bytes[8..16].clone_from_slice(&stream.to_le_bytes());
    bytes[16..24].clone_from_slice(&seed.rotate_left(17).to_le_bytes());
    bytes[24..32].clone_from_slice(&(!stream).to_le_bytes());

    SeedableRng::from_seed(bytes)
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    #[test]
    fn test_streams_are_reproducible_and_distinct() {
        let draw = |stream: u64| -> Vec<u32> {
            create_rng_from_seed(7, stream)
                .sample_iter(rand::distributions::Standard)
                .take(8)
                .collect()
        };
        let (a, b, c) = (draw(1), draw(1), draw(2));

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
