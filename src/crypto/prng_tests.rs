#[cfg(test)]
mod tests {
    use crate::crypto::prng::{fill_tiled, MersenneTwister, PrngKind, RandomStream, ShaDrbg};
    use proptest::prelude::*;

    const SEED: &[u8] = b"0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn stream(kind: PrngKind, seed: &[u8], sizes: &[usize]) -> Vec<u8> {
        let mut state = kind.init(seed);
        let mut out = Vec::new();
        for &size in sizes {
            let mut buf = vec![0u8; size];
            state.read(&mut buf);
            out.extend_from_slice(&buf);
        }
        out
    }

    #[test]
    fn test_every_generator_is_deterministic() {
        for kind in PrngKind::ALL {
            let sizes = [4096, 4096, 1000, 3];
            let a = stream(kind, SEED, &sizes);
            let b = stream(kind, SEED, &sizes);
            assert_eq!(a, b, "{} must reproduce its stream from the same seed", kind);
            assert_eq!(a.len(), 4096 * 2 + 1003);
        }
    }

    #[test]
    fn test_seeds_produce_distinct_streams() {
        let other: Vec<u8> = SEED.iter().map(|b| b ^ 0x01).collect();
        for kind in PrngKind::ALL {
            let a = stream(kind, SEED, &[512]);
            let b = stream(kind, &other, &[512]);
            assert_ne!(a, b, "{} ignored its seed", kind);
        }
    }

    #[test]
    fn test_generators_are_not_constant() {
        for kind in PrngKind::ALL {
            let data = stream(kind, SEED, &[4096]);
            let first = data[0];
            assert!(
                data.iter().any(|&b| b != first),
                "{} produced a constant buffer",
                kind
            );
        }
    }

    #[test]
    fn test_native_block_sizes() {
        assert_eq!(PrngKind::MersenneTwister.native_block_size(), 4);
        assert_eq!(PrngKind::Isaac.native_block_size(), 4);
        assert_eq!(PrngKind::Isaac64.native_block_size(), 8);
        assert_eq!(PrngKind::LaggedFibonacci.native_block_size(), 8);
        assert_eq!(PrngKind::Xoroshiro256.native_block_size(), 8);
        assert_eq!(PrngKind::AesCtr.native_block_size(), 32);
        assert_eq!(PrngKind::Rc4.native_block_size(), 32);
        assert_eq!(PrngKind::ShaDrbg.native_block_size(), 32);
        assert_eq!(PrngKind::AsconPrf.native_block_size(), 40);
        assert_eq!(PrngKind::ChaCha20.native_block_size(), 64);
    }

    #[test]
    fn test_odd_tail_discards_rest_of_block() {
        // Twister emits 4-byte words: a 5-byte read consumes two words
        let whole = stream(PrngKind::MersenneTwister, SEED, &[12]);
        let split = stream(PrngKind::MersenneTwister, SEED, &[5, 4]);
        assert_eq!(&split[..5], &whole[..5]);
        assert_eq!(&split[5..], &whole[8..12]);
    }

    #[test]
    fn test_fill_tiled_direct() {
        let mut a = ShaDrbg::from_seed(SEED);
        let mut b = ShaDrbg::from_seed(SEED);
        let mut one = [0u8; 64];
        fill_tiled(&mut a, &mut one);
        let mut first = [0u8; 32];
        let mut second = [0u8; 32];
        b.next_block(&mut first);
        b.next_block(&mut second);
        assert_eq!(&one[..32], &first);
        assert_eq!(&one[32..], &second);
    }

    #[test]
    fn test_empty_seed_is_accepted() {
        let mut mt = MersenneTwister::from_seed(&[]);
        let mut block = [0u8; 4];
        mt.next_block(&mut block);
        for kind in PrngKind::ALL {
            assert_eq!(stream(kind, &[], &[17]).len(), 17);
        }
    }

    #[test]
    fn test_prng_names_parse() {
        for kind in PrngKind::ALL {
            assert_eq!(kind.name().parse::<PrngKind>().unwrap(), kind);
        }
        assert_eq!("ChaCha20".parse::<PrngKind>().unwrap(), PrngKind::ChaCha20);
        assert!("dual_ec".parse::<PrngKind>().is_err());
    }

    proptest! {
        #[test]
        fn prop_block_aligned_reads_concatenate(
            kind_idx in 0usize..10,
            first in 0usize..16,
            second in 0usize..16,
        ) {
            let kind = PrngKind::ALL[kind_idx];
            let block = kind.native_block_size();
            let whole = stream(kind, SEED, &[(first + second) * block]);
            let split = stream(kind, SEED, &[first * block, second * block]);
            prop_assert_eq!(whole, split);
        }

        #[test]
        fn prop_read_length_is_exact(kind_idx in 0usize..10, len in 0usize..300) {
            let kind = PrngKind::ALL[kind_idx];
            prop_assert_eq!(stream(kind, SEED, &[len]).len(), len);
        }
    }
}
