#[cfg(test)]
mod tests {
    use compress_core::compression::{
        compress_to_vec, decompress_to_vec,
        registry::*,
        types::{Backend, Compressor, Decompressor, ErrorKind},
        BrotliCompressorConfig, BrotliDecompressorConfig, CompressorConfig, DecompressorConfig,
        ZlibCompressorConfig, ZlibDecompressorConfig, ZstdCompressorConfig, ZstdDecompressorConfig,
    };
    use rand::{rngs::StdRng, RngCore, SeedableRng};

    const BACKENDS: [Backend; 3] = [Backend::Brotli, Backend::Zlib, Backend::Zstd];

    fn pair(backend: Backend) -> (Box<dyn Compressor>, Box<dyn Decompressor>) {
        let c = create_compressor(&CompressorConfig::defaults(backend)).expect("compressor");
        let d = create_decompressor(&DecompressorConfig::defaults(backend)).expect("decompressor");
        (c, d)
    }

    fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut buf = vec![0u8; len];
        rng.fill_bytes(&mut buf);
        buf
    }

    // --- 1024 x 0xAA through every backend ---

    #[test]
    fn repeated_byte_block_roundtrip_all_backends() {
        let input = vec![0xAAu8; 1024];
        for backend in BACKENDS {
            let (mut c, mut d) = pair(backend);

            let sizing = c.compress(&input, None).unwrap();
            assert_eq!(sizing.written, 0, "{backend}: sizing call writes nothing");
            assert!(sizing.capacity > 0, "{backend}: bound must be positive");

            let mut out = vec![0u8; sizing.capacity];
            let outcome = c.compress(&input, Some(&mut out)).unwrap();
            assert!(outcome.written > 0 && outcome.written <= sizing.capacity);
            assert!(outcome.written < input.len(), "{backend}: 0xAA run must shrink");

            let mut plain = vec![0u8; 1024];
            let n = d.decompress(&out[..outcome.written], &mut plain).unwrap();
            assert_eq!(n, 1024);
            assert_eq!(plain, input, "{backend}: roundtrip mismatch");
        }
    }

    #[test]
    fn sizing_call_is_pure() {
        let input = random_bytes(8192, 7);
        for backend in BACKENDS {
            let (mut c, _) = pair(backend);
            let first = c.compress(&input, None).unwrap();
            let second = c.compress(&input, None).unwrap();
            assert_eq!(first, second, "{backend}: sizing must not depend on history");

            // A data call in between must not shift the bound either.
            let mut out = vec![0u8; first.capacity];
            c.compress(&input, Some(&mut out)).unwrap();
            assert_eq!(c.compress(&input, None).unwrap(), first);
        }
    }

    #[test]
    fn data_calls_are_independent() {
        let input = random_bytes(4096, 11);
        for backend in BACKENDS {
            let (mut c, _) = pair(backend);
            let a = compress_to_vec(c.as_mut(), &input).unwrap();
            let b = compress_to_vec(c.as_mut(), &input).unwrap();
            assert_eq!(a, b, "{backend}: identical inputs must give identical frames");
        }
    }

    #[test]
    fn empty_input_roundtrip() {
        for backend in BACKENDS {
            let (mut c, mut d) = pair(backend);
            let compressed = compress_to_vec(c.as_mut(), &[]).unwrap();
            assert!(!compressed.is_empty(), "{backend}: empty input still yields a frame");
            let mut out = [0u8; 16];
            assert_eq!(d.decompress(&compressed, &mut out).unwrap(), 0, "{backend}");
        }
    }

    // --- capacity errors ---

    #[test]
    fn zero_capacity_output_is_rejected() {
        let input = vec![0xAAu8; 1024];
        for backend in BACKENDS {
            let (mut c, _) = pair(backend);
            let mut empty: [u8; 0] = [];
            let err = c.compress(&input, Some(&mut empty[..])).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InsufficientCapacity, "{backend}: {err}");
        }
    }

    #[test]
    fn short_output_is_rejected() {
        let input = random_bytes(4096, 3);
        for backend in BACKENDS {
            let (mut c, _) = pair(backend);
            let mut out = vec![0u8; 64];
            let err = c.compress(&input, Some(&mut out)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InsufficientCapacity, "{backend}: {err}");
            assert!(err.is_operation_failure());
        }
    }

    #[test]
    fn decompress_into_empty_buffer_is_rejected() {
        let input = vec![0xAAu8; 1024];
        for backend in BACKENDS {
            let (mut c, mut d) = pair(backend);
            let compressed = compress_to_vec(c.as_mut(), &input).unwrap();
            let err = d.decompress(&compressed, &mut []).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InsufficientCapacity, "{backend}: {err}");
        }
    }

    // --- corrupt input ---

    #[test]
    fn truncated_payload_is_corrupt() {
        let input = random_bytes(4096, 5);
        for backend in BACKENDS {
            let (mut c, mut d) = pair(backend);
            let compressed = compress_to_vec(c.as_mut(), &input).unwrap();
            let cut = &compressed[..compressed.len() / 2];
            let mut out = vec![0u8; input.len()];
            let err = d.decompress(cut, &mut out).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::CorruptInput, "{backend}: {err}");
        }
    }

    #[test]
    fn decompress_to_vec_checks_size() {
        let input = vec![0x11u8; 300];
        let mut c = create_zstd_compressor(&ZstdCompressorConfig::default()).unwrap();
        let mut d = create_zstd_decompressor(&ZstdDecompressorConfig::default()).unwrap();
        let compressed = compress_to_vec(c.as_mut(), &input).unwrap();
        let err = decompress_to_vec(d.as_mut(), &compressed, 400).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptInput);
    }

    // --- configured codecs ---

    #[test]
    fn configured_codecs_roundtrip() {
        let input = random_bytes(2000, 21).iter().map(|b| b % 16).collect::<Vec<u8>>();

        let mut brotli = create_brotli_compressor(&BrotliCompressorConfig {
            quality: Some(5),
            window_size: Some(16),
            mode: Some(1),
        })
        .unwrap();
        let mut unbrotli = create_brotli_decompressor(&BrotliDecompressorConfig::default()).unwrap();
        let packed = compress_to_vec(brotli.as_mut(), &input).unwrap();
        assert_eq!(decompress_to_vec(unbrotli.as_mut(), &packed, input.len()).unwrap(), input);

        // Raw deflate and gzip need matching decoder window bits.
        for bits in [-12, 31] {
            let mut deflate = create_zlib_compressor(&ZlibCompressorConfig {
                level: Some(9),
                window_bits: Some(bits),
                mem_level: Some(9),
                strategy: Some(0),
            })
            .unwrap();
            let mut inflate =
                create_zlib_decompressor(&ZlibDecompressorConfig { window_bits: Some(bits) }).unwrap();
            let packed = compress_to_vec(deflate.as_mut(), &input).unwrap();
            assert_eq!(decompress_to_vec(inflate.as_mut(), &packed, input.len()).unwrap(), input);
        }

        let mut zstd = create_zstd_compressor(&ZstdCompressorConfig {
            level: Some(19),
            strategy: Some(9),
            enable_checksum: Some(true),
            ..Default::default()
        })
        .unwrap();
        let mut unzstd = create_zstd_decompressor(&ZstdDecompressorConfig {
            window_log_max: Some(27),
            ..Default::default()
        })
        .unwrap();
        let packed = compress_to_vec(zstd.as_mut(), &input).unwrap();
        assert_eq!(decompress_to_vec(unzstd.as_mut(), &packed, input.len()).unwrap(), input);
    }

    #[test]
    fn zlib_window_mismatch_is_corrupt() {
        let input = vec![0x42u8; 512];
        let mut c = create_zlib_compressor(&ZlibCompressorConfig {
            window_bits: Some(-15),
            ..Default::default()
        })
        .unwrap();
        // Raw deflate has no header for a zlib decoder to accept.
        let mut d = create_zlib_decompressor(&ZlibDecompressorConfig::default()).unwrap();
        let packed = compress_to_vec(c.as_mut(), &input).unwrap();
        let mut out = vec![0u8; 512];
        let err = d.decompress(&packed, &mut out).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptInput);
    }

    #[test]
    fn resolve_reports_backend_info() {
        let info = resolve(3).unwrap();
        assert_eq!(info.backend, Backend::Zstd);
        assert_eq!(info.name, "zstd");
        assert!(!info.checked_flags);
        assert!(resolve(1).unwrap().checked_flags);
        let err = resolve(42).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
        assert!(err.to_string().contains("0x2a"));
    }
}
