#[cfg(test)]
mod tests {
    use anyhow::{ensure, Result};
    use compress_core::compression::{
        codecs::{ZlibDecoder, ZstdEncoder},
        drive_stream, drive_stream_with,
        registry::*,
        types::{Backend, BlockSizes, ErrorKind, Stream, StreamState},
        BrotliDecoderConfig, BrotliEncoderConfig, DecoderConfig, EncoderConfig, StreamController,
        ZlibDecoderConfig, ZstdEncoderConfig,
    };
    use rand::{distributions::Alphanumeric, rngs::StdRng, Rng, RngCore, SeedableRng};

    const BACKENDS: [Backend; 3] = [Backend::Brotli, Backend::Zlib, Backend::Zstd];

    fn encoder(backend: Backend) -> Box<dyn Stream> {
        create_encoder(&EncoderConfig::defaults(backend)).expect("encoder")
    }

    fn decoder(backend: Backend) -> Box<dyn Stream> {
        create_decoder(&DecoderConfig::defaults(backend)).expect("decoder")
    }

    fn concat_chunks(chunks: &[Vec<u8>]) -> Vec<u8> {
        chunks.iter().flatten().copied().collect()
    }

    fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut buf = vec![0u8; len];
        rng.fill_bytes(&mut buf);
        buf
    }

    fn alphanumeric(len: usize, seed: u64) -> Vec<u8> {
        StdRng::seed_from_u64(seed).sample_iter(&Alphanumeric).take(len).collect()
    }

    /// Push `data` through an already initialized stream in `in_chunk` slices,
    /// collecting output through a buffer of `out_size` bytes.
    fn pump(stream: &mut dyn Stream, data: &[u8], in_chunk: usize, out_size: usize) -> Result<Vec<u8>> {
        let mut outbuf = vec![0u8; out_size];
        let mut chunks: Vec<Vec<u8>> = Vec::new();

        for piece in data.chunks(in_chunk) {
            let mut rest = piece;
            while !rest.is_empty() {
                let (read, written) = stream.update(rest, &mut outbuf)?;
                ensure!(read > 0 || written > 0, "update made no progress");
                chunks.push(outbuf[..written].to_vec());
                rest = &rest[read..];
            }
        }

        loop {
            let (written, more) = stream.finalize(&mut outbuf)?;
            chunks.push(outbuf[..written].to_vec());
            if !more {
                break;
            }
        }
        ensure!(stream.state() == StreamState::Finalized, "stream not finalized");
        Ok(concat_chunks(&chunks))
    }

    fn roundtrip(backend: Backend, flush: bool, data: &[u8]) -> Result<Vec<u8>> {
        let mut enc = encoder(backend);
        enc.initialize(flush)?;
        let sizes = enc.block_sizes();
        let packed = pump(enc.as_mut(), data, sizes.input, sizes.output)?;

        let mut dec = decoder(backend);
        dec.initialize(flush)?;
        let sizes = dec.block_sizes();
        pump(dec.as_mut(), &packed, sizes.input, sizes.output)
    }

    // --- state discipline ---

    #[test]
    fn update_before_initialize_is_usage_error() {
        for backend in BACKENDS {
            let mut s = encoder(backend);
            let mut out = vec![0u8; 64];
            let err = s.update(b"abc", &mut out).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidUsage, "{backend}");
            assert!(err.is_usage_error());
            assert_eq!(s.state(), StreamState::Created);
        }
    }

    #[test]
    fn initialize_twice_is_usage_error() {
        for backend in BACKENDS {
            let mut s = decoder(backend);
            s.initialize(false).unwrap();
            assert_eq!(s.state(), StreamState::Processing);
            let err = s.initialize(false).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidUsage, "{backend}");
            assert_eq!(s.state(), StreamState::Processing);
        }
    }

    #[test]
    fn finalize_from_created_goes_straight_to_finalized() {
        for backend in BACKENDS {
            let mut s = encoder(backend);
            let mut out = vec![0u8; 64];
            assert_eq!(s.finalize(&mut out).unwrap(), (0, false));
            assert_eq!(s.state(), StreamState::Finalized);
            assert_eq!(s.counters().finalize_calls, 0, "{backend}: backend never touched");

            assert!(s.initialize(true).unwrap_err().is_usage_error());
            assert!(s.update(b"x", &mut out).unwrap_err().is_usage_error());
            assert_eq!(s.finalize(&mut out).unwrap(), (0, false));
        }
    }

    #[test]
    fn update_while_finalizing_is_usage_error() {
        let data = random_bytes(1000, 9);
        for backend in BACKENDS {
            let mut s = encoder(backend);
            s.initialize(false).unwrap();
            let mut big = vec![0u8; 8192];
            let (read, _) = s.update(&data, &mut big).unwrap();
            assert_eq!(read, data.len(), "{backend}: small input fits in one update");

            // One byte of output space cannot hold the whole tail.
            let mut tiny = [0u8; 1];
            let (written, more) = s.finalize(&mut tiny).unwrap();
            assert_eq!(written, 1);
            assert!(more, "{backend}: tail must still be pending");
            assert_eq!(s.state(), StreamState::Finalizing);

            let err = s.update(b"late", &mut big).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidUsage, "{backend}");

            // Draining completes the stream.
            loop {
                let (_, more) = s.finalize(&mut big).unwrap();
                if !more {
                    break;
                }
            }
            assert_eq!(s.state(), StreamState::Finalized);
            assert!(s.update(b"", &mut big).unwrap_err().is_usage_error());
            assert_eq!(s.finalize(&mut big).unwrap(), (0, false));
        }
    }

    #[test]
    fn usage_error_names_operation_and_state() {
        let mut s = encoder(Backend::Zstd);
        let err = s.update(b"abc", &mut [0u8; 8]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("update"), "{msg}");
        assert!(msg.contains("CREATED"), "{msg}");
    }

    // --- round trips ---

    #[test]
    fn roundtrip_all_backends_with_and_without_flush() {
        let data = random_bytes(200_000, 1)
            .iter()
            .map(|b| b"abcdefgh"[(*b % 8) as usize])
            .collect::<Vec<u8>>();
        for backend in BACKENDS {
            for flush in [false, true] {
                let out = roundtrip(backend, flush, &data).unwrap();
                assert_eq!(out, data, "{backend} flush={flush}");
            }
        }
    }

    #[test]
    fn empty_input_roundtrip_all_backends() {
        for backend in BACKENDS {
            for flush in [false, true] {
                let out = roundtrip(backend, flush, &[]).unwrap();
                assert!(out.is_empty(), "{backend} flush={flush}");
            }
        }
    }

    #[test]
    fn million_alphanumeric_bytes_with_small_decoder_buffer() {
        let data = alphanumeric(1_000_000, 42);
        for backend in BACKENDS {
            let mut enc = encoder(backend);
            enc.initialize(true).unwrap();
            let BlockSizes { input, output } = enc.block_sizes();
            assert!(input > 0 && output > 0, "{backend}: advisory sizes");
            let packed = pump(enc.as_mut(), &data, input, output).unwrap();
            assert!(packed.len() < data.len(), "{backend}: alphanumeric text must shrink");

            let mut dec = decoder(backend);
            dec.initialize(true).unwrap();
            let BlockSizes { input, output } = dec.block_sizes();
            let out = pump(dec.as_mut(), &packed, input, output / 10).unwrap();
            assert_eq!(out.len(), data.len(), "{backend}");
            assert_eq!(out, data, "{backend}");
        }
    }

    #[test]
    fn flush_makes_output_decodable_mid_stream() {
        let data = alphanumeric(10_000, 3);
        for backend in BACKENDS {
            let mut enc = encoder(backend);
            enc.initialize(true).unwrap();
            let mut outbuf = vec![0u8; 64 * 1024];
            let mut packed = Vec::new();
            let mut rest = &data[..];
            while !rest.is_empty() {
                let (read, written) = enc.update(rest, &mut outbuf).unwrap();
                packed.extend_from_slice(&outbuf[..written]);
                rest = &rest[read..];
            }
            // Everything submitted so far must decode without finalizing the encoder.
            let mut dec = decoder(backend);
            dec.initialize(true).unwrap();
            let mut plain = Vec::new();
            let mut rest = &packed[..];
            while !rest.is_empty() {
                let (read, written) = dec.update(rest, &mut outbuf).unwrap();
                plain.extend_from_slice(&outbuf[..written]);
                rest = &rest[read..];
            }
            assert_eq!(plain, data, "{backend}");
        }
    }

    // --- decoder failures ---

    #[test]
    fn truncated_stream_fails_on_finalize() {
        let data = random_bytes(50_000, 77);
        for backend in BACKENDS {
            let mut enc = encoder(backend);
            enc.initialize(false).unwrap();
            let packed = pump(enc.as_mut(), &data, 16_000, 16_000).unwrap();
            let cut = &packed[..packed.len() / 2];

            let mut dec = decoder(backend);
            dec.initialize(false).unwrap();
            let mut outbuf = vec![0u8; 128 * 1024];
            let mut rest = cut;
            while !rest.is_empty() {
                let (read, _) = dec.update(rest, &mut outbuf).unwrap();
                rest = &rest[read..];
            }
            let err = dec.finalize(&mut outbuf).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::CorruptInput, "{backend}: {err}");
        }
    }

    #[test]
    fn decoder_finalize_without_input_is_corrupt() {
        for backend in BACKENDS {
            let mut dec = decoder(backend);
            dec.initialize(false).unwrap();
            let err = dec.finalize(&mut [0u8; 32]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::CorruptInput, "{backend}");
        }
    }

    #[test]
    fn zlib_rejects_trailing_garbage() {
        let mut enc = encoder(Backend::Zlib);
        enc.initialize(false).unwrap();
        let mut packed = pump(enc.as_mut(), b"hello hello hello", 64, 256).unwrap();
        packed.extend_from_slice(b"junk");

        let mut dec = StreamController::new(ZlibDecoder::new(&ZlibDecoderConfig::default()).unwrap());
        dec.initialize(false).unwrap();
        let mut out = vec![0u8; 256];
        let (read, written) = dec.update(&packed, &mut out).unwrap();
        assert_eq!(&out[..written], b"hello hello hello");
        let err = dec.update(&packed[read..], &mut out).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptInput);
    }

    // --- configured streams ---

    #[test]
    fn brotli_stream_with_distance_params_and_large_window() {
        let data = alphanumeric(100_000, 8);
        let mut enc = create_brotli_encoder(&BrotliEncoderConfig {
            quality: Some(5),
            window_size: Some(26),
            large_window: Some(true),
            postfix_bits: Some(1),
            num_direct_distance_codes: Some(4),
            block_size: Some(18),
            size_hint: Some(data.len() as i32),
            literal_context_modeling: Some(false),
            ..Default::default()
        })
        .unwrap();
        enc.initialize(false).unwrap();
        let packed = pump(enc.as_mut(), &data, 16_000, 16_000).unwrap();

        let mut dec = create_brotli_decoder(&BrotliDecoderConfig {
            large_window: Some(true),
            disable_ring_buffer_reallocation: Some(true),
        })
        .unwrap();
        dec.initialize(false).unwrap();
        assert_eq!(pump(dec.as_mut(), &packed, 16_000, 16_000).unwrap(), data);
    }

    #[test]
    fn zstd_stream_with_checksum_and_level() {
        let data = alphanumeric(300_000, 5);
        let config = ZstdEncoderConfig {
            level: Some(3),
            window_log: Some(20),
            enable_checksum: Some(true),
            enable_content_size: Some(false),
            ..Default::default()
        };
        let mut enc = StreamController::new(ZstdEncoder::new(&config).unwrap());
        enc.initialize(false).unwrap();
        let packed = pump(&mut enc, &data, 50_000, 4096).unwrap();

        let mut dec = decoder(Backend::Zstd);
        dec.initialize(false).unwrap();
        assert_eq!(pump(dec.as_mut(), &packed, 7_000, 3_000).unwrap(), data);
    }

    // --- pump helpers ---

    #[test]
    fn drive_stream_roundtrip_and_counters() {
        let data = alphanumeric(120_000, 13);
        for backend in BACKENDS {
            let mut packed = Vec::new();
            let mut enc = encoder(backend);
            let written = drive_stream(enc.as_mut(), false, &data[..], &mut packed).unwrap();
            assert_eq!(written as usize, packed.len());
            assert_eq!(enc.state(), StreamState::Finalized);
            assert_eq!(enc.counters().bytes_in as usize, data.len());
            assert_eq!(enc.counters().bytes_out as usize, packed.len());

            let mut plain = Vec::new();
            let mut dec = decoder(backend);
            let sizes = BlockSizes { input: 1000, output: 333 };
            drive_stream_with(dec.as_mut(), true, &packed[..], &mut plain, sizes).unwrap();
            assert_eq!(plain, data, "{backend}");
            assert_eq!(dec.counters().bytes_in as usize, packed.len());
        }
    }

    #[test]
    fn drive_stream_rejects_used_stream() {
        let mut enc = encoder(Backend::Zlib);
        enc.initialize(false).unwrap();
        let err = drive_stream(enc.as_mut(), false, &b"abc"[..], Vec::new()).unwrap_err();
        assert!(err.is_usage_error());
    }

    #[test]
    fn block_sizes_are_advisory_and_stable() {
        let brotli = create_brotli_encoder(&BrotliEncoderConfig::default()).unwrap();
        assert_eq!(brotli.block_sizes(), BlockSizes { input: 16000, output: 16000 });
        let zlib = encoder(Backend::Zlib);
        assert_eq!(<(usize, usize)>::from(zlib.block_sizes()), (16 * 1024, 16 * 1024));
        let zstd = decoder(Backend::Zstd);
        let sizes = zstd.block_sizes();
        assert!(sizes.input > 0 && sizes.output >= 128 * 1024);
    }
}
