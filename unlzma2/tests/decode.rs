//! Decode tests against streams produced by the reference XZ encoder.
//!
//! The fixtures under `tests/data/` are raw LZMA2 streams
//! (`xz --format=raw --lzma2=…` equivalents); the plaintexts are regenerated
//! here so only the compressed bytes are committed.

use unlzma2::{decompress_into, Status};

const HELLO: &[u8] = include_bytes!("data/hello.lzma2");
const RUNS: &[u8] = include_bytes!("data/runs.lzma2");
const TEXT: &[u8] = include_bytes!("data/text.lzma2");
const RANDOM: &[u8] = include_bytes!("data/random.lzma2");
const BIG: &[u8] = include_bytes!("data/big.lzma2");
const TEXT_LP2PB1: &[u8] = include_bytes!("data/text_lp2pb1.lzma2");
const PERIODS: &[u8] = include_bytes!("data/periods.lzma2");

fn hello() -> Vec<u8> {
    b"Hello, world!\n".to_vec()
}

/// Long runs at distances 1, 2 and 3, then every byte value once.
fn runs() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend(std::iter::repeat(b'A').take(500));
    for _ in 0..300 {
        data.extend_from_slice(b"AB");
    }
    for _ in 0..200 {
        data.extend_from_slice(b"ABC");
    }
    data.extend(0u8..=255);
    data
}

fn text() -> Vec<u8> {
    b"The quick brown fox jumps over the lazy dog. ".repeat(60)
}

/// Periodic data whose match distances land on the first distance slots
/// that carry extra bits (distances 5 and 6 in particular).
fn periods() -> Vec<u8> {
    let mut data = Vec::new();
    for _ in 0..200 {
        data.extend_from_slice(b"ABCDE");
    }
    for _ in 0..200 {
        data.extend_from_slice(b"FGHIJK");
    }
    for _ in 0..150 {
        data.extend_from_slice(b"LMNOPQR");
    }
    for _ in 0..120 {
        data.extend_from_slice(b"STUVWXYZ");
    }
    data
}

/// Deterministic pseudo-random bytes (same generator as the fixture script).
fn random_bytes(n: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(n);
    let mut seed: u64 = 0x1234_5678_9ABC_DEF0;
    for _ in 0..n {
        seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        out.push((seed >> 32) as u8);
    }
    out
}

/// Large enough to span several compressed chunks.
fn big() -> Vec<u8> {
    b"Lorem ipsum dolor sit amet, consectetur adipiscing elit. ".repeat(40_000)
}

fn assert_roundtrip(stream: &[u8], expected: &[u8]) {
    let mut out = vec![0u8; expected.len() + 64];
    let outcome = decompress_into(stream, &mut out);
    assert_eq!(outcome.status, Status::Ok);
    assert_eq!(outcome.consumed, stream.len());
    assert_eq!(outcome.produced, expected.len());
    assert_eq!(&out[..outcome.produced], expected);
}

#[test]
fn roundtrip_hello() {
    assert_roundtrip(HELLO, &hello());
}

#[test]
fn roundtrip_short_distance_runs() {
    assert_roundtrip(RUNS, &runs());
}

#[test]
fn roundtrip_text() {
    assert_roundtrip(TEXT, &text());
}

#[test]
fn roundtrip_incompressible() {
    assert_roundtrip(RANDOM, &random_bytes(1024));
}

#[test]
fn roundtrip_multiple_chunks() {
    assert_roundtrip(BIG, &big());
}

#[test]
fn roundtrip_nondefault_literal_params() {
    // Encoded with lc=0, lp=2, pb=1; lc=0 takes no context bits from the
    // previous byte at all.
    assert_roundtrip(TEXT_LP2PB1, &text());
}

#[test]
fn roundtrip_lowest_coded_distance_slots() {
    // Distances 5 and 6 sit in the first slot whose tree is rooted at the
    // very start of the low-distance table.
    assert_roundtrip(PERIODS, &periods());
}

#[test]
fn determinism() {
    let expected = text();
    let mut first = vec![0u8; expected.len()];
    let mut second = vec![0u8; expected.len()];
    let a = decompress_into(TEXT, &mut first);
    let b = decompress_into(TEXT, &mut second);
    assert_eq!(a.status, b.status);
    assert_eq!((a.consumed, a.produced), (b.consumed, b.produced));
    assert_eq!(first, second);
}

#[test]
fn output_capacity_reached() {
    // A valid stream against a too-small buffer fills it exactly and
    // reports that more output would have helped.
    let expected = text();
    let mut out = vec![0u8; 100];
    let outcome = decompress_into(TEXT, &mut out);
    assert_eq!(outcome.status, Status::OutputLimit);
    assert_eq!(outcome.produced, 100);
    assert_eq!(&out[..], &expected[..100]);
}

#[test]
fn truncated_streams_never_succeed() {
    let expected = runs();
    for cut in 0..RUNS.len() {
        let mut out = vec![0u8; expected.len() * 2];
        let outcome = decompress_into(&RUNS[..cut], &mut out);
        assert!(
            matches!(outcome.status, Status::InputLimit | Status::DataError),
            "prefix of {cut} bytes returned {:?}",
            outcome.status
        );
        assert!(outcome.consumed <= cut);
        // Whatever was produced must be a prefix of the real plaintext.
        assert_eq!(&out[..outcome.produced], &expected[..outcome.produced]);
    }
}

#[test]
fn random_input_never_escapes_the_buffers() {
    // xorshift-style generator; decode garbage and check the contract:
    // cursors in bounds, and success only ever follows an end marker.
    let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut next = move || {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        seed
    };
    for _ in 0..500 {
        let len = (next() % 4096) as usize;
        let input: Vec<u8> = (0..len).map(|_| (next() >> 24) as u8).collect();
        let mut out = vec![0u8; 2048];
        let outcome = decompress_into(&input, &mut out);
        assert!(outcome.consumed <= input.len());
        assert!(outcome.produced <= out.len());
        if outcome.status == Status::Ok {
            assert!(outcome.consumed >= 1);
            assert_eq!(input[outcome.consumed - 1], 0x00);
        }
    }
}

#[test]
fn concatenated_streams_stop_at_first_end_marker() {
    // Everything after the end marker is left untouched.
    let mut doubled = Vec::from(HELLO);
    doubled.extend_from_slice(HELLO);
    let expected = hello();
    let mut out = vec![0u8; 256];
    let outcome = decompress_into(&doubled, &mut out);
    assert_eq!(outcome.status, Status::Ok);
    assert_eq!(outcome.consumed, HELLO.len());
    assert_eq!(&out[..outcome.produced], &expected[..]);
}
