use std::sync::Arc;

use infbk_crypto::aes_gcm::Aes256GcmEngine;
use infbk_crypto::key::{derive_backup_key, generate_salt, Pepper};
use infbk_crypto::CryptoEngine;

use crate::archive::{ArchiveHeader, Archiver, HEADER_LEN};
use crate::collect::GraphCollector;
use crate::compress::Codec;
use crate::error::{ErrorKind, InfbkError};
use crate::model::BackupPayload;
use crate::store::{MemoryStore, Stores};
use crate::testutil::{fast_kdf, seed_graph, PASSWORD};

fn archiver() -> Archiver {
    Archiver::new(Arc::new(Codec::default()), fast_kdf(), Pepper::builtin())
}

fn sample_payload() -> BackupPayload {
    let store = Arc::new(MemoryStore::new());
    let seeded = seed_graph(&store);
    let stores = Stores::from_backend(store);
    GraphCollector::new(&stores)
        .collect(&seeded.project, &seeded.owner)
        .unwrap()
}

/// Frame arbitrary plaintext as if it were a compressed payload.
fn seal_raw(plaintext: &[u8], password: &str) -> Vec<u8> {
    let salt = generate_salt();
    let key = derive_backup_key(password, &Pepper::builtin(), &salt, &fast_kdf()).unwrap();
    let (nonce, ciphertext) = Aes256GcmEngine::new(&key).seal(plaintext).unwrap();
    let mut out = Vec::new();
    ArchiveHeader::new(nonce, salt).write_to(&mut out);
    out.extend_from_slice(&ciphertext);
    out
}

#[test]
fn build_then_parse_roundtrip() {
    let payload = sample_payload();
    let archive = archiver().build(&payload, PASSWORD).unwrap();

    assert_eq!(&archive.bytes[..5], b"INFBK");
    assert_eq!(archive.bytes[5], 1);
    assert!(archive.filename.starts_with("Infra_Prod_"));
    assert!(archive.filename.ends_with(".infbk"));

    let parsed = archiver().parse(&archive.bytes, PASSWORD).unwrap();
    assert_eq!(parsed, payload);
}

#[test]
fn empty_graph_roundtrip() {
    let mut payload = sample_payload();
    payload.diagrams.clear();
    payload.nodes.clear();
    payload.vaults.clear();
    payload.notes.clear();
    let archive = archiver().build(&payload, PASSWORD).unwrap();
    assert_eq!(archiver().parse(&archive.bytes, PASSWORD).unwrap(), payload);
}

#[test]
fn each_build_uses_fresh_salt_and_nonce() {
    let payload = sample_payload();
    let a = archiver().build(&payload, PASSWORD).unwrap();
    let b = archiver().build(&payload, PASSWORD).unwrap();
    let (ha, _) = ArchiveHeader::split(&a.bytes).unwrap();
    let (hb, _) = ArchiveHeader::split(&b.bytes).unwrap();
    assert_ne!(ha.salt, hb.salt);
    assert_ne!(ha.nonce, hb.nonce);
    assert_ne!(a.bytes, b.bytes);
}

#[test]
fn wrong_password_fails_decryption() {
    let archive = archiver().build(&sample_payload(), PASSWORD).unwrap();
    let err = archiver().parse(&archive.bytes, "WrongHorse2").unwrap_err();
    assert!(matches!(err, InfbkError::DecryptionFailed));
    assert_eq!(err.kind(), ErrorKind::DecryptionFailed);
}

#[test]
fn different_pepper_fails_decryption() {
    let archive = archiver().build(&sample_payload(), PASSWORD).unwrap();
    let other = Archiver::new(
        Arc::new(Codec::default()),
        fast_kdf(),
        Pepper::from_bytes(b"another-deployment".to_vec()),
    );
    assert!(matches!(
        other.parse(&archive.bytes, PASSWORD),
        Err(InfbkError::DecryptionFailed)
    ));
}

#[test]
fn flipping_any_ciphertext_byte_fails_decryption() {
    let archive = archiver().build(&sample_payload(), PASSWORD).unwrap();
    let a = archiver();
    for i in HEADER_LEN..archive.bytes.len() {
        let mut tampered = archive.bytes.clone();
        tampered[i] ^= 0x01;
        match a.parse(&tampered, PASSWORD) {
            Err(InfbkError::DecryptionFailed) => {}
            other => panic!("byte {i}: expected DecryptionFailed, got {other:?}"),
        }
    }
}

#[test]
fn tampered_nonce_or_salt_fails_decryption() {
    let archive = archiver().build(&sample_payload(), PASSWORD).unwrap();
    for i in [6, 17, 18, 49] {
        let mut tampered = archive.bytes.clone();
        tampered[i] ^= 0x80;
        assert!(
            matches!(
                archiver().parse(&tampered, PASSWORD),
                Err(InfbkError::DecryptionFailed)
            ),
            "header byte {i}"
        );
    }
}

#[test]
fn truncated_ciphertext_fails_decryption() {
    let archive = archiver().build(&sample_payload(), PASSWORD).unwrap();
    let truncated = &archive.bytes[..archive.bytes.len() - 1];
    assert!(matches!(
        archiver().parse(truncated, PASSWORD),
        Err(InfbkError::DecryptionFailed)
    ));
    // Header only: no room for the tag.
    assert!(matches!(
        archiver().parse(&archive.bytes[..HEADER_LEN], PASSWORD),
        Err(InfbkError::DecryptionFailed)
    ));
}

#[test]
fn short_input_is_format_invalid() {
    let archive = archiver().build(&sample_payload(), PASSWORD).unwrap();
    for len in [0, 5, 49] {
        let err = archiver()
            .parse(&archive.bytes[..len], PASSWORD)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FormatInvalid, "len {len}");
    }
}

#[test]
fn bad_magic_is_format_invalid() {
    let archive = archiver().build(&sample_payload(), PASSWORD).unwrap();
    for i in 0..5 {
        let mut bad = archive.bytes.clone();
        bad[i] = b'?';
        let err = archiver().parse(&bad, PASSWORD).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FormatInvalid);
    }
}

#[test]
fn unknown_version_is_unsupported() {
    let archive = archiver().build(&sample_payload(), PASSWORD).unwrap();
    for version in [0u8, 2, 255] {
        let mut bad = archive.bytes.clone();
        bad[5] = version;
        let err = archiver().parse(&bad, PASSWORD).unwrap_err();
        assert!(matches!(err, InfbkError::UnsupportedVersion(v) if v == version));
        assert_eq!(err.kind(), ErrorKind::VersionUnsupported);
    }
}

#[test]
fn authenticated_non_zstd_body_is_malformed() {
    let bytes = seal_raw(b"not zstd at all", PASSWORD);
    let err = archiver().parse(&bytes, PASSWORD).unwrap_err();
    assert!(matches!(err, InfbkError::Decompression(_)));
    assert_eq!(err.kind(), ErrorKind::Malformed);
}

#[test]
fn authenticated_non_json_body_is_malformed() {
    let compressed = Codec::default().compress(b"[1, 2, 3").unwrap();
    let bytes = seal_raw(&compressed, PASSWORD);
    let err = archiver().parse(&bytes, PASSWORD).unwrap_err();
    assert!(matches!(err, InfbkError::Serialization(_)));
    assert_eq!(err.kind(), ErrorKind::Malformed);
}

#[test]
fn plaintext_is_compressed_json() {
    let payload = sample_payload();
    let archive = archiver().build(&payload, PASSWORD).unwrap();
    let (header, ciphertext) = ArchiveHeader::split(&archive.bytes).unwrap();
    let key = derive_backup_key(PASSWORD, &Pepper::builtin(), &header.salt, &fast_kdf()).unwrap();
    let compressed = Aes256GcmEngine::new(&key)
        .open(&header.nonce, ciphertext)
        .unwrap();
    let json = Codec::default().decompress(&compressed).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
    assert_eq!(value["version"], 1);
    assert_eq!(value["project"]["name"], "Infra Prod");
    assert_eq!(value["diagrams"].as_array().unwrap().len(), 2);
    assert!(value["notes"][0]["type"].is_string());
}
