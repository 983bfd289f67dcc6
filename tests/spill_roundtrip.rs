//! Round-trip tests across codecs, migration and disk rollover.
//!
//! Every combination of serializer and compressor that is compiled in must give
//! back exactly what was pushed, in order, with or without migration.

use serde::{Deserialize, Serialize};
use spillvec::{
    compression_available, serializer_available, BufferConfig, CompressionKind, Error,
    HybridBuffer, RecordStore, SerializerKind, StoreConfig,
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Document {
    id: u64,
    title: String,
    body: String,
    tags: Vec<String>,
    scores: BTreeMap<String, i32>,
    parent: Option<u64>,
}

/// Strings that exercise the line framing.
const TRICKY: &[&str] = &[
    "",
    "\\",
    "\n",
    "\r",
    "\r\n",
    "\\n",
    "\\r",
    "\\\\n",
    "a\\b\rc\nd",
    "hello world!\n",
    "hello world!\\n",
    "trailing backslash \\",
    "unicode \u{2028} \u{1F980}",
];

fn document(id: u64) -> Document {
    let text = TRICKY[id as usize % TRICKY.len()];
    let mut scores = BTreeMap::new();
    scores.insert(text.to_string(), id as i32);
    scores.insert("rank".to_string(), -(id as i32));
    Document {
        id,
        title: format!("doc {}{}", id, text),
        body: text.repeat(3),
        tags: TRICKY.iter().take(id as usize % 5).map(|s| s.to_string()).collect(),
        scores,
        parent: id.checked_sub(1),
    }
}

fn available_configs(threshold: usize) -> Vec<BufferConfig> {
    let mut configs = Vec::new();
    for serializer in SerializerKind::ALL {
        for compression in CompressionKind::ALL {
            if serializer_available(serializer) && compression_available(compression) {
                configs.push(
                    BufferConfig::new(threshold)
                        .with_serializer(serializer)
                        .with_compression(compression),
                );
            }
        }
    }
    configs
}

fn read_with_cursor<T: Clone + Serialize + serde::de::DeserializeOwned>(
    buffer: &mut HybridBuffer<T>,
) -> Vec<T> {
    let mut out = Vec::new();
    buffer.rewind();
    while buffer.peek().unwrap() {
        assert_eq!(buffer.key(), out.len() as u64);
        out.push(buffer.current().unwrap().clone());
        buffer.advance().unwrap();
    }
    out
}

#[test]
fn every_codec_roundtrips_tricky_documents() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let docs: Vec<Document> = (0..40).map(document).collect();
    for config in available_configs(8) {
        let mut buffer = HybridBuffer::new(config).unwrap();
        for doc in &docs {
            buffer.push(doc.clone()).unwrap();
        }
        let label = format!("{}+{}", config.serializer, config.compression);
        assert!(buffer.is_spilled(), "{}", label);
        assert_eq!(buffer.count(), docs.len() as u64, "{}", label);
        assert_eq!(read_with_cursor(&mut buffer), docs, "{}", label);
        assert_eq!(buffer.to_vec().unwrap(), docs, "{}", label);
    }
}

#[test]
fn every_codec_roundtrips_tricky_strings_in_store() {
    for config in available_configs(1) {
        let mut store = RecordStore::open(config.store_config()).unwrap();
        for s in TRICKY {
            store.push(&s.to_string()).unwrap();
        }
        assert_eq!(store.count(), TRICKY.len() as u64);
        assert_eq!(store.to_vec().unwrap(), TRICKY, "{}", store.codec_id());
    }
}

#[test]
fn count_is_independent_of_codec_and_migration() {
    for threshold in [1, 10, 100] {
        for config in available_configs(threshold) {
            let mut buffer = HybridBuffer::new(config).unwrap();
            for n in 0..50u32 {
                buffer.push(n).unwrap();
                assert_eq!(buffer.count(), u64::from(n) + 1);
            }
            assert_eq!(buffer.is_spilled(), threshold < 50);
        }
    }
}

#[test]
fn migration_boundary() {
    let threshold = 16;
    let mut at_threshold = HybridBuffer::with_threshold(threshold).unwrap();
    let mut past_threshold = HybridBuffer::with_threshold(threshold).unwrap();
    for id in 0..threshold as u64 {
        at_threshold.push(document(id)).unwrap();
        past_threshold.push(document(id)).unwrap();
    }
    past_threshold.push(document(threshold as u64)).unwrap();

    assert!(!at_threshold.is_spilled());
    assert!(at_threshold.spilled_store().is_none());

    let store = past_threshold.spilled_store().unwrap();
    assert_eq!(store.count(), threshold as u64 + 1);
    assert_eq!(
        read_with_cursor(&mut past_threshold),
        (0..=threshold as u64).map(document).collect::<Vec<_>>()
    );
}

#[test]
fn threshold_two_scenario() {
    let mut buffer = HybridBuffer::with_threshold(2).unwrap();
    let (a, b, c) = (document(1), document(2), document(3));
    buffer.push(a.clone()).unwrap();
    buffer.push(b.clone()).unwrap();
    buffer.push(c.clone()).unwrap();

    assert_eq!(buffer.count(), 3);
    assert_eq!(buffer.spilled_store().map(|s| s.count()), Some(3));
    assert_eq!(read_with_cursor(&mut buffer), vec![a, b, c]);
}

#[test]
fn pushes_after_migration_append_to_store() {
    let mut buffer = HybridBuffer::with_threshold(3).unwrap();
    for id in 0..10 {
        buffer.push(document(id)).unwrap();
    }
    let first = read_with_cursor(&mut buffer);
    buffer.push(document(10)).unwrap();
    let second = read_with_cursor(&mut buffer);
    assert_eq!(second.len(), first.len() + 1);
    assert_eq!(&second[..first.len()], &first[..]);
    assert_eq!(buffer.spilled_store().unwrap().count(), 11);
}

#[test]
fn large_store_moves_to_disk_and_reads_back() {
    let config = StoreConfig::default()
        .with_memory_cap_mib(1)
        .with_serializer(SerializerKind::Native);
    let mut store = RecordStore::open(config).unwrap();
    let line = "z\\\r\n".repeat(4096);
    for i in 0..200u32 {
        store.push(&(i, line.clone())).unwrap();
    }
    assert!(store.is_on_disk());
    assert!(store.size_in_bytes().unwrap() > 1024 * 1024);

    let mut expected = 0u32;
    for record in store.records() {
        let (i, text) = record.unwrap();
        assert_eq!(i, expected);
        assert_eq!(text, line);
        expected += 1;
    }
    assert_eq!(expected, 200);
}

#[test]
fn buffer_config_from_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spillvec.toml");
    std::fs::write(
        &path,
        "item_threshold = 3\nserializer = \"native\"\ncompression = \"none\"\n",
    )
    .unwrap();

    let config = BufferConfig::from_file(&path).unwrap();
    assert_eq!(config.item_threshold, 3);
    assert_eq!(config.memory_cap_mib, spillvec::DEFAULT_MEMORY_CAP_MIB);

    let mut buffer = HybridBuffer::new(config).unwrap();
    for n in 0..4u8 {
        buffer.push(n).unwrap();
    }
    assert!(buffer.is_spilled());
    assert_eq!(buffer.threshold(), 3);
}

#[test]
fn invalid_configuration_is_rejected() {
    let err = HybridBuffer::<u8>::new(BufferConfig::new(0)).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));

    let err = RecordStore::<u8>::open(StoreConfig::default().with_memory_cap_mib(0)).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}
