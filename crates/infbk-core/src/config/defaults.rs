use crate::compress::{DEFAULT_MAX_DECOMPRESSED, DEFAULT_ZSTD_LEVEL};
use crate::service::DEFAULT_MAX_ARCHIVE_BYTES;

pub(super) fn default_memory_kib() -> u32 {
    64 * 1024 // 64 MiB
}

pub(super) fn default_iterations() -> u32 {
    3
}

pub(super) fn default_parallelism() -> u32 {
    2
}

pub(super) fn default_zstd_level() -> i32 {
    DEFAULT_ZSTD_LEVEL
}

pub(super) fn default_max_decompressed_mib() -> u64 {
    DEFAULT_MAX_DECOMPRESSED / (1024 * 1024)
}

pub(super) fn default_max_archive_bytes() -> u64 {
    DEFAULT_MAX_ARCHIVE_BYTES
}

pub(super) fn default_store_path() -> String {
    "infbk-store.json".to_string()
}
