//! # Value Codec
//!
//! This module provides the `Codec` trait used by file-backed stores to turn
//! typed keys and values into byte sequences and back. In-memory stores keep
//! typed values directly and never touch a codec.
//!
//! ## Contract
//!
//! Implementations must uphold two rules the storage layer depends on:
//!
//! 1. `decode(encode(v))` reproduces a value equal to `v`
//! 2. `encode(v).len()` is exactly the length recorded next to the bytes;
//!    the store always reads back exactly that many bytes, never more or less
//!
//! ## Encoding Format
//!
//! All integer codecs use fixed-width little-endian encoding, matching the
//! record headers in the index file. Byte order does not affect index ordering:
//! keys are compared as decoded values, never as raw bytes.
//!
//! | Type     | Bytes | Format                 |
//! |----------|-------|------------------------|
//! | `u32`    | 4     | little-endian          |
//! | `u64`    | 8     | little-endian          |
//! | `i32`    | 4     | little-endian          |
//! | `i64`    | 8     | little-endian          |
//! | `String` | n     | UTF-8 bytes            |
//! | `Vec<u8>`| n     | raw bytes (identity)   |
//!
//! ## Error Handling
//!
//! `decode` returns `eyre::Result` with descriptive messages:
//! - Wrong buffer length for a fixed-width integer
//! - Invalid UTF-8 for `String`

use eyre::{ensure, Result, WrapErr};

/// Converts a typed value to and from a byte sequence.
pub trait Codec: Sized {
    fn encode(&self) -> Vec<u8>;

    fn decode(bytes: &[u8]) -> Result<Self>;
}

macro_rules! fixed_int_codec {
    ($($ty:ty => $len:expr),* $(,)?) => {$(
        impl Codec for $ty {
            fn encode(&self) -> Vec<u8> {
                self.to_le_bytes().to_vec()
            }

            fn decode(bytes: &[u8]) -> Result<Self> {
                ensure!(
                    bytes.len() == $len,
                    concat!(stringify!($ty), " decode expects {} bytes, got {}"),
                    $len,
                    bytes.len()
                );
                let mut buf = [0u8; $len];
                buf.copy_from_slice(bytes);
                Ok(<$ty>::from_le_bytes(buf))
            }
        }
    )*};
}

fixed_int_codec! {
    u32 => 4,
    u64 => 8,
    i32 => 4,
    i64 => 8,
}

impl Codec for String {
    fn encode(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .wrap_err("string decode: invalid utf-8")
    }
}

impl Codec for Vec<u8> {
    fn encode(&self) -> Vec<u8> {
        self.clone()
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(bytes.to_vec())
    }
}
