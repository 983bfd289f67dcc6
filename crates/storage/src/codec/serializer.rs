//! Value serializers.
//!
//! | Kind               | Backend      | Domain                                         |
//! |--------------------|--------------|------------------------------------------------|
//! | `Native`           | `serde_json` | any serde value; map keys become strings       |
//! | `Compact`          | `bincode`    | types that do not need `deserialize_any`       |
//! | `SchemaLessBinary` | `rmp-serde`  | any serde value; structs encoded as named maps |

use super::traits::ValueSerializer;
use serde::{de::DeserializeOwned, Serialize};
use spillvec_core::{Error, Result};

/// Self-describing JSON serializer. Always available.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl<T> ValueSerializer<T> for JsonSerializer
where
    T: Serialize + DeserializeOwned,
{
    fn serialize(&self, value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| Error::encoding("json", e))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|e| Error::decoding("json", e, bytes.len()))
    }

    fn serializer_id(&self) -> &'static str {
        "json"
    }
}

/// bincode serializer.
///
/// Not self-describing: types relying on `deserialize_any` (untagged enums,
/// `serde_json::Value`, flattened structs) do not round-trip.
#[cfg(feature = "compact")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeSerializer;

#[cfg(feature = "compact")]
impl<T> ValueSerializer<T> for BincodeSerializer
where
    T: Serialize + DeserializeOwned,
{
    fn serialize(&self, value: &T) -> Result<Vec<u8>> {
        bincode::serialize(value).map_err(|e| Error::encoding("bincode", e))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<T> {
        bincode::deserialize(bytes).map_err(|e| Error::decoding("bincode", e, bytes.len()))
    }

    fn serializer_id(&self) -> &'static str {
        "bincode"
    }
}

/// MessagePack serializer, structs encoded as maps with field names.
#[cfg(feature = "msgpack")]
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgpackSerializer;

#[cfg(feature = "msgpack")]
impl<T> ValueSerializer<T> for MsgpackSerializer
where
    T: Serialize + DeserializeOwned,
{
    fn serialize(&self, value: &T) -> Result<Vec<u8>> {
        rmp_serde::to_vec_named(value).map_err(|e| Error::encoding("msgpack", e))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<T> {
        rmp_serde::from_slice(bytes).map_err(|e| Error::decoding("msgpack", e, bytes.len()))
    }

    fn serializer_id(&self) -> &'static str {
        "msgpack"
    }
}
