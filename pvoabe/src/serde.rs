use core::fmt;
use core::marker::PhantomData;

use serde::{de, Deserializer, Serializer};

use crate::traits::{DeserializableFromArray, SerializableToArray};

pub(crate) enum Representation {
    Base64,
    Hex,
}

/// A helper function that will serialize a byte array efficiently
/// depending on whether the target format is text or binary based.
pub(crate) fn serde_serialize<T, S>(
    obj: &T,
    serializer: S,
    representation: Representation,
) -> Result<S::Ok, S::Error>
where
    T: SerializableToArray,
    S: Serializer,
{
    if serializer.is_human_readable() {
        let repr = match representation {
            Representation::Base64 => base64::encode(obj.to_array().as_ref()),
            Representation::Hex => hex::encode(obj.to_array().as_ref()),
        };
        serializer.serialize_str(&repr)
    } else {
        serializer.serialize_bytes(obj.to_array().as_ref())
    }
}

struct B64Visitor<T>(PhantomData<T>);

impl<'de, T> de::Visitor<'de> for B64Visitor<T>
where
    T: DeserializableFromArray,
{
    type Value = T;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "b64-encoded bytes")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        let bytes = base64::decode(v).map_err(de::Error::custom)?;
        T::from_bytes(&bytes).map_err(de::Error::custom)
    }
}

struct HexVisitor<T>(PhantomData<T>);

impl<'de, T> de::Visitor<'de> for HexVisitor<T>
where
    T: DeserializableFromArray,
{
    type Value = T;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "hex-encoded bytes")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        let bytes = hex::decode(v).map_err(de::Error::custom)?;
        T::from_bytes(&bytes).map_err(de::Error::custom)
    }
}

struct BytesVisitor<T>(PhantomData<T>);

impl<'de, T> de::Visitor<'de> for BytesVisitor<T>
where
    T: DeserializableFromArray,
{
    type Value = T;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = <T::Size as typenum::Unsigned>::to_usize();
        write!(formatter, "{} bytes", size)
    }

    fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        T::from_bytes(v).map_err(de::Error::custom)
    }
}

/// A helper function that will deserialize from a byte array,
/// matching the format used by [`serde_serialize`].
pub(crate) fn serde_deserialize<'de, T, D>(
    deserializer: D,
    representation: Representation,
) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializableFromArray,
{
    if deserializer.is_human_readable() {
        match representation {
            Representation::Base64 => deserializer.deserialize_str(B64Visitor::<T>(PhantomData)),
            Representation::Hex => deserializer.deserialize_str(HexVisitor::<T>(PhantomData)),
        }
    } else {
        deserializer.deserialize_bytes(BytesVisitor::<T>(PhantomData))
    }
}

#[cfg(test)]
pub(crate) mod tests {

    use alloc::format;
    use alloc::string::String;
    use core::fmt;

    use serde::de::DeserializeOwned;
    use serde::Serialize;

    use super::Representation;
    use crate::traits::{DeserializableFromArray, SerializableToArray};

    fn expected_text(bytes: &[u8], representation: &Representation) -> String {
        match representation {
            Representation::Base64 => format!("\"{}\"", base64::encode(bytes)),
            Representation::Hex => format!("\"{}\"", hex::encode(bytes)),
        }
    }

    /// A helper function that checks that serialization to a human-readable format
    /// uses the given representation, and that a binary format stores the raw bytes.
    pub(crate) fn check_serialization<T>(obj: &T, representation: Representation)
    where
        T: fmt::Debug + PartialEq + SerializableToArray + Serialize,
    {
        let bytes = obj.to_array();

        // Check serialization to JSON (human-readable)
        let serialized = serde_json::to_string(obj).unwrap();
        assert_eq!(serialized, expected_text(bytes.as_ref(), &representation));

        // Check serialization to MessagePack (binary)
        let serialized = rmp_serde::to_vec(obj).unwrap();
        assert!(serialized.ends_with(bytes.as_ref()));
    }

    pub(crate) fn check_deserialization<T>(obj: &T)
    where
        T: fmt::Debug + PartialEq + Serialize + DeserializeOwned + DeserializableFromArray,
    {
        // Check serialization to JSON (human-readable)
        let serialized = serde_json::to_string(obj).unwrap();
        let deserialized: T = serde_json::from_str(&serialized).unwrap();
        assert_eq!(obj, &deserialized);

        // Check serialization to MessagePack (binary)
        let serialized = rmp_serde::to_vec(obj).unwrap();
        let deserialized: T = rmp_serde::from_read_ref(&serialized).unwrap();
        assert_eq!(obj, &deserialized);
    }

    #[test]
    fn test_malformed_text_is_rejected() {
        use crate::dleq::CrossGroupDleqProof;

        let result: Result<CrossGroupDleqProof, _> = serde_json::from_str("\"not base64!\"");
        assert!(result.is_err());

        let result: Result<CrossGroupDleqProof, _> = serde_json::from_str("\"AAAA\"");
        assert!(result.is_err());

        // Correct length, but not a valid encoding of the proof's points.
        let bad = [0xffu8; 160];
        let result: Result<CrossGroupDleqProof, _> =
            serde_json::from_str(&expected_text(&bad, &Representation::Base64));
        assert!(result.is_err());
    }
}
