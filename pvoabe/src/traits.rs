use alloc::format;
use alloc::string::String;
use core::fmt;
use core::ops::Sub;

use generic_array::sequence::Split;
use generic_array::{ArrayLength, GenericArray};
use typenum::{Diff, Unsigned, U4};

/// Errors that can happen during object construction from byte representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    /// An error indicating that the bytes do not encode a valid object of the given type.
    InvalidValue(String),
}

impl ConstructionError {
    /// Creates a new `ConstructionError::InvalidValue`.
    pub fn invalid_value(type_name: &str, message: &str) -> Self {
        Self::InvalidValue(format!("{}: {}", type_name, message))
    }
}

impl fmt::Display for ConstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue(message) => write!(f, "Invalid value: {}", message),
        }
    }
}

/// The size of a given byte slice does not match the expected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeMismatchError {
    received_size: usize,
    expected_size: usize,
}

impl SizeMismatchError {
    /// Creates a new `SizeMismatchError`.
    pub fn new(received_size: usize, expected_size: usize) -> Self {
        Self {
            received_size,
            expected_size,
        }
    }
}

impl fmt::Display for SizeMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bytestring size mismatch: expected {} bytes, got {}",
            self.expected_size, self.received_size
        )
    }
}

/// Errors that can happen during deserialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeserializationError {
    /// Failed to construct the object from a given bytestring (with the correct length).
    ConstructionFailure(ConstructionError),
    /// The given bytestring is too short or too long.
    SizeMismatch(SizeMismatchError),
}

impl fmt::Display for DeserializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConstructionFailure(err) => write!(f, "{}", err),
            Self::SizeMismatch(err) => write!(f, "{}", err),
        }
    }
}

/// A type with a fixed-size canonical byte representation.
pub trait RepresentableAsArray: Sized {
    /// Resulting array length.
    type Size: ArrayLength<u8>;

    /// Resulting array length exposed as a runtime method.
    fn serialized_size() -> usize {
        Self::Size::to_usize()
    }
}

/// A trait denoting that the object can be serialized to an array of bytes
/// with size known at compile time.
pub trait SerializableToArray: RepresentableAsArray {
    /// Produces a byte array with the object's contents.
    fn to_array(&self) -> GenericArray<u8, Self::Size>;
}

/// A trait denoting that the object can be deserialized from an array of bytes
/// with size known at compile time.
pub trait DeserializableFromArray: RepresentableAsArray {
    /// Attempts to produce the object back from the serialized form.
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, ConstructionError>;

    /// Attempts to produce the object back from a dynamically sized byte array,
    /// checking that its length is correct.
    fn from_bytes(data: impl AsRef<[u8]>) -> Result<Self, DeserializationError> {
        let data_slice = data.as_ref();
        let received_size = data_slice.len();
        let expected_size = Self::serialized_size();
        if received_size != expected_size {
            return Err(DeserializationError::SizeMismatch(SizeMismatchError::new(
                received_size,
                expected_size,
            )));
        }
        Self::from_array(GenericArray::<u8, Self::Size>::from_slice(data_slice))
            .map_err(DeserializationError::ConstructionFailure)
    }

    /// Used to implement [`from_array()`](`Self::from_array()`) for structs whose fields
    /// implement [`SerializableToArray`].
    ///
    /// Attempts to split off enough bytes from `arr` to call
    /// [`from_array()`](`Self::from_array()`),
    /// and if it succeeds, returns the resulting object and the rest of the array.
    #[allow(clippy::type_complexity)]
    fn take<U>(
        arr: GenericArray<u8, U>,
    ) -> Result<(Self, GenericArray<u8, Diff<U, Self::Size>>), ConstructionError>
    where
        U: ArrayLength<u8> + Sub<Self::Size>,
        Diff<U, Self::Size>: ArrayLength<u8>,
    {
        let (res_bytes, rest) = Split::<u8, Self::Size>::split(arr);
        let maybe_res = Self::from_array(&res_bytes);
        maybe_res.map(|res| (res, rest))
    }

    /// A variant of [`take()`](`Self::take()`) to be called for the last field of the struct,
    /// where no remainder of the array is expected.
    fn take_last(arr: GenericArray<u8, Self::Size>) -> Result<Self, ConstructionError> {
        Self::from_array(&arr)
    }
}

impl RepresentableAsArray for u32 {
    type Size = U4;
}

impl SerializableToArray for u32 {
    fn to_array(&self) -> GenericArray<u8, Self::Size> {
        GenericArray::<u8, Self::Size>::clone_from_slice(&self.to_be_bytes())
    }
}

impl DeserializableFromArray for u32 {
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, ConstructionError> {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(arr.as_slice());
        Ok(u32::from_be_bytes(bytes))
    }
}

/// Provides a name of the type, used in `Display` impls and error messages.
pub trait HasTypeName {
    /// Returns a string with the name of the type.
    fn type_name() -> &'static str;
}

/// Formats a public object as `TypeName:<hex of the first 8 bytes>`.
pub(crate) fn fmt_public<T>(obj: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result
where
    T: SerializableToArray + HasTypeName,
{
    let bytes = obj.to_array();
    let to_show = core::cmp::min(bytes.len(), 8);
    let mut hex_repr = [b'*'; 16]; // exactly 16 bytes long, to fit the encode() result
    hex::encode_to_slice(&bytes[..to_show], &mut hex_repr[..to_show * 2])
        .map_err(|_| fmt::Error)?;
    write!(
        f,
        "{}:{}",
        T::type_name(),
        String::from_utf8_lossy(&hex_repr[..to_show * 2])
    )
}

#[cfg(test)]
mod tests {

    use generic_array::sequence::Concat;
    use generic_array::GenericArray;
    use typenum::U12;

    use super::{
        ConstructionError, DeserializableFromArray, DeserializationError, RepresentableAsArray,
        SerializableToArray, SizeMismatchError,
    };

    #[derive(Debug, PartialEq)]
    struct SomeStruct {
        f1: u32,
        f2: u32,
        f3: u32,
    }

    impl RepresentableAsArray for SomeStruct {
        type Size = U12;
    }

    impl SerializableToArray for SomeStruct {
        fn to_array(&self) -> GenericArray<u8, Self::Size> {
            self.f1
                .to_array()
                .concat(self.f2.to_array())
                .concat(self.f3.to_array())
        }
    }

    impl DeserializableFromArray for SomeStruct {
        fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, ConstructionError> {
            let (f1, rest) = u32::take(*arr)?;
            let (f2, rest) = u32::take(rest)?;
            let f3 = u32::take_last(rest)?;
            Ok(Self { f1, f2, f3 })
        }
    }

    #[test]
    fn test_take_fields_in_order() {
        let s = SomeStruct {
            f1: 1,
            f2: 0xdead_beef,
            f3: 3,
        };
        let arr = s.to_array();
        assert_eq!(&arr[4..8], &[0xde, 0xad, 0xbe, 0xef]);
        let s_back = SomeStruct::from_array(&arr).unwrap();
        assert_eq!(s, s_back);
    }

    #[test]
    fn test_from_bytes_size_mismatch() {
        let s = SomeStruct { f1: 1, f2: 2, f3: 3 };
        let mut bytes = s.to_array().to_vec();
        bytes.push(0);
        let err = SomeStruct::from_bytes(&bytes).unwrap_err();
        assert_eq!(
            err,
            DeserializationError::SizeMismatch(SizeMismatchError::new(13, 12))
        );
    }
}
