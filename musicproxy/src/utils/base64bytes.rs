use serde::{Deserialize, Serialize};
use serde::{Deserializer, Serializer};

/// Binary payload carried through json-rpc as a base64 string
#[derive(Debug, Clone, PartialEq)]
pub struct Base64Byte(pub Vec<u8>);

impl Base64Byte {
    pub fn new(data: Vec<u8>) -> Self {
        Base64Byte(data)
    }
}

impl From<Base64Byte> for Vec<u8> {
    fn from(val: Base64Byte) -> Self {
        val.0
    }
}

impl Serialize for Base64Byte {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(base64::encode(&self.0).as_str())
    }
}

impl<'de> Deserialize<'de> for Base64Byte {
    fn deserialize<D>(deserializer: D) -> Result<Base64Byte, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes_str = <String>::deserialize(deserializer)?;
        base64::decode(bytes_str)
            .map(Base64Byte)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reject_invalid_base64() {
        assert!(serde_json::from_str::<Base64Byte>("\"not base64!\"").is_err());
        let b: Base64Byte = serde_json::from_str("\"aGVsbG8=\"").unwrap();
        assert_eq!(Vec::<u8>::from(b), b"hello".to_vec());
    }
}
