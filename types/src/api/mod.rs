use ola_basic_types::{MiniblockNumber, U64};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Block selector for `eth_*` state queries.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlockNumber {
    Latest,
    Number(U64),
}

impl From<MiniblockNumber> for BlockNumber {
    fn from(number: MiniblockNumber) -> Self {
        Self::Number(U64::from(number.0))
    }
}

impl Serialize for BlockNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Latest => serializer.serialize_str("latest"),
            Self::Number(number) => number.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for BlockNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == "latest" {
            return Ok(Self::Latest);
        }
        let number = U64::deserialize(serde::de::value::StrDeserializer::<D::Error>::new(&raw))?;
        Ok(Self::Number(number))
    }
}
