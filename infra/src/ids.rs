use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::time::{SystemTime, UNIX_EPOCH};

use data_encoding::BASE64URL_NOPAD;
use err_derive::Error;
use rand::Rng;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// A store identifier for documents of type `T`.
///
/// Identifiers we mint ourselves look like `recipe-AAABkqZ1h3Pn0Q2bYv8aKw`,
/// but anything the store accepts as an id parses, so that documents written
/// by other clients remain addressable.
pub struct Id<T> {
    val: String,
    phantom: PhantomData<T>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdParseError {
    #[error(display = "Empty Id")]
    Empty,
    #[error(display = "Id contains reserved character {:?}", _0)]
    ReservedCharacter(char),
}

pub trait Entity {
    const PREFIX: &'static str;
}

const DIVIDER: &str = "-";
// Cosmos refuses these in document ids.
const RESERVED: &[char] = &['/', '\\', '?', '#'];

#[derive(Debug, Default, Clone)]
pub struct IdGen {
    _priv: (),
}

impl IdGen {
    pub fn new() -> Self {
        IdGen { _priv: () }
    }

    pub fn generate<T: Entity>(&self) -> Id<T> {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        let random: u64 = rand::thread_rng().gen();

        let mut val = [0u8; 16];
        val[..8].copy_from_slice(&stamp.to_be_bytes());
        val[8..].copy_from_slice(&random.to_be_bytes());

        let val = format!("{}{}{}", T::PREFIX, DIVIDER, BASE64URL_NOPAD.encode(&val));
        Id {
            val,
            phantom: PhantomData,
        }
    }
}

impl<T> Id<T> {
    /// Ids are empty until the store assigns one.
    pub fn is_unassigned(&self) -> bool {
        self.val.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.val
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(&self.val)
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_tuple("Id").field(&self.val).finish()
    }
}

impl<T> std::str::FromStr for Id<T> {
    type Err = IdParseError;
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        if src.is_empty() {
            return Err(IdParseError::Empty);
        }
        if let Some(c) = src.chars().find(|c| RESERVED.contains(c)) {
            return Err(IdParseError::ReservedCharacter(c));
        }
        Ok(Id {
            val: src.to_string(),
            phantom: PhantomData,
        })
    }
}

impl<T> Default for Id<T> {
    fn default() -> Self {
        Id {
            val: String::new(),
            phantom: PhantomData,
        }
    }
}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.val.hash(state)
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.val == other.val
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.val.cmp(&other.val)
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Id {
            val: self.val.clone(),
            phantom: PhantomData,
        }
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.val)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdStrVisitor<T>(PhantomData<T>);
        impl<'vi, T> de::Visitor<'vi> for IdStrVisitor<T> {
            type Value = Id<T>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(formatter, "an Id string")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Id<T>, E> {
                value.parse::<Id<T>>().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(IdStrVisitor(PhantomData))
    }
}
