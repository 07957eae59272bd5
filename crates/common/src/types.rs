use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of an event stream.
///
/// A stream id is the aggregate identity: a UUID string for orders,
/// a catalogue id (e.g. `prod-001`) for inventory, a caller-supplied
/// id for carts. Wrapping the string prevents mixing stream ids with
/// other string-based values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(String);

impl StreamId {
    /// Creates a stream id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for StreamId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for StreamId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<Uuid> for StreamId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid.to_string())
    }
}

impl AsRef<str> for StreamId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Error returned when a stored stream-type string is not recognised.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown stream type: {0}")]
pub struct UnknownStreamType(pub String);

/// The kind of aggregate a stream belongs to.
///
/// The set is closed: every stream in the store is one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamType {
    Order,
    Inventory,
    Cart,
}

impl StreamType {
    /// Returns the stream type as stored in the `events.stream_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamType::Order => "order",
            StreamType::Inventory => "inventory",
            StreamType::Cart => "cart",
        }
    }

    /// Parses a stored stream-type string.
    pub fn parse(s: &str) -> Result<Self, UnknownStreamType> {
        match s {
            "order" => Ok(StreamType::Order),
            "inventory" => Ok(StreamType::Inventory),
            "cart" => Ok(StreamType::Cart),
            other => Err(UnknownStreamType(other.to_string())),
        }
    }
}

impl std::fmt::Display for StreamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for StreamType {
    type Err = UnknownStreamType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
