use lasso::{Spur, ThreadedRodeo};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for part keys.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// A lightweight, interned key for lifelines, activations, and messages.
/// Internally a 4-byte `Spur` index, so equality and hashing are O(1).
///
/// Documents may key their parts with strings or integers. Both are
/// interned by their textual form; keys whose text is a canonical integer
/// serialize back as JSON numbers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartKey(Spur);

impl PartKey {
    /// Intern a new string as a PartKey, or return existing if already interned.
    pub fn intern(s: &str) -> Self {
        PartKey(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &'static str {
        INTERNER.resolve(&self.0)
    }

    /// Generate a unique key with a type prefix (e.g. `msg_1`, `act_2`).
    pub fn with_prefix(prefix: &str) -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        Self::intern(&format!("{prefix}_{n}"))
    }

    /// The key as an integer, if its text is a canonical integer.
    fn as_integer(&self) -> Option<i64> {
        let s = self.as_str();
        s.parse::<i64>().ok().filter(|n| n.to_string() == s)
    }
}

impl fmt::Debug for PartKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for PartKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PartKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_integer() {
            Some(n) => serializer.serialize_i64(n),
            None => serializer.serialize_str(self.as_str()),
        }
    }
}

struct PartKeyVisitor;

impl Visitor<'_> for PartKeyVisitor {
    type Value = PartKey;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or integer key")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<PartKey, E> {
        Ok(PartKey::intern(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<PartKey, E> {
        Ok(PartKey::intern(&v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<PartKey, E> {
        Ok(PartKey::intern(&v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<PartKey, E> {
        if v.fract() == 0.0 && v.is_finite() {
            Ok(PartKey::intern(&(v as i64).to_string()))
        } else {
            Ok(PartKey::intern(&v.to_string()))
        }
    }
}

impl<'de> Deserialize<'de> for PartKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PartKeyVisitor)
    }
}
