use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Dense identifier for an interned term.
///
/// Ids are assigned sequentially by the interner starting at `1` and are
/// never reused. The value `0` is reserved: in a query position it means
/// "match anything", and it is never a valid component of a stored triple.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermId(u32);

impl TermId {
    /// The wildcard / absent id.
    pub const WILDCARD: TermId = TermId(0);

    /// The first id an interner hands out.
    pub const FIRST: TermId = TermId(1);

    /// Wrap a raw id.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw 32-bit value.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The id as a bit position / slot index.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns `true` if this is the wildcard id.
    pub const fn is_wildcard(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_wildcard() {
            write!(f, "TermId(*)")
        } else {
            write!(f, "TermId({})", self.0)
        }
    }
}

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_wildcard() {
            write!(f, "*")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

impl From<u32> for TermId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<TermId> for u32 {
    fn from(id: TermId) -> Self {
        id.0
    }
}

impl FromStr for TermId {
    type Err = TypeError;

    /// Parses `*` as the wildcard and `42` or `#42` as a concrete id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "*" {
            return Ok(TermId::WILDCARD);
        }
        let digits = s.strip_prefix('#').unwrap_or(s);
        digits
            .parse::<u32>()
            .map(TermId)
            .map_err(|e| TypeError::InvalidTermId(format!("{s}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_is_zero() {
        assert!(TermId::WILDCARD.is_wildcard());
        assert_eq!(TermId::WILDCARD.get(), 0);
        assert_eq!(TermId::default(), TermId::WILDCARD);
        assert!(!TermId::FIRST.is_wildcard());
    }

    #[test]
    fn display_and_debug() {
        assert_eq!(format!("{}", TermId::new(7)), "#7");
        assert_eq!(format!("{}", TermId::WILDCARD), "*");
        assert_eq!(format!("{:?}", TermId::new(7)), "TermId(7)");
        assert_eq!(format!("{:?}", TermId::WILDCARD), "TermId(*)");
    }

    #[test]
    fn parse_forms() {
        assert_eq!("42".parse::<TermId>().unwrap(), TermId::new(42));
        assert_eq!("#42".parse::<TermId>().unwrap(), TermId::new(42));
        assert_eq!("*".parse::<TermId>().unwrap(), TermId::WILDCARD);
        assert!(matches!(
            "abc".parse::<TermId>(),
            Err(TypeError::InvalidTermId(_))
        ));
    }

    #[test]
    fn ordering_follows_raw_value() {
        assert!(TermId::new(1) < TermId::new(2));
    }

    #[test]
    fn serde_is_transparent() {
        let json = serde_json::to_string(&TermId::new(9)).unwrap();
        assert_eq!(json, "9");
        let parsed: TermId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, TermId::new(9));
    }
}
