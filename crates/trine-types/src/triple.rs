use std::fmt;

use serde::{Deserialize, Serialize};

use crate::term::TermId;

/// Slot of a triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    Subject,
    Predicate,
    Object,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Subject => write!(f, "subject"),
            Position::Predicate => write!(f, "predicate"),
            Position::Object => write!(f, "object"),
        }
    }
}

/// A concrete (subject, predicate, object) fact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple {
    pub subject: TermId,
    pub predicate: TermId,
    pub object: TermId,
}

impl Triple {
    /// Create a triple from its three components.
    pub fn new(subject: TermId, predicate: TermId, object: TermId) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// The component stored at `position`.
    pub fn get(&self, position: Position) -> TermId {
        match position {
            Position::Subject => self.subject,
            Position::Predicate => self.predicate,
            Position::Object => self.object,
        }
    }

    /// The pattern that matches exactly this triple.
    pub fn as_pattern(&self) -> TriplePattern {
        TriplePattern::new(self.subject, self.predicate, self.object)
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.subject, self.predicate, self.object)
    }
}

impl From<(u32, u32, u32)> for Triple {
    fn from((s, p, o): (u32, u32, u32)) -> Self {
        Self::new(TermId::new(s), TermId::new(p), TermId::new(o))
    }
}

/// A triple pattern. Any position holding [`TermId::WILDCARD`] matches anything.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriplePattern {
    pub subject: TermId,
    pub predicate: TermId,
    pub object: TermId,
}

impl TriplePattern {
    /// Create a pattern from its three components.
    pub fn new(subject: TermId, predicate: TermId, object: TermId) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// Returns `true` if `triple` satisfies this pattern.
    pub fn matches(&self, triple: &Triple) -> bool {
        let slot = |pat: TermId, val: TermId| pat.is_wildcard() || pat == val;
        slot(self.subject, triple.subject)
            && slot(self.predicate, triple.predicate)
            && slot(self.object, triple.object)
    }

    /// The same pattern with its predicate replaced.
    pub fn with_predicate(self, predicate: TermId) -> Self {
        Self { predicate, ..self }
    }
}

impl fmt::Display for TriplePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.subject, self.predicate, self.object)
    }
}

impl From<(u32, u32, u32)> for TriplePattern {
    fn from((s, p, o): (u32, u32, u32)) -> Self {
        Self::new(TermId::new(s), TermId::new(p), TermId::new(o))
    }
}

impl From<Triple> for TriplePattern {
    fn from(triple: Triple) -> Self {
        triple.as_pattern()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ground_pattern_matches_only_itself() {
        let t = Triple::from((1, 2, 3));
        let p = t.as_pattern();
        assert!(p.matches(&t));
        assert!(!p.matches(&Triple::from((1, 2, 4))));
    }

    #[test]
    fn wildcard_positions_match_anything() {
        let p = TriplePattern::from((1, 2, 0));
        assert!(p.matches(&Triple::from((1, 2, 3))));
        assert!(p.matches(&Triple::from((1, 2, 99))));
        assert!(!p.matches(&Triple::from((5, 2, 3))));

        let any = TriplePattern::default();
        assert!(any.matches(&Triple::from((8, 9, 10))));
    }

    #[test]
    fn get_by_position() {
        let t = Triple::from((1, 2, 3));
        assert_eq!(t.get(Position::Subject), TermId::new(1));
        assert_eq!(t.get(Position::Predicate), TermId::new(2));
        assert_eq!(t.get(Position::Object), TermId::new(3));
    }

    #[test]
    fn display_format() {
        assert_eq!(Triple::from((1, 2, 3)).to_string(), "(#1 #2 #3)");
        assert_eq!(TriplePattern::from((1, 0, 3)).to_string(), "(#1 * #3)");
    }
}
