use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error type for parsing an ID from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new id from its raw value.
            #[must_use]
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            /// Returns the underlying u64 value.
            #[must_use]
            pub fn value(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<u64>().map($name::new).map_err(|_| ParseIdError {
                    kind: stringify!($name),
                })
            }
        }
    };
}

define_id!(
    /// Unique identifier for a Test.
    TestId
);
define_id!(
    /// Unique identifier for a Question.
    QuestionId
);
define_id!(
    /// Unique identifier for a TestResult (one attempt at one test).
    ResultId
);
define_id!(
    /// Unique identifier for a stored Answer.
    AnswerId
);
define_id!(
    /// Unique identifier for a User.
    UserId
);
define_id!(
    /// Unique identifier for a Category.
    CategoryId
);

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        let id = TestId::new(42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_id_from_str() {
        let id: TestId = "123".parse().unwrap();
        assert_eq!(id, TestId::new(123));
    }

    #[test]
    fn test_id_from_str_invalid() {
        let result = "not-a-number".parse::<QuestionId>();
        assert!(result.is_err());
    }

    #[test]
    fn result_id_roundtrip() {
        let original = ResultId::new(7);
        let deserialized: ResultId = original.to_string().parse().unwrap();
        assert_eq!(original, deserialized);
    }

    #[test]
    fn debug_includes_type_name() {
        assert_eq!(format!("{:?}", CategoryId::new(3)), "CategoryId(3)");
    }
}
