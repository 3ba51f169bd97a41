use serde::{Deserialize, Serialize};
use std::fmt;

/// Range where lower bound is inclusive, upper bound is exclusive or unbounded.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range<T>(T, Option<T>);

impl<T> Range<T>
where
    T: Ord,
{
    pub const fn new_unchecked(from: T, to: Option<T>) -> Self {
        Range(from, to)
    }

    pub fn new(from: T, to: Option<T>) -> Self {
        if let Some(ref to) = to {
            if from >= *to {
                panic!("ranges must go from low to high")
            }
        }
        Range(from, to)
    }

    pub fn contains(&self, val: &T) -> bool {
        if let Some(end) = &self.1 {
            val >= &self.0 && val < end
        } else {
            val >= &self.0
        }
    }

    pub fn start(&self) -> &T {
        &self.0
    }

    pub fn end(&self) -> Option<&T> {
        self.1.as_ref()
    }
}

/// Ages are displayed with an inclusive upper bound, the way they are printed on the charts
/// (`0-9`, `60+`).
impl fmt::Display for Range<u16> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.1 {
            Some(end) => write!(f, "{}-{}", self.0, end - 1),
            None => write!(f, "{}+", self.0),
        }
    }
}
