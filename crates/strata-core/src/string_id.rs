use std::fmt;

use ahash::RandomState;

/// Hashed identifier for names that are compared often but printed rarely
/// (command names, provider names).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct StringId(pub u64);

impl StringId {
    pub fn new(s: &str) -> Self {
        // Fixed seeds so ids are stable for the whole process and across runs.
        let state = RandomState::with_seeds(
            0x9e37_79b9_7f4a_7c15,
            0xc2b2_ae3d_27d4_eb4f,
            0x1656_67b1_9e37_79f9,
            0x85eb_ca77_c2b2_ae63,
        );
        StringId(state.hash_one(s))
    }
}

impl From<&str> for StringId {
    fn from(s: &str) -> Self {
        StringId::new(s)
    }
}

impl fmt::Debug for StringId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StringId({:#018x})", self.0)
    }
}
