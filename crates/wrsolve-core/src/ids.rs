use serde::{Deserialize, Serialize};

macro_rules! define_id_type {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Get the inner u32 value.
            pub fn inner(self) -> u32 {
                self.0
            }

            /// Create an ID from a u32 value.
            pub fn new(value: u32) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// Index of a cycle within a simulation time step.
define_id_type!(CycleId);

#[cfg(test)]
mod tests {
    use super::CycleId;

    #[test]
    fn cycle_id_roundtrip() {
        let id = CycleId::new(7);
        assert_eq!(id.inner(), 7);
        assert_eq!(id.to_string(), "7");
    }

    #[test]
    fn cycle_id_is_transparent_in_json() {
        let ids: Vec<CycleId> = serde_json::from_str("[1, 3]").unwrap();
        assert_eq!(ids, vec![CycleId::new(1), CycleId::new(3)]);
    }
}
