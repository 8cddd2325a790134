use std::fmt;

use smol_str::SmolStr;

macro_rules! definition_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(pub SmolStr);

        impl $name {
            pub fn new(name: impl AsRef<str>) -> Self {
                Self(SmolStr::new(name.as_ref()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }
    };
}

definition_id!(
    /// Identifies an effect definition; also the "source" of every active
    /// effect created from it.
    EffectId
);

definition_id!(
    /// Identifies an ability definition.
    AbilityId
);

definition_id!(
    /// Identifies an item definition.
    ItemDefId
);
