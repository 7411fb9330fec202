//! Macros for defining typed name types.

/// Macro to define a typed name with a human-readable kind.
///
/// This generates a newtype wrapper around `String` with:
/// - A `KIND` constant used in error messages
/// - `parse()` to validate from a string
/// - `as_str()` for borrowing the raw token
/// - `Display` and `FromStr` implementations
/// - `Serialize` and `Deserialize` implementations (validated on the way in)
/// - `Ord`, `Hash`, and other standard traits
///
/// # Example
///
/// ```ignore
/// define_name!(InstanceName, "instance");
///
/// let inst: InstanceName = "ORCL1".parse()?;
/// ```
#[macro_export]
macro_rules! define_name {
    ($name:ident, $kind:literal) => {
        /// A validated name for this object type.
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            /// The kind of object this name refers to.
            pub const KIND: &'static str = $kind;

            /// Parses a name from a string.
            ///
            /// Surrounding whitespace is trimmed; interior whitespace and
            /// commas are rejected.
            pub fn parse(s: &str) -> Result<Self, $crate::NameError> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err($crate::NameError::Empty { kind: Self::KIND });
                }

                if trimmed.chars().any(char::is_whitespace) {
                    return Err($crate::NameError::Whitespace {
                        kind: Self::KIND,
                        actual: trimmed.to_string(),
                    });
                }

                if trimmed.contains(',') {
                    return Err($crate::NameError::ListSeparator {
                        kind: Self::KIND,
                        actual: trimmed.to_string(),
                    });
                }

                Ok(Self(trimmed.to_string()))
            }

            /// Returns the raw name.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the name and returns the owned string.
            #[must_use]
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::NameError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::parse(&s).map_err(serde::de::Error::custom)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}
