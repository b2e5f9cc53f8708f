use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A theme or background token that is not part of the known set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} token: {token}")]
pub struct UnknownToken {
    pub kind: &'static str,
    pub token: String,
}

/// Declares a lowercase string-token enum stored as TEXT.
macro_rules! token_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident => $token:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            #[default]
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every token in display order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Returns the wire token.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $token),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownToken;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($token => Ok($name::$variant),)+
                    _ => Err(UnknownToken {
                        kind: $kind,
                        token: s.to_string(),
                    }),
                }
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

token_enum!(
    /// Cover theme of a notebook card.
    NotebookTheme, "notebook theme" {
        Default => "default",
        Blue => "blue",
        Green => "green",
        Purple => "purple",
        Orange => "orange",
        Red => "red",
        Pink => "pink",
        Teal => "teal",
    }
);

token_enum!(
    /// Paper background of a note page.
    NoteBackground, "note background" {
        Default => "default",
        Parchment => "parchment",
        /// Blue-to-purple gradient.
        Gradient => "gradient",
        Green => "green",
        Pink => "pink",
        Teal => "teal",
        Gray => "gray",
        Yellow => "yellow",
    }
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_serializes_to_lowercase_token() {
        let json = serde_json::to_string(&NotebookTheme::Purple).unwrap();
        assert_eq!(json, r#""purple""#);

        let parsed: NotebookTheme = serde_json::from_str(r#""teal""#).unwrap();
        assert_eq!(parsed, NotebookTheme::Teal);
    }

    #[test]
    fn background_deserialization_fails_on_unknown_token() {
        let result: Result<NoteBackground, _> = serde_json::from_str(r#""plaid""#);
        assert!(result.is_err());
    }

    #[test]
    fn from_str_is_case_insensitive() {
        assert_eq!("Parchment".parse::<NoteBackground>(), Ok(NoteBackground::Parchment));
        let err = "neon".parse::<NotebookTheme>().unwrap_err();
        assert_eq!(err.to_string(), "unknown notebook theme token: neon");
    }

    #[test]
    fn defaults_are_default_token() {
        assert_eq!(NotebookTheme::default().as_str(), "default");
        assert_eq!(NoteBackground::default().as_str(), "default");
        assert_eq!(NoteBackground::ALL.len(), 8);
        assert_eq!(NotebookTheme::ALL.len(), 8);
    }
}
