//! Fixed request enumerations.
//!
//! These identifiers are part of the tool contract: clients send them verbatim
//! and they are templated verbatim into documentation URLs and file names, so
//! the string forms must never change.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// EnumParseError
// ---------------------------------------------------------------------------

/// Returned when a string is not a member of a fixed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value '{value}' (expected one of: {})", .allowed.join(", "))]
pub struct EnumParseError {
    /// The rejected input.
    pub value: String,
    /// Every accepted value, in declaration order.
    pub allowed: Vec<&'static str>,
}

/// Declares a closed string enumeration with `ALL`, `as_str`, `Display` and `FromStr`.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Every member, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The wire identifier.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            /// Wire identifiers of every member, in declaration order.
            pub fn names() -> Vec<&'static str> {
                Self::ALL.iter().map(|v| v.as_str()).collect()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = EnumParseError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| EnumParseError {
                        value: s.to_string(),
                        allowed: Self::names(),
                    })
            }
        }
    };
}

string_enum! {
    /// SDK language whose documentation variant is fetched and merged.
    SdkLanguage {
        JavaScript => "javascript",
        Python => "python",
        Java => "java",
        Go => "go",
        Ruby => "ruby",
        Swift => "swift",
        ObjectiveC => "objective-c",
        CSharp => "c-sharp",
        Php => "php",
        Rust => "rust",
        Unity => "unity",
        Kotlin => "kotlin",
        Unreal => "unreal",
        Dart => "dart",
    }
}

string_enum! {
    /// API-reference section of an SDK's documentation.
    ApiTopic {
        Configuration => "configuration",
        PublishAndSubscribe => "publish-and-subscribe",
        Presence => "presence",
        AccessManager => "access-manager",
        ChannelGroups => "channel-groups",
        StorageAndPlayback => "storage-and-playback",
        MobilePush => "mobile-push",
        Objects => "objects",
        Files => "files",
        MessageActions => "message-actions",
        Misc => "misc",
        /// Served from a local file instead of the remote reference page.
        Functions => "functions",
    }
}

impl Default for ApiTopic {
    fn default() -> Self {
        Self::Configuration
    }
}

impl ApiTopic {
    /// Whether this topic's content lives only in a local file.
    pub const fn is_local_only(self) -> bool {
        matches!(self, Self::Functions)
    }
}

string_enum! {
    /// Kind of application the `write_pubnub_app` instructions target.
    AppType {
        Default => "default",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_parses_hyphenated_identifiers() {
        assert_eq!("objective-c".parse::<SdkLanguage>(), Ok(SdkLanguage::ObjectiveC));
        assert_eq!("c-sharp".parse::<SdkLanguage>(), Ok(SdkLanguage::CSharp));
        assert_eq!(SdkLanguage::JavaScript.to_string(), "javascript");
    }

    #[test]
    fn language_rejects_unknown_value() {
        let err = "haskell".parse::<SdkLanguage>().unwrap_err();
        assert_eq!(err.value, "haskell");
        assert_eq!(err.allowed.len(), 14);
        assert!(err.to_string().contains("invalid value 'haskell'"));
        assert!(err.to_string().contains("javascript, python"));
    }

    #[test]
    fn parsing_is_case_sensitive() {
        assert!("JavaScript".parse::<SdkLanguage>().is_err());
    }

    #[test]
    fn topic_default_is_configuration() {
        assert_eq!(ApiTopic::default(), ApiTopic::Configuration);
        assert_eq!(ApiTopic::ALL.len(), 12);
    }

    #[test]
    fn only_functions_is_local_only() {
        let local: Vec<_> = ApiTopic::ALL.iter().filter(|t| t.is_local_only()).collect();
        assert_eq!(local, vec![&ApiTopic::Functions]);
    }

    #[test]
    fn serde_uses_wire_identifiers() {
        let json = serde_json::to_string(&ApiTopic::StorageAndPlayback).expect("serialize");
        assert_eq!(json, "\"storage-and-playback\"");
        let parsed: SdkLanguage = serde_json::from_str("\"c-sharp\"").expect("deserialize");
        assert_eq!(parsed, SdkLanguage::CSharp);
    }

    #[test]
    fn app_type_has_single_member() {
        assert_eq!(AppType::names(), vec!["default"]);
        assert!("chat".parse::<AppType>().is_err());
    }
}
