//! Credential placeholder substitution.
//!
//! PubNub's published samples inline example keys. Generated code should point
//! at configuration names instead, so every literal example key is rewritten
//! to the matching environment-variable token.

/// `(example literal, replacement token)` pairs, applied in order.
pub const CREDENTIAL_PLACEHOLDERS: &[(&str, &str)] = &[
    ("myPublishKey", "PUBNUB_PUBLISH_KEY"),
    ("mySubscribeKey", "PUBNUB_SUBSCRIBE_KEY"),
];

/// Replace every example credential literal with its configuration token.
pub fn substitute_credentials(md: &str) -> String {
    CREDENTIAL_PLACEHOLDERS
        .iter()
        .fold(md.to_string(), |acc, (literal, token)| acc.replace(literal, token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_both_keys_everywhere() {
        let input = r#"new PubNub({ publishKey: "myPublishKey", subscribeKey: "mySubscribeKey" });
pubnub = PubNub(publish_key="myPublishKey")"#;
        let result = substitute_credentials(input);
        assert_eq!(
            result,
            r#"new PubNub({ publishKey: "PUBNUB_PUBLISH_KEY", subscribeKey: "PUBNUB_SUBSCRIBE_KEY" });
pubnub = PubNub(publish_key="PUBNUB_PUBLISH_KEY")"#
        );
    }

    #[test]
    fn substitution_is_idempotent() {
        let once = substitute_credentials("key: mySubscribeKey");
        assert_eq!(substitute_credentials(&once), once);
    }

    #[test]
    fn leaves_other_text_alone() {
        let input = "publishKey is required for publishing.";
        assert_eq!(substitute_credentials(input), input);
    }
}
