//! Trailing "getting started" section appended to every SDK docs response.

use pubnub_mcp_shared::{Credentials, DEMO_KEY};

/// Render the configuration section for the active keyset.
///
/// Samples in the fetched pages reference `PUBNUB_PUBLISH_KEY` and
/// `PUBNUB_SUBSCRIBE_KEY`; this section tells the reader what to put there.
pub fn configuration_snippet(credentials: &Credentials) -> String {
    let mut md = String::from("## Getting Started: PubNub Configuration\n\n");
    md.push_str(
        "Code samples above reference configuration names instead of inline keys. \
         Set them before running any sample:\n\n",
    );
    md.push_str(&format!("- `PUBNUB_PUBLISH_KEY`: `{}`\n", credentials.publish_key));
    md.push_str(&format!("- `PUBNUB_SUBSCRIBE_KEY`: `{}`\n", credentials.subscribe_key));

    if credentials.publish_key == DEMO_KEY || credentials.subscribe_key == DEMO_KEY {
        md.push_str(
            "\nThe `demo` keyset is shared and rate limited. Create your own keyset \
             in the PubNub Admin Portal for anything beyond experiments.\n",
        );
    }

    md.push_str(
        "\nEvery client must also set a stable, unique `userId` (or `uuid`) when it \
         initializes the SDK.\n",
    );
    md
}
