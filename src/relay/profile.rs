//! Kind-0 profile metadata for player wallets

use serde::{Deserialize, Serialize};

use crate::wallet::KeyMaterial;

use super::{RelayError, SignedEvent, Tag, UnsignedEvent, KIND_METADATA};

/// Profile fields published as the content of a metadata event.
///
/// `tags_t` and `tags_o` are comma-separated interest lists; they become
/// event tags instead of content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileMetadata {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub about: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nip05: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_link: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub lanoshi2lash: String,
    /// Address of the wallet this profile belongs to
    #[serde(rename = "lanaWalletID", default)]
    pub lana_wallet_id: String,
    #[serde(rename = "whoAreYou", default)]
    pub who_are_you: String,
    #[serde(default)]
    pub statement_of_responsibility: String,
    #[serde(default, skip_serializing)]
    pub tags_t: String,
    #[serde(default, skip_serializing)]
    pub tags_o: String,
}

fn split_tags<'a>(name: &'static str, list: &'a str) -> impl Iterator<Item = Tag> + 'a {
    list.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(move |tag| vec![name.to_string(), tag.to_string()])
}

impl ProfileMetadata {
    /// `["t", x]` tags followed by `["o", x]` tags
    pub fn tags(&self) -> Vec<Tag> {
        split_tags("t", &self.tags_t)
            .chain(split_tags("o", &self.tags_o))
            .collect()
    }

    pub fn content(&self) -> Result<String, RelayError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Signed kind-0 event for `key`. The wallet id defaults to the key's
    /// own address when left empty.
    pub fn to_event(&self, key: &KeyMaterial) -> Result<SignedEvent, RelayError> {
        let mut profile = self.clone();
        if profile.lana_wallet_id.is_empty() {
            profile.lana_wallet_id = key.address().to_string();
        }
        UnsignedEvent::new(
            *key.relay_identity(),
            KIND_METADATA,
            profile.tags(),
            profile.content()?,
        )
        .sign(key)
    }
}
