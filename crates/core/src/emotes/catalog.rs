use std::collections::{BTreeSet, HashMap};

use serde::Deserialize;

use super::TWITCH_GLOBALS;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("catalog returned status {0}")]
    Status(u16),
}

/// Source of the emote names a channel can use.
#[async_trait::async_trait]
pub trait EmoteCatalog: Send + Sync {
    async fn load(&self, channel: &str) -> Result<Vec<String>, CatalogError>;
}

/// Twitch global emotes only. Never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinCatalog;

#[async_trait::async_trait]
impl EmoteCatalog for BuiltinCatalog {
    async fn load(&self, _channel: &str) -> Result<Vec<String>, CatalogError> {
        Ok(TWITCH_GLOBALS.iter().map(|e| (*e).to_owned()).collect())
    }
}

// ── third-party payloads ──

#[derive(Deserialize)]
struct SevenTvUser {
    #[serde(default)]
    emote_set: Option<SevenTvSet>,
}

#[derive(Deserialize)]
struct SevenTvSet {
    #[serde(default)]
    emotes: Vec<Named>,
}

#[derive(Deserialize)]
struct Named {
    name: String,
}

#[derive(Deserialize)]
struct BttvEmote {
    code: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BttvChannel {
    #[serde(default)]
    channel_emotes: Vec<BttvEmote>,
    #[serde(default)]
    shared_emotes: Vec<BttvEmote>,
}

#[derive(Deserialize)]
struct FfzRoom {
    #[serde(default)]
    sets: HashMap<String, FfzSet>,
}

#[derive(Deserialize)]
struct FfzSet {
    #[serde(default)]
    emoticons: Vec<Named>,
}

const SEVENTV_BASE: &str = "https://7tv.io/v3";
const BTTV_BASE: &str = "https://api.betterttv.net/3";
const FFZ_BASE: &str = "https://api.frankerfacez.com/v1";

/// 7TV + BTTV + FFZ channel sets on top of the Twitch globals.
///
/// A failing source is logged and skipped; the globals are always included.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: reqwest::Client,
}

impl HttpCatalog {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { client }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, CatalogError> {
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(CatalogError::Status(resp.status().as_u16()));
        }
        Ok(resp.json().await?)
    }

    async fn seventv(&self, login: &str) -> Result<Vec<String>, CatalogError> {
        let user: SevenTvUser = self.get_json(&format!("{SEVENTV_BASE}/users/twitch/{login}")).await?;
        Ok(user
            .emote_set
            .map(|s| s.emotes.into_iter().map(|e| e.name).collect())
            .unwrap_or_default())
    }

    async fn bttv(&self, login: &str) -> Result<Vec<String>, CatalogError> {
        let global: Vec<BttvEmote> = self.get_json(&format!("{BTTV_BASE}/cached/emotes/global")).await?;
        let mut out: Vec<String> = global.into_iter().map(|e| e.code).collect();
        match self
            .get_json::<BttvChannel>(&format!("{BTTV_BASE}/cached/users/twitch/{login}"))
            .await
        {
            Ok(ch) => out.extend(ch.channel_emotes.into_iter().chain(ch.shared_emotes).map(|e| e.code)),
            Err(e) => tracing::debug!(channel = %login, error = %e, "bttv channel emotes unavailable"),
        }
        Ok(out)
    }

    async fn ffz(&self, login: &str) -> Result<Vec<String>, CatalogError> {
        let room: FfzRoom = self.get_json(&format!("{FFZ_BASE}/room/{login}")).await?;
        Ok(room
            .sets
            .into_values()
            .flat_map(|s| s.emoticons.into_iter().map(|e| e.name))
            .collect())
    }
}

impl Default for HttpCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EmoteCatalog for HttpCatalog {
    async fn load(&self, channel: &str) -> Result<Vec<String>, CatalogError> {
        let login = channel.trim_start_matches('#').to_lowercase();
        let (seventv, bttv, ffz) =
            tokio::join!(self.seventv(&login), self.bttv(&login), self.ffz(&login));

        let mut all: BTreeSet<String> = TWITCH_GLOBALS.iter().map(|e| (*e).to_owned()).collect();
        for (source, result) in [("7tv", seventv), ("bttv", bttv), ("ffz", ffz)] {
            match result {
                Ok(list) => {
                    tracing::debug!(channel = %login, source, count = list.len(), "emotes loaded");
                    all.extend(list);
                }
                Err(e) => tracing::debug!(channel = %login, source, error = %e, "emote source failed"),
            }
        }
        Ok(all.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builtin_returns_globals() {
        let list = BuiltinCatalog.load("#any").await.unwrap();
        assert!(list.contains(&"Kappa".to_owned()));
        assert_eq!(list.len(), TWITCH_GLOBALS.len());
    }

    #[test]
    fn parses_seventv_payload() {
        let json = r#"{"id":"x","emote_set":{"id":"s","emotes":[{"name":"catJAM","id":"1"},{"name":"EZ"}]}}"#;
        let user: SevenTvUser = serde_json::from_str(json).unwrap();
        let names: Vec<_> = user.emote_set.unwrap().emotes.into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["catJAM", "EZ"]);
    }

    #[test]
    fn parses_bttv_channel_payload() {
        let json = r#"{"id":"1","channelEmotes":[{"code":"pepeD"}],"sharedEmotes":[{"code":"Clap"}]}"#;
        let ch: BttvChannel = serde_json::from_str(json).unwrap();
        assert_eq!(ch.channel_emotes[0].code, "pepeD");
        assert_eq!(ch.shared_emotes[0].code, "Clap");
    }

    #[test]
    fn parses_ffz_payload() {
        let json = r#"{"room":{},"sets":{"123":{"emoticons":[{"name":"OMEGALUL"}]}}}"#;
        let room: FfzRoom = serde_json::from_str(json).unwrap();
        assert_eq!(room.sets["123"].emoticons[0].name, "OMEGALUL");
    }

    #[test]
    fn missing_sets_default_to_empty() {
        let user: SevenTvUser = serde_json::from_str(r#"{"id":"x"}"#).unwrap();
        assert!(user.emote_set.is_none());
        let room: FfzRoom = serde_json::from_str("{}").unwrap();
        assert!(room.sets.is_empty());
    }
}
