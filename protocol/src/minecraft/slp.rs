use serde::{Deserialize, Serialize};

/// JSON payload of a modern server-list-ping status response.
#[derive(Serialize, Deserialize, Debug)]
pub struct PingPayload {
    pub version: VersionPayload,
    pub players: PlayersPayload,
    #[serde(with = "description_serde")]
    pub description: String,
}

impl PingPayload {
    /// Names from the player sample. The server picks which players appear
    /// here and in what order; callers wanting determinism must sort.
    pub fn player_names(&self) -> Vec<String> {
        self.players
            .sample
            .iter()
            .map(|p| p.name.clone())
            .collect()
    }
}

// The description is either a bare string or a chat object with a "text"
// field, depending on server version.
mod description_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S>(value: &String, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::String(s) => Ok(s),
            Value::Object(obj) => Ok(obj["text"].as_str().unwrap_or("").to_string()),
            _ => Ok("".to_string()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct VersionPayload {
    pub protocol: i32,
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PlayersPayload {
    pub max: i32,
    pub online: i32,
    #[serde(default)]
    pub sample: Vec<PlayerSample>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PlayerSample {
    pub name: String,
    pub id: uuid::Uuid,
}
