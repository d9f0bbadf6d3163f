use serde::Deserialize;
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;
use uuid::Uuid;

/// File name of the registration namespace inside the state directory.
const STORE_FILE_NAME: &str = "starflight.toml";

/// Everything the client persists between runs. Tag lists and the opened
/// message log are stored comma-joined, matching the wire encoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredState {
    pub registration_token: Option<String>,
    pub client_uuid: Option<Uuid>,
    pub last_sent_token: Option<String>,
    /// Epoch milliseconds of the last successful registration send.
    pub last_registration_time: Option<i64>,
    pub registered_tags: Option<String>,
    pub opened_messages: Option<String>,
}

/// Registration state persisted as one TOML file. Every accessor reads the
/// file fresh; the process making concurrent writes to the same state
/// directory is out of scope.
#[derive(Debug, Clone)]
pub struct RegistrationStore {
    path: PathBuf,
}

impl RegistrationStore {
    pub fn open(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(STORE_FILE_NAME),
        }
    }

    pub fn snapshot(&self) -> StoredState {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(_) => return StoredState::default(),
        };
        match toml::from_str(&contents) {
            Ok(state) => state,
            Err(err) => {
                log::warn!(
                    "ignoring unreadable registration store {}: {err}",
                    self.path.display()
                );
                StoredState::default()
            }
        }
    }

    fn save(&self, state: &StoredState) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string(state)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
        std::fs::write(&self.path, contents)
    }

    pub fn registration_token(&self) -> Option<String> {
        self.snapshot().registration_token
    }

    pub fn client_uuid(&self) -> Option<Uuid> {
        self.snapshot().client_uuid
    }

    pub fn registered_tags(&self) -> Vec<String> {
        split_joined(self.snapshot().registered_tags.as_deref())
    }

    /// Writes the full result of a successful register call in one batch:
    /// token, last-sent token, timestamp, tags and the assigned client UUID.
    pub fn store_registration(
        &self,
        token: &str,
        tags: &[String],
        client_uuid: Uuid,
        now_millis: i64,
    ) -> std::io::Result<()> {
        let mut state = self.snapshot();
        state.registration_token = Some(token.to_string());
        state.last_sent_token = Some(token.to_string());
        state.last_registration_time = Some(now_millis);
        state.registered_tags = Some(tags.join(","));
        state.client_uuid = Some(client_uuid);
        self.save(&state)
    }

    /// Overwrites the current platform token after a rotation, leaving the
    /// last-sent state untouched so the next register call notices the
    /// difference and resends.
    pub fn update_token(&self, token: &str) -> std::io::Result<()> {
        let mut state = self.snapshot();
        state.registration_token = Some(token.to_string());
        self.save(&state)
    }

    /// Clears the whole namespace.
    pub fn remove_registration(&self) -> std::io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Removes exactly the supplied tags, preserving the order of the rest.
    pub fn remove_tags(&self, tags: &[String]) -> std::io::Result<()> {
        let mut state = self.snapshot();
        let remaining: Vec<String> = split_joined(state.registered_tags.as_deref())
            .into_iter()
            .filter(|tag| !tags.contains(tag))
            .collect();
        state.registered_tags = Some(remaining.join(","));
        self.save(&state)
    }

    pub fn is_message_opened(&self, message_uuid: Uuid) -> bool {
        split_joined(self.snapshot().opened_messages.as_deref())
            .iter()
            .any(|entry| entry == &message_uuid.to_string())
    }

    /// Appends the UUID to the opened message log unless already present.
    pub fn record_message_opened(&self, message_uuid: Uuid) -> std::io::Result<()> {
        let mut state = self.snapshot();
        let mut opened = split_joined(state.opened_messages.as_deref());
        let entry = message_uuid.to_string();
        if opened.contains(&entry) {
            return Ok(());
        }
        opened.push(entry);
        state.opened_messages = Some(opened.join(","));
        self.save(&state)
    }
}

fn split_joined(joined: Option<&str>) -> Vec<String> {
    match joined {
        Some(joined) if !joined.is_empty() => {
            joined.split(',').map(|part| part.to_string()).collect()
        }
        _ => Vec::new(),
    }
}
