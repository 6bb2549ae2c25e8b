use serde::Deserialize;

/// Envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

impl<T> ApiResponse<T> {
    pub fn into_result(self, method: &str) -> anyhow::Result<T> {
        if !self.ok {
            anyhow::bail!(
                "Telegram {} failed ({}): {}",
                method,
                self.error_code.unwrap_or_default(),
                self.description.as_deref().unwrap_or("no description")
            );
        }
        match self.result {
            Some(result) => Ok(result),
            None => anyhow::bail!("Telegram {} returned no result", method),
        }
    }
}

/// One inbound event.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub document: Option<Document>,
    #[serde(default)]
    pub voice: Option<Voice>,
    #[serde(default)]
    pub photo: Option<Vec<PhotoSize>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub file_id: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Voice {
    pub file_id: String,
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
}

/// Result of `getFile`.
#[derive(Debug, Clone, Deserialize)]
pub struct File {
    pub file_id: String,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

/// The single payload a message carries, picked in the order
/// text, document, voice, photo.
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    Text(&'a str),
    Document(&'a Document),
    Voice(&'a Voice),
    /// Largest available size of the photo.
    Photo(&'a PhotoSize),
}

impl Message {
    pub fn payload(&self) -> Option<Payload<'_>> {
        if let Some(text) = self.text.as_deref() {
            return Some(Payload::Text(text));
        }
        if let Some(document) = &self.document {
            return Some(Payload::Document(document));
        }
        if let Some(voice) = &self.voice {
            return Some(Payload::Voice(voice));
        }
        // Telegram lists sizes smallest first.
        self.photo
            .as_ref()
            .and_then(|sizes| sizes.last())
            .map(Payload::Photo)
    }
}
