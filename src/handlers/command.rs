use anyhow::Result;
use tracing::info;

use crate::handlers::{Handlers, ReplyTarget};
use crate::storage::MediaKind;

pub const HELP_TEXT: &str = "Available commands:\n\
    /help - show this message\n\
    /list - list your saved files\n\
    /send <name> - send a saved file back to you\n\n\
    Send me a photo with a face or a voice message and I'll save it.";

pub const UNKNOWN_COMMAND: &str = "Unknown command. Send /help to see what I can do.";

#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Help,
    List,
    /// File name to send back; empty when the user gave none.
    Send(&'a str),
    Unknown,
}

impl<'a> Command<'a> {
    pub fn parse(text: &'a str) -> Self {
        let text = text.trim();
        let (word, args) = match text.split_once(char::is_whitespace) {
            Some((word, args)) => (word, args.trim()),
            None => (text, ""),
        };
        // Group chats address commands as `/cmd@botname`.
        let word = word.split_once('@').map_or(word, |(cmd, _)| cmd);

        match (word, args) {
            ("/help" | "/start", "") => Command::Help,
            ("/list", "") => Command::List,
            ("/send", name) => Command::Send(name),
            _ => Command::Unknown,
        }
    }
}

pub async fn handle_text(handlers: &Handlers, target: ReplyTarget, text: &str) -> Result<()> {
    match Command::parse(text) {
        Command::Help => handlers.reply(target, HELP_TEXT).await,
        Command::List => list_files(handlers, target).await,
        Command::Send("") => handlers.reply(target, "Usage: /send <name>").await,
        Command::Send(name) => send_file(handlers, target, name).await,
        Command::Unknown => handlers.reply(target, UNKNOWN_COMMAND).await,
    }
}

async fn list_files(handlers: &Handlers, target: ReplyTarget) -> Result<()> {
    let audio = handlers.store.list(MediaKind::Audio, target.chat_id).await?;
    let images = handlers.store.list(MediaKind::Image, target.chat_id).await?;

    if audio.is_empty() && images.is_empty() {
        return handlers.reply(target, "You have no saved files.").await;
    }

    let mut listing = String::new();
    for (title, names) in [("Audio", &audio), ("Images", &images)] {
        if names.is_empty() {
            continue;
        }
        if !listing.is_empty() {
            listing.push('\n');
        }
        listing.push_str(&format!("{}:\n", title));
        for name in names {
            listing.push_str(&format!("  - {}\n", name));
        }
    }
    handlers.reply(target, listing.trim_end()).await
}

async fn send_file(handlers: &Handlers, target: ReplyTarget, name: &str) -> Result<()> {
    match handlers.store.find(target.chat_id, name) {
        Some(path) => {
            info!("Sending {} to {}", path.display(), target.chat_id);
            handlers
                .api
                .send_document(target.chat_id, &path, Some(target.message_id))
                .await
        }
        None => {
            handlers
                .reply(target, &format!("File {} does not exist.", name))
                .await
        }
    }
}
