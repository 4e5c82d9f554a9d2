//! Row grouping and receiver resolution
//!
//! The source query returns one row per (message, receiver) pair. Grouping
//! folds those rows into one [`Message`] per distinct message key, keeping the
//! order in which keys first appear.

use std::collections::HashMap;

use crate::models::{ChannelType, Message, RawRow};

/// Identity of a message across its per-receiver rows
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MessageKey {
    sender: String,
    text: String,
    channel: String,
    channel_type: ChannelType,
    timestamp: i64,
    post_id: String,
    parent_post_id: Option<String>,
    file_extension: Option<String>,
}

impl MessageKey {
    fn from_row(row: &RawRow) -> Self {
        Self {
            sender: row.sender.clone(),
            text: row.text.clone(),
            channel: row.channel.clone(),
            channel_type: row.channel_type,
            timestamp: row.timestamp,
            post_id: row.post_id.clone(),
            parent_post_id: row.parent_post_id.clone(),
            file_extension: row.file_extension.clone(),
        }
    }

    fn into_message(self) -> Message {
        Message {
            sender_id: self.sender,
            text: self.text,
            channel_id: self.channel,
            channel_type: self.channel_type,
            timestamp: self.timestamp,
            post_id: self.post_id,
            parent_post_id: self.parent_post_id,
            file_extension: self.file_extension,
            receiver_ids: Vec::new(),
        }
    }
}

/// Group per-receiver rows into messages
///
/// Output order is the order of first occurrence of each key. Receivers keep
/// row order; null receivers, the sender itself and repeated receivers are
/// skipped.
#[must_use]
pub fn group_rows<I>(rows: I) -> Vec<Message>
where
    I: IntoIterator<Item = RawRow>,
{
    let mut messages: Vec<Message> = Vec::new();
    let mut positions: HashMap<MessageKey, usize> = HashMap::new();

    for row in rows {
        let key = MessageKey::from_row(&row);
        let position = match positions.get(&key) {
            Some(&position) => position,
            None => {
                messages.push(key.clone().into_message());
                positions.insert(key, messages.len() - 1);
                messages.len() - 1
            },
        };

        let message = &mut messages[position];
        if let Some(receiver) = row.receiver {
            if receiver != message.sender_id && !message.receiver_ids.contains(&receiver) {
                message.receiver_ids.push(receiver);
            }
        }
    }

    messages
}
