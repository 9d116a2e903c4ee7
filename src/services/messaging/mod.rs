//! Exchange messages with chat users
mod telegram;
pub use telegram::{
    Chat, InlineQuery, InlineQueryResultPhoto, Message, TelegramClient, Update, User,
};
