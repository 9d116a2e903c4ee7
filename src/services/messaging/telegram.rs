//! Minimal client for the Telegram Bot API
use crate::config::FromServiceConfig;
use crate::Error;
use log::trace;
use reqwest::blocking::{multipart, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Updates the bot asks for, everything else is ignored
static ALLOWED_UPDATES: &str = r#"["message","inline_query"]"#;

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub inline_query: Option<InlineQuery>,
}

impl Update {
    /// Short description of the update used for logging
    pub fn kind(&self) -> &'static str {
        if self.message.is_some() {
            "message"
        } else if self.inline_query.is_some() {
            "inline_query"
        } else {
            "other"
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct User {
    pub id: i64,
    pub language_code: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct InlineQuery {
    pub id: String,
    pub from: User,
    pub query: String,
}

/// Photo answer to an inline query, the photo is fetched by Telegram from `photo_url`
#[derive(Clone, Debug, Serialize)]
pub struct InlineQueryResultPhoto {
    #[serde(rename = "type")]
    kind: &'static str,
    id: String,
    photo_url: String,
    thumbnail_url: String,
    title: String,
    caption: String,
    description: String,
}

impl InlineQueryResultPhoto {
    pub fn new(id: String, photo_url: String, thumbnail_url: String, title: String) -> Self {
        InlineQueryResultPhoto {
            kind: "photo",
            id,
            photo_url,
            thumbnail_url,
            caption: title.clone(),
            description: title.clone(),
            title,
        }
    }
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to_message_id: Option<i64>,
}

#[derive(Debug, Serialize)]
struct AnswerInlineQuery<'a> {
    inline_query_id: &'a str,
    results: &'a [InlineQueryResultPhoto],
    cache_time: u32,
}

/// Defines the connection parameters to talk to the Telegram Bot API
#[derive(Debug, FromServiceConfig)]
pub struct TelegramClient {
    base_url: String,
    #[service_config(required)]
    bot_token: String,
    poll_timeout_secs: u64,
    #[service_config(skip)]
    client: Client,
}

impl TelegramClient {
    pub fn new(bot_token: String) -> Self {
        TelegramClient {
            bot_token,
            ..Default::default()
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.bot_token, method)
    }

    fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        request: RequestBuilder,
    ) -> Result<T, Box<dyn std::error::Error>> {
        trace!("calling Telegram method {}", method);
        let resp: ApiResponse<T> = request.send()?.json()?;
        match resp.result {
            Some(result) if resp.ok => Ok(result),
            _ => Err(Box::new(Error::TelegramApiError(format!(
                "{} failed: {}",
                method,
                resp.description.unwrap_or_else(|| "no description".to_string())
            )))),
        }
    }

    /// Long poll for new updates, `offset` acknowledges every update before it
    pub fn get_updates(
        &self,
        offset: Option<i64>,
    ) -> Result<Vec<Update>, Box<dyn std::error::Error>> {
        let mut params = vec![
            ("timeout", self.poll_timeout_secs.to_string()),
            ("allowed_updates", ALLOWED_UPDATES.to_string()),
        ];
        if let Some(offset) = offset {
            params.push(("offset", offset.to_string()));
        }
        let request = self
            .client
            .get(&self.method_url("getUpdates"))
            .query(&params)
            .timeout(Duration::from_secs(self.poll_timeout_secs + 10));
        self.call("getUpdates", request)
    }

    pub fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_to_message_id: Option<i64>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let body = SendMessage {
            chat_id,
            text,
            reply_to_message_id,
        };
        let request = self.client.post(&self.method_url("sendMessage")).json(&body);
        self.call::<Message>("sendMessage", request).map(|_| ())
    }

    /// Upload a JPEG image to the chat
    pub fn send_photo(
        &self,
        chat_id: i64,
        photo: Vec<u8>,
        file_name: String,
        caption: &str,
        reply_to_message_id: Option<i64>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let part = multipart::Part::bytes(photo)
            .file_name(file_name)
            .mime_str("image/jpeg")?;
        let mut form = multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part("photo", part);
        if let Some(id) = reply_to_message_id {
            form = form.text("reply_to_message_id", id.to_string());
        }
        let request = self.client.post(&self.method_url("sendPhoto")).multipart(form);
        self.call::<Message>("sendPhoto", request).map(|_| ())
    }

    pub fn answer_inline_query(
        &self,
        inline_query_id: &str,
        results: &[InlineQueryResultPhoto],
        cache_time: u32,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let body = AnswerInlineQuery {
            inline_query_id,
            results,
            cache_time,
        };
        let request = self
            .client
            .post(&self.method_url("answerInlineQuery"))
            .json(&body);
        self.call::<bool>("answerInlineQuery", request).map(|_| ())
    }
}

impl Default for TelegramClient {
    fn default() -> Self {
        TelegramClient {
            base_url: "https://api.telegram.org".to_string(),
            bot_token: String::new(),
            poll_timeout_secs: 30,
            client: Client::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_updates() {
        let resp: ApiResponse<Vec<Update>> = serde_yaml::from_str(
            r#"{"ok": true, "result": [
                {"update_id": 7, "message": {"message_id": 3, "date": 0,
                    "chat": {"id": 42, "type": "private"},
                    "from": {"id": 9, "is_bot": false, "first_name": "A", "language_code": "ru"},
                    "text": "32"}},
                {"update_id": 8, "inline_query": {"id": "q1", "query": "5", "offset": "",
                    "from": {"id": 9, "is_bot": false, "first_name": "A"}}},
                {"update_id": 9, "edited_message": {}}
            ]}"#,
        )
        .unwrap();
        let updates = resp.result.unwrap();

        assert_eq!(updates.len(), 3);
        let message = updates[0].message.as_ref().unwrap();
        assert_eq!(message.chat.id, 42);
        assert_eq!(message.text.as_deref(), Some("32"));
        assert_eq!(
            message.from.as_ref().unwrap().language_code.as_deref(),
            Some("ru")
        );
        assert_eq!(updates[1].kind(), "inline_query");
        assert_eq!(updates[1].inline_query.as_ref().unwrap().query, "5");
        assert_eq!(updates[2].kind(), "other");
    }

    #[test]
    fn failed_call_keeps_description() {
        let resp: ApiResponse<bool> =
            serde_yaml::from_str(r#"{"ok": false, "description": "Unauthorized"}"#).unwrap();
        assert!(!resp.ok);
        assert!(resp.result.is_none());
        assert_eq!(resp.description.as_deref(), Some("Unauthorized"));
    }

    #[test]
    fn method_url_contains_token() {
        let client = TelegramClient::new("123:abc".to_string());
        assert_eq!(
            client.method_url("getUpdates"),
            "https://api.telegram.org/bot123:abc/getUpdates"
        );
    }
}
