//! Answer Telegram messages and inline queries with route maps
use crate::i18n::{Language, Translator};
use crate::map::{ImageSize, VehicleObservation};
use crate::mapper::RouteMapper;
use crate::services::messaging::{InlineQuery, InlineQueryResultPhoto, Message, Update};
use crate::services::{TelegramClient, TransitDataSource};
use crate::Error;
use chrono::Local;
use log::{debug, error, info, trace, warn};
use reqwest::blocking::Client;
use sha2::{Digest, Sha256};
use std::thread::sleep;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// How long clients may cache an inline answer, in seconds
const INLINE_CACHE_TIME: u32 = 30;
/// Time allowed to download a rendered map from the provider
const IMAGE_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(20);
/// Pause after a failed poll before asking again
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// What a text message asks the bot to do
#[derive(Debug, PartialEq)]
pub enum Request<'a> {
    Start,
    Help,
    Route(&'a str),
    Ignore,
}

impl<'a> Request<'a> {
    /// Interpret the text of a chat message, commands may carry a `@botname` suffix
    pub fn parse(text: &'a str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return Request::Ignore;
        }
        if let Some(command) = text.strip_prefix('/') {
            let name = command
                .split_whitespace()
                .next()
                .and_then(|c| c.split('@').next())
                .unwrap_or("");
            return match name {
                "start" => Request::Start,
                _ => Request::Help,
            };
        }
        Request::Route(text)
    }
}

/// Short random-ish id used to correlate log lines of one update
fn request_id(update_id: i64) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let digest = Sha256::digest(format!("{}-{}", update_id, nanos).as_bytes());
    hex::encode(&digest[..4])
}

/// Stable id of an inline result, the same map always gets the same id
fn inline_result_id(photo_url: &str) -> String {
    hex::encode(Sha256::digest(photo_url.as_bytes()))
}

/// Name of an uploaded map, e.g. `tram-32_2024-3-7_9-5-41.jpg`
fn photo_file_name(route_number: &str) -> String {
    format!(
        "tram-{}_{}.jpg",
        route_number,
        Local::now().format("%Y-%-m-%-d_%-H-%-M-%-S")
    )
}

fn translator_for(language_code: Option<&str>) -> Translator {
    Translator::new(Language::from_code(language_code))
}

/// Long polling Telegram bot, handles one update at a time
pub struct RouteMapBot<'a> {
    telegram: TelegramClient,
    transit: &'a dyn TransitDataSource,
    mapper: RouteMapper<'a>,
    http: Client,
}

impl<'a> RouteMapBot<'a> {
    pub fn new(
        telegram: TelegramClient,
        transit: &'a dyn TransitDataSource,
        mapper: RouteMapper<'a>,
    ) -> Result<Self, Error> {
        let http = Client::builder().timeout(IMAGE_DOWNLOAD_TIMEOUT).build()?;
        Ok(RouteMapBot {
            telegram,
            transit,
            mapper,
            http,
        })
    }

    /// Poll for updates until the process is stopped
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        info!(
            "Bot started, serving {} routes",
            self.mapper.known_route_numbers().len()
        );
        let mut offset = None;
        loop {
            let updates = match self.telegram.get_updates(offset) {
                Ok(updates) => updates,
                Err(e) => {
                    error!("Could not fetch updates: {}", e);
                    sleep(POLL_RETRY_DELAY);
                    continue;
                }
            };
            for update in updates {
                offset = Some(update.update_id + 1);
                self.handle_update(&update);
            }
        }
    }

    pub fn handle_update(&self, update: &Update) {
        let id = request_id(update.update_id);
        let started = Instant::now();
        info!("[{}] Start {} {}", id, update.kind(), update.update_id);

        let result = if let Some(message) = &update.message {
            self.handle_message(&id, message)
        } else if let Some(query) = &update.inline_query {
            self.handle_inline_query(&id, query)
        } else {
            trace!("[{}] Ignoring update", id);
            Ok(())
        };
        if let Err(e) = result {
            error!("[{}] {}", id, e);
        }

        info!("[{}] End {:?}", id, started.elapsed());
    }

    fn handle_message(
        &self,
        id: &str,
        message: &Message,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let text = match &message.text {
            Some(text) => text,
            None => return Ok(()),
        };
        let translator = translator_for(
            message
                .from
                .as_ref()
                .and_then(|u| u.language_code.as_deref()),
        );
        let routes = self.mapper.known_route_numbers();
        let chat_id = message.chat.id;

        match Request::parse(text) {
            Request::Start => {
                self.telegram
                    .send_message(chat_id, &translator.what_can_i_do(routes), None)
            }
            Request::Help => self
                .telegram
                .send_message(chat_id, &translator.help_message(routes), None),
            Request::Route(route_number) => {
                self.send_route_map(id, message, route_number, &translator)
            }
            Request::Ignore => Ok(()),
        }
    }

    fn send_route_map(
        &self,
        id: &str,
        message: &Message,
        route_number: &str,
        translator: &Translator,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let chat_id = message.chat.id;
        let reply_to = Some(message.message_id);
        if let Err(Error::UnknownRouteError(route, known)) = self.mapper.check_route(route_number) {
            debug!("[{}] Unknown route {}", id, route);
            return self
                .telegram
                .send_message(chat_id, &translator.unknown_route(&route, &known), reply_to);
        }

        let image = match self.fetch_map_image(route_number) {
            Ok(image) => image,
            Err(e) => {
                error!("[{}] Could not create image for route {}: {}", id, route_number, e);
                return self
                    .telegram
                    .send_message(chat_id, &translator.cant_create_image(), reply_to);
            }
        };

        let caption = translator.tram_route(route_number);
        match self.telegram.send_photo(
            chat_id,
            image,
            photo_file_name(route_number),
            &caption,
            reply_to,
        ) {
            Ok(()) => {
                info!("[{}] Sent map of route {}", id, route_number);
                Ok(())
            }
            Err(e) => {
                error!("[{}] Could not send image for route {}: {}", id, route_number, e);
                self.telegram
                    .send_message(chat_id, &translator.cant_send_image(), reply_to)
            }
        }
    }

    fn vehicles(&self) -> Result<Vec<VehicleObservation>, Box<dyn std::error::Error>> {
        let vehicles = self.transit.vehicle_positions()?;
        trace!("Fetched {} vehicle positions", vehicles.len());
        Ok(vehicles)
    }

    /// Render the full size map and download it so the provider credentials never leave
    /// the server
    fn fetch_map_image(&self, route_number: &str) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        let vehicles = self.vehicles()?;
        let geometry = self.mapper.geometry(route_number, &vehicles)?;
        let url = self.mapper.render(&geometry, ImageSize::full())?;
        let resp = self.http.get(&url).send()?;
        if !resp.status().is_success() {
            return Err(Box::new(Error::RequestError(
                resp.status(),
                format!("can not download map of route {}", route_number),
            )));
        }
        Ok(resp.bytes()?.to_vec())
    }

    fn handle_inline_query(
        &self,
        id: &str,
        query: &InlineQuery,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let route_number = query.query.trim();
        if route_number.is_empty() {
            return Ok(());
        }
        let translator = translator_for(query.from.language_code.as_deref());

        let results = match self
            .vehicles()
            .and_then(|vehicles| Ok(self.mapper.map_urls(route_number, &vehicles)?))
        {
            Ok(urls) => vec![InlineQueryResultPhoto::new(
                inline_result_id(urls.image_url()),
                urls.image_url().to_string(),
                urls.thumbnail_url().to_string(),
                translator.tram_route(route_number),
            )],
            Err(e) => {
                warn!("[{}] No inline result for {:?}: {}", id, route_number, e);
                Vec::new()
            }
        };

        self.telegram
            .answer_inline_query(&query.id, &results, INLINE_CACHE_TIME)?;
        info!("[{}] Answered inline query with {} results", id, results.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_commands() {
        assert_eq!(Request::parse("/start"), Request::Start);
        assert_eq!(Request::parse("/start@TramMapBot"), Request::Start);
        assert_eq!(Request::parse("/help"), Request::Help);
        assert_eq!(Request::parse("/help@TramMapBot extra"), Request::Help);
        assert_eq!(Request::parse("/unknown"), Request::Help);
    }

    #[test]
    fn parse_route_numbers() {
        assert_eq!(Request::parse(" 32 \n"), Request::Route("32"));
        assert_eq!(Request::parse("A"), Request::Route("A"));
        assert_eq!(Request::parse("   "), Request::Ignore);
    }

    #[test]
    fn inline_result_id_is_stable() {
        let a = inline_result_id("https://example.com/map?route=32");
        let b = inline_result_id("https://example.com/map?route=32");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, inline_result_id("https://example.com/map?route=5"));
    }

    #[test]
    fn request_ids_are_short_hex() {
        let id = request_id(7);
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn photo_file_name_format() {
        let name = photo_file_name("32");
        assert!(name.starts_with("tram-32_"));
        assert!(name.ends_with(".jpg"));
        let stamp = &name["tram-32_".len()..name.len() - 4];
        let (date, time) = stamp.split_at(stamp.find('_').unwrap());
        assert_eq!(date.split('-').count(), 3);
        assert_eq!(time[1..].split('-').count(), 3);
    }
}
