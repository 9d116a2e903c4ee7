//! Localized texts sent to chat users
/// Languages the bot can answer in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Language {
    English,
    Russian,
}

impl Language {
    /// Pick a language from an IETF tag such as `ru` or `en-US`, English is the fallback
    pub fn from_code(code: Option<&str>) -> Self {
        let primary = code
            .and_then(|c| c.split(|ch| ch == '-' || ch == '_').next())
            .map(|c| c.to_ascii_lowercase());
        match primary.as_deref() {
            Some("ru") => Language::Russian,
            _ => Language::English,
        }
    }
}

/// Builds the bot's replies in a single language
#[derive(Clone, Copy, Debug)]
pub struct Translator {
    language: Language,
}

impl Translator {
    pub fn new(language: Language) -> Self {
        Translator { language }
    }

    pub fn what_can_i_do(&self, routes: &[String]) -> String {
        match self.language {
            Language::English => format!(
                "I draw a map with the live positions of trams on a route. \
                 Send me a route number, e.g. one of: {}",
                routes.join(", ")
            ),
            Language::Russian => format!(
                "Я рисую карту с текущим положением трамваев на маршруте. \
                 Отправьте мне номер маршрута, например один из: {}",
                routes.join(", ")
            ),
        }
    }

    pub fn help_message(&self, routes: &[String]) -> String {
        match self.language {
            Language::English => format!(
                "Send a route number to get a map of it. You can also type @<bot name> <route> \
                 in any chat. Available routes: {}",
                routes.join(", ")
            ),
            Language::Russian => format!(
                "Отправьте номер маршрута, чтобы получить его карту. Также можно набрать \
                 @<имя бота> <маршрут> в любом чате. Доступные маршруты: {}",
                routes.join(", ")
            ),
        }
    }

    /// Caption of a route map image
    pub fn tram_route(&self, route_number: &str) -> String {
        match self.language {
            Language::English => format!("Tram route {}", route_number),
            Language::Russian => format!("Трамвайный маршрут {}", route_number),
        }
    }

    pub fn unknown_route(&self, route_number: &str, routes: &[String]) -> String {
        match self.language {
            Language::English => format!(
                "Route {} not found. Available routes: {}",
                route_number,
                routes.join(", ")
            ),
            Language::Russian => format!(
                "Маршрут {} не найден. Доступные маршруты: {}",
                route_number,
                routes.join(", ")
            ),
        }
    }

    pub fn cant_create_image(&self) -> String {
        match self.language {
            Language::English => {
                "Sorry, I could not prepare the map right now. Please try again later.".to_string()
            }
            Language::Russian => {
                "Извините, сейчас не получилось подготовить карту. Попробуйте позже.".to_string()
            }
        }
    }

    pub fn cant_send_image(&self) -> String {
        match self.language {
            Language::English => "Sorry, I could not send the map image.".to_string(),
            Language::Russian => "Извините, не получилось отправить изображение карты.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_from_code() {
        assert_eq!(Language::from_code(Some("ru")), Language::Russian);
        assert_eq!(Language::from_code(Some("RU-ru")), Language::Russian);
        assert_eq!(Language::from_code(Some("en-US")), Language::English);
        assert_eq!(Language::from_code(Some("de")), Language::English);
        assert_eq!(Language::from_code(None), Language::English);
    }

    #[test]
    fn unknown_route_lists_available_routes() {
        let routes = vec!["3".to_string(), "15".to_string()];
        let t = Translator::new(Language::English);
        assert_eq!(
            t.unknown_route("99", &routes),
            "Route 99 not found. Available routes: 3, 15"
        );
        let t = Translator::new(Language::Russian);
        assert!(t.unknown_route("99", &routes).ends_with("3, 15"));
    }
}
