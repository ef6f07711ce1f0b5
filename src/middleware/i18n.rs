// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

const DEFAULT_LANG: &str = "en";
const SUPPORTED_LANGS: [&str; 2] = ["pt", "en"];

// Extrator de idioma, lido do cabeçalho Accept-Language
#[derive(Debug, Clone, PartialEq)]
pub struct Locale(pub String);

impl Default for Locale {
    fn default() -> Self {
        Locale(DEFAULT_LANG.to_string())
    }
}

impl Locale {
    /// Escolhe o primeiro idioma suportado do cabeçalho ("pt-BR" -> "pt").
    pub fn from_header(header_value: Option<&str>) -> Self {
        header_value
            .and_then(|header_str| {
                accept_language::parse(header_str)
                    .into_iter()
                    .map(|tag| tag.split('-').next().unwrap_or(&tag).to_lowercase())
                    .find(|lang| SUPPORTED_LANGS.contains(&lang.as_str()))
            })
            .map(Locale)
            .unwrap_or_default()
    }

    pub fn is_pt(&self) -> bool {
        self.0 == "pt"
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok());

        Ok(Locale::from_header(header_value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_primary_subtag() {
        assert_eq!(Locale::from_header(Some("pt-BR,pt;q=0.9,en;q=0.8")).0, "pt");
    }

    #[test]
    fn skips_unsupported_languages() {
        assert_eq!(Locale::from_header(Some("fr-FR,pt;q=0.5")).0, "pt");
    }

    #[test]
    fn falls_back_to_default() {
        assert_eq!(Locale::from_header(None), Locale::default());
        assert_eq!(Locale::from_header(Some("de")).0, "en");
    }
}
