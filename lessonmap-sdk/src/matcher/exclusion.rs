//! Title cleanup before matching.
//!
//! Non-content lessons are recognized by pattern and skipped, and the
//! leading lesson number is removed so it does not pull every title
//! towards the same vector.

use regex::Regex;

use crate::config::{ConfigValidationError, MatcherConfig};

/// Compiled exclusion and prefix patterns
#[derive(Debug, Clone)]
pub struct TitleFilter {
    exclusions: Vec<Regex>,
    prefix: Option<Regex>,
}

fn compile(pattern: &str) -> Result<Regex, ConfigValidationError> {
    Regex::new(pattern).map_err(|e| ConfigValidationError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

impl TitleFilter {
    pub fn from_config(config: &MatcherConfig) -> Result<Self, ConfigValidationError> {
        let exclusions = config
            .exclusion_patterns
            .iter()
            .map(|p| compile(p))
            .collect::<Result<Vec<_>, _>>()?;
        let prefix = config.lesson_prefix_pattern.as_deref().map(compile).transpose()?;

        Ok(Self { exclusions, prefix })
    }

    /// Pattern that marks a normalized title as non-content, if any
    pub fn exclusion(&self, normalized: &str) -> Option<&str> {
        self.exclusions
            .iter()
            .find(|re| re.is_match(normalized))
            .map(Regex::as_str)
    }

    /// Remove the lesson-number prefix from a normalized title.
    ///
    /// A title that is nothing but the prefix is returned unchanged.
    pub fn strip_prefix<'a>(&self, normalized: &'a str) -> std::borrow::Cow<'a, str> {
        let Some(prefix) = &self.prefix else {
            return normalized.into();
        };

        let stripped = prefix.replace(normalized, "");
        if stripped.trim().is_empty() {
            normalized.into()
        } else {
            stripped.trim().to_string().into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lessonmap_core::text::normalize;

    fn filter() -> TitleFilter {
        TitleFilter::from_config(&MatcherConfig::default()).unwrap()
    }

    #[test]
    fn test_default_exclusions() {
        let filter = filter();
        for title in [
            "Aula 00: Apresentação do curso",
            "Revisão Geral - Direito Penal",
            "Resumo final",
            "Raio-X da banca",
            "Aula 12 (somente em PDF)",
            "Apenas PDF",
        ] {
            assert!(filter.exclusion(&normalize(title)).is_some(), "{title} should be excluded");
        }
    }

    #[test]
    fn test_content_titles_are_not_excluded() {
        let filter = filter();
        for title in [
            "Aula 01: Crimes Contra a Vida",
            "Revisão de atos administrativos",
            "Apresentação pessoal e comunicação oficial",
        ] {
            assert!(filter.exclusion(&normalize(title)).is_none(), "{title} should be kept");
        }
    }

    #[test]
    fn test_strip_prefix() {
        let filter = filter();
        assert_eq!(filter.strip_prefix("aula 01 crimes contra a vida"), "crimes contra a vida");
        assert_eq!(filter.strip_prefix("aula 10 licitacoes"), "licitacoes");
        assert_eq!(filter.strip_prefix("crimes contra a vida"), "crimes contra a vida");
        assert_eq!(filter.strip_prefix("aula 01"), "aula 01");
    }

    #[test]
    fn test_prefix_can_be_disabled() {
        let config = MatcherConfig::default().with_lesson_prefix(None);
        let filter = TitleFilter::from_config(&config).unwrap();
        assert_eq!(filter.strip_prefix("aula 01 crimes"), "aula 01 crimes");
    }

    #[test]
    fn test_invalid_pattern() {
        let config = MatcherConfig::default().with_exclusion_patterns(["(oops"]);
        assert!(TitleFilter::from_config(&config).is_err());
    }
}
