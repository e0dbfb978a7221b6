//! # Configuração do Etiquetador
//!
//! Todas as opções ficam em uma única struct serializável, com valores
//! padrão para cada campo. Um arquivo JSON pode conter apenas os campos que
//! diferem do padrão:
//!
//! ```json
//! { "beam_size": 3, "input_kind": "tagged", "eos_marker": "EL" }
//! ```
//!
//! | Campo              | Padrão      | Uso                                        |
//! |--------------------|-------------|--------------------------------------------|
//! | `known_template`   | `"ddfa"`    | padrão de palavras conhecidas              |
//! | `unknown_template` | `"dFapsss"` | padrão de palavras desconhecidas           |
//! | `beam_size`        | `1`         | K do decodificador                          |
//! | `eos_marker`       | `"<utt>"`   | fim de sentença (`"EL"` = linha vazia)      |
//! | `filter_threshold` | `5`         | % mínimo para uma tag entrar na classe      |
//! | `top_n`            | `100`       | tamanho da lista de palavras frequentes     |
//! | `npax`             | `5`         | frequência máxima de uma palavra "rara"     |

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MbtError, Result};
use crate::pattern::PatternTemplate;
use crate::sentence::{EosMarker, InputKind};

/// Campos opcionais na saída de cada token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    pub distance: bool,
    pub distribution: bool,
    pub confidence: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggerConfig {
    pub known_template: String,
    pub unknown_template: String,
    pub beam_size: usize,
    pub eos_marker: EosMarker,
    pub input_kind: InputKind,
    /// Separador palavra/tag na saída `untagged`.
    pub separator: String,
    pub output: OutputOptions,
    pub filter_threshold: u32,
    pub top_n: usize,
    pub npax: usize,
    /// Gera instâncias de desconhecidas apenas para palavras raras.
    pub use_npax: bool,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            known_template: "ddfa".to_string(),
            unknown_template: "dFapsss".to_string(),
            beam_size: 1,
            eos_marker: EosMarker::default(),
            input_kind: InputKind::default(),
            separator: "/".to_string(),
            output: OutputOptions::default(),
            filter_threshold: 5,
            top_n: 100,
            npax: 5,
            use_npax: true,
        }
    }
}

impl TaggerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Compila os dois templates.
    pub fn templates(&self) -> Result<(PatternTemplate, PatternTemplate)> {
        Ok((
            PatternTemplate::compile(&self.known_template)?,
            PatternTemplate::compile(&self.unknown_template)?,
        ))
    }

    pub fn validate(&self) -> Result<()> {
        if self.beam_size == 0 {
            return Err(MbtError::InvalidConfig("beam_size must be at least 1".into()));
        }
        if self.filter_threshold > 100 {
            return Err(MbtError::InvalidConfig(format!(
                "filter_threshold is a percentage, got {}",
                self.filter_threshold
            )));
        }
        if self.separator.is_empty() {
            return Err(MbtError::InvalidConfig("separator must not be empty".into()));
        }
        self.templates()?;
        Ok(())
    }

    /// Limite de frequência para a lista de palavras raras, se ativa.
    pub fn npax_limit(&self) -> Option<usize> {
        (self.use_npax && self.npax > 0).then_some(self.npax)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = TaggerConfig::default();
        assert_eq!(c.known_template, "ddfa");
        assert_eq!(c.unknown_template, "dFapsss");
        assert_eq!(c.beam_size, 1);
        assert_eq!(c.eos_marker, EosMarker::Token("<utt>".into()));
        assert_eq!(c.npax_limit(), Some(5));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let c = TaggerConfig::from_json_str(
            r#"{ "beam_size": 3, "input_kind": "tagged", "eos_marker": "EL", "output": { "confidence": true } }"#,
        )
        .unwrap();
        assert_eq!(c.beam_size, 3);
        assert_eq!(c.input_kind, InputKind::Tagged);
        assert_eq!(c.eos_marker, EosMarker::EmptyLine);
        assert!(c.output.confidence);
        assert!(!c.output.distance);
        assert_eq!(c.top_n, 100);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(TaggerConfig::from_json_str(r#"{ "beam_size": 0 }"#).is_err());
        let err = TaggerConfig::from_json_str(r#"{ "known_template": "dda" }"#).unwrap_err();
        assert!(matches!(err, MbtError::Template { .. }));
    }

    #[test]
    fn test_npax_zero_disables_list() {
        let c = TaggerConfig {
            npax: 0,
            ..TaggerConfig::default()
        };
        assert_eq!(c.npax_limit(), None);
    }
}
