//! # Erros do Etiquetador
//!
//! Todas as falhas do crate convergem para [`MbtError`]. As categorias seguem
//! o ciclo de vida de uma sentença:
//!
//! | Categoria                  | Fatal?                    | Variante                    |
//! |----------------------------|---------------------------|-----------------------------|
//! | Template inválido          | Sim (na construção)       | [`MbtError::Template`]      |
//! | Linha de entrada malformada| Não (pulada com aviso)    | [`MbtError::MalformedLine`] |
//! | Classificador sem resposta | Sim (para a sentença)     | [`MbtError::NoAnswer`]      |
//! | Decodificador mal usado    | Sim                       | [`MbtError::DecoderNotInitialized`] |

use thiserror::Error;

/// Atalho para `Result<T, MbtError>`.
pub type Result<T> = std::result::Result<T, MbtError>;

/// Motivo pelo qual uma string de template foi rejeitada.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// Caractere fora do alfabeto `f F w W d a p s h c n`.
    #[error("illegal symbol '{0}' in context string")]
    IllegalSymbol(char),
    /// Mais de um `f`/`F` (ou `W` implícito seguido de outro foco).
    #[error("more than one focus position in context string")]
    DuplicateFocus,
    /// Nenhuma posição de foco encontrada.
    #[error("no focus in context string")]
    MissingFocus,
}

#[derive(Error, Debug)]
pub enum MbtError {
    #[error("invalid template \"{template}\": {source}")]
    Template {
        template: String,
        #[source]
        source: TemplateError,
    },

    #[error("id {0} was not produced by this interner")]
    UnknownId(usize),

    /// Linha descartada pelo leitor; usada como diagnóstico, nunca propagada.
    #[error("line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    #[error("classifier returned no answer for instance \"{instance}\"")]
    NoAnswer { instance: String },

    #[error("beam decoder used before initialisation")]
    DecoderNotInitialized,

    #[error("beam position {position} out of bounds (sentence length {len})")]
    DecoderBounds { position: usize, len: usize },

    #[error("no beam path survived at position {position}")]
    NoPath { position: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("lexicon line {line}: {reason}")]
    Lexicon { line: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl MbtError {
    /// Embala um [`TemplateError`] com a string que o causou.
    pub fn template(template: &str, source: TemplateError) -> Self {
        MbtError::Template {
            template: template.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_error_mentions_template_string() {
        let err = MbtError::template("ddxa", TemplateError::IllegalSymbol('x'));
        let msg = err.to_string();
        assert!(msg.contains("ddxa"));
        assert!(msg.contains("'x'"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: MbtError = io.into();
        assert!(matches!(err, MbtError::Io(_)));
    }
}
