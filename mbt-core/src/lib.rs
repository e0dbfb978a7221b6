//! # mbt-core — Etiquetador de Sequências Baseado em Memória
//!
//! Este crate implementa um etiquetador morfossintático (POS) no estilo
//! *memory-based*: o modelo não aprende pesos, ele **guarda instâncias** de
//! treino e etiqueta cada palavra pelo vizinho mais próximo. O contexto de
//! cada palavra é descrito por um template (`ddfa`, `dFapsss`, ...) e a
//! sentença é decodificada com uma busca em feixe (N-best).
//!
//! ## Arquitetura do Sistema
//!
//! 1.  **Entrada** ([`sentence`]): linhas `untagged`, `tagged` ou `enriched`,
//!     divididas em sentenças pelo marcador de fim (`<utt>` por padrão).
//! 2.  **Janela** ([`sentence`], [`lexicon`]): cada palavra recebe seu id e sua
//!     classe de ambiguidade (ex.: `VB;NN`), ou a marca de desconhecida.
//! 3.  **Padrão** ([`pattern`], [`features`]): o template compilado vira um
//!     vetor de ids com tags já atribuídas, classes, afixos e flags.
//! 4.  **Classificação** ([`classifier`]): o vetor é serializado como instância
//!     e o classificador devolve um rótulo e uma distribuição.
//! 5.  **Feixe** ([`beam`]): as hipóteses são estendidas e reordenadas pela
//!     probabilidade conjunta; no fim, o caminho 0 é a resposta.
//! 6.  **Saída** ([`tagger`], [`pipeline`]): `palavra/TAG` ou um token por linha.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use mbt_core::{Pipeline, TaggerConfig};
//!
//! # fn main() -> mbt_core::Result<()> {
//! // Modelo treinado com o corpus embutido
//! let mut pipeline = Pipeline::demo(TaggerConfig::default())?;
//!
//! let results = pipeline.tagger_mut().tag_line("O banco manteve a taxa .")?;
//! for r in &results {
//!     println!("{} -> {}", r.word, r.tag);
//! }
//! assert_eq!(results[0].tag, "DET");
//! # Ok(())
//! # }
//! ```
//!
//! ## Módulos Principais
//!
//! - [`interner`]: strings ↔ ids densos, compartilhado entre threads.
//! - [`pattern`]: compilação dos templates de contexto.
//! - [`beam`]: decodificador N-best.
//! - [`tagger`]: orquestração por sentença.
//! - [`training`]: léxicos e bases de instâncias a partir de corpus etiquetado.
//! - [`corpus`]: corpus de demonstração em Português (classes UD).

pub mod beam;
pub mod classifier;
pub mod config;
pub mod corpus;
pub mod error;
pub mod features;
pub mod interner;
pub mod lexicon;
pub mod pattern;
pub mod pipeline;
pub mod sentence;
pub mod tagger;
pub mod training;

pub use classifier::{CaseBases, Classification, Classifier, Distribution, InstanceBase};
pub use config::{OutputOptions, TaggerConfig};
pub use error::{MbtError, Result};
pub use pattern::PatternTemplate;
pub use pipeline::{Pipeline, ProcessStats};
pub use sentence::{EosMarker, InputKind, Sentence, SentenceReader, Word};
pub use tagger::{TagResult, Tagger, TaggerModel};
pub use training::{Trainer, TrainingReport};
