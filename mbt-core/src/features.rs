//! # Extração de Features por Janela Deslizante
//!
//! Para cada posição da sentença, o extrator monta o **padrão** que será
//! enviado ao classificador. O template (conhecida ou desconhecida) decide
//! quais slots existem; o extrator apenas preenche os ids na ordem fixa:
//!
//! ```text
//! [prefixos] [contexto de palavras] [contexto de tags] [sufixos] [hífen] [maiúscula] [dígito]
//! ```
//!
//! ## Tokens sintéticos
//!
//! | Token       | Significado                                   |
//! |-------------|-----------------------------------------------|
//! | `==`        | fora do contexto (antes/depois da sentença)   |
//! | `__`        | classe de ambiguidade de palavra desconhecida |
//! | `_x`        | prefixo/sufixo `x`                            |
//! | `_=`        | palavra curta demais para o prefixo/sufixo    |
//! | `_H` `_C` `_N` / `_0` | flags de hífen, maiúscula, dígito   |
//! | `HAPAX-HCN` | palavra fora da lista de frequentes           |
//!
//! O marcador de fora do contexto é `==`, e não `.`, para não colidir com a
//! pontuação real do corpus.

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{MbtError, Result};
use crate::interner::SharedInterner;
use crate::lexicon::FrequentWords;
use crate::pattern::{PatternTemplate, TagSlot, WordSlot};
use crate::sentence::Sentence;

/// Token emitido para posições fora da sentença.
pub const OUT_OF_CONTEXT: &str = "==";
/// Classe de ambiguidade das palavras ausentes do léxico.
pub const UNKNOWN: &str = "__";
/// Rótulo de instância quando a tag correta não é conhecida.
pub const NO_LABEL: &str = "??";

/// Intenção de uma chamada de extração.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchAction {
    /// Palavra encontrada no léxico (resolvido pelo extrator).
    Known,
    /// Palavra ausente do léxico (resolvido pelo extrator).
    Unknown,
    /// Força o template de conhecidas (geração de instâncias de treino).
    MakeKnown,
    /// Força o template de desconhecidas.
    MakeUnknown,
}

impl MatchAction {
    /// `true` quando o padrão deve ir para a base de conhecidas.
    pub fn is_known(self) -> bool {
        matches!(self, MatchAction::Known | MatchAction::MakeKnown)
    }
}

/// Classe hapax: `HAPAX-` seguido de `H` (hífen), `C` (inicial maiúscula) e
/// `N` (dígito), ou `HAPAX-0` se nenhuma se aplica.
pub fn classify_hapax(word: &str) -> String {
    let mut hapax = String::from("HAPAX-");
    if word.contains('-') {
        hapax.push('H');
    }
    if word.chars().next().is_some_and(char::is_uppercase) {
        hapax.push('C');
    }
    if word.chars().any(|c| c.is_ascii_digit()) {
        hapax.push('N');
    }
    if hapax.len() == "HAPAX-".len() {
        hapax.push('0');
    }
    hapax
}

/// Recursos somente-leitura usados para montar padrões.
#[derive(Debug, Clone, Copy)]
pub struct FeatureExtractor<'a> {
    pub known: &'a PatternTemplate,
    pub unknown: &'a PatternTemplate,
    /// Lista de palavras frequentes; vazia significa "toda palavra é frequente".
    pub frequent: &'a FrequentWords,
    pub interner: &'a SharedInterner,
}

impl<'a> FeatureExtractor<'a> {
    /// Resolve a intenção em um template concreto.
    pub fn resolve(&self, sentence: &Sentence, position: usize, action: MatchAction) -> (MatchAction, &'a PatternTemplate) {
        match action {
            MatchAction::MakeKnown => (action, self.known),
            MatchAction::MakeUnknown => (action, self.unknown),
            _ if sentence.known(position) => (MatchAction::Known, self.known),
            _ => (MatchAction::Unknown, self.unknown),
        }
    }

    /// Preenche `out` com o padrão da posição `position`.
    ///
    /// `old_path` é a sequência de tags de um feixe candidato; quando presente,
    /// os slots `d` a consultam em vez das tags atribuídas à sentença. Slots
    /// `d` sem valor emitem o token de fora do contexto.
    ///
    /// Devolve a intenção resolvida (`Known`/`Unknown` para chamadas de
    /// etiquetagem).
    pub fn next_pattern(
        &self,
        sentence: &Sentence,
        action: MatchAction,
        position: usize,
        old_path: Option<&[Option<usize>]>,
        out: &mut Vec<usize>,
    ) -> Result<MatchAction> {
        let len = sentence.len();
        let current = sentence
            .word(position)
            .ok_or(MbtError::DecoderBounds { position, len })?;
        let (action, template) = self.resolve(sentence, position, action);
        let interner = self.interner;
        let out_of_context = interner.intern(OUT_OF_CONTEXT);

        out.clear();
        out.reserve(template.total_slots());

        let graphemes: Vec<&str> = current.text.graphemes(true).collect();
        let affix = |g: Option<&&str>| match g {
            Some(g) => interner.intern(&format!("_{}", g)),
            None => interner.intern("_="),
        };

        for j in 0..template.prefixes() {
            out.push(affix(graphemes.get(j)));
        }

        // Contexto de palavras
        for (i, slot) in template.word_slots().iter().enumerate() {
            match window(position, i, template.word_focus(), len) {
                Some(pos) => {
                    if *slot == WordSlot::Word {
                        let word = &sentence.words()[pos];
                        let id = if self.frequent.is_empty() || self.frequent.contains(&word.text) {
                            word_id(word.word_id(), &word.text, interner)
                        } else {
                            interner.intern(&classify_hapax(&word.text))
                        };
                        out.push(id);
                    }
                }
                None => out.push(out_of_context),
            }
        }

        // Contexto de tags
        for (i, slot) in template.tag_slots().iter().enumerate() {
            let Some(pos) = window(position, i, template.focus(), len) else {
                out.push(out_of_context);
                continue;
            };
            let word = &sentence.words()[pos];
            match slot {
                TagSlot::Assigned => {
                    let tag = match old_path {
                        Some(path) => path.get(pos).copied().flatten(),
                        None => word.assigned(),
                    };
                    out.push(tag.unwrap_or(out_of_context));
                }
                TagSlot::Focus | TagSlot::Ambiguity => {
                    let amb = match word.ambiguity() {
                        Some(id) => id,
                        None => interner.intern(UNKNOWN),
                    };
                    out.push(amb);
                }
                TagSlot::SkipFocus => {}
            }
        }

        for j in (1..=template.suffixes()).rev() {
            let g = graphemes.len().checked_sub(j).and_then(|k| graphemes.get(k));
            out.push(affix(g));
        }

        let flag = |on: bool, yes: &str| interner.intern(if on { yes } else { "_0" });
        if template.hyphen() {
            out.push(flag(current.text.contains('-'), "_H"));
        }
        if template.capital() {
            out.push(flag(current.text.chars().next().is_some_and(char::is_uppercase), "_C"));
        }
        if template.numeric() {
            out.push(flag(current.text.chars().any(|c| c.is_ascii_digit()), "_N"));
        }

        debug_assert_eq!(out.len(), template.feature_len());
        Ok(action)
    }
}

/// Posição na sentença do slot `slot` de uma janela centrada em `position`.
fn window(position: usize, slot: usize, focus: usize, len: usize) -> Option<usize> {
    (position + slot).checked_sub(focus).filter(|&p| p < len)
}

fn word_id(id: Option<usize>, text: &str, interner: &SharedInterner) -> usize {
    id.unwrap_or_else(|| interner.intern(text))
}

/// Monta a string de instância: features, enriquecimento e rótulo (`??` se
/// ausente), separados por espaço.
pub fn format_instance(
    interner: &SharedInterner,
    features: &[usize],
    enrichment: &[String],
    label: Option<&str>,
) -> Result<String> {
    let mut parts = interner.resolve_all(features)?;
    parts.extend(enrichment.iter().cloned());
    parts.push(label.unwrap_or(NO_LABEL).to_string());
    Ok(parts.join(" "))
}
