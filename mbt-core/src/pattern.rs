//! # Templates de Padrão
//!
//! Um template descreve, em uma string compacta, **quais features** compõem o
//! padrão de uma posição da sentença. Dois templates são usados: um para
//! palavras conhecidas (padrão `"ddfa"`) e outro para desconhecidas (`"dFapsss"`).
//!
//! ## Alfabeto
//!
//! | Símbolo | Contexto | Significado                                              |
//! |---------|----------|----------------------------------------------------------|
//! | `d`     | tags     | tag já atribuída (à esquerda) ou do caminho candidato    |
//! | `a`     | tags     | classe de ambiguidade de um vizinho                       |
//! | `f`     | ambos    | foco: classe de ambiguidade da palavra atual              |
//! | `F`     | ambos    | foco que não emite feature                                |
//! | `w`     | palavras | a própria palavra vizinha                                 |
//! | `W`     | palavras | transforma o foco em `w` (ou, sozinho, equivale a `FW`)   |
//! | `p`/`s` | —        | um prefixo/sufixo (de um caractere) a mais                |
//! | `h`/`c`/`n` | —    | hífen / inicial maiúscula / dígito na palavra atual       |
//!
//! Os símbolos `d a f F` avançam o cursor de **contexto de tags**; `w f F W`
//! avançam o cursor de **contexto de palavras**. O foco existe nos dois
//! contextos ao mesmo tempo, por isso a contagem de slots de palavra desconta
//! o foco (a "compensação").
//!
//! ## Exemplo
//!
//! ```rust
//! use mbt_core::pattern::PatternTemplate;
//!
//! let t = PatternTemplate::compile("dFapsss").unwrap();
//! assert_eq!(t.total_slots(), 7);
//! assert_eq!(t.feature_len(), 6); // F não emite feature
//! ```

use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::error::{MbtError, Result, TemplateError};

/// Slot do contexto de tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagSlot {
    /// `d`: tag atribuída.
    Assigned,
    /// `a`: classe de ambiguidade.
    Ambiguity,
    /// `f`: foco que emite sua classe de ambiguidade.
    Focus,
    /// `F`: foco silencioso.
    SkipFocus,
}

impl TagSlot {
    fn symbol(self) -> char {
        match self {
            TagSlot::Assigned => 'd',
            TagSlot::Ambiguity => 'a',
            TagSlot::Focus => 'f',
            TagSlot::SkipFocus => 'F',
        }
    }
}

/// Slot do contexto de palavras.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordSlot {
    /// `w`: emite a palavra (ou sua classe hapax).
    Word,
    /// Marcador de foco; não emite nada.
    Focus,
}

/// Template compilado e imutável.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternTemplate {
    source: String,
    tag_slots: Vec<TagSlot>,
    word_slots: Vec<WordSlot>,
    focus: usize,
    word_focus: usize,
    prefixes: usize,
    suffixes: usize,
    hyphen: bool,
    capital: bool,
    numeric: bool,
    skip_focus: bool,
    word_focus_converted: bool,
    compensation: usize,
}

impl PatternTemplate {
    /// Compila uma string de template.
    ///
    /// Erros: símbolo fora do alfabeto, mais de um foco, nenhum foco.
    pub fn compile(template: &str) -> Result<Self> {
        let mut tag_slots = Vec::new();
        let mut word_slots = Vec::new();
        let mut focus: Option<(usize, usize)> = None;
        let mut prefixes = 0;
        let mut suffixes = 0;
        let (mut hyphen, mut capital, mut numeric) = (false, false, false);
        let mut skip_focus = false;
        let mut word_focus_converted = false;
        let mut compensation = 0usize;

        for ch in template.chars() {
            match ch {
                'f' | 'F' => {
                    if focus.is_some() {
                        return Err(MbtError::template(template, TemplateError::DuplicateFocus));
                    }
                    focus = Some((tag_slots.len(), word_slots.len()));
                    skip_focus = ch == 'F';
                    tag_slots.push(if skip_focus { TagSlot::SkipFocus } else { TagSlot::Focus });
                    word_slots.push(WordSlot::Focus);
                    compensation += 1;
                }
                'd' => tag_slots.push(TagSlot::Assigned),
                'a' => tag_slots.push(TagSlot::Ambiguity),
                'w' => word_slots.push(WordSlot::Word),
                'p' => prefixes += 1,
                's' => suffixes += 1,
                'h' => hyphen = true,
                'c' => capital = true,
                'n' => numeric = true,
                'W' => match focus {
                    Some((_, wf)) if word_slots[wf] == WordSlot::Focus => {
                        word_slots[wf] = WordSlot::Word;
                        compensation -= 1;
                        word_focus_converted = true;
                    }
                    Some(_) => {
                        warn!(template, "modificador W não vem logo após f/F; ignorado");
                    }
                    None => {
                        // W sem foco vale como "FW"; a compensação não é incrementada.
                        warn!(template, "W sem foco anterior interpretado como FW");
                        focus = Some((tag_slots.len(), word_slots.len()));
                        skip_focus = true;
                        tag_slots.push(TagSlot::SkipFocus);
                        word_slots.push(WordSlot::Word);
                        word_focus_converted = true;
                    }
                },
                other => {
                    return Err(MbtError::template(template, TemplateError::IllegalSymbol(other)));
                }
            }
        }

        let (focus, word_focus) =
            focus.ok_or_else(|| MbtError::template(template, TemplateError::MissingFocus))?;

        Ok(Self {
            source: template.to_string(),
            tag_slots,
            word_slots,
            focus,
            word_focus,
            prefixes,
            suffixes,
            hyphen,
            capital,
            numeric,
            skip_focus,
            word_focus_converted,
            compensation,
        })
    }

    /// Número total de slots, incluindo o foco silencioso.
    pub fn total_slots(&self) -> usize {
        self.tag_slots.len()
            + self.prefixes
            + self.suffixes
            + usize::from(self.hyphen)
            + usize::from(self.capital)
            + usize::from(self.numeric)
            + self.word_total_slots()
    }

    /// Slots de palavra descontando o foco compartilhado com o contexto de tags.
    pub fn word_total_slots(&self) -> usize {
        self.word_slots.len() - self.compensation
    }

    /// Comprimento do vetor de features efetivamente emitido.
    pub fn feature_len(&self) -> usize {
        self.total_slots() - usize::from(self.skip_focus)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tag_slots(&self) -> &[TagSlot] {
        &self.tag_slots
    }

    pub fn word_slots(&self) -> &[WordSlot] {
        &self.word_slots
    }

    /// Índice do foco no contexto de tags.
    pub fn focus(&self) -> usize {
        self.focus
    }

    /// Índice do foco no contexto de palavras.
    pub fn word_focus(&self) -> usize {
        self.word_focus
    }

    pub fn prefixes(&self) -> usize {
        self.prefixes
    }

    pub fn suffixes(&self) -> usize {
        self.suffixes
    }

    pub fn hyphen(&self) -> bool {
        self.hyphen
    }

    pub fn capital(&self) -> bool {
        self.capital
    }

    pub fn numeric(&self) -> bool {
        self.numeric
    }

    pub fn skip_focus(&self) -> bool {
        self.skip_focus
    }

    /// Reconstrói a disposição dos slots na ordem em que o padrão é lido:
    /// prefixos, tags com as palavras em volta do foco, sufixos, flags.
    ///
    /// `"ddfapsss"` vira `"pddfasss"`.
    pub fn layout(&self) -> String {
        let word_symbol = |slot: &WordSlot| match slot {
            WordSlot::Word => 'w',
            WordSlot::Focus => 'f',
        };
        let mut out = String::with_capacity(self.total_slots() + 1);
        out.extend(std::iter::repeat('p').take(self.prefixes));
        for slot in &self.tag_slots {
            let is_focus = matches!(slot, TagSlot::Focus | TagSlot::SkipFocus);
            if is_focus {
                out.extend(self.word_slots[..self.word_focus].iter().map(word_symbol));
            }
            out.push(slot.symbol());
            if is_focus {
                out.extend(self.word_slots[self.word_focus + 1..].iter().map(word_symbol));
            }
        }
        out.extend(std::iter::repeat('s').take(self.suffixes));
        if self.hyphen {
            out.push('h');
        }
        if self.capital {
            out.push('c');
        }
        if self.numeric {
            out.push('n');
        }
        if self.word_focus_converted {
            out.push('W');
        }
        out
    }
}

impl FromStr for PatternTemplate {
    type Err = MbtError;

    fn from_str(s: &str) -> Result<Self> {
        Self::compile(s)
    }
}

impl fmt::Display for PatternTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
