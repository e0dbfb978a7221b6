//! # Léxicos: Classes de Ambiguidade e Listas de Palavras
//!
//! O etiquetador consulta dois recursos construídos a partir do corpus de treino:
//!
//! - **[`Lexicon`]**: palavra → classe de ambiguidade, isto é, o conjunto de tags
//!   que a palavra recebeu no treino, ordenado por frequência (`"NN;VB"`).
//! - **[`FrequentWords`]**: as palavras mais frequentes. Nos slots `w` de um
//!   template, palavras fora desta lista são trocadas pela sua classe hapax.
//!
//! Os dois são gerados por [`TagLex`], que conta pares (palavra, tag).
//!
//! ## Formato em disco
//!
//! ```text
//! the DT
//! run VB;NN
//! ```
//!
//! Listas de palavras têm uma palavra por linha.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{BufRead, Write};

use tracing::warn;

use crate::error::{MbtError, Result};

/// Dicionário palavra → classe de ambiguidade.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    classes: HashMap<String, String>,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, word: &str, class: &str) {
        self.classes.insert(word.to_string(), class.to_string());
    }

    pub fn lookup(&self, word: &str) -> Option<&str> {
        self.classes.get(word).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Lê linhas `palavra classe`. Linhas vazias são ignoradas; linhas com
    /// outro número de campos produzem erro.
    pub fn read<R: BufRead>(reader: R) -> Result<Self> {
        let mut lexicon = Self::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [] => continue,
                [word, class] => lexicon.insert(word, class),
                _ => {
                    return Err(MbtError::Lexicon {
                        line: i + 1,
                        reason: format!("expected 'word class', got '{}'", line.trim()),
                    })
                }
            }
        }
        Ok(lexicon)
    }

    /// Escreve em ordem alfabética, para saída reproduzível.
    pub fn write<W: Write>(&self, mut writer: W) -> Result<()> {
        let sorted: BTreeMap<&String, &String> = self.classes.iter().collect();
        for (word, class) in sorted {
            writeln!(writer, "{} {}", word, class)?;
        }
        Ok(())
    }
}

/// Conjunto de palavras (lista top-N ou lista de hapax).
#[derive(Debug, Clone, Default)]
pub struct FrequentWords {
    words: HashSet<String>,
}

impl FrequentWords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, word: &str) {
        self.words.insert(word.to_string());
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Uma palavra por linha; linhas com espaços internos são ignoradas com aviso.
    pub fn read<R: BufRead>(reader: R) -> Result<Self> {
        let mut list = Self::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let word = line.trim();
            if word.is_empty() {
                continue;
            }
            if word.contains(char::is_whitespace) {
                warn!(line = i + 1, "entrada da lista de palavras com espaço ignorada");
                continue;
            }
            list.insert(word);
        }
        Ok(list)
    }

    pub fn write<W: Write>(&self, mut writer: W) -> Result<()> {
        let mut sorted: Vec<&String> = self.words.iter().collect();
        sorted.sort();
        for word in sorted {
            writeln!(writer, "{}", word)?;
        }
        Ok(())
    }
}

impl<S: AsRef<str>> FromIterator<S> for FrequentWords {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            words: iter.into_iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }
}

/// Contagens de uma palavra no corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    pub word: String,
    pub freq: usize,
    /// Frequência por tag; `BTreeMap` mantém empates em ordem alfabética.
    pub tags: BTreeMap<String, usize>,
}

impl TagInfo {
    fn new(word: &str) -> Self {
        Self {
            word: word.to_string(),
            freq: 0,
            tags: BTreeMap::new(),
        }
    }

    fn update(&mut self, tag: &str) {
        self.freq += 1;
        *self.tags.entry(tag.to_string()).or_insert(0) += 1;
    }

    /// Remove as tags abaixo de `threshold` por cento da frequência da palavra.
    pub fn prune(&mut self, threshold: u32) {
        let freq = self.freq as f64;
        self.tags
            .retain(|_, count| (*count as f64 * 100.0) / freq >= f64::from(threshold));
    }

    /// Classe de ambiguidade: tags por frequência decrescente, unidas por `;`.
    pub fn ambiguity_class(&self) -> String {
        let mut tags: Vec<(&String, &usize)> = self.tags.iter().collect();
        tags.sort_by(|a, b| b.1.cmp(a.1));
        tags.iter().map(|(t, _)| t.as_str()).collect::<Vec<_>>().join(";")
    }
}

/// Recursos derivados de um corpus etiquetado.
#[derive(Debug, Clone, Default)]
pub struct LexiconSet {
    pub lexicon: Lexicon,
    /// As `top_n` palavras mais frequentes.
    pub frequent: FrequentWords,
    /// Palavras com frequência ≤ `npax` (base para instâncias de desconhecidas).
    pub rare: FrequentWords,
}

/// Contador de pares (palavra, tag).
#[derive(Debug, Clone, Default)]
pub struct TagLex {
    entries: HashMap<String, TagInfo>,
}

impl TagLex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, word: &str, tag: &str) {
        self.entries
            .entry(word.to_string())
            .or_insert_with(|| TagInfo::new(word))
            .update(tag);
    }

    pub fn lookup(&self, word: &str) -> Option<&TagInfo> {
        self.entries.get(word)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entradas por frequência decrescente; empates em ordem de bytes
    /// (maiúsculas antes de minúsculas).
    pub fn sorted_entries(&self) -> Vec<&TagInfo> {
        let mut entries: Vec<&TagInfo> = self.entries.values().collect();
        entries.sort_by(|a, b| b.freq.cmp(&a.freq).then_with(|| a.word.cmp(&b.word)));
        entries
    }

    /// Gera o léxico de ambiguidade e as listas de palavras.
    ///
    /// `npax = None` desliga a lista de palavras raras.
    pub fn build(&self, filter_threshold: u32, top_n: usize, npax: Option<usize>) -> LexiconSet {
        let mut set = LexiconSet::default();
        for (rank, info) in self.sorted_entries().into_iter().enumerate() {
            let mut pruned = info.clone();
            pruned.prune(filter_threshold);
            set.lexicon.insert(&info.word, &pruned.ambiguity_class());
            if rank < top_n {
                set.frequent.insert(&info.word);
            }
            if npax.is_some_and(|n| info.freq <= n) {
                set.rare.insert(&info.word);
            }
        }
        set
    }
}
