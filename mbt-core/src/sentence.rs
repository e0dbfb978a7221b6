//! # Sentenças, Palavras e Leitura de Corpus
//!
//! Uma [`Sentence`] é a unidade de trabalho do etiquetador: uma sequência fixa
//! de [`Word`]s. Depois de construída, apenas a tag atribuída de cada palavra e
//! os campos de consulta preenchidos por [`Sentence::init_windowing`] mudam.
//!
//! ## Formatos de entrada
//!
//! | Formato     | Linha                              | Fronteira de sentença        |
//! |-------------|------------------------------------|------------------------------|
//! | `untagged`  | tokens separados por espaço        | token marcador ou linha vazia|
//! | `tagged`    | `palavra tag` (uma por linha)      | linha com o marcador         |
//! | `enriched`  | `palavra feat1 ... featN tag`      | linha com o marcador         |
//!
//! O marcador especial `"EL"` significa "linha vazia".

use std::collections::VecDeque;
use std::fmt;
use std::io::BufRead;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{MbtError, Result};
use crate::features::UNKNOWN;
use crate::interner::SharedInterner;
use crate::lexicon::Lexicon;

/// Formato das linhas de entrada.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// Texto corrido, sem tags.
    #[default]
    Untagged,
    /// Uma palavra por linha, seguida da tag correta.
    Tagged,
    /// Uma palavra por linha, features extras e a tag correta por último.
    Enriched,
}

/// Marcador de fim de sentença.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EosMarker {
    /// Linha em branco (`"EL"` na configuração).
    EmptyLine,
    /// Token literal, por exemplo `<utt>`.
    Token(String),
}

impl EosMarker {
    pub fn parse(s: &str) -> Self {
        if s == "EL" {
            EosMarker::EmptyLine
        } else {
            EosMarker::Token(s.to_string())
        }
    }

    /// `true` se `s` encerra a sentença.
    pub fn is_terminator(&self, s: &str) -> bool {
        match self {
            EosMarker::EmptyLine => s.is_empty(),
            EosMarker::Token(t) => s == t,
        }
    }

    /// Texto anexado à saída de cada sentença (vazio para linha em branco).
    pub fn output_text(&self) -> &str {
        match self {
            EosMarker::EmptyLine => "",
            EosMarker::Token(t) => t,
        }
    }
}

impl Default for EosMarker {
    fn default() -> Self {
        EosMarker::Token("<utt>".to_string())
    }
}

impl From<String> for EosMarker {
    fn from(s: String) -> Self {
        EosMarker::parse(&s)
    }
}

impl From<EosMarker> for String {
    fn from(m: EosMarker) -> Self {
        match m {
            EosMarker::EmptyLine => "EL".to_string(),
            EosMarker::Token(t) => t,
        }
    }
}

/// Uma palavra da sentença.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    /// Tag de referência (entrada `tagged`/`enriched`).
    pub input_tag: Option<String>,
    /// Features extras, na ordem da entrada.
    pub enrichment: Vec<String>,
    word_id: Option<usize>,
    ambiguity: Option<usize>,
    assigned: Option<usize>,
}

impl Word {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            input_tag: None,
            enrichment: Vec::new(),
            word_id: None,
            ambiguity: None,
            assigned: None,
        }
    }

    pub fn tagged(text: &str, tag: &str) -> Self {
        Self {
            input_tag: Some(tag.to_string()),
            ..Self::new(text)
        }
    }

    pub fn enriched(text: &str, enrichment: Vec<String>, tag: &str) -> Self {
        Self {
            enrichment,
            ..Self::tagged(text, tag)
        }
    }

    pub fn word_id(&self) -> Option<usize> {
        self.word_id
    }

    /// Id da classe de ambiguidade (ou do sentinela de desconhecida).
    pub fn ambiguity(&self) -> Option<usize> {
        self.ambiguity
    }

    pub fn assigned(&self) -> Option<usize> {
        self.assigned
    }
}

/// Sequência ordenada de palavras.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sentence {
    words: Vec<Word>,
    unknown_id: Option<usize>,
}

impl Sentence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_words(words: Vec<Word>) -> Self {
        Self {
            words,
            unknown_id: None,
        }
    }

    /// Monta uma sentença a partir de uma única linha de texto.
    ///
    /// Para entrada `untagged`, apenas os tokens antes do primeiro marcador
    /// são usados.
    pub fn from_line(line: &str, kind: InputKind, eos: &EosMarker) -> Result<Self> {
        let mut reader = SentenceReader::new(line.as_bytes(), kind, eos.clone());
        Ok(reader.next_sentence()?.unwrap_or_default())
    }

    pub fn push(&mut self, word: Word) {
        self.words.push(word);
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn word(&self, i: usize) -> Option<&Word> {
        self.words.get(i)
    }

    /// Consulta o dicionário de ambiguidade para cada palavra.
    ///
    /// Palavras ausentes recebem o id reservado de "desconhecida". Retorna
    /// `false` para sentenças vazias.
    pub fn init_windowing(&mut self, lexicon: &Lexicon, interner: &SharedInterner) -> bool {
        if self.words.is_empty() {
            return false;
        }
        let unknown = interner.intern(UNKNOWN);
        self.unknown_id = Some(unknown);
        for word in &mut self.words {
            word.word_id = Some(interner.intern(&word.text));
            word.ambiguity = Some(match lexicon.lookup(&word.text) {
                Some(class) => interner.intern(class),
                None => unknown,
            });
        }
        true
    }

    /// `true` se a palavra em `i` foi encontrada no dicionário.
    pub fn known(&self, i: usize) -> bool {
        match (self.words.get(i), self.unknown_id) {
            (Some(word), Some(unknown)) => word.ambiguity.is_some_and(|a| a != unknown),
            _ => false,
        }
    }

    /// Grava a tag atribuída; posições fora da sentença são ignoradas.
    pub fn assign_tag(&mut self, position: usize, tag: usize) {
        if let Some(word) = self.words.get_mut(position) {
            word.assigned = Some(tag);
        }
    }

    /// Features extras da palavra, separadas por espaço.
    pub fn enrichment_string(&self, i: usize) -> String {
        self.words
            .get(i)
            .map(|w| w.enrichment.join(" "))
            .unwrap_or_default()
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let texts: Vec<&str> = self.words.iter().map(|w| w.text.as_str()).collect();
        write!(f, "Sentence: '{}'", texts.join(", "))
    }
}

/// Leitor incremental de sentenças sobre qualquer [`BufRead`].
///
/// Linhas malformadas são descartadas com um aviso e contadas em
/// [`SentenceReader::skipped_lines`]; a leitura continua normalmente.
/// Sentenças vazias nunca são devolvidas.
pub struct SentenceReader<R> {
    reader: R,
    kind: InputKind,
    eos: EosMarker,
    line_no: usize,
    skipped: usize,
    /// Tokens lidos depois de um marcador no meio de uma linha (`untagged`).
    pending: VecDeque<String>,
    buf: String,
}

impl<R: BufRead> SentenceReader<R> {
    pub fn new(reader: R, kind: InputKind, eos: EosMarker) -> Self {
        Self {
            reader,
            kind,
            eos,
            line_no: 0,
            skipped: 0,
            pending: VecDeque::new(),
            buf: String::new(),
        }
    }

    pub fn line_number(&self) -> usize {
        self.line_no
    }

    pub fn skipped_lines(&self) -> usize {
        self.skipped
    }

    /// Próxima sentença não vazia, ou `None` no fim da entrada.
    pub fn next_sentence(&mut self) -> Result<Option<Sentence>> {
        match self.kind {
            InputKind::Untagged => self.read_untagged(),
            InputKind::Tagged | InputKind::Enriched => self.read_one_per_line(),
        }
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        self.buf.clear();
        if self.reader.read_line(&mut self.buf)? == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        Ok(Some(self.buf.trim().to_string()))
    }

    fn skip(&mut self, reason: &str) {
        let err = MbtError::MalformedLine {
            line: self.line_no,
            reason: reason.to_string(),
        };
        warn!(%err, "linha ignorada");
        self.skipped += 1;
    }

    fn read_one_per_line(&mut self) -> Result<Option<Sentence>> {
        let mut sentence = Sentence::new();
        let kind = self.kind;
        loop {
            let Some(line) = self.read_line()? else { break };
            if line.is_empty() {
                if self.eos == EosMarker::EmptyLine && !sentence.is_empty() {
                    return Ok(Some(sentence));
                }
                continue;
            }
            if self.eos.is_terminator(&line) {
                if !sentence.is_empty() {
                    return Ok(Some(sentence));
                }
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            let word = match (kind, fields.as_slice()) {
                (InputKind::Tagged, [word, tag]) => Word::tagged(word, tag),
                (InputKind::Tagged, [_]) => {
                    self.skip("missing a tag?");
                    continue;
                }
                (InputKind::Tagged, _) => {
                    self.skip("extra values found");
                    continue;
                }
                (_, [word, middle @ .., tag]) => Word::enriched(
                    word,
                    middle.iter().map(|s| s.to_string()).collect(),
                    tag,
                ),
                _ => {
                    self.skip("enriched line needs a word and a tag");
                    continue;
                }
            };
            sentence.push(word);
        }
        Ok((!sentence.is_empty()).then_some(sentence))
    }

    fn read_untagged(&mut self) -> Result<Option<Sentence>> {
        let mut sentence = Sentence::new();
        loop {
            let tokens: Vec<String> = if !self.pending.is_empty() {
                self.pending.drain(..).collect()
            } else {
                let eos_is_blank = self.eos == EosMarker::EmptyLine;
                let Some(line) = self.read_line()? else { break };
                if line.is_empty() {
                    if eos_is_blank && !sentence.is_empty() {
                        return Ok(Some(sentence));
                    }
                    continue;
                }
                line.split_whitespace().map(str::to_string).collect()
            };

            let mut terminated = false;
            for token in tokens {
                if terminated {
                    self.pending.push_back(token);
                } else if self.eos.is_terminator(&token) {
                    terminated = true;
                } else {
                    sentence.push(Word::new(&token));
                }
            }
            if terminated && !sentence.is_empty() {
                return Ok(Some(sentence));
            }
        }
        Ok((!sentence.is_empty()).then_some(sentence))
    }
}

impl<R: BufRead> Iterator for SentenceReader<R> {
    type Item = Result<Sentence>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_sentence().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(input: &str, kind: InputKind, eos: &str) -> (Vec<Sentence>, usize) {
        let mut reader = SentenceReader::new(input.as_bytes(), kind, EosMarker::parse(eos));
        let sentences: Vec<Sentence> = reader.by_ref().map(|s| s.unwrap()).collect();
        (sentences, reader.skipped_lines())
    }

    fn texts(s: &Sentence) -> Vec<&str> {
        s.words().iter().map(|w| w.text.as_str()).collect()
    }

    #[test]
    fn test_tagged_skips_line_without_tag() {
        let (sentences, skipped) = read_all("word1 TAG1\nword2\n", InputKind::Tagged, "<utt>");
        assert_eq!(sentences.len(), 1);
        assert_eq!(texts(&sentences[0]), vec!["word1"]);
        assert_eq!(sentences[0].words()[0].input_tag.as_deref(), Some("TAG1"));
        assert_eq!(skipped, 1);
    }

    #[test]
    fn test_tagged_skips_line_with_extra_values() {
        let (sentences, skipped) = read_all("a DT\nb NN X\nc VB\n", InputKind::Tagged, "<utt>");
        assert_eq!(texts(&sentences[0]), vec!["a", "c"]);
        assert_eq!(skipped, 1);
    }

    #[test]
    fn test_tagged_marker_splits_sentences() {
        let input = "The DT\ncat NN\n<utt>\nIt PRP\n<utt>\n";
        let (sentences, _) = read_all(input, InputKind::Tagged, "<utt>");
        assert_eq!(sentences.len(), 2);
        assert_eq!(texts(&sentences[1]), vec!["It"]);
    }

    #[test]
    fn test_line_number_tracks_consumed_lines() {
        let input = "The DT\ncat NN\n<utt>\nIt PRP\n";
        let mut reader = SentenceReader::new(input.as_bytes(), InputKind::Tagged, EosMarker::default());
        assert_eq!(reader.line_number(), 0);
        reader.next_sentence().unwrap();
        assert_eq!(reader.line_number(), 3);
        reader.next_sentence().unwrap();
        assert_eq!(reader.line_number(), 4);
    }

    #[test]
    fn test_tagged_empty_line_marker() {
        let input = "The DT\ncat NN\n\n\nIt PRP\n";
        let (sentences, _) = read_all(input, InputKind::Tagged, "EL");
        assert_eq!(sentences.len(), 2);
        // Sem "EL", linhas vazias são apenas ignoradas
        let (sentences, _) = read_all(input, InputKind::Tagged, "<utt>");
        assert_eq!(sentences.len(), 1);
        assert_eq!(sentences[0].len(), 3);
    }

    #[test]
    fn test_untagged_marker_mid_line_carries_remainder() {
        let input = "the cat <utt> a dog <utt> it\nran\n";
        let (sentences, _) = read_all(input, InputKind::Untagged, "<utt>");
        assert_eq!(sentences.len(), 3);
        assert_eq!(texts(&sentences[0]), vec!["the", "cat"]);
        assert_eq!(texts(&sentences[1]), vec!["a", "dog"]);
        assert_eq!(texts(&sentences[2]), vec!["it", "ran"]);
    }

    #[test]
    fn test_enriched_fields() {
        let (sentences, skipped) =
            read_all("Paris NNP-feat x1 NNP\nlonely\n", InputKind::Enriched, "<utt>");
        let w = &sentences[0].words()[0];
        assert_eq!(w.text, "Paris");
        assert_eq!(w.enrichment, vec!["NNP-feat", "x1"]);
        assert_eq!(w.input_tag.as_deref(), Some("NNP"));
        assert_eq!(skipped, 1);
        assert_eq!(sentences[0].enrichment_string(0), "NNP-feat x1");
    }

    #[test]
    fn test_known_after_windowing() {
        let mut lexicon = Lexicon::new();
        lexicon.insert("the", "DT");
        let interner = SharedInterner::new();
        let mut sentence = Sentence::from_line("the zyzzyva", InputKind::Untagged, &EosMarker::default()).unwrap();
        assert!(!sentence.known(0));
        assert!(sentence.init_windowing(&lexicon, &interner));
        assert!(sentence.known(0));
        assert!(!sentence.known(1));
        assert!(!sentence.known(5));
        let unknown = interner.get(UNKNOWN).unwrap();
        assert_eq!(sentence.words()[1].ambiguity(), Some(unknown));
    }

    #[test]
    fn test_empty_sentence_windowing_fails() {
        let mut sentence = Sentence::new();
        assert!(!sentence.init_windowing(&Lexicon::new(), &SharedInterner::new()));
    }

    #[test]
    fn test_eos_marker_serde() {
        let m: EosMarker = serde_json::from_str("\"EL\"").unwrap();
        assert_eq!(m, EosMarker::EmptyLine);
        assert_eq!(serde_json::to_string(&EosMarker::default()).unwrap(), "\"<utt>\"");
    }
}
