//! # Treinamento a partir de Corpus Etiquetado
//!
//! "Treinar" um etiquetador baseado em memória significa apenas **guardar
//! exemplos**. A partir de um corpus `palavra tag`:
//!
//! 1. [`TagLex`] conta as tags de cada palavra e gera o léxico de
//!    ambiguidade, a lista de palavras frequentes e a lista de palavras raras.
//! 2. Cada posição de cada sentença vira uma instância `MakeKnown` e, se a
//!    palavra for rara, também uma instância `MakeUnknown`. As tags corretas
//!    são gravadas na sentença à medida que ela é percorrida, então os slots
//!    `d` veem o histórico verdadeiro.
//! 3. As instâncias formam as duas bases ([`CaseBases`]) do classificador.
//!
//! As sentenças são processadas em paralelo com `rayon`; a ordem das
//! instâncias é preservada.

use std::fmt;
use std::io::BufRead;

use rayon::prelude::*;
use tracing::info;

use crate::classifier::CaseBases;
use crate::config::TaggerConfig;
use crate::error::{MbtError, Result};
use crate::features::{format_instance, FeatureExtractor, MatchAction};
use crate::interner::SharedInterner;
use crate::lexicon::{LexiconSet, TagLex};
use crate::pattern::PatternTemplate;
use crate::sentence::{InputKind, Sentence, SentenceReader};
use crate::tagger::TaggerModel;

/// Números do treinamento.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrainingReport {
    pub sentences: usize,
    pub words: usize,
    pub lexicon_entries: usize,
    pub known_instances: usize,
    pub unknown_instances: usize,
    pub skipped_lines: usize,
}

impl fmt::Display for TrainingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sentences          : {}", self.sentences)?;
        writeln!(f, "Words              : {}", self.words)?;
        writeln!(f, "Lexicon entries    : {}", self.lexicon_entries)?;
        writeln!(f, "Known instances    : {}", self.known_instances)?;
        writeln!(f, "Unknown instances  : {}", self.unknown_instances)?;
        write!(f, "Skipped lines      : {}", self.skipped_lines)
    }
}

/// Tudo o que o treinamento produz, antes de virar um [`TaggerModel`].
#[derive(Debug)]
pub struct TrainingOutput {
    pub lexicons: LexiconSet,
    pub bases: CaseBases,
    pub interner: SharedInterner,
    pub report: TrainingReport,
}

pub struct Trainer {
    config: TaggerConfig,
    known: PatternTemplate,
    unknown: PatternTemplate,
}

impl Trainer {
    pub fn new(config: TaggerConfig) -> Result<Self> {
        config.validate()?;
        if config.input_kind == InputKind::Untagged {
            return Err(MbtError::InvalidConfig(
                "training needs tagged or enriched input".into(),
            ));
        }
        let (known, unknown) = config.templates()?;
        Ok(Self {
            config,
            known,
            unknown,
        })
    }

    /// Lê o corpus e treina o modelo completo.
    pub fn train<R: BufRead>(&self, reader: R) -> Result<(TaggerModel, TrainingReport)> {
        let mut sentence_reader =
            SentenceReader::new(reader, self.config.input_kind, self.config.eos_marker.clone());
        let mut sentences = Vec::new();
        while let Some(sentence) = sentence_reader.next_sentence()? {
            sentences.push(sentence);
        }
        let mut output = self.build(&sentences)?;
        output.report.skipped_lines = sentence_reader.skipped_lines();
        self.into_model(output)
    }

    /// Monta o modelo a partir de sentenças já lidas.
    pub fn train_sentences(&self, sentences: &[Sentence]) -> Result<(TaggerModel, TrainingReport)> {
        let output = self.build(sentences)?;
        self.into_model(output)
    }

    fn into_model(&self, output: TrainingOutput) -> Result<(TaggerModel, TrainingReport)> {
        let report = output.report;
        info!(
            sentences = report.sentences,
            words = report.words,
            known = report.known_instances,
            unknown = report.unknown_instances,
            "modelo treinado"
        );
        let model = TaggerModel::new(
            self.config.clone(),
            output.lexicons.lexicon,
            output.lexicons.frequent,
            output.bases,
        )?
        .with_interner(output.interner);
        Ok((model, report))
    }

    /// Gera léxicos e bases de instâncias.
    pub fn build(&self, sentences: &[Sentence]) -> Result<TrainingOutput> {
        let eos = self.config.eos_marker.output_text();
        let sentences: Vec<&Sentence> = sentences
            .iter()
            .filter(|s| s.word(0).is_some_and(|w| w.text != eos))
            .collect();

        let mut taglex = TagLex::new();
        for sentence in &sentences {
            for word in sentence.words() {
                if let Some(tag) = &word.input_tag {
                    taglex.store(&word.text, tag);
                }
            }
        }
        let lexicons = taglex.build(
            self.config.filter_threshold,
            self.config.top_n,
            self.config.npax_limit(),
        );

        let interner = SharedInterner::new();
        let extractor = FeatureExtractor {
            known: &self.known,
            unknown: &self.unknown,
            frequent: &lexicons.frequent,
            interner: &interner,
        };
        let use_npax = self.config.npax_limit().is_some();

        let per_sentence: Vec<(Vec<String>, Vec<String>)> = sentences
            .par_iter()
            .map(|sentence| {
                let mut sentence = (*sentence).clone();
                make_instances(&mut sentence, &extractor, &lexicons, use_npax)
            })
            .collect::<Result<_>>()?;

        let mut bases = CaseBases::default();
        for (known, unknown) in &per_sentence {
            for line in known {
                bases.known.add_line(line)?;
            }
            for line in unknown {
                bases.unknown.add_line(line)?;
            }
        }

        let report = TrainingReport {
            sentences: sentences.len(),
            words: sentences.iter().map(|s| s.len()).sum(),
            lexicon_entries: lexicons.lexicon.len(),
            known_instances: bases.known.len(),
            unknown_instances: bases.unknown.len(),
            skipped_lines: 0,
        };
        Ok(TrainingOutput {
            lexicons,
            bases,
            interner,
            report,
        })
    }
}

/// Instâncias de conhecidas e desconhecidas de uma sentença.
fn make_instances(
    sentence: &mut Sentence,
    extractor: &FeatureExtractor<'_>,
    lexicons: &LexiconSet,
    use_npax: bool,
) -> Result<(Vec<String>, Vec<String>)> {
    let mut known = Vec::with_capacity(sentence.len());
    let mut unknown = Vec::new();
    let mut pattern = Vec::new();
    if !sentence.init_windowing(&lexicons.lexicon, extractor.interner) {
        return Ok((known, unknown));
    }
    for position in 0..sentence.len() {
        let word = &sentence.words()[position];
        let gold = word.input_tag.clone().unwrap_or_default();
        let enrichment = word.enrichment.clone();
        let rare = !use_npax || lexicons.rare.contains(&word.text);

        extractor.next_pattern(sentence, MatchAction::MakeKnown, position, None, &mut pattern)?;
        known.push(format_instance(extractor.interner, &pattern, &enrichment, Some(&gold))?);

        if rare {
            extractor.next_pattern(sentence, MatchAction::MakeUnknown, position, None, &mut pattern)?;
            unknown.push(format_instance(extractor.interner, &pattern, &enrichment, Some(&gold))?);
        }

        let tag = extractor.interner.intern(&gold);
        sentence.assign_tag(position, tag);
    }
    Ok((known, unknown))
}
