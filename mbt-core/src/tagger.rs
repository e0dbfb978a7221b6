//! # Etiquetador — Orquestração por Sentença
//!
//! O modelo treinado ([`TaggerModel`]) é imutável e compartilhado via `Arc`.
//! Cada [`Tagger`] é um trabalhador: guarda apenas o estado mutável de uma
//! sentença (tabelas do feixe, vetor de padrão) e seu próprio `Span` de log.
//!
//! ```text
//! Sentence ──init_windowing──▶ padrão(0) ──classificar──▶ init_first_position
//!     para i em 1..N:
//!         para cada feixe vivo b:
//!             padrão(i, histórico = paths[b]) ──classificar──▶ extend
//!         shift
//!     paths[0] ──▶ Vec<TagResult>
//! ```
//!
//! Vários `Tagger`s podem rodar em threads diferentes sobre o mesmo modelo
//! ([`Tagger::fork`]); o classificador serializa suas chamadas internamente.

use std::fmt::Write as _;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info_span, Span};

use crate::beam::BeamData;
use crate::classifier::{Classification, Classifier, SharedClassifier};
use crate::config::TaggerConfig;
use crate::error::{MbtError, Result};
use crate::features::{format_instance, FeatureExtractor, MatchAction};
use crate::interner::SharedInterner;
use crate::lexicon::{FrequentWords, Lexicon};
use crate::pattern::PatternTemplate;
use crate::sentence::{InputKind, Sentence};

/// Resultado da etiquetagem de um token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagResult {
    pub word: String,
    /// Tag de referência, quando a entrada é etiquetada.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tag: Option<String>,
    /// Tag atribuída pelo melhor caminho do feixe.
    pub tag: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enrichment: Vec<String>,
    /// A palavra estava no léxico de ambiguidade?
    pub known: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl TagResult {
    /// `true` se há tag de referência e ela coincide com a atribuída.
    pub fn is_correct(&self) -> bool {
        self.input_tag.as_deref() == Some(self.tag.as_str())
    }
}

/// Modelo compartilhado: templates, léxicos, interner e classificador.
#[derive(Debug)]
pub struct TaggerModel {
    config: TaggerConfig,
    known_template: PatternTemplate,
    unknown_template: PatternTemplate,
    interner: SharedInterner,
    lexicon: Lexicon,
    frequent: FrequentWords,
    classifier: SharedClassifier,
}

impl TaggerModel {
    pub fn new<C: Classifier + 'static>(
        config: TaggerConfig,
        lexicon: Lexicon,
        frequent: FrequentWords,
        classifier: C,
    ) -> Result<Self> {
        config.validate()?;
        let (known_template, unknown_template) = config.templates()?;
        Ok(Self {
            config,
            known_template,
            unknown_template,
            interner: SharedInterner::new(),
            lexicon,
            frequent,
            classifier: SharedClassifier::new(classifier),
        })
    }

    /// Reaproveita um interner já populado (por exemplo, o do treino).
    pub fn with_interner(mut self, interner: SharedInterner) -> Self {
        self.interner = interner;
        self
    }

    /// Mesmo modelo, lendo a entrada em outro formato.
    pub fn with_input_kind(mut self, kind: InputKind) -> Self {
        self.config.input_kind = kind;
        self
    }

    pub fn config(&self) -> &TaggerConfig {
        &self.config
    }

    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn frequent(&self) -> &FrequentWords {
        &self.frequent
    }

    pub fn known_template(&self) -> &PatternTemplate {
        &self.known_template
    }

    pub fn unknown_template(&self) -> &PatternTemplate {
        &self.unknown_template
    }

    pub fn extractor(&self) -> FeatureExtractor<'_> {
        FeatureExtractor {
            known: &self.known_template,
            unknown: &self.unknown_template,
            frequent: &self.frequent,
            interner: &self.interner,
        }
    }

    /// Classifica o padrão da posição e converte a resposta em ids.
    fn classify(
        &self,
        sentence: &Sentence,
        position: usize,
        action: MatchAction,
        pattern: &[usize],
    ) -> Result<Step> {
        let word = &sentence.words()[position];
        // Só a entrada `tagged` leva a tag de referência à instância.
        let label = match self.config.input_kind {
            InputKind::Tagged => word.input_tag.as_deref(),
            InputKind::Untagged | InputKind::Enriched => None,
        };
        let instance = format_instance(&self.interner, pattern, &word.enrichment, label)?;
        debug!(position, ?action, %instance, "classificando");
        let classification = self.classifier.classify(&instance, action)?;
        let answer = self.interner.intern(&classification.label);
        let distribution = classification
            .distribution
            .entries()
            .iter()
            .map(|(label, weight)| (self.interner.intern(label), *weight))
            .collect();
        Ok(Step {
            answer,
            distribution,
            classification,
        })
    }
}

/// Uma classificação já traduzida para ids.
struct Step {
    answer: usize,
    distribution: Vec<(usize, f64)>,
    classification: Classification,
}

/// Informação do feixe 0 guardada por posição para a saída.
#[derive(Debug, Clone, Default)]
struct StepInfo {
    distance: f64,
    distribution: String,
    confidence: f64,
}

impl StepInfo {
    fn from_classification(c: &Classification) -> Self {
        Self {
            distance: c.distance,
            distribution: c.distribution.to_string(),
            confidence: c.distribution.confidence(&c.label),
        }
    }
}

/// Trabalhador de etiquetagem.
pub struct Tagger {
    model: Arc<TaggerModel>,
    beam: BeamData,
    pattern: Vec<usize>,
    span: Span,
}

impl Tagger {
    pub fn new(model: Arc<TaggerModel>) -> Self {
        Self {
            model,
            beam: BeamData::new(),
            pattern: Vec::new(),
            span: info_span!("tagger"),
        }
    }

    /// Troca o span em que as mensagens deste etiquetador são emitidas.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Novo trabalhador sobre o mesmo modelo, com estado próprio.
    pub fn fork(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            beam: BeamData::new(),
            pattern: Vec::new(),
            span: self.span.clone(),
        }
    }

    pub fn model(&self) -> &Arc<TaggerModel> {
        &self.model
    }

    /// Probabilidade conjunta do melhor caminho da última sentença decodificada.
    ///
    /// Com K = 1 vale sempre 1.0.
    pub fn last_path_probability(&self) -> f64 {
        self.beam.path_probability(0)
    }

    /// Etiqueta uma linha no formato de entrada configurado.
    pub fn tag_line(&mut self, line: &str) -> Result<Vec<TagResult>> {
        let config = self.model.config();
        let mut sentence = Sentence::from_line(line, config.input_kind, &config.eos_marker)?;
        self.tag_sentence(&mut sentence)
    }

    /// Decodifica a sentença inteira com o feixe configurado.
    pub fn tag_sentence(&mut self, sentence: &mut Sentence) -> Result<Vec<TagResult>> {
        if sentence.is_empty() {
            return Ok(Vec::new());
        }
        let span = self.span.clone();
        let _guard = span.enter();
        let model = Arc::clone(&self.model);
        let width = model.config.beam_size;
        let len = sentence.len();
        debug!(%sentence, width, "decodificando");

        self.beam.init(width, len)?;
        sentence.init_windowing(&model.lexicon, &model.interner);
        let extractor = model.extractor();
        let mut info = vec![StepInfo::default(); len];

        let action = extractor.next_pattern(sentence, MatchAction::Known, 0, None, &mut self.pattern)?;
        let step = model.classify(sentence, 0, action, &self.pattern)?;
        info[0] = StepInfo::from_classification(&step.classification);
        self.beam.init_first_position(step.answer, &step.distribution)?;

        for position in 1..len {
            self.beam.clear_best();
            for beam in 0..width {
                if !self.beam.is_live(beam, position - 1) {
                    break;
                }
                let action = extractor.next_pattern(
                    sentence,
                    MatchAction::Known,
                    position,
                    Some(self.beam.path(beam)),
                    &mut self.pattern,
                )?;
                let step = model.classify(sentence, position, action, &self.pattern)?;
                if beam == 0 {
                    info[position] = StepInfo::from_classification(&step.classification);
                }
                self.beam.extend(position, beam, step.answer, &step.distribution)?;
            }
            self.beam.shift(len, position)?;
        }

        let output = model.config.output;
        let mut results = Vec::with_capacity(len);
        for (position, (word, step)) in sentence.words().iter().zip(info).enumerate() {
            let tag_id = self
                .beam
                .best_tag(position)
                .ok_or(MbtError::NoPath { position })?;
            results.push(TagResult {
                word: word.text.clone(),
                input_tag: word.input_tag.clone(),
                tag: model.interner.resolve(tag_id)?,
                enrichment: word.enrichment.clone(),
                known: sentence.known(position),
                distance: output.distance.then_some(step.distance),
                distribution: output.distribution.then_some(step.distribution),
                confidence: output.confidence.then_some(step.confidence),
            });
        }
        Ok(results)
    }

    /// Formata os resultados de uma sentença como texto.
    ///
    /// Entrada `untagged`: `palavra/TAG` (ou `palavra//TAG` se desconhecida)
    /// separados por espaço. Demais formatos: um token por linha com
    /// tabulações, ecoando a tag de referência.
    pub fn format_results(&self, results: &[TagResult]) -> String {
        let config = self.model.config();
        let sep = config.separator.as_str();
        let mut out = String::new();
        for r in results {
            out.push_str(&r.word);
            let marker = if r.known { sep.to_string() } else { sep.repeat(2) };
            match config.input_kind {
                InputKind::Untagged => {
                    out.push_str(&marker);
                    out.push_str(&r.tag);
                    if let Some(c) = r.confidence {
                        let _ = write!(out, "{}{}", sep, c);
                    }
                    out.push(' ');
                }
                kind => {
                    let _ = write!(out, "\t{}\t", marker);
                    if kind == InputKind::Enriched {
                        out.push_str(&r.enrichment.join(" "));
                        out.push('\t');
                    }
                    let _ = write!(out, "{}\t{}", r.input_tag.as_deref().unwrap_or(""), r.tag);
                    if let Some(c) = r.confidence {
                        let _ = write!(out, " [{}]", c);
                    }
                    if let Some(d) = &r.distribution {
                        let _ = write!(out, " {}", d);
                    }
                    if let Some(d) = r.distance {
                        let _ = write!(out, " {}", d);
                    }
                    out.push('\n');
                }
            }
        }
        if config.input_kind != InputKind::Enriched {
            out.push_str(config.eos_marker.output_text());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Distribution;
    use crate::config::OutputOptions;
    use crate::sentence::{EosMarker, Word};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Classificador de teste: resposta fixa por palavra em foco.
    ///
    /// A palavra é deduzida do padrão `ddfa` pela classe de ambiguidade.
    struct ByClass(HashMap<&'static str, &'static str>);

    impl Classifier for ByClass {
        fn classify(&mut self, instance: &str, _: MatchAction) -> Result<Option<Classification>> {
            let fields: Vec<&str> = instance.split_whitespace().collect();
            let class = fields[2];
            Ok(self.0.get(class).map(|label| Classification {
                label: label.to_string(),
                distribution: vec![(label.to_string(), 1.0)].into_iter().collect(),
                distance: 0.0,
            }))
        }
    }

    /// Resposta fixa por palavra, ignorando o conteúdo das features.
    ///
    /// Com K = 1 há uma classificação por posição, da esquerda para a direita.
    struct ByWord {
        words: Vec<&'static str>,
        labels: HashMap<&'static str, &'static str>,
        next: usize,
    }

    impl Classifier for ByWord {
        fn classify(&mut self, _: &str, _: MatchAction) -> Result<Option<Classification>> {
            let word = self.words[self.next % self.words.len()];
            self.next += 1;
            Ok(self.labels.get(word).map(|label| Classification {
                label: label.to_string(),
                distribution: vec![(label.to_string(), 1.0)].into_iter().collect(),
                distance: 0.0,
            }))
        }
    }

    /// Guarda as instâncias recebidas e responde sempre `DT`.
    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl Classifier for Recorder {
        fn classify(&mut self, instance: &str, _: MatchAction) -> Result<Option<Classification>> {
            self.0.lock().unwrap().push(instance.to_string());
            Ok(Some(Classification {
                label: "DT".into(),
                distribution: Distribution::new(),
                distance: 0.0,
            }))
        }
    }

    fn lexicon() -> Lexicon {
        let mut lex = Lexicon::new();
        lex.insert("The", "DT");
        lex.insert("cat", "NN");
        lex.insert("sat", "VBD");
        lex
    }

    fn model(config: TaggerConfig) -> Arc<TaggerModel> {
        let classes = HashMap::from([("DT", "DT"), ("NN", "NN"), ("VBD", "VBD")]);
        Arc::new(TaggerModel::new(config, lexicon(), FrequentWords::new(), ByClass(classes)).unwrap())
    }

    #[test]
    fn test_the_cat_sat() {
        let stub = ByWord {
            words: vec!["The", "cat", "sat"],
            labels: HashMap::from([("The", "DT"), ("cat", "NN"), ("sat", "VBD")]),
            next: 0,
        };
        let model = TaggerModel::new(TaggerConfig::default(), lexicon(), FrequentWords::new(), stub).unwrap();
        let mut tagger = Tagger::new(Arc::new(model));
        let results = tagger.tag_line("The cat sat").unwrap();
        let tags: Vec<&str> = results.iter().map(|r| r.tag.as_str()).collect();
        assert_eq!(tags, vec!["DT", "NN", "VBD"]);
        assert!(results.iter().all(|r| r.known));
        assert_eq!(tagger.format_results(&results), "The/DT cat/NN sat/VBD <utt>");
    }

    #[test]
    fn test_instance_label_only_for_tagged_input() {
        let label_of = |kind: InputKind, word: Word| {
            let seen = Arc::new(Mutex::new(Vec::new()));
            let config = TaggerConfig {
                input_kind: kind,
                ..TaggerConfig::default()
            };
            let model =
                TaggerModel::new(config, lexicon(), FrequentWords::new(), Recorder(Arc::clone(&seen))).unwrap();
            let mut tagger = Tagger::new(Arc::new(model));
            tagger.tag_sentence(&mut Sentence::from_words(vec![word])).unwrap();
            let instance = seen.lock().unwrap()[0].clone();
            instance.rsplit(' ').next().unwrap().to_string()
        };
        assert_eq!(label_of(InputKind::Tagged, Word::tagged("The", "DT")), "DT");
        assert_eq!(
            label_of(InputKind::Enriched, Word::enriched("The", vec!["x1".into()], "DT")),
            "??"
        );
    }

    #[test]
    fn test_greedy_path_probability_is_one() {
        let mut tagger = Tagger::new(model(TaggerConfig::default()));
        tagger.tag_line("The cat sat").unwrap();
        assert_eq!(tagger.last_path_probability(), 1.0);
    }

    #[test]
    fn test_empty_line_gives_no_results() {
        let mut tagger = Tagger::new(model(TaggerConfig::default()));
        assert!(tagger.tag_line("   ").unwrap().is_empty());
    }

    #[test]
    fn test_no_answer_is_fatal() {
        let mut tagger = Tagger::new(model(TaggerConfig::default()));
        // "dog" é desconhecida: classe "__" não tem resposta no stub
        let err = tagger.tag_line("The dog").unwrap_err();
        assert!(matches!(err, MbtError::NoAnswer { .. }));
    }

    #[test]
    fn test_forks_share_model() {
        let tagger = Tagger::new(model(TaggerConfig::default()));
        let mut fork = tagger.fork();
        assert!(Arc::ptr_eq(tagger.model(), fork.model()));
        assert_eq!(fork.tag_line("cat").unwrap()[0].tag, "NN");
    }

    #[test]
    fn test_tagged_output_format() {
        let config = TaggerConfig {
            input_kind: InputKind::Tagged,
            output: OutputOptions {
                confidence: true,
                ..OutputOptions::default()
            },
            ..TaggerConfig::default()
        };
        let mut tagger = Tagger::new(model(config));
        let mut sentence = Sentence::from_words(vec![Word::tagged("The", "DT")]);
        let results = tagger.tag_sentence(&mut sentence).unwrap();
        assert!(results[0].is_correct());
        assert_eq!(tagger.format_results(&results), "The\t/\tDT\tDT [1]\n<utt>");
    }

    #[test]
    fn test_untagged_unknown_marker() {
        let tagger = Tagger::new(model(TaggerConfig {
            eos_marker: EosMarker::EmptyLine,
            ..TaggerConfig::default()
        }));
        let results = vec![TagResult {
            word: "zyx".into(),
            input_tag: None,
            tag: "NN".into(),
            enrichment: Vec::new(),
            known: false,
            distance: None,
            distribution: None,
            confidence: None,
        }];
        assert_eq!(tagger.format_results(&results), "zyx//NN ");
    }

    #[test]
    fn test_distribution_is_reported() {
        let config = TaggerConfig {
            output: OutputOptions {
                distribution: true,
                distance: true,
                confidence: false,
            },
            ..TaggerConfig::default()
        };
        let mut tagger = Tagger::new(model(config));
        let r = tagger.tag_line("cat").unwrap();
        let expected: Distribution = vec![("NN".to_string(), 1.0)].into_iter().collect();
        assert_eq!(r[0].distribution.as_deref(), Some(expected.to_string().as_str()));
        assert_eq!(r[0].distance, Some(0.0));
        assert_eq!(r[0].confidence, None);
    }
}
