//! # Pipeline — Processamento de Arquivos e Lotes
//!
//! Conecta leitura, etiquetagem e escrita:
//!
//! - [`Pipeline::process`]: lê sentenças no formato configurado, escreve uma
//!   linha (ou bloco) formatada por sentença e devolve estatísticas.
//! - [`Pipeline::process_lines`]: cada linha da entrada é uma sentença.
//! - [`Pipeline::tag_batch`]: etiqueta muitas linhas em paralelo, com um
//!   [`Tagger`] por thread do `rayon`.

use std::fmt;
use std::io::{BufRead, Write};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::info;

use crate::config::TaggerConfig;
use crate::corpus::{get_corpus, to_tagged_text};
use crate::error::Result;
use crate::sentence::{InputKind, SentenceReader};
use crate::tagger::{TagResult, Tagger, TaggerModel};
use crate::training::Trainer;

/// Contagens acumuladas durante o processamento.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessStats {
    pub sentences: usize,
    pub known: usize,
    pub unknown: usize,
    pub correct_known: usize,
    pub correct_unknown: usize,
    pub skipped_lines: usize,
    /// A entrada trazia tags de referência?
    pub scored: bool,
}

impl ProcessStats {
    pub fn words(&self) -> usize {
        self.known + self.unknown
    }

    pub fn record(&mut self, results: &[TagResult]) {
        self.sentences += 1;
        for r in results {
            let correct = usize::from(r.is_correct());
            if r.known {
                self.known += 1;
                self.correct_known += correct;
            } else {
                self.unknown += 1;
                self.correct_unknown += correct;
            }
        }
    }

    /// Acurácia geral em `[0, 1]`, quando há referência.
    pub fn accuracy(&self) -> Option<f64> {
        (self.scored && self.words() > 0)
            .then(|| (self.correct_known + self.correct_unknown) as f64 / self.words() as f64)
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

impl fmt::Display for ProcessStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Done: {} words processed.", self.words())?;
        if self.scored {
            writeln!(
                f,
                "  Known   : {} correct from {} ({:.2} %)",
                self.correct_known,
                self.known,
                percent(self.correct_known, self.known)
            )?;
            writeln!(
                f,
                "  Unknown : {} correct from {} ({:.2} %)",
                self.correct_unknown,
                self.unknown,
                percent(self.correct_unknown, self.unknown)
            )?;
            let correct = self.correct_known + self.correct_unknown;
            write!(
                f,
                "  Total   : {} correct from {} ({:.2} %)",
                correct,
                self.words(),
                percent(correct, self.words())
            )
        } else {
            writeln!(f, "  Known   words: {}", self.known)?;
            writeln!(
                f,
                "  Unknown words: {} ({:.2} %)",
                self.unknown,
                percent(self.unknown, self.words())
            )?;
            write!(f, "  Total        : {}", self.words())
        }
    }
}

/// Pipeline de etiquetagem sobre um modelo compartilhado.
pub struct Pipeline {
    tagger: Tagger,
}

impl Pipeline {
    pub fn new(model: Arc<TaggerModel>) -> Self {
        Self {
            tagger: Tagger::new(model),
        }
    }

    /// Modelo de demonstração treinado com o corpus embutido.
    ///
    /// `config.input_kind` vale para a etiquetagem; o treino sempre lê o
    /// corpus como `tagged`.
    pub fn demo(config: TaggerConfig) -> Result<Self> {
        let kind = config.input_kind;
        let training = TaggerConfig {
            input_kind: InputKind::Tagged,
            ..config
        };
        let text = to_tagged_text(&get_corpus(), training.eos_marker.output_text());
        let (model, report) = Trainer::new(training)?.train(text.as_bytes())?;
        info!(words = report.words, sentences = report.sentences, "modelo de demonstração pronto");
        let model = model.with_input_kind(kind);
        Ok(Self::new(Arc::new(model)))
    }

    pub fn tagger(&self) -> &Tagger {
        &self.tagger
    }

    pub fn tagger_mut(&mut self) -> &mut Tagger {
        &mut self.tagger
    }

    pub fn model(&self) -> &Arc<TaggerModel> {
        self.tagger.model()
    }

    /// Etiqueta toda a entrada, escrevendo uma saída formatada por sentença.
    pub fn process<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<ProcessStats> {
        let config = self.model().config().clone();
        let eos_text = config.eos_marker.output_text().to_string();
        let mut reader = SentenceReader::new(input, config.input_kind, config.eos_marker.clone());
        let mut stats = ProcessStats {
            scored: config.input_kind != InputKind::Untagged,
            ..ProcessStats::default()
        };

        while let Some(mut sentence) = reader.next_sentence()? {
            if config.input_kind == InputKind::Enriched
                && sentence.word(0).is_some_and(|w| w.text == eos_text)
            {
                writeln!(output, "{}", eos_text)?;
                continue;
            }
            let results = self.tagger.tag_sentence(&mut sentence)?;
            if results.is_empty() {
                continue;
            }
            stats.record(&results);
            writeln!(output, "{}", self.tagger.format_results(&results))?;
        }
        stats.skipped_lines = reader.skipped_lines();
        info!(
            lines = reader.line_number(),
            words = stats.words(),
            sentences = stats.sentences,
            "processamento concluído"
        );
        Ok(stats)
    }

    /// Cada linha da entrada é uma sentença.
    pub fn process_lines<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<ProcessStats> {
        let mut stats = ProcessStats {
            scored: self.model().config().input_kind != InputKind::Untagged,
            ..ProcessStats::default()
        };
        for line in input.lines() {
            let results = self.tagger.tag_line(&line?)?;
            if results.is_empty() {
                continue;
            }
            stats.record(&results);
            writeln!(output, "{}", self.tagger.format_results(&results))?;
        }
        Ok(stats)
    }

    /// Etiqueta linhas independentes em paralelo, preservando a ordem.
    pub fn tag_batch<S: AsRef<str> + Sync>(&self, lines: &[S]) -> Result<Vec<Vec<TagResult>>> {
        lines
            .par_iter()
            .map_init(|| self.tagger.fork(), |tagger, line| tagger.tag_line(line.as_ref()))
            .collect()
    }
}
