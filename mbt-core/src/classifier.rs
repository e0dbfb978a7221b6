//! # Classificador por Memória
//!
//! O etiquetador não aprende pesos: ele guarda todas as instâncias de treino
//! e, para cada padrão novo, procura as instâncias **mais parecidas**. A tag
//! vem dos vizinhos mais próximos.
//!
//! Este módulo define o contrato ([`Classifier`]) e uma implementação mínima
//! em memória ([`InstanceBase`]) com distância de sobreposição sem pesos:
//!
//! ```text
//! d(x, y) = número de posições i em que x[i] ≠ y[i]
//! ```
//!
//! A distribuição retornada reúne os rótulos de todas as instâncias que estão
//! na distância mínima. Ponderação de features e persistência da base ficam
//! fora deste crate; qualquer outro classificador pode entrar pela trait.

use std::fmt;
use std::io::{BufRead, Write};
use std::sync::{Mutex, PoisonError};

use tracing::warn;

use crate::error::{MbtError, Result};
use crate::features::MatchAction;

/// Rótulos com seus pesos, na ordem em que apareceram.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Distribution {
    entries: Vec<(String, f64)>,
}

impl Distribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Soma `weight` ao rótulo, criando-o se necessário.
    pub fn add(&mut self, label: &str, weight: f64) {
        match self.entries.iter_mut().find(|(l, _)| l == label) {
            Some((_, w)) => *w += weight,
            None => self.entries.push((label.to_string(), weight)),
        }
    }

    pub fn entries(&self) -> &[(String, f64)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn weight(&self, label: &str) -> f64 {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, w)| *w)
            .unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }

    /// Fração do peso total que cabe a `label`.
    pub fn confidence(&self, label: &str) -> f64 {
        let total = self.total();
        if total > 0.0 {
            self.weight(label) / total
        } else {
            0.0
        }
    }

    /// Rótulo de maior peso; empates ficam com o primeiro visto.
    pub fn best(&self) -> Option<&str> {
        let mut best: Option<&(String, f64)> = None;
        for entry in &self.entries {
            if best.map_or(true, |b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.map(|(l, _)| l.as_str())
    }
}

impl FromIterator<(String, f64)> for Distribution {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut dist = Distribution::new();
        for (label, weight) in iter {
            dist.add(&label, weight);
        }
        dist
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{ ")?;
        for (i, (label, weight)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} {:.5}", label, weight)?;
        }
        f.write_str(" }")
    }
}

/// Resposta do classificador para um padrão.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: String,
    pub distribution: Distribution,
    pub distance: f64,
}

/// Contrato do classificador externo.
///
/// Deve devolver exatamente um rótulo para cada instância bem formada;
/// `Ok(None)` indica que não houve resposta e é fatal para a sentença.
pub trait Classifier: Send {
    fn classify(&mut self, instance: &str, action: MatchAction) -> Result<Option<Classification>>;
}

/// Classificador compartilhado entre etiquetadores.
///
/// O lock é mantido apenas durante a chamada de classificação.
pub struct SharedClassifier {
    inner: Mutex<Box<dyn Classifier>>,
}

impl SharedClassifier {
    pub fn new<C: Classifier + 'static>(classifier: C) -> Self {
        Self {
            inner: Mutex::new(Box::new(classifier)),
        }
    }

    /// Classifica e converte a ausência de resposta em erro.
    pub fn classify(&self, instance: &str, action: MatchAction) -> Result<Classification> {
        let answer = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .classify(instance, action)?;
        answer.ok_or_else(|| MbtError::NoAnswer {
            instance: instance.to_string(),
        })
    }
}

impl fmt::Debug for SharedClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedClassifier").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Instance {
    features: Vec<String>,
    label: String,
}

/// Base de instâncias em memória com busca exaustiva do vizinho mais próximo.
#[derive(Debug, Clone, Default)]
pub struct InstanceBase {
    instances: Vec<Instance>,
}

impl InstanceBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adiciona uma instância no formato `feat1 ... featN rótulo`.
    pub fn add_line(&mut self, line: &str) -> Result<()> {
        let mut fields: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        let label = fields.pop().ok_or_else(|| MbtError::MalformedLine {
            line: self.instances.len() + 1,
            reason: "empty instance".to_string(),
        })?;
        self.instances.push(Instance {
            features: fields,
            label,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Lê um arquivo de instâncias, uma por linha. Linhas vazias são ignoradas.
    pub fn read<R: BufRead>(reader: R) -> Result<Self> {
        let mut base = Self::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            base.add_line(&line)?;
        }
        Ok(base)
    }

    pub fn write<W: Write>(&self, mut writer: W) -> Result<()> {
        for inst in &self.instances {
            for f in &inst.features {
                write!(writer, "{} ", f)?;
            }
            writeln!(writer, "{}", inst.label)?;
        }
        Ok(())
    }

    /// Varredura sequencial: roda sob o lock de [`SharedClassifier`], e um
    /// `par_iter` aqui dentro de um trabalhador do `rayon` pode reentrar no lock.
    fn nearest(&self, query: &[&str]) -> Option<Classification> {
        if self.instances.is_empty() {
            return None;
        }
        let distances: Vec<usize> = self
            .instances
            .iter()
            .map(|inst| overlap(query, &inst.features))
            .collect();
        let min = *distances.iter().min()?;
        let distribution: Distribution = self
            .instances
            .iter()
            .zip(&distances)
            .filter(|&(_, &d)| d == min)
            .map(|(inst, _)| (inst.label.clone(), 1.0))
            .collect();
        let label = distribution.best()?.to_string();
        Some(Classification {
            label,
            distribution,
            distance: min as f64,
        })
    }
}

impl Classifier for InstanceBase {
    fn classify(&mut self, instance: &str, _action: MatchAction) -> Result<Option<Classification>> {
        let mut fields: Vec<&str> = instance.split_whitespace().collect();
        // O último campo é o rótulo (ou "??").
        fields.pop();
        Ok(self.nearest(&fields))
    }
}

/// Posições diferentes; comprimentos distintos contam como diferenças.
fn overlap(query: &[&str], features: &[String]) -> usize {
    let common = query
        .iter()
        .zip(features)
        .filter(|(q, f)| **q != f.as_str())
        .count();
    common + query.len().abs_diff(features.len())
}

/// Par de bases: uma para palavras conhecidas e outra para desconhecidas.
#[derive(Debug, Clone, Default)]
pub struct CaseBases {
    pub known: InstanceBase,
    pub unknown: InstanceBase,
}

impl Classifier for CaseBases {
    fn classify(&mut self, instance: &str, action: MatchAction) -> Result<Option<Classification>> {
        if action.is_known() {
            return self.known.classify(instance, action);
        }
        if self.unknown.is_empty() {
            warn!("base de desconhecidas vazia; usando a base de conhecidas");
            return self.known.classify(instance, action);
        }
        self.unknown.classify(instance, action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(lines: &[&str]) -> InstanceBase {
        let mut b = InstanceBase::new();
        for l in lines {
            b.add_line(l).unwrap();
        }
        b
    }

    #[test]
    fn test_distribution_display_and_confidence() {
        let mut d = Distribution::new();
        d.add("DT", 3.0);
        d.add("NN", 1.0);
        assert_eq!(d.to_string(), "{ DT 3.00000, NN 1.00000 }");
        assert!((d.confidence("DT") - 0.75).abs() < 1e-12);
        assert_eq!(d.confidence("VB"), 0.0);
    }

    #[test]
    fn test_best_prefers_first_on_ties() {
        let d: Distribution = vec![("NN".to_string(), 1.0), ("VB".to_string(), 1.0)]
            .into_iter()
            .collect();
        assert_eq!(d.best(), Some("NN"));
    }

    #[test]
    fn test_exact_match_wins() {
        let mut b = base(&["== == DT NN;VB NN", "DT NN VBD == VBD", "== == DT VBD DT"]);
        let c = b.classify("DT NN VBD == ??", MatchAction::Known).unwrap().unwrap();
        assert_eq!(c.label, "VBD");
        assert_eq!(c.distance, 0.0);
        assert_eq!(c.distribution.entries().len(), 1);
    }

    #[test]
    fn test_distribution_collects_all_nearest() {
        let mut b = base(&["a b X", "a c Y", "a d Y", "z z Z"]);
        let c = b.classify("a q ??", MatchAction::Known).unwrap().unwrap();
        assert_eq!(c.distance, 1.0);
        assert_eq!(c.label, "Y");
        assert_eq!(c.distribution.to_string(), "{ X 1.00000, Y 2.00000 }");
    }

    #[test]
    fn test_empty_base_has_no_answer() {
        let mut b = InstanceBase::new();
        assert!(b.classify("a ??", MatchAction::Known).unwrap().is_none());
        let shared = SharedClassifier::new(InstanceBase::new());
        assert!(matches!(
            shared.classify("a ??", MatchAction::Known),
            Err(MbtError::NoAnswer { .. })
        ));
    }

    #[test]
    fn test_case_bases_dispatch() {
        let mut cb = CaseBases {
            known: base(&["k K"]),
            unknown: base(&["u U"]),
        };
        let k = cb.classify("k ??", MatchAction::Known).unwrap().unwrap();
        let u = cb.classify("u ??", MatchAction::Unknown).unwrap().unwrap();
        assert_eq!(k.label, "K");
        assert_eq!(u.label, "U");
    }

    #[test]
    fn test_instance_file_round_trip() {
        let b = base(&["a b X", "c d Y"]);
        let mut buf = Vec::new();
        b.write(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf.clone()).unwrap(), "a b X\nc d Y\n");
        assert_eq!(InstanceBase::read(buf.as_slice()).unwrap().len(), 2);
    }
}
