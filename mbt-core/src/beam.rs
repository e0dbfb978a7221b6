//! # Decodificação em Feixe (N-best)
//!
//! Em vez de confiar apenas na melhor resposta do classificador em cada
//! posição (decodificação gulosa), o decodificador mantém as **K melhores
//! sequências parciais de tags**, com a probabilidade conjunta de cada uma.
//!
//! ## Estruturas
//!
//! | Campo        | Forma   | Conteúdo                                          |
//! |--------------|---------|---------------------------------------------------|
//! | `paths`      | K × N   | tag de cada posição em cada feixe (`None` = vazio) |
//! | `scratch`    | K × N   | tabela temporária usada por `shift`               |
//! | `path_prob`  | K       | probabilidade conjunta de cada feixe              |
//! | `best`       | K       | candidatos da posição atual, ordem decrescente    |
//!
//! ## Um passo
//!
//! ```text
//! clear_best()
//! para cada feixe b vivo:
//!     distribuição = classificar(padrão com paths[b] como histórico)
//!     extend(b, resposta, distribuição)     // insere p × path_prob[b] em best
//! shift(N, i)                               // best vira a nova tabela paths
//! ```
//!
//! Com K = 1 o decodificador se reduz à decodificação gulosa: a resposta do
//! classificador é aceita com probabilidade 1.

use tracing::debug;

use crate::error::{MbtError, Result};

/// Tabela K × N de tags opcionais.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathTable {
    width: usize,
    len: usize,
    cells: Vec<Option<usize>>,
}

impl PathTable {
    pub fn new(width: usize, len: usize) -> Self {
        Self {
            width,
            len,
            cells: vec![None; width * len],
        }
    }

    /// Redimensiona reaproveitando a alocação e limpa todas as células.
    pub fn reset(&mut self, width: usize, len: usize) {
        self.width = width;
        self.len = len;
        self.cells.clear();
        self.cells.resize(width * len, None);
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, beam: usize, position: usize) -> Option<usize> {
        if beam < self.width && position < self.len {
            self.cells[beam * self.len + position]
        } else {
            None
        }
    }

    pub fn set(&mut self, beam: usize, position: usize, tag: Option<usize>) {
        if beam < self.width && position < self.len {
            self.cells[beam * self.len + position] = tag;
        }
    }

    pub fn row(&self, beam: usize) -> &[Option<usize>] {
        let start = beam * self.len;
        &self.cells[start..start + self.len]
    }
}

/// Entrada do vetor de melhores candidatos.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Feixe de origem.
    pub path: Option<usize>,
    pub tag: Option<usize>,
    pub prob: f64,
}

impl Candidate {
    pub const EMPTY: Candidate = Candidate {
        path: None,
        tag: None,
        prob: 0.0,
    };

    pub fn is_empty(&self) -> bool {
        self.path.is_none()
    }
}

/// Normaliza uma distribuição e a ordena para o feixe.
///
/// A resposta preferida (se presente) vem primeiro; as demais seguem em ordem
/// decrescente de probabilidade. Entre pesos iguais, a entrada vista por
/// último fica na frente. Uma distribuição vazia (ou de peso total zero) vale
/// como `{resposta: 1.0}`.
pub fn break_down(answer: usize, distribution: &[(usize, f64)]) -> Vec<(usize, f64)> {
    let total: f64 = distribution.iter().map(|(_, w)| w).sum();
    if distribution.is_empty() || total <= 0.0 {
        return vec![(answer, 1.0)];
    }
    let mut preferred = None;
    let mut rest: Vec<(usize, f64)> = Vec::with_capacity(distribution.len());
    for &(tag, weight) in distribution {
        let p = weight / total;
        if tag == answer {
            preferred = Some((tag, p));
        } else {
            let at = rest.iter().position(|&(_, q)| p >= q).unwrap_or(rest.len());
            rest.insert(at, (tag, p));
        }
    }
    preferred.into_iter().chain(rest).collect()
}

/// Estado do decodificador para uma sentença.
#[derive(Debug, Clone, Default)]
pub struct BeamData {
    width: usize,
    len: usize,
    paths: PathTable,
    scratch: PathTable,
    path_prob: Vec<f64>,
    best: Vec<Candidate>,
    initialized: bool,
}

impl BeamData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepara as tabelas para `len` posições com `width` feixes.
    pub fn init(&mut self, width: usize, len: usize) -> Result<()> {
        if width == 0 {
            return Err(MbtError::InvalidConfig("beam size must be at least 1".into()));
        }
        self.width = width;
        self.len = len;
        self.paths.reset(width, len);
        self.scratch.reset(width, len);
        self.path_prob.clear();
        self.path_prob.resize(width, 0.0);
        self.best.clear();
        self.best.resize(width, Candidate::EMPTY);
        self.initialized = true;
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn check(&self, position: usize) -> Result<()> {
        if !self.initialized {
            return Err(MbtError::DecoderNotInitialized);
        }
        if position >= self.len {
            return Err(MbtError::DecoderBounds {
                position,
                len: self.len,
            });
        }
        Ok(())
    }

    /// Semeia os feixes a partir da classificação da posição 0.
    pub fn init_first_position(&mut self, answer: usize, distribution: &[(usize, f64)]) -> Result<()> {
        self.check(0)?;
        if self.width == 1 {
            self.paths.set(0, 0, Some(answer));
            self.path_prob[0] = 1.0;
            return Ok(());
        }
        let ranked = break_down(answer, distribution);
        for beam in 0..self.width {
            match ranked.get(beam) {
                Some(&(tag, p)) => {
                    self.paths.set(beam, 0, Some(tag));
                    self.path_prob[beam] = p;
                }
                None => {
                    self.paths.set(beam, 0, None);
                    self.path_prob[beam] = 0.0;
                }
            }
        }
        Ok(())
    }

    /// Esvazia o vetor de melhores candidatos.
    pub fn clear_best(&mut self) {
        self.best.fill(Candidate::EMPTY);
    }

    /// `true` se o feixe `beam` tem tag na posição `position`.
    pub fn is_live(&self, beam: usize, position: usize) -> bool {
        self.paths.get(beam, position).is_some()
    }

    /// Oferece as extensões do feixe `beam` ao vetor de melhores candidatos.
    pub fn extend(&mut self, position: usize, beam: usize, answer: usize, distribution: &[(usize, f64)]) -> Result<()> {
        self.check(position)?;
        if beam >= self.width {
            return Err(MbtError::DecoderBounds {
                position: beam,
                len: self.width,
            });
        }
        if self.width == 1 {
            self.best[0] = Candidate {
                path: Some(beam),
                tag: Some(answer),
                prob: 1.0,
            };
            return Ok(());
        }
        let path_prob = self.path_prob[beam];
        for (tag, p) in break_down(answer, distribution).into_iter().take(self.width) {
            self.insert(Candidate {
                path: Some(beam),
                tag: Some(tag),
                prob: p * path_prob,
            });
        }
        debug!(position, beam, best = ?self.best, "extensões do feixe");
        Ok(())
    }

    /// Insere mantendo a ordem decrescente; empates ficam atrás dos já presentes.
    fn insert(&mut self, candidate: Candidate) {
        let k = self.best.len();
        if candidate.prob <= self.best[k - 1].prob {
            return;
        }
        let at = self
            .best
            .iter()
            .position(|b| candidate.prob > b.prob)
            .unwrap_or(k - 1);
        self.best.insert(at, candidate);
        self.best.truncate(k);
    }

    /// Promove os melhores candidatos a novos caminhos até `position`.
    pub fn shift(&mut self, len: usize, position: usize) -> Result<()> {
        self.check(position)?;
        let len = len.min(self.len);
        for (beam, cand) in self.best.iter().enumerate() {
            self.path_prob[beam] = cand.prob;
            for q in 0..len {
                let cell = match cand.path {
                    Some(from) if q < position => self.paths.get(from, q),
                    Some(_) if q == position => cand.tag,
                    _ => None,
                };
                self.scratch.set(beam, q, cell);
            }
        }
        std::mem::swap(&mut self.paths, &mut self.scratch);
        Ok(())
    }

    pub fn path(&self, beam: usize) -> &[Option<usize>] {
        self.paths.row(beam)
    }

    pub fn paths(&self) -> &PathTable {
        &self.paths
    }

    pub fn path_probability(&self, beam: usize) -> f64 {
        self.path_prob.get(beam).copied().unwrap_or(0.0)
    }

    pub fn best(&self) -> &[Candidate] {
        &self.best
    }

    /// Tag do melhor caminho em `position`.
    pub fn best_tag(&self, position: usize) -> Option<usize> {
        self.paths.get(0, position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_break_down_pins_answer_and_normalizes() {
        let ranked = break_down(2, &[(1, 3.0), (2, 1.0), (3, 4.0)]);
        assert_eq!(ranked[0].0, 2);
        assert!((ranked[0].1 - 0.125).abs() < 1e-12);
        assert_eq!(ranked[1].0, 3);
        assert_eq!(ranked[2].0, 1);
        let sum: f64 = ranked.iter().map(|(_, p)| p).sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_break_down_ties_put_later_first() {
        let ranked = break_down(9, &[(1, 1.0), (2, 1.0), (3, 1.0)]);
        let order: Vec<usize> = ranked.iter().map(|(t, _)| *t).collect();
        assert_eq!(order, vec![3, 2, 1]);
    }

    #[test]
    fn test_break_down_empty_distribution() {
        assert_eq!(break_down(4, &[]), vec![(4, 1.0)]);
    }

    #[test]
    fn test_uninitialized_decoder_fails() {
        let mut beam = BeamData::new();
        assert!(matches!(beam.init_first_position(0, &[]), Err(MbtError::DecoderNotInitialized)));
        assert!(matches!(beam.extend(1, 0, 0, &[]), Err(MbtError::DecoderNotInitialized)));
        assert!(matches!(beam.shift(2, 1), Err(MbtError::DecoderNotInitialized)));
    }

    #[test]
    fn test_zero_width_rejected() {
        assert!(BeamData::new().init(0, 3).is_err());
    }

    #[test]
    fn test_width_one_is_greedy() {
        let mut beam = BeamData::new();
        beam.init(1, 2).unwrap();
        beam.init_first_position(7, &[(7, 1.0), (8, 5.0)]).unwrap();
        beam.clear_best();
        beam.extend(1, 0, 8, &[(7, 9.0), (8, 1.0)]).unwrap();
        beam.shift(2, 1).unwrap();
        assert_eq!(beam.path(0), &[Some(7), Some(8)]);
        assert_eq!(beam.path_probability(0), 1.0);
    }

    #[test]
    fn test_first_position_fills_and_pads() {
        let mut beam = BeamData::new();
        beam.init(3, 1).unwrap();
        beam.init_first_position(1, &[(1, 3.0), (2, 1.0)]).unwrap();
        assert_eq!(beam.path(0), &[Some(1)]);
        assert_eq!(beam.path(1), &[Some(2)]);
        assert_eq!(beam.path(2), &[None]);
        assert!((beam.path_probability(0) - 0.75).abs() < 1e-12);
        assert_eq!(beam.path_probability(2), 0.0);
        assert!(!beam.is_live(2, 0));
    }

    #[test]
    fn test_extend_ranks_joint_probability() {
        let mut beam = BeamData::new();
        beam.init(2, 2).unwrap();
        // feixe 0: A (0.6), feixe 1: B (0.4)
        beam.init_first_position(10, &[(10, 0.6), (11, 0.4)]).unwrap();
        beam.clear_best();
        beam.extend(1, 0, 20, &[(20, 0.5), (21, 0.5)]).unwrap();
        beam.extend(1, 1, 20, &[(20, 0.99), (21, 0.01)]).unwrap();
        // 0.4 × 0.99 = 0.396 > 0.6 × 0.5 = 0.3
        assert_eq!(beam.best()[0].path, Some(1));
        assert!((beam.best()[0].prob - 0.396).abs() < 1e-12);
        assert_eq!(beam.best()[1].path, Some(0));
        beam.shift(2, 1).unwrap();
        assert_eq!(beam.path(0), &[Some(11), Some(20)]);
        assert_eq!(beam.path(1), &[Some(10), Some(20)]);
    }

    #[test]
    fn test_insert_ties_keep_earlier_ahead() {
        let mut beam = BeamData::new();
        beam.init(2, 2).unwrap();
        beam.init_first_position(1, &[(1, 1.0), (2, 1.0)]).unwrap();
        beam.clear_best();
        beam.extend(1, 0, 5, &[(5, 1.0)]).unwrap();
        beam.extend(1, 1, 6, &[(6, 1.0)]).unwrap();
        assert_eq!(beam.best()[0].path, Some(0));
        assert_eq!(beam.best()[1].path, Some(1));
    }

    #[test]
    fn test_shift_empties_dead_beams() {
        let mut beam = BeamData::new();
        beam.init(3, 3).unwrap();
        beam.init_first_position(1, &[(1, 1.0)]).unwrap();
        beam.clear_best();
        beam.extend(1, 0, 2, &[(2, 1.0)]).unwrap();
        beam.shift(3, 1).unwrap();
        assert_eq!(beam.path(0), &[Some(1), Some(2), None]);
        assert_eq!(beam.path(1), &[None, None, None]);
        assert!(!beam.is_live(1, 1));
    }
}
