//! # Interner — Strings ↔ Identificadores Inteiros
//!
//! Todo o vocabulário do etiquetador (palavras, tags, classes de ambiguidade,
//! tokens sintéticos como `"_a"` ou `"=="`) é convertido em identificadores
//! `usize` densos e sequenciais. As features de um padrão são vetores desses ids.
//!
//! - `intern` é idempotente: a mesma string sempre devolve o mesmo id.
//! - Ids nunca são reciclados; não há remoção.
//! - [`SharedInterner`] permite leitura concorrente e serializa apenas as inserções.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::error::{MbtError, Result};

/// Tabela bidirecional string ↔ id.
#[derive(Debug, Clone, Default)]
pub struct Interner {
    strings: Vec<String>,
    ids: HashMap<String, usize>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Devolve o id de `s`, alocando o próximo id livre se for nova.
    pub fn intern(&mut self, s: &str) -> usize {
        if let Some(&id) = self.ids.get(s) {
            return id;
        }
        let id = self.strings.len();
        self.strings.push(s.to_string());
        self.ids.insert(s.to_string(), id);
        id
    }

    /// Consulta sem inserir.
    pub fn get(&self, s: &str) -> Option<usize> {
        self.ids.get(s).copied()
    }

    pub fn resolve(&self, id: usize) -> Result<&str> {
        self.strings
            .get(id)
            .map(String::as_str)
            .ok_or(MbtError::UnknownId(id))
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

/// Interner compartilhável entre threads.
///
/// Consultas a strings já conhecidas usam apenas o lock de leitura; o lock de
/// escrita só é tomado quando uma string nova precisa ser registrada.
#[derive(Debug, Default)]
pub struct SharedInterner {
    inner: RwLock<Interner>,
}

impl SharedInterner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&self, s: &str) -> usize {
        {
            let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(id) = guard.get(s) {
                return id;
            }
        }
        // Outra thread pode ter inserido entre os dois locks; `intern` cobre isso.
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .intern(s)
    }

    pub fn get(&self, s: &str) -> Option<usize> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(s)
    }

    pub fn resolve(&self, id: usize) -> Result<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .resolve(id)
            .map(str::to_string)
    }

    /// Resolve vários ids de uma vez, tomando o lock uma única vez.
    pub fn resolve_all(&self, ids: &[usize]) -> Result<Vec<String>> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        ids.iter()
            .map(|&id| guard.resolve(id).map(str::to_string))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_intern_is_idempotent_and_sequential() {
        let mut interner = Interner::new();
        let a = interner.intern("the");
        let b = interner.intern("cat");
        assert_eq!(a, 0);
        assert_eq!(b, 1);
        assert_eq!(interner.intern("the"), a);
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn test_resolve_round_trip() {
        let mut interner = Interner::new();
        for word in ["_a", "==", "HAPAX-0", "DT;NN"] {
            let id = interner.intern(word);
            assert_eq!(interner.resolve(id).unwrap(), word);
        }
    }

    #[test]
    fn test_resolve_foreign_id_fails() {
        let interner = Interner::new();
        assert!(matches!(interner.resolve(7), Err(MbtError::UnknownId(7))));
    }

    #[test]
    fn test_shared_interner_across_threads() {
        let shared = Arc::new(SharedInterner::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || {
                    ["a", "b", "c"].iter().map(|s| shared.intern(s)).collect::<Vec<_>>()
                })
            })
            .collect();
        let results: Vec<Vec<usize>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(shared.len(), 3);
        assert_eq!(shared.resolve_all(&results[0]).unwrap(), vec!["a", "b", "c"]);
    }
}
