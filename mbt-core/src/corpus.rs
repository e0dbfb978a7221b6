//! # Corpus em Português Brasileiro com Classes Gramaticais
//!
//! Pequeno corpus anotado manualmente com etiquetas morfossintáticas no
//! estilo Universal Dependencies. Serve para construir um modelo de
//! demonstração sem arquivos externos (servidor web, testes de ponta a ponta).
//!
//! ## Etiquetas
//!
//! | Tag     | Classe                 | Exemplos                  |
//! |---------|------------------------|---------------------------|
//! | `DET`   | determinante           | o, a, os, um              |
//! | `NOUN`  | substantivo comum      | vacina, hospital          |
//! | `PROPN` | nome próprio           | Brasil, Fiocruz           |
//! | `VERB`  | verbo                  | desenvolveu, anunciou     |
//! | `AUX`   | verbo auxiliar/cópula  | é, foi                    |
//! | `ADJ`   | adjetivo               | nacional, nova            |
//! | `ADP`   | preposição             | em, de, no, da            |
//! | `PRON`  | pronome                | ela, que                  |
//! | `ADV`   | advérbio               | ontem, recentemente       |
//! | `CCONJ` | conjunção coordenativa | e, mas                    |
//! | `NUM`   | numeral                | 2023, dois                |
//! | `PUNCT` | pontuação              | . ,                       |

use crate::sentence::{Sentence, Word};

/// Uma sentença anotada.
pub struct AnnotatedSentence {
    /// Domínio temático.
    pub domain: &'static str,
    /// Pares (palavra, tag), já tokenizados.
    pub annotations: &'static [(&'static str, &'static str)],
}

impl AnnotatedSentence {
    /// Converte para uma [`Sentence`] com as tags como referência.
    pub fn to_sentence(&self) -> Sentence {
        Sentence::from_words(
            self.annotations
                .iter()
                .map(|(word, tag)| Word::tagged(word, tag))
                .collect(),
        )
    }

    /// Texto com os tokens separados por espaço.
    pub fn text(&self) -> String {
        self.annotations
            .iter()
            .map(|(w, _)| *w)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Retorna o corpus completo.
pub fn get_corpus() -> Vec<AnnotatedSentence> {
    vec![
        // ===== SAÚDE =====
        AnnotatedSentence {
            domain: "saúde",
            annotations: &[
                ("A", "DET"), ("Fiocruz", "PROPN"), ("desenvolveu", "VERB"), ("a", "DET"),
                ("vacina", "NOUN"), ("contra", "ADP"), ("a", "DET"), ("dengue", "NOUN"),
                ("em", "ADP"), ("2023", "NUM"), (".", "PUNCT"),
            ],
        },
        AnnotatedSentence {
            domain: "saúde",
            annotations: &[
                ("O", "DET"), ("hospital", "NOUN"), ("em", "ADP"), ("São", "PROPN"),
                ("Paulo", "PROPN"), ("é", "AUX"), ("referência", "NOUN"), ("em", "ADP"),
                ("cardiologia", "NOUN"), ("e", "CCONJ"), ("oncologia", "NOUN"), (".", "PUNCT"),
            ],
        },
        AnnotatedSentence {
            domain: "saúde",
            annotations: &[
                ("A", "DET"), ("pesquisadora", "NOUN"), ("foi", "AUX"), ("um", "DET"),
                ("dos", "ADP"), ("principais", "ADJ"), ("nomes", "NOUN"), ("da", "ADP"),
                ("ciência", "NOUN"), ("durante", "ADP"), ("a", "DET"), ("pandemia", "NOUN"),
                (".", "PUNCT"),
            ],
        },
        AnnotatedSentence {
            domain: "saúde",
            annotations: &[
                ("O", "DET"), ("ministério", "NOUN"), ("anunciou", "VERB"), ("uma", "DET"),
                ("nova", "ADJ"), ("campanha", "NOUN"), ("de", "ADP"), ("vacinação", "NOUN"),
                ("ontem", "ADV"), (".", "PUNCT"),
            ],
        },
        // ===== HISTÓRIA =====
        AnnotatedSentence {
            domain: "história",
            annotations: &[
                ("Dom", "PROPN"), ("Pedro", "PROPN"), ("proclamou", "VERB"), ("a", "DET"),
                ("independência", "NOUN"), ("do", "ADP"), ("Brasil", "PROPN"), ("em", "ADP"),
                ("1822", "NUM"), (".", "PUNCT"),
            ],
        },
        AnnotatedSentence {
            domain: "história",
            annotations: &[
                ("A", "DET"), ("princesa", "NOUN"), ("assinou", "VERB"), ("a", "DET"),
                ("lei", "NOUN"), ("em", "ADP"), ("1888", "NUM"), (".", "PUNCT"),
            ],
        },
        AnnotatedSentence {
            domain: "história",
            annotations: &[
                ("Tiradentes", "PROPN"), ("é", "AUX"), ("lembrado", "VERB"), ("como", "ADP"),
                ("um", "DET"), ("herói", "NOUN"), ("nacional", "ADJ"), (".", "PUNCT"),
            ],
        },
        // ===== ECONOMIA =====
        AnnotatedSentence {
            domain: "economia",
            annotations: &[
                ("O", "DET"), ("banco", "NOUN"), ("manteve", "VERB"), ("a", "DET"),
                ("taxa", "NOUN"), ("de", "ADP"), ("juros", "NOUN"), ("em", "ADP"),
                ("junho", "NOUN"), (".", "PUNCT"),
            ],
        },
        AnnotatedSentence {
            domain: "economia",
            annotations: &[
                ("A", "DET"), ("Petrobras", "PROPN"), ("anunciou", "VERB"), ("novos", "ADJ"),
                ("investimentos", "NOUN"), ("no", "ADP"), ("litoral", "NOUN"), ("de", "ADP"),
                ("São", "PROPN"), ("Paulo", "PROPN"), (".", "PUNCT"),
            ],
        },
        AnnotatedSentence {
            domain: "economia",
            annotations: &[
                ("O", "DET"), ("mercado", "NOUN"), ("subiu", "VERB"), ("dois", "NUM"),
                ("por", "ADP"), ("cento", "NOUN"), ("e", "CCONJ"), ("o", "DET"),
                ("dólar", "NOUN"), ("caiu", "VERB"), (".", "PUNCT"),
            ],
        },
        // ===== ESPORTES =====
        AnnotatedSentence {
            domain: "esportes",
            annotations: &[
                ("O", "DET"), ("atacante", "NOUN"), ("marcou", "VERB"), ("dois", "NUM"),
                ("gols", "NOUN"), ("no", "ADP"), ("estádio", "NOUN"), (".", "PUNCT"),
            ],
        },
        AnnotatedSentence {
            domain: "esportes",
            annotations: &[
                ("A", "DET"), ("seleção", "NOUN"), ("venceu", "VERB"), ("a", "DET"),
                ("Argentina", "PROPN"), ("no", "ADP"), ("Maracanã", "PROPN"), (".", "PUNCT"),
            ],
        },
        AnnotatedSentence {
            domain: "esportes",
            annotations: &[
                ("O", "DET"), ("técnico", "NOUN"), ("disse", "VERB"), ("que", "PRON"),
                ("o", "DET"), ("time", "NOUN"), ("jogou", "VERB"), ("bem", "ADV"),
                (".", "PUNCT"),
            ],
        },
        // ===== CIÊNCIA =====
        AnnotatedSentence {
            domain: "ciência",
            annotations: &[
                ("Os", "DET"), ("pesquisadores", "NOUN"), ("detectaram", "VERB"), ("um", "DET"),
                ("aumento", "NOUN"), ("no", "ADP"), ("desmatamento", "NOUN"), ("da", "ADP"),
                ("Amazônia", "PROPN"), (".", "PUNCT"),
            ],
        },
        AnnotatedSentence {
            domain: "ciência",
            annotations: &[
                ("Ela", "PRON"), ("publicou", "VERB"), ("um", "DET"), ("estudo", "NOUN"),
                ("sobre", "ADP"), ("a", "DET"), ("eficácia", "NOUN"), ("das", "ADP"),
                ("vacinas", "NOUN"), (".", "PUNCT"),
            ],
        },
        AnnotatedSentence {
            domain: "ciência",
            annotations: &[
                ("O", "DET"), ("satélite", "NOUN"), ("foi", "AUX"), ("lançado", "VERB"),
                ("recentemente", "ADV"), ("e", "CCONJ"), ("funciona", "VERB"), ("bem", "ADV"),
                (".", "PUNCT"),
            ],
        },
        // ===== CULTURA =====
        AnnotatedSentence {
            domain: "cultura",
            annotations: &[
                ("A", "DET"), ("semana", "NOUN"), ("de", "ADP"), ("arte", "NOUN"),
                ("moderna", "ADJ"), ("aconteceu", "VERB"), ("em", "ADP"), ("1922", "NUM"),
                (".", "PUNCT"),
            ],
        },
        AnnotatedSentence {
            domain: "cultura",
            annotations: &[
                ("O", "DET"), ("samba", "NOUN"), ("e", "CCONJ"), ("a", "DET"),
                ("bossa", "NOUN"), ("nova", "ADJ"), ("são", "AUX"), ("gêneros", "NOUN"),
                ("brasileiros", "ADJ"), (".", "PUNCT"),
            ],
        },
        AnnotatedSentence {
            domain: "cultura",
            annotations: &[
                ("A", "DET"), ("cantora", "NOUN"), ("levou", "VERB"), ("a", "DET"),
                ("música", "NOUN"), ("brasileira", "ADJ"), ("para", "ADP"), ("o", "DET"),
                ("mundo", "NOUN"), (".", "PUNCT"),
            ],
        },
        // ===== MEIO AMBIENTE =====
        AnnotatedSentence {
            domain: "meio ambiente",
            annotations: &[
                ("O", "DET"), ("rio", "NOUN"), ("secou", "VERB"), ("durante", "ADP"),
                ("a", "DET"), ("seca", "NOUN"), ("mas", "CCONJ"), ("a", "DET"),
                ("chuva", "NOUN"), ("voltou", "VERB"), (".", "PUNCT"),
            ],
        },
        AnnotatedSentence {
            domain: "meio ambiente",
            annotations: &[
                ("A", "DET"), ("floresta", "NOUN"), ("perdeu", "VERB"), ("milhares", "NOUN"),
                ("de", "ADP"), ("árvores", "NOUN"), ("em", "ADP"), ("2021", "NUM"),
                (".", "PUNCT"),
            ],
        },
        // ===== EDUCAÇÃO =====
        AnnotatedSentence {
            domain: "educação",
            annotations: &[
                ("A", "DET"), ("universidade", "NOUN"), ("abriu", "VERB"), ("novas", "ADJ"),
                ("vagas", "NOUN"), ("para", "ADP"), ("o", "DET"), ("curso", "NOUN"),
                ("de", "ADP"), ("medicina", "NOUN"), (".", "PUNCT"),
            ],
        },
        AnnotatedSentence {
            domain: "educação",
            annotations: &[
                ("Os", "DET"), ("alunos", "NOUN"), ("estudaram", "VERB"), ("a", "DET"),
                ("história", "NOUN"), ("do", "ADP"), ("Brasil", "PROPN"), ("ontem", "ADV"),
                (".", "PUNCT"),
            ],
        },
    ]
}

/// Corpus no formato `palavra tag`, uma por linha, com `eos` entre sentenças.
pub fn to_tagged_text(corpus: &[AnnotatedSentence], eos: &str) -> String {
    let mut out = String::new();
    for sentence in corpus {
        for (word, tag) in sentence.annotations {
            out.push_str(word);
            out.push(' ');
            out.push_str(tag);
            out.push('\n');
        }
        out.push_str(eos);
        out.push('\n');
    }
    out
}

/// Textos de demonstração (já tokenizados) para a interface web.
pub fn demo_texts() -> Vec<(&'static str, &'static str)> {
    vec![
        ("Saúde", "O instituto desenvolveu uma nova vacina contra a dengue ."),
        ("História", "A princesa proclamou a independência em 1822 ."),
        ("Economia", "O banco anunciou novos investimentos no litoral ."),
        ("Esportes", "A seleção marcou dois gols no Maracanã ."),
        ("Desconhecidas", "O zagueiro-artilheiro Xavante venceu o Ultra-Maratona de 2024 ."),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corpus_is_well_formed() {
        let corpus = get_corpus();
        assert!(corpus.len() >= 20);
        for s in &corpus {
            assert!(!s.annotations.is_empty());
            assert_eq!(s.annotations.last().map(|(_, t)| *t), Some("PUNCT"));
            assert!(s.annotations.iter().all(|(w, t)| !w.contains(' ') && !t.is_empty()));
        }
    }

    #[test]
    fn test_to_tagged_text() {
        let corpus = get_corpus();
        let text = to_tagged_text(&corpus[..1], "<utt>");
        assert!(text.starts_with("A DET\nFiocruz PROPN\n"));
        assert!(text.ends_with(". PUNCT\n<utt>\n"));
    }

    #[test]
    fn test_to_sentence_keeps_reference_tags() {
        let s = get_corpus()[0].to_sentence();
        assert_eq!(s.len(), 11);
        assert_eq!(s.words()[1].input_tag.as_deref(), Some("PROPN"));
    }
}
