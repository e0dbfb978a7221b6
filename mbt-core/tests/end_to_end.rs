use std::sync::Arc;

use mbt_core::classifier::{CaseBases, Classification, Classifier, InstanceBase};
use mbt_core::corpus::get_corpus;
use mbt_core::features::MatchAction;
use mbt_core::lexicon::{FrequentWords, Lexicon};
use mbt_core::{InputKind, Pipeline, Result, Sentence, Tagger, TaggerConfig, TaggerModel, Trainer};

/// Caminho de jardim: o melhor primeiro passo não leva ao melhor caminho.
///
/// Posição 0: A 0.6, B 0.4. Posição 1: após A, X 0.5 / Y 0.5; após B, X 0.99.
struct GardenPath;

impl Classifier for GardenPath {
    fn classify(&mut self, instance: &str, _: MatchAction) -> Result<Option<Classification>> {
        let fields: Vec<&str> = instance.split_whitespace().collect();
        let dist: Vec<(String, f64)> = match (fields[1], fields[2]) {
            (_, "A;B") => vec![("A".into(), 0.6), ("B".into(), 0.4)],
            ("A", "X;Y") => vec![("X".into(), 0.5), ("Y".into(), 0.5)],
            ("B", "X;Y") => vec![("X".into(), 0.99), ("Y".into(), 0.01)],
            _ => return Ok(None),
        };
        Ok(Some(Classification {
            label: dist[0].0.clone(),
            distribution: dist.into_iter().collect(),
            distance: 0.0,
        }))
    }
}

fn garden_model(beam_size: usize) -> Arc<TaggerModel> {
    let mut lexicon = Lexicon::new();
    lexicon.insert("w1", "A;B");
    lexicon.insert("w2", "X;Y");
    let config = TaggerConfig {
        beam_size,
        ..TaggerConfig::default()
    };
    Arc::new(TaggerModel::new(config, lexicon, FrequentWords::new(), GardenPath).unwrap())
}

fn tags(tagger: &mut Tagger, line: &str) -> Vec<String> {
    tagger
        .tag_line(line)
        .unwrap()
        .into_iter()
        .map(|r| r.tag)
        .collect()
}

#[test]
fn test_greedy_takes_garden_path() {
    let mut tagger = Tagger::new(garden_model(1));
    assert_eq!(tags(&mut tagger, "w1 w2"), vec!["A", "X"]);
}

#[test]
fn test_wider_beam_recovers_best_joint_path() {
    for width in 2..=3 {
        let mut tagger = Tagger::new(garden_model(width));
        assert_eq!(tags(&mut tagger, "w1 w2"), vec!["B", "X"], "beam {width}");
    }
}

#[test]
fn test_wider_beam_never_lowers_best_path_probability() {
    let mut previous = 0.0;
    for width in 2..=4 {
        let mut tagger = Tagger::new(garden_model(width));
        tagger.tag_line("w1 w2").unwrap();
        let p = tagger.last_path_probability();
        assert!(p >= previous, "beam {width}: {p} < {previous}");
        previous = p;
    }
    assert!((previous - 0.396).abs() < 1e-12);
}

#[test]
fn test_wider_beam_never_lowers_probability_on_demo_sentences() {
    let lines = [
        "A princesa assinou a lei em 1888 .",
        "Tiradentes é lembrado como um herói nacional .",
        "O banco manteve a taxa de juros em junho .",
    ];
    let mut pipelines: Vec<Pipeline> = (2..=4)
        .map(|width| {
            Pipeline::demo(TaggerConfig {
                beam_size: width,
                ..TaggerConfig::default()
            })
            .unwrap()
        })
        .collect();
    for line in lines {
        let mut previous = 0.0;
        for pipeline in &mut pipelines {
            pipeline.tagger_mut().tag_line(line).unwrap();
            let p = pipeline.tagger().last_path_probability();
            assert!(p >= previous, "{line}: {p} < {previous}");
            previous = p;
        }
    }
}

#[test]
fn test_beam_widths_agree_on_training_sentence() {
    let line = "A princesa assinou a lei em 1888 .";
    let expected = vec!["DET", "NOUN", "VERB", "DET", "NOUN", "ADP", "NUM", "PUNCT"];
    for width in [1, 3] {
        let config = TaggerConfig {
            beam_size: width,
            ..TaggerConfig::default()
        };
        let mut pipeline = Pipeline::demo(config).unwrap();
        assert_eq!(tags(pipeline.tagger_mut(), line), expected, "beam {width}");
    }
}

#[test]
fn test_saved_bases_reproduce_tagging() {
    let config = TaggerConfig {
        input_kind: InputKind::Tagged,
        ..TaggerConfig::default()
    };
    let sentences: Vec<Sentence> = get_corpus().iter().map(|s| s.to_sentence()).collect();
    let output = Trainer::new(config.clone()).unwrap().build(&sentences).unwrap();

    let mut known = Vec::new();
    output.bases.known.write(&mut known).unwrap();
    let mut unknown = Vec::new();
    output.bases.unknown.write(&mut unknown).unwrap();
    let mut lexicon = Vec::new();
    output.lexicons.lexicon.write(&mut lexicon).unwrap();
    let mut frequent = Vec::new();
    output.lexicons.frequent.write(&mut frequent).unwrap();

    let bases = CaseBases {
        known: InstanceBase::read(known.as_slice()).unwrap(),
        unknown: InstanceBase::read(unknown.as_slice()).unwrap(),
    };
    assert_eq!(bases.known.len(), output.report.known_instances);

    let model = TaggerModel::new(
        TaggerConfig::default(),
        Lexicon::read(lexicon.as_slice()).unwrap(),
        FrequentWords::read(frequent.as_slice()).unwrap(),
        bases,
    )
    .unwrap();
    let mut tagger = Tagger::new(Arc::new(model));
    assert_eq!(
        tags(&mut tagger, "O banco manteve a taxa ."),
        vec!["DET", "NOUN", "VERB", "DET", "NOUN", "PUNCT"]
    );
}

#[test]
fn test_unknown_word_gets_a_tag() {
    let mut pipeline = Pipeline::demo(TaggerConfig::default()).unwrap();
    let results = pipeline.tagger_mut().tag_line("O zagueiro marcou .").unwrap();
    assert_eq!(results.len(), 4);
    assert!(!results[1].known);
    assert!(!results[1].tag.is_empty());
    assert_eq!(results[3].tag, "PUNCT");
}
