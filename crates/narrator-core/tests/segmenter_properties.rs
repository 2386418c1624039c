//! Property checks for the segmenter over a small corpus of scripts.

use narrator_core::{CaptionChunk, split_for_display, split_for_speech};

const CORPUS: &[&str] = &[
    "Hello. This is a test of the sync engine, with a fairly long clause that must wrap across two subtitle chunks.",
    "Bonjour et bienvenue dans cette lecture numérologique personnalisée. Nous allons ensemble découvrir ce que les nombres révèlent de votre chemin.\n\nPourquoi votre nom ? Parce que chaque lettre porte une vibration ; chaque vibration, une intention.",
    "Un mot.",
    "anticonstitutionnellement pseudohypoparathyroïdisme hippopotomonstrosesquippedaliophobie",
    "   Espaces en tête, puis\ttabulations\net retours.   \n\n\n  Dernier paragraphe…  ",
    "« Citation entière. » Puis du texte (avec parenthèses.) et la fin!",
];

const BUDGETS: &[usize] = &[8, 20, 40, 80, 110, 400];

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

fn assert_display_properties(text: &str, max: usize, chunks: &[CaptionChunk]) {
    let joined: String = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(
        strip_whitespace(&joined),
        strip_whitespace(text),
        "content lost at max={max}"
    );

    let mut cursor = 0;
    for chunk in chunks {
        assert_eq!(&text[chunk.span.clone()], chunk.text);
        assert!(chunk.span.start >= cursor, "chunks overlap at max={max}");
        assert!(
            text[cursor..chunk.span.start].trim().is_empty(),
            "non-whitespace dropped before {:?}",
            chunk.text
        );
        assert_eq!(chunk.text.trim(), chunk.text);
        assert!(
            chunk.char_len() <= max || !chunk.text.contains(char::is_whitespace),
            "{:?} exceeds {max} without being a single token",
            chunk.text
        );
        cursor = chunk.span.end;
    }
    assert!(text[cursor..].trim().is_empty());
}

#[test]
fn display_chunks_cover_input_within_budget() {
    for text in CORPUS {
        for &max in BUDGETS {
            let chunks = split_for_display(text, max, &[]);
            assert_eq!(chunks.is_empty(), text.trim().is_empty());
            assert_display_properties(text, max, &chunks);
        }
    }
}

#[test]
fn speech_segments_partition_input() {
    for text in CORPUS {
        for &max in BUDGETS {
            let segments = split_for_speech(text, max, &[]);
            let rebuilt: String = segments.iter().map(|s| s.text.as_str()).collect();
            assert_eq!(&rebuilt, text, "partition broken at max={max}");
            for segment in &segments {
                assert!(!segment.speakable().is_empty());
                assert_eq!(segment.max_chars, max);
            }
        }
    }
}

#[test]
fn protected_phrases_survive_every_budget() {
    let text = CORPUS[1];
    let protected = vec![
        "lecture numérologique personnalisée".to_string(),
        "chaque vibration, une intention".to_string(),
    ];
    for &max in BUDGETS {
        let chunks = split_for_display(text, max, &protected);
        for phrase in &protected {
            assert!(
                chunks.iter().any(|c| c.text.contains(phrase.as_str())),
                "{phrase:?} split at max={max}"
            );
        }
    }
}

#[test]
fn chunks_of_segments_stay_inside_their_segment() {
    let text = CORPUS[1];
    for segment in split_for_speech(text, 80, &[]) {
        for chunk in split_for_display(&segment.text, 40, &[]) {
            assert!(chunk.span.end <= segment.text.len());
            let absolute = segment.span.start + chunk.span.start;
            assert_eq!(&text[absolute..absolute + chunk.text.len()], chunk.text);
        }
    }
}
