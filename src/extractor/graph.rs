// file: src/extractor/graph.rs
// description: deterministic entity and relationship extraction from chunk text
// reference: definition patterns, capitalised phrases and recurring key terms

use crate::config::ExtractionConfig;
use crate::extractor::patterns::{CAPITALIZED_PHRASE, DEFINITION, is_stopword, tokens};
use crate::parser::split_sentences;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

pub const NAMED_ENTITY_TYPE: &str = "named entity";
pub const CONCEPT_TYPE: &str = "concept";
pub const DEFAULT_RELATIONSHIP: &str = "related_to";

const MAX_SUBJECT_WORDS: usize = 4;
const MAX_TYPE_WORDS: usize = 3;
const MAX_CONNECTING_WORDS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Origin {
    Definition,
    Mention,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    pub name: String,
    pub entity_type: String,
    pub description: String,
    pub mentions: usize,
}

impl ExtractedEntity {
    /// Case-insensitive identity used to merge mentions across chunks.
    pub fn key(&self) -> String {
        entity_key(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRelation {
    pub source: String,
    pub target: String,
    pub relationship: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedGraph {
    pub entities: Vec<ExtractedEntity>,
    pub relations: Vec<ExtractedRelation>,
}

impl ExtractedGraph {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

struct Candidate {
    entity: ExtractedEntity,
    origin: Origin,
}

pub struct GraphExtractor {
    max_entities: usize,
    min_term_frequency: usize,
}

impl GraphExtractor {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            max_entities: config.max_entities_per_chunk.max(1),
            min_term_frequency: config.min_term_frequency.max(1),
        }
    }

    pub fn extract(&self, text: &str) -> ExtractedGraph {
        let flattened = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let sentences = split_sentences(&flattened);
        if sentences.is_empty() {
            return ExtractedGraph::default();
        }

        let mut candidates: BTreeMap<String, Candidate> = BTreeMap::new();

        for sentence in &sentences {
            if let Some((subject, entity_type)) = self.definition(sentence) {
                let key = entity_key(&subject);
                candidates
                    .entry(key)
                    .and_modify(|c| {
                        c.origin = Origin::Definition;
                        c.entity.entity_type = entity_type.clone();
                    })
                    .or_insert_with(|| Candidate {
                        entity: ExtractedEntity {
                            name: subject.clone(),
                            entity_type: entity_type.clone(),
                            description: sentence.clone(),
                            mentions: 0,
                        },
                        origin: Origin::Definition,
                    });
            }
        }

        for sentence in &sentences {
            for phrase in self.named_phrases(sentence) {
                candidates
                    .entry(entity_key(&phrase))
                    .or_insert_with(|| Candidate {
                        entity: ExtractedEntity {
                            name: phrase.clone(),
                            entity_type: NAMED_ENTITY_TYPE.to_string(),
                            description: sentence.clone(),
                            mentions: 0,
                        },
                        origin: Origin::Mention,
                    });
            }
        }

        for term in self.key_terms(&sentences) {
            let description = sentences
                .iter()
                .find(|s| s.to_lowercase().contains(&term))
                .cloned()
                .unwrap_or_default();
            candidates
                .entry(term.clone())
                .or_insert_with(|| Candidate {
                    entity: ExtractedEntity {
                        name: term,
                        entity_type: CONCEPT_TYPE.to_string(),
                        description,
                        mentions: 0,
                    },
                    origin: Origin::Mention,
                });
        }

        let lowered: Vec<String> = sentences.iter().map(|s| s.to_lowercase()).collect();
        for (key, candidate) in candidates.iter_mut() {
            candidate.entity.mentions = lowered
                .iter()
                .map(|s| occurrences(s, key).len())
                .sum::<usize>()
                .max(1);
        }

        let mut ranked: Vec<Candidate> = candidates.into_values().collect();
        ranked.sort_by(|a, b| {
            a.origin
                .cmp(&b.origin)
                .then(b.entity.mentions.cmp(&a.entity.mentions))
                .then(a.entity.name.cmp(&b.entity.name))
        });
        ranked.truncate(self.max_entities);

        let entities: Vec<ExtractedEntity> = ranked.into_iter().map(|c| c.entity).collect();
        let relations = self.relations(&lowered, &entities);

        ExtractedGraph {
            entities,
            relations,
        }
    }

    /// `(subject, type)` for sentences shaped like "X is a Y ...".
    fn definition(&self, sentence: &str) -> Option<(String, String)> {
        let caps = DEFINITION.captures(sentence)?;
        let subject = caps["subject"].trim().to_string();
        let subject_words = subject.split_whitespace().count();
        if subject_words == 0 || subject_words > MAX_SUBJECT_WORDS || is_stopword(&subject) {
            return None;
        }

        let type_words: Vec<String> = tokens(&first_clause(&caps["rest"]))
            .into_iter()
            .take_while(|w| !is_stopword(w))
            .take(MAX_TYPE_WORDS)
            .collect();
        if type_words.is_empty() {
            return None;
        }

        Some((subject.to_lowercase(), type_words.join(" ")))
    }

    /// Capitalised phrases. A lone capitalised word opening the sentence is ignored.
    fn named_phrases(&self, sentence: &str) -> Vec<String> {
        let mut phrases = Vec::new();

        for m in CAPITALIZED_PHRASE.find_iter(sentence) {
            let mut words: Vec<&str> = m.as_str().split_whitespace().collect();
            if m.start() == 0 && words.len() == 1 {
                continue;
            }
            while words.first().is_some_and(|w| is_stopword(w)) {
                words.remove(0);
            }
            if words.is_empty() || words.iter().all(|w| w.len() < 2) {
                continue;
            }
            phrases.push(words.join(" "));
        }

        phrases
    }

    /// Recurring bigrams (at least twice) and unigrams (at least `min_term_frequency` times).
    fn key_terms(&self, sentences: &[String]) -> Vec<String> {
        let mut unigrams: HashMap<String, usize> = HashMap::new();
        let mut bigrams: HashMap<String, usize> = HashMap::new();

        for sentence in sentences {
            let words = tokens(sentence);
            for word in &words {
                if word.len() >= 3 && !is_stopword(word) {
                    *unigrams.entry(word.clone()).or_insert(0) += 1;
                }
            }
            for pair in words.windows(2) {
                if pair.iter().all(|w| w.len() >= 3 && !is_stopword(w)) {
                    *bigrams.entry(pair.join(" ")).or_insert(0) += 1;
                }
            }
        }

        let mut terms: Vec<(String, usize)> = bigrams
            .into_iter()
            .filter(|(_, count)| *count >= 2)
            .chain(
                unigrams
                    .into_iter()
                    .filter(|(_, count)| *count >= self.min_term_frequency),
            )
            .collect();
        terms.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        terms.into_iter().map(|(term, _)| term).collect()
    }

    /// Links entities that follow each other inside one sentence.
    fn relations(
        &self,
        lowered_sentences: &[String],
        entities: &[ExtractedEntity],
    ) -> Vec<ExtractedRelation> {
        let mut relations = Vec::new();
        let mut seen: HashSet<(String, String, String)> = HashSet::new();

        for sentence in lowered_sentences {
            let mut spans: Vec<(usize, usize, String)> = entities
                .iter()
                .flat_map(|e| {
                    let key = e.key();
                    occurrences(sentence, &key)
                        .into_iter()
                        .map(move |start| (start, start + key.len(), key.clone()))
                })
                .collect();
            spans.sort_by(|a, b| a.0.cmp(&b.0).then((b.1 - b.0).cmp(&(a.1 - a.0))));

            let mut kept: Vec<(usize, usize, String)> = Vec::new();
            for span in spans {
                if kept.last().is_some_and(|last| span.0 < last.1) {
                    continue;
                }
                kept.push(span);
            }

            for pair in kept.windows(2) {
                let (_, source_end, source) = &pair[0];
                let (target_start, _, target) = &pair[1];
                if source == target {
                    continue;
                }

                let relationship = connecting_relationship(&sentence[*source_end..*target_start]);
                if seen.insert((source.clone(), target.clone(), relationship.clone())) {
                    relations.push(ExtractedRelation {
                        source: source.clone(),
                        target: target.clone(),
                        relationship,
                    });
                }
            }
        }

        relations
    }
}

pub fn entity_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn first_clause(text: &str) -> String {
    text.split([',', ';', ':', '.', '(', ')'])
        .next()
        .unwrap_or_default()
        .to_string()
}

fn connecting_relationship(between: &str) -> String {
    let words = tokens(between);
    if words.is_empty() || words.len() > MAX_CONNECTING_WORDS || between.contains([',', ';', ':']) {
        return DEFAULT_RELATIONSHIP.to_string();
    }
    words.join("_")
}

/// Byte offsets of whole-word occurrences of `needle` in `haystack`.
fn occurrences(haystack: &str, needle: &str) -> Vec<usize> {
    if needle.is_empty() {
        return Vec::new();
    }

    haystack
        .match_indices(needle)
        .filter(|(start, _)| {
            let end = start + needle.len();
            let before_ok = haystack[..*start]
                .chars()
                .next_back()
                .is_none_or(|c| !c.is_alphanumeric());
            let after_ok = haystack[end..]
                .chars()
                .next()
                .is_none_or(|c| !c.is_alphanumeric());
            before_ok && after_ok
        })
        .map(|(start, _)| start)
        .collect()
}
