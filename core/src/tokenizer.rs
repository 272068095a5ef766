use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"(?u)\p{L}[\p{L}\p{N}_']*").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","cannot","could","did","do","does","doing","down","during",
            "each","few","for","from","further",
            "had","has","have","having","he","her","here","hers","herself","him","himself","his","how",
            "i","if","in","into","is","it","it's","its","itself",
            "me","more","most","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","should","so","some","such",
            "than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
            "under","until","up","very",
            "was","we","were","what","when","where","which","while","who","whom","why","with","would",
            "you","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

/// How document text and query terms are turned into index terms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Analyzer {
    /// Text is already tokenized; split on whitespace and keep tokens verbatim.
    #[default]
    Whitespace,
    /// NFKC normalization, lowercase, stopword removal and English stemming.
    Normalized,
}

impl Analyzer {
    pub fn terms(&self, text: &str) -> Vec<String> {
        match self {
            Analyzer::Whitespace => text.split_whitespace().map(str::to_string).collect(),
            Analyzer::Normalized => normalized_terms(text),
        }
    }

    /// Map a single query token onto the term it would have been indexed as.
    /// `None` means the token can never match: it is a stopword, or it splits
    /// into several terms and so names no single posting list.
    pub fn query_term(&self, token: &str) -> Option<String> {
        match self {
            Analyzer::Whitespace => Some(token.to_string()),
            Analyzer::Normalized => {
                let mut terms = normalized_terms(token);
                if terms.len() == 1 { terms.pop() } else { None }
            }
        }
    }
}

fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

fn normalized_terms(text: &str) -> Vec<String> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    WORD.find_iter(&normalized)
        .map(|m| m.as_str())
        .filter(|t| !is_stopword(t))
        .map(|t| STEMMER.stem(t).to_string())
        .collect()
}
