//! Text normalization and lexical similarity measures

use regex::Regex;
use std::collections::{BTreeMap, HashSet};

pub struct TextProcessor {
    word_regex: Regex,
    tfidf_token_regex: Regex,
    whitespace_regex: Regex,
    email_regex: Regex,
    phone_regex: Regex,
    ssn_regex: Regex,
}

impl Default for TextProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextProcessor {
    pub fn new() -> Self {
        let word_regex = Regex::new(r"\b\w+\b").expect("Invalid word regex");

        // Same token shape a default TF-IDF vectorizer uses: two or more word characters
        let tfidf_token_regex = Regex::new(r"\b\w\w+\b").expect("Invalid token regex");

        let whitespace_regex = Regex::new(r"\s+").expect("Invalid whitespace regex");

        let email_regex = Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}")
            .expect("Invalid email regex");

        let phone_regex = Regex::new(r"(?:\+?1[-. ]?)?\(?\b[0-9]{3}\)?[-. ]?[0-9]{3}[-. ]?[0-9]{4}\b")
            .expect("Invalid phone regex");

        let ssn_regex = Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("Invalid SSN regex");

        Self {
            word_regex,
            tfidf_token_regex,
            whitespace_regex,
            email_regex,
            phone_regex,
            ssn_regex,
        }
    }

    /// Lowercased `\w+` tokens
    pub fn word_tokens(&self, text: &str) -> HashSet<String> {
        let lower = text.to_lowercase();
        self.word_regex
            .find_iter(&lower)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Share of the reference vocabulary that also appears in the candidate lines
    pub fn token_coverage<R, C>(&self, reference: &[R], candidate: &[C]) -> f32
    where
        R: AsRef<str>,
        C: AsRef<str>,
    {
        let reference_text = join_lines(reference);
        let candidate_text = join_lines(candidate);

        let reference_tokens = self.word_tokens(&reference_text);
        if reference_tokens.is_empty() {
            return 0.0;
        }
        let candidate_tokens = self.word_tokens(&candidate_text);

        let shared = reference_tokens.intersection(&candidate_tokens).count();
        shared as f32 / reference_tokens.len() as f32
    }

    /// Cosine similarity of TF-IDF vectors fitted on just these two documents
    pub fn tfidf_cosine(&self, a: &str, b: &str) -> f32 {
        let counts_a = self.term_counts(a);
        let counts_b = self.term_counts(b);

        let vocabulary: HashSet<&String> = counts_a.keys().chain(counts_b.keys()).collect();
        if vocabulary.is_empty() {
            return 0.0;
        }

        // Smoothed idf: ln((1 + n) / (1 + df)) + 1 with n = 2 documents
        let n_docs = 2.0_f64;
        let weight = |term: &String, counts: &BTreeMap<String, usize>| -> f64 {
            let tf = *counts.get(term).unwrap_or(&0) as f64;
            if tf == 0.0 {
                return 0.0;
            }
            let df = counts_a.contains_key(term) as u8 as f64 + counts_b.contains_key(term) as u8 as f64;
            tf * (((1.0 + n_docs) / (1.0 + df)).ln() + 1.0)
        };

        let mut dot = 0.0;
        let mut norm_a = 0.0;
        let mut norm_b = 0.0;
        for term in vocabulary {
            let wa = weight(term, &counts_a);
            let wb = weight(term, &counts_b);
            dot += wa * wb;
            norm_a += wa * wa;
            norm_b += wb * wb;
        }

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(0.0, 1.0) as f32
    }

    fn term_counts(&self, text: &str) -> BTreeMap<String, usize> {
        let lower = text.to_lowercase();
        let mut counts = BTreeMap::new();
        for m in self.tfidf_token_regex.find_iter(&lower) {
            *counts.entry(m.as_str().to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// Collapse whitespace and normalize typographic punctuation
    pub fn clean_text(&self, text: &str) -> String {
        let normalized = self.normalize_unicode(text);
        self.whitespace_regex.replace_all(&normalized, " ").trim().to_string()
    }

    /// `clean_text` on every line; line breaks are kept
    pub fn clean_lines(&self, text: &str) -> String {
        text.lines().map(|l| self.clean_text(l)).collect::<Vec<_>>().join("\n")
    }

    fn normalize_unicode(&self, text: &str) -> String {
        text.chars()
            .map(|c| match c {
                '\u{2018}' | '\u{2019}' => '\'',
                '\u{201C}' | '\u{201D}' => '"',
                '\u{2013}' | '\u{2014}' => '-',
                '\u{00A0}' => ' ',
                _ => c,
            })
            .collect()
    }

    /// Remove personal identifiable information before text leaves the machine
    pub fn remove_pii(&self, text: &str) -> String {
        let mut cleaned = self.email_regex.replace_all(text, "[EMAIL REMOVED]").to_string();
        cleaned = self.ssn_regex.replace_all(&cleaned, "[SSN REMOVED]").to_string();
        cleaned = self.phone_regex.replace_all(&cleaned, "[PHONE REMOVED]").to_string();
        cleaned
    }
}

fn join_lines<S: AsRef<str>>(lines: &[S]) -> String {
    lines.iter().map(|l| l.as_ref()).collect::<Vec<_>>().join(" ")
}
