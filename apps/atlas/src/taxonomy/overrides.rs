//! Fixed raw → canonical assignments that never need the classifier.
//!
//! Covers spellings the model is known to waver on and the handful of natural-language
//! names that show up in Polish postings. Matching is case-insensitive on the trimmed raw string.

const STATIC_OVERRIDES: &[(&str, &str)] = &[
    // Languages (spoken)
    ("angielski", "English"),
    ("język angielski", "English"),
    ("niemiecki", "German"),
    ("język niemiecki", "German"),
    ("francuski", "French"),
    ("hiszpański", "Spanish"),
    ("polski", "Polish"),
    ("język polski", "Polish"),
    ("english", "English"),
    ("german", "German"),
    // Ambiguous acronyms and shorthand
    ("js", "JavaScript"),
    ("ts", "TypeScript"),
    ("golang", "Go"),
    ("k8s", "Kubernetes"),
    ("postgres", "PostgreSQL"),
    ("postgresql", "PostgreSQL"),
    ("psql", "PostgreSQL"),
    ("ml", "Machine Learning"),
    ("ai", "Artificial Intelligence"),
    ("gcp", "Google Cloud Platform"),
    ("aws", "AWS"),
    ("amazon web services", "AWS"),
    ("node", "Node.js"),
    ("nodejs", "Node.js"),
    ("node.js", "Node.js"),
    ("c sharp", "C#"),
    ("ci/cd", "CI/CD"),
];

/// Returns the fixed canonical name for a raw string, if the table has one.
pub fn static_override(raw: &str) -> Option<&'static str> {
    let needle = raw.trim().to_lowercase();
    STATIC_OVERRIDES
        .iter()
        .find(|(from, _)| from.to_lowercase() == needle)
        .map(|(_, to)| *to)
}
