// Taxonomy LLM prompt templates.
// All prompts for the classifier are defined here.

pub const CANONICALIZE_SYSTEM: &str = "\
You are a technical data cleaner building a skill taxonomy from job postings. \
You MUST respond with a single valid JSON object only, with no markdown fences, no explanations. \
Every input key must appear exactly once in the output, spelled exactly as given.";

pub const CANONICALIZE_PROMPT: &str = r#"Normalize these raw technical skills to their canonical names.

INPUT is a JSON object: { "Raw Name": "Category context" | null }
OUTPUT must be a JSON object: { "Raw Name": "Canonical Name" | ["Canonical Name", ...] }

RULES:
1. GRANULARITY: {granularity}
2. SYNONYMS ONLY: merge only when the items are the same thing.
   - "React.js" -> "React"
   - "Amazon Web Services" -> "AWS"
   - "NodeJS" -> "Node.js"
3. CONTEXT: use the category only to disambiguate (e.g. "Go" under "Game" vs "Backend").
4. COMPOSITES: if a raw name joins several technologies ("Python/Go", "Java or Kotlin",
   "HTML & CSS"), return a LIST of the canonical name of each one, in input order:
   "Python/Go" -> ["Python", "Go"]. A single technology is a plain string, never a list.
5. ACRONYMS: resolve known ambiguous acronyms to one fixed name every time:
   "AI" -> "Artificial Intelligence", "ML" -> "Machine Learning", "JS" -> "JavaScript",
   "K8s" -> "Kubernetes", "GCP" -> "Google Cloud Platform".
6. FORMATTING: standard vendor capitalization ("iOS", "PostgreSQL", "C#", "Node.js").

INPUT:
{input_json}"#;

pub const SYNONYMS_SYSTEM: &str = "\
You are a conservative technical data cleaner. \
You MUST respond with a single valid JSON object only, with no markdown fences, no explanations. \
When in doubt, do NOT merge.";

pub const SYNONYMS_PROMPT: &str = r#"Below is a sorted list of canonical technical skill names.
Some are redundant spellings of each other.

INPUT LIST:
{names_json}

TASK:
1. Find clusters of names that mean exactly the same skill.
2. Pick ONE best name for each cluster.
3. Return a JSON object mapping each REDUNDANT name to the BEST name.
   Do NOT include names that stay unchanged. Return {} if nothing should merge.

MERGE ONLY:
- acronym / full-name pairs ("JS" -> "JavaScript")
- spelling variants and typos ("Postgress" -> "PostgreSQL", "ReactJS" -> "React")
- true synonyms ("Amazon Web Services" -> "AWS")

NEVER:
- {granularity}
- merge a specific tool into its parent category ("AWS Lambda" stays "AWS Lambda")

EXAMPLE OUTPUT:
{ "ReactJS": "React", "aws-lambda": "AWS Lambda" }"#;
