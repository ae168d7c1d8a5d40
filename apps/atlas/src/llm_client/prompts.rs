// Shared prompt constants.
// Each module that needs LLM calls defines its own prompts.rs alongside it.
// This file holds the fragments shared across them.

/// Instruction shared by every taxonomy prompt: never collapse a concrete tool into its category.
pub const GRANULARITY_INSTRUCTION: &str = "\
    CRITICAL: Preserve distinct technologies. Never generalize a specific tool, \
    framework, service or language into a broader category. \
    \"AWS\" != \"Azure\" != \"GCP\" (never \"Cloud Platforms\"). \
    \"React\" != \"React Native\" != \"Angular\". \
    \"Manual Testing\" != \"Automated Testing\" != \"QA\".";
