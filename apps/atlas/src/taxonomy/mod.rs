pub mod audit;
pub mod canonicalizer;
pub mod classifier;
pub mod linker;
pub mod merge;
pub mod overrides;
pub mod parser;
pub mod prompts;
pub mod repair;
pub mod seeder;

#[cfg(test)]
pub mod test_support;
