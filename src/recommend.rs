//! The model phase: ask for enumeration steps, then vet what comes back.
//!
//! Prompt construction and parsing live in their own submodules. Nothing
//! here talks to the network; the caller supplies a [`Generate`] endpoint.

mod parse;
mod prompt;

pub use parse::{Recommendations, parse_recommendations};
pub use prompt::{PromptContext, build_prompt};

use tracing::warn;

use crate::llm::Generate;

/// Prompt the model and interpret its answer.
///
/// Returns `None` when no usable answer came back (endpoint failure or an
/// unrenderable prompt). Otherwise the answer is parsed, which never fails.
pub fn ask(model: &dyn Generate, context: &PromptContext<'_>) -> Option<Recommendations> {
    let prompt = match build_prompt(context) {
        Ok(p) => p,
        Err(e) => {
            warn!("failed to render model prompt: {e}");
            return None;
        }
    };
    let raw = model.generate(&prompt)?;
    Some(parse_recommendations(&raw))
}
