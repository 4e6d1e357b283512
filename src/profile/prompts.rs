//! Prompt assembly for learning-profile descriptions.

use super::{McqAnswer, RatingAnswer};
use serde_json::json;
use std::collections::BTreeMap;

/// Fixed system prompt for the profile description request.
pub const PROFILE_SYSTEM_PROMPT: &str = "You are an educational psychologist who writes concise, \
encouraging learning-style profiles. Given a learner's questionnaire answers, their average \
scores per learning style, and their dominant style, write a short second-person description of \
how they learn best and which study strategies suit them. Respond with plain prose only.";

/// Assemble the user prompt from the learner's answers and scores.
///
/// Everything the model needs is serialized inline: the raw rating and
/// multiple-choice records, the per-style averages, the dominant style
/// label, and a question-to-answer map of the behavioral preferences.
pub(crate) fn build_profile_prompt(
    ratings: &[RatingAnswer],
    mcqs: &[McqAnswer],
    avg_scores: &BTreeMap<String, f64>,
    primary_style: &str,
    behavioral_prefs: &BTreeMap<&str, &str>,
) -> String {
    let answers = json!({
        "ratings": ratings,
        "mcqs": mcqs,
    });

    format!(
        "Questionnaire answers:\n{answers}\n\n\
         Average scores per learning style:\n{scores}\n\n\
         Dominant learning style: {primary_style}\n\n\
         Behavioral preferences:\n{prefs}\n\n\
         Write the learner's profile description.",
        answers = answers,
        scores = json!(avg_scores),
        prefs = json!(behavioral_prefs),
    )
}
