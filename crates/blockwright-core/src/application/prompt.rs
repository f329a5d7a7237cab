//! Prompt text for the generative path.

use crate::domain::{GenerationRequest, Prompt, config_block};

const SYSTEM: &str = "You are an expert theme developer. You write self-contained page \
sections as HTML with Liquid placeholders. Every section ends with exactly one JSON \
configuration block wrapped in {% schema %} and {% endschema %}. The block has a \
\"name\", a short \"description\" and a \"settings\" array; every {{ placeholder }} in the \
markup has a matching setting with an \"id\", \"type\", \"label\" and \"default\". Output \
only the sections, one after another, with no commentary.";

/// Build the prompt for `request`.
pub fn build_prompt(request: &GenerationRequest) -> Prompt {
    let count = request.max_results;
    let mut user = format!(
        "Write {count} distinct section{} for this request:\n\n{}\n",
        if count == 1 { "" } else { "s" },
        request.free_text.trim()
    );

    if !request.excluded_ids.is_empty() {
        let excluded: Vec<&str> = request.excluded_ids.iter().map(|id| id.as_str()).collect();
        user.push_str(&format!(
            "\nDo not reproduce these existing sections: {}.\n",
            excluded.join(", ")
        ));
    }

    user.push_str(&format!(
        "\nClose each section's configuration with {}.",
        config_block::BLOCK_CLOSE
    ));

    Prompt {
        system: SYSTEM.to_string(),
        user,
    }
}
