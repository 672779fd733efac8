use serde_json::{Map, Value};

/// Free-form key/value data supplied with a generation request.
pub type Context = Map<String, Value>;

// ─── Agent personas ───────────────────────────────────────────────────────

const DEFAULT_PERSONA: &str = "You are a versatile writing assistant for a novelist. \
     Produce polished, publishable prose that matches the requested genre and tone. \
     Respond with the requested content only — no preamble, no commentary.";

/// System prompt for a named agent. Unrecognised names fall back to the
/// default persona.
pub fn system_prompt_for(agent: &str) -> &'static str {
    match agent {
        "plot_architect" => {
            "You are a plot architect for long-form fiction. You design story \
             structure: acts, turning points, setups and payoffs, escalating \
             stakes. Keep every beat causally connected. Respond with the \
             requested content only."
        }
        "character_psychologist" => {
            "You are a character psychologist. You build fictional people with \
             coherent inner lives: wants versus needs, wounds, contradictions, \
             and voice. Ground every trait in backstory. Respond with the \
             requested content only."
        }
        "prose_stylist" => {
            "You are a prose stylist. You write vivid scene-level fiction with \
             strong sensory grounding, controlled pacing, and dialogue that \
             carries subtext. Match the manuscript's established tone. Respond \
             with the requested content only."
        }
        "continuity_editor" => {
            "You are a continuity editor. You review draft chapters for plot \
             holes, timeline slips, dropped threads, and character \
             inconsistencies, and report concrete fixes. Respond with the \
             requested content only."
        }
        _ => DEFAULT_PERSONA,
    }
}

// ─── Action prompt builders ───────────────────────────────────────────────

/// Build the user prompt for `action` from the request context.
///
/// Returns `None` when no builder exists for the action; the orchestrator
/// treats that as a deliberate not-implemented fallback, not an error.
pub fn build_prompt(action: &str, context: &Context) -> Option<String> {
    match action {
        "generate_scene" => Some(generate_scene(context)),
        "develop_character" => Some(develop_character(context)),
        "outline_plot" => Some(outline_plot(context)),
        "review_chapter" => Some(review_chapter(context)),
        _ => None,
    }
}

/// Placeholder text for actions with no prompt builder.
pub fn not_implemented_text(action: &str) -> String {
    format!("Generation for '{action}' is not implemented yet.")
}

/// Compact `k=v` rendering of the context, for logs and simulated output.
pub fn ctx_display(context: &Context) -> String {
    if context.is_empty() {
        return "no context".into();
    }
    context
        .iter()
        .map(|(k, v)| match v {
            Value::String(s) => format!("{k}={s}"),
            other => format!("{k}={other}"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn ctx_str<'a>(context: &'a Context, key: &str, default: &'a str) -> &'a str {
    context.get(key).and_then(Value::as_str).unwrap_or(default)
}

fn generate_scene(ctx: &Context) -> String {
    format!(
        "Write a scene for the novel \"{title}\" ({genre}, {tone} tone).\n\
         Setting: {setting}\n\
         Characters present: {characters}\n\
         The scene should accomplish: {beats}\n\n\
         Write 400-800 words of finished prose. Stay in close third person \
         unless the context says otherwise.",
        title = ctx_str(ctx, "title", "Untitled"),
        genre = ctx_str(ctx, "genre", "literary fiction"),
        tone = ctx_str(ctx, "tone", "neutral"),
        setting = ctx_str(ctx, "setting", "unspecified"),
        characters = ctx_str(ctx, "characters", "the protagonist"),
        beats = ctx_str(ctx, "beats", "advance the current plot thread"),
    )
}

fn develop_character(ctx: &Context) -> String {
    format!(
        "Develop a character profile for \"{name}\", the {role} of a {genre} novel.\n\
         Known details: {notes}\n\n\
         Cover: background, core want and hidden need, defining wound, \
         speech patterns, and how they change over the story. Use headed \
         sections.",
        name = ctx_str(ctx, "name", "an unnamed character"),
        role = ctx_str(ctx, "role", "protagonist"),
        genre = ctx_str(ctx, "genre", "literary fiction"),
        notes = ctx_str(ctx, "notes", "none provided"),
    )
}

fn outline_plot(ctx: &Context) -> String {
    format!(
        "Outline the plot of a {genre} novel from this premise:\n\
         {premise}\n\n\
         Produce a {acts}-act outline. For each act list the major beats, \
         the midpoint or turning point, and the state of the protagonist at \
         the act break.",
        genre = ctx_str(ctx, "genre", "literary fiction"),
        premise = ctx_str(ctx, "premise", "a premise of your choosing"),
        acts = ctx_str(ctx, "acts", "three"),
    )
}

fn review_chapter(ctx: &Context) -> String {
    format!(
        "Review the following chapter (\"{title}\") for continuity, pacing, \
         and character consistency. Report findings as a bulleted list, most \
         serious first, each with a suggested fix.\n\n---\n{text}",
        title = ctx_str(ctx, "title", "untitled chapter"),
        text = ctx_str(ctx, "text", ""),
    )
}
