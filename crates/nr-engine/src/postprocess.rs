//! Text clean-up around generation: prompt normalization before encoding
//! and repair of the decoded continuation.

/// Marks the start of a player action in story text.
pub const ACTION_MARKER: char = '>';

const SENTENCE_ENDINGS: [char; 3] = ['.', '!', '?'];
const ACTION_ENDINGS: [char; 4] = ['.', '!', '?', ACTION_MARKER];
const MARKUP: [char; 2] = ['#', '*'];

/// Strip one trailing space from a prompt segment.
pub fn prompt_replace(segment: &str) -> String {
    segment.strip_suffix(' ').unwrap_or(segment).to_string()
}

/// Cut `text` at the earliest occurrence of any stop sequence.
pub fn truncate_at_stop_text<'a>(text: &'a str, stop_sequences: &[String]) -> &'a str {
    let cut = stop_sequences
        .iter()
        .filter(|stop| !stop.is_empty())
        .filter_map(|stop| text.find(stop.as_str()))
        .min();
    match cut {
        Some(index) => &text[..index],
        None => text,
    }
}

fn standardize_punctuation(text: &str) -> String {
    text.replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
}

/// Close an unbalanced double quote.
fn fix_trailing_quotes(mut text: String) -> String {
    if text.matches('"').count() % 2 == 1 {
        text.push('"');
    }
    text
}

/// Drop a final line in which the model starts speaking for the player.
fn cut_trailing_action(text: String) -> String {
    let Some(split) = text.rfind('\n') else {
        return text;
    };
    let last_line = text[split + 1..].to_lowercase();
    if last_line.contains("you ask") || last_line.contains("you say") {
        text[..split].to_string()
    } else {
        text
    }
}

/// Drop everything after the last complete sentence.
///
/// Text without any sentence ending is kept whole. Anything from a `<`
/// (the start of a control token) is dropped. With `allow_action` the action
/// marker also ends a sentence; without it, anything from the first action
/// marker is dropped, along with a trailing line that puts words in the
/// player's mouth.
pub fn cut_trailing_sentence(text: &str, allow_action: bool) -> String {
    let text = standardize_punctuation(text);
    let endings: &[char] = if allow_action {
        &ACTION_ENDINGS
    } else {
        &SENTENCE_ENDINGS
    };

    let mut end = match text.rfind(endings) {
        Some(index) if index > 0 => index + 1,
        _ => text.len(),
    };
    if let Some(index) = text.find('<') {
        if index > 0 {
            end = end.min(index);
        }
    }
    if !allow_action {
        if let Some(index) = text.find(ACTION_MARKER) {
            end = end.min(index);
        }
    }

    let cut = fix_trailing_quotes(text[..end].to_string());
    if allow_action {
        cut
    } else {
        cut_trailing_action(cut)
    }
}

/// Turn a decoded continuation into presentable story text.
///
/// Returns an empty string when nothing but whitespace survives.
pub fn result_replace(text: &str, allow_action: bool) -> String {
    let capitalized = text.chars().next().map_or(false, char::is_uppercase);

    let cut = cut_trailing_sentence(text, allow_action).replace(".\"", "\".");
    let mut result: String = cut.chars().filter(|c| !MARKUP.contains(c)).collect();
    while result.contains("\n\n") {
        result = result.replace("\n\n", "\n");
    }

    if result.trim().is_empty() {
        return String::new();
    }

    let mut chars = result.chars();
    match chars.next() {
        Some(first) => {
            let first: String = if capitalized {
                first.to_uppercase().collect()
            } else {
                first.to_lowercase().collect()
            };
            first + chars.as_str()
        }
        None => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_replace_strips_single_space() {
        assert_eq!(prompt_replace("You enter the hall. "), "You enter the hall.");
        assert_eq!(prompt_replace("two  "), "two ");
        assert_eq!(prompt_replace("none"), "none");
        assert_eq!(prompt_replace(""), "");
    }

    #[test]
    fn test_truncate_at_earliest_stop_text() {
        let stops = vec!["<|endoftext|>".to_string(), ">".to_string()];
        assert_eq!(
            truncate_at_stop_text(" The wind howls.\n> look<|endoftext|>", &stops),
            " The wind howls.\n"
        );
        assert_eq!(
            truncate_at_stop_text("Quiet.<|endoftext|> > x", &stops),
            "Quiet."
        );
        assert_eq!(truncate_at_stop_text("no stops", &stops), "no stops");
        assert_eq!(truncate_at_stop_text("x", &[String::new()]), "x");
    }

    #[test]
    fn test_cut_trailing_sentence() {
        assert_eq!(
            cut_trailing_sentence(" The door opens. A cold wind", false),
            " The door opens."
        );
        assert_eq!(cut_trailing_sentence("no ending here", false), "no ending here");
        assert_eq!(cut_trailing_sentence("Run! Hide? Now", false), "Run! Hide?");
    }

    #[test]
    fn test_cut_at_control_token() {
        assert_eq!(
            cut_trailing_sentence(" It is done. <|endoftext|>More.", false),
            " It is done. "
        );
    }

    #[test]
    fn test_action_marker_handling() {
        assert_eq!(cut_trailing_sentence("> You attack. The orc falls.", false), "");
        assert_eq!(
            cut_trailing_sentence("The orc falls. > You loot it.", false),
            "The orc falls. "
        );
        assert_eq!(
            cut_trailing_sentence("> You attack. The orc falls.", true),
            "> You attack. The orc falls."
        );
    }

    #[test]
    fn test_action_marker_ends_sentence_when_allowed() {
        assert_eq!(
            cut_trailing_sentence("The orc falls. You loot >", true),
            "The orc falls. You loot >"
        );
        assert_eq!(
            cut_trailing_sentence("The orc falls. You loot > and", true),
            "The orc falls. You loot >"
        );
        assert_eq!(
            cut_trailing_sentence("The orc falls. You loot >", false),
            "The orc falls."
        );
    }

    #[test]
    fn test_fixes_unbalanced_quote() {
        assert_eq!(
            cut_trailing_sentence("He says \u{201C}Hello there. Who", false),
            "He says \"Hello there.\""
        );
    }

    #[test]
    fn test_drops_trailing_player_line() {
        assert_eq!(
            cut_trailing_sentence("The guard nods.\nYou say hello.", false),
            "The guard nods."
        );
        assert_eq!(
            cut_trailing_sentence("The guard nods.\nYou say hello.", true),
            "The guard nods.\nYou say hello."
        );
    }

    #[test]
    fn test_result_replace_strips_markup_and_newlines() {
        assert_eq!(
            result_replace("## The *ancient* gate.\n\n\nIt creaks. and", false),
            " The ancient gate.\nIt creaks."
        );
    }

    #[test]
    fn test_result_replace_moves_period_outside_quote() {
        assert_eq!(
            result_replace("He says \"Stop.\" Then", false),
            "He says \"Stop\"."
        );
        assert_eq!(
            result_replace("He says \u{201C}Stop.", false),
            "He says \"Stop\"."
        );
    }

    #[test]
    fn test_result_replace_matches_case() {
        assert_eq!(result_replace("the hall is quiet.", false), "the hall is quiet.");
        assert_eq!(result_replace("*the hall is quiet.", false), "the hall is quiet.");
        assert_eq!(result_replace("The hall is quiet.", false), "The hall is quiet.");
    }

    #[test]
    fn test_result_replace_empty_cases() {
        assert_eq!(result_replace("", false), "");
        assert_eq!(result_replace("   \n ", false), "");
        assert_eq!(result_replace("> look around.", false), "");
        assert_eq!(result_replace("#**#", false), "");
    }

    #[test]
    fn test_result_replace_idempotent_on_clean_text() {
        for clean in [
            " The castle gate swings open.",
            "You see a lantern. It flickers!",
            "\"Who goes there?\" the guard asks.",
            "The guard says \"Halt\". He waits.",
            "lowercase start is kept.",
        ] {
            let once = result_replace(clean, false);
            let twice = result_replace(&once, false);
            assert_eq!(once, clean);
            assert_eq!(twice, once);
        }
    }
}
