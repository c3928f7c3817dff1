//! Command structs

use teloxide::utils::command::BotCommands;

/// Both commands drop any running flow and show the main menu.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub(crate) enum Command {
    #[command(description = "Open the main menu.")]
    Start,
    #[command(description = "Open the main menu.")]
    Menu,
}

/// Accepts `/menu`, `/menu@bot_username` and trailing arguments, which are
/// ignored (deep link payloads on `/start`).
pub(crate) fn parse_command(text: &str, bot_username: &str) -> Option<Command> {
    let word = text.split_whitespace().next()?;
    let name = word.strip_prefix('/')?;
    let name = match name.split_once('@') {
        Some((name, target)) if target.eq_ignore_ascii_case(bot_username) => name,
        Some(_) => return None,
        None => name,
    };

    match name.to_ascii_lowercase().as_str() {
        "start" => Some(Command::Start),
        "menu" => Some(Command::Menu),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_addressed_commands() {
        assert_eq!(parse_command("/start", "dress_bot"), Some(Command::Start));
        assert_eq!(parse_command(" /menu ", "dress_bot"), Some(Command::Menu));
        assert_eq!(
            parse_command("/menu@Dress_Bot", "dress_bot"),
            Some(Command::Menu)
        );
        assert_eq!(
            parse_command("/start invite-42", "dress_bot"),
            Some(Command::Start)
        );
    }

    #[test]
    fn ignores_other_text() {
        assert_eq!(parse_command("/menu@other_bot", "dress_bot"), None);
        assert_eq!(parse_command("/help", "dress_bot"), None);
        assert_eq!(parse_command("menu", "dress_bot"), None);
        assert_eq!(parse_command("", "dress_bot"), None);
    }
}
