use serenity::all::CommandOptionType;
use serenity::builder::{CreateCommand, CreateCommandOption};

use crate::catalog::SOCIAL_LINKS;

pub const GENERIC_FAILURE: &str = "An error occurred. Please try again later.";

/// The bot's whole command surface. Discord can deliver interactions outside
/// this set, for example leftovers from an earlier registration; those parse
/// to None and are dropped without any acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Help,
    Socials,
    Chuck,
    Search { query: String },
}

impl BotCommand {
    /// Maps a command name and its first string option to a known command.
    /// A search arriving without its required query is malformed and parses
    /// to None like an unknown name.
    pub fn parse(name: &str, query: Option<&str>) -> Option<BotCommand> {
        match name {
            "help" => Some(BotCommand::Help),
            "socials" => Some(BotCommand::Socials),
            "chuck" => Some(BotCommand::Chuck),
            "search" => query.map(|q| BotCommand::Search { query: q.to_string() }),
            _ => None,
        }
    }

    pub fn definitions() -> Vec<CreateCommand> {
        vec![
            CreateCommand::new("search")
                .description("Search for an object")
                .add_option(
                    CreateCommandOption::new(CommandOptionType::String, "query", "The name to search for")
                        .required(true),
                ),
            CreateCommand::new("socials").description("Get our social media links"),
            CreateCommand::new("help").description("Get help with using the bot"),
            CreateCommand::new("chuck").description("Get a random Chuck Norris joke"),
        ]
    }
}

pub fn help_text() -> String {
    "Available commands:\n\
    /help - Get help with using the bot\n\
    /chuck - Get a random Chuck Norris joke\n\
    /search - Search for an object\n\
    /socials - Get our social media links"
        .to_string()
}

pub fn socials_text() -> String {
    let mut text = String::from("Here are our social media links:\n");
    for (name, url) in SOCIAL_LINKS {
        text.push_str(&format!("{}: {}\n", name, url));
    }
    text
}

pub fn selection_text(name: &str, url: Option<&str>) -> String {
    match url {
        Some(url) => format!("You selected: {}. Here's the link: {}", name, url),
        None => format!("You selected: {}. No URL available.", name),
    }
}

pub fn no_match_text(query: &str) -> String {
    format!("No matching object found for \"{}\".", query)
}

pub fn scan_hit_text(name: &str, url: &str) -> String {
    format!("Here's the link for {}: {}", name, url)
}

pub fn scan_choice_text(name: &str) -> String {
    format!("Multiple options exist for {}. Use /search {} to pick one.", name, name)
}
