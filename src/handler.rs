use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serenity::all::{Command, CommandInteraction, ComponentInteraction, GuildId, Interaction};
use serenity::async_trait;
use serenity::builder::{
    CreateInteractionResponse, CreateInteractionResponseFollowup, CreateInteractionResponseMessage,
    EditInteractionResponse,
};
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::catalog::{LookupTables, OptionGroup};
use crate::commands::{self, BotCommand};
use crate::joke::JokeClient;
use crate::resolver::{MatchMode, Resolution, resolve};
use crate::session::{self, ActiveSession, ChoiceCore};

pub struct Handler {
    tables: LookupTables,
    joke: JokeClient,
    choice_timeout: Duration,
    guild_id: Option<u64>,
    scan_messages: bool,
    sessions: Arc<Mutex<HashMap<u64, ActiveSession>>>,
}

impl Handler {
    pub fn new(
        tables: LookupTables,
        choice_timeout: u64,
        guild_id: Option<u64>,
        scan_messages: bool,
    ) -> Handler {
        Handler {
            tables,
            joke: JokeClient::new(),
            choice_timeout: Duration::from_secs(choice_timeout),
            guild_id,
            scan_messages,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn register_commands(&self, ctx: &Context) {
        let definitions = BotCommand::definitions();
        info!("Registering slash commands");
        match self.guild_id {
            Some(guild_id) if guild_id != 0 => {
                if let Err(why) = GuildId::new(guild_id).set_commands(&ctx.http, definitions).await {
                    error!("Failed to register commands in guild {}: {}", guild_id, why);
                } else {
                    info!("Slash commands registered in guild {}", guild_id);
                }
            }
            _ => {
                if let Err(why) = Command::set_global_commands(&ctx.http, definitions).await {
                    error!("Failed to register global commands: {}", why);
                } else {
                    info!("Slash commands registered globally");
                }
            }
        }
    }

    async fn handle_slash_command(
        &self,
        ctx: &Context,
        command: &CommandInteraction,
    ) -> Result<(), serenity::Error> {
        let query = command.data.options.get(0).and_then(|opt| opt.value.as_str());
        let bot_command = match BotCommand::parse(&command.data.name, query) {
            Some(bot_command) => bot_command,
            None => {
                debug!("Ignoring unknown command /{}", command.data.name);
                return Ok(());
            }
        };
        match bot_command {
            BotCommand::Help => self.respond_ephemeral(ctx, command, commands::help_text()).await,
            BotCommand::Socials => self.respond_ephemeral(ctx, command, commands::socials_text()).await,
            BotCommand::Chuck => self.handle_chuck(ctx, command).await,
            BotCommand::Search { query } => self.handle_search(ctx, command, &query).await,
        }
    }

    async fn respond_ephemeral(
        &self,
        ctx: &Context,
        command: &CommandInteraction,
        content: String,
    ) -> Result<(), serenity::Error> {
        command
            .create_response(&ctx.http, CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ))
            .await
    }

    async fn handle_chuck(
        &self,
        ctx: &Context,
        command: &CommandInteraction,
    ) -> Result<(), serenity::Error> {
        command.defer_ephemeral(&ctx.http).await?;
        let joke = self.joke.fetch_joke().await;
        command
            .edit_response(&ctx.http, EditInteractionResponse::new().content(joke))
            .await?;
        Ok(())
    }

    async fn handle_search(
        &self,
        ctx: &Context,
        command: &CommandInteraction,
        query: &str,
    ) -> Result<(), serenity::Error> {
        match resolve(&self.tables, query, MatchMode::Exact) {
            Resolution::DirectHit(entry) => {
                let content = commands::selection_text(entry.get_name(), entry.get_url());
                self.respond_ephemeral(ctx, command, content).await
            }
            Resolution::NeedsChoice(group) => self.start_choice_session(ctx, command, group).await,
            Resolution::NoMatch => {
                self.respond_ephemeral(ctx, command, commands::no_match_text(query)).await
            }
        }
    }

    /// Presents the group's options as buttons on an ephemeral reply and
    /// registers the session. The registry entry is only created once the
    /// prompt is actually on screen, so a failed reply leaves nothing behind.
    async fn start_choice_session(
        &self,
        ctx: &Context,
        command: &CommandInteraction,
        group: &OptionGroup,
    ) -> Result<(), serenity::Error> {
        let key = command.id.get();
        command
            .create_response(&ctx.http, CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(session::CHOICE_PROMPT)
                    .components(session::choice_rows(key, group.options()))
                    .ephemeral(true),
            ))
            .await?;
        info!(
            "Started choice session {} for {} with {} options",
            key,
            group.get_name(),
            group.options().len()
        );

        let core = Arc::new(ChoiceCore::new(command.user.id.get(), group.options().to_vec()));
        self.sessions.lock().unwrap().insert(key, ActiveSession {
            core: Arc::clone(&core),
            interaction: command.clone(),
            timer: None,
        });

        let timer = {
            let sessions = Arc::clone(&self.sessions);
            let core = Arc::clone(&core);
            let interaction = command.clone();
            let http = Arc::clone(&ctx.http);
            let timeout = self.choice_timeout;
            tokio::spawn(async move {
                sleep(timeout).await;
                if !core.try_timeout() {
                    debug!("Session {} was already {:?} when its deadline fired", key, core.status());
                    return;
                }
                sessions.lock().unwrap().remove(&key);
                info!("Choice session {} timed out", key);

                let followup = CreateInteractionResponseFollowup::new()
                    .content(session::timeout_followup(interaction.user.id))
                    .ephemeral(true);
                if let Err(why) = interaction.create_followup(&http, followup).await {
                    error!("Failed to send timeout followup for session {}: {}", key, why);
                }
                let edit = EditInteractionResponse::new()
                    .content(session::TIMEOUT_PROMPT)
                    .components(session::disabled_rows(key, core.option_count()));
                if let Err(why) = interaction.edit_response(&http, edit).await {
                    error!("Failed to disable expired options for session {}: {}", key, why);
                }
            })
        };
        if let Some(active) = self.sessions.lock().unwrap().get_mut(&key) {
            active.timer = Some(timer);
        }
        Ok(())
    }

    /// Routes a button click to its session. Clicks that lose the race, come
    /// from the wrong user, or reference a dead session are dropped without
    /// any acknowledgment.
    async fn handle_component(&self, ctx: &Context, component: &ComponentInteraction) {
        let (key, index) = match session::parse_choice_id(&component.data.custom_id) {
            Some(parsed) => parsed,
            None => return,
        };
        let claimed = {
            let mut sessions = self.sessions.lock().unwrap();
            let choice = sessions
                .get(&key)
                .and_then(|active| active.core.try_select(component.user.id.get(), index))
                .cloned();
            match choice {
                Some(option) => sessions.remove(&key).map(|active| (option, active)),
                None => None,
            }
        };
        let (option, mut active) = match claimed {
            Some(claimed) => claimed,
            None => {
                debug!("Dropping click on session {} from user {}", key, component.user.id);
                return;
            }
        };
        if let Some(timer) = active.timer.take() {
            timer.abort();
        }
        info!("Choice session {} resolved to option {}", key, index);

        let content = commands::selection_text(option.get_name(), option.get_url());
        let ack = CreateInteractionResponse::Message(
            CreateInteractionResponseMessage::new()
                .content(content.as_str())
                .ephemeral(true),
        );
        if let Err(why) = component.create_response(&ctx.http, ack).await {
            error!("Failed to acknowledge selection for session {}: {}", key, why);
        }
        let edit = EditInteractionResponse::new()
            .content(content)
            .components(session::disabled_rows(key, active.core.option_count()));
        if let Err(why) = active.interaction.edit_response(&ctx.http, edit).await {
            error!("Failed to disable used options for session {}: {}", key, why);
        }
    }

    /// One generic private reply for a handler that blew up, so the invoking
    /// user is never left staring at a spinner. Tries the initial response
    /// surface first and falls back to a followup when the interaction was
    /// already acknowledged.
    async fn send_failure_notice(&self, ctx: &Context, command: &CommandInteraction) {
        let notice = CreateInteractionResponse::Message(
            CreateInteractionResponseMessage::new()
                .content(commands::GENERIC_FAILURE)
                .ephemeral(true),
        );
        if command.create_response(&ctx.http, notice).await.is_err() {
            let followup = CreateInteractionResponseFollowup::new()
                .content(commands::GENERIC_FAILURE)
                .ephemeral(true);
            if let Err(why) = command.create_followup(&ctx.http, followup).await {
                error!("Failed to deliver the failure notice: {}", why);
            }
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        if !self.scan_messages || msg.author.bot {
            return;
        }
        let reply = match resolve(&self.tables, &msg.content, MatchMode::Contains) {
            Resolution::DirectHit(entry) => match entry.get_url() {
                Some(url) => commands::scan_hit_text(entry.get_name(), url),
                None => return,
            },
            Resolution::NeedsChoice(group) => commands::scan_choice_text(group.get_name()),
            Resolution::NoMatch => return,
        };
        if let Err(why) = msg.reply(&ctx.http, reply).await {
            error!("Failed to reply to scanned message: {}", why);
        }
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("Connected as {} ({})", ready.user.name, ready.user.id);
        self.register_commands(&ctx).await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => {
                if let Err(why) = self.handle_slash_command(&ctx, &command).await {
                    error!("Failed to handle /{}: {}", command.data.name, why);
                    self.send_failure_notice(&ctx, &command).await;
                }
            }
            Interaction::Component(component) => {
                self.handle_component(&ctx, &component).await;
            }
            _ => {}
        }
    }
}
