use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use serenity::all::{ButtonStyle, CommandInteraction, Mentionable, UserId};
use serenity::builder::{CreateActionRow, CreateButton};
use tokio::task::JoinHandle;

use crate::catalog::SubOption;

pub const CHOICE_PROMPT: &str = "Please choose an option from the list below:";
pub const TIMEOUT_PROMPT: &str = "You took too long to respond. The options are now disabled.";
pub const DISABLED_LABEL: &str = "Option Disabled";

// Discord rejects action rows with more than five buttons.
const ROW_LIMIT: usize = 5;

const PRESENTING: u8 = 0;
const SELECTED: u8 = 1;
const TIMED_OUT: u8 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Presenting,
    Selected,
    TimedOut,
}

/// The shared state of one choice prompt. A click and the deadline timer race
/// for the single transition out of `Presenting`; whichever side wins the
/// compare-and-swap performs the visible mutation and the loser must do
/// nothing at all. The struct carries no Discord handles so the transitions
/// can be exercised directly in tests.
pub struct ChoiceCore {
    owner: u64,
    options: Vec<SubOption>,
    state: AtomicU8,
}

impl ChoiceCore {
    pub fn new(owner: u64, options: Vec<SubOption>) -> ChoiceCore {
        ChoiceCore {
            owner,
            options,
            state: AtomicU8::new(PRESENTING),
        }
    }

    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    /// Attempts the `Presenting -> Selected` transition for a click by
    /// `actor` on the 1-based option `index`. Ownership and bounds are
    /// checked before the swap so a foreign or malformed click can never
    /// consume the transition. The chosen option is handed out only to the
    /// single winner.
    pub fn try_select(&self, actor: u64, index: usize) -> Option<&SubOption> {
        if actor != self.owner {
            return None;
        }
        if index == 0 || index > self.options.len() {
            return None;
        }
        if self
            .state
            .compare_exchange(PRESENTING, SELECTED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }
        Some(&self.options[index - 1])
    }

    /// Attempts the `Presenting -> TimedOut` transition. True only for the
    /// single winner.
    pub fn try_timeout(&self) -> bool {
        self.state
            .compare_exchange(PRESENTING, TIMED_OUT, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn status(&self) -> SessionStatus {
        match self.state.load(Ordering::Acquire) {
            SELECTED => SessionStatus::Selected,
            TIMED_OUT => SessionStatus::TimedOut,
            _ => SessionStatus::Presenting,
        }
    }
}

/// A live prompt in the handler's registry: the shared transition state, the
/// interaction whose token can still edit the ephemeral prompt, and the
/// deadline task. The timer slot is filled right after the task is spawned.
pub struct ActiveSession {
    pub core: Arc<ChoiceCore>,
    pub interaction: CommandInteraction,
    pub timer: Option<JoinHandle<()>>,
}

pub fn choice_id(key: u64, index: usize) -> String {
    format!("choice:{}:{}", key, index)
}

/// Splits a button custom id back into its session key and 1-based option
/// index. Anything that does not look like a clickable choice id, including
/// the ids on already-disabled controls, comes back as None.
pub fn parse_choice_id(custom_id: &str) -> Option<(u64, usize)> {
    let parts: Vec<&str> = custom_id.splitn(3, ':').collect();
    if parts.len() != 3 || parts[0] != "choice" {
        return None;
    }
    let key = parts[1].parse::<u64>().ok()?;
    let index = parts[2].parse::<usize>().ok()?;
    Some((key, index))
}

pub fn choice_rows(key: u64, options: &[SubOption]) -> Vec<CreateActionRow> {
    let buttons: Vec<CreateButton> = options
        .iter()
        .enumerate()
        .map(|(i, option)| {
            CreateButton::new(choice_id(key, i + 1))
                .label(option.get_name())
                .style(ButtonStyle::Primary)
        })
        .collect();
    chunk_rows(buttons)
}

pub fn disabled_rows(key: u64, count: usize) -> Vec<CreateActionRow> {
    let buttons: Vec<CreateButton> = (1..=count)
        .map(|i| {
            CreateButton::new(format!("disabled:{}:{}", key, i))
                .label(DISABLED_LABEL)
                .style(ButtonStyle::Secondary)
                .disabled(true)
        })
        .collect();
    chunk_rows(buttons)
}

fn chunk_rows(buttons: Vec<CreateButton>) -> Vec<CreateActionRow> {
    buttons
        .chunks(ROW_LIMIT)
        .map(|chunk| CreateActionRow::Buttons(chunk.to_vec()))
        .collect()
}

pub fn timeout_followup(owner: UserId) -> String {
    format!("Hey {}, looks like you took too long to respond!", owner.mention())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    fn two_options() -> Vec<SubOption> {
        vec![
            SubOption::new("Round One", Some("https://example.com/1")),
            SubOption::new("Round Two", None),
        ]
    }

    #[test]
    fn owner_selection_wins_and_is_terminal() {
        let core = ChoiceCore::new(7, two_options());
        assert_eq!(core.status(), SessionStatus::Presenting);
        let chosen = core.try_select(7, 2).expect("owner click should win");
        assert_eq!(chosen.get_name(), "Round Two");
        assert_eq!(core.status(), SessionStatus::Selected);
        assert!(core.try_select(7, 1).is_none());
        assert!(!core.try_timeout());
        assert_eq!(core.status(), SessionStatus::Selected);
    }

    #[test]
    fn timeout_wins_and_blocks_later_clicks() {
        let core = ChoiceCore::new(7, two_options());
        assert!(core.try_timeout());
        assert_eq!(core.status(), SessionStatus::TimedOut);
        assert!(core.try_select(7, 1).is_none());
        assert!(!core.try_timeout());
    }

    #[test]
    fn foreign_clicks_do_not_consume_the_transition() {
        let core = ChoiceCore::new(7, two_options());
        assert!(core.try_select(8, 1).is_none());
        assert_eq!(core.status(), SessionStatus::Presenting);
        assert!(core.try_select(7, 1).is_some());
    }

    #[test]
    fn out_of_range_indexes_do_not_consume_the_transition() {
        let core = ChoiceCore::new(7, two_options());
        assert!(core.try_select(7, 0).is_none());
        assert!(core.try_select(7, 3).is_none());
        assert_eq!(core.status(), SessionStatus::Presenting);
        assert!(core.try_select(7, 1).is_some());
    }

    #[test]
    fn concurrent_click_and_timeout_have_exactly_one_winner() {
        for _ in 0..200 {
            let core = Arc::new(ChoiceCore::new(7, two_options()));
            let barrier = Arc::new(Barrier::new(2));

            let clicker = {
                let core = Arc::clone(&core);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    core.try_select(7, 1).is_some()
                })
            };
            let timer = {
                let core = Arc::clone(&core);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    core.try_timeout()
                })
            };

            let selected = clicker.join().unwrap();
            let timed_out = timer.join().unwrap();
            assert!(selected ^ timed_out, "exactly one side must win");
            if selected {
                assert_eq!(core.status(), SessionStatus::Selected);
            } else {
                assert_eq!(core.status(), SessionStatus::TimedOut);
            }
        }
    }

    #[test]
    fn choice_ids_round_trip() {
        assert_eq!(parse_choice_id(&choice_id(123, 4)), Some((123, 4)));
        assert_eq!(parse_choice_id("choice:18446744073709551615:1"), Some((u64::MAX, 1)));
    }

    #[test]
    fn malformed_and_disabled_ids_are_rejected() {
        for id in [
            "disabled:123:4",
            "choice:123",
            "choice:abc:1",
            "choice:123:one",
            "choice:123:2:junk",
            "option_1",
            "",
        ] {
            assert_eq!(parse_choice_id(id), None, "{:?} should not parse", id);
        }
    }

    // The builders serialize to the payload Discord receives, which is the
    // closest observable surface for the rendered rows.
    fn buttons_in(value: &serde_json::Value, out: &mut Vec<serde_json::Map<String, serde_json::Value>>) {
        match value {
            serde_json::Value::Object(map) => {
                if map.contains_key("custom_id") {
                    out.push(map.clone());
                }
                for nested in map.values() {
                    buttons_in(nested, out);
                }
            }
            serde_json::Value::Array(items) => {
                for nested in items {
                    buttons_in(nested, out);
                }
            }
            _ => {}
        }
    }

    fn all_buttons(rows: &[CreateActionRow]) -> Vec<serde_json::Map<String, serde_json::Value>> {
        let mut out = Vec::new();
        for row in rows {
            let value = serde_json::to_value(row).unwrap();
            buttons_in(&value, &mut out);
        }
        out
    }

    #[test]
    fn choice_rows_render_enabled_primary_buttons_in_order() {
        let rows = choice_rows(42, &two_options());
        assert_eq!(rows.len(), 1);
        let buttons = all_buttons(&rows);
        assert_eq!(buttons.len(), 2);

        assert_eq!(buttons[0]["custom_id"], "choice:42:1");
        assert_eq!(buttons[0]["label"], "Round One");
        assert_eq!(buttons[1]["custom_id"], "choice:42:2");
        assert_eq!(buttons[1]["label"], "Round Two");
        for button in &buttons {
            assert_eq!(button.get("style").and_then(|v| v.as_u64()), Some(1));
            let disabled = button.get("disabled").and_then(|v| v.as_bool()).unwrap_or(false);
            assert!(!disabled, "choice buttons must start clickable");
        }
    }

    #[test]
    fn disabled_rows_render_dead_secondary_controls() {
        let rows = disabled_rows(42, 2);
        let buttons = all_buttons(&rows);
        assert_eq!(buttons.len(), 2);
        for (i, button) in buttons.iter().enumerate() {
            assert_eq!(button["custom_id"], format!("disabled:42:{}", i + 1));
            assert_eq!(button["label"], DISABLED_LABEL);
            assert_eq!(button.get("style").and_then(|v| v.as_u64()), Some(2));
            assert_eq!(button.get("disabled").and_then(|v| v.as_bool()), Some(true));
        }
    }

    #[test]
    fn rows_are_chunked_at_the_discord_button_limit() {
        let options: Vec<SubOption> = (1..=7)
            .map(|i| SubOption::new(&format!("Option {}", i), None))
            .collect();
        let rows = choice_rows(42, &options);
        assert_eq!(rows.len(), 2);

        let mut first = Vec::new();
        buttons_in(&serde_json::to_value(&rows[0]).unwrap(), &mut first);
        let mut second = Vec::new();
        buttons_in(&serde_json::to_value(&rows[1]).unwrap(), &mut second);
        assert_eq!(first.len(), 5);
        assert_eq!(second.len(), 2);
        assert_eq!(second[1]["custom_id"], "choice:42:7");

        assert_eq!(disabled_rows(42, 7).len(), 2);
    }

    #[test]
    fn timeout_followup_mentions_the_owner() {
        let text = timeout_followup(UserId::new(42));
        assert!(text.contains("<@42>"));
        assert!(text.contains("looks like you took too long to respond!"));
    }
}
