use std::fmt::Write as _;
use std::io::{self, Read};

use anyhow::{bail, Context, Result};
use clap::Args;

use crate::api::{ChatApi, ChatEntry, ChatId};
use crate::app::{App, ChatViewState, FormField, SyncOutcome};

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Username to look up (an empty value lists every message)
    #[arg(default_value = "")]
    pub username: String,
}

#[derive(Args, Debug, Clone)]
pub struct PostArgs {
    /// Author of the message
    pub username: String,
    /// Message text. If omitted, reads from stdin or prompts.
    #[arg(long)]
    pub text: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// Chat identifier
    pub id: ChatId,
    /// Replacement text
    pub text: String,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Chat identifier
    pub id: ChatId,
}

pub fn run_tui<A: ChatApi>(app: &mut App<A>) -> Result<()> {
    app.run()
}

pub fn list_chats<A: ChatApi>(api: &A) -> Result<()> {
    let output = run_list(api)?;
    print!("{output}");
    Ok(())
}

pub fn search_chats<A: ChatApi>(api: &A, args: SearchArgs) -> Result<()> {
    let output = run_search(api, &args)?;
    print!("{output}");
    Ok(())
}

pub fn post_chat<A: ChatApi>(api: &A, args: PostArgs) -> Result<()> {
    let text = match args.text {
        Some(text) => text,
        None => match read_stdin()? {
            Some(text) => text.trim_end().to_owned(),
            None => prompt("Message")?,
        },
    };
    let output = run_post(api, &args.username, &text)?;
    print!("{output}");
    Ok(())
}

pub fn edit_chat<A: ChatApi>(api: &A, args: EditArgs) -> Result<()> {
    let output = run_edit(api, &args)?;
    print!("{output}");
    Ok(())
}

pub fn delete_chat<A: ChatApi>(api: &A, args: DeleteArgs) -> Result<()> {
    let output = run_delete(api, &args)?;
    print!("{output}");
    Ok(())
}

fn run_list<A: ChatApi>(api: &A) -> Result<String> {
    let mut state = ChatViewState::new();
    ensure_synced(state.list(api), "fetching messages")?;
    Ok(format_chat_list(state.entries()))
}

fn run_search<A: ChatApi>(api: &A, args: &SearchArgs) -> Result<String> {
    let mut state = ChatViewState::new();
    ensure_synced(state.search(api, &args.username), "searching messages")?;
    Ok(format_chat_list(state.entries()))
}

fn run_post<A: ChatApi>(api: &A, username: &str, text: &str) -> Result<String> {
    let mut state = ChatViewState::new();
    let outcome = state.create(api, username, text);
    if outcome == SyncOutcome::Invalid {
        bail!("{}", validation_summary(&state));
    }
    ensure_synced(outcome, "posting message")?;
    Ok(format_chat_list(state.entries()))
}

fn run_edit<A: ChatApi>(api: &A, args: &EditArgs) -> Result<String> {
    if args.text.is_empty() {
        bail!("edit text cannot be empty");
    }
    let mut state = ChatViewState::new();
    ensure_synced(state.list(api), "fetching messages")?;
    if !state.update_edit_buffer(&args.id, args.text.as_str()) {
        bail!("chat #{} not found", args.id);
    }
    ensure_synced(state.commit_edit(api, &args.id), "saving edit")?;
    Ok(format!("Updated chat #{}\n", args.id))
}

fn run_delete<A: ChatApi>(api: &A, args: &DeleteArgs) -> Result<String> {
    api.delete_chat(&args.id)
        .with_context(|| format!("deleting chat #{}", args.id))?;
    let mut state = ChatViewState::new();
    ensure_synced(
        state.list(api),
        &format!("chat #{} was deleted, but refreshing messages", args.id),
    )?;
    let mut out = format!("Deleted chat #{}\n", args.id);
    out.push_str(&format_chat_list(state.entries()));
    Ok(out)
}

fn ensure_synced(outcome: SyncOutcome, what: &str) -> Result<()> {
    match outcome {
        SyncOutcome::Synced => Ok(()),
        SyncOutcome::Failed => bail!("{what} failed, see the log above for the server error"),
        SyncOutcome::Invalid | SyncOutcome::Skipped => bail!("{what} was not sent"),
    }
}

fn validation_summary(state: &ChatViewState) -> String {
    [FormField::Username, FormField::Message]
        .into_iter()
        .filter_map(|field| state.form.error(field))
        .collect::<Vec<_>>()
        .join("; ")
}

fn prompt(label: &str) -> Result<String> {
    use std::io::Write;
    let mut stdout = io::stdout();
    write!(stdout, "{}: ", label)?;
    stdout.flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end().to_owned())
}

fn read_stdin() -> Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(Some(buf))
}

fn format_chat_list<'a>(entries: impl IntoIterator<Item = &'a ChatEntry>) -> String {
    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(&mut out, "#{}  {}", entry.id, entry.username);
        let _ = writeln!(&mut out, "    {}", entry.text);
    }
    if out.is_empty() {
        out.push_str("No messages.\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{chat, Call, RecordingApi};

    type TestResult<T = ()> = Result<T>;

    fn board() -> RecordingApi {
        RecordingApi::with_chats(vec![
            chat(1, "ana", "morning all"),
            chat(2, "ben", "standup in 5"),
        ])
    }

    #[test]
    fn cli_list_prints_every_message() -> TestResult {
        let output = run_list(&board())?;

        assert_eq!(
            output,
            "#1  ana\n    morning all\n#2  ben\n    standup in 5\n"
        );
        Ok(())
    }

    #[test]
    fn cli_search_prints_single_match_or_nothing() -> TestResult {
        let api = board();

        let hit = run_search(
            &api,
            &SearchArgs {
                username: " ben ".into(),
            },
        )?;
        assert!(hit.contains("standup in 5"));
        assert!(!hit.contains("ana"));

        let miss = run_search(
            &api,
            &SearchArgs {
                username: "zoe".into(),
            },
        )?;
        assert_eq!(miss, "No messages.\n");
        assert_eq!(
            api.calls(),
            vec![Call::Find("ben".into()), Call::Find("zoe".into())]
        );
        Ok(())
    }

    #[test]
    fn cli_post_rejects_blank_fields_without_a_request() {
        let api = board();

        let err = run_post(&api, "  ", "").unwrap_err();

        assert_eq!(
            err.to_string(),
            "Username is required; Message is required"
        );
        assert!(api.calls().is_empty());
    }

    #[test]
    fn cli_post_sends_fields_as_typed() -> TestResult {
        let api = board();

        let output = run_post(&api, " cleo ", "hello")?;

        assert!(output.contains("#3   cleo \n    hello\n"));
        assert_eq!(
            api.calls(),
            vec![Call::Create {
                username: " cleo ".into(),
                text: "hello".into(),
            }]
        );
        Ok(())
    }

    #[test]
    fn cli_edit_sends_put_for_known_id() -> TestResult {
        let api = board();
        let args = EditArgs {
            id: ChatId::Number(2),
            text: "standup moved".into(),
        };

        let output = run_edit(&api, &args)?;

        assert_eq!(output, "Updated chat #2\n");
        assert_eq!(api.server_chats()[1].text, "standup moved");
        Ok(())
    }

    #[test]
    fn cli_edit_unknown_id_fails_before_put() {
        let api = board();
        let args = EditArgs {
            id: ChatId::Number(9),
            text: "nope".into(),
        };

        let err = run_edit(&api, &args).unwrap_err();

        assert_eq!(err.to_string(), "chat #9 not found");
        assert_eq!(api.calls(), vec![Call::List]);
    }

    #[test]
    fn cli_delete_prints_remaining_board() -> TestResult {
        let api = board();

        let output = run_delete(
            &api,
            &DeleteArgs {
                id: ChatId::Number(1),
            },
        )?;

        assert!(output.starts_with("Deleted chat #1\n"));
        assert!(!output.contains("ana"));
        assert!(output.contains("ben"));
        Ok(())
    }

    #[test]
    fn cli_edit_rejects_empty_text() {
        let api = board();
        let args = EditArgs {
            id: ChatId::Number(1),
            text: String::new(),
        };

        let err = run_edit(&api, &args).unwrap_err();

        assert_eq!(err.to_string(), "edit text cannot be empty");
        assert!(api.calls().is_empty());
    }

    #[test]
    fn cli_surfaces_delete_failures() {
        let api = board();
        api.set_failing(true);

        let err = run_delete(
            &api,
            &DeleteArgs {
                id: ChatId::Number(1),
            },
        )
        .unwrap_err();

        assert_eq!(err.to_string(), "deleting chat #1");
        assert_eq!(api.calls(), vec![Call::Delete(ChatId::Number(1))]);
    }

    #[test]
    fn cli_delete_reports_refresh_failure_separately() {
        let api = board();
        api.set_list_failing(true);

        let err = run_delete(
            &api,
            &DeleteArgs {
                id: ChatId::Number(1),
            },
        )
        .unwrap_err();

        assert!(err
            .to_string()
            .starts_with("chat #1 was deleted, but refreshing messages failed"));
        assert_eq!(
            api.calls(),
            vec![Call::Delete(ChatId::Number(1)), Call::List]
        );
        assert_eq!(api.server_chats().len(), 1);
    }
}
