//! Interactive terminal front end.
//!
//! A blocking rustyline thread feeds typed lines into the async side, where
//! [`Shell`] turns them into connector and session calls. Lines received from
//! the room are printed by a separate task with an `HH:MM:SS` prefix.

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::{mpsc, watch};

use relaychat_shared::time::{Clock, SystemClock};

use crate::{
    connector::Connector,
    domain::{InputCommand, parse_input, validate_handshake_token},
    error::ClientError,
    formatter::MessageFormatter,
    session::ClientSession,
    sink::ClientEvent,
    ui::{prompt_for, redisplay_prompt},
};

/// Run the interactive client until the user quits or input ends.
///
/// With a `room`, the client joins it right away and a failure to do so is
/// returned. Without one, it prints the room list and waits for `/join`.
pub async fn run_client(
    server_addr: String,
    name: String,
    room: Option<String>,
) -> Result<(), ClientError> {
    let name = validate_handshake_token(&name, "display name")?;

    let (event_tx, event_rx) = mpsc::unbounded_channel::<ClientEvent>();
    let (prompt_tx, prompt_rx) = watch::channel(prompt_for(&name, None));
    let mut shell = Shell::new(Connector::default(), server_addr, name, event_tx, prompt_tx);

    let opening = match room {
        Some(room) => shell.join(&room).await?,
        None => shell.execute(InputCommand::Rooms).await.into_lines(),
    };
    print_lines(&opening);
    println!("{}", MessageFormatter::format_help());

    let printer = tokio::spawn(print_events(event_rx, prompt_rx.clone(), SystemClock));
    let mut input_rx = spawn_line_reader(prompt_rx);

    while let Some(line) = input_rx.recv().await {
        match shell.execute(parse_input(&line)).await {
            ShellStep::Continue(lines) => print_lines(&lines),
            ShellStep::Quit(lines) => {
                print_lines(&lines);
                break;
            }
        }
    }

    shell.shutdown().await;
    printer.abort();
    tracing::info!("Client exited");
    Ok(())
}

/// What the input loop should do after a command.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ShellStep {
    Continue(Vec<String>),
    Quit(Vec<String>),
}

impl ShellStep {
    fn into_lines(self) -> Vec<String> {
        match self {
            ShellStep::Continue(lines) | ShellStep::Quit(lines) => lines,
        }
    }
}

/// Command interpreter holding the current room session, if any.
pub(crate) struct Shell {
    connector: Connector,
    server_addr: String,
    name: String,
    session: Option<ClientSession>,
    events: mpsc::UnboundedSender<ClientEvent>,
    prompt: watch::Sender<String>,
}

impl Shell {
    pub(crate) fn new(
        connector: Connector,
        server_addr: String,
        name: String,
        events: mpsc::UnboundedSender<ClientEvent>,
        prompt: watch::Sender<String>,
    ) -> Self {
        Self {
            connector,
            server_addr,
            name,
            session: None,
            events,
            prompt,
        }
    }

    pub(crate) fn current_room(&self) -> Option<&str> {
        self.session.as_ref().map(ClientSession::room)
    }

    pub(crate) async fn execute(&mut self, command: InputCommand) -> ShellStep {
        match command {
            InputCommand::Empty => ShellStep::Continue(Vec::new()),
            InputCommand::Quit => {
                let lines = self.leave().await.into_iter().collect();
                ShellStep::Quit(lines)
            }
            InputCommand::Leave => match self.leave().await {
                Some(line) => ShellStep::Continue(vec![line]),
                None => ShellStep::Continue(vec!["Not in a room".to_string()]),
            },
            InputCommand::Rooms => match self.connector.list_rooms(&self.server_addr).await {
                Ok(rooms) => ShellStep::Continue(vec![MessageFormatter::format_room_list(&rooms)]),
                Err(e) => {
                    tracing::warn!("Room list query failed: {}", e);
                    ShellStep::Continue(vec![e.to_string()])
                }
            },
            InputCommand::Join(room) => match self.join(&room).await {
                Ok(lines) => ShellStep::Continue(lines),
                Err(e) => {
                    tracing::warn!("Failed to join room '{}': {}", room, e);
                    ShellStep::Continue(vec![e.to_string()])
                }
            },
            InputCommand::Say(text) => ShellStep::Continue(self.say(&text).await),
            InputCommand::Unknown(input) => ShellStep::Continue(vec![
                format!("Unknown command: {}", input),
                MessageFormatter::format_help(),
            ]),
        }
    }

    /// Leave the current room, if any, then join `room`.
    pub(crate) async fn join(&mut self, room: &str) -> Result<Vec<String>, ClientError> {
        let mut lines: Vec<String> = self.leave().await.into_iter().collect();

        let session = self
            .connector
            .join(&self.server_addr, room, &self.name, self.events.clone())
            .await?;
        lines.push(MessageFormatter::format_welcome(session.room()));
        self.session = Some(session);
        self.refresh_prompt();
        Ok(lines)
    }

    async fn leave(&mut self) -> Option<String> {
        let session = self.session.take()?;
        let room = session.room().to_string();
        session.leave().await;
        self.refresh_prompt();
        Some(MessageFormatter::format_left(&room))
    }

    async fn say(&mut self, text: &str) -> Vec<String> {
        let Some(session) = self.session.as_ref() else {
            return vec!["Join a room first with /join <room>".to_string()];
        };

        match session.send(text).await {
            Ok(()) => Vec::new(),
            Err(ClientError::Disconnected) => {
                // The receive task already reported the loss; drop the dead session.
                self.leave().await;
                vec![MessageFormatter::format_send_failed(
                    &ClientError::Disconnected.to_string(),
                )]
            }
            Err(e) => {
                tracing::warn!("Send failed: {}", e);
                vec![MessageFormatter::format_send_failed(&e.to_string())]
            }
        }
    }

    pub(crate) async fn shutdown(&mut self) {
        self.leave().await;
    }

    fn refresh_prompt(&self) {
        let prompt = prompt_for(&self.name, self.current_room());
        self.prompt.send_replace(prompt);
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

async fn print_events<C>(
    mut events: mpsc::UnboundedReceiver<ClientEvent>,
    prompt: watch::Receiver<String>,
    clock: C,
) where
    C: Clock,
{
    while let Some(event) = events.recv().await {
        let text = match event {
            ClientEvent::Message(line) => MessageFormatter::format_received(&line, &clock.now()),
            ClientEvent::ConnectionLost => MessageFormatter::format_connection_lost(),
        };
        print!("\r{}\n", text);
        redisplay_prompt(&prompt.borrow());
    }
}

/// Read stdin on a dedicated thread, since rustyline blocks.
fn spawn_line_reader(prompt: watch::Receiver<String>) -> mpsc::UnboundedReceiver<String> {
    let (input_tx, input_rx) = mpsc::unbounded_channel::<String>();

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            let current_prompt = prompt.borrow().clone();
            match rl.readline(&current_prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str()).ok();
                    }
                    if input_tx.send(line).is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    input_rx
}
