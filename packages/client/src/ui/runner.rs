//! Client execution: wires the session, the use cases and the terminal.

use std::{path::PathBuf, sync::Arc, time::Duration};

use hiroba_shared::time::{Clock, SystemClock};
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

use crate::{
    domain::{DirectoryService, ReconnectPolicy, RoomId, Username, UsernameStore},
    infrastructure::{DirectoryConfig, FileUsernameStore, HttpDirectoryClient, WebSocketConnector},
    session::{ChatSession, ConnectionState, HeartbeatConfig, SessionConfig, Subscription},
    usecase::{
        CloseRoomUseCase, CreateRoomUseCase, LeaveRoomUseCase, ListRoomsUseCase, LoginUseCase,
        LogoutUseCase, OpenRoomUseCase,
    },
};

use super::{
    command::UserCommand, error::ClientError, formatter::MessageFormatter, prompt::Prompt,
};

/// Settings of one client run
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub ws_url: String,
    pub api_url: String,
    pub state_file: PathBuf,
    /// Log in as this user; otherwise the saved user is resumed
    pub username: Option<String>,
    pub reconnect_delay: Duration,
    pub heartbeat: Duration,
    pub history_limit: usize,
}

/// Run the terminal chat client until `/quit` or end of input
pub async fn run_client(options: ClientOptions) -> Result<(), ClientError> {
    let directory = HttpDirectoryClient::new(DirectoryConfig::new(options.api_url.clone()))?;
    let store = FileUsernameStore::new(options.state_file.clone());
    let config = SessionConfig::new(options.ws_url.clone())
        .with_heartbeat(HeartbeatConfig::symmetric(options.heartbeat))
        .with_reconnect(ReconnectPolicy::fixed(options.reconnect_delay));
    let session = ChatSession::start(config, WebSocketConnector::new(options.ws_url.clone()));
    tracing::info!(
        "Chat service at {} (messages: {})",
        options.api_url,
        options.ws_url
    );

    let prompt = Prompt::new();
    let mut app = ClientApp::new(
        Arc::new(directory),
        Arc::new(store),
        session.clone(),
        Arc::new(SystemClock),
        prompt.clone(),
    )
    .with_history_limit(options.history_limit);

    // 1. login with the given user, or resume the saved one
    match options.username.as_deref() {
        Some(username) => app.login(username).await?,
        None => app.resume().await?,
    }
    if app.username.is_none() {
        println!("\nEnter a username to log in. Type /help for commands.\n");
    } else {
        println!("\nType /help for commands. Press Ctrl+C to exit.\n");
    }

    // 2. connection state changes and keyboard input
    let state_task = spawn_state_printer(session.watch_state(), prompt.clone());
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();
    let _readline_handle = spawn_readline(input_tx, prompt.clone());

    while let Some(line) = input_rx.recv().await {
        match app.handle_line(&line).await {
            Outcome::Print(output) => {
                print!("{}", output);
                prompt.redisplay();
            }
            Outcome::Quit => break,
        }
    }

    // 3. leave the open room and disconnect
    state_task.abort();
    session.shutdown().await;
    tracing::info!("Client stopped");
    Ok(())
}

/// Print every connection state change
fn spawn_state_printer(
    mut state: watch::Receiver<ConnectionState>,
    prompt: Prompt,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while state.changed().await.is_ok() {
            let current = *state.borrow_and_update();
            print!("{}", MessageFormatter::format_connection_state(&current));
            prompt.redisplay();
        }
    })
}

/// Spawn a blocking thread for rustyline (synchronous readline)
fn spawn_readline(
    input_tx: mpsc::UnboundedSender<String>,
    prompt: Prompt,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(&prompt.text()) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
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
    })
}

/// What to do after one input line
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    Print(String),
    Quit,
}

/// Room the terminal is showing
struct OpenView {
    room_id: RoomId,
    subscription: Subscription,
    /// The session has reported this room as current at least once
    confirmed: bool,
}

/// Terminal client state and command handling
pub(crate) struct ClientApp {
    session: ChatSession,
    clock: Arc<dyn Clock>,
    prompt: Prompt,
    login: LoginUseCase,
    logout: LogoutUseCase,
    list_rooms: ListRoomsUseCase,
    create_room: CreateRoomUseCase,
    open_room: OpenRoomUseCase,
    close_room: CloseRoomUseCase,
    leave_room: LeaveRoomUseCase,
    username: Option<Username>,
    open: Option<OpenView>,
}

impl ClientApp {
    pub(crate) fn new(
        directory: Arc<dyn DirectoryService>,
        store: Arc<dyn UsernameStore>,
        session: ChatSession,
        clock: Arc<dyn Clock>,
        prompt: Prompt,
    ) -> Self {
        Self {
            login: LoginUseCase::new(Arc::clone(&store), session.clone()),
            logout: LogoutUseCase::new(store, session.clone()),
            list_rooms: ListRoomsUseCase::new(Arc::clone(&directory)),
            create_room: CreateRoomUseCase::new(Arc::clone(&directory)),
            open_room: OpenRoomUseCase::new(Arc::clone(&directory), session.clone()),
            close_room: CloseRoomUseCase::new(session.clone()),
            leave_room: LeaveRoomUseCase::new(directory, session.clone()),
            session,
            clock,
            prompt,
            username: None,
            open: None,
        }
    }

    pub(crate) fn with_history_limit(mut self, history_limit: usize) -> Self {
        self.open_room = self.open_room.with_history_limit(history_limit);
        self
    }

    pub(crate) async fn login(&mut self, username: &str) -> Result<(), ClientError> {
        let username = self.login.execute(username).await?;
        self.set_user(Some(username));
        Ok(())
    }

    pub(crate) async fn resume(&mut self) -> Result<(), ClientError> {
        let username = self.login.resume().await?;
        self.set_user(username);
        Ok(())
    }

    /// Handle one non-empty input line
    pub(crate) async fn handle_line(&mut self, line: &str) -> Outcome {
        let command = match UserCommand::parse(line) {
            Ok(command) => command,
            Err(e) => return Outcome::Print(MessageFormatter::format_error(&e.to_string())),
        };

        // before login, plain text is the username
        if self.username.is_none()
            && let UserCommand::Chat(name) = &command
        {
            return match self.login(name).await {
                Ok(()) => Outcome::Print(format!("\nLogged in as {}\n", name.trim())),
                Err(e) => Outcome::Print(MessageFormatter::format_error(&e.to_string())),
            };
        }

        match self.handle(command).await {
            Ok(Some(output)) => Outcome::Print(output),
            Ok(None) => Outcome::Quit,
            Err(e) => {
                tracing::debug!("Command failed: {}", e);
                Outcome::Print(MessageFormatter::format_error(&e.to_string()))
            }
        }
    }

    /// `Ok(None)` ends the client
    async fn handle(&mut self, command: UserCommand) -> Result<Option<String>, ClientError> {
        let output = match command {
            UserCommand::Rooms => {
                let rooms = self.list_rooms.execute().await?;
                MessageFormatter::format_room_list(&rooms, self.username.as_ref())
            }
            UserCommand::MyRooms => {
                let username = self.require_user()?;
                let rooms = self.list_rooms.execute_for_user(&username).await?;
                MessageFormatter::format_room_list(&rooms, Some(&username))
            }
            UserCommand::Create(name) => {
                let username = self.require_user()?;
                let room = self.create_room.execute(&name, &username).await?;
                MessageFormatter::format_room_created(&room)
            }
            UserCommand::Join(room_id) => {
                if !self.session.is_connected() {
                    return Err(ClientError::NotConnected);
                }
                self.open(room_id).await
            }
            UserCommand::Close => {
                let view = self.open.take().ok_or(ClientError::NoOpenRoom)?;
                self.close_room.execute(view.subscription);
                self.refresh_prompt();
                format!("\nClosed room {}\n", view.room_id)
            }
            UserCommand::Leave => self.leave().await?,
            UserCommand::Logout => {
                if let Some(view) = self.open.take() {
                    view.subscription.unsubscribe();
                }
                self.logout.execute().await?;
                self.set_user(None);
                "\nLogged out. Enter a username to log in.\n".to_string()
            }
            UserCommand::Quit => return Ok(None),
            UserCommand::Help => MessageFormatter::format_help(),
            UserCommand::Chat(text) => {
                if !self.session.is_connected() {
                    return Err(ClientError::NotConnected);
                }
                let current = self.session.current_room_id();
                let view = self.open.as_mut().ok_or(ClientError::NoOpenRoom)?;
                if current == Some(view.room_id) {
                    view.confirmed = true;
                } else if view.confirmed {
                    // a reconnect left the room behind while the view stayed open
                    return Err(ClientError::NoOpenRoom);
                }
                // an unconfirmed join is still queued ahead of this message
                self.session.send_message(text);
                MessageFormatter::format_sent_confirmation(&self.clock.now_rfc3339())
            }
        };
        Ok(Some(output))
    }

    /// Open `room_id`, replacing the room currently shown
    async fn open(&mut self, room_id: RoomId) -> String {
        // the session switches rooms itself; only the old handler goes
        if let Some(view) = self.open.take() {
            view.subscription.unsubscribe();
        }

        let prompt = self.prompt.clone();
        let opened = self
            .open_room
            .execute(room_id, move |message| {
                print!("{}", MessageFormatter::format_message(message));
                prompt.redisplay();
            })
            .await;

        let mut output = MessageFormatter::format_room_opened(room_id, &opened.history);
        if let Some(e) = &opened.history_error {
            output.push_str(&MessageFormatter::format_error(&format!(
                "Could not load history: {}",
                e
            )));
        }
        self.open = Some(OpenView {
            room_id,
            subscription: opened.subscription,
            confirmed: false,
        });
        self.refresh_prompt();
        output
    }

    async fn leave(&mut self) -> Result<String, ClientError> {
        let username = self.require_user()?;
        let view = self.open.take().ok_or(ClientError::NoOpenRoom)?;

        if let Err(e) = self.leave_room.execute(view.room_id, &username).await {
            // still a member: keep showing the room
            self.open = Some(view);
            return Err(e.into());
        }
        view.subscription.unsubscribe();
        self.refresh_prompt();
        Ok(format!("\nLeft room {}\n", view.room_id))
    }

    fn require_user(&self) -> Result<Username, ClientError> {
        self.username.clone().ok_or(ClientError::NotLoggedIn)
    }

    fn set_user(&mut self, username: Option<Username>) {
        self.username = username;
        self.refresh_prompt();
    }

    fn refresh_prompt(&self) {
        let room_id = self.open.as_ref().map(|view| view.room_id);
        self.prompt.update(self.username.as_ref(), room_id);
    }
}
