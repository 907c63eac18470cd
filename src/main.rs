// Gemini Chat GUI - Main Entry Point
// Native desktop chat client for the Gemini chat proxy

mod client;
mod config;
mod state;
mod ui;

use client::session::{apply_title, begin_send, dispatch, finish_send};
use client::{attachments, ClientError, ProxyClient, SendOutcome, SendTicket};
use config::ClientConfig;
use eframe::egui;
use futures_util::future::AbortHandle;
use state::{
    AppState, ConversationId, ConversationStore, InFlight, JsonFilePersistence, MemoryPersistence,
};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use tracing::{error, info, warn};
use ui::{render_app_layout, UiAction};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ClientConfig::from_env();
    info!("Configuration loaded: {:?}", config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let persistence = JsonFilePersistence::new(&config.data_file);
    let (store, startup_notice) = match ConversationStore::load(Box::new(persistence)) {
        Ok(store) => (store, None),
        Err(e) => {
            // Leave the unreadable file alone; this session is not saved
            error!("Failed to load {}: {}", config.data_file.display(), e);
            let store = ConversationStore::load(Box::new(MemoryPersistence::default()))?;
            (
                store,
                Some(format!(
                    "Could not load saved chats ({}). Changes in this session will not be saved.",
                    e
                )),
            )
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Gemini Chat")
            .with_inner_size([1000.0, 700.0])
            .with_min_inner_size([640.0, 480.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Gemini Chat",
        options,
        Box::new(move |cc| {
            if let Some(dark_mode) = store.dark_mode() {
                cc.egui_ctx.set_visuals(visuals_for(dark_mode));
            }
            let mut app = ChatApp::new(config, runtime, store);
            app.state.notice = startup_notice;
            Box::new(app)
        }),
    )
    .map_err(|e| anyhow::anyhow!("GUI error: {}", e))
}

fn visuals_for(dark_mode: bool) -> egui::Visuals {
    if dark_mode {
        egui::Visuals::dark()
    } else {
        egui::Visuals::light()
    }
}

/// Results coming back from background tasks
#[derive(Debug)]
enum AppEvent {
    Chunk {
        request_id: u64,
        text: String,
    },
    Finished {
        request_id: u64,
        conversation_id: ConversationId,
        outcome: SendOutcome,
    },
    Title {
        conversation_id: ConversationId,
        result: Result<Option<String>, ClientError>,
    },
}

/// Main application struct
/// Owns the conversation store, UI state and the runtime network work runs on
struct ChatApp {
    store: ConversationStore,
    state: AppState,
    client: Arc<ProxyClient>,
    runtime: tokio::runtime::Runtime,
    events_tx: Sender<AppEvent>,
    events_rx: Receiver<AppEvent>,
    stream: bool,
}

impl ChatApp {
    fn new(config: ClientConfig, runtime: tokio::runtime::Runtime, store: ConversationStore) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            store,
            state: AppState::new(),
            client: Arc::new(ProxyClient::new(&config.server_url)),
            runtime,
            events_tx,
            events_rx,
            stream: config.stream,
        }
    }

    fn handle_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                AppEvent::Chunk { request_id, text } => {
                    self.state.push_chunk(request_id, &text);
                }
                AppEvent::Finished {
                    request_id,
                    conversation_id,
                    outcome,
                } => {
                    // A cancelled request was already cleared; nothing is stored for it
                    if self.state.finish_request(request_id).is_none() {
                        continue;
                    }
                    if let Err(e) = finish_send(&mut self.store, &conversation_id, &outcome) {
                        self.report(format!("Could not save the reply: {}", e));
                    }
                    if let SendOutcome::Failed(e) = outcome {
                        self.state.notice = Some(e.to_string());
                    }
                }
                AppEvent::Title {
                    conversation_id,
                    result,
                } => {
                    if let Err(e) = apply_title(&mut self.store, &conversation_id, result) {
                        self.report(format!("Could not save the title: {}", e));
                    }
                }
            }
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if dropped.is_empty() {
            return;
        }
        self.attach_files(dropped);
    }

    /// Attach dropped files to the draft; refused files are listed in the notice
    fn attach_files(&mut self, dropped: Vec<egui::DroppedFile>) {
        if self.state.is_busy() {
            self.state.notice = Some("Wait for the current reply before attaching files".to_string());
            return;
        }

        let mut refused = Vec::new();
        for file in dropped {
            let already = self.state.attachments.len();
            let result = match (&file.path, &file.bytes) {
                (Some(path), _) => attachments::read_file(path, already),
                (None, Some(bytes)) => attachments::prepare(&file.name, bytes.to_vec(), already),
                (None, None) => continue,
            };
            match result {
                Ok(attachment) => {
                    info!(name = %attachment.name, size = attachment.data.len(), "Attached file");
                    self.state.attachments.push(attachment);
                }
                Err(e) => {
                    warn!("Refused attachment: {}", e);
                    refused.push(e.to_string());
                }
            }
        }
        if !refused.is_empty() {
            self.state.notice = Some(refused.join("\n"));
        }
    }

    fn apply(&mut self, action: UiAction, ctx: &egui::Context) {
        match action {
            UiAction::NewChat => {
                self.store.clear_selection();
                self.state.notice = None;
            }
            UiAction::Select(id) => {
                self.store.select(&id);
                self.state.notice = None;
            }
            UiAction::Rename {
                conversation_id,
                title,
            } => {
                if let Err(e) = self.store.rename(&conversation_id, &title) {
                    self.report(format!("Could not rename the chat: {}", e));
                }
            }
            UiAction::Delete(id) => {
                let in_flight_here = self
                    .state
                    .in_flight
                    .as_ref()
                    .map(|f| f.conversation_id == id)
                    .unwrap_or(false);
                if in_flight_here {
                    self.state.cancel_request();
                }
                if let Err(e) = self.store.delete(&id) {
                    self.report(format!("Could not delete the chat: {}", e));
                }
            }
            UiAction::Send => self.send(ctx),
            UiAction::Stop => {
                self.state.cancel_request();
            }
            UiAction::SetDarkMode(dark_mode) => {
                ctx.set_visuals(visuals_for(dark_mode));
                if let Err(e) = self.store.set_dark_mode(dark_mode) {
                    self.report(format!("Could not save the theme: {}", e));
                }
            }
        }
    }

    fn send(&mut self, ctx: &egui::Context) {
        if self.state.is_busy() {
            return;
        }

        let (text, pending) = self.state.take_draft();
        self.state.notice = None;
        let ticket = match begin_send(&mut self.store, &text, pending, self.stream) {
            Ok(Some(ticket)) => ticket,
            Ok(None) => return,
            Err(failed) => {
                self.state.input = text;
                self.state.attachments = failed.attachments;
                self.report(failed.error.to_string());
                return;
            }
        };
        let SendTicket {
            conversation_id,
            request,
            title_source,
        } = ticket;

        if let Some(source) = title_source {
            let client = self.client.clone();
            let tx = self.events_tx.clone();
            let repaint = ctx.clone();
            let conversation_id = conversation_id.clone();
            self.runtime.spawn(async move {
                let result = client.generate_title(&source).await;
                let _ = tx.send(AppEvent::Title {
                    conversation_id,
                    result,
                });
                repaint.request_repaint();
            });
        }

        let request_id = self.state.next_request_id();
        let (abort, registration) = AbortHandle::new_pair();
        self.state.in_flight = Some(InFlight {
            request_id,
            conversation_id: conversation_id.clone(),
            abort,
            partial: String::new(),
        });

        let client = self.client.clone();
        let tx = self.events_tx.clone();
        let repaint = ctx.clone();
        self.runtime.spawn(async move {
            let chunk_tx = tx.clone();
            let chunk_repaint = repaint.clone();
            let outcome = dispatch(&client, &request, registration, move |text| {
                let _ = chunk_tx.send(AppEvent::Chunk {
                    request_id,
                    text: text.to_string(),
                });
                chunk_repaint.request_repaint();
            })
            .await;
            let _ = tx.send(AppEvent::Finished {
                request_id,
                conversation_id,
                outcome,
            });
            repaint.request_repaint();
        });
    }

    fn report(&mut self, message: String) {
        error!("{}", message);
        self.state.notice = Some(message);
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_events();
        self.handle_dropped_files(ctx);

        for action in render_app_layout(ctx, &self.store, &mut self.state) {
            self.apply(action, ctx);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if self.state.cancel_request() {
            info!("Cancelled the in-flight request on exit");
        }
        if let Err(e) = self.store.save() {
            error!("Failed to save chats on exit: {}", e);
        }
    }
}
