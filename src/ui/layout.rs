// Main application layout
// Menu bar, conversation sidebar, chat view, input bar and dialogs.
// Rendering never touches the store directly; changes come back as UiActions.

use super::UiAction;
use crate::client::attachments::MAX_FILES;
use crate::state::{AppState, Conversation, ConversationStore, RenameDialog};
use crate::ui::components::*;
use eframe::egui;

/// Render the main application layout
/// Returns what the user asked for this frame
pub fn render_app_layout(
    ctx: &egui::Context,
    store: &ConversationStore,
    state: &mut AppState,
) -> Vec<UiAction> {
    let mut actions = Vec::new();

    render_menu_bar(ctx, &mut actions);
    render_sidebar(ctx, store, state, &mut actions);
    render_input_bar(ctx, state, &mut actions);

    egui::CentralPanel::default().show(ctx, |ui| match store.active() {
        Some(conversation) => render_conversation(ui, conversation, state),
        None => render_welcome_view(ui, state),
    });

    render_rename_dialog(ctx, state, &mut actions);
    render_delete_dialog(ctx, store, state, &mut actions);

    actions
}

/// Render the top menu bar
fn render_menu_bar(ctx: &egui::Context, actions: &mut Vec<UiAction>) {
    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("New Chat").clicked() {
                    actions.push(UiAction::NewChat);
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Quit").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });

            ui.menu_button("View", |ui| {
                let mut dark_mode = ctx.style().visuals.dark_mode;
                if ui.checkbox(&mut dark_mode, "Dark Mode").changed() {
                    actions.push(UiAction::SetDarkMode(dark_mode));
                    ui.close_menu();
                }
            });
        });
    });
}

/// Render the left sidebar with the conversation list
fn render_sidebar(
    ctx: &egui::Context,
    store: &ConversationStore,
    state: &mut AppState,
    actions: &mut Vec<UiAction>,
) {
    egui::SidePanel::left("chat_sidebar")
        .resizable(true)
        .default_width(240.0)
        .min_width(160.0)
        .show(ctx, |ui| {
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.heading("Chats");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("＋ New").clicked() {
                        actions.push(UiAction::NewChat);
                    }
                });
            });
            ui.add_space(4.0);
            ui.separator();
            ui.add_space(4.0);

            egui::ScrollArea::vertical()
                .id_source("chat_list_scroll")
                .auto_shrink([false; 2])
                .show(ui, |ui| {
                    if store.is_empty() {
                        ui.vertical_centered(|ui| {
                            ui.add_space(40.0);
                            ui.label(egui::RichText::new("No chats yet").italics().weak());
                        });
                        return;
                    }

                    let active_id = store.active_id();
                    for conversation in store.list() {
                        let is_selected = active_id == Some(&conversation.id);
                        ui.horizontal(|ui| {
                            let label = ui
                                .selectable_label(is_selected, conversation.short_title())
                                .on_hover_text(conversation.title.as_str());
                            if label.clicked() && !is_selected {
                                actions.push(UiAction::Select(conversation.id.clone()));
                            }

                            ui.with_layout(
                                egui::Layout::right_to_left(egui::Align::Center),
                                |ui| {
                                    if ui.small_button("🗑").on_hover_text("Delete").clicked() {
                                        state.confirm_delete = Some(conversation.id.clone());
                                    }
                                    if ui.small_button("✏").on_hover_text("Rename").clicked() {
                                        state.rename = Some(RenameDialog {
                                            conversation_id: conversation.id.clone(),
                                            draft: conversation.title.clone(),
                                        });
                                    }
                                },
                            );
                        });
                        ui.add_space(2.0);
                    }
                });
        });
}

/// Render the message input, attachments and send/stop button
fn render_input_bar(ctx: &egui::Context, state: &mut AppState, actions: &mut Vec<UiAction>) {
    let files_hovering = ctx.input(|i| !i.raw.hovered_files.is_empty());

    egui::TopBottomPanel::bottom("input_bar").show(ctx, |ui| {
        ui.add_space(6.0);

        if !state.attachments.is_empty() {
            let mut remove = None;
            ui.horizontal_wrapped(|ui| {
                for (index, attachment) in state.attachments.iter().enumerate() {
                    if attachment_chip(ui, attachment) {
                        remove = Some(index);
                    }
                }
            });
            if let Some(index) = remove {
                state.remove_attachment(index);
            }
            ui.add_space(4.0);
        }

        let busy = state.is_busy();
        ui.horizontal(|ui| {
            let input_width = ui.available_width() - 80.0;
            let input = ui.add_enabled(
                !busy,
                egui::TextEdit::multiline(&mut state.input)
                    .desired_rows(2)
                    .desired_width(input_width)
                    .hint_text(if files_hovering {
                        "Drop files to attach them"
                    } else {
                        "Type a message (Shift+Enter for a new line)"
                    }),
            );

            let enter_pressed = input.has_focus()
                && ui.input(|i| i.key_pressed(egui::Key::Enter) && !i.modifiers.shift);

            if busy {
                if stop_button(ui).clicked() {
                    actions.push(UiAction::Stop);
                }
            } else {
                let can_send = !state.input.trim().is_empty() || !state.attachments.is_empty();
                if (send_button(ui, can_send).clicked() || enter_pressed) && can_send {
                    actions.push(UiAction::Send);
                }
            }
        });

        ui.label(
            egui::RichText::new(format!(
                "Drop images, audio, video, PDF or text files to attach (up to {})",
                MAX_FILES
            ))
            .small()
            .weak(),
        );
        ui.add_space(4.0);
    });
}

/// Render the messages of the active conversation
fn render_conversation(ui: &mut egui::Ui, conversation: &Conversation, state: &AppState) {
    ui.add_space(8.0);
    ui.heading(conversation.title.as_str());
    ui.separator();

    egui::ScrollArea::vertical()
        .id_source("message_scroll")
        .auto_shrink([false; 2])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            for message in &conversation.messages {
                message_bubble(ui, message.sender, &message.text, &message.attachments);
            }

            if let Some(in_flight) = state
                .in_flight
                .as_ref()
                .filter(|f| f.conversation_id == conversation.id)
            {
                pending_bubble(ui, &in_flight.partial);
            }

            if let Some(text) = &state.notice {
                notice(ui, text);
            }
        });
}

/// Render welcome view when no conversation is active
fn render_welcome_view(ui: &mut egui::Ui, state: &AppState) {
    ui.vertical_centered(|ui| {
        ui.add_space(80.0);
        ui.heading(egui::RichText::new("Gemini Chat").size(24.0));
        ui.add_space(24.0);
        ui.label(egui::RichText::new("Type a message below to start a new chat").size(14.0));
        ui.add_space(8.0);
        ui.label(egui::RichText::new("or pick a conversation from the sidebar").size(14.0));
        if let Some(text) = &state.notice {
            ui.add_space(24.0);
            notice(ui, text);
        }
    });
}

/// Render the rename dialog
fn render_rename_dialog(ctx: &egui::Context, state: &mut AppState, actions: &mut Vec<UiAction>) {
    let Some(dialog) = state.rename.as_mut() else {
        return;
    };

    let mut close = false;
    egui::Window::new("Rename chat")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .show(ctx, |ui| {
            let edit = ui.text_edit_singleline(&mut dialog.draft);
            if ui.memory(|m| m.focused().is_none()) {
                edit.request_focus();
            }
            let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                let can_save = !dialog.draft.trim().is_empty();
                if (ui.add_enabled(can_save, egui::Button::new("Save")).clicked() || submitted)
                    && can_save
                {
                    actions.push(UiAction::Rename {
                        conversation_id: dialog.conversation_id.clone(),
                        title: dialog.draft.clone(),
                    });
                    close = true;
                }
                if ui.button("Cancel").clicked() {
                    close = true;
                }
            });
        });

    if close {
        state.rename = None;
    }
}

/// Render the delete confirmation dialog
fn render_delete_dialog(
    ctx: &egui::Context,
    store: &ConversationStore,
    state: &mut AppState,
    actions: &mut Vec<UiAction>,
) {
    let Some(conversation_id) = state.confirm_delete.clone() else {
        return;
    };
    let Some(conversation) = store.get(&conversation_id) else {
        state.confirm_delete = None;
        return;
    };

    let mut close = false;
    egui::Window::new("Delete chat")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .show(ctx, |ui| {
            ui.label(format!(
                "Delete \"{}\"? This cannot be undone.",
                conversation.short_title()
            ));
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui
                    .button(egui::RichText::new("Delete").color(egui::Color32::from_rgb(220, 0, 0)))
                    .clicked()
                {
                    actions.push(UiAction::Delete(conversation_id.clone()));
                    close = true;
                }
                if ui.button("Cancel").clicked() {
                    close = true;
                }
            });
        });

    if close {
        state.confirm_delete = None;
    }
}
