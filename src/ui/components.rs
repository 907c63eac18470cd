// Reusable UI components
// Message bubbles, attachment chips and the send/stop buttons

use crate::client::PendingAttachment;
use crate::state::{AttachmentMeta, Sender};
use eframe::egui;

const USER_BUBBLE: egui::Color32 = egui::Color32::from_rgb(37, 99, 235);
const ERROR_TEXT: egui::Color32 = egui::Color32::from_rgb(220, 0, 0);

/// Render one chat message
/// User messages sit on the right, bot messages on the left
pub fn message_bubble(
    ui: &mut egui::Ui,
    sender: Sender,
    text: &str,
    attachments: &[AttachmentMeta],
) {
    let (align, fill, text_color) = match sender {
        Sender::User => (egui::Align::Max, USER_BUBBLE, egui::Color32::WHITE),
        Sender::Bot => (
            egui::Align::Min,
            ui.visuals().faint_bg_color,
            ui.visuals().text_color(),
        ),
    };

    ui.with_layout(egui::Layout::top_down(align), |ui| {
        let max_width = ui.available_width() * 0.8;
        egui::Frame::none()
            .fill(fill)
            .rounding(8.0)
            .inner_margin(egui::Margin::symmetric(12.0, 8.0))
            .show(ui, |ui| {
                ui.set_max_width(max_width);
                for attachment in attachments {
                    ui.label(
                        egui::RichText::new(format!("📎 {}", attachment.name))
                            .color(text_color)
                            .small(),
                    );
                }
                if !text.is_empty() {
                    ui.label(egui::RichText::new(text).color(text_color));
                }
            });
    });
    ui.add_space(6.0);
}

/// Bot bubble for a reply that is still arriving
pub fn pending_bubble(ui: &mut egui::Ui, partial: &str) {
    if partial.is_empty() {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label(egui::RichText::new("Thinking...").weak().italics());
        });
        ui.add_space(6.0);
    } else {
        message_bubble(ui, Sender::Bot, partial, &[]);
    }
}

/// Error text shown in the chat view
pub fn notice(ui: &mut egui::Ui, text: &str) {
    ui.colored_label(ERROR_TEXT, format!("⚠ {}", text));
}

/// Render a removable chip for an attachment waiting to be sent
/// Returns true when the remove button was clicked
pub fn attachment_chip(ui: &mut egui::Ui, attachment: &PendingAttachment) -> bool {
    let mut removed = false;
    egui::Frame::none()
        .fill(ui.visuals().faint_bg_color)
        .rounding(4.0)
        .inner_margin(egui::Margin::symmetric(6.0, 2.0))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(&attachment.name).small());
                ui.label(
                    egui::RichText::new(format_size(attachment.data.len() as u64))
                        .small()
                        .weak(),
                );
                removed = ui.small_button("✕").on_hover_text("Remove").clicked();
            });
        });
    removed
}

/// Render a send button
pub fn send_button(ui: &mut egui::Ui, enabled: bool) -> egui::Response {
    ui.add_enabled(enabled, egui::Button::new(egui::RichText::new("Send ➤").strong()))
}

/// Render a stop button (red)
pub fn stop_button(ui: &mut egui::Ui) -> egui::Response {
    ui.button(egui::RichText::new("⏹ Stop").color(ERROR_TEXT))
}

/// Human-readable file size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
