//! Control panel and presentation UI using bevy_egui

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};
use planform_scene::{
    exit_fullscreen_button, ConversionRequest, ConversionState, FloorPlanData, HostViewport,
    PresentationRequest, ViewerOverlaySet,
};

use crate::app::NativeSettings;
use crate::inference::InferenceClient;
use crate::presentation::Presentation;
use crate::upload::DropHover;

const ACCENT: egui::Color32 = egui::Color32::from_rgb(79, 195, 247);
const MUTED: egui::Color32 = egui::Color32::from_rgb(140, 160, 180);
const FAILURE: egui::Color32 = egui::Color32::from_rgb(229, 115, 115);
const PANEL_WIDTH: f32 = 320.0;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            EguiPrimaryContextPass,
            (control_panel, fullscreen_controls).before(ViewerOverlaySet),
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn control_panel(
    mut contexts: EguiContexts,
    presentation: Res<Presentation>,
    settings: Res<NativeSettings>,
    client: Res<InferenceClient>,
    data: Res<FloorPlanData>,
    drop_hover: Res<DropHover>,
    mut state: ResMut<ConversionState>,
    mut viewport: ResMut<HostViewport>,
    mut conversions: MessageWriter<ConversionRequest>,
) {
    if *presentation != Presentation::Embedded {
        return;
    }
    let Ok(ctx) = contexts.ctx_mut() else { return };

    egui::SidePanel::left("controls")
        .exact_width(PANEL_WIDTH)
        .resizable(false)
        .show(ctx, |ui| {
            ui.add_space(8.0);
            ui.label(egui::RichText::new("FloorPlan → 3D").color(ACCENT).strong());
            ui.heading("Planform");
            ui.label(egui::RichText::new(format!("Service: {}", client.endpoint.url)).color(MUTED).small());
            ui.separator();

            let stroke = if drop_hover.0 {
                egui::Stroke::new(2.0, ACCENT)
            } else {
                egui::Stroke::new(1.0, MUTED)
            };
            egui::Frame::new()
                .stroke(stroke)
                .corner_radius(8u8)
                .inner_margin(egui::Margin::same(16))
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.vertical_centered(|ui| {
                        ui.label(egui::RichText::new("⬆").size(28.0).color(ACCENT));
                        ui.label(egui::RichText::new("Drop a floor plan on this window").strong());
                        ui.label(egui::RichText::new(".png .jpg .svg .pdf").color(MUTED).small());
                    });
                });
            ui.add_space(8.0);

            ui.label(egui::RichText::new("Selected files").strong());
            if state.selection.is_empty() {
                ui.label(egui::RichText::new("No files yet").color(MUTED));
            } else {
                for file in state.selection.files() {
                    ui.horizontal(|ui| {
                        ui.label(&file.name);
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.label(egui::RichText::new(format!("{} KB", file.size_kb())).color(MUTED));
                        });
                    });
                }
            }
            ui.add_space(8.0);

            let label = if state.in_flight {
                "Converting..."
            } else {
                "Convert again"
            };
            let enabled = !state.selection.is_empty() && !state.in_flight;
            if ui.add_enabled(enabled, egui::Button::new(label)).clicked() {
                conversions.write(ConversionRequest);
            }

            if let Some(failure) = state.failure.clone() {
                ui.horizontal(|ui| {
                    ui.colored_label(FAILURE, failure);
                    if ui.small_button("✕").clicked() {
                        state.failure = None;
                    }
                });
            }

            if let Some(result) = data.get() {
                let summary = result.summary();
                ui.separator();
                ui.label(egui::RichText::new("Current model").strong());
                ui.label(format!(
                    "{} walls, {} doors, {} windows",
                    summary.walls, summary.doors, summary.windows
                ));
                if summary.skipped > 0 {
                    ui.label(
                        egui::RichText::new(format!("{} unlabelled detections skipped", summary.skipped))
                            .color(MUTED),
                    );
                }
            }

            ui.with_layout(egui::Layout::bottom_up(egui::Align::Min), |ui| {
                ui.label(
                    egui::RichText::new("Left drag to rotate, right drag to pan, scroll to zoom.")
                        .color(MUTED)
                        .small(),
                );
            });
        });

    // The preview region stays transparent so the scene shows through
    egui::CentralPanel::default()
        .frame(egui::Frame::NONE.inner_margin(egui::Margin::same(16)))
        .show(ctx, |ui| {
            ui.heading("3D Preview");
            ui.add_space(8.0);

            let available = ui.available_size();
            let size = egui::vec2(available.x, available.y.min(settings.embedded_height));
            let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
            ui.painter()
                .rect_stroke(rect, 8.0, egui::Stroke::new(1.0, MUTED), egui::StrokeKind::Outside);

            let region = Rect::new(rect.min.x, rect.min.y, rect.max.x, rect.max.y);
            if viewport.region != Some(region) {
                viewport.region = Some(region);
            }
        });
}

fn fullscreen_controls(
    mut contexts: EguiContexts,
    presentation: Res<Presentation>,
    mut requests: MessageWriter<PresentationRequest>,
) {
    if *presentation != Presentation::Fullscreen {
        return;
    }
    let Ok(ctx) = contexts.ctx_mut() else { return };
    if exit_fullscreen_button(ctx) {
        requests.write(PresentationRequest::Embedded);
    }
}
