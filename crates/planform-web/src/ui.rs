//! Landing page and full-viewport route UI using bevy_egui

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};
use planform_scene::{
    exit_fullscreen_button, ConversionRequest, ConversionState, HostViewport, PresentationRequest,
    ViewerOverlaySet,
};

use crate::app::UiLayout;
use crate::routes::{CurrentRoute, Route};
use crate::uploader::{DropHover, PendingUploads, Uploader};

const ACCENT: egui::Color32 = egui::Color32::from_rgb(79, 195, 247);
const MUTED: egui::Color32 = egui::Color32::from_rgb(140, 160, 180);
const PANEL_FILL: egui::Color32 = egui::Color32::from_rgb(11, 30, 46);
const FAILURE: egui::Color32 = egui::Color32::from_rgb(229, 115, 115);

const STEPS: [&str; 3] = [
    "Upload your floor plan",
    "Analyse layout & walls",
    "Generate a 3D model",
];

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, update_ui_layout).add_systems(
            EguiPrimaryContextPass,
            (landing_page, fullscreen_page).before(ViewerOverlaySet),
        );
    }
}

/// Update UI layout based on window size
fn update_ui_layout(windows: Query<&Window>, mut ui_layout: ResMut<UiLayout>) {
    if let Ok(window) = windows.single() {
        let width = window.width();
        let height = window.height();

        // Only update if dimensions changed significantly
        if (ui_layout.screen_width - width).abs() > 1.0 || (ui_layout.screen_height - height).abs() > 1.0 {
            ui_layout.update_from_window(width, height);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn landing_page(
    mut contexts: EguiContexts,
    route: Res<CurrentRoute>,
    ui_layout: Res<UiLayout>,
    mut state: ResMut<ConversionState>,
    uploader: Res<Uploader>,
    pending_uploads: Res<PendingUploads>,
    drop_hover: Res<DropHover>,
    mut viewport: ResMut<HostViewport>,
    mut conversions: MessageWriter<ConversionRequest>,
) {
    if route.0 != Route::Home {
        return;
    }
    let Ok(ctx) = contexts.ctx_mut() else { return };
    let ui_scale = ui_layout.ui_scale();

    egui::TopBottomPanel::top("hero")
        .frame(egui::Frame::new().fill(PANEL_FILL).inner_margin(egui::Margin::symmetric(24, 16)))
        .show(ctx, |ui| {
            ui.label(egui::RichText::new("FloorPlan → 3D").color(ACCENT).strong());
            ui.heading(
                egui::RichText::new("Convert 2D floor plans into interactive 3D models").size(24.0 * ui_scale),
            );
            ui.label(egui::RichText::new("Upload a 2D floor plan and preview its 3D model.").color(MUTED));
        });

    egui::TopBottomPanel::bottom("tip_footer").show(ctx, |ui| {
        ui.label(
            egui::RichText::new("Tip: For best results use clean, top-down scans or exported CAD/SVG files.")
                .color(MUTED)
                .size(12.0 * ui_scale),
        );
    });

    let controls = |ui: &mut egui::Ui| {
        ui.heading(egui::RichText::new("How it works").size(18.0 * ui_scale));
        for (i, step) in STEPS.iter().enumerate() {
            ui.label(format!("{}. {}", i + 1, step));
        }
        ui.add_space(12.0);

        upload_zone(ui, &uploader, &pending_uploads, drop_hover.is_hovering(), ui_scale);
        ui.add_space(8.0);

        ui.label(egui::RichText::new("Selected files").strong());
        if state.selection.is_empty() {
            ui.label(egui::RichText::new("No files yet - try dragging an image here.").color(MUTED));
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
            "Start Conversion"
        };
        let enabled = !state.selection.is_empty() && !state.in_flight;
        if ui
            .add_enabled(enabled, egui::Button::new(egui::RichText::new(label).size(16.0 * ui_scale)))
            .clicked()
        {
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
    };

    if ui_layout.is_narrow {
        egui::TopBottomPanel::top("controls")
            .resizable(false)
            .show(ctx, controls);
    } else {
        egui::SidePanel::left("controls")
            .default_width(ui_layout.side_panel_width())
            .resizable(false)
            .show(ctx, controls);
    }

    // The preview region stays transparent so the scene shows through
    egui::CentralPanel::default()
        .frame(egui::Frame::NONE.inner_margin(egui::Margin::same(16)))
        .show(ctx, |ui| {
            ui.heading(egui::RichText::new("3D Preview").size(18.0 * ui_scale));
            ui.label(
                egui::RichText::new("Interact with the converted model: rotate, pan and zoom.").color(MUTED),
            );
            ui.add_space(8.0);

            let (rect, _) = ui.allocate_exact_size(ui.available_size(), egui::Sense::hover());
            ui.painter().rect_stroke(
                rect,
                8.0,
                egui::Stroke::new(1.0, PANEL_FILL),
                egui::StrokeKind::Outside,
            );
            let region = Rect::new(rect.min.x, rect.min.y, rect.max.x, rect.max.y);
            if viewport.region != Some(region) {
                viewport.region = Some(region);
            }
        });
}

fn upload_zone(
    ui: &mut egui::Ui,
    uploader: &Uploader,
    pending: &PendingUploads,
    drop_hover: bool,
    ui_scale: f32,
) {
    let stroke = if drop_hover {
        egui::Stroke::new(2.0, ACCENT)
    } else {
        egui::Stroke::new(1.0, MUTED)
    };

    let response = egui::Frame::new()
        .stroke(stroke)
        .corner_radius(8u8)
        .inner_margin(egui::Margin::same(16))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.vertical_centered(|ui| {
                ui.label(egui::RichText::new("⬆").size(32.0 * ui_scale).color(ACCENT));
                ui.label(egui::RichText::new("Upload your 2D floor plan").strong());
                ui.label(
                    egui::RichText::new("Click to browse or drag & drop files here (.png .jpg .svg .pdf)")
                        .color(MUTED)
                        .size(12.0 * ui_scale),
                );
            });
        })
        .response
        .interact(egui::Sense::click())
        .on_hover_cursor(egui::CursorIcon::PointingHand);

    if response.clicked() {
        uploader.browse(pending);
    }
}

fn fullscreen_page(
    mut contexts: EguiContexts,
    route: Res<CurrentRoute>,
    mut presentation: MessageWriter<PresentationRequest>,
) {
    if route.0 != Route::ModelFullscreen {
        return;
    }
    let Ok(ctx) = contexts.ctx_mut() else { return };
    if exit_fullscreen_button(ctx) {
        presentation.write(PresentationRequest::Embedded);
    }
}
