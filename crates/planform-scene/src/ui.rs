//! Viewer overlay - advisory banner and presentation controls

use bevy::camera::visibility::RenderLayers;
use bevy::prelude::*;
use bevy_egui::{
    egui, EguiContexts, EguiGlobalSettings, EguiPrimaryContextPass, PrimaryEguiContext,
};
use planform_core::{advisory_for, Advisory};

use crate::host::{FloorPlanData, PresentationRequest, ViewerHost};
use crate::lifecycle::{hex_color, BACKGROUND};
use crate::resize::HostViewport;

/// Amber used for advisories
const ADVISORY_FILL: egui::Color32 = egui::Color32::from_rgb(255, 193, 7);
const ADVISORY_TEXT: egui::Color32 = egui::Color32::from_rgb(33, 25, 0);
const OVERLAY_INSET: f32 = 12.0;

/// Overlay systems run in this set; front-ends lay out their panels before it
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewerOverlaySet;

/// Clears the window outside the scene surface
#[derive(Component)]
pub struct BackdropCamera;

/// Carries the egui context, drawn after the scene
#[derive(Component)]
pub struct OverlayCamera;

pub struct OverlayPlugin;

impl Plugin for OverlayPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_overlay_cameras)
            .add_systems(EguiPrimaryContextPass, viewer_overlay.in_set(ViewerOverlaySet));
    }
}

/// Scene surfaces come and go with every rebuild, so egui gets its own camera
fn setup_overlay_cameras(
    mut commands: Commands,
    mut egui_global_settings: ResMut<EguiGlobalSettings>,
) {
    egui_global_settings.auto_create_primary_context = false;

    commands.spawn((
        BackdropCamera,
        Camera2d,
        Camera {
            order: -1,
            clear_color: ClearColorConfig::Custom(hex_color(BACKGROUND)),
            ..default()
        },
        RenderLayers::none(),
    ));
    commands.spawn((
        OverlayCamera,
        PrimaryEguiContext,
        Camera2d,
        Camera {
            order: 1,
            clear_color: ClearColorConfig::None,
            ..default()
        },
        RenderLayers::none(),
    ));
}

/// What the overlay draws over a mounted viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OverlayContent {
    advisory: Option<Advisory>,
    fullscreen_control: bool,
}

/// Nothing is drawn while the viewer is unmounted
fn overlay_content(host: &ViewerHost, data: &FloorPlanData) -> Option<OverlayContent> {
    let options = host.options()?;
    Some(OverlayContent {
        advisory: advisory_for(data.get()),
        fullscreen_control: options.show_fullscreen_control,
    })
}

fn viewer_overlay(
    mut contexts: EguiContexts,
    host: Res<ViewerHost>,
    data: Res<FloorPlanData>,
    viewport: Res<HostViewport>,
    mut presentation: MessageWriter<PresentationRequest>,
) {
    let Some(content) = overlay_content(&host, &data) else {
        return;
    };
    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };

    let region = match viewport.region {
        Some(region) => egui::Rect::from_min_max(
            egui::pos2(region.min.x, region.min.y),
            egui::pos2(region.max.x, region.max.y),
        ),
        None => ctx.available_rect(),
    };

    if let Some(advisory) = content.advisory {
        egui::Area::new(egui::Id::new("planform_advisory"))
            .order(egui::Order::Foreground)
            .fixed_pos(region.left_top() + egui::vec2(OVERLAY_INSET, OVERLAY_INSET))
            .interactable(false)
            .show(ctx, |ui| {
                egui::Frame::new()
                    .fill(ADVISORY_FILL)
                    .corner_radius(6u8)
                    .inner_margin(egui::Margin::symmetric(10, 6))
                    .show(ui, |ui| {
                        ui.label(
                            egui::RichText::new(format!("⚠ {}", advisory.message()))
                                .color(ADVISORY_TEXT)
                                .strong(),
                        );
                    });
            });
    }

    if content.fullscreen_control {
        egui::Area::new(egui::Id::new("planform_fullscreen"))
            .order(egui::Order::Foreground)
            .pivot(egui::Align2::RIGHT_TOP)
            .fixed_pos(region.right_top() + egui::vec2(-OVERLAY_INSET, OVERLAY_INSET))
            .show(ctx, |ui| {
                if ui
                    .button(egui::RichText::new("⛶ Fullscreen").size(14.0))
                    .on_hover_text("Open the model in full-viewport view")
                    .clicked()
                {
                    presentation.write(PresentationRequest::Fullscreen);
                }
            });
    }
}

/// Top-right control leaving full-viewport presentation; true when clicked
pub fn exit_fullscreen_button(ctx: &egui::Context) -> bool {
    let mut clicked = false;
    egui::Area::new(egui::Id::new("planform_exit_fullscreen"))
        .order(egui::Order::Foreground)
        .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-OVERLAY_INSET, OVERLAY_INSET))
        .show(ctx, |ui| {
            clicked = ui
                .button(egui::RichText::new("✕ Exit Fullscreen").size(14.0))
                .clicked();
        });
    clicked
}
