//! Floor plans dropped onto the window
//!
//! Every file dropped in one frame forms one list. Accepted files replace the
//! current selection and the first one is submitted right away.

use bevy::prelude::*;
use bevy::window::FileDragAndDrop;
use planform_core::{UploadFile, UploadFilter, UploadSelection};
use planform_scene::{ConversionRequest, ConversionState};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

pub struct UploadPlugin;

impl Plugin for UploadPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<UploadQueue>()
            .init_resource::<DropHover>()
            .insert_resource(Uploader {
                filter: UploadFilter::floor_plans(),
            })
            .add_systems(Update, (collect_dropped_files, process_uploads).chain());
    }
}

/// Dropped path lists waiting to be read, in arrival order
#[derive(Resource, Debug, Default)]
pub struct UploadQueue(VecDeque<Vec<PathBuf>>);

impl UploadQueue {
    pub fn push(&mut self, paths: Vec<PathBuf>) {
        if !paths.is_empty() {
            self.0.push_back(paths);
        }
    }
}

/// Set while files are dragged over the window
#[derive(Resource, Debug, Default)]
pub struct DropHover(pub bool);

#[derive(Resource, Debug, Clone)]
pub struct Uploader {
    pub filter: UploadFilter,
}

/// MIME type for a plan, guessed from its extension
fn mime_for(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    let mime = match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        _ => return None,
    };
    Some(mime.to_string())
}

fn read_upload(path: &Path) -> std::io::Result<UploadFile> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime = mime_for(&name);
    Ok(UploadFile::new(name, mime, bytes))
}

fn collect_dropped_files(
    mut drops: MessageReader<FileDragAndDrop>,
    mut queue: ResMut<UploadQueue>,
    mut hover: ResMut<DropHover>,
) {
    let mut dropped = Vec::new();
    for drop in drops.read() {
        match drop {
            FileDragAndDrop::HoveredFile { .. } => hover.0 = true,
            FileDragAndDrop::HoveredFileCanceled { .. } => hover.0 = false,
            FileDragAndDrop::DroppedFile { path_buf, .. } => {
                hover.0 = false;
                dropped.push(path_buf.clone());
            }
        }
    }
    queue.push(dropped);
}

fn process_uploads(
    mut queue: ResMut<UploadQueue>,
    uploader: Res<Uploader>,
    mut state: ResMut<ConversionState>,
    mut conversions: MessageWriter<ConversionRequest>,
) {
    while let Some(paths) = queue.0.pop_front() {
        let files: Vec<UploadFile> = paths
            .iter()
            .filter_map(|path| match read_upload(path) {
                Ok(file) => Some(file),
                Err(e) => {
                    tracing::error!("Failed to read {}: {}", path.display(), e);
                    None
                }
            })
            .collect();

        let selection = UploadSelection::from_files(files, &uploader.filter);
        if selection.is_empty() {
            tracing::warn!(dropped = paths.len(), "No floor plan among the dropped files");
            continue;
        }
        tracing::info!(files = selection.len(), "Selected floor plan files");
        state.selection.replace(selection);
        conversions.write(ConversionRequest);
    }
}
