//! Scene lifecycle manager
//!
//! Builds a complete scene for the current result and tears it down again.
//! At most one scene is live. Any change of result identity or mount
//! generation replaces the live scene: the old one is fully torn down before
//! the new one is built.
//!
//! Teardown runs in a fixed order:
//! 1. cancel the pending frame
//! 2. release the resize subscription
//! 3. dispose the orbit controller and its input binding
//! 4. release graphics resources created for the scene
//! 5. detach the render surface

use std::sync::Arc;

use bevy::camera::Viewport;
use bevy::color::Mix;
use bevy::light::{NotShadowCaster, NotShadowReceiver};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use planform_core::{build_solids, Appearance, FloorPlanResult, RegionClass, Solid};

use crate::camera::{
    OrbitController, OrbitInputBinding, FAR_PLANE, FOV_DEGREES, INITIAL_POSITION, INITIAL_TARGET,
    NEAR_PLANE,
};
use crate::frame_loop::FrameLoop;
use crate::host::{FloorPlanData, SceneSettings, ViewerHost};
use crate::resize::{surface_size, HostViewport, ResizeResponder, SurfaceSize};
use crate::ViewerSet;

/// Surface clear colour
pub const BACKGROUND: u32 = 0x061322;
pub const GROUND_COLOR: u32 = 0x071522;
pub const GROUND_SIZE: f32 = 500.0;
pub const GROUND_Y: f32 = -1.0;

const SKY_COLOR: u32 = 0xffffff;
const SKY_GROUND_COLOR: u32 = 0x444444;
const HEMISPHERE_INTENSITY: f32 = 0.6;
const SUN_INTENSITY: f32 = 0.8;
const SUN_POSITION: Vec3 = Vec3::new(100.0, 200.0, 100.0);

/// Ambient brightness for unit intensity
const AMBIENT_UNIT: f32 = 400.0;
/// Directional illuminance for unit intensity
const SUN_UNIT_LUX: f32 = 8_000.0;

/// Identifies one build of the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneId(pub u64);

/// The render surface (camera) of a scene
#[derive(Component, Debug, Clone, Copy)]
pub struct SceneSurface {
    pub scene: SceneId,
}

/// Any entity owned by a scene
#[derive(Component, Debug, Clone, Copy)]
pub struct SceneMember {
    pub scene: SceneId,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct SceneLight;

#[derive(Component, Debug, Clone, Copy)]
pub struct SceneGround;

/// Drawable built from one detection
#[derive(Component, Debug, Clone, Copy)]
pub struct SolidMesh {
    /// Index of the source detection
    pub index: usize,
    pub class: RegionClass,
}

/// Everything a live scene created
#[derive(Debug)]
pub struct ActiveScene {
    pub id: SceneId,
    pub source: Option<Arc<FloorPlanResult>>,
    pub mount_generation: u64,
    pub surface: Entity,
    pub lights: Vec<Entity>,
    pub ground: Entity,
    pub solids: Vec<Entity>,
    meshes: Vec<Handle<Mesh>>,
    materials: Vec<Handle<StandardMaterial>>,
}

impl ActiveScene {
    /// Number of graphics resources owned by the scene
    pub fn resource_count(&self) -> usize {
        self.meshes.len() + self.materials.len()
    }
}

#[derive(Resource, Debug, Default)]
pub struct SceneLifecycle {
    active: Option<ActiveScene>,
    next_id: u64,
    builds: u64,
    teardowns: u64,
}

impl SceneLifecycle {
    pub fn active(&self) -> Option<&ActiveScene> {
        self.active.as_ref()
    }

    pub fn builds(&self) -> u64 {
        self.builds
    }

    pub fn teardowns(&self) -> u64 {
        self.teardowns
    }

    fn allocate_id(&mut self) -> SceneId {
        self.next_id += 1;
        SceneId(self.next_id)
    }
}

pub struct LifecyclePlugin;

impl Plugin for LifecyclePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SceneLifecycle>()
            .add_systems(Update, sync_viewer_scene.in_set(ViewerSet::Lifecycle));
    }
}

/// Rebuild, tear down or keep the live scene to match host and data
pub fn sync_viewer_scene(world: &mut World) {
    let mount_generation = {
        let host = world.resource::<ViewerHost>();
        host.is_mounted().then(|| host.generation())
    };
    let data = world.resource::<FloorPlanData>().clone();

    let stale = {
        let lifecycle = world.resource::<SceneLifecycle>();
        match (lifecycle.active(), mount_generation) {
            (None, None) => false,
            (Some(_), None) | (None, Some(_)) => true,
            (Some(active), Some(generation)) => {
                active.mount_generation != generation || !data.is_same(&active.source)
            }
        }
    };
    if !stale {
        return;
    }

    let previous = world.resource_mut::<SceneLifecycle>().active.take();
    if let Some(previous) = previous {
        teardown_scene(world, previous);
    }

    if let Some(generation) = mount_generation {
        let scene = build_scene(world, data.0, generation);
        world.resource_mut::<SceneLifecycle>().active = Some(scene);
    }
}

/// Build a full scene and start its render loop
pub fn build_scene(
    world: &mut World,
    source: Option<Arc<FloorPlanResult>>,
    mount_generation: u64,
) -> ActiveScene {
    let id = {
        let mut lifecycle = world.resource_mut::<SceneLifecycle>();
        lifecycle.builds += 1;
        lifecycle.allocate_id()
    };
    let geometry = world
        .get_resource::<SceneSettings>()
        .map(|settings| settings.geometry.clone())
        .unwrap_or_default();
    let size = current_surface_size(world);

    let mut meshes = Vec::new();
    let mut materials = Vec::new();

    // Render surface, inactive until the first frame is served
    let surface = world
        .spawn((
            Camera3d::default(),
            Camera {
                is_active: false,
                clear_color: ClearColorConfig::Custom(hex_color(BACKGROUND)),
                viewport: size.viewport(),
                ..default()
            },
            Projection::Perspective(PerspectiveProjection {
                fov: FOV_DEGREES.to_radians(),
                near: NEAR_PLANE,
                far: FAR_PLANE,
                aspect_ratio: size.aspect_ratio(),
            }),
            Transform::from_translation(INITIAL_POSITION).looking_at(INITIAL_TARGET, Vec3::Y),
            // Sky/ground hemisphere approximated by their average as ambient
            AmbientLight {
                color: hex_color(SKY_COLOR).mix(&hex_color(SKY_GROUND_COLOR), 0.5),
                brightness: HEMISPHERE_INTENSITY * AMBIENT_UNIT,
                ..default()
            },
            SceneSurface { scene: id },
            SceneMember { scene: id },
        ))
        .id();

    let sun = world
        .spawn((
            DirectionalLight {
                color: Color::WHITE,
                illuminance: SUN_INTENSITY * SUN_UNIT_LUX,
                shadows_enabled: true,
                ..default()
            },
            Transform::from_translation(SUN_POSITION).looking_at(Vec3::ZERO, Vec3::Y),
            SceneLight,
            SceneMember { scene: id },
        ))
        .id();

    let ground_mesh = world
        .resource_mut::<Assets<Mesh>>()
        .add(Plane3d::default().mesh().size(GROUND_SIZE, GROUND_SIZE));
    let ground_material = world
        .resource_mut::<Assets<StandardMaterial>>()
        .add(StandardMaterial {
            base_color: hex_color(GROUND_COLOR),
            perceptual_roughness: 0.9,
            metallic: 0.0,
            ..default()
        });
    let ground = world
        .spawn((
            Mesh3d(ground_mesh.clone()),
            MeshMaterial3d(ground_material.clone()),
            Transform::from_xyz(0.0, GROUND_Y, 0.0),
            NotShadowCaster,
            SceneGround,
            SceneMember { scene: id },
        ))
        .id();
    meshes.push(ground_mesh);
    materials.push(ground_material);

    let mut solids = Vec::new();
    for solid in build_solids(source.as_deref(), &geometry) {
        let (entity, mesh, material) = spawn_solid(world, id, &solid);
        solids.push(entity);
        meshes.push(mesh);
        materials.push(material);
    }

    // Controller and its pointer binding live on the surface
    world.entity_mut(surface).insert((
        OrbitController::new(INITIAL_POSITION, INITIAL_TARGET),
        OrbitInputBinding,
    ));

    world.resource_mut::<FrameLoop>().start(id);
    world
        .resource_mut::<ResizeResponder>()
        .register(id, surface, size);

    tracing::info!(
        scene = id.0,
        solids = solids.len(),
        has_result = source.is_some(),
        "Scene built"
    );

    ActiveScene {
        id,
        source,
        mount_generation,
        surface,
        lights: vec![sun],
        ground,
        solids,
        meshes,
        materials,
    }
}

fn spawn_solid(
    world: &mut World,
    scene: SceneId,
    solid: &Solid,
) -> (Entity, Handle<Mesh>, Handle<StandardMaterial>) {
    let mesh = world
        .resource_mut::<Assets<Mesh>>()
        .add(Cuboid::new(solid.width(), solid.height(), solid.depth()));
    let material = world
        .resource_mut::<Assets<StandardMaterial>>()
        .add(solid_material(&solid.appearance));

    let mut entity = world.spawn((
        Mesh3d(mesh.clone()),
        MeshMaterial3d(material.clone()),
        Transform::from_translation(Vec3::from_array(solid.position)),
        SolidMesh {
            index: solid.index,
            class: solid.class,
        },
        SceneMember { scene },
    ));
    if !solid.casts_shadow {
        entity.insert(NotShadowCaster);
    }
    if !solid.receives_shadow {
        entity.insert(NotShadowReceiver);
    }

    (entity.id(), mesh, material)
}

fn solid_material(appearance: &Appearance) -> StandardMaterial {
    let planform_core::Rgb(r, g, b) = appearance.color;
    StandardMaterial {
        base_color: Color::srgba_u8(r, g, b, (appearance.opacity.clamp(0.0, 1.0) * 255.0).round() as u8),
        perceptual_roughness: appearance.roughness,
        metallic: appearance.metallic,
        alpha_mode: if appearance.is_translucent() {
            AlphaMode::Blend
        } else {
            AlphaMode::Opaque
        },
        ..default()
    }
}

/// Tear a scene down. Safe to call on a partially despawned scene.
pub fn teardown_scene(world: &mut World, scene: ActiveScene) {
    let cancelled = world.resource_mut::<FrameLoop>().cancel();
    if cancelled != Some(scene.id) {
        tracing::debug!(scene = scene.id.0, ?cancelled, "Render loop was not running for scene");
    }
    if let Ok(mut surface) = world.get_entity_mut(scene.surface) {
        if let Some(mut camera) = surface.get_mut::<Camera>() {
            camera.is_active = false;
        }
    }

    world.resource_mut::<ResizeResponder>().unregister();

    if let Ok(mut surface) = world.get_entity_mut(scene.surface) {
        surface.remove::<(OrbitInputBinding, OrbitController)>();
    }

    for entity in scene
        .solids
        .iter()
        .chain(scene.lights.iter())
        .chain(std::iter::once(&scene.ground))
    {
        if let Ok(entity) = world.get_entity_mut(*entity) {
            entity.despawn();
        }
    }
    {
        let mut meshes = world.resource_mut::<Assets<Mesh>>();
        for handle in &scene.meshes {
            meshes.remove(handle.id());
        }
    }
    {
        let mut materials = world.resource_mut::<Assets<StandardMaterial>>();
        for handle in &scene.materials {
            materials.remove(handle.id());
        }
    }

    if let Ok(surface) = world.get_entity_mut(scene.surface) {
        surface.despawn();
    }

    world.resource_mut::<SceneLifecycle>().teardowns += 1;
    tracing::info!(scene = scene.id.0, "Scene torn down");
}

fn current_surface_size(world: &mut World) -> SurfaceSize {
    let host = world.get_resource::<HostViewport>().copied().unwrap_or_default();
    let mut windows = world.query_filtered::<&Window, With<PrimaryWindow>>();
    match windows.single(world) {
        Ok(window) => surface_size(window, &host),
        Err(_) => SurfaceSize::FALLBACK,
    }
}

pub(crate) fn hex_color(hex: u32) -> Color {
    let planform_core::Rgb(r, g, b) = planform_core::Rgb::from_hex(hex);
    Color::srgb_u8(r, g, b)
}

/// Viewport of a surface, for front-ends that need to position overlays
pub fn surface_viewport(world: &World, scene: &ActiveScene) -> Option<Viewport> {
    world
        .get::<Camera>(scene.surface)
        .and_then(|camera| camera.viewport.clone())
}

#[cfg(test)]
mod tests {
    use bevy::ecs::system::RunSystemOnce;

    use super::*;
    use crate::frame_loop::run_frame_loop;
    use crate::host::HostOptions;
    use crate::resize::respond_to_resize;

    const SCENARIO_D: &str = r#"{
        "Width": 200, "Height": 100,
        "points": [
            {"x1": 0, "y1": 0, "x2": 100, "y2": 20},
            {"x1": 100, "y1": 0, "x2": 120, "y2": 60},
            {"x1": 20, "y1": 40, "x2": 40, "y2": 44},
            {"x1": 150, "y1": 80, "x2": 190, "y2": 84},
            {"x1": 0, "y1": 90, "x2": 200, "y2": 100}
        ],
        "classes": [{"name": "wall"}, {"name": "wall"}, {"name": "door"}, {"name": "window"}, {"name": "wall"}],
        "averageDoor": 1
    }"#;

    fn test_world() -> World {
        let mut world = World::new();
        world.init_resource::<Assets<Mesh>>();
        world.init_resource::<Assets<StandardMaterial>>();
        world.init_resource::<SceneLifecycle>();
        world.init_resource::<FrameLoop>();
        world.init_resource::<ResizeResponder>();
        world.init_resource::<HostViewport>();
        world.init_resource::<ViewerHost>();
        world.init_resource::<FloorPlanData>();
        world.init_resource::<SceneSettings>();
        world
    }

    fn publish(world: &mut World, json: &str) {
        let result = FloorPlanResult::from_json(json).unwrap();
        world.resource_mut::<FloorPlanData>().set(result);
    }

    fn mount(world: &mut World) {
        world
            .resource_mut::<ViewerHost>()
            .mount(HostOptions::default());
    }

    fn count<C: Component>(world: &mut World) -> usize {
        world.query::<&C>().iter(world).count()
    }

    fn mesh_count(world: &World) -> usize {
        world.resource::<Assets<Mesh>>().len()
    }

    #[test]
    fn test_nothing_built_until_mounted() {
        let mut world = test_world();
        publish(&mut world, SCENARIO_D);
        sync_viewer_scene(&mut world);

        assert!(world.resource::<SceneLifecycle>().active().is_none());
        assert_eq!(count::<SceneSurface>(&mut world), 0);
        assert!(!world.resource::<FrameLoop>().is_running());
    }

    #[test]
    fn test_mount_without_result_builds_empty_scene() {
        let mut world = test_world();
        mount(&mut world);
        sync_viewer_scene(&mut world);

        assert_eq!(count::<SceneSurface>(&mut world), 1);
        assert_eq!(count::<SceneGround>(&mut world), 1);
        assert_eq!(count::<SceneLight>(&mut world), 1);
        assert_eq!(count::<SolidMesh>(&mut world), 0);
        assert!(world.resource::<FrameLoop>().is_running());
        assert!(world.resource::<ResizeResponder>().is_registered());
    }

    #[test]
    fn test_scene_per_detection() {
        let mut world = test_world();
        mount(&mut world);
        publish(&mut world, SCENARIO_D);
        sync_viewer_scene(&mut world);

        let classes: Vec<RegionClass> = world
            .query::<&SolidMesh>()
            .iter(&world)
            .map(|solid| solid.class)
            .collect();
        assert_eq!(classes.len(), 5);
        assert_eq!(classes.iter().filter(|c| **c == RegionClass::Wall).count(), 3);
        assert_eq!(classes.iter().filter(|c| **c == RegionClass::Door).count(), 1);
        assert_eq!(classes.iter().filter(|c| **c == RegionClass::Window).count(), 1);

        // Ground plus one mesh per solid
        assert_eq!(mesh_count(&world), 6);
        let active = world.resource::<SceneLifecycle>().active().unwrap();
        assert_eq!(active.resource_count(), 12);
    }

    #[test]
    fn test_window_material_is_translucent() {
        let mut world = test_world();
        mount(&mut world);
        publish(&mut world, SCENARIO_D);
        sync_viewer_scene(&mut world);

        let handles: Vec<(RegionClass, Handle<StandardMaterial>)> = world
            .query::<(&SolidMesh, &MeshMaterial3d<StandardMaterial>)>()
            .iter(&world)
            .map(|(solid, material)| (solid.class, material.0.clone()))
            .collect();
        let materials = world.resource::<Assets<StandardMaterial>>();
        for (class, handle) in handles {
            let material = materials.get(&handle).unwrap();
            match class {
                RegionClass::Window => assert!(matches!(material.alpha_mode, AlphaMode::Blend)),
                _ => assert!(matches!(material.alpha_mode, AlphaMode::Opaque)),
            }
        }
    }

    #[test]
    fn test_rebuild_replaces_scene() {
        let mut world = test_world();
        mount(&mut world);
        publish(&mut world, SCENARIO_D);
        sync_viewer_scene(&mut world);
        let first = world.resource::<SceneLifecycle>().active().unwrap().id;

        // Same data again: nothing happens
        sync_viewer_scene(&mut world);
        assert_eq!(world.resource::<SceneLifecycle>().builds(), 1);

        // New result value with identical content still rebuilds
        publish(&mut world, SCENARIO_D);
        sync_viewer_scene(&mut world);

        let lifecycle = world.resource::<SceneLifecycle>();
        assert_eq!(lifecycle.builds(), 2);
        assert_eq!(lifecycle.teardowns(), 1);
        let second = lifecycle.active().unwrap().id;
        assert_ne!(first, second);

        // Exactly one surface, one loop and the old scene's resources are gone
        assert_eq!(count::<SceneSurface>(&mut world), 1);
        assert_eq!(count::<SolidMesh>(&mut world), 5);
        assert_eq!(count::<SceneLight>(&mut world), 1);
        assert_eq!(mesh_count(&world), 6);
        assert_eq!(world.resource::<FrameLoop>().running_scene(), Some(second));
        assert_eq!(world.resource::<ResizeResponder>().subscribed_scene(), Some(second));
        assert!(world
            .query::<&SceneMember>()
            .iter(&world)
            .all(|member| member.scene == second));
    }

    #[test]
    fn test_rebuild_with_fewer_then_more_detections() {
        let mut world = test_world();
        mount(&mut world);
        publish(
            &mut world,
            r#"{"Width": 200, "Height": 100, "points": [{"x1": 0, "y1": 0, "x2": 100, "y2": 20}],
                "classes": [{"name": "wall"}], "averageDoor": 1}"#,
        );
        sync_viewer_scene(&mut world);
        assert_eq!(count::<SolidMesh>(&mut world), 1);
        let first = world.resource::<SceneLifecycle>().active().unwrap().id;

        publish(&mut world, SCENARIO_D);
        sync_viewer_scene(&mut world);

        assert_eq!(count::<SolidMesh>(&mut world), 5);
        assert!(world
            .query::<&SceneMember>()
            .iter(&world)
            .all(|member| member.scene != first));
    }

    #[test]
    fn test_remount_rebuilds() {
        let mut world = test_world();
        mount(&mut world);
        sync_viewer_scene(&mut world);
        world.resource_mut::<ViewerHost>().unmount();
        mount(&mut world);
        sync_viewer_scene(&mut world);

        assert_eq!(world.resource::<SceneLifecycle>().builds(), 2);
        assert_eq!(count::<SceneSurface>(&mut world), 1);
    }

    #[test]
    fn test_frames_are_served_while_running() {
        let mut world = test_world();
        mount(&mut world);
        sync_viewer_scene(&mut world);

        for _ in 0..3 {
            world.run_system_once(run_frame_loop).unwrap();
        }
        let frame_loop = world.resource::<FrameLoop>();
        assert_eq!(frame_loop.frames_rendered(), 3);
        assert!(frame_loop.pending().is_some());

        let surface = world.resource::<SceneLifecycle>().active().unwrap().surface;
        assert!(world.get::<Camera>(surface).unwrap().is_active);
    }

    #[test]
    fn test_unmount_tears_everything_down() {
        let mut world = test_world();
        mount(&mut world);
        publish(&mut world, SCENARIO_D);
        sync_viewer_scene(&mut world);
        world.run_system_once(run_frame_loop).unwrap();

        world.resource_mut::<ViewerHost>().unmount();
        sync_viewer_scene(&mut world);

        assert!(world.resource::<SceneLifecycle>().active().is_none());
        assert_eq!(count::<SceneMember>(&mut world), 0);
        assert_eq!(count::<OrbitController>(&mut world), 0);
        assert_eq!(mesh_count(&world), 0);
        assert_eq!(world.resource::<Assets<StandardMaterial>>().len(), 0);

        let frame_loop = world.resource::<FrameLoop>();
        assert!(!frame_loop.is_running());
        assert!(frame_loop.pending().is_none());
        assert!(!world.resource::<ResizeResponder>().is_registered());

        // No further frames after teardown
        world.run_system_once(run_frame_loop).unwrap();
        assert!(world.resource::<FrameLoop>().pending().is_none());
    }

    #[test]
    fn test_resize_follows_host_until_teardown() {
        let mut world = test_world();
        world.spawn((Window::default(), PrimaryWindow));
        mount(&mut world);
        sync_viewer_scene(&mut world);

        world.resource_mut::<HostViewport>().region = Some(Rect::new(0.0, 0.0, 400.0, 300.0));
        world.run_system_once(respond_to_resize).unwrap();
        assert_eq!(world.resource::<ResizeResponder>().resizes(), 1);

        let active = world.resource::<SceneLifecycle>().active().unwrap();
        let viewport = surface_viewport(&world, active).unwrap();
        assert_eq!(viewport.physical_size, UVec2::new(400, 300));
        let surface = active.surface;
        match world.get::<Projection>(surface).unwrap() {
            Projection::Perspective(perspective) => {
                assert!((perspective.aspect_ratio - 4.0 / 3.0).abs() < 1e-6)
            }
            _ => panic!("surface uses a perspective projection"),
        }

        // Unchanged size does not fire again
        world.run_system_once(respond_to_resize).unwrap();
        assert_eq!(world.resource::<ResizeResponder>().resizes(), 1);

        world.resource_mut::<ViewerHost>().unmount();
        sync_viewer_scene(&mut world);
        world.resource_mut::<HostViewport>().region = None;
        world.run_system_once(respond_to_resize).unwrap();
        assert_eq!(world.resource::<ResizeResponder>().resizes(), 1);
    }
}
