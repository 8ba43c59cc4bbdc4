//! The main 3D scene rendered by every view.
//!
//! Kept deliberately small: meshes, and objects placing those meshes with a
//! transform and a flat color.

use futures::channel::oneshot;
use glam::Vec3;

use crate::config::StereoConfig;
use crate::mesh::{MeshData, Transform};
use crate::rig::CameraPair;
use crate::ui::Color;

/// Index of a mesh in a [`MainScene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(pub(crate) usize);

/// Index of an object in a [`MainScene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectId(pub(crate) usize);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneObject {
    pub mesh: MeshId,
    pub transform: Transform,
    pub color: Color,
}

#[derive(Clone, Debug)]
pub struct MainScene {
    meshes: Vec<MeshData>,
    objects: Vec<SceneObject>,
    background: Color,
}

impl Default for MainScene {
    fn default() -> Self {
        Self::new()
    }
}

impl MainScene {
    pub fn new() -> Self {
        Self {
            meshes: Vec::new(),
            objects: Vec::new(),
            background: Color::rgb(0.05, 0.06, 0.08),
        }
    }

    pub fn add_mesh(&mut self, mesh: MeshData) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    pub fn spawn(&mut self, mesh: MeshId, transform: Transform, color: Color) -> ObjectId {
        self.objects.push(SceneObject {
            mesh,
            transform,
            color,
        });
        ObjectId(self.objects.len() - 1)
    }

    pub fn meshes(&self) -> &[MeshData] {
        &self.meshes
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(id.0)
    }

    /// Color the scene pass clears to.
    pub fn background(&self) -> Color {
        self.background
    }

    pub fn set_background(&mut self, color: Color) {
        self.background = color;
    }
}

/// The demo scene shown by the binary.
pub struct DemoScene {
    pub scene: MainScene,
    /// Marker box that tracks the rig origin.
    pub rig_marker: ObjectId,
}

impl DemoScene {
    /// Build the demo scene and hand the eye cameras to `cameras`.
    ///
    /// A receiver that has already gone away is not an error; the scene is
    /// still usable, the rig simply never attaches.
    pub fn build(config: &StereoConfig, cameras: oneshot::Sender<CameraPair>) -> Self {
        let mut scene = MainScene::new();

        let cube = scene.add_mesh(MeshData::cube());
        let floor = scene.add_mesh(MeshData::plane(80.0));
        let tiles = scene.add_mesh(MeshData::checkerboard(20, 4.0));

        scene.spawn(floor, Transform::new(), Color::rgb(0.18, 0.2, 0.24));
        scene.spawn(
            tiles,
            Transform::from_position([0.0, 0.01, 0.0]),
            Color::rgb(0.3, 0.33, 0.38),
        );
        scene.spawn(
            cube,
            Transform::from_position([0.0, 0.0, -10.0]).uniform_scale(2.0),
            Color::TEAL,
        );
        for (i, x) in [-12.0f32, -6.0, 6.0, 12.0].into_iter().enumerate() {
            scene.spawn(
                cube,
                Transform::from_position([x, 1.0, -20.0 - 6.0 * i as f32]),
                Color::rgb(0.8, 0.8, 0.85),
            );
        }
        let rig_marker = scene.spawn(cube, Transform::new().uniform_scale(0.5), Color::ORANGE);

        let pair = CameraPair {
            left: config.eye_camera(),
            right: config.eye_camera(),
        };
        if cameras.send(pair).is_err() {
            log::warn!("nobody is waiting for the eye cameras");
        }

        Self { scene, rig_marker }
    }

    /// Move the marker box to the rig origin.
    pub fn track_rig(&mut self, rig_position: Vec3) {
        if let Some(marker) = self.scene.object_mut(self.rig_marker) {
            marker.transform.position = rig_position;
        }
    }
}
