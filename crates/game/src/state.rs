//! Top-level game state: all systems plus the active scene.

use std::sync::Arc;

use anyhow::Result;
use engine_core::{FpsCounter, Time, World};
use input::InputState;
use physics::PhysicsWorld;
use rand::rngs::StdRng;
use rand::SeedableRng;
use renderer::{Camera, Renderer};
use winit::window::Window;

use crate::config::GameConfig;
use crate::interact::InteractionResolver;
use crate::items::ItemManager;
use crate::labels::LabelLoader;
use crate::player::FirstPersonController;
use crate::scenes::{MeshStore, Scene, SceneRegistry};
use crate::transition::{SwapTarget, TransitionController};

pub struct GameState {
    pub renderer: Renderer,
    pub camera: Camera,
    pub world: World,
    pub physics: PhysicsWorld,
    pub input: InputState,
    pub time: Time,
    pub fps: FpsCounter,
    pub config: GameConfig,
    pub player: FirstPersonController,
    pub transition: TransitionController,
    pub resolver: InteractionResolver,
    pub items: ItemManager,
    pub registry: SceneRegistry,
    pub scene: Scene,
    pub meshes: MeshStore,
    pub labels: LabelLoader,
    pub rng: StdRng,
    pub running: bool,
}

impl GameState {
    pub async fn new(window: Arc<Window>, config: GameConfig) -> Result<Self> {
        let renderer = Renderer::new(window).await?;

        let mut camera = Camera::default();
        camera.sensitivity *= config.sensitivity;
        let (width, height) = renderer.dimensions();
        camera.set_aspect(width, height);

        let mut physics = PhysicsWorld::new();
        let mut world = World::new();
        let mut resolver = InteractionResolver::new();
        let labels = LabelLoader::new();
        let mut registry = SceneRegistry::new();
        let mut items = ItemManager::new();
        items.set_prize_amount(config.prize_amount);
        let mut rng = StdRng::from_entropy();

        // The game starts on the street
        let scene = registry.build(
            &mut physics,
            &mut world,
            &mut resolver,
            &labels,
            &mut items,
            &mut rng,
            SwapTarget::Outside,
        );
        let player = FirstPersonController::new(&config);
        player.teleport(&mut camera, scene.spawn_position, scene.spawn_yaw);

        Ok(Self {
            renderer,
            camera,
            world,
            physics,
            input: InputState::new(),
            time: Time::new(),
            fps: FpsCounter::new(),
            player,
            transition: TransitionController::new(),
            resolver,
            items,
            registry,
            scene,
            meshes: MeshStore::new(),
            labels,
            rng,
            config,
            running: true,
        })
    }

    /// Tear down the current scene and build the target one. Called at
    /// the black midpoint of a transition. Both scenes share one world
    /// frame, so the camera is left exactly where it was.
    pub fn swap_scene(&mut self, target: SwapTarget) {
        self.registry.dispose(
            &mut self.physics,
            &mut self.world,
            &mut self.items,
            &self.scene,
        );
        self.meshes.clear_labels();
        self.scene = self.registry.build(
            &mut self.physics,
            &mut self.world,
            &mut self.resolver,
            &self.labels,
            &mut self.items,
            &mut self.rng,
            target,
        );
    }
}
