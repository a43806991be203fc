//! Scene setup and the per-frame state machine

use asteroids_engine::assets::{AssetError, AssetLoader, RegistryError, ResourceRegistry};
use asteroids_engine::config::ConfigError;
use asteroids_engine::foundation::math::Vec3;
use asteroids_engine::foundation::time::Timer;
use asteroids_engine::input::{InputSource, KeyCode};
use asteroids_engine::render::lighting::MAX_LIGHTS;
use asteroids_engine::render::{Camera, DirectionalLight, GraphicsDevice, RenderError, SamplerDesc};
use asteroids_engine::scene::EntityType;

use crate::config::GameConfig;

/// Game errors
#[derive(thiserror::Error, Debug)]
pub enum GameError {
    /// Scene construction failed
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Device failure
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Asset failure
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    /// Configuration failure
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Coarse game mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SceneState {
    /// Title screen; Enter starts a round
    #[default]
    Main,
    /// A round is running
    Game,
    /// The player hit an asteroid; R or Enter starts a new round
    GameOver,
}

const PLAYER: &str = "Player";
const PLAYER_MESH: &str = "Sphere_Mesh";
const PLAYER_MATERIAL: &str = "Cliff_Normal_Material";
const ASTEROID_MATERIAL: &str = "Rock_Material";
const EXHAUST_EMITTER: &str = "Exhaust_Emitter";
const EXPLOSION_EMITTER: &str = "Explosion_Emitter";

/// The game: one registry, one camera, four lights
pub struct Game<D: GraphicsDevice> {
    device: D,
    registry: ResourceRegistry,
    config: GameConfig,
    camera: Camera,
    camera_offset: Vec3,
    lights: [DirectionalLight; MAX_LIGHTS],
    state: SceneState,
    timer: Timer,
    rounds: u32,
    quit: bool,
}

impl<D: GraphicsDevice> Game<D> {
    /// Create a game that draws through `device`
    pub fn new(device: D, config: GameConfig) -> Self {
        let mut camera = Camera::perspective(Vec3::new(0.0, 12.0, -10.0), 45.0, config.window.aspect_ratio(), 0.1, 100.0);
        camera.set_target(Vec3::zeros());

        Self {
            device,
            registry: ResourceRegistry::new(config.gameplay.registry_settings()),
            camera,
            camera_offset: Vec3::new(0.0, 12.0, -10.0),
            lights: DirectionalLight::default_rig(),
            state: SceneState::Main,
            timer: Timer::new(),
            rounds: 0,
            quit: false,
            config,
        }
    }

    /// Register every shader, texture, sampler, material, mesh and emitter
    pub fn init(&mut self, loader: &mut dyn AssetLoader) -> Result<(), GameError> {
        log::info!("Loading game resources...");
        let device = &mut self.device;
        let registry = &mut self.registry;

        registry.load_vertex_shader("Default_Vertex_Shader", device, loader, "VertexShader.cso")?;
        registry.load_vertex_shader("Normals_Vertex_Shader", device, loader, "VertexShaderNormals.cso")?;
        registry.load_vertex_shader("Particle_Vertex_Shader", device, loader, "ParticleVS.cso")?;
        registry.load_pixel_shader("Default_Pixel_Shader", device, loader, "PixelShader.cso")?;
        registry.load_pixel_shader("Normals_Pixel_Shader", device, loader, "PixelShaderNormals.cso")?;
        registry.load_pixel_shader("Particle_Pixel_Shader", device, loader, "ParticlePS.cso")?;

        registry.load_texture("Gravel_Texture", device, loader, "resources/textures/GravelCobble_bc.jpg")?;
        registry.load_texture("Snow_Texture", device, loader, "resources/textures/Snow_bc.jpg")?;
        registry.load_texture("Cliff_Texture", device, loader, "resources/textures/CliffLayered_bc.tif")?;
        registry.load_texture("Cliff_Normal_Texture", device, loader, "resources/textures/CliffLayered_normal.tif")?;
        registry.load_texture("Particle_Texture", device, loader, "resources/textures/particle.jpg")?;
        registry.create_sampler("Anisotropic_Sampler", device, &SamplerDesc::default())?;

        registry.create_material_with_normal(
            PLAYER_MATERIAL,
            "Normals_Vertex_Shader",
            "Normals_Pixel_Shader",
            "Cliff_Texture",
            "Cliff_Normal_Texture",
            "Anisotropic_Sampler",
        )?;
        registry.create_material(
            ASTEROID_MATERIAL,
            "Default_Vertex_Shader",
            "Default_Pixel_Shader",
            "Gravel_Texture",
            "Anisotropic_Sampler",
        )?;
        registry.create_material(
            "Snow_Material",
            "Default_Vertex_Shader",
            "Default_Pixel_Shader",
            "Snow_Texture",
            "Anisotropic_Sampler",
        )?;

        registry.load_mesh(PLAYER_MESH, device, loader, "resources/models/sphere.obj")?;

        registry.create_emitter(
            EXHAUST_EMITTER,
            device,
            &self.config.exhaust,
            "Particle_Vertex_Shader",
            "Particle_Pixel_Shader",
            "Particle_Texture",
        )?;
        registry.create_emitter(
            EXPLOSION_EMITTER,
            device,
            &self.config.explosion,
            "Particle_Vertex_Shader",
            "Particle_Pixel_Shader",
            "Particle_Texture",
        )?;
        registry.set_exhaust_emitter(EXHAUST_EMITTER)?;
        registry.set_explosion_emitter(EXPLOSION_EMITTER)?;

        log::info!("Game resources loaded: {:?}", registry);
        Ok(())
    }

    /// Replace every entity with a fresh player and asteroid field
    pub fn start_round(&mut self) -> Result<(), GameError> {
        self.registry.remove_all_entities();

        self.registry.create_entity(PLAYER, PLAYER_MESH, PLAYER_MATERIAL, EntityType::Player)?;
        let scale = self.config.gameplay.player_scale;
        self.registry.get_entity_mut(PLAYER)?.body_mut().set_scale(Vec3::repeat(scale));

        for i in 0..self.config.gameplay.asteroid_count {
            let name = format!("Asteroid_{i}");
            self.registry.create_entity(&name, PLAYER_MESH, ASTEROID_MATERIAL, EntityType::Asteroid)?;
        }

        self.rounds += 1;
        self.state = SceneState::Game;
        log::info!(
            "Round {} started with {} asteroids",
            self.rounds,
            self.registry.count_of(EntityType::Asteroid)
        );
        Ok(())
    }

    /// Advance one frame
    pub fn update(&mut self, delta_time: f32, input: &dyn InputSource) -> Result<(), GameError> {
        self.timer.advance(delta_time);
        let total_time = self.timer.total_time();

        if input.is_key_down(KeyCode::Escape) {
            log::info!("Quit requested");
            self.quit = true;
            return Ok(());
        }

        match self.state {
            SceneState::Main => {
                if input.is_key_down(KeyCode::Enter) {
                    self.start_round()?;
                }
            }
            SceneState::Game => {
                let game_over = self.registry.update_entities(delta_time, total_time, input);
                self.registry.update_emitters(delta_time);
                self.follow_player();

                if game_over {
                    log::info!(
                        "Game over after {:.1}s; {} asteroid(s) left",
                        total_time,
                        self.registry.count_of(EntityType::Asteroid)
                    );
                    self.state = SceneState::GameOver;
                } else if self.registry.count_of(EntityType::Asteroid) == 0 {
                    log::info!("Field cleared, starting next round");
                    self.start_round()?;
                }
            }
            SceneState::GameOver => {
                self.registry.update_emitters(delta_time);
                if input.any_down(&[KeyCode::R, KeyCode::Enter]) {
                    self.start_round()?;
                }
            }
        }

        Ok(())
    }

    fn follow_player(&mut self) {
        if let Some(player) = self.registry.player() {
            self.camera.follow(&player.body().position(), &self.camera_offset);
        }
    }

    /// Draw the current scene
    pub fn draw(&mut self) -> Result<(), GameError> {
        if self.state == SceneState::Main {
            return Ok(());
        }

        self.registry.draw_entities(&mut self.device, &self.camera, &self.lights)?;
        self.registry.draw_emitters(&mut self.device, &self.camera)?;
        Ok(())
    }

    /// Release every resource
    pub fn shutdown(&mut self) -> Result<(), GameError> {
        self.registry.clear(&mut self.device)?;
        log::info!("Game shut down after {} frame(s)", self.timer.frame_count());
        Ok(())
    }

    /// Current scene state
    pub fn state(&self) -> SceneState {
        self.state
    }

    /// Whether Escape was pressed
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Rounds started so far
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Resource registry
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Resource registry, for scene scripting
    #[cfg(test)]
    pub fn registry_mut(&mut self) -> &mut ResourceRegistry {
        &mut self.registry
    }

    /// Camera
    #[cfg(test)]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Graphics device
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Graphics device, mutable
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Whether a named resource is registered
    #[cfg(test)]
    pub fn has_resource(&self, kind: asteroids_engine::assets::ResourceKind, name: &str) -> bool {
        self.registry.contains(kind, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asteroids_engine::assets::ResourceKind;
    use asteroids_engine::input::{KeyboardState, NoInput};
    use asteroids_engine::render::{HeadlessDevice, HeadlessLoader};
    use approx::assert_relative_eq;

    const DT: f32 = 1.0 / 60.0;

    fn game() -> Game<HeadlessDevice> {
        let mut config = GameConfig::default();
        config.gameplay.seed = Some(3);
        let mut game = Game::new(HeadlessDevice::new(), config);
        game.init(&mut HeadlessLoader::new()).unwrap();
        game
    }

    fn press(key: KeyCode) -> KeyboardState {
        let mut keyboard = KeyboardState::new();
        keyboard.handle_key(key, true);
        keyboard
    }

    #[test]
    fn test_init_registers_named_resources() {
        let game = game();
        assert!(game.has_resource(ResourceKind::Material, "Cliff_Normal_Material"));
        assert!(game.has_resource(ResourceKind::Emitter, EXHAUST_EMITTER));
        assert_eq!(game.registry().ref_count(ResourceKind::Texture, "Cliff_Normal_Texture"), Some(1));
        assert_eq!(game.state(), SceneState::Main);
    }

    #[test]
    fn test_enter_starts_a_round() {
        let mut game = game();
        game.update(DT, &NoInput).unwrap();
        assert_eq!(game.state(), SceneState::Main);
        assert_eq!(game.registry().entity_count(), 0);

        game.update(DT, &press(KeyCode::Enter)).unwrap();
        assert_eq!(game.state(), SceneState::Game);
        assert_eq!(game.registry().count_of(EntityType::Asteroid), 8);
        assert_eq!(game.registry().count_of(EntityType::Player), 1);
    }

    #[test]
    fn test_collision_with_player_ends_round_and_r_restarts() {
        let mut game = game();
        game.start_round().unwrap();
        game.registry_mut()
            .get_entity_mut("Asteroid_0")
            .unwrap()
            .body_mut()
            .set_position(Vec3::zeros());

        game.update(DT, &NoInput).unwrap();
        assert_eq!(game.state(), SceneState::GameOver);

        game.update(DT, &press(KeyCode::R)).unwrap();
        assert_eq!(game.state(), SceneState::Game);
        assert_eq!(game.rounds(), 2);
        assert_eq!(game.registry().count_of(EntityType::Asteroid), 8);
    }

    #[test]
    fn test_camera_trails_player() {
        let mut game = game();
        game.start_round().unwrap();
        game.update(DT, &press(KeyCode::W)).unwrap();

        let player = game.registry().player().unwrap().body().position();
        assert_relative_eq!(game.camera().target, player, epsilon = 1e-6);
        assert_relative_eq!(game.camera().position, player + Vec3::new(0.0, 12.0, -10.0), epsilon = 1e-5);
    }

    #[test]
    fn test_draw_and_shutdown_release_everything() {
        let mut game = game();
        game.start_round().unwrap();
        game.update(DT, &NoInput).unwrap();
        game.draw().unwrap();
        assert!(game.device().draw_calls().len() >= 9);

        game.shutdown().unwrap();
        assert!(game.registry().is_empty());
        assert_eq!(game.device().live_buffer_count(), 0);
        assert_eq!(game.device().live_texture_count(), 0);
    }

    #[test]
    fn test_escape_quits() {
        let mut game = game();
        game.update(DT, &press(KeyCode::Escape)).unwrap();
        assert!(game.should_quit());
    }
}
