use std::error::Error;
use std::rc::Rc;
use std::time::Instant;

use nalgebra::Vector3;
use vkt_engine::core::EngineConfig;
use vkt_engine::foundation::math::Vec3;
use vkt_engine::input::KeyboardMovementController;
use vkt_engine::render::vulkan::RenderDevice;
use vkt_engine::render::{
    Camera, Model, ModelData, Renderer, SimpleRenderSystem, VulkanContext, Window,
};
use vkt_engine::scene::World;

/// Longest frame time fed to the controller, so a stall does not teleport the viewer
const MAX_FRAME_TIME: f32 = 0.1;

const FOV_Y_DEGREES: f32 = 50.0;
const NEAR_PLANE: f32 = 0.1;
const FAR_PLANE: f32 = 10.0;

/// Window, device, renderer and scene of the demo
///
/// Fields drop in declaration order: scene resources first, then the
/// renderer and its swap chain, then the device context, then the window.
pub struct CubeApp {
    world: World,
    render_system: SimpleRenderSystem,
    renderer: Renderer<VulkanContext>,
    context: Rc<VulkanContext>,
    window: Window,
}

impl CubeApp {
    pub fn new(config: EngineConfig) -> Result<Self, Box<dyn Error>> {
        let mut window = Window::new(&config.window)?;
        let context = Rc::new(VulkanContext::new(
            &window,
            &config.window.title,
            config.renderer.enable_validation,
        )?);
        let renderer = Renderer::new(Rc::clone(&context), &mut window, config.renderer.clone())?;
        let render_system = SimpleRenderSystem::new(
            context.raw_device(),
            renderer.swapchain_render_pass(),
            &config.shaders,
        )?;

        let model = match &config.scene.model_path {
            Some(path) => {
                log::info!("Loading model {path}");
                Model::from_file(&context, path)?
            }
            None => Model::new(&context, &ModelData::colored_cube(Vector3::zeros()))?,
        };
        log::info!("Model ready with {} vertices", model.vertex_count());

        let mut world = World::new();
        let cube = world.spawn();
        cube.model = Some(Rc::new(model));
        cube.transform.translation = Vec3::new(0.0, 0.0, 2.5);
        cube.transform.rotation = Vec3::new(0.125 * std::f32::consts::TAU, 0.0, 0.0);
        cube.transform.scale = Vec3::new(0.5, 0.5, 0.5);

        Ok(Self {
            world,
            render_system,
            renderer,
            context,
            window,
        })
    }

    pub fn run(&mut self) -> Result<(), Box<dyn Error>> {
        let controller = KeyboardMovementController::new();
        let mut camera = Camera::new();
        let mut viewer = self.world.create_object();
        let mut last_frame = Instant::now();

        log::info!("Entering main loop");
        while !self.window.should_close() {
            self.window.poll_events();

            let now = Instant::now();
            let dt = now.duration_since(last_frame).as_secs_f32().min(MAX_FRAME_TIME);
            last_frame = now;

            controller.move_in_plane_xz(&self.window, dt, &mut viewer);
            camera.set_view_yxz(viewer.transform.translation, viewer.transform.rotation);
            camera.set_perspective_projection(
                FOV_Y_DEGREES.to_radians(),
                self.renderer.aspect_ratio(),
                NEAR_PLANE,
                FAR_PLANE,
            );

            let Some(command_buffer) = self.renderer.begin_frame(&mut self.window)? else {
                continue;
            };
            self.renderer.begin_swapchain_render_pass(command_buffer);
            self.render_system
                .render_game_objects(command_buffer, &camera, self.world.objects());
            self.renderer.end_swapchain_render_pass(command_buffer);
            self.renderer.end_frame(&mut self.window)?;
        }

        self.context.wait_idle()?;
        log::info!("Main loop finished");
        Ok(())
    }
}
