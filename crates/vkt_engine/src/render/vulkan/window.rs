//! Window management using GLFW
//!
//! Provides Vulkan-capable window creation, event handling and the two seams
//! the rest of the engine talks to: [`WindowSurface`] for the renderer and
//! [`KeyInput`] for keyboard-driven controllers.

use ash::vk;
use thiserror::Error;

use crate::core::WindowConfig;

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// GLFW could not be initialized
    #[error("GLFW initialization failed")]
    InitializationFailed,

    /// The window could not be created
    #[error("Window creation failed")]
    CreationFailed,

    /// Any other GLFW failure
    #[error("GLFW error: {0}")]
    GlfwError(String),
}

/// Result type for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// Drawable area and resize notifications consumed by the renderer
pub trait WindowSurface {
    /// Current drawable area in pixels; zero in either dimension while minimized
    fn extent(&self) -> vk::Extent2D;

    /// Whether the drawable area changed since the flag was last reset
    fn was_resized(&self) -> bool;

    /// Clear the sticky resize flag
    fn reset_resized_flag(&mut self);

    /// Block until at least one window event arrives and process it
    fn wait_events(&mut self);
}

/// Polled keyboard state
pub trait KeyInput {
    /// Whether `key` is currently held down
    fn is_pressed(&self, key: glfw::Key) -> bool;
}

/// GLFW window wrapper with proper resource management
pub struct Window {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
    framebuffer_resized: bool,
}

impl Window {
    /// Open a window without a client API so Vulkan can render to it
    pub fn new(config: &WindowConfig) -> WindowResult<Self> {
        let mut glfw =
            glfw::init(glfw::fail_on_errors).map_err(|_| WindowError::InitializationFailed)?;

        if !glfw.vulkan_supported() {
            return Err(WindowError::GlfwError("Vulkan is not supported".to_string()));
        }

        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        glfw.window_hint(glfw::WindowHint::Resizable(config.resizable));

        let (mut window, events) = glfw
            .create_window(
                config.width,
                config.height,
                &config.title,
                glfw::WindowMode::Windowed,
            )
            .ok_or(WindowError::CreationFailed)?;

        window.set_key_polling(true);
        window.set_close_polling(true);
        window.set_framebuffer_size_polling(true);

        log::info!(
            "Window created: \"{}\" {}x{}",
            config.title,
            config.width,
            config.height
        );

        Ok(Self {
            glfw,
            window,
            events,
            framebuffer_resized: false,
        })
    }

    /// Whether the user asked to close the window
    pub fn should_close(&self) -> bool {
        self.window.should_close()
    }

    /// Process pending events without blocking
    pub fn poll_events(&mut self) {
        self.glfw.poll_events();
        self.handle_events();
    }

    fn handle_events(&mut self) {
        for (_, event) in glfw::flush_messages(&self.events) {
            match event {
                glfw::WindowEvent::FramebufferSize(width, height) => {
                    log::debug!("Framebuffer resized to {width}x{height}");
                    self.framebuffer_resized = true;
                }
                glfw::WindowEvent::Key(glfw::Key::Escape, _, glfw::Action::Press, _) => {
                    self.window.set_should_close(true);
                }
                _ => {}
            }
        }
    }

    /// Get required Vulkan instance extensions from GLFW
    pub fn required_instance_extensions(&self) -> WindowResult<Vec<String>> {
        self.glfw
            .get_required_instance_extensions()
            .ok_or_else(|| WindowError::GlfwError("Failed to get required extensions".to_string()))
    }

    /// Create Vulkan surface using GLFW's built-in functionality
    pub fn create_surface(&self, instance: vk::Instance) -> WindowResult<vk::SurfaceKHR> {
        let mut surface = vk::SurfaceKHR::null();
        let result = self
            .window
            .create_window_surface(instance, std::ptr::null(), &mut surface);

        if result == vk::Result::SUCCESS {
            Ok(surface)
        } else {
            Err(WindowError::GlfwError(format!(
                "Failed to create Vulkan surface: {result:?}"
            )))
        }
    }
}

impl WindowSurface for Window {
    #[allow(clippy::cast_sign_loss)]
    fn extent(&self) -> vk::Extent2D {
        let (width, height) = self.window.get_framebuffer_size();
        vk::Extent2D {
            width: width.max(0) as u32,
            height: height.max(0) as u32,
        }
    }

    fn was_resized(&self) -> bool {
        self.framebuffer_resized
    }

    fn reset_resized_flag(&mut self) {
        self.framebuffer_resized = false;
    }

    fn wait_events(&mut self) {
        self.glfw.wait_events();
        self.handle_events();
    }
}

impl KeyInput for Window {
    fn is_pressed(&self, key: glfw::Key) -> bool {
        matches!(
            self.window.get_key(key),
            glfw::Action::Press | glfw::Action::Repeat
        )
    }
}
