//! Frame loop and swap chain recreation scenarios against a recording device


use ash::vk;
use std::rc::Rc;

use crate::core::RendererConfig;

use super::testing::{Call, MockDevice, MockWindow};
use super::Renderer;

fn config(max_frames_in_flight: usize) -> RendererConfig {
    RendererConfig {
        max_frames_in_flight,
        ..RendererConfig::default()
    }
}

fn setup(max_frames_in_flight: usize) -> (Rc<MockDevice>, MockWindow, Renderer<MockDevice>) {
    let device = Rc::new(MockDevice::new());
    let mut window = MockWindow::new(800, 600);
    let renderer = Renderer::new(Rc::clone(&device), &mut window, config(max_frames_in_flight))
        .expect("renderer creation");
    (device, window, renderer)
}

/// Run one full tick; `None` when the frame was skipped
fn run_frame(renderer: &mut Renderer<MockDevice>, window: &mut MockWindow) -> Option<vk::CommandBuffer> {
    let command_buffer = renderer.begin_frame(window).expect("begin_frame")?;
    renderer.begin_swapchain_render_pass(command_buffer);
    renderer.end_swapchain_render_pass(command_buffer);
    renderer.end_frame(window).expect("end_frame");
    Some(command_buffer)
}

fn position(calls: &[Call], predicate: impl Fn(&Call) -> bool) -> usize {
    calls
        .iter()
        .position(predicate)
        .unwrap_or_else(|| panic!("call not found in {calls:#?}"))
}

fn created_swapchains(calls: &[Call]) -> Vec<(u64, u64, (u32, u32))> {
    calls
        .iter()
        .filter_map(|call| match *call {
            Call::CreateSwapchain {
                handle, old, extent, ..
            } => Some((handle, old, extent)),
            _ => None,
        })
        .collect()
}

fn submitted_fences(calls: &[Call]) -> Vec<u64> {
    calls
        .iter()
        .filter_map(|call| match *call {
            Call::Submit { fence, .. } => Some(fence),
            _ => None,
        })
        .collect()
}
