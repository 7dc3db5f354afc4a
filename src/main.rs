use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::{Window, WindowId},
};

use heightview::config::Params;
use heightview::input::{InputCommand, InputState, wheel_delta};
use heightview::mesh::encode_data_url;
use heightview::renderer::GpuState;
use heightview::storage::{IMAGE_KEY, PARAMS_KEY, Storage};
use heightview::ui::{UiActions, UiState, apply_theme, draw_help_overlay, draw_side_panel};
use heightview::viewer::Viewer;

struct App {
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    egui_state: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
    egui_ctx: egui::Context,

    viewer: Viewer,
    ui_state: UiState,
    input: InputState,

    running: bool,
    exited: bool,
}

impl App {
    fn new(storage: Option<Storage>) -> Self {
        let viewer = Viewer::new(storage);
        Self {
            window: None,
            gpu: None,
            egui_state: None,
            egui_renderer: None,
            egui_ctx: egui::Context::default(),

            ui_state: UiState::from_config(viewer.config()),
            viewer,
            input: InputState::default(),

            running: true,
            exited: false,
        }
    }

    fn update(&mut self) {
        self.viewer.tick(&self.input.keys);
        self.ui_state.auto_rotate = self.viewer.orbit().auto_rotate;

        if let Some(gpu) = &mut self.gpu {
            gpu.sync_scene(self.viewer.scene());
        }
    }

    fn render(&mut self) {
        let (Some(window), Some(egui_state)) = (&self.window, &mut self.egui_state) else {
            return;
        };

        let raw_input = egui_state.take_egui_input(window);
        let stats = self.viewer.stats();
        let show_help = self.ui_state.show_help;
        let auto_rotate = self.viewer.orbit().auto_rotate;

        let mut ui_actions = UiActions::default();

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            ui_actions = draw_side_panel(ctx, &mut self.ui_state, &stats);
            if show_help {
                draw_help_overlay(ctx, stats.camera_position, auto_rotate);
            }
        });

        self.handle_ui_actions(ui_actions);

        let Some(gpu) = &mut self.gpu else { return };
        let Some(window) = &self.window else { return };
        let Some(egui_state) = &mut self.egui_state else {
            return;
        };
        let Some(egui_renderer) = &mut self.egui_renderer else {
            return;
        };

        egui_state.handle_platform_output(window, full_output.platform_output);

        // actions may have changed the scene after update() synced it
        gpu.sync_scene(self.viewer.scene());

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.resize(gpu.size);
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("out of GPU memory, stopping");
                self.running = false;
                return;
            }
            Err(wgpu::SurfaceError::Timeout) => {
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        gpu.update_camera(&self.viewer.scene().camera);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, delta) in full_output.textures_delta.set {
            egui_renderer.update_texture(&gpu.device, &gpu.queue, id, &delta);
        }

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Main Encoder"),
            });

        egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        gpu.render_scene(&view, &mut encoder);

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let mut render_pass = render_pass.forget_lifetime();
            egui_renderer.render(&mut render_pass, &paint_jobs, &screen_descriptor);
        }

        for id in full_output.textures_delta.free {
            egui_renderer.free_texture(&id);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        window.request_redraw();
    }

    fn handle_ui_actions(&mut self, actions: UiActions) {
        if let Some(format) = actions.export {
            if let Some(path) = self.viewer.export(format) {
                self.ui_state.last_export = Some(path);
            }
        }

        if actions.toggle_auto_rotate {
            self.viewer.toggle_auto_rotate();
        }

        if actions.cell_size_changed {
            self.viewer.set_cell_size(self.ui_state.cell_size);
        }

        if actions.vsync_changed {
            self.viewer.set_vsync(self.ui_state.vsync_enabled);
            if let Some(gpu) = &mut self.gpu {
                gpu.set_vsync(self.ui_state.vsync_enabled);
            }
        }

        if actions.reload {
            self.viewer.reload();
        }

        if actions.remove_mesh {
            self.viewer.remove_mesh();
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if self.exited {
            return;
        }
        self.exited = true;
        self.viewer.shutdown();
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes()
            .with_title("Heightview")
            .with_inner_size(PhysicalSize::new(1600, 900));

        let window = match event_loop.create_window(window_attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let gpu = match pollster::block_on(GpuState::new(window.clone(), self.viewer.config().vsync)) {
            Ok(gpu) => gpu,
            Err(e) => {
                error!("failed to initialise GPU: {e}");
                event_loop.exit();
                return;
            }
        };

        let egui_state = egui_winit::State::new(
            self.egui_ctx.clone(),
            self.egui_ctx.viewport_id(),
            &window,
            Some(window.scale_factor() as f32),
            None,
            Some(2048),
        );

        let egui_renderer =
            egui_wgpu::Renderer::new(&gpu.device, gpu.config.format, None, 1, false);

        apply_theme(&self.egui_ctx);

        let size = window.inner_size();
        self.viewer.scene_mut().resize(size.width, size.height);

        self.window = Some(window);
        self.gpu = Some(gpu);
        self.egui_state = Some(egui_state);
        self.egui_renderer = Some(egui_renderer);
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        // these must reach the drag state even over the panel
        match event {
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: ElementState::Released,
                ..
            } => self.input.end_drag(),
            WindowEvent::CursorLeft { .. } => self.input.cursor_left(),
            WindowEvent::Focused(false) => self.input.focus_lost(),
            _ => {}
        }

        if let Some(egui_state) = &mut self.egui_state {
            if let Some(window) = &self.window {
                let response = egui_state.on_window_event(window, &event);
                if response.consumed {
                    return;
                }
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                self.running = false;
            }

            WindowEvent::Resized(size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(size);
                }
                self.viewer.scene_mut().resize(size.width, size.height);
            }

            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(key) = event.physical_key else {
                    return;
                };
                match self.input.key(key, event.state == ElementState::Pressed) {
                    Some(InputCommand::ToggleAutoRotate) => {
                        self.viewer.toggle_auto_rotate();
                    }
                    Some(InputCommand::Stop) => {
                        info!("stop requested");
                        self.running = false;
                    }
                    None => {}
                }
            }

            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: ElementState::Pressed,
                ..
            } => self.input.begin_drag(),

            WindowEvent::CursorMoved { position, .. } => {
                if let Some((dx, dy)) = self.input.cursor_moved(position) {
                    self.viewer.drag(dx, dy);
                }
            }

            WindowEvent::MouseWheel { delta, .. } => self.viewer.zoom(wheel_delta(delta)),

            WindowEvent::RedrawRequested => {
                self.update();
                self.render();
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if !self.running {
            self.shutdown(event_loop);
            return;
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

struct Args {
    image: Option<PathBuf>,
    params: Option<PathBuf>,
}

fn parse_args() -> Args {
    let mut args = Args {
        image: None,
        params: None,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--image" => args.image = iter.next().map(PathBuf::from),
            "--params" => args.params = iter.next().map(PathBuf::from),
            other => warn!("ignoring unknown argument `{other}`"),
        }
    }
    args
}

/// Stores the files given on the command line under the persisted keys.
fn seed_storage(storage: &Storage, args: &Args) {
    if let Some(path) = &args.image {
        let stored = std::fs::read(path)
            .map_err(heightview::ViewerError::from)
            .and_then(|bytes| encode_data_url(&bytes))
            .and_then(|url| storage.set(IMAGE_KEY, &url));
        match stored {
            Ok(()) => info!(path = %path.display(), "image stored"),
            Err(e) => error!("failed to store image {}: {e}", path.display()),
        }
    }

    if let Some(path) = &args.params {
        let stored = std::fs::read_to_string(path)
            .map_err(heightview::ViewerError::from)
            .and_then(|json| {
                Params::from_json(&json)?;
                storage.set(PARAMS_KEY, &json)
            });
        match stored {
            Ok(()) => info!(path = %path.display(), "parameters stored"),
            Err(e) => error!("failed to store parameters {}: {e}", path.display()),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "heightview=info".into()),
        )
        .init();

    let args = parse_args();

    let storage = match Storage::open_default() {
        Ok(storage) => {
            info!(root = %storage.root().display(), "using data directory");
            seed_storage(&storage, &args);
            Some(storage)
        }
        Err(e) => {
            warn!("persistence disabled: {e}");
            None
        }
    };

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            error!("failed to create event loop: {e}");
            return;
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(storage);
    if let Err(e) = event_loop.run_app(&mut app) {
        error!("event loop terminated: {e}");
    }
}
