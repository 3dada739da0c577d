use std::{
    collections::HashMap,
    mem,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{bail, Context};
use wgpu::{
    Adapter, Backends, Color, Device, DeviceDescriptor, InstanceDescriptor, LoadOp, MemoryHints,
    Operations, Queue, RenderPassColorAttachment, RenderPassDescriptor, RequestAdapterOptions,
    StoreOp, Surface, SurfaceConfiguration, SurfaceError,
};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, StartCause, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::{
    camera::FrameSource,
    config::{self, CommandVerb, Config},
    detector::LandmarkDetector,
    session::Session,
    ui::{self, Panels},
};

pub struct App {
    instance: wgpu::Instance,
    win: Option<Win>,
    /// Set when the window could not be created; reported once the event loop has exited.
    error: Option<anyhow::Error>,

    tick_interval: Duration,
    bindings: HashMap<config::Key, CommandVerb>,

    source: Box<dyn FrameSource>,
    detector: Box<dyn LandmarkDetector>,
    session: Session,
}

struct Gpu {
    adapter: Adapter,
    device: Device,
    queue: Queue,
}

impl Gpu {
    fn new(instance: &wgpu::Instance, surface: &Surface<'_>) -> anyhow::Result<Self> {
        let adapter = pollster::block_on(instance.request_adapter(&RequestAdapterOptions {
            compatible_surface: Some(surface),
            ..Default::default()
        }));
        let Some(adapter) = adapter else {
            bail!("failed to find a supported graphics adapter")
        };
        log::debug!("using graphics adapter: {:?}", adapter.get_info());

        let (device, queue) = pollster::block_on(adapter.request_device(
            &DeviceDescriptor {
                memory_hints: MemoryHints::MemoryUsage,
                ..Default::default()
            },
            None,
        ))?;

        Ok(Gpu {
            adapter,
            device,
            queue,
        })
    }
}

struct Egui {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

struct Win {
    window: Arc<Window>,
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,
    gpu: Gpu,

    egui: Egui,
    panels: Panels,
}

impl Win {
    fn recreate_swapchain(&mut self) {
        let res = self.window.inner_size();
        if res.width == 0 || res.height == 0 {
            // Minimized.
            return;
        }

        self.surface_config.width = res.width;
        self.surface_config.height = res.height;

        log::debug!(
            "configuring window surface for {}x{} (format: {:?}, present mode: {:?})",
            res.width,
            res.height,
            self.surface_config.format,
            self.surface_config.present_mode,
        );

        self.surface
            .configure(&self.gpu.device, &self.surface_config);
    }

    fn redraw(&mut self, session: &mut Session) {
        let st = match self.surface.get_current_texture() {
            Ok(st) => st,
            Err(err @ (SurfaceError::Outdated | SurfaceError::Lost)) => {
                log::debug!("surface error: {}", err);
                self.recreate_swapchain();
                match self.surface.get_current_texture() {
                    Ok(st) => st,
                    Err(e) => {
                        log::warn!("failed to acquire frame after recreating swapchain: {e}");
                        return;
                    }
                }
            }
            Err(SurfaceError::Timeout) => {
                log::debug!("timed out acquiring frame");
                return;
            }
            Err(e) => {
                panic!("failed to acquire frame: {}", e);
            }
        };

        let raw_input = self.egui.state.take_egui_input(&self.window);
        let mut cmds = Vec::new();
        let output = self.egui.ctx.run(raw_input, |ctx| {
            cmds = ui::show(ctx, session, &self.panels);
        });
        self.egui
            .state
            .handle_platform_output(&self.window, output.platform_output);

        let gpu = &self.gpu;
        let paint_jobs = self
            .egui
            .ctx
            .tessellate(output.shapes, output.pixels_per_point);
        for (id, delta) in &output.textures_delta.set {
            self.egui
                .renderer
                .update_texture(&gpu.device, &gpu.queue, *id, delta);
        }
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.surface_config.width, self.surface_config.height],
            pixels_per_point: output.pixels_per_point,
        };

        let mut enc = gpu.device.create_command_encoder(&Default::default());
        let callback_cmds = self.egui.renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut enc,
            &paint_jobs,
            &screen,
        );

        let view = st.texture.create_view(&Default::default());
        let mut pass = enc
            .begin_render_pass(&RenderPassDescriptor {
                label: Some("egui"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(Color::BLACK),
                        store: StoreOp::Store,
                    },
                })],
                ..Default::default()
            })
            .forget_lifetime();
        self.egui.renderer.render(&mut pass, &paint_jobs, &screen);
        drop(pass);

        for id in &output.textures_delta.free {
            self.egui.renderer.free_texture(id);
        }

        gpu.queue
            .submit(callback_cmds.into_iter().chain([enc.finish()]));
        self.window.pre_present_notify();
        st.present();

        for cmd in cmds {
            session.apply(cmd);
        }
    }
}

impl App {
    pub fn new(
        mut config: Config,
        source: Box<dyn FrameSource>,
        detector: Box<dyn LandmarkDetector>,
    ) -> Self {
        Self {
            instance: wgpu::Instance::new(&InstanceDescriptor {
                backends: Backends::PRIMARY,
                ..Default::default()
            }),
            win: None,
            error: None,
            tick_interval: Duration::from_millis(config.tick_ms),
            session: Session::new(&config),
            bindings: mem::take(&mut config.bind),
            source,
            detector,
        }
    }

    /// Returns the error that ended the event loop, if any.
    pub fn finish(self) -> anyhow::Result<()> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn create_win(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<Win> {
        let (width, height) = self.session.canvas().dimensions();
        let window = Arc::new(
            event_loop.create_window(
                Window::default_attributes()
                    .with_title("Air Draw")
                    .with_inner_size(LogicalSize::new(width * 2 + 60, height + 160)),
            )?,
        );

        let surface = self.instance.create_surface(window.clone())?;
        let gpu = Gpu::new(&self.instance, &surface)?;

        let res = window.inner_size();
        let mut surface_config = surface
            .get_default_config(&gpu.adapter, res.width.max(1), res.height.max(1))
            .context("adapter does not support surface")?;
        // egui expects to do its own gamma handling.
        let caps = surface.get_capabilities(&gpu.adapter);
        if let Some(format) = caps.formats.iter().copied().find(|f| !f.is_srgb()) {
            surface_config.format = format;
        }
        surface.configure(&gpu.device, &surface_config);

        log::debug!(
            "created {}x{} window surface, format={:?}",
            surface_config.width,
            surface_config.height,
            surface_config.format,
        );

        let ctx = egui::Context::default();
        let state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let renderer =
            egui_wgpu::Renderer::new(&gpu.device, surface_config.format, None, 1, false);

        Ok(Win {
            window,
            surface,
            surface_config,
            gpu,
            egui: Egui {
                ctx,
                state,
                renderer,
            },
            panels: Panels::default(),
        })
    }

    /// Captures, analyzes and draws one camera frame.
    fn tick(&mut self) {
        let Some(win) = &mut self.win else { return };
        let Some(frame) = self
            .session
            .step(self.source.as_mut(), self.detector.as_mut())
        else {
            return;
        };

        win.panels
            .update(&win.egui.ctx, &frame, self.session.canvas());
        win.window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.win.is_none() {
            match self.create_win(event_loop) {
                Ok(win) => self.win = Some(win),
                Err(e) => {
                    self.error = Some(e.context("could not create window"));
                    event_loop.exit();
                }
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(win) = &mut self.win else { return };
        let response = win.egui.state.on_window_event(&win.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("window closed, exiting");
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => win.redraw(&mut self.session),
            WindowEvent::Resized(_) => {
                win.recreate_swapchain();
                win.window.request_redraw();
            }
            WindowEvent::KeyboardInput { event: key, .. }
                if !response.consumed && key.state == ElementState::Pressed && !key.repeat =>
            {
                match &key.logical_key {
                    Key::Named(NamedKey::Escape) => event_loop.exit(),
                    Key::Character(text) => {
                        let verb = text
                            .chars()
                            .next()
                            .and_then(|c| self.bindings.get(&config::Key::from_char(c)));
                        if let Some(verb) = verb {
                            self.session.apply(verb.cmd());
                            win.window.request_redraw();
                        }
                    }
                    _ => {}
                }
            }
            _ => {
                if response.repaint {
                    win.window.request_redraw();
                }
            }
        }
    }

    fn new_events(&mut self, event_loop: &ActiveEventLoop, cause: StartCause) {
        match cause {
            StartCause::Init | StartCause::ResumeTimeReached { .. } => {
                self.tick();
                event_loop.set_control_flow(ControlFlow::WaitUntil(
                    Instant::now() + self.tick_interval,
                ));
            }
            _ => {}
        }
    }
}
