// main.rs — 事件循环、按键映射、菜单 / 状态栏、纹理异步加载

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // Release 下隐藏控制台窗口

mod mesh;
mod renderer;
mod state;
mod surface;
mod variant;

use renderer::{Renderer, Scene};
use state::{AnimationState, MarkerAxis, Orbit};
use variant::{LightRig, VariantConfig};

use winit::{
    dpi::{LogicalSize, PhysicalPosition},
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::{Fullscreen, WindowBuilder},
};

use image::io::Reader as ImageReader;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

const APP_TITLE: &str = "Involute Surface Viewer";

fn main() {
    env_logger::init();

    let variant_name = variant::resolve_name_from_args();
    let mut cfg = variant::resolve(&variant_name);
    let mut current_variant = variant_name;
    log::info!("variant {:?}: {:?}", current_variant, cfg);

    // 几何在启动时构建一次；动画只改 uniform，不重建网格
    let mut surface_mesh = mesh::build_grid(&grid_options(&cfg));

    let event_loop = EventLoop::new();
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(APP_TITLE)
            .with_inner_size(LogicalSize::new(1280, 720))
            .build(&event_loop)
            .unwrap(),
    );

    // GPU 起不来对本次会话不可恢复：提示后退出，不做部分渲染
    let mut renderer = match pollster::block_on(Renderer::new(window.clone(), &surface_mesh)) {
        Ok(r) => r,
        Err(e) => {
            log::error!("renderer initialization failed: {e}");
            let _ = rfd::MessageDialog::new()
                .set_level(rfd::MessageLevel::Error)
                .set_title(APP_TITLE)
                .set_description(&format!("Could not initialize the graphics context: {e}"))
                .show();
            return;
        }
    };

    let variant_names = variant::available_names();
    let mut orbit = Orbit::new();
    let mut anim = AnimationState::new();

    // 交互状态
    let mut mouse_pressed = false;
    let mut last_mouse_pos: Option<PhysicalPosition<f64>> = None;

    // FPS 计算
    let mut last_frame_time = Instant::now();
    let mut frame_count = 0;
    let mut fps = 0.0;
    let mut show_fps = false;

    let mut is_loading = false;

    // 纹理异步加载通道：fire-and-forget，完成时换绑一次
    let (tx, rx): (Sender<image::RgbaImage>, Receiver<image::RgbaImage>) = channel();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        if let Ok(rgba) = rx.try_recv() {
            renderer.load_texture(rgba);
            is_loading = false;
        }

        match event {
            Event::WindowEvent { event, .. } => {
                // 先让 egui 处理事件
                let response = renderer.egui_state.on_event(&renderer.egui_ctx, &event);
                if response.consumed {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => {
                        *control_flow = ControlFlow::Exit;
                    }

                    WindowEvent::Resized(new_size) => {
                        renderer.resize(new_size);
                    }

                    // 离散按键 1:1 映射到状态迁移，未识别的键是 no-op
                    WindowEvent::KeyboardInput { input, .. } => {
                        if input.state == ElementState::Pressed {
                            match input.virtual_keycode {
                                Some(VirtualKeyCode::Left) => {
                                    anim.advance_counter(-cfg.counter_delta);
                                }
                                Some(VirtualKeyCode::Right) => {
                                    anim.advance_counter(cfg.counter_delta);
                                }
                                // 标记点按网格步长走
                                Some(VirtualKeyCode::A) => {
                                    anim.move_marker(MarkerAxis::U, -cfg.u_step);
                                }
                                Some(VirtualKeyCode::D) => {
                                    anim.move_marker(MarkerAxis::U, cfg.u_step);
                                }
                                Some(VirtualKeyCode::W) => {
                                    anim.move_marker(MarkerAxis::V, cfg.v_step);
                                }
                                Some(VirtualKeyCode::S) => {
                                    anim.move_marker(MarkerAxis::V, -cfg.v_step);
                                }
                                Some(
                                    VirtualKeyCode::Equals
                                    | VirtualKeyCode::Plus
                                    | VirtualKeyCode::NumpadAdd,
                                ) => {
                                    anim.adjust_scale(0.1);
                                }
                                Some(
                                    VirtualKeyCode::Minus | VirtualKeyCode::NumpadSubtract,
                                ) => {
                                    anim.adjust_scale(-0.1);
                                }
                                Some(VirtualKeyCode::O) => {
                                    if let Some(path) = rfd::FileDialog::new()
                                        .add_filter("Images", &["jpg", "jpeg", "png", "bmp"])
                                        .pick_file()
                                    {
                                        is_loading = true;
                                        start_load_image(path, tx.clone());
                                    }
                                }
                                Some(VirtualKeyCode::F11) => {
                                    orbit.is_fullscreen = !orbit.is_fullscreen;
                                    if orbit.is_fullscreen {
                                        window.set_fullscreen(Some(Fullscreen::Borderless(None)));
                                    } else {
                                        window.set_fullscreen(None);
                                    }
                                }
                                _ => {}
                            }
                        }
                    }

                    // 鼠标轨道旋转
                    WindowEvent::MouseInput { state, button, .. } => {
                        if button == MouseButton::Left {
                            mouse_pressed = state == ElementState::Pressed;
                            if !mouse_pressed {
                                last_mouse_pos = None;
                            }
                        }
                    }

                    WindowEvent::CursorMoved { position, .. } => {
                        if mouse_pressed {
                            if let Some(last_pos) = last_mouse_pos {
                                let dx = (position.x - last_pos.x) as f32;
                                let dy = (position.y - last_pos.y) as f32;

                                let width = renderer.size.width as f32;
                                let height = renderer.size.height as f32;

                                if width > 0.0 && height > 0.0 {
                                    // 视场固定 π/8，把像素位移换算成角度
                                    let v_f = std::f32::consts::PI / 8.0;
                                    let aspect = width / height;
                                    let h_f = 2.0 * ((v_f / 2.0).tan() * aspect).atan();

                                    let yaw_per_px_deg = (h_f / width).to_degrees();
                                    let pitch_per_px_deg = (v_f / height).to_degrees();

                                    orbit.yaw += dx * yaw_per_px_deg * orbit.sensitivity_scale;
                                    orbit.pitch = (orbit.pitch
                                        + dy * pitch_per_px_deg * orbit.sensitivity_scale)
                                        .clamp(-90.0, 90.0);
                                }
                            }
                            last_mouse_pos = Some(position);
                        }
                    }

                    WindowEvent::DroppedFile(path) => {
                        is_loading = true;
                        start_load_image(path, tx.clone());
                    }

                    _ => {}
                }
            }

            Event::RedrawRequested(_) => {
                // FPS 统计
                frame_count += 1;
                let now = Instant::now();
                if now.duration_since(last_frame_time).as_secs_f32() >= 1.0 {
                    fps = frame_count as f32 / now.duration_since(last_frame_time).as_secs_f32();
                    frame_count = 0;
                    last_frame_time = now;
                }

                renderer.update_scene(&build_scene(&orbit, &anim, &cfg));

                let mut next_image = None;
                let mut next_variant = None;
                let render_result = renderer.render_with_ui(&window, |ctx| {
                    draw_ui(
                        ctx,
                        &mut orbit,
                        &anim,
                        &cfg,
                        &current_variant,
                        &variant_names,
                        &mut next_variant,
                        &mut next_image,
                        &mut show_fps,
                        fps,
                        is_loading,
                        &window,
                    );
                });

                if let Some(path) = next_image {
                    is_loading = true;
                    start_load_image(path, tx.clone());
                }

                // 变体切换：重建网格、重传缓冲、状态回到启动默认值
                if let Some(name) = next_variant {
                    cfg = variant::resolve(&name);
                    current_variant = name;
                    surface_mesh = mesh::build_grid(&grid_options(&cfg));
                    renderer.upload_mesh(&surface_mesh);
                    anim = AnimationState::new();
                    log::info!("switched to variant {:?}", current_variant);
                }

                match render_result {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => *control_flow = ControlFlow::Exit,
                    Err(e) => log::error!("render error: {:?}", e),
                }
            }

            Event::MainEventsCleared => {
                window.request_redraw();
            }

            _ => {}
        }
    });
}

fn grid_options(cfg: &VariantConfig) -> mesh::GridOptions {
    mesh::GridOptions {
        u_step: cfg.u_step,
        v_step: cfg.v_step,
        normals: cfg.normals,
        tex_coords: cfg.textured,
        delta_deg: surface::DEFAULT_DELTA_DEG,
    }
}

/// 把交互状态折算成本帧的渲染量（派生值现算，不缓存）。
fn build_scene(orbit: &Orbit, anim: &AnimationState, cfg: &VariantConfig) -> Scene {
    let light = match cfg.light {
        LightRig::Directional { dir } => [dir[0], dir[1], dir[2], 0.0],
        LightRig::Animated { path, amplitude } => {
            let p = anim.light_position(path, amplitude);
            [p[0] as f32, p[1] as f32, p[2] as f32, 1.0]
        }
    };

    let marker = if cfg.marker {
        let m = anim.marker_world_position();
        [m[0] as f32, m[1] as f32, m[2] as f32, 1.0]
    } else {
        [0.0; 4]
    };

    Scene {
        yaw_deg: orbit.yaw,
        pitch_deg: orbit.pitch,
        scale: anim.scale as f32,
        color: cfg.color,
        light,
        marker,
        textured: cfg.textured,
    }
}

fn start_load_image(path: PathBuf, tx: Sender<image::RgbaImage>) {
    thread::spawn(move || {
        log::info!("loading texture in background: {:?}", path);

        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) => {
                // 非致命：占位纯色继续用
                log::warn!("could not open {:?}: {}", path, e);
                return;
            }
        };
        let reader = BufReader::new(file);

        let img_result = ImageReader::new(reader)
            .with_guessed_format()
            .map_err(image::ImageError::IoError)
            .and_then(|mut r| {
                r.no_limits();
                r.decode()
            });

        match img_result {
            Ok(img) => {
                let rgba = img.to_rgba8();
                log::info!("texture decoded: {}x{}", rgba.width(), rgba.height());
                if tx.send(rgba).is_err() {
                    log::warn!("main thread is gone, dropping decoded texture");
                }
            }
            Err(e) => log::warn!("could not decode {:?}: {}", path, e),
        }
    });
}

fn draw_ui(
    ctx: &egui::Context,
    orbit: &mut Orbit,
    anim: &AnimationState,
    cfg: &VariantConfig,
    current_variant: &str,
    variant_names: &[String],
    next_variant: &mut Option<String>,
    next_image: &mut Option<PathBuf>,
    show_fps: &mut bool,
    fps: f32,
    is_loading: bool,
    window: &winit::window::Window,
) {
    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open Texture…").clicked() {
                    ui.close_menu();
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Images", &["jpg", "jpeg", "png", "bmp"])
                        .pick_file()
                    {
                        *next_image = Some(path);
                    }
                }
                if ui.button("Exit").clicked() {
                    std::process::exit(0);
                }
            });

            ui.menu_button("View", |ui| {
                if ui.button("Reset View").clicked() {
                    orbit.yaw = 0.0;
                    orbit.pitch = 0.0;
                    ui.close_menu();
                }

                if ui
                    .button(if orbit.is_fullscreen {
                        "Exit Fullscreen"
                    } else {
                        "Enter Fullscreen"
                    })
                    .clicked()
                {
                    orbit.is_fullscreen = !orbit.is_fullscreen;
                    if orbit.is_fullscreen {
                        window.set_fullscreen(Some(Fullscreen::Borderless(None)));
                    } else {
                        window.set_fullscreen(None);
                    }
                    ui.close_menu();
                }

                ui.separator();
                ui.menu_button("Variant", |ui| {
                    for name in variant_names {
                        let mut selected = current_variant.to_string();
                        if ui.radio_value(&mut selected, name.clone(), name).clicked() {
                            if selected != current_variant {
                                *next_variant = Some(selected);
                            }
                            ui.close_menu();
                        }
                    }
                });

                ui.separator();
                ui.menu_button("Input Sensitivity", |ui| {
                    ui.add(
                        egui::Slider::new(&mut orbit.sensitivity_scale, 0.1..=5.0)
                            .text("multiplier"),
                    );
                    if ui.button("Reset 1.0").clicked() {
                        orbit.sensitivity_scale = 1.0;
                    }
                });

                ui.separator();
                if ui.checkbox(show_fps, "Show FPS").clicked() {
                    ui.close_menu();
                }
            });
        });
    });

    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if is_loading {
                ui.label(
                    egui::RichText::new("Loading texture…").color(egui::Color32::YELLOW),
                );
                ui.label("|");
            }

            ui.label(format!("Variant: {}", current_variant));
            ui.label("|");
            ui.label(format!("Counter: {:+.2}", anim.input_counter));
            ui.label("|");

            if cfg.marker {
                ui.label(format!(
                    "Marker: ({:.0}°, {:.0}°)",
                    anim.marker_u, anim.marker_v
                ));
                ui.label("|");
            }

            ui.label(format!("Scale: {:.2}", anim.scale));
            ui.label("|");
            ui.label(format!("Yaw: {:.1}°", orbit.yaw));
            ui.label("|");
            ui.label(format!("Pitch: {:.1}°", orbit.pitch));

            if *show_fps {
                ui.label("|");
                ui.label(
                    egui::RichText::new(format!("FPS: {:.1}", fps)).color(egui::Color32::GREEN),
                );
            }
        });
    });
}
