// renderer.rs — wgpu 渲染器（三角带曲面 + 标记点公告牌）

use glam::{Mat4, Vec3};
use image::RgbaImage;
use thiserror::Error;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::mesh::SurfaceMesh;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// 初始化失败对本次会话不可恢复：调用方提示后直接退出，不做部分渲染。
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("failed to create rendering surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter found")]
    NoAdapter,
    #[error("failed to acquire GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
}

/// 每帧从交互状态推出的量，渲染器不持有任何业务状态。
#[derive(Debug, Clone, Copy)]
pub struct Scene {
    pub yaw_deg: f32,
    pub pitch_deg: f32,
    pub scale: f32,
    pub color: [f32; 4],
    /// xyz 为方向或位置；w = 0 平行光（反向光照方向），w = 1 点光源
    pub light: [f32; 4],
    /// xyz 为标记点世界坐标；w = 1 时绘制
    pub marker: [f32; 4],
    pub textured: bool,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Uniforms {
    mvp: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    normal_mat: [[f32; 4]; 4],
    light: [f32; 4],
    color: [f32; 4],
    marker: [f32; 4],
    // x = scale, y = textured
    params: [f32; 4],
}

struct MeshBuffers {
    positions: wgpu::Buffer,
    normals: wgpu::Buffer,
    tex_coords: wgpu::Buffer,
    vertex_count: u32,
}

pub struct Renderer {
    surface: wgpu::Surface,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,

    strip_pipeline: wgpu::RenderPipeline,
    marker_pipeline: wgpu::RenderPipeline,
    depth_view: wgpu::TextureView,

    mesh: MeshBuffers,

    // 纹理资源
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,

    // Uniform 资源
    uniforms: Uniforms,
    uniform_buffer: wgpu::Buffer,
    draw_marker: bool,

    // UI
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    pub async fn new(
        window: std::sync::Arc<Window>,
        mesh: &SurfaceMesh,
    ) -> Result<Self, RendererError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = unsafe { instance.create_surface(window.as_ref()) }?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RendererError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    features: wgpu::Features::empty(),
                    limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                    label: None,
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo, // VSync on
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let depth_view = create_depth_view(&device, size.width, size.height);

        // --- 1. Texture Setup（1×1 纯色占位，加载失败就一直用它）---
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        // --- 2. Uniform Setup ---
        let uniforms = Uniforms {
            mvp: Mat4::IDENTITY.to_cols_array_2d(),
            model: Mat4::IDENTITY.to_cols_array_2d(),
            normal_mat: Mat4::IDENTITY.to_cols_array_2d(),
            light: [0.0, 0.0, 1.0, 0.0],
            color: [0.5, 0.5, 0.5, 1.0],
            marker: [0.0; 4],
            params: [1.0, 0.0, 0.0, 0.0],
        };

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Uniforms"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        // Scene Uniforms
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        // Texture
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            view_dimension: wgpu::TextureViewDimension::D2,
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        // Sampler
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
                label: Some("scene_bind_group_layout"),
            });

        let placeholder = RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
        let texture_view = upload_texture(&device, &queue, &placeholder);
        let bind_group = create_scene_bind_group(
            &device,
            &bind_group_layout,
            &uniform_buffer,
            &texture_view,
            &sampler,
        );

        // --- 3. Pipeline Setup ---
        let shader = device.create_shader_module(wgpu::include_wgsl!("shader.wgsl"));
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        // 顶点属性分三个独立 buffer 存（位置 / 法线 / 纹理坐标）
        let vertex_layouts = [
            wgpu::VertexBufferLayout {
                array_stride: 12,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![0 => Float32x3],
            },
            wgpu::VertexBufferLayout {
                array_stride: 12,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![1 => Float32x3],
            },
            wgpu::VertexBufferLayout {
                array_stride: 8,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![2 => Float32x2],
            },
        ];

        let strip_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Surface Strip Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &vertex_layouts,
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                // 顶点序列直接作为三角带消费，无索引缓冲
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        let marker_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Marker Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_marker",
                buffers: &[], // 公告牌四角在 shader 内按 vertex_index 展开
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_marker",
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                // 标记点贴着曲面，负偏置避免与曲面深度打架
                bias: wgpu::DepthBiasState {
                    constant: -2,
                    slope_scale: 0.0,
                    clamp: 0.0,
                },
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        let mesh = create_mesh_buffers(&device, mesh);

        // --- 4. Egui Setup ---
        let egui_ctx = egui::Context::default();
        let mut egui_state = egui_winit::State::new(window.as_ref());
        egui_state.set_pixels_per_point(window.scale_factor() as f32);
        let egui_renderer = egui_wgpu::Renderer::new(&device, config.format, None, 1);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            strip_pipeline,
            marker_pipeline,
            depth_view,
            mesh,
            bind_group_layout,
            bind_group,
            sampler,
            uniforms,
            uniform_buffer,
            draw_marker: false,
            egui_ctx,
            egui_state,
            egui_renderer,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_view(&self.device, new_size.width, new_size.height);
        }
    }

    /// 变体切换后重新上传几何（帧间不会重建，动画只动 uniform）。
    pub fn upload_mesh(&mut self, mesh: &SurfaceMesh) {
        self.mesh = create_mesh_buffers(&self.device, mesh);
    }

    pub fn update_scene(&mut self, scene: &Scene) {
        let aspect = self.size.width as f32 / self.size.height as f32;
        // 矩阵链：perspective(π/8, ·, 8, 12) · translate(0,0,-10)
        //         · axisRot((0.707, 0.707, 0), 0.7) · 轨道旋转
        let projection = Mat4::perspective_rh(std::f32::consts::PI / 8.0, aspect, 8.0, 12.0);
        let orbit = Mat4::from_rotation_x(scene.pitch_deg.to_radians())
            * Mat4::from_rotation_y(scene.yaw_deg.to_radians());
        let tilt = Mat4::from_axis_angle(Vec3::new(0.707, 0.707, 0.0).normalize(), 0.7);
        let model = Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0)) * tilt * orbit;

        self.uniforms.mvp = (projection * model).to_cols_array_2d();
        self.uniforms.model = model.to_cols_array_2d();
        // 法线走 model 的逆转置
        self.uniforms.normal_mat = model.inverse().transpose().to_cols_array_2d();

        self.uniforms.light = scene.light;
        if scene.light[3] == 0.0 {
            let d = Vec3::new(scene.light[0], scene.light[1], scene.light[2]).normalize();
            self.uniforms.light = [d.x, d.y, d.z, 0.0];
        }

        self.uniforms.color = scene.color;
        self.uniforms.marker = scene.marker;
        self.uniforms.params = [scene.scale, scene.textured as u32 as f32, 0.0, 0.0];
        self.draw_marker = scene.marker[3] > 0.5;

        self.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[self.uniforms]),
        );
    }

    /// 纹理加载完成时换绑；加载失败走不到这里，占位色保持不变。
    pub fn load_texture(&mut self, img: RgbaImage) {
        let max_dim = self.device.limits().max_texture_dimension_2d;
        let (src_w, src_h) = img.dimensions();

        // 超出 GPU 上限就缩到限制内
        let img = if src_w > max_dim || src_h > max_dim {
            let scale = (max_dim as f32 / src_w.max(src_h) as f32).min(1.0);
            let new_w = (src_w as f32 * scale) as u32;
            let new_h = (src_h as f32 * scale) as u32;
            log::warn!(
                "texture {}x{} exceeds device limit {}, resizing to {}x{}",
                src_w,
                src_h,
                max_dim,
                new_w,
                new_h
            );
            image::DynamicImage::ImageRgba8(img)
                .resize(new_w, new_h, image::imageops::FilterType::Lanczos3)
                .to_rgba8()
        } else {
            img
        };

        let texture_view = upload_texture(&self.device, &self.queue, &img);
        self.bind_group = create_scene_bind_group(
            &self.device,
            &self.bind_group_layout,
            &self.uniform_buffer,
            &texture_view,
            &self.sampler,
        );
    }

    pub fn render_with_ui(
        &mut self,
        window: &Window,
        run_ui: impl FnOnce(&egui::Context),
    ) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // 1. Render Scene
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Surface Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                        store: true,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: true,
                    }),
                    stencil_ops: None,
                }),
            });

            render_pass.set_pipeline(&self.strip_pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.mesh.positions.slice(..));
            render_pass.set_vertex_buffer(1, self.mesh.normals.slice(..));
            render_pass.set_vertex_buffer(2, self.mesh.tex_coords.slice(..));
            render_pass.draw(0..self.mesh.vertex_count, 0..1);

            if self.draw_marker {
                render_pass.set_pipeline(&self.marker_pipeline);
                render_pass.draw(0..4, 0..1);
            }
        }

        // 2. Render UI
        let raw_input = self.egui_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, run_ui);

        self.egui_state
            .handle_platform_output(window, &self.egui_ctx, full_output.platform_output);
        let clipped_primitives = self.egui_ctx.tessellate(full_output.shapes);

        let screen_descriptor = egui_wgpu::renderer::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: window.scale_factor() as f32,
        };

        for (id, delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, delta);
        }

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &clipped_primitives,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });
            self.egui_renderer
                .render(&mut render_pass, &clipped_primitives, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        label: Some("depth_texture"),
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_mesh_buffers(device: &wgpu::Device, mesh: &SurfaceMesh) -> MeshBuffers {
    let vertex_count = mesh.vertex_count();

    let positions = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("surface_positions"),
        contents: bytemuck::cast_slice(&mesh.positions),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let normals = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("surface_normals"),
        contents: bytemuck::cast_slice(&mesh.normals),
        usage: wgpu::BufferUsages::VERTEX,
    });

    // 无纹理变体也绑零填充 buffer，管线布局保持统一
    let zeros;
    let uv_data: &[f32] = match &mesh.tex_coords {
        Some(tc) => tc,
        None => {
            zeros = vec![0.0f32; vertex_count as usize * 2];
            &zeros
        }
    };
    let tex_coords = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("surface_tex_coords"),
        contents: bytemuck::cast_slice(uv_data),
        usage: wgpu::BufferUsages::VERTEX,
    });

    MeshBuffers {
        positions,
        normals,
        tex_coords,
        vertex_count,
    }
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    img: &RgbaImage,
) -> wgpu::TextureView {
    let (width, height) = img.dimensions();
    let texture_size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        size: texture_size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        label: Some("diffuse_texture"),
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        img,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        texture_size,
    );

    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_scene_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    uniform_buffer: &wgpu::Buffer,
    texture_view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(texture_view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
        label: Some("scene_bind_group"),
    })
}
