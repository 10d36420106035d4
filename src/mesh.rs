// mesh.rs — 三角带网格生成

use serde::Deserialize;

use crate::surface;

pub const U_END_DEG: f64 = 360.0;
pub const V_END_DEG: f64 = 90.0;

/// 顶点法线的两种算法，单次构建只能用其一。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalMethod {
    /// 差分偏导叉积（见 surface::normal）
    Derivative,
    /// 网格单元四角点两次叉积，低精度大步长用
    QuadCorner,
}

#[derive(Debug, Clone)]
pub struct GridOptions {
    pub u_step: f64,
    pub v_step: f64,
    pub normals: NormalMethod,
    pub tex_coords: bool,
    pub delta_deg: f64,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            u_step: 5.0,
            v_step: 5.0,
            normals: NormalMethod::QuadCorner,
            tex_coords: false,
            delta_deg: surface::DEFAULT_DELTA_DEG,
        }
    }
}

/// 展平的属性数组，插入顺序即 TRIANGLE_STRIP 拓扑顺序，不能重排。
#[derive(Debug, Clone, Default)]
pub struct SurfaceMesh {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub tex_coords: Option<Vec<f32>>,
}

impl SurfaceMesh {
    /// draw 调用的顶点数（positions 长度 / 3）。
    pub fn vertex_count(&self) -> u32 {
        (self.positions.len() / 3) as u32
    }
}

/// 按固定步长扫 (u, v) 参数网格，每个单元压入 (u, v) 和 (u+Δu, v) 两个顶点，
/// 沿 v 行连成三角带。
///
/// 循环上界是 u < 360 + Δu（v 同理），闭合采样点 360° 会被包含；
/// 步长除不尽时行列会越过域末端，已知怪癖，刻意不修。
pub fn build_grid(opts: &GridOptions) -> SurfaceMesh {
    let u_end = U_END_DEG + opts.u_step;
    let v_end = V_END_DEG + opts.v_step;

    let mut mesh = SurfaceMesh::default();
    if opts.tex_coords {
        mesh.tex_coords = Some(Vec::new());
    }

    let mut u = 0.0;
    while u < u_end {
        let mut v = 0.0;
        while v < v_end {
            push_point(&mut mesh.positions, surface::position(u, v));
            push_point(&mut mesh.positions, surface::position(u + opts.u_step, v));

            match opts.normals {
                NormalMethod::Derivative => {
                    push_point(&mut mesh.normals, surface::normal(u, v, opts.delta_deg));
                    push_point(
                        &mut mesh.normals,
                        surface::normal(u + opts.u_step, v, opts.delta_deg),
                    );
                }
                NormalMethod::QuadCorner => {
                    let (n0, n1) = quad_corner_normals(u, v, opts.u_step, opts.v_step);
                    push_point(&mut mesh.normals, n0);
                    push_point(&mut mesh.normals, n1);
                }
            }

            if let Some(tc) = mesh.tex_coords.as_mut() {
                // 参数域线性归一化，不做弧长修正
                tc.push((u / U_END_DEG) as f32);
                tc.push((v / V_END_DEG) as f32);
                tc.push(((u + opts.u_step) / U_END_DEG) as f32);
                tc.push((v / V_END_DEG) as f32);
            }

            v += opts.v_step;
        }
        u += opts.u_step;
    }

    mesh
}

// 单元四角 p0..p3：
// 顶点 0 取 cross(p2-p0, p1-p0)，顶点 1 取 cross(p0-p1, p3-p1)
fn quad_corner_normals(u: f64, v: f64, du: f64, dv: f64) -> ([f64; 3], [f64; 3]) {
    let p0 = surface::position(u, v);
    let p1 = surface::position(u + du, v);
    let p2 = surface::position(u, v + dv);
    let p3 = surface::position(u + du, v + dv);

    let n0 = surface::cross(surface::sub(p2, p0), surface::sub(p1, p0));
    let n1 = surface::cross(surface::sub(p0, p1), surface::sub(p3, p1));
    (n0, n1)
}

fn push_point(out: &mut Vec<f32>, p: [f64; 3]) {
    out.push(p[0] as f32);
    out.push(p[1] as f32);
    out.push(p[2] as f32);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(u_step: f64, v_step: f64) -> GridOptions {
        GridOptions {
            u_step,
            v_step,
            ..GridOptions::default()
        }
    }

    // 步长整除时：2 · (360/Δu + 1) · (90/Δv + 1)
    fn expected_count(u_step: f64, v_step: f64) -> u32 {
        let cols = (U_END_DEG / u_step).floor() as u32 + 1;
        let rows = (V_END_DEG / v_step).floor() as u32 + 1;
        2 * cols * rows
    }

    #[test]
    fn test_vertex_count_even_steps() {
        for &(us, vs) in &[(5.0, 5.0), (1.0, 1.0), (5.0, 1.0), (10.0, 9.0)] {
            let mesh = build_grid(&opts(us, vs));
            assert_eq!(mesh.vertex_count(), expected_count(us, vs), "step {us}/{vs}");
            assert_eq!(mesh.normals.len(), mesh.positions.len());
        }
    }

    #[test]
    fn test_first_cell_vertex_order() {
        let mesh = build_grid(&opts(5.0, 5.0));
        let p0 = surface::position(0.0, 0.0);
        let p1 = surface::position(5.0, 0.0);
        for i in 0..3 {
            assert!((mesh.positions[i] as f64 - p0[i]).abs() < 1e-6);
            assert!((mesh.positions[3 + i] as f64 - p1[i]).abs() < 1e-6);
        }
        // 第一个顶点正是原点
        assert_eq!(&mesh.positions[..3], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_closing_column_reaches_360() {
        // 最后一列的首顶点在 u = 360°，与 u = 0° 的采样重合（闭合接缝）
        let mesh = build_grid(&opts(5.0, 5.0));
        let rows = (V_END_DEG / 5.0) as usize + 1;
        let last_col_first = (mesh.vertex_count() as usize - rows * 2) * 3;
        let seam = &mesh.positions[last_col_first..last_col_first + 3];
        let p = surface::position(360.0, 0.0);
        for i in 0..3 {
            assert!((seam[i] as f64 - p[i]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_uneven_step_overshoots_not_fixed() {
        // Δ = 7° 不整除：u 采样到 364°、v 采样到 91°（上界 < end+Δ 的语义），
        // 列数 53、行数 14，钉住而非修正
        let mesh = build_grid(&opts(7.0, 7.0));
        assert_eq!(mesh.vertex_count(), 2 * 53 * 14);
    }

    #[test]
    fn test_tex_coords_linear_normalization() {
        let o = GridOptions {
            tex_coords: true,
            ..opts(5.0, 5.0)
        };
        let mesh = build_grid(&o);
        let tc = mesh.tex_coords.as_ref().unwrap();
        assert_eq!(tc.len() as u32, mesh.vertex_count() * 2);
        // 单元 (0, 0)：(0, 0) 和 (5/360, 0)
        assert_eq!(&tc[..2], &[0.0, 0.0]);
        assert!((tc[2] - (5.0 / 360.0) as f32).abs() < 1e-7);
        assert_eq!(tc[3], 0.0);
    }

    #[test]
    fn test_tex_coords_absent_by_default() {
        let mesh = build_grid(&opts(5.0, 5.0));
        assert!(mesh.tex_coords.is_none());
    }

    #[test]
    fn test_normal_methods_both_full_length() {
        for method in [NormalMethod::Derivative, NormalMethod::QuadCorner] {
            let o = GridOptions {
                normals: method,
                ..opts(5.0, 5.0)
            };
            let mesh = build_grid(&o);
            assert_eq!(mesh.normals.len(), mesh.positions.len());
            // v > 0 的行里法线不应为零向量
            let row1 = 6; // 第二个单元 (u=0, v=5) 的首法线
            let n = &mesh.normals[row1..row1 + 3];
            let mag = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            assert!(mag > 0.0 && mag.is_finite());
        }
    }
}
