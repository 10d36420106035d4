// surface.rs — 旋转曲面参数方程（圆渐开线式曲面，a = b = c = 1）

/// 有限差分步长（度）。太大截断误差明显，太小浮点相消。
pub const DEFAULT_DELTA_DEG: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    U,
    V,
}

/// (u, v) 角度参数 → 曲面上一点。u 以 360° 为周期，v 是真正的域坐标。
pub fn position(u_deg: f64, v_deg: f64) -> [f64; 3] {
    let u = u_deg.to_radians();
    let v = v_deg.to_radians();
    // 1 - cos² 在 u = 0 / 180 / 360 处可能被舍入到 0 以下，先夹取再开方
    let zz = (1.0 - u.cos() * u.cos()).max(0.0);
    [v * u.cos(), v * u.sin(), zz.sqrt()]
}

/// 前向差分偏导：(P(u+Δ, v) - P(u, v)) / rad(Δ)，V 轴同理。
pub fn partial(u_deg: f64, v_deg: f64, axis: Axis, delta_deg: f64) -> [f64; 3] {
    let p0 = position(u_deg, v_deg);
    let p1 = match axis {
        Axis::U => position(u_deg + delta_deg, v_deg),
        Axis::V => position(u_deg, v_deg + delta_deg),
    };
    let h = delta_deg.to_radians();
    [
        (p1[0] - p0[0]) / h,
        (p1[1] - p0[1]) / h,
        (p1[2] - p0[2]) / h,
    ]
}

/// 顶点法线 cross(dV, dU)，不归一化（上传/着色阶段再归一化）。
/// 操作数顺序决定朝向，交换会翻转背面剔除。
pub fn normal(u_deg: f64, v_deg: f64, delta_deg: f64) -> [f64; 3] {
    let du = partial(u_deg, v_deg, Axis::U, delta_deg);
    let dv = partial(u_deg, v_deg, Axis::V, delta_deg);
    cross(dv, du)
}

pub fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: [f64; 3], b: [f64; 3], eps: f64) {
        for i in 0..3 {
            assert!(
                (a[i] - b[i]).abs() < eps,
                "component {}: {} vs {}",
                i,
                a[i],
                b[i]
            );
        }
    }

    #[test]
    fn test_position_periodic_in_u() {
        let mut u = 0.0;
        while u <= 360.0 {
            assert_close(position(u, 45.0), position(u + 360.0, 45.0), 1e-9);
            u += 7.5;
        }
    }

    #[test]
    fn test_position_surface_equation_roundtrip() {
        let mut u = 0.0;
        while u <= 360.0 {
            let mut v = 0.0;
            while v <= 90.0 {
                let [_, _, z] = position(u, v);
                assert!(z >= 0.0);
                let cos_u = u.to_radians().cos();
                assert!((z * z - (1.0 - cos_u * cos_u)).abs() < 1e-9);
                v += 15.0;
            }
            u += 15.0;
        }
    }

    #[test]
    fn test_position_origin_and_axis_points() {
        assert_close(position(0.0, 0.0), [0.0, 0.0, 0.0], 1e-12);
        // u = 90°: cos u = 0, z = 1
        let p = position(90.0, 90.0);
        assert_close(p, [0.0, std::f64::consts::FRAC_PI_2, 1.0], 1e-9);
    }

    #[test]
    fn test_partial_matches_analytic_v_derivative() {
        // P 对 v 是线性的（x = v·cos u, y = v·sin u, z 与 v 无关），
        // 差分结果应精确等于 (cos u, sin u, 0)
        let u = 30.0f64;
        let d = partial(u, 40.0, Axis::V, DEFAULT_DELTA_DEG);
        let ur = u.to_radians();
        assert_close(d, [ur.cos(), ur.sin(), 0.0], 1e-6);
    }

    #[test]
    fn test_normal_nonzero_for_positive_v() {
        let mut u = 2.5;
        while u < 360.0 {
            let n = normal(u, 30.0, DEFAULT_DELTA_DEG);
            let mag = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            assert!(mag.is_finite());
            assert!(mag > 1e-9, "zero normal at u = {}", u);
            u += 5.0;
        }
    }

    #[test]
    fn test_normal_orientation_flips_with_operand_order() {
        let du = partial(45.0, 45.0, Axis::U, DEFAULT_DELTA_DEG);
        let dv = partial(45.0, 45.0, Axis::V, DEFAULT_DELTA_DEG);
        let n = normal(45.0, 45.0, DEFAULT_DELTA_DEG);
        let flipped = cross(du, dv);
        assert_close(n, [-flipped[0], -flipped[1], -flipped[2]], 1e-9);
    }

    #[test]
    fn test_normal_faces_camera_side() {
        // cross(dV, dU) 的 z 分量恒等于 rad(v)：约定朝向面向默认相机一侧
        for &(u, v) in &[(45.0, 45.0), (135.0, 30.0), (250.0, 80.0)] {
            let n = normal(u, v, DEFAULT_DELTA_DEG);
            let v_rad = f64::to_radians(v);
            assert!((n[2] - v_rad).abs() < 1e-6, "n = {:?} at u = {}", n, u);
        }
    }
}
