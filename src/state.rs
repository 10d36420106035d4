// state.rs — 交互状态：输入计数器 / 标记点 / 缩放，外加相机轨道参数

use serde::Deserialize;

use crate::mesh::{U_END_DEG, V_END_DEG};
use crate::surface;

pub const SCALE_MIN: f64 = 0.5;
pub const SCALE_MAX: f64 = 2.0;

/// 点光源抛物线轨迹的两种形状（t = sin(counter) · k）。
/// 两套公式按命名形状各自保留，不往一个公式上并。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightPath {
    /// 定高横杆：(t, 6, -10 + t²)
    OverheadBar,
    /// 前方拱弧：(t, t², 20)
    FrontArc,
}

impl LightPath {
    pub fn eval(self, t: f64) -> [f64; 3] {
        match self {
            LightPath::OverheadBar => [t, 6.0, -10.0 + t * t],
            LightPath::FrontArc => [t, t * t, 20.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerAxis {
    U,
    V,
}

/// 按键事件同步驱动的小状态机，进程生存期内只创建一次、只被突变。
/// 派生量（光源位置、标记点世界坐标）每帧现算，不缓存。
#[derive(Debug, Clone)]
pub struct AnimationState {
    /// 无界累加，±delta 每次按键
    pub input_counter: f64,
    pub marker_u: f64,
    pub marker_v: f64,
    pub scale: f64,
}

impl AnimationState {
    pub fn new() -> Self {
        Self {
            input_counter: 0.0,
            marker_u: 0.0,
            marker_v: 0.0,
            scale: 1.0,
        }
    }

    pub fn advance_counter(&mut self, delta: f64) {
        self.input_counter += delta;
    }

    pub fn move_marker(&mut self, axis: MarkerAxis, delta: f64) {
        match axis {
            MarkerAxis::U => self.marker_u = (self.marker_u + delta).clamp(0.0, U_END_DEG),
            MarkerAxis::V => self.marker_v = (self.marker_v + delta).clamp(0.0, V_END_DEG),
        }
    }

    pub fn adjust_scale(&mut self, delta: f64) {
        self.scale = (self.scale + delta).clamp(SCALE_MIN, SCALE_MAX);
    }

    pub fn light_position(&self, path: LightPath, amplitude: f64) -> [f64; 3] {
        let t = self.input_counter.sin() * amplitude;
        path.eval(t)
    }

    pub fn marker_world_position(&self) -> [f64; 3] {
        surface::position(self.marker_u, self.marker_v)
    }
}

impl Default for AnimationState {
    fn default() -> Self {
        Self::new()
    }
}

/// 鼠标拖拽的轨道相机参数（外部协作者的最小实现）。
pub struct Orbit {
    pub yaw: f32,
    pub pitch: f32,
    pub sensitivity_scale: f32,
    pub is_fullscreen: bool,
}

impl Orbit {
    pub fn new() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            sensitivity_scale: 1.0,
            is_fullscreen: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_clamped_after_every_call() {
        let mut st = AnimationState::new();
        st.move_marker(MarkerAxis::U, -5.0);
        assert_eq!(st.marker_u, 0.0); // 边界处幂等
        st.move_marker(MarkerAxis::U, 10_000.0);
        assert_eq!(st.marker_u, 360.0);
        st.move_marker(MarkerAxis::V, 95.0);
        assert_eq!(st.marker_v, 90.0);
        st.move_marker(MarkerAxis::V, -200.0);
        assert_eq!(st.marker_v, 0.0);
    }

    #[test]
    fn test_marker_random_walk_stays_in_domain() {
        let mut st = AnimationState::new();
        let deltas = [3.0, -7.0, 40.0, -1.0, 400.0, -360.0, 5.0];
        for (i, &d) in deltas.iter().cycle().take(200).enumerate() {
            let axis = if i % 2 == 0 { MarkerAxis::U } else { MarkerAxis::V };
            st.move_marker(axis, d);
            assert!((0.0..=U_END_DEG).contains(&st.marker_u));
            assert!((0.0..=V_END_DEG).contains(&st.marker_v));
        }
    }

    #[test]
    fn test_scale_clamped() {
        let mut st = AnimationState::new();
        for _ in 0..30 {
            st.adjust_scale(0.1);
        }
        assert_eq!(st.scale, SCALE_MAX);
        for _ in 0..60 {
            st.adjust_scale(-0.1);
        }
        assert_eq!(st.scale, SCALE_MIN);
    }

    #[test]
    fn test_counter_unbounded() {
        let mut st = AnimationState::new();
        for _ in 0..1000 {
            st.advance_counter(0.1);
        }
        assert!((st.input_counter - 100.0).abs() < 1e-9);
        st.advance_counter(-1000.0);
        assert!(st.input_counter < 0.0);
    }

    #[test]
    fn test_light_position_matches_closed_form() {
        let mut st = AnimationState::new();
        for _ in 0..10 {
            st.advance_counter(0.05);
        }
        let t = 0.5f64.sin() * 1.2;
        let p = st.light_position(LightPath::OverheadBar, 1.2);
        assert!((p[0] - t).abs() < 1e-9);
        assert!((p[1] - 6.0).abs() < 1e-9);
        assert!((p[2] - (-10.0 + t * t)).abs() < 1e-9);

        let t2 = 0.5f64.sin() * 2.0;
        let p2 = st.light_position(LightPath::FrontArc, 2.0);
        assert!((p2[1] - t2 * t2).abs() < 1e-9);
        assert!((p2[2] - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_marker_world_position_on_surface() {
        let mut st = AnimationState::new();
        st.move_marker(MarkerAxis::U, 45.0);
        st.move_marker(MarkerAxis::V, 30.0);
        let p = st.marker_world_position();
        let q = surface::position(45.0, 30.0);
        assert_eq!(p, q);
    }
}
