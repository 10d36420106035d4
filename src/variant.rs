// variant.rs — 变体配置
//
// 四个演示变体共用一份显式参数，差异全部落在字段上：
//   步长 / 底色 / 法线算法 / 纹理 / 标记点 / 计数步进 / 光源装置
//
// 解析：
// - 内置预设表（basic / light / marker / textured）
// - 可选覆盖文件 assets/variants.json（exe 目录 -> 工作目录），
//   格式 { "<name>": { ...部分字段即可... } }
// - 选择：CLI --variant <name> / 环境变量 INVOLUTE_VARIANT / 默认 basic

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::mesh::NormalMethod;
use crate::state::LightPath;

/// 光源装置：固定平行光或沿抛物线运动的点光源。
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LightRig {
    /// 存的是反向光照方向（指向光源），上传前归一化
    Directional { dir: [f32; 3] },
    Animated { path: LightPath, amplitude: f64 },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct VariantConfig {
    pub u_step: f64,
    pub v_step: f64,
    pub color: [f32; 4],
    pub normals: NormalMethod,
    pub textured: bool,
    pub marker: bool,
    /// 每次方向键按下累加到 input_counter 的量
    pub counter_delta: f64,
    pub light: LightRig,
}

impl Default for VariantConfig {
    // basic 预设
    fn default() -> Self {
        Self {
            u_step: 5.0,
            v_step: 5.0,
            color: [0.5, 0.5, 0.5, 1.0],
            normals: NormalMethod::QuadCorner,
            textured: false,
            marker: false,
            counter_delta: 0.05,
            light: LightRig::Directional {
                dir: [0.5, 0.7, 1.0],
            },
        }
    }
}

/// 预设呈现顺序，由简到全。
pub const PRESET_ORDER: [&str; 4] = ["basic", "light", "marker", "textured"];

static PRESETS: Lazy<HashMap<&'static str, VariantConfig>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("basic", VariantConfig::default());
    m.insert(
        "light",
        VariantConfig {
            color: [0.8, 0.35, 0.2, 1.0],
            normals: NormalMethod::Derivative,
            light: LightRig::Animated {
                path: LightPath::OverheadBar,
                amplitude: 1.2,
            },
            ..VariantConfig::default()
        },
    );
    m.insert(
        "marker",
        VariantConfig {
            u_step: 1.0,
            v_step: 1.0,
            color: [0.2, 0.55, 0.35, 1.0],
            normals: NormalMethod::Derivative,
            marker: true,
            counter_delta: 0.1,
            light: LightRig::Animated {
                path: LightPath::FrontArc,
                amplitude: 2.0,
            },
            ..VariantConfig::default()
        },
    );
    m.insert(
        "textured",
        VariantConfig {
            u_step: 1.0,
            v_step: 1.0,
            color: [1.0, 1.0, 1.0, 1.0],
            normals: NormalMethod::Derivative,
            textured: true,
            marker: true,
            counter_delta: 0.1,
            light: LightRig::Animated {
                path: LightPath::FrontArc,
                amplitude: 2.0,
            },
            ..VariantConfig::default()
        },
    );
    m
});

fn load_override_map(path: &Path) -> Option<HashMap<String, VariantConfig>> {
    let text = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&text) {
        Ok(map) => Some(map),
        Err(e) => {
            log::warn!("ignoring malformed {}: {}", path.display(), e);
            None
        }
    }
}

/// 查找 assets/variants.json：
/// 1) <exe_dir>/assets/variants.json
/// 2) ./assets/variants.json（开发工作目录）
fn find_override_file() -> Option<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let p = dir.join("assets").join("variants.json");
            if p.exists() {
                return Some(p);
            }
        }
    }

    let p = PathBuf::from("assets").join("variants.json");
    if p.exists() {
        return Some(p);
    }

    None
}

fn overrides() -> HashMap<String, VariantConfig> {
    find_override_file()
        .and_then(|p| load_override_map(&p))
        .unwrap_or_default()
}

/// 按名字取配置：覆盖文件优先于预设；名字未知回落到 basic 并告警。
pub fn resolve(name: &str) -> VariantConfig {
    if let Some(cfg) = overrides().remove(name) {
        return cfg;
    }
    if let Some(cfg) = PRESETS.get(name) {
        return cfg.clone();
    }
    log::warn!("unknown variant {:?}, falling back to basic", name);
    VariantConfig::default()
}

/// UI 列表用：预设按固定顺序在前，覆盖文件新增的名字排序后跟在后面。
pub fn available_names() -> Vec<String> {
    let mut names: Vec<String> = PRESET_ORDER.iter().map(|s| s.to_string()).collect();
    let mut extra: Vec<String> = overrides()
        .into_keys()
        .filter(|k| !PRESET_ORDER.contains(&k.as_str()))
        .collect();
    extra.sort();
    names.extend(extra);
    names
}

/// 选择变体名：CLI --variant <name> / INVOLUTE_VARIANT / 默认 basic。
pub fn resolve_name_from_args() -> String {
    let mut it = std::env::args();
    while let Some(a) = it.next() {
        if a == "--variant" {
            if let Some(v) = it.next() {
                return v;
            }
        }
    }

    if let Ok(v) = std::env::var("INVOLUTE_VARIANT") {
        if !v.trim().is_empty() {
            return v;
        }
    }

    "basic".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_resolve() {
        for name in PRESET_ORDER {
            let cfg = resolve(name);
            assert!(cfg.u_step > 0.0 && cfg.v_step > 0.0);
        }
        let basic = resolve("basic");
        assert_eq!(basic, VariantConfig::default());
        assert!(!basic.textured && !basic.marker);
    }

    #[test]
    fn test_unknown_name_falls_back_to_basic() {
        assert_eq!(resolve("no-such-variant"), VariantConfig::default());
    }

    #[test]
    fn test_preset_progression() {
        let marker = resolve("marker");
        assert!(marker.marker);
        assert_eq!(marker.u_step, 1.0);
        assert_eq!(marker.normals, NormalMethod::Derivative);
        assert_eq!(
            marker.light,
            LightRig::Animated {
                path: LightPath::FrontArc,
                amplitude: 2.0
            }
        );

        let textured = resolve("textured");
        assert!(textured.textured && textured.marker);
        assert_eq!(textured.color, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_partial_json_override_fills_defaults() {
        let json = r#"{
            "coarse": { "u_step": 15.0, "color": [1.0, 0.0, 0.0, 1.0] }
        }"#;
        let map: HashMap<String, VariantConfig> = serde_json::from_str(json).unwrap();
        let cfg = &map["coarse"];
        assert_eq!(cfg.u_step, 15.0);
        assert_eq!(cfg.v_step, 5.0); // 未给字段落到默认
        assert_eq!(cfg.normals, NormalMethod::QuadCorner);
    }

    #[test]
    fn test_light_rig_json_tags() {
        let json = r#"{
            "a": { "light": { "kind": "animated", "path": "front_arc", "amplitude": 2.0 } },
            "b": { "light": { "kind": "directional", "dir": [0.0, 1.0, 0.0] } }
        }"#;
        let map: HashMap<String, VariantConfig> = serde_json::from_str(json).unwrap();
        assert_eq!(
            map["a"].light,
            LightRig::Animated {
                path: LightPath::FrontArc,
                amplitude: 2.0
            }
        );
        assert_eq!(
            map["b"].light,
            LightRig::Directional {
                dir: [0.0, 1.0, 0.0]
            }
        );
    }

    #[test]
    fn test_available_names_start_with_presets() {
        let names = available_names();
        assert_eq!(&names[..4], &PRESET_ORDER.map(String::from));
    }
}
