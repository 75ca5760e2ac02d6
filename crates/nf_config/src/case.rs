// crates/nf_config/src/case.rs

//! 类型化算例模型
//!
//! 把解析后的块装配为 [`CaseFile`]：`general` 顶层块、各求解器
//! 自己的块（`piso` / `diffusion` / `transport` / `potential`）
//! 与 `controls` 块。每个块有键白名单，未知键致命。

use crate::error::{ConfigError, ConfigResult};
use crate::parse::{Block, CaseText};
use nf_core::controls::{Controls, ConvectionScheme, PreconditionerKind, TimeState};
use nf_foundation::{Scalar, Vector};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 求解器种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverKind {
    /// PISO 压力-速度耦合
    Piso,
    /// 纯扩散
    Diffusion,
    /// 标量输运
    Transport,
    /// 势流初始化
    Potential,
}

impl SolverKind {
    /// 大小写不敏感解析
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PISO" => Some(Self::Piso),
            "DIFFUSION" => Some(Self::Diffusion),
            "TRANSPORT" => Some(Self::Transport),
            "POTENTIAL" => Some(Self::Potential),
            _ => None,
        }
    }
}

/// 湍流模型种类（配置层名称；模型状态在求解器层构建）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TurbulenceKind {
    /// 层流
    #[default]
    None,
    /// 混合长度代数模型
    MixingLength,
    /// 标准 k-ε
    KEpsilon,
    /// RNG k-ε
    RngKEpsilon,
    /// Realizable k-ε
    RealizableKEpsilon,
    /// k-ω
    KOmega,
    /// Smagorinsky 大涡模拟
    Les,
}

impl TurbulenceKind {
    /// 大小写不敏感解析
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "NONE" => Some(Self::None),
            "MIXING_LENGTH" => Some(Self::MixingLength),
            "KE" => Some(Self::KEpsilon),
            "RNG_KE" => Some(Self::RngKEpsilon),
            "REALIZABLE_KE" => Some(Self::RealizableKEpsilon),
            "KW" => Some(Self::KOmega),
            "LES" => Some(Self::Les),
            _ => None,
        }
    }
}

/// `general` 块
#[derive(Debug, Clone)]
pub struct GeneralBlock {
    /// 求解器
    pub solver: SolverKind,
    /// 网格目录前缀
    pub mesh: PathBuf,
    /// 密度
    pub rho: Scalar,
    /// 运动黏度
    pub viscosity: Scalar,
    /// 热导率
    pub conductivity: Scalar,
    /// 重力
    pub gravity: Vector,
    /// 探针位置
    pub probes: Vec<Vector>,
}

/// `piso` 块
#[derive(Debug, Clone)]
pub struct PisoBlock {
    /// 速度欠松弛因子
    pub velocity_ur: Scalar,
    /// 压力欠松弛因子
    pub pressure_ur: Scalar,
    /// PISO 校正次数
    pub n_piso: usize,
    /// 非正交修正次数
    pub n_ortho: usize,
    /// 延迟修正外循环次数
    pub n_deferred: usize,
    /// 湍流模型
    pub turbulence_model: TurbulenceKind,
    /// 是否累计 LES 统计
    pub les_average: bool,
}

impl Default for PisoBlock {
    fn default() -> Self {
        Self {
            velocity_ur: 0.8,
            pressure_ur: 0.5,
            n_piso: 1,
            n_ortho: 0,
            n_deferred: 0,
            turbulence_model: TurbulenceKind::None,
            les_average: false,
        }
    }
}

/// `diffusion` / `transport` 共用块
#[derive(Debug, Clone)]
pub struct ScalarBlock {
    /// 扩散系数 DT
    pub dt_coeff: Scalar,
    /// 欠松弛因子
    pub t_ur: Scalar,
    /// 延迟修正外循环次数
    pub n_deferred: usize,
}

impl Default for ScalarBlock {
    fn default() -> Self {
        Self {
            dt_coeff: 1.0,
            t_ur: 1.0,
            n_deferred: 0,
        }
    }
}

/// `potential` 块
#[derive(Debug, Clone, Default)]
pub struct PotentialBlock {
    /// 非正交修正次数
    pub n_ortho: usize,
}

/// 完整算例
#[derive(Debug, Clone)]
pub struct CaseFile {
    /// 顶层块
    pub general: GeneralBlock,
    /// 控制块
    pub controls: Controls,
    /// PISO 块
    pub piso: PisoBlock,
    /// 标量求解器块
    pub scalar: ScalarBlock,
    /// 势流块
    pub potential: PotentialBlock,
}

impl CaseFile {
    /// 从文件读取并装配
    pub fn load(path: &std::path::Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let case = Self::from_text(&text)?;
        log::info!(
            "算例装配完成: solver={:?}, mesh={}, {:?} 至步 {}",
            case.general.solver,
            case.general.mesh.display(),
            case.controls.state,
            case.controls.end_step
        );
        Ok(case)
    }

    /// 从文本装配
    pub fn from_text(text: &str) -> ConfigResult<Self> {
        let parsed = CaseText::parse(text)?;

        let general = parsed.block("general").ok_or(ConfigError::MissingKey {
            block: "general".to_string(),
            key: "(块本身)".to_string(),
        })?;
        general.check_keys(&[
            "solver",
            "mesh",
            "rho",
            "viscosity",
            "conductivity",
            "gravity",
            "probe",
        ])?;

        let solver = general.enum_or("solver", SolverKind::Piso, SolverKind::parse)?;
        if general.entry("solver").is_none() {
            return Err(ConfigError::MissingKey {
                block: "general".to_string(),
                key: "solver".to_string(),
            });
        }

        let mut probes = Vec::new();
        for e in general.entries_of("probe") {
            if e.values.len() != 3 {
                return Err(ConfigError::BadValue {
                    block: "general".to_string(),
                    key: "probe".to_string(),
                    reason: "期望 3 个坐标".to_string(),
                });
            }
            let mut c = [0.0; 3];
            for (i, v) in e.values.iter().enumerate() {
                c[i] = v.parse().map_err(|_| ConfigError::BadValue {
                    block: "general".to_string(),
                    key: "probe".to_string(),
                    reason: "坐标不可解析".to_string(),
                })?;
            }
            probes.push(Vector::new(c[0], c[1], c[2]));
        }

        let general = GeneralBlock {
            solver,
            mesh: PathBuf::from(general.string("mesh")?),
            rho: general.scalar_or("rho", 1.0)?,
            viscosity: general.scalar_or("viscosity", 1e-5)?,
            conductivity: general.scalar_or("conductivity", 1e-4)?,
            gravity: general.vector_or("gravity", Vector::new(0.0, 0.0, -9.81))?,
            probes,
        };

        let controls = match parsed.block("controls") {
            Some(b) => read_controls(b)?,
            None => Controls::default(),
        };

        let piso = match parsed.block("piso") {
            Some(b) => {
                b.check_keys(&[
                    "velocity_UR",
                    "pressure_UR",
                    "n_PISO",
                    "n_ORTHO",
                    "n_DEFERRED",
                    "turbulence_model",
                    "les_average",
                ])?;
                PisoBlock {
                    velocity_ur: b.scalar_or("velocity_UR", 0.8)?,
                    pressure_ur: b.scalar_or("pressure_UR", 0.5)?,
                    n_piso: b.usize_or("n_PISO", 1)?,
                    n_ortho: b.usize_or("n_ORTHO", 0)?,
                    n_deferred: b.usize_or("n_DEFERRED", 0)?,
                    turbulence_model: b.enum_or(
                        "turbulence_model",
                        TurbulenceKind::None,
                        TurbulenceKind::parse,
                    )?,
                    les_average: b.bool_or("les_average", false)?,
                }
            }
            None => PisoBlock::default(),
        };

        let scalar_block = |name: &str| -> ConfigResult<Option<ScalarBlock>> {
            match parsed.block(name) {
                Some(b) => {
                    b.check_keys(&["DT", "t_UR", "n_DEFERRED"])?;
                    Ok(Some(ScalarBlock {
                        dt_coeff: b.scalar_or("DT", 1.0)?,
                        t_ur: b.scalar_or("t_UR", 1.0)?,
                        n_deferred: b.usize_or("n_DEFERRED", 0)?,
                    }))
                }
                None => Ok(None),
            }
        };
        let scalar = scalar_block("diffusion")?
            .or(scalar_block("transport")?)
            .unwrap_or_default();

        let potential = match parsed.block("potential") {
            Some(b) => {
                b.check_keys(&["n_ORTHO"])?;
                PotentialBlock {
                    n_ortho: b.usize_or("n_ORTHO", 0)?,
                }
            }
            None => PotentialBlock::default(),
        };

        Ok(Self {
            general,
            controls,
            piso,
            scalar,
            potential,
        })
    }
}

fn read_controls(b: &Block) -> ConfigResult<Controls> {
    b.check_keys(&[
        "start_step",
        "end_step",
        "write_interval",
        "dt",
        "state",
        "time_scheme_factor",
        "tolerance",
        "max_iterations",
        "preconditioner",
        "scheme",
        "scheme_*",
    ])?;

    let mut c = Controls {
        start_step: b.usize_or("start_step", 0)?,
        end_step: b.usize_or("end_step", 1)?,
        write_interval: b.usize_or("write_interval", 1)?,
        dt: b.scalar_or("dt", 1.0)?,
        state: b.enum_or("state", TimeState::Steady, TimeState::parse)?,
        time_scheme_factor: b.scalar_or("time_scheme_factor", 1.0)?,
        tolerance: b.scalar_or("tolerance", 1e-8)?,
        max_iterations: b.usize_or("max_iterations", 1000)?,
        preconditioner: b.enum_or(
            "preconditioner",
            PreconditionerKind::Jacobi,
            PreconditionerKind::parse,
        )?,
        ..Controls::default()
    };

    c.default_scheme = b.enum_or("scheme", ConvectionScheme::Upwind, ConvectionScheme::parse)?;
    for e in &b.entries {
        if let Some(field) = e.key.strip_prefix("scheme_") {
            let scheme =
                ConvectionScheme::parse(&e.values[0]).ok_or_else(|| ConfigError::BadValue {
                    block: b.name.clone(),
                    key: e.key.clone(),
                    reason: format!("未知格式: {}", e.values[0]),
                })?;
            c.schemes.insert(field.to_string(), scheme);
        }
    }

    if c.end_step < c.start_step {
        return Err(ConfigError::BadValue {
            block: "controls".to_string(),
            key: "end_step".to_string(),
            reason: "end_step 不能小于 start_step".to_string(),
        });
    }
    if c.write_interval == 0 {
        return Err(ConfigError::BadValue {
            block: "controls".to_string(),
            key: "write_interval".to_string(),
            reason: "write_interval 必须为正".to_string(),
        });
    }

    Ok(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nf_core::controls::Limiter;

    const CASE: &str = r#"
general {
    solver PISO;
    mesh cavity/grid;
    rho 1.0;
    viscosity 1e-3;
    probe 0.5 0.5 0.05;
}
piso {
    velocity_UR 0.7;
    pressure_UR 0.3;
    n_PISO 2;
    turbulence_model ke;
    les_average NO;
}
controls {
    state steady;
    end_step 200;
    write_interval 50;
    tolerance 1e-9;
    scheme upwind;
    scheme_U vanleer;
}
"#;

    #[test]
    fn test_full_case_assembly() {
        let case = CaseFile::from_text(CASE).unwrap();
        assert_eq!(case.general.solver, SolverKind::Piso);
        assert_eq!(case.general.mesh, PathBuf::from("cavity/grid"));
        assert_eq!(case.piso.n_piso, 2);
        assert_eq!(case.piso.turbulence_model, TurbulenceKind::KEpsilon);
        assert_eq!(case.controls.end_step, 200);
        assert_eq!(
            case.controls.scheme_for("U"),
            ConvectionScheme::Tvd(Limiter::VanLeer)
        );
        assert_eq!(case.controls.scheme_for("T"), ConvectionScheme::Upwind);
        assert_eq!(case.general.probes.len(), 1);
    }

    #[test]
    fn test_unknown_key_fatal() {
        let err = CaseFile::from_text("general { solver piso; mesh m; oops 1; }").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey { .. }));
    }

    #[test]
    fn test_missing_solver_fatal() {
        let err = CaseFile::from_text("general { mesh m; }").unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { .. }));
    }

    #[test]
    fn test_bad_enum_fatal() {
        let err =
            CaseFile::from_text("general { solver piso; mesh m; }\ncontrols { state sorta; }")
                .unwrap_err();
        assert!(matches!(err, ConfigError::BadValue { .. }));
    }

    #[test]
    fn test_transport_block_shared_shape() {
        let case = CaseFile::from_text(
            "general { solver transport; mesh m; }\ntransport { DT 4e-2; t_UR 0.9; }",
        )
        .unwrap();
        assert_eq!(case.general.solver, SolverKind::Transport);
        assert!((case.scalar.dt_coeff - 4e-2).abs() < 1e-15);
        assert!((case.scalar.t_ur - 0.9).abs() < 1e-15);
    }
}
