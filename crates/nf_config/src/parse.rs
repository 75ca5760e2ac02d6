// crates/nf_config/src/parse.rs

//! 块语法解析
//!
//! 词法：空白分词；`#` 至行尾为注释。
//! 语法：`块名 { 键 值... ; 键 值... ; }` 的序列。
//! 同名键可重复出现（探针点等列表值），按出现顺序保留。

use crate::error::{ConfigError, ConfigResult};
use nf_foundation::{Scalar, Vector};

/// 一条键值记录
#[derive(Debug, Clone)]
pub struct Entry {
    /// 键名
    pub key: String,
    /// 值 token 序列（到分号为止）
    pub values: Vec<String>,
    /// 行号（诊断用）
    pub line: usize,
}

/// 一个命名块
#[derive(Debug, Clone)]
pub struct Block {
    /// 块名
    pub name: String,
    /// 记录序列
    pub entries: Vec<Entry>,
}

impl Block {
    /// 按键查找第一条记录
    pub fn entry(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// 键的所有记录（列表值）
    pub fn entries_of<'a, 'b>(&'a self, key: &'b str) -> impl Iterator<Item = &'a Entry> + use<'a, 'b> {
        self.entries.iter().filter(move |e| e.key == key)
    }

    fn bad_value(&self, key: &str, reason: impl Into<String>) -> ConfigError {
        ConfigError::BadValue {
            block: self.name.clone(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// 读取标量；缺失时返回默认值
    pub fn scalar_or(&self, key: &str, default: Scalar) -> ConfigResult<Scalar> {
        match self.entry(key) {
            None => Ok(default),
            Some(e) => e.values[0]
                .parse()
                .map_err(|_| self.bad_value(key, "期望实数")),
        }
    }

    /// 读取非负整数；缺失时返回默认值
    pub fn usize_or(&self, key: &str, default: usize) -> ConfigResult<usize> {
        match self.entry(key) {
            None => Ok(default),
            Some(e) => e.values[0]
                .parse()
                .map_err(|_| self.bad_value(key, "期望非负整数")),
        }
    }

    /// 读取布尔（YES/NO，大小写不敏感）；缺失时返回默认值
    pub fn bool_or(&self, key: &str, default: bool) -> ConfigResult<bool> {
        match self.entry(key) {
            None => Ok(default),
            Some(e) => match e.values[0].to_ascii_uppercase().as_str() {
                "YES" | "TRUE" | "ON" => Ok(true),
                "NO" | "FALSE" | "OFF" => Ok(false),
                other => Err(self.bad_value(key, format!("期望 YES/NO，得到 {}", other))),
            },
        }
    }

    /// 读取必需字符串
    pub fn string(&self, key: &str) -> ConfigResult<String> {
        self.entry(key)
            .map(|e| e.values.join(" "))
            .ok_or_else(|| ConfigError::MissingKey {
                block: self.name.clone(),
                key: key.to_string(),
            })
    }

    /// 读取三分量向量；缺失时返回默认值
    pub fn vector_or(&self, key: &str, default: Vector) -> ConfigResult<Vector> {
        match self.entry(key) {
            None => Ok(default),
            Some(e) => {
                if e.values.len() != 3 {
                    return Err(self.bad_value(key, "期望 3 个分量"));
                }
                let mut c = [0.0; 3];
                for (i, v) in e.values.iter().enumerate() {
                    c[i] = v.parse().map_err(|_| self.bad_value(key, "分量不可解析"))?;
                }
                Ok(Vector::new(c[0], c[1], c[2]))
            }
        }
    }

    /// 以解析函数读取枚举；缺失时返回默认值
    pub fn enum_or<E>(
        &self,
        key: &str,
        default: E,
        parse: impl Fn(&str) -> Option<E>,
    ) -> ConfigResult<E> {
        match self.entry(key) {
            None => Ok(default),
            Some(e) => parse(&e.values[0])
                .ok_or_else(|| self.bad_value(key, format!("未知枚举值: {}", e.values[0]))),
        }
    }

    /// 校验全部键都在白名单内（未知键致命）
    pub fn check_keys(&self, allowed: &[&str]) -> ConfigResult<()> {
        for e in &self.entries {
            if !allowed.contains(&e.key.as_str()) && !allowed.iter().any(|a| {
                a.ends_with('*') && e.key.starts_with(&a[..a.len() - 1])
            }) {
                return Err(ConfigError::UnknownKey {
                    block: self.name.clone(),
                    key: e.key.clone(),
                });
            }
        }
        Ok(())
    }
}

/// 解析后的算例文本
#[derive(Debug, Clone, Default)]
pub struct CaseText {
    /// 块序列
    pub blocks: Vec<Block>,
}

impl CaseText {
    /// 按名查块
    pub fn block(&self, name: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.name == name)
    }

    /// 解析文本
    pub fn parse(text: &str) -> ConfigResult<Self> {
        // 词法：{ 与 } 与 ; 作为独立 token，# 注释
        let mut tokens: Vec<(usize, String)> = Vec::new();
        for (lineno, raw) in text.lines().enumerate() {
            let line = match raw.find('#') {
                Some(i) => &raw[..i],
                None => raw,
            };
            let mut buf = String::new();
            for ch in line.chars() {
                match ch {
                    '{' | '}' | ';' => {
                        if !buf.is_empty() {
                            tokens.push((lineno + 1, std::mem::take(&mut buf)));
                        }
                        tokens.push((lineno + 1, ch.to_string()));
                    }
                    c if c.is_whitespace() => {
                        if !buf.is_empty() {
                            tokens.push((lineno + 1, std::mem::take(&mut buf)));
                        }
                    }
                    c => buf.push(c),
                }
            }
            if !buf.is_empty() {
                tokens.push((lineno + 1, buf));
            }
        }

        let mut blocks = Vec::new();
        let mut i = 0usize;
        while i < tokens.len() {
            let (line, name) = (&tokens[i].0, tokens[i].1.clone());
            if name == "{" || name == "}" || name == ";" {
                return Err(ConfigError::Syntax {
                    line: *line,
                    reason: format!("期望块名，得到 '{}'", name),
                });
            }
            i += 1;
            if i >= tokens.len() || tokens[i].1 != "{" {
                return Err(ConfigError::Syntax {
                    line: *line,
                    reason: format!("块 {} 后期望 '{{'", name),
                });
            }
            i += 1;

            let mut entries = Vec::new();
            loop {
                if i >= tokens.len() {
                    return Err(ConfigError::Syntax {
                        line: *line,
                        reason: format!("块 {} 未闭合", name),
                    });
                }
                if tokens[i].1 == "}" {
                    i += 1;
                    break;
                }
                // 记录: key values... ;
                let (key_line, key) = (tokens[i].0, tokens[i].1.clone());
                if key == ";" {
                    i += 1;
                    continue;
                }
                i += 1;
                let mut values = Vec::new();
                while i < tokens.len() && tokens[i].1 != ";" && tokens[i].1 != "}" {
                    if tokens[i].1 == "{" {
                        return Err(ConfigError::Syntax {
                            line: tokens[i].0,
                            reason: "记录内不允许嵌套块".to_string(),
                        });
                    }
                    values.push(tokens[i].1.clone());
                    i += 1;
                }
                if i >= tokens.len() || tokens[i].1 != ";" {
                    return Err(ConfigError::Syntax {
                        line: key_line,
                        reason: format!("键 {} 的记录缺少 ';'", key),
                    });
                }
                i += 1;
                if values.is_empty() {
                    return Err(ConfigError::Syntax {
                        line: key_line,
                        reason: format!("键 {} 没有值", key),
                    });
                }
                entries.push(Entry {
                    key,
                    values,
                    line: key_line,
                });
            }

            blocks.push(Block { name, entries });
        }

        Ok(Self { blocks })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
general {
    solver piso;          # 求解器
    mesh cavity/grid;
    rho 1.0;
    gravity 0 0 -9.81;
    probe 0.5 0.5 0.05;
    probe 0.1 0.9 0.05;
}
controls {
    state STEADY;
    end_step 100;
}
"#;

    #[test]
    fn test_parse_blocks_and_entries() {
        let case = CaseText::parse(SAMPLE).unwrap();
        assert_eq!(case.blocks.len(), 2);
        let g = case.block("general").unwrap();
        assert_eq!(g.string("solver").unwrap(), "piso");
        assert_eq!(g.scalar_or("rho", 0.0).unwrap(), 1.0);
        let grav = g.vector_or("gravity", Vector::ZERO).unwrap();
        assert_eq!(grav.z, -9.81);
        assert_eq!(g.entries_of("probe").count(), 2);
    }

    #[test]
    fn test_unclosed_block_is_syntax_error() {
        let err = CaseText::parse("general { rho 1.0;").unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { .. }));
    }

    #[test]
    fn test_missing_semicolon_is_syntax_error() {
        let err = CaseText::parse("general { rho 1.0 }").unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { .. }));
    }

    #[test]
    fn test_check_keys_rejects_unknown() {
        let case = CaseText::parse("general { rho 1.0; typo 2; }").unwrap();
        let g = case.block("general").unwrap();
        let err = g.check_keys(&["rho"]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey { .. }));
    }

    #[test]
    fn test_check_keys_wildcard_prefix() {
        let case = CaseText::parse("controls { scheme_U upwind; scheme_T vanleer; }").unwrap();
        let b = case.block("controls").unwrap();
        b.check_keys(&["scheme_*"]).unwrap();
    }

    #[test]
    fn test_bool_parse_case_insensitive() {
        let case = CaseText::parse("piso { les_average Yes; }").unwrap();
        let b = case.block("piso").unwrap();
        assert!(b.bool_or("les_average", false).unwrap());
    }
}
