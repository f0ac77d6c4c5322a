// inspect.rs
// 结构检查器，计算嵌套JSON对象/数组的键结构，并可选地格式化输出，便于调试时查看数据形状。
use std::fmt;

use serde_json::Value;

/// 键结构中的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeKind {
    Key(String),
    ListOpen,
    ListClose,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeLine {
    pub depth: usize,
    pub kind: ShapeKind,
}

impl fmt::Display for ShapeLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indent = "  ".repeat(self.depth);
        match &self.kind {
            ShapeKind::Key(key) => write!(f, "{}{}", indent, key),
            ShapeKind::ListOpen => write!(f, "{}[", indent),
            ShapeKind::ListClose => write!(f, "{}]", indent),
        }
    }
}

/// 计算键结构
///
/// 对象的每个键按文档中的顺序占一行；值为对象时缩进一级递归；值为非空数组且首元素是对象或非空数组时，
/// 用 `[` `]` 包住对首元素的递归。标量不产生输出。
pub fn key_structure(value: &Value) -> Vec<ShapeLine> {
    let mut lines = Vec::new();
    walk(value, 0, &mut lines);
    lines
}

/// 把键结构格式化为文本，每级缩进两个空格
pub fn render(lines: &[ShapeLine]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&line.to_string());
        out.push('\n');
    }
    out
}

/// 打印键结构到标准输出
pub fn print_key_structure(value: &Value) {
    print!("{}", render(&key_structure(value)));
}

fn walk(value: &Value, depth: usize, lines: &mut Vec<ShapeLine>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                lines.push(ShapeLine {
                    depth,
                    kind: ShapeKind::Key(key.clone()),
                });
                match child {
                    Value::Object(_) => walk(child, depth + 1, lines),
                    Value::Array(items) => {
                        if let Some(first) = items.first().filter(|first| is_nested(first)) {
                            bracket(first, depth + 1, lines);
                        }
                    }
                    _ => {}
                }
            }
        }
        Value::Array(items) => {
            if let Some(first) = items.first().filter(|first| is_nested(first)) {
                bracket(first, depth, lines);
            }
        }
        _ => {}
    }
}

fn bracket(first: &Value, depth: usize, lines: &mut Vec<ShapeLine>) {
    lines.push(ShapeLine {
        depth,
        kind: ShapeKind::ListOpen,
    });
    walk(first, depth + 1, lines);
    lines.push(ShapeLine {
        depth,
        kind: ShapeKind::ListClose,
    });
}

// 对象，或非空数组
fn is_nested(value: &Value) -> bool {
    match value {
        Value::Object(_) => true,
        Value::Array(items) => !items.is_empty(),
        _ => false,
    }
}
