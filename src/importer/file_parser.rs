// ==========================================
// ACA 普查导入 - 分词器实现
// ==========================================
// 阶段 0: 文件读取与分词
// 格式: UTF-8，首行为逗号分隔表头，引号字符 `"`，双写转义
// ==========================================
// 规则:
// - 行边界 `\n` / `\r\n`；引号内的逗号与换行属于字段内容
// - 引号内 `""` 为字面引号，扫描器一次越过两个字符
// - 每个字段 TRIM 后去掉一层包裹引号（表头同样处理），转义引号只还原一次
// - 引号内的 `\r\n` 原样保留
// - TRIM 后为空的行整行跳过，不计入总行数
// - 字段少于表头时，缺失位置取空串
// ==========================================

use crate::domain::record::Row;
use crate::importer::error::ImportError;
use crate::importer::record_importer_trait::FileParser;
use std::path::Path;
use tracing::debug;

// ==========================================
// 分词结果
// ==========================================

/// 单条数据行
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub line_number: usize,     // 记录起始物理行号（表头为第 1 行）
    pub row: Row,               // 表头标签 → 原始值
    pub defect: Option<String>, // 结构缺陷（如引号未闭合），由调用方转为 Parsing 错误
}

/// 整个文件的分词结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFile {
    pub headers: Vec<String>,
    pub rows: Vec<ParsedRow>,
}

impl ParsedFile {
    /// 无表头或无数据行
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() || self.rows.is_empty()
    }
}

// 扫描器内部记录
struct RawRecord {
    line_number: usize,
    fields: Vec<String>,
    unterminated_quote: bool,
}

// ==========================================
// CSV Tokenizer 实现
// ==========================================
pub struct CsvTokenizer;

impl FileParser for CsvTokenizer {
    fn parse_text(&self, text: &str) -> ParsedFile {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut records = scan_records(text).into_iter();

        let header = match records.next() {
            Some(h) => h,
            None => return ParsedFile::default(),
        };
        let headers = header.fields;

        let rows: Vec<ParsedRow> = records
            .map(|record| {
                let mut row = Row::with_capacity(headers.len());
                for (idx, label) in headers.iter().enumerate() {
                    let value = record.fields.get(idx).cloned().unwrap_or_default();
                    row.insert(label.clone(), value);
                }
                ParsedRow {
                    line_number: record.line_number,
                    row,
                    defect: record
                        .unterminated_quote
                        .then(|| "引号未闭合，字段延续至文件末尾".to_string()),
                }
            })
            .collect();

        if rows.is_empty() {
            // 只有表头：视为空文件
            return ParsedFile::default();
        }

        debug!(headers = headers.len(), rows = rows.len(), "分词完成");
        ParsedFile { headers, rows }
    }
}

/// 逐字符扫描，切分记录与字段
fn scan_records(text: &str) -> Vec<RawRecord> {
    let mut records = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_content = false;
    let mut line = 1usize;
    let mut record_start = 1usize;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                has_content = true;
                if in_quotes && chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    // 定界引号保留在原始字段中，由 finish_field 剥掉
                    in_quotes = !in_quotes;
                    current.push('"');
                }
            }
            ',' if !in_quotes => {
                has_content = true;
                fields.push(finish_field(&current));
                current.clear();
            }
            '\r' if !in_quotes && chars.peek() == Some(&'\n') => {
                // CRLF: 由后续 `\n` 处理
            }
            '\n' if in_quotes => {
                current.push('\n');
                line += 1;
            }
            '\n' => {
                fields.push(finish_field(&current));
                current.clear();
                if has_content {
                    records.push(RawRecord {
                        line_number: record_start,
                        fields: std::mem::take(&mut fields),
                        unterminated_quote: false,
                    });
                } else {
                    fields.clear();
                }
                has_content = false;
                line += 1;
                record_start = line;
            }
            other => {
                if !other.is_whitespace() {
                    has_content = true;
                }
                current.push(other);
            }
        }
    }

    if has_content {
        fields.push(finish_field(&current));
        records.push(RawRecord {
            line_number: record_start,
            fields,
            unterminated_quote: in_quotes,
        });
    }

    records
}

/// TRIM + 去掉一层包裹引号（首尾同时为 `"` 时）
///
/// 引号内的 `""` 在扫描时已还原为单个引号，这里只剥定界符
fn finish_field(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}

/// 读取源文件为 UTF-8 文本
pub fn read_source(path: &Path) -> Result<String, ImportError> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    let bytes = std::fs::read(path)?;
    String::from_utf8(bytes)
        .map_err(|e| ImportError::FileReadError(format!("{}: 非 UTF-8 编码 ({})", path.display(), e)))
}
