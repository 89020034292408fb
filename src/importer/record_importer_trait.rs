// ==========================================
// ACA 普查导入 - 导入管道 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 阶段: 分词 → 行校验/规范化 → 落库分发（带重试）→ 汇总报告
// ==========================================

use crate::domain::record::{NormalizedRecord, Row};
use crate::domain::report::{ImportResult, RowError};
use crate::importer::error::ImportError;
use crate::importer::file_parser::ParsedFile;
use crate::importer::schema::Schema;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::Path;

// ==========================================
// RecordImporter Trait
// ==========================================
// 用途: 导入主接口
// 实现者: RecordImporterImpl
#[async_trait]
pub trait RecordImporter: Send + Sync {
    /// 从 CSV 文件导入一种实体类型的记录
    ///
    /// # 参数
    /// - file_path: CSV 文件路径
    /// - entity_type: 实体类型名称（如 "EmployeeCensus"）
    ///
    /// # 返回
    /// - Ok(ImportResult): 导入结果（逐行错误作为数据包含在内）
    /// - Err: 致命错误（文件不存在/为空、未知实体类型），此时不处理任何行
    async fn import_file<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        entity_type: &str,
    ) -> Result<ImportResult, ImportError>;

    /// 从内存文本导入（文件已由调用方读取）
    ///
    /// # 参数
    /// - file_name: 报告中使用的文件名
    /// - text: 文件全文
    /// - entity_type: 实体类型名称
    async fn import_text(
        &self,
        file_name: &str,
        text: &str,
        entity_type: &str,
    ) -> Result<ImportResult, ImportError>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 分词接口（阶段 0）
// 实现者: CsvTokenizer
pub trait FileParser: Send + Sync {
    /// 将全文切分为表头 + 数据行
    ///
    /// 全函数: 结构缺陷记录在 ParsedRow.defect 上，不中断分词
    fn parse_text(&self, text: &str) -> ParsedFile;
}

// ==========================================
// RowValidator Trait
// ==========================================
// 用途: 行校验与规范化接口（阶段 1）
// 实现者: SchemaRowValidator
pub trait RowValidator: Send + Sync {
    /// 按实体模式校验并规范化一行
    ///
    /// # 参数
    /// - schema: 实体模式
    /// - row: 原始行（表头标签 → 原始值）
    /// - row_number: 物理行号（用于错误定位）
    /// - today: 处理当天（缺省日期字段取值）
    ///
    /// # 返回
    /// - Ok(NormalizedRecord): 全部声明参数
    /// - Err(RowError): MissingField / Validation
    fn validate(
        &self,
        schema: &Schema,
        row: &Row,
        row_number: usize,
        today: NaiveDate,
    ) -> Result<NormalizedRecord, RowError>;
}
