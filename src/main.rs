// ==========================================
// ACA 普查导入 - 命令行入口
// ==========================================
// 用法: aca-census-import <FILE> --entity-type <TYPE> [选项]
// 输出: stdout 打印导入结果 JSON；日志写 stderr
// 退出码: 管道跑完为 0（即使有失败行）；致命错误为 1
// ==========================================

use aca_census_import::api::ImportApi;
use aca_census_import::config::ImportConfig;
use aca_census_import::importer::write_errors_csv;
use aca_census_import::logging::{self, LogFormat};
use aca_census_import::perf::PerfGuard;
use aca_census_import::{db, APP_NAME, VERSION};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "aca-census-import",
    version,
    about = "ACA census import - load census/plan/enrollment/hours CSV files",
    long_about = "Load a CSV file of one entity type, validate every row against its schema,\n\
                  and upsert valid records into the local SQLite store.\n\n\
                  Row-level failures are reported in the JSON summary and never abort the run."
)]
struct Cli {
    /// CSV file to import.
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Entity type of the file (e.g. EmployeeCensus, PlanMaster, PayrollHours).
    #[arg(long = "entity-type", short = 't', value_name = "TYPE")]
    entity_type: String,

    /// SQLite database path (default: ACA_IMPORT_DB_PATH or the user data directory).
    #[arg(long = "db", value_name = "PATH")]
    db: Option<PathBuf>,

    /// Rows per batch.
    #[arg(long = "batch-size", value_name = "N")]
    batch_size: Option<usize>,

    /// Maximum rows in flight within a batch.
    #[arg(long = "concurrency", value_name = "N")]
    concurrency: Option<usize>,

    /// Maximum sink attempts per row, including the first.
    #[arg(long = "max-attempts", value_name = "N")]
    max_attempts: Option<u32>,

    /// Linear backoff base in milliseconds (wait base x attempt between attempts).
    #[arg(long = "base-delay-ms", value_name = "MS")]
    base_delay_ms: Option<u64>,

    /// Timeout for a single sink call in milliseconds.
    #[arg(long = "call-timeout-ms", value_name = "MS")]
    call_timeout_ms: Option<u64>,

    /// Write failed rows to this CSV file.
    #[arg(long = "errors-csv", value_name = "PATH")]
    errors_csv: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long = "log-json")]
    log_json: bool,
}

impl Cli {
    /// 命令行覆写（叠加在 config_kv 之上）
    fn apply_overrides(&self, config: &mut ImportConfig) {
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(max_attempts) = self.max_attempts {
            config.max_attempts = max_attempts;
        }
        if let Some(base_delay_ms) = self.base_delay_ms {
            config.base_delay_ms = base_delay_ms;
        }
        if self.call_timeout_ms.is_some() {
            config.call_timeout_ms = self.call_timeout_ms;
        }
    }
}

// 单线程运行时: 批内并发靠 FuturesUnordered 交错，PerfGuard 的线程内 SQL 计数保持准确
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init_with_format(if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    });

    tracing::info!("{} v{}", APP_NAME, VERSION);

    // 获取数据库路径
    let db_path = match &cli.db {
        Some(path) => path.to_string_lossy().to_string(),
        None => db::get_default_db_path(),
    };
    db::ensure_parent_dir(&db_path)
        .with_context(|| format!("无法创建数据库目录: {}", db_path))?;
    tracing::info!(db_path = %db_path, "使用数据库");

    let api = ImportApi::open(&db_path, |config| cli.apply_overrides(config))
        .await
        .context("导入器初始化失败")?;

    let file_path = cli.file.to_string_lossy().to_string();
    let response = {
        let mut perf = PerfGuard::new("cli.import");
        let response = api.import_file(&file_path, &cli.entity_type).await;
        if let Some(summary) = response.summary() {
            perf.set_rows(summary.processed_rows);
        }
        response
    };

    println!("{}", serde_json::to_string_pretty(&response)?);

    if let (Some(path), Some(summary)) = (&cli.errors_csv, response.summary()) {
        if let Some(errors) = summary.errors.as_deref() {
            let written = write_errors_csv(errors, path)
                .with_context(|| format!("无法写入错误明细: {}", path.display()))?;
            tracing::info!(path = %path.display(), rows = written, "错误明细已导出");
        }
    }

    if !response.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
