// ==========================================
// ACA 普查导入 - 性能埋点
// ==========================================
// - 落库连接 trace/profile: 语句计数 + 慢写入告警（target: slow_sql）
// - PerfGuard: 一次导入的耗时 / 语句数 / 吞吐汇总（target: perf）
// 计数为线程局部，命令行使用单线程运行时
// ==========================================

use rusqlite::Connection;
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// 环境变量: 强制开关语句埋点
pub const ENV_PERF_SQL: &str = "ACA_IMPORT_PERF_SQL";
/// 环境变量: 慢语句阈值（毫秒）
pub const ENV_SLOW_SQL_MS: &str = "ACA_IMPORT_SLOW_SQL_MS";

const SQL_LOG_MAX_CHARS: usize = 420;

static TRACE_ENABLED: AtomicBool = AtomicBool::new(false);
static SLOW_THRESHOLD_MS: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static ACTIVE_GUARDS: Cell<u32> = Cell::new(0);
    static STATEMENTS: Cell<u64> = Cell::new(0);
    static SLOW_STATEMENTS: Cell<u64> = Cell::new(0);
}

// ==========================================
// 埋点开关
// ==========================================

/// 语句埋点设置（来自环境变量）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlTraceSettings {
    pub enabled: bool,
    pub slow_threshold_ms: u64,
}

impl SqlTraceSettings {
    /// 读取环境变量
    ///
    /// # 默认值
    /// - enabled: Debug 构建开启，Release 关闭
    /// - slow_threshold_ms: Debug 50ms，Release 200ms
    pub fn from_env() -> Self {
        Self::resolve(
            std::env::var(ENV_PERF_SQL).ok().as_deref(),
            std::env::var(ENV_SLOW_SQL_MS).ok().as_deref(),
        )
    }

    fn resolve(enabled: Option<&str>, slow_ms: Option<&str>) -> Self {
        let enabled = enabled.map(is_truthy).unwrap_or(cfg!(debug_assertions));
        let slow_threshold_ms = slow_ms
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(if cfg!(debug_assertions) { 50 } else { 200 });
        Self {
            enabled,
            slow_threshold_ms,
        }
    }
}

fn is_truthy(v: &str) -> bool {
    matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

/// 日志用 SQL 摘要: 折叠换行，按字符截断
fn sql_excerpt(sql: &str, max_chars: usize) -> String {
    let flat = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &flat[..cut]),
        None => flat,
    }
}

/// 在落库连接上安装语句埋点
pub fn install_sqlite_tracing(conn: &mut Connection) {
    let settings = SqlTraceSettings::from_env();
    TRACE_ENABLED.store(settings.enabled, Ordering::Relaxed);

    if !settings.enabled {
        conn.trace(None);
        conn.profile(None);
        return;
    }

    SLOW_THRESHOLD_MS.store(settings.slow_threshold_ms, Ordering::Relaxed);
    conn.trace(Some(on_statement));
    conn.profile(Some(on_statement_finished));
}

fn guard_active() -> bool {
    ACTIVE_GUARDS.with(|d| d.get() > 0)
}

fn bump(counter: &'static std::thread::LocalKey<Cell<u64>>) {
    counter.with(|c| c.set(c.get().saturating_add(1)));
}

fn on_statement(_sql: &str) {
    if TRACE_ENABLED.load(Ordering::Relaxed) && guard_active() {
        bump(&STATEMENTS);
    }
}

fn on_statement_finished(sql: &str, duration: Duration) {
    if !TRACE_ENABLED.load(Ordering::Relaxed) {
        return;
    }

    let ms = duration.as_millis() as u64;
    let threshold = SLOW_THRESHOLD_MS.load(Ordering::Relaxed);
    if threshold == 0 || ms < threshold {
        return;
    }

    tracing::warn!(
        target: "slow_sql",
        duration_ms = ms,
        sql = %sql_excerpt(sql, SQL_LOG_MAX_CHARS),
        "落库语句过慢"
    );
    if guard_active() {
        bump(&SLOW_STATEMENTS);
    }
}

// ==========================================
// PerfGuard
// ==========================================

#[derive(Debug, Clone, Copy, Default)]
struct StatementCounts {
    statements: u64,
    slow_statements: u64,
}

impl StatementCounts {
    fn now() -> Self {
        Self {
            statements: STATEMENTS.with(|c| c.get()),
            slow_statements: SLOW_STATEMENTS.with(|c| c.get()),
        }
    }

    fn since(self, earlier: StatementCounts) -> Self {
        Self {
            statements: self.statements.saturating_sub(earlier.statements),
            slow_statements: self.slow_statements.saturating_sub(earlier.slow_statements),
        }
    }
}

/// 操作耗时汇总，drop 时输出一条 perf 日志
///
/// ```ignore
/// let mut perf = aca_census_import::perf::PerfGuard::new("cli.import");
/// // 导入...
/// perf.set_rows(result.processed_rows);
/// ```
pub struct PerfGuard {
    op: &'static str,
    start: Instant,
    baseline: StatementCounts,
    rows: Option<u64>,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        ACTIVE_GUARDS.with(|d| d.set(d.get().saturating_add(1)));
        Self {
            op,
            start: Instant::now(),
            baseline: StatementCounts::now(),
            rows: None,
        }
    }

    /// 记录成功落库行数（日志附带 rows_per_sec）
    pub fn set_rows(&mut self, rows: usize) {
        self.rows = Some(rows as u64);
    }
}

/// 每秒行数；耗时为 0 时按行数本身计
fn rows_per_sec(rows: u64, elapsed: Duration) -> u64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        (rows as f64 / secs) as u64
    } else {
        rows
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let counts = StatementCounts::now().since(self.baseline);
        let rows = self.rows.unwrap_or(0);

        tracing::info!(
            target: "perf",
            op = self.op,
            elapsed_ms = elapsed.as_millis() as u64,
            sql_count = counts.statements,
            slow_sql_count = counts.slow_statements,
            rows,
            rows_per_sec = rows_per_sec(rows, elapsed),
            "done"
        );

        ACTIVE_GUARDS.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_excerpt() {
        assert_eq!(sql_excerpt("SELECT 1", 100), "SELECT 1");
        assert_eq!(sql_excerpt("INSERT\n   INTO t", 100), "INSERT INTO t");
        assert_eq!(sql_excerpt("abcdef", 3), "abc…");
        // 多字节字符不截断在字节中间
        assert_eq!(sql_excerpt("落库语句", 2), "落库…");
    }

    #[test]
    fn test_settings_resolve() {
        let s = SqlTraceSettings::resolve(Some(" on "), Some("75"));
        assert!(s.enabled);
        assert_eq!(s.slow_threshold_ms, 75);

        let s = SqlTraceSettings::resolve(Some("off"), Some("abc"));
        assert!(!s.enabled);
        assert!(s.slow_threshold_ms > 0);
    }

    #[test]
    fn test_rows_per_sec() {
        assert_eq!(rows_per_sec(100, Duration::from_secs(2)), 50);
        assert_eq!(rows_per_sec(7, Duration::ZERO), 7);
    }

    #[test]
    fn test_guard_counts_statements_on_traced_connection() {
        let mut conn = Connection::open_in_memory().unwrap();
        TRACE_ENABLED.store(true, Ordering::Relaxed);
        conn.trace(Some(on_statement));

        let before = StatementCounts::now();
        {
            let _guard = PerfGuard::new("test.statements");
            conn.execute_batch("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (1);")
                .unwrap();
        }
        let counted = StatementCounts::now().since(before);
        assert!(counted.statements >= 2);
    }
}
