// ==========================================
// PPC 竞价优化引擎 - 命令行入口
// ==========================================
// 子命令: optimize / analyze / review / history / config
// 退出码: 0 成功, 1 其他错误, 2 导入错误
// ==========================================

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use ppc_optimizer::api::{DraftDocument, OptimizerApi, ReportRequest};
use ppc_optimizer::config::{load_settings, ConfigManager, OptimizerSettings};
use ppc_optimizer::db::{default_db_path, open_sqlite_connection};
use ppc_optimizer::domain::{
    BidPolicy, ExportFormat, ExportLocale, FinalChangeSet, KeywordRow, RowError,
};
use ppc_optimizer::engine::{ChangeReview, SnapshotOutcome};
use ppc_optimizer::i18n::{self, t, t_with_args};
use ppc_optimizer::importer::{ImportError, TabularSource};
use ppc_optimizer::repository::{SqliteWeeklySnapshotRepository, WeeklySnapshotRepository};
use ppc_optimizer::{logging, ApiError};

#[derive(Debug, Parser)]
#[command(name = "ppc-optimizer", version)]
#[command(about = "PPC Bulk/Search-Term bid optimizer")]
struct Cli {
    /// SQLite 数据库路径（配置与周度快照）
    #[arg(long, global = true, env = "PPC_OPTIMIZER_DB")]
    db: Option<PathBuf>,

    /// 以 JSON 行输出日志
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args)]
struct ReportArgs {
    /// Bulk 报表（.xlsx/.csv）
    #[arg(long)]
    bulk: PathBuf,

    /// 搜索词报表（.xlsx/.csv）
    #[arg(long)]
    search_terms: PathBuf,

    /// 目标 ACOS 百分数（覆写配置）
    #[arg(long)]
    target_acos: Option<f64>,
}

#[derive(Debug, Args)]
struct RunOverrides {
    /// 竞价策略: target-convergence | flat-correction
    #[arg(long, value_parser = parse_policy)]
    policy: Option<BidPolicy>,

    /// 导出语言: es | en
    #[arg(long, value_parser = parse_locale)]
    locale: Option<ExportLocale>,

    /// 导出格式: xlsx | csv
    #[arg(long, value_parser = parse_format)]
    format: Option<ExportFormat>,
}

impl RunOverrides {
    fn apply(&self, settings: &mut OptimizerSettings) {
        if let Some(policy) = self.policy {
            settings.decision.bid_policy = policy;
        }
        if let Some(locale) = self.locale {
            settings.export_locale = locale;
        }
        if let Some(format) = self.format {
            settings.export_format = format;
        }
    }
}

#[derive(Debug, Args)]
struct OutputArgs {
    /// 客户 ID（快照键）
    #[arg(long)]
    client: String,

    /// 导出目录
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// 生成竞价变更; 默认直接提交并导出
    Optimize {
        #[command(flatten)]
        reports: ReportArgs,
        #[command(flatten)]
        overrides: RunOverrides,
        #[command(flatten)]
        output: OutputArgs,
        /// 只写出草稿 JSON,不导出
        #[arg(long)]
        draft_out: Option<PathBuf>,
    },
    /// 输出表现分析（JSON）
    Analyze {
        #[command(flatten)]
        reports: ReportArgs,
        #[command(flatten)]
        overrides: RunOverrides,
    },
    /// 审核草稿: 先改价后删除,然后提交并导出
    Review {
        /// optimize --draft-out 写出的草稿
        #[arg(long)]
        draft: PathBuf,
        /// 改价, 格式 INDEX=BID（可重复）
        #[arg(long = "edit", value_parser = parse_edit)]
        edits: Vec<(usize, f64)>,
        /// 删除的变更序号（可重复; 按原序号计）
        #[arg(long = "remove")]
        removals: Vec<usize>,
        #[command(flatten)]
        overrides: RunOverrides,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// 客户周度快照历史
    History {
        #[arg(long)]
        client: String,
        #[arg(long, default_value_t = 12)]
        limit: usize,
    },
    /// 读写 config_kv 覆写
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// 列出全部覆写
    List,
    /// 写入覆写
    Set { key: String, value: String },
}

fn parse_policy(raw: &str) -> Result<BidPolicy, String> {
    BidPolicy::parse(raw).ok_or_else(|| format!("unknown bid policy: {raw}"))
}

fn parse_locale(raw: &str) -> Result<ExportLocale, String> {
    ExportLocale::parse(raw).ok_or_else(|| format!("unknown locale: {raw} (expected es or en)"))
}

fn parse_format(raw: &str) -> Result<ExportFormat, String> {
    ExportFormat::parse(raw).ok_or_else(|| format!("unknown format: {raw} (expected xlsx or csv)"))
}

fn parse_edit(raw: &str) -> Result<(usize, f64), String> {
    let (index, bid) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected INDEX=BID, got {raw}"))?;
    let index = index
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("invalid index {index}: {e}"))?;
    let bid = bid
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid bid {bid}: {e}"))?;
    Ok((index, bid))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_with(cli.log_json);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "运行失败");
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn exit_code(err: &anyhow::Error) -> u8 {
    let ingestion = err
        .downcast_ref::<ApiError>()
        .is_some_and(ApiError::is_ingestion)
        || err.downcast_ref::<ImportError>().is_some();
    if ingestion {
        2
    } else {
        1
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let db_path = cli.db.unwrap_or_else(default_db_path);
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    info!(db = %db_path.display(), version = ppc_optimizer::VERSION, "启动");

    let conn = Arc::new(Mutex::new(
        open_sqlite_connection(&db_path.to_string_lossy())
            .with_context(|| format!("opening {}", db_path.display()))?,
    ));
    let config = ConfigManager::from_connection(conn.clone())?;
    let repo: Arc<dyn WeeklySnapshotRepository> =
        Arc::new(SqliteWeeklySnapshotRepository::new(conn));
    let mut settings = load_settings(&config).await?;

    match cli.command {
        Commands::Optimize {
            reports,
            overrides,
            output,
            draft_out,
        } => {
            overrides.apply(&mut settings);
            i18n::set_export_locale(settings.export_locale);
            let request = read_reports(&reports).await?;
            let api = OptimizerApi::new(settings, repo);

            let response = api.optimize(&request)?;
            println!(
                "{}",
                t_with_args(
                    "cli.run_summary",
                    &[
                        ("run_id", response.run_id.as_str()),
                        ("updates", response.summary.updates.to_string().as_str()),
                        ("creates", response.summary.new_keywords.to_string().as_str()),
                        ("status", response.status.as_str()),
                    ],
                )
            );
            print_row_errors(&response.row_errors, response.campaign_conflicts.len());

            if let Some(path) = draft_out {
                let doc = DraftDocument::from(&response);
                tokio::fs::write(&path, serde_json::to_vec_pretty(&doc)?)
                    .await
                    .with_context(|| format!("writing {}", path.display()))?;
                println!(
                    "{}",
                    t_with_args("cli.draft_written", &[("path", path.display().to_string().as_str())])
                );
                return Ok(());
            }

            if response.draft.is_empty() {
                println!("{}", t("cli.no_changes"));
            }
            let final_set = ChangeReview::open(&response.draft).commit();
            finalize(&api, &final_set, &response.keyword_rows, &output).await
        }

        Commands::Analyze { reports, overrides } => {
            overrides.apply(&mut settings);
            let request = read_reports(&reports).await?;
            let api = OptimizerApi::new(settings, repo);
            let report = api.analyze(&request)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }

        Commands::Review {
            draft,
            edits,
            removals,
            overrides,
            output,
        } => {
            overrides.apply(&mut settings);
            i18n::set_export_locale(settings.export_locale);
            let bytes = tokio::fs::read(&draft)
                .await
                .with_context(|| format!("reading {}", draft.display()))?;
            let doc: DraftDocument = serde_json::from_slice(&bytes)
                .with_context(|| format!("parsing draft {}", draft.display()))?;

            let mut review = ChangeReview::open(&doc.draft);
            for (index, bid) in edits {
                review.edit_bid(index, bid).map_err(ApiError::from)?;
            }
            // 倒序删除,序号始终指向原草稿位置
            let mut removals = removals;
            removals.sort_unstable_by(|a, b| b.cmp(a));
            removals.dedup();
            for index in removals {
                review.remove(index).map_err(ApiError::from)?;
            }

            let api = OptimizerApi::new(settings, repo);
            let final_set = review.commit();
            if final_set.is_empty() {
                println!("{}", t("cli.no_changes"));
            }
            finalize(&api, &final_set, &doc.keyword_rows, &output).await
        }

        Commands::History { client, limit } => {
            let api = OptimizerApi::new(settings, repo);
            let snapshots = api.history(&client, limit).await?;
            if snapshots.is_empty() {
                println!("{}", t_with_args("cli.history_empty", &[("client", client.as_str())]));
            }
            for snap in snapshots {
                println!(
                    "{}",
                    t_with_args(
                        "cli.history_row",
                        &[
                            ("week", snap.week_start_date.to_string().as_str()),
                            ("spend", format!("{:.2}", snap.total_spend).as_str()),
                            ("sales", format!("{:.2}", snap.total_sales).as_str()),
                            ("acos", format!("{:.2}", snap.global_acos * 100.0).as_str()),
                        ],
                    )
                );
            }
            Ok(())
        }

        Commands::Config { action } => {
            match action {
                ConfigAction::List => {
                    for (key, value) in config.list_global_config()? {
                        print_config_entry(&key, &value);
                    }
                }
                ConfigAction::Set { key, value } => {
                    config.set_global_config_value(&key, &value)?;
                    print_config_entry(&key, &value);
                }
            }
            Ok(())
        }
    }
}

fn print_config_entry(key: &str, value: &str) {
    println!(
        "{}",
        t_with_args("cli.config_set", &[("key", key), ("value", value)])
    );
}

async fn read_reports(args: &ReportArgs) -> anyhow::Result<ReportRequest> {
    Ok(ReportRequest {
        bulk: TabularSource::read(&args.bulk).await?,
        search_terms: TabularSource::read(&args.search_terms).await?,
        target_acos_pct: args.target_acos,
    })
}

fn print_row_errors(row_errors: &[RowError], conflicts: usize) {
    if row_errors.is_empty() {
        return;
    }
    println!(
        "{}",
        t_with_args("cli.row_errors", &[("count", row_errors.len().to_string().as_str())])
    );
    if conflicts > 0 {
        println!(
            "{}",
            t_with_args("cli.campaign_conflicts", &[("count", conflicts.to_string().as_str())])
        );
    }
    for err in row_errors {
        println!("  {}", err);
    }
}

async fn finalize(
    api: &OptimizerApi,
    final_set: &FinalChangeSet,
    keyword_rows: &[KeywordRow],
    output: &OutputArgs,
) -> anyhow::Result<()> {
    let today = Local::now().date_naive();
    let settings = api.settings();
    let response = api
        .finalize(
            final_set,
            keyword_rows,
            &output.client,
            today,
            settings.export_locale,
            settings.export_format,
        )
        .await?;

    let path = output.out_dir.join(&response.file_name);
    write_export(&path, &response.bytes).await?;
    println!(
        "{}",
        t_with_args("cli.export_written", &[("path", path.display().to_string().as_str())])
    );

    match response.snapshot {
        SnapshotOutcome::Saved(snap) => println!(
            "{}",
            t_with_args("cli.snapshot_saved", &[("week", snap.week_start_date.to_string().as_str())])
        ),
        SnapshotOutcome::Failed { reason } => println!(
            "{}",
            t_with_args("cli.snapshot_failed", &[("reason", reason.as_str())])
        ),
    }
    Ok(())
}

async fn write_export(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| anyhow!("writing {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_edit() {
        assert_eq!(parse_edit("2=0.75").unwrap(), (2, 0.75));
        assert!(parse_edit("0.75").is_err());
        assert!(parse_edit("x=1").is_err());
    }

    #[test]
    fn test_exit_code_for_ingestion() {
        let err = anyhow::Error::from(ApiError::from(ImportError::FileNotFound(
            "bulk.xlsx".to_string(),
        )));
        assert_eq!(exit_code(&err), 2);
        assert_eq!(exit_code(&anyhow!("boom")), 1);
    }

    #[test]
    fn test_cli_parses_review() {
        let cli = Cli::try_parse_from([
            "ppc-optimizer",
            "review",
            "--draft",
            "draft.json",
            "--edit",
            "0=0.40",
            "--remove",
            "1",
            "--client",
            "acme",
        ])
        .unwrap();
        match cli.command {
            Commands::Review { edits, removals, .. } => {
                assert_eq!(edits, vec![(0, 0.40)]);
                assert_eq!(removals, vec![1]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_format_override() {
        let cli = Cli::try_parse_from([
            "ppc-optimizer",
            "optimize",
            "--bulk",
            "bulk.xlsx",
            "--search-terms",
            "st.xlsx",
            "--client",
            "acme",
            "--format",
            "csv",
        ])
        .unwrap();
        match cli.command {
            Commands::Optimize { overrides, .. } => {
                let mut settings = OptimizerSettings::default();
                assert_eq!(settings.export_format, ExportFormat::Xlsx);
                overrides.apply(&mut settings);
                assert_eq!(settings.export_format, ExportFormat::Csv);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(parse_format("pdf").is_err());
    }
}
