//! fanout-toolkit 命令行：演示并行分发、并行分词和归档内JSON的键结构查看。

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fanout::{archive, inspect, tokenize, Dispatcher, DispatcherConfig, FailurePolicy, ResultOrder};
use prettytable::{row, Table};
use rand::Rng;

#[derive(Parser)]
#[command(name = "fanout-toolkit")]
#[command(about = "固定线程数的并行分发工具集")]
#[command(version)]
struct Cli {
    /// JSON配置文件路径
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 覆盖配置中的工作线程数
    #[arg(short, long, global = true)]
    workers: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 并行计算 1..=count 的平方
    Squares {
        #[arg(short = 'n', long, default_value_t = 20)]
        count: u64,

        /// 按输入顺序输出结果
        #[arg(long)]
        ordered: bool,

        /// 每个输入随机休眠 0..jitter_ms 毫秒
        #[arg(long, default_value_t = 0)]
        jitter_ms: u64,

        /// 让该输入失败，用于观察失败策略
        #[arg(long)]
        fail_on: Option<u64>,

        /// 收集全部失败而不是遇到第一个失败就返回
        #[arg(long)]
        collect_all: bool,
    },

    /// 按行并行分词并统计词频，文本为 "-" 时读取标准输入
    Words {
        text: String,

        /// 显示前多少个高频词
        #[arg(long, default_value_t = 10)]
        top: usize,
    },

    /// 读取归档中的JSON文件并打印键结构
    Archive {
        path: PathBuf,

        /// 归档内的JSON文件名
        entry: String,

        /// 同时打印完整JSON
        #[arg(long)]
        dump: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => DispatcherConfig::from_json_file(path)
            .with_context(|| format!("加载配置 {} 失败", path.display()))?,
        None => DispatcherConfig::default(),
    };
    if let Some(workers) = cli.workers {
        config.worker_count = workers;
    }

    match cli.command {
        Commands::Squares {
            count,
            ordered,
            jitter_ms,
            fail_on,
            collect_all,
        } => {
            if ordered {
                config.result_order = ResultOrder::InputOrder;
            }
            if collect_all {
                config.failure_policy = FailurePolicy::CollectAll;
            }
            run_squares(config, count, jitter_ms, fail_on)
        }
        Commands::Words { text, top } => run_words(config, &text, top),
        Commands::Archive { path, entry, dump } => run_archive(&path, &entry, dump),
    }
}

fn run_squares(
    config: DispatcherConfig,
    count: u64,
    jitter_ms: u64,
    fail_on: Option<u64>,
) -> Result<()> {
    let dispatcher = Dispatcher::new(config)?;
    let inputs: Vec<u64> = (1..=count).collect();
    let job = |x: &u64| {
        if jitter_ms > 0 {
            let pause = rand::thread_rng().gen_range(0..jitter_ms);
            thread::sleep(Duration::from_millis(pause));
        }
        if fail_on == Some(*x) {
            Err(format!("输入 {} 被指定为失败", x))
        } else {
            Ok(x * x)
        }
    };

    let report = dispatcher.run_with_policy(job, &inputs)?;
    println!(
        "分发 {}：{} 条记录，{} 条失败",
        report.run_id,
        report.len(),
        report.failure_count()
    );
    let mut table = Table::new();
    table.set_titles(row!["输入下标", "工作线程", "尝试次数", "结果"]);
    for outcome in &report.outcomes {
        let result = match &outcome.result {
            Ok(value) => value.to_string(),
            Err(e) => format!("失败: {}", e),
        };
        table.add_row(row![outcome.index, outcome.worker_id, outcome.attempts, result]);
    }
    table.printstd();
    Ok(())
}

fn run_words(config: DispatcherConfig, text: &str, top: usize) -> Result<()> {
    let text = if text == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).context("读取标准输入失败")?;
        buf
    } else {
        text.to_string()
    };
    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() {
        bail!("没有可分词的文本");
    }

    let dispatcher = Dispatcher::new(config)?;
    let per_line = dispatcher.run(
        |line: &&str| {
            tokenize::split_words(line)
                .into_iter()
                .map(str::to_lowercase)
                .collect::<Vec<_>>()
        },
        &lines,
    )?;

    let mut frequency: HashMap<String, usize> = HashMap::new();
    for word in per_line.into_iter().flatten() {
        *frequency.entry(word).or_insert(0) += 1;
    }
    let mut ranked: Vec<(String, usize)> = frequency.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut table = Table::new();
    table.set_titles(row!["单词", "次数"]);
    for (word, n) in ranked.into_iter().take(top) {
        table.add_row(row![word, n]);
    }
    table.printstd();
    Ok(())
}

fn run_archive(path: &Path, entry: &str, dump: bool) -> Result<()> {
    let value = archive::read_json_from_archive(path, entry)
        .with_context(|| format!("从 {} 读取 {} 失败", path.display(), entry))?;
    inspect::print_key_structure(&value);
    if dump {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}
