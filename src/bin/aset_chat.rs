//! aset-chat - ASET 声明验证终端客户端
//!
//! 交互式 REPL：
//! - 直接输入声明即检索支持论文
//! - `:verify` 对最近一次检索结果触发 AI 验证
//! - `:history` 进入历史视图（`:load` / `:rename` / `:delete` / `:close`）

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Result;
use aset_chat_db::{
    ApiConfig, ChatMessage, ChatSession, ChatStore, ChatSummary, DbConfig, Error, Paper,
    SpaceDigestClient, Verification,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("aset_chat_db=warn".parse()?))
        .init();

    tracing::info!("🚀 aset-chat v{}", aset_chat_db::VERSION_FULL);

    let store = Arc::new(ChatStore::connect(DbConfig::from_env())?);
    let gateway = SpaceDigestClient::new(ApiConfig::from_env());
    let mut session = ChatSession::new(store, gateway);

    print_welcome();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{}> ", session.view());
        io::stdout().flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => break,
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input.split_whitespace().next().unwrap_or_default() {
            ":quit" | ":q" => break,
            ":new" => {
                session.new_chat();
                print_welcome();
            }
            ":history" => {
                session.open_history();
                render_history(&session.history());
            }
            ":close" => session.close_history(),
            ":search" => {
                let query = input.strip_prefix(":search").unwrap_or_default().trim();
                render_history(&session.search_history(query));
            }
            ":load" => match parse_id(input, ":load") {
                Some(id) => match session.load_chat(id) {
                    Ok(()) => {
                        println!("== {} ==", session.chat_name());
                        for message in session.messages() {
                            render_message(message);
                        }
                    }
                    Err(e) => println!("load failed: {}", e),
                },
                None => println!("usage: :load <chat-id>"),
            },
            ":rename" => {
                let rest = input.strip_prefix(":rename").unwrap_or_default().trim();
                let mut parts = rest.splitn(2, ' ');
                match (
                    parts.next().and_then(|s| s.parse().ok()),
                    parts.next().map(str::trim),
                ) {
                    (Some(id), Some(name)) if !name.is_empty() => {
                        match session.rename_chat(id, name) {
                            Ok(chat) => println!("renamed: {}", chat.name),
                            Err(e) => println!("rename failed: {}", e),
                        }
                    }
                    _ => println!("usage: :rename <chat-id> <new name>"),
                }
            }
            ":delete" => match parse_id(input, ":delete") {
                Some(id) => match session.delete_chat(id) {
                    Ok(true) => println!("Chat deleted successfully"),
                    Ok(false) => println!("Chat not found"),
                    Err(e) => println!("delete failed: {}", e),
                },
                None => println!("usage: :delete <chat-id>"),
            },
            ":verify" => {
                // 对最近一条带论文的助手消息触发验证
                let target = session
                    .messages()
                    .iter()
                    .rev()
                    .find(|m| m.has_papers())
                    .map(|m| m.id);
                match target {
                    Some(id) => {
                        println!("🤖 AI analyzing... (takes 5-10 seconds)");
                        match session.verify_message(id).await {
                            Ok(verification) => render_verification(&verification),
                            Err(e) => println!("❌ Error: {}", e),
                        }
                    }
                    None => println!("Nothing to verify yet. Send a claim first."),
                }
            }
            _ => match session.send_message(input).await {
                Ok(()) => {
                    if let Some(reply) = session.messages().last() {
                        render_message(reply);
                    }
                }
                Err(Error::EmptyMessage) => {}
                Err(e) => println!("send failed: {}", e),
            },
        }
    }

    tracing::info!("👋 aset-chat exiting");
    Ok(())
}

fn parse_id(input: &str, command: &str) -> Option<i64> {
    input
        .strip_prefix(command)
        .and_then(|rest| rest.trim().parse().ok())
}

fn print_welcome() {
    println!("What can I help with?");
    println!("Try one of these claims:");
    println!("  - Can black holes evaporate through Hawking radiation?");
    println!("  - Have we discovered Earth-like planets in habitable zones?");
    println!("  - Can neutron stars exceed 5 solar masses?");
    println!("Commands: :verify :history :new :quit");
}

fn render_message(message: &ChatMessage) {
    println!("[{}] {}", message.role, message.content);
    if let Some(metadata) = &message.metadata {
        let meta = &metadata.search_metadata;
        println!(
            "  {} → {} → {} | ⚡ {}ms | 📄 {} papers",
            meta.domain, meta.topic, meta.subtopic, meta.query_time, meta.total_sources
        );
        for (rank, paper) in metadata.papers.iter().enumerate().take(10) {
            render_paper(rank + 1, paper);
        }
        if metadata.papers.len() > 10 {
            println!("  ... and {} more", metadata.papers.len() - 10);
        }
    }
}

fn render_paper(rank: usize, paper: &Paper) {
    let journal = paper.journal.as_deref().unwrap_or("Preprint");
    let year = paper
        .year
        .map(|y| format!(" • {}", y))
        .unwrap_or_default();
    println!(
        "  #{} [{:.1}] {} ({}{}, {})",
        rank,
        paper.relevance,
        paper.title,
        journal,
        year,
        paper.source.label()
    );
}

fn render_verification(verification: &Verification) {
    println!("🔬 AI Verification Results");
    println!(
        "Analyzed {} papers in {:.1}s",
        verification.papers_analyzed,
        verification.processing_time_ms as f64 / 1000.0
    );
    println!(
        "Score: {}% | Verdict: {} | Confidence: {}",
        verification.verification_score, verification.verdict, verification.confidence
    );
    println!("Summary: {}", verification.summary);
    for finding in &verification.key_findings {
        println!("  🔑 {}", finding);
    }
    if let Some(limitations) = &verification.limitations {
        println!("⚠️ Limitations: {}", limitations);
    }
    for analysis in &verification.analyses {
        let icon = match analysis.stance {
            aset_chat_db::Stance::Supports => "✅",
            aset_chat_db::Stance::Contradicts => "❌",
            aset_chat_db::Stance::Neutral => "➖",
        };
        println!(
            "  {} {} — {} ({}% confident)",
            icon, analysis.stance, analysis.paper_title, analysis.confidence
        );
    }
}

fn render_history(chats: &[ChatSummary]) {
    if chats.is_empty() {
        println!("No conversations yet");
        return;
    }
    println!("{:<4} {:<16} {:<10} {}", "No.", "Chat ID", "Messages", "Name");
    for (index, chat) in chats.iter().enumerate() {
        println!(
            "{:<4} {:<16} {:<10} {}  ({})",
            index + 1,
            chat.id,
            chat.message_count,
            chat.name,
            format_relative(chat.last_updated)
        );
    }
}

/// 相对时间展示（Today / Yesterday / N days ago / 具体日期）
fn format_relative(timestamp_ms: i64) -> String {
    let now_ms = chrono::Utc::now().timestamp_millis();
    let diff_days = (now_ms - timestamp_ms).max(0) / 86_400_000;
    match diff_days {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        d if d < 7 => format!("{} days ago", d),
        _ => chrono::DateTime::from_timestamp_millis(timestamp_ms)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
    }
}
