//! Webooks - 网络书籍目录命令行
//!
//! 组装 SQLite 仓储、书源注册表和懒加载编排器，执行单条子命令后退出。

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use webooks::application::{
    CreateBook, CreateBookHandler, ExportBook, ExportBookHandler, GetAdjacentChapter,
    GetAdjacentChapterHandler, GetBookByName, GetBookByNameHandler, GetBookChapters,
    GetBookChaptersHandler, GetChapterContent, GetChapterContentHandler, LazyLoader, ListBookTags,
    ListBookTagsHandler, ListBooks, ListBooksHandler, RefreshBook, RefreshBookHandler, TagBook,
    TagBookHandler,
};
use webooks::config::{load_config_from_path, print_config, LogConfig};
use webooks::domain::catalog::{BookId, Direction};
use webooks::infrastructure::persistence::sqlite::{create_pool, run_migrations, DatabaseConfig};
use webooks::infrastructure::{
    build_source_factory, SqliteBookRepository, SqliteChapterRepository, SqliteTagRepository,
    TxtExporter,
};

#[derive(Parser)]
#[command(name = "webooks", version, about = "Web book catalog with lazy chapter loading")]
struct Cli {
    /// Configuration file (defaults to config.toml / config.local.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a book, or return the existing one with the same name.
    Add {
        name: String,

        /// Registered source name.
        #[arg(long, default_value = "")]
        source: String,

        /// Book id at the source.
        #[arg(long, default_value = "")]
        src_id: String,

        /// Book URL at the source.
        #[arg(long, default_value = "")]
        src_url: String,

        #[arg(long, default_value = "")]
        author: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long, default_value = "0")]
        score: i64,

        /// Mark the book as finished.
        #[arg(long)]
        over: bool,

        /// Protect the book from forced refreshes.
        #[arg(long)]
        lock: bool,
    },

    /// List books, optionally filtered by tag.
    List {
        #[arg(long)]
        tag: Option<String>,
    },

    /// List a book's chapters, fetching them from the source if needed.
    Chapters { name: String },

    /// Print one chapter, fetching its content from the source if needed.
    Read { name: String, number: i32 },

    /// Tag a book.
    Tag { name: String, tag: String },

    /// Show a book's tags.
    Tags { name: String },

    /// Export a book as plain text.
    Export { name: String, path: PathBuf },

    /// Re-fetch a book's chapter list from its source.
    Refresh { name: String },

    /// List registered sources.
    Sources,
}

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},webooks={},sqlx=warn", log.level, log.level))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if log.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config_from_path(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config.log);
    print_config(&config);

    // 确保数据目录存在
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // 初始化数据库
    let db_config = DatabaseConfig {
        database_url: config.database.database_url(),
        max_connections: config.database.max_connections,
    };
    let pool = create_pool(&db_config).await?;
    run_migrations(&pool).await?;

    // 创建 Repository 适配器
    let books = Arc::new(SqliteBookRepository::new(pool.clone()));
    let chapters = Arc::new(SqliteChapterRepository::new(pool.clone()));
    let tags = Arc::new(SqliteTagRepository::new(pool));

    // 书源和懒加载编排器
    let sources = build_source_factory(&config.sources)?;
    let loader = Arc::new(LazyLoader::new(
        books.clone(),
        chapters.clone(),
        sources.clone(),
        config.lazy_loading,
    ));

    let find_book = |name: String| {
        let handler = GetBookByNameHandler::new(books.clone());
        async move { handler.handle(GetBookByName { name }).await.map(|b| b.id) }
    };

    match cli.command {
        Commands::Add {
            name,
            source,
            src_id,
            src_url,
            author,
            description,
            score,
            over,
            lock,
        } => {
            let response = CreateBookHandler::new(books.clone())
                .handle(CreateBook {
                    name,
                    author,
                    description,
                    score,
                    is_over: over,
                    lock,
                    src_name: source,
                    src_id,
                    src_url,
                })
                .await?;
            let verb = if response.created { "created" } else { "exists" };
            println!("{}\t{}\t{}", response.book.id, verb, response.book.name);
        }
        Commands::List { tag } => {
            let list = ListBooksHandler::new(books.clone(), tags.clone())
                .handle(ListBooks { tag })
                .await?;
            for book in list {
                println!(
                    "{}\t{}\t{}\t{}",
                    book.id, book.name, book.author, book.src_name
                );
            }
        }
        Commands::Chapters { name } => {
            let book_id = find_book(name).await?;
            let list = GetBookChaptersHandler::new(books.clone(), loader.clone())
                .handle(GetBookChapters { book_id })
                .await?;
            for chapter in list {
                let mark = if chapter.has_content { "*" } else { " " };
                println!("{}{}\t{}", mark, chapter.number, chapter.title);
            }
        }
        Commands::Read { name, number } => {
            let book_id = find_book(name).await?;
            let response = GetChapterContentHandler::new(chapters.clone(), loader.clone())
                .handle(GetChapterContent { book_id, number })
                .await?;
            println!("{}\n\n{}", response.chapter.title, response.content);

            let adjacent = GetAdjacentChapterHandler::new(chapters.clone());
            for direction in [Direction::Before, Direction::After] {
                let sibling = adjacent
                    .handle(GetAdjacentChapter {
                        chapter_id: response.chapter.id,
                        direction,
                    })
                    .await?;
                if let Some(sibling) = sibling {
                    println!("{:?}: {} {}", direction, sibling.number, sibling.title);
                }
            }
        }
        Commands::Tag { name, tag } => {
            let book_id = find_book(name).await?;
            let response = TagBookHandler::new(books.clone(), tags.clone())
                .handle(TagBook { book_id, tag })
                .await?;
            println!("{}", response.tag.name);
        }
        Commands::Tags { name } => {
            let book_id: BookId = find_book(name).await?;
            let names = ListBookTagsHandler::new(tags.clone())
                .handle(ListBookTags { book_id })
                .await?;
            println!("{}", names.join(", "));
        }
        Commands::Export { name, path } => {
            let book_id = find_book(name).await?;
            let response = ExportBookHandler::new(
                books.clone(),
                loader.clone(),
                Arc::new(TxtExporter::new()),
            )
            .handle(ExportBook { book_id, path })
            .await?;
            println!(
                "{} chapters -> {}",
                response.chapter_count,
                response.path.display()
            );
        }
        Commands::Refresh { name } => {
            let book_id = find_book(name).await?;
            let list = RefreshBookHandler::new(books.clone(), loader.clone())
                .handle(RefreshBook { book_id })
                .await?;
            println!("{} chapters", list.len());
        }
        Commands::Sources => {
            for name in sources.names() {
                let healthy = match sources.get_source(name) {
                    Ok(source) => source.health_check().await,
                    Err(_) => false,
                };
                println!("{}\t{}", name, if healthy { "ok" } else { "unreachable" });
            }
        }
    }

    Ok(())
}
